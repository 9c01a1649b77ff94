//! XPath 1.0 Functions
//!
//! Implements the XPath 1.0 core function library:
//!
//! Node Set Functions:
//! - position(), last(), count(), local-name(), namespace-uri(), name()
//!
//! String Functions:
//! - string(), concat(), starts-with(), contains(), substring(),
//!   substring-before(), substring-after(), string-length(),
//!   normalize-space(), translate()
//!
//! Boolean Functions:
//! - boolean(), not(), true(), false(), lang()
//!
//! Number Functions:
//! - number(), sum(), floor(), ceiling(), round()
//!
//! `id()` is recognized but fails at evaluation: there is no DTD to
//! declare ID attributes.

use super::eval::EvalContext;
use super::value::{string_to_number, XPathNode, XPathValue};
use super::XPathError;

/// Allowed argument counts (min, max) for a known function
pub fn arity(name: &str) -> Option<(usize, usize)> {
    let range = match name {
        "position" | "last" | "true" | "false" => (0, 0),
        "count" | "id" | "boolean" | "not" | "lang" | "sum" | "floor" | "ceiling" | "round" => {
            (1, 1)
        }
        "local-name" | "namespace-uri" | "name" | "string" | "string-length"
        | "normalize-space" | "number" => (0, 1),
        "starts-with" | "contains" | "substring-before" | "substring-after" => (2, 2),
        "substring" => (2, 3),
        "translate" => (3, 3),
        "concat" => (2, usize::MAX),
        _ => return None,
    };
    Some(range)
}

/// Evaluate a function call. Arity was checked at compile time.
pub fn call(name: &str, args: Vec<XPathValue>, ctx: &EvalContext) -> Result<XPathValue, XPathError> {
    let value = match name {
        // Node Set Functions
        "position" => XPathValue::Number(ctx.position as f64),
        "last" => XPathValue::Number(ctx.size as f64),
        "count" => XPathValue::Number(nodeset_arg(name, &args[0])?.len() as f64),
        "local-name" => XPathValue::String(node_name(&args, ctx, name, NameKind::Local)?),
        "namespace-uri" => XPathValue::String(node_name(&args, ctx, name, NameKind::Namespace)?),
        "name" => XPathValue::String(node_name(&args, ctx, name, NameKind::Qualified)?),
        "id" => {
            return Err(XPathError::Evaluation(
                "id() is not supported without a DTD".to_string(),
            ))
        }

        // String Functions
        "string" => XPathValue::String(string_arg_or_context(&args, ctx)),
        "concat" => XPathValue::String(args.iter().map(|a| ctx.string(a)).collect()),
        "starts-with" => XPathValue::Boolean(ctx.string(&args[0]).starts_with(&ctx.string(&args[1]))),
        "contains" => XPathValue::Boolean(ctx.string(&args[0]).contains(&ctx.string(&args[1]))),
        "substring" => XPathValue::String(fn_substring(&args, ctx)),
        "substring-before" => {
            let s = ctx.string(&args[0]);
            let pattern = ctx.string(&args[1]);
            XPathValue::String(s.find(&pattern).map(|pos| s[..pos].to_string()).unwrap_or_default())
        }
        "substring-after" => {
            let s = ctx.string(&args[0]);
            let pattern = ctx.string(&args[1]);
            XPathValue::String(
                s.find(&pattern)
                    .map(|pos| s[pos + pattern.len()..].to_string())
                    .unwrap_or_default(),
            )
        }
        "string-length" => {
            XPathValue::Number(string_arg_or_context(&args, ctx).chars().count() as f64)
        }
        "normalize-space" => XPathValue::String(
            string_arg_or_context(&args, ctx)
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" "),
        ),
        "translate" => XPathValue::String(fn_translate(&args, ctx)),

        // Boolean Functions
        "boolean" => XPathValue::Boolean(args[0].to_boolean()),
        "not" => XPathValue::Boolean(!args[0].to_boolean()),
        "true" => XPathValue::Boolean(true),
        "false" => XPathValue::Boolean(false),
        "lang" => XPathValue::Boolean(fn_lang(&ctx.string(&args[0]), ctx)),

        // Number Functions
        "number" => XPathValue::Number(match args.first() {
            Some(arg) => ctx.number(arg),
            None => string_to_number(&ctx.node.string_value(ctx.doc)),
        }),
        "sum" => XPathValue::Number(
            nodeset_arg(name, &args[0])?
                .iter()
                .map(|n| string_to_number(&n.string_value(ctx.doc)))
                .sum(),
        ),
        "floor" => XPathValue::Number(ctx.number(&args[0]).floor()),
        "ceiling" => XPathValue::Number(ctx.number(&args[0]).ceil()),
        "round" => XPathValue::Number(xpath_round(ctx.number(&args[0]))),

        _ => return Err(XPathError::UnknownFunction(name.to_string())),
    };
    Ok(value)
}

fn nodeset_arg<'v>(name: &str, arg: &'v XPathValue) -> Result<&'v [XPathNode], XPathError> {
    arg.as_nodeset().ok_or_else(|| {
        XPathError::Evaluation(format!("{}() argument must be a node-set", name))
    })
}

fn string_arg_or_context(args: &[XPathValue], ctx: &EvalContext) -> String {
    match args.first() {
        Some(arg) => ctx.string(arg),
        None => ctx.node.string_value(ctx.doc),
    }
}

enum NameKind {
    Local,
    Namespace,
    Qualified,
}

fn node_name(
    args: &[XPathValue],
    ctx: &EvalContext,
    function: &str,
    kind: NameKind,
) -> Result<String, XPathError> {
    let node = match args.first() {
        None => ctx.node,
        Some(arg) => match nodeset_arg(function, arg)?.first() {
            Some(&node) => node,
            None => return Ok(String::new()),
        },
    };

    let name = match node {
        XPathNode::Attribute(owner, index) => {
            let Some(attr) = ctx
                .doc
                .node(owner)
                .and_then(|n| n.attributes().get(usize::from(index)))
            else {
                return Ok(String::new());
            };
            match kind {
                NameKind::Local => attr.local_name(),
                NameKind::Qualified => attr.name.as_str(),
                NameKind::Namespace => attr
                    .prefix()
                    .and_then(|p| ctx.namespaces.lookup(p))
                    .unwrap_or_default(),
            }
        }
        XPathNode::Node(id) => {
            let Some(n) = ctx.doc.node(id) else {
                return Ok(String::new());
            };
            if n.is_element() || matches!(n.kind(), crate::dom::NodeKind::ProcessingInstruction) {
                match kind {
                    NameKind::Local => n.local_name(),
                    NameKind::Qualified => n.name(),
                    NameKind::Namespace => n.namespace_uri().unwrap_or_default(),
                }
            } else {
                ""
            }
        }
    };
    Ok(name.to_string())
}

/// substring() with XPath rounding: characters at positions p with
/// round(start) <= p < round(start) + round(length)
fn fn_substring(args: &[XPathValue], ctx: &EvalContext) -> String {
    let s = ctx.string(&args[0]);
    let start = xpath_round(ctx.number(&args[1]));
    let end = match args.get(2) {
        Some(len) => start + xpath_round(ctx.number(len)),
        None => f64::INFINITY,
    };
    if start.is_nan() || end.is_nan() {
        return String::new();
    }

    s.chars()
        .enumerate()
        .filter(|&(i, _)| {
            let p = (i + 1) as f64;
            p >= start && p < end
        })
        .map(|(_, c)| c)
        .collect()
}

fn fn_translate(args: &[XPathValue], ctx: &EvalContext) -> String {
    let s = ctx.string(&args[0]);
    let from: Vec<char> = ctx.string(&args[1]).chars().collect();
    let to: Vec<char> = ctx.string(&args[2]).chars().collect();

    s.chars()
        .filter_map(|c| match from.iter().position(|&fc| fc == c) {
            Some(pos) => to.get(pos).copied(),
            None => Some(c),
        })
        .collect()
}

/// Nearest `xml:lang` on the context or its ancestors, matched case-insensitively
/// with subtag prefixes (`en` matches `en-US`)
fn fn_lang(target: &str, ctx: &EvalContext) -> bool {
    let target = target.to_lowercase();
    let start = ctx.node.owner();

    let lang = std::iter::once(start)
        .chain(ctx.doc.ancestors(start))
        .find_map(|id| ctx.doc.node(id)?.attribute("xml:lang"));

    match lang {
        Some(value) => {
            let value = value.to_lowercase();
            value == target
                || (value.starts_with(&target) && value.as_bytes().get(target.len()) == Some(&b'-'))
        }
        None => false,
    }
}

/// XPath round: halves round towards positive infinity
fn xpath_round(n: f64) -> f64 {
    if n.is_nan() || n.is_infinite() {
        n
    } else {
        (n + 0.5).floor()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{NamespaceMap, XmlDocument};

    fn with_context<R>(xml: &[u8], node: u32, f: impl FnOnce(&EvalContext) -> R) -> R {
        let doc = XmlDocument::parse(xml).unwrap();
        let namespaces = NamespaceMap::from_document(&doc);
        let ctx = EvalContext::new(&doc, &namespaces, XPathNode::Node(node));
        f(&ctx)
    }

    fn s(v: &str) -> XPathValue {
        XPathValue::String(v.to_string())
    }

    #[test]
    fn test_arity_table() {
        assert_eq!(arity("concat"), Some((2, usize::MAX)));
        assert_eq!(arity("substring"), Some((2, 3)));
        assert_eq!(arity("position"), Some((0, 0)));
        assert_eq!(arity("frobnicate"), None);
    }

    #[test]
    fn test_string_functions() {
        with_context(b"<r/>", 1, |ctx| {
            let concat = call("concat", vec![s("hello"), s(" "), s("world")], ctx).unwrap();
            assert_eq!(concat, s("hello world"));
            assert_eq!(
                call("substring", vec![s("hello"), XPathValue::Number(2.0), XPathValue::Number(3.0)], ctx).unwrap(),
                s("ell")
            );
            assert_eq!(
                call("substring", vec![s("12345"), XPathValue::Number(1.5), XPathValue::Number(2.6)], ctx).unwrap(),
                s("234")
            );
            assert_eq!(
                call("substring", vec![s("12345"), XPathValue::Number(0.0), XPathValue::Number(3.0)], ctx).unwrap(),
                s("12")
            );
            assert_eq!(
                call("normalize-space", vec![s("  hello   world  ")], ctx).unwrap(),
                s("hello world")
            );
            assert_eq!(call("translate", vec![s("bar"), s("abc"), s("AB")], ctx).unwrap(), s("BAr"));
            assert_eq!(call("substring-after", vec![s("a=b"), s("=")], ctx).unwrap(), s("b"));
        });
    }

    #[test]
    fn test_round() {
        assert_eq!(xpath_round(2.5), 3.0);
        assert_eq!(xpath_round(-2.5), -2.0);
        assert!(xpath_round(f64::NAN).is_nan());
    }

    #[test]
    fn test_id_is_unsupported() {
        with_context(b"<r/>", 1, |ctx| {
            assert!(matches!(
                call("id", vec![s("foo")], ctx),
                Err(XPathError::Evaluation(msg)) if msg.contains("not supported")
            ));
        });
    }

    #[test]
    fn test_lang_matches_subtag_prefix() {
        // document 0, root 1, child 2
        with_context(b"<root xml:lang=\"en-US\"><child/></root>", 2, |ctx| {
            assert_eq!(call("lang", vec![s("en")], ctx).unwrap(), XPathValue::Boolean(true));
            assert_eq!(call("lang", vec![s("fr")], ctx).unwrap(), XPathValue::Boolean(false));
        });
    }

    #[test]
    fn test_names_of_prefixed_element() {
        with_context(
            b"<root xmlns:ns=\"http://example.com\"><ns:child/></root>",
            2,
            |ctx| {
                assert_eq!(call("name", vec![], ctx).unwrap(), s("ns:child"));
                assert_eq!(call("local-name", vec![], ctx).unwrap(), s("child"));
                assert_eq!(call("namespace-uri", vec![], ctx).unwrap(), s("http://example.com"));
            },
        );
    }

    #[test]
    fn test_count_requires_nodeset() {
        with_context(b"<r/>", 1, |ctx| {
            assert!(matches!(call("count", vec![s("x")], ctx), Err(XPathError::Evaluation(_))));
        });
    }
}
