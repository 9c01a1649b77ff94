//! HTML emission
//!
//! Writes a view tree as nested `<span>`s carrying the class hooks the
//! host stylesheet and click handlers key on. `data-xv-id` is emitted for
//! debugging only; nothing reads it back.

use super::tree::{ViewContent, ViewKey, ViewNode, ViewStyle, ViewTree};

pub const NODE: &str = "xv-node";
pub const TAG: &str = "xv-tag";
pub const COLLAPSED: &str = "xv-collapsed";
pub const HAS_UNPROCESSED: &str = "xv-has-unprocessed";
pub const ONE_LINE: &str = "xv-one-line";
pub const SELECTED: &str = "selected";
pub const OUTLINE_SELECTED: &str = "xv-outline-node-selected";
pub const OUTLINE_EMPTY: &str = "xv-outline-node-empty";
pub const ID_ATTRIBUTE: &str = "data-xv-id";

enum Visit {
    Enter(ViewKey),
    Exit(ViewKey),
}

/// Markup for every root of `tree`
pub fn tree_markup(tree: &ViewTree) -> String {
    let mut out = String::new();
    for &root in tree.roots() {
        write_subtree(tree, root, &mut out);
    }
    out
}

/// Markup for a single view node and its materialized subtree
pub fn node_markup(tree: &ViewTree, key: ViewKey) -> Option<String> {
    tree.get(key)?;
    let mut out = String::new();
    write_subtree(tree, key, &mut out);
    Some(out)
}

fn write_subtree(tree: &ViewTree, key: ViewKey, out: &mut String) {
    let style = tree.style();
    let mut stack = vec![Visit::Enter(key)];

    while let Some(visit) = stack.pop() {
        match visit {
            Visit::Enter(k) => {
                let Some(view) = tree.get(k) else {
                    continue;
                };
                match style {
                    ViewStyle::Main => open_main(view, out),
                    ViewStyle::Outline => open_outline(view, out),
                }
                stack.push(Visit::Exit(k));
                stack.extend(view.children.iter().rev().map(|&c| Visit::Enter(c)));
            }
            Visit::Exit(k) => {
                if let Some(view) = tree.get(k) {
                    match style {
                        ViewStyle::Main => close_main(view, out),
                        ViewStyle::Outline => close_outline(view, out),
                    }
                }
            }
        }
    }
}

fn class_list(base: &[&str], view: &ViewNode, style: ViewStyle) -> String {
    let mut classes: Vec<&str> = base.to_vec();
    if view.one_line && style == ViewStyle::Main {
        classes.push(ONE_LINE);
    }
    if view.empty {
        classes.push(OUTLINE_EMPTY);
    }
    if view.collapsed {
        classes.push(COLLAPSED);
    }
    if view.unprocessed {
        classes.push(HAS_UNPROCESSED);
    }
    if view.selected {
        classes.push(match style {
            ViewStyle::Main => SELECTED,
            ViewStyle::Outline => OUTLINE_SELECTED,
        });
    }
    classes.join(" ")
}

fn open_span(out: &mut String, classes: &str, view: &ViewNode) {
    out.push_str("<span class=\"");
    out.push_str(classes);
    out.push_str("\" ");
    out.push_str(ID_ATTRIBUTE);
    out.push_str("=\"");
    out.push_str(&view.id.to_string());
    out.push_str("\">");
}

fn open_main(view: &ViewNode, out: &mut String) {
    match &view.content {
        ViewContent::Element {
            name,
            attributes,
            has_children,
        } => {
            open_span(out, &class_list(&[NODE, TAG], view, ViewStyle::Main), view);
            out.push_str("<span class=\"xv-tag-switcher\"></span>");
            out.push_str("<span class=\"xv-tag-open\">&lt;<span class=\"xv-tag-name\">");
            out.push_str(name);
            out.push_str("</span>");
            for (attr, value) in attributes {
                out.push_str(" <span class=\"xv-attr\"><span class=\"xv-attr-name\">");
                out.push_str(attr);
                out.push_str("</span>=\"<span class=\"xv-attr-value\">");
                out.push_str(value);
                out.push_str("</span>\"</span>");
            }
            if *has_children {
                out.push_str("&gt;</span><span class=\"xv-tag-children\">");
            } else {
                out.push_str(" /&gt;</span>");
            }
        }
        ViewContent::Text(text) => {
            open_span(out, &class_list(&["xv-text"], view, ViewStyle::Main), view);
            out.push_str(text);
        }
        ViewContent::Comment(text) => {
            open_span(out, &class_list(&[NODE, "xv-comment"], view, ViewStyle::Main), view);
            out.push_str("<span class=\"xv-tag-switcher\"></span>");
            out.push_str("<span class=\"xv-comment-start\">&lt;!-- </span><span class=\"xv-comment-value\">");
            out.push_str(text);
            out.push_str("</span><span class=\"xv-comment-end\"> --&gt;</span>");
        }
        ViewContent::CData(text) => {
            open_span(out, &class_list(&[NODE, "xv-cdata"], view, ViewStyle::Main), view);
            out.push_str("<span class=\"xv-tag-switcher\"></span>");
            out.push_str("<span class=\"xv-cdata-start\">&lt;![CDATA[</span><span class=\"xv-cdata-value\">");
            out.push_str(text);
            out.push_str("</span><span class=\"xv-cdata-end\"> ]]&gt;</span>");
        }
        ViewContent::ProcessingInstruction { target, data } => {
            open_span(out, &class_list(&[NODE, "xv-pi"], view, ViewStyle::Main), view);
            out.push_str("&lt;?<span class=\"xv-pi-name\">");
            out.push_str(target);
            out.push_str("</span> <span class=\"xv-pi-value\">");
            out.push_str(data);
            out.push_str("</span>?&gt;");
        }
    }
}

fn close_main(view: &ViewNode, out: &mut String) {
    if let ViewContent::Element {
        name,
        has_children: true,
        ..
    } = &view.content
    {
        out.push_str("</span><span class=\"xv-tag-close\">&lt;/<span class=\"xv-tag-name\">");
        out.push_str(name);
        out.push_str("</span>&gt;</span>");
    }
    out.push_str("</span>");
}

fn open_outline(view: &ViewNode, out: &mut String) {
    let base = [NODE, "xv-outline-node"];
    match &view.content {
        ViewContent::Element {
            name,
            attributes,
            has_children,
        } => {
            let classes = class_list(&[base[0], base[1], "xv-outline-tag"], view, ViewStyle::Outline);
            open_span(out, &classes, view);
            out.push_str("<span class=\"xv-tag-switcher\"></span>");
            out.push_str("<span class=\"xv-outline-node-inner\"><span class=\"xv-outline-item xv-outline-tag-name\">");
            out.push_str(name);
            out.push_str("</span>");
            if !attributes.is_empty() {
                let attrs: Vec<String> = attributes
                    .iter()
                    .map(|(attr, value)| format!("{}: {}", attr, value))
                    .collect();
                out.push(' ');
                out.push_str(&attrs.join(", "));
            }
            out.push_str("</span>");
            if *has_children {
                out.push_str("<span class=\"xv-outline-tag-children\">");
            }
        }
        ViewContent::ProcessingInstruction { target, .. } => {
            let classes = class_list(&[base[0], base[1], "xv-outline-pi"], view, ViewStyle::Outline);
            open_span(out, &classes, view);
            out.push_str("<span class=\"xv-outline-node-inner\"><span class=\"xv-outline-item xv-outline-pi-name\">");
            out.push_str(target);
            out.push_str("</span></span>");
        }
        ViewContent::Comment(line) => {
            let classes = class_list(&[base[0], base[1], "xv-outline-comment"], view, ViewStyle::Outline);
            open_span(out, &classes, view);
            out.push_str("<span class=\"xv-outline-node-inner\">");
            out.push_str(line);
            out.push_str("</span>");
        }
        ViewContent::CData(line) => {
            let classes = class_list(&[base[0], base[1], "xv-outline-cdata"], view, ViewStyle::Outline);
            open_span(out, &classes, view);
            out.push_str("<span class=\"xv-outline-node-inner\"><span class=\"xv-outline-item xv-outline-cdata-name\">CDATA</span> ");
            out.push_str(line);
            out.push_str("</span>");
        }
        // never rendered in the outline
        ViewContent::Text(_) => open_span(out, "xv-text", view),
    }
}

fn close_outline(view: &ViewNode, out: &mut String) {
    if let ViewContent::Element {
        has_children: true, ..
    } = &view.content
    {
        out.push_str("</span>");
    }
    out.push_str("</span>");
}
