//! XPath Evaluation Engine
//!
//! Evaluates compiled XPath expressions against an XML document with an
//! explicit value stack.

use super::axes::{matches_node_test, navigate};
use super::compiler::{CompiledExpr, CompiledStep, Op};
use super::functions;
use super::parser::BinaryOp;
use super::value::{XPathNode, XPathValue};
use super::XPathError;
use crate::dom::{NamespaceMap, XmlDocument};
use std::collections::HashSet;

/// Evaluation context
pub struct EvalContext<'a> {
    pub doc: &'a XmlDocument,
    pub namespaces: &'a NamespaceMap,
    pub node: XPathNode,
    pub position: usize,
    pub size: usize,
}

impl<'a> EvalContext<'a> {
    pub fn new(doc: &'a XmlDocument, namespaces: &'a NamespaceMap, node: XPathNode) -> Self {
        EvalContext {
            doc,
            namespaces,
            node,
            position: 1,
            size: 1,
        }
    }

    fn at(&self, node: XPathNode, position: usize, size: usize) -> Self {
        EvalContext {
            doc: self.doc,
            namespaces: self.namespaces,
            node,
            position,
            size,
        }
    }

    /// string() of a value against this context's document
    pub fn string(&self, value: &XPathValue) -> String {
        value.to_string_value(self.doc)
    }

    /// number() of a value against this context's document
    pub fn number(&self, value: &XPathValue) -> f64 {
        value.to_number(self.doc)
    }
}

/// Evaluate a compiled expression
pub fn evaluate_compiled(expr: &CompiledExpr, ctx: &EvalContext) -> Result<XPathValue, XPathError> {
    let mut stack: Vec<XPathValue> = Vec::new();

    for op in &expr.ops {
        let value = match op {
            Op::Root => XPathValue::single_node(ctx.doc.document_node()),
            Op::Context => XPathValue::NodeSet(vec![ctx.node]),
            Op::Number(n) => XPathValue::Number(*n),
            Op::String(s) => XPathValue::String(s.clone()),
            Op::Variable(name) => {
                return Err(XPathError::Evaluation(format!("unbound variable ${}", name)));
            }

            Op::Step(step) => {
                let nodes = pop_nodeset(&mut stack, "path step")?;
                XPathValue::NodeSet(apply_step(step, &nodes, ctx)?)
            }

            Op::Filter(pred) => {
                let nodes = pop_nodeset(&mut stack, "predicate")?;
                XPathValue::NodeSet(apply_predicate(pred, nodes, ctx)?)
            }

            Op::Union => {
                let right = pop_nodeset(&mut stack, "union")?;
                let left = pop_nodeset(&mut stack, "union")?;
                XPathValue::NodeSet(document_order(left.into_iter().chain(right)))
            }

            Op::Negate => {
                let val = pop(&mut stack)?;
                XPathValue::Number(-ctx.number(&val))
            }

            Op::Binary(op) => {
                let right = pop(&mut stack)?;
                let left = pop(&mut stack)?;
                binary(*op, &left, &right, ctx)
            }

            Op::Call(name, arg_count) => {
                if stack.len() < *arg_count {
                    return Err(underflow());
                }
                let args = stack.split_off(stack.len() - arg_count);
                functions::call(name, args, ctx)?
            }
        };
        stack.push(value);
    }

    let result = pop(&mut stack)?;
    if !stack.is_empty() {
        return Err(XPathError::Evaluation(
            "expression left extra values on the stack".to_string(),
        ));
    }
    Ok(result)
}

fn underflow() -> XPathError {
    XPathError::Evaluation("evaluation stack underflow".to_string())
}

fn pop(stack: &mut Vec<XPathValue>) -> Result<XPathValue, XPathError> {
    stack.pop().ok_or_else(underflow)
}

fn pop_nodeset(stack: &mut Vec<XPathValue>, what: &str) -> Result<Vec<XPathNode>, XPathError> {
    match pop(stack)? {
        XPathValue::NodeSet(nodes) => Ok(nodes),
        other => Err(XPathError::Evaluation(format!(
            "{} requires a node-set, got {:?}",
            what, other
        ))),
    }
}

/// Sort into document order and drop duplicates
fn document_order(nodes: impl IntoIterator<Item = XPathNode>) -> Vec<XPathNode> {
    let mut seen = HashSet::new();
    let mut result: Vec<XPathNode> = nodes.into_iter().filter(|n| seen.insert(*n)).collect();
    result.sort_unstable_by_key(|n| n.order_key());
    result
}

/// Map every input node through the step. Step predicates see positions
/// in axis order.
fn apply_step(
    step: &CompiledStep,
    nodes: &[XPathNode],
    ctx: &EvalContext,
) -> Result<Vec<XPathNode>, XPathError> {
    let mut result = Vec::new();

    for &node in nodes {
        let mut candidates = Vec::new();
        for candidate in navigate(ctx.doc, node, step.axis) {
            if matches_node_test(ctx.doc, ctx.namespaces, candidate, &step.test)? {
                candidates.push(candidate);
            }
        }
        for pred in &step.predicates {
            candidates = apply_predicate(pred, candidates, ctx)?;
        }
        result.extend(candidates);
    }

    Ok(document_order(result))
}

fn apply_predicate(
    pred: &CompiledExpr,
    nodes: Vec<XPathNode>,
    ctx: &EvalContext,
) -> Result<Vec<XPathNode>, XPathError> {
    let size = nodes.len();
    let mut filtered = Vec::new();

    for (i, node) in nodes.into_iter().enumerate() {
        let pred_ctx = ctx.at(node, i + 1, size);
        let include = match evaluate_compiled(pred, &pred_ctx)? {
            XPathValue::Number(n) => (i + 1) as f64 == n,
            other => other.to_boolean(),
        };
        if include {
            filtered.push(node);
        }
    }

    Ok(filtered)
}

fn binary(op: BinaryOp, left: &XPathValue, right: &XPathValue, ctx: &EvalContext) -> XPathValue {
    let arith = |f: fn(f64, f64) -> f64| XPathValue::Number(f(ctx.number(left), ctx.number(right)));
    match op {
        BinaryOp::Or => XPathValue::Boolean(left.to_boolean() || right.to_boolean()),
        BinaryOp::And => XPathValue::Boolean(left.to_boolean() && right.to_boolean()),
        BinaryOp::Add => arith(|a, b| a + b),
        BinaryOp::Sub => arith(|a, b| a - b),
        BinaryOp::Mul => arith(|a, b| a * b),
        BinaryOp::Div => arith(|a, b| a / b),
        BinaryOp::Mod => arith(|a, b| a % b),
        _ => XPathValue::Boolean(compare(op, left, right, ctx)),
    }
}

/// XPath 1.0 comparison. Node-sets compare existentially over their
/// members' string-values.
fn compare(op: BinaryOp, left: &XPathValue, right: &XPathValue, ctx: &EvalContext) -> bool {
    let strings = |nodes: &[XPathNode]| -> Vec<XPathValue> {
        nodes
            .iter()
            .map(|n| XPathValue::String(n.string_value(ctx.doc)))
            .collect()
    };

    match (left, right) {
        (XPathValue::NodeSet(l), XPathValue::NodeSet(r)) => {
            let rs = strings(r);
            strings(l)
                .iter()
                .any(|a| rs.iter().any(|b| compare_scalars(op, a, b, ctx)))
        }
        (XPathValue::NodeSet(nodes), XPathValue::Boolean(_)) => {
            compare_scalars(op, &XPathValue::Boolean(!nodes.is_empty()), right, ctx)
        }
        (XPathValue::Boolean(_), XPathValue::NodeSet(nodes)) => {
            compare_scalars(op, left, &XPathValue::Boolean(!nodes.is_empty()), ctx)
        }
        (XPathValue::NodeSet(nodes), other) => strings(nodes)
            .iter()
            .any(|s| compare_scalars(op, s, other, ctx)),
        (other, XPathValue::NodeSet(nodes)) => strings(nodes)
            .iter()
            .any(|s| compare_scalars(op, other, s, ctx)),
        _ => compare_scalars(op, left, right, ctx),
    }
}

fn compare_scalars(op: BinaryOp, left: &XPathValue, right: &XPathValue, ctx: &EvalContext) -> bool {
    let is = |pred: fn(&XPathValue) -> bool| pred(left) || pred(right);

    match op {
        BinaryOp::Eq | BinaryOp::NotEq => {
            let equal = if is(|v| matches!(v, XPathValue::Boolean(_))) {
                left.to_boolean() == right.to_boolean()
            } else if is(|v| matches!(v, XPathValue::Number(_))) {
                ctx.number(left) == ctx.number(right)
            } else {
                ctx.string(left) == ctx.string(right)
            };
            equal == (op == BinaryOp::Eq)
        }
        _ => {
            let (a, b) = (ctx.number(left), ctx.number(right));
            match op {
                BinaryOp::Lt => a < b,
                BinaryOp::LtEq => a <= b,
                BinaryOp::Gt => a > b,
                _ => a >= b,
            }
        }
    }
}
