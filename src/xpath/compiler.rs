//! XPath Expression Compiler
//!
//! Flattens parsed XPath expressions into a postfix op list for the stack
//! evaluator. Unknown functions and wrong argument counts are rejected here,
//! so a cached expression never fails for those reasons at evaluation time.

use super::functions;
use super::parser::{Axis, BinaryOp, Expr, NodeTest, Step};
use super::XPathError;

/// Compiled XPath expression
#[derive(Debug, Clone)]
pub struct CompiledExpr {
    pub ops: Vec<Op>,
}

/// Compiled location step: axis, node test and per-step predicates
#[derive(Debug, Clone)]
pub struct CompiledStep {
    pub axis: Axis,
    pub test: CompiledNodeTest,
    pub predicates: Vec<CompiledExpr>,
}

/// Compiled operation
#[derive(Debug, Clone)]
pub enum Op {
    /// Push the document node onto the stack
    Root,
    /// Push context node onto the stack
    Context,
    /// Map the top node-set through a location step
    Step(Box<CompiledStep>),
    /// Filter the top node-set by a predicate, positions in document order
    Filter(Box<CompiledExpr>),
    /// Union two node sets
    Union,
    /// Push literal number
    Number(f64),
    /// Push literal string
    String(String),
    /// Call function
    Call(String, usize), // name, arg count
    /// Binary operation
    Binary(BinaryOp),
    /// Negate
    Negate,
    /// Variable reference
    Variable(String),
}

/// Compiled node test
pub type CompiledNodeTest = NodeTest;

impl CompiledExpr {
    /// Compile an XPath expression
    pub fn compile(expr: &Expr) -> Result<Self, XPathError> {
        let mut ops = Vec::new();
        Self::compile_expr(expr, &mut ops)?;
        Ok(CompiledExpr { ops })
    }

    fn compile_expr(expr: &Expr, ops: &mut Vec<Op>) -> Result<(), XPathError> {
        match expr {
            Expr::Root => ops.push(Op::Root),
            Expr::Number(n) => ops.push(Op::Number(*n)),
            Expr::String(s) => ops.push(Op::String(s.clone())),
            Expr::Variable(name) => ops.push(Op::Variable(name.clone())),
            Expr::Negate(inner) => {
                Self::compile_expr(inner, ops)?;
                ops.push(Op::Negate);
            }
            Expr::Binary(left, op, right) => {
                Self::compile_expr(left, ops)?;
                Self::compile_expr(right, ops)?;
                ops.push(Op::Binary(*op));
            }
            Expr::Union(left, right) => {
                Self::compile_expr(left, ops)?;
                Self::compile_expr(right, ops)?;
                ops.push(Op::Union);
            }
            Expr::Path(base, step) => {
                Self::compile_expr(base, ops)?;
                ops.push(Op::Step(Box::new(Self::compile_step(step)?)));
            }
            Expr::Step(step) => {
                ops.push(Op::Context);
                ops.push(Op::Step(Box::new(Self::compile_step(step)?)));
            }
            Expr::Filter(base, pred) => {
                Self::compile_expr(base, ops)?;
                ops.push(Op::Filter(Box::new(CompiledExpr::compile(pred)?)));
            }
            Expr::Function(name, args) => {
                let (min, max) =
                    functions::arity(name).ok_or_else(|| XPathError::UnknownFunction(name.clone()))?;
                if args.len() < min || args.len() > max {
                    return Err(XPathError::WrongArity {
                        function: name.clone(),
                        count: args.len(),
                    });
                }
                for arg in args {
                    Self::compile_expr(arg, ops)?;
                }
                ops.push(Op::Call(name.clone(), args.len()));
            }
        }
        Ok(())
    }

    fn compile_step(step: &Step) -> Result<CompiledStep, XPathError> {
        let predicates = step
            .predicates
            .iter()
            .map(CompiledExpr::compile)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(CompiledStep {
            axis: step.axis,
            test: step.node_test.clone(),
            predicates,
        })
    }
}

/// Compile an XPath expression string
pub fn compile(xpath: &str) -> Result<CompiledExpr, XPathError> {
    let expr = super::parser::parse(xpath)?;
    CompiledExpr::compile(&expr)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_absolute() {
        let compiled = compile("/root").unwrap();
        assert!(matches!(compiled.ops[0], Op::Root));
        assert!(matches!(&compiled.ops[1], Op::Step(step) if step.axis == Axis::Child));
    }

    #[test]
    fn test_compile_descendant() {
        let compiled = compile("//item[2]").unwrap();
        assert_eq!(compiled.ops.len(), 3);
        let Op::Step(step) = &compiled.ops[2] else {
            panic!("expected step");
        };
        assert_eq!(step.predicates.len(), 1);
    }

    #[test]
    fn test_unknown_function_rejected() {
        assert!(matches!(
            compile("frobnicate(1)"),
            Err(XPathError::UnknownFunction(name)) if name == "frobnicate"
        ));
        assert!(matches!(
            compile("count()"),
            Err(XPathError::WrongArity { count: 0, .. })
        ));
    }
}
