//! XPath 1.0 Engine
//!
//! Lexer -> parser -> compiler -> stack evaluator, with:
//! - All 13 axes in proximity order
//! - The XPath 1.0 core function library (minus `id()`)
//! - Prefix resolution through the document's `NamespaceMap`
//! - Compiled expression caching (LRU)

pub mod axes;
pub mod compiler;
pub mod eval;
pub mod functions;
pub mod lexer;
pub mod parser;
pub mod value;

use crate::dom::{NamespaceMap, XmlDocument, DOCUMENT_NODE};
use compiler::CompiledExpr;
use eval::{evaluate_compiled, EvalContext};
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Arc;

pub use value::{XPathNode, XPathValue};

/// Default number of compiled expressions kept by `CachedEvaluator`
pub const DEFAULT_CACHE_CAPACITY: usize = 64;

/// XPath failure, from tokenizing through evaluation
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum XPathError {
    #[error("XPath syntax error at offset {offset}: {message}")]
    Syntax { message: String, offset: usize },

    #[error("unknown XPath function {0}()")]
    UnknownFunction(String),

    #[error("{function}() does not take {count} argument(s)")]
    WrongArity { function: String, count: usize },

    #[error("unresolved namespace prefix '{0}'")]
    UnresolvedPrefix(String),

    #[error("XPath evaluation failed: {0}")]
    Evaluation(String),
}

/// Evaluates an expression with the document node as context
pub trait XPathEvaluator {
    fn evaluate(
        &mut self,
        doc: &XmlDocument,
        namespaces: &NamespaceMap,
        expr: &str,
    ) -> Result<XPathValue, XPathError>;
}

/// Evaluator that keeps recently compiled expressions
pub struct CachedEvaluator {
    cache: LruCache<String, Arc<CompiledExpr>>,
}

impl Default for CachedEvaluator {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

impl CachedEvaluator {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        CachedEvaluator {
            cache: LruCache::new(capacity),
        }
    }

    /// Compile or fetch a cached compilation
    pub fn compiled(&mut self, expr: &str) -> Result<Arc<CompiledExpr>, XPathError> {
        if let Some(compiled) = self.cache.get(expr) {
            return Ok(Arc::clone(compiled));
        }
        let compiled = Arc::new(compiler::compile(expr)?);
        self.cache.put(expr.to_string(), Arc::clone(&compiled));
        Ok(compiled)
    }

    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }
}

impl XPathEvaluator for CachedEvaluator {
    fn evaluate(
        &mut self,
        doc: &XmlDocument,
        namespaces: &NamespaceMap,
        expr: &str,
    ) -> Result<XPathValue, XPathError> {
        let compiled = self.compiled(expr)?;
        let ctx = EvalContext::new(doc, namespaces, XPathNode::Node(DOCUMENT_NODE));
        evaluate_compiled(&compiled, &ctx)
    }
}

/// One-shot evaluation without caching
pub fn evaluate(
    doc: &XmlDocument,
    namespaces: &NamespaceMap,
    expr: &str,
) -> Result<XPathValue, XPathError> {
    let compiled = compiler::compile(expr)?;
    let ctx = EvalContext::new(doc, namespaces, XPathNode::Node(DOCUMENT_NODE));
    evaluate_compiled(&compiled, &ctx)
}
