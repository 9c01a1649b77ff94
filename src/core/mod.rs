//! Core XML parsing primitives
//!
//! This module contains the fundamental building blocks for XML parsing:
//! - Scanner: SIMD-accelerated delimiter detection using memchr
//! - Tokenizer: pull tokenizer with located syntax errors
//! - Entities: entity decoding and HTML escaping with Cow (zero-copy when possible)
//! - Attributes: start-tag attribute parsing

pub mod attributes;
pub mod entities;
pub mod scanner;
pub mod tokenizer;

pub use tokenizer::ParseError;
