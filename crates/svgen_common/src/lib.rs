//! Shared foundational types used across the svgen SystemVerilog generator.
//!
//! This crate provides the contract-failure error type, structural content
//! hashing, and source locations used by diagnostics and emitted headers.

#![warn(missing_docs)]

pub mod hash;
pub mod result;
pub mod source;

pub use hash::{ContentHash, ContentHasher};
pub use result::{InternalError, SvgenResult};
pub use source::{FileId, ResolvedSpan, SourceDb, Span};
