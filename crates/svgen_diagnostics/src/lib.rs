//! Diagnostic codes, severities, and the accumulating diagnostic sink.
//!
//! A diagnostic is reported as a (location, code, argument) tuple. Message
//! wording is fixed per code; rendering for terminals or editors is left
//! to the caller.

#![warn(missing_docs)]

pub mod code;
pub mod diagnostic;
pub mod severity;
pub mod sink;

pub use code::{Category, DiagnosticCode};
pub use diagnostic::Diagnostic;
pub use severity::Severity;
pub use sink::DiagnosticSink;
