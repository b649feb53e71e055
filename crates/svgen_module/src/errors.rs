//! Diagnostic codes and helper functions for module assembly.
//!
//! Error codes `E301`--`E303` cover cross-process use/def conflicts.
//! Internal codes `I401`--`I405` cover assertion arguments that had to be
//! dropped from the output.

use svgen_common::Span;
use svgen_diagnostics::{Category, Diagnostic, DiagnosticCode};

/// Multiple processes drive the same signal.
pub const E301: DiagnosticCode = DiagnosticCode {
    category: Category::Error,
    number: 301,
};

/// Multiple processes access the same variable.
pub const E302: DiagnosticCode = DiagnosticCode {
    category: Category::Error,
    number: 302,
};

/// A method process reads a channel it also drives.
pub const E303: DiagnosticCode = DiagnosticCode {
    category: Category::Error,
    number: 303,
};

/// Assertion argument names a variable that was renamed.
pub const I401: DiagnosticCode = DiagnosticCode {
    category: Category::Internal,
    number: 401,
};

/// Assertion argument indexes an array at a non-literal index.
pub const I402: DiagnosticCode = DiagnosticCode {
    category: Category::Internal,
    number: 402,
};

/// Assertion argument has a malformed `bit()` or `range()` access.
pub const I403: DiagnosticCode = DiagnosticCode {
    category: Category::Internal,
    number: 403,
};

/// Assertion argument contains an unsupported operator.
pub const I404: DiagnosticCode = DiagnosticCode {
    category: Category::Internal,
    number: 404,
};

/// Assertion argument starts with a dereference.
pub const I405: DiagnosticCode = DiagnosticCode {
    category: Category::Internal,
    number: 405,
};

/// Creates a diagnostic for a signal driven from more than one process.
pub fn error_multiple_drivers(name: &str, span: Span) -> Diagnostic {
    Diagnostic::error(E301, format!("multiple processes drive signal `{name}`"), span)
        .with_argument(name)
}

/// Creates a diagnostic for a variable accessed from more than one process.
pub fn error_multiple_access(name: &str, span: Span) -> Diagnostic {
    Diagnostic::error(E302, format!("multiple processes access variable `{name}`"), span)
        .with_argument(name)
        .with_note("a plain variable must be private to one process; use a signal to share it")
}

/// Creates a diagnostic for a method process reading a channel it drives.
pub fn error_use_def_same_process(name: &str, span: Span) -> Diagnostic {
    Diagnostic::error(
        E303,
        format!("signal `{name}` is read in the method process that drives it"),
        span,
    )
    .with_argument(name)
    .with_note("this creates a combinational loop")
}

/// Creates a diagnostic for an assertion argument naming a renamed variable.
pub fn warn_sva_renamed(text: &str) -> Diagnostic {
    Diagnostic::warning(I401, format!("changed variable name in \"{text}\""), Span::DUMMY)
        .with_argument(text)
}

/// Creates a diagnostic for an assertion array access at a non-literal index.
pub fn warn_sva_array_access(text: &str) -> Diagnostic {
    Diagnostic::warning(I402, format!("array access at non-literal index in \"{text}\""), Span::DUMMY)
        .with_argument(text)
}

/// Creates a diagnostic for a malformed `bit()`/`range()` access.
pub fn warn_sva_bit_range(text: &str) -> Diagnostic {
    Diagnostic::warning(I403, format!("incorrect bit()/range() in \"{text}\""), Span::DUMMY)
        .with_argument(text)
}

/// Creates a diagnostic for an unsupported operator in assertion text.
pub fn warn_sva_unsupported(text: &str) -> Diagnostic {
    Diagnostic::warning(I404, format!("unsupported symbol in \"{text}\""), Span::DUMMY)
        .with_argument(text)
}

/// Creates a diagnostic for a leading dereference in assertion text.
pub fn warn_sva_dereference(text: &str) -> Diagnostic {
    Diagnostic::warning(I405, format!("de-reference in \"{text}\""), Span::DUMMY)
        .with_argument(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use svgen_diagnostics::Severity;

    #[test]
    fn error_code_formats() {
        assert_eq!(format!("{E301}"), "E301");
        assert_eq!(format!("{E303}"), "E303");
        assert_eq!(format!("{I405}"), "I405");
    }

    #[test]
    fn conflict_diagnostics_carry_name() {
        let d = error_multiple_drivers("sig", Span::DUMMY);
        assert_eq!(d.code, E301);
        assert_eq!(d.argument.as_deref(), Some("sig"));
        assert!(d.message.contains("sig"));
        let d = error_multiple_access("v", Span::DUMMY);
        assert_eq!(d.code, E302);
        assert_eq!(d.notes.len(), 1);
        let d = error_use_def_same_process("s", Span::DUMMY);
        assert_eq!(d.code, E303);
        assert_eq!(d.severity, Severity::Error);
    }

    #[test]
    fn sva_diagnostics_are_not_errors() {
        for d in [
            warn_sva_renamed("a"),
            warn_sva_array_access("a[i]"),
            warn_sva_bit_range("a.bit(1"),
            warn_sva_unsupported("a::b"),
            warn_sva_dereference("*p"),
        ] {
            assert!(!d.severity.is_error());
            assert!(d.span.is_dummy());
        }
    }
}
