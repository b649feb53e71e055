//! Sanitizing assertion arguments captured as source text.
//!
//! Assertion expressions reach the generator as the literal text written
//! in the design source. Before that text can be pasted into a property it
//! is cleaned of accessor noise and checked for constructs that have no
//! direct SystemVerilog meaning. Rejected text is dropped with a
//! diagnostic; assembly continues.

use crate::errors::{warn_sva_array_access, warn_sva_bit_range, warn_sva_dereference, warn_sva_renamed, warn_sva_unsupported};
use crate::module::SvModule;
use crate::names::NameAllocator;
use svgen_diagnostics::DiagnosticSink;
use tracing::trace;

const NOOP_ACCESSORS: [&str; 4] = [".read()", "->read()", "this->", "(*this)."];

/// Cleans an assertion argument and checks it against the renames
/// recorded by `names`.
///
/// Whitespace is dropped, read accessors and `this` qualification are
/// removed, and `x.bit(i)` / `x.range(h, l)` become `x[i]` / `x[h:l]`.
/// Text is rejected when it names a renamed variable, indexes at a
/// non-literal, has malformed `bit()`/`range()` calls, keeps a `::`, `->`,
/// `.`, or single `&` operator, or starts with a dereference.
pub fn sanitize_sva_arg(names: &NameAllocator, text: &str, sink: &DiagnosticSink) -> Option<String> {
    let mut s: String = text.chars().filter(|c| !c.is_whitespace()).collect();

    if let Some(ident) = identifiers(&s).find(|ident| names.was_renamed(ident)) {
        trace!(ident, "assertion names a renamed variable");
        sink.emit(warn_sva_renamed(text));
        return None;
    }

    for accessor in NOOP_ACCESSORS {
        s = s.replace(accessor, "");
    }

    if has_non_literal_index(&s) {
        sink.emit(warn_sva_array_access(text));
        return None;
    }

    for (pattern, range) in [(".bit(", false), ("->bit(", false), (".range(", true), ("->range(", true)] {
        match replace_accessor(&s, pattern, range) {
            Some(replaced) => s = replaced,
            None => {
                sink.emit(warn_sva_bit_range(text));
                return None;
            }
        }
    }

    if s.contains("::") || s.contains("->") || s.contains('.') || has_single_ampersand(&s) {
        sink.emit(warn_sva_unsupported(text));
        return None;
    }

    if s.trim_start_matches('(').starts_with('*') {
        sink.emit(warn_sva_dereference(text));
        return None;
    }

    Some(s)
}

impl SvModule {
    /// Sanitizes an assertion argument against this module's renames.
    pub fn parse_sva_arg(&self, text: &str, sink: &DiagnosticSink) -> Option<String> {
        sanitize_sva_arg(&self.names, text, sink)
    }
}

/// Identifier-shaped tokens: a letter or underscore, then letters, digits,
/// or underscores.
fn identifiers(s: &str) -> impl Iterator<Item = &str> {
    let bytes = s.as_bytes();
    let mut pos = 0;
    std::iter::from_fn(move || {
        while pos < bytes.len() {
            let c = bytes[pos];
            if c == b'_' || c.is_ascii_alphabetic() {
                let start = pos;
                while pos < bytes.len() && (bytes[pos] == b'_' || bytes[pos].is_ascii_alphanumeric()) {
                    pos += 1;
                }
                return Some(&s[start..pos]);
            }
            pos += 1;
        }
        None
    })
}

fn has_non_literal_index(s: &str) -> bool {
    let mut rest = s;
    while let Some(open) = rest.find('[') {
        let tail = &rest[open + 1..];
        let Some(close) = tail.find(']') else { return true };
        let index = &tail[..close];
        if index.is_empty() || !index.bytes().all(|b| b.is_ascii_digit()) {
            return true;
        }
        rest = &tail[close + 1..];
    }
    false
}

/// Byte offset of the `)` closing an already opened parenthesis.
fn closing_paren(s: &str) -> Option<usize> {
    let mut depth = 1usize;
    for (i, c) in s.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

fn top_level_comma(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (i, c) in s.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => return Some(i),
            _ => {}
        }
    }
    None
}

fn replace_accessor(s: &str, pattern: &str, range: bool) -> Option<String> {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(pos) = rest.find(pattern) {
        out.push_str(&rest[..pos]);
        let args_start = pos + pattern.len();
        let close = closing_paren(&rest[args_start..])?;
        let args = &rest[args_start..args_start + close];
        if args.is_empty() {
            return None;
        }
        out.push('[');
        if range {
            let comma = top_level_comma(args)?;
            out.push_str(&args[..comma]);
            out.push(':');
            out.push_str(&args[comma + 1..]);
        } else {
            out.push_str(args);
        }
        out.push(']');
        rest = &rest[args_start + close + 1..];
    }
    out.push_str(rest);
    Some(out)
}

/// `&` outside of a logical `&&`.
fn has_single_ampersand(s: &str) -> bool {
    let bytes = s.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'&' {
            if bytes.get(i + 1) == Some(&b'&') {
                i += 2;
                continue;
            }
            return true;
        }
        i += 1;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{I401, I402, I403, I404, I405};

    fn check(names: &NameAllocator, text: &str) -> (Option<String>, DiagnosticSink) {
        let sink = DiagnosticSink::new();
        let out = sanitize_sva_arg(names, text, &sink);
        (out, sink)
    }

    #[test]
    fn strips_whitespace_and_accessors() {
        let names = NameAllocator::new();
        let (out, sink) = check(&names, " this->req.read() && (*this).ack ");
        assert_eq!(out.as_deref(), Some("req&&ack"));
        assert!(sink.diagnostics().is_empty());
    }

    #[test]
    fn rewrites_bit_and_range() {
        let names = NameAllocator::new();
        let (out, _) = check(&names, "data.bit(3) == ptr->range(7, 4)");
        assert_eq!(out.as_deref(), Some("data[3]==ptr[7:4]"));
        let (out, _) = check(&names, "v.range(W-1,(0))");
        assert_eq!(out.as_deref(), Some("v[W-1:(0)]"));
    }

    #[test]
    fn renamed_identifier_rejected() {
        let mut names = NameAllocator::new();
        names.allocate("cnt");
        names.allocate("cnt");
        let (out, sink) = check(&names, "cnt > 0");
        assert!(out.is_none());
        assert_eq!(sink.count_code(I401), 1);
        assert_eq!(sink.diagnostics()[0].argument.as_deref(), Some("cnt > 0"));
        let (out, _) = check(&names, "cnt0 > 0");
        assert!(out.is_some());
    }

    #[test]
    fn non_literal_index_rejected() {
        let names = NameAllocator::new();
        let (out, sink) = check(&names, "arr[i] == 1");
        assert!(out.is_none());
        assert_eq!(sink.count_code(I402), 1);
        assert_eq!(check(&names, "arr[12][0]").0.as_deref(), Some("arr[12][0]"));
    }

    #[test]
    fn unbalanced_bit_rejected() {
        let names = NameAllocator::new();
        let (out, sink) = check(&names, "a.bit(1");
        assert!(out.is_none());
        assert_eq!(sink.count_code(I403), 1);
        let (out, _) = check(&names, "a.range(1)");
        assert!(out.is_none());
    }

    #[test]
    fn residual_operators_rejected() {
        let names = NameAllocator::new();
        for text in ["ns::val", "p->x", "s.f", "a & b", "&a"] {
            let (out, sink) = check(&names, text);
            assert!(out.is_none(), "{text}");
            assert_eq!(sink.count_code(I404), 1, "{text}");
        }
    }

    #[test]
    fn leading_dereference_rejected() {
        let names = NameAllocator::new();
        let (out, sink) = check(&names, "((*p))");
        assert!(out.is_none());
        assert_eq!(sink.count_code(I405), 1);
        assert_eq!(check(&names, "a*b").0.as_deref(), Some("a*b"));
    }

    #[test]
    fn identifier_scan() {
        let ids: Vec<_> = identifiers("a_1+_b*9c").collect();
        assert_eq!(ids, vec!["a_1", "_b", "c"]);
    }
}
