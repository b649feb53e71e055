//! Source locations for diagnostics and emitted module/process headers.
//!
//! The object-model collaborator registers every source file it elaborated
//! from in a [`SourceDb`] and hands out [`Span`]s. svgen never reads source
//! text itself; it only resolves spans to `file:line:col` tokens.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Opaque identifier for a source file registered in a [`SourceDb`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct FileId(u32);

impl FileId {
    /// File ID used by spans that have no real location.
    pub const DUMMY: FileId = FileId(u32::MAX);

    /// Creates a `FileId` from a raw `u32` value.
    pub fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw `u32` value.
    pub fn as_raw(self) -> u32 {
        self.0
    }
}

/// A byte offset range within a source file. `start` is inclusive, `end` exclusive.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct Span {
    /// The source file this span belongs to.
    pub file: FileId,
    /// Byte offset of the start of the span.
    pub start: u32,
    /// Byte offset one past the end of the span.
    pub end: u32,
}

impl Span {
    /// A span used when no source location is available.
    pub const DUMMY: Span = Span {
        file: FileId::DUMMY,
        start: 0,
        end: 0,
    };

    /// Creates a new span in the given file with the given byte range.
    pub fn new(file: FileId, start: u32, end: u32) -> Self {
        Self { file, start, end }
    }

    /// Returns `true` if this is the dummy span.
    pub fn is_dummy(&self) -> bool {
        self.file == FileId::DUMMY
    }
}

struct SourceFile {
    path: PathBuf,
    line_starts: Vec<u32>,
}

impl SourceFile {
    fn new(path: PathBuf, content: &str) -> Self {
        let mut line_starts = vec![0u32];
        line_starts.extend(
            content
                .bytes()
                .enumerate()
                .filter(|&(_, b)| b == b'\n')
                .map(|(i, _)| (i + 1) as u32),
        );
        Self { path, line_starts }
    }

    fn line_col(&self, offset: u32) -> (u32, u32) {
        let line_idx = match self.line_starts.binary_search(&offset) {
            Ok(idx) => idx,
            Err(idx) => idx - 1,
        };
        (line_idx as u32 + 1, offset - self.line_starts[line_idx] + 1)
    }
}

/// Registry of source files, resolving spans to line/column coordinates.
///
/// Only line-start offsets are retained; file contents are not kept.
#[derive(Default)]
pub struct SourceDb {
    files: Vec<SourceFile>,
}

impl SourceDb {
    /// Creates an empty source database.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a file by path and content, returning its [`FileId`].
    pub fn add_source(&mut self, path: impl Into<PathBuf>, content: &str) -> FileId {
        let id = FileId::from_raw(self.files.len() as u32);
        self.files.push(SourceFile::new(path.into(), content));
        id
    }

    /// Resolves a span to its starting line and column.
    ///
    /// Returns `None` for dummy spans and spans of unknown files.
    pub fn resolve(&self, span: Span) -> Option<ResolvedSpan> {
        if span.is_dummy() {
            return None;
        }
        let file = self.files.get(span.file.as_raw() as usize)?;
        let (line, col) = file.line_col(span.start);
        Some(ResolvedSpan {
            file_path: file.path.clone(),
            line,
            col,
        })
    }

    /// Renders the short `file:line:col` token used in emitted headers,
    /// or an empty string when the span cannot be resolved.
    pub fn location_token(&self, span: Span) -> String {
        self.resolve(span)
            .map(|r| r.file_token())
            .unwrap_or_default()
    }
}

/// A span resolved to 1-indexed line/column coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSpan {
    /// The path the file was registered under.
    pub file_path: PathBuf,
    /// Line number (1-indexed).
    pub line: u32,
    /// Column number (1-indexed).
    pub col: u32,
}

impl ResolvedSpan {
    /// `name:line:col` with the directory part of the path dropped.
    pub fn file_token(&self) -> String {
        let name = self
            .file_path
            .file_name()
            .map(Path::new)
            .unwrap_or(self.file_path.as_path());
        format!("{}:{}:{}", name.display(), self.line, self.col)
    }
}

impl fmt::Display for ResolvedSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file_path.display(), self.line, self.col)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_line_and_column() {
        let mut db = SourceDb::new();
        let id = db.add_source("src/dut.cpp", "struct A {\n  void proc();\n};\n");
        let r = db.resolve(Span::new(id, 13, 17)).unwrap();
        assert_eq!(r.line, 2);
        assert_eq!(r.col, 3);
        assert_eq!(format!("{r}"), "src/dut.cpp:2:3");
    }

    #[test]
    fn file_token_drops_directories() {
        let mut db = SourceDb::new();
        let id = db.add_source("/home/user/design/top.h", "x");
        assert_eq!(db.location_token(Span::new(id, 0, 1)), "top.h:1:1");
    }

    #[test]
    fn dummy_span_has_empty_token() {
        let db = SourceDb::new();
        assert!(db.resolve(Span::DUMMY).is_none());
        assert_eq!(db.location_token(Span::DUMMY), "");
    }

    #[test]
    fn unknown_file_does_not_resolve() {
        let db = SourceDb::new();
        assert!(db.resolve(Span::new(FileId::from_raw(3), 0, 0)).is_none());
    }

    #[test]
    fn offset_at_line_start() {
        let mut db = SourceDb::new();
        let id = db.add_source("a.cpp", "ab\ncd\n");
        let r = db.resolve(Span::new(id, 3, 4)).unwrap();
        assert_eq!((r.line, r.col), (2, 1));
    }

    #[test]
    fn span_serde_roundtrip() {
        let s = Span::new(FileId::from_raw(1), 4, 9);
        let json = serde_json::to_string(&s).unwrap();
        let back: Span = serde_json::from_str(&json).unwrap();
        assert_eq!(s, back);
    }
}
