//! Collision-free, keyword-safe identifier allocation.

use crate::keywords::is_keyword;
use std::collections::HashSet;
use tracing::trace;

/// Suffix appended to a suggested name that is a SystemVerilog keyword.
pub const KEYWORD_SUFFIX: &str = "_v";

/// Hands out identifiers that are unique within one scope.
///
/// Every name returned is recorded as taken; no two calls ever return the
/// same name. Suggested names that could not be used verbatim are recorded
/// as renamed, so text captured from the source (assertion arguments) can
/// later be checked against it.
#[derive(Debug, Clone, Default)]
pub struct NameAllocator {
    taken: HashSet<String>,
    renamed: HashSet<String>,
}

impl NameAllocator {
    /// Creates an allocator with no names taken.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a unique name close to `suggested`.
    ///
    /// A keyword gets [`KEYWORD_SUFFIX`]. While the candidate is taken, an
    /// increasing number (`0`, `1`, ...) is appended to the original
    /// suggestion instead. Numbered candidates that happen to be keywords
    /// (`tri0`, `bufif1`) are skipped.
    pub fn allocate(&mut self, suggested: &str) -> String {
        let keyword = is_keyword(suggested);
        let mut name = if keyword {
            format!("{suggested}{KEYWORD_SUFFIX}")
        } else {
            suggested.to_string()
        };

        let mut postfix = 0u32;
        let mut numbered = false;
        while self.taken.contains(&name) || (numbered && is_keyword(&name)) {
            name = format!("{suggested}{postfix}");
            postfix += 1;
            numbered = true;
        }

        if keyword || numbered {
            trace!(suggested, allocated = %name, "name changed");
            self.renamed.insert(suggested.to_string());
        }
        self.taken.insert(name.clone());
        name
    }

    /// Returns `true` if `name` has been handed out.
    pub fn is_taken(&self, name: &str) -> bool {
        self.taken.contains(name)
    }

    /// Returns `true` if a request for `suggested` was ever answered with a
    /// different name.
    pub fn was_renamed(&self, suggested: &str) -> bool {
        self.renamed.contains(suggested)
    }
}
