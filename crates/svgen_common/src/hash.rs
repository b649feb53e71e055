//! Structural fingerprints used to bucket candidate duplicate modules.

use serde::{Deserialize, Serialize};
use std::fmt;
use xxhash_rust::xxh3::Xxh3;

/// A 128-bit XXH3 hash of some content.
///
/// Equal hashes are only a hint: callers that need exact equality still
/// compare the underlying structures.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash([u8; 16]);

impl ContentHash {
    /// Computes a content hash from a byte slice using XXH3-128.
    pub fn from_bytes(data: &[u8]) -> Self {
        Self(xxhash_rust::xxh3::xxh3_128(data).to_le_bytes())
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({:02x}{:02x}..)", self.0[0], self.0[1])
    }
}

/// Incremental builder for a [`ContentHash`] over heterogeneous fields.
///
/// Every field is length- or tag-prefixed so that `("ab", "c")` and
/// `("a", "bc")` hash differently.
pub struct ContentHasher {
    state: Xxh3,
}

impl ContentHasher {
    /// Creates an empty hasher.
    pub fn new() -> Self {
        Self { state: Xxh3::new() }
    }

    /// Feeds a string field.
    pub fn str(&mut self, s: &str) -> &mut Self {
        self.u64(s.len() as u64);
        self.state.update(s.as_bytes());
        self
    }

    /// Feeds an integer field.
    pub fn u64(&mut self, v: u64) -> &mut Self {
        self.state.update(&v.to_le_bytes());
        self
    }

    /// Feeds a signed wide integer field.
    pub fn i128(&mut self, v: i128) -> &mut Self {
        self.state.update(&v.to_le_bytes());
        self
    }

    /// Feeds a boolean field.
    pub fn bool(&mut self, v: bool) -> &mut Self {
        self.state.update(&[u8::from(v)]);
        self
    }

    /// Produces the hash of every field fed so far.
    pub fn finish(&self) -> ContentHash {
        ContentHash(self.state.digest128().to_le_bytes())
    }
}

impl Default for ContentHasher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic() {
        let a = ContentHash::from_bytes(b"module top");
        let b = ContentHash::from_bytes(b"module top");
        assert_eq!(a, b);
    }

    #[test]
    fn field_boundaries_matter() {
        let a = ContentHasher::new().str("ab").str("c").finish();
        let b = ContentHasher::new().str("a").str("bc").finish();
        assert_ne!(a, b);
    }

    #[test]
    fn hasher_is_stable_across_instances() {
        let mk = || {
            ContentHasher::new()
                .str("counter")
                .u64(8)
                .bool(true)
                .i128(-3)
                .finish()
        };
        assert_eq!(mk(), mk());
    }

    #[test]
    fn display_is_hex() {
        let s = format!("{}", ContentHash::from_bytes(b"x"));
        assert_eq!(s.len(), 32);
        assert!(s.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn serde_roundtrip() {
        let h = ContentHasher::new().str("sig").finish();
        let json = serde_json::to_string(&h).unwrap();
        let back: ContentHash = serde_json::from_str(&json).unwrap();
        assert_eq!(h, back);
    }
}
