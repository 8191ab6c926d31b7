// src/core/types.rs
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single phonetic segment, e.g. "a", "tʃ" or "sʰ".
pub type Segment = String;

/// Marks the start or end of a sequence in a gappy bigram.
pub const BOUNDARY: &str = "#";

/// The gap symbol produced by the alignment step for insertions and deletions.
pub const GAP: &str = "-";

/// An ordered language pair. Models are directional: `from -> to`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LanguagePair {
    pub from: String,
    pub to: String,
}

impl LanguagePair {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

impl fmt::Display for LanguagePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.from, self.to)
    }
}

/// One column of an alignment between a form in language A (`upper`) and a
/// form in language B (`lower`), with its information weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignedPair {
    pub upper: Segment,
    pub lower: Segment,
    pub weight: f64,
}

impl AlignedPair {
    pub fn new(upper: impl Into<Segment>, lower: impl Into<Segment>, weight: f64) -> Self {
        Self {
            upper: upper.into(),
            lower: lower.into(),
            weight,
        }
    }
}

/// Context key for a segment: its left neighbour, itself, its right neighbour.
/// Kept as three slots so that multi-character segments never collide; the
/// display form is the plain concatenation.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GappyBigram {
    pub prev: Segment,
    pub current: Segment,
    pub next: Segment,
}

impl GappyBigram {
    pub fn new(prev: impl Into<Segment>, current: impl Into<Segment>, next: impl Into<Segment>) -> Self {
        Self {
            prev: prev.into(),
            current: current.into(),
            next: next.into(),
        }
    }

    /// Builds the context key for position `i` of `sequence`, using the
    /// boundary symbol at either edge. `i` must be a valid index.
    pub fn at<S: AsRef<str>>(sequence: &[S], i: usize) -> Self {
        let prev = if i == 0 { BOUNDARY } else { sequence[i - 1].as_ref() };
        let next = if i + 1 == sequence.len() { BOUNDARY } else { sequence[i + 1].as_ref() };
        Self::new(prev, sequence[i].as_ref(), next)
    }
}

impl fmt::Display for GappyBigram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.prev, self.current, self.next)
    }
}
