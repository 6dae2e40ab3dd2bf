//! Character-level differ for revision snapshots.
//!
//! [`diff`] produces an ordered edit script of [`Segment`]s. The raw Myers
//! output is merged and then semantically cleaned up so a reviewer sees a
//! few coherent edits rather than scattered single characters.
//! [`render_diff`] turns the script into `<span>`/`<ins>`/`<del>` markup.

mod cleanup;
mod myers;
mod render;

pub use render::render_diff;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Equal,
    Insert,
    Delete,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::Equal => write!(f, "equal"),
            Operation::Insert => write!(f, "insert"),
            Operation::Delete => write!(f, "delete"),
        }
    }
}

/// One run of the edit script
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub op: Operation,
    pub text: String,
}

impl Segment {
    pub fn new(op: Operation, text: impl Into<String>) -> Self {
        Self { op, text: text.into() }
    }
}

/// Working form of a segment while the script is being built
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Chunk {
    pub op: Operation,
    pub chars: Vec<char>,
}

impl Chunk {
    pub fn new(op: Operation, chars: impl Into<Vec<char>>) -> Self {
        Self { op, chars: chars.into() }
    }
}

/// Diff `old` against `new`.
///
/// Identical inputs, including two empty strings, give a single `Equal`
/// segment. Otherwise no segment is empty and neighbouring segments never
/// share an operation.
pub fn diff(old: &str, new: &str) -> Vec<Segment> {
    if old == new {
        return vec![Segment::new(Operation::Equal, old)];
    }

    let a: Vec<char> = old.chars().collect();
    let b: Vec<char> = new.chars().collect();

    let mut chunks = myers::diff_chars(&a, &b);
    cleanup::cleanup_semantic(&mut chunks);

    chunks
        .into_iter()
        .map(|c| Segment {
            op: c.op,
            text: c.chars.into_iter().collect(),
        })
        .collect()
}

/// Text before the edit: equal and deleted runs
pub fn source_text(segments: &[Segment]) -> String {
    segments
        .iter()
        .filter(|s| s.op != Operation::Insert)
        .map(|s| s.text.as_str())
        .collect()
}

/// Text after the edit: equal and inserted runs
pub fn target_text(segments: &[Segment]) -> String {
    segments
        .iter()
        .filter(|s| s.op != Operation::Delete)
        .map(|s| s.text.as_str())
        .collect()
}
