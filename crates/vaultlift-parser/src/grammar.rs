//! Grammar abstraction
//!
//! Each image syntax is a self-contained matcher over a single line. The
//! extractor owns a list of grammars and merges their matches; grammars never
//! see each other's captures.

use crate::types::ImageSyntax;
use std::sync::Arc;

/// A raw match produced by one grammar on one line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrammarMatch {
    /// Byte offset where the match starts
    pub start: usize,
    /// Byte offset one past the end of the match
    pub end: usize,
    /// Matched text
    pub raw: String,
    /// Link target as written, before any normalization
    pub target: String,
    /// Caption or alt text, empty when absent
    pub caption: String,
    /// Grammar that produced the match
    pub syntax: ImageSyntax,
}

impl GrammarMatch {
    /// Whether two matches cover any common byte
    pub fn overlaps(&self, other: &GrammarMatch) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// A single image syntax matcher
pub trait ImageGrammar: Send + Sync {
    /// Stable name used in logs
    fn name(&self) -> &'static str;

    /// Syntax produced by this grammar
    fn syntax(&self) -> ImageSyntax;

    /// Cheap substring check before running the regex
    fn can_handle(&self, line: &str) -> bool;

    /// All non-overlapping matches on `line`, in order of appearance
    fn find(&self, line: &str) -> Vec<GrammarMatch>;

    /// Tie-break rank when two grammars match overlapping text at the same
    /// offset; lower wins
    fn priority(&self) -> u8 {
        100
    }
}

/// Shared handle to a grammar
pub type SharedGrammar = Arc<dyn ImageGrammar>;
