//! Reference extraction
//!
//! Runs every registered grammar over each line of a document and merges the
//! matches into one ordered list of [`ImageReference`]s.
//!
//! ## Ordering
//!
//! References come out in document order, then in order of appearance within
//! a line. `ordinal` records that position and is what later stages use to
//! break ties between references sharing a line.
//!
//! ## Overlaps
//!
//! When matches from different grammars overlap, the one starting first is
//! kept; at equal offsets the grammar with the lower `priority()` wins.

use crate::embeds::create_embed_grammar;
use crate::grammar::{GrammarMatch, SharedGrammar};
use crate::inline_images::create_inline_image_grammar;
use crate::names::{is_external_target, normalize_name};
use crate::types::ImageReference;
use std::path::Path;
use tracing::trace;

/// Extracts image references from markdown text
pub struct ReferenceExtractor {
    grammars: Vec<SharedGrammar>,
}

impl ReferenceExtractor {
    /// Create an extractor with the embed and inline image grammars
    pub fn new() -> Self {
        Self::with_grammars(vec![create_embed_grammar(), create_inline_image_grammar()])
    }

    /// Create an extractor with a custom grammar set
    pub fn with_grammars(grammars: Vec<SharedGrammar>) -> Self {
        Self { grammars }
    }

    /// Names of the registered grammars, in registration order
    pub fn grammar_names(&self) -> Vec<&'static str> {
        self.grammars.iter().map(|g| g.name()).collect()
    }

    /// Extract all references from document text
    ///
    /// Lines are split the same way `str::lines` does (`\n`, with a trailing
    /// `\r` dropped), so `line_number` lines up with a line-by-line reader.
    pub fn extract(&self, content: &str) -> Vec<ImageReference> {
        let mut references = Vec::new();

        for (line_number, line) in content.lines().enumerate() {
            for found in self.matches_for_line(line) {
                let external = is_external_target(&found.target);
                let name = normalize_name(&found.target);
                if name.is_empty() {
                    continue;
                }

                references.push(ImageReference {
                    name,
                    line_number,
                    column: found.start,
                    caption: found.caption,
                    raw_match: found.raw,
                    target: found.target,
                    syntax: found.syntax,
                    external,
                    ordinal: references.len(),
                });
            }
        }

        references
    }

    /// Read a document from disk and extract its references
    ///
    /// Invalid UTF-8 is replaced rather than rejected; replacement never
    /// changes the line count.
    pub fn extract_file(&self, path: &Path) -> std::io::Result<Vec<ImageReference>> {
        let bytes = std::fs::read(path)?;
        let content = String::from_utf8_lossy(&bytes);
        Ok(self.extract(&content))
    }

    /// Merged, non-overlapping matches of all grammars on one line
    fn matches_for_line(&self, line: &str) -> Vec<GrammarMatch> {
        let mut candidates: Vec<(u8, GrammarMatch)> = Vec::new();
        for grammar in &self.grammars {
            if !grammar.can_handle(line) {
                continue;
            }
            let priority = grammar.priority();
            candidates.extend(grammar.find(line).into_iter().map(|m| (priority, m)));
        }

        candidates.sort_by_key(|(priority, m)| (m.start, *priority));

        let mut accepted: Vec<GrammarMatch> = Vec::with_capacity(candidates.len());
        for (_, candidate) in candidates {
            if let Some(previous) = accepted.iter().find(|kept| kept.overlaps(&candidate)) {
                trace!(
                    "Dropping {} match {:?} overlapping {} match {:?}",
                    candidate.syntax,
                    candidate.raw,
                    previous.syntax,
                    previous.raw
                );
                continue;
            }
            accepted.push(candidate);
        }

        accepted
    }
}

impl Default for ReferenceExtractor {
    fn default() -> Self {
        Self::new()
    }
}
