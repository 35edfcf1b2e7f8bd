//! Reference resolution
//!
//! Joins extracted references against the [`ImageIndex`]. Pure: no I/O, no
//! side effects beyond diagnostics, input order preserved.

use crate::index::ImageIndex;
use serde::Serialize;
use std::path::PathBuf;
use tracing::{debug, trace};
use vaultlift_parser::ImageReference;

/// A reference whose name was found in the image index
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedReference {
    /// The extracted reference
    pub reference: ImageReference,
    /// Local file the reference points at
    pub local_path: PathBuf,
}

impl ResolvedReference {
    /// Image file name
    pub fn name(&self) -> &str {
        &self.reference.name
    }

    /// Zero-based source line
    pub fn line_number(&self) -> usize {
        self.reference.line_number
    }
}

/// Keep the references that point at indexed local images
///
/// External references and names missing from the index are dropped; both
/// are expected (already-remote links, images kept elsewhere) and only
/// logged.
pub fn resolve(references: &[ImageReference], index: &ImageIndex) -> Vec<ResolvedReference> {
    references
        .iter()
        .filter_map(|reference| {
            if reference.external {
                trace!(
                    "Line {}: skipping external image {}",
                    reference.line_number,
                    reference.target
                );
                return None;
            }

            match index.get(&reference.name) {
                Some(path) => Some(ResolvedReference {
                    reference: reference.clone(),
                    local_path: path.to_path_buf(),
                }),
                None => {
                    debug!(
                        "Line {}: image {} not found under {}",
                        reference.line_number,
                        reference.name,
                        index.root().display()
                    );
                    None
                }
            }
        })
        .collect()
}
