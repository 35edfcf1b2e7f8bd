//! Reference types shared by the grammars and the extractor

use serde::{Deserialize, Serialize};
use std::path::Path;

/// File extensions treated as images, lowercase without the dot
pub const IMAGE_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "gif"];

/// Check whether a path carries one of the [`IMAGE_EXTENSIONS`] (case-insensitive)
pub fn is_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|candidate| ext.eq_ignore_ascii_case(candidate))
        })
        .unwrap_or(false)
}

/// Which syntax produced a reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageSyntax {
    /// `![[name.png|caption]]`
    Embed,
    /// `![caption](path/name.png)`
    Inline,
}

impl std::fmt::Display for ImageSyntax {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImageSyntax::Embed => write!(f, "embed"),
            ImageSyntax::Inline => write!(f, "inline"),
        }
    }
}

/// One matched image occurrence in a document
///
/// Several references may share a `line_number`; they are kept apart by
/// `ordinal`, which is the position of the reference in extraction order
/// (document order, then match order within the line).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageReference {
    /// File name used for index lookups (percent-decoded, directories stripped)
    pub name: String,

    /// Zero-based line index in the source document
    pub line_number: usize,

    /// Byte offset of the match within its line
    pub column: usize,

    /// Alt text or embed caption, empty when absent
    pub caption: String,

    /// Exact text matched, kept for diagnostics only
    pub raw_match: String,

    /// Link target exactly as written (may be a path or a URL)
    pub target: String,

    /// Grammar that produced the match
    pub syntax: ImageSyntax,

    /// Target points at a remote URL rather than a local file
    pub external: bool,

    /// Position in extraction order across the whole document
    pub ordinal: usize,
}

impl ImageReference {
    /// Whether this reference can ever resolve to a local file
    pub fn is_local(&self) -> bool {
        !self.external
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_extension_detection() {
        assert!(is_image_extension(Path::new("a.png")));
        assert!(is_image_extension(Path::new("dir/b.JPG")));
        assert!(is_image_extension(Path::new("c.jpeg")));
        assert!(is_image_extension(Path::new("d.gif")));
        assert!(!is_image_extension(Path::new("e.webp")));
        assert!(!is_image_extension(Path::new("note.md")));
        assert!(!is_image_extension(Path::new("png")));
    }

    #[test]
    fn test_syntax_display() {
        assert_eq!(ImageSyntax::Embed.to_string(), "embed");
        assert_eq!(ImageSyntax::Inline.to_string(), "inline");
    }
}
