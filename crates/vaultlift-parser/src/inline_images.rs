//! Inline image syntax
//!
//! CommonMark inline images:
//! - `![alt](image.png)` and `![](image.png)`
//! - Paths with directories: `![alt](../assets/image.png)`
//! - Angle-bracket destinations with spaces: `![alt](<my image.png>)`
//! - Optional titles: `![alt](image.png "Title")`
//! - One level of brackets in the alt text: `![see [1]](image.png)`
//! - One level of parentheses in the path: `![alt](shot(2).png)`
//!
//! Remote destinations (`https://...`) still match here; the extractor marks
//! them external so they never resolve.

use crate::grammar::{GrammarMatch, ImageGrammar};
use crate::types::ImageSyntax;
use regex::Regex;
use std::sync::{Arc, LazyLock};

static INLINE_IMAGE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"!\[(?P<caption>(?:[^\[\]\n]|\[[^\[\]\n]*\])*)\]",
        r"\(\s*",
        r"(?:<(?P<angled>[^<>\n]+?\.(?i:png|jpe?g|gif))>",
        r"|(?P<bare>(?:[^()<>\s]|\([^()<>\s]*\))+?\.(?i:png|jpe?g|gif)))",
        r#"(?:\s+(?:"[^"\n]*"|'[^'\n]*'))?"#,
        r"\s*\)",
    ))
    .expect("inline image regex")
});

/// Inline image grammar
pub struct InlineImageGrammar;

impl InlineImageGrammar {
    /// Create a new inline image grammar
    pub fn new() -> Self {
        Self
    }
}

impl Default for InlineImageGrammar {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageGrammar for InlineImageGrammar {
    fn name(&self) -> &'static str {
        "commonmark-inline-images"
    }

    fn syntax(&self) -> ImageSyntax {
        ImageSyntax::Inline
    }

    fn can_handle(&self, line: &str) -> bool {
        line.contains("![") && line.contains("](")
    }

    fn find(&self, line: &str) -> Vec<GrammarMatch> {
        INLINE_IMAGE_REGEX
            .captures_iter(line)
            .filter_map(|cap| {
                let full = cap.get(0)?;
                let target = cap.name("angled").or_else(|| cap.name("bare"))?;
                let caption = cap
                    .name("caption")
                    .map(|m| m.as_str().trim())
                    .unwrap_or_default();

                Some(GrammarMatch {
                    start: full.start(),
                    end: full.end(),
                    raw: full.as_str().to_string(),
                    target: target.as_str().trim().to_string(),
                    caption: caption.to_string(),
                    syntax: ImageSyntax::Inline,
                })
            })
            .collect()
    }

    fn priority(&self) -> u8 {
        20
    }
}

/// Factory function to create the inline image grammar
pub fn create_inline_image_grammar() -> Arc<dyn ImageGrammar> {
    Arc::new(InlineImageGrammar::new())
}
