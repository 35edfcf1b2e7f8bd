//! Embed syntax
//!
//! Obsidian-style image embeds:
//! - Plain embed: `![[diagram.png]]`
//! - Embed with caption: `![[diagram.png|Figure 1]]`
//! - Embed with a vault path: `![[attachments/diagram.png]]`
//!
//! Only targets ending in one of the image extensions match; note embeds such
//! as `![[Other Note]]` are ignored.

use crate::grammar::{GrammarMatch, ImageGrammar};
use crate::types::ImageSyntax;
use regex::Regex;
use std::sync::{Arc, LazyLock};

static EMBED_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"!\[\[([^\[\]|\n]+?\.(?i:png|jpe?g|gif))(?:\|([^\[\]\n]*))?\]\]")
        .expect("embed regex")
});

/// Embed grammar
pub struct EmbedGrammar;

impl EmbedGrammar {
    /// Create a new embed grammar
    pub fn new() -> Self {
        Self
    }
}

impl Default for EmbedGrammar {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageGrammar for EmbedGrammar {
    fn name(&self) -> &'static str {
        "obsidian-embeds"
    }

    fn syntax(&self) -> ImageSyntax {
        ImageSyntax::Embed
    }

    fn can_handle(&self, line: &str) -> bool {
        line.contains("![[")
    }

    fn find(&self, line: &str) -> Vec<GrammarMatch> {
        EMBED_REGEX
            .captures_iter(line)
            .filter_map(|cap| {
                let full = cap.get(0)?;
                let target = cap.get(1)?.as_str().trim();
                let caption = cap.get(2).map(|m| m.as_str().trim()).unwrap_or_default();

                Some(GrammarMatch {
                    start: full.start(),
                    end: full.end(),
                    raw: full.as_str().to_string(),
                    target: target.to_string(),
                    caption: caption.to_string(),
                    syntax: ImageSyntax::Embed,
                })
            })
            .collect()
    }

    fn priority(&self) -> u8 {
        10 // Embeds win ties; `![[` can never start an inline image
    }
}

/// Factory function to create the embed grammar
pub fn create_embed_grammar() -> Arc<dyn ImageGrammar> {
    Arc::new(EmbedGrammar::new())
}
