//! Vaultlift Markdown Image Parser
//!
//! Line-oriented extraction of embedded images from markdown notes.
//! This crate provides:
//! - Obsidian-style embeds: `![[name.png]]`, `![[name.png|caption]]`
//! - CommonMark inline images: `![caption](path/to/name.png)`
//! - A uniform [`ImageReference`] record tagged with its line number
//!
//! Both grammars run on every line and never fail: a line that does not
//! match simply contributes no references.

pub mod embeds;
pub mod extractor;
pub mod grammar;
pub mod inline_images;
pub mod names;
pub mod types;

// Re-export main types for convenience
pub use extractor::ReferenceExtractor;
pub use grammar::{GrammarMatch, ImageGrammar};
pub use names::{is_external_target, normalize_name};
pub use types::{is_image_extension, ImageReference, ImageSyntax, IMAGE_EXTENSIONS};

// Convenience factory functions
pub use embeds::create_embed_grammar;
pub use inline_images::create_inline_image_grammar;
