//! Markdown parsing
//!
//! - Frontmatter extraction (YAML via serde_yaml)
//! - Fence attribute grammar
//! - Cell segmentation via pulldown-cmark

pub(crate) mod attributes;
pub(crate) mod frontmatter;
mod markdown;

pub use markdown::MarkdownParser;
