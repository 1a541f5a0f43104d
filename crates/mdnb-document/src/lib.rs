//! mdnb Document Model
//!
//! The structured notebook representation shared by every mdnb crate.
//!
//! # Core Concepts
//!
//! - [`Document`]: ordered cells plus frontmatter and metadata
//! - [`Cell`]: tagged union over [`MarkupCell`] and [`CodeCell`]
//! - [`Frontmatter`]: document-level declarations, including identity
//! - [`ContentHash`]: 32-byte Blake3 hash for content addressing
//!
//! # Example
//!
//! ```rust
//! use mdnb_document::{CodeCell, Document};
//!
//! let doc = Document::new()
//!     .with_markup("# Setup")
//!     .with_code(CodeCell::new("npm install", "zsh"));
//!
//! assert_eq!(doc.code_cells().next().unwrap().language_id, "sh");
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod document;
mod frontmatter;
mod hash;
mod language;

pub use document::{
    Cell, CellKind, CodeCell, Document, ExecutionSummary, MarkupCell, Metadata,
    FINAL_LINE_BREAKS_KEY,
};
pub use frontmatter::{Frontmatter, RunmeMetadata};
pub use hash::ContentHash;
pub use language::{
    is_shell_language, normalize_language, ShellType, UnknownShell, DEFAULT_LANGUAGE,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
