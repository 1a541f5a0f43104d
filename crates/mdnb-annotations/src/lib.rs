//! mdnb Annotations
//!
//! Schema and validation for per-cell metadata ("annotations").
//!
//! # Core Concepts
//!
//! - [`Annotations`]: closed, fully-typed record plus an `extra` bag
//! - [`AnnotationValidator`]: strict and lenient validation over one schema
//! - [`normalize_metadata`]: legacy-key precedence (`runme.dev/name` etc.)
//! - [`summarize`]: lenient read path used for listings
//!
//! # Example
//!
//! ```rust
//! use mdnb_annotations::AnnotationValidator;
//! use mdnb_document::Metadata;
//!
//! let mut raw = Metadata::new();
//! raw.insert("name".into(), "".into());
//! raw.insert("runme.dev/name".into(), "foo".into());
//!
//! let annotations = AnnotationValidator::new().validate(&raw).unwrap();
//! assert_eq!(annotations.name, "foo");
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod schema;

mod precedence;
mod summary;
mod validation;

pub use precedence::{normalize_metadata, resolve};
pub use schema::{Annotations, FieldKind, FieldSpec, FIELDS};
pub use summary::{summarize, CellSummary};
pub use validation::{AnnotationValidator, CellAnnotations, FieldErrors, ValidationError};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
