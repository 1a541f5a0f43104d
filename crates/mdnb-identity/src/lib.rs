//! mdnb Identity
//!
//! Deterministic, namespaced identifiers for documents and code cells.
//!
//! # Core Concepts
//!
//! - [`IdentityNamespace`]: machine-salted v5 UUID namespace
//! - [`IdentityPolicy`]: `none`, `document` or `all`
//! - [`IdentityAssigner`]: fills missing ids and heals duplicates in place
//! - [`terminal_name`] / [`terminal_cell_id`]: tag terminals with a cell id
//!
//! # Example
//!
//! ```rust
//! use mdnb_document::{CodeCell, Document};
//! use mdnb_identity::{IdentityAssigner, IdentityNamespace, IdentityPolicy};
//!
//! let mut doc = Document::new().with_code(CodeCell::new("echo hi", "sh"));
//! let assigner = IdentityAssigner::new(IdentityNamespace::default(), IdentityPolicy::All);
//!
//! let report = assigner.assign(&mut doc);
//! assert_eq!(report.cells_assigned, 1);
//! assert!(!assigner.assign(&mut doc).changed());
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod assigner;
mod namespace;
mod policy;
mod terminal;

pub use assigner::{cell_id, AssignmentReport, IdentityAssigner};
pub use namespace::{
    document_uri_hash, namespaced_machine_id, IdentityNamespace, ANONYMOUS_MACHINE,
    DEFAULT_NAMESPACE,
};
pub use policy::{IdentityPolicy, UnknownPolicy};
pub use terminal::{terminal_cell_id, terminal_name, TERMINAL_ID_ENV};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
