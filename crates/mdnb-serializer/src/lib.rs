//! mdnb Serialization Layer
//!
//! The boundary between markdown files and structured notebooks.
//!
//! # Core Operations
//!
//! - **Deserialize**: UTF-8 markdown bytes into a [`Document`](mdnb_document::Document)
//! - **Serialize**: a document back into markdown bytes
//! - **Identity**: document and cell ids assigned on both paths
//!
//! # Architecture
//!
//! ```text
//! bytes → MarkdownParser → Document → IdentityAssigner → Document'
//!              ↑_______↓                                    │
//!            DocumentCache (content-addressed)     MarkdownWriter → bytes
//! ```
//!
//! Round trips are lossless apart from annotation values equal to their
//! schema default, which are omitted on write.
//!
//! # Example
//!
//! ```rust
//! use mdnb_serializer::{LayerConfig, SerializationLayer};
//! use mdnb_identity::IdentityPolicy;
//!
//! let layer = SerializationLayer::with_config(
//!     LayerConfig::default().with_identity(IdentityPolicy::None),
//! );
//!
//! let source = b"# Demo\n\n```sh { name=hello }\necho hi\n```\n";
//! let document = layer.parse_document(source).unwrap();
//! assert_eq!(document.cells.len(), 2);
//!
//! let bytes = layer.render_document(&document).unwrap();
//! assert_eq!(bytes, source.to_vec());
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

// Core modules
pub mod cache;
pub mod error;
pub mod layer;
pub mod parsers;
pub mod render;
pub mod service;
pub mod wire;

// Re-exports for convenience
pub use cache::{CacheStats, DocumentCache};
pub use error::{ParseError, SerializeError, SerializerError, SerializerResult};
pub use layer::{LayerConfig, SerializationLayer};
pub use parsers::MarkdownParser;
pub use render::MarkdownWriter;
pub use service::{dispatch, Method, ParserService, ServiceError, SERVICE_NAME};
pub use wire::{
    DeserializeRequest, DeserializeResponse, SerializeRequest, SerializeResponse, WireNotebook,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with the serialization layer
    pub use crate::error::{ParseError, SerializeError, SerializerError};
    pub use crate::layer::{LayerConfig, SerializationLayer};
    pub use crate::service::ParserService;
    pub use mdnb_document::{Cell, CodeCell, Document};
    pub use mdnb_identity::IdentityPolicy;
}
