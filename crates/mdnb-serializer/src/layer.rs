//! Serialization Layer - Main entry point
//!
//! The trusted boundary between markdown bytes and notebook documents:
//! - Bytes -> Document (deserialize), cached by content hash
//! - Document -> Bytes (serialize)
//! - Identity assignment in both directions

use crate::cache::{DocumentCache, DEFAULT_CACHE_CAPACITY};
use crate::error::{ParseError, SerializeError};
use crate::parsers::MarkdownParser;
use crate::render::MarkdownWriter;
use mdnb_document::{ContentHash, Document};
use mdnb_identity::{
    AssignmentReport, IdentityAssigner, IdentityNamespace, IdentityPolicy, ANONYMOUS_MACHINE,
    DEFAULT_NAMESPACE,
};
use serde::{Deserialize, Serialize};

/// Default maximum source size (10 MiB)
pub const DEFAULT_MAX_SOURCE_SIZE: usize = 10 * 1024 * 1024;

/// Layer configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayerConfig {
    /// Which ids are assigned
    pub identity: IdentityPolicy,
    /// Host machine id salting the identity namespace
    pub machine_id: String,
    /// Caller namespace string
    pub namespace: String,
    /// Maximum number of cached parse results
    pub cache_capacity: u64,
    /// Largest accepted source, in bytes
    pub max_source_size: usize,
}

impl LayerConfig {
    /// Builder: identity policy
    #[must_use]
    pub fn with_identity(mut self, policy: IdentityPolicy) -> Self {
        self.identity = policy;
        self
    }

    /// Builder: machine id
    #[must_use]
    pub fn with_machine_id(mut self, machine_id: impl Into<String>) -> Self {
        self.machine_id = machine_id.into();
        self
    }

    /// Builder: namespace string
    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Builder: cache capacity
    #[must_use]
    pub fn with_cache_capacity(mut self, capacity: u64) -> Self {
        self.cache_capacity = capacity;
        self
    }

    /// Builder: size limit
    #[must_use]
    pub fn with_max_source_size(mut self, limit: usize) -> Self {
        self.max_source_size = limit;
        self
    }

    /// Salted identity namespace
    #[must_use]
    pub fn identity_namespace(&self) -> IdentityNamespace {
        IdentityNamespace::new(&self.machine_id, &self.namespace)
    }
}

impl Default for LayerConfig {
    fn default() -> Self {
        Self {
            identity: IdentityPolicy::default(),
            machine_id: ANONYMOUS_MACHINE.to_string(),
            namespace: DEFAULT_NAMESPACE.to_string(),
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            max_source_size: DEFAULT_MAX_SOURCE_SIZE,
        }
    }
}

/// Serialization Layer
///
/// Stateless apart from the parse cache; safe to share between threads.
/// Each call works on its own document value.
#[derive(Debug, Clone)]
pub struct SerializationLayer {
    parser: MarkdownParser,
    writer: MarkdownWriter,
    cache: DocumentCache,
    assigner: IdentityAssigner,
    config: LayerConfig,
}

impl SerializationLayer {
    /// Create layer with default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(LayerConfig::default())
    }

    /// Create layer from configuration
    #[must_use]
    pub fn with_config(config: LayerConfig) -> Self {
        tracing::info!(
            "serialization layer: identity={} namespace={} cache_capacity={}",
            config.identity,
            config.namespace,
            config.cache_capacity
        );
        Self {
            parser: MarkdownParser::new(),
            writer: MarkdownWriter::new(),
            cache: DocumentCache::new(config.cache_capacity),
            assigner: IdentityAssigner::new(config.identity_namespace(), config.identity),
            config,
        }
    }

    /// Parse markdown bytes into a document (Deserialize)
    ///
    /// Zero-length input yields an empty document without identity.
    ///
    /// # Errors
    /// - `ParseError::SourceTooLarge` above the configured limit
    /// - any [`ParseError`] of [`MarkdownParser::parse`]
    pub fn parse_document(&self, source: &[u8]) -> Result<Document, ParseError> {
        if source.len() > self.config.max_source_size {
            return Err(ParseError::SourceTooLarge {
                size: source.len(),
                limit: self.config.max_source_size,
            });
        }

        let checksum = ContentHash::compute(source);
        let parsed = self
            .cache
            .try_get_or_insert_with(checksum, || self.parser.parse(source))?;

        let mut document = Document::clone(&parsed);
        self.assign_identity(&mut document);
        Ok(document)
    }

    /// Flatten a document into markdown bytes (Serialize)
    ///
    /// Identity is assigned to a copy first, so ids missing from the input
    /// appear in the output.
    ///
    /// # Errors
    /// Any [`SerializeError`] of [`MarkdownWriter::render`].
    pub fn render_document(&self, document: &Document) -> Result<Vec<u8>, SerializeError> {
        let mut document = document.clone();
        self.assign_identity(&mut document);
        self.writer.render(&document).map(String::into_bytes)
    }

    /// Assign identity under the configured policy
    ///
    /// Empty documents are left alone so they stay empty across a round
    /// trip.
    pub fn assign_identity(&self, document: &mut Document) -> Option<AssignmentReport> {
        if document.is_empty() {
            return None;
        }
        Some(self.assigner.assign(document))
    }

    /// Configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &LayerConfig {
        &self.config
    }

    /// Get cache reference
    #[inline]
    #[must_use]
    pub fn cache(&self) -> &DocumentCache {
        &self.cache
    }
}

impl Default for SerializationLayer {
    fn default() -> Self {
        Self::new()
    }
}
