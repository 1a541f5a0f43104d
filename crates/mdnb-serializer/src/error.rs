//! Error types for the serialization boundary
//!
//! - Parse operations (bytes -> Document)
//! - Serialize operations (Document -> bytes)

/// Errors while reading markdown into a document
///
/// Every variant carries the byte offset where reading stopped.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// Source is not UTF-8
    #[error("invalid utf-8 at byte {offset}")]
    InvalidUtf8 {
        /// Length of the valid prefix
        offset: usize,
    },

    /// Fence info string could not be read
    #[error("malformed fence at byte {offset}: {reason}")]
    MalformedFence {
        /// Byte offset of the offending character
        offset: usize,
        /// What was wrong
        reason: String,
    },

    /// Opening fence without a closing fence
    #[error("unterminated fence starting at byte {offset}")]
    UnterminatedFence {
        /// Byte offset of the opening fence line
        offset: usize,
    },

    /// Frontmatter block is not a valid YAML mapping
    #[error("invalid frontmatter at byte {offset}: {message}")]
    Frontmatter {
        /// Byte offset into the source
        offset: usize,
        /// YAML error
        message: String,
    },

    /// Source exceeds the configured size limit
    #[error("source too large: {size} bytes (max: {limit})")]
    SourceTooLarge {
        /// Source length
        size: usize,
        /// Configured limit
        limit: usize,
    },
}

impl ParseError {
    /// Create malformed fence error
    pub fn malformed_fence(offset: usize, reason: impl Into<String>) -> Self {
        Self::MalformedFence {
            offset,
            reason: reason.into(),
        }
    }

    /// Create frontmatter error
    pub fn frontmatter(offset: usize, message: impl Into<String>) -> Self {
        Self::Frontmatter {
            offset,
            message: message.into(),
        }
    }

    /// Byte offset the error refers to
    #[must_use]
    pub fn offset(&self) -> usize {
        match self {
            Self::InvalidUtf8 { offset }
            | Self::MalformedFence { offset, .. }
            | Self::UnterminatedFence { offset }
            | Self::Frontmatter { offset, .. } => *offset,
            Self::SourceTooLarge { limit, .. } => *limit,
        }
    }
}

/// Errors while writing a document as markdown
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SerializeError {
    /// Metadata key cannot be written as a fence attribute
    #[error("cell {cell}: metadata key '{key}' cannot be written as a fence attribute")]
    InvalidAttributeKey {
        /// Index of the cell in the document
        cell: usize,
        /// Offending key
        key: String,
    },

    /// Language id cannot be written after a fence
    #[error("cell {cell}: language id '{language}' cannot be written in a fence")]
    InvalidLanguage {
        /// Index of the cell in the document
        cell: usize,
        /// Offending language id
        language: String,
    },

    /// Frontmatter could not be rendered as YAML
    #[error("frontmatter serialization failed: {0}")]
    Frontmatter(String),
}

impl SerializeError {
    /// Create invalid key error
    pub fn invalid_key(cell: usize, key: impl Into<String>) -> Self {
        Self::InvalidAttributeKey {
            cell,
            key: key.into(),
        }
    }

    /// Create invalid language error
    pub fn invalid_language(cell: usize, language: impl Into<String>) -> Self {
        Self::InvalidLanguage {
            cell,
            language: language.into(),
        }
    }
}

/// Combined serialization boundary error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SerializerError {
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("serialize error: {0}")]
    Serialize(#[from] SerializeError),
}

/// Result type alias for boundary operations
pub type SerializerResult<T> = Result<T, SerializerError>;
