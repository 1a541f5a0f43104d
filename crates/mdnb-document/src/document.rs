//! Documents and cells
//!
//! A [`Document`] exclusively owns its cells and frontmatter. Cells are a
//! tagged union over markup and code.

use crate::frontmatter::Frontmatter;
use crate::language::normalize_language;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// String-keyed metadata map (documents and cells)
pub type Metadata = BTreeMap<String, String>;

/// Document metadata key recording how many newlines ended the source
pub const FINAL_LINE_BREAKS_KEY: &str = "runme.dev/finalLineBreaks";

/// Structured notebook representation of a markdown file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Cells in document order
    pub cells: Vec<Cell>,
    /// Document-level metadata
    #[serde(default)]
    pub metadata: Metadata,
    /// Frontmatter block
    #[serde(default)]
    pub frontmatter: Frontmatter,
}

impl Document {
    /// Create empty document
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: append a markup cell
    #[must_use]
    pub fn with_markup(mut self, value: impl Into<String>) -> Self {
        self.cells.push(Cell::markup(value));
        self
    }

    /// Builder: append a code cell
    #[must_use]
    pub fn with_code(mut self, cell: CodeCell) -> Self {
        self.cells.push(Cell::Code(cell));
        self
    }

    /// True when there are no cells and no frontmatter
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty() && self.frontmatter.is_empty()
    }

    /// Iterate code cells in order
    pub fn code_cells(&self) -> impl Iterator<Item = &CodeCell> {
        self.cells.iter().filter_map(Cell::as_code)
    }

    /// Iterate code cells mutably in order
    pub fn code_cells_mut(&mut self) -> impl Iterator<Item = &mut CodeCell> {
        self.cells.iter_mut().filter_map(Cell::as_code_mut)
    }

    /// Number of trailing newlines to emit on serialize
    ///
    /// Defaults to 1 when unset or unparsable.
    #[must_use]
    pub fn final_line_breaks(&self) -> usize {
        self.metadata
            .get(FINAL_LINE_BREAKS_KEY)
            .and_then(|v| v.parse().ok())
            .unwrap_or(1)
    }

    /// Record the number of trailing newlines
    pub fn set_final_line_breaks(&mut self, count: usize) {
        self.metadata
            .insert(FINAL_LINE_BREAKS_KEY.to_string(), count.to_string());
    }
}

/// Discriminant of [`Cell`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CellKind {
    /// Free markdown text
    Markup,
    /// Executable fenced block
    Code,
}

/// A unit of a document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Cell {
    /// Markdown text, emitted verbatim
    Markup(MarkupCell),
    /// Fenced code block
    Code(CodeCell),
}

impl Cell {
    /// Create markup cell
    #[inline]
    #[must_use]
    pub fn markup(value: impl Into<String>) -> Self {
        Self::Markup(MarkupCell {
            value: value.into(),
        })
    }

    /// Cell discriminant
    #[inline]
    #[must_use]
    pub fn kind(&self) -> CellKind {
        match self {
            Self::Markup(_) => CellKind::Markup,
            Self::Code(_) => CellKind::Code,
        }
    }

    /// Raw text of the cell
    #[inline]
    #[must_use]
    pub fn value(&self) -> &str {
        match self {
            Self::Markup(cell) => &cell.value,
            Self::Code(cell) => &cell.value,
        }
    }

    /// Code cell view
    #[inline]
    #[must_use]
    pub fn as_code(&self) -> Option<&CodeCell> {
        match self {
            Self::Code(cell) => Some(cell),
            Self::Markup(_) => None,
        }
    }

    /// Mutable code cell view
    #[inline]
    pub fn as_code_mut(&mut self) -> Option<&mut CodeCell> {
        match self {
            Self::Code(cell) => Some(cell),
            Self::Markup(_) => None,
        }
    }
}

/// Markdown text between code blocks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkupCell {
    /// Verbatim markdown
    pub value: String,
}

/// Fenced code block with its metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeCell {
    /// Body between the fences
    pub value: String,
    /// Resolved language identifier
    pub language_id: String,
    /// Raw annotation map (validated on demand)
    #[serde(default)]
    pub metadata: Metadata,
    /// Result of the last execution; never persisted
    #[serde(skip)]
    pub execution: Option<ExecutionSummary>,
}

impl CodeCell {
    /// Create code cell, normalizing the language
    #[must_use]
    pub fn new(value: impl Into<String>, language: &str) -> Self {
        Self {
            value: value.into(),
            language_id: normalize_language(language),
            metadata: Metadata::new(),
            execution: None,
        }
    }

    /// Builder: set a metadata entry
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Metadata value, ignoring blank entries
    #[must_use]
    pub fn metadata_value(&self, key: &str) -> Option<&str> {
        self.metadata
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }

    /// Attach an execution result
    pub fn record_execution(&mut self, exit_code: Option<i32>) {
        self.execution = Some(ExecutionSummary { exit_code });
    }
}

/// Outcome of executing a code cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionSummary {
    /// Process exit code, `None` if the process was killed
    pub exit_code: Option<i32>,
}

impl ExecutionSummary {
    /// Whether the cell finished successfully
    #[inline]
    #[must_use]
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}
