//! Read-only cell summaries
//!
//! Listing and rendering go through the lenient validator so partially
//! migrated documents stay readable.

use crate::validation::CellAnnotations;
use mdnb_document::{Cell, Document};
use serde::Serialize;

/// One row of a document listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CellSummary {
    /// Index into [`Document::cells`]
    pub index: usize,
    /// Declared name, or derived from the first command
    pub name: String,
    /// Stable identity, if assigned
    pub id: Option<String>,
    /// Resolved language
    pub language_id: String,
    /// Categories
    pub category: Vec<String>,
    /// Runs in background
    pub background: bool,
    /// First non-blank line of the body
    pub first_line: String,
}

/// Summarize every code cell of a document
#[must_use]
pub fn summarize(document: &Document) -> Vec<CellSummary> {
    document
        .cells
        .iter()
        .enumerate()
        .filter_map(|(index, cell)| match cell {
            Cell::Code(code) => {
                let annotations = code.annotations();
                let first_line = code
                    .value
                    .lines()
                    .map(str::trim)
                    .find(|l| !l.is_empty())
                    .unwrap_or_default()
                    .to_string();
                let name = if annotations.name.is_empty() {
                    derive_name(&first_line, index)
                } else {
                    annotations.name
                };
                Some(CellSummary {
                    index,
                    name,
                    id: annotations.id,
                    language_id: code.language_id.clone(),
                    category: annotations.category,
                    background: annotations.background,
                    first_line,
                })
            }
            Cell::Markup(_) => None,
        })
        .collect()
}

/// Derive a name from a command line: first words, kebab-cased
///
/// Falls back to `cell-{index}` when the line yields nothing.
fn derive_name(line: &str, index: usize) -> String {
    let line = line.strip_prefix('$').unwrap_or(line);
    let name = line
        .split_whitespace()
        .take(3)
        .map(|w| {
            w.chars()
                .filter(|c| c.is_alphanumeric() || *c == '-' || *c == '_')
                .collect::<String>()
                .to_lowercase()
        })
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join("-");
    if name.is_empty() {
        format!("cell-{index}")
    } else {
        name
    }
}
