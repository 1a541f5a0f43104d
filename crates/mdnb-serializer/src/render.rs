//! Markdown writer
//!
//! Inverse of [`MarkdownParser`](crate::parsers::MarkdownParser):
//! frontmatter first, then cells separated by one blank line, then the
//! recorded number of final line breaks.

use crate::error::SerializeError;
use crate::parsers::attributes::{is_valid_key, render_attributes};
use crate::parsers::frontmatter::render_frontmatter;
use mdnb_annotations::normalize_metadata;
use mdnb_annotations::schema::{emission_rank, is_default_value};
use mdnb_document::{Cell, CodeCell, Document};

const MIN_FENCE: usize = 3;

/// Document to markdown writer
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownWriter;

impl MarkdownWriter {
    /// Create new writer
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Render a document as markdown
    ///
    /// An empty document renders as an empty string.
    ///
    /// # Errors
    /// - `SerializeError::InvalidAttributeKey` if a metadata key cannot be
    ///   written inside a fence info string
    /// - `SerializeError::InvalidLanguage` if a language id contains
    ///   whitespace, braces or backticks
    /// - `SerializeError::Frontmatter` if YAML rendering fails
    pub fn render(&self, document: &Document) -> Result<String, SerializeError> {
        if document.is_empty() {
            return Ok(String::new());
        }

        let mut parts = Vec::with_capacity(document.cells.len() + 1);
        if !document.frontmatter.is_empty() {
            let block = render_frontmatter(&document.frontmatter)
                .map_err(|e| SerializeError::Frontmatter(e.to_string()))?;
            parts.push(block);
        }

        for (index, cell) in document.cells.iter().enumerate() {
            match cell {
                Cell::Markup(markup) => parts.push(markup.value.clone()),
                Cell::Code(code) => parts.push(render_code(index, code)?),
            }
        }

        let mut out = parts.join("\n\n");
        out.push_str(&"\n".repeat(document.final_line_breaks()));
        Ok(out)
    }
}

fn render_code(index: usize, cell: &CodeCell) -> Result<String, SerializeError> {
    let language = cell.language_id.as_str();
    if language
        .chars()
        .any(|c| c.is_whitespace() || matches!(c, '{' | '}' | '`' | '='))
    {
        return Err(SerializeError::invalid_language(index, language));
    }

    let metadata = normalize_metadata(&cell.metadata);
    let mut pairs: Vec<(&str, &str)> = metadata
        .iter()
        .filter(|(key, value)| !is_default_value(key, value))
        .map(|(key, value)| (key.as_str(), value.as_str()))
        .collect();
    if let Some((key, _)) = pairs.iter().find(|(key, _)| !is_valid_key(key)) {
        return Err(SerializeError::invalid_key(index, *key));
    }
    pairs.sort_by_key(|(key, _)| (emission_rank(key).unwrap_or(usize::MAX), *key));

    let attributes = render_attributes(pairs);
    let info = match (language.is_empty(), attributes.is_empty()) {
        (_, true) => language.to_string(),
        (true, false) => attributes,
        (false, false) => format!("{language} {attributes}"),
    };

    let fence_char = if info.contains('`') { '~' } else { '`' };
    let fence = fence_char
        .to_string()
        .repeat(fence_length(&cell.value, fence_char));

    Ok(if cell.value.is_empty() {
        format!("{fence}{info}\n{fence}")
    } else {
        format!("{fence}{info}\n{}\n{fence}", cell.value)
    })
}

/// One more than the longest fence-like run in the body, at least three
fn fence_length(value: &str, fence_char: char) -> usize {
    value
        .lines()
        .map(|line| {
            let line = line.trim_start();
            line.len() - line.trim_start_matches(fence_char).len()
        })
        .max()
        .map_or(MIN_FENCE, |run| (run + 1).max(MIN_FENCE))
}
