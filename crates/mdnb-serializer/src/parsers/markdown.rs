//! Markdown notebook parser
//!
//! Uses pulldown-cmark to find top-level fenced code blocks; everything
//! between them is kept verbatim as markup.
//!
//! # Grammar
//! - Only fenced blocks at document level become code cells. Fences nested
//!   in lists or block quotes, and indented code blocks, stay markup.
//! - A code cell's value is the raw text between its fence lines, without
//!   the final line break.
//! - Markup regions are trimmed of leading blank lines and trailing
//!   whitespace; whitespace-only regions produce no cell.
//! - The number of line breaks ending the source is recorded under
//!   [`FINAL_LINE_BREAKS_KEY`](mdnb_document::FINAL_LINE_BREAKS_KEY).

use crate::error::ParseError;
use crate::parsers::attributes::{parse_attributes, split_info};
use crate::parsers::frontmatter::{line_spans, split_frontmatter, strip_eol};
use mdnb_annotations::normalize_metadata;
use mdnb_document::{Cell, CodeCell, Document};
use pulldown_cmark::{CodeBlockKind, Event, Options, Parser as MdParser, Tag};

/// Markdown to [`Document`] parser
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownParser;

impl MarkdownParser {
    /// Create new markdown parser
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Parse raw bytes
    ///
    /// # Errors
    /// - `ParseError::InvalidUtf8` if the bytes are not UTF-8
    /// - see [`MarkdownParser::parse_str`]
    pub fn parse(&self, source: &[u8]) -> Result<Document, ParseError> {
        let text = std::str::from_utf8(source).map_err(|e| ParseError::InvalidUtf8 {
            offset: e.valid_up_to(),
        })?;
        self.parse_str(text)
    }

    /// Parse markdown text
    ///
    /// Blank input yields an empty document.
    ///
    /// # Errors
    /// - `ParseError::Frontmatter` if the frontmatter is not a YAML mapping
    /// - `ParseError::MalformedFence` if a fence info string is malformed
    /// - `ParseError::UnterminatedFence` if a fence is never closed
    pub fn parse_str(&self, source: &str) -> Result<Document, ParseError> {
        if source.trim().is_empty() {
            return Ok(Document::new());
        }

        let (frontmatter, body_start) = split_frontmatter(source)?;
        let cells = parse_cells(&source[body_start..], body_start)?;

        let mut document = Document {
            cells,
            frontmatter,
            ..Document::default()
        };
        document.set_final_line_breaks(final_line_breaks(source));

        tracing::debug!(
            "parsed {} cell(s) from {} bytes",
            document.cells.len(),
            source.len()
        );
        Ok(document)
    }
}

fn final_line_breaks(source: &str) -> usize {
    source[source.trim_end().len()..]
        .bytes()
        .filter(|b| *b == b'\n')
        .count()
}

/// Split a body into cells; `base` is the body's offset in the source
fn parse_cells(body: &str, base: usize) -> Result<Vec<Cell>, ParseError> {
    let mut cells = Vec::new();
    let mut cursor = 0;

    for hint in top_level_fences(body) {
        let line_start = body[..hint].rfind('\n').map_or(0, |i| i + 1);
        if line_start < cursor {
            continue;
        }
        push_markup(&mut cells, &body[cursor..line_start]);
        let (cell, end) = read_fenced_block(body, line_start, base)?;
        cells.push(Cell::Code(cell));
        cursor = end;
    }

    push_markup(&mut cells, &body[cursor..]);
    Ok(cells)
}

/// Start offsets of fenced code blocks at nesting depth zero
fn top_level_fences(body: &str) -> Vec<usize> {
    let mut depth = 0usize;
    let mut starts = Vec::new();

    for (event, range) in MdParser::new_ext(body, Options::empty()).into_offset_iter() {
        match event {
            Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(_))) if depth == 0 => {
                starts.push(range.start);
                depth += 1;
            }
            Event::Start(_) => depth += 1,
            Event::End(_) => depth = depth.saturating_sub(1),
            _ => {}
        }
    }

    starts
}

/// Read one fenced block starting at `line_start`
///
/// Returns the code cell and the offset just past the closing fence line.
fn read_fenced_block(
    body: &str,
    line_start: usize,
    base: usize,
) -> Result<(CodeCell, usize), ParseError> {
    let line_end = body[line_start..]
        .find('\n')
        .map_or(body.len(), |i| line_start + i + 1);
    let opening = strip_eol(&body[line_start..line_end]);

    let indent = opening.len() - opening.trim_start_matches(' ').len();
    let marker = &opening[indent..];
    let fence_char = if marker.starts_with('~') { '~' } else { '`' };
    let fence_len = marker.len() - marker.trim_start_matches(fence_char).len();
    let info = &marker[fence_len..];

    let (language, attr_at) = split_info(info);
    let info_offset = base + line_start + indent + fence_len;
    let attributes = parse_attributes(&info[attr_at..]).map_err(|e| {
        ParseError::malformed_fence(info_offset + attr_at + e.position, e.reason)
    })?;

    for (start, line) in line_spans(&body[line_end..]) {
        if is_closing_fence(strip_eol(line), fence_char, fence_len) {
            let content = &body[line_end..line_end + start];
            let value = strip_eol(content);

            let mut cell = CodeCell::new(value, language);
            cell.metadata = normalize_metadata(&attributes);
            return Ok((cell, line_end + start + line.len()));
        }
    }

    Err(ParseError::UnterminatedFence {
        offset: base + line_start,
    })
}

fn is_closing_fence(line: &str, fence_char: char, min_len: usize) -> bool {
    let indent = line.len() - line.trim_start_matches(' ').len();
    if indent > 3 {
        return false;
    }
    let rest = &line[indent..];
    let run = rest.len() - rest.trim_start_matches(fence_char).len();
    run >= min_len && rest[run..].trim().is_empty()
}

fn push_markup(cells: &mut Vec<Cell>, region: &str) {
    let trimmed = trim_blank_lines(region);
    if !trimmed.is_empty() {
        cells.push(Cell::markup(trimmed));
    }
}

fn trim_blank_lines(region: &str) -> &str {
    let start = region
        .split_inclusive('\n')
        .take_while(|line| line.trim().is_empty())
        .map(str::len)
        .sum::<usize>();
    region[start..].trim_end()
}
