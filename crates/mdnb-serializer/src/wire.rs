//! Wire contract of the parser service
//!
//! JSON shapes follow the protobuf JSON mapping of `runme.parser.v1`:
//! camelCase field names, enum values as strings and `bytes` fields as
//! base64 text. The same messages are used by every transport.

use mdnb_document::{Cell, CellKind, CodeCell, Document, Frontmatter, Metadata, RunmeMetadata};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// `Deserialize` request: raw markdown bytes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeserializeRequest {
    /// Markdown source
    #[serde(default, with = "base64_bytes")]
    pub source: Vec<u8>,
}

/// `Deserialize` response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeserializeResponse {
    /// Parsed notebook
    pub notebook: WireNotebook,
}

/// `Serialize` request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializeRequest {
    /// Notebook to flatten
    pub notebook: WireNotebook,
}

/// `Serialize` response: raw markdown bytes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializeResponse {
    /// Markdown output
    #[serde(default, with = "base64_bytes")]
    pub result: Vec<u8>,
}

/// Notebook message
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireNotebook {
    /// Cells in document order
    #[serde(default)]
    pub cells: Vec<WireCell>,
    /// Document metadata
    #[serde(default)]
    pub metadata: Metadata,
    /// Frontmatter, absent when empty
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frontmatter: Option<WireFrontmatter>,
}

/// Cell message; markup cells carry an empty language and metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireCell {
    /// Markup or code
    pub kind: CellKind,
    /// Cell text
    #[serde(default)]
    pub value: String,
    /// Language, empty for markup
    #[serde(default)]
    pub language_id: String,
    /// Annotations, empty for markup
    #[serde(default)]
    pub metadata: Metadata,
}

/// Frontmatter message
///
/// Keys outside the typed set travel as JSON values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireFrontmatter {
    /// Default shell
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shell: Option<String>,
    /// Default working directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<String>,
    /// Default category
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Free-form tag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    /// Terminal height
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terminal_rows: Option<u32>,
    /// Skip environment prompts
    #[serde(default)]
    pub skip_prompts: bool,
    /// Identity record
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runme: Option<WireRunme>,
    /// Unknown keys
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// `runme` block of the frontmatter message
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireRunme {
    /// Document id, empty if unassigned
    #[serde(default)]
    pub id: String,
    /// Identity version tag
    #[serde(default)]
    pub version: String,
}

impl From<&Cell> for WireCell {
    fn from(cell: &Cell) -> Self {
        match cell {
            Cell::Markup(markup) => Self {
                kind: CellKind::Markup,
                value: markup.value.clone(),
                language_id: String::new(),
                metadata: Metadata::new(),
            },
            Cell::Code(code) => Self {
                kind: CellKind::Code,
                value: code.value.clone(),
                language_id: code.language_id.clone(),
                metadata: code.metadata.clone(),
            },
        }
    }
}

impl From<WireCell> for Cell {
    fn from(cell: WireCell) -> Self {
        match cell.kind {
            CellKind::Markup => Cell::markup(cell.value),
            CellKind::Code => {
                let mut code = CodeCell::new(cell.value, &cell.language_id);
                code.metadata = cell.metadata;
                Cell::Code(code)
            }
        }
    }
}

impl From<&Frontmatter> for WireFrontmatter {
    fn from(frontmatter: &Frontmatter) -> Self {
        let extra = frontmatter
            .extra
            .iter()
            .filter_map(|(key, value)| match serde_json::to_value(value) {
                Ok(json) => Some((key.clone(), json)),
                Err(e) => {
                    tracing::warn!("frontmatter key '{key}' has no JSON form, dropped: {e}");
                    None
                }
            })
            .collect();

        Self {
            shell: frontmatter.shell.clone(),
            cwd: frontmatter.cwd.clone(),
            category: frontmatter.category.clone(),
            tag: frontmatter.tag.clone(),
            terminal_rows: frontmatter.terminal_rows,
            skip_prompts: frontmatter.skip_prompts,
            runme: frontmatter.runme.as_ref().map(|runme| WireRunme {
                id: runme.id.clone().unwrap_or_default(),
                version: runme.version.clone().unwrap_or_default(),
            }),
            extra,
        }
    }
}

impl From<WireFrontmatter> for Frontmatter {
    fn from(wire: WireFrontmatter) -> Self {
        let extra = wire
            .extra
            .into_iter()
            .filter_map(|(key, value)| match serde_yaml::to_value(value) {
                Ok(yaml) => Some((key, yaml)),
                Err(e) => {
                    tracing::warn!("frontmatter key '{key}' has no YAML form, dropped: {e}");
                    None
                }
            })
            .collect();

        let non_empty = |s: String| Some(s).filter(|s| !s.is_empty());
        Self {
            shell: wire.shell,
            cwd: wire.cwd,
            category: wire.category,
            tag: wire.tag,
            terminal_rows: wire.terminal_rows,
            skip_prompts: wire.skip_prompts,
            runme: wire.runme.map(|runme| RunmeMetadata {
                id: non_empty(runme.id),
                version: non_empty(runme.version),
            }),
            extra,
        }
    }
}

impl From<&Document> for WireNotebook {
    fn from(document: &Document) -> Self {
        Self {
            cells: document.cells.iter().map(WireCell::from).collect(),
            metadata: document.metadata.clone(),
            frontmatter: (!document.frontmatter.is_empty())
                .then(|| WireFrontmatter::from(&document.frontmatter)),
        }
    }
}

impl From<WireNotebook> for Document {
    fn from(notebook: WireNotebook) -> Self {
        Self {
            cells: notebook.cells.into_iter().map(Cell::from).collect(),
            metadata: notebook.metadata,
            frontmatter: notebook.frontmatter.map(Frontmatter::from).unwrap_or_default(),
        }
    }
}

/// `bytes` fields as standard base64
mod base64_bytes {
    use base64::{engine::general_purpose::STANDARD, Engine};
    use serde::{Deserialize, Deserializer, Serializer};

    pub(super) fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub(super) fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        STANDARD.decode(text.as_bytes()).map_err(serde::de::Error::custom)
    }
}
