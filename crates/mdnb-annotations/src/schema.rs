//! Annotation schema
//!
//! The closed set of fields a code cell may declare, their types, defaults
//! and legacy aliases. Validation and serialization both read this table;
//! nothing else hard-codes field names.

use mdnb_document::ShellType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Canonical key: cell name
pub const NAME: &str = "name";
/// Canonical key: stable cell identity
pub const ID: &str = "id";
/// Canonical key: comma-separated categories
pub const CATEGORY: &str = "category";
/// Canonical key: run without waiting for completion
pub const BACKGROUND: &str = "background";
/// Canonical key: attach an interactive terminal
pub const INTERACTIVE: &str = "interactive";
/// Canonical key: close the terminal when the command succeeds
pub const CLOSE_TERMINAL_ON_SUCCESS: &str = "closeTerminalOnSuccess";
/// Canonical key: skip environment prompts
pub const SKIP_PROMPTS: &str = "skipPrompts";
/// Canonical key: leave the cell out of "run all"
pub const EXCLUDE_FROM_RUN_ALL: &str = "excludeFromRunAll";
/// Canonical key: shell override
pub const SHELL: &str = "shell";
/// Canonical key: working directory
pub const CWD: &str = "cwd";
/// Canonical key: output mime type
pub const MIME_TYPE: &str = "mimeType";
/// Canonical key: terminal height
pub const TERMINAL_ROWS: &str = "terminalRows";

/// Namespace of keys owned by the tooling
pub const RESERVED_PREFIX: &str = "runme.dev/";

/// Value type of a schema field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Required non-empty token
    Name,
    /// Optional whitespace-free token
    Identifier,
    /// Comma-separated token list
    Category,
    /// `true` / `false`
    Bool,
    /// A classified shell name
    Shell,
    /// Non-empty path
    Path,
    /// `type/subtype`
    MimeType,
    /// Positive integer
    PositiveInt,
}

/// One row of the schema table
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    /// Canonical key
    pub key: &'static str,
    /// Legacy alias consulted when the canonical value is empty
    pub legacy: Option<&'static str>,
    /// Value type
    pub kind: FieldKind,
    /// Default rendered as it appears in metadata
    pub default: Option<&'static str>,
}

const fn spec(
    key: &'static str,
    legacy: Option<&'static str>,
    kind: FieldKind,
    default: Option<&'static str>,
) -> FieldSpec {
    FieldSpec {
        key,
        legacy,
        kind,
        default,
    }
}

/// Schema table, in emission order
pub const FIELDS: &[FieldSpec] = &[
    spec(NAME, Some("runme.dev/name"), FieldKind::Name, Some("")),
    spec(ID, Some("runme.dev/id"), FieldKind::Identifier, None),
    spec(CATEGORY, None, FieldKind::Category, None),
    spec(BACKGROUND, None, FieldKind::Bool, Some("false")),
    spec(INTERACTIVE, None, FieldKind::Bool, Some("true")),
    spec(CLOSE_TERMINAL_ON_SUCCESS, None, FieldKind::Bool, Some("true")),
    spec(SKIP_PROMPTS, None, FieldKind::Bool, Some("false")),
    spec(EXCLUDE_FROM_RUN_ALL, None, FieldKind::Bool, Some("false")),
    spec(SHELL, None, FieldKind::Shell, None),
    spec(CWD, None, FieldKind::Path, None),
    spec(MIME_TYPE, None, FieldKind::MimeType, None),
    spec(TERMINAL_ROWS, None, FieldKind::PositiveInt, None),
];

/// Look up a canonical field
#[must_use]
pub fn field(key: &str) -> Option<&'static FieldSpec> {
    FIELDS.iter().find(|f| f.key == key)
}

/// Position of a canonical key in emission order
#[must_use]
pub fn emission_rank(key: &str) -> Option<usize> {
    FIELDS.iter().position(|f| f.key == key)
}

/// Whether a key is a legacy alias of some canonical field
#[must_use]
pub fn is_legacy_alias(key: &str) -> bool {
    FIELDS.iter().any(|f| f.legacy == Some(key))
}

/// Whether a key is reserved for tooling and may not pass through
#[must_use]
pub fn is_reserved(key: &str) -> bool {
    key.starts_with(RESERVED_PREFIX) && !is_legacy_alias(key)
}

/// Whether `value` equals the schema default for `key`
///
/// Keys without a default, and unknown keys, never match.
#[must_use]
pub fn is_default_value(key: &str, value: &str) -> bool {
    let Some(spec) = field(key) else {
        return false;
    };
    match (spec.kind, spec.default) {
        (FieldKind::Bool, Some(default)) => parse_bool(value) == parse_bool(default),
        (_, Some(default)) => value.trim() == default,
        (_, None) => false,
    }
}

/// Parse a metadata boolean
#[must_use]
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

/// Fully-typed annotations of a code cell
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Annotations {
    /// Cell name (empty only on the lenient path)
    pub name: String,
    /// Stable identity
    pub id: Option<String>,
    /// Categories, in declaration order
    pub category: Vec<String>,
    /// Run in background
    pub background: bool,
    /// Attach interactive terminal
    pub interactive: bool,
    /// Close terminal on success
    pub close_terminal_on_success: bool,
    /// Skip environment prompts
    pub skip_prompts: bool,
    /// Exclude from "run all"
    pub exclude_from_run_all: bool,
    /// Shell override
    pub shell: Option<ShellType>,
    /// Working directory
    pub cwd: Option<String>,
    /// Output mime type
    pub mime_type: Option<String>,
    /// Terminal height
    pub terminal_rows: Option<u32>,
    /// Unknown, non-reserved keys passed through unchanged
    pub extra: BTreeMap<String, String>,
}

impl Default for Annotations {
    fn default() -> Self {
        Self {
            name: String::new(),
            id: None,
            category: Vec::new(),
            background: false,
            interactive: true,
            close_terminal_on_success: true,
            skip_prompts: false,
            exclude_from_run_all: false,
            shell: None,
            cwd: None,
            mime_type: None,
            terminal_rows: None,
            extra: BTreeMap::new(),
        }
    }
}

impl Annotations {
    /// Whether the cell belongs to `category`
    #[must_use]
    pub fn in_category(&self, category: &str) -> bool {
        self.category.iter().any(|c| c == category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_has_unique_keys() {
        for (i, a) in FIELDS.iter().enumerate() {
            for b in &FIELDS[i + 1..] {
                assert_ne!(a.key, b.key);
            }
        }
    }

    #[test]
    fn defaults_match_annotations_default() {
        let defaults = Annotations::default();
        assert!(is_default_value(BACKGROUND, "false"));
        assert!(!defaults.background);
        assert!(is_default_value(INTERACTIVE, "true"));
        assert!(defaults.interactive);
        assert!(is_default_value(CLOSE_TERMINAL_ON_SUCCESS, "true"));
        assert!(is_default_value(NAME, ""));
        assert!(!is_default_value(NAME, "build"));
        assert!(!is_default_value(CWD, "/tmp"));
        assert!(!is_default_value("owner", "me"));
    }

    #[test]
    fn reserved_and_legacy_keys() {
        assert!(is_legacy_alias("runme.dev/name"));
        assert!(!is_reserved("runme.dev/name"));
        assert!(is_reserved("runme.dev/uuid"));
        assert!(!is_reserved("owner"));
    }

    #[test]
    fn emission_order_starts_with_name() {
        assert_eq!(emission_rank(NAME), Some(0));
        assert_eq!(emission_rank(ID), Some(1));
        assert_eq!(emission_rank("owner"), None);
    }
}
