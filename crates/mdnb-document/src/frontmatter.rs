//! Document-level frontmatter
//!
//! The YAML block at the top of a markdown document. Known keys are typed;
//! everything else is carried verbatim in [`Frontmatter::extra`].
//!
//! Reading is tolerant: scalars are coerced into the typed fields where the
//! intent is clear (`terminalRows: "20"`, `skipPrompts: "true"`), and a
//! known key whose value still does not fit is kept raw in `extra`.

use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use std::collections::BTreeMap;

/// Frontmatter declarations of a document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "Mapping")]
pub struct Frontmatter {
    /// Shell used for every cell unless overridden by an annotation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shell: Option<String>,
    /// Working directory for every cell
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<String>,
    /// Default category for cells
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Free-form tag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    /// Terminal height for interactive cells
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terminal_rows: Option<u32>,
    /// Skip environment prompts for the whole document
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub skip_prompts: bool,
    /// Identity record
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runme: Option<RunmeMetadata>,
    /// Keys this model does not know about, preserved as written
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl From<Mapping> for Frontmatter {
    fn from(mapping: Mapping) -> Self {
        let mut frontmatter = Self::default();
        for (key, value) in mapping {
            let key = match key {
                Value::String(key) => key,
                other => scalar_string(&other).unwrap_or_default(),
            };
            if key.is_empty() {
                continue;
            }
            let kept = match key.as_str() {
                "shell" => scalar_string(&value).map(|v| frontmatter.shell = Some(v)),
                "cwd" => scalar_string(&value).map(|v| frontmatter.cwd = Some(v)),
                "category" => scalar_string(&value).map(|v| frontmatter.category = Some(v)),
                "tag" => scalar_string(&value).map(|v| frontmatter.tag = Some(v)),
                "terminalRows" => {
                    lenient_u32(&value).map(|v| frontmatter.terminal_rows = Some(v))
                }
                "skipPrompts" => lenient_bool(&value).map(|v| frontmatter.skip_prompts = v),
                "runme" => {
                    RunmeMetadata::from_value(&value).map(|v| frontmatter.runme = Some(v))
                }
                _ => None,
            };
            if kept.is_none() {
                frontmatter.extra.insert(key, value);
            }
        }
        frontmatter
    }
}

fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn lenient_u32(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn lenient_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Some(true),
            "false" | "no" | "off" | "0" => Some(false),
            _ => None,
        },
        Value::Number(n) => match n.as_u64() {
            Some(0) => Some(false),
            Some(1) => Some(true),
            _ => None,
        },
        _ => None,
    }
}

impl Frontmatter {
    /// True when nothing would be emitted on serialize
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Document identity, if one has been assigned
    #[must_use]
    pub fn document_id(&self) -> Option<&str> {
        self.runme
            .as_ref()
            .and_then(|r| r.id.as_deref())
            .filter(|id| !id.trim().is_empty())
    }

    /// Identity record, created on first access
    pub fn runme_mut(&mut self) -> &mut RunmeMetadata {
        self.runme.get_or_insert_with(RunmeMetadata::default)
    }
}

/// The `runme` sub-record: document id and identity version
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunmeMetadata {
    /// Stable document identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Identity version, e.g. `v2` or `v2.1`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl RunmeMetadata {
    /// Read an identity record from a YAML mapping, coercing scalars
    ///
    /// `None` when `value` is not a mapping or a present field is not a scalar.
    fn from_value(value: &Value) -> Option<Self> {
        let mapping = value.as_mapping()?;
        let field = |name: &str| match mapping.get(name) {
            None | Some(Value::Null) => Some(None),
            Some(v) => scalar_string(v).map(Some),
        };
        Some(Self {
            id: field("id")?,
            version: field("version")?,
        })
    }

    /// Major level of [`RunmeMetadata::version`]
    ///
    /// `v2.1` and `2` both yield `Some(2)`; missing or unparsable versions
    /// yield `None`.
    #[must_use]
    pub fn version_level(&self) -> Option<u32> {
        let raw = self.version.as_deref()?.trim();
        let raw = raw.strip_prefix(['v', 'V']).unwrap_or(raw);
        let major: String = raw.chars().take_while(char::is_ascii_digit).collect();
        major.parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_level_parsing() {
        let meta = |v: &str| RunmeMetadata {
            id: None,
            version: Some(v.to_string()),
        };
        assert_eq!(meta("v2.1").version_level(), Some(2));
        assert_eq!(meta("v3").version_level(), Some(3));
        assert_eq!(meta("1").version_level(), Some(1));
        assert_eq!(meta("latest").version_level(), None);
        assert_eq!(RunmeMetadata::default().version_level(), None);
    }

    #[test]
    fn yaml_roundtrip_keeps_unknown_keys() {
        let yaml = "shell: bash\nterminalRows: 20\nowner: docs-team\n\
                    runme:\n  id: abc\n  version: v2\n";
        let fm: Frontmatter = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(fm.shell.as_deref(), Some("bash"));
        assert_eq!(fm.terminal_rows, Some(20));
        assert_eq!(fm.document_id(), Some("abc"));
        assert_eq!(
            fm.extra.get("owner"),
            Some(&serde_yaml::Value::String("docs-team".into()))
        );

        let out = serde_yaml::to_string(&fm).unwrap();
        let back: Frontmatter = serde_yaml::from_str(&out).unwrap();
        assert_eq!(back, fm);
    }

    #[test]
    fn quoted_scalars_are_coerced() {
        let yaml = "skipPrompts: \"true\"\nterminalRows: \"20\"\nshell: 42\n\
                    runme:\n  version: 2\n";
        let fm: Frontmatter = serde_yaml::from_str(yaml).unwrap();
        assert!(fm.skip_prompts);
        assert_eq!(fm.terminal_rows, Some(20));
        assert_eq!(fm.shell.as_deref(), Some("42"));
        assert_eq!(fm.runme.and_then(|r| r.version).as_deref(), Some("2"));
        assert!(fm.extra.is_empty());
    }

    #[test]
    fn unfit_values_stay_in_extra() {
        let yaml = "terminalRows: lots\nskipPrompts: maybe\ncwd: [a, b]\nrunme: v2\n";
        let fm: Frontmatter = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(fm.terminal_rows, None);
        assert!(!fm.skip_prompts);
        assert_eq!(fm.cwd, None);
        assert_eq!(fm.runme, None);
        assert_eq!(fm.extra.len(), 4);

        let out = serde_yaml::to_string(&fm).unwrap();
        let back: Frontmatter = serde_yaml::from_str(&out).unwrap();
        assert_eq!(back, fm);
    }

    #[test]
    fn empty_frontmatter() {
        assert!(Frontmatter::default().is_empty());
        let mut fm = Frontmatter::default();
        fm.runme_mut();
        assert!(!fm.is_empty());
        assert_eq!(fm.document_id(), None);
    }
}
