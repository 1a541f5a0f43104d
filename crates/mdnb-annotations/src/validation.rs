//! Annotation validation
//!
//! Two modes over the same schema:
//! - lenient ([`AnnotationValidator::safe_validate`]): always returns a
//!   record; failing fields fall back to their defaults
//! - strict ([`AnnotationValidator::validate`]): returns a complete record
//!   or a field-indexed [`ValidationError`]

use crate::precedence::normalize_metadata;
use crate::schema::{self, Annotations, FieldKind, FIELDS};
use mdnb_document::{CodeCell, Metadata, ShellType};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;

static CATEGORY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^,\s]+(,[^,\s]+)*$").expect("static regex"));

static MIME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\w.+-]+/[\w.+-]+$").expect("static regex"));

/// Field-indexed error messages
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Strict validation failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid annotations: {}", render_fields(.fields))]
pub struct ValidationError {
    /// Messages per offending key
    pub fields: FieldErrors,
    /// The metadata that was validated, after legacy-key folding
    pub original: Metadata,
}

impl ValidationError {
    /// Messages reported for `key`
    #[must_use]
    pub fn field(&self, key: &str) -> Option<&[String]> {
        self.fields.get(key).map(Vec::as_slice)
    }

    /// Whether `key` failed
    #[inline]
    #[must_use]
    pub fn has_field(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }
}

fn render_fields(fields: &FieldErrors) -> String {
    fields
        .iter()
        .map(|(key, messages)| format!("{key}: {}", messages.join(", ")))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Schema validator for cell annotations
#[derive(Debug, Clone, Copy, Default)]
pub struct AnnotationValidator;

impl AnnotationValidator {
    /// Create new validator instance
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Strict validation
    ///
    /// # Errors
    /// Returns [`ValidationError`] listing every failing field, including
    /// a missing `name` and any reserved key.
    pub fn validate(&self, raw: &Metadata) -> Result<Annotations, ValidationError> {
        let normalized = normalize_metadata(raw);
        let (annotations, fields) = check(&normalized);
        if fields.is_empty() {
            Ok(annotations)
        } else {
            Err(ValidationError {
                fields,
                original: normalized,
            })
        }
    }

    /// Lenient validation: best-effort record, never fails
    #[must_use]
    pub fn safe_validate(&self, raw: &Metadata) -> Annotations {
        let normalized = normalize_metadata(raw);
        let (annotations, fields) = check(&normalized);
        if !fields.is_empty() {
            tracing::warn!(
                "lenient annotation validation defaulted {} field(s): {}",
                fields.len(),
                render_fields(&fields)
            );
        }
        annotations
    }
}

/// Annotation access on code cells
pub trait CellAnnotations {
    /// Lenient view, for rendering and listing
    fn annotations(&self) -> Annotations;

    /// Strict view, for anything that executes the cell
    ///
    /// # Errors
    /// See [`AnnotationValidator::validate`].
    fn validate_annotations(&self) -> Result<Annotations, ValidationError>;
}

impl CellAnnotations for CodeCell {
    fn annotations(&self) -> Annotations {
        AnnotationValidator::new().safe_validate(&self.metadata)
    }

    fn validate_annotations(&self) -> Result<Annotations, ValidationError> {
        AnnotationValidator::new().validate(&self.metadata)
    }
}

/// Parse every field; failing fields keep their default and record an error
fn check(normalized: &Metadata) -> (Annotations, FieldErrors) {
    let mut annotations = Annotations::default();
    let mut errors = FieldErrors::new();
    let mut fail = |key: &str, message: String| {
        errors.entry(key.to_string()).or_default().push(message);
    };

    for spec in FIELDS {
        let value = normalized.get(spec.key).map(String::as_str);

        if spec.kind == FieldKind::Name {
            match value.map(str::trim) {
                None | Some("") => fail(spec.key, "required".to_string()),
                Some(v) if v.chars().any(char::is_whitespace) => {
                    fail(spec.key, "must not contain whitespace".to_string());
                }
                Some(v) => annotations.name = v.to_string(),
            }
            continue;
        }

        let Some(value) = value else {
            continue;
        };

        match parse_field(spec.kind, value) {
            Ok(parsed) => apply(&mut annotations, spec.key, parsed),
            Err(message) => fail(spec.key, message),
        }
    }

    for (key, value) in normalized {
        if schema::field(key).is_some() {
            continue;
        }
        if schema::is_reserved(key) {
            fail(key, "reserved key".to_string());
            continue;
        }
        annotations.extra.insert(key.clone(), value.clone());
    }

    (annotations, errors)
}

enum Parsed {
    Text(String),
    List(Vec<String>),
    Flag(bool),
    Shell(ShellType),
    Number(u32),
}

fn parse_field(kind: FieldKind, value: &str) -> Result<Parsed, String> {
    let trimmed = value.trim();
    match kind {
        FieldKind::Name | FieldKind::Identifier => {
            if trimmed.is_empty() {
                Err("must not be empty".to_string())
            } else if trimmed.chars().any(char::is_whitespace) {
                Err("must not contain whitespace".to_string())
            } else {
                Ok(Parsed::Text(trimmed.to_string()))
            }
        }
        FieldKind::Category => {
            if CATEGORY_RE.is_match(trimmed) {
                Ok(Parsed::List(trimmed.split(',').map(str::to_string).collect()))
            } else {
                Err("expected comma-separated names without whitespace".to_string())
            }
        }
        FieldKind::Bool => schema::parse_bool(trimmed)
            .map(Parsed::Flag)
            .ok_or_else(|| format!("expected true or false, got '{trimmed}'")),
        FieldKind::Shell => trimmed
            .parse::<ShellType>()
            .map(Parsed::Shell)
            .map_err(|e| e.to_string()),
        FieldKind::Path => {
            if trimmed.is_empty() {
                Err("must not be empty".to_string())
            } else {
                Ok(Parsed::Text(value.to_string()))
            }
        }
        FieldKind::MimeType => {
            if MIME_RE.is_match(trimmed) {
                Ok(Parsed::Text(trimmed.to_string()))
            } else {
                Err(format!("expected type/subtype, got '{trimmed}'"))
            }
        }
        FieldKind::PositiveInt => match trimmed.parse::<u32>() {
            Ok(n) if n > 0 => Ok(Parsed::Number(n)),
            _ => Err(format!("expected a positive integer, got '{trimmed}'")),
        },
    }
}

fn apply(annotations: &mut Annotations, key: &str, parsed: Parsed) {
    match (key, parsed) {
        (schema::ID, Parsed::Text(v)) => annotations.id = Some(v),
        (schema::CATEGORY, Parsed::List(v)) => annotations.category = v,
        (schema::BACKGROUND, Parsed::Flag(v)) => annotations.background = v,
        (schema::INTERACTIVE, Parsed::Flag(v)) => annotations.interactive = v,
        (schema::CLOSE_TERMINAL_ON_SUCCESS, Parsed::Flag(v)) => {
            annotations.close_terminal_on_success = v;
        }
        (schema::SKIP_PROMPTS, Parsed::Flag(v)) => annotations.skip_prompts = v,
        (schema::EXCLUDE_FROM_RUN_ALL, Parsed::Flag(v)) => annotations.exclude_from_run_all = v,
        (schema::SHELL, Parsed::Shell(v)) => annotations.shell = Some(v),
        (schema::CWD, Parsed::Text(v)) => annotations.cwd = Some(v),
        (schema::MIME_TYPE, Parsed::Text(v)) => annotations.mime_type = Some(v),
        (schema::TERMINAL_ROWS, Parsed::Number(v)) => annotations.terminal_rows = Some(v),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{BACKGROUND, NAME, SHELL, TERMINAL_ROWS};

    fn meta(pairs: &[(&str, &str)]) -> Metadata {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn legacy_name_fills_empty_canonical() {
        let v = AnnotationValidator::new();
        let a = v
            .validate(&meta(&[("name", ""), ("runme.dev/name", "foo")]))
            .unwrap();
        assert_eq!(a.name, "foo");
    }

    #[test]
    fn canonical_name_wins() {
        let v = AnnotationValidator::new();
        let a = v
            .validate(&meta(&[("name", "bar"), ("runme.dev/name", "foo")]))
            .unwrap();
        assert_eq!(a.name, "bar");
    }

    #[test]
    fn missing_name_strict_vs_lenient() {
        let v = AnnotationValidator::new();
        let raw = meta(&[("background", "true")]);

        let err = v.validate(&raw).unwrap_err();
        assert!(err.has_field(NAME));
        assert_eq!(err.field(NAME), Some(&["required".to_string()][..]));

        let lenient = v.safe_validate(&raw);
        assert_eq!(lenient.name, "");
        assert!(lenient.background);
    }

    #[test]
    fn strict_reports_every_failing_field() {
        let v = AnnotationValidator::new();
        let raw = meta(&[
            ("name", "build"),
            ("background", "maybe"),
            ("shell", "tcsh"),
            ("terminalRows", "0"),
        ]);
        let err = v.validate(&raw).unwrap_err();
        assert!(err.has_field(BACKGROUND));
        assert!(err.has_field(SHELL));
        assert!(err.has_field(TERMINAL_ROWS));
        assert!(!err.has_field(NAME));
        assert!(err.to_string().starts_with("invalid annotations: "));
    }

    #[test]
    fn lenient_defaults_failing_fields() {
        let v = AnnotationValidator::new();
        let a = v.safe_validate(&meta(&[
            ("name", "build"),
            ("interactive", "perhaps"),
            ("terminalRows", "abc"),
        ]));
        assert_eq!(a.name, "build");
        assert!(a.interactive);
        assert_eq!(a.terminal_rows, None);
    }

    #[test]
    fn unknown_fields_pass_through() {
        let v = AnnotationValidator::new();
        let a = v
            .validate(&meta(&[("name", "x"), ("owner", "ops")]))
            .unwrap();
        assert_eq!(a.extra.get("owner").map(String::as_str), Some("ops"));
    }

    #[test]
    fn reserved_keys_rejected_strictly_dropped_leniently() {
        let v = AnnotationValidator::new();
        let raw = meta(&[("name", "x"), ("runme.dev/uuid", "abc")]);
        let err = v.validate(&raw).unwrap_err();
        assert!(err.has_field("runme.dev/uuid"));

        let a = v.safe_validate(&raw);
        assert!(a.extra.is_empty());
    }

    #[test]
    fn typed_fields() {
        let v = AnnotationValidator::new();
        let a = v
            .validate(&meta(&[
                ("name", "serve"),
                ("category", "setup,dev"),
                ("background", "true"),
                ("interactive", "false"),
                ("shell", "bash"),
                ("cwd", "./app"),
                ("mimeType", "text/plain"),
                ("terminalRows", "25"),
                ("id", "01HEXJ9KWG7BYSFYCNKVF0VWR6"),
            ]))
            .unwrap();
        assert_eq!(a.category, vec!["setup", "dev"]);
        assert!(a.in_category("dev"));
        assert!(a.background);
        assert!(!a.interactive);
        assert_eq!(a.shell, Some(ShellType::Sh));
        assert_eq!(a.cwd.as_deref(), Some("./app"));
        assert_eq!(a.mime_type.as_deref(), Some("text/plain"));
        assert_eq!(a.terminal_rows, Some(25));
        assert_eq!(a.id.as_deref(), Some("01HEXJ9KWG7BYSFYCNKVF0VWR6"));
    }

    #[test]
    fn bad_category() {
        let v = AnnotationValidator::new();
        let err = v
            .validate(&meta(&[("name", "x"), ("category", "a, b")]))
            .unwrap_err();
        assert!(err.has_field("category"));
    }

    #[test]
    fn cell_annotation_trait() {
        let cell = CodeCell::new("ls", "sh").with_metadata("runme.dev/name", "list");
        assert_eq!(cell.annotations().name, "list");
        assert_eq!(cell.validate_annotations().unwrap().name, "list");
    }

    #[derive(Clone, Default)]
    struct Captured(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn lenient_drops_are_logged_as_warnings() {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        let annotations = tracing::subscriber::with_default(subscriber, || {
            AnnotationValidator::new()
                .safe_validate(&meta(&[(NAME, "list"), (BACKGROUND, "sometimes")]))
        });
        assert!(!annotations.background);

        let output = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("WARN"));
        assert!(output.contains("background"));
    }
}
