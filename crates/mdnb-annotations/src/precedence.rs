//! Legacy-key precedence
//!
//! A canonical key wins only if its value is non-empty; otherwise the legacy
//! alias supplies the value. The alias table lives in [`crate::schema::FIELDS`].

use crate::schema::FIELDS;
use mdnb_document::Metadata;

/// Resolve one field from a raw map using the precedence rule
#[must_use]
pub fn resolve<'a>(raw: &'a Metadata, key: &str, legacy: Option<&str>) -> Option<&'a str> {
    let canonical = raw.get(key).map(String::as_str);
    match canonical {
        Some(value) if !value.trim().is_empty() => Some(value),
        _ => legacy
            .and_then(|alias| raw.get(alias))
            .map(String::as_str)
            .or(canonical),
    }
}

/// Fold legacy aliases into their canonical keys
///
/// Alias entries are removed; the canonical entry holds the resolved value.
/// All other entries are kept as-is.
#[must_use]
pub fn normalize_metadata(raw: &Metadata) -> Metadata {
    let mut normalized = raw.clone();
    for spec in FIELDS {
        let Some(alias) = spec.legacy else {
            continue;
        };
        let resolved = resolve(raw, spec.key, Some(alias)).map(str::to_string);
        normalized.remove(alias);
        if let Some(value) = resolved {
            normalized.insert(spec.key.to_string(), value);
        }
    }
    normalized
}
