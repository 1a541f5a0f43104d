//! Terminal tagging
//!
//! Terminals spawned for a cell carry the cell id either in their
//! environment (`RUNME_ID`) or as a `(RUNME_ID: <id>)` suffix on the
//! terminal name.

use std::collections::BTreeMap;

/// Environment variable carrying the cell id
pub const TERMINAL_ID_ENV: &str = "RUNME_ID";

const TAG_OPEN: &str = "(RUNME_ID: ";

/// Terminal name tagged with a cell id
#[must_use]
pub fn terminal_name(base: &str, cell_id: &str) -> String {
    if base.is_empty() {
        format!("{TAG_OPEN}{cell_id})")
    } else {
        format!("{base} {TAG_OPEN}{cell_id})")
    }
}

/// Cell id a terminal belongs to
///
/// The environment wins over the name suffix.
#[must_use]
pub fn terminal_cell_id(env: Option<&BTreeMap<String, String>>, name: &str) -> Option<String> {
    if let Some(id) = env
        .and_then(|env| env.get(TERMINAL_ID_ENV))
        .filter(|id| !id.is_empty())
    {
        return Some(id.clone());
    }

    let body = name.strip_suffix(')')?;
    let start = body.find(TAG_OPEN)? + TAG_OPEN.len();
    Some(body[start..].to_string()).filter(|id| !id.is_empty())
}
