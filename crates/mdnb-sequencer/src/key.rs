//! Execution keys
//!
//! Which executor handles a cell. Most cells run by language; a few
//! content patterns are routed to dedicated executors.

use mdnb_document::{normalize_language, CodeCell};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Executor selector for a cell
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionKey {
    /// Deno deploy script (`deployctl deploy`)
    Deno,
    /// GitHub workflow link
    Github,
    /// Normalized language id
    Language(String),
}

impl ExecutionKey {
    /// Key for a cell body and language
    #[must_use]
    pub fn from_parts(text: &str, language: &str) -> Self {
        if is_deno_script(text) {
            Self::Deno
        } else if is_github_link(text) {
            Self::Github
        } else {
            Self::Language(normalize_language(language))
        }
    }

    /// Key for a code cell
    #[inline]
    #[must_use]
    pub fn for_cell(cell: &CodeCell) -> Self {
        Self::from_parts(&cell.value, &cell.language_id)
    }

    /// Key as a string
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Deno => "deno",
            Self::Github => "github",
            Self::Language(language) => language,
        }
    }
}

impl fmt::Display for ExecutionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn is_deno_script(text: &str) -> bool {
    text.contains("deployctl deploy")
}

fn is_github_link(text: &str) -> bool {
    let text = text.trim();
    text.starts_with("https://github.com")
        && (text.contains(".github/workflows") || text.contains("actions/workflows"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deno() {
        let key = ExecutionKey::from_parts("deployctl deploy --project=x main.ts", "sh");
        assert_eq!(key, ExecutionKey::Deno);
    }

    #[test]
    fn github() {
        let key = ExecutionKey::from_parts(
            "https://github.com/stateful/runme/actions/workflows/release.yml",
            "sh",
        );
        assert_eq!(key, ExecutionKey::Github);
        assert_eq!(
            ExecutionKey::from_parts("https://github.com/stateful/runme", "sh").as_str(),
            "sh"
        );
    }

    #[test]
    fn language_is_normalized() {
        assert_eq!(ExecutionKey::from_parts("ls", "shellscript").as_str(), "sh");
        assert_eq!(ExecutionKey::from_parts("print(1)", "Python").as_str(), "python");
    }
}
