//! Language identifiers for code cells
//!
//! Every code cell carries exactly one resolved language identifier.
//! Shell aliases collapse onto a canonical family tag.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Language assigned to code cells that do not declare one
pub const DEFAULT_LANGUAGE: &str = "sh";

/// Shell families a cell can be executed with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShellType {
    /// POSIX-style shells (sh, bash, zsh, ksh)
    Sh,
    /// Windows `cmd.exe` batch
    Cmd,
    /// PowerShell / pwsh
    Powershell,
    /// fish
    Fish,
}

impl ShellType {
    /// Classify a language or shell name, `None` if it is not a shell
    #[must_use]
    pub fn classify(language: &str) -> Option<Self> {
        match language.trim().to_ascii_lowercase().as_str() {
            "sh" | "bash" | "zsh" | "ksh" | "shell" | "shellscript" => Some(Self::Sh),
            "bat" | "cmd" => Some(Self::Cmd),
            "powershell" | "pwsh" => Some(Self::Powershell),
            "fish" => Some(Self::Fish),
            _ => None,
        }
    }

    /// Canonical tag
    #[inline]
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Sh => "sh",
            Self::Cmd => "cmd",
            Self::Powershell => "powershell",
            Self::Fish => "fish",
        }
    }
}

impl fmt::Display for ShellType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ShellType {
    type Err = UnknownShell;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::classify(s).ok_or_else(|| UnknownShell(s.to_string()))
    }
}

/// Name that does not classify as a shell
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown shell: '{0}'")]
pub struct UnknownShell(pub String);

/// Normalize a fence language to its resolved identifier
///
/// Empty input resolves to [`DEFAULT_LANGUAGE`]; `zsh`, `shell` and
/// `shellscript` collapse to `sh`; everything else is lower-cased.
#[must_use]
pub fn normalize_language(language: &str) -> String {
    let lowered = language.trim().to_ascii_lowercase();
    match lowered.as_str() {
        "" | "zsh" | "shell" | "shellscript" => DEFAULT_LANGUAGE.to_string(),
        _ => lowered,
    }
}

/// Whether a resolved language runs through a shell
#[inline]
#[must_use]
pub fn is_shell_language(language: &str) -> bool {
    ShellType::classify(language).is_some()
}
