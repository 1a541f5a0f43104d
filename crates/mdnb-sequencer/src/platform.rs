//! Platform join rules
//!
//! A sequence runs as one shell string. The abort-on-failure prefix
//! differs per platform:
//!
//! | Platform | Prefix |
//! |---|---|
//! | macOS | `set -e -o pipefail; ` |
//! | other Unix | `set -e; ` |
//! | Windows | none |

use crate::sequence::CommandSequence;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Separator between joined commands
pub const COMMAND_SEPARATOR: &str = "; ";

/// Target platform family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// macOS (`darwin`)
    MacOs,
    /// Linux and other Unix-likes
    Unix,
    /// Windows family
    Windows,
}

impl Platform {
    /// Platform for an OS name such as `darwin`, `linux` or `win32`
    #[must_use]
    pub fn from_os(os: &str) -> Self {
        let os = os.trim().to_ascii_lowercase();
        match os.as_str() {
            "darwin" | "macos" => Self::MacOs,
            _ if os.starts_with("win") => Self::Windows,
            _ => Self::Unix,
        }
    }

    /// Platform of the running process
    #[must_use]
    pub fn current() -> Self {
        Self::from_os(std::env::consts::OS)
    }

    /// Prefix prepended to joined commands
    #[inline]
    #[must_use]
    pub const fn prefix(&self) -> Option<&'static str> {
        match self {
            Self::MacOs => Some("set -e -o pipefail; "),
            Self::Unix => Some("set -e; "),
            Self::Windows => None,
        }
    }
}

impl Default for Platform {
    fn default() -> Self {
        Self::current()
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::MacOs => "macos",
            Self::Unix => "unix",
            Self::Windows => "windows",
        })
    }
}

/// Join a sequence into one invocation for `platform`
///
/// Returns `None` for an empty sequence; callers treat that as a no-op.
#[must_use]
pub fn to_shell_invocation(sequence: &CommandSequence, platform: Platform) -> Option<String> {
    if sequence.is_empty() {
        return None;
    }
    let joined = sequence.commands().join(COMMAND_SEPARATOR);
    Some(match platform.prefix() {
        Some(prefix) => format!("{prefix}{joined}"),
        None => joined,
    })
}
