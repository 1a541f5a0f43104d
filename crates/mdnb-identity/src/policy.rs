//! Identity policy levels

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which parts of a document receive identity
///
/// Ordered by level: `None < Document < All`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentityPolicy {
    /// Never assign identity
    None,
    /// Assign a document id if missing (level 1)
    Document,
    /// Also assign ids to every code cell lacking one (level 2 and up)
    #[default]
    All,
}

impl IdentityPolicy {
    /// Policy for a numeric level
    #[must_use]
    pub const fn from_level(level: u32) -> Self {
        match level {
            0 => Self::None,
            1 => Self::Document,
            _ => Self::All,
        }
    }

    /// Numeric level, written to frontmatter as `v<level>`
    #[inline]
    #[must_use]
    pub const fn level(&self) -> u32 {
        match self {
            Self::None => 0,
            Self::Document => 1,
            Self::All => 2,
        }
    }

    /// Whether code cells receive ids
    #[inline]
    #[must_use]
    pub const fn assigns_cells(&self) -> bool {
        matches!(self, Self::All)
    }

    /// Frontmatter version string for this policy
    #[must_use]
    pub fn version_tag(&self) -> String {
        format!("v{}", self.level())
    }
}

impl fmt::Display for IdentityPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::None => "none",
            Self::Document => "document",
            Self::All => "all",
        })
    }
}

/// Unrecognized policy name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown identity policy: '{0}' (expected none, document, all or a level)")]
pub struct UnknownPolicy(pub String);

impl FromStr for IdentityPolicy {
    type Err = UnknownPolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "document" | "doc" => Ok(Self::Document),
            "all" | "cell" => Ok(Self::All),
            other => other
                .parse::<u32>()
                .map(Self::from_level)
                .map_err(|_| UnknownPolicy(trimmed.to_string())),
        }
    }
}
