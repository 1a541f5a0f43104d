//! Command sequences
//!
//! Turns the free-form text of a shell cell into one-line commands.
//!
//! # Rules
//! 1. A line ending in `\` continues on the next line; the pieces are
//!    trimmed and joined with a single space.
//! 2. Text from the first unescaped `#` on is a comment.
//! 3. One leading `$` prompt marker is stripped.
//! 4. Lines left empty are dropped.
//!
//! Sequencing never fails: malformed input yields fewer commands.

use crate::platform::{to_shell_invocation, Platform};
use serde::{Deserialize, Serialize};

/// Shell prompt marker
pub const PROMPT_MARKER: char = '$';

/// Ordered, shell-ready commands of a cell
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommandSequence {
    commands: Vec<String>,
}

impl CommandSequence {
    /// Sequence a cell body
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let commands = logical_lines(text)
            .iter()
            .filter_map(|line| clean_line(line))
            .collect();
        Self { commands }
    }

    /// Commands in order
    #[inline]
    #[must_use]
    pub fn commands(&self) -> &[String] {
        &self.commands
    }

    /// Number of commands
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// True when the cell has nothing to run
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Iterate commands
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().map(String::as_str)
    }

    /// Single shell string for `platform`, `None` when empty
    #[must_use]
    pub fn to_shell_invocation(&self, platform: Platform) -> Option<String> {
        to_shell_invocation(self, platform)
    }

    /// Owned commands
    #[must_use]
    pub fn into_inner(self) -> Vec<String> {
        self.commands
    }
}

impl<S: Into<String>> FromIterator<S> for CommandSequence {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            commands: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<Vec<String>> for CommandSequence {
    fn from(commands: Vec<String>) -> Self {
        Self { commands }
    }
}

impl<'a> IntoIterator for &'a CommandSequence {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.commands.iter()
    }
}

/// Sequence a cell body
#[inline]
#[must_use]
pub fn command_sequence(text: &str) -> CommandSequence {
    CommandSequence::parse(text)
}

/// Strip one prompt marker per line, keeping every line
///
/// Used for script execution, where the body runs as a file rather than
/// as joined commands. No continuation joining or comment stripping.
#[must_use]
pub fn prepare_prompts(text: &str) -> Vec<String> {
    text.split('\n')
        .map(|line| {
            let stripped = line.trim_start();
            match stripped.strip_prefix(PROMPT_MARKER) {
                Some(rest) => rest.trim_start().to_string(),
                None => line.to_string(),
            }
        })
        .collect()
}

/// Apply continuation joining
fn logical_lines(text: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut pending: Option<String> = None;

    for raw in text.lines() {
        let (body, continues) = match raw.strip_suffix('\\') {
            Some(body) => (body, true),
            None => (raw, false),
        };
        let piece = body.trim();

        let line = match pending.take() {
            Some(mut acc) => {
                if !piece.is_empty() {
                    if !acc.is_empty() {
                        acc.push(' ');
                    }
                    acc.push_str(piece);
                }
                acc
            }
            None => piece.to_string(),
        };

        if continues {
            pending = Some(line);
        } else {
            lines.push(line);
        }
    }

    if let Some(rest) = pending {
        lines.push(rest);
    }
    lines
}

fn clean_line(line: &str) -> Option<String> {
    let stripped = strip_comment(line).trim();
    let stripped = stripped
        .strip_prefix(PROMPT_MARKER)
        .map_or(stripped, str::trim);
    (!stripped.is_empty()).then(|| stripped.to_string())
}

/// Cut at the first `#` not preceded by an unpaired backslash
fn strip_comment(line: &str) -> &str {
    let mut escaped = false;
    for (i, c) in line.char_indices() {
        match c {
            '\\' => escaped = !escaped,
            '#' if !escaped => return &line[..i],
            _ => escaped = false,
        }
    }
    line
}
