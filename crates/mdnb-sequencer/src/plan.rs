//! Execution plans
//!
//! Everything a host needs to run one cell, resolved up front. Preparing a
//! plan validates annotations strictly: a cell with malformed annotations
//! is rejected before anything runs.

use crate::env::{EnvMap, EnvStore};
use crate::key::ExecutionKey;
use crate::platform::Platform;
use crate::sequence::{prepare_prompts, CommandSequence};
use mdnb_annotations::{CellAnnotations, ValidationError};
use mdnb_document::{CodeCell, Frontmatter, ShellType};
use serde::Serialize;

/// Resolved execution of a single code cell
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionPlan {
    /// Cell name
    pub name: String,
    /// Cell identity, if assigned
    pub cell_id: Option<String>,
    /// Executor selector
    pub key: ExecutionKey,
    /// Shell family; `None` for non-shell languages
    pub shell: Option<ShellType>,
    /// Commands, empty for non-shell cells
    pub commands: CommandSequence,
    /// Joined shell string, `None` when there is nothing to run
    pub invocation: Option<String>,
    /// Body lines with prompt markers stripped, for script execution
    pub script: Vec<String>,
    /// Working directory
    pub cwd: Option<String>,
    /// Run detached
    pub background: bool,
    /// Attach an interactive terminal
    pub interactive: bool,
    /// Close terminal after a zero exit
    pub close_terminal_on_success: bool,
    /// Do not prompt for env values
    pub skip_prompts: bool,
    /// Environment snapshot the cell runs with
    pub env: EnvMap,
}

impl ExecutionPlan {
    /// Prepare a plan for a cell without document-level defaults
    ///
    /// # Errors
    /// Returns [`ValidationError`] when the cell's annotations fail
    /// strict validation.
    pub fn prepare(
        cell: &CodeCell,
        env: &EnvStore,
        platform: Platform,
    ) -> Result<Self, ValidationError> {
        Self::prepare_in(cell, &Frontmatter::default(), env, platform)
    }

    /// Prepare a plan, falling back to frontmatter for shell, cwd and
    /// prompt skipping
    ///
    /// # Errors
    /// Returns [`ValidationError`] when the cell's annotations fail
    /// strict validation.
    pub fn prepare_in(
        cell: &CodeCell,
        frontmatter: &Frontmatter,
        env: &EnvStore,
        platform: Platform,
    ) -> Result<Self, ValidationError> {
        let annotations = cell.validate_annotations()?;

        let shell = annotations
            .shell
            .or_else(|| frontmatter.shell.as_deref().and_then(ShellType::classify))
            .or_else(|| ShellType::classify(&cell.language_id));
        let key = ExecutionKey::for_cell(cell);

        let commands = match (&shell, &key) {
            (Some(_), ExecutionKey::Language(_)) => CommandSequence::parse(&cell.value),
            _ => CommandSequence::default(),
        };
        let invocation = commands.to_shell_invocation(platform);

        tracing::debug!(
            "prepared cell '{}' ({}): {} command(s) for {}",
            annotations.name,
            key,
            commands.len(),
            platform
        );

        Ok(Self {
            name: annotations.name,
            cell_id: annotations.id,
            key,
            shell,
            commands,
            invocation,
            script: prepare_prompts(&cell.value),
            cwd: annotations.cwd.or_else(|| frontmatter.cwd.clone()),
            background: annotations.background,
            interactive: annotations.interactive,
            close_terminal_on_success: annotations.close_terminal_on_success,
            skip_prompts: annotations.skip_prompts || frontmatter.skip_prompts,
            env: env.snapshot(),
        })
    }

    /// True when a shell cell has no commands
    #[inline]
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.shell.is_some() && self.invocation.is_none()
    }
}
