//! mdnb Sequencer
//!
//! From cell text to something a host can run.
//!
//! # Core Concepts
//!
//! - [`CommandSequence`]: one-line commands derived from a cell body
//! - [`Platform`]: join rules (`set -e`, `pipefail`, none on Windows)
//! - [`EnvStore`] / [`SharedEnvStore`]: execution environment with reset
//! - [`ExecutionKey`]: executor selection (deno, github, language)
//! - [`ExecutionPlan`]: strictly validated, fully resolved execution
//!
//! # Example
//!
//! ```rust
//! use mdnb_sequencer::{command_sequence, Platform};
//!
//! let seq = command_sequence("$ echo a\n# note\n$ echo b");
//! assert_eq!(
//!     seq.to_shell_invocation(Platform::MacOs).as_deref(),
//!     Some("set -e -o pipefail; echo a; echo b")
//! );
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod env;
mod key;
mod plan;
mod platform;
mod sequence;

pub use env::{
    convert_env_list, process_environ, EnvMap, EnvSession, EnvStore, SharedEnvStore, DEFAULT_ENV,
};
pub use key::ExecutionKey;
pub use plan::ExecutionPlan;
pub use platform::{to_shell_invocation, Platform, COMMAND_SEPARATOR};
pub use sequence::{command_sequence, prepare_prompts, CommandSequence, PROMPT_MARKER};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
