/// Top-level error for every `vbcc` command.
use thiserror::Error;

use crate::exec::ExecError;
use crate::validate::ValidationError;

/// Errors that can end a command.
#[derive(Debug, Error)]
pub enum CtlError {
    /// Input failed its rule table; nothing was run.
    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),

    /// The tool could not be run, timed out or exited non-zero.
    #[error(transparent)]
    Exec(#[from] ExecError),

    /// A keyed selection matched nothing in the report.
    #[error("No {kind} named '{query}'{}", did_you_mean(candidates))]
    NotFound {
        /// What was looked up (`vm`, `network`, `group`).
        kind: &'static str,
        /// The selection as given.
        query: String,
        /// Closest existing keys, best first.
        candidates: Vec<String>,
    },

    /// An argument that is well-formed but unusable (e.g. a missing file).
    #[error("{0}")]
    InvalidInput(String),

    /// The settings file could not be loaded.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The machine did not reach `poweroff` in time.
    #[error("'{vm}' still {state} after {secs}s")]
    WaitTimeout {
        vm: String,
        secs: u64,
        /// Last observed `VMState`.
        state: String,
    },
}

fn did_you_mean(candidates: &[String]) -> String {
    match candidates.first() {
        Some(best) => format!(". Did you mean '{best}'?"),
        None => String::new(),
    }
}

impl CtlError {
    /// Return the CLI exit code for this error.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Validation(_) | Self::InvalidInput(_) | Self::Config(_) => 2,
            Self::Exec(_) => 3,
            Self::NotFound { .. } => 4,
            Self::WaitTimeout { .. } => 1,
        }
    }
}
