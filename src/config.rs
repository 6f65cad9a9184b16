/// Settings file loading. Flags given on the command line win over the file.
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::cli::args::Cli;
use crate::exec::Tool;

/// Everything that shapes how the tool is run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Which VirtualBox executable to drive.
    pub tool: Tool,
    /// Explicit path to the executable, instead of a `PATH` lookup.
    pub program: Option<PathBuf>,
    /// Kill the tool after this many seconds. Unset means wait forever.
    pub timeout_secs: Option<u64>,
    pub debug: bool,
}

impl Settings {
    /// Read settings from `path`. `.json` files are JSON, anything else TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or does not parse.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let settings = if is_json {
            serde_json::from_str(&text)
                .with_context(|| format!("Invalid JSON in {}", path.display()))?
        } else {
            toml::from_str(&text).with_context(|| format!("Invalid TOML in {}", path.display()))?
        };
        Ok(settings)
    }

    /// Settings for this invocation: the `--config` file if any, then flags.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be loaded.
    pub fn resolve(cli: &Cli) -> Result<Self> {
        let base = match &cli.config {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        Ok(base.merge(cli))
    }

    #[must_use]
    pub fn merge(mut self, cli: &Cli) -> Self {
        if let Some(tool) = cli.tool {
            self.tool = tool;
        }
        if let Some(secs) = cli.timeout {
            self.timeout_secs = Some(secs);
        }
        self.debug |= cli.debug;
        self
    }

    /// `None` (no limit) when unset or zero.
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs
            .filter(|&s| s > 0)
            .map(Duration::from_secs)
    }
}
