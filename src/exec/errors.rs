/// Errors from running the external VirtualBox tool.
use thiserror::Error;

/// Typed errors from the process boundary.
#[derive(Debug, Error)]
pub enum ExecError {
    /// The executable could not be started (not installed, not on `PATH`, no permission).
    #[error("Failed to start '{program}': {source}")]
    Spawn {
        /// Program that was looked up.
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// I/O failure while waiting for or reading from the child.
    #[error("I/O error while running the tool: {0}")]
    Io(#[from] std::io::Error),

    /// The child outlived the configured timeout and was killed.
    #[error("'{command}' did not finish within {elapsed_ms}ms and was killed")]
    Timeout {
        /// Full command line.
        command: String,
        /// Time waited before killing it.
        elapsed_ms: u64,
    },

    /// The tool exited with a non-zero status.
    #[error("'{command}' exited with code {code}{}", stderr_suffix(stderr))]
    Failed {
        /// Full command line.
        command: String,
        /// Exit code (`-1` when killed by a signal).
        code: i32,
        /// Captured standard error, trimmed.
        stderr: String,
    },
}

fn stderr_suffix(stderr: &str) -> String {
    if stderr.is_empty() {
        String::new()
    } else {
        format!(": {stderr}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_message_includes_stderr() {
        let err = ExecError::Failed {
            command: "VBoxManage showvminfo nope".to_owned(),
            code: 1,
            stderr: "VBoxManage: error: Could not find a registered machine named 'nope'".to_owned(),
        };
        let msg = err.to_string();
        assert!(msg.contains("exited with code 1"));
        assert!(msg.contains("Could not find a registered machine"));
    }

    #[test]
    fn test_failed_message_without_stderr() {
        let err = ExecError::Failed {
            command: "VBoxManage list vms".to_owned(),
            code: 2,
            stderr: String::new(),
        };
        assert_eq!(err.to_string(), "'VBoxManage list vms' exited with code 2");
    }
}
