/// Synchronous invocation of `VBoxManage` / `VBoxHeadless`.
///
/// One call starts one child process, drains stdout and stderr on helper
/// threads (so a chatty stderr can never block the child on a full pipe),
/// waits for exit and returns everything as a [`CommandResult`].
///
/// Without a timeout the call blocks until the tool exits. With one, the
/// child is polled and killed once the limit passes.
use std::io::Read;
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use super::errors::ExecError;

/// How often a child is polled while a timeout is armed.
const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// The VirtualBox executables this crate knows how to drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
pub enum Tool {
    /// The management front-end (all listing and configuration commands).
    #[default]
    #[value(name = "vboxmanage")]
    #[serde(rename = "vboxmanage", alias = "VBoxManage")]
    VBoxManage,
    /// The headless VM front-end.
    #[value(name = "vboxheadless")]
    #[serde(rename = "vboxheadless", alias = "VBoxHeadless")]
    VBoxHeadless,
}

impl Tool {
    /// Executable name looked up on `PATH`.
    #[must_use]
    pub fn program(self) -> &'static str {
        match self {
            Self::VBoxManage => "VBoxManage",
            Self::VBoxHeadless => "VBoxHeadless",
        }
    }
}

/// Output of one tool invocation. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandResult {
    /// Program followed by its arguments.
    pub argv: Vec<String>,
    /// Exit code; `-1` when the child was terminated by a signal.
    pub exit_code: i32,
    /// Stdout split into lines, each trimmed.
    pub lines: Vec<String>,
    /// Stderr, trimmed.
    pub stderr: String,
}

impl CommandResult {
    #[must_use]
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    #[must_use]
    pub fn command_line(&self) -> String {
        self.argv.join(" ")
    }

    /// Turn a non-zero exit into an error carrying the code and stderr.
    ///
    /// # Errors
    ///
    /// Returns `ExecError::Failed` when the tool did not exit cleanly.
    pub fn check(self) -> Result<Self, ExecError> {
        if self.success() {
            Ok(self)
        } else {
            Err(ExecError::Failed {
                command: self.command_line(),
                code: self.exit_code,
                stderr: self.stderr,
            })
        }
    }
}

/// Something that can run the tool. Tests substitute canned output.
pub trait Runner {
    /// Run `tool` with `args` and capture its output.
    ///
    /// # Errors
    ///
    /// Returns `ExecError` if the process cannot be started, read or times out.
    /// A non-zero exit is *not* an error here; see [`CommandResult::check`].
    fn run(&self, tool: Tool, args: &[String]) -> Result<CommandResult, ExecError>;
}

/// Runs the real executable as a child process.
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner {
    /// Use this executable instead of looking up the tool's name on `PATH`.
    program: Option<PathBuf>,
    timeout: Option<Duration>,
}

impl ProcessRunner {
    #[must_use]
    pub fn new(program: Option<PathBuf>, timeout: Option<Duration>) -> Self {
        Self { program, timeout }
    }

    fn program_for(&self, tool: Tool) -> PathBuf {
        self.program
            .clone()
            .unwrap_or_else(|| PathBuf::from(tool.program()))
    }
}

impl Runner for ProcessRunner {
    fn run(&self, tool: Tool, args: &[String]) -> Result<CommandResult, ExecError> {
        let program = self.program_for(tool);
        let mut argv = Vec::with_capacity(args.len() + 1);
        argv.push(program.display().to_string());
        argv.extend(args.iter().cloned());
        tracing::debug!(command = %argv.join(" "), "running tool");

        let mut child = Command::new(&program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| ExecError::Spawn {
                program: program.display().to_string(),
                source,
            })?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let stdout_task = thread::spawn(move || read_stream(stdout));
        let stderr_task = thread::spawn(move || read_stream(stderr));

        let start = Instant::now();
        let status = match wait(&mut child, self.timeout, start)? {
            Some(status) => status,
            None => {
                return Err(ExecError::Timeout {
                    command: argv.join(" "),
                    elapsed_ms: u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
                });
            }
        };

        let stdout = stdout_task.join().unwrap_or_default();
        let stderr = stderr_task.join().unwrap_or_default();
        let exit_code = status.code().unwrap_or(-1);
        tracing::debug!(exit_code, elapsed = ?start.elapsed(), "tool finished");

        Ok(CommandResult {
            argv,
            exit_code,
            lines: stdout.lines().map(|l| l.trim().to_owned()).collect(),
            stderr: stderr.trim().to_owned(),
        })
    }
}

/// Wait for `child`, honouring `timeout`. `Ok(None)` means it was killed.
fn wait(
    child: &mut Child,
    timeout: Option<Duration>,
    start: Instant,
) -> Result<Option<ExitStatus>, ExecError> {
    let Some(limit) = timeout else {
        return Ok(Some(child.wait()?));
    };

    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if start.elapsed() >= limit {
            tracing::warn!(timeout = ?limit, "tool timed out, killing it");
            // The child may exit between try_wait and kill; either way it is gone.
            let _ = child.kill();
            let _ = child.wait();
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

/// Read a whole pipe, replacing invalid UTF-8.
fn read_stream<R: Read>(handle: Option<R>) -> String {
    let mut buf = Vec::new();
    if let Some(mut h) = handle {
        let _ = h.read_to_end(&mut buf);
    }
    String::from_utf8_lossy(&buf).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn test_tool_program_names() {
        assert_eq!(Tool::VBoxManage.program(), "VBoxManage");
        assert_eq!(Tool::VBoxHeadless.program(), "VBoxHeadless");
    }

    #[test]
    fn test_check_maps_failure() {
        let result = CommandResult {
            argv: args(&["VBoxManage", "list", "vms"]),
            exit_code: 1,
            lines: vec![],
            stderr: "boom".to_owned(),
        };
        assert!(matches!(
            result.check(),
            Err(ExecError::Failed { code: 1, stderr, .. }) if stderr == "boom"
        ));
    }

    #[test]
    fn test_missing_binary_is_spawn_error() {
        let runner = ProcessRunner::new(Some(PathBuf::from("/nonexistent/VBoxManage")), None);
        let err = runner.run(Tool::VBoxManage, &args(&["list", "vms"])).unwrap_err();
        assert!(matches!(err, ExecError::Spawn { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_captures_trimmed_lines_and_stderr() {
        let runner = ProcessRunner::new(Some(PathBuf::from("sh")), None);
        let result = runner
            .run(
                Tool::VBoxManage,
                &args(&["-c", r#"printf '  "vm1" {u1}  \n"vm2" {u2}\n'; echo oops >&2; exit 3"#]),
            )
            .unwrap();
        assert_eq!(result.exit_code, 3);
        assert_eq!(result.lines, vec![r#""vm1" {u1}"#, r#""vm2" {u2}"#]);
        assert_eq!(result.stderr, "oops");
        assert_eq!(result.argv[0], "sh");
    }

    #[cfg(unix)]
    #[test]
    fn test_timeout_kills_child() {
        let runner = ProcessRunner::new(
            Some(PathBuf::from("sh")),
            Some(Duration::from_millis(100)),
        );
        let err = runner
            .run(Tool::VBoxManage, &args(&["-c", "exec sleep 5"]))
            .unwrap_err();
        assert!(matches!(err, ExecError::Timeout { .. }));
    }
}
