/// A scripted [`Runner`] for command-level tests.
use std::cell::RefCell;
use std::collections::VecDeque;

use super::errors::ExecError;
use super::runner::{CommandResult, Runner, Tool};

/// Replays queued stdout payloads and records every invocation.
#[derive(Debug, Default)]
pub struct FakeRunner {
    replies: RefCell<VecDeque<(i32, String)>>,
    calls: RefCell<Vec<Vec<String>>>,
}

impl FakeRunner {
    /// Queue a successful reply.
    pub fn reply(self, stdout: &str) -> Self {
        self.replies.borrow_mut().push_back((0, stdout.to_owned()));
        self
    }

    /// Queue a failing reply; the text goes to stderr.
    pub fn fail(self, code: i32, stderr: &str) -> Self {
        self.replies.borrow_mut().push_back((code, stderr.to_owned()));
        self
    }

    /// Argument vectors seen so far (program name excluded).
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.borrow().clone()
    }
}

impl Runner for FakeRunner {
    fn run(&self, tool: Tool, args: &[String]) -> Result<CommandResult, ExecError> {
        self.calls.borrow_mut().push(args.to_vec());
        let (code, text) = self.replies.borrow_mut().pop_front().unwrap_or_default();

        let mut argv = vec![tool.program().to_owned()];
        argv.extend(args.iter().cloned());

        let (lines, stderr) = if code == 0 {
            (text.lines().map(|l| l.trim().to_owned()).collect(), String::new())
        } else {
            (Vec::new(), text)
        };
        Ok(CommandResult {
            argv,
            exit_code: code,
            lines,
            stderr,
        })
    }
}
