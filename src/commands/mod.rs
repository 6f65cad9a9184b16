/// Command dispatch: routes `Command` enum variants to their implementations.
pub mod list;
pub mod network;
pub mod storage;
pub mod vm;

use crate::cli::OutputCtx;
use crate::cli::args::Command;
use crate::cli::output::write_invocation;
use crate::errors::CtlError;
use crate::exec::{CommandResult, Runner, Tool};
use crate::schema::{ToolCommand, prepare};
use crate::types::InvocationOutput;

/// What every handler needs to reach the tool.
pub struct Session<'a> {
    runner: &'a dyn Runner,
    tool: Tool,
    dry_run: bool,
}

impl<'a> Session<'a> {
    #[must_use]
    pub fn new(runner: &'a dyn Runner, tool: Tool, dry_run: bool) -> Self {
        Self {
            runner,
            tool,
            dry_run,
        }
    }

    /// Validate and run a read-only command, returning its output.
    ///
    /// Queries run even under `--dry-run`; they change nothing.
    ///
    /// # Errors
    ///
    /// Returns `CtlError` on validation failure or a failed invocation.
    pub fn query<C: ToolCommand + ?Sized>(&self, cmd: &C) -> Result<CommandResult, CtlError> {
        let invocation = prepare(cmd, false)?;
        Ok(self.runner.run(self.tool, &invocation.args)?.check()?)
    }

    /// Validate and run a state-changing command.
    ///
    /// Under `--dry-run` the argument vector is returned without running anything.
    ///
    /// # Errors
    ///
    /// Returns `CtlError` on validation failure or a failed invocation.
    pub fn change<C: ToolCommand + ?Sized>(&self, cmd: &C) -> Result<InvocationOutput, CtlError> {
        let invocation = prepare(cmd, false)?;
        if self.dry_run {
            let mut argv = vec![self.tool.program().to_owned()];
            argv.extend(invocation.args);
            return Ok(InvocationOutput::planned(argv));
        }
        let result = self.runner.run(self.tool, &invocation.args)?.check()?;
        tracing::info!(command = %result.command_line(), "done");
        Ok(result.into())
    }
}

/// Run a state-changing command and print its outcome.
fn apply<C: ToolCommand + ?Sized>(
    cmd: &C,
    session: &Session<'_>,
    ctx: &OutputCtx,
) -> Result<(), CtlError> {
    let out = session.change(cmd)?;
    write_invocation(&out, ctx);
    Ok(())
}

/// Dispatch a parsed `Command` to its handler.
///
/// # Errors
///
/// Returns `CtlError` on any command failure.
pub fn dispatch(command: &Command, session: &Session<'_>, ctx: &OutputCtx) -> Result<(), CtlError> {
    match command {
        Command::Vms => list::run_vms(session, ctx),
        Command::Show(args) => list::run_show(args, session, ctx),
        Command::Networks(args) => list::run_networks(args, session, ctx),
        Command::Disks(args) => list::run_disks(args, session, ctx),
        Command::Groups(args) => list::run_groups(args, session, ctx),
        Command::Properties => list::run_properties(session, ctx),
        Command::Vm(cmd) => vm::run(cmd, session, ctx),
        Command::Controller(cmd) => storage::run_controller(cmd, session, ctx),
        Command::Disk(cmd) => storage::run_disk(cmd, session, ctx),
        Command::Natnet(cmd) => network::run_natnet(cmd, session, ctx),
        Command::Hostonly(cmd) => network::run_hostonly(cmd, session, ctx),
        Command::Nic(cmd) => network::run_nic(cmd, session, ctx),
    }
}
