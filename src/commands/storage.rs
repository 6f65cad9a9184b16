/// `controller` and `disk` commands.
use crate::cli::OutputCtx;
use crate::cli::args::{ControllerCommand, DiskCommand};
use crate::errors::CtlError;

use super::{Session, apply};

/// Run a `vbcc controller` subcommand.
///
/// # Errors
///
/// Returns `CtlError` on invalid input or a tool failure.
pub fn run_controller(
    cmd: &ControllerCommand,
    session: &Session<'_>,
    ctx: &OutputCtx,
) -> Result<(), CtlError> {
    match cmd {
        ControllerCommand::Add(c) => apply(c, session, ctx),
    }
}

/// Run a `vbcc disk` subcommand.
///
/// # Errors
///
/// Returns `CtlError` on invalid input or a tool failure.
pub fn run_disk(cmd: &DiskCommand, session: &Session<'_>, ctx: &OutputCtx) -> Result<(), CtlError> {
    match cmd {
        DiskCommand::Create(c) => apply(c, session, ctx),
        DiskCommand::Attach(c) => apply(c, session, ctx),
        DiskCommand::Close(c) => apply(c, session, ctx),
    }
}
