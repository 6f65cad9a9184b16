/// `natnet`, `hostonly` and `nic` commands.
use crate::cli::OutputCtx;
use crate::cli::args::{HostOnlyCommand, NatNetCommand, NicCommand};
use crate::errors::CtlError;
use crate::schema::network::{CreateHostOnly, NatNetworkAction};

use super::{Session, apply};

/// Run a `vbcc natnet` subcommand.
///
/// # Errors
///
/// Returns `CtlError` on invalid input or a tool failure.
pub fn run_natnet(cmd: &NatNetCommand, session: &Session<'_>, ctx: &OutputCtx) -> Result<(), CtlError> {
    match cmd {
        NatNetCommand::Add(c) => apply(c, session, ctx),
        NatNetCommand::Modify(c) => apply(c, session, ctx),
        NatNetCommand::Remove(n) => apply(&n.with(NatNetworkAction::Remove), session, ctx),
        NatNetCommand::Start(n) => apply(&n.with(NatNetworkAction::Start), session, ctx),
        NatNetCommand::Stop(n) => apply(&n.with(NatNetworkAction::Stop), session, ctx),
    }
}

/// Run a `vbcc hostonly` subcommand.
///
/// # Errors
///
/// Returns `CtlError` on invalid input or a tool failure.
pub fn run_hostonly(
    cmd: &HostOnlyCommand,
    session: &Session<'_>,
    ctx: &OutputCtx,
) -> Result<(), CtlError> {
    match cmd {
        HostOnlyCommand::Create => apply(&CreateHostOnly, session, ctx),
        HostOnlyCommand::Remove(c) => apply(c, session, ctx),
        HostOnlyCommand::Ipconfig(c) => apply(c, session, ctx),
    }
}

/// Run a `vbcc nic` subcommand.
///
/// # Errors
///
/// Returns `CtlError` on invalid input or a tool failure.
pub fn run_nic(cmd: &NicCommand, session: &Session<'_>, ctx: &OutputCtx) -> Result<(), CtlError> {
    match cmd {
        NicCommand::Modify(c) => apply(c.as_ref(), session, ctx),
    }
}
