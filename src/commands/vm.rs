/// `vm` commands: create, register, delete, modify, start, stop.
use std::thread;
use std::time::{Duration, Instant};

use crate::cli::OutputCtx;
use crate::cli::args::{StopArgs, VmCommand};
use crate::cli::output::write_invocation;
use crate::errors::CtlError;
use crate::schema::vm::RegisterVm;

use super::list::fetch_vm_info;
use super::{Session, apply};

/// Pause between `showvminfo` polls while waiting for power-off.
const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Run a `vbcc vm` subcommand.
///
/// # Errors
///
/// Returns `CtlError` on invalid input, a tool failure or a wait timeout.
pub fn run(cmd: &VmCommand, session: &Session<'_>, ctx: &OutputCtx) -> Result<(), CtlError> {
    match cmd {
        VmCommand::Create(c) => apply(c, session, ctx),
        VmCommand::Register(c) => {
            check_settings_file(c)?;
            apply(c, session, ctx)
        }
        VmCommand::Delete(c) => apply(c, session, ctx),
        VmCommand::Modify(c) => apply(c.as_ref(), session, ctx),
        VmCommand::Start(c) => apply(c, session, ctx),
        VmCommand::Stop(args) => stop(args, session, ctx),
    }
}

fn check_settings_file(cmd: &RegisterVm) -> Result<(), CtlError> {
    if cmd.file.is_file() {
        Ok(())
    } else {
        Err(CtlError::InvalidInput(format!(
            "Machine settings file {} does not exist",
            cmd.file.display()
        )))
    }
}

fn stop(args: &StopArgs, session: &Session<'_>, ctx: &OutputCtx) -> Result<(), CtlError> {
    let out = session.change(&args.vm)?;
    write_invocation(&out, ctx);
    match args.wait {
        Some(secs) if !out.dry_run => {
            let _t = ctx.timer("wait_for_poweroff");
            wait_for_poweroff(session, &args.vm.name, Duration::from_secs(secs), POLL_INTERVAL)
        }
        _ => Ok(()),
    }
}

/// Poll the machine's detail report until `VMState` is `poweroff`.
///
/// # Errors
///
/// Returns `CtlError::WaitTimeout` if `timeout` passes first, or any error
/// from fetching the report.
pub fn wait_for_poweroff(
    session: &Session<'_>,
    name: &str,
    timeout: Duration,
    interval: Duration,
) -> Result<(), CtlError> {
    let start = Instant::now();
    loop {
        let info = fetch_vm_info(session, name)?;
        if info.is_powered_off() {
            tracing::debug!(vm = name, elapsed = ?start.elapsed(), "machine powered off");
            return Ok(());
        }
        if start.elapsed() >= timeout {
            return Err(CtlError::WaitTimeout {
                vm: name.to_owned(),
                secs: timeout.as_secs(),
                state: info.state.unwrap_or_else(|| "unknown".to_owned()),
            });
        }
        tracing::trace!(vm = name, state = ?info.state, "waiting for poweroff");
        thread::sleep(interval);
    }
}
