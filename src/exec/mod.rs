/// Process boundary: running the VirtualBox executables.
pub mod errors;
pub mod runner;

#[cfg(test)]
pub mod fake;

pub use errors::ExecError;
pub use runner::{CommandResult, ProcessRunner, Runner, Tool};
