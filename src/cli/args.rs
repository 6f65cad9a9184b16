/// CLI argument definitions via clap derive.
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::exec::Tool;
use crate::report::{NetworkKind, select::ALL};
use crate::schema::network::{
    CreateNatNetwork, HostOnlyIpConfig, ModifyNatNetwork, ModifyNic, NatNetworkName,
    RemoveHostOnly,
};
use crate::schema::storage::{AttachDisk, CloseDisk, CreateController, CreateDisk};
use crate::schema::vm::{CreateVm, DeleteVm, ModifyVm, PowerOffVm, RegisterVm, StartVm};

/// vbcc — drive VirtualBox through `VBoxManage` with validated input and typed output.
#[derive(Debug, Parser)]
#[command(
    name = "vbcc",
    about = "Validated VBoxManage commands and parsed VirtualBox reports",
    version,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Output format. Auto-detects: table when TTY, json when piped.
    #[arg(long, global = true, value_name = "FORMAT", default_value = "auto")]
    pub output: OutputFormat,

    /// Shorthand for --output json.
    #[arg(long, global = true, conflicts_with = "output")]
    pub json: bool,

    /// Comma-separated field names to include in table output (projection).
    #[arg(long, global = true, value_name = "FIELDS")]
    pub fields: Option<String>,

    /// Omit table headers (useful for awk/cut processing).
    #[arg(long, global = true)]
    pub no_header: bool,

    /// Log tool invocations and timings to stderr.
    #[arg(long, global = true)]
    pub debug: bool,

    /// Settings file (TOML, or JSON with a .json extension).
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// VirtualBox executable to drive.
    #[arg(long, global = true, value_enum)]
    pub tool: Option<Tool>,

    /// Kill the tool if it runs longer than this.
    #[arg(long, global = true, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Print the command that would run instead of running it.
    #[arg(long, global = true)]
    pub dry_run: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Auto-detect: table when stdout is a TTY, json when piped.
    #[default]
    Auto,
    /// JSON array or object (pretty-printed).
    Json,
    /// Compact single-line JSON.
    Compact,
    /// Newline-delimited JSON (one object per line).
    Ndjson,
    /// Aligned table with headers (human-readable).
    Table,
    /// Name (or UUID) only, one per line.
    Id,
}

/// All subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// List registered machines.
    Vms,
    /// Show the detail report of one machine.
    Show(ShowArgs),
    /// List networks (internal, bridged, host-only, NAT).
    Networks(NetworksArgs),
    /// List hard disk media.
    Disks(DisksArgs),
    /// List machine groups.
    Groups(GroupsArgs),
    /// Show VirtualBox system properties.
    Properties,
    /// Create, change, start and stop machines.
    #[command(subcommand)]
    Vm(VmCommand),
    /// Manage storage controllers.
    #[command(subcommand)]
    Controller(ControllerCommand),
    /// Create, attach and close disk images.
    #[command(subcommand)]
    Disk(DiskCommand),
    /// Manage NAT networks.
    #[command(subcommand)]
    Natnet(NatNetCommand),
    /// Manage host-only interfaces.
    #[command(subcommand)]
    Hostonly(HostOnlyCommand),
    /// Configure machine network adapters.
    #[command(subcommand)]
    Nic(NicCommand),
}

/// Arguments for `vbcc show`.
#[derive(Debug, Parser)]
pub struct ShowArgs {
    /// Machine name or UUID.
    pub vm: String,
}

/// Arguments for `vbcc networks`.
#[derive(Debug, Parser)]
pub struct NetworksArgs {
    /// Only list this kind of network (default: all four).
    #[arg(long, value_enum)]
    pub kind: Option<NetworkKind>,

    /// Network name, or `all`.
    #[arg(long, value_name = "NAME", default_value = ALL)]
    pub name: String,
}

/// Arguments for `vbcc disks`.
#[derive(Debug, Parser)]
pub struct DisksArgs {
    /// Only disks attached to this machine, or `all`.
    #[arg(long, value_name = "NAME", default_value = ALL)]
    pub vm: String,
}

/// Arguments for `vbcc groups`.
#[derive(Debug, Parser)]
pub struct GroupsArgs {
    /// Group name, or `all`.
    #[arg(long, value_name = "NAME", default_value = ALL)]
    pub group: String,
}

#[derive(Debug, Subcommand)]
pub enum VmCommand {
    /// Create a machine.
    Create(CreateVm),
    /// Register an existing machine settings file.
    Register(RegisterVm),
    /// Unregister a machine and delete its files.
    Delete(DeleteVm),
    /// Change machine settings.
    Modify(Box<ModifyVm>),
    /// Start a machine.
    Start(StartVm),
    /// Power a machine off.
    Stop(StopArgs),
}

/// Arguments for `vbcc vm stop`.
#[derive(Debug, Args)]
pub struct StopArgs {
    #[command(flatten)]
    pub vm: PowerOffVm,

    /// Wait up to SECS for the machine to reach `poweroff`.
    #[arg(long, value_name = "SECS")]
    pub wait: Option<u64>,
}

#[derive(Debug, Subcommand)]
pub enum ControllerCommand {
    /// Add a storage controller to a machine.
    Add(CreateController),
}

#[derive(Debug, Subcommand)]
pub enum DiskCommand {
    /// Create a disk image.
    Create(CreateDisk),
    /// Attach a medium to a machine.
    Attach(AttachDisk),
    /// Remove a disk from the media registry.
    Close(CloseDisk),
}

#[derive(Debug, Subcommand)]
pub enum NatNetCommand {
    /// Create a NAT network.
    Add(CreateNatNetwork),
    /// Change a NAT network.
    Modify(ModifyNatNetwork),
    /// Delete a NAT network.
    Remove(NatNetworkName),
    /// Start a NAT network's services.
    Start(NatNetworkName),
    /// Stop a NAT network's services.
    Stop(NatNetworkName),
}

#[derive(Debug, Subcommand)]
pub enum HostOnlyCommand {
    /// Create a host-only interface.
    Create,
    /// Remove a host-only interface.
    Remove(RemoveHostOnly),
    /// Set the IPv4 address of a host-only interface.
    Ipconfig(HostOnlyIpConfig),
}

#[derive(Debug, Subcommand)]
pub enum NicCommand {
    /// Change one network adapter of a machine.
    Modify(Box<ModifyNic>),
}
