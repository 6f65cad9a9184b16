/// NAT networks, host-only interfaces and per-machine network adapters.
use std::net::Ipv4Addr;

use clap::{Args, ValueEnum};
use serde::Serialize;

use super::{ArgList, OnOff, ToolCommand, field_map, patterns};
use crate::validate::{FieldMap, RuleSpec};

const NET_NAME: &str = "network.name";
const NET_PREFIX: &str = "network.prefix";
const HOSTONLY_NAME: &str = "hostonly.name";
const NIC_VM: &str = "nic.vm";
const NIC_INDEX: &str = "nic.index";
const NIC_MAC: &str = "nic.mac";
const NIC_TRACE_FILE: &str = "nic.trace_file";
const NIC_SPEED: &str = "nic.speed";
const NIC_BOOT_PRIORITY: &str = "nic.boot_priority";
const NIC_BANDWIDTH_GROUP: &str = "nic.bandwidth_group";
const NIC_GENERIC_DRIVER: &str = "nic.generic_driver";
const NIC_NETWORK: &str = "nic.network";

const PREFIX_LEN: &str = r"^([0-9]|[12][0-9]|3[0-2])$";

fn cidr(addr: Ipv4Addr, prefix: u8) -> String {
    format!("{addr}/{prefix}")
}

// ── natnetwork ──────────────────────────────────────────────────────

/// Create a NAT network.
#[derive(Debug, Clone, Args)]
pub struct CreateNatNetwork {
    /// Network name
    #[arg(long)]
    pub name: String,
    /// Network address, e.g. 10.0.2.0
    #[arg(long)]
    pub network: Ipv4Addr,
    /// Prefix length of the network
    #[arg(long, default_value_t = 24)]
    pub prefix: u8,
    /// Create the network disabled
    #[arg(long)]
    pub disabled: bool,
    #[arg(long, value_enum, default_value_t = OnOff::On)]
    pub dhcp: OnOff,
    #[arg(long, value_enum, default_value_t = OnOff::Off)]
    pub ipv6: OnOff,
}

impl ToolCommand for CreateNatNetwork {
    fn rules(&self) -> &'static [RuleSpec] {
        const RULES: &[RuleSpec] = &[
            RuleSpec::any(NET_NAME, &[patterns::TOKEN]).mandatory(),
            RuleSpec::any(NET_PREFIX, &[PREFIX_LEN]).mandatory(),
        ];
        RULES
    }

    fn fields(&self) -> FieldMap {
        field_map([
            (NET_NAME, Some(self.name.clone())),
            (NET_PREFIX, Some(self.prefix.to_string())),
        ])
    }

    fn args(&self) -> Vec<String> {
        ArgList::new(["natnetwork", "add"])
            .flag("--netname", &self.name)
            .flag("--network", cidr(self.network, self.prefix))
            .push(if self.disabled { "--disable" } else { "--enable" })
            .flag("--dhcp", self.dhcp)
            .flag("--ipv6", self.ipv6)
            .finish()
    }
}

/// Change an existing NAT network. Only the options given are passed on.
#[derive(Debug, Clone, Args)]
pub struct ModifyNatNetwork {
    /// Network name
    #[arg(long)]
    pub name: String,
    /// New network address
    #[arg(long)]
    pub network: Option<Ipv4Addr>,
    /// Prefix length used with `--network`
    #[arg(long, default_value_t = 24)]
    pub prefix: u8,
    #[arg(long, value_enum)]
    pub enabled: Option<OnOff>,
    #[arg(long, value_enum)]
    pub dhcp: Option<OnOff>,
    #[arg(long, value_enum)]
    pub ipv6: Option<OnOff>,
}

impl ToolCommand for ModifyNatNetwork {
    fn rules(&self) -> &'static [RuleSpec] {
        const RULES: &[RuleSpec] = &[
            RuleSpec::any(NET_NAME, &[patterns::TOKEN]).mandatory(),
            RuleSpec::any(NET_PREFIX, &[PREFIX_LEN]),
        ];
        RULES
    }

    fn fields(&self) -> FieldMap {
        field_map([
            (NET_NAME, Some(self.name.clone())),
            (NET_PREFIX, self.network.map(|_| self.prefix.to_string())),
        ])
    }

    fn args(&self) -> Vec<String> {
        let mut args = ArgList::new(["natnetwork", "modify"]);
        args.flag("--netname", &self.name);
        if let Some(addr) = self.network {
            args.flag("--network", cidr(addr, self.prefix));
        }
        match self.enabled {
            Some(OnOff::On) => {
                args.push("--enable");
            }
            Some(OnOff::Off) => {
                args.push("--disable");
            }
            None => {}
        }
        args.opt("--dhcp", self.dhcp.as_ref())
            .opt("--ipv6", self.ipv6.as_ref())
            .finish()
    }
}

/// Operations on a NAT network that need only its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NatNetworkAction {
    Remove,
    Start,
    Stop,
}

/// `natnetwork remove|start|stop --netname NAME`.
#[derive(Debug, Clone, Args)]
pub struct NatNetworkName {
    /// Network name
    #[arg(long)]
    pub name: String,
}

impl NatNetworkName {
    #[must_use]
    pub fn with(&self, action: NatNetworkAction) -> NatNetworkCommand<'_> {
        NatNetworkCommand { action, name: self }
    }
}

/// A [`NatNetworkName`] bound to the action to perform on it.
#[derive(Debug, Clone, Copy)]
pub struct NatNetworkCommand<'a> {
    action: NatNetworkAction,
    name: &'a NatNetworkName,
}

impl ToolCommand for NatNetworkCommand<'_> {
    fn rules(&self) -> &'static [RuleSpec] {
        const RULES: &[RuleSpec] = &[RuleSpec::any(NET_NAME, &[patterns::TOKEN]).mandatory()];
        RULES
    }

    fn fields(&self) -> FieldMap {
        field_map([(NET_NAME, Some(self.name.name.clone()))])
    }

    fn args(&self) -> Vec<String> {
        let verb = match self.action {
            NatNetworkAction::Remove => "remove",
            NatNetworkAction::Start => "start",
            NatNetworkAction::Stop => "stop",
        };
        ArgList::new(["natnetwork", verb])
            .flag("--netname", &self.name.name)
            .finish()
    }
}

// ── hostonlyif ──────────────────────────────────────────────────────

/// Create a host-only interface. The tool picks the name.
#[derive(Debug, Clone, Copy, Default)]
pub struct CreateHostOnly;

impl ToolCommand for CreateHostOnly {
    fn args(&self) -> Vec<String> {
        ArgList::new(["hostonlyif", "create"]).finish()
    }
}

#[derive(Debug, Clone, Args)]
pub struct RemoveHostOnly {
    /// Interface name, e.g. vboxnet0
    pub name: String,
}

impl ToolCommand for RemoveHostOnly {
    fn rules(&self) -> &'static [RuleSpec] {
        const RULES: &[RuleSpec] = &[RuleSpec::any(HOSTONLY_NAME, &[patterns::TOKEN]).mandatory()];
        RULES
    }

    fn fields(&self) -> FieldMap {
        field_map([(HOSTONLY_NAME, Some(self.name.clone()))])
    }

    fn args(&self) -> Vec<String> {
        ArgList::new(["hostonlyif", "remove"])
            .push(self.name.as_str())
            .finish()
    }
}

/// Assign a static IPv4 address to a host-only interface.
#[derive(Debug, Clone, Args)]
pub struct HostOnlyIpConfig {
    /// Interface name, e.g. vboxnet0
    pub name: String,
    #[arg(long)]
    pub ip: Ipv4Addr,
    #[arg(long, default_value = "255.255.255.0")]
    pub netmask: Ipv4Addr,
}

impl ToolCommand for HostOnlyIpConfig {
    fn rules(&self) -> &'static [RuleSpec] {
        const RULES: &[RuleSpec] = &[RuleSpec::any(HOSTONLY_NAME, &[patterns::TOKEN]).mandatory()];
        RULES
    }

    fn fields(&self) -> FieldMap {
        field_map([(HOSTONLY_NAME, Some(self.name.clone()))])
    }

    fn args(&self) -> Vec<String> {
        ArgList::new(["hostonlyif", "ipconfig"])
            .push(self.name.as_str())
            .flag("--ip", self.ip)
            .flag("--netmask", self.netmask)
            .finish()
    }
}

// ── modifyvm --nicN ─────────────────────────────────────────────────

/// What a network adapter is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NicAttachment {
    None,
    Null,
    Nat,
    Natnetwork,
    Bridged,
    Intnet,
    Hostonly,
    Generic,
}

impl NicAttachment {
    /// Option naming the network for attachments that take one.
    fn network_flag(self) -> Option<&'static str> {
        match self {
            Self::Natnetwork => Some("--nat-network"),
            Self::Bridged => Some("--bridgeadapter"),
            Self::Intnet => Some("--intnet"),
            Self::Hostonly => Some("--hostonlyadapter"),
            Self::Generic | Self::None | Self::Null | Self::Nat => None,
        }
    }
}

/// Emulated network card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
pub enum NicType {
    #[value(name = "Am79C970A")]
    Am79C970A,
    #[value(name = "Am79C973")]
    Am79C973,
    #[value(name = "Am79C960")]
    Am79C960,
    #[value(name = "82540EM")]
    I82540Em,
    #[value(name = "82543GC")]
    I82543Gc,
    #[value(name = "82545EM")]
    I82545Em,
    #[value(name = "virtio")]
    Virtio,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Promiscuous {
    Deny,
    AllowVms,
    AllowAll,
}

display_as_value!(NicAttachment, NicType, Promiscuous);

/// Reconfigure network adapter `--nic` (1-8) of a machine.
#[derive(Debug, Clone, Default, Args)]
pub struct ModifyNic {
    /// Machine name or UUID
    #[arg(long)]
    pub vm: String,
    /// Adapter slot, 1-8
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(1..=8))]
    pub nic: u8,
    #[arg(long, value_enum)]
    pub attach: Option<NicAttachment>,
    /// Network, bridge or host-only interface for attachments that need one
    #[arg(long)]
    pub network: Option<String>,
    /// 12 hex digits or `auto`
    #[arg(long)]
    pub mac: Option<String>,
    #[arg(long, value_enum)]
    pub cable_connected: Option<OnOff>,
    #[arg(long = "type", value_enum, ignore_case = true)]
    pub nic_type: Option<NicType>,
    #[arg(long, value_enum)]
    pub trace: Option<OnOff>,
    #[arg(long)]
    pub trace_file: Option<String>,
    /// Reported link speed in kbps
    #[arg(long)]
    pub speed: Option<u32>,
    /// PXE boot priority, 0 (default) to 4
    #[arg(long)]
    pub boot_priority: Option<u8>,
    #[arg(long, value_enum)]
    pub promisc: Option<Promiscuous>,
    #[arg(long)]
    pub bandwidth_group: Option<String>,
    #[arg(long)]
    pub generic_driver: Option<String>,
}

impl ToolCommand for ModifyNic {
    fn rules(&self) -> &'static [RuleSpec] {
        const RULES: &[RuleSpec] = &[
            RuleSpec::any(NIC_VM, &[patterns::NAME]).mandatory(),
            RuleSpec::any(NIC_INDEX, &["^[1-8]$"]).mandatory(),
            RuleSpec::any(NIC_NETWORK, &[patterns::TOKEN]),
            RuleSpec::any(NIC_MAC, &["^[0-9A-Fa-f]{12}$", "^auto$"]),
            RuleSpec::any(NIC_TRACE_FILE, &[patterns::PATH]),
            RuleSpec::any(NIC_SPEED, &[patterns::NUMBER]),
            RuleSpec::any(NIC_BOOT_PRIORITY, &["^[0-4]$"]),
            RuleSpec::any(NIC_BANDWIDTH_GROUP, &[patterns::TOKEN, "^none$"]),
            RuleSpec::any(NIC_GENERIC_DRIVER, &[patterns::TOKEN]),
        ];
        RULES
    }

    fn fields(&self) -> FieldMap {
        field_map([
            (NIC_VM, Some(self.vm.clone())),
            (NIC_INDEX, Some(self.nic.to_string())),
            (NIC_NETWORK, self.network.clone()),
            (NIC_MAC, self.mac.clone()),
            (NIC_TRACE_FILE, self.trace_file.clone()),
            (NIC_SPEED, self.speed.map(|n| n.to_string())),
            (NIC_BOOT_PRIORITY, self.boot_priority.map(|n| n.to_string())),
            (NIC_BANDWIDTH_GROUP, self.bandwidth_group.clone()),
            (NIC_GENERIC_DRIVER, self.generic_driver.clone()),
        ])
    }

    fn args(&self) -> Vec<String> {
        let n = self.nic;
        let mut args = ArgList::new(["modifyvm"]);
        args.push(self.vm.as_str())
            .opt(&format!("--nic{n}"), self.attach.as_ref());
        if let (Some(flag), Some(net)) = (self.attach.and_then(NicAttachment::network_flag), &self.network) {
            args.flag(&format!("{flag}{n}"), net);
        }
        args.opt(&format!("--macaddress{n}"), self.mac.as_ref())
            .opt(&format!("--cableconnected{n}"), self.cable_connected.as_ref())
            .opt(&format!("--nictype{n}"), self.nic_type.as_ref())
            .opt(&format!("--nictrace{n}"), self.trace.as_ref())
            .opt(&format!("--nictracefile{n}"), self.trace_file.as_ref())
            .opt(&format!("--nicspeed{n}"), self.speed.as_ref())
            .opt(&format!("--nicbootprio{n}"), self.boot_priority.as_ref())
            .opt(&format!("--nicpromisc{n}"), self.promisc.as_ref())
            .opt(&format!("--nicbandwidthgroup{n}"), self.bandwidth_group.as_ref())
            .opt(&format!("--nicgenericdrv{n}"), self.generic_driver.as_ref())
            .finish()
    }
}
