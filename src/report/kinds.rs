/// Typed records, one per report kind.
///
/// Each type lifts the fields callers rely on into named attributes and keeps
/// everything else the tool printed in `fields`, so no data is lost.
use std::collections::BTreeMap;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use super::block::{DISK_SPEC, NETWORK_SPEC, parse_blocks, parse_single};
use super::detail::parse_detail;
use super::inventory::{parse_groups, parse_inventory};
use super::lines::parse_flag;
use super::record::{FieldValue, Record, VmRef};

/// An entry of `list vms`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VmEntry {
    pub name: String,
    pub uuid: String,
}

impl VmEntry {
    /// Parse `list vms` output, ordered by name.
    #[must_use]
    pub fn parse_all<I, S>(lines: I) -> BTreeMap<String, Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        parse_inventory(lines)
            .into_iter()
            .map(|(name, uuid)| (name.clone(), Self { name, uuid }))
            .collect()
    }
}

/// `showvminfo --machinereadable` for one machine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VmInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    /// `VMState`, e.g. `running`, `poweroff`, `saved`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ostype: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_mb: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpus: Option<u32>,
    /// Every other `key=value` pair, original key case.
    pub fields: BTreeMap<String, String>,
}

impl VmInfo {
    #[must_use]
    pub fn parse<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::from_fields(parse_detail(lines))
    }

    #[must_use]
    pub fn from_fields(mut fields: BTreeMap<String, String>) -> Self {
        Self {
            name: fields.remove("name"),
            uuid: fields.remove("UUID"),
            state: fields.remove("VMState"),
            ostype: fields.remove("ostype"),
            memory_mb: fields.remove("memory").and_then(|m| m.parse().ok()),
            cpus: fields.remove("cpus").and_then(|c| c.parse().ok()),
            fields,
        }
    }

    #[must_use]
    pub fn is_powered_off(&self) -> bool {
        self.state.as_deref() == Some("poweroff")
    }
}

/// Network flavours VirtualBox can list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkKind {
    /// Internal networks.
    Intnets,
    /// Host interfaces usable for bridging.
    Bridgedifs,
    /// Host-only interfaces.
    Hostonlyifs,
    /// NAT networks.
    Natnets,
}

impl NetworkKind {
    pub const ALL: [Self; 4] = [Self::Intnets, Self::Bridgedifs, Self::Hostonlyifs, Self::Natnets];

    /// Argument passed to `VBoxManage list`.
    #[must_use]
    pub fn as_arg(self) -> &'static str {
        match self {
            Self::Intnets => "intnets",
            Self::Bridgedifs => "bridgedifs",
            Self::Hostonlyifs => "hostonlyifs",
            Self::Natnets => "natnets",
        }
    }
}

/// One network from `list <kind>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkInfo {
    pub kind: NetworkKind,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    /// Network address, CIDR notation for NAT networks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dhcp: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ipv6: Option<bool>,
    pub fields: Record,
}

impl NetworkInfo {
    #[must_use]
    pub fn parse_all<I, S>(kind: NetworkKind, lines: I) -> BTreeMap<String, Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        parse_blocks(lines, &NETWORK_SPEC)
            .into_iter()
            .map(|(name, record)| (name.clone(), Self::from_record(kind, name, record)))
            .collect()
    }

    fn from_record(kind: NetworkKind, name: String, mut record: Record) -> Self {
        record.take(NETWORK_SPEC.primary_key);
        let flag = |r: &mut Record, keys: &[&str]| r.take_text(keys).as_deref().and_then(parse_flag);
        Self {
            kind,
            name,
            enabled: flag(&mut record, &["enabled"]),
            network: record.take_text(&["network", "ipaddress"]),
            dhcp: flag(&mut record, &["dhcpenabled", "dhcpserver", "dhcp"]),
            ipv6: flag(&mut record, &["ipv6enabled", "ipv6"]),
            fields: record,
        }
    }
}

/// One medium from `list hdds --long`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiskInfo {
    pub uuid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capacity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    /// Machines the medium is attached to, when the annotation parsed.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub in_use_by: Vec<VmRef>,
    pub fields: Record,
}

impl DiskInfo {
    #[must_use]
    pub fn parse_all<I, S>(lines: I) -> BTreeMap<String, Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        parse_blocks(lines, &DISK_SPEC)
            .into_iter()
            .map(|(uuid, record)| (uuid.clone(), Self::from_record(uuid, record)))
            .collect()
    }

    fn from_record(uuid: String, mut record: Record) -> Self {
        record.take(DISK_SPEC.primary_key);
        let in_use_by = match record.take("inusebyvms") {
            Some(FieldValue::Vms(owners)) => owners,
            Some(other) => {
                record.insert("inusebyvms".to_owned(), other);
                Vec::new()
            }
            None => Vec::new(),
        };
        Self {
            uuid,
            location: record.take_text(&["location"]),
            format: record.take_text(&["storageformat", "format"]),
            capacity: record.take_text(&["capacity"]),
            state: record.take_text(&["state"]),
            in_use_by,
            fields: record,
        }
    }

    /// Names of the machines using this medium.
    pub fn vm_names(&self) -> impl Iterator<Item = &str> {
        self.in_use_by.iter().map(|vm| vm.name.as_str())
    }

    #[must_use]
    pub fn is_used_by(&self, vm: &str) -> bool {
        self.vm_names().any(|name| name == vm)
    }
}

/// One group from `list groups`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupInfo {
    pub name: String,
    pub path: String,
}

impl GroupInfo {
    #[must_use]
    pub fn parse_all<I, S>(lines: I) -> BTreeMap<String, Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        parse_groups(lines)
            .into_iter()
            .map(|(name, path)| (name.clone(), Self { name, path }))
            .collect()
    }
}

/// `list systemproperties --long`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_machine_folder: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
    pub fields: Record,
}

impl SystemProperties {
    #[must_use]
    pub fn parse<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut record = parse_single(lines);
        Self {
            default_machine_folder: record.take_text(&["defaultmachinefolder"]),
            api_version: record.take_text(&["apiversion"]),
            fields: record,
        }
    }
}
