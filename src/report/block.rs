/// Record-block parser for colon-delimited reports.
///
/// Reports such as `list hdds --long` or `list natnets` print one entity per
/// block of `Key: value` lines. Blocks are separated either by a blank line or
/// simply by the primary key reappearing. Both conventions are detected:
///
/// 1. A key matching the kind's primary key while a record is in progress
///    flushes that record.
/// 2. A blank line flushes a non-empty record.
/// 3. End of input flushes whatever is left.
///
/// A flushed record without its primary key value is dropped.
///
/// Everything that differs between report kinds lives in [`KindSpec`], so a
/// new report (or an explicit end-of-record marker) only touches one table.
use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use super::lines::{normalize_key, split_pair, strip_quotes};
use super::record::{FieldValue, Record, VmRef};

/// One owner in a disk's `In use by VMs` value: `web 01 (UUID: 1b6e-...)`.
///
/// Owners are comma separated. Snapshot annotations (`[snap (UUID: ...)]`)
/// follow an owner without a comma and are not matched.
static IN_USE_BY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|,)\s*([^,(\[]+?)\s*\(UUID:\s*([^)\s]+)\s*\)")
        .expect("in-use-by pattern is valid")
});

/// Per-report parsing rules.
#[derive(Debug, Clone, Copy)]
pub struct KindSpec {
    /// Field holding the record's identity; its value keys the result map.
    /// Any key starting with it marks a record boundary.
    pub primary_key: &'static str,
    /// Report-specific key renames, applied after normalization.
    pub renames: &'static [(&'static str, &'static str)],
    /// Value restructuring hook: `(normalized key, trimmed value) -> replacement value`.
    pub restructure: Option<fn(&str, &str) -> Option<FieldValue>>,
}

impl KindSpec {
    fn is_primary(&self, key: &str) -> bool {
        key.starts_with(self.primary_key)
    }

    fn rename(&self, key: String) -> String {
        self.renames
            .iter()
            .find(|(from, _)| *from == key)
            .map_or(key, |(_, to)| (*to).to_owned())
    }
}

/// `list intnets|bridgedifs|hostonlyifs|natnets`.
///
/// NAT networks label their name `NetworkName` on older releases.
pub const NETWORK_SPEC: KindSpec = KindSpec {
    primary_key: "name",
    renames: &[("networkname", "name")],
    restructure: None,
};

/// `list hdds --long`.
pub const DISK_SPEC: KindSpec = KindSpec {
    primary_key: "uuid",
    renames: &[],
    restructure: Some(restructure_disk),
};

fn restructure_disk(key: &str, value: &str) -> Option<FieldValue> {
    if key != "inusebyvms" {
        return None;
    }
    let owners: Vec<VmRef> = IN_USE_BY_RE
        .captures_iter(value)
        .map(|caps| VmRef {
            name: caps[1].trim().to_owned(),
            uuid: caps[2].to_owned(),
        })
        .collect();
    (!owners.is_empty()).then_some(FieldValue::Vms(owners))
}

/// Parse a block report into `primary key value -> Record`.
#[must_use]
pub fn parse_blocks<I, S>(lines: I, spec: &KindSpec) -> BTreeMap<String, Record>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out = BTreeMap::new();
    let mut current = Record::new();

    for raw in lines {
        let line = strip_quotes(raw.as_ref().trim());

        if line.is_empty() {
            flush(&mut current, spec, &mut out);
            continue;
        }

        let Some((raw_key, value)) = split_pair(&line, ':') else {
            tracing::trace!(line = %line, "skipping non-data line");
            continue;
        };

        let key = spec.rename(normalize_key(raw_key));
        let value = spec
            .restructure
            .and_then(|f| f(&key, value))
            .unwrap_or_else(|| FieldValue::Text(value.to_owned()));

        if spec.is_primary(&key) && !current.is_empty() {
            flush(&mut current, spec, &mut out);
        }
        current.insert(key, value);
    }

    flush(&mut current, spec, &mut out);
    out
}

fn flush(current: &mut Record, spec: &KindSpec, out: &mut BTreeMap<String, Record>) {
    if current.is_empty() {
        return;
    }
    let record = std::mem::take(current);
    match record.text(spec.primary_key).map(str::to_owned) {
        Some(id) => {
            out.insert(id, record);
        }
        None => {
            tracing::debug!(
                fields = record.len(),
                primary_key = spec.primary_key,
                "dropping record without primary key"
            );
        }
    }
}

/// Parse a colon-delimited report that describes exactly one entity
/// (`list systemproperties --long`). Later keys overwrite earlier ones.
#[must_use]
pub fn parse_single<I, S>(lines: I) -> Record
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut record = Record::new();
    for raw in lines {
        let line = strip_quotes(raw.as_ref().trim());
        if let Some((key, value)) = split_pair(&line, ':') {
            record.insert(normalize_key(key), FieldValue::Text(value.to_owned()));
        }
    }
    record
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_line_separated_blocks() {
        let lines = ["uuid: A", "name: disk1", "", "uuid: B", "name: disk2"];
        let out = parse_blocks(lines, &DISK_SPEC);
        assert_eq!(out.len(), 2);
        assert_eq!(out["A"].text("name"), Some("disk1"));
        assert_eq!(out["B"].text("name"), Some("disk2"));
    }

    #[test]
    fn test_flush_on_repeated_primary_key() {
        let lines = ["name: net1", "enabled: on", "name: net2", "enabled: off"];
        let out = parse_blocks(lines, &NETWORK_SPEC);
        assert_eq!(out.len(), 2);
        assert_eq!(out["net1"].text("enabled"), Some("on"));
        assert_eq!(out["net2"].text("enabled"), Some("off"));
    }

    #[test]
    fn test_network_name_rename() {
        let lines = [
            "NetworkName:    NatNet1",
            "IP:             10.0.2.1",
            "Network:        10.0.2.0/24",
            "IPv6 Enabled:   No",
            "",
            "NetworkName:    NatNet2",
            "Enabled:        Yes",
        ];
        let out = parse_blocks(lines, &NETWORK_SPEC);
        assert_eq!(out.len(), 2);
        assert_eq!(out["NatNet1"].text("network"), Some("10.0.2.0/24"));
        assert_eq!(out["NatNet1"].text("ipv6enabled"), Some("No"));
        assert_eq!(out["NatNet2"].text("enabled"), Some("Yes"));
    }

    #[test]
    fn test_in_use_by_is_structured() {
        let lines = [
            "UUID:           5d1c-01",
            "Parent UUID:    base",
            "State:          created",
            "Location:       /vms/g1/vm2/vm2.vmdk",
            "Storage format: VMDK",
            "In use by VMs:  vm2 (UUID: 9a7e-02)",
        ];
        let out = parse_blocks(lines, &DISK_SPEC);
        let disk = &out["5d1c-01"];
        assert_eq!(
            disk.get("inusebyvms"),
            Some(&FieldValue::Vms(vec![VmRef {
                name: "vm2".to_owned(),
                uuid: "9a7e-02".to_owned(),
            }]))
        );
        assert_eq!(disk.text("storageformat"), Some("VMDK"));
        assert_eq!(disk.text("parentuuid"), Some("base"));
    }

    #[test]
    fn test_in_use_by_keeps_spaces_in_vm_name() {
        let lines = ["UUID: a", "In use by VMs:  web 01 (UUID: 9a7e-02)"];
        let out = parse_blocks(lines, &DISK_SPEC);
        assert_eq!(
            out["a"].get("inusebyvms"),
            Some(&FieldValue::Vms(vec![VmRef {
                name: "web 01".to_owned(),
                uuid: "9a7e-02".to_owned(),
            }]))
        );
    }

    #[test]
    fn test_in_use_by_lists_every_owner() {
        let lines = [
            "UUID: shared",
            "In use by VMs: vm1 (UUID: a) [base (UUID: s1)], build box (UUID: b)",
        ];
        let out = parse_blocks(lines, &DISK_SPEC);
        let Some(FieldValue::Vms(owners)) = out["shared"].get("inusebyvms") else {
            panic!("owners not parsed");
        };
        let names: Vec<&str> = owners.iter().map(|vm| vm.name.as_str()).collect();
        assert_eq!(names, vec!["vm1", "build box"]);
        assert_eq!(owners[1].uuid, "b");
    }

    #[test]
    fn test_unparsable_in_use_by_keeps_text() {
        let lines = ["UUID: a", "In use by VMs: something odd"];
        let out = parse_blocks(lines, &DISK_SPEC);
        assert_eq!(out["a"].text("inusebyvms"), Some("something odd"));
    }

    #[test]
    fn test_record_without_primary_key_is_dropped() {
        let lines = ["Location: /orphan.vdi", "", "UUID: a", "Location: /a.vdi"];
        let out = parse_blocks(lines, &DISK_SPEC);
        assert_eq!(out.len(), 1);
        assert!(out.contains_key("a"));
    }

    #[test]
    fn test_non_data_lines_are_skipped() {
        let lines = ["Name: intnet", "garbage without separator", "Mode: x"];
        let out = parse_blocks(lines, &NETWORK_SPEC);
        assert_eq!(out["intnet"].len(), 2);
    }

    #[test]
    fn test_repeated_parse_is_identical() {
        let lines = ["uuid: A", "name: disk1", "", "uuid: B", "name: disk2"];
        assert_eq!(parse_blocks(lines, &DISK_SPEC), parse_blocks(lines, &DISK_SPEC));
    }

    #[test]
    fn test_parse_single_properties() {
        let lines = [
            "API version:                     7_0",
            "Default machine folder:          /home/u/VirtualBox VMs",
            "Maximum guest RAM size:          2097152 Megabytes",
        ];
        let r = parse_single(lines);
        assert_eq!(r.text("defaultmachinefolder"), Some("/home/u/VirtualBox VMs"));
        assert_eq!(r.text("apiversion"), Some("7_0"));
    }
}
