/// Read-only reports: machines, machine detail, networks, disks, groups, properties.
use crate::cli::OutputCtx;
use crate::cli::args::{DisksArgs, GroupsArgs, NetworksArgs, ShowArgs};
use crate::cli::output::{
    write_disks, write_groups, write_networks, write_properties, write_vm_info, write_vms,
};
use crate::errors::CtlError;
use crate::exec::ExecError;
use crate::report::select::suggest;
use crate::report::{
    DiskInfo, GroupInfo, Miss, NetworkInfo, NetworkKind, Selector, SystemProperties, VmEntry,
    VmInfo, select, select_disks,
};
use crate::schema::prepare;
use crate::schema::query::{
    ListDisks, ListGroups, ListNetworks, ListSystemProperties, ListVms, SELECT_GROUP,
    SELECT_NETWORK, SELECT_VM, Selection, ShowVmInfo,
};

use super::Session;

/// Check a selection name strictly and turn it into a [`Selector`].
fn selector(field: &'static str, value: &str) -> Result<Selector, CtlError> {
    prepare(&Selection { field, value }, true)?;
    let selector: Selector = value.parse().unwrap_or_default();
    tracing::debug!(field, selection = selector.as_str(), "selection");
    Ok(selector)
}

fn not_found(kind: &'static str, miss: Miss) -> CtlError {
    CtlError::NotFound {
        kind,
        query: miss.query,
        candidates: miss.candidates,
    }
}

/// Every registered machine, ordered by name.
///
/// # Errors
///
/// Returns `CtlError` if the tool fails.
pub fn fetch_vms(session: &Session<'_>) -> Result<Vec<VmEntry>, CtlError> {
    let out = session.query(&ListVms)?;
    Ok(VmEntry::parse_all(&out.lines).into_values().collect())
}

/// Detail report of one machine.
///
/// When the tool rejects the name, the inventory is consulted so the error
/// can suggest the machine that was probably meant.
///
/// # Errors
///
/// Returns `CtlError::NotFound` for an unknown machine, or the tool failure.
pub fn fetch_vm_info(session: &Session<'_>, name: &str) -> Result<VmInfo, CtlError> {
    match session.query(&ShowVmInfo { name }) {
        Ok(out) => Ok(VmInfo::parse(&out.lines)),
        Err(CtlError::Exec(failed @ ExecError::Failed { .. })) => {
            let inventory = session.query(&ListVms)?;
            let vms = VmEntry::parse_all(&inventory.lines);
            if vms.contains_key(name) || vms.values().any(|v| v.uuid == name) {
                return Err(failed.into());
            }
            let miss = select(vms, &Selector::Key(name.to_owned()))
                .err()
                .unwrap_or_else(|| Miss {
                    query: name.to_owned(),
                    candidates: Vec::new(),
                });
            Err(not_found("vm", miss))
        }
        Err(other) => Err(other),
    }
}

/// Networks of the given kinds, optionally narrowed to one name.
///
/// A name is looked up across every listed kind; it is not found only if no
/// kind has it.
///
/// # Errors
///
/// Returns `CtlError` on a bad name, a tool failure or an unknown network.
pub fn fetch_networks(
    session: &Session<'_>,
    kinds: &[NetworkKind],
    name: &str,
) -> Result<Vec<NetworkInfo>, CtlError> {
    let selector = selector(SELECT_NETWORK, name)?;
    let mut all = Vec::new();
    for &kind in kinds {
        let out = session.query(&ListNetworks(kind))?;
        all.extend(NetworkInfo::parse_all(kind, &out.lines).into_values());
    }

    let Selector::Key(key) = selector else {
        return Ok(all);
    };
    let (hits, rest): (Vec<_>, Vec<_>) = all.into_iter().partition(|n| n.name == key);
    if hits.is_empty() {
        let candidates = suggest(&key, rest.iter().map(|n| n.name.as_str()));
        return Err(CtlError::NotFound {
            kind: "network",
            query: key,
            candidates,
        });
    }
    Ok(hits)
}

/// Disk media, optionally only those attached to one machine.
///
/// # Errors
///
/// Returns `CtlError` on a bad name or a tool failure.
pub fn fetch_disks(session: &Session<'_>, vm: &str) -> Result<Vec<DiskInfo>, CtlError> {
    let selector = selector(SELECT_VM, vm)?;
    let out = session.query(&ListDisks)?;
    Ok(select_disks(DiskInfo::parse_all(&out.lines), &selector))
}

/// Machine groups, optionally one by name.
///
/// # Errors
///
/// Returns `CtlError` on a bad name, a tool failure or an unknown group.
pub fn fetch_groups(session: &Session<'_>, group: &str) -> Result<Vec<GroupInfo>, CtlError> {
    let selector = selector(SELECT_GROUP, group)?;
    let out = session.query(&ListGroups)?;
    select(GroupInfo::parse_all(&out.lines), &selector).map_err(|m| not_found("group", m))
}

/// # Errors
///
/// Returns `CtlError` if the tool fails.
pub fn fetch_properties(session: &Session<'_>) -> Result<SystemProperties, CtlError> {
    let out = session.query(&ListSystemProperties)?;
    Ok(SystemProperties::parse(&out.lines))
}

// --- Handlers ---

/// Run `vbcc vms`.
///
/// # Errors
///
/// Returns `CtlError` if the tool fails.
pub fn run_vms(session: &Session<'_>, ctx: &OutputCtx) -> Result<(), CtlError> {
    let _t = ctx.timer("vms");
    write_vms(&fetch_vms(session)?, ctx);
    Ok(())
}

/// Run `vbcc show`.
///
/// # Errors
///
/// Returns `CtlError` for an invalid or unknown machine.
pub fn run_show(args: &ShowArgs, session: &Session<'_>, ctx: &OutputCtx) -> Result<(), CtlError> {
    let _t = ctx.timer("show");
    write_vm_info(&fetch_vm_info(session, &args.vm)?, ctx);
    Ok(())
}

/// Run `vbcc networks`.
///
/// # Errors
///
/// Returns `CtlError` for an invalid or unknown network name.
pub fn run_networks(
    args: &NetworksArgs,
    session: &Session<'_>,
    ctx: &OutputCtx,
) -> Result<(), CtlError> {
    let _t = ctx.timer("networks");
    let kinds = args.kind.map_or(NetworkKind::ALL.to_vec(), |k| vec![k]);
    write_networks(&fetch_networks(session, &kinds, &args.name)?, ctx);
    Ok(())
}

/// Run `vbcc disks`.
///
/// # Errors
///
/// Returns `CtlError` on a bad machine name or tool failure.
pub fn run_disks(args: &DisksArgs, session: &Session<'_>, ctx: &OutputCtx) -> Result<(), CtlError> {
    let _t = ctx.timer("disks");
    write_disks(&fetch_disks(session, &args.vm)?, ctx);
    Ok(())
}

/// Run `vbcc groups`.
///
/// # Errors
///
/// Returns `CtlError` for an invalid or unknown group.
pub fn run_groups(args: &GroupsArgs, session: &Session<'_>, ctx: &OutputCtx) -> Result<(), CtlError> {
    let _t = ctx.timer("groups");
    write_groups(&fetch_groups(session, &args.group)?, ctx);
    Ok(())
}

/// Run `vbcc properties`.
///
/// # Errors
///
/// Returns `CtlError` if the tool fails.
pub fn run_properties(session: &Session<'_>, ctx: &OutputCtx) -> Result<(), CtlError> {
    let _t = ctx.timer("properties");
    write_properties(&fetch_properties(session)?, ctx);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::Tool;
    use crate::exec::fake::FakeRunner;

    const VMS: &str = "\"web 01\" {11111111-aaaa}\n\"db\" {22222222-bbbb}\n\"<inaccessible>\" {33333333-cccc}\n";

    const NATNETS: &str = "\
NetworkName:    labnet
IP:             10.0.2.1
Network:        10.0.2.0/24
IPv6 Enabled:   No
IPv6 Prefix:    fd17:625c:f037:2::/64
DHCP Enabled:   Yes
Enabled:        Yes
loopback mappings (ipv4)
        127.0.0.1=2

NetworkName:    backend
Network:        10.0.3.0/24
DHCP Enabled:   No
Enabled:        No
";

    const INTNETS: &str = "Name:        intnet0\n";

    fn session(runner: &FakeRunner) -> Session<'_> {
        Session::new(runner, Tool::VBoxManage, false)
    }

    #[test]
    fn test_fetch_vms_skips_inaccessible() {
        let runner = FakeRunner::default().reply(VMS);
        let vms = fetch_vms(&session(&runner)).unwrap();
        let names: Vec<&str> = vms.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["db", "web 01"]);
    }

    #[test]
    fn test_fetch_vm_info() {
        let runner = FakeRunner::default().reply("name=\"db\"\nVMState=\"poweroff\"\nmemory=1024\n");
        let info = fetch_vm_info(&session(&runner), "db").unwrap();
        assert!(info.is_powered_off());
        assert_eq!(info.memory_mb, Some(1024));
        assert_eq!(runner.calls()[0], vec!["showvminfo", "--machinereadable", "db"]);
    }

    #[test]
    fn test_fetch_vm_info_suggests_on_unknown_name() {
        let runner = FakeRunner::default()
            .fail(1, "VBoxManage: error: Could not find a registered machine named 'web'")
            .reply(VMS);
        let err = fetch_vm_info(&session(&runner), "web").unwrap_err();
        match err {
            CtlError::NotFound { kind, candidates, .. } => {
                assert_eq!(kind, "vm");
                assert_eq!(candidates.first().map(String::as_str), Some("web 01"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_fetch_vm_info_keeps_failure_for_known_vm() {
        let runner = FakeRunner::default()
            .fail(1, "VBoxManage: error: session is locked")
            .reply(VMS);
        let err = fetch_vm_info(&session(&runner), "db").unwrap_err();
        assert!(matches!(err, CtlError::Exec(ExecError::Failed { .. })));
    }

    #[test]
    fn test_fetch_networks_across_kinds() {
        let runner = FakeRunner::default().reply(INTNETS).reply(NATNETS);
        let nets = fetch_networks(
            &session(&runner),
            &[NetworkKind::Intnets, NetworkKind::Natnets],
            "all",
        )
        .unwrap();
        let names: Vec<&str> = nets.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["intnet0", "backend", "labnet"]);
        assert_eq!(runner.calls()[1], vec!["list", "natnets"]);
    }

    #[test]
    fn test_fetch_network_by_name() {
        let runner = FakeRunner::default().reply(NATNETS);
        let nets = fetch_networks(&session(&runner), &[NetworkKind::Natnets], "labnet").unwrap();
        assert_eq!(nets.len(), 1);
        assert_eq!(nets[0].dhcp, Some(true));
        assert_eq!(nets[0].network.as_deref(), Some("10.0.2.0/24"));
    }

    #[test]
    fn test_fetch_network_miss_suggests() {
        let runner = FakeRunner::default().reply(NATNETS);
        let err = fetch_networks(&session(&runner), &[NetworkKind::Natnets], "labnt").unwrap_err();
        match err {
            CtlError::NotFound { candidates, .. } => assert_eq!(candidates, vec!["labnet"]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_bad_selection_never_runs_tool() {
        let runner = FakeRunner::default();
        let err = fetch_networks(&session(&runner), &NetworkKind::ALL, "lab net").unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn test_fetch_disks_for_vm() {
        let hdds = "\
UUID:           d-1
Location:       /vms/web/web.vdi
In use by VMs:  web (UUID: 9a7e-02)

UUID:           d-2
Location:       /vms/spare.vdi
";
        let runner = FakeRunner::default().reply(hdds).reply(hdds);
        let s = session(&runner);

        let web = fetch_disks(&s, "web").unwrap();
        assert_eq!(web.len(), 1);
        assert_eq!(web[0].uuid, "d-1");

        assert!(fetch_disks(&s, "nobody").unwrap().is_empty());
    }

    #[test]
    fn test_fetch_disks_for_vm_with_space() {
        let hdds = "\
UUID:           d-1
Location:       /vms/web 01/web 01.vdi
In use by VMs:  web 01 (UUID: 9a7e-02)

UUID:           d-2
Location:       /vms/web/web.vdi
In use by VMs:  web (UUID: 11aa-03)
";
        let runner = FakeRunner::default().reply(hdds);
        let disks = fetch_disks(&session(&runner), "web 01").unwrap();
        assert_eq!(disks.len(), 1);
        assert_eq!(disks[0].uuid, "d-1");
        assert_eq!(disks[0].in_use_by[0].name, "web 01");
    }

    #[test]
    fn test_fetch_groups() {
        let runner = FakeRunner::default()
            .reply("\"/\"\n\"/lab\"\n")
            .reply("\"/\"\n\"/lab\"\n");
        let s = session(&runner);

        let groups = fetch_groups(&s, "all").unwrap();
        let names: Vec<&str> = groups.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["default", "lab"]);

        let err = fetch_groups(&s, "labs").unwrap_err();
        assert_eq!(err.exit_code(), 4);
    }

    #[test]
    fn test_fetch_group_with_space() {
        let runner = FakeRunner::default().reply("\"/\"\n\"/My Group\"\n");
        let groups = fetch_groups(&session(&runner), "My Group").unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].path, "/My Group");
    }

    #[test]
    fn test_fetch_properties() {
        let runner = FakeRunner::default().reply(
            "API version:                     7_0\nDefault machine folder:          /home/u/VirtualBox VMs\n",
        );
        let props = fetch_properties(&session(&runner)).unwrap();
        assert_eq!(props.api_version.as_deref(), Some("7_0"));
        assert_eq!(
            props.default_machine_folder.as_deref(),
            Some("/home/u/VirtualBox VMs")
        );
    }
}
