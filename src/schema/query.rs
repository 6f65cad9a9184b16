/// Read-only listing commands and the selection names passed to them.
use super::{ArgList, ToolCommand, field_map, patterns};
use crate::report::NetworkKind;
use crate::validate::{FieldMap, RuleSpec};

const VM_NAME: &str = "vm.name";

/// Field names checked strictly before a listing is filtered.
pub const SELECT_VM: &str = "select.vm";
pub const SELECT_NETWORK: &str = "select.network";
pub const SELECT_GROUP: &str = "select.group";

/// Network names are single tokens. Machine and group names may contain
/// spaces. `all` passes like any other name.
pub const SELECTION_RULES: &[RuleSpec] = &[
    RuleSpec::any(SELECT_VM, &[patterns::NAME]),
    RuleSpec::any(SELECT_NETWORK, &[patterns::TOKEN]),
    RuleSpec::any(SELECT_GROUP, &[patterns::NAME]),
];

/// A listing selection, validated strictly against [`SELECTION_RULES`].
#[derive(Debug, Clone)]
pub struct Selection<'a> {
    pub field: &'static str,
    pub value: &'a str,
}

impl ToolCommand for Selection<'_> {
    fn rules(&self) -> &'static [RuleSpec] {
        SELECTION_RULES
    }

    fn fields(&self) -> FieldMap {
        field_map([(self.field, Some(self.value.to_owned()))])
    }

    /// Selections are applied to parsed output, never passed to the tool.
    fn args(&self) -> Vec<String> {
        Vec::new()
    }
}

/// `list vms --sorted`
#[derive(Debug, Clone, Copy, Default)]
pub struct ListVms;

impl ToolCommand for ListVms {
    fn args(&self) -> Vec<String> {
        ArgList::new(["list", "vms", "--sorted"]).finish()
    }
}

/// `showvminfo --machinereadable NAME`
#[derive(Debug, Clone)]
pub struct ShowVmInfo<'a> {
    pub name: &'a str,
}

impl ToolCommand for ShowVmInfo<'_> {
    fn rules(&self) -> &'static [RuleSpec] {
        const RULES: &[RuleSpec] = &[RuleSpec::any(VM_NAME, &[patterns::NAME]).mandatory()];
        RULES
    }

    fn fields(&self) -> FieldMap {
        field_map([(VM_NAME, Some(self.name.to_owned()))])
    }

    fn args(&self) -> Vec<String> {
        ArgList::new(["showvminfo", "--machinereadable"])
            .push(self.name)
            .finish()
    }
}

/// `list intnets|bridgedifs|hostonlyifs|natnets`
#[derive(Debug, Clone, Copy)]
pub struct ListNetworks(pub NetworkKind);

impl ToolCommand for ListNetworks {
    fn args(&self) -> Vec<String> {
        ArgList::new(["list", self.0.as_arg()]).finish()
    }
}

/// `list hdds --long`
#[derive(Debug, Clone, Copy, Default)]
pub struct ListDisks;

impl ToolCommand for ListDisks {
    fn args(&self) -> Vec<String> {
        ArgList::new(["list", "hdds", "--long"]).finish()
    }
}

/// `list groups --long`
#[derive(Debug, Clone, Copy, Default)]
pub struct ListGroups;

impl ToolCommand for ListGroups {
    fn args(&self) -> Vec<String> {
        ArgList::new(["list", "groups", "--long"]).finish()
    }
}

/// `list systemproperties --long`
#[derive(Debug, Clone, Copy, Default)]
pub struct ListSystemProperties;

impl ToolCommand for ListSystemProperties {
    fn args(&self) -> Vec<String> {
        ArgList::new(["list", "systemproperties", "--long"]).finish()
    }
}
