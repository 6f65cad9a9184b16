/// Storage controllers and disk media.
use clap::{Args, ValueEnum};
use serde::Serialize;

use super::{ArgList, OnOff, ToolCommand, field_map, patterns};
use crate::validate::{FieldMap, RuleSpec};

const CTL_VM: &str = "controller.vm";
const CTL_NAME: &str = "controller.name";
const CTL_PORT_COUNT: &str = "controller.port_count";

const DISK_FILE: &str = "disk.file";
const DISK_SIZE: &str = "disk.size";

const ATTACH_VM: &str = "attach.vm";
const ATTACH_CONTROLLER: &str = "attach.controller";
const ATTACH_MEDIUM: &str = "attach.medium";
const ATTACH_PORT: &str = "attach.port";
const ATTACH_DEVICE: &str = "attach.device";
const ATTACH_COMMENT: &str = "attach.comment";

/// System bus a controller is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ControllerBus {
    Ide,
    Sata,
    Scsi,
    Floppy,
    Sas,
    Usb,
    Pcie,
}

/// Emulated controller chip. Spelled the way `VBoxManage` spells them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
pub enum ControllerChipset {
    #[value(name = "LSILogic")]
    LsiLogic,
    #[value(name = "LSILogicSAS")]
    LsiLogicSas,
    #[value(name = "BusLogic")]
    BusLogic,
    #[value(name = "IntelAHCI")]
    IntelAhci,
    #[value(name = "PIIX3")]
    Piix3,
    #[value(name = "PIIX4")]
    Piix4,
    #[value(name = "ICH6")]
    Ich6,
    #[value(name = "I82078")]
    I82078,
    #[value(name = "USB")]
    Usb,
    #[value(name = "NVMe")]
    NVMe,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiskFormat {
    Vdi,
    #[default]
    Vmdk,
    Vhd,
}

/// Kind of drive a medium is attached as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    #[default]
    Hdd,
    Dvddrive,
    Fdd,
}

/// Write behaviour of an attached medium.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediumType {
    Normal,
    Writethrough,
    Immutable,
    Shareable,
    Readonly,
    Multiattach,
}

display_as_value!(ControllerBus, ControllerChipset, DiskFormat, DeviceType, MediumType);

// ── storagectl ──────────────────────────────────────────────────────

/// Add a storage controller to a machine.
#[derive(Debug, Clone, Args)]
pub struct CreateController {
    /// Machine name or UUID
    #[arg(long)]
    pub vm: String,
    /// Controller name, referenced later by `disk attach --controller`
    #[arg(long)]
    pub name: String,
    #[arg(long, value_enum)]
    pub bus: ControllerBus,
    #[arg(long, value_enum, ignore_case = true)]
    pub chipset: ControllerChipset,
    #[arg(long, default_value_t = 8)]
    pub port_count: u32,
    #[arg(long, value_enum, default_value_t = OnOff::Off)]
    pub bootable: OnOff,
    #[arg(long, value_enum, default_value_t = OnOff::On)]
    pub host_io_cache: OnOff,
}

impl ToolCommand for CreateController {
    fn rules(&self) -> &'static [RuleSpec] {
        const RULES: &[RuleSpec] = &[
            RuleSpec::any(CTL_VM, &[patterns::NAME]).mandatory(),
            RuleSpec::any(CTL_NAME, &[patterns::NAME]).mandatory(),
            RuleSpec::any(CTL_PORT_COUNT, &[patterns::NUMBER]),
        ];
        RULES
    }

    fn fields(&self) -> FieldMap {
        field_map([
            (CTL_VM, Some(self.vm.clone())),
            (CTL_NAME, Some(self.name.clone())),
            (CTL_PORT_COUNT, Some(self.port_count.to_string())),
        ])
    }

    fn args(&self) -> Vec<String> {
        ArgList::new(["storagectl"])
            .push(self.vm.as_str())
            .flag("--add", self.bus)
            .flag("--controller", self.chipset)
            .flag("--name", &self.name)
            .flag("--portcount", self.port_count)
            .flag("--bootable", self.bootable)
            .flag("--hostiocache", self.host_io_cache)
            .finish()
    }
}

// ── createmedium / closemedium ──────────────────────────────────────

/// Create a dynamically allocated hard disk image.
#[derive(Debug, Clone, Args)]
pub struct CreateDisk {
    /// Image file to create
    #[arg(long)]
    pub file: String,
    /// Size in MB
    #[arg(long)]
    pub size: u64,
    #[arg(long, value_enum, default_value_t)]
    pub format: DiskFormat,
}

impl ToolCommand for CreateDisk {
    fn rules(&self) -> &'static [RuleSpec] {
        const RULES: &[RuleSpec] = &[
            RuleSpec::any(DISK_FILE, &[patterns::PATH]).mandatory(),
            RuleSpec::any(DISK_SIZE, &[r"^[1-9][0-9]*$"]).mandatory(),
        ];
        RULES
    }

    fn fields(&self) -> FieldMap {
        field_map([
            (DISK_FILE, Some(self.file.clone())),
            (DISK_SIZE, Some(self.size.to_string())),
        ])
    }

    fn args(&self) -> Vec<String> {
        ArgList::new(["createmedium", "disk"])
            .flag("--filename", &self.file)
            .flag("--format", self.format)
            .flag("--size", self.size)
            .finish()
    }
}

/// Remove a disk from the media registry, deleting the image by default.
#[derive(Debug, Clone, Args)]
pub struct CloseDisk {
    /// Image file or UUID
    pub file: String,
    /// Keep the image file on disk
    #[arg(long)]
    pub keep_file: bool,
}

impl ToolCommand for CloseDisk {
    fn rules(&self) -> &'static [RuleSpec] {
        const RULES: &[RuleSpec] = &[RuleSpec::any(DISK_FILE, &[patterns::PATH]).mandatory()];
        RULES
    }

    fn fields(&self) -> FieldMap {
        field_map([(DISK_FILE, Some(self.file.clone()))])
    }

    fn args(&self) -> Vec<String> {
        let mut args = ArgList::new(["closemedium", "disk"]);
        args.push(self.file.as_str());
        if !self.keep_file {
            args.push("--delete");
        }
        args.finish()
    }
}

// ── storageattach ───────────────────────────────────────────────────

/// Attach a medium to a controller port.
#[derive(Debug, Clone, Args)]
pub struct AttachDisk {
    /// Machine name or UUID
    #[arg(long)]
    pub vm: String,
    /// Controller name given to `controller add`
    #[arg(long)]
    pub controller: String,
    /// Image file, UUID, `none` or `emptydrive`
    #[arg(long)]
    pub medium: String,
    #[arg(long = "type", value_enum, default_value_t)]
    pub device_type: DeviceType,
    #[arg(long, default_value_t = 0)]
    pub port: u32,
    #[arg(long, default_value_t = 0)]
    pub device: u32,
    #[arg(long, value_enum)]
    pub mtype: Option<MediumType>,
    #[arg(long)]
    pub comment: Option<String>,
}

impl ToolCommand for AttachDisk {
    fn rules(&self) -> &'static [RuleSpec] {
        const RULES: &[RuleSpec] = &[
            RuleSpec::any(ATTACH_VM, &[patterns::NAME]).mandatory(),
            RuleSpec::any(ATTACH_CONTROLLER, &[patterns::NAME]).mandatory(),
            RuleSpec::any(ATTACH_MEDIUM, &[patterns::PATH]).mandatory(),
            RuleSpec::any(ATTACH_PORT, &[patterns::NUMBER]),
            RuleSpec::any(ATTACH_DEVICE, &[patterns::NUMBER]),
            RuleSpec::any(ATTACH_COMMENT, &[patterns::ANY]),
        ];
        RULES
    }

    fn fields(&self) -> FieldMap {
        field_map([
            (ATTACH_VM, Some(self.vm.clone())),
            (ATTACH_CONTROLLER, Some(self.controller.clone())),
            (ATTACH_MEDIUM, Some(self.medium.clone())),
            (ATTACH_PORT, Some(self.port.to_string())),
            (ATTACH_DEVICE, Some(self.device.to_string())),
            (ATTACH_COMMENT, self.comment.clone()),
        ])
    }

    fn args(&self) -> Vec<String> {
        ArgList::new(["storageattach"])
            .push(self.vm.as_str())
            .flag("--storagectl", &self.controller)
            .flag("--medium", &self.medium)
            .flag("--type", self.device_type)
            .flag("--port", self.port)
            .opt("--mtype", self.mtype.as_ref())
            .flag("--device", self.device)
            .opt("--comment", self.comment.as_ref())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::prepare;

    fn controller() -> CreateController {
        CreateController {
            vm: "web".to_owned(),
            name: "SATA Controller".to_owned(),
            bus: ControllerBus::Sata,
            chipset: ControllerChipset::IntelAhci,
            port_count: 8,
            bootable: OnOff::Off,
            host_io_cache: OnOff::On,
        }
    }

    #[test]
    fn test_storagectl_args() {
        assert_eq!(
            prepare(&controller(), false).unwrap().args,
            vec![
                "storagectl", "web", "--add", "sata", "--controller", "IntelAHCI", "--name",
                "SATA Controller", "--portcount", "8", "--bootable", "off", "--hostiocache", "on"
            ]
        );
    }

    #[test]
    fn test_chipset_spelling() {
        assert_eq!(ControllerChipset::LsiLogicSas.to_string(), "LSILogicSAS");
        assert_eq!(ControllerChipset::NVMe.to_string(), "NVMe");
        assert_eq!(ControllerChipset::I82078.to_string(), "I82078");
    }

    #[test]
    fn test_createmedium_defaults_to_vmdk() {
        let cmd = CreateDisk {
            file: "/vms/web/disk0.vmdk".to_owned(),
            size: 10240,
            format: DiskFormat::default(),
        };
        assert_eq!(
            prepare(&cmd, false).unwrap().args,
            vec![
                "createmedium", "disk", "--filename", "/vms/web/disk0.vmdk", "--format", "vmdk",
                "--size", "10240"
            ]
        );
    }

    #[test]
    fn test_createmedium_rejects_zero_size() {
        let cmd = CreateDisk {
            file: "/vms/d.vdi".to_owned(),
            size: 0,
            format: DiskFormat::Vdi,
        };
        assert!(prepare(&cmd, false).is_err());
    }

    #[test]
    fn test_closemedium_args() {
        let cmd = CloseDisk {
            file: "/vms/d.vdi".to_owned(),
            keep_file: false,
        };
        assert_eq!(cmd.args(), vec!["closemedium", "disk", "/vms/d.vdi", "--delete"]);
    }

    #[test]
    fn test_storageattach_args_order() {
        let cmd = AttachDisk {
            vm: "web".to_owned(),
            controller: "SATA".to_owned(),
            medium: "/vms/d.vdi".to_owned(),
            device_type: DeviceType::Hdd,
            port: 1,
            device: 0,
            mtype: Some(MediumType::Immutable),
            comment: None,
        };
        assert_eq!(
            prepare(&cmd, false).unwrap().args,
            vec![
                "storageattach", "web", "--storagectl", "SATA", "--medium", "/vms/d.vdi",
                "--type", "hdd", "--port", "1", "--mtype", "immutable", "--device", "0"
            ]
        );
    }

    #[test]
    fn test_storageattach_rejects_bad_medium() {
        let cmd = AttachDisk {
            vm: "web".to_owned(),
            controller: "SATA".to_owned(),
            medium: "$(reboot)".to_owned(),
            device_type: DeviceType::Dvddrive,
            port: 0,
            device: 0,
            mtype: None,
            comment: None,
        };
        assert!(prepare(&cmd, false).is_err());
    }
}
