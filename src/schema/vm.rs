/// Machine lifecycle: create, register, delete, modify, start and power off.
use std::path::PathBuf;

use clap::{Args, ValueEnum};
use serde::Serialize;

use super::{ArgList, OnOff, ToolCommand, field_map, patterns};
use crate::validate::{FieldMap, RuleSpec};

const VM_NAME: &str = "vm.name";
const VM_OSTYPE: &str = "vm.ostype";
const VM_GROUP: &str = "vm.group";
const VM_REGISTER: &str = "vm.register";
const VM_SETTINGS_FILE: &str = "vm.settings_file";
const VM_DESCRIPTION: &str = "vm.description";
const VM_CPUS: &str = "vm.cpus";
const VM_CPU_CAP: &str = "vm.cpu_cap";
const VM_MEMORY: &str = "vm.memory";
const VM_VRAM: &str = "vm.vram";
const VM_KEYBOARD: &str = "vm.keyboard";
const VM_MOUSE: &str = "vm.mouse";
const VM_AUDIO: &str = "vm.audio";

const GROUP_PATH: &str = r"^/?[a-zA-Z0-9._/-]*$";
const CPU_CAP: &str = r"^([1-9][0-9]?|100)$";

/// Group names are written without the leading slash the tool wants.
fn group_path(group: &str) -> String {
    if group.starts_with('/') {
        group.to_owned()
    } else {
        format!("/{group}")
    }
}

// ── createvm ────────────────────────────────────────────────────────

/// Create a machine definition, registering it unless asked not to.
#[derive(Debug, Clone, Args)]
pub struct CreateVm {
    /// Machine name
    #[arg(long)]
    pub name: String,
    /// Guest OS type identifier (see `VBoxManage list ostypes`)
    #[arg(long)]
    pub ostype: String,
    /// Group the machine belongs to
    #[arg(long, default_value = "/")]
    pub group: String,
    /// Only write the settings file, do not register it
    #[arg(long)]
    pub no_register: bool,
}

impl ToolCommand for CreateVm {
    fn rules(&self) -> &'static [RuleSpec] {
        const RULES: &[RuleSpec] = &[
            RuleSpec::any(VM_NAME, &[patterns::NAME]).mandatory(),
            RuleSpec::any(VM_OSTYPE, &[patterns::TOKEN]).mandatory(),
            RuleSpec::any(VM_GROUP, &[GROUP_PATH]).mandatory(),
            RuleSpec::any(VM_REGISTER, &[patterns::BOOL]),
        ];
        RULES
    }

    fn fields(&self) -> FieldMap {
        field_map([
            (VM_NAME, Some(self.name.clone())),
            (VM_OSTYPE, Some(self.ostype.clone())),
            (VM_GROUP, Some(self.group.clone())),
            (VM_REGISTER, Some((!self.no_register).to_string())),
        ])
    }

    fn args(&self) -> Vec<String> {
        let mut args = ArgList::new(["createvm"]);
        args.flag("--name", &self.name)
            .flag("--groups", group_path(&self.group))
            .flag("--ostype", &self.ostype);
        if !self.no_register {
            args.push("--register");
        }
        args.finish()
    }
}

// ── registervm / unregistervm ───────────────────────────────────────

/// Register an existing `.vbox` settings file.
#[derive(Debug, Clone, Args)]
pub struct RegisterVm {
    /// Path to the machine settings file
    pub file: PathBuf,
}

impl ToolCommand for RegisterVm {
    /// Paths are free-form; only the settings file extension is checked.
    fn rules(&self) -> &'static [RuleSpec] {
        const RULES: &[RuleSpec] =
            &[RuleSpec::any(VM_SETTINGS_FILE, &[r"\.(vbox|xml)$"]).anywhere().mandatory()];
        RULES
    }

    fn fields(&self) -> FieldMap {
        field_map([(VM_SETTINGS_FILE, Some(self.file.display().to_string()))])
    }

    fn args(&self) -> Vec<String> {
        ArgList::new(["registervm"])
            .push(self.file.display().to_string())
            .finish()
    }
}

/// Unregister a machine and, by default, delete its files.
#[derive(Debug, Clone, Args)]
pub struct DeleteVm {
    /// Machine name or UUID
    pub name: String,
    /// Unregister only, keep disks and settings on disk
    #[arg(long)]
    pub keep_files: bool,
}

impl ToolCommand for DeleteVm {
    fn rules(&self) -> &'static [RuleSpec] {
        const RULES: &[RuleSpec] = &[RuleSpec::any(VM_NAME, &[patterns::NAME]).mandatory()];
        RULES
    }

    fn fields(&self) -> FieldMap {
        field_map([(VM_NAME, Some(self.name.clone()))])
    }

    fn args(&self) -> Vec<String> {
        let mut args = ArgList::new(["unregistervm"]);
        args.push(self.name.as_str());
        if !self.keep_files {
            args.push("--delete");
        }
        args.finish()
    }
}

// ── modifyvm ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Firmware {
    Bios,
    Efi,
    Efi32,
    Efi64,
}

/// Emulated motherboard chipset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VmChipset {
    Piix3,
    Ich9,
}

display_as_value!(Firmware, VmChipset);

/// Change machine settings. Only the options given are passed on.
#[derive(Debug, Clone, Default, Args)]
pub struct ModifyVm {
    /// Machine name or UUID
    pub name: String,
    #[arg(long)]
    pub ostype: Option<String>,
    /// Move the machine to this group
    #[arg(long)]
    pub group: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    /// Virtual CPU count
    #[arg(long)]
    pub cpus: Option<u32>,
    /// Share of host CPU time per virtual CPU, in percent (1-100)
    #[arg(long)]
    pub cpu_cap: Option<u32>,
    #[arg(long, value_enum)]
    pub cpu_hotplug: Option<OnOff>,
    /// Memory in MB
    #[arg(long)]
    pub memory: Option<u32>,
    /// Video memory in MB
    #[arg(long)]
    pub vram: Option<u32>,
    #[arg(long, value_enum)]
    pub pae: Option<OnOff>,
    #[arg(long, value_enum)]
    pub acpi: Option<OnOff>,
    #[arg(long, value_enum)]
    pub apic: Option<OnOff>,
    #[arg(long, value_enum)]
    pub page_fusion: Option<OnOff>,
    #[arg(long, value_enum)]
    pub firmware: Option<Firmware>,
    #[arg(long, value_enum)]
    pub chipset: Option<VmChipset>,
    #[arg(long, value_enum)]
    pub usb: Option<OnOff>,
    /// ps2, usb or none
    #[arg(long)]
    pub keyboard: Option<String>,
    /// ps2, usb, usbtablet, usbmultitouch or none
    #[arg(long)]
    pub mouse: Option<String>,
    /// Host audio driver (null, pulse, alsa, oss, coreaudio, dsound, none)
    #[arg(long)]
    pub audio: Option<String>,
}

impl ToolCommand for ModifyVm {
    fn rules(&self) -> &'static [RuleSpec] {
        const RULES: &[RuleSpec] = &[
            RuleSpec::any(VM_NAME, &[patterns::NAME]).mandatory(),
            RuleSpec::any(VM_OSTYPE, &[patterns::TOKEN]),
            RuleSpec::any(VM_GROUP, &[GROUP_PATH]),
            RuleSpec::any(VM_DESCRIPTION, &[patterns::ANY]),
            RuleSpec::any(VM_CPUS, &[patterns::NUMBER]),
            RuleSpec::any(VM_CPU_CAP, &[CPU_CAP]),
            RuleSpec::any(VM_MEMORY, &[patterns::NUMBER]),
            RuleSpec::any(VM_VRAM, &[patterns::NUMBER]),
            RuleSpec::any(VM_KEYBOARD, &["^ps2$", "^usb$", "^none$"]),
            RuleSpec::any(
                VM_MOUSE,
                &["^ps2$", "^usb$", "^usbtablet$", "^usbmultitouch$", "^none$"],
            ),
            RuleSpec::any(
                VM_AUDIO,
                &[r"^(null|none|pulse|alsa|oss|coreaudio|dsound|was)$"],
            ),
        ];
        RULES
    }

    fn fields(&self) -> FieldMap {
        field_map([
            (VM_NAME, Some(self.name.clone())),
            (VM_OSTYPE, self.ostype.clone()),
            (VM_GROUP, self.group.clone()),
            (VM_DESCRIPTION, self.description.clone()),
            (VM_CPUS, self.cpus.map(|n| n.to_string())),
            (VM_CPU_CAP, self.cpu_cap.map(|n| n.to_string())),
            (VM_MEMORY, self.memory.map(|n| n.to_string())),
            (VM_VRAM, self.vram.map(|n| n.to_string())),
            (VM_KEYBOARD, self.keyboard.clone()),
            (VM_MOUSE, self.mouse.clone()),
            (VM_AUDIO, self.audio.clone()),
        ])
    }

    fn args(&self) -> Vec<String> {
        let group = self.group.as_deref().map(group_path);
        ArgList::new(["modifyvm"])
            .push(self.name.as_str())
            .opt("--ostype", self.ostype.as_ref())
            .opt("--groups", group.as_ref())
            .opt("--description", self.description.as_ref())
            .opt("--cpus", self.cpus.as_ref())
            .opt("--cpuexecutioncap", self.cpu_cap.as_ref())
            .opt("--cpuhotplug", self.cpu_hotplug.as_ref())
            .opt("--memory", self.memory.as_ref())
            .opt("--vram", self.vram.as_ref())
            .opt("--pae", self.pae.as_ref())
            .opt("--acpi", self.acpi.as_ref())
            .opt("--apic", self.apic.as_ref())
            .opt("--pagefusion", self.page_fusion.as_ref())
            .opt("--firmware", self.firmware.as_ref())
            .opt("--chipset", self.chipset.as_ref())
            .opt("--usb", self.usb.as_ref())
            .opt("--keyboard", self.keyboard.as_ref())
            .opt("--mouse", self.mouse.as_ref())
            .opt("--audio", self.audio.as_ref())
            .finish()
    }
}

// ── startvm / controlvm ─────────────────────────────────────────────

/// Front-end used to start a machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StartType {
    #[default]
    Headless,
    Gui,
    Sdl,
    Separate,
}

/// How a running machine is stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerOffMode {
    /// Pull the plug.
    #[default]
    Hard,
    /// Press the ACPI power button and let the guest shut down.
    Soft,
}

display_as_value!(StartType, PowerOffMode);

#[derive(Debug, Clone, Args)]
pub struct StartVm {
    /// Machine name or UUID
    pub name: String,
    #[arg(long = "type", value_enum, default_value_t)]
    pub start_type: StartType,
}

impl ToolCommand for StartVm {
    fn rules(&self) -> &'static [RuleSpec] {
        const RULES: &[RuleSpec] = &[RuleSpec::any(VM_NAME, &[patterns::NAME]).mandatory()];
        RULES
    }

    fn fields(&self) -> FieldMap {
        field_map([(VM_NAME, Some(self.name.clone()))])
    }

    fn args(&self) -> Vec<String> {
        ArgList::new(["startvm"])
            .push(self.name.as_str())
            .flag("--type", self.start_type)
            .finish()
    }
}

#[derive(Debug, Clone, Args)]
pub struct PowerOffVm {
    /// Machine name or UUID
    pub name: String,
    #[arg(long, value_enum, default_value_t)]
    pub mode: PowerOffMode,
}

impl ToolCommand for PowerOffVm {
    fn rules(&self) -> &'static [RuleSpec] {
        const RULES: &[RuleSpec] = &[RuleSpec::any(VM_NAME, &[patterns::NAME]).mandatory()];
        RULES
    }

    fn fields(&self) -> FieldMap {
        field_map([(VM_NAME, Some(self.name.clone()))])
    }

    fn args(&self) -> Vec<String> {
        let action = match self.mode {
            PowerOffMode::Hard => "poweroff",
            PowerOffMode::Soft => "acpipowerbutton",
        };
        ArgList::new(["controlvm"])
            .push(self.name.as_str())
            .push(action)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::prepare;
    use crate::validate::ValidationError;

    fn create(name: &str) -> CreateVm {
        CreateVm {
            name: name.to_owned(),
            ostype: "Ubuntu_64".to_owned(),
            group: "lab".to_owned(),
            no_register: false,
        }
    }

    #[test]
    fn test_createvm_args() {
        let inv = prepare(&create("web 01"), false).unwrap();
        assert_eq!(
            inv.args,
            vec![
                "createvm", "--name", "web 01", "--groups", "/lab", "--ostype", "Ubuntu_64",
                "--register"
            ]
        );
    }

    #[test]
    fn test_createvm_without_register() {
        let mut cmd = create("web");
        cmd.no_register = true;
        let args = prepare(&cmd, false).unwrap().args;
        assert!(!args.iter().any(|a| a == "--register"));
        assert!(!args.iter().any(String::is_empty));
    }

    #[test]
    fn test_createvm_rejects_bad_name() {
        let err = prepare(&create("web;rm"), false).unwrap_err();
        assert!(
            matches!(err, ValidationError::PatternMismatch { ref fields } if fields == &["vm.name"])
        );
    }

    #[test]
    fn test_deletevm_args() {
        let cmd = DeleteVm {
            name: "web".to_owned(),
            keep_files: false,
        };
        assert_eq!(prepare(&cmd, false).unwrap().args, vec!["unregistervm", "web", "--delete"]);

        let keep = DeleteVm {
            keep_files: true,
            ..cmd
        };
        assert_eq!(keep.args(), vec!["unregistervm", "web"]);
    }

    #[test]
    fn test_registervm_args() {
        let cmd = RegisterVm {
            file: PathBuf::from("/vms/web/web.vbox"),
        };
        assert_eq!(cmd.args(), vec!["registervm", "/vms/web/web.vbox"]);
    }

    #[test]
    fn test_registervm_checks_extension_anywhere_in_path() {
        let spaced = RegisterVm {
            file: PathBuf::from("/home/u/VirtualBox VMs/web (copy)/web.vbox"),
        };
        assert!(prepare(&spaced, false).is_ok());

        let disk = RegisterVm {
            file: PathBuf::from("/home/u/VirtualBox VMs/web/web.vdi"),
        };
        assert!(matches!(
            prepare(&disk, false).unwrap_err(),
            ValidationError::PatternMismatch { .. }
        ));
    }

    #[test]
    fn test_modifyvm_only_given_options() {
        let cmd = ModifyVm {
            name: "web".to_owned(),
            cpus: Some(2),
            memory: Some(2048),
            pae: Some(OnOff::On),
            firmware: Some(Firmware::Efi),
            mouse: Some("usbtablet".to_owned()),
            ..ModifyVm::default()
        };
        assert_eq!(
            prepare(&cmd, false).unwrap().args,
            vec![
                "modifyvm", "web", "--cpus", "2", "--memory", "2048", "--pae", "on",
                "--firmware", "efi", "--mouse", "usbtablet"
            ]
        );
    }

    #[test]
    fn test_modifyvm_rejects_out_of_range_cap() {
        let cmd = ModifyVm {
            name: "web".to_owned(),
            cpu_cap: Some(150),
            ..ModifyVm::default()
        };
        assert!(prepare(&cmd, false).is_err());
    }

    #[test]
    fn test_modifyvm_rejects_unknown_mouse() {
        let cmd = ModifyVm {
            name: "web".to_owned(),
            mouse: Some("trackball".to_owned()),
            ..ModifyVm::default()
        };
        assert!(matches!(
            prepare(&cmd, false),
            Err(ValidationError::PatternMismatch { ref fields }) if fields == &["vm.mouse"]
        ));
    }

    #[test]
    fn test_startvm_and_poweroff_args() {
        let start = StartVm {
            name: "web".to_owned(),
            start_type: StartType::default(),
        };
        assert_eq!(start.args(), vec!["startvm", "web", "--type", "headless"]);

        let hard = PowerOffVm {
            name: "web".to_owned(),
            mode: PowerOffMode::Hard,
        };
        assert_eq!(hard.args(), vec!["controlvm", "web", "poweroff"]);

        let soft = PowerOffVm {
            mode: PowerOffMode::Soft,
            ..hard
        };
        assert_eq!(soft.args(), vec!["controlvm", "web", "acpipowerbutton"]);
    }
}
