/// Typed command schemas: one struct per VirtualBox operation.
///
/// Every schema knows three things:
/// - the rule table guarding its user-supplied values,
/// - how to render those values as a field map for the validator,
/// - the argument vector passed to the tool.
///
/// [`prepare`] ties them together: validate first, build arguments second,
/// so nothing reaches the tool that failed its rules.

/// `Display` for a `ValueEnum` whose value names are the tool's own spelling.
macro_rules! display_as_value {
    ($($ty:ty),+ $(,)?) => {$(
        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&$crate::schema::value_name(self))
            }
        }
    )+};
}

pub mod network;
pub mod query;
pub mod storage;
pub mod vm;

use clap::ValueEnum;
use serde::Serialize;

use crate::validate::{FieldMap, RuleSpec, ValidationError, Validator};

/// Shared value patterns. Only the start of a value is anchored by the
/// validator, so each pattern carries its own `$`.
pub mod patterns {
    /// Machine and controller names that may contain spaces.
    pub const NAME: &str = r"^[a-zA-Z0-9._ -]+$";
    /// Names without spaces (groups, networks, interfaces).
    pub const TOKEN: &str = r"^[a-zA-Z0-9._-]+$";
    /// File system paths.
    pub const PATH: &str = r"^[a-zA-Z0-9._/ -]+$";
    pub const NUMBER: &str = r"^[0-9]+$";
    pub const BOOL: &str = r"^(true|false)$";
    /// Free text.
    pub const ANY: &str = r"^.*";
}

/// A validated, ready-to-run tool invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub args: Vec<String>,
}

/// A VirtualBox operation expressed as typed fields.
pub trait ToolCommand {
    /// Rule table for [`ToolCommand::fields`].
    fn rules(&self) -> &'static [RuleSpec] {
        &[]
    }

    /// User-supplied values in string form, keyed like the rule table.
    fn fields(&self) -> FieldMap {
        FieldMap::new()
    }

    /// Argument vector, program name excluded.
    fn args(&self) -> Vec<String>;
}

/// Validate `cmd` and produce its invocation.
///
/// # Errors
///
/// Returns `ValidationError` if the rule table is malformed or a field fails it.
pub fn prepare<C: ToolCommand + ?Sized>(cmd: &C, strict: bool) -> Result<Invocation, ValidationError> {
    Validator::from_specs(cmd.rules(), strict)?.validate(&cmd.fields())?;
    Ok(Invocation { args: cmd.args() })
}

/// Build a field map from optional values, skipping the absent ones.
pub(crate) fn field_map<const N: usize>(pairs: [(&str, Option<String>); N]) -> FieldMap {
    pairs
        .into_iter()
        .filter_map(|(k, v)| v.map(|v| (k.to_owned(), v)))
        .collect()
}

/// Collects `--flag value` pairs in order.
#[derive(Debug, Default)]
pub(crate) struct ArgList(Vec<String>);

impl ArgList {
    pub(crate) fn new<const N: usize>(head: [&str; N]) -> Self {
        Self(head.iter().map(|s| (*s).to_owned()).collect())
    }

    pub(crate) fn push(&mut self, arg: impl Into<String>) -> &mut Self {
        self.0.push(arg.into());
        self
    }

    pub(crate) fn flag(&mut self, name: &str, value: impl ToString) -> &mut Self {
        self.0.push(name.to_owned());
        self.0.push(value.to_string());
        self
    }

    pub(crate) fn opt<T: ToString>(&mut self, name: &str, value: Option<&T>) -> &mut Self {
        if let Some(v) = value {
            self.flag(name, v.to_string());
        }
        self
    }

    pub(crate) fn finish(&mut self) -> Vec<String> {
        std::mem::take(&mut self.0)
    }
}

/// A VirtualBox `on|off` switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OnOff {
    On,
    Off,
}

impl From<bool> for OnOff {
    fn from(b: bool) -> Self {
        if b { Self::On } else { Self::Off }
    }
}

display_as_value!(OnOff);

/// Display the `clap` value name of a `ValueEnum`, which is also what the tool expects.
pub(crate) fn value_name<T: ValueEnum>(v: &T) -> String {
    v.to_possible_value()
        .map(|p| p.get_name().to_owned())
        .unwrap_or_default()
}
