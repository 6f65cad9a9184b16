/// Output formatting: JSON, table and id modes. TTY detection.
use std::collections::BTreeMap;
use std::io::{IsTerminal, Write};

use comfy_table::{Cell, Table, presets::UTF8_BORDERS_ONLY};
use serde::Serialize;

use super::args::OutputFormat;
use crate::report::{
    DiskInfo, FieldValue, GroupInfo, NetworkInfo, SystemProperties, VmEntry, VmInfo,
};
use crate::types::{ErrorOutput, InvocationOutput};

/// Resolve the effective output format, handling `--json` flag and TTY auto-detection.
#[must_use]
pub fn resolve_format(fmt: OutputFormat, json_flag: bool) -> OutputFormat {
    if json_flag {
        return OutputFormat::Json;
    }
    if fmt == OutputFormat::Auto {
        if std::io::stdout().is_terminal() {
            OutputFormat::Table
        } else {
            OutputFormat::Json
        }
    } else {
        fmt
    }
}

/// Output context passed to all formatters.
pub struct OutputCtx {
    pub format: OutputFormat,
    pub fields: Option<Vec<String>>,
    pub no_header: bool,
}

impl OutputCtx {
    /// Construct from CLI args.
    #[must_use]
    pub fn new(fmt: OutputFormat, json_flag: bool, fields: Option<&str>, no_header: bool) -> Self {
        let format = resolve_format(fmt, json_flag);
        let fields = fields.map(|f| f.split(',').map(str::trim).map(str::to_owned).collect());
        Self {
            format,
            fields,
            no_header,
        }
    }

    /// Start a named timer, logged at debug level when dropped.
    #[must_use]
    pub fn timer(&self, label: &'static str) -> DebugTimer {
        DebugTimer::new(label)
    }

    /// Whether a field should be included in output.
    fn include_field(&self, name: &str) -> bool {
        self.fields
            .as_ref()
            .is_none_or(|f| f.iter().any(|n| n == name))
    }
}

// --- Tables ---

/// A table column: `--fields` name and header text.
type Column = (&'static str, &'static str);

/// Render rows through the `--fields` projection.
fn write_table<R>(columns: &[Column], rows: R, ctx: &OutputCtx)
where
    R: IntoIterator<Item = Vec<String>>,
{
    let keep: Vec<bool> = columns.iter().map(|(f, _)| ctx.include_field(f)).collect();

    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    if !ctx.no_header {
        table.set_header(
            columns
                .iter()
                .zip(&keep)
                .filter(|(_, k)| **k)
                .map(|((_, h), _)| Cell::new(h)),
        );
    }
    for row in rows {
        table.add_row(
            row.into_iter()
                .zip(&keep)
                .filter(|(_, k)| **k)
                .map(|(v, _)| Cell::new(v)),
        );
    }
    println!("{table}");
}

fn flag(v: Option<bool>) -> String {
    match v {
        Some(true) => "yes".to_owned(),
        Some(false) => "no".to_owned(),
        None => String::new(),
    }
}

fn text(v: Option<&String>) -> String {
    v.cloned().unwrap_or_default()
}

fn print_ids<'a, I: IntoIterator<Item = &'a str>>(ids: I) {
    for id in ids {
        println!("{id}");
    }
}

// --- Machines ---

/// Write `list vms` entries to stdout.
pub fn write_vms(vms: &[VmEntry], ctx: &OutputCtx) {
    match ctx.format {
        OutputFormat::Json => print_json(vms),
        OutputFormat::Compact => print_compact_json(vms),
        OutputFormat::Ndjson => print_ndjson(vms),
        OutputFormat::Id => print_ids(vms.iter().map(|v| v.name.as_str())),
        OutputFormat::Table | OutputFormat::Auto => write_table(
            &[("name", "NAME"), ("uuid", "UUID")],
            vms.iter().map(|v| vec![v.name.clone(), v.uuid.clone()]),
            ctx,
        ),
    }
}

/// Write one machine's detail report to stdout.
pub fn write_vm_info(info: &VmInfo, ctx: &OutputCtx) {
    match ctx.format {
        OutputFormat::Json => print_json(info),
        OutputFormat::Compact => print_compact_json(info),
        OutputFormat::Ndjson => print_ndjson(&[info]),
        OutputFormat::Id => print_ids(info.name.as_deref()),
        OutputFormat::Table | OutputFormat::Auto => {
            let mut pairs: Vec<(String, String)> = [
                ("name", info.name.clone()),
                ("uuid", info.uuid.clone()),
                ("state", info.state.clone()),
                ("ostype", info.ostype.clone()),
                ("memory_mb", info.memory_mb.map(|m| m.to_string())),
                ("cpus", info.cpus.map(|c| c.to_string())),
            ]
            .into_iter()
            .filter_map(|(k, v)| v.map(|v| (k.to_owned(), v)))
            .collect();
            pairs.extend(info.fields.iter().map(|(k, v)| (k.clone(), v.clone())));
            write_pairs(pairs, ctx);
        }
    }
}

/// Key/value table; `--fields` selects keys.
fn write_pairs(pairs: Vec<(String, String)>, ctx: &OutputCtx) {
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    if !ctx.no_header {
        table.set_header(["KEY", "VALUE"]);
    }
    for (k, v) in pairs {
        if ctx.include_field(&k) {
            table.add_row([k, v]);
        }
    }
    println!("{table}");
}

// --- Networks ---

/// Write networks to stdout.
pub fn write_networks(nets: &[NetworkInfo], ctx: &OutputCtx) {
    match ctx.format {
        OutputFormat::Json => print_json(nets),
        OutputFormat::Compact => print_compact_json(nets),
        OutputFormat::Ndjson => print_ndjson(nets),
        OutputFormat::Id => print_ids(nets.iter().map(|n| n.name.as_str())),
        OutputFormat::Table | OutputFormat::Auto => write_table(
            &[
                ("kind", "KIND"),
                ("name", "NAME"),
                ("enabled", "ENABLED"),
                ("network", "NETWORK"),
                ("dhcp", "DHCP"),
                ("ipv6", "IPV6"),
            ],
            nets.iter().map(|n| {
                vec![
                    n.kind.as_arg().to_owned(),
                    n.name.clone(),
                    flag(n.enabled),
                    text(n.network.as_ref()),
                    flag(n.dhcp),
                    flag(n.ipv6),
                ]
            }),
            ctx,
        ),
    }
}

// --- Disks ---

/// Write disk media to stdout.
pub fn write_disks(disks: &[DiskInfo], ctx: &OutputCtx) {
    match ctx.format {
        OutputFormat::Json => print_json(disks),
        OutputFormat::Compact => print_compact_json(disks),
        OutputFormat::Ndjson => print_ndjson(disks),
        OutputFormat::Id => print_ids(disks.iter().map(|d| d.uuid.as_str())),
        OutputFormat::Table | OutputFormat::Auto => write_table(
            &[
                ("uuid", "UUID"),
                ("location", "LOCATION"),
                ("format", "FORMAT"),
                ("capacity", "CAPACITY"),
                ("state", "STATE"),
                ("vm", "VM"),
            ],
            disks.iter().map(|d| {
                vec![
                    d.uuid.clone(),
                    text(d.location.as_ref()),
                    text(d.format.as_ref()),
                    text(d.capacity.as_ref()),
                    text(d.state.as_ref()),
                    d.vm_names().collect::<Vec<_>>().join(", "),
                ]
            }),
            ctx,
        ),
    }
}

// --- Groups ---

/// Write machine groups to stdout.
pub fn write_groups(groups: &[GroupInfo], ctx: &OutputCtx) {
    match ctx.format {
        OutputFormat::Json => print_json(groups),
        OutputFormat::Compact => print_compact_json(groups),
        OutputFormat::Ndjson => print_ndjson(groups),
        OutputFormat::Id => print_ids(groups.iter().map(|g| g.name.as_str())),
        OutputFormat::Table | OutputFormat::Auto => write_table(
            &[("name", "NAME"), ("path", "PATH")],
            groups.iter().map(|g| vec![g.name.clone(), g.path.clone()]),
            ctx,
        ),
    }
}

// --- System properties ---

/// Write system properties to stdout.
pub fn write_properties(props: &SystemProperties, ctx: &OutputCtx) {
    match ctx.format {
        OutputFormat::Json => print_json(props),
        OutputFormat::Compact => print_compact_json(props),
        OutputFormat::Ndjson => print_ndjson(&[props]),
        OutputFormat::Id => print_ids(props.api_version.as_deref()),
        OutputFormat::Table | OutputFormat::Auto => {
            let mut pairs: BTreeMap<String, String> = props
                .fields
                .iter()
                .filter_map(|(k, v)| match v {
                    FieldValue::Text(t) => Some((k.clone(), t.clone())),
                    FieldValue::Vms(_) => None,
                })
                .collect();
            if let Some(folder) = &props.default_machine_folder {
                pairs.insert("default_machine_folder".to_owned(), folder.clone());
            }
            if let Some(api) = &props.api_version {
                pairs.insert("api_version".to_owned(), api.clone());
            }
            write_pairs(pairs.into_iter().collect(), ctx);
        }
    }
}

// --- Mutating commands ---

/// Write the outcome of a state-changing command to stdout.
pub fn write_invocation(result: &InvocationOutput, ctx: &OutputCtx) {
    match ctx.format {
        OutputFormat::Json => print_json(result),
        OutputFormat::Compact => print_compact_json(result),
        OutputFormat::Ndjson => print_ndjson(&[result]),
        OutputFormat::Id => print_ids(result.output.iter().map(String::as_str)),
        OutputFormat::Table | OutputFormat::Auto => {
            let dry = if result.dry_run { " [dry-run]" } else { "" };
            println!("$ {}{dry}", result.command.join(" "));
            print_ids(result.output.iter().map(String::as_str));
        }
    }
}

// --- Error output ---

/// Write a structured error to stderr.
pub fn write_error(err: &ErrorOutput, format: OutputFormat, json_flag: bool) {
    let fmt = resolve_format(format, json_flag);
    let stderr = std::io::stderr();
    let mut out = stderr.lock();
    match fmt {
        OutputFormat::Json | OutputFormat::Compact | OutputFormat::Ndjson => {
            let s = serde_json::to_string_pretty(err).unwrap_or_default();
            let _ = writeln!(out, "{s}");
        }
        _ => {
            let _ = writeln!(out, "Error: {}", err.error.message);
            if let Some(candidates) = &err.error.candidates {
                let _ = writeln!(out, "  Candidates:");
                for c in candidates {
                    let _ = writeln!(out, "    {c}");
                }
            }
        }
    }
}

// --- Debug timer ---

/// A RAII timer that logs elapsed time at debug level on drop.
///
/// Created via [`OutputCtx::timer`].
pub struct DebugTimer {
    label: &'static str,
    start: std::time::Instant,
}

impl DebugTimer {
    #[must_use]
    fn new(label: &'static str) -> Self {
        Self {
            label,
            start: std::time::Instant::now(),
        }
    }
}

impl Drop for DebugTimer {
    fn drop(&mut self) {
        tracing::debug!(label = self.label, elapsed = ?self.start.elapsed(), "timer");
    }
}

// --- Generic JSON helpers ---

fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{s}"),
        Err(e) => eprintln!("JSON serialization error: {e}"),
    }
}

fn print_compact_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string(value) {
        Ok(s) => println!("{s}"),
        Err(e) => eprintln!("JSON serialization error: {e}"),
    }
}

fn print_ndjson<T: Serialize>(values: &[T]) {
    for v in values {
        match serde_json::to_string(v) {
            Ok(s) => println!("{s}"),
            Err(e) => eprintln!("JSON serialization error: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_format_is_kept() {
        assert_eq!(resolve_format(OutputFormat::Table, false), OutputFormat::Table);
        assert_eq!(resolve_format(OutputFormat::Table, true), OutputFormat::Json);
    }

    #[test]
    fn test_field_projection() {
        let ctx = OutputCtx::new(OutputFormat::Table, false, Some("name, uuid"), false);
        assert!(ctx.include_field("name"));
        assert!(ctx.include_field("uuid"));
        assert!(!ctx.include_field("state"));

        let all = OutputCtx::new(OutputFormat::Table, false, None, false);
        assert!(all.include_field("anything"));
    }

    #[test]
    fn test_flag_cells() {
        assert_eq!(flag(Some(true)), "yes");
        assert_eq!(flag(Some(false)), "no");
        assert_eq!(flag(None), "");
    }
}
