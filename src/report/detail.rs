/// Flat `key=value` parser for single-entity detail reports
/// (`showvminfo --machinereadable`).
use std::collections::BTreeMap;

use super::lines::{split_pair, strip_quotes};

/// Parse `key=value` lines into a flat map. Keys keep their original case.
///
/// Lines without `=` are skipped; a value may itself contain `=`.
#[must_use]
pub fn parse_detail<I, S>(lines: I) -> BTreeMap<String, String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out = BTreeMap::new();
    for raw in lines {
        let line = strip_quotes(raw.as_ref().trim());
        match split_pair(&line, '=') {
            Some((key, value)) if !key.is_empty() => {
                out.insert(key.to_owned(), value.to_owned());
            }
            _ => tracing::trace!(line = %line, "skipping detail line"),
        }
    }
    out
}
