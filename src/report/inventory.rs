/// Name-indexed list parsers: `list vms` and `list groups`.
use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use super::lines::strip_quotes;

/// `"name" {token}`
static INVENTORY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^"(.+)"\s+\{(.+)\}"#).expect("inventory pattern is valid"));

/// Name VirtualBox reports for machines whose settings file cannot be read.
pub const INACCESSIBLE: &str = "<inaccessible>";

/// Group name used for the root group `/`.
pub const DEFAULT_GROUP: &str = "default";

/// Parse `"name" {uuid}` lines into `name -> uuid`.
///
/// Inaccessible machines and non-matching lines are skipped.
#[must_use]
pub fn parse_inventory<I, S>(lines: I) -> BTreeMap<String, String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out = BTreeMap::new();
    for raw in lines {
        let line = raw.as_ref().trim();
        let Some(caps) = INVENTORY_RE.captures(line) else {
            tracing::trace!(line = %line, "skipping inventory line");
            continue;
        };
        if &caps[1] == INACCESSIBLE {
            continue;
        }
        out.insert(caps[1].to_owned(), caps[2].to_owned());
    }
    out
}

/// Parse `list groups` output into `name -> path`.
///
/// The name is the path with every `/` removed; the root group `/` becomes
/// [`DEFAULT_GROUP`].
#[must_use]
pub fn parse_groups<I, S>(lines: I) -> BTreeMap<String, String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out = BTreeMap::new();
    for raw in lines {
        let path = strip_quotes(raw.as_ref().trim());
        if path.is_empty() {
            continue;
        }
        let mut name = path.replace('/', "");
        if name.is_empty() {
            DEFAULT_GROUP.clone_into(&mut name);
        }
        out.insert(name, path.into_owned());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inventory_line() {
        let out = parse_inventory([r#""myvm" {abcd-1234}"#]);
        assert_eq!(out.get("myvm").map(String::as_str), Some("abcd-1234"));
    }

    #[test]
    fn test_inaccessible_is_excluded() {
        let out = parse_inventory([r#""<inaccessible>" {xyz}"#, r#""ok vm" {1}"#]);
        assert_eq!(out.len(), 1);
        assert!(out.contains_key("ok vm"));
    }

    #[test]
    fn test_inventory_skips_junk() {
        let out = parse_inventory(["", "WARNING: something", r#""a" {1}"#]);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn test_groups() {
        let out = parse_groups([r#""/""#, r#""/test1""#, ""]);
        assert_eq!(out.len(), 2);
        assert_eq!(out["default"], "/");
        assert_eq!(out["test1"], "/test1");
    }
}
