/// Line-level helpers shared by every report parser.
use std::borrow::Cow;

/// Remove every `"` from a line.
///
/// Lines without quotes are returned as-is (zero allocation).
#[must_use]
pub fn strip_quotes(line: &str) -> Cow<'_, str> {
    if line.contains('"') {
        Cow::Owned(line.replace('"', ""))
    } else {
        Cow::Borrowed(line)
    }
}

/// Split on the first `sep`, trimming both halves.
///
/// Everything after the first separator belongs to the value, so MAC
/// addresses and Windows paths survive intact.
#[must_use]
pub fn split_pair(line: &str, sep: char) -> Option<(&str, &str)> {
    line.split_once(sep).map(|(k, v)| (k.trim(), v.trim()))
}

/// Lower-case a report key and drop all whitespace (`"In use by VMs"` -> `"inusebyvms"`).
#[must_use]
pub fn normalize_key(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Interpret the tool's assorted yes/no spellings.
#[must_use]
pub fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "yes" | "on" | "true" | "enabled" | "1" => Some(true),
        "no" | "off" | "false" | "disabled" | "0" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_quotes() {
        assert_eq!(strip_quotes(r#""myvm" {abc}"#), "myvm {abc}");
        assert!(matches!(strip_quotes("plain"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_split_pair_keeps_later_separators() {
        assert_eq!(
            split_pair("HardwareAddress: 0a:00:27:00:00:00", ':'),
            Some(("HardwareAddress", "0a:00:27:00:00:00"))
        );
        assert_eq!(split_pair("no separator", ':'), None);
    }

    #[test]
    fn test_normalize_key() {
        assert_eq!(normalize_key("  In use by VMs "), "inusebyvms");
        assert_eq!(normalize_key("NetworkName"), "networkname");
    }

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag("Yes"), Some(true));
        assert_eq!(parse_flag("off"), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }
}
