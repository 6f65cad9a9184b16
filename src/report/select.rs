/// Selecting records out of a parsed report, with fuzzy suggestions on a miss.
use std::collections::BTreeMap;
use std::convert::Infallible;
use std::str::FromStr;

use nucleo_matcher::{
    Matcher, Utf32Str,
    pattern::{CaseMatching, Normalization, Pattern},
};

use super::kinds::DiskInfo;

/// Keyword that selects every record.
pub const ALL: &str = "all";

/// Maximum number of suggestions attached to a miss.
const MAX_SUGGESTIONS: usize = 5;

/// Which records of a report to return.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Selector {
    /// Every record.
    #[default]
    All,
    /// The record with this key.
    Key(String),
}

impl FromStr for Selector {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(if s == ALL {
            Self::All
        } else {
            Self::Key(s.to_owned())
        })
    }
}

impl Selector {
    /// String form, as it would be typed on the command line.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::All => ALL,
            Self::Key(k) => k,
        }
    }
}

/// A keyed selection that found nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Miss {
    pub query: String,
    /// Closest existing keys, best first.
    pub candidates: Vec<String>,
}

/// Select from a keyed report: everything for [`Selector::All`], one record otherwise.
///
/// # Errors
///
/// Returns a [`Miss`] with suggestions when the key does not exist.
pub fn select<T>(mut records: BTreeMap<String, T>, selector: &Selector) -> Result<Vec<T>, Miss> {
    match selector {
        Selector::All => Ok(records.into_values().collect()),
        Selector::Key(key) => records.remove(key).map(|r| vec![r]).ok_or_else(|| Miss {
            query: key.clone(),
            candidates: suggest(key, records.keys().map(String::as_str)),
        }),
    }
}

/// Disks are selected by a machine that uses them, not by their UUID.
///
/// A medium shared by several machines matches each of them. An unknown
/// machine simply yields no disks.
#[must_use]
pub fn select_disks(disks: BTreeMap<String, DiskInfo>, selector: &Selector) -> Vec<DiskInfo> {
    match selector {
        Selector::All => disks.into_values().collect(),
        Selector::Key(vm) => disks
            .into_values()
            .filter(|d| d.is_used_by(vm))
            .collect(),
    }
}

/// Fuzzy-rank `keys` against `query`, best first.
#[must_use]
pub fn suggest<'a, I>(query: &str, keys: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let pattern = Pattern::parse(query, CaseMatching::Smart, Normalization::Smart);
    let mut matcher = Matcher::new(nucleo_matcher::Config::DEFAULT);

    let mut scored: Vec<(&str, u32)> = keys
        .into_iter()
        .filter_map(|key| {
            let mut buf = Vec::new();
            let haystack = Utf32Str::new(key, &mut buf);
            pattern.score(haystack, &mut matcher).map(|s| (key, s))
        })
        .collect();

    // Sort by score descending, ties by key for stable output.
    scored.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    scored
        .into_iter()
        .take(MAX_SUGGESTIONS)
        .map(|(k, _)| k.to_owned())
        .collect()
}
