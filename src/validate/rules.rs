/// Rule tables: per-field regex patterns with a match mode and a mandatory flag.
///
/// Tables are written as `&'static [RuleSpec]` next to the command they guard
/// and compiled into a [`RuleSet`] when the command is validated. Compilation
/// is where a malformed table surfaces, before anything touches the tool.
use std::collections::{BTreeMap, BTreeSet};

use regex::Regex;

use super::errors::ValidationError;

/// How the patterns of a rule combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchMode {
    /// At least one pattern must match.
    #[default]
    Any,
    /// Every pattern must match.
    All,
}

/// Where a pattern may match inside the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Anchor {
    /// Only at the start of the value.
    #[default]
    Start,
    /// Anywhere in the value.
    Anywhere,
}

/// A static, uncompiled rule table entry.
#[derive(Debug, Clone, Copy)]
pub struct RuleSpec {
    pub field: &'static str,
    pub patterns: &'static [&'static str],
    pub mode: MatchMode,
    pub anchor: Anchor,
    pub mandatory: bool,
}

impl RuleSpec {
    /// Optional field, any pattern may match.
    #[must_use]
    pub const fn any(field: &'static str, patterns: &'static [&'static str]) -> Self {
        Self {
            field,
            patterns,
            mode: MatchMode::Any,
            anchor: Anchor::Start,
            mandatory: false,
        }
    }

    /// Optional field, every pattern must match.
    #[must_use]
    pub const fn all(field: &'static str, patterns: &'static [&'static str]) -> Self {
        Self {
            field,
            patterns,
            mode: MatchMode::All,
            anchor: Anchor::Start,
            mandatory: false,
        }
    }

    /// Let the patterns match anywhere in the value instead of at its start.
    #[must_use]
    pub const fn anywhere(mut self) -> Self {
        self.anchor = Anchor::Anywhere;
        self
    }

    /// Mark the field as mandatory.
    #[must_use]
    pub const fn mandatory(mut self) -> Self {
        self.mandatory = true;
        self
    }
}

/// A compiled rule for one field.
#[derive(Debug, Clone)]
pub struct ValidationRule {
    patterns: Vec<Regex>,
    mode: MatchMode,
    mandatory: bool,
}

impl ValidationRule {
    /// Compile a rule from raw pattern strings.
    ///
    /// With [`Anchor::Start`] each pattern is anchored at the start of the
    /// value only, so `"on"` accepts `"on"` and `"online"` alike. Patterns that
    /// must cover the whole value carry their own `$`. [`Anchor::Anywhere`]
    /// patterns are searched for across the whole value.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidRule` for an empty pattern list or a
    /// pattern that does not compile.
    pub fn new(
        field: &str,
        patterns: &[&str],
        mode: MatchMode,
        anchor: Anchor,
        mandatory: bool,
    ) -> Result<Self, ValidationError> {
        if patterns.is_empty() {
            return Err(ValidationError::InvalidRule {
                field: field.to_owned(),
                reason: "no patterns given".to_owned(),
            });
        }

        let patterns = patterns
            .iter()
            .map(|p| {
                let source = match anchor {
                    Anchor::Start => format!(r"\A(?:{p})"),
                    Anchor::Anywhere => (*p).to_owned(),
                };
                Regex::new(&source).map_err(|e| ValidationError::InvalidRule {
                    field: field.to_owned(),
                    reason: format!("pattern '{p}': {e}"),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            patterns,
            mode,
            mandatory,
        })
    }

    #[must_use]
    pub fn is_mandatory(&self) -> bool {
        self.mandatory
    }

    /// Whether `value` satisfies this rule under its match mode.
    #[must_use]
    pub fn matches(&self, value: &str) -> bool {
        let mut hits = self.patterns.iter().filter(|rx| rx.is_match(value));
        match self.mode {
            MatchMode::Any => hits.next().is_some(),
            MatchMode::All => hits.count() == self.patterns.len(),
        }
    }
}

/// Field name -> rule, with the mandatory field names precomputed.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: BTreeMap<String, ValidationRule>,
    mandatory: BTreeSet<String>,
}

impl RuleSet {
    /// Build from already compiled rules.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidRule` if a field is declared twice.
    pub fn new<I>(rules: I) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = (String, ValidationRule)>,
    {
        let mut map = BTreeMap::new();
        for (field, rule) in rules {
            if map.contains_key(&field) {
                return Err(ValidationError::InvalidRule {
                    field,
                    reason: "declared more than once".to_owned(),
                });
            }
            map.insert(field, rule);
        }

        let mandatory = map
            .iter()
            .filter(|(_, r)| r.is_mandatory())
            .map(|(f, _)| f.clone())
            .collect();

        Ok(Self {
            rules: map,
            mandatory,
        })
    }

    /// Compile a static rule table.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidRule` for any malformed entry.
    pub fn from_specs(specs: &[RuleSpec]) -> Result<Self, ValidationError> {
        let compiled = specs
            .iter()
            .map(|s| {
                ValidationRule::new(s.field, s.patterns, s.mode, s.anchor, s.mandatory)
                    .map(|r| (s.field.to_owned(), r))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(compiled)
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&ValidationRule> {
        self.rules.get(field)
    }

    /// Names of all mandatory fields, sorted.
    #[must_use]
    pub fn mandatory(&self) -> &BTreeSet<String> {
        &self.mandatory
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_semantics() {
        let rule = ValidationRule::new("f", &["on"], MatchMode::Any, Anchor::Start, false).unwrap();
        assert!(rule.matches("on"));
        assert!(rule.matches("online"));
        assert!(!rule.matches("turn on"));
    }

    #[test]
    fn test_explicit_anchor_forces_full_match() {
        let rule = ValidationRule::new("f", &["on$"], MatchMode::Any, Anchor::Start, false)
            .unwrap();
        assert!(rule.matches("on"));
        assert!(!rule.matches("online"));
    }

    #[test]
    fn test_anywhere_searches_whole_value() {
        let rule = ValidationRule::new("f", &["on"], MatchMode::Any, Anchor::Anywhere, false)
            .unwrap();
        assert!(rule.matches("turn on"));
        assert!(rule.matches("online"));
        assert!(!rule.matches("off"));
    }

    #[test]
    fn test_anywhere_all_mode() {
        let specs = [RuleSpec::all("f", &[r"\.vbox$", "/vms/"]).anywhere()];
        let set = RuleSet::from_specs(&specs).unwrap();
        let rule = set.get("f").unwrap();
        assert!(rule.matches("/home/u/vms/web/web.vbox"));
        assert!(!rule.matches("/home/u/vms/web/web.vdi"));
        assert!(!rule.matches("/home/u/web.vbox"));
    }

    #[test]
    fn test_all_mode_needs_every_pattern() {
        let rule =
            ValidationRule::new("f", &["[a-z]+", "abc"], MatchMode::All, Anchor::Start, false)
                .unwrap();
        assert!(rule.matches("abcdef"));
        assert!(!rule.matches("xyz"));
    }

    #[test]
    fn test_any_mode_needs_one_pattern() {
        let patterns = ["vdi", "vmdk", "vhd"];
        let rule =
            ValidationRule::new("f", &patterns, MatchMode::Any, Anchor::Start, false).unwrap();
        assert!(rule.matches("vmdk"));
        assert!(!rule.matches("qcow2"));
    }

    #[test]
    fn test_bad_regex_is_config_error() {
        let err = ValidationRule::new("f", &["(unclosed"], MatchMode::Any, Anchor::Start, false)
            .unwrap_err();
        assert!(matches!(err, ValidationError::InvalidRule { .. }));
    }

    #[test]
    fn test_empty_pattern_list_is_config_error() {
        let err = ValidationRule::new("f", &[], MatchMode::Any, Anchor::Start, true).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidRule { .. }));
    }

    #[test]
    fn test_duplicate_field_is_config_error() {
        let specs = [RuleSpec::any("a", &["x"]), RuleSpec::any("a", &["y"])];
        let err = RuleSet::from_specs(&specs).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidRule { field, .. } if field == "a"));
    }

    #[test]
    fn test_mandatory_set_is_derived() {
        let specs = [
            RuleSpec::any("a", &["x"]).mandatory(),
            RuleSpec::any("b", &["y"]),
            RuleSpec::all("c", &["z"]).mandatory(),
        ];
        let set = RuleSet::from_specs(&specs).unwrap();
        let names: Vec<&str> = set.mandatory().iter().map(String::as_str).collect();
        assert_eq!(names, vec!["a", "c"]);
    }
}
