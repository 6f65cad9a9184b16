/// Validate a field map against a [`RuleSet`].
use std::collections::BTreeMap;

use super::errors::ValidationError;
use super::rules::{RuleSet, RuleSpec};

/// Field name -> value in string form, in stable order.
pub type FieldMap = BTreeMap<String, String>;

/// Checks field maps against a rule set.
///
/// With `strict` set, any input field without a rule is rejected.
#[derive(Debug, Clone)]
pub struct Validator {
    rules: RuleSet,
    strict: bool,
}

impl Validator {
    #[must_use]
    pub fn new(rules: RuleSet, strict: bool) -> Self {
        Self { rules, strict }
    }

    /// Compile a static table and wrap it.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidRule` if the table is malformed.
    pub fn from_specs(specs: &[RuleSpec], strict: bool) -> Result<Self, ValidationError> {
        Ok(Self::new(RuleSet::from_specs(specs)?, strict))
    }

    /// Validate `data`.
    ///
    /// Mandatory fields are checked first, then unknown fields (strict only),
    /// then every ruled field is evaluated. Pattern failures are collected
    /// across all fields and reported together.
    ///
    /// # Errors
    ///
    /// - `ValidationError::MissingMandatoryField`
    /// - `ValidationError::UnknownField`
    /// - `ValidationError::PatternMismatch`
    pub fn validate(&self, data: &FieldMap) -> Result<(), ValidationError> {
        let missing: Vec<String> = self
            .rules
            .mandatory()
            .iter()
            .filter(|m| !data.contains_key(*m))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(ValidationError::MissingMandatoryField { fields: missing });
        }

        if self.strict {
            let unknown: Vec<String> = data
                .keys()
                .filter(|k| self.rules.get(k).is_none())
                .cloned()
                .collect();
            if !unknown.is_empty() {
                return Err(ValidationError::UnknownField { fields: unknown });
            }
        }

        let failed: Vec<String> = data
            .iter()
            .filter_map(|(field, value)| {
                let rule = self.rules.get(field)?;
                if rule.matches(value) {
                    None
                } else {
                    tracing::debug!(field = %field, value = %value, "field failed validation");
                    Some(field.clone())
                }
            })
            .collect();

        if failed.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::PatternMismatch { fields: failed })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &[RuleSpec] = &[
        RuleSpec::any("alfan", &["([a-zA-Z0-9]+)"]).mandatory(),
        RuleSpec::any("alfa1", &["([a-zA-Z0-9]+)"]).mandatory(),
        RuleSpec::any("num1", &["([0-9]+)"]),
        RuleSpec::any("bool1", &["true", "false"]),
        RuleSpec::any("bool2", &["true", "false"]),
    ];

    fn fields(pairs: &[(&str, &str)]) -> FieldMap {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn test_minimal_valid_strict() {
        let v = Validator::from_specs(TABLE, true).unwrap();
        assert!(v.validate(&fields(&[("alfan", "abc123"), ("alfa1", "123")])).is_ok());
    }

    #[test]
    fn test_full_valid_strict_and_lenient() {
        let data = fields(&[
            ("alfan", "abc123"),
            ("alfa1", "123"),
            ("num1", 123.to_string().as_str()),
            ("bool1", "true"),
            ("bool2", true.to_string().as_str()),
        ]);
        assert!(Validator::from_specs(TABLE, true).unwrap().validate(&data).is_ok());
        assert!(Validator::from_specs(TABLE, false).unwrap().validate(&data).is_ok());
    }

    #[test]
    fn test_missing_mandatory() {
        let v = Validator::from_specs(TABLE, false).unwrap();
        let err = v.validate(&FieldMap::new()).unwrap_err();
        match err {
            ValidationError::MissingMandatoryField { fields } => {
                assert_eq!(fields, vec!["alfa1".to_owned(), "alfan".to_owned()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_strict_rejects_unknown_field() {
        let data = fields(&[("alfan", "a"), ("alfa1", "b"), ("extra", "x")]);
        let strict = Validator::from_specs(TABLE, true).unwrap();
        assert!(matches!(
            strict.validate(&data),
            Err(ValidationError::UnknownField { fields }) if fields == ["extra"]
        ));

        let lenient = Validator::from_specs(TABLE, false).unwrap();
        assert!(lenient.validate(&data).is_ok());
    }

    #[test]
    fn test_mismatches_are_aggregated() {
        let data = fields(&[
            ("alfan", "abc"),
            ("alfa1", "123"),
            ("bool1", "maybe"),
            ("num1", "x1"),
        ]);
        let v = Validator::from_specs(TABLE, false).unwrap();
        match v.validate(&data).unwrap_err() {
            ValidationError::PatternMismatch { fields } => {
                assert_eq!(fields, vec!["bool1".to_owned(), "num1".to_owned()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_prefix_match_is_preserved() {
        // Unanchored tail: "12abc" passes "[0-9]+" because only the start is anchored.
        let v = Validator::from_specs(&[RuleSpec::any("n", &["[0-9]+"])], true).unwrap();
        assert!(v.validate(&fields(&[("n", "12abc")])).is_ok());
        assert!(v.validate(&fields(&[("n", "abc12")])).is_err());
    }

    #[test]
    fn test_all_mode() {
        let table = [RuleSpec::all("f", &["[a-z]", "ab"])];
        let v = Validator::from_specs(&table, true).unwrap();
        assert!(v.validate(&fields(&[("f", "abc")])).is_ok());
        assert!(matches!(
            v.validate(&fields(&[("f", "bc")])),
            Err(ValidationError::PatternMismatch { .. })
        ));
    }

    #[test]
    fn test_validation_has_no_side_effects() {
        let v = Validator::from_specs(TABLE, true).unwrap();
        let data = fields(&[("alfan", "abc123"), ("alfa1", "123")]);
        let before = data.clone();
        v.validate(&data).unwrap();
        v.validate(&data).unwrap();
        assert_eq!(data, before);
    }
}
