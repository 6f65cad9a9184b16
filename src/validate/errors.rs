/// Errors from the field validation layer.
use thiserror::Error;

/// Errors raised while building rule tables or validating field maps.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A rule table entry is malformed (bad regex, no patterns, duplicate field).
    #[error("Invalid rule for field '{field}': {reason}")]
    InvalidRule {
        /// Field the rule was declared for.
        field: String,
        /// What is wrong with it.
        reason: String,
    },

    /// One or more mandatory fields are absent from the input.
    #[error("Missing mandatory field(s): {}", fields.join(", "))]
    MissingMandatoryField {
        /// Every mandatory field that was not supplied.
        fields: Vec<String>,
    },

    /// Strict validation found input fields with no rule.
    #[error("Unknown field(s) not declared in the rule table: {}", fields.join(", "))]
    UnknownField {
        /// Every undeclared input field.
        fields: Vec<String>,
    },

    /// At least one field value failed its patterns.
    #[error("Validation failed for field(s): {}", fields.join(", "))]
    PatternMismatch {
        /// Every field whose value did not satisfy its rule.
        fields: Vec<String>,
    },
}
