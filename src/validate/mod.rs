/// Declarative field validation: rule tables, match modes, the validator.
pub mod errors;
pub mod rules;
pub mod validator;

pub use errors::ValidationError;
pub use rules::{Anchor, RuleSpec};
pub use validator::{FieldMap, Validator};
