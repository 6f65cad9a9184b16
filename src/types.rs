/// Serializable output types shared by the commands.
///
/// Report records (`VmEntry`, `NetworkInfo`, ...) serialize as they are;
/// the types here cover what is not a parsed report: the outcome of a
/// mutating command and the error envelope.
use serde::{Deserialize, Serialize};

use crate::errors::CtlError;
use crate::exec::{CommandResult, ExecError};
use crate::validate::ValidationError;

/// Outcome of a command that changes VirtualBox state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvocationOutput {
    /// Program and arguments.
    pub command: Vec<String>,
    /// `null` on `--dry-run`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    /// Whether this was a dry-run (nothing was executed).
    pub dry_run: bool,
    /// Stdout lines, e.g. the UUID printed by `createvm`.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub output: Vec<String>,
}

impl InvocationOutput {
    #[must_use]
    pub fn planned(command: Vec<String>) -> Self {
        Self {
            command,
            exit_code: None,
            dry_run: true,
            output: Vec::new(),
        }
    }
}

impl From<CommandResult> for InvocationOutput {
    fn from(result: CommandResult) -> Self {
        Self {
            command: result.argv,
            exit_code: Some(result.exit_code),
            dry_run: false,
            output: result.lines,
        }
    }
}

/// A structured error envelope for JSON error output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorOutput {
    /// Always `false`.
    pub ok: bool,
    /// Error details.
    pub error: ErrorDetail,
}

/// Error detail in the JSON error envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Machine-readable error code (snake_case).
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Offending fields, for validation errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<String>>,
    /// Closest existing names, for not-found errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candidates: Option<Vec<String>>,
    /// Tool stderr, for tool failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stderr: Option<String>,
}

impl ErrorOutput {
    /// Construct from a `CtlError`.
    #[must_use]
    pub fn from_error(err: &CtlError) -> Self {
        let mut detail = ErrorDetail {
            code: String::new(),
            message: err.to_string(),
            fields: None,
            candidates: None,
            stderr: None,
        };
        detail.code = match err {
            CtlError::Validation(v) => match v {
                ValidationError::InvalidRule { field, .. } => {
                    detail.fields = Some(vec![field.clone()]);
                    "invalid_rule"
                }
                ValidationError::MissingMandatoryField { fields } => {
                    detail.fields = Some(fields.clone());
                    "missing_field"
                }
                ValidationError::UnknownField { fields } => {
                    detail.fields = Some(fields.clone());
                    "unknown_field"
                }
                ValidationError::PatternMismatch { fields } => {
                    detail.fields = Some(fields.clone());
                    "validation_failed"
                }
            },
            CtlError::Exec(e) => match e {
                ExecError::Spawn { .. } => "tool_not_found",
                ExecError::Io(_) => "io_error",
                ExecError::Timeout { .. } => "tool_timeout",
                ExecError::Failed { stderr, .. } => {
                    if !stderr.is_empty() {
                        detail.stderr = Some(stderr.clone());
                    }
                    "tool_failed"
                }
            },
            CtlError::NotFound { candidates, .. } => {
                if !candidates.is_empty() {
                    detail.candidates = Some(candidates.clone());
                }
                "not_found"
            }
            CtlError::InvalidInput(_) => "invalid_input",
            CtlError::Config(_) => "config_error",
            CtlError::WaitTimeout { .. } => "wait_timeout",
        }
        .to_owned();
        Self {
            ok: false,
            error: detail,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_envelope_for_mismatch() {
        let err = CtlError::from(ValidationError::PatternMismatch {
            fields: vec!["vm.name".to_owned(), "vm.ostype".to_owned()],
        });
        let json = serde_json::to_value(ErrorOutput::from_error(&err)).unwrap();
        assert_eq!(json["ok"], false);
        assert_eq!(json["error"]["code"], "validation_failed");
        assert_eq!(json["error"]["fields"][1], "vm.ostype");
        assert!(json["error"].get("candidates").is_none());
    }

    #[test]
    fn test_error_envelope_for_tool_failure() {
        let err = CtlError::from(ExecError::Failed {
            command: "VBoxManage startvm web".to_owned(),
            code: 1,
            stderr: "VBoxManage: error: Could not find a registered machine named 'web'".to_owned(),
        });
        let out = ErrorOutput::from_error(&err);
        assert_eq!(out.error.code, "tool_failed");
        assert!(out.error.stderr.unwrap().contains("Could not find"));
    }

    #[test]
    fn test_invocation_from_result() {
        let result = CommandResult {
            argv: vec!["VBoxManage".to_owned(), "createvm".to_owned()],
            exit_code: 0,
            lines: vec!["UUID: 1234".to_owned()],
            stderr: String::new(),
        };
        let out = InvocationOutput::from(result);
        assert_eq!(out.exit_code, Some(0));
        assert!(!out.dry_run);
        assert_eq!(out.output, vec!["UUID: 1234"]);
    }
}
