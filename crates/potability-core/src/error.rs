//! Error types for the potability core
//!
//! Three failure families exist, mirroring the request lifecycle:
//! - [`ValidationError`] - the inbound payload is not a well-formed water sample
//! - [`InferenceError`] - the model could not produce a usable prediction
//! - [`ModelLoadError`] - the model artifact could not be loaded at startup (fatal)

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Field name reported when the payload itself is not a JSON object
pub const BODY_FIELD: &str = "body";

/// What went wrong with a single field
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldIssueKind {
    /// The required key is absent
    Missing,
    /// The value is present but cannot be converted to a float
    WrongType { actual: &'static str },
    /// The value converts to NaN or an infinity
    NotFinite { actual: &'static str },
    /// The payload is not a JSON object at all
    NotAnObject { actual: &'static str },
}

/// A validation failure attached to one field
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldIssue {
    pub field: String,
    #[serde(flatten)]
    pub kind: FieldIssueKind,
}

impl FieldIssue {
    pub fn new(field: impl Into<String>, kind: FieldIssueKind) -> Self {
        Self {
            field: field.into(),
            kind,
        }
    }

    pub fn missing(field: impl Into<String>) -> Self {
        Self::new(field, FieldIssueKind::Missing)
    }

    pub fn not_an_object(actual: &'static str) -> Self {
        Self::new(BODY_FIELD, FieldIssueKind::NotAnObject { actual })
    }

    /// Stable error code for programmatic handling
    pub fn code(&self) -> &'static str {
        match self.kind {
            FieldIssueKind::Missing => "REQUIRED_FIELD_MISSING",
            FieldIssueKind::WrongType { .. } => "TYPE_MISMATCH",
            FieldIssueKind::NotFinite { .. } => "NOT_FINITE",
            FieldIssueKind::NotAnObject { .. } => "NOT_AN_OBJECT",
        }
    }

    /// Human-readable description
    pub fn message(&self) -> String {
        match &self.kind {
            FieldIssueKind::Missing => format!("Required field '{}' is missing", self.field),
            FieldIssueKind::WrongType { .. } => {
                format!("Field '{}' is not a valid number", self.field)
            }
            FieldIssueKind::NotFinite { .. } => format!("Field '{}' must be a finite number", self.field),
            FieldIssueKind::NotAnObject { .. } => "Request body must be a JSON object".to_string(),
        }
    }

    /// Expected type, when the issue is a type problem
    pub fn expected(&self) -> Option<&'static str> {
        match self.kind {
            FieldIssueKind::Missing | FieldIssueKind::WrongType { .. } => Some("number"),
            FieldIssueKind::NotFinite { .. } => Some("finite number"),
            FieldIssueKind::NotAnObject { .. } => Some("object"),
        }
    }

    /// JSON type actually found, if any
    pub fn actual(&self) -> Option<&'static str> {
        match self.kind {
            FieldIssueKind::WrongType { actual }
            | FieldIssueKind::NotFinite { actual }
            | FieldIssueKind::NotAnObject { actual } => Some(actual),
            FieldIssueKind::Missing => None,
        }
    }
}

impl fmt::Display for FieldIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message())
    }
}

/// The payload is not a valid water sample
///
/// Carries every offending field so the caller can report them all at once.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("invalid water sample: {}", join_issues(.issues))]
pub struct ValidationError {
    issues: Vec<FieldIssue>,
}

impl ValidationError {
    pub fn new(issues: Vec<FieldIssue>) -> Self {
        Self { issues }
    }

    pub fn issues(&self) -> &[FieldIssue] {
        &self.issues
    }

    pub fn into_issues(self) -> Vec<FieldIssue> {
        self.issues
    }

    /// Names of the offending fields
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.issues.iter().map(|issue| issue.field.as_str())
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.fields().any(|f| f == field)
    }
}

fn join_issues(issues: &[FieldIssue]) -> String {
    issues
        .iter()
        .map(FieldIssue::message)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Error raised by a model implementation while predicting
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("shape mismatch: expected {expected} features, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    #[error("malformed model structure: {0}")]
    Malformed(String),

    #[error("model error: {0}")]
    Other(String),
}

/// The model failed to produce a usable prediction
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InferenceError {
    #[error("model prediction failed: {0}")]
    Model(#[from] ModelError),

    #[error("model returned no prediction")]
    EmptyOutput,

    #[error("model returned {0} predictions for a single sample")]
    UnexpectedOutputLength(usize),

    #[error("model returned a non-binary output: {0}")]
    NonBinaryOutput(f64),
}

impl InferenceError {
    /// Short reason label, suitable for metrics
    pub fn reason(&self) -> &'static str {
        match self {
            InferenceError::Model(_) => "model_error",
            InferenceError::EmptyOutput => "empty_output",
            InferenceError::UnexpectedOutputLength(_) => "unexpected_output_length",
            InferenceError::NonBinaryOutput(_) => "non_binary_output",
        }
    }
}

/// The model artifact could not be loaded
///
/// Fatal at startup: the service must not serve traffic without a model.
#[derive(Error, Debug)]
pub enum ModelLoadError {
    #[error("failed to read model artifact {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse model artifact: {0}")]
    Parse(String),

    #[error("unsupported model artifact format: {0}")]
    UnsupportedFormat(String),

    #[error("feature columns do not match: expected {expected:?}, found {found:?}")]
    FeatureMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },

    #[error("invalid model artifact: {0}")]
    Invalid(String),
}

impl ModelLoadError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        ModelLoadError::Invalid(msg.into())
    }
}

impl From<serde_json::Error> for ModelLoadError {
    fn from(err: serde_json::Error) -> Self {
        ModelLoadError::Parse(format!("JSON error: {}", err))
    }
}

impl From<serde_yaml::Error> for ModelLoadError {
    fn from(err: serde_yaml::Error) -> Self {
        ModelLoadError::Parse(format!("YAML error: {}", err))
    }
}

/// A raw request body could not be turned into a water sample
#[derive(Error, Debug)]
pub enum PayloadError {
    #[error("request body is not valid JSON: {0}")]
    Syntax(#[source] serde_json::Error),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Either exit of the validate-then-infer pipeline
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Inference(#[from] InferenceError),
}

pub type Result<T, E = PipelineError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_issue_codes() {
        assert_eq!(FieldIssue::missing("ph").code(), "REQUIRED_FIELD_MISSING");
        assert_eq!(
            FieldIssue::new("ph", FieldIssueKind::WrongType { actual: "string" }).code(),
            "TYPE_MISMATCH"
        );
        assert_eq!(
            FieldIssue::new("ph", FieldIssueKind::NotFinite { actual: "number" }).code(),
            "NOT_FINITE"
        );
        assert_eq!(FieldIssue::not_an_object("array").code(), "NOT_AN_OBJECT");
    }

    #[test]
    fn test_field_issue_expected_and_actual() {
        let issue = FieldIssue::new("Sulfate", FieldIssueKind::WrongType { actual: "boolean" });
        assert_eq!(issue.expected(), Some("number"));
        assert_eq!(issue.actual(), Some("boolean"));

        let issue = FieldIssue::missing("Sulfate");
        assert_eq!(issue.actual(), None);

        let issue = FieldIssue::new("ph", FieldIssueKind::NotFinite { actual: "string" });
        assert_eq!(issue.expected(), Some("finite number"));
        assert_eq!(issue.actual(), Some("string"));

        let issue = FieldIssue::not_an_object("array");
        assert_eq!(issue.field, BODY_FIELD);
        assert_eq!(issue.expected(), Some("object"));
    }

    #[test]
    fn test_validation_error_display_lists_fields() {
        let err = ValidationError::new(vec![
            FieldIssue::missing("Turbidity"),
            FieldIssue::new("ph", FieldIssueKind::NotFinite { actual: "string" }),
        ]);
        let text = err.to_string();
        assert!(text.contains("Turbidity"));
        assert!(text.contains("ph"));
        assert!(err.has_field("Turbidity"));
        assert!(!err.has_field("Solids"));
    }

    #[test]
    fn test_field_issue_serializes_kind_inline() {
        let issue = FieldIssue::new("ph", FieldIssueKind::WrongType { actual: "string" });
        let value = serde_json::to_value(&issue).unwrap();
        assert_eq!(value["field"], "ph");
        assert_eq!(value["kind"], "wrong_type");
        assert_eq!(value["actual"], "string");
    }

    #[test]
    fn test_inference_error_reasons() {
        assert_eq!(InferenceError::EmptyOutput.reason(), "empty_output");
        assert_eq!(
            InferenceError::from(ModelError::Other("boom".into())).reason(),
            "model_error"
        );
        assert_eq!(InferenceError::NonBinaryOutput(0.7).reason(), "non_binary_output");
    }

    #[test]
    fn test_model_load_error_display() {
        let err = ModelLoadError::Io {
            path: PathBuf::from("/missing/model.json"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        };
        assert!(err.to_string().contains("/missing/model.json"));

        let err = ModelLoadError::invalid("no trees");
        assert_eq!(err.to_string(), "invalid model artifact: no trees");
    }
}
