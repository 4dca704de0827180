//! HTTP handlers for the potability service
//!
//! - `routes`: router, shared state, endpoint handlers and [`ApiError`]
//!
//! Successful prediction responses are a bare JSON string
//! (`"Water is Consumable"` / `"Water is Not Consumable"`). Every error uses
//! the [`ApiResponse`] envelope with an [`ErrorInfo`] payload.

pub mod routes;

pub use routes::{create_router, ApiError, HandlerState};

use potability_core::{FieldIssue, FEATURE_COLUMNS};
use serde::{Deserialize, Serialize};

/// Fixed greeting served at `GET /`
pub const WELCOME_MESSAGE: &str = "Welcome to Water Potability Prediction API";

/// Standard API response wrapper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// Whether the operation was successful
    pub success: bool,
    /// Response data (present on success)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Error information (present on failure)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
    pub metadata: ResponseMetadata,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T, request_id: String) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            metadata: ResponseMetadata::new(request_id),
        }
    }

    pub fn error(error: ErrorInfo, request_id: String) -> ApiResponse<()> {
        ApiResponse {
            success: false,
            data: None,
            error: Some(error),
            metadata: ResponseMetadata::new(request_id),
        }
    }
}

/// Error information for API responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorInfo {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

/// Response metadata for tracing and debugging
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseMetadata {
    pub request_id: String,
    /// ISO 8601
    pub timestamp: String,
    pub version: String,
}

impl ResponseMetadata {
    pub fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: chrono::Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// One offending field in a rejected prediction request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldErrorDetail {
    /// Wire name of the field, or `body` when the payload is not an object
    pub field: String,
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual: Option<String>,
}

impl From<&FieldIssue> for FieldErrorDetail {
    fn from(issue: &FieldIssue) -> Self {
        Self {
            field: issue.field.clone(),
            code: issue.code().to_string(),
            message: issue.message(),
            expected: issue.expected().map(str::to_string),
            actual: issue.actual().map(str::to_string),
        }
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_kind: Option<String>,
    pub version: String,
    pub uptime_seconds: u64,
    pub timestamp: String,
}

/// Description of one input field, as listed by `GET /schema`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaField {
    pub name: String,
    pub field_type: String,
    pub required: bool,
    /// Column position in the model input row
    pub position: usize,
}

/// The request schema in model column order
pub fn sample_schema() -> Vec<SchemaField> {
    FEATURE_COLUMNS
        .iter()
        .enumerate()
        .map(|(position, name)| SchemaField {
            name: name.to_string(),
            field_type: "number".to_string(),
            required: true,
            position,
        })
        .collect()
}
