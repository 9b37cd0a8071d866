//! Error handling module for the promotions admin client.
//!
//! Provides the error taxonomy shared by every layer, plus parsing of the
//! error envelope returned by the promotions API.

use serde::Deserialize;
use thiserror::Error;

/// Error codes as constants to avoid stringly-typed errors.
pub mod codes {
    pub const TRANSPORT_ERROR: &str = "TRANSPORT_ERROR";
    pub const UNAUTHORIZED: &str = "UNAUTHORIZED";
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const CONFLICT: &str = "CONFLICT";
    pub const HTTP_ERROR: &str = "HTTP_ERROR";
    pub const DECODE_ERROR: &str = "DECODE_ERROR";
    pub const INVALID_URL: &str = "INVALID_URL";
    pub const ASSET_ERROR: &str = "ASSET_ERROR";
    pub const TASK_ERROR: &str = "TASK_ERROR";
}

/// Longest slice of a raw error body carried into an error message.
const MAX_BODY_EXCERPT: usize = 500;

/// Errors raised while talking to the promotions API.
///
/// `Clone` so a single shared fetch can hand the same failure to every waiter.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// Network failure, timeout or a request that could not be sent.
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    /// Non-2xx response.
    #[error("HTTP {status} from {url}: {message}")]
    Status {
        status: u16,
        url: String,
        code: Option<String>,
        message: String,
    },

    /// 409 response, typically a delete blocked by dependent resources.
    #[error("conflict from {url}: {message}")]
    Conflict { url: String, message: String },

    /// Response body did not match the expected shape.
    #[error("failed to decode response from {url}: {message}")]
    Decode { url: String, message: String },

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error(transparent)]
    Asset(#[from] AssetError),

    /// A spawned fetch or mutation task died before reporting back.
    #[error("background task failed: {0}")]
    Task(String),
}

impl ApiError {
    /// HTTP status carried by this error, if it came from a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Conflict { .. } => Some(409),
            _ => None,
        }
    }

    /// True for the conflict class (dependent resources block the write).
    pub fn is_conflict(&self) -> bool {
        matches!(self, ApiError::Conflict { .. })
    }

    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::Transport { .. } => codes::TRANSPORT_ERROR,
            ApiError::Status { status: 401, .. } | ApiError::Status { status: 403, .. } => {
                codes::UNAUTHORIZED
            }
            ApiError::Status { status: 404, .. } => codes::NOT_FOUND,
            ApiError::Status { .. } => codes::HTTP_ERROR,
            ApiError::Conflict { .. } => codes::CONFLICT,
            ApiError::Decode { .. } => codes::DECODE_ERROR,
            ApiError::InvalidUrl(_) => codes::INVALID_URL,
            ApiError::Asset(_) => codes::ASSET_ERROR,
            ApiError::Task(_) => codes::TASK_ERROR,
        }
    }

    /// Map a reqwest failure to a transport error with a readable cause.
    pub(crate) fn from_reqwest(err: reqwest::Error, url: &str) -> Self {
        let message = if err.is_timeout() {
            "timeout - request took too long".to_string()
        } else if err.is_connect() {
            format!("connection error - {}", err)
        } else if err.is_decode() {
            return ApiError::Decode {
                url: url.to_string(),
                message: err.to_string(),
            };
        } else {
            err.to_string()
        };

        ApiError::Transport {
            url: url.to_string(),
            message,
        }
    }

    /// Build the error for a non-2xx response from its status and raw body.
    pub(crate) fn from_response(status: u16, url: &str, body: &str) -> Self {
        let (code, message) = match serde_json::from_str::<ErrorBody>(body) {
            Ok(ErrorBody::Envelope { error }) => (Some(error.code), error.message),
            Ok(ErrorBody::Message { message }) => (None, message),
            Err(_) if body.trim().is_empty() => (None, format!("empty response (HTTP {})", status)),
            Err(_) => (None, excerpt(body)),
        };

        if status == 409 {
            return ApiError::Conflict {
                url: url.to_string(),
                message,
            };
        }

        ApiError::Status {
            status,
            url: url.to_string(),
            code,
            message,
        }
    }
}

fn excerpt(body: &str) -> String {
    if body.len() <= MAX_BODY_EXCERPT {
        return body.to_string();
    }
    let mut end = MAX_BODY_EXCERPT;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}... (truncated)", &body[..end])
}

/// Error details in the server's response envelope.
#[derive(Debug, Deserialize)]
pub struct ErrorDetails {
    pub code: String,
    pub message: String,
    #[serde(default)]
    pub details: Option<serde_json::Value>,
}

/// Error bodies the API is known to produce.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ErrorBody {
    Envelope { error: ErrorDetails },
    Message { message: String },
}

/// Failure to load a local file selected for upload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssetError {
    #[error("failed to read {path}: {message}")]
    Read { path: String, message: String },

    #[error("unsupported file type for {path}")]
    UnsupportedType { path: String },

    #[error("invalid content type {content_type} for {file_name}")]
    InvalidContentType {
        file_name: String,
        content_type: String,
    },
}

/// Invalid environment configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {message}")]
    Invalid { key: &'static str, message: String },
}

/// A single client-side validation failure, attached to a form field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field} {message}")]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Client-side validation failures, reported per field.
///
/// These are resolved inside the form and never reach the mutation layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
#[error("validation failed{}", summarize(.errors))]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(FieldError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    /// First message recorded for `field`, if any.
    pub fn for_field(&self, field: &str) -> Option<&str> {
        self.errors
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }

    /// `Ok(())` when nothing was recorded.
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

fn summarize(errors: &[FieldError]) -> String {
    if errors.is_empty() {
        return String::new();
    }
    let joined: Vec<String> = errors.iter().map(ToString::to_string).collect();
    format!(": {}", joined.join("; "))
}
