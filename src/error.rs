use crate::transport::TransportError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured error context for better error handling and debugging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorContext {
    /// Field path or configuration key that caused the error (e.g., "executor.max_batch_set_size")
    pub field_path: Option<String>,
    /// Additional context about the error (e.g., expected type, actual value)
    pub details: Option<String>,
    /// Source of the error (e.g., "batch_executor", "rate_limiter")
    pub source: Option<String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self {
            field_path: None,
            details: None,
            source: None,
        }
    }

    pub fn with_field_path(mut self, path: impl Into<String>) -> Self {
        self.field_path = Some(path.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Batch-wide error type.
///
/// Per-call failures never show up here; they are [`CallError`] values placed
/// in the result sequence. This enum is reserved for conditions that make the
/// whole orchestration meaningless (bad configuration, a broken store, a
/// transport that cannot even be constructed).
#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {message}{}", format_context(.context))]
    Configuration {
        message: String,
        context: ErrorContext,
    },

    #[error("Validation error: {message}{}", format_context(.context))]
    Validation {
        message: String,
        context: ErrorContext,
    },

    #[error("Runtime error: {message}{}", format_context(.context))]
    Runtime {
        message: String,
        context: ErrorContext,
    },

    #[error("Network transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

// Helper function to format error context for display
fn format_context(ctx: &ErrorContext) -> String {
    let mut parts = Vec::new();
    if let Some(ref field) = ctx.field_path {
        parts.push(format!("field: {}", field));
    }
    if let Some(ref details) = ctx.details {
        parts.push(format!("details: {}", details));
    }
    if let Some(ref source) = ctx.source {
        parts.push(format!("source: {}", source));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" ({})", parts.join(", "))
    }
}

impl Error {
    pub fn runtime(msg: impl Into<String>) -> Self {
        Error::Runtime {
            message: msg.into(),
            context: ErrorContext::new(),
        }
    }

    /// Create a new runtime error with structured context
    pub fn runtime_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Runtime {
            message: msg.into(),
            context,
        }
    }

    /// Create a new validation error with structured context
    pub fn validation_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Validation {
            message: msg.into(),
            context,
        }
    }

    /// Create a new configuration error with structured context
    pub fn configuration_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Configuration {
            message: msg.into(),
            context,
        }
    }

    /// Extract error context if available
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            Error::Configuration { context, .. }
            | Error::Validation { context, .. }
            | Error::Runtime { context, .. } => Some(context),
            _ => None,
        }
    }
}

/// Coarse classification of a remote per-call error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    /// Token invalid, expired or lacking permission (`OAuthException`).
    Authentication,
    /// Any other 4xx answer.
    Client,
    /// 5xx answer.
    Server,
}

/// A remote error decoded from one call's entry in a batch response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphApiError {
    pub status: u16,
    pub class: ErrorClass,
    pub message: String,
    pub error_type: Option<String>,
    pub code: Option<i64>,
    pub subcode: Option<i64>,
    pub trace_id: Option<String>,
    /// Raw body as returned by the server, kept for diagnostics.
    pub raw_body: String,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorEnvelope {
    error: Option<ErrorPayload>,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorPayload {
    message: Option<String>,
    #[serde(rename = "type")]
    error_type: Option<String>,
    code: Option<i64>,
    error_subcode: Option<i64>,
    fbtrace_id: Option<String>,
}

impl GraphApiError {
    /// Returns `Some` when `status` is outside the 2xx range.
    ///
    /// The body is parsed best-effort; an unparseable body still yields an
    /// error whose message is the raw text.
    pub fn check(status: u16, body: &str) -> Option<Self> {
        if (200..300).contains(&status) {
            return None;
        }

        let payload = serde_json::from_str::<ErrorEnvelope>(body)
            .ok()
            .and_then(|e| e.error)
            .unwrap_or_default();

        let class = if status >= 500 {
            ErrorClass::Server
        } else if payload.error_type.as_deref() == Some("OAuthException") {
            ErrorClass::Authentication
        } else {
            ErrorClass::Client
        };

        let message = payload
            .message
            .clone()
            .unwrap_or_else(|| if body.is_empty() { format!("HTTP {}", status) } else { body.to_string() });

        Some(Self {
            status,
            class,
            message,
            error_type: payload.error_type,
            code: payload.code,
            subcode: payload.error_subcode,
            trace_id: payload.fbtrace_id,
            raw_body: body.to_string(),
        })
    }

    pub fn is_retryable(&self) -> bool {
        self.class == ErrorClass::Server
    }
}

impl std::fmt::Display for GraphApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.error_type {
            Some(t) => write!(f, "HTTP {} ({}): {}", self.status, t, self.message),
            None => write!(f, "HTTP {}: {}", self.status, self.message),
        }
    }
}

/// Error value for a single call inside a batch.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CallError {
    /// The server returned no body for the whole chunk this call was part of.
    #[error("upstream returned an empty body for the batch")]
    EmptyUpstreamResponse,

    #[error("remote call failed: {0}")]
    Http(GraphApiError),

    /// The chunk carrying this call could not be delivered at all.
    #[error("chunk dispatch failed: {message}")]
    Transport { message: String },

    #[error("could not decode call body: {message}")]
    Decode { message: String },

    /// The transport answered with fewer entries than operations sent.
    #[error("no result returned for this call")]
    MissingResult,
}

impl CallError {
    pub fn http_status(&self) -> Option<u16> {
        match self {
            CallError::Http(e) => Some(e.status),
            _ => None,
        }
    }
}
