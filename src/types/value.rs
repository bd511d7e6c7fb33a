//! Call values and raw batch entries.

use super::page::GraphPage;
use crate::error::CallError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// What one call resolves to. Errors are values too, see [`CallError`].
pub type CallResult = std::result::Result<CallValue, CallError>;

/// Decoded facet of a single call's response.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CallValue {
    /// Decoded JSON body (objects, arrays, scalars).
    Body(serde_json::Value),
    /// Body that looked like a pageable collection.
    Page(GraphPage),
    /// HTTP status only (`HttpComponent::Status`).
    Status(u16),
    /// Response headers only (`HttpComponent::Headers`).
    Headers(BTreeMap<String, String>),
    /// The server sent `null` in place of this call's entry.
    Empty,
}

impl CallValue {
    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            CallValue::Body(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_page(&self) -> Option<&GraphPage> {
        match self {
            CallValue::Page(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_status(&self) -> Option<u16> {
        match self {
            CallValue::Status(s) => Some(*s),
            _ => None,
        }
    }

    pub fn as_headers(&self) -> Option<&BTreeMap<String, String>> {
        match self {
            CallValue::Headers(h) => Some(h),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CallValue::Empty)
    }
}

/// Header pair as the batch endpoint reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawHeader {
    pub name: String,
    pub value: String,
}

/// One positional entry of a batch response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawResult {
    pub code: u16,
    /// JSON- or scalar-encoded body text.
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub headers: Vec<RawHeader>,
}

impl RawResult {
    pub fn new(code: u16, body: impl Into<String>) -> Self {
        Self {
            code,
            body: Some(body.into()),
            headers: Vec::new(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push(RawHeader {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    pub fn body_str(&self) -> &str {
        self.body.as_deref().unwrap_or("")
    }

    /// Later duplicates overwrite earlier ones.
    pub fn header_map(&self) -> BTreeMap<String, String> {
        self.headers
            .iter()
            .map(|h| (h.name.clone(), h.value.clone()))
            .collect()
    }
}
