//! Maps raw chunk responses back onto their operations.

use super::operation::{BatchOperation, HttpComponent};
use crate::error::{CallError, GraphApiError};
use crate::types::{CallResult, CallValue, GraphPage, RawResult};
use tracing::warn;

/// Turns one chunk's raw response into per-call results.
///
/// Never fails as a whole: every problem becomes a [`CallError`] in the slot
/// of the call it belongs to.
pub struct ResultAssembler;

impl ResultAssembler {
    /// `response` is `None` when the server sent no body for the chunk.
    pub fn assemble(
        operations: &[BatchOperation],
        response: Option<Vec<Option<RawResult>>>,
    ) -> Vec<CallResult> {
        let Some(entries) = response else {
            return Self::fail_all(operations, CallError::EmptyUpstreamResponse);
        };

        if entries.len() > operations.len() {
            warn!(
                operations = operations.len(),
                entries = entries.len(),
                "batch response has more entries than operations; extras ignored"
            );
        }

        let mut entries = entries.into_iter();
        operations
            .iter()
            .map(|op| match entries.next() {
                Some(raw) => Self::resolve(op, raw),
                None => Err(CallError::MissingResult),
            })
            .collect()
    }

    /// Same error for every operation of a chunk. Callbacks are not run.
    pub fn fail_all(operations: &[BatchOperation], error: CallError) -> Vec<CallResult> {
        operations.iter().map(|_| Err(error.clone())).collect()
    }

    fn resolve(op: &BatchOperation, raw: Option<RawResult>) -> CallResult {
        let result = match raw {
            None => Ok(CallValue::Empty),
            Some(raw) => Self::decode(op.http_options().http_component, raw),
        };
        match op.post_process() {
            Some(f) => f(result),
            None => result,
        }
    }

    fn decode(component: HttpComponent, raw: RawResult) -> CallResult {
        if let Some(err) = GraphApiError::check(raw.code, raw.body_str()) {
            return Err(CallError::Http(err));
        }

        match component {
            HttpComponent::Status => Ok(CallValue::Status(raw.code)),
            HttpComponent::Headers => Ok(CallValue::Headers(raw.header_map())),
            HttpComponent::Body => {
                let body = decode_body(raw.body_str())?;
                Ok(GraphPage::evaluate(body))
            }
        }
    }
}

/// Bodies may be any JSON text, including bare scalars; blank means `null`.
fn decode_body(text: &str) -> Result<serde_json::Value, CallError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(serde_json::Value::Null);
    }
    serde_json::from_str(text).map_err(|e| CallError::Decode {
        message: e.to_string(),
    })
}
