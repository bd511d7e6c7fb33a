//! 传输层模块：将一个分块作为单次批量请求发送。
//!
//! # Transport Module
//!
//! A [`ChunkTransport`] executes one chunk of operations as a single
//! wire-level batch call. The executor only relies on its ordering contract:
//! the returned entries line up positionally with the operations sent.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`ChunkTransport`] | Seam used by the executor for one wire call |
//! | [`HttpTransport`] | reqwest implementation speaking the `batch` form protocol |
//! | [`TransportError`] | Whole-chunk delivery failure |

mod http;

pub use http::{HttpTransport, HttpTransportConfig};

use crate::batch::{BatchOperation, HttpOptions};
use crate::types::RawResult;
use async_trait::async_trait;

/// Raw answer to one chunk: `None` when the server sent no body at all,
/// otherwise one entry per operation (an entry itself may be `null`).
pub type ChunkResponse = Option<Vec<Option<RawResult>>>;

#[async_trait]
pub trait ChunkTransport: Send + Sync {
    /// Sends `operations` as one batch call authenticated with `credential`.
    ///
    /// Entries of the returned response must follow the order of `operations`.
    async fn dispatch(
        &self,
        credential: &str,
        operations: &[BatchOperation],
        options: &HttpOptions,
    ) -> std::result::Result<ChunkResponse, TransportError>;

    fn name(&self) -> &'static str;
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected HTTP status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed batch response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Transport error: {0}")]
    Other(String),
}
