//! # graph-batch-rust
//!
//! 面向对象图 API 的批量请求编排器：分块、并行波次与按凭证的请求预算。
//!
//! Client-side batch orchestration for object-graph APIs that cap how many
//! logical calls fit in one wire request and how many wire requests a
//! credential may issue per time window.
//!
//! ## Overview
//!
//! Callers queue any number of logical calls (verb, path, args, options and an
//! optional post-processing callback). On `execute`, the queue is drained,
//! a multi-chunk batch is charged against the request budget up front, the
//! calls are split into wire-sized chunks, and chunks are sent in parallel
//! waves. A batch that fits one wire call goes out directly. Results come back
//! in enqueue order, one per call, with failures as typed values.
//!
//! ## Key Features
//!
//! - **Bounded chunks**: at most `MAX_BATCH_SET_SIZE` (10) calls per wire request
//! - **Bounded parallelism**: at most `MAX_CONCURRENCY` (10) chunks in flight
//! - **Request budget**: per-credential fixed-window limiter that blocks, never fails
//! - **Order preservation**: index-tagged placement, independent of completion order
//! - **Failure isolation**: per-call and per-chunk errors stay in their slots
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use graph_batch_rust::{GraphBatchClient, HttpOptions};
//!
//! #[tokio::main]
//! async fn main() -> graph_batch_rust::Result<()> {
//!     let client = GraphBatchClient::builder()
//!         .base_url_override("https://graph.example.com")
//!         .build()?;
//!
//!     let api = client.batch_api("access-token");
//!     for id in ["4", "5", "6"] {
//!         api.get_object(id, Default::default());
//!     }
//!
//!     for result in api.execute(&HttpOptions::default()).await? {
//!         match result {
//!             Ok(value) => println!("{:?}", value),
//!             Err(e) => eprintln!("call failed: {}", e),
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`batch`] | Queue, splitter, parallel executor, result assembly |
//! | [`client`] | Client builder and per-credential batch contexts |
//! | [`resilience`] | Request budget limiter and counter stores |
//! | [`transport`] | Chunk transport seam and the HTTP implementation |
//! | [`types`] | Call values, raw wire entries, pagination |

pub mod batch;
pub mod client;
pub mod resilience;
pub mod transport;
pub mod types;

// Re-export main types for convenience
pub use batch::{BatchOperation, BatchQueue, HttpComponent, HttpOptions, HttpVerb, ParallelBatchExecutor};
pub use client::{BatchApi, GraphBatchClient, GraphBatchClientBuilder};
pub use types::{CallResult, CallValue};

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the library
pub mod error;
pub use error::{CallError, Error, ErrorContext};
