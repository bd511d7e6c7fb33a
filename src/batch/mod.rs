//! 请求批处理模块：将任意数量的逻辑调用拆分为受限的批量请求并并行执行。
//!
//! # Request Batching Module
//!
//! This module turns an arbitrarily long, ordered list of logical calls into
//! wire-level batch requests that respect the remote API's per-request
//! operation cap, its per-credential request budget, and a bound on parallel
//! in-flight requests.
//!
//! ## Overview
//!
//! The pipeline for one `execute`:
//! - drain the [`BatchQueue`] (later enqueues start a fresh batch)
//! - charge the rate budget once per chunk, up front (single-chunk queues go out uncharged)
//! - split into contiguous chunks of `max_batch_set_size`
//! - dispatch chunks in waves of `max_concurrency` parallel tasks
//! - map every raw entry back to its original position with [`ResultAssembler`]
//!
//! ## Key Components
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`BatchOperation`] | One queued call: verb, path, args, options, post-process callback |
//! | [`BatchQueue`] | Ordered queue of pending operations for one context |
//! | [`split`] | Contiguous partition into index-tagged [`Chunk`]s |
//! | [`ParallelBatchExecutor`] | Rate-limits, splits, dispatches in waves, reassembles |
//! | [`ResultAssembler`] | Per-call error classification, facet selection, callbacks |
//!
//! ## Example
//!
//! ```rust
//! use graph_batch_rust::batch::{split, BatchOperation, BatchQueue, HttpVerb};
//!
//! let queue = BatchQueue::new();
//! for i in 0..25 {
//!     queue.enqueue(BatchOperation::new(format!("{}", i), HttpVerb::Get, "token"));
//! }
//!
//! let chunks = split(queue.drain(), 10);
//! assert_eq!(chunks.len(), 3);
//! assert_eq!(chunks[2].indices, vec![20, 21, 22, 23, 24]);
//! assert!(queue.is_empty());
//! ```
//!
//! ## Failure isolation
//!
//! Nothing that happens to a single call or a single chunk escapes `execute`
//! as an error. Remote errors, empty upstream bodies and transport failures
//! all become [`CallError`](crate::error::CallError) values at the affected
//! positions.

mod assembler;
mod executor;
mod operation;
mod queue;
mod splitter;

pub use assembler::ResultAssembler;
pub use executor::{
    BatchExecutorConfig, ParallelBatchExecutor, MAX_BATCH_SET_SIZE, MAX_CONCURRENCY,
};
pub use operation::{Args, BatchOperation, HttpComponent, HttpOptions, HttpVerb, PostProcess};
pub use queue::BatchQueue;
pub use splitter::{chunk_count, split, Chunk};
