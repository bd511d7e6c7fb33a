//! Client interface for batched object-graph calls.
//!
//! Developer-friendly goal: keep the public surface small and predictable.
//! Implementation details are split into submodules under `src/client/`.

pub mod builder;
pub mod core;

pub use builder::GraphBatchClientBuilder;
pub use core::{BatchApi, GraphBatchClient};
