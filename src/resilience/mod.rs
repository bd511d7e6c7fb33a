//! 弹性模式模块：按凭证计数的请求预算与限流。
//!
//! # Resilience Primitives Module
//!
//! Request budgeting for the batch executor. The remote API allows a fixed
//! number of wire calls per credential in a rolling window; the limiter here
//! keeps callers inside that budget by holding them back, never by failing
//! them.
//!
//! ## Key Components
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`rate_limiter`] | Fixed-window-with-reset limiter keyed by credential |
//! | [`store`] | Pluggable counter storage (`get`, `set`, `increment_and_get`) |
//!
//! ## Rate Limiter
//!
//! Each admission bumps the credential's window count. Once the count before
//! the bump has reached `count_limit` inside the window, the caller sleeps for
//! `cooldown` and then proceeds. A window older than `window_period` starts
//! over.
//!
//! ```rust
//! use graph_batch_rust::resilience::rate_limiter::{RateLimiter, RateLimiterConfig};
//! use graph_batch_rust::resilience::store::MemoryRateLimitStore;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn demo() {
//! let config = RateLimiterConfig::new()
//!     .with_count_limit(100)
//!     .with_window_period(Duration::from_secs(60));
//! let limiter = RateLimiter::with_store(config, Arc::new(MemoryRateLimitStore::new()));
//!
//! // Blocks for the cooldown when the budget is spent
//! let admission = limiter.admit("access-token").await;
//! assert!(!admission.was_throttled());
//! # }
//! ```

pub mod rate_limiter;
pub mod store;

pub use rate_limiter::{Admission, RateLimiter, RateLimiterConfig, RateLimiterSnapshot};
pub use store::{global_store, MemoryRateLimitStore, RateLimitState, RateLimitStore};
