//! Batch executor.

use super::assembler::ResultAssembler;
use super::operation::{BatchOperation, HttpOptions};
use super::queue::BatchQueue;
use super::splitter::{chunk_count, split, Chunk};
use crate::error::{CallError, ErrorContext};
use crate::resilience::RateLimiter;
use crate::transport::ChunkTransport;
use crate::types::CallResult;
use crate::{Error, Result};
use async_recursion::async_recursion;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Operations per wire call.
pub const MAX_BATCH_SET_SIZE: usize = 10;
/// Chunk dispatches in flight at once.
pub const MAX_CONCURRENCY: usize = 10;

#[derive(Debug, Clone)]
pub struct BatchExecutorConfig {
    pub max_batch_set_size: usize,
    pub max_concurrency: usize,
}

impl Default for BatchExecutorConfig {
    fn default() -> Self {
        Self {
            max_batch_set_size: MAX_BATCH_SET_SIZE,
            max_concurrency: MAX_CONCURRENCY,
        }
    }
}

impl BatchExecutorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overridden by `GRAPH_BATCH_MAX_SET_SIZE` and `GRAPH_BATCH_MAX_CONCURRENCY`.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Some(v) = std::env::var("GRAPH_BATCH_MAX_SET_SIZE")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
        {
            cfg.max_batch_set_size = v;
        }
        if let Some(v) = std::env::var("GRAPH_BATCH_MAX_CONCURRENCY")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
        {
            cfg.max_concurrency = v;
        }
        cfg
    }

    pub fn with_max_batch_set_size(mut self, s: usize) -> Self {
        self.max_batch_set_size = s;
        self
    }

    pub fn with_max_concurrency(mut self, c: usize) -> Self {
        self.max_concurrency = c;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_batch_set_size == 0 {
            return Err(Error::configuration_with_context(
                "max_batch_set_size must be at least 1",
                ErrorContext::new()
                    .with_field_path("executor.max_batch_set_size")
                    .with_source("batch_executor"),
            ));
        }
        if self.max_concurrency == 0 {
            return Err(Error::configuration_with_context(
                "max_concurrency must be at least 1",
                ErrorContext::new()
                    .with_field_path("executor.max_concurrency")
                    .with_source("batch_executor"),
            ));
        }
        Ok(())
    }
}

/// Runs a queue of any length as bounded wire calls.
///
/// Queues that fit one wire call go out directly. Larger queues are split
/// into chunks, and chunks are dispatched in waves of at most
/// `max_concurrency` tasks; each wave is joined before the next starts.
/// Results land at their original queue position whatever order tasks finish in.
///
/// Cloning is cheap and shares the transport and limiter.
#[derive(Clone)]
pub struct ParallelBatchExecutor {
    config: BatchExecutorConfig,
    transport: Arc<dyn ChunkTransport>,
    limiter: Arc<RateLimiter>,
}

impl ParallelBatchExecutor {
    pub fn new(transport: Arc<dyn ChunkTransport>, limiter: Arc<RateLimiter>) -> Self {
        Self::with_config(BatchExecutorConfig::default(), transport, limiter)
    }

    pub fn with_config(
        config: BatchExecutorConfig,
        transport: Arc<dyn ChunkTransport>,
        limiter: Arc<RateLimiter>,
    ) -> Self {
        Self {
            config,
            transport,
            limiter,
        }
    }

    pub fn config(&self) -> &BatchExecutorConfig {
        &self.config
    }

    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    /// Drains `queue` and executes it. See [`Self::execute_operations`].
    pub async fn execute(
        &self,
        credential: &str,
        queue: &BatchQueue,
        options: &HttpOptions,
    ) -> Result<Vec<CallResult>> {
        // Checked before draining so a bad config leaves the queue intact.
        self.config.validate()?;
        Ok(self.execute_validated(credential, queue.drain(), options).await)
    }

    /// Executes `operations`, returning exactly one result per operation in
    /// the same order.
    ///
    /// Queues that need more than one chunk are charged once per chunk,
    /// before anything is sent; a queue that fits one wire call goes out
    /// directly and is not charged. Only invalid configuration fails the
    /// call; every per-call or per-chunk problem is a [`CallError`] in the
    /// output.
    pub async fn execute_operations(
        &self,
        credential: &str,
        operations: Vec<BatchOperation>,
        options: &HttpOptions,
    ) -> Result<Vec<CallResult>> {
        self.config.validate()?;
        Ok(self.execute_validated(credential, operations, options).await)
    }

    async fn execute_validated(
        &self,
        credential: &str,
        operations: Vec<BatchOperation>,
        options: &HttpOptions,
    ) -> Vec<CallResult> {
        let total = operations.len();
        if total == 0 {
            return Vec::new();
        }

        let start = Instant::now();
        let chunks = chunk_count(total, self.config.max_batch_set_size);
        let mut throttled = 0usize;
        if chunks > 1 {
            for _ in 0..chunks {
                if self.limiter.admit(credential).await.was_throttled() {
                    throttled += 1;
                }
            }
        }

        let results = self
            .run(credential.to_string(), operations, options.clone())
            .await;

        let failures = results.iter().filter(|r| r.is_err()).count();
        info!(
            operations = total,
            chunks,
            throttled,
            failures,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "batch executed"
        );
        results
    }

    /// One orchestration context. Chunk tasks re-enter here with a queue that
    /// fits a single wire call, so they take the direct path and are never
    /// charged again.
    #[async_recursion]
    async fn run(
        &self,
        credential: String,
        operations: Vec<BatchOperation>,
        options: HttpOptions,
    ) -> Vec<CallResult> {
        let total = operations.len();
        if total <= self.config.max_batch_set_size {
            return self.dispatch_chunk(&credential, operations, &options).await;
        }

        let mut full: Vec<Option<CallResult>> = (0..total).map(|_| None).collect();
        let mut remaining = split(operations, self.config.max_batch_set_size).into_iter();
        let mut wave_no = 0usize;

        loop {
            let wave: Vec<Chunk> = remaining
                .by_ref()
                .take(self.config.max_concurrency)
                .collect();
            if wave.is_empty() {
                break;
            }
            debug!(wave = wave_no, chunks = wave.len(), "dispatching wave");

            let mut owners = Vec::with_capacity(wave.len());
            let mut handles = Vec::with_capacity(wave.len());
            for chunk in wave {
                owners.push(chunk.indices);
                let executor = self.clone();
                let credential = credential.clone();
                let options = options.clone();
                let operations = chunk.operations;
                handles.push(tokio::spawn(async move {
                    executor.run(credential, operations, options).await
                }));
            }

            // Wave barrier: every task of this wave finishes before the next wave starts.
            let joined = futures::future::join_all(handles).await;

            for (indices, outcome) in owners.into_iter().zip(joined) {
                let results = match outcome {
                    Ok(results) => results,
                    Err(e) => {
                        warn!(wave = wave_no, error = %e, "chunk task aborted; isolating its calls");
                        vec![
                            Err(CallError::Transport {
                                message: format!("chunk task aborted: {}", e),
                            });
                            indices.len()
                        ]
                    }
                };
                place(&mut full, &indices, results);
            }
            wave_no += 1;
        }

        full.into_iter()
            .map(|slot| slot.unwrap_or(Err(CallError::MissingResult)))
            .collect()
    }

    async fn dispatch_chunk(
        &self,
        credential: &str,
        operations: Vec<BatchOperation>,
        options: &HttpOptions,
    ) -> Vec<CallResult> {
        if operations.is_empty() {
            return Vec::new();
        }
        debug!(
            operations = operations.len(),
            transport = self.transport.name(),
            "dispatching chunk"
        );
        match self.transport.dispatch(credential, &operations, options).await {
            Ok(None) => {
                warn!(operations = operations.len(), "upstream returned an empty body");
                ResultAssembler::assemble(&operations, None)
            }
            Ok(response) => ResultAssembler::assemble(&operations, response),
            Err(e) => {
                warn!(operations = operations.len(), error = %e, "chunk dispatch failed; isolating its calls");
                ResultAssembler::fail_all(
                    &operations,
                    CallError::Transport {
                        message: e.to_string(),
                    },
                )
            }
        }
    }
}

/// Writes a chunk's results into the slots it owns; each slot is written once.
fn place(full: &mut [Option<CallResult>], indices: &[usize], results: Vec<CallResult>) {
    let mut results = results.into_iter();
    for &index in indices {
        let result = results.next().unwrap_or(Err(CallError::MissingResult));
        match full.get_mut(index) {
            Some(slot) if slot.is_none() => *slot = Some(result),
            Some(_) => warn!(index, "result slot already filled; keeping first write"),
            None => warn!(index, "result index out of range"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resilience::{MemoryRateLimitStore, RateLimiterConfig};
    use crate::transport::{ChunkResponse, TransportError};
    use async_trait::async_trait;

    struct Unreachable;

    #[async_trait]
    impl ChunkTransport for Unreachable {
        async fn dispatch(
            &self,
            _: &str,
            _: &[BatchOperation],
            _: &HttpOptions,
        ) -> std::result::Result<ChunkResponse, TransportError> {
            Err(TransportError::Other("unexpected dispatch".into()))
        }
        fn name(&self) -> &'static str {
            "unreachable"
        }
    }

    fn executor(config: BatchExecutorConfig) -> ParallelBatchExecutor {
        let limiter = Arc::new(RateLimiter::with_store(
            RateLimiterConfig::new(),
            Arc::new(MemoryRateLimitStore::new()),
        ));
        ParallelBatchExecutor::with_config(config, Arc::new(Unreachable), limiter)
    }

    #[tokio::test]
    async fn test_execute_operations_rejects_invalid_config() {
        let executor = executor(BatchExecutorConfig::new().with_max_concurrency(0));
        let ops = vec![BatchOperation::new("me", crate::batch::HttpVerb::Get, "t")];
        let err = executor
            .execute_operations("t", ops, &HttpOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
    }

    #[tokio::test]
    async fn test_execute_rejects_invalid_config_before_draining() {
        let executor = executor(BatchExecutorConfig::new().with_max_batch_set_size(0));
        let queue = BatchQueue::new();
        queue.enqueue(BatchOperation::new("me", crate::batch::HttpVerb::Get, "t"));
        assert!(executor
            .execute("t", &queue, &HttpOptions::default())
            .await
            .is_err());
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_batch_executor_config_defaults() {
        let config = BatchExecutorConfig::default();
        assert_eq!(config.max_batch_set_size, 10);
        assert_eq!(config.max_concurrency, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_batch_executor_config_builder() {
        let config = BatchExecutorConfig::new()
            .with_max_batch_set_size(5)
            .with_max_concurrency(2);
        assert_eq!(config.max_batch_set_size, 5);
        assert_eq!(config.max_concurrency, 2);
    }

    #[test]
    fn test_batch_executor_config_rejects_zero() {
        let err = BatchExecutorConfig::new()
            .with_max_batch_set_size(0)
            .validate()
            .unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
        assert!(BatchExecutorConfig::new()
            .with_max_concurrency(0)
            .validate()
            .is_err());
    }

    #[test]
    fn test_place_fills_owned_slots_once() {
        let mut full: Vec<Option<CallResult>> = vec![None, None, None];
        place(
            &mut full,
            &[0, 2],
            vec![Ok(crate::types::CallValue::Status(200))],
        );
        assert_eq!(full[0], Some(Ok(crate::types::CallValue::Status(200))));
        assert_eq!(full[1], None);
        assert_eq!(full[2], Some(Err(CallError::MissingResult)));

        place(&mut full, &[0], vec![Err(CallError::EmptyUpstreamResponse)]);
        assert_eq!(full[0], Some(Ok(crate::types::CallValue::Status(200))));
    }
}
