use crate::batch::{BatchExecutorConfig, ParallelBatchExecutor};
use crate::client::core::GraphBatchClient;
use crate::resilience::{global_store, RateLimitStore, RateLimiter, RateLimiterConfig};
use crate::transport::{ChunkTransport, HttpTransport, HttpTransportConfig};
use crate::Result;
use std::sync::Arc;
use std::time::Duration;

/// Builder for creating clients with custom configuration.
///
/// Every knob defaults to its env-derived value, so `GraphBatchClientBuilder::new().build()`
/// is production-ready as long as the `GRAPH_*` variables are set the way you want.
pub struct GraphBatchClientBuilder {
    executor_config: BatchExecutorConfig,
    limiter_config: RateLimiterConfig,
    transport_config: HttpTransportConfig,
    store: Option<Arc<dyn RateLimitStore>>,
    transport: Option<Arc<dyn ChunkTransport>>,
    /// Override base URL (primarily for testing with mock servers)
    base_url_override: Option<String>,
}

impl GraphBatchClientBuilder {
    pub fn new() -> Self {
        Self {
            executor_config: BatchExecutorConfig::from_env(),
            limiter_config: RateLimiterConfig::from_env(),
            transport_config: HttpTransportConfig::from_env(),
            store: None,
            transport: None,
            base_url_override: None,
        }
    }

    pub fn executor_config(mut self, config: BatchExecutorConfig) -> Self {
        self.executor_config = config;
        self
    }

    /// Operations per wire call.
    pub fn max_batch_set_size(mut self, n: usize) -> Self {
        self.executor_config.max_batch_set_size = n;
        self
    }

    /// Chunk dispatches in flight at once.
    pub fn max_concurrency(mut self, n: usize) -> Self {
        self.executor_config.max_concurrency = n;
        self
    }

    pub fn rate_limit(mut self, config: RateLimiterConfig) -> Self {
        self.limiter_config = config;
        self
    }

    /// Turn off request budgeting entirely.
    pub fn without_rate_limit(mut self) -> Self {
        self.limiter_config = RateLimiterConfig::disabled();
        self
    }

    /// Counter store for the rate limiter. Defaults to the process-wide store.
    pub fn rate_limit_store(mut self, store: Arc<dyn RateLimitStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Replace the HTTP transport (custom clients, test doubles).
    pub fn transport(mut self, transport: Arc<dyn ChunkTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.transport_config.timeout = timeout;
        self
    }

    /// Override the API base URL.
    ///
    /// This is primarily for testing with mock servers.
    pub fn base_url_override(mut self, base_url: impl Into<String>) -> Self {
        self.base_url_override = Some(base_url.into());
        self
    }

    pub fn build(self) -> Result<GraphBatchClient> {
        self.executor_config.validate()?;

        let transport: Arc<dyn ChunkTransport> = match self.transport {
            Some(t) => t,
            None => {
                let mut cfg = self.transport_config;
                if let Some(url) = self.base_url_override {
                    cfg.base_url = url;
                }
                Arc::new(HttpTransport::new(cfg)?)
            }
        };

        let store = self.store.unwrap_or_else(global_store);
        let limiter = Arc::new(RateLimiter::with_store(self.limiter_config, store));
        let executor = ParallelBatchExecutor::with_config(self.executor_config, transport, limiter);

        Ok(GraphBatchClient::from_executor(executor))
    }
}

impl Default for GraphBatchClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
