//! In-process chunk transport with scripted per-path behavior

use async_trait::async_trait;
use graph_batch_rust::batch::{BatchOperation, HttpOptions};
use graph_batch_rust::transport::{ChunkResponse, ChunkTransport, TransportError};
use graph_batch_rust::types::RawResult;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Answers every call with `{"path": <path>}` unless its path says otherwise:
///
/// - `error/...`   → that entry is a 400 with an error envelope
/// - `null/...`    → that entry is `null`
/// - `fail-chunk`  → the whole dispatch fails
/// - `empty-chunk` → the whole dispatch returns no body
/// - `panic-chunk` → the dispatch panics
pub struct ScriptedTransport {
    delay: Duration,
    /// Later chunks answer sooner, so completion order is reversed.
    reverse_finish: bool,
    active: AtomicUsize,
    peak: AtomicUsize,
    calls: Mutex<Vec<Vec<String>>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self {
            delay: Duration::ZERO,
            reverse_finish: false,
            active: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_reverse_finish(mut self) -> Self {
        self.reverse_finish = true;
        self
    }

    pub fn dispatch_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn chunk_sizes(&self) -> Vec<usize> {
        self.calls.lock().unwrap().iter().map(Vec::len).collect()
    }

    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    fn sleep_for(&self, operations: &[BatchOperation]) -> Duration {
        if !self.reverse_finish {
            return self.delay;
        }
        // obj/<n>: the larger n, the shorter the wait.
        let n = operations
            .first()
            .and_then(|op| op.path().rsplit('/').next())
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(0);
        self.delay + Duration::from_millis(200u64.saturating_sub(n / 2))
    }
}

struct ActiveGuard<'a>(&'a AtomicUsize);

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl ChunkTransport for ScriptedTransport {
    async fn dispatch(
        &self,
        _credential: &str,
        operations: &[BatchOperation],
        _options: &HttpOptions,
    ) -> Result<ChunkResponse, TransportError> {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        let _guard = ActiveGuard(&self.active);
        self.peak.fetch_max(now, Ordering::SeqCst);

        let paths: Vec<String> = operations.iter().map(|op| op.path().to_string()).collect();
        self.calls.lock().unwrap().push(paths.clone());

        let wait = self.sleep_for(operations);
        if !wait.is_zero() {
            tokio::time::sleep(wait).await;
        }

        if paths.iter().any(|p| p == "panic-chunk") {
            panic!("scripted transport panic");
        }
        if paths.iter().any(|p| p == "fail-chunk") {
            return Err(TransportError::Other("connection reset".into()));
        }
        if paths.iter().any(|p| p == "empty-chunk") {
            return Ok(None);
        }

        let entries = paths
            .iter()
            .map(|p| {
                if p.starts_with("error/") {
                    Some(RawResult::new(
                        400,
                        r#"{"error":{"message":"Unsupported get request.","type":"GraphMethodException","code":100}}"#,
                    ))
                } else if p.starts_with("null/") {
                    None
                } else {
                    Some(RawResult::new(200, serde_json::json!({ "path": p }).to_string()))
                }
            })
            .collect();
        Ok(Some(entries))
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}
