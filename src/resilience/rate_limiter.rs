use super::store::{global_store, now_ms, RateLimitState, RateLimitStore};
use crate::Result;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct RateLimiterConfig {
    /// Requests allowed per window before admissions start cooling down.
    pub count_limit: u64,
    pub window_period: Duration,
    pub cooldown: Duration,
    pub enabled: bool,
}

impl RateLimiterConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self {
            count_limit: 575,
            window_period: Duration::from_secs(10 * 60),
            cooldown: Duration::from_secs(60),
            enabled: true,
        }
    }

    /// A config that admits everything without touching the store.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::new()
        }
    }

    /// Defaults overridden by `GRAPH_RATE_COUNT_LIMIT`, `GRAPH_RATE_WINDOW_SECS`
    /// and `GRAPH_RATE_COOLDOWN_SECS`.
    pub fn from_env() -> Self {
        let mut cfg = Self::new();
        if let Some(v) = env_u64("GRAPH_RATE_COUNT_LIMIT") {
            cfg.count_limit = v;
        }
        if let Some(v) = env_u64("GRAPH_RATE_WINDOW_SECS") {
            cfg.window_period = Duration::from_secs(v);
        }
        if let Some(v) = env_u64("GRAPH_RATE_COOLDOWN_SECS") {
            cfg.cooldown = Duration::from_secs(v);
        }
        cfg
    }

    pub fn with_count_limit(mut self, limit: u64) -> Self {
        self.count_limit = limit;
        self
    }

    pub fn with_window_period(mut self, period: Duration) -> Self {
        self.window_period = period;
        self
    }

    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn env_u64(name: &str) -> Option<u64> {
    std::env::var(name).ok().and_then(|s| s.parse::<u64>().ok())
}

/// Outcome of one admission. Informational only; admission never fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Within budget. `count` is the window count after this admission.
    Admitted { count: u64 },
    /// Over budget; the caller was held for the cooldown before proceeding.
    Throttled { count: u64, waited: Duration },
    /// Limiter disabled, or the store failed and the call was let through.
    Bypassed,
}

impl Admission {
    pub fn was_throttled(&self) -> bool {
        matches!(self, Admission::Throttled { .. })
    }
}

#[derive(Debug, Clone)]
pub struct RateLimiterSnapshot {
    pub count_limit: u64,
    pub count: u64,
    pub remaining: u64,
    /// Time since the window opened, if one exists.
    pub window_elapsed_ms: Option<u64>,
}

/// Fixed window with reset, keyed by credential.
///
/// Approximates a sliding window: bursts straddling a window boundary can
/// briefly exceed `count_limit`. Admissions for the same credential are
/// serialized so two callers never both act on a stale count.
pub struct RateLimiter {
    cfg: RateLimiterConfig,
    store: Arc<dyn RateLimitStore>,
    guards: StdMutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl RateLimiter {
    /// Limiter backed by the process-wide store.
    pub fn new(cfg: RateLimiterConfig) -> Self {
        Self::with_store(cfg, global_store())
    }

    pub fn with_store(cfg: RateLimiterConfig, store: Arc<dyn RateLimitStore>) -> Self {
        Self {
            cfg,
            store,
            guards: StdMutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &RateLimiterConfig {
        &self.cfg
    }

    /// Store key for a credential; raw tokens never reach the store.
    pub fn store_key(credential: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(credential.as_bytes());
        let hash: String = hasher.finalize()[..16]
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect();
        format!("graph-batch:rate:{}", hash)
    }

    fn guard_for(&self, key: &str) -> Arc<Mutex<()>> {
        let mut guards = self.guards.lock().unwrap_or_else(|e| e.into_inner());
        guards
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Drops the guard for `key` once no admission holds or awaits it.
    fn release_guard(&self, key: &str) {
        let mut guards = self.guards.lock().unwrap_or_else(|e| e.into_inner());
        if guards
            .get(key)
            .is_some_and(|guard| Arc::strong_count(guard) == 1)
        {
            guards.remove(key);
        }
    }

    /// Count one request against `credential` (may sleep, never fails).
    pub async fn admit(&self, credential: &str) -> Admission {
        if !self.cfg.enabled {
            return Admission::Bypassed;
        }

        let key = Self::store_key(credential);
        let recorded = {
            let guard = self.guard_for(&key);
            let _held = guard.lock().await;
            self.record(&key).await
        };
        self.release_guard(&key);

        let (prior, count) = match recorded {
            Ok(v) => v,
            Err(e) => {
                warn!(store = self.store.name(), error = %e, "rate limit store failed; admitting");
                return Admission::Bypassed;
            }
        };

        if prior < self.cfg.count_limit {
            return Admission::Admitted { count };
        }

        warn!(
            count,
            limit = self.cfg.count_limit,
            cooldown_ms = self.cfg.cooldown.as_millis() as u64,
            "rate limit budget exhausted; cooling down"
        );
        let start = Instant::now();
        tokio::time::sleep(self.cfg.cooldown).await;
        Admission::Throttled {
            count,
            waited: start.elapsed(),
        }
    }

    /// Returns (count before this request, count after). An expired or
    /// missing window restarts at 1 and reports a prior count of 0.
    async fn record(&self, key: &str) -> Result<(u64, u64)> {
        let now = now_ms();
        let period_ms = self.cfg.window_period.as_millis() as u64;

        match self.store.get(key).await? {
            Some(state) if now.saturating_sub(state.window_start_ms) <= period_ms => {
                let count = self.store.increment_and_get(key).await?;
                Ok((count.saturating_sub(1), count))
            }
            _ => {
                self.store
                    .set(
                        key,
                        RateLimitState {
                            window_start_ms: now,
                            count: 1,
                        },
                    )
                    .await?;
                Ok((0, 1))
            }
        }
    }

    pub async fn snapshot(&self, credential: &str) -> Result<RateLimiterSnapshot> {
        let state = self.store.get(&Self::store_key(credential)).await?;
        let period_ms = self.cfg.window_period.as_millis() as u64;
        let now = now_ms();

        let (count, elapsed) = match state {
            Some(s) if now.saturating_sub(s.window_start_ms) <= period_ms => {
                (s.count, Some(now.saturating_sub(s.window_start_ms)))
            }
            Some(s) => (0, Some(now.saturating_sub(s.window_start_ms))),
            None => (0, None),
        };

        Ok(RateLimiterSnapshot {
            count_limit: self.cfg.count_limit,
            count,
            remaining: self.cfg.count_limit.saturating_sub(count),
            window_elapsed_ms: elapsed,
        })
    }
}
