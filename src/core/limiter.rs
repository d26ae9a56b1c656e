//! Fixed-window rate limiting over the document store.
//!
//! A limiter owns a set of windows (minute/hour/day style) that are ANDed
//! together: a request is admitted only if every window has room. Windows are
//! checked shortest first and the first rejection short-circuits, so a
//! rejected request increments nothing at all. Counters are plain JSON
//! documents; read-modify-write runs without cross-process locking, so counts
//! are approximate under concurrent admits.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};

use super::store::{DocumentStore, StoreResult};

/// One window in a limiter: at most `max_requests` per `window`.
#[derive(Debug, Clone)]
pub struct WindowLimit {
    pub label: String,
    pub max_requests: u32,
    pub window: Duration,
}

impl WindowLimit {
    pub fn new(label: impl Into<String>, max_requests: u32, window: Duration) -> Self {
        Self {
            label: label.into(),
            max_requests,
            window,
        }
    }

    pub fn per_minute(max_requests: u32) -> Self {
        Self::new("minute", max_requests, Duration::from_secs(60))
    }

    pub fn per_hour(max_requests: u32) -> Self {
        Self::new("hour", max_requests, Duration::from_secs(60 * 60))
    }

    pub fn per_day(max_requests: u32) -> Self {
        Self::new("day", max_requests, Duration::from_secs(24 * 60 * 60))
    }
}

/// Outcome of an admission check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Admission {
    pub allowed: bool,
    /// How long until the rejecting window resets. `None` when allowed.
    pub retry_after: Option<Duration>,
}

impl Admission {
    fn granted() -> Self {
        Self {
            allowed: true,
            retry_after: None,
        }
    }

    fn rejected(retry_after: Duration) -> Self {
        Self {
            allowed: false,
            retry_after: Some(retry_after),
        }
    }
}

/// Persisted per-subject, per-window counter.
#[derive(Debug, Default, Serialize, Deserialize)]
struct WindowCounter {
    count: u32,
    window_start_ms: u64,
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_millis() as u64)
}

/// Multi-window fixed-window rate limiter.
///
/// `scope` keeps independent limiters (answers vs. speech) from sharing
/// counters in the same store.
pub struct FixedWindowLimiter {
    scope: String,
    limits: Vec<WindowLimit>,
    store: Arc<dyn DocumentStore>,
}

impl FixedWindowLimiter {
    pub fn new(
        scope: impl Into<String>,
        mut limits: Vec<WindowLimit>,
        store: Arc<dyn DocumentStore>,
    ) -> Self {
        // Shortest window first: the cheap rejection comes before any
        // longer-horizon counter is even read.
        limits.sort_by_key(|l| l.window);
        Self {
            scope: scope.into(),
            limits,
            store,
        }
    }

    fn counter_key(&self, subject: &str, label: &str) -> String {
        format!("ratelimit:{}:{}:{}", self.scope, subject, label)
    }

    /// Checks whether `subject` may make one more request.
    ///
    /// All windows must pass; counters are incremented only after the full
    /// pass, so a rejection leaves every window untouched.
    pub async fn admit(&self, subject: &str) -> StoreResult<Admission> {
        let now = now_ms();
        let mut passed: Vec<(String, WindowCounter)> = Vec::with_capacity(self.limits.len());

        for limit in &self.limits {
            let key = self.counter_key(subject, &limit.label);
            let mut counter = match self.store.get(&key).await? {
                Some(raw) => serde_json::from_slice(&raw).unwrap_or_else(|e| {
                    warn!("Discarding unreadable counter {}: {}", key, e);
                    WindowCounter::default()
                }),
                None => WindowCounter::default(),
            };

            let window_ms = limit.window.as_millis() as u64;
            if now.saturating_sub(counter.window_start_ms) >= window_ms {
                counter = WindowCounter {
                    count: 0,
                    window_start_ms: now,
                };
            }

            if counter.count >= limit.max_requests {
                let resets_in = (counter.window_start_ms + window_ms).saturating_sub(now);
                debug!(
                    "Admission rejected for {} ({}:{}) - resets in {}ms",
                    subject, self.scope, limit.label, resets_in
                );
                return Ok(Admission::rejected(Duration::from_millis(resets_in)));
            }

            passed.push((key, counter));
        }

        for (key, mut counter) in passed {
            counter.count += 1;
            let raw = serde_json::to_vec(&counter)?;
            self.store.put(&key, Bytes::from(raw)).await?;
        }

        Ok(Admission::granted())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::store::MemoryDocumentStore;

    async fn counter_count(store: &MemoryDocumentStore, key: &str) -> u32 {
        let raw = store.get(key).await.unwrap().expect("counter should exist");
        let counter: WindowCounter = serde_json::from_slice(&raw).unwrap();
        counter.count
    }

    #[tokio::test]
    async fn test_allows_up_to_max_then_rejects() {
        let store = Arc::new(MemoryDocumentStore::new());
        let limiter =
            FixedWindowLimiter::new("speech", vec![WindowLimit::per_minute(3)], store);

        for _ in 0..3 {
            assert!(limiter.admit("session-1").await.unwrap().allowed);
        }

        let rejected = limiter.admit("session-1").await.unwrap();
        assert!(!rejected.allowed);
        let retry_after = rejected.retry_after.unwrap();
        assert!(retry_after <= Duration::from_secs(60));
        assert!(retry_after > Duration::ZERO);
    }

    #[tokio::test]
    async fn test_window_elapse_resets_counter() {
        let store = Arc::new(MemoryDocumentStore::new());
        let limiter = FixedWindowLimiter::new(
            "speech",
            vec![WindowLimit::new("blink", 1, Duration::from_millis(50))],
            store,
        );

        assert!(limiter.admit("session-1").await.unwrap().allowed);
        assert!(!limiter.admit("session-1").await.unwrap().allowed);

        tokio::time::sleep(Duration::from_millis(60)).await;

        assert!(limiter.admit("session-1").await.unwrap().allowed);
    }

    #[tokio::test]
    async fn test_rejection_increments_nothing() {
        let store = Arc::new(MemoryDocumentStore::new());
        let limiter = FixedWindowLimiter::new(
            "answers",
            vec![
                WindowLimit::new("hour", 1, Duration::from_secs(60 * 60)),
                WindowLimit::new("minute", 5, Duration::from_secs(60)),
            ],
            store.clone(),
        );

        assert!(limiter.admit("session-1").await.unwrap().allowed);

        // Second call passes the minute window but the hour window is full.
        // The minute counter must stay where it was.
        assert!(!limiter.admit("session-1").await.unwrap().allowed);
        assert_eq!(
            counter_count(&store, "ratelimit:answers:session-1:minute").await,
            1
        );
        assert_eq!(
            counter_count(&store, "ratelimit:answers:session-1:hour").await,
            1
        );
    }

    #[tokio::test]
    async fn test_shortest_window_rejects_first() {
        let store = Arc::new(MemoryDocumentStore::new());
        // Constructed longest-first; the limiter must still evaluate the
        // minute window before the day window.
        let limiter = FixedWindowLimiter::new(
            "answers",
            vec![
                WindowLimit::per_day(100),
                WindowLimit::per_minute(1),
            ],
            store,
        );

        assert!(limiter.admit("session-1").await.unwrap().allowed);

        let rejected = limiter.admit("session-1").await.unwrap();
        assert!(!rejected.allowed);
        // A day-window rejection would report hours; the minute window caps it.
        assert!(rejected.retry_after.unwrap() <= Duration::from_secs(60));
    }

    #[tokio::test]
    async fn test_subjects_are_independent() {
        let store = Arc::new(MemoryDocumentStore::new());
        let limiter =
            FixedWindowLimiter::new("speech", vec![WindowLimit::per_minute(1)], store);

        assert!(limiter.admit("session-a").await.unwrap().allowed);
        assert!(!limiter.admit("session-a").await.unwrap().allowed);
        assert!(limiter.admit("session-b").await.unwrap().allowed);
    }

    #[tokio::test]
    async fn test_counters_persist_across_limiter_instances() {
        let store = Arc::new(MemoryDocumentStore::new());

        {
            let limiter = FixedWindowLimiter::new(
                "speech",
                vec![WindowLimit::per_minute(2)],
                store.clone(),
            );
            assert!(limiter.admit("session-1").await.unwrap().allowed);
            assert!(limiter.admit("session-1").await.unwrap().allowed);
        }

        let fresh =
            FixedWindowLimiter::new("speech", vec![WindowLimit::per_minute(2)], store);
        assert!(!fresh.admit("session-1").await.unwrap().allowed);
    }

    #[tokio::test]
    async fn test_unreadable_counter_is_discarded() {
        let store = Arc::new(MemoryDocumentStore::new());
        store
            .put(
                "ratelimit:speech:session-1:minute",
                Bytes::from_static(b"not json"),
            )
            .await
            .unwrap();

        let limiter =
            FixedWindowLimiter::new("speech", vec![WindowLimit::per_minute(1)], store);
        assert!(limiter.admit("session-1").await.unwrap().allowed);
    }

    #[tokio::test]
    async fn test_no_windows_always_admits() {
        let store = Arc::new(MemoryDocumentStore::new());
        let limiter = FixedWindowLimiter::new("speech", vec![], store);
        assert_eq!(
            limiter.admit("session-1").await.unwrap(),
            Admission::granted()
        );
    }
}
