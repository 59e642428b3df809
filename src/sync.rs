//! Polling scheduler that keeps the job store fresh.
//!
//! [`PollingSync`] drives [`JobStore::reconcile`] on a fixed interval,
//! doubles the delay on failure up to a ceiling, skips ticks while a
//! refresh is still in flight, and guarantees that no refresh commits
//! after [`stop`](PollingSync::stop).

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use crate::api::QueueApi;
use crate::store::JobStore;

/// Outcome of a single refresh attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Snapshot fetched and reconciled into the store.
    Applied,
    /// Another refresh was already in flight; this one was skipped.
    Skipped,
    /// The scheduler was stopped before the snapshot could be committed.
    Cancelled,
    /// The fetch failed; the next delay doubles.
    Failed,
}

/// State the scheduled loop shares with out-of-band refreshes.
struct Shared {
    api: Arc<dyn QueueApi>,
    store: Arc<JobStore>,
    ceiling_ms: u64,
    base_ms: AtomicU64,
    delay_ms: AtomicU64,
    in_flight: AtomicBool,
}

impl Shared {
    async fn refresh_with(&self, token: &CancellationToken) -> RefreshOutcome {
        if token.is_cancelled() {
            return RefreshOutcome::Cancelled;
        }
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return RefreshOutcome::Skipped;
        }

        let outcome = match self.api.fetch_queue().await {
            Ok(snapshot) => {
                if token.is_cancelled() {
                    RefreshOutcome::Cancelled
                } else {
                    self.store.reconcile(snapshot);
                    self.delay_ms
                        .store(self.base_ms.load(Ordering::Relaxed), Ordering::Relaxed);
                    RefreshOutcome::Applied
                }
            }
            Err(e) => {
                let next =
                    (self.delay_ms.load(Ordering::Relaxed).saturating_mul(2)).min(self.ceiling_ms);
                self.delay_ms.store(next, Ordering::Relaxed);
                if e.is_retryable() {
                    log::warn!("queue refresh failed, next attempt in {next}ms: {e}");
                } else {
                    log::error!("queue refresh failed with a non-retryable error: {e}");
                }
                RefreshOutcome::Failed
            }
        };

        self.in_flight.store(false, Ordering::Release);
        outcome
    }
}

struct Control {
    handle: Option<JoinHandle<()>>,
    token: Option<CancellationToken>,
}

pub struct PollingSync {
    shared: Arc<Shared>,
    control: Mutex<Control>,
}

impl PollingSync {
    pub fn new(api: Arc<dyn QueueApi>, store: Arc<JobStore>, ceiling: Duration) -> Self {
        Self {
            shared: Arc::new(Shared {
                api,
                store,
                ceiling_ms: ceiling.as_millis() as u64,
                base_ms: AtomicU64::new(0),
                delay_ms: AtomicU64::new(0),
                in_flight: AtomicBool::new(false),
            }),
            control: Mutex::new(Control {
                handle: None,
                token: None,
            }),
        }
    }

    /// Begin the repeating refresh loop. Idempotent: calling while the loop
    /// is already running does nothing.
    pub fn start(&self, interval: Duration) {
        let mut control = self.control.lock().unwrap_or_else(PoisonError::into_inner);
        let running = control.handle.as_ref().is_some_and(|h| !h.is_finished())
            && control.token.as_ref().is_some_and(|t| !t.is_cancelled());
        if running {
            return;
        }

        let interval_ms = interval.as_millis() as u64;
        self.shared.base_ms.store(interval_ms, Ordering::Relaxed);
        self.shared.delay_ms.store(interval_ms, Ordering::Relaxed);

        let token = CancellationToken::new();
        control.token = Some(token.clone());
        let shared = Arc::clone(&self.shared);
        control.handle = Some(tokio::spawn(async move {
            loop {
                let delay = Duration::from_millis(shared.delay_ms.load(Ordering::Relaxed));
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = sleep(delay) => {}
                }
                shared.refresh_with(&token).await;
                if token.is_cancelled() {
                    break;
                }
            }
        }));
    }

    /// Cancel the refresh loop. An in-flight refresh finishes its request
    /// but will not commit its snapshot. Idempotent.
    pub fn stop(&self) {
        let control = self.control.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(token) = &control.token {
            token.cancel();
        }
    }

    /// Out-of-band refresh (e.g. right after a user mutation). Leaves the
    /// scheduled timer alone and respects the in-flight dedup rule.
    pub async fn force_refresh(&self) -> RefreshOutcome {
        let token = {
            let control = self.control.lock().unwrap_or_else(PoisonError::into_inner);
            control.token.clone()
        };
        // without start() there is nothing to cancel against
        let token = token.unwrap_or_default();
        self.shared.refresh_with(&token).await
    }

    /// Delay until the next scheduled refresh; grows while the backend is
    /// failing.
    pub fn current_delay(&self) -> Duration {
        Duration::from_millis(self.shared.delay_ms.load(Ordering::Relaxed))
    }
}
