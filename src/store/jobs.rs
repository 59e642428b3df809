//! In-memory job cache with snapshot reconciliation.
//!
//! [`JobStore`] holds the client's view of the backend queue: a confirmed
//! layer fed by polled snapshots, plus at most one pending optimistic
//! mutation per job. Views subscribe through a watch channel and never
//! mutate the cache directly; reconciliation anomalies go out on a
//! broadcast channel.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::{Notify, broadcast, watch};

use crate::api::{ApiError, Job, JobStatus, QueueApi};
use crate::store::transitions::is_valid_transition;

/// Mutations a user can request on an existing job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobAction {
    Retry,
    Delete,
}

impl fmt::Display for JobAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobAction::Retry => write!(f, "retry"),
            JobAction::Delete => write!(f, "delete"),
        }
    }
}

/// Kinds of optimistic state tracked against a cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    Retry,
    Delete,
    Create,
}

impl From<JobAction> for MutationKind {
    fn from(action: JobAction) -> Self {
        match action {
            JobAction::Retry => MutationKind::Retry,
            JobAction::Delete => MutationKind::Delete,
        }
    }
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MutationKind::Retry => write!(f, "retry"),
            MutationKind::Delete => write!(f, "delete"),
            MutationKind::Create => write!(f, "create"),
        }
    }
}

/// Reconciliation anomalies, broadcast to observers and logged.
///
/// Anomalies are events, not errors: the cache self-heals on the next
/// authoritative snapshot.
#[derive(Debug, Clone, PartialEq)]
pub enum Anomaly {
    /// A snapshot implied a status change that is not a legal edge.
    InvalidTransition {
        id: String,
        from: JobStatus,
        to: JobStatus,
    },
    /// A pending mutation stayed contradicted by the backend past the stale
    /// threshold and was dropped in favor of the server state.
    StalePendingDiscarded { id: String, kind: MutationKind },
}

impl fmt::Display for Anomaly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Anomaly::InvalidTransition { id, from, to } => {
                write!(f, "job {id}: illegal status change {from} -> {to} ignored")
            }
            Anomaly::StalePendingDiscarded { id, kind } => {
                write!(f, "job {id}: stale pending {kind} dropped in favor of server state")
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("job not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Api(#[from] ApiError),
}

#[derive(Debug, Clone)]
struct PendingMutation {
    kind: MutationKind,
    applied_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    confirmed: Job,
    pending: Option<PendingMutation>,
}

/// Normalized cache of job records, the only shared mutable state of the
/// client. Mutated exclusively through its own operations.
pub struct JobStore {
    entries: RwLock<HashMap<String, CacheEntry>>,
    /// How long a contradicted pending mutation survives before the
    /// authoritative snapshot wins. Defaults to one polling interval.
    stale_after: Duration,
    jobs_tx: watch::Sender<Vec<Job>>,
    anomaly_tx: broadcast::Sender<Anomaly>,
    pending_resolved: Notify,
}

impl JobStore {
    pub fn new(stale_after: Duration) -> Self {
        let (jobs_tx, _) = watch::channel(Vec::new());
        let (anomaly_tx, _) = broadcast::channel(32);
        Self {
            entries: RwLock::new(HashMap::new()),
            stale_after,
            jobs_tx,
            anomaly_tx,
            pending_resolved: Notify::new(),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, CacheEntry>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, CacheEntry>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current view of the queue: confirmed state with optimistic deletes
    /// hidden, newest first.
    pub fn jobs(&self) -> Vec<Job> {
        let entries = self.read();
        let mut jobs: Vec<Job> = entries
            .values()
            .filter(|e| !matches!(&e.pending, Some(p) if p.kind == MutationKind::Delete))
            .map(|e| e.confirmed.clone())
            .collect();
        jobs.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then(a.id.cmp(&b.id)));
        jobs
    }

    /// Single job by id; `None` when unknown or optimistically deleted.
    pub fn get(&self, id: &str) -> Option<Job> {
        let entries = self.read();
        let entry = entries.get(id)?;
        if matches!(&entry.pending, Some(p) if p.kind == MutationKind::Delete) {
            return None;
        }
        Some(entry.confirmed.clone())
    }

    /// Unresolved optimistic mutation on a job, if any.
    pub fn pending_on(&self, id: &str) -> Option<MutationKind> {
        let entries = self.read();
        entries.get(id)?.pending.as_ref().map(|p| p.kind)
    }

    /// Watch channel carrying the current job list; fires on every commit.
    pub fn subscribe(&self) -> watch::Receiver<Vec<Job>> {
        self.jobs_tx.subscribe()
    }

    /// Broadcast channel carrying reconciliation anomalies.
    pub fn anomalies(&self) -> broadcast::Receiver<Anomaly> {
        self.anomaly_tx.subscribe()
    }

    /// Merge a polled snapshot into the cache.
    ///
    /// A strictly newer `updated_at` replaces the confirmed state
    /// unconditionally. An equal version with a different status is an
    /// inferred transition and must follow the legal edge set. An older
    /// version is ignored, which makes the merge safe under out-of-order
    /// poll responses and idempotent under repeats.
    pub fn reconcile(&self, snapshot: Vec<Job>) {
        let now = Utc::now();
        let mut anomalies = Vec::new();
        let mut resolved_any = false;
        {
            let mut entries = self.write();
            let mut seen: HashSet<String> = HashSet::with_capacity(snapshot.len());
            for incoming in snapshot {
                seen.insert(incoming.id.clone());
                let entry = match entries.entry(incoming.id.clone()) {
                    Entry::Vacant(slot) => {
                        slot.insert(CacheEntry {
                            confirmed: incoming,
                            pending: None,
                        });
                        continue;
                    }
                    Entry::Occupied(slot) => slot.into_mut(),
                };

                if incoming.updated_at > entry.confirmed.updated_at {
                    entry.confirmed = incoming;
                } else if incoming.updated_at == entry.confirmed.updated_at
                    && incoming.status != entry.confirmed.status
                {
                    if is_valid_transition(entry.confirmed.status, incoming.status) {
                        entry.confirmed = incoming;
                    } else {
                        anomalies.push(Anomaly::InvalidTransition {
                            id: entry.confirmed.id.clone(),
                            from: entry.confirmed.status,
                            to: incoming.status,
                        });
                    }
                }

                if let Some(pending) = &entry.pending {
                    let confirmed_by_server = match pending.kind {
                        // the backend re-queued the job
                        MutationKind::Retry => entry.confirmed.status != JobStatus::Failed,
                        // presence in the snapshot is the confirmation
                        MutationKind::Create => true,
                        // still present: contradicted until it disappears
                        MutationKind::Delete => false,
                    };
                    if confirmed_by_server {
                        entry.pending = None;
                        resolved_any = true;
                    } else if self.is_stale(pending.applied_at, now) {
                        anomalies.push(Anomaly::StalePendingDiscarded {
                            id: entry.confirmed.id.clone(),
                            kind: pending.kind,
                        });
                        entry.pending = None;
                        resolved_any = true;
                    }
                }
            }

            // Entries the snapshot no longer contains.
            entries.retain(|id, entry| {
                if seen.contains(id) {
                    return true;
                }
                match &entry.pending {
                    Some(p) if p.kind == MutationKind::Create => {
                        if self.is_stale(p.applied_at, now) {
                            anomalies.push(Anomaly::StalePendingDiscarded {
                                id: id.clone(),
                                kind: MutationKind::Create,
                            });
                            resolved_any = true;
                            false
                        } else {
                            true
                        }
                    }
                    Some(p) if p.kind == MutationKind::Delete => {
                        // absence confirms the delete
                        resolved_any = true;
                        false
                    }
                    _ => false,
                }
            });
        }

        for anomaly in anomalies {
            self.emit(anomaly);
        }
        if resolved_any {
            self.pending_resolved.notify_waiters();
        }
        self.publish();
    }

    /// Insert a job ahead of its first appearance in a snapshot. Used after
    /// a successful creation call so the new job shows before the next poll
    /// confirms it.
    pub fn insert_optimistic(&self, job: Job) {
        {
            let mut entries = self.write();
            entries.insert(
                job.id.clone(),
                CacheEntry {
                    confirmed: job,
                    pending: Some(PendingMutation {
                        kind: MutationKind::Create,
                        applied_at: Utc::now(),
                    }),
                },
            );
        }
        self.publish();
    }

    /// Apply a user mutation optimistically, then confirm it against the
    /// backend.
    ///
    /// An optimistic delete hides the job from views immediately; a retry
    /// keeps the confirmed status (there is no legal inferred edge back
    /// into QUEUED) and is tracked as a pending marker until the backend
    /// confirms. On transport failure the entry rolls back to its last
    /// confirmed state and the error is surfaced to the caller.
    ///
    /// Mutations on the same job are serialized: a call made while another
    /// mutation on the id is outstanding waits for that one to resolve.
    pub async fn mutate(
        &self,
        api: &dyn QueueApi,
        id: &str,
        action: JobAction,
    ) -> Result<(), StoreError> {
        self.wait_for_pending(id).await?;

        {
            let mut entries = self.write();
            let entry = entries
                .get_mut(id)
                .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
            entry.pending = Some(PendingMutation {
                kind: action.into(),
                applied_at: Utc::now(),
            });
        }
        self.publish();

        let result = match action {
            JobAction::Retry => api.retry_video(id).await.map(Some),
            JobAction::Delete => api.delete_video(id).await.map(|_| None),
        };

        match result {
            Ok(updated) => {
                {
                    let mut entries = self.write();
                    match action {
                        JobAction::Delete => {
                            entries.remove(id);
                        }
                        JobAction::Retry => {
                            if let Some(entry) = entries.get_mut(id) {
                                if let Some(job) = updated
                                    && job.updated_at >= entry.confirmed.updated_at
                                {
                                    // the response is authoritative
                                    entry.confirmed = job;
                                }
                                entry.pending = None;
                            }
                        }
                    }
                }
                self.pending_resolved.notify_waiters();
                self.publish();
                Ok(())
            }
            Err(e) => {
                {
                    let mut entries = self.write();
                    if let Some(entry) = entries.get_mut(id) {
                        entry.pending = None;
                    }
                }
                self.pending_resolved.notify_waiters();
                self.publish();
                log::warn!("mutation {action} on job {id} failed, rolled back: {e}");
                Err(e.into())
            }
        }
    }

    async fn wait_for_pending(&self, id: &str) -> Result<(), StoreError> {
        loop {
            let notified = self.pending_resolved.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            {
                let entries = self.read();
                match entries.get(id) {
                    None => return Err(StoreError::NotFound(id.to_string())),
                    Some(entry) if entry.pending.is_none() => return Ok(()),
                    Some(_) => {}
                }
            }
            notified.await;
        }
    }

    fn is_stale(&self, applied_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        (now - applied_at)
            .to_std()
            .is_ok_and(|age| age > self.stale_after)
    }

    fn emit(&self, anomaly: Anomaly) {
        log::warn!("reconciliation anomaly: {anomaly}");
        let _ = self.anomaly_tx.send(anomaly);
    }

    fn publish(&self) {
        self.jobs_tx.send_replace(self.jobs());
    }
}
