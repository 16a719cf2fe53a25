//! Background schedule for tags opted into recurring re-checks.
//!
//! Two actors touch the queue concurrently: the watch-driven `handle` path
//! (insert-or-replace, one entry per stream) and the timer-driven `run_once`
//! path (snapshot, fetch fresh, decide, maybe import). Removal by a holder of
//! a previously observed version mark goes through compare-and-delete so a
//! concurrent re-enqueue with a newer mark is never destroyed.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Mutex};
use tokio::time::interval;
use tracing::{error, info, warn};

use crate::api::{ImageStream, DOCKER_IMAGE_KIND};
use crate::controller::ImportController;
use crate::store::{ImageStreamStore, StoreError};

/// Stable identity of a queued stream.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StreamKey {
    pub namespace: String,
    pub name: String,
}

impl StreamKey {
    pub fn from_stream(stream: &ImageStream) -> Self {
        Self {
            namespace: stream.namespace.clone(),
            name: stream.name.clone(),
        }
    }
}

impl fmt::Display for StreamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Version marker captured at enqueue time. A removal carries the mark its
/// caller last observed; a mismatch means a newer claim was installed in the
/// meantime and the entry must be preserved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamMark {
    pub uid: String,
    pub resource_version: String,
}

impl StreamMark {
    pub fn from_stream(stream: &ImageStream) -> Self {
        Self {
            uid: stream.uid.clone(),
            resource_version: stream.resource_version.clone(),
        }
    }
}

/// Keyed entry store behind a single lock.
///
/// Exposes only atomic insert-or-replace, snapshot, unconditional eviction
/// and compare-and-delete; iteration that could race with mutation is never
/// handed out.
#[derive(Debug, Default)]
pub struct ImportQueue {
    entries: Mutex<HashMap<StreamKey, StreamMark>>,
}

impl ImportQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the entry for a key. Last write wins.
    pub async fn insert(&self, key: StreamKey, mark: StreamMark) {
        self.entries.lock().await.insert(key, mark);
    }

    /// Drop an entry regardless of its mark. Reserved for terminal states
    /// (the backing stream is gone, or its spec no longer schedules tags).
    pub async fn evict(&self, key: &StreamKey) -> bool {
        self.entries.lock().await.remove(key).is_some()
    }

    /// Compare-and-delete: remove the entry only when its stored mark equals
    /// `expected`. A mismatch or an absent key is a no-op returning false.
    pub async fn remove(&self, key: &StreamKey, expected: &StreamMark) -> bool {
        let mut entries = self.entries.lock().await;
        match entries.get(key) {
            Some(mark) if mark == expected => {
                entries.remove(key);
                true
            }
            _ => false,
        }
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    /// Owned copy of the current entries, safe to iterate while both actors
    /// keep mutating the queue.
    pub async fn snapshot(&self) -> Vec<(StreamKey, StreamMark)> {
        self.entries
            .lock()
            .await
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

/// Recurring importer: keeps one queue entry per stream with scheduled tags
/// and re-runs the import decision for each entry on a fixed interval.
pub struct ScheduledImporter {
    queue: ImportQueue,
    controller: ImportController,
    store: Arc<dyn ImageStreamStore>,
    check_interval: Duration,
    enabled: bool,
}

impl ScheduledImporter {
    pub fn new(enabled: bool, check_interval: Duration, store: Arc<dyn ImageStreamStore>) -> Self {
        Self {
            queue: ImportQueue::new(),
            controller: ImportController::new(store.clone()),
            store,
            check_interval,
            enabled,
        }
    }

    /// Replace the store client, for tests that redirect the next tick.
    pub fn set_store(&mut self, store: Arc<dyn ImageStreamStore>) {
        self.controller = ImportController::new(store.clone());
        self.store = store;
    }

    /// Enqueue or clear the entry for a stream based on its current spec.
    ///
    /// Called once per delivered update/create event. A stream qualifies when
    /// any spec tag is scheduled, points at a DockerImage source and is not
    /// an alias. A stream that no longer qualifies loses its entry here -
    /// entry absence is driven by re-delivered updates, not by an explicit
    /// unenqueue call.
    pub async fn handle(&self, stream: &ImageStream) {
        let key = StreamKey::from_stream(stream);
        if self.enabled && has_scheduled_tags(stream) {
            self.queue.insert(key, StreamMark::from_stream(stream)).await;
        } else {
            self.queue.evict(&key).await;
        }
    }

    /// One pass over the queued entries.
    ///
    /// Works from a snapshot so the queue lock is never held across store
    /// calls. Each entry is independent: a failure is logged and the entry
    /// left queued for the next tick; only a NotFound fetch evicts. A
    /// successful import keeps the entry queued - scheduled imports recur.
    pub async fn run_once(&self) {
        for (key, _mark) in self.queue.snapshot().await {
            match self.store.get_image_stream(&key.namespace, &key.name).await {
                Ok(stream) => {
                    if let Err(e) = self.controller.reconcile(&stream).await {
                        error!("Scheduled import of {} failed: {}", key, e);
                    }
                }
                Err(StoreError::NotFound(_)) => {
                    info!("Stream {} is gone, dropping it from the schedule", key);
                    self.queue.evict(&key).await;
                }
                Err(e) => {
                    warn!("Failed to fetch {}: {}", key, e);
                }
            }
        }
    }

    /// Compare-and-delete an entry using the mark its caller last observed.
    pub async fn remove(&self, key: &StreamKey, expected: &StreamMark) -> bool {
        self.queue.remove(key, expected).await
    }

    pub async fn len(&self) -> usize {
        self.queue.len().await
    }

    pub async fn snapshot(&self) -> Vec<(StreamKey, StreamMark)> {
        self.queue.snapshot().await
    }

    /// Drive `run_once` on the configured interval until the stop channel
    /// yields or closes.
    pub async fn run(&self, mut stop_rx: mpsc::Receiver<()>) {
        let mut ticker = interval(self.check_interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.run_once().await;
                }
                _ = stop_rx.recv() => {
                    info!("Scheduled import loop stopping");
                    break;
                }
            }
        }
    }
}

/// Whether any spec tag opts the stream into the background schedule.
fn has_scheduled_tags(stream: &ImageStream) -> bool {
    stream.spec.tags.values().any(|tag| {
        tag.import_policy.scheduled
            && !tag.reference
            && tag
                .from
                .as_ref()
                .is_some_and(|from| from.kind == DOCKER_IMAGE_KIND)
    })
}
