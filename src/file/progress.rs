//! Upload progress notifications.
//!
//! Push-style event stream keyed by upload id. Progress ticks are delivered
//! at-least-once (duplicates and reordering under lag are tolerable); the
//! terminal ready/error status is published once per upload, after which the
//! channel is retired. The broker only dedups event emission; the durable
//! exactly-once completion state lives on the registry record, so the
//! broker's bookkeeping can be bounded and pruned freely.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;

use serde::Serialize;
use tokio::sync::broadcast;

/// Channel capacity per upload. Slow subscribers lose old ticks, never the
/// terminal event (it is the last message before the channel closes).
const CHANNEL_CAPACITY: usize = 64;

/// How many finished upload ids the dedup log retains, oldest evicted first.
const FINISHED_CAPACITY: usize = 1024;

/// Terminal status of an upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadStatus {
    /// All members stored, record complete.
    Ready,
    /// The upload failed; partial state may remain.
    Error,
}

/// An event on an upload's progress stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum UploadEvent {
    /// A progress tick.
    Progress {
        /// Members uploaded so far.
        current: u32,
        /// Total members expected.
        total: u32,
        /// Percentage, 0-100.
        percent: u8,
    },
    /// The terminal status transition.
    Status {
        /// Ready or error.
        status: UploadStatus,
    },
}

/// Bounded insertion-ordered set of finished upload ids.
#[derive(Debug, Default)]
struct FinishedLog {
    set: HashSet<String>,
    order: VecDeque<String>,
}

impl FinishedLog {
    /// Record an id; returns `false` if it was already present. Evicts the
    /// oldest entries beyond the retention cap.
    fn insert(&mut self, id: &str) -> bool {
        if !self.set.insert(id.to_string()) {
            return false;
        }
        self.order.push_back(id.to_string());
        while self.order.len() > FINISHED_CAPACITY {
            if let Some(evicted) = self.order.pop_front() {
                self.set.remove(&evicted);
            }
        }
        true
    }

    fn contains(&self, id: &str) -> bool {
        self.set.contains(id)
    }
}

/// Broker of per-upload progress streams.
#[derive(Debug, Default)]
pub struct ProgressBroker {
    channels: Mutex<HashMap<String, broadcast::Sender<UploadEvent>>>,
    finished: Mutex<FinishedLog>,
}

impl ProgressBroker {
    /// Create an empty broker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to events for an upload id, creating the stream if needed.
    pub fn subscribe(&self, upload_id: &str) -> broadcast::Receiver<UploadEvent> {
        let mut channels = self.channels.lock().expect("progress lock poisoned");
        channels
            .entry(upload_id.to_string())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .subscribe()
    }

    /// Publish a progress tick. No-op once the upload is finished or when
    /// nobody is listening.
    pub fn publish_progress(&self, upload_id: &str, current: u32, total: u32) {
        if self.is_finished(upload_id) {
            return;
        }

        let percent = if total == 0 {
            100
        } else {
            ((current.min(total) as u64 * 100) / total as u64) as u8
        };

        let mut channels = self.channels.lock().expect("progress lock poisoned");
        if let Some(tx) = channels.get(upload_id) {
            let sent = tx.send(UploadEvent::Progress {
                current,
                total,
                percent,
            });
            // A failed send means the last receiver is gone; drop the entry
            // so the map does not accumulate dead channels.
            if sent.is_err() {
                channels.remove(upload_id);
            }
        }
    }

    /// Publish the terminal status once, then retire the channel.
    ///
    /// Returns `false` if the upload already had its terminal event. The
    /// dedup log is bounded; callers that need a durable exactly-once
    /// transition use the registry's completion flag, not this.
    pub fn publish_terminal(&self, upload_id: &str, status: UploadStatus) -> bool {
        {
            let mut finished = self.finished.lock().expect("progress lock poisoned");
            if !finished.insert(upload_id) {
                return false;
            }
        }

        let mut channels = self.channels.lock().expect("progress lock poisoned");
        if let Some(tx) = channels.remove(upload_id) {
            let _ = tx.send(UploadEvent::Status { status });
        }
        true
    }

    /// Whether the upload already reached a terminal state.
    pub fn is_finished(&self, upload_id: &str) -> bool {
        self.finished
            .lock()
            .expect("progress lock poisoned")
            .contains(upload_id)
    }

    /// Drop the channel for an upload once its last receiver is gone.
    /// Called when a subscriber disconnects; a later subscriber simply
    /// recreates the channel.
    pub fn release(&self, upload_id: &str) {
        let mut channels = self.channels.lock().expect("progress lock poisoned");
        if let Some(tx) = channels.get(upload_id) {
            if tx.receiver_count() == 0 {
                channels.remove(upload_id);
            }
        }
    }

    /// Number of live event channels.
    pub fn active_channels(&self) -> usize {
        self.channels.lock().expect("progress lock poisoned").len()
    }
}
