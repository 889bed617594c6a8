//! Daily upload quota tracking.
//!
//! Counts successful uploads per identity per UTC calendar day. The identity
//! is a client-supplied token or network address, so the quota is advisory
//! and spoofable; that is a carried-over property of the design, not a bug.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{NaiveDate, Utc};

/// Tracks uploads per `(identity, UTC day)` against a configured ceiling.
#[derive(Debug)]
pub struct QuotaTracker {
    counts: RwLock<HashMap<(String, NaiveDate), u32>>,
    daily_limit: u32,
}

impl QuotaTracker {
    /// Create a tracker with the given daily ceiling.
    pub fn new(daily_limit: u32) -> Self {
        Self {
            counts: RwLock::new(HashMap::new()),
            daily_limit,
        }
    }

    /// The configured daily ceiling.
    pub fn daily_limit(&self) -> u32 {
        self.daily_limit
    }

    /// Number of successful uploads recorded for `identity` today (UTC).
    pub fn count_today(&self, identity: &str) -> u32 {
        let key = (identity.to_string(), Utc::now().date_naive());
        let counts = self.counts.read().expect("quota lock poisoned");
        counts.get(&key).copied().unwrap_or(0)
    }

    /// Record one more upload for today.
    ///
    /// Called exactly once per successful upload; a folder upload counts as a
    /// single unit regardless of member count. Counters never decrement.
    pub fn increment(&self, identity: &str) {
        let key = (identity.to_string(), Utc::now().date_naive());
        let mut counts = self.counts.write().expect("quota lock poisoned");
        *counts.entry(key).or_insert(0) += 1;
    }

    /// Whether `identity` has exhausted today's quota.
    pub fn is_limit_reached(&self, identity: &str) -> bool {
        self.count_today(identity) >= self.daily_limit
    }

    /// Drop counters older than `date`. Stale counters are harmless, so this
    /// is optional housekeeping. Returns the number removed.
    pub fn purge_before(&self, date: NaiveDate) -> usize {
        let mut counts = self.counts.write().expect("quota lock poisoned");
        let before = counts.len();
        counts.retain(|(_, day), _| *day >= date);
        before - counts.len()
    }
}
