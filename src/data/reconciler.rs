//! Storage for the current authoritative snapshot.

use std::time::{Duration, Instant};

use serde_json::Value;

use crate::source::Snapshot;

/// Holds the single current [`Snapshot`] and when it arrived.
///
/// Each applied snapshot replaces the previous one wholesale. No history is
/// kept.
#[derive(Debug, Default)]
pub struct SnapshotStore {
    current: Option<Snapshot>,
    updated_at: Option<Instant>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalize `raw`, store it as the current snapshot and stamp the time.
    pub fn apply_snapshot(&mut self, raw: &Value) -> &Snapshot {
        self.apply_snapshot_at(raw, Instant::now())
    }

    /// Same as [`apply_snapshot`](Self::apply_snapshot) with an explicit arrival time.
    pub fn apply_snapshot_at(&mut self, raw: &Value, at: Instant) -> &Snapshot {
        self.updated_at = Some(at);
        self.current.insert(Snapshot::from_raw(raw))
    }

    /// The current snapshot, if one has arrived.
    pub fn current(&self) -> Option<&Snapshot> {
        self.current.as_ref()
    }

    /// When the current snapshot arrived.
    pub fn updated_at(&self) -> Option<Instant> {
        self.updated_at
    }

    /// Time since the current snapshot arrived, measured against `now`.
    pub fn staleness_at(&self, now: Instant) -> Option<Duration> {
        self.updated_at.map(|at| now.saturating_duration_since(at))
    }

    /// Total number of flows in the stored snapshot.
    pub fn flow_count(&self) -> usize {
        self.current
            .as_ref()
            .map_or(0, |s| s.network_traffic.flows.len())
    }
}
