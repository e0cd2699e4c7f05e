//! What is currently painted, region by region.
//!
//! Every region is replaced wholesale: a new view drops every card, flow and
//! gauge of the previous one. The frame renderer only ever reads from here.

use std::time::Instant;

use crate::data::duration::format_staleness;
use crate::data::{DashboardView, PodStateReport, SnapshotStore};

#[derive(Debug, Default)]
pub struct Surface {
    view: Option<DashboardView>,
    pods: Option<PodStateReport>,
    staleness: Option<String>,
    passes: u64,
}

impl Surface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace every snapshot-driven region. Returns the pass number.
    pub fn paint(&mut self, view: DashboardView) -> u64 {
        self.view = Some(view);
        self.passes += 1;
        self.passes
    }

    /// Replace the problematic pods region.
    pub fn paint_pods(&mut self, report: PodStateReport) {
        self.pods = Some(report);
    }

    /// Recompute the staleness label from the store's arrival time.
    pub fn refresh_staleness(&mut self, store: &SnapshotStore, now: Instant) {
        self.staleness = store.staleness_at(now).map(format_staleness);
    }

    pub fn view(&self) -> Option<&DashboardView> {
        self.view.as_ref()
    }

    pub fn pods(&self) -> Option<&PodStateReport> {
        self.pods.as_ref()
    }

    /// "Updated Ns ago", or `None` before the first snapshot.
    pub fn staleness(&self) -> Option<&str> {
        self.staleness.as_deref()
    }

    /// Number of full render passes so far.
    pub fn passes(&self) -> u64 {
        self.passes
    }
}
