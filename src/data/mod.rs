//! Snapshot storage and the view projections derived from it.
//!
//! ## Submodules
//!
//! - [`reconciler`]: The single current snapshot and its arrival time
//! - [`projection`]: Category listings, flow ranking, health banding
//! - [`graph`]: Agent-to-agent edges resolved against drawn agent positions
//! - [`pods`]: Problematic pod reports from the pod-status endpoint
//! - [`duration`]: Interval parsing and the staleness label
//!
//! ## Data Flow
//!
//! ```text
//! cluster_update (raw JSON)
//!        │
//!        ▼
//! SnapshotStore::apply_snapshot()
//!        │
//!        ▼
//! DashboardView::project()  ──▶  Surface::paint()
//!                                     │
//!                   agent positions ◀─┘
//!                          │
//!                          ▼
//!                 project_flow_edges()
//! ```

pub mod duration;
pub mod graph;
pub mod pods;
pub mod projection;
pub mod reconciler;

pub use graph::{project_flow_edges, AgentPositions, FlowEdge, Position};
pub use pods::{
    HttpPodStatusClient, PodFetchOutcome, PodFetcher, PodStateReport, PodStatusClient,
    PodSummary, ProblematicPod,
};
pub use projection::{
    band_health, connectivity_summary, list_category, rank_flows, CategoryView, ComponentCard,
    ConnectivitySummary, DashboardView, HealthBand, HealthSummary, RankedFlow,
};
pub use reconciler::SnapshotStore;
