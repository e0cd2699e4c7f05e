//! Pure view projections over the current snapshot.
//!
//! Everything here is deterministic: the same snapshot always yields the
//! same view. Numeric leaves are coerced to numbers at this point and not
//! before.

use std::cmp::Ordering;

use serde::Serialize;

use super::reconciler::SnapshotStore;
use crate::source::{
    Category, Component, Flow, FlowKind, HealthView, NumericLeaf, Snapshot, TrafficView,
};

/// Maximum number of flows shown in the ranked list.
pub const TOP_FLOWS: usize = 10;

/// Text shown when there are no flows to rank.
pub const NO_FLOWS_MESSAGE: &str = "No active traffic flows";

/// Flows above this rate are highlighted.
const HIGH_RATE_THRESHOLD: f64 = 1.0;

/// A component ready for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentCard {
    pub id: String,
    pub name: String,
    pub ready: bool,
    /// "Ready" when ready, the raw status otherwise.
    pub status_text: String,
    /// Hover text: name, status and (agents) essence.
    pub tooltip: String,
    pub breathing: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

impl ComponentCard {
    fn from_component(id: &str, category: Category, component: &Component) -> Self {
        let status_text = if component.ready {
            "Ready".to_string()
        } else {
            component.status.clone()
        };
        let tooltip = match category {
            Category::Agents => format!(
                "{} - {} ({})",
                component.name,
                component.status,
                component.essence.as_deref().unwrap_or("-")
            ),
            Category::Telemetry => format!(
                "{} - {}",
                component.name,
                component.kind.as_deref().unwrap_or("-")
            ),
            _ => format!("{} - {}", component.name, component.status),
        };
        Self {
            id: id.to_string(),
            name: component.name.clone(),
            ready: component.ready,
            status_text,
            tooltip,
            breathing: component.is_breathing(),
            url: component.url.clone(),
            kind: component.kind.clone(),
        }
    }
}

/// One category region: either its components or an explicit empty marker.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum CategoryView {
    Empty { message: &'static str },
    Components { cards: Vec<ComponentCard> },
}

impl CategoryView {
    pub fn cards(&self) -> &[ComponentCard] {
        match self {
            CategoryView::Empty { .. } => &[],
            CategoryView::Components { cards } => cards,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CategoryView::Empty { .. })
    }
}

/// List the components of one category in producer order.
pub fn list_category(snapshot: &Snapshot, category: Category) -> CategoryView {
    let section = snapshot.section(category);
    if section.is_empty() {
        return CategoryView::Empty {
            message: category.empty_message(),
        };
    }
    CategoryView::Components {
        cards: section
            .iter()
            .map(|(id, c)| ComponentCard::from_component(id, category, c))
            .collect(),
    }
}

/// A flow entry in the ranked list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedFlow {
    pub source: String,
    pub destination: String,
    pub rate: f64,
    pub rate_text: String,
    #[serde(rename = "type")]
    pub kind: FlowKind,
    pub high_rate: bool,
}

/// Sort flows by rate, highest first, and keep the top [`TOP_FLOWS`].
///
/// Equal rates keep their input order.
pub fn rank_flows(flows: &[Flow]) -> Vec<RankedFlow> {
    let mut ranked: Vec<&Flow> = flows.iter().collect();
    // sort_by is stable; coerced rates are finite and -0.0 == 0.0
    ranked.sort_by(|a, b| {
        b.rate
            .as_f64()
            .partial_cmp(&a.rate.as_f64())
            .unwrap_or(Ordering::Equal)
    });
    ranked
        .into_iter()
        .take(TOP_FLOWS)
        .map(|flow| {
            let rate = flow.rate.as_f64();
            RankedFlow {
                source: flow.source.clone(),
                destination: flow.destination.clone(),
                rate,
                rate_text: format_rate(rate),
                kind: flow.kind.clone(),
                high_rate: rate > HIGH_RATE_THRESHOLD,
            }
        })
        .collect()
}

pub fn format_rate(rate: f64) -> String {
    format!("{:.2} req/s", rate)
}

/// Health color band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthBand {
    High,
    Medium,
    Low,
}

impl HealthBand {
    /// Band for a whole-number percentage. Boundaries are inclusive.
    pub fn from_percent(percent: i64) -> Self {
        if percent >= 80 {
            HealthBand::High
        } else if percent >= 50 {
            HealthBand::Medium
        } else {
            HealthBand::Low
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            HealthBand::High => "high",
            HealthBand::Medium => "medium",
            HealthBand::Low => "low",
        }
    }
}

/// `overall_health` in `[0, 1]` to a rounded percentage and its band.
pub fn band_health(overall_health: f64) -> (i64, HealthBand) {
    let percent = (overall_health * 100.0).round() as i64;
    (percent, HealthBand::from_percent(percent))
}

/// Cluster health region.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HealthSummary {
    /// `None` when the producer sent no `overall_health`.
    pub percent: Option<i64>,
    pub band: Option<HealthBand>,
    pub breathing: Option<String>,
    pub total_pods: Option<f64>,
    pub ready_pods: Option<f64>,
    pub failing_pods: Option<f64>,
}

impl HealthSummary {
    pub fn from_view(health: &HealthView) -> Self {
        let (percent, band) = if health.overall_health.is_absent() {
            (None, None)
        } else {
            let (percent, band) = band_health(health.overall_health.as_f64());
            (Some(percent), Some(band))
        };
        let count = |leaf: &NumericLeaf| (!leaf.is_absent()).then(|| leaf.as_f64());
        Self {
            percent,
            band,
            breathing: health.breathing_state.as_ref().map(|s| s.label().to_string()),
            total_pods: count(&health.total_pods),
            ready_pods: count(&health.ready_pods),
            failing_pods: count(&health.failing_pods),
        }
    }

    /// Gauge text, e.g. "Cluster Health: 83%".
    pub fn headline(&self) -> String {
        match self.percent {
            Some(percent) => format!("Cluster Health: {}%", percent),
            None => "Cluster Health: unknown".to_string(),
        }
    }
}

/// Traffic overview numbers.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConnectivitySummary {
    pub request_rate: String,
    pub error_rate: String,
    /// All flows in the stored snapshot, not just the ranked ones.
    pub active_flows: usize,
}

/// Build the overview from the stored snapshot.
///
/// `active_flows` is read from the store at call time so it always counts
/// every flow, regardless of the ranking cap.
pub fn connectivity_summary(store: &SnapshotStore) -> ConnectivitySummary {
    let traffic = store.current().map(|s| &s.network_traffic);
    let overview = traffic.map(|t| &t.metrics.overview);
    ConnectivitySummary {
        request_rate: format_rate(overview.map_or(0.0, |o| o.total_requests.as_f64())),
        error_rate: format!("{:.1}%", overview.map_or(0.0, |o| o.error_rate.as_f64())),
        active_flows: store.flow_count(),
    }
}

/// Everything the render surface needs for one full pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub categories: Vec<(Category, CategoryView)>,
    pub top_flows: Vec<RankedFlow>,
    pub connectivity: ConnectivitySummary,
    pub health: HealthSummary,
    /// Every flow, in producer order; the graph overlay filters these.
    #[serde(skip)]
    pub flows: Vec<Flow>,
}

impl DashboardView {
    /// Project the stored snapshot. `None` until a snapshot has arrived.
    pub fn project(store: &SnapshotStore) -> Option<Self> {
        let snapshot = store.current()?;
        Some(Self::from_snapshot(snapshot, connectivity_summary(store)))
    }

    fn from_snapshot(snapshot: &Snapshot, connectivity: ConnectivitySummary) -> Self {
        let TrafficView { flows, .. } = &snapshot.network_traffic;
        Self {
            categories: Category::ALL
                .iter()
                .map(|c| (*c, list_category(snapshot, *c)))
                .collect(),
            top_flows: rank_flows(flows),
            connectivity,
            health: HealthSummary::from_view(&snapshot.cluster_health),
            flows: flows.clone(),
        }
    }

    pub fn category(&self, category: Category) -> Option<&CategoryView> {
        self.categories
            .iter()
            .find(|(c, _)| *c == category)
            .map(|(_, view)| view)
    }
}
