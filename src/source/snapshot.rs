//! Cluster snapshot model.
//!
//! These types describe the payload of a `cluster_update` event. Parsing is
//! deliberately lenient: every section is optional and every leaf has a
//! default-fill rule, so any JSON value converts into a [`Snapshot`] without
//! failing. Downstream code never sees a missing section.
//!
//! Default-fill rules:
//!
//! - A missing, null or non-object category section becomes an empty map.
//! - Component `name` falls back to the component id, `status` to `""`.
//! - `ready` follows truthiness (`true`, non-zero numbers, non-empty strings).
//! - Text leaves that are not strings keep their JSON text form.
//! - Numeric leaves are kept raw in a [`NumericLeaf`] and only coerced to a
//!   number when displayed or ranked.

use std::fmt;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

/// A numeric field exactly as the producer sent it.
///
/// Malformed values are passed through untouched; [`NumericLeaf::as_f64`]
/// coerces at the point of use, defaulting to `0.0`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NumericLeaf(Value);

impl NumericLeaf {
    /// Wrap a raw JSON value.
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Build a leaf from a number.
    pub fn from_f64(value: f64) -> Self {
        Self(serde_json::json!(value))
    }

    /// True when the producer omitted the field (or sent `null`).
    pub fn is_absent(&self) -> bool {
        self.0.is_null()
    }

    /// The raw JSON value.
    pub fn raw(&self) -> &Value {
        &self.0
    }

    /// Numeric value for display and ranking.
    ///
    /// Numbers are used as-is, numeric strings are parsed, everything else
    /// is `0.0`.
    pub fn as_f64(&self) -> f64 {
        match &self.0 {
            Value::Number(n) => n.as_f64().unwrap_or(0.0),
            Value::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()).unwrap_or(0.0),
            _ => 0.0,
        }
    }
}

impl fmt::Display for NumericLeaf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Value::Null => write!(f, "-"),
            Value::String(s) => write!(f, "{}", s),
            other => write!(f, "{}", other),
        }
    }
}

/// The component categories a snapshot carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Ingress,
    Agents,
    Models,
    MemorySystems,
    Telemetry,
}

impl Category {
    /// All categories in display order.
    pub const ALL: [Category; 5] = [
        Category::Ingress,
        Category::Agents,
        Category::Models,
        Category::MemorySystems,
        Category::Telemetry,
    ];

    /// The snapshot key for this category.
    pub fn key(&self) -> &'static str {
        match self {
            Category::Ingress => "ingress",
            Category::Agents => "agents",
            Category::Models => "models",
            Category::MemorySystems => "memory_systems",
            Category::Telemetry => "telemetry",
        }
    }

    /// Panel title.
    pub fn title(&self) -> &'static str {
        match self {
            Category::Ingress => "Ingress",
            Category::Agents => "Agents",
            Category::Models => "Models",
            Category::MemorySystems => "Memory",
            Category::Telemetry => "Telemetry",
        }
    }

    /// Text shown when the category has no components.
    pub fn empty_message(&self) -> &'static str {
        match self {
            Category::Ingress => "No ingress components detected",
            Category::Agents => "No agents detected",
            Category::Models => "No model instances detected",
            Category::MemorySystems => "No memory systems detected",
            Category::Telemetry => "No telemetry components",
        }
    }
}

impl Serialize for Category {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.key())
    }
}

/// A monitored cluster element.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Component {
    pub name: String,
    pub status: String,
    pub ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub essence: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pod_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub breathing: Option<String>,
    #[serde(skip_serializing_if = "NumericLeaf::is_absent")]
    pub restart_count: NumericLeaf,
    /// External link (telemetry only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Component type label (telemetry only).
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

impl Component {
    /// Normalize one component entry.
    pub fn from_value(id: &str, value: &Value) -> Self {
        let field = |key: &str| value.get(key);
        Self {
            name: text(field("name")).unwrap_or_else(|| id.to_string()),
            status: text(field("status")).unwrap_or_default(),
            ready: truthy(field("ready")),
            essence: text(field("essence")),
            namespace: text(field("namespace")),
            pod_name: text(field("pod_name")),
            breathing: text(field("breathing")),
            restart_count: numeric(field("restart_count")),
            url: text(field("url")).filter(|u| !u.is_empty()),
            kind: text(field("type")),
        }
    }

    /// Agents whose breathing is `deep` or `steady` are drawn as breathing.
    pub fn is_breathing(&self) -> bool {
        matches!(self.breathing.as_deref(), Some("deep") | Some("steady"))
    }
}

/// Components of one category, in the order the producer sent them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComponentMap {
    entries: Vec<(String, Component)>,
}

impl ComponentMap {
    /// Normalize a category section. Anything but an object yields an empty map.
    pub fn from_value(value: Option<&Value>) -> Self {
        let entries = match value {
            Some(Value::Object(map)) => map
                .iter()
                .map(|(id, component)| (id.clone(), Component::from_value(id, component)))
                .collect(),
            _ => Vec::new(),
        };
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Iterate `(id, component)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Component)> {
        self.entries.iter().map(|(id, c)| (id.as_str(), c))
    }

    /// Iterate components in insertion order.
    pub fn values(&self) -> impl Iterator<Item = &Component> {
        self.entries.iter().map(|(_, c)| c)
    }

    /// Look up a component by id.
    pub fn get(&self, id: &str) -> Option<&Component> {
        self.entries.iter().find(|(key, _)| key == id).map(|(_, c)| c)
    }

    /// Look up a component by its display name.
    pub fn find_by_name(&self, name: &str) -> Option<&Component> {
        self.values().find(|c| c.name == name)
    }
}

impl FromIterator<(String, Component)> for ComponentMap {
    fn from_iter<I: IntoIterator<Item = (String, Component)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl Serialize for ComponentMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (id, component) in &self.entries {
            map.serialize_entry(id, component)?;
        }
        map.end()
    }
}

/// Categorical tag attached to a traffic flow.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FlowKind {
    AgentToAgent,
    AgentToModel,
    AgentToMemory,
    ExternalToSanctuary,
    Monitoring,
    ServiceToService,
    /// A tag this build does not know; kept verbatim.
    Other(String),
    /// No tag at all.
    #[default]
    Untyped,
}

impl FlowKind {
    /// Parse a producer tag. Unknown tags pass through as [`FlowKind::Other`].
    pub fn from_tag(tag: Option<&str>) -> Self {
        match tag {
            None | Some("") => FlowKind::Untyped,
            Some("agent_to_agent") => FlowKind::AgentToAgent,
            Some("agent_to_model") => FlowKind::AgentToModel,
            Some("agent_to_memory") => FlowKind::AgentToMemory,
            Some("external_to_sanctuary") => FlowKind::ExternalToSanctuary,
            Some("monitoring") => FlowKind::Monitoring,
            Some("service_to_service") => FlowKind::ServiceToService,
            Some(other) => FlowKind::Other(other.to_string()),
        }
    }

    /// The producer tag, if any.
    pub fn as_tag(&self) -> Option<&str> {
        match self {
            FlowKind::AgentToAgent => Some("agent_to_agent"),
            FlowKind::AgentToModel => Some("agent_to_model"),
            FlowKind::AgentToMemory => Some("agent_to_memory"),
            FlowKind::ExternalToSanctuary => Some("external_to_sanctuary"),
            FlowKind::Monitoring => Some("monitoring"),
            FlowKind::ServiceToService => Some("service_to_service"),
            FlowKind::Other(tag) => Some(tag),
            FlowKind::Untyped => None,
        }
    }
}

impl Serialize for FlowKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.as_tag() {
            Some(tag) => serializer.serialize_str(tag),
            None => serializer.serialize_none(),
        }
    }
}

/// A directed, rated traffic relationship between two components.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Flow {
    pub source: String,
    pub destination: String,
    pub rate: NumericLeaf,
    #[serde(rename = "type")]
    pub kind: FlowKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl Flow {
    /// Normalize one flow entry.
    pub fn from_value(value: &Value) -> Self {
        let field = |key: &str| value.get(key);
        Self {
            source: text(field("source")).unwrap_or_default(),
            destination: text(field("destination")).unwrap_or_default(),
            rate: numeric(field("rate")),
            kind: FlowKind::from_tag(text(field("type")).as_deref()),
            namespace: text(field("namespace")),
            timestamp: text(field("timestamp")),
        }
    }
}

/// Aggregate request counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TrafficOverview {
    pub total_requests: NumericLeaf,
    pub error_rate: NumericLeaf,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TrafficMetrics {
    pub overview: TrafficOverview,
}

/// Traffic section of a snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TrafficView {
    pub metrics: TrafficMetrics,
    pub flows: Vec<Flow>,
}

impl TrafficView {
    pub fn from_value(value: Option<&Value>) -> Self {
        let Some(value) = value.filter(|v| v.is_object()) else {
            return Self::default();
        };
        let overview = value.get("metrics").and_then(|m| m.get("overview"));
        let flows = match value.get("flows") {
            Some(Value::Array(flows)) => flows.iter().map(Flow::from_value).collect(),
            _ => Vec::new(),
        };
        Self {
            metrics: TrafficMetrics {
                overview: TrafficOverview {
                    total_requests: numeric(overview.and_then(|o| o.get("total_requests"))),
                    error_rate: numeric(overview.and_then(|o| o.get("error_rate"))),
                },
            },
            flows,
        }
    }
}

/// Categorical health/activity label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BreathingState {
    Steady,
    Shallow,
    Irregular,
    Distressed,
    Silent,
    Deep,
    Held,
    /// Unrecognized value, displayed verbatim.
    Other(String),
}

impl BreathingState {
    pub fn from_raw(raw: &str) -> Self {
        match raw {
            "steady" => BreathingState::Steady,
            "shallow" => BreathingState::Shallow,
            "irregular" => BreathingState::Irregular,
            "distressed" => BreathingState::Distressed,
            "silent" => BreathingState::Silent,
            "deep" => BreathingState::Deep,
            "held" => BreathingState::Held,
            other => BreathingState::Other(other.to_string()),
        }
    }

    /// The producer's spelling.
    pub fn as_str(&self) -> &str {
        match self {
            BreathingState::Steady => "steady",
            BreathingState::Shallow => "shallow",
            BreathingState::Irregular => "irregular",
            BreathingState::Distressed => "distressed",
            BreathingState::Silent => "silent",
            BreathingState::Deep => "deep",
            BreathingState::Held => "held",
            BreathingState::Other(raw) => raw,
        }
    }

    /// Display label; unknown values pass through unchanged.
    pub fn label(&self) -> &str {
        match self {
            BreathingState::Steady => "Steady",
            BreathingState::Shallow => "Shallow",
            BreathingState::Irregular => "Irregular",
            BreathingState::Distressed => "Distressed",
            BreathingState::Silent => "Silent",
            BreathingState::Deep => "Deep",
            BreathingState::Held => "Held",
            BreathingState::Other(raw) => raw,
        }
    }
}

impl Serialize for BreathingState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Cluster health section of a snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HealthView {
    /// Fraction of healthy pods in `[0, 1]`.
    pub overall_health: NumericLeaf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub breathing_state: Option<BreathingState>,
    #[serde(skip_serializing_if = "NumericLeaf::is_absent")]
    pub total_pods: NumericLeaf,
    #[serde(skip_serializing_if = "NumericLeaf::is_absent")]
    pub ready_pods: NumericLeaf,
    #[serde(skip_serializing_if = "NumericLeaf::is_absent")]
    pub failing_pods: NumericLeaf,
}

impl HealthView {
    pub fn from_value(value: Option<&Value>) -> Self {
        let field = |key: &str| value.and_then(|v| v.get(key));
        Self {
            overall_health: numeric(field("overall_health")),
            breathing_state: text(field("breathing_state"))
                .filter(|s| !s.is_empty())
                .map(|s| BreathingState::from_raw(&s)),
            total_pods: numeric(field("total_pods")),
            ready_pods: numeric(field("ready_pods")),
            failing_pods: numeric(field("failing_pods")),
        }
    }
}

/// The authoritative cluster state at a point in time.
///
/// A snapshot always replaces its predecessor; there are no deltas.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value")]
pub struct Snapshot {
    pub ingress: ComponentMap,
    pub agents: ComponentMap,
    pub models: ComponentMap,
    pub memory_systems: ComponentMap,
    pub telemetry: ComponentMap,
    pub network_traffic: TrafficView,
    pub cluster_health: HealthView,
}

impl Snapshot {
    /// Normalize a raw `cluster_update` payload.
    pub fn from_raw(raw: &Value) -> Self {
        let empty = Map::new();
        let root = raw.as_object().unwrap_or(&empty);
        Self {
            ingress: ComponentMap::from_value(root.get(Category::Ingress.key())),
            agents: ComponentMap::from_value(root.get(Category::Agents.key())),
            models: ComponentMap::from_value(root.get(Category::Models.key())),
            memory_systems: ComponentMap::from_value(root.get(Category::MemorySystems.key())),
            telemetry: ComponentMap::from_value(root.get(Category::Telemetry.key())),
            network_traffic: TrafficView::from_value(root.get("network_traffic")),
            cluster_health: HealthView::from_value(root.get("cluster_health")),
        }
    }

    /// Components of one category.
    pub fn section(&self, category: Category) -> &ComponentMap {
        match category {
            Category::Ingress => &self.ingress,
            Category::Agents => &self.agents,
            Category::Models => &self.models,
            Category::MemorySystems => &self.memory_systems,
            Category::Telemetry => &self.telemetry,
        }
    }
}

impl From<Value> for Snapshot {
    fn from(raw: Value) -> Self {
        Self::from_raw(&raw)
    }
}

fn text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|v| v != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

fn numeric(value: Option<&Value>) -> NumericLeaf {
    NumericLeaf::new(value.cloned().unwrap_or(Value::Null))
}
