//! Agent-to-agent traffic edges for the graph overlay.
//!
//! Edge endpoints come from where the agent nodes were actually drawn, so
//! [`project_flow_edges`] can only run after the agents have been rendered.

use std::collections::HashMap;

use crate::source::{Flow, FlowKind};

use super::projection::format_rate;

/// A point in the overlay's coordinate space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Where each agent node ended up on screen.
///
/// Nodes are keyed by display name, with the component id registered as an
/// alias so flows may reference either.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AgentPositions {
    by_key: HashMap<String, Position>,
    nodes: usize,
}

impl AgentPositions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the centre of one agent node.
    pub fn insert(&mut self, name: &str, id: &str, position: Position) {
        self.nodes += 1;
        self.by_key.insert(name.to_string(), position);
        if id != name {
            self.by_key.entry(id.to_string()).or_insert(position);
        }
    }

    pub fn get(&self, key: &str) -> Option<Position> {
        self.by_key.get(key).copied()
    }

    /// Number of agent nodes drawn (aliases not counted).
    pub fn len(&self) -> usize {
        self.nodes
    }

    pub fn is_empty(&self) -> bool {
        self.nodes == 0
    }
}

/// A drawable traffic edge between two agent nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowEdge {
    pub from: Position,
    pub to: Position,
    pub rate: f64,
    pub high_traffic: bool,
    /// Hover text, e.g. "Clara → Luna: 3.20 req/s".
    pub title: String,
}

/// Resolve agent-to-agent flows with a positive rate into edges.
///
/// Flows whose endpoints were not drawn are dropped. Fewer than two drawn
/// agents means there is nothing to connect.
pub fn project_flow_edges(flows: &[Flow], positions: &AgentPositions) -> Vec<FlowEdge> {
    if positions.len() < 2 {
        return Vec::new();
    }

    flows
        .iter()
        .filter(|flow| flow.kind == FlowKind::AgentToAgent)
        .filter_map(|flow| {
            let rate = flow.rate.as_f64();
            if rate <= 0.0 {
                return None;
            }
            let from = positions.get(&flow.source)?;
            let to = positions.get(&flow.destination)?;
            Some(FlowEdge {
                from,
                to,
                rate,
                high_traffic: rate > 1.0,
                title: format!(
                    "{} → {}: {}",
                    flow.source,
                    flow.destination,
                    format_rate(rate)
                ),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn positions() -> AgentPositions {
        let mut positions = AgentPositions::new();
        positions.insert("Clara", "clara", Position::new(2.0, 10.0));
        positions.insert("Luna", "luna", Position::new(20.0, 10.0));
        positions.insert("Vesna", "vesna", Position::new(38.0, 10.0));
        positions
    }

    fn agent_flow(source: &str, destination: &str, rate: serde_json::Value) -> Flow {
        Flow::from_value(&json!({
            "source": source,
            "destination": destination,
            "rate": rate,
            "type": "agent_to_agent"
        }))
    }

    #[test]
    fn test_edges_for_resolved_agent_flows() {
        let flows = vec![
            agent_flow("Clara", "Luna", json!(3.2)),
            agent_flow("Luna", "Vesna", json!(0.5)),
        ];
        let edges = project_flow_edges(&flows, &positions());

        assert_eq!(edges.len(), 2);
        assert_eq!(edges[0].from, Position::new(2.0, 10.0));
        assert_eq!(edges[0].to, Position::new(20.0, 10.0));
        assert!(edges[0].high_traffic);
        assert_eq!(edges[0].title, "Clara → Luna: 3.20 req/s");
        assert!(!edges[1].high_traffic);
    }

    #[test]
    fn test_filters_type_and_rate() {
        let flows = vec![
            agent_flow("Clara", "Luna", json!(0)),
            agent_flow("Clara", "Luna", json!("n/a")),
            Flow::from_value(&json!({
                "source": "Clara", "destination": "Luna", "rate": 4, "type": "agent_to_model"
            })),
        ];
        assert!(project_flow_edges(&flows, &positions()).is_empty());
    }

    #[test]
    fn test_unknown_agents_are_dropped() {
        let flows = vec![
            agent_flow("Clara", "Ghost", json!(2)),
            agent_flow("clara", "vesna", json!(2)),
        ];
        let edges = project_flow_edges(&flows, &positions());
        // Ids resolve through the alias, names that were never drawn do not
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].to, Position::new(38.0, 10.0));
    }

    #[test]
    fn test_needs_two_agents() {
        let mut single = AgentPositions::new();
        single.insert("Clara", "clara", Position::new(1.0, 1.0));
        let flows = vec![agent_flow("Clara", "Clara", json!(1))];
        assert!(project_flow_edges(&flows, &single).is_empty());
    }

    #[test]
    fn test_projection_is_idempotent() {
        let flows = vec![
            agent_flow("Clara", "Luna", json!(3)),
            agent_flow("Vesna", "Clara", json!(1)),
        ];
        let positions = positions();
        assert_eq!(
            project_flow_edges(&flows, &positions),
            project_flow_edges(&flows, &positions)
        );
    }
}
