//! Agent detail overlay rendering.
//!
//! Displays a modal overlay summarising one agent from the stored snapshot.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::app::App;
use crate::source::Component;

/// Minimum width required for the detail overlay to render properly.
const MIN_OVERLAY_WIDTH: u16 = 30;
/// Minimum height required for the detail overlay to render properly.
const MIN_OVERLAY_HEIGHT: u16 = 11;

/// The fields shown for an agent. Missing values read as "-".
#[derive(Debug, Clone, PartialEq)]
pub struct AgentDetail {
    pub name: String,
    pub status: String,
    pub ready: bool,
    pub essence: String,
    pub namespace: String,
    pub pod: String,
    pub breathing: String,
    pub restarts: String,
}

impl AgentDetail {
    pub fn from_component(agent: &Component) -> Self {
        let or_dash = |value: &Option<String>| value.clone().unwrap_or_else(|| "-".to_string());
        Self {
            name: agent.name.clone(),
            status: if agent.status.is_empty() {
                "-".to_string()
            } else {
                agent.status.clone()
            },
            ready: agent.ready,
            essence: or_dash(&agent.essence),
            namespace: or_dash(&agent.namespace),
            pod: or_dash(&agent.pod_name),
            breathing: or_dash(&agent.breathing),
            restarts: agent.restart_count.to_string(),
        }
    }

    /// Label/value rows in display order.
    pub fn rows(&self) -> [(&'static str, &str); 7] {
        [
            ("Agent", self.name.as_str()),
            ("Status", self.status.as_str()),
            ("Essence", self.essence.as_str()),
            ("Namespace", self.namespace.as_str()),
            ("Pod", self.pod.as_str()),
            ("Breathing", self.breathing.as_str()),
            ("Restarts", self.restarts.as_str()),
        ]
    }
}

/// Render the agent detail as a modal overlay.
pub fn render_overlay(frame: &mut Frame, app: &App, area: Rect) {
    // Skip rendering if terminal is too small for the overlay
    if area.width < MIN_OVERLAY_WIDTH || area.height < MIN_OVERLAY_HEIGHT {
        return;
    }

    // The agent may have vanished with the last snapshot
    let Some(detail) = app.agent_detail() else {
        return;
    };

    let overlay_width = 50u16.min(area.width.saturating_sub(4)).max(MIN_OVERLAY_WIDTH);
    let overlay_height = MIN_OVERLAY_HEIGHT;
    let x = area.x + (area.width.saturating_sub(overlay_width)) / 2;
    let y = area.y + (area.height.saturating_sub(overlay_height)) / 2;
    let overlay_area = Rect::new(x, y, overlay_width, overlay_height);

    let mut lines: Vec<Line> = detail
        .rows()
        .iter()
        .map(|(label, value)| {
            let value_style = if *label == "Status" {
                app.theme.ready_style(detail.ready)
            } else {
                Style::default()
            };
            Line::from(vec![
                Span::styled(
                    format!(" {:<10} ", label),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
                Span::styled(value.to_string(), value_style),
            ])
        })
        .collect();
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        " Esc to close",
        Style::default().add_modifier(Modifier::DIM),
    )));

    let block = Block::default()
        .title(format!(" {} ", detail.name))
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.highlight));

    // Clear the area behind the overlay
    frame.render_widget(Clear, overlay_area);
    frame.render_widget(Paragraph::new(lines).block(block), overlay_area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_detail_fields() {
        let agent = Component::from_value(
            "clara",
            &json!({
                "name": "Clara", "status": "Running", "ready": true, "essence": "conversational",
                "namespace": "lamina", "pod_name": "clara-7d9f", "breathing": "deep",
                "restart_count": 3
            }),
        );
        let detail = AgentDetail::from_component(&agent);
        assert_eq!(detail.pod, "clara-7d9f");
        assert_eq!(detail.restarts, "3");
        assert_eq!(detail.rows()[5], ("Breathing", "deep"));
    }

    #[test]
    fn test_missing_fields_read_as_dash() {
        let detail = AgentDetail::from_component(&Component::from_value("luna", &json!({})));
        assert_eq!(detail.name, "luna");
        for (label, value) in detail.rows().iter().skip(1) {
            assert_eq!(*value, "-", "{} should be blank", label);
        }
    }
}
