//! Cluster health gauge.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph},
    Frame,
};

use super::theme::Theme;
use crate::data::HealthSummary;

/// Render the health gauge with its band color, the breathing state and
/// the pod counts when the producer sent them.
pub fn render_health(frame: &mut Frame, area: Rect, health: Option<&HealthSummary>, theme: &Theme) {
    let block = Block::default()
        .title(Span::styled(" Cluster Health ", theme.header))
        .borders(Borders::ALL)
        .border_type(theme.border_type)
        .border_style(Style::default().fg(theme.border));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let Some(health) = health else {
        frame.render_widget(
            Paragraph::new("Waiting for data...").style(Style::default().add_modifier(Modifier::DIM)),
            inner,
        );
        return;
    };

    let [gauge_area, details_area] =
        Layout::vertical([Constraint::Length(1), Constraint::Min(0)]).areas(inner);

    let color = health
        .band
        .map_or(theme.border, |band| theme.band_color(band));
    let ratio = health
        .percent
        .map_or(0.0, |percent| (percent as f64 / 100.0).clamp(0.0, 1.0));
    let gauge = Gauge::default()
        .gauge_style(Style::default().fg(color))
        .ratio(ratio)
        .label(Span::styled(
            health.headline(),
            Style::default().add_modifier(Modifier::BOLD),
        ));
    frame.render_widget(gauge, gauge_area);

    let mut lines = Vec::new();
    if let Some(breathing) = &health.breathing {
        lines.push(Line::from(vec![
            Span::raw("Breathing: "),
            Span::styled(breathing.clone(), Style::default().fg(theme.highlight)),
        ]));
    }
    if let Some(pods) = pod_counts(health) {
        lines.push(Line::from(pods));
    }
    frame.render_widget(Paragraph::new(lines), details_area);
}

fn pod_counts(health: &HealthSummary) -> Option<String> {
    let total = health.total_pods?;
    let ready = health.ready_pods.unwrap_or(0.0);
    let mut text = format!("Pods: {}/{} ready", ready, total);
    if let Some(failing) = health.failing_pods.filter(|f| *f > 0.0) {
        text.push_str(&format!(", {} failing", failing));
    }
    Some(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{DashboardView, SnapshotStore};
    use ratatui::{backend::TestBackend, Terminal};
    use serde_json::json;

    fn render(raw: serde_json::Value) -> String {
        let mut store = SnapshotStore::new();
        store.apply_snapshot(&raw);
        let view = DashboardView::project(&store).unwrap();

        let mut terminal = Terminal::new(TestBackend::new(50, 5)).unwrap();
        terminal
            .draw(|frame| render_health(frame, frame.area(), Some(&view.health), &Theme::dark()))
            .unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[test]
    fn test_gauge_headline_and_details() {
        let text = render(json!({
            "cluster_health": {
                "overall_health": 0.62,
                "breathing_state": "shallow",
                "total_pods": 8,
                "ready_pods": 5,
                "failing_pods": 3
            }
        }));
        assert!(text.contains("Cluster Health: 62%"));
        assert!(text.contains("Breathing: Shallow"));
        assert!(text.contains("Pods: 5/8 ready, 3 failing"));
    }

    #[test]
    fn test_missing_health_reads_unknown() {
        let text = render(json!({}));
        assert!(text.contains("Cluster Health: unknown"));
        assert!(!text.contains("Pods:"));
    }
}
