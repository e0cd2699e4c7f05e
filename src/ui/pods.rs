//! Problematic pods panel.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

use super::theme::Theme;
use crate::data::{PodStateReport, ProblematicPod};

pub const ALL_HEALTHY_MESSAGE: &str = "✅ All pods healthy";

/// Render the pod list. Before the first report arrives the panel says so
/// instead of claiming everything is healthy.
pub fn render_pods(frame: &mut Frame, area: Rect, report: Option<&PodStateReport>, theme: &Theme) {
    let count = report.map_or(0, |r| r.problematic_pods.len());
    let title = if count > 0 {
        format!(" Problematic Pods ({}) ", count)
    } else {
        " Problematic Pods ".to_string()
    };
    let block = Block::default()
        .title(Span::styled(title, theme.header))
        .borders(Borders::ALL)
        .border_type(theme.border_type)
        .border_style(Style::default().fg(theme.border));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let Some(report) = report else {
        frame.render_widget(
            Paragraph::new("Checking pod states...")
                .style(Style::default().add_modifier(Modifier::DIM)),
            inner,
        );
        return;
    };

    if report.problematic_pods.is_empty() {
        frame.render_widget(
            Paragraph::new(ALL_HEALTHY_MESSAGE).style(Style::default().fg(theme.healthy)),
            inner,
        );
        return;
    }

    let items: Vec<ListItem> = report
        .problematic_pods
        .iter()
        .map(|pod| pod_item(pod, theme))
        .collect();
    frame.render_widget(List::new(items), inner);
}

fn pod_item<'a>(pod: &ProblematicPod, theme: &Theme) -> ListItem<'a> {
    let color = if pod.is_critical() {
        theme.critical
    } else {
        theme.warning
    };
    let header = Line::from(vec![
        Span::styled(pod.name.clone(), Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(format!(" ({}) ", pod.namespace)),
        Span::styled(pod.reason.clone(), Style::default().fg(color)),
    ]);
    let details = Line::styled(
        format!(
            "  Phase: {} | Restarts: {} | Age: {}",
            pod.phase, pod.restart_count, pod.age
        ),
        Style::default().add_modifier(Modifier::DIM),
    );
    ListItem::new(vec![header, details])
}
