//! Network traffic: the overview numbers, the ranked flow list, and the
//! agent-to-agent overlay drawn on top of the agent field.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{
        canvas::{Canvas, Line as CanvasLine},
        Block, Borders, List, ListItem, Paragraph,
    },
    Frame,
};

use super::components::AgentLayout;
use super::theme::Theme;
use crate::data::projection::NO_FLOWS_MESSAGE;
use crate::data::{ConnectivitySummary, FlowEdge, RankedFlow};

/// Render the traffic panel: overview numbers plus the top flows.
pub fn render_traffic(
    frame: &mut Frame,
    area: Rect,
    connectivity: Option<&ConnectivitySummary>,
    flows: &[RankedFlow],
    theme: &Theme,
) {
    let block = Block::default()
        .title(Span::styled(" Network Traffic ", theme.header))
        .borders(Borders::ALL)
        .border_type(theme.border_type)
        .border_style(Style::default().fg(theme.border));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let Some(connectivity) = connectivity else {
        frame.render_widget(
            Paragraph::new("Waiting for data...").style(Style::default().add_modifier(Modifier::DIM)),
            inner,
        );
        return;
    };

    let bold = Style::default().add_modifier(Modifier::BOLD);
    let metrics = pack_metrics(
        vec![
            vec![
                Span::raw("Requests: "),
                Span::styled(connectivity.request_rate.clone(), bold),
            ],
            vec![
                Span::raw("Errors: "),
                Span::styled(connectivity.error_rate.clone(), bold),
            ],
            vec![
                Span::raw("Active flows: "),
                Span::styled(connectivity.active_flows.to_string(), bold),
            ],
        ],
        usize::from(inner.width),
    );
    let [metrics_area, list_area] = Layout::vertical([
        Constraint::Length(metrics.len() as u16),
        Constraint::Min(0),
    ])
    .areas(inner);
    frame.render_widget(Paragraph::new(metrics), metrics_area);

    if flows.is_empty() {
        frame.render_widget(
            Paragraph::new(NO_FLOWS_MESSAGE).style(Style::default().add_modifier(Modifier::DIM)),
            list_area,
        );
        return;
    }

    let items: Vec<ListItem> = flows.iter().map(|flow| flow_item(flow, theme)).collect();
    frame.render_widget(List::new(items), list_area);
}

const METRIC_SEPARATOR: &str = " │ ";

/// Lay the metric segments out left to right, starting a new line whenever
/// the next segment would not fit in `width`. Segments are never split.
fn pack_metrics(segments: Vec<Vec<Span<'static>>>, width: usize) -> Vec<Line<'static>> {
    let separator = Span::raw(METRIC_SEPARATOR);
    let mut lines: Vec<Line<'static>> = Vec::new();
    for segment in segments {
        let segment_width: usize = segment.iter().map(Span::width).sum();
        match lines.last_mut() {
            Some(line) if line.width() + separator.width() + segment_width <= width => {
                line.spans.push(separator.clone());
                line.spans.extend(segment);
            }
            _ => lines.push(Line::from(segment)),
        }
    }
    lines
}

fn flow_item<'a>(flow: &RankedFlow, theme: &Theme) -> ListItem<'a> {
    let rate_style = if flow.high_rate {
        Style::default().fg(theme.warning).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(theme.flow)
    };
    let mut spans = vec![
        Span::raw(format!("{} → {}", flow.source, flow.destination)),
        Span::raw("  "),
        Span::styled(flow.rate_text.clone(), rate_style),
    ];
    if let Some(tag) = flow.kind.as_tag() {
        spans.push(Span::styled(
            format!("  [{}]", tag),
            Style::default().add_modifier(Modifier::DIM),
        ));
    }
    ListItem::new(Line::from(spans))
}

/// Draw the traffic edges over the already-rendered agent field.
///
/// Only cells touched by a line are written, so the agents stay visible;
/// their labels are printed again afterwards to sit above the lines.
pub fn render_flow_overlay(
    frame: &mut Frame,
    layout: &AgentLayout,
    edges: &[FlowEdge],
    theme: &Theme,
) {
    let area = layout.area;
    if edges.is_empty() || area.width < 2 || area.height < 2 {
        return;
    }

    let canvas = Canvas::default()
        .marker(Marker::Braille)
        .x_bounds([0.0, f64::from(area.width - 1)])
        .y_bounds([0.0, f64::from(area.height - 1)])
        .paint(|ctx| {
            for edge in edges {
                let color = if edge.high_traffic {
                    theme.warning
                } else {
                    theme.flow
                };
                ctx.draw(&CanvasLine {
                    x1: edge.from.x,
                    y1: edge.from.y,
                    x2: edge.to.x,
                    y2: edge.to.y,
                    color,
                });
            }
            ctx.layer();
            for label in &layout.labels {
                ctx.print(
                    label.position.x,
                    label.position.y,
                    Span::styled(label.text.clone(), label.style),
                );
            }
        });
    frame.render_widget(canvas, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{project_flow_edges, DashboardView, SnapshotStore};
    use crate::source::Category;
    use crate::ui::components::render_agents;
    use ratatui::{backend::TestBackend, Terminal};
    use serde_json::json;

    fn view(raw: serde_json::Value) -> DashboardView {
        let mut store = SnapshotStore::new();
        store.apply_snapshot(&raw);
        DashboardView::project(&store).unwrap()
    }

    fn buffer_text(terminal: &Terminal<TestBackend>) -> String {
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[test]
    fn test_traffic_lists_ranked_flows() {
        let view = view(json!({
            "network_traffic": {
                "flows": [
                    { "source": "clara", "destination": "luna", "rate": 0.4 },
                    { "source": "luna", "destination": "vesna", "rate": 3.2, "type": "agent_to_agent" }
                ],
                "metrics": { "overview": { "total_requests": 12.5, "error_rate": 0.5 } }
            }
        }));
        let mut terminal = Terminal::new(TestBackend::new(60, 8)).unwrap();
        terminal
            .draw(|frame| {
                render_traffic(
                    frame,
                    frame.area(),
                    Some(&view.connectivity),
                    &view.top_flows,
                    &Theme::dark(),
                );
            })
            .unwrap();

        let text = buffer_text(&terminal);
        assert!(text.contains("Requests: 12.50 req/s"));
        assert!(text.contains("Active flows: 2"));
        let first = text.find("luna → vesna").unwrap();
        let second = text.find("clara → luna").unwrap();
        assert!(first < second);
    }

    #[test]
    fn test_metrics_wrap_in_narrow_panel() {
        let flows: Vec<serde_json::Value> = (0..15)
            .map(|i| json!({ "source": "a", "destination": format!("b{}", i), "rate": i }))
            .collect();
        let view = view(json!({ "network_traffic": { "flows": flows } }));
        // Same width as the side column of an 80-column terminal
        let mut terminal = Terminal::new(TestBackend::new(32, 8)).unwrap();
        terminal
            .draw(|frame| {
                render_traffic(
                    frame,
                    frame.area(),
                    Some(&view.connectivity),
                    &view.top_flows,
                    &Theme::dark(),
                );
            })
            .unwrap();

        let text = buffer_text(&terminal);
        assert!(text.contains("Requests: 0.00 req/s"));
        assert!(text.contains("Errors: 0.0%"));
        assert!(text.contains("Active flows: 15"));
        assert!(text.contains("a → b14"));
    }

    #[test]
    fn test_pack_metrics() {
        let segments = || vec![vec![Span::raw("aaaa")], vec![Span::raw("bb")], vec![Span::raw("c")]];

        let wide = pack_metrics(segments(), 40);
        assert_eq!(wide.len(), 1);
        assert_eq!(wide[0].to_string(), "aaaa │ bb │ c");

        let narrow = pack_metrics(segments(), 9);
        let rows: Vec<String> = narrow.iter().map(|l| l.to_string()).collect();
        assert_eq!(rows, vec!["aaaa │ bb", "c"]);

        // A segment wider than the panel still gets its own line
        assert_eq!(pack_metrics(segments(), 2).len(), 3);
    }

    #[test]
    fn test_traffic_empty_state() {
        let view = view(json!({}));
        let mut terminal = Terminal::new(TestBackend::new(60, 6)).unwrap();
        terminal
            .draw(|frame| {
                render_traffic(
                    frame,
                    frame.area(),
                    Some(&view.connectivity),
                    &view.top_flows,
                    &Theme::dark(),
                );
            })
            .unwrap();

        let text = buffer_text(&terminal);
        assert!(text.contains("No active traffic flows"));
        assert!(text.contains("Active flows: 0"));
    }

    #[test]
    fn test_overlay_draws_lines_and_keeps_labels() {
        let view = view(json!({
            "agents": {
                "clara": { "name": "Clara" },
                "luna": { "name": "Luna" }
            },
            "network_traffic": {
                "flows": [{ "source": "Clara", "destination": "Luna", "rate": 2.0,
                            "type": "agent_to_agent" }]
            }
        }));
        let mut terminal = Terminal::new(TestBackend::new(40, 8)).unwrap();
        let mut edges = Vec::new();
        terminal
            .draw(|frame| {
                let theme = Theme::dark();
                let layout = render_agents(
                    frame,
                    frame.area(),
                    view.category(Category::Agents),
                    None,
                    &theme,
                );
                edges = project_flow_edges(&view.flows, &layout.positions);
                render_flow_overlay(frame, &layout, &edges, &theme);
            })
            .unwrap();

        assert_eq!(edges.len(), 1);
        assert!(edges[0].high_traffic);
        let text = buffer_text(&terminal);
        assert!(text.contains("● Clara"));
        assert!(text.contains("● Luna"));
        assert!(text.chars().any(|c| ('\u{2801}'..='\u{28FF}').contains(&c)));
    }
}
