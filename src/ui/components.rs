//! Component panels: the agent field and the per-category lists.
//!
//! The agent field is the first half of a two-phase render. It lays the
//! agent nodes out on a grid, draws them, and hands back where each one
//! landed so the traffic overlay can connect them.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
    Frame,
};

use super::theme::Theme;
use super::{HitTarget, Hitbox};
use crate::data::{AgentPositions, CategoryView, ComponentCard, Position};
use crate::source::Category;

/// Width of one agent cell.
const CELL_W: u16 = 16;
/// Height of one agent cell; the label sits on the middle row.
const CELL_H: u16 = 3;

/// One drawn agent label, kept so the overlay can repaint it on top.
#[derive(Debug, Clone)]
pub struct NodeLabel {
    pub position: Position,
    pub text: String,
    pub style: Style,
}

/// Result of drawing the agent field.
#[derive(Debug, Clone, Default)]
pub struct AgentLayout {
    /// Inner area of the agent panel; overlay coordinates are relative to it.
    pub area: Rect,
    pub positions: AgentPositions,
    pub labels: Vec<NodeLabel>,
    pub hitboxes: Vec<Hitbox>,
}

fn panel<'a>(title: &'a str, focused: bool, theme: &Theme) -> Block<'a> {
    let title_style = if focused { theme.focused } else { theme.header };
    Block::default()
        .title(Span::styled(format!(" {} ", title), title_style))
        .borders(Borders::ALL)
        .border_type(theme.border_type)
        .border_style(Style::default().fg(theme.border))
}

/// Narrow panels wrap the marker at word boundaries.
fn empty_message(frame: &mut Frame, area: Rect, message: &str) {
    let paragraph = Paragraph::new(message)
        .style(Style::default().add_modifier(Modifier::DIM))
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

/// Draw the agent nodes and report their positions.
///
/// Agents that do not fit the panel are not drawn and get no position.
pub fn render_agents(
    frame: &mut Frame,
    area: Rect,
    agents: Option<&CategoryView>,
    selected: Option<usize>,
    theme: &Theme,
) -> AgentLayout {
    let block = panel(Category::Agents.title(), selected.is_some(), theme);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut layout = AgentLayout {
        area: inner,
        ..Default::default()
    };

    let cards = match agents {
        Some(CategoryView::Components { cards }) => cards,
        Some(CategoryView::Empty { message }) => {
            empty_message(frame, inner, message);
            return layout;
        }
        None => {
            empty_message(frame, inner, "Waiting for cluster data...");
            return layout;
        }
    };

    let columns = (inner.width / CELL_W).max(1);
    let rows = inner.height / CELL_H;
    let capacity = usize::from(columns) * usize::from(rows);

    for (index, card) in cards.iter().enumerate().take(capacity) {
        let col = (index % usize::from(columns)) as u16;
        let row = (index / usize::from(columns)) as u16;

        let text = node_text(card);
        let width = (text.chars().count() as u16).min(CELL_W - 1).min(inner.width);
        let local_x = col * CELL_W + (CELL_W.min(inner.width) - width) / 2;
        let local_y = row * CELL_H + CELL_H / 2;

        let mut style = theme.ready_style(card.ready);
        if card.breathing {
            style = style.add_modifier(Modifier::BOLD);
        }
        if selected == Some(index) {
            style = style.patch(theme.selected);
        }

        let label_area = Rect::new(inner.x + local_x, inner.y + local_y, width, 1);
        frame.render_widget(Paragraph::new(Line::styled(text.clone(), style)), label_area);

        // Canvas space: one unit per cell, y grows upwards
        let position = Position::new(
            f64::from(local_x + width / 2),
            f64::from(inner.height.saturating_sub(1) - local_y),
        );
        layout.positions.insert(&card.name, &card.id, position);
        layout.labels.push(NodeLabel {
            position: Position::new(f64::from(local_x), position.y),
            text,
            style,
        });
        layout.hitboxes.push(Hitbox {
            area: label_area,
            target: HitTarget::Agent(card.name.clone()),
        });
    }

    layout
}

fn node_text(card: &ComponentCard) -> String {
    let symbol = if card.breathing { "◉" } else { "●" };
    let name: String = card.name.chars().take(usize::from(CELL_W) - 3).collect();
    format!("{} {}", symbol, name)
}

/// Draw a plain category panel (ingress, models, memory, telemetry).
///
/// Returns one hitbox per visible row.
pub fn render_category(
    frame: &mut Frame,
    area: Rect,
    category: Category,
    listing: Option<&CategoryView>,
    selected: Option<usize>,
    theme: &Theme,
) -> Vec<Hitbox> {
    let block = panel(category.title(), selected.is_some(), theme);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let cards = match listing {
        Some(CategoryView::Components { cards }) => cards,
        Some(CategoryView::Empty { message }) => {
            empty_message(frame, inner, message);
            return Vec::new();
        }
        None => return Vec::new(),
    };

    let items: Vec<ListItem> = cards
        .iter()
        .enumerate()
        .map(|(index, card)| {
            let mut name_style = Style::default().add_modifier(Modifier::BOLD);
            if selected == Some(index) {
                name_style = name_style.patch(theme.selected);
            }
            let mut spans = vec![
                Span::styled(card.name.clone(), name_style),
                Span::raw(" "),
                Span::styled(card.status_text.clone(), theme.ready_style(card.ready)),
            ];
            if category == Category::Telemetry && card.url.is_some() {
                spans.push(Span::styled(" ↗", Style::default().fg(theme.highlight)));
            }
            ListItem::new(Line::from(spans))
        })
        .collect();
    frame.render_widget(List::new(items), inner);

    let target = |index: usize| match category {
        Category::Telemetry => HitTarget::Telemetry(index),
        _ => HitTarget::Component(category, index),
    };
    cards
        .iter()
        .enumerate()
        .take(usize::from(inner.height))
        .map(|(index, _)| Hitbox {
            area: Rect::new(inner.x, inner.y + index as u16, inner.width, 1),
            target: target(index),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{DashboardView, SnapshotStore};
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
    fn test_agents_get_distinct_positions() {
        let view = view(json!({
            "agents": {
                "clara": { "name": "Clara", "ready": true },
                "luna": { "name": "Luna" },
                "vesna": { "name": "Vesna", "breathing": "deep" }
            }
        }));
        let mut terminal = Terminal::new(TestBackend::new(40, 12)).unwrap();
        let mut layout = AgentLayout::default();
        terminal
            .draw(|frame| {
                layout = render_agents(
                    frame,
                    frame.area(),
                    view.category(Category::Agents),
                    None,
                    &Theme::dark(),
                );
            })
            .unwrap();

        assert_eq!(layout.positions.len(), 3);
        let clara = layout.positions.get("Clara").unwrap();
        let luna = layout.positions.get("luna").unwrap();
        let vesna = layout.positions.get("Vesna").unwrap();
        assert_ne!(clara, luna);
        // 38 columns inside the border fit two cells per row
        assert_eq!(clara.y, luna.y);
        assert!(vesna.y < clara.y);
        assert_eq!(layout.hitboxes.len(), 3);

        let text = buffer_text(&terminal);
        assert!(text.contains("● Clara"));
        assert!(text.contains("◉ Vesna"));
    }

    #[test]
    fn test_agents_empty_marker() {
        let view = view(json!({}));
        let mut terminal = Terminal::new(TestBackend::new(40, 8)).unwrap();
        let mut layout = AgentLayout::default();
        terminal
            .draw(|frame| {
                layout = render_agents(
                    frame,
                    frame.area(),
                    view.category(Category::Agents),
                    None,
                    &Theme::dark(),
                );
            })
            .unwrap();

        assert!(layout.positions.is_empty());
        assert!(buffer_text(&terminal).contains("No agents detected"));
    }

    #[test]
    fn test_agents_beyond_capacity_are_not_positioned() {
        let agents: serde_json::Map<String, serde_json::Value> = (0..10)
            .map(|i| (format!("a{}", i), json!({ "name": format!("A{}", i) })))
            .collect();
        let view = view(json!({ "agents": agents }));
        // Inner area 18x3: one cell per row, one row
        let mut terminal = Terminal::new(TestBackend::new(20, 5)).unwrap();
        let mut layout = AgentLayout::default();
        terminal
            .draw(|frame| {
                layout = render_agents(
                    frame,
                    frame.area(),
                    view.category(Category::Agents),
                    None,
                    &Theme::dark(),
                );
            })
            .unwrap();

        assert_eq!(layout.positions.len(), 1);
        assert!(layout.positions.get("A1").is_none());
    }

    #[test]
    fn test_category_panel_rows_and_hitboxes() {
        let view = view(json!({
            "telemetry": {
                "grafana": { "name": "grafana", "ready": true, "url": "http://localhost:3000" },
                "loki": { "name": "loki", "status": "CrashLoop" }
            }
        }));
        let mut terminal = Terminal::new(TestBackend::new(40, 6)).unwrap();
        let mut hitboxes = Vec::new();
        terminal
            .draw(|frame| {
                hitboxes = render_category(
                    frame,
                    frame.area(),
                    Category::Telemetry,
                    view.category(Category::Telemetry),
                    Some(0),
                    &Theme::dark(),
                );
            })
            .unwrap();

        assert_eq!(hitboxes.len(), 2);
        assert_eq!(hitboxes[1].target, HitTarget::Telemetry(1));
        let text = buffer_text(&terminal);
        assert!(text.contains("grafana Ready ↗"));
        assert!(text.contains("loki CrashLoop"));
    }

    #[test]
    fn test_empty_marker_wraps_in_narrow_panel() {
        let view = view(json!({}));
        // One fifth of an 80-column terminal
        let mut terminal = Terminal::new(TestBackend::new(16, 6)).unwrap();
        terminal
            .draw(|frame| {
                render_category(
                    frame,
                    frame.area(),
                    Category::Models,
                    view.category(Category::Models),
                    None,
                    &Theme::dark(),
                );
            })
            .unwrap();

        let buffer = terminal.backend().buffer();
        let rows: Vec<String> = (1..5u16)
            .map(|y| {
                (1..15u16)
                    .map(|x| buffer[(x, y)].symbol())
                    .collect::<String>()
                    .trim()
                    .to_string()
            })
            .collect();
        assert_eq!(rows, vec!["No model", "instances", "detected", ""]);
    }
}
