//! Common UI components shared across panels.
//!
//! This module contains the header bar, status bar, and help overlay.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::app::{App, Focus};

/// Render the header bar.
///
/// Displays: connection indicator, source, component counts.
pub fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let phase = app.phase();
    let mut spans = vec![
        Span::styled(" ● ", app.theme.phase_style(phase)),
        Span::styled("SANCTUARY ", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw("│ "),
        Span::styled(phase.label().to_string(), app.theme.phase_style(phase)),
        Span::raw(" │ "),
        Span::styled(
            app.source_description().to_string(),
            Style::default().add_modifier(Modifier::DIM),
        ),
    ];

    if let Some(view) = app.surface.view() {
        let components: usize = view.categories.iter().map(|(_, c)| c.cards().len()).sum();
        spans.push(Span::raw(" │ "));
        spans.push(Span::styled(
            app.agent_cards().len().to_string(),
            Style::default().add_modifier(Modifier::BOLD),
        ));
        spans.push(Span::raw(" agents "));
        spans.push(Span::styled(
            components.to_string(),
            Style::default().add_modifier(Modifier::BOLD),
        ));
        spans.push(Span::raw(" components"));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Render the status bar at the bottom.
///
/// Shows: staleness, available controls. Temporary status messages take
/// the whole line while they last.
pub fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    if let Some(msg) = app.get_status_message() {
        let paragraph =
            Paragraph::new(format!(" {} ", msg)).style(Style::default().fg(app.theme.highlight));
        frame.render_widget(paragraph, area);
        return;
    }

    let controls = match app.focus {
        Focus::Agents => "Tab:telemetry ↑↓:select Enter:detail r:refresh e:export ?:help q:quit",
        Focus::Telemetry => "Tab:agents ↑↓:select Enter:open r:refresh e:export ?:help q:quit",
    };

    let status = match app.surface.staleness() {
        Some(staleness) => format!(" {} | {}", staleness, controls),
        None => format!(" {} | q:quit", app.phase().label()),
    };

    let paragraph = Paragraph::new(status).style(Style::default().add_modifier(Modifier::DIM));
    frame.render_widget(paragraph, area);
}

/// Render the help overlay with keyboard shortcuts.
///
/// Displayed as a centered modal on top of the dashboard.
pub fn render_help(frame: &mut Frame, app: &App, area: Rect) {
    let help_text = vec![
        Line::from(vec![Span::styled("Keyboard Shortcuts", app.theme.header)]),
        Line::from(""),
        Line::from(vec![Span::styled(
            " Navigation",
            Style::default().add_modifier(Modifier::BOLD),
        )]),
        Line::from("  Tab         Switch agents/telemetry"),
        Line::from("  ↑/↓ j/k     Move selection"),
        Line::from("  Enter       Agent detail / open link"),
        Line::from("  Esc         Close overlay"),
        Line::from("  Click       Select agent or link"),
        Line::from(""),
        Line::from(vec![Span::styled(
            " General",
            Style::default().add_modifier(Modifier::BOLD),
        )]),
        Line::from("  r         Request a fresh snapshot"),
        Line::from("  e         Export to JSON"),
        Line::from("  q         Quit"),
        Line::from(""),
        Line::from(vec![Span::styled(
            "Press any key to close",
            Style::default().add_modifier(Modifier::DIM),
        )]),
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.highlight));

    let paragraph = Paragraph::new(help_text).block(block);

    // Center the help overlay - responsive to terminal size
    let help_width = 44u16.min(area.width.saturating_sub(4));
    let help_height = 19u16.min(area.height.saturating_sub(2));
    let x = area.x + (area.width.saturating_sub(help_width)) / 2;
    let y = area.y + (area.height.saturating_sub(help_height)) / 2;
    let help_area = Rect::new(x, y, help_width, help_height);

    // Clear the area behind the help
    frame.render_widget(ratatui::widgets::Clear, help_area);
    frame.render_widget(paragraph, help_area);
}
