use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, MouseButton, MouseEvent, MouseEventKind};

use crate::app::App;
use crate::ui::HitTarget;

/// Where the `e` key writes the dashboard summary.
pub const EXPORT_FILE: &str = "sanctuary_export.json";

/// Poll for events with a timeout
pub fn poll_event(timeout: Duration) -> Result<Option<Event>> {
    if event::poll(timeout)? {
        Ok(Some(event::read()?))
    } else {
        Ok(None)
    }
}

/// Handle a key event
pub fn handle_key_event(app: &mut App, key: KeyEvent) {
    // If help is shown, any key closes it
    if app.show_help {
        app.show_help = false;
        return;
    }

    // If detail overlay is shown, handle overlay-specific keys
    if app.detail_open() {
        match key.code {
            KeyCode::Esc | KeyCode::Enter | KeyCode::Backspace | KeyCode::Char('q') => {
                app.close_overlay();
            }
            _ => {}
        }
        return;
    }

    match key.code {
        // Quit
        KeyCode::Char('q') => app.quit(),

        // Switch between the agent field and the telemetry list
        KeyCode::Tab | KeyCode::BackTab => app.toggle_focus(),

        // Navigation
        KeyCode::Up | KeyCode::Char('k') => app.select_prev(),
        KeyCode::Down | KeyCode::Char('j') => app.select_next(),

        // Agent detail or telemetry link
        KeyCode::Enter => app.activate_selected(),

        KeyCode::Esc => app.close_overlay(),

        // Ask the producer for a fresh snapshot
        KeyCode::Char('r') => app.refresh(),

        // Help
        KeyCode::Char('?') => app.toggle_help(),

        // Export
        KeyCode::Char('e') => {
            let export_path = PathBuf::from(EXPORT_FILE);
            match app.export_state(&export_path) {
                Ok(()) => {
                    app.set_status_message(format!("Exported to {}", export_path.display()));
                }
                Err(e) => {
                    app.set_status_message(format!("Export failed: {}", e));
                }
            }
        }

        _ => {}
    }
}

/// Handle mouse events
///
/// Clicks are resolved against the hitboxes recorded by the last frame.
pub fn handle_mouse_event(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        // Scroll wheel
        MouseEventKind::ScrollUp => {
            app.select_prev();
        }
        MouseEventKind::ScrollDown => {
            app.select_next();
        }

        MouseEventKind::Down(MouseButton::Left) => {
            if app.show_help {
                app.show_help = false;
                return;
            }
            if app.detail_open() {
                app.close_overlay();
                return;
            }

            let target = app
                .hitboxes
                .iter()
                .find(|h| h.contains(mouse.column, mouse.row))
                .map(|h| h.target.clone());
            match target {
                Some(HitTarget::Agent(name)) => app.open_agent_detail(&name),
                Some(HitTarget::Telemetry(index)) => app.click_telemetry(index),
                Some(HitTarget::Component(category, index)) => app.show_tooltip(category, index),
                None => {}
            }
        }

        // Right-click closes overlays
        MouseEventKind::Down(MouseButton::Right) => {
            app.close_overlay();
        }

        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{Category, ChannelEvent, ChannelSource};
    use crate::ui::Hitbox;
    use crossterm::event::KeyModifiers;
    use ratatui::layout::Rect;
    use serde_json::json;
    use std::time::Instant;

    fn ok_opener(_: &str) -> std::io::Result<()> {
        Ok(())
    }

    fn app() -> App {
        let (producer, source) = ChannelSource::create("test");
        let mut app = App::new(Box::new(source)).with_link_opener(ok_opener);
        producer.send(ChannelEvent::ClusterUpdate(json!({
            "agents": { "clara": { "name": "Clara", "status": "Running", "essence": "kind" } },
            "ingress": { "gateway": { "name": "gateway", "status": "Running" } },
            "telemetry": { "grafana": { "name": "grafana", "url": "http://localhost:3000" } }
        })));
        for event in app.poll_events(Instant::now()) {
            app.handle(event);
        }
        app
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn click(column: u16, row: u16) -> MouseEvent {
        MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    #[test]
    fn test_quit_and_help() {
        let mut app = app();
        handle_key_event(&mut app, key(KeyCode::Char('?')));
        assert!(app.show_help);

        // Any key closes help without acting
        handle_key_event(&mut app, key(KeyCode::Char('q')));
        assert!(!app.show_help);
        assert!(app.running);

        handle_key_event(&mut app, key(KeyCode::Char('q')));
        assert!(!app.running);
    }

    #[test]
    fn test_enter_opens_detail_and_esc_closes() {
        let mut app = app();
        handle_key_event(&mut app, key(KeyCode::Enter));
        assert!(app.detail_open());

        // q closes the overlay instead of quitting
        handle_key_event(&mut app, key(KeyCode::Char('q')));
        assert!(!app.detail_open());
        assert!(app.running);
    }

    #[test]
    fn test_tab_switches_focus() {
        let mut app = app();
        handle_key_event(&mut app, key(KeyCode::Tab));
        handle_key_event(&mut app, key(KeyCode::Enter));
        assert_eq!(app.get_status_message(), Some("Opened http://localhost:3000"));
    }

    #[test]
    fn test_refresh_key_when_disconnected() {
        let mut app = app();
        handle_key_event(&mut app, key(KeyCode::Char('r')));
        assert_eq!(app.get_status_message(), Some("Not connected (Connecting...)"));
    }

    #[test]
    fn test_clicks_resolve_hitboxes() {
        let mut app = app();
        app.hitboxes = vec![
            Hitbox {
                area: Rect::new(2, 2, 8, 1),
                target: HitTarget::Agent("Clara".to_string()),
            },
            Hitbox {
                area: Rect::new(2, 10, 20, 1),
                target: HitTarget::Telemetry(0),
            },
            Hitbox {
                area: Rect::new(30, 10, 20, 1),
                target: HitTarget::Component(Category::Ingress, 0),
            },
        ];

        handle_mouse_event(&mut app, click(5, 2));
        assert_eq!(app.agent_detail().unwrap().name, "Clara");
        assert_eq!(app.get_status_message(), Some("Clara - Running (kind)"));

        // A click anywhere dismisses the overlay first
        handle_mouse_event(&mut app, click(60, 20));
        assert!(!app.detail_open());

        handle_mouse_event(&mut app, click(3, 10));
        assert_eq!(app.get_status_message(), Some("Opened http://localhost:3000"));

        handle_mouse_event(&mut app, click(31, 10));
        assert_eq!(app.get_status_message(), Some("gateway - Running"));
    }
}
