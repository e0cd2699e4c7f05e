//! Theme configuration for the TUI.
//!
//! Supports light and dark themes with automatic terminal detection.

use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::block::BorderType;

use crate::config::ThemeChoice;
use crate::connection::ConnectionPhase;
use crate::data::HealthBand;

/// Color and style theme for the TUI.
///
/// Use [`Theme::auto_detect()`] for automatic theme selection based on
/// terminal background, or [`Theme::dark()`]/[`Theme::light()`] explicitly.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Accent color for highlights and active elements.
    pub highlight: Color,
    /// Medium health band, connecting state, warning pods.
    pub warning: Color,
    /// Low health band, lost connection, crashing pods.
    pub critical: Color,
    /// High health band, ready components.
    pub healthy: Color,
    /// Color for borders and separators.
    pub border: Color,
    /// Traffic edges below the high-traffic rate.
    pub flow: Color,
    /// Style for section titles.
    pub header: Style,
    /// Style for the selected item.
    pub selected: Style,
    /// Style for the focused panel's title.
    pub focused: Style,
    /// Border style (rounded, plain, etc.).
    pub border_type: BorderType,
}

impl Theme {
    /// Create a dark theme suitable for dark terminal backgrounds.
    pub fn dark() -> Self {
        Self {
            highlight: Color::Cyan,
            warning: Color::Rgb(255, 165, 0),
            critical: Color::Red,
            healthy: Color::Green,
            border: Color::Gray,
            flow: Color::Blue,
            header: Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            selected: Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD),
            focused: Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            border_type: BorderType::Rounded,
        }
    }

    /// Create a light theme suitable for light terminal backgrounds.
    pub fn light() -> Self {
        Self {
            highlight: Color::Blue,
            warning: Color::Rgb(215, 120, 0),
            critical: Color::Red,
            healthy: Color::Green,
            border: Color::DarkGray,
            flow: Color::Blue,
            header: Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
            selected: Style::default().bg(Color::LightBlue).add_modifier(Modifier::BOLD),
            focused: Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
            border_type: BorderType::Rounded,
        }
    }

    /// Auto-detect based on terminal background
    pub fn auto_detect() -> Self {
        // Use terminal-light crate to detect background luminance
        match terminal_light::luma() {
            Ok(luma) if luma > 0.5 => Self::light(),
            _ => Self::dark(),
        }
    }

    pub fn from_choice(choice: ThemeChoice) -> Self {
        match choice {
            ThemeChoice::Auto => Self::auto_detect(),
            ThemeChoice::Dark => Self::dark(),
            ThemeChoice::Light => Self::light(),
        }
    }

    /// Fixed color for each health band.
    pub fn band_color(&self, band: HealthBand) -> Color {
        match band {
            HealthBand::High => self.healthy,
            HealthBand::Medium => self.warning,
            HealthBand::Low => self.critical,
        }
    }

    /// Style for the connection indicator.
    pub fn phase_style(&self, phase: &ConnectionPhase) -> Style {
        match phase {
            ConnectionPhase::Connected => Style::default().fg(self.healthy),
            ConnectionPhase::Connecting => Style::default().fg(self.warning),
            ConnectionPhase::Disconnected | ConnectionPhase::Error(_) => {
                Style::default().fg(self.critical).add_modifier(Modifier::BOLD)
            }
        }
    }

    /// Style for a component's status text.
    pub fn ready_style(&self, ready: bool) -> Style {
        if ready {
            Style::default().fg(self.healthy)
        } else {
            Style::default().fg(self.critical)
        }
    }
}
