//! Color scheme and styling for the TUI.

use ratatui::style::{Color, Modifier, Style};

use chatterm_core::Role;

/// The color palette for chatterm's TUI.
pub struct Theme;

impl Theme {
    // ── Base colors ─────────────────────────────────────────
    pub fn bg() -> Color {
        Color::Reset
    }

    pub fn fg() -> Color {
        Color::Rgb(200, 200, 200)
    }

    pub fn fg_dim() -> Color {
        Color::Rgb(100, 100, 100)
    }

    pub fn fg_muted() -> Color {
        Color::Rgb(140, 140, 140)
    }

    // ── Accent colors ───────────────────────────────────────
    pub fn accent() -> Color {
        Color::Rgb(110, 170, 255)
    }

    pub fn accent_secondary() -> Color {
        Color::Rgb(180, 130, 240)
    }

    pub fn warning() -> Color {
        Color::Rgb(230, 180, 80)
    }

    pub fn error() -> Color {
        Color::Rgb(240, 80, 80)
    }

    // ── Structural colors ───────────────────────────────────
    pub fn border_color() -> Color {
        Color::Rgb(60, 60, 60)
    }

    // ── Composite styles ────────────────────────────────────

    pub fn normal() -> Style {
        Style::default().fg(Self::fg())
    }

    pub fn dim() -> Style {
        Style::default().fg(Self::fg_dim())
    }

    pub fn muted() -> Style {
        Style::default().fg(Self::fg_muted())
    }

    pub fn border() -> Style {
        Style::default().fg(Self::border_color())
    }

    pub fn key_hint() -> Style {
        Style::default().fg(Self::accent())
    }

    pub fn cursor() -> Style {
        Style::default().fg(Self::bg()).bg(Self::accent())
    }

    pub fn spinner() -> Style {
        Style::default().fg(Self::accent_secondary())
    }

    /// Sender prefix in the transcript ("You:", "Assistant:", ...).
    pub fn sender(role: Role) -> Style {
        let color = match role {
            Role::User => Self::accent_secondary(),
            Role::Assistant => Self::accent(),
            Role::System => Self::warning(),
        };
        Style::default().fg(color).add_modifier(Modifier::BOLD)
    }

    pub fn error_prefix() -> Style {
        Style::default()
            .fg(Self::error())
            .add_modifier(Modifier::BOLD)
    }

    pub fn badge(waiting: bool) -> Style {
        let color = if waiting {
            Self::warning()
        } else {
            Self::fg_muted()
        };
        Style::default().fg(color)
    }
}
