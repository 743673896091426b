//! Key hint line at the bottom of the TUI.

use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::components::Component;
use crate::theme::Theme;

const HINT: &str = "Press Enter to send message. Ctrl+C to quit. ↑/↓ to scroll. F10 toggles fullscreen.";

pub struct StatusBarComponent {
    /// Model name shown on the right.
    pub model: String,
    /// Whether a reply is pending.
    pub waiting: bool,
}

impl StatusBarComponent {
    pub fn new(model: String) -> Self {
        Self {
            model,
            waiting: false,
        }
    }

    fn badge(&self) -> &'static str {
        if self.waiting {
            "Waiting"
        } else {
            "Ready"
        }
    }
}

impl Component for StatusBarComponent {
    fn render(&self, frame: &mut Frame, area: Rect) {
        let width = area.width as usize;

        let badge = self.badge();
        let badge_len = badge.len() + 2; // spaces around badge
        let model_len = self.model.chars().count() + 1; // trailing space

        let hint_budget = width
            .saturating_sub(badge_len)
            .saturating_sub(model_len)
            .saturating_sub(3);

        let hint_len = HINT.chars().count();
        let hint: String = if hint_len > hint_budget {
            if hint_budget > 3 {
                let mut s: String = HINT.chars().take(hint_budget - 3).collect();
                s.push_str("...");
                s
            } else {
                String::new()
            }
        } else {
            HINT.to_string()
        };

        // Pad to push the model name to the right edge
        let used = badge_len + 2 + hint.chars().count();
        let pad = width.saturating_sub(used + model_len);

        let line = Line::from(vec![
            Span::styled(format!(" {} ", badge), Theme::badge(self.waiting)),
            Span::styled("  ", Theme::dim()),
            Span::styled(hint, Theme::dim()),
            Span::raw(" ".repeat(pad)),
            Span::styled(self.model.as_str(), Theme::key_hint()),
            Span::raw(" "),
        ]);

        frame.render_widget(Paragraph::new(line), area);
    }
}
