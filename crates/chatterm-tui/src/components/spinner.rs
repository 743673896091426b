//! Busy indicator shown while a reply is pending.

use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::components::Component;
use crate::theme::Theme;

const FRAMES: &[&str] = &["🌍", "🌎", "🌏"];

pub struct SpinnerComponent {
    active: bool,
    frame: usize,
}

impl SpinnerComponent {
    pub fn new() -> Self {
        Self {
            active: false,
            frame: 0,
        }
    }

    pub fn start(&mut self) {
        self.active = true;
        self.frame = 0;
    }

    pub fn stop(&mut self) {
        self.active = false;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn frame(&self) -> usize {
        self.frame
    }

    /// Advance one frame. No-op while stopped.
    pub fn tick(&mut self) {
        if self.active {
            self.frame = (self.frame + 1) % FRAMES.len();
        }
    }
}

impl Default for SpinnerComponent {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for SpinnerComponent {
    fn render(&self, frame: &mut Frame, area: Rect) {
        if !self.active {
            return;
        }
        let line = Line::from(vec![
            Span::styled(FRAMES[self.frame], Theme::spinner()),
            Span::styled(" Thinking...", Theme::muted()),
        ]);
        frame.render_widget(Paragraph::new(line), area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticks_only_while_active() {
        let mut spinner = SpinnerComponent::new();
        spinner.tick();
        assert_eq!(spinner.frame(), 0);

        spinner.start();
        spinner.tick();
        spinner.tick();
        assert_eq!(spinner.frame(), 2);
        spinner.tick();
        assert_eq!(spinner.frame(), 0);

        spinner.stop();
        spinner.tick();
        assert_eq!(spinner.frame(), 0);
        assert!(!spinner.is_active());
    }
}
