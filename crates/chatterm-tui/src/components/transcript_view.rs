//! Scrollable view of the conversation.
//!
//! The viewport only exists once the terminal size is known, which happens
//! on the first `Resize`. Until then nothing is drawn.

use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Paragraph, Wrap};
use ratatui::Frame;

use chatterm_core::{Entry, Transcript};

use crate::action::Action;
use crate::components::Component;
use crate::theme::Theme;

const WELCOME: [&str; 2] = [
    "Welcome to the chat room!",
    "Type a message and press Enter to send.",
];

/// Visible size of the transcript area.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u16,
    pub height: u16,
}

pub struct TranscriptViewComponent {
    viewport: Option<Viewport>,
    lines: Vec<Line<'static>>,
    /// Rows the content occupies once wrapped to the viewport width.
    total_rows: usize,
    /// Index of the first visible row.
    scroll: u16,
}

impl TranscriptViewComponent {
    pub fn new() -> Self {
        Self {
            viewport: None,
            lines: Vec::new(),
            total_rows: 0,
            scroll: 0,
        }
    }

    pub fn viewport(&self) -> Option<Viewport> {
        self.viewport
    }

    pub fn scroll(&self) -> u16 {
        self.scroll
    }

    pub fn total_rows(&self) -> usize {
        self.total_rows
    }

    /// Create the viewport on first call, resize it afterwards.
    pub fn resize(&mut self, width: u16, height: u16) {
        let viewport = Viewport { width, height };
        if self.viewport.is_none() {
            tracing::debug!(width, height, "Viewport initialized");
        }
        self.viewport = Some(viewport);
        self.recount();
        self.clamp_scroll();
    }

    /// Rebuild the displayed lines from the transcript.
    pub fn set_transcript(&mut self, transcript: &Transcript) {
        self.lines = transcript.entries().iter().flat_map(entry_lines).collect();
        self.recount();
        self.clamp_scroll();
    }

    pub fn scroll_to_bottom(&mut self) {
        self.scroll = self.max_scroll();
    }

    fn scroll_by(&mut self, delta: i32) {
        let next = (self.scroll as i32 + delta).clamp(0, self.max_scroll() as i32);
        self.scroll = next as u16;
    }

    fn max_scroll(&self) -> u16 {
        let height = self.viewport.map(|v| v.height as usize).unwrap_or(0);
        self.total_rows.saturating_sub(height).min(u16::MAX as usize) as u16
    }

    fn clamp_scroll(&mut self) {
        self.scroll = self.scroll.min(self.max_scroll());
    }

    fn recount(&mut self) {
        self.total_rows = match self.viewport {
            Some(v) if v.width > 0 => Paragraph::new(self.lines.clone())
                .wrap(Wrap { trim: false })
                .line_count(v.width),
            _ => 0,
        };
    }
}

impl Default for TranscriptViewComponent {
    fn default() -> Self {
        Self::new()
    }
}

/// Lines for one transcript entry: the sender prefix goes on the first line.
fn entry_lines(entry: &Entry) -> Vec<Line<'static>> {
    let (prefix, style, body) = match entry {
        Entry::Message(message) => (
            format!("{}: ", message.role.label()),
            Theme::sender(message.role),
            message.content.as_str(),
        ),
        Entry::Error(error) => ("Error: ".to_string(), Theme::error_prefix(), error.as_str()),
    };

    let mut body_lines = body.lines();
    let first = body_lines.next().unwrap_or_default();
    let mut lines = vec![Line::from(vec![
        Span::styled(prefix, style),
        Span::styled(first.to_string(), Theme::normal()),
    ])];
    lines.extend(
        body_lines.map(|line| Line::from(Span::styled(line.to_string(), Theme::normal()))),
    );
    lines
}

impl Component for TranscriptViewComponent {
    fn handle_action(&mut self, action: &Action) -> Option<Action> {
        let page = self.viewport.map(|v| v.height.max(1) as i32).unwrap_or(1);
        match action {
            Action::ScrollUp => self.scroll_by(-1),
            Action::ScrollDown => self.scroll_by(1),
            Action::PageUp => self.scroll_by(-page),
            Action::PageDown => self.scroll_by(page),
            _ => {}
        }
        None
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        if self.viewport.is_none() {
            return;
        }

        let paragraph = if self.lines.is_empty() {
            Paragraph::new(
                WELCOME
                    .iter()
                    .map(|line| Line::from(Span::styled(*line, Theme::muted())))
                    .collect::<Vec<_>>(),
            )
        } else {
            Paragraph::new(self.lines.clone())
                .wrap(Wrap { trim: false })
                .scroll((self.scroll, 0))
        };
        frame.render_widget(paragraph, area);
    }
}
