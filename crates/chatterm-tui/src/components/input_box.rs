//! Single-line message input with a character limit.
//!
//! The box stays editable while a reply is pending; whether a submit is
//! acted on is the app's decision, not the widget's.

use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;
use unicode_width::UnicodeWidthStr;

use crate::action::Action;
use crate::components::Component;
use crate::theme::Theme;

const PROMPT: &str = "┃ ";
const PLACEHOLDER: &str = "Send a message...";

pub struct InputBoxComponent {
    /// Current text.
    value: String,
    /// Cursor position (byte offset) within `value`.
    cursor: usize,
    /// Maximum number of characters accepted.
    char_limit: usize,
    /// Text rows inside the border.
    height: u16,
}

impl InputBoxComponent {
    pub fn new(char_limit: usize, height: u16) -> Self {
        Self {
            value: String::new(),
            cursor: 0,
            char_limit,
            height: height.max(1),
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    pub fn clear(&mut self) {
        self.value.clear();
        self.cursor = 0;
    }

    fn remaining(&self) -> usize {
        self.char_limit
            .saturating_sub(self.value.chars().count())
    }

    /// Insert a string at the cursor, truncated to the character limit.
    fn insert_str(&mut self, s: &str) {
        let take: String = s.chars().take(self.remaining()).collect();
        self.value.insert_str(self.cursor, &take);
        self.cursor += take.len();
    }

    /// Delete the character before the cursor.
    fn delete_char(&mut self) {
        if let Some((prev, _)) = self.value[..self.cursor].char_indices().next_back() {
            self.value.remove(prev);
            self.cursor = prev;
        }
    }

    /// Delete the word before the cursor (Ctrl+W).
    fn delete_word(&mut self) {
        let before = &self.value[..self.cursor];
        let trimmed = before.trim_end_matches(' ');
        let start = trimmed.rfind(' ').map(|i| i + 1).unwrap_or(0);
        self.value.drain(start..self.cursor);
        self.cursor = start;
    }

    fn cursor_left(&mut self) {
        if let Some((prev, _)) = self.value[..self.cursor].char_indices().next_back() {
            self.cursor = prev;
        }
    }

    fn cursor_right(&mut self) {
        if let Some(c) = self.value[self.cursor..].chars().next() {
            self.cursor += c.len_utf8();
        }
    }
}

impl Component for InputBoxComponent {
    fn handle_action(&mut self, action: &Action) -> Option<Action> {
        match action {
            Action::CharInput(c) => {
                let mut buf = [0u8; 4];
                self.insert_str(c.encode_utf8(&mut buf));
            }
            Action::PasteBulk(text) => {
                let flattened = text.replace("\r\n", " ").replace(['\n', '\r'], " ");
                self.insert_str(&flattened);
            }
            Action::BackspaceInput => self.delete_char(),
            Action::DeleteWord => self.delete_word(),
            Action::CursorLeft => self.cursor_left(),
            Action::CursorRight => self.cursor_right(),
            Action::CursorHome => self.cursor = 0,
            Action::CursorEnd => self.cursor = self.value.len(),
            _ => {}
        }
        None
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Theme::border());

        let line = if self.value.is_empty() {
            Line::from(vec![
                Span::styled(PROMPT, Theme::key_hint()),
                Span::styled(" ", Theme::cursor()),
                Span::styled(PLACEHOLDER, Theme::dim()),
            ])
        } else {
            let (before, after) = self.value.split_at(self.cursor);
            let mut rest = after.chars();
            let cursor_char = rest.next().map(String::from).unwrap_or_else(|| " ".to_string());
            Line::from(vec![
                Span::styled(PROMPT, Theme::key_hint()),
                Span::styled(before, Theme::normal()),
                Span::styled(cursor_char, Theme::cursor()),
                Span::styled(rest.as_str(), Theme::normal()),
            ])
        };

        // Keep the cursor's row in view once the text wraps past the box.
        let inner_width = area.width.saturating_sub(2).max(1) as usize;
        let cursor_col = PROMPT.width() + self.value[..self.cursor].width();
        let cursor_row = (cursor_col / inner_width) as u16;
        let scroll = cursor_row.saturating_sub(self.height.saturating_sub(1));

        let paragraph = Paragraph::new(line)
            .wrap(Wrap { trim: false })
            .scroll((scroll, 0))
            .block(block);
        frame.render_widget(paragraph, area);
    }
}
