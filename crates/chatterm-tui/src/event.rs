//! Terminal event handling. Captures keyboard, mouse, paste and resize
//! events from crossterm and dispatches them as Actions.
//!
//! There is a single keymap: the input box always has focus, so printable
//! keys become `CharInput` and only a handful of keys are reserved.

use crossterm::event::{
    Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEventKind,
};
use futures_util::{Stream, StreamExt};
use std::io;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::warn;

use crate::action::Action;

/// Event loop that reads terminal events and sends Actions.
pub struct EventHandler {
    tx: mpsc::UnboundedSender<Action>,
    tick_rate: Duration,
}

impl EventHandler {
    pub fn new(tx: mpsc::UnboundedSender<Action>, tick_rate: Duration) -> Self {
        Self { tx, tick_rate }
    }

    /// Run the event loop. This blocks and should be spawned in a task.
    pub async fn run(&self) {
        self.forward(EventStream::new()).await;
    }

    /// Interleave ticks with `events` until either side closes.
    ///
    /// `StreamExt::next` is cancel-safe, so losing the race to a tick never
    /// drops an event that was already read from the terminal.
    async fn forward<S>(&self, events: S)
    where
        S: Stream<Item = io::Result<Event>>,
    {
        futures_util::pin_mut!(events);
        let mut interval = tokio::time::interval(self.tick_rate);

        loop {
            let action = tokio::select! {
                _ = interval.tick() => Some(Action::Tick),
                event = events.next() => match event {
                    Some(Ok(event)) => map_event(event),
                    Some(Err(e)) => {
                        warn!("Failed to read terminal event: {}", e);
                        None
                    }
                    None => break,
                },
            };

            if let Some(action) = action {
                if self.tx.send(action).is_err() {
                    break;
                }
            }
        }
    }
}

pub fn map_event(event: Event) -> Option<Action> {
    match event {
        Event::Key(key) => map_key(key),
        Event::Paste(text) => Some(Action::PasteBulk(text)),
        Event::Resize(width, height) => Some(Action::Resize(width, height)),
        Event::Mouse(mouse) => match mouse.kind {
            MouseEventKind::ScrollUp => Some(Action::ScrollUp),
            MouseEventKind::ScrollDown => Some(Action::ScrollDown),
            _ => None,
        },
        _ => None,
    }
}

pub fn map_key(key: KeyEvent) -> Option<Action> {
    // Windows reports releases too.
    if key.kind == KeyEventKind::Release {
        return None;
    }

    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') => Some(Action::Quit),
            KeyCode::Char('w') => Some(Action::DeleteWord),
            KeyCode::Char('a') => Some(Action::CursorHome),
            KeyCode::Char('e') => Some(Action::CursorEnd),
            _ => None,
        };
    }

    match key.code {
        KeyCode::Esc => Some(Action::Quit),
        KeyCode::F(10) => Some(Action::ToggleAltScreen),
        KeyCode::Enter => Some(Action::Submit),
        KeyCode::Up => Some(Action::ScrollUp),
        KeyCode::Down => Some(Action::ScrollDown),
        KeyCode::PageUp => Some(Action::PageUp),
        KeyCode::PageDown => Some(Action::PageDown),
        KeyCode::Left => Some(Action::CursorLeft),
        KeyCode::Right => Some(Action::CursorRight),
        KeyCode::Home => Some(Action::CursorHome),
        KeyCode::End => Some(Action::CursorEnd),
        KeyCode::Backspace => Some(Action::BackspaceInput),
        KeyCode::Char(c) => Some(Action::CharInput(c)),
        _ => None,
    }
}
