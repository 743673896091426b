//! Action enum: the central message bus for the TUI.
//! Key presses, resizes, ticks and completion results all flow through here.

use chatterm_core::{CompletionResult, ConversationRequest};

/// Every possible action that can occur in the application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    // ── Global ──────────────────────────────────────────────
    /// Quit the application.
    Quit,
    /// Enter or leave the alternate screen.
    ToggleAltScreen,
    /// The terminal was resized to (width, height).
    Resize(u16, u16),
    /// A tick event for the busy spinner.
    Tick,

    // ── Conversation ────────────────────────────────────────
    /// Send the input buffer.
    Submit,
    /// The outstanding completion came back.
    CompletionDelivered(CompletionResult),

    // ── Text Input ──────────────────────────────────────────
    /// A character was typed.
    CharInput(char),
    /// Backspace pressed.
    BackspaceInput,
    /// Delete word (Ctrl+W).
    DeleteWord,
    /// Bulk paste from bracketed paste mode.
    PasteBulk(String),
    CursorLeft,
    CursorRight,
    CursorHome,
    CursorEnd,

    // ── Scrolling ───────────────────────────────────────────
    ScrollUp,
    ScrollDown,
    PageUp,
    PageDown,
}

/// Side effects the render loop performs on behalf of the app.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Hand this conversation to the completion gateway.
    Dispatch(ConversationRequest),
    /// Switch to (`true`) or away from (`false`) the alternate screen.
    AltScreen(bool),
}
