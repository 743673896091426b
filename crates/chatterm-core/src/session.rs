//! Conversation session: the transcript plus the single-request guard.
//!
//! `pending` is the whole concurrency discipline. While it is set no new
//! request is handed out, so at most one completion call is ever in flight.

use tracing::{debug, warn};

use crate::config::DisplayConfig;
use crate::message::{CompletionResult, ConversationRequest, Message, Transcript};
use crate::wrap::reflow;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No request outstanding.
    Idle,
    /// Exactly one request outstanding.
    Awaiting,
}

/// Outcome of a submit attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// The message was appended; send this request.
    Dispatch(ConversationRequest),
    /// Blank input, nothing happened.
    Empty,
    /// A request is already in flight; the attempt was dropped.
    Busy,
}

#[derive(Debug, Clone)]
pub struct Session {
    transcript: Transcript,
    pending: bool,
    last_error: Option<String>,
    wrap_threshold: usize,
    wrap_width: usize,
}

impl Session {
    pub fn new(display: &DisplayConfig) -> Self {
        Self {
            transcript: Transcript::new(),
            pending: false,
            last_error: None,
            wrap_threshold: display.wrap_threshold,
            wrap_width: display.wrap_width,
        }
    }

    /// Start the session with a system prompt as the first message.
    pub fn with_system_prompt(mut self, prompt: Option<&str>) -> Self {
        if let Some(prompt) = prompt.map(str::trim).filter(|p| !p.is_empty()) {
            self.transcript.push_message(Message::system(prompt));
        }
        self
    }

    pub fn state(&self) -> SessionState {
        if self.pending {
            SessionState::Awaiting
        } else {
            SessionState::Idle
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Append the user's text and hand out a request, if the session is idle.
    pub fn submit(&mut self, input: &str) -> Submission {
        if input.trim().is_empty() {
            return Submission::Empty;
        }
        if self.pending {
            debug!("Submit ignored: a reply is still pending");
            return Submission::Busy;
        }

        self.transcript.push_message(Message::user(input));
        self.pending = true;
        let request = ConversationRequest {
            messages: self.transcript.conversation(),
        };
        debug!(messages = request.messages.len(), "Dispatching conversation");
        Submission::Dispatch(request)
    }

    /// Consume the result of the outstanding request.
    ///
    /// Returns `false` if nothing was pending, in which case the result is dropped.
    pub fn deliver(&mut self, result: CompletionResult) -> bool {
        if !self.pending {
            warn!("Completion delivered while idle; dropping it");
            return false;
        }

        match result {
            CompletionResult::Reply(message) => {
                let content = reflow(&message.content, self.wrap_threshold, self.wrap_width);
                self.transcript
                    .push_message(Message::new(message.role, content));
                self.last_error = None;
            }
            CompletionResult::Failed(error) => {
                self.transcript.push_error(error.clone());
                self.last_error = Some(error);
            }
        }
        self.pending = false;
        true
    }
}
