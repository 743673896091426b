use serde::{Deserialize, Serialize};

/// Who authored a message. Forwarded verbatim to the completion service.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl Role {
    /// Wire name used by the completion service.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        }
    }

    /// Parse a wire role. Unknown roles are not an error; callers decide the fallback.
    pub fn from_wire(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "user" => Some(Role::User),
            "assistant" => Some(Role::Assistant),
            "system" => Some(Role::System),
            _ => None,
        }
    }

    /// Prefix shown in front of the message body in the transcript.
    pub fn label(&self) -> &'static str {
        match self {
            Role::User => "You",
            Role::Assistant => "Assistant",
            Role::System => "System",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }
}

/// One line of the visible transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    Message(Message),
    /// A failed completion. Shown to the user, never sent back as context.
    Error(String),
}

/// Ordered, append-only history of a session.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    entries: Vec<Entry>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_message(&mut self, message: Message) {
        self.entries.push(Entry::Message(message));
    }

    pub fn push_error(&mut self, error: impl Into<String>) {
        self.entries.push(Entry::Error(error.into()));
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The messages sent to the completion service, in display order.
    pub fn conversation(&self) -> Vec<Message> {
        self.entries
            .iter()
            .filter_map(|entry| match entry {
                Entry::Message(message) => Some(message.clone()),
                Entry::Error(_) => None,
            })
            .collect()
    }
}

/// A snapshot of the conversation, owned by the one in-flight completion call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationRequest {
    pub messages: Vec<Message>,
}

/// What came back from the completion service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionResult {
    Reply(Message),
    Failed(String),
}
