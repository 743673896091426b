pub mod config;
pub mod error;
pub mod message;
pub mod session;
pub mod wrap;

pub use config::{ChatConfig, Credential};
pub use error::{ChatError, Result};
pub use message::{CompletionResult, ConversationRequest, Entry, Message, Role, Transcript};
pub use session::{Session, SessionState, Submission};
