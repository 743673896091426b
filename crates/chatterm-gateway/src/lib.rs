pub mod channel;
pub mod client;
pub mod error;
pub mod protocol;

pub use channel::{response_channel, ResponseReceiver, ResponseSender};
pub use client::{CompletionGateway, GatewayConfig};
pub use error::GatewayError;
