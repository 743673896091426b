use thiserror::Error;

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("request timed out")]
    Timeout,

    #[error("transport error: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("API error {status}: {message}")]
    Api {
        status: reqwest::StatusCode,
        message: String,
    },

    #[error("could not decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("response contained no choices")]
    NoChoices,
}

impl From<reqwest::Error> for GatewayError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            GatewayError::Timeout
        } else {
            GatewayError::Transport(e)
        }
    }
}

pub type Result<T> = std::result::Result<T, GatewayError>;
