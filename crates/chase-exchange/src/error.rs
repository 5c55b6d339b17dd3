//! Exchange client error types.
//!
//! These cover calls that produced no trustworthy exchange answer.
//! Exchange-level rejections are not errors here; they arrive as
//! [`crate::Outcome::Rejected`].

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Malformed response (HTTP {status}): {message}")]
    Decode { status: u16, message: String },

    #[error("Invalid credentials: {0}")]
    Credentials(String),
}

impl ExchangeError {
    /// Whether the request may have reached the exchange without us
    /// learning the result.
    pub fn is_ambiguous(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Decode { .. })
    }
}

pub type ExchangeResult<T> = Result<T, ExchangeError>;
