//! Unified Error Model
//!
//! Only backend calls can fail. A missing or wrong-kind token is an
//! `Option::None`, and incomplete manual input yields no tokens.
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BreachError {
    /// Backend unreachable or answered with a non-success status
    #[error("TRANSPORT/{endpoint}: {message}")]
    Transport { endpoint: String, message: String },

    /// Backend answered, but the body is not the expected shape
    #[error("DECODE/{endpoint}: {message}")]
    Decode { endpoint: String, message: String },
}

impl BreachError {
    pub fn transport(endpoint: impl Into<String>, message: impl ToString) -> Self {
        Self::Transport {
            endpoint: endpoint.into(),
            message: message.to_string(),
        }
    }

    pub fn decode(endpoint: impl Into<String>, message: impl ToString) -> Self {
        Self::Decode {
            endpoint: endpoint.into(),
            message: message.to_string(),
        }
    }

    pub fn endpoint(&self) -> &str {
        match self {
            Self::Transport { endpoint, .. } | Self::Decode { endpoint, .. } => endpoint,
        }
    }
}
