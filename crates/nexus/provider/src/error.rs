use std::time::Duration;
use thiserror::Error;

/// Reasons a provider call produced no usable payload
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("provider returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed payload: {0}")]
    Decode(String),

    #[error("provider returned an empty result")]
    Empty,

    #[error("provider did not answer within {0:?}")]
    Timeout(Duration),

    #[error("provider misconfigured: {0}")]
    Config(String),
}
