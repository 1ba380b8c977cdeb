use thiserror::Error;

/// Errors produced by a chat gateway call.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Connection, timeout or other transport-level failure.
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("API Error: {status} {body}")]
    Status { status: u16, body: String },

    /// The response body was not the expected JSON.
    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// The configured base URL cannot be used to build endpoint URLs.
    #[error("Invalid base URL: {0}")]
    InvalidUrl(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, GatewayError>;
