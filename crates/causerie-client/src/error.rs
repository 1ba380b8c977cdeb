use thiserror::Error;

use causerie_net::GatewayError;
use causerie_shared::CauserieError;

/// Errors returned by [`Session`](crate::Session) actions.
#[derive(Error, Debug)]
pub enum ClientError {
    /// The chat API call failed.
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// Outbound text was empty after trimming.
    #[error("Message text is empty")]
    EmptyMessage,

    /// The session was torn down; the action or its result was dropped.
    #[error("Session has been disposed")]
    Disposed,

    /// The action needs a completed bootstrap.
    #[error("Session is not initialized")]
    NotInitialized,

    #[error("Configuration error: {0}")]
    Config(#[from] CauserieError),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ClientError>;
