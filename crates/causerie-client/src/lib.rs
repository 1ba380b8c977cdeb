//! # causerie-client
//!
//! The synchronization core of the Causerie chat client.
//!
//! A [`Session`] bootstraps messages and participants from the chat API,
//! keeps them reconciled through a timer-driven incremental poll, submits
//! outbound messages (reconciled by the next poll rather than inserted
//! locally) and pages backward through history.  Presentation layers read
//! the reconciled [`SyncState`] through a `tokio::sync::watch` channel and
//! call the session's actions.

pub mod config;
pub mod error;
pub mod logging;
pub mod session;
pub mod state;

mod polling;

pub use config::ClientConfig;
pub use error::{ClientError, Result};
pub use session::{system_clock, Clock, PageOutcome, Session};
pub use state::SyncState;
