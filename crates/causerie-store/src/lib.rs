//! # causerie-store
//!
//! In-memory reconciled collections for the Causerie sync core.
//!
//! Nothing here is persisted.  The crate exposes two keyed collections that
//! absorb batches fetched from the chat API: [`MessageLog`] keeps one entry
//! per message uuid in chronological order, and [`ParticipantDirectory`]
//! keeps one record per participant uuid together with its placeholder
//! avatar.

pub mod messages;
pub mod participants;

pub use messages::{MergeStats, MessageLog};
pub use participants::ParticipantDirectory;
