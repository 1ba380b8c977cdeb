//! Reconciled session state shared with the presentation layer.
//!
//! The [`SyncState`] lives inside a `tokio::sync::watch` channel owned by the
//! [`Session`](crate::Session).  Every mutation goes through that channel, so
//! readers always observe a state in which the message and participant
//! invariants hold.

use causerie_shared::feed::{self, FeedEntry};
use causerie_shared::mention;
use causerie_shared::types::Participant;
use causerie_store::{MessageLog, ParticipantDirectory};

/// Central synchronization state.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncState {
    /// Canonical message list, unique by uuid, ascending by `sent_at`.
    pub messages: MessageLog,

    /// Known participants keyed by uuid, each with its placeholder avatar.
    pub participants: ParticipantDirectory,

    /// Identity of the local session, from the `info` endpoint.
    /// `None` until bootstrap fetched it.
    pub current_user_uuid: Option<String>,

    /// Watermark (ms) passed as `since` to the next incremental poll.
    pub last_update_timestamp: i64,

    /// Whether the initial bootstrap is in flight.
    pub loading: bool,

    /// Session-level error shown to the user (bootstrap or send failure).
    pub error: Option<String>,

    /// Whether an older-page request is in flight.
    pub loading_older_messages: bool,

    /// Cleared for good once an older-page request comes back empty.
    pub has_more_older_messages: bool,

    /// Whether the polling timer is installed.
    pub polling: bool,
}

impl SyncState {
    /// Create a new, empty state.
    pub fn new() -> Self {
        Self {
            messages: MessageLog::new(),
            participants: ParticipantDirectory::new(),
            current_user_uuid: None,
            last_update_timestamp: 0,
            loading: false,
            error: None,
            loading_older_messages: false,
            has_more_older_messages: true,
            polling: false,
        }
    }

    /// Whether bootstrap completed at least once.
    pub fn is_initialized(&self) -> bool {
        self.current_user_uuid.is_some()
    }

    /// Display entries for the message list.
    pub fn feed(&self) -> Vec<FeedEntry<'_>> {
        feed::project(self.messages.messages(), self.current_user_uuid.as_deref())
    }

    /// Mention candidates for the text currently in the input bar, or an
    /// empty list when no mention is being typed.
    pub fn mention_suggestions(&self, draft: &str) -> Vec<&Participant> {
        match mention::active_query(draft) {
            Some(query) => mention::suggest(self.participants.iter(), query),
            None => Vec::new(),
        }
    }

    /// Whether a scroll position `scroll_offset` away from the top of the
    /// loaded range should trigger an older-page fetch.
    pub fn should_fetch_older(&self, scroll_offset: f64, threshold: f64) -> bool {
        scroll_offset < threshold
            && !self.loading_older_messages
            && self.has_more_older_messages
            && !self.messages.is_empty()
    }
}

impl Default for SyncState {
    fn default() -> Self {
        Self::new()
    }
}
