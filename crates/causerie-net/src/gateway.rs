//! The remote chat API as seen by the synchronization core.

use async_trait::async_trait;

use causerie_shared::types::{Message, Participant, SessionInfo};

use crate::error::Result;

/// Operations the sync core needs from the chat backend.
///
/// Message lists come back ascending by `sentAt`.  Implementations report
/// any failure as an error; callers only distinguish success from failure.
#[async_trait]
pub trait ChatGateway: Send + Sync {
    /// `GET info`
    async fn session_info(&self) -> Result<SessionInfo>;

    /// `GET messages/latest`
    async fn latest_messages(&self) -> Result<Vec<Message>>;

    /// `GET messages/older/{ref}`: messages strictly older than the
    /// reference.  An empty page means there is nothing older.
    async fn older_messages(&self, ref_message_uuid: &str) -> Result<Vec<Message>>;

    /// `GET messages/all`
    async fn all_messages(&self) -> Result<Vec<Message>>;

    /// `GET messages/updates/{since}`: new or changed messages.
    async fn message_updates(&self, since_millis: i64) -> Result<Vec<Message>>;

    /// `GET participants/updates/{since}`: new or changed participants.
    async fn participant_updates(&self, since_millis: i64) -> Result<Vec<Participant>>;

    /// `GET participants/all`
    async fn all_participants(&self) -> Result<Vec<Participant>>;

    /// `POST messages/new`.  Returns the created message when the server
    /// echoes it back, `None` for a bare acknowledgement.
    async fn create_message(&self, text: &str) -> Result<Option<Message>>;
}
