use serde::{Deserialize, Deserializer, Serialize};

use crate::avatar::FallbackImage;
use crate::constants::LOCAL_PARTICIPANT_UUID;

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// A chat message as returned by the chat API.
///
/// The server always sends the full record, so a newer copy of the same
/// `uuid` supersedes the older one wholesale (edits and reaction changes
/// included).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Server-assigned identifier, the deduplication key.
    pub uuid: String,
    /// Uuid of the authoring participant.
    pub author_uuid: String,
    /// Message body; may contain `@name` mention tokens.
    pub text: String,
    /// Send time in milliseconds since the Unix epoch.
    pub sent_at: i64,
    /// Last modification time in milliseconds since the Unix epoch.
    pub updated_at: i64,
    #[serde(default, deserialize_with = "nullable_vec")]
    pub attachments: Vec<Attachment>,
    #[serde(default, deserialize_with = "nullable_vec")]
    pub reactions: Vec<Reaction>,
    /// Point-in-time copy of the message being replied to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to_message: Option<ReplyReference>,
}

impl Message {
    /// Whether the message was modified after it was sent.
    pub fn is_edited(&self) -> bool {
        self.updated_at != self.sent_at
    }

    /// Attachments the client knows how to render.
    pub fn image_attachments(&self) -> impl Iterator<Item = &ImageAttachment> {
        self.attachments.iter().filter_map(|a| match a {
            Attachment::Image(image) => Some(image),
            Attachment::Unsupported => None,
        })
    }

    /// Reaction counts per value, in the order each value first appears.
    pub fn reaction_summary(&self) -> Vec<(String, usize)> {
        let mut summary: Vec<(String, usize)> = Vec::new();
        for reaction in &self.reactions {
            match summary.iter_mut().find(|(value, _)| *value == reaction.value) {
                Some((_, count)) => *count += 1,
                None => summary.push((reaction.value.clone(), 1)),
            }
        }
        summary
    }
}

/// Type-tagged attachment record. Unknown tags decode to `Unsupported` so a
/// single new attachment kind never fails a whole batch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Attachment {
    Image(ImageAttachment),
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ImageAttachment {
    #[serde(default)]
    pub uuid: String,
    pub url: String,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Reaction {
    pub uuid: String,
    pub participant_uuid: String,
    pub value: String,
}

/// Denormalized snapshot of a replied-to message. Not a live link: it is
/// rendered as received, never re-resolved against current state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReplyReference {
    pub author_uuid: String,
    pub text: String,
}

// ---------------------------------------------------------------------------
// Participant
// ---------------------------------------------------------------------------

/// A chat participant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub uuid: String,
    pub name: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub job_title: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    /// Client-side placeholder avatar. Never part of the server payload;
    /// filled in by the participant directory.
    #[serde(skip_deserializing, skip_serializing_if = "Option::is_none")]
    pub fallback_image: Option<FallbackImage>,
}

impl Participant {
    /// Whether this record is the local session's own identity.
    pub fn is_local(&self) -> bool {
        self.uuid == LOCAL_PARTICIPANT_UUID
    }
}

// ---------------------------------------------------------------------------
// Requests / misc responses
// ---------------------------------------------------------------------------

/// Response of the `info` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub session_uuid: String,
    /// Any additional fields the server sends along.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Body of `POST messages/new`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewMessage {
    pub text: String,
}

/// Treat an explicit JSON `null` the same as a missing array.
fn nullable_vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_from_api_json() {
        let json = r#"{
            "uuid": "m1",
            "authorUuid": "p1",
            "text": "hello @Bob",
            "sentAt": 1000,
            "updatedAt": 2000,
            "attachments": [
                {"uuid": "a1", "type": "image", "url": "https://img/1.png", "width": 10, "height": 20},
                {"uuid": "a2", "type": "video", "url": "https://vid/1.mp4"}
            ],
            "reactions": [{"uuid": "r1", "participantUuid": "p2", "value": "👍"}],
            "replyToMessage": {"authorUuid": "p2", "text": "hi"}
        }"#;

        let msg: Message = serde_json::from_str(json).unwrap();
        assert_eq!(msg.author_uuid, "p1");
        assert!(msg.is_edited());
        assert_eq!(msg.attachments.len(), 2);
        assert_eq!(msg.attachments[1], Attachment::Unsupported);
        assert_eq!(msg.image_attachments().count(), 1);
        assert_eq!(msg.reactions[0].participant_uuid, "p2");
        assert_eq!(msg.reply_to_message.unwrap().author_uuid, "p2");
    }

    #[test]
    fn test_message_null_collections() {
        let json = r#"{"uuid":"m1","authorUuid":"p1","text":"x","sentAt":5,"updatedAt":5,
                       "attachments":null,"reactions":null,"replyToMessage":null}"#;
        let msg: Message = serde_json::from_str(json).unwrap();
        assert!(msg.attachments.is_empty());
        assert!(msg.reactions.is_empty());
        assert!(msg.reply_to_message.is_none());
        assert!(!msg.is_edited());
    }

    #[test]
    fn test_participant_ignores_fallback_from_payload() {
        let json = r#"{"uuid":"p1","name":"Ann","avatarUrl":"https://a/1.png",
                       "jobTitle":"Engineer","email":null,"fallbackImage":3}"#;
        let p: Participant = serde_json::from_str(json).unwrap();
        assert_eq!(p.job_title.as_deref(), Some("Engineer"));
        assert!(p.bio.is_none());
        assert!(p.email.is_none());
        assert!(p.fallback_image.is_none());
    }

    #[test]
    fn test_reaction_summary_keeps_first_seen_order() {
        let reaction = |uuid: &str, value: &str| Reaction {
            uuid: uuid.into(),
            participant_uuid: "p".into(),
            value: value.into(),
        };
        let msg = Message {
            uuid: "m1".into(),
            author_uuid: "p1".into(),
            text: String::new(),
            sent_at: 1,
            updated_at: 1,
            attachments: vec![],
            reactions: vec![reaction("1", "❤️"), reaction("2", "👍"), reaction("3", "❤️")],
            reply_to_message: None,
        };
        assert_eq!(
            msg.reaction_summary(),
            vec![("❤️".to_string(), 2), ("👍".to_string(), 1)]
        );
    }

    #[test]
    fn test_session_info_keeps_extra_fields() {
        let info: SessionInfo =
            serde_json::from_str(r#"{"sessionUuid":"s-1","apiVersion":2}"#).unwrap();
        assert_eq!(info.session_uuid, "s-1");
        assert_eq!(info.extra["apiVersion"], 2);
    }
}
