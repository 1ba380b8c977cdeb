//! Projection of the reconciled message list into display entries.
//!
//! Consecutive messages by the same author form a group; only the first
//! message of a group carries the author header.  A date separator is
//! emitted whenever the (UTC) calendar day changes.

use chrono::{DateTime, NaiveDate, Utc};

use crate::constants::LOCAL_PARTICIPANT_UUID;
use crate::types::Message;

/// Where a message sits within a run of messages by the same author.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupPosition {
    Single,
    Start,
    Middle,
    End,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedMessage<'a> {
    pub message: &'a Message,
    pub group_position: GroupPosition,
    pub show_header: bool,
    pub is_own: bool,
    pub is_edited: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedEntry<'a> {
    DateSeparator(NaiveDate),
    Message(FeedMessage<'a>),
}

/// Calendar day (UTC) a millisecond timestamp falls on.
pub fn day_of(millis: i64) -> NaiveDate {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .unwrap_or_default()
        .date_naive()
}

/// Build display entries for `messages`, which must already be sorted.
pub fn project<'a>(messages: &'a [Message], current_user_uuid: Option<&str>) -> Vec<FeedEntry<'a>> {
    let mut entries = Vec::with_capacity(messages.len() + 1);
    let mut last_day: Option<NaiveDate> = None;

    for (i, message) in messages.iter().enumerate() {
        let day = day_of(message.sent_at);
        if last_day != Some(day) {
            entries.push(FeedEntry::DateSeparator(day));
            last_day = Some(day);
        }

        let same_author = |other: Option<&Message>| {
            other.map_or(false, |o| o.author_uuid == message.author_uuid)
        };
        let is_first = !same_author(i.checked_sub(1).map(|p| &messages[p]));
        let is_last = !same_author(messages.get(i + 1));

        let group_position = match (is_first, is_last) {
            (true, true) => GroupPosition::Single,
            (true, false) => GroupPosition::Start,
            (false, true) => GroupPosition::End,
            (false, false) => GroupPosition::Middle,
        };

        let is_own = message.author_uuid == LOCAL_PARTICIPANT_UUID
            || current_user_uuid == Some(message.author_uuid.as_str());

        entries.push(FeedEntry::Message(FeedMessage {
            message,
            group_position,
            show_header: is_first,
            is_own,
            is_edited: message.is_edited(),
        }));
    }

    entries
}
