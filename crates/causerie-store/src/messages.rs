//! Uuid-keyed, chronologically ordered message collection.

use std::collections::HashMap;

use tracing::debug;

use causerie_shared::types::Message;

/// Outcome of merging one batch into a [`MessageLog`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    /// Uuids that were not present before.
    pub inserted: usize,
    /// Existing uuids whose record changed.
    pub updated: usize,
    /// Existing uuids received with an identical or older record.
    pub unchanged: usize,
}

impl MergeStats {
    pub fn changed(&self) -> bool {
        self.inserted > 0 || self.updated > 0
    }
}

/// The canonical message list.
///
/// Holds at most one entry per `uuid` and is always sorted ascending by
/// `sent_at` (ties broken by `uuid`).  Merging overwrites by key unless the
/// stored record has a newer `updated_at`, then re-sorts globally, so
/// applying the same batch twice, or overlapping batches in any order,
/// converges to the same list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageLog {
    messages: Vec<Message>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages in display order (oldest first).
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn oldest(&self) -> Option<&Message> {
        self.messages.first()
    }

    pub fn newest(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn get(&self, uuid: &str) -> Option<&Message> {
        self.messages.iter().find(|m| m.uuid == uuid)
    }

    /// Insert or overwrite every message of `batch` by uuid, then re-sort.
    ///
    /// A record older than the stored one (by `updated_at`) is ignored.
    /// Among records with the same `updated_at`, the last one seen wins.
    pub fn merge<I>(&mut self, batch: I) -> MergeStats
    where
        I: IntoIterator<Item = Message>,
    {
        let mut stats = MergeStats::default();
        let mut by_uuid: HashMap<String, Message> = self
            .messages
            .drain(..)
            .map(|m| (m.uuid.clone(), m))
            .collect();
        let mut incoming: HashMap<String, Message> = HashMap::new();
        for message in batch {
            keep_newest(&mut incoming, message);
        }

        for (uuid, message) in incoming {
            match by_uuid.get(&uuid) {
                None => stats.inserted += 1,
                Some(existing) if existing.updated_at > message.updated_at => {
                    stats.unchanged += 1;
                    continue;
                }
                Some(existing) if *existing == message => stats.unchanged += 1,
                Some(_) => stats.updated += 1,
            }
            by_uuid.insert(uuid, message);
        }

        self.messages = by_uuid.into_values().collect();
        self.messages
            .sort_by(|a, b| a.sent_at.cmp(&b.sent_at).then_with(|| a.uuid.cmp(&b.uuid)));

        debug!(
            inserted = stats.inserted,
            updated = stats.updated,
            unchanged = stats.unchanged,
            total = self.messages.len(),
            "Merged message batch"
        );

        stats
    }

}

fn keep_newest(map: &mut HashMap<String, Message>, message: Message) {
    match map.get(&message.uuid) {
        Some(existing) if existing.updated_at > message.updated_at => {}
        _ => {
            map.insert(message.uuid.clone(), message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(uuid: &str, sent_at: i64, text: &str) -> Message {
        Message {
            uuid: uuid.into(),
            author_uuid: "p1".into(),
            text: text.into(),
            sent_at,
            updated_at: sent_at,
            attachments: vec![],
            reactions: vec![],
            reply_to_message: None,
        }
    }

    fn uuids(log: &MessageLog) -> Vec<&str> {
        log.messages().iter().map(|m| m.uuid.as_str()).collect()
    }

    fn assert_sorted(log: &MessageLog) {
        for pair in log.messages().windows(2) {
            assert!(pair[0].sent_at <= pair[1].sent_at);
        }
    }

    #[test]
    fn test_merge_sorts_out_of_order_batch() {
        let mut log = MessageLog::new();
        let stats = log.merge(vec![msg("c", 30, "c"), msg("a", 10, "a"), msg("b", 20, "b")]);

        assert_eq!(stats.inserted, 3);
        assert_eq!(uuids(&log), vec!["a", "b", "c"]);
        assert_eq!(log.oldest().unwrap().uuid, "a");
        assert_eq!(log.newest().unwrap().uuid, "c");
    }

    #[test]
    fn test_merge_is_idempotent() {
        let mut log = MessageLog::new();
        let batch = vec![msg("a", 10, "a"), msg("b", 20, "b")];
        log.merge(batch.clone());
        let before = log.clone();

        let stats = log.merge(batch);
        assert_eq!(log, before);
        assert_eq!(stats.unchanged, 2);
        assert!(!stats.changed());
    }

    #[test]
    fn test_merge_overwrites_edits() {
        let mut log = MessageLog::new();
        log.merge(vec![msg("a", 10, "draft"), msg("b", 20, "b")]);

        let mut edited = msg("a", 10, "final");
        edited.updated_at = 99;
        let stats = log.merge(vec![edited]);

        assert_eq!(stats.updated, 1);
        assert_eq!(log.len(), 2);
        assert_eq!(log.get("a").unwrap().text, "final");
        assert!(log.get("a").unwrap().is_edited());
    }

    #[test]
    fn test_overlapping_batches_commute() {
        let first = vec![msg("a", 10, "a"), msg("b", 20, "b")];
        let second = vec![msg("b", 20, "b"), msg("c", 5, "c")];

        let mut one = MessageLog::new();
        one.merge(first.clone());
        one.merge(second.clone());

        let mut two = MessageLog::new();
        two.merge(second);
        two.merge(first);

        assert_eq!(one, two);
        assert_eq!(uuids(&one), vec!["c", "a", "b"]);
        assert_sorted(&one);
    }

    #[test]
    fn test_equal_timestamps_order_by_uuid() {
        let mut log = MessageLog::new();
        log.merge(vec![msg("z", 10, "z"), msg("m", 10, "m"), msg("a", 10, "a")]);
        assert_eq!(uuids(&log), vec!["a", "m", "z"]);
    }

    #[test]
    fn test_duplicate_within_batch_last_wins() {
        let mut log = MessageLog::new();
        let stats = log.merge(vec![msg("a", 10, "one"), msg("a", 10, "two")]);
        assert_eq!(log.len(), 1);
        assert_eq!(log.get("a").unwrap().text, "two");
        assert_eq!(stats.inserted, 1);
    }

    #[test]
    fn test_stale_copy_does_not_overwrite_edit() {
        let old = msg("x", 10, "old");
        let mut new = msg("x", 10, "new");
        new.updated_at = 200;

        let mut forward = MessageLog::new();
        forward.merge(vec![old.clone()]);
        forward.merge(vec![new.clone()]);

        let mut backward = MessageLog::new();
        backward.merge(vec![new.clone()]);
        let stats = backward.merge(vec![old.clone()]);

        assert_eq!(stats.unchanged, 1);
        assert!(!stats.changed());
        assert_eq!(forward, backward);
        assert_eq!(backward.get("x").unwrap().text, "new");

        let mut mixed = MessageLog::new();
        mixed.merge(vec![new, old]);
        assert_eq!(mixed.get("x").unwrap().text, "new");
    }
}
