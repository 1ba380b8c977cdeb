//! Participant records keyed by uuid.
//!
//! The server payload never carries the placeholder avatar, so the
//! directory remembers the one assigned to each uuid and re-attaches it
//! whenever a fresh record replaces an old one.  A uuid is assigned a
//! placeholder exactly once per session, whether it first shows up in the
//! bootstrap list or in a later update batch.

use std::collections::HashMap;

use tracing::debug;

use causerie_shared::avatar::{FallbackAssigner, FallbackImage};
use causerie_shared::types::Participant;

/// Tracks every known participant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParticipantDirectory {
    participants: HashMap<String, Participant>,
    fallbacks: HashMap<String, FallbackImage>,
}

impl ParticipantDirectory {
    /// Create a new, empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or fully replace a participant record.
    ///
    /// Returns `true` if the stored record changed.
    pub fn upsert(&mut self, mut participant: Participant, assigner: &mut FallbackAssigner) -> bool {
        let fallback = *self
            .fallbacks
            .entry(participant.uuid.clone())
            .or_insert_with(|| {
                let image = assigner.assign();
                debug!(
                    participant = %participant.uuid,
                    fallback = image.asset_name(),
                    "Assigned placeholder avatar"
                );
                image
            });
        participant.fallback_image = Some(fallback);

        match self.participants.get(&participant.uuid) {
            Some(existing) if *existing == participant => false,
            _ => {
                self.participants.insert(participant.uuid.clone(), participant);
                true
            }
        }
    }

    /// Upsert a whole batch.  Returns how many stored records changed.
    pub fn upsert_all<I>(&mut self, batch: I, assigner: &mut FallbackAssigner) -> usize
    where
        I: IntoIterator<Item = Participant>,
    {
        batch
            .into_iter()
            .map(|p| self.upsert(p, assigner))
            .filter(|changed| *changed)
            .count()
    }

    pub fn get(&self, uuid: &str) -> Option<&Participant> {
        self.participants.get(uuid)
    }

    /// Placeholder assigned to `uuid`, if the participant was ever seen.
    pub fn fallback_for(&self, uuid: &str) -> Option<FallbackImage> {
        self.fallbacks.get(uuid).copied()
    }

    /// Display name for an author uuid, for renderers that need a label
    /// even when the participant is unknown.
    pub fn display_name(&self, uuid: &str) -> &str {
        self.participants
            .get(uuid)
            .map(|p| p.name.as_str())
            .unwrap_or("Unknown User")
    }

    pub fn contains(&self, uuid: &str) -> bool {
        self.participants.contains_key(uuid)
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    /// All participants, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &Participant> {
        self.participants.values()
    }
}
