//! In-memory chat API used by the session tests.
//!
//! Models a tiny server: a message table, a participant change log, a
//! controllable clock, switchable failures, call counters and an optional
//! gate that holds `older_messages` until the test releases it.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;

use causerie_client::{ClientConfig, Session};
use causerie_net::{ChatGateway, GatewayError};
use causerie_shared::types::{Message, Participant, SessionInfo};

pub const SESSION_UUID: &str = "s-1";
pub const PAGE_SIZE: usize = 3;

#[derive(Default)]
pub struct Calls {
    pub info: AtomicUsize,
    pub latest: AtomicUsize,
    pub older: AtomicUsize,
    pub all: AtomicUsize,
    pub message_updates: AtomicUsize,
    pub participant_updates: AtomicUsize,
    pub participants: AtomicUsize,
    pub create: AtomicUsize,
}

impl Calls {
    pub fn get(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

#[derive(Default)]
pub struct FakeChat {
    pub now: Arc<AtomicI64>,
    messages: Mutex<Vec<Message>>,
    participant_log: Mutex<Vec<(i64, Participant)>>,
    older_override: Mutex<Option<Vec<Message>>>,
    failing: Mutex<HashSet<&'static str>>,
    older_gate: Mutex<Option<Arc<Notify>>>,
    pub calls: Calls,
}

pub fn message(uuid: &str, author: &str, text: &str, sent_at: i64) -> Message {
    Message {
        uuid: uuid.into(),
        author_uuid: author.into(),
        text: text.into(),
        sent_at,
        updated_at: sent_at,
        attachments: vec![],
        reactions: vec![],
        reply_to_message: None,
    }
}

pub fn participant(uuid: &str, name: &str) -> Participant {
    Participant {
        uuid: uuid.into(),
        name: name.into(),
        avatar_url: Some(format!("https://avatars.example/{uuid}.png")),
        bio: Some("bio".into()),
        job_title: None,
        email: None,
        fallback_image: None,
    }
}

impl FakeChat {
    pub fn new() -> Arc<Self> {
        let chat = Arc::new(Self::default());
        chat.set_now(1_000);
        chat
    }

    /// Fake with `count` messages from alternating authors at 100 ms steps,
    /// plus two participants.
    pub fn seeded(count: usize) -> Arc<Self> {
        let chat = Self::new();
        for i in 0..count {
            let author = if i % 2 == 0 { "p1" } else { "p2" };
            chat.insert_message(message(&format!("m{i:02}"), author, &format!("msg {i}"), 100 * (i as i64 + 1)));
        }
        chat.upsert_participant(participant("p1", "Ann"));
        chat.upsert_participant(participant("p2", "Bob"));
        chat
    }

    pub fn set_now(&self, millis: i64) {
        self.now.store(millis, Ordering::SeqCst);
    }

    pub fn now(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }

    pub fn insert_message(&self, message: Message) {
        let mut messages = self.messages.lock().unwrap();
        messages.retain(|m| m.uuid != message.uuid);
        messages.push(message);
        messages.sort_by_key(|m| m.sent_at);
    }

    /// Record a participant change at the current fake time.
    pub fn upsert_participant(&self, participant: Participant) {
        let now = self.now();
        self.participant_log.lock().unwrap().push((now, participant));
    }

    pub fn override_older(&self, page: Vec<Message>) {
        *self.older_override.lock().unwrap() = Some(page);
    }

    pub fn fail(&self, op: &'static str) {
        self.failing.lock().unwrap().insert(op);
    }

    pub fn recover(&self, op: &'static str) {
        self.failing.lock().unwrap().remove(op);
    }

    /// Make `older_messages` wait until the returned notify is signalled.
    pub fn gate_older(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.older_gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    fn check(&self, op: &'static str) -> Result<(), GatewayError> {
        if self.failing.lock().unwrap().contains(op) {
            return Err(GatewayError::Status {
                status: 500,
                body: format!("{op} failed"),
            });
        }
        Ok(())
    }

    fn latest_participants(&self, since: Option<i64>) -> Vec<Participant> {
        let log = self.participant_log.lock().unwrap();
        let mut latest: Vec<Participant> = Vec::new();
        for (at, p) in log.iter() {
            if since.map_or(false, |since| *at < since) {
                continue;
            }
            latest.retain(|existing| existing.uuid != p.uuid);
            latest.push(p.clone());
        }
        latest
    }
}

#[async_trait]
impl ChatGateway for FakeChat {
    async fn session_info(&self) -> causerie_net::Result<SessionInfo> {
        self.calls.info.fetch_add(1, Ordering::SeqCst);
        self.check("info")?;
        Ok(SessionInfo {
            session_uuid: SESSION_UUID.into(),
            extra: serde_json::Map::new(),
        })
    }

    async fn latest_messages(&self) -> causerie_net::Result<Vec<Message>> {
        self.calls.latest.fetch_add(1, Ordering::SeqCst);
        self.check("latest")?;
        let messages = self.messages.lock().unwrap();
        let start = messages.len().saturating_sub(PAGE_SIZE);
        Ok(messages[start..].to_vec())
    }

    async fn older_messages(&self, ref_message_uuid: &str) -> causerie_net::Result<Vec<Message>> {
        self.calls.older.fetch_add(1, Ordering::SeqCst);
        let gate = self.older_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.check("older")?;

        if let Some(page) = self.older_override.lock().unwrap().take() {
            return Ok(page);
        }

        let messages = self.messages.lock().unwrap();
        let Some(reference) = messages.iter().find(|m| m.uuid == ref_message_uuid) else {
            return Ok(Vec::new());
        };
        let older: Vec<Message> = messages
            .iter()
            .filter(|m| m.sent_at < reference.sent_at)
            .cloned()
            .collect();
        let start = older.len().saturating_sub(PAGE_SIZE);
        Ok(older[start..].to_vec())
    }

    async fn all_messages(&self) -> causerie_net::Result<Vec<Message>> {
        self.calls.all.fetch_add(1, Ordering::SeqCst);
        self.check("all")?;
        Ok(self.messages.lock().unwrap().clone())
    }

    async fn message_updates(&self, since_millis: i64) -> causerie_net::Result<Vec<Message>> {
        self.calls.message_updates.fetch_add(1, Ordering::SeqCst);
        self.check("message_updates")?;
        Ok(self
            .messages
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.updated_at >= since_millis)
            .cloned()
            .collect())
    }

    async fn participant_updates(&self, since_millis: i64) -> causerie_net::Result<Vec<Participant>> {
        self.calls.participant_updates.fetch_add(1, Ordering::SeqCst);
        self.check("participant_updates")?;
        Ok(self.latest_participants(Some(since_millis)))
    }

    async fn all_participants(&self) -> causerie_net::Result<Vec<Participant>> {
        self.calls.participants.fetch_add(1, Ordering::SeqCst);
        self.check("participants")?;
        Ok(self.latest_participants(None))
    }

    async fn create_message(&self, text: &str) -> causerie_net::Result<Option<Message>> {
        self.calls.create.fetch_add(1, Ordering::SeqCst);
        self.check("create")?;
        let created = message(
            &uuid::Uuid::new_v4().to_string(),
            SESSION_UUID,
            text,
            self.now(),
        );
        self.insert_message(created.clone());
        Ok(Some(created))
    }
}

pub fn test_config() -> ClientConfig {
    ClientConfig {
        api_base_url: "http://fake.invalid/api".into(),
        poll_interval: Duration::from_secs(3),
        fallback_seed: Some(11),
        ..ClientConfig::default()
    }
}

/// Session wired to `chat`, reading time from the fake's clock.
pub fn session_for(chat: &Arc<FakeChat>) -> Session {
    let now = chat.now.clone();
    Session::with_clock(
        chat.clone(),
        &test_config(),
        Arc::new(move || now.load(Ordering::SeqCst)),
    )
    .unwrap()
}

pub fn assert_sorted_unique(session: &Session) {
    let state = session.state();
    let messages = state.messages.messages();
    for pair in messages.windows(2) {
        assert!(pair[0].sent_at <= pair[1].sent_at, "list out of order");
    }
    let unique: HashSet<&str> = messages.iter().map(|m| m.uuid.as_str()).collect();
    assert_eq!(unique.len(), messages.len(), "duplicate uuid in list");
}
