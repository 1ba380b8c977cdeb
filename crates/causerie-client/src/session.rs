//! The synchronization session: bootstrap, poll-and-merge, send and
//! backward pagination over one [`SyncState`].
//!
//! All state changes are funnelled through [`SessionInner::apply`], which
//! runs inside the watch channel's lock and drops the change if the session
//! has been disposed.  No lock is ever held across an `.await`; the only
//! suspension points are gateway calls.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use causerie_net::ChatGateway;
use causerie_shared::avatar::FallbackAssigner;

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::polling::Poller;
use crate::state::SyncState;

/// Source of "now" in milliseconds since the Unix epoch.
pub type Clock = Arc<dyn Fn() -> i64 + Send + Sync>;

/// Wall-clock [`Clock`].
pub fn system_clock() -> Clock {
    Arc::new(|| Utc::now().timestamp_millis())
}

/// Result of an older-page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageOutcome {
    /// Not sent: a page is already in flight, history is exhausted, or
    /// nothing is loaded to page back from.
    Skipped,
    /// The server returned an empty page; no further pages will be requested.
    Exhausted,
    /// A page was merged.
    Loaded { received: usize, inserted: usize },
}

/// Handle to a chat synchronization session.
///
/// Cheap to clone; all clones share the same state.  The polling task only
/// holds a weak reference, so dropping every handle ends the session.
#[derive(Clone)]
pub struct Session {
    pub(crate) inner: Arc<SessionInner>,
}

pub(crate) struct SessionInner {
    gateway: Arc<dyn ChatGateway>,
    state: watch::Sender<SyncState>,
    assigner: Mutex<FallbackAssigner>,
    poller: Mutex<Poller>,
    disposed: AtomicBool,
    clock: Clock,
    poll_interval: Duration,
    page_trigger_threshold: f64,
}

impl Session {
    /// Build a session over `gateway`.  Fails if `config` does not validate.
    pub fn new(gateway: Arc<dyn ChatGateway>, config: &ClientConfig) -> Result<Self> {
        Self::with_clock(gateway, config, system_clock())
    }

    pub fn with_clock(
        gateway: Arc<dyn ChatGateway>,
        config: &ClientConfig,
        clock: Clock,
    ) -> Result<Self> {
        config.validate()?;
        let assigner = match config.fallback_seed {
            Some(seed) => FallbackAssigner::from_seed(seed),
            None => FallbackAssigner::from_entropy(),
        };
        let (state, _) = watch::channel(SyncState::new());

        Ok(Self {
            inner: Arc::new(SessionInner {
                gateway,
                state,
                assigner: Mutex::new(assigner),
                poller: Mutex::new(Poller::default()),
                disposed: AtomicBool::new(false),
                clock,
                poll_interval: config.poll_interval,
                page_trigger_threshold: config.page_trigger_threshold,
            }),
        })
    }

    // -----------------------------------------------------------------------
    // Read access
    // -----------------------------------------------------------------------

    /// Receiver notified whenever the reconciled state changes.
    pub fn subscribe(&self) -> watch::Receiver<SyncState> {
        self.inner.state.subscribe()
    }

    /// Borrow the current state.  Do not hold the guard across an `.await`.
    pub fn state(&self) -> watch::Ref<'_, SyncState> {
        self.inner.state.borrow()
    }

    /// Clone of the current state.
    pub fn snapshot(&self) -> SyncState {
        self.inner.state.borrow().clone()
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.load(Ordering::Acquire)
    }

    pub fn is_polling(&self) -> bool {
        self.lock_poller().is_running()
    }

    /// Whether the presentation layer should request an older page at
    /// `scroll_offset` from the top of the loaded range.
    pub fn should_fetch_older(&self, scroll_offset: f64) -> bool {
        self.state()
            .should_fetch_older(scroll_offset, self.inner.page_trigger_threshold)
    }

    // -----------------------------------------------------------------------
    // Bootstrap
    // -----------------------------------------------------------------------

    /// Load session info, the latest messages and all participants, then
    /// start polling.
    ///
    /// Any failure aborts the bootstrap, is recorded as the session error
    /// and leaves polling stopped.  Nothing is retried.
    pub async fn initialize(&self) -> Result<()> {
        self.ensure_live()?;
        self.inner.apply(|state| {
            state.loading = true;
            state.error = None;
            true
        });
        info!("Initializing chat session");

        if let Err(e) = self.bootstrap().await {
            error!(error = %e, "Initialization failed");
            self.inner.apply(|state| {
                state.loading = false;
                state.error = Some(e.to_string());
                true
            });
            return Err(e);
        }

        self.start_polling()
    }

    async fn bootstrap(&self) -> Result<()> {
        let gateway = &self.inner.gateway;
        let started_at = self.inner.now();

        let info = gateway.session_info().await?;
        info!(session = %info.session_uuid, "Session info received");
        let (messages, participants) =
            tokio::try_join!(gateway.latest_messages(), gateway.all_participants())?;
        let (message_count, participant_count) = (messages.len(), participants.len());

        // The identity is committed together with the first load, so a
        // half-finished bootstrap never counts as initialized.
        let session_uuid = info.session_uuid;
        let mut assigner = self.inner.lock_assigner();
        self.inner.apply_or_disposed(|state| {
            state.current_user_uuid = Some(session_uuid);
            state.messages.merge(messages);
            state.participants.upsert_all(participants, &mut assigner);
            state.last_update_timestamp = state.last_update_timestamp.max(started_at);
            state.loading = false;
            true
        })?;
        drop(assigner);

        info!(
            messages = message_count,
            participants = participant_count,
            watermark = started_at,
            "Initial load complete"
        );
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Outbound send
    // -----------------------------------------------------------------------

    /// Submit `text` and reconcile through an immediate poll.
    ///
    /// The message is never inserted locally: the server copy arrives
    /// through the regular merge.  On failure the session error is set and
    /// the caller keeps its draft.
    pub async fn send_message(&self, text: &str) -> Result<()> {
        self.ensure_live()?;
        if text.trim().is_empty() {
            return Err(ClientError::EmptyMessage);
        }

        match self.inner.gateway.create_message(text).await {
            Ok(created) => {
                info!(
                    uuid = ?created.as_ref().map(|m| m.uuid.as_str()),
                    len = text.len(),
                    "Message sent"
                );
            }
            Err(e) => {
                error!(error = %e, "Failed to send message");
                self.inner.apply(|state| {
                    state.error = Some(e.to_string());
                    true
                });
                return Err(e.into());
            }
        }

        if let Err(e) = self.poll_for_updates().await {
            debug!(error = %e, "Follow-up poll after send failed; next tick will retry");
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Incremental poll-and-merge
    // -----------------------------------------------------------------------

    /// Fetch message and participant changes since the watermark and merge
    /// them.
    ///
    /// The watermark moves to the time the request started, and only once
    /// both batches merged.  Failures are logged and returned but never
    /// surface as the session error.
    pub async fn poll_for_updates(&self) -> Result<()> {
        self.ensure_live()?;
        let since = {
            let state = self.state();
            if !state.is_initialized() {
                return Err(ClientError::NotInitialized);
            }
            state.last_update_timestamp
        };
        let started_at = self.inner.now();
        debug!(since, "Polling for updates");

        let gateway = &self.inner.gateway;
        let (messages, participants) = match tokio::try_join!(
            gateway.message_updates(since),
            gateway.participant_updates(since)
        ) {
            Ok(batches) => batches,
            Err(e) => {
                warn!(error = %e, since, "Failed to poll for updates");
                return Err(e.into());
            }
        };
        let (message_count, participant_count) = (messages.len(), participants.len());

        let mut assigner = self.inner.lock_assigner();
        self.inner.apply_or_disposed(|state| {
            let merged = state.messages.merge(messages);
            let changed_participants = state.participants.upsert_all(participants, &mut assigner);
            state.last_update_timestamp = state.last_update_timestamp.max(started_at);
            merged.changed() || changed_participants > 0
        })?;
        drop(assigner);

        if message_count > 0 || participant_count > 0 {
            debug!(
                messages = message_count,
                participants = participant_count,
                "Merged updates"
            );
        }
        Ok(())
    }

    /// Fetch the full message history and merge it.
    pub async fn reload_all_messages(&self) -> Result<usize> {
        self.ensure_live()?;
        let messages = match self.inner.gateway.all_messages().await {
            Ok(messages) => messages,
            Err(e) => {
                warn!(error = %e, "Failed to load all messages");
                return Err(e.into());
            }
        };

        let mut inserted = 0;
        self.inner.apply_or_disposed(|state| {
            let merged = state.messages.merge(messages);
            inserted = merged.inserted;
            merged.changed()
        })?;
        info!(inserted, "Reloaded message history");
        Ok(inserted)
    }

    // -----------------------------------------------------------------------
    // Polling loop
    // -----------------------------------------------------------------------

    /// Install the polling timer, replacing any running one.
    pub fn start_polling(&self) -> Result<()> {
        self.ensure_live()?;
        let restarted = self
            .lock_poller()
            .start(Arc::downgrade(&self.inner), self.inner.poll_interval);
        self.inner.apply(|state| {
            let changed = !state.polling;
            state.polling = true;
            changed
        });

        info!(
            interval_ms = self.inner.poll_interval.as_millis() as u64,
            restarted,
            "Polling started"
        );
        Ok(())
    }

    /// Cancel the polling timer.  Returns whether one was running.
    pub fn stop_polling(&self) -> bool {
        let was_running = self.lock_poller().stop();
        self.inner.apply(|state| {
            let changed = state.polling;
            state.polling = false;
            changed
        });
        if was_running {
            info!("Polling stopped");
        }
        was_running
    }

    // -----------------------------------------------------------------------
    // Backward pagination
    // -----------------------------------------------------------------------

    /// Load one page of messages older than `ref_message_uuid`.
    ///
    /// At most one request is in flight; a call made meanwhile, or after
    /// history is exhausted, returns [`PageOutcome::Skipped`] without
    /// contacting the server.  A failed request clears the in-flight flag
    /// and leaves the exhaustion flag untouched.
    pub async fn fetch_older_messages(&self, ref_message_uuid: &str) -> Result<PageOutcome> {
        self.ensure_live()?;

        let mut claimed = false;
        self.inner.apply(|state| {
            if state.loading_older_messages || !state.has_more_older_messages {
                return false;
            }
            state.loading_older_messages = true;
            claimed = true;
            true
        });
        if !claimed {
            debug!(reference = ref_message_uuid, "Older page request skipped");
            return Ok(PageOutcome::Skipped);
        }

        debug!(reference = ref_message_uuid, "Fetching older messages");
        let page = match self.inner.gateway.older_messages(ref_message_uuid).await {
            Ok(page) => page,
            Err(e) => {
                warn!(error = %e, reference = ref_message_uuid, "Failed to fetch older messages");
                self.inner.apply(|state| {
                    state.loading_older_messages = false;
                    true
                });
                return Err(e.into());
            }
        };

        if page.is_empty() {
            self.inner.apply_or_disposed(|state| {
                state.has_more_older_messages = false;
                state.loading_older_messages = false;
                true
            })?;
            info!("Reached the beginning of the conversation");
            return Ok(PageOutcome::Exhausted);
        }

        let received = page.len();
        let mut inserted = 0;
        self.inner.apply_or_disposed(|state| {
            inserted = state.messages.merge(page).inserted;
            state.loading_older_messages = false;
            true
        })?;
        debug!(received, inserted, "Merged older page");
        Ok(PageOutcome::Loaded { received, inserted })
    }

    /// Load the page before the oldest loaded message, if any.
    pub async fn fetch_older_than_oldest(&self) -> Result<PageOutcome> {
        let oldest = self.state().messages.oldest().map(|m| m.uuid.clone());
        match oldest {
            Some(uuid) => self.fetch_older_messages(&uuid).await,
            None => Ok(PageOutcome::Skipped),
        }
    }

    // -----------------------------------------------------------------------
    // Misc
    // -----------------------------------------------------------------------

    /// Dismiss the session-level error.
    pub fn clear_error(&self) {
        self.inner.apply(|state| state.error.take().is_some());
    }

    /// Tear the session down: stop polling and ignore every completion that
    /// arrives afterwards.  Idempotent.
    pub fn dispose(&self) {
        let mut newly_disposed = false;
        self.inner.state.send_modify(|state| {
            newly_disposed = !self.inner.disposed.swap(true, Ordering::AcqRel);
            state.polling = false;
        });
        self.lock_poller().stop();
        if newly_disposed {
            info!("Session disposed");
        }
    }

    fn ensure_live(&self) -> Result<()> {
        if self.is_disposed() {
            return Err(ClientError::Disposed);
        }
        Ok(())
    }

    fn lock_poller(&self) -> std::sync::MutexGuard<'_, Poller> {
        self.inner.poller.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SessionInner {
    fn now(&self) -> i64 {
        (self.clock)()
    }

    fn lock_assigner(&self) -> std::sync::MutexGuard<'_, FallbackAssigner> {
        self.assigner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` against the state unless the session was disposed.
    ///
    /// `f` returns whether subscribers should be notified.  Returns whether
    /// `f` ran.
    fn apply<F>(&self, f: F) -> bool
    where
        F: FnOnce(&mut SyncState) -> bool,
    {
        let mut applied = false;
        self.state.send_if_modified(|state| {
            if self.disposed.load(Ordering::Acquire) {
                return false;
            }
            applied = true;
            f(state)
        });
        applied
    }

    fn apply_or_disposed<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce(&mut SyncState) -> bool,
    {
        if self.apply(f) {
            Ok(())
        } else {
            debug!("Dropping completion for disposed session");
            Err(ClientError::Disposed)
        }
    }
}

impl Drop for SessionInner {
    fn drop(&mut self) {
        self.poller
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .stop();
    }
}
