//! Timer-driven incremental polling bound to a session's lifetime.

use std::sync::Weak;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::debug;

use crate::session::{Session, SessionInner};

/// Owns the polling task of one session.  At most one task is alive.
#[derive(Debug, Default)]
pub(crate) struct Poller {
    task: Option<JoinHandle<()>>,
}

impl Poller {
    /// Spawn a fresh polling task, aborting the previous one first.
    ///
    /// Returns `true` if a running task was replaced.
    pub(crate) fn start(&mut self, session: Weak<SessionInner>, period: Duration) -> bool {
        let replaced = self.stop();
        self.task = Some(tokio::spawn(poll_loop(session, period)));
        replaced
    }

    /// Abort the polling task.  Returns `true` if one was running.
    pub(crate) fn stop(&mut self) -> bool {
        match self.task.take() {
            Some(task) => {
                let was_running = !task.is_finished();
                task.abort();
                was_running
            }
            None => false,
        }
    }

    pub(crate) fn is_running(&self) -> bool {
        self.task.as_ref().map_or(false, |task| !task.is_finished())
    }
}

/// Poll once per `period`, first tick one full period after start.
///
/// Ticks missed while a slow poll was running are skipped rather than
/// replayed.  The loop ends when the session is dropped or disposed.
async fn poll_loop(weak: Weak<SessionInner>, period: Duration) {
    let mut ticker = time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;

        let Some(inner) = weak.upgrade() else {
            debug!("Session dropped, polling task exiting");
            return;
        };
        let session = Session { inner };
        if session.is_disposed() {
            debug!("Session disposed, polling task exiting");
            return;
        }

        // Failures are logged inside; the next tick simply tries again.
        let _ = session.poll_for_updates().await;
    }
}
