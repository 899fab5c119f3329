use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::{
    daemon::{
        event::FocusEvent,
        storage::stats_storage::StatsStorage,
    },
    utils::clock::Clock,
};

use super::module::EventProcessor;

/// Sessions at or below this length are rapid tab-flicking noise and are
/// never persisted.
pub const MIN_SESSION_MS: i64 = 1000;

/// One continuous interval during which a single domain held the active tab.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub domain: Arc<str>,
    pub title: Option<Arc<str>>,
    pub started_at: DateTime<Utc>,
}

/// Owns the single open session and turns focus events into stats document
/// updates. At most one session is open at any time: an event first closes
/// the previous session, then may open a new one.
pub struct SessionTracker<S: StatsStorage> {
    storage: S,
    current: Option<Session>,
    clock: Box<dyn Clock>,
}

impl<S: StatsStorage> SessionTracker<S> {
    pub fn new(storage: S, clock: Box<dyn Clock>) -> Self {
        Self {
            storage,
            current: None,
            clock,
        }
    }

    /// Closes the open session, if any, and persists it when it lasted long
    /// enough. `now` is the moment focus actually changed, so a lagging
    /// event queue can't inflate a session. The session is dropped from
    /// tracker state even when persistence fails, so one bad write never
    /// wedges the tracker.
    async fn close_session(&mut self, now: DateTime<Utc>) -> Result<()> {
        let Some(session) = self.current.take() else {
            return Ok(());
        };

        let elapsed_ms = (now - session.started_at).num_milliseconds();
        if elapsed_ms <= MIN_SESSION_MS {
            debug!(
                "Discarding {}ms flick on {}",
                elapsed_ms, session.domain
            );
            return Ok(());
        }

        let mut document = self.storage.load().await?;
        document.record_visit(&session.domain, session.title, elapsed_ms, now);
        self.storage.store(&document).await?;
        info!("Recorded {}ms on {}", elapsed_ms, session.domain);
        Ok(())
    }
}

impl<S: StatsStorage> EventProcessor for SessionTracker<S> {
    async fn process_next(&mut self, event: FocusEvent) -> Result<()> {
        self.close_session(event.timestamp).await?;

        if let Some(visit) = event.target {
            self.current = Some(Session {
                domain: visit.domain,
                title: visit.title,
                started_at: event.timestamp,
            });
        }
        Ok(())
    }

    async fn finalize(&mut self) -> Result<()> {
        let now = self.clock.now();
        self.close_session(now).await
    }
}
