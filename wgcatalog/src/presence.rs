//! Listener presence tracking
//!
//! Sessions join and leave under an opaque identifier; the live count is
//! observable push-style through a watch channel, so consumers react to
//! changes instead of polling.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Mutex;
use tokio::sync::watch;
use tracing::debug;

/// Tracks concurrent listener sessions
#[async_trait]
pub trait PresenceService: Send + Sync {
    /// Register a session; joining twice with the same id is a no-op
    async fn join(&self, session_id: &str);

    /// Remove a session; leaving an unknown id is a no-op
    async fn leave(&self, session_id: &str);

    /// Current number of joined sessions
    async fn count(&self) -> usize;

    /// Receiver notified whenever the count changes
    fn watch_count(&self) -> watch::Receiver<usize>;
}

/// Process-local presence service
#[derive(Debug)]
pub struct InMemoryPresence {
    sessions: Mutex<HashSet<String>>,
    count_tx: watch::Sender<usize>,
}

impl InMemoryPresence {
    pub fn new() -> Self {
        let (count_tx, _) = watch::channel(0);
        InMemoryPresence {
            sessions: Mutex::new(HashSet::new()),
            count_tx,
        }
    }

    /// Mutate the session set and publish the new count if it changed
    fn update<F>(&self, mutate: F)
    where
        F: FnOnce(&mut HashSet<String>) -> bool,
    {
        let mut sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        if mutate(&mut sessions) {
            let count = sessions.len();
            debug!(count, "Listener count changed");
            let _ = self.count_tx.send(count);
        }
    }
}

impl Default for InMemoryPresence {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PresenceService for InMemoryPresence {
    async fn join(&self, session_id: &str) {
        self.update(|sessions| sessions.insert(session_id.to_string()));
    }

    async fn leave(&self, session_id: &str) {
        self.update(|sessions| sessions.remove(session_id));
    }

    async fn count(&self) -> usize {
        let sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        sessions.len()
    }

    fn watch_count(&self) -> watch::Receiver<usize> {
        self.count_tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn join_and_leave_track_the_count() {
        let presence = InMemoryPresence::new();
        presence.join("a").await;
        presence.join("b").await;
        assert_eq!(presence.count().await, 2);

        presence.leave("a").await;
        assert_eq!(presence.count().await, 1);
    }

    #[tokio::test]
    async fn duplicate_join_and_unknown_leave_are_no_ops() {
        let presence = InMemoryPresence::new();
        presence.join("a").await;
        presence.join("a").await;
        assert_eq!(presence.count().await, 1);

        presence.leave("ghost").await;
        assert_eq!(presence.count().await, 1);
    }

    #[tokio::test]
    async fn watchers_see_count_changes() {
        let presence = InMemoryPresence::new();
        let mut rx = presence.watch_count();
        assert_eq!(*rx.borrow(), 0);

        presence.join("a").await;
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow(), 1);

        presence.leave("a").await;
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow(), 0);
    }

    #[tokio::test]
    async fn no_op_mutations_do_not_notify() {
        let presence = InMemoryPresence::new();
        presence.join("a").await;

        let rx = presence.watch_count();
        presence.join("a").await;
        presence.leave("ghost").await;
        assert!(!rx.has_changed().unwrap());
    }
}
