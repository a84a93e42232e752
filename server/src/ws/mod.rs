pub mod actor;
pub mod dispatch;
pub mod handler;
pub mod protocol;

use dashmap::DashMap;
use tokio::sync::mpsc;

/// Type alias for the sender half of a WebSocket connection's channel.
/// Other parts of the system can clone this to push messages to a specific client.
pub type ConnectionSender = mpsc::UnboundedSender<axum::extract::ws::Message>;

/// Connection registry: tracks the single active WebSocket connection per user.
///
/// A second connection for the same user replaces the first (last writer
/// wins); the replaced sender is handed back to the caller so it can be
/// closed. Absence of an entry means "user currently offline for push
/// purposes" and is never an error.
///
/// Constructed once at process start and shared through AppState; no other
/// component iterates or mutates the map directly.
pub struct ConnectionRegistry {
    inner: DashMap<i64, ConnectionSender>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            inner: DashMap::new(),
        }
    }

    /// Store `tx` as the sole connection for `user_id`, unconditionally
    /// replacing any prior entry. Returns the evicted sender, if any.
    pub fn register(&self, user_id: i64, tx: ConnectionSender) -> Option<ConnectionSender> {
        let evicted = self.inner.insert(user_id, tx);
        tracing::debug!(user_id, replaced = evicted.is_some(), "Connection registered");
        evicted
    }

    /// Remove the entry for `user_id` only if the stored sender is the same
    /// channel as `tx`. A close event from a connection that has already
    /// been replaced must not evict its replacement.
    pub fn unregister(&self, user_id: i64, tx: &ConnectionSender) {
        let removed = self
            .inner
            .remove_if(&user_id, |_, stored| stored.same_channel(tx))
            .is_some();
        tracing::debug!(user_id, removed, "Connection unregistered");
    }

    /// Current sender for `user_id`, or None if the user is offline.
    pub fn lookup(&self, user_id: i64) -> Option<ConnectionSender> {
        self.inner.get(&user_id).map(|entry| entry.value().clone())
    }

    /// Number of currently registered connections.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel() -> (
        ConnectionSender,
        mpsc::UnboundedReceiver<axum::extract::ws::Message>,
    ) {
        mpsc::unbounded_channel()
    }

    #[test]
    fn register_then_lookup() {
        let registry = ConnectionRegistry::new();
        let (tx, _rx) = channel();

        assert!(registry.register(7, tx.clone()).is_none());
        let found = registry.lookup(7).expect("registered user should be found");
        assert!(found.same_channel(&tx));
    }

    #[test]
    fn last_writer_wins() {
        let registry = ConnectionRegistry::new();
        let (tx_a, _rx_a) = channel();
        let (tx_b, _rx_b) = channel();

        registry.register(7, tx_a.clone());
        let evicted = registry.register(7, tx_b.clone());

        assert!(evicted.expect("first sender evicted").same_channel(&tx_a));
        let found = registry.lookup(7).unwrap();
        assert!(found.same_channel(&tx_b));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn stale_unregister_does_not_evict_replacement() {
        let registry = ConnectionRegistry::new();
        let (tx_a, _rx_a) = channel();
        let (tx_b, _rx_b) = channel();

        registry.register(7, tx_a.clone());
        registry.register(7, tx_b.clone());

        // Late close event from the replaced connection
        registry.unregister(7, &tx_a);

        let found = registry.lookup(7).expect("newer connection must survive");
        assert!(found.same_channel(&tx_b));
    }

    #[test]
    fn unregister_own_connection_removes_entry() {
        let registry = ConnectionRegistry::new();
        let (tx, _rx) = channel();

        registry.register(7, tx.clone());
        registry.unregister(7, &tx);

        assert!(registry.lookup(7).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn lookup_unknown_user_is_none() {
        let registry = ConnectionRegistry::new();
        assert!(registry.lookup(999).is_none());
    }
}
