//! Connection manager: per-session push-channel bookkeeping. Deliberately
//! transport-agnostic — no HTTP/WebSocket framing lives here.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::warn;

use crate::event::GameEvent;
use crate::game::Game;
use crate::sync::Mutex;

/// Default capacity of a session's outbound event queue before the
/// newest event is dropped: overflow drops the newest event, never
/// blocks the engine.
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

/// One session's push-channel state: a bounded sender the transport
/// layer's consumer task drains, and (optionally) the engine itself if
/// the caller wants it resident in memory per-session rather than
/// reloaded from the session store on every message.
pub struct Connection {
    sender: mpsc::Sender<GameEvent>,
    game: Option<Arc<Game>>,
}

impl Connection {
    /// Enqueues `event` for delivery. If the bounded channel is full, the
    /// newest event (this one) is dropped and a warning is logged — the
    /// engine's emitting call must never block or fail on a slow/absent
    /// consumer.
    pub fn enqueue(&self, event: GameEvent) {
        if let Err(mpsc::error::TrySendError::Full(_)) = self.sender.try_send(event) {
            warn!(
                capacity = self.sender.max_capacity(),
                "session event queue full, dropping newest event"
            );
        }
    }

    /// The engine instance held for this connection, if the caller opted
    /// to keep it resident in memory.
    #[must_use]
    pub fn game(&self) -> Option<&Arc<Game>> {
        self.game.as_ref()
    }
}

/// Holds one [`Connection`] per active session and fans engine events out
/// to it.
///
/// Disconnection (`disconnect`) drops the channel but retains nothing
/// else — an engine a caller wants to survive for reconnection should
/// live in the session store (or a separate map the caller owns), not
/// solely inside the removed `Connection`.
pub struct ConnectionManager {
    connections: Mutex<HashMap<String, Arc<Connection>>>,
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionManager {
    /// Creates an empty connection manager.
    #[must_use]
    pub fn new() -> Self {
        Self {
            connections: Mutex::new(HashMap::new()),
        }
    }

    /// Registers a new connection for `session_id` with the default queue
    /// capacity, returning the receiver half a consumer task should
    /// drain. Replaces any existing connection for the same session.
    pub fn connect(
        &self,
        session_id: impl Into<String>,
        game: Option<Arc<Game>>,
    ) -> (Arc<Connection>, mpsc::Receiver<GameEvent>) {
        self.connect_with_capacity(session_id, game, DEFAULT_QUEUE_CAPACITY)
    }

    /// As `connect`, with an explicit queue capacity.
    pub fn connect_with_capacity(
        &self,
        session_id: impl Into<String>,
        game: Option<Arc<Game>>,
        capacity: usize,
    ) -> (Arc<Connection>, mpsc::Receiver<GameEvent>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let connection = Arc::new(Connection { sender, game });
        self.connections
            .lock()
            .insert(session_id.into(), Arc::clone(&connection));
        (connection, receiver)
    }

    /// Looks up the connection for `session_id`, if one is registered.
    #[must_use]
    pub fn get(&self, session_id: &str) -> Option<Arc<Connection>> {
        self.connections.lock().get(session_id).cloned()
    }

    /// Removes the connection entry for `session_id`.
    pub fn disconnect(&self, session_id: &str) {
        self.connections.lock().remove(session_id);
    }

    /// Number of sessions currently connected.
    #[must_use]
    pub fn active_connections(&self) -> usize {
        self.connections.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::ConnectionManager;
    use crate::event::{EventType, GameEvent};
    use serde_json::Map;
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    /// Scoped subscriber so the overflow warning below actually renders
    /// somewhere instead of being dropped by the default no-op subscriber.
    fn init_test_tracing() -> tracing::subscriber::DefaultGuard {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(tracing_subscriber::fmt::TestWriter::default()),
            )
            .with(tracing_subscriber::EnvFilter::from_default_env())
            .set_default()
    }

    #[tokio::test]
    async fn connect_then_disconnect_removes_the_entry() {
        let manager = ConnectionManager::new();
        let (_connection, _receiver) = manager.connect("session-1", None);
        assert_eq!(manager.active_connections(), 1);

        manager.disconnect("session-1");
        assert_eq!(manager.active_connections(), 0);
        assert!(manager.get("session-1").is_none());
    }

    #[tokio::test]
    async fn events_are_delivered_in_order() {
        let manager = ConnectionManager::new();
        let (connection, mut receiver) = manager.connect("session-1", None);

        connection.enqueue(GameEvent::new(EventType::PlayerHit, Map::new(), 1.0));
        connection.enqueue(GameEvent::new(EventType::PlayerStand, Map::new(), 2.0));

        let first = receiver.recv().await.expect("first event");
        let second = receiver.recv().await.expect("second event");
        assert_eq!(first.event_type, EventType::PlayerHit);
        assert_eq!(second.event_type, EventType::PlayerStand);
    }

    #[tokio::test]
    async fn overflow_drops_the_newest_event_without_blocking() {
        let _guard = init_test_tracing();
        let manager = ConnectionManager::new();
        let (connection, _receiver) = manager.connect_with_capacity("session-1", None, 2);

        connection.enqueue(GameEvent::new(EventType::PlayerHit, Map::new(), 0.0));
        connection.enqueue(GameEvent::new(EventType::PlayerStand, Map::new(), 0.0));
        // Over capacity: must be dropped silently (aside from a log), not
        // panic or block this test.
        connection.enqueue(GameEvent::new(EventType::PlayerDouble, Map::new(), 0.0));
    }

    #[tokio::test]
    async fn disconnect_retains_nothing_for_an_unknown_session() {
        let manager = ConnectionManager::new();
        manager.disconnect("never-connected");
        assert_eq!(manager.active_connections(), 0);
    }
}
