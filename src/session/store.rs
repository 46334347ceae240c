//! Session storage backends: an in-memory store for local development and
//! a Redis-backed store for anything shared across processes.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use redis::AsyncCommands;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::SessionError;
use crate::serialize::SessionRecord;

const DEFAULT_TTL: Duration = Duration::from_secs(30 * 60);
const CLEANUP_INTERVAL: Duration = Duration::from_secs(60);
const REDIS_KEY_PREFIX: &str = "blackjack:session:";

/// A storage backend for [`SessionRecord`]s, keyed by session id.
///
/// Implementations must treat a missing or expired entry identically:
/// `get` returns `Ok(None)` for both, never an error.
#[async_trait::async_trait]
pub trait SessionStore: Send + Sync {
    /// Fetches a session's record, if present and unexpired.
    async fn get(&self, session_id: &str) -> Result<Option<SessionRecord>, SessionError>;

    /// Stores (overwriting) a session's record with the given TTL.
    async fn set(
        &self,
        session_id: &str,
        record: &SessionRecord,
        ttl: Duration,
    ) -> Result<(), SessionError>;

    /// Removes a session's record, if present.
    async fn delete(&self, session_id: &str) -> Result<(), SessionError>;

    /// Whether a session's record is present and unexpired.
    async fn exists(&self, session_id: &str) -> Result<bool, SessionError> {
        Ok(self.get(session_id).await?.is_some())
    }
}

struct Entry {
    record: SessionRecord,
    expires_at: Instant,
}

/// An in-memory, process-local [`SessionStore`] with TTL-based expiry.
///
/// Spawns a background task on construction that periodically evicts
/// expired entries so an abandoned session does not leak memory
/// indefinitely even if nothing ever calls `get` on it again.
pub struct InMemorySessionStore {
    sessions: Arc<RwLock<HashMap<String, Entry>>>,
    cleanup_handle: JoinHandle<()>,
}

impl InMemorySessionStore {
    /// Creates a new store and starts its background cleanup task.
    #[must_use]
    pub fn new() -> Self {
        let sessions: Arc<RwLock<HashMap<String, Entry>>> = Arc::new(RwLock::new(HashMap::new()));
        let cleanup_handle = Self::spawn_cleanup_task(Arc::clone(&sessions));
        Self {
            sessions,
            cleanup_handle,
        }
    }

    fn spawn_cleanup_task(sessions: Arc<RwLock<HashMap<String, Entry>>>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(CLEANUP_INTERVAL);
            loop {
                interval.tick().await;
                let evicted = Self::sweep(&sessions).await;
                if evicted > 0 {
                    info!(evicted, "evicted expired sessions");
                }
            }
        })
    }

    async fn sweep(sessions: &RwLock<HashMap<String, Entry>>) -> usize {
        let now = Instant::now();
        let mut sessions = sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, entry| entry.expires_at > now);
        before - sessions.len()
    }

    /// Removes every expired entry right now, returning the number
    /// evicted. Exposed so a caller can run a sweep on its own schedule
    /// instead of waiting out `CLEANUP_INTERVAL`'s background task.
    pub async fn cleanup_expired(&self) -> usize {
        Self::sweep(&self.sessions).await
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for InMemorySessionStore {
    fn drop(&mut self) {
        self.cleanup_handle.abort();
    }
}

#[async_trait::async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, session_id: &str) -> Result<Option<SessionRecord>, SessionError> {
        let mut sessions = self.sessions.write().await;
        match sessions.get(session_id) {
            Some(entry) if entry.expires_at > Instant::now() => Ok(Some(entry.record.clone())),
            Some(_) => {
                sessions.remove(session_id);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set(
        &self,
        session_id: &str,
        record: &SessionRecord,
        ttl: Duration,
    ) -> Result<(), SessionError> {
        self.sessions.write().await.insert(
            session_id.to_owned(),
            Entry {
                record: record.clone(),
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn delete(&self, session_id: &str) -> Result<(), SessionError> {
        self.sessions.write().await.remove(session_id);
        Ok(())
    }
}

/// A Redis-backed [`SessionStore`], sharing state across every process
/// pointed at the same Redis instance.
pub struct RedisSessionStore {
    connection: redis::aio::ConnectionManager,
}

impl RedisSessionStore {
    /// Connects to `redis_url` and pings it once to fail fast if the
    /// server is unreachable.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Backend`] if the connection or initial
    /// ping fails.
    pub async fn connect(redis_url: &str) -> Result<Self, SessionError> {
        let client = redis::Client::open(redis_url).map_err(|e| SessionError::Backend(e.to_string()))?;
        let mut connection = client
            .get_connection_manager()
            .await
            .map_err(|e| SessionError::Backend(e.to_string()))?;
        let _: String = redis::cmd("PING")
            .query_async(&mut connection)
            .await
            .map_err(|e| SessionError::Backend(e.to_string()))?;
        Ok(Self { connection })
    }

    fn key(session_id: &str) -> String {
        format!("{REDIS_KEY_PREFIX}{session_id}")
    }
}

#[async_trait::async_trait]
impl SessionStore for RedisSessionStore {
    async fn get(&self, session_id: &str) -> Result<Option<SessionRecord>, SessionError> {
        let mut connection = self.connection.clone();
        let raw: Option<String> = connection
            .get(Self::key(session_id))
            .await
            .map_err(|e| SessionError::Backend(e.to_string()))?;
        raw.map(|json| {
            serde_json::from_str(&json).map_err(|e| SessionError::CorruptRecord(e.to_string()))
        })
        .transpose()
    }

    async fn set(
        &self,
        session_id: &str,
        record: &SessionRecord,
        ttl: Duration,
    ) -> Result<(), SessionError> {
        let json = serde_json::to_string(record).map_err(|e| SessionError::CorruptRecord(e.to_string()))?;
        let mut connection = self.connection.clone();
        connection
            .set_ex::<_, _, ()>(Self::key(session_id), json, ttl.as_secs())
            .await
            .map_err(|e| SessionError::Backend(e.to_string()))
    }

    async fn delete(&self, session_id: &str) -> Result<(), SessionError> {
        let mut connection = self.connection.clone();
        connection
            .del::<_, ()>(Self::key(session_id))
            .await
            .map_err(|e| SessionError::Backend(e.to_string()))
    }
}

/// Connects to `redis_url` if given, falling back to an in-memory store if
/// the URL is absent or the connection fails. The fallback is logged
/// rather than silent.
pub async fn open_store(redis_url: Option<&str>) -> Arc<dyn SessionStore> {
    if let Some(url) = redis_url {
        match RedisSessionStore::connect(url).await {
            Ok(store) => return Arc::new(store),
            Err(error) => {
                warn!(%error, "could not reach Redis, falling back to in-memory session store");
            }
        }
    }
    Arc::new(InMemorySessionStore::new())
}

/// Default session TTL.
#[must_use]
pub const fn default_ttl() -> Duration {
    DEFAULT_TTL
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;
    use std::time::Duration;

    use super::{InMemorySessionStore, SessionStore};
    use crate::game::Game;
    use crate::rules::RuleSet;
    use crate::serialize::{GameSnapshot, PerformanceRecord, SessionRecord};

    fn sample_record() -> SessionRecord {
        let game = Game::new(RuleSet::default(), dec!(1000), 1).expect("valid rules");
        SessionRecord {
            game: GameSnapshot::capture(&game, 1),
            performance: PerformanceRecord::default(),
            created_at: 0.0,
            last_activity: 0.0,
        }
    }

    #[tokio::test]
    async fn stores_and_retrieves_a_record() {
        let store = InMemorySessionStore::new();
        let record = sample_record();
        store.set("abc", &record, Duration::from_secs(60)).await.expect("set");

        let fetched = store.get("abc").await.expect("get").expect("present");
        assert_eq!(fetched.game, record.game);
    }

    #[tokio::test]
    async fn expired_entries_are_not_returned() {
        let store = InMemorySessionStore::new();
        let record = sample_record();
        store
            .set("abc", &record, Duration::from_millis(1))
            .await
            .expect("set");

        tokio::time::sleep(Duration::from_millis(20)).await;

        assert!(store.get("abc").await.expect("get").is_none());
    }

    #[tokio::test]
    async fn delete_removes_the_entry() {
        let store = InMemorySessionStore::new();
        let record = sample_record();
        store.set("abc", &record, Duration::from_secs(60)).await.expect("set");
        store.delete("abc").await.expect("delete");
        assert!(!store.exists("abc").await.expect("exists"));
    }
}
