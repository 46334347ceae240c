//! Session persistence: signed tokens plus a pluggable storage backend
//! for the [`crate::serialize::SessionRecord`] they key.

pub mod signer;
pub mod store;

pub use signer::{SessionSigner, global_signer};
pub use store::{InMemorySessionStore, RedisSessionStore, SessionStore, default_ttl, open_store};

use uuid::Uuid;

/// Generates a new, unsigned session id.
#[must_use]
pub fn new_session_id() -> String {
    Uuid::new_v4().to_string()
}
