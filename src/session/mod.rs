//! Session module - bounded, expiring conversation state
//!
//! The [`SessionStore`] owns every [`Session`] for the life of the process.
//! Each session keeps at most `max_history` messages (trimmed in whole
//! user/assistant pairs) and is evicted once it has been idle longer than the
//! time-to-live. Eviction is lazy: nothing runs on a timer, callers invoke
//! [`SessionStore::sweep`] when they touch the store.
//!
//! # Example
//!
//! ```
//! use docent::session::{Message, SessionStore};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = SessionStore::new(20, Duration::from_secs(3600));
//!
//!     store
//!         .append("chat-1", Message::user("Hello!"), Message::assistant("Hi there!"))
//!         .await;
//!
//!     assert_eq!(store.get("chat-1").await.len(), 2);
//!     assert!(store.get("unknown").await.is_empty());
//! }
//! ```

pub mod types;

pub use types::{Message, Role, Session, ToolCall};

use crate::config::SessionsConfig;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, info};

/// In-memory store of bounded conversation sessions.
///
/// # Thread Safety
///
/// The session map sits behind a single `RwLock`; every public operation
/// takes the lock once and releases it before returning, so the store can be
/// shared (`Arc<SessionStore>`) across any number of in-flight requests.
/// Two concurrent appends to the same id are each applied atomically but in
/// no guaranteed order; serializing a single id is the caller's job.
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Session>>,
    max_history: usize,
    ttl: Duration,
}

impl SessionStore {
    /// Create an empty store with the given history cap and idle TTL.
    pub fn new(max_history: usize, ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            max_history,
            ttl,
        }
    }

    /// Create an empty store from the `sessions` config section.
    pub fn from_config(config: &SessionsConfig) -> Self {
        Self::new(config.max_history, config.ttl())
    }

    /// Maximum messages kept per session.
    pub fn max_history(&self) -> usize {
        self.max_history
    }

    /// Idle time after which a session may be evicted.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Snapshot of the stored history for `id`, oldest first.
    ///
    /// Unknown ids yield an empty vector.
    pub async fn get(&self, id: &str) -> Vec<Message> {
        let sessions = self.sessions.read().await;
        sessions
            .get(id)
            .map(|s| s.messages.clone())
            .unwrap_or_default()
    }

    /// Append one user/assistant exchange to `id`, creating the session if
    /// absent, trimming to the history cap and refreshing its activity time.
    pub async fn append(&self, id: &str, user: Message, assistant: Message) {
        self.append_at(id, user, assistant, Instant::now()).await
    }

    /// [`SessionStore::append`] with an explicit clock reading.
    pub async fn append_at(&self, id: &str, user: Message, assistant: Message, now: Instant) {
        let mut sessions = self.sessions.write().await;
        let session = sessions.entry(id.to_string()).or_insert_with(|| {
            debug!(session_id = %id, "Creating session");
            Session::new(id, now)
        });
        session.push_exchange(user, assistant, self.max_history, now);
    }

    /// Remove `id` and its activity timestamp. Unknown ids are a no-op.
    ///
    /// Returns whether a session was removed.
    pub async fn clear(&self, id: &str) -> bool {
        let removed = self.sessions.write().await.remove(id).is_some();
        if removed {
            debug!(session_id = %id, "Cleared session");
        }
        removed
    }

    /// Evict every session idle for longer than the TTL.
    ///
    /// Returns the number of sessions removed.
    pub async fn sweep(&self) -> usize {
        self.sweep_at(Instant::now()).await
    }

    /// [`SessionStore::sweep`] with an explicit clock reading.
    pub async fn sweep_at(&self, now: Instant) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| !s.is_expired(now, self.ttl));
        let removed = before - sessions.len();
        if removed > 0 {
            info!(removed = removed, remaining = sessions.len(), "Evicted idle sessions");
        }
        removed
    }

    /// Whether a session is currently tracked for `id`.
    pub async fn contains(&self, id: &str) -> bool {
        self.sessions.read().await.contains_key(id)
    }

    /// Number of tracked sessions.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Whether no sessions are tracked.
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::from_config(&SessionsConfig::default())
    }
}
