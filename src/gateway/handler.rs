//! Conversation front door
//!
//! [`ChatHandler`] ties the session store to the agent loop: it sweeps
//! expired sessions, fetches history, runs the agent and records the
//! exchange. Messages for the same session id are processed one at a time;
//! different ids run concurrently.

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex as StdMutex, PoisonError};
use std::time::Instant;

use futures::FutureExt;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, error, info, info_span, Instrument};

use crate::agent::AgentLoop;
use crate::config::Config;
use crate::error::Result;
use crate::providers::{build_provider, LLMProvider};
use crate::session::{Message, SessionStore};
use crate::store::{DocumentStore, MemoryDocumentStore};
use crate::tools::{documents, ToolRegistry};
use crate::utils::string::preview;

/// Reply used when handling a message fails outside the agent loop.
pub const FRONT_DOOR_FAULT_REPLY: &str = "I apologize, but I encountered an error processing your request. Please try again or rephrase your question.";

/// Routes inbound messages through the session store and the agent loop.
pub struct ChatHandler {
    agent: AgentLoop,
    sessions: SessionStore,
    session_locks: SessionLocks,
}

type SessionLocks = StdMutex<HashMap<String, Arc<Mutex<()>>>>;

/// Holds one reference to a session's lock and drops the map entry once
/// no other message for the session holds one. Runs on drop, so requests
/// cancelled mid-flight release their entry too.
struct SessionLease<'a> {
    locks: &'a SessionLocks,
    session_id: &'a str,
    lock: Option<Arc<Mutex<()>>>,
}

impl SessionLease<'_> {
    async fn acquire(&self) -> Option<MutexGuard<'_, ()>> {
        match &self.lock {
            Some(lock) => Some(lock.lock().await),
            None => None,
        }
    }
}

impl Drop for SessionLease<'_> {
    fn drop(&mut self) {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        // Clones are only taken under the map lock, so a count of one is final.
        self.lock.take();
        if locks
            .get(self.session_id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(self.session_id);
            debug!("Released idle session lock");
        }
    }
}

impl ChatHandler {
    /// Create a handler from an agent loop and a session store.
    pub fn new(agent: AgentLoop, sessions: SessionStore) -> Self {
        Self {
            agent,
            sessions,
            session_locks: StdMutex::new(HashMap::new()),
        }
    }

    /// Build a handler from configuration with an explicit provider and
    /// registry.
    pub fn from_parts(config: &Config, provider: Box<dyn LLMProvider>, tools: ToolRegistry) -> Self {
        Self::new(
            AgentLoop::from_config(config, provider, tools),
            SessionStore::from_config(&config.sessions),
        )
    }

    /// Build the full handler: configured backend, document store loaded
    /// from `store.documents_path` (empty when unset) and the document tools.
    pub fn from_config(config: &Config) -> Result<Self> {
        let store: Arc<dyn DocumentStore> = match &config.store.documents_path {
            Some(path) => Arc::new(MemoryDocumentStore::from_json_file(path)?),
            None => Arc::new(MemoryDocumentStore::new()),
        };
        let tools = documents::registry(store).with_timeout(config.agent.tool_timeout());
        let provider = build_provider(config)?;
        Ok(Self::from_parts(config, provider, tools))
    }

    /// Answer one message for `session_id`.
    ///
    /// `history_override` replaces the stored history as model context for
    /// this message only; the exchange is still appended to the session.
    /// Only user and plain assistant entries of the override are kept.
    /// Always returns user-facing text.
    pub async fn handle_message(
        &self,
        session_id: &str,
        message: &str,
        history_override: Option<Vec<Message>>,
    ) -> String {
        let request_id = uuid::Uuid::new_v4().to_string();
        let span = info_span!("chat", request_id = %request_id, session_id = %session_id);
        self.process(session_id, message, history_override)
            .instrument(span)
            .await
    }

    async fn process(
        &self,
        session_id: &str,
        message: &str,
        history_override: Option<Vec<Message>>,
    ) -> String {
        let start = Instant::now();
        info!(message = %preview(message, 100), "Processing chat message");

        self.sessions.sweep().await;

        let lease = self.lease(session_id);
        let reply = {
            let _guard = lease.acquire().await;

            let history = match history_override {
                Some(mut history) => {
                    history.retain(Message::is_conversational);
                    history
                }
                None => self.sessions.get(session_id).await,
            };

            match AssertUnwindSafe(self.agent.run(message, &history))
                .catch_unwind()
                .await
            {
                Ok(answer) => {
                    self.sessions
                        .append(
                            session_id,
                            Message::user(message),
                            Message::assistant(answer.as_str()),
                        )
                        .await;
                    answer
                }
                Err(_) => {
                    error!("Agent run panicked");
                    FRONT_DOOR_FAULT_REPLY.to_string()
                }
            }
        };
        drop(lease);

        info!(
            latency_ms = start.elapsed().as_millis() as u64,
            "Chat message processed"
        );
        reply
    }

    fn lease<'a>(&'a self, session_id: &'a str) -> SessionLease<'a> {
        let mut locks = self
            .session_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let lock = Arc::clone(
            locks
                .entry(session_id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(()))),
        );
        SessionLease {
            locks: &self.session_locks,
            session_id,
            lock: Some(lock),
        }
    }

    /// Forget a session. Returns whether it existed.
    pub async fn clear_session(&self, session_id: &str) -> bool {
        self.sessions.clear(session_id).await
    }

    /// Number of sessions currently held.
    pub async fn active_sessions(&self) -> usize {
        self.sessions.len().await
    }

    /// The session store.
    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// The agent loop.
    pub fn agent(&self) -> &AgentLoop {
        &self.agent
    }

    /// The tool registry used by the agent.
    pub fn registry(&self) -> &ToolRegistry {
        self.agent.tools()
    }

    /// Model sent with completion requests.
    pub fn model(&self) -> &str {
        self.agent.model()
    }

    #[cfg(test)]
    fn tracked_locks(&self) -> usize {
        self.session_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
