//! Browser sessions and where they are kept
//!
//! A session ties one authenticated user to at most one running sandbox.
//! The manager reads and writes sessions only through [`SessionStore`].

use async_trait::async_trait;
use moka::future::Cache;
use moka::notification::RemovalCause;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::auth::UserId;
use crate::config::SessionConfig;
use crate::error::Result;
use crate::sandbox::ContainerId;

/// Session handle given to the browser
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Fresh random id
    pub fn generate() -> Self {
        SessionId(uuid::Uuid::new_v4().to_string())
    }

    /// Wrap an id presented by a client
    pub fn new(id: impl Into<String>) -> Self {
        SessionId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Server-side session record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Who owns the session
    pub user_id: UserId,
    /// The sandbox currently bound to this session, if any
    pub active_container: Option<ContainerId>,
}

impl Session {
    /// Idle session for `user_id`
    pub fn new(user_id: UserId) -> Self {
        Session {
            user_id,
            active_container: None,
        }
    }

    /// `Running` when a sandbox is bound, `Idle` otherwise
    pub fn state(&self) -> LabState {
        if self.active_container.is_some() {
            LabState::Running
        } else {
            LabState::Idle
        }
    }
}

/// Lab state of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabState {
    Idle,
    Running,
}

/// Capability for reading and writing session records
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Look up a session
    async fn get(&self, id: &SessionId) -> Result<Option<Session>>;

    /// Insert or replace a session
    async fn put(&self, id: SessionId, session: Session) -> Result<()>;

    /// Drop a session, returning what was stored
    async fn remove(&self, id: &SessionId) -> Result<Option<Session>>;

    /// Every session that currently has a sandbox bound
    async fn running(&self) -> Result<Vec<(SessionId, Session)>>;
}

/// Receiving end for sandboxes whose session expired while still running
pub type AbandonedSandboxes = mpsc::UnboundedReceiver<ContainerId>;

/// In-process session store with idle expiry.
///
/// When a session is evicted (idle timeout or capacity) while a sandbox is
/// still bound to it, the container id is sent to the [`AbandonedSandboxes`]
/// channel so it can be destroyed.
#[derive(Clone)]
pub struct MemorySessionStore {
    sessions: Cache<SessionId, Session>,
}

impl MemorySessionStore {
    /// Create a store and the channel that reports abandoned sandboxes
    pub fn new(config: &SessionConfig) -> (Self, AbandonedSandboxes) {
        let (tx, rx) = mpsc::unbounded_channel();

        let listener = move |id: Arc<SessionId>, session: Session, cause: RemovalCause| {
            if !cause.was_evicted() {
                return;
            }
            if let Some(container) = session.active_container {
                info!(session = %id, container = %container, ?cause, "Session expired with a running sandbox");
                if tx.send(container).is_err() {
                    warn!(session = %id, "No reaper listening; sandbox left running");
                }
            }
        };

        let sessions = Cache::builder()
            .max_capacity(config.max_sessions)
            .time_to_idle(config.idle_timeout)
            .eviction_listener(listener)
            .build();

        (MemorySessionStore { sessions }, rx)
    }

    /// Process pending expirations now instead of on the next access
    pub async fn run_pending_tasks(&self) {
        self.sessions.run_pending_tasks().await;
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get(&self, id: &SessionId) -> Result<Option<Session>> {
        Ok(self.sessions.get(id).await)
    }

    async fn put(&self, id: SessionId, session: Session) -> Result<()> {
        self.sessions.insert(id, session).await;
        Ok(())
    }

    async fn remove(&self, id: &SessionId) -> Result<Option<Session>> {
        Ok(self.sessions.remove(id).await)
    }

    async fn running(&self) -> Result<Vec<(SessionId, Session)>> {
        Ok(self
            .sessions
            .iter()
            .filter(|(_, session)| session.active_container.is_some())
            .map(|(id, session)| ((*id).clone(), session))
            .collect())
    }
}
