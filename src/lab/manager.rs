//! Lab session lifecycle
//!
//! Per session the lab is either `Idle` or `Running`:
//!
//! ```text
//!   Idle ──start_lab──▶ Running ──complete_lab / abandon_lab──▶ Idle
//!                          │ ▲
//!                          └─┘ start_lab again (previous sandbox untracked)
//! ```
//!
//! Completion always archives the report before the sandbox is destroyed.
//! If archival fails nothing else happens, so the same session can retry
//! against its still-running sandbox.

use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::auth::UserId;
use crate::config::LabConfig;
use crate::error::{Error, Result};
use crate::lab::archiver::ReportArchiver;
use crate::lab::report::{Clock, CompletionReport, ReportKey, SystemClock};
use crate::lab::session::{AbandonedSandboxes, Session, SessionId, SessionStore};
use crate::lab::validator::{AnswerValidator, LabAnswer};
use crate::sandbox::{ContainerId, SandboxClient};

/// What happened to the sandbox after a report was archived
#[derive(Debug)]
pub enum Cleanup {
    /// No sandbox was bound to the session
    NoSandbox,
    /// The bound sandbox was destroyed and the session is idle again
    Destroyed(ContainerId),
    /// Destroy failed; the session still points at the sandbox
    Failed {
        container: ContainerId,
        error: Error,
    },
    /// The sandbox was destroyed but the session could not be updated and
    /// may still name it
    Unrecorded {
        container: ContainerId,
        error: Error,
    },
}

/// Result of a completion whose report reached the store
#[derive(Debug)]
pub struct CompletionOutcome {
    pub report: CompletionReport,
    pub key: ReportKey,
    pub cleanup: Cleanup,
}

impl CompletionOutcome {
    /// Always true: an outcome only exists once the report is archived
    pub fn uploaded(&self) -> bool {
        true
    }

    /// Whether the session ended up idle with no sandbox left behind
    pub fn cleaned(&self) -> bool {
        matches!(self.cleanup, Cleanup::NoSandbox | Cleanup::Destroyed(_))
    }

    /// File name of the archived report
    pub fn report_name(&self) -> &str {
        self.key.file_name()
    }

    /// The destroy error, when cleanup failed
    pub fn cleanup_error(&self) -> Option<&Error> {
        match &self.cleanup {
            Cleanup::Failed { error, .. } | Cleanup::Unrecorded { error, .. } => Some(error),
            _ => None,
        }
    }
}

/// Owns the one-sandbox-per-session bookkeeping and sequences
/// sandbox, validator and archiver calls.
pub struct LabSessionManager {
    sandbox: Arc<dyn SandboxClient>,
    archiver: ReportArchiver,
    validator: AnswerValidator,
    sessions: Arc<dyn SessionStore>,
    clock: Arc<dyn Clock>,
    topology: String,
    success_score: i64,
}

impl LabSessionManager {
    /// Wire the manager to its collaborators
    pub fn new(
        sandbox: Arc<dyn SandboxClient>,
        archiver: ReportArchiver,
        sessions: Arc<dyn SessionStore>,
        lab: &LabConfig,
    ) -> Self {
        LabSessionManager {
            sandbox,
            archiver,
            validator: AnswerValidator::new(lab.expected_subnet_mask.clone()),
            sessions,
            clock: Arc::new(SystemClock),
            topology: lab.topology.clone(),
            success_score: lab.success_score,
        }
    }

    /// Replace the clock used to stamp reports
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Create an idle session for an authenticated user
    pub async fn open_session(&self, user_id: UserId) -> Result<SessionId> {
        let id = SessionId::generate();
        self.sessions.put(id.clone(), Session::new(user_id.clone())).await?;
        info!(session = %id, user = %user_id, "Session opened");
        Ok(id)
    }

    /// Look up a session; a missing one means the caller is not logged in
    pub async fn session(&self, session_id: &SessionId) -> Result<Session> {
        self.sessions
            .get(session_id)
            .await?
            .ok_or(Error::Unauthenticated)
    }

    /// Launch a sandbox and bind it to the session.
    ///
    /// Starting while already running is allowed: the new sandbox replaces
    /// the pointer and the old one is no longer tracked by this session.
    #[tracing::instrument(skip(self), fields(session = %session_id))]
    pub async fn start_lab(&self, session_id: &SessionId) -> Result<ContainerId> {
        let session = self.session(session_id).await?;

        if let Some(previous) = &session.active_container {
            warn!(
                previous = %previous,
                "Starting a second sandbox; the previous one is no longer tracked"
            );
        }

        let container = self.sandbox.create().await.inspect_err(|e| {
            error!(runtime = self.sandbox.name(), "Sandbox create failed: {}", e);
        })?;

        // Re-read: the session may have been closed or expired while the
        // sandbox was being created. Only the pointer is ours to change.
        let mut current = match self.sessions.get(session_id).await {
            Ok(Some(current)) => current,
            Ok(None) => {
                warn!(container = %container, "Session ended during sandbox create");
                self.discard(&container).await;
                return Err(Error::Unauthenticated);
            }
            Err(e) => {
                error!(container = %container, "Could not reload session after create: {}", e);
                self.discard(&container).await;
                return Err(e);
            }
        };
        current.active_container = Some(container.clone());

        if let Err(e) = self.sessions.put(session_id.clone(), current).await {
            error!(container = %container, "Could not record sandbox on session: {}", e);
            self.discard(&container).await;
            return Err(e);
        }

        info!(container = %container, "Lab started");
        Ok(container)
    }

    /// Check an answer. No session state is read or written.
    pub fn validate(&self, answer: &LabAnswer) -> bool {
        let correct = self.validator.validate(answer);
        debug!(correct, "Answer validated");
        correct
    }

    /// Archive a completion report, then tear down the session's sandbox.
    ///
    /// Archive failure returns `Err` with the session untouched. Destroy
    /// failure after a successful archive returns `Ok` with
    /// [`Cleanup::Failed`].
    #[tracing::instrument(skip(self), fields(session = %session_id))]
    pub async fn complete_lab(&self, session_id: &SessionId) -> Result<CompletionOutcome> {
        let session = self.session(session_id).await?;

        let report = CompletionReport::success(
            session.user_id.clone(),
            self.success_score,
            self.topology.clone(),
            self.clock.now(),
        );

        let key = self.archiver.archive(&report).await.inspect_err(|e| {
            error!(user = %session.user_id, "Report archival failed, sandbox kept: {}", e);
        })?;

        let cleanup = match session.active_container {
            None => Cleanup::NoSandbox,
            Some(container) => match self.sandbox.destroy(&container).await {
                Ok(()) => match self.clear_active(session_id, &container).await {
                    Ok(()) => Cleanup::Destroyed(container),
                    Err(error) => Cleanup::Unrecorded { container, error },
                },
                Err(error) => {
                    warn!(container = %container, "Report archived but sandbox destroy failed: {}", error);
                    Cleanup::Failed { container, error }
                }
            },
        };

        let outcome = CompletionOutcome { report, key, cleanup };
        info!(key = %outcome.key, cleaned = outcome.cleaned(), "Lab completed");
        Ok(outcome)
    }

    /// The user's archived report keys, newest first.
    ///
    /// Store errors yield an empty list; history is advisory.
    pub async fn list_history(&self, user_id: &UserId) -> Vec<ReportKey> {
        match self.archiver.list(user_id).await {
            Ok(keys) => keys,
            Err(e) => {
                warn!(user = %user_id, "Report history unavailable: {}", e);
                Vec::new()
            }
        }
    }

    /// Destroy the session's sandbox without archiving anything.
    ///
    /// Returns the destroyed container, if there was one.
    #[tracing::instrument(skip(self), fields(session = %session_id))]
    pub async fn abandon_lab(&self, session_id: &SessionId) -> Result<Option<ContainerId>> {
        let session = self.session(session_id).await?;

        let Some(container) = session.active_container else {
            return Ok(None);
        };

        self.sandbox.destroy(&container).await?;
        self.clear_active(session_id, &container).await?;

        info!(container = %container, "Lab abandoned");
        Ok(Some(container))
    }

    /// Log out: abandon any running lab, then forget the session.
    ///
    /// If the sandbox cannot be destroyed the session is kept so the
    /// caller can retry.
    pub async fn end_session(&self, session_id: &SessionId) -> Result<()> {
        self.abandon_lab(session_id).await?;
        self.sessions.remove(session_id).await?;
        info!(session = %session_id, "Session closed");
        Ok(())
    }

    /// Abandon every session still holding a sandbox. Returns how many
    /// sandboxes were destroyed.
    pub async fn release_all(&self) -> usize {
        let running = match self.sessions.running().await {
            Ok(running) => running,
            Err(e) => {
                error!("Cannot enumerate sessions for cleanup: {}", e);
                return 0;
            }
        };

        let mut released = 0;
        for (session_id, _) in running {
            match self.abandon_lab(&session_id).await {
                Ok(Some(_)) => released += 1,
                Ok(None) => {}
                Err(e) => error!(session = %session_id, "Sandbox cleanup failed: {}", e),
            }
        }
        released
    }

    /// Destroy sandboxes whose sessions expired. Runs until the sending
    /// side (the session store) is dropped.
    pub async fn reap_abandoned(&self, mut abandoned: AbandonedSandboxes) {
        while let Some(container) = abandoned.recv().await {
            match self.sandbox.destroy(&container).await {
                Ok(()) => info!(container = %container, "Reaped abandoned sandbox"),
                Err(e) => error!(container = %container, "Failed to reap abandoned sandbox: {}", e),
            }
        }
        debug!("Sandbox reaper stopped");
    }

    /// Destroy a sandbox no session knows about
    async fn discard(&self, container: &ContainerId) {
        if let Err(e) = self.sandbox.destroy(container).await {
            error!(container = %container, "Unrecorded sandbox left running: {}", e);
        }
    }

    /// Clear the session's pointer if it still names `container`.
    ///
    /// A session that is already gone counts as cleared.
    async fn clear_active(&self, session_id: &SessionId, container: &ContainerId) -> Result<()> {
        let current = match self.sessions.get(session_id).await {
            Ok(Some(current)) => current,
            Ok(None) => return Ok(()),
            Err(e) => {
                error!(container = %container, "Could not reload session after destroy: {}", e);
                return Err(e);
            }
        };

        if current.active_container.as_ref() != Some(container) {
            return Ok(());
        }

        let cleared = Session {
            active_container: None,
            ..current
        };
        self.sessions
            .put(session_id.clone(), cleared)
            .await
            .inspect_err(|e| {
                error!(container = %container, "Could not clear destroyed sandbox from session: {}", e);
            })
    }
}
