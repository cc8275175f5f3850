//! Test doubles shared by unit tests
//!
//! Sandbox and object store fakes append to one call log so tests can
//! assert on the relative order of their calls.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

use crate::error::{Error, Result};
use crate::lab::{Clock, MemorySessionStore, Session, SessionId, SessionStore};
use crate::sandbox::{ContainerId, SandboxClient};
use crate::storage::{MemoryObjectStore, ObjectStore};

pub(crate) type CallLog = Arc<Mutex<Vec<String>>>;

pub(crate) fn call_log() -> CallLog {
    Arc::new(Mutex::new(Vec::new()))
}

/// Sandbox that hands out `container-1`, `container-2`, ...
pub(crate) struct FakeSandbox {
    log: CallLog,
    next: AtomicUsize,
    pub fail_create: AtomicBool,
    pub fail_destroy: AtomicBool,
    hold_create: AtomicBool,
    create_entered: Notify,
    create_released: Notify,
}

impl FakeSandbox {
    pub fn new(log: CallLog) -> Self {
        FakeSandbox {
            log,
            next: AtomicUsize::new(1),
            fail_create: AtomicBool::new(false),
            fail_destroy: AtomicBool::new(false),
            hold_create: AtomicBool::new(false),
            create_entered: Notify::new(),
            create_released: Notify::new(),
        }
    }

    /// Make the next `create` calls block until [`FakeSandbox::release_create`]
    pub fn hold_create(&self) {
        self.hold_create.store(true, Ordering::SeqCst);
    }

    /// Wait until a held `create` call has started
    pub async fn create_entered(&self) {
        self.create_entered.notified().await;
    }

    /// Let one held `create` call finish
    pub fn release_create(&self) {
        self.create_released.notify_one();
    }

    pub fn set_fail_create(&self, fail: bool) {
        self.fail_create.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_destroy(&self, fail: bool) {
        self.fail_destroy.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl SandboxClient for FakeSandbox {
    fn name(&self) -> &str {
        "fake"
    }

    async fn create(&self) -> Result<ContainerId> {
        if self.hold_create.load(Ordering::SeqCst) {
            self.create_entered.notify_one();
            self.create_released.notified().await;
        }
        if self.fail_create.load(Ordering::SeqCst) {
            self.log.lock().unwrap().push("create:failed".to_string());
            return Err(Error::SandboxCreateFailed("image not found".to_string()));
        }
        let id = format!("container-{}", self.next.fetch_add(1, Ordering::SeqCst));
        self.log.lock().unwrap().push(format!("create:{}", id));
        Ok(ContainerId::new(id))
    }

    async fn destroy(&self, id: &ContainerId) -> Result<()> {
        self.log.lock().unwrap().push(format!("destroy:{}", id));
        if self.fail_destroy.load(Ordering::SeqCst) {
            return Err(Error::SandboxDestroyFailed {
                container: id.to_string(),
                message: "daemon unreachable".to_string(),
            });
        }
        Ok(())
    }
}

/// Memory-backed store that can be switched into failing
pub(crate) struct FakeStore {
    log: CallLog,
    pub inner: MemoryObjectStore,
    fail: AtomicBool,
}

impl FakeStore {
    pub fn new(log: CallLog) -> Self {
        FakeStore {
            log,
            inner: MemoryObjectStore::new(),
            fail: AtomicBool::new(false),
        }
    }

    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl ObjectStore for FakeStore {
    fn id(&self) -> &str {
        "fake"
    }

    async fn put(&self, key: &str, body: Vec<u8>, content_type: &str) -> Result<()> {
        self.log.lock().unwrap().push(format!("put:{}", key));
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::StoreUnavailable("bucket unreachable".to_string()));
        }
        self.inner.put(key, body, content_type).await
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::StoreUnavailable("bucket unreachable".to_string()));
        }
        self.inner.list(prefix).await
    }
}

/// Session store whose writes can be switched into failing
pub(crate) struct FlakySessionStore {
    pub inner: MemorySessionStore,
    fail_put: AtomicBool,
}

impl FlakySessionStore {
    pub fn new(inner: MemorySessionStore) -> Self {
        FlakySessionStore {
            inner,
            fail_put: AtomicBool::new(false),
        }
    }

    pub fn set_fail_put(&self, fail: bool) {
        self.fail_put.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl SessionStore for FlakySessionStore {
    async fn get(&self, id: &SessionId) -> Result<Option<Session>> {
        self.inner.get(id).await
    }

    async fn put(&self, id: SessionId, session: Session) -> Result<()> {
        if self.fail_put.load(Ordering::SeqCst) {
            return Err(Error::Internal("session write refused".to_string()));
        }
        self.inner.put(id, session).await
    }

    async fn remove(&self, id: &SessionId) -> Result<Option<Session>> {
        self.inner.remove(id).await
    }

    async fn running(&self) -> Result<Vec<(SessionId, Session)>> {
        self.inner.running().await
    }
}

/// Clock pinned to one instant
pub(crate) struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
