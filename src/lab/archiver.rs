//! Report archival to the object store

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::auth::UserId;
use crate::error::{with_timeout, Error, Result};
use crate::lab::report::{CompletionReport, ReportKey};
use crate::storage::ObjectStore;

const JSON_CONTENT_TYPE: &str = "application/json";

/// Writes completion reports and lists a user's archive.
///
/// No retries: a failed write is returned to the caller as is.
#[derive(Clone)]
pub struct ReportArchiver {
    store: Arc<dyn ObjectStore>,
    timeout: Duration,
}

impl ReportArchiver {
    /// Archiver over `store`, bounding every call by `timeout`
    pub fn new(store: Arc<dyn ObjectStore>, timeout: Duration) -> Self {
        ReportArchiver { store, timeout }
    }

    /// Persist `report` at its derived key
    pub async fn archive(&self, report: &CompletionReport) -> Result<ReportKey> {
        let key = report.key();
        let body = report.to_json_bytes()?;

        with_timeout(self.timeout, "report archive", async {
            self.store
                .put(key.as_str(), body, JSON_CONTENT_TYPE)
                .await
                .map_err(into_store_error)
        })
        .await?;

        info!(key = %key, store = self.store.id(), "Archived completion report");
        Ok(key)
    }

    /// All of `user`'s report keys, newest first
    pub async fn list(&self, user: &UserId) -> Result<Vec<ReportKey>> {
        let prefix = ReportKey::user_prefix(user);

        let raw = with_timeout(self.timeout, "report list", async {
            self.store.list(&prefix).await.map_err(into_store_error)
        })
        .await?;

        let mut keys: Vec<ReportKey> = raw.into_iter().map(ReportKey::from_raw).collect();
        keys.sort_unstable_by(|a, b| b.cmp(a));

        debug!(user = %user, count = keys.len(), "Listed reports");
        Ok(keys)
    }
}

fn into_store_error(err: Error) -> Error {
    match err {
        Error::StoreUnavailable(_) | Error::Timeout(_) => err,
        other => Error::StoreUnavailable(other.to_string()),
    }
}
