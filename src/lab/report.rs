//! Completion reports and the keys they are archived under

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::UserId;

/// Timestamp layout shared by reports and their keys. Sorts chronologically.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H%M%S";

/// Prefix every archived report lives under
pub const REPORTS_PREFIX: &str = "reports";

/// Outcome recorded in a report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportStatus {
    Success,
    Failure,
}

/// Immutable record of one completed lab attempt.
///
/// Field order is the serialized order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionReport {
    pub user: UserId,
    pub score: i64,
    pub topology: String,
    pub status: ReportStatus,
    pub timestamp: String,
}

impl CompletionReport {
    /// Successful report stamped at `at`
    pub fn success(user: UserId, score: i64, topology: impl Into<String>, at: DateTime<Utc>) -> Self {
        CompletionReport {
            user,
            score,
            topology: topology.into(),
            status: ReportStatus::Success,
            timestamp: at.format(TIMESTAMP_FORMAT).to_string(),
        }
    }

    /// Canonical JSON body
    pub fn to_json_bytes(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }

    /// Where this report is archived
    pub fn key(&self) -> ReportKey {
        ReportKey::new(&self.user, &self.timestamp)
    }
}

/// Storage path of one report: `reports/{user}/report_{timestamp}.json`.
///
/// Two completions by one user within the same second share a key; the
/// later write replaces the earlier one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReportKey(String);

impl ReportKey {
    /// Key for `user`'s report stamped `timestamp`
    pub fn new(user: &UserId, timestamp: &str) -> Self {
        ReportKey(format!(
            "{}report_{}.json",
            Self::user_prefix(user),
            timestamp
        ))
    }

    /// Listing prefix for everything `user` has archived
    pub fn user_prefix(user: &UserId) -> String {
        format!("{}/{}/", REPORTS_PREFIX, user)
    }

    /// Wrap a key read back from the store
    pub fn from_raw(key: impl Into<String>) -> Self {
        ReportKey(key.into())
    }

    /// The full key
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Last path segment, e.g. `report_2024-01-01_120000.json`
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }
}

impl std::fmt::Display for ReportKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Source of "now" for report timestamps
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock, UTC
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_report_json_layout() {
        let report = CompletionReport::success(UserId::new("alice"), 100, "192.168.1.0/24", noon());
        let body = String::from_utf8(report.to_json_bytes().unwrap()).unwrap();
        assert_eq!(
            body,
            r#"{"user":"alice","score":100,"topology":"192.168.1.0/24","status":"Success","timestamp":"2024-01-01_120000"}"#
        );
    }

    #[test]
    fn test_key_layout() {
        let report = CompletionReport::success(UserId::new("alice"), 100, "192.168.1.0/24", noon());
        let key = report.key();
        assert_eq!(key.as_str(), "reports/alice/report_2024-01-01_120000.json");
        assert_eq!(key.file_name(), "report_2024-01-01_120000.json");
        assert!(key.as_str().starts_with(&ReportKey::user_prefix(&UserId::new("alice"))));
    }

    #[test]
    fn test_keys_sort_chronologically() {
        let user = UserId::new("alice");
        let earlier = ReportKey::new(&user, "2023-12-31_235959");
        let later = ReportKey::new(&user, "2024-01-01_000000");
        assert!(earlier < later);
    }
}
