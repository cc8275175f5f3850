//! Request and response bodies of the lab HTTP API

use serde::{Deserialize, Serialize};

use crate::lab::{CompletionOutcome, ReportKey};

/// `POST /login`
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub session_id: String,
    pub user: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogoutResponse {
    pub logged_out: bool,
}

/// `POST /start-lab`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartLabResponse {
    pub container_id: String,
}

/// `POST /validate`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidateResponse {
    pub result: bool,
}

/// `POST /complete-lab`
///
/// `uploaded` says whether the report reached the store; `cleaned` and
/// `error` say whether the sandbox went away afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompleteLabResponse {
    pub uploaded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cleaned: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CompleteLabResponse {
    /// Archival failed; nothing else was attempted
    pub fn failed(error: impl Into<String>) -> Self {
        CompleteLabResponse {
            uploaded: false,
            report_name: None,
            cleaned: None,
            error: Some(error.into()),
        }
    }
}

impl From<&CompletionOutcome> for CompleteLabResponse {
    fn from(outcome: &CompletionOutcome) -> Self {
        CompleteLabResponse {
            uploaded: outcome.uploaded(),
            report_name: Some(outcome.report_name().to_string()),
            cleaned: Some(outcome.cleaned()),
            error: outcome.cleanup_error().map(|e| e.to_string()),
        }
    }
}

/// `GET /history`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub files: Vec<String>,
}

impl From<Vec<ReportKey>> for HistoryResponse {
    fn from(keys: Vec<ReportKey>) -> Self {
        HistoryResponse {
            files: keys.into_iter().map(|k| k.as_str().to_string()).collect(),
        }
    }
}

/// `GET /health`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}
