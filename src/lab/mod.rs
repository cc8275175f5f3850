//! Lab module - the session lifecycle of one networking exercise
//!
//! - `manager`: start / validate / complete / history, sandbox teardown
//! - `validator`: answer checking
//! - `report`: completion reports and their archive keys
//! - `archiver`: writes and lists reports in the object store
//! - `session`: session records and the session store

mod archiver;
mod manager;
mod report;
mod session;
mod validator;

pub use archiver::ReportArchiver;
pub use manager::{Cleanup, CompletionOutcome, LabSessionManager};
pub use report::{
    Clock, CompletionReport, ReportKey, ReportStatus, SystemClock, REPORTS_PREFIX,
    TIMESTAMP_FORMAT,
};
pub use session::{
    AbandonedSandboxes, LabState, MemorySessionStore, Session, SessionId, SessionStore,
};
pub use validator::{AnswerValidator, LabAnswer};
