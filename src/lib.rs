//! # Net Explorer
//!
//! Lab session lifecycle service for the Net Explorer networking lab.
//!
//! ## Features
//!
//! - **Isolated Sandboxes:** One memory-capped container per learner lab
//! - **Answer Checking:** Subnet mask validation against the lab's expected answer
//! - **Durable Reports:** Completion reports archived before the sandbox is torn down
//! - **History:** Per-user report listing, newest first
//! - **Abandonment Cleanup:** Logout, idle expiry and shutdown all release sandboxes

pub mod auth;
pub mod config;
pub mod error;
pub mod gateway;
pub mod lab;
pub mod sandbox;
pub mod storage;

#[cfg(test)]
pub(crate) mod testing;

pub use config::Config;
pub use error::{Error, Result};

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const NAME: &str = env!("CARGO_PKG_NAME");
