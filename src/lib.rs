//! byshare - anonymous file sharing service
//!
//! File lifecycle and access control for a consumer file-sharing web app:
//! uploads (single files and folders), share links with passwords, expiry,
//! and visibility, per-user daily quotas, and upload history.

pub mod config;
pub mod error;
pub mod file;
pub mod logging;
pub mod web;

pub use config::Config;
pub use error::{ByshareError, Result};
pub use file::{
    ArtifactStore, FileRecord, FileRegistry, ProgressBroker, QuotaTracker, ShareService,
};
pub use web::WebServer;
