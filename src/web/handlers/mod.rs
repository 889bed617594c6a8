//! API handlers for the Web API.

pub mod admin;
pub mod file;
pub mod progress;
pub mod user;

pub use admin::*;
pub use file::*;
pub use progress::*;
pub use user::*;

use crate::config::AdminConfig;
use crate::file::ShareService;

/// Shared application state for the handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The file sharing service.
    pub service: ShareService,
    /// Base URL used to build share links.
    pub base_url: String,
    /// Admin credentials.
    pub admin: AdminConfig,
}

impl AppState {
    /// Create the application state.
    pub fn new(service: ShareService, base_url: impl Into<String>, admin: AdminConfig) -> Self {
        Self {
            service,
            base_url: base_url.into(),
            admin,
        }
    }
}
