//! Web API module for byshare.
//!
//! REST endpoints for uploads and file lifecycle operations, plus a
//! WebSocket stream for folder upload progress.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod server;

pub use error::ApiError;
pub use router::create_router;
pub use server::WebServer;
