//! File lifecycle: identifiers, records, quota, storage, registry, access
//! control, folder upload progress, and the orchestrating service.

use std::time::Duration;

pub mod access;
pub mod ident;
pub mod password;
pub mod progress;
pub mod quota;
pub mod record;
pub mod registry;
pub mod service;
pub mod storage;

pub use access::AccessGate;
pub use progress::{ProgressBroker, UploadEvent, UploadStatus};
pub use quota::QuotaTracker;
pub use record::{FileRecord, FolderMember, HistoryEntry, Visibility};
pub use registry::FileRegistry;
pub use service::{Download, NewUpload, ShareOptions, ShareService};
pub use storage::ArtifactStore;

/// Longest accepted filename, in characters.
pub const MAX_FILENAME_LENGTH: usize = 255;

/// Expiry dates are clamped to at most this many days from now.
pub const MAX_EXPIRY_DAYS: i64 = 365;

/// Artifact writes retry this many times before failing the upload.
pub const STORE_RETRY_ATTEMPTS: u32 = 3;

/// Fixed backoff between artifact write attempts.
pub const STORE_RETRY_BACKOFF: Duration = Duration::from_millis(100);
