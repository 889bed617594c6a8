//! Shared test harness for the Web API tests.

use std::sync::Arc;

use axum_test::TestServer;
use tempfile::TempDir;

use byshare::config::AdminConfig;
use byshare::file::{ArtifactStore, FileRegistry, ProgressBroker, QuotaTracker, ShareService};
use byshare::web::handlers::AppState;
use byshare::web::router::{create_health_router, create_router};

/// A running in-process API server backed by temp storage.
pub struct TestApp {
    pub server: TestServer,
    pub service: ShareService,
    _dir: TempDir,
}

/// Build a test app with explicit quota and size limits.
pub fn create_test_app_with(daily_limit: u32, max_upload_size: u64) -> TestApp {
    let dir = TempDir::new().expect("Failed to create temp dir");

    let registry = Arc::new(FileRegistry::in_memory());
    let store = Arc::new(ArtifactStore::new(dir.path()).expect("Failed to create artifact store"));
    let quota = Arc::new(QuotaTracker::new(daily_limit));
    let progress = Arc::new(ProgressBroker::new());
    let service = ShareService::new(registry, store, quota, progress, max_upload_size);

    let app_state = Arc::new(AppState::new(
        service.clone(),
        "http://localhost:3000",
        AdminConfig::default(),
    ));

    let router = create_router(app_state, &[]).merge(create_health_router());
    let server = TestServer::new(router).expect("Failed to create test server");

    TestApp {
        server,
        service,
        _dir: dir,
    }
}

/// Build a test app with the default limits.
pub fn create_test_app() -> TestApp {
    create_test_app_with(5, 10 * 1024 * 1024)
}
