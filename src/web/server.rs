//! Web server for byshare.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;

use crate::config::Config;
use crate::file::{
    ArtifactStore, FileRegistry, ProgressBroker, QuotaTracker, ShareService,
};
use crate::Result;

use super::handlers::AppState;
use super::router::{create_health_router, create_router};

/// Web server for the API.
pub struct WebServer {
    /// Server address.
    addr: SocketAddr,
    /// Application state.
    app_state: Arc<AppState>,
    /// Allowed CORS origins.
    cors_origins: Vec<String>,
}

impl WebServer {
    /// Create a new web server from configuration, opening the registry
    /// snapshot and artifact store it points at.
    pub fn new(config: &Config) -> Result<Self> {
        let registry = Arc::new(FileRegistry::open(&config.storage.snapshot_path)?);
        let store = Arc::new(ArtifactStore::new(&config.storage.artifact_path)?);
        let quota = Arc::new(QuotaTracker::new(config.limits.daily_upload_limit));
        let progress = Arc::new(ProgressBroker::new());

        let service = ShareService::new(
            registry,
            store,
            quota,
            progress,
            config.storage.max_upload_size_bytes(),
        );

        let app_state = AppState::new(service, &config.server.base_url, config.admin.clone());

        Ok(Self {
            addr: format!("{}:{}", config.server.host, config.server.port)
                .parse()
                .map_err(|e| {
                    crate::ByshareError::Config(format!("invalid server address: {e}"))
                })?,
            app_state: Arc::new(app_state),
            cors_origins: config.server.cors_origins.clone(),
        })
    }

    /// Create a web server over a pre-built service, for tests.
    pub fn from_service(
        service: ShareService,
        base_url: impl Into<String>,
        admin: crate::config::AdminConfig,
    ) -> Self {
        let app_state = AppState::new(service, base_url, admin);
        Self {
            addr: "127.0.0.1:0".parse().expect("loopback address"),
            app_state: Arc::new(app_state),
            cors_origins: Vec::new(),
        }
    }

    /// Get the server address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    fn build_router(&self) -> axum::Router {
        create_router(self.app_state.clone(), &self.cors_origins).merge(create_health_router())
    }

    /// Run the web server.
    pub async fn run(self) -> std::io::Result<()> {
        let router = self.build_router();

        let listener = TcpListener::bind(self.addr).await?;
        let local_addr = listener.local_addr()?;
        tracing::info!("Web server listening on http://{}", local_addr);

        axum::serve(listener, router).await
    }

    /// Run the server and return the actual bound address.
    ///
    /// This is useful for testing when binding to port 0.
    pub async fn run_with_addr(self) -> std::io::Result<SocketAddr> {
        let router = self.build_router();

        let listener = TcpListener::bind(self.addr).await?;
        let local_addr = listener.local_addr()?;
        tracing::info!("Web server listening on http://{}", local_addr);

        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router).await {
                tracing::error!("Web server error: {}", e);
            }
        });

        Ok(local_addr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_web_server_new() {
        let dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.storage.artifact_path = dir.path().join("storage").display().to_string();
        config.storage.snapshot_path = dir.path().join("database.json").display().to_string();
        config.server.host = "127.0.0.1".to_string();
        config.server.port = 0;

        let server = WebServer::new(&config).unwrap();
        assert_eq!(server.addr().ip().to_string(), "127.0.0.1");
    }
}
