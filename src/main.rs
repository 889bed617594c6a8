use tracing::info;

use byshare::Config;

#[tokio::main]
async fn main() {
    // Load configuration
    let config = match Config::load("config.toml") {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config.toml: {e}");
            eprintln!("Using default configuration.");
            Config::default()
        }
    };

    // Initialize logging
    if let Err(e) = byshare::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        // Fall back to console-only logging
        byshare::logging::init_console_only(&config.logging.level);
    }

    info!("byshare - anonymous file sharing");
    info!(
        "Server configured on {}:{}",
        config.server.host, config.server.port
    );

    let server = match byshare::WebServer::new(&config) {
        Ok(server) => server,
        Err(e) => {
            tracing::error!("Failed to initialize server: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = server.run().await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
