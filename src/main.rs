//! fbwatch - Standalone Web Server
//!
//! Runs the watch engine behind an HTTP API.
//!
//! Environment variables:
//! - `FBWATCH_WEB_PORT` - Server port (default: 8080)
//! - `FBWATCH_WEB_USER` - Basic auth username (default: "admin")
//! - `FBWATCH_WEB_PASS` - Basic auth password (auth disabled if not set)

use std::sync::Arc;

use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _guard = fbwatch::init_logging();

    info!("Starting fbwatch (server mode)");

    if let Some(dir) = fbwatch::log_dir() {
        info!("Log files saved to: {}", dir.display());
    }

    let port: u16 = std::env::var("FBWATCH_WEB_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);

    // Log auth status
    if std::env::var("FBWATCH_WEB_PASS").map(|p| !p.is_empty()).unwrap_or(false) {
        let user = std::env::var("FBWATCH_WEB_USER").unwrap_or_else(|_| "admin".to_string());
        info!("Basic auth enabled (user: {})", user);
    } else {
        info!("Basic auth disabled (set FBWATCH_WEB_PASS to enable)");
    }

    // No display means Chrome cannot open a window; force headless.
    let mut config = fbwatch::AppConfig::load();
    let has_display = std::env::var("DISPLAY").map(|d| !d.is_empty()).unwrap_or(false);
    if !has_display && !config.headless {
        info!("Server mode: no DISPLAY - forcing headless=true");
        config.headless = true;
        config.save();
    }

    let state = Arc::new(fbwatch::AppState::with_config(config)?);

    info!("Application state initialized");
    info!("API: http://0.0.0.0:{}/api", port);

    // Blocks until shutdown
    fbwatch::web::start_server(state, port).await?;

    Ok(())
}
