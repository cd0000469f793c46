//! fbwatch
//!
//! Multi-account watch automation for facebook.com: batched isolated browser
//! sessions, a retrying login state machine with selector fallback, and a
//! best-effort playback stage, exposed over an HTTP API.

pub mod account;
pub mod driver;
pub mod engine;
pub mod web;

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{error, info, warn};

use account::{AccountStore, JsonFileStore};
use driver::{CdpLauncher, LaunchOptions, SessionLauncher};
use engine::{EngineConfig, WatchEngine};

/// Application configuration
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    /// Run Chrome without a visible window
    #[serde(default = "default_headless")]
    pub headless: bool,

    /// Path to Chrome/Chromium executable (auto-detected when unset)
    #[serde(default)]
    pub chrome_path: Option<String>,

    /// Credentials per sequentially-processed group
    #[serde(default = "default_group_size")]
    pub group_size: usize,

    /// Pacing delay between groups in milliseconds
    #[serde(default = "default_group_delay_ms")]
    pub group_delay_ms: u64,

    /// Override for the account store location (defaults next to the config)
    #[serde(default)]
    pub accounts_path: Option<PathBuf>,
}

fn default_headless() -> bool {
    true
}
fn default_group_size() -> usize {
    5
}
fn default_group_delay_ms() -> u64 {
    10_000
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            headless: default_headless(),
            chrome_path: None,
            group_size: default_group_size(),
            group_delay_ms: default_group_delay_ms(),
            accounts_path: None,
        }
    }
}

/// Get log directory path (shared across modules)
pub fn log_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("fbwatch").join("logs"))
}

impl AppConfig {
    /// Get config file path
    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("fbwatch").join("config.json"))
    }

    /// Get default account store path
    fn default_accounts_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("fbwatch").join("accounts.json"))
    }

    /// Load config from file
    pub fn load() -> Self {
        if let Some(path) = Self::config_path() {
            if path.exists() {
                match std::fs::read_to_string(&path) {
                    Ok(content) => match serde_json::from_str(&content) {
                        Ok(config) => {
                            info!("Loaded config from {:?}", path);
                            return config;
                        }
                        Err(e) => {
                            warn!("Failed to parse config file: {}", e);
                        }
                    },
                    Err(e) => {
                        warn!("Failed to read config file: {}", e);
                    }
                }
            }
        }
        Self::default()
    }

    /// Save config to file
    pub fn save(&self) {
        if let Some(path) = Self::config_path() {
            if let Some(parent) = path.parent() {
                if let Err(e) = std::fs::create_dir_all(parent) {
                    error!("Failed to create config directory: {}", e);
                    return;
                }
            }

            match serde_json::to_string_pretty(self) {
                Ok(content) => {
                    if let Err(e) = std::fs::write(&path, content) {
                        error!("Failed to save config: {}", e);
                    } else {
                        info!("Config saved to {:?}", path);
                    }
                }
                Err(e) => {
                    error!("Failed to serialize config: {}", e);
                }
            }
        }
    }
}

/// Application state shared across the app
pub struct AppState {
    /// Credential store
    pub store: Arc<dyn AccountStore>,
    /// Browser session factory
    pub launcher: Arc<dyn SessionLauncher>,
    /// The watch engine
    pub engine: Arc<WatchEngine>,
    /// Application configuration
    pub config: Arc<RwLock<AppConfig>>,
}

impl AppState {
    /// Create new application state with loaded config
    pub fn new() -> anyhow::Result<Self> {
        Self::with_config(AppConfig::load())
    }

    /// Create application state from an explicit config
    pub fn with_config(config: AppConfig) -> anyhow::Result<Self> {
        let accounts_path = config
            .accounts_path
            .clone()
            .or_else(AppConfig::default_accounts_path)
            .ok_or_else(|| anyhow::anyhow!("no config directory available"))?;
        info!("Account store at {:?}", accounts_path);
        let store: Arc<dyn AccountStore> = Arc::new(JsonFileStore::new(accounts_path));

        let options = LaunchOptions::default()
            .headless(config.headless)
            .chrome_path(config.chrome_path.clone());
        let launcher: Arc<dyn SessionLauncher> = Arc::new(CdpLauncher::new(options));

        let engine_config = EngineConfig {
            group_size: config.group_size,
            group_delay_ms: config.group_delay_ms,
            ..EngineConfig::default()
        };
        let engine = Arc::new(
            WatchEngine::new(launcher.clone(), store.clone(), engine_config)
                .map_err(|e| anyhow::anyhow!("engine init failed: {}", e))?,
        );

        Ok(Self {
            store,
            launcher,
            engine,
            config: Arc::new(RwLock::new(config)),
        })
    }
}

/// Initialize logging (console plus daily-rolling file when possible)
pub fn init_logging() -> Option<tracing_appender::non_blocking::WorkerGuard> {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing::Level::INFO.into());

    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(false);

    if let Some(log_dir) = log_dir() {
        let _ = std::fs::create_dir_all(&log_dir);
        let file_appender = tracing_appender::rolling::daily(&log_dir, "fbwatch.log");
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        let file_layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_target(true)
            .with_thread_ids(true)
            .with_writer(non_blocking);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(console_layer)
            .with(file_layer)
            .init();

        Some(guard)
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(console_layer)
            .init();

        None
    }
}
