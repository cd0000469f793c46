//! Automation driver abstraction
//!
//! The engine never talks to Chrome directly. Everything goes through the
//! [`DriverSession`] trait so the login state machine and batch scheduler can
//! be exercised against a scripted in-memory driver in tests.

mod cdp;
mod errors;

#[cfg(test)]
pub(crate) mod fake;

pub use cdp::CdpLauncher;
pub use errors::DriverError;

use std::sync::Arc;

use async_trait::async_trait;

/// One isolated, stateful browser context scoped to a single credential.
///
/// Element operations take a structural locator and act on the first match.
/// A locator that matches nothing is `ElementNotFound`; callers that only
/// want to probe use [`DriverSession::exists`].
#[async_trait]
pub trait DriverSession: Send + Sync {
    /// Navigate the session's page to `url` and wait for the document to load.
    async fn goto(&self, url: &str) -> Result<(), DriverError>;

    /// Whether at least one element matches `selector` on the current page.
    async fn exists(&self, selector: &str) -> Result<bool, DriverError>;

    /// Click the first element matching `selector`.
    async fn click(&self, selector: &str) -> Result<(), DriverError>;

    /// Select any pre-filled value in the matched field, then type `text`
    /// over it. Retries must not compound keystrokes from earlier attempts.
    async fn clear_and_type(&self, selector: &str, text: &str) -> Result<(), DriverError>;

    /// Text content of the first element matching `selector`.
    async fn read_text(&self, selector: &str) -> Result<String, DriverError>;

    /// URL the page is currently on.
    async fn current_url(&self) -> Result<String, DriverError>;

    /// Release the session. Safe to call on a broken session; never fails.
    async fn close(&self);
}

/// Factory for isolated sessions. One launch per credential.
#[async_trait]
pub trait SessionLauncher: Send + Sync {
    async fn launch(&self) -> Result<Arc<dyn DriverSession>, DriverError>;
}

/// Launch-time options for a browser session.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchOptions {
    /// Run in headless mode
    pub headless: bool,
    /// Identification string exposed to the page
    pub user_agent: String,
    /// Window width
    pub window_width: u32,
    /// Window height
    pub window_height: u32,
    /// Path to Chrome/Chromium executable (auto-detected when unset)
    pub chrome_path: Option<String>,
    /// Navigation timeout in seconds
    pub nav_timeout_secs: u64,
    /// Grace period before teardown, letting in-flight requests settle
    pub close_grace_ms: u64,
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self {
            headless: true,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
                .to_string(),
            window_width: 1366,
            window_height: 768,
            chrome_path: None,
            nav_timeout_secs: 30,
            close_grace_ms: 5000,
        }
    }
}

impl LaunchOptions {
    /// Set headless mode
    pub fn headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Set Chrome path
    pub fn chrome_path(mut self, path: Option<String>) -> Self {
        self.chrome_path = path;
        self
    }
}
