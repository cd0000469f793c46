//! Chrome DevTools Protocol driver
//!
//! Implements the driver traits on top of chromiumoxide. Each launch gets its
//! own Chrome process with an isolated user data directory, a normalized
//! fingerprint (user agent, viewport, headers) and the automation signal
//! suppressed at the flag level.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::{Headers, SetExtraHttpHeadersParams};
use chromiumoxide::page::Page;
use futures::StreamExt;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::{DriverError, DriverSession, LaunchOptions, SessionLauncher};

/// Global counter for sequential session naming (Session-1, Session-2, ...)
static SESSION_COUNTER: AtomicU32 = AtomicU32::new(1);

/// Launches CDP-backed browser sessions.
pub struct CdpLauncher {
    opts: LaunchOptions,
}

impl CdpLauncher {
    pub fn new(opts: LaunchOptions) -> Self {
        Self { opts }
    }
}

#[async_trait]
impl SessionLauncher for CdpLauncher {
    async fn launch(&self) -> Result<Arc<dyn DriverSession>, DriverError> {
        let session = CdpSession::launch(self.opts.clone()).await?;
        Ok(Arc::new(session))
    }
}

/// One Chrome instance driven over CDP.
pub struct CdpSession {
    id: String,
    page: Page,
    browser: Mutex<Option<Browser>>,
    opts: LaunchOptions,
}

impl CdpSession {
    async fn launch(opts: LaunchOptions) -> Result<Self, DriverError> {
        let session_id = format!("Session-{}", SESSION_COUNTER.fetch_add(1, Ordering::Relaxed));

        info!(
            "Launching browser session {} (headless: {})",
            session_id, opts.headless
        );

        // Isolated profile per session: cookies and storage never leak
        // between credentials.
        let user_data_dir = std::env::temp_dir()
            .join("fbwatch")
            .join("browser_data")
            .join(format!("{}-{}", std::process::id(), session_id));
        std::fs::create_dir_all(&user_data_dir)?;

        let mut builder = BrowserConfig::builder()
            .user_data_dir(&user_data_dir)
            .window_size(opts.window_width, opts.window_height)
            .args(vec![
                // Anti-detection: suppress the default automation signal
                "--disable-blink-features=AutomationControlled",
                "--disable-infobars",
                "--no-first-run",
                "--no-default-browser-check",
                "--disable-features=VizDisplayCompositor,site-per-process",
                "--disable-dev-shm-usage",
                "--disable-extensions",
                "--disable-plugins",
                "--disable-gpu",
                // Required when running as root (e.g., in Docker or on a VPS)
                "--no-sandbox",
                "--disable-setuid-sandbox",
            ]);

        if !opts.headless {
            builder = builder.with_head();
        }

        if let Some(ref path) = opts.chrome_path {
            builder = builder.chrome_executable(path);
        }

        let config = builder
            .build()
            .map_err(DriverError::LaunchFailed)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| DriverError::LaunchFailed(e.to_string()))?;

        // Drive the CDP event loop; when this ends Chrome has disconnected.
        let handler_id = session_id.clone();
        tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                debug!("Session {} browser event: {:?}", handler_id, event);
            }
            debug!("Session {} Chrome disconnected (event handler ended)", handler_id);
        });

        // Chrome opens with a blank tab; reuse it instead of stacking tabs.
        let page = {
            let mut pages = browser
                .pages()
                .await
                .map_err(|e| DriverError::LaunchFailed(e.to_string()))?;

            let main_page = if !pages.is_empty() {
                pages.remove(0)
            } else {
                browser
                    .new_page("about:blank")
                    .await
                    .map_err(|e| DriverError::LaunchFailed(e.to_string()))?
            };

            for extra_page in pages {
                debug!("Closing extra blank tab");
                let _ = extra_page.close().await;
            }

            main_page
        };

        // Realistic identification string and normalized request headers.
        page.set_user_agent(opts.user_agent.as_str())
            .await
            .map_err(|e| DriverError::LaunchFailed(e.to_string()))?;

        let headers_json = serde_json::json!({
            "Accept-Language": "en-US,en;q=0.9",
            "Accept": "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,image/apng,*/*;q=0.8",
            "Upgrade-Insecure-Requests": "1"
        });
        page.execute(SetExtraHttpHeadersParams::new(Headers::new(headers_json)))
            .await
            .map_err(|e| DriverError::LaunchFailed(e.to_string()))?;

        info!("Browser session {} created", session_id);

        Ok(Self {
            id: session_id,
            page,
            browser: Mutex::new(Some(browser)),
            opts,
        })
    }
}

#[async_trait]
impl DriverSession for CdpSession {
    async fn goto(&self, url: &str) -> Result<(), DriverError> {
        debug!("Session {} navigating to: {}", self.id, url);

        let nav = async {
            self.page
                .goto(url)
                .await
                .map_err(|e| DriverError::NavigationFailed(e.to_string()))?;
            self.page
                .wait_for_navigation()
                .await
                .map_err(|e| DriverError::NavigationFailed(e.to_string()))?;
            Ok::<(), DriverError>(())
        };

        tokio::time::timeout(Duration::from_secs(self.opts.nav_timeout_secs), nav)
            .await
            .map_err(|_| DriverError::Timeout(format!("Navigation to {} timed out", url)))?
    }

    async fn exists(&self, selector: &str) -> Result<bool, DriverError> {
        // A failed query counts as "no match": the page may be mid-transition
        // and callers fall through to the next candidate or retry.
        Ok(self.page.find_element(selector).await.is_ok())
    }

    async fn click(&self, selector: &str) -> Result<(), DriverError> {
        let element = self
            .page
            .find_element(selector)
            .await
            .map_err(|e| DriverError::ElementNotFound(format!("{}: {}", selector, e)))?;

        element
            .click()
            .await
            .map_err(|e| DriverError::ConnectionLost(e.to_string()))?;

        Ok(())
    }

    async fn clear_and_type(&self, selector: &str, text: &str) -> Result<(), DriverError> {
        let element = self
            .page
            .find_element(selector)
            .await
            .map_err(|e| DriverError::ElementNotFound(format!("{}: {}", selector, e)))?;

        element
            .click()
            .await
            .map_err(|e| DriverError::ConnectionLost(e.to_string()))?;

        // Select any pre-filled value so typing replaces it instead of
        // appending to a previous attempt's keystrokes. A failed select must
        // fail the whole call; typing over an unselected value would poison
        // every later attempt.
        element
            .call_js_fn("function() { this.select(); }", false)
            .await
            .map_err(|e| DriverError::ConnectionLost(e.to_string()))?;

        element
            .type_str(text)
            .await
            .map_err(|e| DriverError::ConnectionLost(e.to_string()))?;

        Ok(())
    }

    async fn read_text(&self, selector: &str) -> Result<String, DriverError> {
        let element = self
            .page
            .find_element(selector)
            .await
            .map_err(|e| DriverError::ElementNotFound(format!("{}: {}", selector, e)))?;

        let text = element
            .inner_text()
            .await
            .map_err(|e| DriverError::ConnectionLost(e.to_string()))?;

        Ok(text.unwrap_or_default())
    }

    async fn current_url(&self) -> Result<String, DriverError> {
        self.page
            .url()
            .await
            .map_err(|e| DriverError::ConnectionLost(e.to_string()))?
            .ok_or_else(|| DriverError::ConnectionLost("No URL".into()))
    }

    async fn close(&self) {
        // Grace period so in-flight network activity settles before teardown.
        tokio::time::sleep(Duration::from_millis(self.opts.close_grace_ms)).await;

        let _ = self.page.clone().close().await;

        let mut browser = self.browser.lock().await;
        if let Some(mut b) = browser.take() {
            // Graceful close first, then force kill so no Chrome child
            // processes are left behind.
            if let Err(e) = b.close().await {
                warn!("Session {} browser close failed: {}", self.id, e);
            }
            tokio::time::sleep(Duration::from_millis(500)).await;
            let _ = b.kill().await;
        }

        info!("Browser session {} closed", self.id);
    }
}
