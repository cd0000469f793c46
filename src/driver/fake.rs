//! Scripted in-memory driver for deterministic engine tests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::{DriverError, DriverSession, SessionLauncher};

/// Locators that advance the script when clicked, mirroring the default
/// submit-control candidates.
const SUBMIT_LOCATORS: &[&str] = &[
    "#loginbutton",
    "button[name=\"login\"]",
    "[data-testid=\"royal_login_button\"]",
    "button[type=\"submit\"]",
];

/// Snapshot of a fake page: its URL and the locators that match on it.
#[derive(Debug, Clone, Default)]
pub(crate) struct FakePage {
    pub url: String,
    pub elements: HashMap<String, String>,
}

impl FakePage {
    pub fn at(url: &str) -> Self {
        Self {
            url: url.to_string(),
            elements: HashMap::new(),
        }
    }

    pub fn with(mut self, selector: &str, text: &str) -> Self {
        self.elements.insert(selector.to_string(), text.to_string());
        self
    }

    /// The login form with the default email/password/submit locators.
    pub fn login_form() -> Self {
        Self::at("https://www.facebook.com/login")
            .with("#email", "")
            .with("#pass", "")
            .with("#loginbutton", "")
    }

    /// A logged-in landing page carrying a success marker.
    pub fn home() -> Self {
        Self::at("https://www.facebook.com/home").with("[data-testid=\"search\"]", "")
    }
}

/// Scripted behavior for one fake session.
#[derive(Debug, Clone)]
pub(crate) struct FakeScript {
    /// Page shown when the login URL loads.
    pub login_page: FakePage,
    /// Fail every navigation to the login page.
    pub fail_login_nav: bool,
    /// Pages shown after each submit click, consumed in order. When the
    /// queue runs dry the page stays unchanged (no signal).
    pub after_submit: Vec<FakePage>,
    /// Locators present on any non-login page (the watch target).
    pub target_elements: HashMap<String, String>,
    /// Fail navigation to the target URL.
    pub fail_target_nav: bool,
    /// Fail the first `clear_and_type` call (stale input handle).
    pub fail_first_type: bool,
}

impl Default for FakeScript {
    fn default() -> Self {
        let mut target_elements = HashMap::new();
        target_elements.insert("[aria-label*=\"Play\"]".to_string(), String::new());
        Self {
            login_page: FakePage::login_form(),
            fail_login_nav: false,
            after_submit: vec![FakePage::home()],
            target_elements,
            fail_target_nav: false,
            fail_first_type: false,
        }
    }
}

impl FakeScript {
    /// Login succeeds first try; target page has no play control.
    pub fn without_play_control() -> Self {
        Self {
            target_elements: HashMap::new(),
            ..Self::default()
        }
    }
}

/// In-memory [`DriverSession`] driven by a [`FakeScript`].
pub(crate) struct FakeSession {
    page: Mutex<FakePage>,
    login_page: FakePage,
    after_submit: Mutex<VecDeque<FakePage>>,
    fail_login_nav: bool,
    target_elements: HashMap<String, String>,
    fail_target_nav: bool,
    fail_next_type: AtomicBool,
    pub nav_count: AtomicU32,
    pub clicks: Mutex<Vec<String>>,
    pub typed: Mutex<Vec<(String, String)>>,
    pub closed: AtomicBool,
}

impl FakeSession {
    pub fn new(script: FakeScript) -> Self {
        Self {
            page: Mutex::new(FakePage::default()),
            login_page: script.login_page,
            after_submit: Mutex::new(script.after_submit.into()),
            fail_login_nav: script.fail_login_nav,
            target_elements: script.target_elements,
            fail_target_nav: script.fail_target_nav,
            fail_next_type: AtomicBool::new(script.fail_first_type),
            nav_count: AtomicU32::new(0),
            clicks: Mutex::new(Vec::new()),
            typed: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
        }
    }

    pub fn navigations(&self) -> u32 {
        self.nav_count.load(Ordering::Relaxed)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl DriverSession for FakeSession {
    async fn goto(&self, url: &str) -> Result<(), DriverError> {
        self.nav_count.fetch_add(1, Ordering::Relaxed);

        if url.contains("/login") {
            if self.fail_login_nav {
                return Err(DriverError::NavigationFailed("login page unreachable".into()));
            }
            *self.page.lock().unwrap() = self.login_page.clone();
        } else {
            if self.fail_target_nav {
                return Err(DriverError::NavigationFailed("target unreachable".into()));
            }
            *self.page.lock().unwrap() = FakePage {
                url: url.to_string(),
                elements: self.target_elements.clone(),
            };
        }
        Ok(())
    }

    async fn exists(&self, selector: &str) -> Result<bool, DriverError> {
        Ok(self.page.lock().unwrap().elements.contains_key(selector))
    }

    async fn click(&self, selector: &str) -> Result<(), DriverError> {
        if !self.page.lock().unwrap().elements.contains_key(selector) {
            return Err(DriverError::ElementNotFound(selector.to_string()));
        }
        self.clicks.lock().unwrap().push(selector.to_string());

        if SUBMIT_LOCATORS.contains(&selector) {
            if let Some(next) = self.after_submit.lock().unwrap().pop_front() {
                *self.page.lock().unwrap() = next;
            }
        }
        Ok(())
    }

    async fn clear_and_type(&self, selector: &str, text: &str) -> Result<(), DriverError> {
        if !self.page.lock().unwrap().elements.contains_key(selector) {
            return Err(DriverError::ElementNotFound(selector.to_string()));
        }
        if self.fail_next_type.swap(false, Ordering::Relaxed) {
            return Err(DriverError::ConnectionLost("input handle went stale".into()));
        }
        self.typed
            .lock()
            .unwrap()
            .push((selector.to_string(), text.to_string()));
        Ok(())
    }

    async fn read_text(&self, selector: &str) -> Result<String, DriverError> {
        self.page
            .lock()
            .unwrap()
            .elements
            .get(selector)
            .cloned()
            .ok_or_else(|| DriverError::ElementNotFound(selector.to_string()))
    }

    async fn current_url(&self) -> Result<String, DriverError> {
        Ok(self.page.lock().unwrap().url.clone())
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::Relaxed);
    }
}

/// Launcher that hands out one fresh scripted session per call and keeps
/// every launched session around for inspection.
pub(crate) struct FakeLauncher {
    script: FakeScript,
    fail_launch: bool,
    pub launch_count: AtomicU32,
    pub launched: Mutex<Vec<Arc<FakeSession>>>,
}

impl FakeLauncher {
    pub fn new(script: FakeScript) -> Self {
        Self {
            script,
            fail_launch: false,
            launch_count: AtomicU32::new(0),
            launched: Mutex::new(Vec::new()),
        }
    }

    /// Launcher whose every launch fails (environment-level failure).
    pub fn failing() -> Self {
        Self {
            fail_launch: true,
            ..Self::new(FakeScript::default())
        }
    }

    pub fn launches(&self) -> u32 {
        self.launch_count.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl SessionLauncher for FakeLauncher {
    async fn launch(&self) -> Result<Arc<dyn DriverSession>, DriverError> {
        self.launch_count.fetch_add(1, Ordering::Relaxed);
        if self.fail_launch {
            return Err(DriverError::LaunchFailed("no usable browser environment".into()));
        }
        let session = Arc::new(FakeSession::new(self.script.clone()));
        self.launched.lock().unwrap().push(session.clone());
        Ok(session)
    }
}
