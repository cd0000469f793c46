//! Multi-account watch automation engine
//!
//! One configurable engine drives every credential through the same
//! pipeline: isolated session -> login state machine -> action stage ->
//! outcome. Timing constants and selectors are injected so behavior is
//! testable with fake values.

mod action;
mod batch;
mod login;
mod runner;
mod selectors;

pub use batch::WatchEngine;
pub use login::LoginOutcome;
pub use selectors::{resolve, Field, SelectorSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::account::Account;

/// The engine's input unit: a target resource and the credentials to fan
/// the watch action out across.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchJob {
    pub target_url: String,
    pub accounts: Vec<Account>,
}

/// Per-credential result record. Produced exactly once per credential,
/// independent of how many internal retries occurred.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionOutcome {
    pub account_id: i64,
    pub email: String,
    pub success: bool,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// Pre-flight job rejection. The only errors that escape the engine;
/// everything after validation becomes a per-credential outcome.
#[derive(Error, Debug)]
pub enum WatchError {
    #[error("URL and accounts are required")]
    EmptyJob,

    #[error("Invalid Facebook URL")]
    InvalidUrl,

    #[error("Invalid selector set: {0}")]
    BadSelectors(String),
}

/// Engine timing and behavior knobs. Defaults mirror production values;
/// [`EngineConfig::fast`] zeroes the waits for tests.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    /// Sign-in page for the target platform
    pub login_url: String,
    /// Settle after loading the login page
    pub login_settle_ms: u64,
    /// Pause after typing into a field
    pub type_pause_ms: u64,
    /// Fixed wait for the page to react after submitting
    pub response_settle_ms: u64,
    /// Delay between login attempts
    pub retry_delay_ms: u64,
    /// Total login attempts before giving up
    pub max_attempts: u32,
    /// Settle after loading the target resource
    pub target_settle_ms: u64,
    /// Pause after activating the play control
    pub play_delay_ms: u64,
    /// Minimum simulated viewing duration
    pub dwell_ms: u64,
    /// Credentials per sequentially-processed group
    pub group_size: usize,
    /// Pacing delay between groups
    pub group_delay_ms: u64,
    /// Locator candidates per logical field
    pub selectors: SelectorSet,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            login_url: "https://www.facebook.com/login".to_string(),
            login_settle_ms: 3000,
            type_pause_ms: 1000,
            response_settle_ms: 8000,
            retry_delay_ms: 3000,
            max_attempts: 3,
            target_settle_ms: 5000,
            play_delay_ms: 3000,
            dwell_ms: 5000,
            group_size: 5,
            group_delay_ms: 10_000,
            selectors: SelectorSet::default(),
        }
    }
}

impl EngineConfig {
    /// All waits zeroed; same state machine, no pacing. Test use only.
    #[cfg(test)]
    pub fn fast() -> Self {
        Self {
            login_settle_ms: 0,
            type_pause_ms: 0,
            response_settle_ms: 0,
            retry_delay_ms: 0,
            target_settle_ms: 0,
            play_delay_ms: 0,
            dwell_ms: 0,
            group_delay_ms: 0,
            ..Self::default()
        }
    }
}
