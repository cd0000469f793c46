//! Batch scheduler and result aggregation
//!
//! Validates the job up front, then drives credentials through sessions in
//! fixed-size sequential groups with a pacing delay between groups. The
//! grouping provides pacing, not concurrency: one session completes before
//! the next starts, so output order mirrors input order.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};
use url::Url;

use crate::account::AccountStore;
use crate::driver::{DriverError, SessionLauncher};

use super::{runner, EngineConfig, SessionOutcome, WatchError, WatchJob};

/// The multi-account automation engine.
pub struct WatchEngine {
    launcher: Arc<dyn SessionLauncher>,
    store: Arc<dyn AccountStore>,
    config: EngineConfig,
}

impl WatchEngine {
    pub fn new(
        launcher: Arc<dyn SessionLauncher>,
        store: Arc<dyn AccountStore>,
        config: EngineConfig,
    ) -> Result<Self, WatchError> {
        config
            .selectors
            .validate()
            .map_err(WatchError::BadSelectors)?;
        Ok(Self {
            launcher,
            store,
            config,
        })
    }

    /// Process a watch job to completion. Only pre-flight validation can
    /// fail the whole job; after that every credential yields exactly one
    /// outcome, in input order.
    pub async fn run(&self, job: &WatchJob) -> Result<Vec<SessionOutcome>, WatchError> {
        if job.target_url.is_empty() || job.accounts.is_empty() {
            return Err(WatchError::EmptyJob);
        }
        if !is_target_domain(&job.target_url) {
            return Err(WatchError::InvalidUrl);
        }

        let group_size = self.config.group_size.max(1);
        let total_groups = job.accounts.len().div_ceil(group_size);
        let mut results = Vec::with_capacity(job.accounts.len());

        for (index, group) in job.accounts.chunks(group_size).enumerate() {
            info!(
                "Processing batch {} of {} with {} accounts",
                index + 1,
                total_groups,
                group.len()
            );

            for account in group {
                let outcome =
                    runner::run_session(self.launcher.as_ref(), &self.config, account, &job.target_url)
                        .await;

                // Fire-and-forget: a store failure never changes the outcome.
                if outcome.success {
                    if let Err(e) = self.store.touch_last_used(outcome.account_id, outcome.timestamp)
                    {
                        warn!(
                            "Failed to update lastUsed for account {}: {}",
                            outcome.account_id, e
                        );
                    }
                }

                results.push(outcome);
            }

            if index + 1 < total_groups {
                info!(
                    "Waiting {}ms before next batch",
                    self.config.group_delay_ms
                );
                tokio::time::sleep(Duration::from_millis(self.config.group_delay_ms)).await;
            }
        }

        Ok(results)
    }

    /// Check one credential against the sign-in flow without visiting any
    /// target. Returns the verdict and its human-readable reason.
    pub async fn login_check(
        &self,
        email: &str,
        password: &str,
    ) -> Result<(bool, String), DriverError> {
        runner::run_login_check(self.launcher.as_ref(), &self.config, email, password).await
    }
}

/// The job must reference the target platform's domain.
fn is_target_domain(raw: &str) -> bool {
    let Ok(url) = Url::parse(raw) else {
        return false;
    };
    let Some(host) = url.host_str() else {
        return false;
    };
    const DOMAINS: &[&str] = &["facebook.com", "fb.com"];
    DOMAINS
        .iter()
        .any(|d| host == *d || host.ends_with(&format!(".{}", d)))
}
