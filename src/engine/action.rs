//! Post-login action stage
//!
//! Navigates to the watch target and makes a best-effort attempt at the
//! play control, then dwells to simulate a minimum viewing duration. Login
//! failure is fatal to the outcome; interaction failure here is not, it
//! only shapes the message.

use std::time::Duration;

use tracing::{info, warn};

use crate::driver::{DriverError, DriverSession};

use super::selectors::{resolve, Field};
use super::EngineConfig;

pub const PLAYED_MESSAGE: &str = "Successfully viewed content";
pub const NO_PLAY_CONTROL_MESSAGE: &str = "Content loaded but no play button found";
pub const INTERACTION_FAILED_MESSAGE: &str = "Content loaded but interaction failed";

/// Run the action stage. Always reports a success-shaped message; the
/// caller records `success = true` for any of the three.
pub async fn run_action(
    session: &dyn DriverSession,
    config: &EngineConfig,
    target_url: &str,
) -> String {
    match interact(session, config, target_url).await {
        Ok(true) => PLAYED_MESSAGE.to_string(),
        Ok(false) => NO_PLAY_CONTROL_MESSAGE.to_string(),
        Err(e) => {
            warn!("Target interaction failed: {}", e);
            INTERACTION_FAILED_MESSAGE.to_string()
        }
    }
}

async fn interact(
    session: &dyn DriverSession,
    config: &EngineConfig,
    target_url: &str,
) -> Result<bool, DriverError> {
    info!("Navigating to target URL: {}", target_url);
    session.goto(target_url).await?;
    tokio::time::sleep(Duration::from_millis(config.target_settle_ms)).await;

    let played = match resolve(session, &config.selectors, Field::PlayControl).await {
        Some(selector) => {
            session.click(selector).await?;
            tokio::time::sleep(Duration::from_millis(config.play_delay_ms)).await;
            true
        }
        None => false,
    };

    // Minimum viewing duration regardless of interaction result.
    tokio::time::sleep(Duration::from_millis(config.dwell_ms)).await;
    Ok(played)
}
