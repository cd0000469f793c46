//! Session runner
//!
//! Owns one isolated browser session end to end: launch, login stage,
//! action stage, teardown. The login and action stages catch every driver
//! error internally, so the close below runs on all paths.

use chrono::Utc;
use tracing::{info, warn};

use crate::account::Account;
use crate::driver::SessionLauncher;

use super::login::{self, LoginOutcome, TWO_FACTOR_MESSAGE};
use super::{action, EngineConfig, SessionOutcome};

/// Run one credential through a fresh session and map the result to its
/// outcome record. A launch failure is a per-credential failure, never a
/// batch abort.
pub async fn run_session(
    launcher: &dyn SessionLauncher,
    config: &EngineConfig,
    account: &Account,
    target_url: &str,
) -> SessionOutcome {
    let session = match launcher.launch().await {
        Ok(session) => session,
        Err(e) => {
            warn!("Session launch failed for {}: {}", account.email, e);
            return outcome(account, false, format!("Browser error: {}", e));
        }
    };

    let result = match login::run_login(session.as_ref(), config, account).await {
        LoginOutcome::Succeeded => {
            let message = action::run_action(session.as_ref(), config, target_url).await;
            outcome(account, true, message)
        }
        LoginOutcome::TwoFactorBlocked => outcome(account, false, TWO_FACTOR_MESSAGE.to_string()),
        LoginOutcome::ErrorBlocked(text) => {
            outcome(account, false, format!("Login failed: {}", text))
        }
        LoginOutcome::Failed(reason) => outcome(account, false, reason),
    };

    info!("Closing session for {}", account.email);
    session.close().await;

    result
}

/// Run one login with throwaway credentials and report the verdict without
/// touching the target. Lets an operator vet a credential before batching.
/// Unlike [`run_session`], a launch failure propagates: there is no batch
/// to keep alive here.
pub async fn run_login_check(
    launcher: &dyn SessionLauncher,
    config: &EngineConfig,
    email: &str,
    password: &str,
) -> Result<(bool, String), crate::driver::DriverError> {
    let session = launcher.launch().await?;

    let candidate = Account {
        id: 0,
        email: email.to_string(),
        password: password.to_string(),
        name: String::new(),
        created_at: Utc::now(),
        last_used: None,
    };

    let verdict = match login::run_login(session.as_ref(), config, &candidate).await {
        LoginOutcome::Succeeded => (true, "Login successful".to_string()),
        LoginOutcome::TwoFactorBlocked => (false, TWO_FACTOR_MESSAGE.to_string()),
        LoginOutcome::ErrorBlocked(text) => (false, format!("Login failed: {}", text)),
        LoginOutcome::Failed(reason) => (false, reason),
    };

    info!("Closing login check session for {}", email);
    session.close().await;

    Ok(verdict)
}

fn outcome(account: &Account, success: bool, message: String) -> SessionOutcome {
    SessionOutcome {
        account_id: account.id,
        email: account.email.clone(),
        success,
        message,
        timestamp: Utc::now(),
    }
}
