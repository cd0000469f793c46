//! Login state machine
//!
//! Drives one credential through sign-in with bounded retries. Each attempt
//! walks `Navigating -> FillingEmail -> FillingPassword -> Submitting ->
//! AwaitingResponse` and ends in a verdict. Two-factor prompts and explicit
//! error banners are authoritative negatives and short-circuit the retry
//! budget; everything else ambiguous is retried.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::account::Account;
use crate::driver::DriverSession;

use super::selectors::{resolve, Field};
use super::EngineConfig;

/// Reason attached to a two-factor block.
pub const TWO_FACTOR_MESSAGE: &str =
    "2FA required - please disable 2FA for this account or use app-specific password";

/// Reason attached to retry exhaustion.
pub const EXHAUSTED_MESSAGE: &str =
    "Login failed after multiple attempts - invalid credentials or account verification required";

/// Terminal result of the login stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    Succeeded,
    /// Two-factor prompt detected; retrying cannot help.
    TwoFactorBlocked,
    /// Explicit error banner; carries the banner's text content.
    ErrorBlocked(String),
    /// Retry budget exhausted without a terminal signal either way.
    Failed(String),
}

/// Per-attempt verdict, before the retry policy is applied.
#[derive(Debug)]
enum AttemptVerdict {
    Succeeded,
    TwoFactor,
    ErrorBanner(String),
    /// Retryable: markup may differ or the page may settle on the next try.
    Ambiguous(String),
}

/// Step the attempt is currently in.
#[derive(Debug, Clone, Copy)]
enum LoginState {
    Navigating,
    FillingEmail,
    FillingPassword,
    Submitting,
    AwaitingResponse,
}

/// Run the full login stage for one credential: up to
/// `config.max_attempts` attempts, terminal signals short-circuiting.
/// Driver errors never escape; they become ambiguous attempt failures.
pub async fn run_login(
    session: &dyn DriverSession,
    config: &EngineConfig,
    account: &Account,
) -> LoginOutcome {
    for attempt in 1..=config.max_attempts {
        info!("Login attempt {} for {}", attempt, account.email);

        match run_attempt(session, config, account).await {
            AttemptVerdict::Succeeded => {
                info!("Login successful for {}", account.email);
                return LoginOutcome::Succeeded;
            }
            AttemptVerdict::TwoFactor => {
                warn!("2FA detected for {}, not retrying", account.email);
                return LoginOutcome::TwoFactorBlocked;
            }
            AttemptVerdict::ErrorBanner(text) => {
                warn!("Login error banner for {}: {}", account.email, text);
                return LoginOutcome::ErrorBlocked(text);
            }
            AttemptVerdict::Ambiguous(reason) => {
                warn!(
                    "Login attempt {} for {} inconclusive: {}",
                    attempt, account.email, reason
                );
                if attempt < config.max_attempts {
                    tokio::time::sleep(Duration::from_millis(config.retry_delay_ms)).await;
                }
            }
        }
    }

    LoginOutcome::Failed(EXHAUSTED_MESSAGE.to_string())
}

/// One pass through the state machine. Every driver error is caught here
/// and converted into an ambiguous verdict for this attempt.
async fn run_attempt(
    session: &dyn DriverSession,
    config: &EngineConfig,
    account: &Account,
) -> AttemptVerdict {
    let mut state = LoginState::Navigating;

    loop {
        debug!("Login state: {:?}", state);

        state = match state {
            LoginState::Navigating => {
                if let Err(e) = session.goto(&config.login_url).await {
                    return AttemptVerdict::Ambiguous(format!("navigation failed: {}", e));
                }
                tokio::time::sleep(Duration::from_millis(config.login_settle_ms)).await;
                LoginState::FillingEmail
            }

            LoginState::FillingEmail => {
                let Some(selector) = resolve(session, &config.selectors, Field::Email).await
                else {
                    return AttemptVerdict::Ambiguous("email field not found".into());
                };
                if let Err(e) = session.clear_and_type(selector, &account.email).await {
                    return AttemptVerdict::Ambiguous(format!("filling email failed: {}", e));
                }
                tokio::time::sleep(Duration::from_millis(config.type_pause_ms)).await;
                LoginState::FillingPassword
            }

            LoginState::FillingPassword => {
                let Some(selector) = resolve(session, &config.selectors, Field::Password).await
                else {
                    return AttemptVerdict::Ambiguous("password field not found".into());
                };
                if let Err(e) = session.clear_and_type(selector, &account.password).await {
                    return AttemptVerdict::Ambiguous(format!("filling password failed: {}", e));
                }
                tokio::time::sleep(Duration::from_millis(config.type_pause_ms)).await;
                LoginState::Submitting
            }

            LoginState::Submitting => {
                let Some(selector) = resolve(session, &config.selectors, Field::Submit).await
                else {
                    return AttemptVerdict::Ambiguous("login button not found".into());
                };
                if let Err(e) = session.click(selector).await {
                    return AttemptVerdict::Ambiguous(format!("submit click failed: {}", e));
                }
                LoginState::AwaitingResponse
            }

            LoginState::AwaitingResponse => {
                tokio::time::sleep(Duration::from_millis(config.response_settle_ms)).await;
                return evaluate_response(session, config).await;
            }
        };
    }
}

/// Classify the page after submission. Priority order matters: two-factor
/// and explicit-error are checked before the success heuristic and before
/// the retry budget is consulted.
async fn evaluate_response(session: &dyn DriverSession, config: &EngineConfig) -> AttemptVerdict {
    if resolve(session, &config.selectors, Field::TwoFactor)
        .await
        .is_some()
    {
        return AttemptVerdict::TwoFactor;
    }

    if let Some(selector) = resolve(session, &config.selectors, Field::ErrorBanner).await {
        let text = session
            .read_text(selector)
            .await
            .ok()
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| "Login error detected".to_string());
        return AttemptVerdict::ErrorBanner(text);
    }

    // Success is a disjunction of two independent signals: a known DOM
    // marker, or the URL having left the login/checkpoint flow. Either
    // alone is unreliable against a frequently-changing surface.
    if resolve(session, &config.selectors, Field::SuccessMarker)
        .await
        .is_some()
    {
        return AttemptVerdict::Succeeded;
    }

    match session.current_url().await {
        Ok(url) if !url.contains("login") && !url.contains("checkpoint") => {
            debug!("Login success detected via URL change: {}", url);
            AttemptVerdict::Succeeded
        }
        Ok(url) => AttemptVerdict::Ambiguous(format!("no post-login signal (still at {})", url)),
        Err(e) => AttemptVerdict::Ambiguous(format!("could not read URL: {}", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::fake::{FakePage, FakeScript, FakeSession};
    use chrono::Utc;

    fn account() -> Account {
        Account {
            id: 1,
            email: "user@example.com".to_string(),
            password: "hunter2".to_string(),
            name: "User".to_string(),
            created_at: Utc::now(),
            last_used: None,
        }
    }

    fn run(script: FakeScript) -> (FakeSession, EngineConfig) {
        (FakeSession::new(script), EngineConfig::fast())
    }

    #[tokio::test]
    async fn success_marker_on_first_attempt() {
        let (session, config) = run(FakeScript::default());
        let outcome = run_login(&session, &config, &account()).await;

        assert_eq!(outcome, LoginOutcome::Succeeded);
        assert_eq!(session.navigations(), 1);
        // Both fields were filled with the credential's values
        let typed = session.typed.lock().unwrap().clone();
        assert_eq!(typed[0], ("#email".to_string(), "user@example.com".to_string()));
        assert_eq!(typed[1], ("#pass".to_string(), "hunter2".to_string()));
    }

    #[tokio::test]
    async fn two_factor_is_terminal_on_first_attempt() {
        let two_fa_page =
            FakePage::login_form().with("input[name=\"approvals_code\"]", "");
        let (session, config) = run(FakeScript {
            after_submit: vec![two_fa_page],
            ..FakeScript::default()
        });

        let outcome = run_login(&session, &config, &account()).await;

        assert_eq!(outcome, LoginOutcome::TwoFactorBlocked);
        // Terminal: no retries performed regardless of remaining budget
        assert_eq!(session.navigations(), 1);
    }

    #[tokio::test]
    async fn error_banner_is_terminal_with_banner_text() {
        let error_page =
            FakePage::login_form().with("[data-testid=\"error\"]", "Wrong credentials");
        let (session, config) = run(FakeScript {
            after_submit: vec![error_page],
            ..FakeScript::default()
        });

        let outcome = run_login(&session, &config, &account()).await;

        assert_eq!(outcome, LoginOutcome::ErrorBlocked("Wrong credentials".to_string()));
        assert_eq!(session.navigations(), 1);
    }

    #[tokio::test]
    async fn two_factor_takes_priority_over_error_and_success() {
        // Page carries all three signal kinds at once; 2FA must win.
        let noisy_page = FakePage::at("https://www.facebook.com/home")
            .with("input[name=\"approvals_code\"]", "")
            .with("[data-testid=\"error\"]", "err")
            .with("[data-testid=\"search\"]", "");
        let (session, config) = run(FakeScript {
            after_submit: vec![noisy_page],
            ..FakeScript::default()
        });

        let outcome = run_login(&session, &config, &account()).await;
        assert_eq!(outcome, LoginOutcome::TwoFactorBlocked);
    }

    #[tokio::test]
    async fn ambiguous_attempts_retry_then_succeed() {
        // First two submissions leave the login page unchanged (no signal);
        // the third lands on a success marker.
        let (session, config) = run(FakeScript {
            after_submit: vec![
                FakePage::login_form(),
                FakePage::login_form(),
                FakePage::home(),
            ],
            ..FakeScript::default()
        });

        let outcome = run_login(&session, &config, &account()).await;

        assert_eq!(outcome, LoginOutcome::Succeeded);
        assert_eq!(session.navigations(), 3);
    }

    #[tokio::test]
    async fn exhaustion_after_three_ambiguous_attempts() {
        let (session, config) = run(FakeScript {
            after_submit: vec![
                FakePage::login_form(),
                FakePage::login_form(),
                FakePage::login_form(),
            ],
            ..FakeScript::default()
        });

        let outcome = run_login(&session, &config, &account()).await;

        assert_eq!(outcome, LoginOutcome::Failed(EXHAUSTED_MESSAGE.to_string()));
        assert_eq!(session.navigations(), 3);
    }

    #[tokio::test]
    async fn url_change_alone_counts_as_success() {
        // No success marker anywhere, but the URL left the login flow.
        let (session, config) = run(FakeScript {
            after_submit: vec![FakePage::at("https://www.facebook.com/home")],
            ..FakeScript::default()
        });

        let outcome = run_login(&session, &config, &account()).await;
        assert_eq!(outcome, LoginOutcome::Succeeded);
    }

    #[tokio::test]
    async fn checkpoint_url_is_not_success() {
        // Redirected to the checkpoint flow with no markers: ambiguous,
        // retried until exhaustion.
        let checkpoint = FakePage::at("https://www.facebook.com/checkpoint/12345");
        let (session, config) = run(FakeScript {
            after_submit: vec![checkpoint.clone(), checkpoint.clone(), checkpoint],
            ..FakeScript::default()
        });

        let outcome = run_login(&session, &config, &account()).await;
        assert!(matches!(outcome, LoginOutcome::Failed(_)));
    }

    #[tokio::test]
    async fn navigation_failure_is_retried_not_propagated() {
        let (session, config) = run(FakeScript {
            fail_login_nav: true,
            ..FakeScript::default()
        });

        let outcome = run_login(&session, &config, &account()).await;

        assert_eq!(outcome, LoginOutcome::Failed(EXHAUSTED_MESSAGE.to_string()));
        assert_eq!(session.navigations(), 3);
    }

    #[tokio::test]
    async fn failed_field_clear_fails_the_attempt_then_retries_cleanly() {
        // A stale input handle must abort the attempt before anything is
        // typed; the next attempt starts from a fresh page with the full
        // credential, never appended to a partial value.
        let (session, config) = run(FakeScript {
            fail_first_type: true,
            ..FakeScript::default()
        });

        let outcome = run_login(&session, &config, &account()).await;

        assert_eq!(outcome, LoginOutcome::Succeeded);
        assert_eq!(session.navigations(), 2);
        let typed = session.typed.lock().unwrap().clone();
        assert_eq!(
            typed,
            vec![
                ("#email".to_string(), "user@example.com".to_string()),
                ("#pass".to_string(), "hunter2".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn missing_form_fields_are_ambiguous() {
        // Login page renders without any known form markup.
        let (session, config) = run(FakeScript {
            login_page: FakePage::at("https://www.facebook.com/login"),
            ..FakeScript::default()
        });

        let outcome = run_login(&session, &config, &account()).await;
        assert_eq!(outcome, LoginOutcome::Failed(EXHAUSTED_MESSAGE.to_string()));
    }
}
