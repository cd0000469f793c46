//! Selector fallback tables
//!
//! The target surface's markup changes over time and across A/B variants, so
//! every logical field maps to an ordered list of locator candidates; the
//! first one that exists on the live page wins. New candidates can be
//! appended without touching the state machine.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::driver::DriverSession;

/// Logical fields the engine needs to find on the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Email,
    Password,
    Submit,
    SuccessMarker,
    ErrorBanner,
    TwoFactor,
    PlayControl,
}

impl Field {
    pub fn name(self) -> &'static str {
        match self {
            Field::Email => "email field",
            Field::Password => "password field",
            Field::Submit => "submit control",
            Field::SuccessMarker => "success marker",
            Field::ErrorBanner => "error marker",
            Field::TwoFactor => "two-factor marker",
            Field::PlayControl => "play control",
        }
    }
}

/// Ordered locator candidates per logical field.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectorSet {
    pub email_field: Vec<String>,
    pub password_field: Vec<String>,
    pub submit_control: Vec<String>,
    pub success_marker: Vec<String>,
    pub error_marker: Vec<String>,
    pub two_factor_marker: Vec<String>,
    pub play_control: Vec<String>,
}

impl Default for SelectorSet {
    fn default() -> Self {
        fn list(items: &[&str]) -> Vec<String> {
            items.iter().map(|s| s.to_string()).collect()
        }

        Self {
            email_field: list(&[
                "#email",
                "input[name=\"email\"]",
                "input[type=\"email\"]",
                "[data-testid=\"royal_email\"]",
            ]),
            password_field: list(&[
                "#pass",
                "input[name=\"pass\"]",
                "input[type=\"password\"]",
                "[data-testid=\"royal_pass\"]",
            ]),
            submit_control: list(&[
                "#loginbutton",
                "button[name=\"login\"]",
                "[data-testid=\"royal_login_button\"]",
                "button[type=\"submit\"]",
            ]),
            success_marker: list(&[
                "[data-testid=\"search\"]",
                "[aria-label=\"Facebook\"]",
                "[data-testid=\"left_nav_menu\"]",
                "[data-testid=\"royal_nav\"]",
                "a[href=\"/me\"]",
                "[data-testid=\"jewel\"]",
            ]),
            error_marker: list(&[
                "[data-testid=\"error\"]",
                ".error",
                "[role=\"alert\"]",
                ".login_error",
                "#error",
            ]),
            two_factor_marker: list(&[
                "input[name=\"approvals_code\"]",
                "input[name=\"checkpoint_data\"]",
                "[data-testid=\"checkpoint_challenge\"]",
                "input[placeholder*=\"code\"]",
            ]),
            play_control: list(&[
                "[aria-label*=\"Play\"]",
                "[aria-label*=\"play\"]",
                "button[aria-label*=\"Play\"]",
                ".playButton",
                "[data-testid=\"play_button\"]",
                "button[aria-label*=\"Watch\"]",
                "[data-testid=\"video_play_button\"]",
            ]),
        }
    }
}

impl SelectorSet {
    pub fn candidates(&self, field: Field) -> &[String] {
        match field {
            Field::Email => &self.email_field,
            Field::Password => &self.password_field,
            Field::Submit => &self.submit_control,
            Field::SuccessMarker => &self.success_marker,
            Field::ErrorBanner => &self.error_marker,
            Field::TwoFactor => &self.two_factor_marker,
            Field::PlayControl => &self.play_control,
        }
    }

    /// Every field the state machine uses must have at least one candidate.
    pub fn validate(&self) -> Result<(), String> {
        const ALL: &[Field] = &[
            Field::Email,
            Field::Password,
            Field::Submit,
            Field::SuccessMarker,
            Field::ErrorBanner,
            Field::TwoFactor,
            Field::PlayControl,
        ];
        for &field in ALL {
            if self.candidates(field).is_empty() {
                return Err(format!("no locator candidates for {}", field.name()));
            }
        }
        Ok(())
    }
}

/// Try each candidate for `field` against the live page, in declared order.
/// Returns the first locator that matches, or `None` when nothing does;
/// callers decide whether absence is fatal. A failed query on one candidate
/// falls through to the next.
pub async fn resolve<'a>(
    session: &dyn DriverSession,
    set: &'a SelectorSet,
    field: Field,
) -> Option<&'a str> {
    for candidate in set.candidates(field) {
        match session.exists(candidate).await {
            Ok(true) => {
                debug!("Found {} with selector: {}", field.name(), candidate);
                return Some(candidate);
            }
            Ok(false) => {}
            Err(e) => {
                debug!("Selector {} query failed: {}", candidate, e);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::fake::{FakePage, FakeScript, FakeSession};

    fn session_on_login_page(page: FakePage) -> FakeSession {
        FakeSession::new(FakeScript {
            login_page: page,
            ..FakeScript::default()
        })
    }

    #[tokio::test]
    async fn first_matching_candidate_wins() {
        // Page carries the second and third email candidates; the first
        // present one in declared order must win.
        let page = FakePage::at("https://www.facebook.com/login")
            .with("input[name=\"email\"]", "")
            .with("input[type=\"email\"]", "");
        let session = session_on_login_page(page);
        session.goto("https://www.facebook.com/login").await.unwrap();

        let set = SelectorSet::default();
        let found = resolve(&session, &set, Field::Email).await;
        assert_eq!(found, Some("input[name=\"email\"]"));
    }

    #[tokio::test]
    async fn absence_is_none_not_error() {
        let session = session_on_login_page(FakePage::at("https://www.facebook.com/login"));
        session.goto("https://www.facebook.com/login").await.unwrap();

        let set = SelectorSet::default();
        assert_eq!(resolve(&session, &set, Field::PlayControl).await, None);
    }

    #[tokio::test]
    async fn resolver_is_idempotent_on_unchanged_page() {
        let session = session_on_login_page(FakePage::login_form());
        session.goto("https://www.facebook.com/login").await.unwrap();

        let set = SelectorSet::default();
        let first = resolve(&session, &set, Field::Submit).await;
        let second = resolve(&session, &set, Field::Submit).await;
        assert_eq!(first, Some("#loginbutton"));
        assert_eq!(first, second);
    }

    #[test]
    fn default_set_is_valid() {
        assert!(SelectorSet::default().validate().is_ok());
    }

    #[test]
    fn empty_field_fails_validation() {
        let set = SelectorSet {
            two_factor_marker: vec![],
            ..SelectorSet::default()
        };
        assert!(set.validate().is_err());
    }
}
