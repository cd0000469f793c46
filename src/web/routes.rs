//! HTTP route handlers for the web server.
//!
//! Thin handlers over the engine and the credential store; all business
//! logic lives in `crate::engine` and `crate::account`.

use std::sync::Arc;

use axum::{
    extract::{Extension, Json, Path},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post, put},
    Router,
};
use serde::Deserialize;
use tracing::info;

use crate::account::StoreError;
use crate::engine::{WatchError, WatchJob};
use crate::AppState;

/// JSON error response helper
fn err_response(status: StatusCode, msg: &str) -> impl IntoResponse {
    (
        status,
        Json(serde_json::json!({ "success": false, "error": msg })),
    )
}

fn store_error_status(err: &StoreError) -> StatusCode {
    match err {
        StoreError::NotFound => StatusCode::NOT_FOUND,
        StoreError::DuplicateEmail | StoreError::EmailTaken => StatusCode::BAD_REQUEST,
        StoreError::Io(_) | StoreError::Serde(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Build the API router with all endpoints.
pub fn api_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Watch jobs
        .route("/watch", post(run_watch))
        // Accounts
        .route("/accounts", get(list_accounts).post(add_account))
        .route("/accounts/:id", put(update_account).delete(delete_account))
        // Pre-flight checks
        .route("/test-login", post(test_login))
        .route("/test-browser", get(test_browser))
        // Auth middleware (only if FBWATCH_WEB_PASS is set)
        .layer(middleware::from_fn(super::auth::basic_auth_middleware))
        .layer(Extension(state))
}

// ========== Watch Handlers ==========

#[derive(Deserialize)]
struct WatchRequest {
    #[serde(default)]
    url: String,
    #[serde(default)]
    accounts: Vec<crate::account::Account>,
}

async fn run_watch(
    Extension(state): Extension<Arc<AppState>>,
    Json(req): Json<WatchRequest>,
) -> impl IntoResponse {
    info!(
        "Watch request for {} with {} accounts",
        req.url,
        req.accounts.len()
    );

    let job = WatchJob {
        target_url: req.url,
        accounts: req.accounts,
    };

    match state.engine.run(&job).await {
        Ok(results) => {
            let total = results.len();
            Json(serde_json::json!({
                "success": true,
                "results": results,
                "totalProcessed": total,
            }))
            .into_response()
        }
        Err(e @ (WatchError::EmptyJob | WatchError::InvalidUrl)) => {
            err_response(StatusCode::BAD_REQUEST, &e.to_string()).into_response()
        }
        Err(e) => err_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string()).into_response(),
    }
}

// ========== Account Handlers ==========

async fn list_accounts(Extension(state): Extension<Arc<AppState>>) -> impl IntoResponse {
    let accounts = state.store.list();
    Json(serde_json::json!({
        "success": true,
        "total": accounts.len(),
        "accounts": accounts,
    }))
}

#[derive(Deserialize)]
struct AccountRequest {
    email: Option<String>,
    password: Option<String>,
    name: Option<String>,
}

async fn add_account(
    Extension(state): Extension<Arc<AppState>>,
    Json(req): Json<AccountRequest>,
) -> impl IntoResponse {
    let (Some(email), Some(password)) = (req.email, req.password) else {
        return err_response(StatusCode::BAD_REQUEST, "Email and password are required")
            .into_response();
    };

    match state.store.add(&email, &password, req.name.as_deref()) {
        Ok(account) => Json(serde_json::json!({
            "success": true,
            "account": account,
            "message": "Account added successfully",
        }))
        .into_response(),
        Err(e) => err_response(store_error_status(&e), &e.to_string()).into_response(),
    }
}

async fn update_account(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(req): Json<AccountRequest>,
) -> impl IntoResponse {
    let (Some(email), Some(password)) = (req.email, req.password) else {
        return err_response(StatusCode::BAD_REQUEST, "Email and password are required")
            .into_response();
    };

    match state.store.update(id, &email, &password, req.name.as_deref()) {
        Ok(account) => Json(serde_json::json!({
            "success": true,
            "account": account,
            "message": "Account updated successfully",
        }))
        .into_response(),
        Err(e) => err_response(store_error_status(&e), &e.to_string()).into_response(),
    }
}

async fn delete_account(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    match state.store.remove(id) {
        Ok(account) => Json(serde_json::json!({
            "success": true,
            "account": account,
            "message": "Account deleted successfully",
        }))
        .into_response(),
        Err(e) => err_response(store_error_status(&e), &e.to_string()).into_response(),
    }
}

// ========== Pre-flight Checks ==========

/// Run one credential through the login flow only, so an operator can vet
/// it before putting it in a batch.
async fn test_login(
    Extension(state): Extension<Arc<AppState>>,
    Json(req): Json<AccountRequest>,
) -> impl IntoResponse {
    let (Some(email), Some(password)) = (req.email, req.password) else {
        return err_response(StatusCode::BAD_REQUEST, "Email and password are required")
            .into_response();
    };

    info!("Starting login test for {}", email);

    match state.engine.login_check(&email, &password).await {
        Ok((success, message)) => Json(serde_json::json!({
            "success": success,
            "message": message,
        }))
        .into_response(),
        Err(e) => err_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            &format!("Test login failed: {}", e),
        )
        .into_response(),
    }
}

/// Launch one session, load the platform home page, tear down. Confirms the
/// browser environment works before a real batch is attempted.
async fn test_browser(Extension(state): Extension<Arc<AppState>>) -> impl IntoResponse {
    info!("Starting browser test");

    let session = match state.launcher.launch().await {
        Ok(session) => session,
        Err(e) => {
            return err_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                &format!("Browser test failed: {}", e),
            )
            .into_response();
        }
    };

    let result = session.goto("https://www.facebook.com").await;
    session.close().await;

    match result {
        Ok(()) => Json(serde_json::json!({
            "success": true,
            "message": "Browser test completed",
        }))
        .into_response(),
        Err(e) => err_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            &format!("Browser test failed: {}", e),
        )
        .into_response(),
    }
}
