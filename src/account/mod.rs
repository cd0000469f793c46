//! Account model and credential store
//!
//! The engine only reads account snapshots and requests `lastUsed` updates
//! after a successful session; everything else here serves the accounts API.

mod store;

pub use store::JsonFileStore;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A stored credential.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: i64,
    pub email: String,
    pub password: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub last_used: Option<DateTime<Utc>>,
}

/// Credential store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Account not found")]
    NotFound,

    #[error("Account with this email already exists")]
    DuplicateEmail,

    #[error("Email is already used by another account")]
    EmailTaken,

    #[error("Failed to save accounts: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize accounts: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Durable credential store. An unreadable backing file is "no accounts
/// available", never an error.
pub trait AccountStore: Send + Sync {
    /// All accounts, in stored order.
    fn list(&self) -> Vec<Account>;

    /// Add a new account. Emails are unique across the store; `name`
    /// defaults to "Account {id}".
    fn add(&self, email: &str, password: &str, name: Option<&str>) -> Result<Account, StoreError>;

    /// Update an existing account's credentials. `name` keeps its old value
    /// when absent.
    fn update(
        &self,
        id: i64,
        email: &str,
        password: &str,
        name: Option<&str>,
    ) -> Result<Account, StoreError>;

    /// Remove an account, returning the removed record.
    fn remove(&self, id: i64) -> Result<Account, StoreError>;

    /// Record that a session for this account completed successfully.
    fn touch_last_used(&self, id: i64, at: DateTime<Utc>) -> Result<(), StoreError>;
}
