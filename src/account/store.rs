//! JSON file-backed credential store
//!
//! The whole account list is read and written as one snapshot, the same way
//! the persisted app config works. Two overlapping writers are last-writer-
//! wins across processes; within one process a mutex serializes them.

use std::path::PathBuf;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use tracing::{error, info, warn};

use super::{Account, AccountStore, StoreError};

pub struct JsonFileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            write_lock: Mutex::new(()),
        }
    }

    fn read_accounts(&self) -> Vec<Account> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(accounts) => accounts,
                Err(e) => {
                    warn!("Failed to parse accounts file: {}", e);
                    Vec::new()
                }
            },
            Err(_) => Vec::new(),
        }
    }

    fn write_accounts(&self, accounts: &[Account]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(accounts)?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }
}

impl AccountStore for JsonFileStore {
    fn list(&self) -> Vec<Account> {
        self.read_accounts()
    }

    fn add(&self, email: &str, password: &str, name: Option<&str>) -> Result<Account, StoreError> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut accounts = self.read_accounts();

        if accounts.iter().any(|a| a.email == email) {
            return Err(StoreError::DuplicateEmail);
        }

        let id = accounts.iter().map(|a| a.id).max().unwrap_or(0) + 1;
        let account = Account {
            id,
            email: email.to_string(),
            password: password.to_string(),
            name: name
                .map(str::to_string)
                .unwrap_or_else(|| format!("Account {}", id)),
            created_at: Utc::now(),
            last_used: None,
        };

        accounts.push(account.clone());
        self.write_accounts(&accounts)?;
        info!("Account added: {}", account.email);
        Ok(account)
    }

    fn update(
        &self,
        id: i64,
        email: &str,
        password: &str,
        name: Option<&str>,
    ) -> Result<Account, StoreError> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut accounts = self.read_accounts();

        if accounts.iter().any(|a| a.email == email && a.id != id) {
            return Err(StoreError::EmailTaken);
        }

        let account = accounts
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or(StoreError::NotFound)?;

        account.email = email.to_string();
        account.password = password.to_string();
        if let Some(name) = name {
            account.name = name.to_string();
        }
        let updated = account.clone();

        self.write_accounts(&accounts)?;
        Ok(updated)
    }

    fn remove(&self, id: i64) -> Result<Account, StoreError> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut accounts = self.read_accounts();

        let index = accounts
            .iter()
            .position(|a| a.id == id)
            .ok_or(StoreError::NotFound)?;

        let removed = accounts.remove(index);
        self.write_accounts(&accounts)?;
        info!("Account deleted: {}", removed.email);
        Ok(removed)
    }

    fn touch_last_used(&self, id: i64, at: DateTime<Utc>) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut accounts = self.read_accounts();

        match accounts.iter_mut().find(|a| a.id == id) {
            Some(account) => {
                account.last_used = Some(at);
                self.write_accounts(&accounts)?;
                Ok(())
            }
            None => {
                // The account may have been deleted mid-batch; not fatal.
                error!("touch_last_used: account {} not found", id);
                Err(StoreError::NotFound)
            }
        }
    }
}
