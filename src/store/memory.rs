use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use uuid::Uuid;

use crate::auth::{AuthError, AuthResult};
use crate::models::{Account, NewAccount};
use crate::store::CredentialStore;

#[derive(Default)]
struct StoreData {
    accounts: HashMap<Uuid, Account>,
    by_email: HashMap<String, Uuid>,
    by_username: HashMap<String, Uuid>,
}

/// In-process account store for tests and the `memory` backend.
///
/// The uniqueness check and the insert happen under one write lock, so racing
/// registrations cannot both succeed.
#[derive(Default)]
pub struct MemoryCredentialStore {
    data: RwLock<StoreData>,
    reads: AtomicUsize,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of read operations served so far.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.data.read().accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop an account. Only used to simulate an account vanishing under a live token.
    pub fn remove(&self, id: Uuid) -> Option<Account> {
        let mut data = self.data.write();
        let account = data.accounts.remove(&id)?;
        data.by_email.remove(&account.email);
        data.by_username.remove(&account.username);
        Some(account)
    }

    fn record_read(&self) {
        self.reads.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn create(&self, account: NewAccount) -> AuthResult<Account> {
        let mut data = self.data.write();
        if data.by_email.contains_key(&account.email)
            || data.by_username.contains_key(&account.username)
        {
            return Err(AuthError::DuplicateAccount);
        }

        let account = account.into_account(Uuid::new_v4(), Utc::now());
        data.by_email.insert(account.email.clone(), account.id);
        data.by_username.insert(account.username.clone(), account.id);
        data.accounts.insert(account.id, account.clone());
        Ok(account)
    }

    async fn find_by_id(&self, id: Uuid) -> AuthResult<Option<Account>> {
        self.record_read();
        Ok(self.data.read().accounts.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> AuthResult<Option<Account>> {
        self.record_read();
        let data = self.data.read();
        Ok(data
            .by_email
            .get(email)
            .and_then(|id| data.accounts.get(id))
            .cloned())
    }

    async fn find_by_username_or_email(
        &self,
        username: &str,
        email: &str,
    ) -> AuthResult<Option<Account>> {
        self.record_read();
        let data = self.data.read();
        let id = data.by_email.get(email).or_else(|| data.by_username.get(username));
        Ok(id.and_then(|id| data.accounts.get(id)).cloned())
    }

    async fn touch_last_login(&self, id: Uuid, at: DateTime<Utc>) -> AuthResult<()> {
        let mut data = self.data.write();
        let account = data.accounts.get_mut(&id).ok_or(AuthError::NotFound)?;
        account.last_login = Some(at);
        Ok(())
    }
}
