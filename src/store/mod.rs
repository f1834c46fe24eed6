//! Account persistence behind a narrow trait.
//!
//! Uniqueness of username and email is the store's job: implementations must
//! reject a duplicate atomically with `AuthError::DuplicateAccount` even when
//! two registrations race past the service-level pre-check.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::auth::AuthResult;
use crate::models::{Account, NewAccount};

pub mod memory;
pub mod postgres;

pub use memory::MemoryCredentialStore;
pub use postgres::PgCredentialStore;

#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Insert a new account, assigning its id and creation timestamp.
    async fn create(&self, account: NewAccount) -> AuthResult<Account>;

    async fn find_by_id(&self, id: Uuid) -> AuthResult<Option<Account>>;

    /// `email` must already be normalized.
    async fn find_by_email(&self, email: &str) -> AuthResult<Option<Account>>;

    async fn find_by_username_or_email(
        &self,
        username: &str,
        email: &str,
    ) -> AuthResult<Option<Account>>;

    /// Record a successful login. Fails with `NotFound` if the account is gone.
    async fn touch_last_login(&self, id: Uuid, at: DateTime<Utc>) -> AuthResult<()>;
}

/// Which [`CredentialStore`] the server is built with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl StoreBackend {
    pub fn from_env() -> Self {
        std::env::var("ACCOUNT_API_STORE")
            .map(|value| Self::parse(&value))
            .unwrap_or(StoreBackend::Postgres)
    }

    fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" | "mem" => StoreBackend::Memory,
            _ => StoreBackend::Postgres,
        }
    }
}
