use chrono::{DateTime, Utc};
use rocket_db_pools::sqlx::FromRow;
use uuid::Uuid;

/// A persisted account row, including the password hash.
///
/// This type never leaves the server: every HTTP response goes through
/// [`crate::auth::responses::AccountView`], which has no hash field.
#[derive(Clone, FromRow)]
pub struct Account {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub phone_number: String,
    pub full_name: String,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl std::fmt::Debug for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Account")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password_hash", &"<redacted>")
            .field("phone_number", &self.phone_number)
            .field("full_name", &self.full_name)
            .field("created_at", &self.created_at)
            .field("last_login", &self.last_login)
            .finish()
    }
}

/// Normalized, validated input for a new account. The password is already hashed.
#[derive(Clone)]
pub struct NewAccount {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub phone_number: String,
    pub full_name: String,
}

impl NewAccount {
    /// Materialize the row a store will persist, assigning id and creation time.
    pub fn into_account(self, id: Uuid, created_at: DateTime<Utc>) -> Account {
        Account {
            id,
            username: self.username,
            email: self.email,
            password_hash: self.password_hash,
            phone_number: self.phone_number,
            full_name: self.full_name,
            created_at,
            last_login: None,
        }
    }
}
