use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rocket_db_pools::sqlx::{self, PgPool};
use uuid::Uuid;

use crate::auth::{AuthError, AuthResult};
use crate::models::{Account, NewAccount};
use crate::store::CredentialStore;

const UNIQUE_VIOLATION: &str = "23505";

const ACCOUNT_COLUMNS: &str =
    "id, username, email, password_hash, phone_number, full_name, created_at, last_login";

/// PostgreSQL-backed account store. The `accounts` table carries unique
/// indexes on `username` and `email`; those indexes settle registration races.
#[derive(Debug, Clone)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn create(&self, account: NewAccount) -> AuthResult<Account> {
        let row = account.into_account(Uuid::new_v4(), Utc::now());

        let query = format!(
            "INSERT INTO accounts ({ACCOUNT_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {ACCOUNT_COLUMNS}"
        );
        sqlx::query_as::<_, Account>(&query)
            .bind(row.id)
            .bind(&row.username)
            .bind(&row.email)
            .bind(&row.password_hash)
            .bind(&row.phone_number)
            .bind(&row.full_name)
            .bind(row.created_at)
            .bind(row.last_login)
            .fetch_one(&self.pool)
            .await
            .map_err(map_insert_error)
    }

    async fn find_by_id(&self, id: Uuid) -> AuthResult<Option<Account>> {
        let query = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = $1");
        let account = sqlx::query_as::<_, Account>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(account)
    }

    async fn find_by_email(&self, email: &str) -> AuthResult<Option<Account>> {
        let query = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE email = $1");
        let account = sqlx::query_as::<_, Account>(&query)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(account)
    }

    async fn find_by_username_or_email(
        &self,
        username: &str,
        email: &str,
    ) -> AuthResult<Option<Account>> {
        let query = format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE email = $1 OR username = $2 LIMIT 1"
        );
        let account = sqlx::query_as::<_, Account>(&query)
            .bind(email)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(account)
    }

    async fn touch_last_login(&self, id: Uuid, at: DateTime<Utc>) -> AuthResult<()> {
        let result = sqlx::query("UPDATE accounts SET last_login = $1 WHERE id = $2")
            .bind(at)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AuthError::NotFound);
        }
        Ok(())
    }
}

fn map_insert_error(err: sqlx::Error) -> AuthError {
    if is_unique_violation(&err) {
        AuthError::DuplicateAccount
    } else {
        AuthError::from(err)
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Database(db_err)
            if db_err.code().map(|code| code == UNIQUE_VIOLATION).unwrap_or(false)
    )
}
