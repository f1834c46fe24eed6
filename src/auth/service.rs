//! Registration, login, and profile lookup.
//!
//! The service owns no state of its own; it borrows the hasher, token service,
//! and store held in [`AuthState`] for the duration of a request.

use chrono::Utc;
use uuid::Uuid;

use crate::auth::jwt::SignedAccessToken;
use crate::auth::responses::RegisterRequest;
use crate::auth::validation::{normalize_email, validate_registration};
use crate::auth::{AuthError, AuthResult, AuthState, JwtService, PasswordService};
use crate::models::{Account, NewAccount};
use crate::store::CredentialStore;

/// An account together with a freshly issued bearer token.
#[derive(Debug, Clone)]
pub struct Authenticated {
    pub account: Account,
    pub token: SignedAccessToken,
}

pub struct AuthService<'a> {
    passwords: &'a PasswordService,
    tokens: &'a JwtService,
    store: &'a dyn CredentialStore,
}

impl<'a> AuthService<'a> {
    pub fn new(
        passwords: &'a PasswordService,
        tokens: &'a JwtService,
        store: &'a dyn CredentialStore,
    ) -> Self {
        Self {
            passwords,
            tokens,
            store,
        }
    }

    pub fn from_state(state: &'a AuthState) -> Self {
        Self::new(
            state.password_service.as_ref(),
            state.jwt_service.as_ref(),
            state.store.as_ref(),
        )
    }

    pub async fn register(&self, request: &RegisterRequest) -> AuthResult<Authenticated> {
        let valid = validate_registration(request)?;

        if self
            .store
            .find_by_username_or_email(&valid.username, &valid.email)
            .await?
            .is_some()
        {
            log::debug!("registration rejected: username or email already taken");
            return Err(AuthError::DuplicateAccount);
        }

        let password_hash = self.passwords.hash(valid.password).await?;
        let account = self
            .store
            .create(NewAccount {
                username: valid.username,
                email: valid.email,
                password_hash,
                phone_number: valid.phone_number,
                full_name: valid.full_name,
            })
            .await?;

        let token = self.tokens.issue(account.id)?;
        log::info!("registered account {}", account.id);

        Ok(Authenticated { account, token })
    }

    /// Unknown email and wrong password both yield `InvalidCredentials`.
    pub async fn login(&self, email: &str, password: &str) -> AuthResult<Authenticated> {
        let email = normalize_email(email);
        if email.is_empty() || password.is_empty() {
            return Err(AuthError::InvalidCredentials);
        }

        let Some(mut account) = self.store.find_by_email(&email).await? else {
            log::debug!("login failed: no account for submitted email");
            return Err(AuthError::InvalidCredentials);
        };

        let verified = self
            .passwords
            .verify(password.to_string(), account.password_hash.clone())
            .await?;
        if !verified {
            log::debug!("login failed: password mismatch for account {}", account.id);
            return Err(AuthError::InvalidCredentials);
        }

        let now = Utc::now();
        self.store.touch_last_login(account.id, now).await?;
        account.last_login = Some(now);

        let token = self.tokens.issue(account.id)?;
        log::info!("account {} logged in", account.id);

        Ok(Authenticated { account, token })
    }

    /// The caller must already hold a verified identity; the token is not re-checked.
    pub async fn get_profile(&self, account_id: Uuid) -> AuthResult<Account> {
        load_account(self.store, account_id).await
    }
}

/// The live account for `account_id`, or `NotFound` once it has vanished.
pub(crate) async fn load_account(
    store: &dyn CredentialStore,
    account_id: Uuid,
) -> AuthResult<Account> {
    store
        .find_by_id(account_id)
        .await?
        .ok_or(AuthError::NotFound)
}
