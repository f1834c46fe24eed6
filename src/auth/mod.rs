//! Authentication module: configuration, password hashing, token issuance and
//! verification, the access guard, the auth service, and HTTP route handlers.

use std::sync::Arc;

pub mod config;
pub mod error;
pub mod guards;
pub mod jwt;
pub mod passwords;
pub mod responses;
pub mod routes;
pub mod service;
pub mod validation;

pub use config::AuthConfig;
pub use error::{AuthError, AuthResult, FieldError, UnauthorizedReason};
pub use guards::{AuthUser, authenticate};
pub use jwt::JwtService;
pub use passwords::PasswordService;
pub use service::{AuthService, Authenticated};

use crate::store::CredentialStore;

/// Everything the auth routes need, assembled once at ignition and never mutated.
#[derive(Clone)]
pub struct AuthState {
    pub config: AuthConfig,
    pub password_service: Arc<PasswordService>,
    pub jwt_service: Arc<JwtService>,
    pub store: Arc<dyn CredentialStore>,
}

impl AuthState {
    pub fn new(
        config: AuthConfig,
        password_service: PasswordService,
        jwt_service: JwtService,
        store: Arc<dyn CredentialStore>,
    ) -> Self {
        Self {
            config,
            password_service: Arc::new(password_service),
            jwt_service: Arc::new(jwt_service),
            store,
        }
    }

    /// Build the hasher and token service from `config` and bind them to `store`.
    pub fn from_config(config: AuthConfig, store: Arc<dyn CredentialStore>) -> AuthResult<Self> {
        let password_service = PasswordService::new()?;
        let jwt_service = JwtService::from_config(&config)?;
        Ok(Self::new(config, password_service, jwt_service, store))
    }

    pub fn service(&self) -> AuthService<'_> {
        AuthService::from_state(self)
    }
}
