use crate::auth::responses::{AccountView, AuthResponse, RegisterRequest};
use crate::client::{AuthApi, ClientError, ClientResult, TokenStorage};

const RESTORE_FAILED: &str = "Authentication failed. Please login again.";
const REGISTER_FAILED: &str = "Registration failed. Please try again.";
const LOGIN_FAILED: &str = "Login failed. Please try again.";

#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub token: String,
    pub user: AccountView,
}

/// Holds at most one token and account, mirrored to durable storage.
///
/// Logging out only forgets the token locally; the server keeps accepting it
/// until it expires.
pub struct SessionHolder<A, S> {
    api: A,
    storage: S,
    session: Option<Session>,
    error: Option<String>,
}

impl<A: AuthApi, S: TokenStorage> SessionHolder<A, S> {
    pub fn new(api: A, storage: S) -> Self {
        Self {
            api,
            storage,
            session: None,
            error: None,
        }
    }

    /// Exchange a stored token for a fresh profile.
    ///
    /// A rejected token is deleted from storage and the holder stays signed out;
    /// only storage failures are returned as errors.
    pub async fn restore(&mut self) -> ClientResult<Option<&AccountView>> {
        let Some(token) = self.storage.load()? else {
            self.session = None;
            return Ok(None);
        };

        match self.api.profile(&token).await {
            Ok(user) => {
                self.error = None;
                self.session = Some(Session { token, user });
            }
            Err(err) => {
                log::debug!("stored token rejected: {}", err);
                self.storage.clear()?;
                self.session = None;
                self.error = Some(RESTORE_FAILED.to_string());
            }
        }
        Ok(self.current_user())
    }

    pub async fn register(&mut self, payload: &RegisterRequest) -> ClientResult<&AccountView> {
        let result = self.api.register(payload).await;
        self.accept(result, REGISTER_FAILED)
    }

    pub async fn login(&mut self, email: &str, password: &str) -> ClientResult<&AccountView> {
        let result = self.api.login(email, password).await;
        self.accept(result, LOGIN_FAILED)
    }

    pub fn logout(&mut self) -> ClientResult<()> {
        self.storage.clear()?;
        self.session = None;
        Ok(())
    }

    pub fn current_user(&self) -> Option<&AccountView> {
        self.session.as_ref().map(|session| &session.user)
    }

    pub fn token(&self) -> Option<&str> {
        self.session.as_ref().map(|session| session.token.as_str())
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    /// The message to show for the most recent failure, if any.
    pub fn last_error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Gate for protected views.
    pub fn require_authenticated(&self) -> ClientResult<&AccountView> {
        self.current_user().ok_or(ClientError::NotAuthenticated)
    }

    fn accept(
        &mut self,
        result: ClientResult<AuthResponse>,
        fallback: &str,
    ) -> ClientResult<&AccountView> {
        match result {
            Ok(response) => {
                self.storage.save(&response.token)?;
                self.error = None;
                self.session = Some(Session {
                    token: response.token,
                    user: response.user,
                });
                self.require_authenticated()
            }
            Err(err) => {
                self.error = Some(err.server_message().unwrap_or(fallback).to_string());
                Err(err)
            }
        }
    }
}
