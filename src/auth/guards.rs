use rocket::Request;
use rocket::request::{FromRequest, Outcome};
use rocket_okapi::request::OpenApiFromRequest;
use uuid::Uuid;

use crate::auth::service::load_account;
use crate::auth::{AuthError, AuthResult, AuthState, JwtService, UnauthorizedReason};
use crate::error::INTERNAL_ERROR_MESSAGE;
use crate::models::Account;
use crate::store::CredentialStore;

/// A request whose bearer token verified and whose account still exists.
#[derive(Debug, Clone, OpenApiFromRequest)]
pub struct AuthUser {
    pub account: Account,
}

impl AuthUser {
    pub fn id(&self) -> Uuid {
        self.account.id
    }
}

/// Message of the most recent guard rejection, read back by the error catchers.
#[derive(Debug, Default)]
pub struct GuardRejection(pub Option<String>);

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AuthUser {
    type Error = AuthError;

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let Some(state) = request.rocket().state::<AuthState>() else {
            let err = AuthError::Config("AuthState missing from state".into());
            return reject(request, err);
        };

        let header = request.headers().get_one("Authorization");
        match authenticate(header, &state.jwt_service, state.store.as_ref()).await {
            Ok(user) => Outcome::Success(user),
            Err(err) => reject(request, err),
        }
    }
}

fn reject(request: &Request<'_>, err: AuthError) -> Outcome<AuthUser, AuthError> {
    let message = if err.is_server_error() {
        log::error!("access guard failed: {}", err);
        INTERNAL_ERROR_MESSAGE.to_string()
    } else {
        log::debug!("access guard rejected request: {}", err);
        err.to_string()
    };
    request.local_cache(|| GuardRejection(Some(message)));
    Outcome::Error((err.status(), err))
}

/// Resolve the `Authorization` header to a live account.
///
/// A missing or malformed header is rejected before the store is consulted. A
/// token that verifies but names a vanished account yields `NotFound`.
pub async fn authenticate(
    authorization: Option<&str>,
    tokens: &JwtService,
    store: &dyn CredentialStore,
) -> AuthResult<AuthUser> {
    let token = bearer_token(authorization)?;

    let account_id = tokens.verify(token).map_err(|err| match err {
        AuthError::TokenExpired | AuthError::TokenInvalid => {
            AuthError::Unauthorized(UnauthorizedReason::TokenFailed)
        }
        other => other,
    })?;

    let account = load_account(store, account_id).await?;

    Ok(AuthUser { account })
}

fn bearer_token(header: Option<&str>) -> AuthResult<&str> {
    let header = header.ok_or(AuthError::Unauthorized(UnauthorizedReason::NoToken))?;
    let mut parts = header.trim().splitn(2, ' ');
    let scheme = parts.next().unwrap_or_default();
    let token = parts.next().unwrap_or_default().trim();
    if scheme.eq_ignore_ascii_case("Bearer") && !token.is_empty() {
        Ok(token)
    } else {
        Err(AuthError::Unauthorized(UnauthorizedReason::NoToken))
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;
    use crate::auth::AuthConfig;
    use crate::auth::config::DEFAULT_TOKEN_TTL_SECS;
    use crate::models::NewAccount;
    use crate::store::MemoryCredentialStore;

    fn tokens() -> JwtService {
        JwtService::from_config(&AuthConfig {
            issuer: "account-api-test".into(),
            token_ttl_secs: DEFAULT_TOKEN_TTL_SECS,
            jwt_secret: "guard-test-secret".into(),
        })
        .expect("jwt service")
    }

    async fn seeded_store() -> (MemoryCredentialStore, Uuid) {
        let store = MemoryCredentialStore::new();
        let account = store
            .create(NewAccount {
                username: "alice".into(),
                email: "a@x.com".into(),
                password_hash: "$argon2id$placeholder".into(),
                phone_number: "5551234567".into(),
                full_name: "Alice A".into(),
            })
            .await
            .expect("create");
        (store, account.id)
    }

    fn assert_reason(result: AuthResult<AuthUser>, reason: UnauthorizedReason) {
        match result {
            Err(AuthError::Unauthorized(actual)) => assert_eq!(actual, reason),
            other => panic!("expected Unauthorized({reason}), got {other:?}"),
        }
    }

    #[test]
    fn extracts_bearer_token() {
        assert_eq!(bearer_token(Some("Bearer abc.def")).unwrap(), "abc.def");
        assert_eq!(bearer_token(Some("bearer abc.def")).unwrap(), "abc.def");
        assert!(bearer_token(Some("Basic abc")).is_err());
        assert!(bearer_token(Some("Bearer")).is_err());
        assert!(bearer_token(Some("Bearer   ")).is_err());
        assert!(bearer_token(Some("")).is_err());
        assert!(bearer_token(None).is_err());
    }

    #[tokio::test]
    async fn missing_header_is_rejected_before_store_access() {
        let (store, _) = seeded_store().await;
        let tokens = tokens();

        assert_reason(
            authenticate(None, &tokens, &store).await,
            UnauthorizedReason::NoToken,
        );
        assert_reason(
            authenticate(Some("Token abc"), &tokens, &store).await,
            UnauthorizedReason::NoToken,
        );
        assert_eq!(store.reads(), 0);
    }

    #[tokio::test]
    async fn garbled_token_fails_without_store_access() {
        let (store, _) = seeded_store().await;

        assert_reason(
            authenticate(Some("Bearer not-a-token"), &tokens(), &store).await,
            UnauthorizedReason::TokenFailed,
        );
        assert_eq!(store.reads(), 0);
    }

    #[tokio::test]
    async fn expired_token_fails() {
        let (store, id) = seeded_store().await;
        let tokens = tokens();
        let stale = tokens
            .issue_at(id, Utc::now() - Duration::days(31))
            .expect("issue");

        assert_reason(
            authenticate(Some(&format!("Bearer {}", stale.token)), &tokens, &store).await,
            UnauthorizedReason::TokenFailed,
        );
    }

    #[tokio::test]
    async fn valid_token_resolves_live_account() {
        let (store, id) = seeded_store().await;
        let tokens = tokens();
        let token = tokens.issue(id).expect("issue");

        let user = authenticate(Some(&format!("Bearer {}", token.token)), &tokens, &store)
            .await
            .expect("authenticated");
        assert_eq!(user.id(), id);
        assert_eq!(user.account.username, "alice");
        assert_eq!(store.reads(), 1);
    }

    #[tokio::test]
    async fn vanished_account_is_not_found() {
        let (store, id) = seeded_store().await;
        let tokens = tokens();
        let token = tokens.issue(id).expect("issue");
        store.remove(id);

        assert!(matches!(
            authenticate(Some(&format!("Bearer {}", token.token)), &tokens, &store).await,
            Err(AuthError::NotFound)
        ));
    }
}
