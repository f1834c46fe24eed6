use chrono::Duration;

use crate::auth::{AuthError, AuthResult};

/// Thirty days, the lifetime of every issued bearer token.
pub const DEFAULT_TOKEN_TTL_SECS: i64 = 30 * 24 * 60 * 60;

/// Ten years. Anything longer is treated as a misconfiguration.
pub const MAX_TOKEN_TTL_SECS: i64 = 10 * 365 * 24 * 60 * 60;

const TOKEN_TTL_VAR: &str = "ACCOUNT_API_TOKEN_TTL_SECS";

/// Authentication configuration loaded from environment variables.
///
/// Built once during ignition and handed to [`crate::auth::AuthState`]; nothing
/// reads these variables after startup.
#[derive(Clone)]
pub struct AuthConfig {
    pub issuer: String,
    pub token_ttl_secs: i64,
    pub jwt_secret: String,
}

impl AuthConfig {
    pub fn from_env() -> AuthResult<Self> {
        let issuer =
            std::env::var("ACCOUNT_API_JWT_ISSUER").unwrap_or_else(|_| "account-api".into());
        let token_ttl_secs = parse_token_ttl(std::env::var(TOKEN_TTL_VAR).ok().as_deref())?;
        let jwt_secret = std::env::var("ACCOUNT_API_JWT_SECRET")
            .ok()
            .filter(|secret| !secret.trim().is_empty())
            .ok_or_else(|| AuthError::Config("ACCOUNT_API_JWT_SECRET is required".into()))?;

        Ok(Self {
            issuer,
            token_ttl_secs,
            jwt_secret,
        })
    }

    /// Token lifetime as a duration, rejecting values outside `1..=MAX_TOKEN_TTL_SECS`.
    pub fn token_ttl(&self) -> AuthResult<Duration> {
        if !(1..=MAX_TOKEN_TTL_SECS).contains(&self.token_ttl_secs) {
            return Err(AuthError::Config(format!(
                "token ttl must be between 1 and {MAX_TOKEN_TTL_SECS} seconds, got {}",
                self.token_ttl_secs
            )));
        }
        Duration::try_seconds(self.token_ttl_secs)
            .ok_or_else(|| AuthError::Config("token ttl out of range".into()))
    }
}

/// Unset or blank means the default; anything else must be a positive count
/// of seconds no larger than [`MAX_TOKEN_TTL_SECS`].
fn parse_token_ttl(raw: Option<&str>) -> AuthResult<i64> {
    let Some(raw) = raw.map(str::trim).filter(|raw| !raw.is_empty()) else {
        return Ok(DEFAULT_TOKEN_TTL_SECS);
    };
    match raw.parse::<i64>() {
        Ok(secs) if (1..=MAX_TOKEN_TTL_SECS).contains(&secs) => Ok(secs),
        _ => Err(AuthError::Config(format!(
            "{TOKEN_TTL_VAR} must be between 1 and {MAX_TOKEN_TTL_SECS}, got {raw:?}"
        ))),
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("issuer", &self.issuer)
            .field("token_ttl_secs", &self.token_ttl_secs)
            .field("jwt_secret", &"<redacted>")
            .finish()
    }
}
