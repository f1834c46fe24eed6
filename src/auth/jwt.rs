use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use uuid::Uuid;

use crate::auth::{AuthConfig, AuthError, AuthResult};

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct AccessTokenClaims {
    pub sub: String,
    pub iss: String,
    pub exp: i64,
    pub iat: i64,
}

#[derive(Debug, Clone)]
pub struct SignedAccessToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Issues and verifies HS256 bearer tokens bound to an account id.
///
/// Verification depends only on the signature and the `exp` claim; there is no
/// server-side revocation.
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    issuer: String,
    token_ttl: Duration,
}

impl JwtService {
    pub fn from_config(config: &AuthConfig) -> AuthResult<Self> {
        if config.jwt_secret.is_empty() {
            return Err(AuthError::Config("jwt secret must not be empty".into()));
        }
        let token_ttl = config.token_ttl()?;
        let secret_bytes = config.jwt_secret.as_bytes();
        let encoding_key = EncodingKey::from_secret(secret_bytes);
        let decoding_key = DecodingKey::from_secret(secret_bytes);

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[config.issuer.clone()]);
        validation.set_required_spec_claims(&["exp", "sub", "iss"]);
        validation.leeway = 0;

        Ok(Self {
            encoding_key,
            decoding_key,
            validation,
            issuer: config.issuer.clone(),
            token_ttl,
        })
    }

    pub fn issue(&self, account_id: Uuid) -> AuthResult<SignedAccessToken> {
        self.issue_at(account_id, Utc::now())
    }

    pub fn issue_at(&self, account_id: Uuid, now: DateTime<Utc>) -> AuthResult<SignedAccessToken> {
        let expires_at = now
            .checked_add_signed(self.token_ttl)
            .ok_or_else(|| AuthError::Other("token expiry overflows the calendar".into()))?;
        let claims = AccessTokenClaims {
            sub: account_id.to_string(),
            iss: self.issuer.clone(),
            exp: expires_at.timestamp(),
            iat: now.timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(AuthError::Jwt)?;

        Ok(SignedAccessToken { token, expires_at })
    }

    /// Resolve a token to the account id it was issued for.
    pub fn verify(&self, token: &str) -> AuthResult<Uuid> {
        let token_data = decode::<AccessTokenClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|err| match err.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::TokenInvalid,
            })?;
        token_data
            .claims
            .sub
            .parse::<Uuid>()
            .map_err(|_| AuthError::TokenInvalid)
    }

    pub fn token_ttl(&self) -> Duration {
        self.token_ttl
    }
}
