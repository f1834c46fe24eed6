use argon2::password_hash::{self, SaltString};
use argon2::{Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version};
use rand::RngCore;

use crate::auth::{AuthError, AuthResult};

/// Argon2id memory cost in KiB.
pub const MEMORY_COST_KIB: u32 = 19 * 1024;
pub const TIME_COST: u32 = 2;
pub const PARALLELISM: u32 = 1;

const SALT_LEN: usize = 16;

/// One-way credential hashing. Hashes are self-describing PHC strings, so the
/// parameters and salt travel with each stored value.
///
/// The async methods run the hash on tokio's blocking pool; the `_blocking`
/// variants are for callers already off the runtime.
#[derive(Clone)]
pub struct PasswordService {
    argon2: Argon2<'static>,
}

impl PasswordService {
    pub fn new() -> AuthResult<Self> {
        let params = Params::new(MEMORY_COST_KIB, TIME_COST, PARALLELISM, None)?;
        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    pub async fn hash(&self, password: String) -> AuthResult<String> {
        let service = self.clone();
        tokio::task::spawn_blocking(move || service.hash_blocking(&password)).await?
    }

    pub async fn verify(&self, password: String, stored_hash: String) -> AuthResult<bool> {
        let service = self.clone();
        tokio::task::spawn_blocking(move || service.verify_blocking(&password, &stored_hash))
            .await?
    }

    pub fn hash_blocking(&self, password: &str) -> AuthResult<String> {
        let mut salt = [0u8; SALT_LEN];
        rand::thread_rng().fill_bytes(&mut salt);
        let salt = SaltString::encode_b64(&salt)?;

        Ok(self
            .argon2
            .hash_password(password.as_bytes(), &salt)?
            .to_string())
    }

    /// `Ok(false)` on mismatch. `Err` means the stored hash itself is unusable.
    pub fn verify_blocking(&self, password: &str, stored_hash: &str) -> AuthResult<bool> {
        let parsed = PasswordHash::new(stored_hash)?;
        match self.argon2.verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(err) => Err(AuthError::from(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> PasswordService {
        PasswordService::new().expect("password service")
    }

    #[tokio::test]
    async fn hashed_password_verifies_only_itself() {
        let passwords = service();
        let hash = passwords.hash("longenough1".into()).await.expect("hash");

        assert!(
            passwords
                .verify("longenough1".into(), hash.clone())
                .await
                .expect("verify")
        );
        assert!(
            !passwords
                .verify("longenough2".into(), hash)
                .await
                .expect("verify")
        );
    }

    #[test]
    fn hash_is_phc_argon2id_without_plaintext() {
        let hash = service().hash_blocking("longenough1").expect("hash");

        assert!(hash.starts_with("$argon2id$v=19$m=19456,t=2,p=1$"));
        assert!(!hash.contains("longenough1"));
    }

    #[test]
    fn same_password_gets_distinct_salts() {
        let passwords = service();
        let first = passwords.hash_blocking("longenough1").expect("hash");
        let second = passwords.hash_blocking("longenough1").expect("hash");
        assert_ne!(first, second);
    }

    #[test]
    fn garbage_hash_is_an_error_not_a_mismatch() {
        let result = service().verify_blocking("longenough1", "not-a-phc-string");
        assert!(matches!(result, Err(AuthError::PasswordHash(_))));
    }
}
