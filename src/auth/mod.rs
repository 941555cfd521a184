//! Password hashing and session tokens.

mod error;
mod extractor;

pub use error::AuthError;
pub use extractor::Auth;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::sync::Arc;
use tokio::sync::OnceCell;

use crate::user_models::User;

/// bcrypt work factor used unless configured otherwise.
pub const DEFAULT_BCRYPT_COST: u32 = 10;
pub const DEFAULT_TOKEN_TTL_HOURS: i64 = 24;

/// Payload of a session token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    /// User id
    pub id: String,
    pub username: String,
    /// Issued at (Unix seconds)
    pub iat: i64,
    /// Expiration (Unix seconds)
    pub exp: i64,
}

impl Claims {
    pub fn new(user: &User, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            id: user.id.clone(),
            username: user.username.clone(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        }
    }
}

/// Hashes and checks passwords, signs and verifies HS256 session tokens.
#[derive(Clone)]
pub struct Credentials {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    token_ttl: Duration,
    bcrypt_cost: u32,
    /// Digest checked when a login names no known user.
    decoy_digest: Arc<OnceCell<String>>,
}

impl Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("keys", &"[hidden]")
            .field("token_ttl", &self.token_ttl)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .finish()
    }
}

impl Credentials {
    pub fn new(secret: &str, token_ttl: Duration, bcrypt_cost: u32) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            token_ttl,
            bcrypt_cost,
            decoy_digest: Arc::new(OnceCell::new()),
        }
    }

    pub async fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        let password = password.to_owned();
        let cost = self.bcrypt_cost;

        tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))?
            .map_err(|e| AuthError::Internal(e.to_string()))
    }

    /// Checks `password` against a stored bcrypt digest. A digest that cannot
    /// be parsed never matches.
    pub async fn verify_password(&self, password: &str, digest: &str) -> bool {
        let password = password.to_owned();
        let digest = digest.to_owned();

        match tokio::task::spawn_blocking(move || bcrypt::verify(password, &digest)).await {
            Ok(Ok(valid)) => valid,
            Ok(Err(e)) => {
                tracing::warn!("Stored password hash is unusable: {}", e);
                false
            }
            Err(e) => {
                tracing::error!("Password verification task failed: {}", e);
                false
            }
        }
    }

    /// Does the same bcrypt work as a real check so an unknown username takes
    /// as long to reject as a wrong password.
    pub async fn verify_unknown_user(&self, password: &str) {
        let digest = self
            .decoy_digest
            .get_or_try_init(|| self.hash_password("decoy-password"))
            .await;

        match digest {
            Ok(digest) => {
                self.verify_password(password, digest).await;
            }
            Err(e) => tracing::error!("Failed to prepare decoy digest: {}", e),
        }
    }

    pub fn issue_token(&self, user: &User) -> Result<String, AuthError> {
        self.issue_token_with_ttl(user, self.token_ttl)
    }

    pub fn issue_token_with_ttl(&self, user: &User, ttl: Duration) -> Result<String, AuthError> {
        let claims = Claims::new(user, ttl);
        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Internal(format!("Failed to sign token: {}", e)))
    }

    pub fn verify_token(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!("Rejected token: {}", e);
                AuthError::TokenInvalid
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials(secret: &str) -> Credentials {
        Credentials::new(secret, Duration::hours(DEFAULT_TOKEN_TTL_HOURS), 4)
    }

    fn user() -> User {
        User::new("admin".into(), "unused".into())
    }

    #[tokio::test]
    async fn hash_then_verify() {
        let creds = credentials("secret");
        let digest = creds.hash_password("secret1").await.unwrap();

        assert_ne!(digest, "secret1");
        assert!(creds.verify_password("secret1", &digest).await);
        assert!(!creds.verify_password("secret2", &digest).await);
    }

    #[tokio::test]
    async fn unknown_user_check_hashes_once_at_configured_cost() {
        let creds = credentials("secret");

        creds.verify_unknown_user("secret1").await;
        let first = creds.decoy_digest.get().cloned().unwrap();
        creds.verify_unknown_user("other").await;

        assert_eq!(creds.decoy_digest.get(), Some(&first));
        assert!(first.starts_with("$2b$04$"));
    }

    #[tokio::test]
    async fn malformed_digest_never_matches() {
        let creds = credentials("secret");
        assert!(!creds.verify_password("secret1", "not-a-bcrypt-hash").await);
    }

    #[test]
    fn issued_token_round_trips_claims() {
        let creds = credentials("secret");
        let user = user();

        let token = creds.issue_token(&user).unwrap();
        let claims = creds.verify_token(&token).unwrap();

        assert_eq!(claims.id, user.id);
        assert_eq!(claims.username, "admin");
        assert_eq!(claims.exp - claims.iat, 24 * 3600);
    }

    #[test]
    fn token_from_another_secret_is_invalid() {
        let token = credentials("other").issue_token(&user()).unwrap();
        assert!(matches!(
            credentials("secret").verify_token(&token),
            Err(AuthError::TokenInvalid)
        ));
    }

    #[test]
    fn tampered_payload_is_invalid() {
        let creds = credentials("secret");
        let real = creds.issue_token(&user()).unwrap();
        let forged = creds
            .issue_token(&User::new("intruder".into(), "unused".into()))
            .unwrap();

        // Keep the real signature but swap in another payload.
        let real_parts: Vec<&str> = real.split('.').collect();
        let forged_parts: Vec<&str> = forged.split('.').collect();
        let tampered = format!("{}.{}.{}", real_parts[0], forged_parts[1], real_parts[2]);

        assert!(matches!(
            creds.verify_token(&tampered),
            Err(AuthError::TokenInvalid)
        ));
    }

    #[test]
    fn expired_token_is_invalid() {
        let creds = credentials("secret");
        let token = creds
            .issue_token_with_ttl(&user(), Duration::hours(-2))
            .unwrap();

        assert!(matches!(
            creds.verify_token(&token),
            Err(AuthError::TokenInvalid)
        ));
    }

    #[test]
    fn garbage_is_invalid() {
        assert!(matches!(
            credentials("secret").verify_token("not.a.token"),
            Err(AuthError::TokenInvalid)
        ));
    }
}
