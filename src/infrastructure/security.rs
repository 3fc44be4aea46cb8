use argon2::Argon2;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand_core::OsRng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

// Argon2 parameters for 50-150ms target latency
const ARGON2_M_COST: u32 = 19456; // 19 MB
const ARGON2_T_COST: u32 = 2; // 2 iterations
const ARGON2_P_COST: u32 = 1; // 1 parallelism

const TOKEN_LEEWAY_SECS: u64 = 60;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String, // user_id
    exp: usize,
    iat: usize,
}

#[derive(Error, Debug)]
pub enum TokenError {
    #[error("Token has expired")]
    Expired,
    #[error("Token is not valid")]
    Invalid,
}

fn argon2() -> Result<Argon2<'static>, argon2::password_hash::Error> {
    Ok(Argon2::new(
        argon2::Algorithm::Argon2id,
        argon2::Version::V0x13,
        argon2::Params::new(ARGON2_M_COST, ARGON2_T_COST, ARGON2_P_COST, None)
            .map_err(argon2::password_hash::Error::from)?,
    ))
}

pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = argon2()?.hash_password(password.as_bytes(), &salt)?;
    Ok(password_hash.to_string())
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, argon2::password_hash::Error> {
    let parsed_hash = PasswordHash::new(hash)?;
    match argon2()?.verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(_) => Ok(false),
    }
}

pub fn generate_token(
    user_id: i64,
    secret: &str,
    ttl_secs: u64,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now().timestamp().max(0) as usize;

    let claims = Claims {
        sub: user_id.to_string(),
        exp: now.saturating_add(usize::try_from(ttl_secs).unwrap_or(usize::MAX)),
        iat: now,
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_ref()),
    )
}

/// Checks signature and expiry and returns the user id the token was issued to.
pub fn validate_token(token: &str, secret: &str) -> Result<i64, TokenError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = TOKEN_LEEWAY_SECS;

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &validation,
    )
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
        _ => TokenError::Invalid,
    })?;

    token_data.claims.sub.parse().map_err(|_| TokenError::Invalid)
}

/// Issues and verifies bearer tokens with one shared secret and lifetime.
/// Verification is stateless: signature plus expiry, no server-side session.
#[derive(Clone)]
pub struct TokenSigner {
    secret: Arc<str>,
    ttl_secs: u64,
}

impl TokenSigner {
    pub fn new(secret: impl Into<String>, ttl_secs: u64) -> Self {
        Self {
            secret: Arc::from(secret.into()),
            ttl_secs,
        }
    }

    pub fn issue(&self, user_id: i64) -> Result<String, jsonwebtoken::errors::Error> {
        generate_token(user_id, &self.secret, self.ttl_secs)
    }

    pub fn verify(&self, token: &str) -> Result<i64, TokenError> {
        validate_token(token, &self.secret)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TTL: u64 = 3600;

    #[test]
    fn test_hash_password_generates_valid_hash() {
        let password = "test_password_123";
        let hash = hash_password(password).unwrap();

        assert!(!hash.is_empty());
        assert_ne!(hash, password);
        assert!(hash.starts_with("$argon2id$"));
    }

    #[test]
    fn test_hash_password_same_password_produces_different_hashes() {
        let password = "same_password";

        let hash1 = hash_password(password).unwrap();
        let hash2 = hash_password(password).unwrap();

        // Due to random salt, same password should produce different hashes
        assert_ne!(hash1, hash2);
    }

    #[test]
    fn test_verify_password_correct_password_returns_true() {
        let hash = hash_password("correct_password").unwrap();
        assert!(verify_password("correct_password", &hash).unwrap());
    }

    #[test]
    fn test_verify_password_incorrect_password_returns_false() {
        let hash = hash_password("correct_password").unwrap();
        assert!(!verify_password("wrong_password", &hash).unwrap());
    }

    #[test]
    fn test_verify_password_invalid_hash_format() {
        let result = verify_password("test_password", "not_a_valid_hash");
        assert!(result.is_err());
    }

    #[test]
    fn test_verify_password_with_unicode() {
        let password = "пароль123";
        let hash = hash_password(password).unwrap();
        assert!(verify_password(password, &hash).unwrap());
    }

    #[test]
    fn test_generate_token_creates_valid_token() {
        let token = generate_token(123, "test_secret_key", TTL).unwrap();

        // JWT tokens have 3 parts separated by dots
        let parts: Vec<&str> = token.split('.').collect();
        assert_eq!(parts.len(), 3);
    }

    #[test]
    fn test_token_round_trip() {
        let token = generate_token(456, "round_trip_secret", TTL).unwrap();
        assert_eq!(validate_token(&token, "round_trip_secret").unwrap(), 456);
    }

    #[test]
    fn test_validate_token_rejects_invalid_token() {
        let result = validate_token("invalid.token.here", "secret_key");
        assert!(matches!(result, Err(TokenError::Invalid)));
    }

    #[test]
    fn test_validate_token_rejects_token_with_wrong_secret() {
        let token = generate_token(1, "correct_secret", TTL).unwrap();
        assert!(matches!(
            validate_token(&token, "wrong_secret"),
            Err(TokenError::Invalid)
        ));
    }

    #[test]
    fn test_validate_token_rejects_expired_token() {
        let now = Utc::now().timestamp() as usize;
        let claims = Claims {
            sub: "1".to_string(),
            exp: now - 2 * TOKEN_LEEWAY_SECS as usize,
            iat: now - 3 * TOKEN_LEEWAY_SECS as usize,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"secret"),
        )
        .unwrap();
        assert!(matches!(
            validate_token(&token, "secret"),
            Err(TokenError::Expired)
        ));
    }

    #[test]
    fn test_validate_token_rejects_non_numeric_subject() {
        let now = Utc::now().timestamp() as usize;
        let claims = Claims {
            sub: "not-a-number".to_string(),
            exp: now + 60,
            iat: now,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"secret"),
        )
        .unwrap();
        assert!(matches!(
            validate_token(&token, "secret"),
            Err(TokenError::Invalid)
        ));
    }

    #[test]
    fn test_signer_issues_tokens_it_accepts() {
        let signer = TokenSigner::new("signer-secret", TTL);
        let token = signer.issue(99).unwrap();
        assert_eq!(signer.verify(&token).unwrap(), 99);

        let other = TokenSigner::new("other-secret", TTL);
        assert!(other.verify(&token).is_err());
    }

    #[test]
    fn test_huge_ttl_saturates_expiry() {
        let signer = TokenSigner::new("signer-secret", u64::MAX);
        let token = signer.issue(7).unwrap();
        assert_eq!(signer.verify(&token).unwrap(), 7);
    }
}
