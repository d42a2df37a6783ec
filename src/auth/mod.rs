use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config::SecurityConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id the token was issued to
    pub sub: Uuid,
    pub exp: i64,
    pub iat: i64,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid JWT secret")]
    InvalidSecret,

    #[error("Invalid password hashing parameters: {0}")]
    InvalidHashParams(String),

    #[error("Password hashing failed: {0}")]
    Hashing(String),

    #[error("JWT generation error: {0}")]
    TokenGeneration(String),

    #[error("Invalid token: {0}")]
    InvalidToken(String),
}

/// Password hashing and bearer token handling. Holds no state besides its keys.
pub struct Credentials {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    token_ttl: Duration,
    hash_params: Params,
}

impl Credentials {
    pub fn new(secret: &str, token_ttl: Duration) -> Result<Self, AuthError> {
        if secret.is_empty() {
            return Err(AuthError::InvalidSecret);
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            token_ttl,
            hash_params: Params::default(),
        })
    }

    pub fn from_config(security: &SecurityConfig) -> Result<Self, AuthError> {
        Self::new(&security.jwt_secret, Duration::days(security.jwt_expiry_days))?
            .with_hash_cost(security.argon2_memory_kib, security.argon2_iterations)
    }

    /// Overrides the argon2 memory (KiB) and iteration cost used for new hashes
    pub fn with_hash_cost(mut self, memory_kib: u32, iterations: u32) -> Result<Self, AuthError> {
        self.hash_params = Params::new(memory_kib, iterations, 1, None)
            .map_err(|e| AuthError::InvalidHashParams(e.to_string()))?;
        Ok(self)
    }

    fn hasher(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.hash_params.clone())
    }

    /// One-way hash with a fresh salt, encoded as a PHC string
    pub fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        self.hasher()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AuthError::Hashing(e.to_string()))
    }

    /// False on mismatch and on hashes that cannot be parsed
    pub fn verify_password(&self, password: &str, hash: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(hash) else {
            return false;
        };
        // Cost parameters are read from the PHC string
        Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok()
    }

    pub fn issue_token(&self, user_id: Uuid) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id,
            exp: (now + self.token_ttl).timestamp(),
            iat: now.timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AuthError::TokenGeneration(e.to_string()))
    }

    pub fn verify_token(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::default();
        validation.leeway = 0;

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))
    }
}
