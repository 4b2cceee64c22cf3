use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256, Sha512};
use strum::{Display, EnumString};

use crate::errors::ServiceError;

/// Digest used for `hashed` passwords.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum HashAlgorithm {
    Sha256,
    #[default]
    Sha512,
    Argon2,
}

const ARGON2_PREFIX: &str = "$argon2";

/// Salt and password hashing primitives.
#[derive(Clone, Debug, Default)]
pub struct EncryptionService;

impl EncryptionService {
    pub fn new() -> Self {
        Self
    }

    /// `size` random bytes, base64 encoded.
    pub fn create_salt_key(&self, size: usize) -> String {
        let mut bytes = vec![0u8; size];
        rand::thread_rng().fill_bytes(&mut bytes);
        STANDARD.encode(bytes)
    }

    /// Hashes `password + salt`. SHA digests are rendered as upper-case hex,
    /// Argon2 produces a PHC string seeded with the salt key.
    pub fn create_password_hash(
        &self,
        password: &str,
        salt: &str,
        algorithm: HashAlgorithm,
    ) -> Result<String, ServiceError> {
        match algorithm {
            HashAlgorithm::Sha256 => Ok(sha_hex::<Sha256>(password, salt)),
            HashAlgorithm::Sha512 => Ok(sha_hex::<Sha512>(password, salt)),
            HashAlgorithm::Argon2 => {
                let salt = SaltString::encode_b64(salt.as_bytes())
                    .map_err(|e| ServiceError::HashError(e.to_string()))?;
                Argon2::default()
                    .hash_password(password.as_bytes(), &salt)
                    .map(|hash| hash.to_string())
                    .map_err(|e| ServiceError::HashError(e.to_string()))
            }
        }
    }

    /// Checks `password` against a stored hash. PHC strings are detected by
    /// prefix so a change of the configured algorithm keeps old hashes valid.
    pub fn verify_password_hash(
        &self,
        password: &str,
        salt: &str,
        stored: &str,
        algorithm: HashAlgorithm,
    ) -> Result<bool, ServiceError> {
        if stored.starts_with(ARGON2_PREFIX) {
            let parsed =
                PasswordHash::new(stored).map_err(|e| ServiceError::HashError(e.to_string()))?;
            return Ok(Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok());
        }

        let candidate = match algorithm {
            HashAlgorithm::Sha256 => sha_hex::<Sha256>(password, salt),
            // a SHA-256 hex digest is 64 characters, SHA-512 is 128
            HashAlgorithm::Sha512 | HashAlgorithm::Argon2 if stored.len() == 64 => {
                sha_hex::<Sha256>(password, salt)
            }
            HashAlgorithm::Sha512 | HashAlgorithm::Argon2 => sha_hex::<Sha512>(password, salt),
        };
        Ok(candidate.eq_ignore_ascii_case(stored))
    }
}

fn sha_hex<D: Digest>(password: &str, salt: &str) -> String {
    let mut hasher = D::new();
    hasher.update(password.as_bytes());
    hasher.update(salt.as_bytes());
    hex::encode_upper(hasher.finalize())
}
