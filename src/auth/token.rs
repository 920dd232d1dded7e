use rand::Rng;
use sha2::{Digest, Sha256};

const TOKEN_PREFIX: &str = "ebpfhub";
const SECRET_BYTES: usize = 24;

/// Mints opaque bearer tokens for the credential store.
#[derive(Debug, Default)]
pub struct TokenGenerator;

impl TokenGenerator {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Generates a new token with the format: ebpfhub_<hex secret>
    /// Returns (raw_token, key)
    #[must_use]
    pub fn generate(&self) -> (String, String) {
        let mut bytes = [0u8; SECRET_BYTES];
        rand::thread_rng().fill(&mut bytes);
        let raw_token = format!("{TOKEN_PREFIX}_{}", hex::encode(bytes));
        let key = token_key(&raw_token);
        (raw_token, key)
    }
}

/// Derives the credential store key for a raw token value.
/// The value is hashed as received, without any scheme parsing.
#[must_use]
pub fn token_key(raw_token: &str) -> String {
    hex::encode(Sha256::digest(raw_token.as_bytes()))
}
