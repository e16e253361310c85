//! Password hashing and account token helpers

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use rand::Rng;
use sha2::{Digest, Sha256};

use crate::error::{AppError, AppResult};

/// Generate a random alphanumeric token
pub fn generate_secure_token(length: usize) -> String {
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::rng();

    (0..length)
        .map(|_| CHARSET[rng.random_range(0..CHARSET.len())] as char)
        .collect()
}

/// SHA-256 of a token, hex encoded. Only this digest is ever stored.
pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// Hash a password with Argon2id using `cost` iterations
pub fn hash_password(password: &str, cost: u32) -> AppResult<String> {
    let params = Params::new(Params::DEFAULT_M_COST, cost, Params::DEFAULT_P_COST, None)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Invalid Argon2 parameters: {}", e)))?;
    let salt = SaltString::generate(&mut OsRng);

    let hash = Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Password hashing failed: {}", e)))?
        .to_string();

    Ok(hash)
}

/// Check a password against a stored hash. Parameters come from the hash
/// itself, so hashes made with an older cost keep verifying.
pub fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Invalid password hash: {}", e)))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}
