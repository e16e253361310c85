//! Utility functions

pub mod crypto;
pub mod validation;

pub use crypto::{generate_secure_token, hash_password, hash_token, verify_password};
pub use validation::ValidatedJson;
