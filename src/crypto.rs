//! Cryptography module for the PIN gate
//!
//! Provides salted PBKDF2-HMAC-SHA256 derivation for the 4-6 digit unlock
//! PIN. Derivation is deterministic for a given (pin, salt) pair; salts and
//! hashes travel as base64 strings so they can live in the settings row and
//! in export documents.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use pbkdf2::pbkdf2_hmac;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Sha256;

use crate::config::{
    PIN_HASH_BYTES, PIN_KDF_ITERATIONS, PIN_MAX_DIGITS, PIN_MIN_DIGITS, PIN_SALT_BYTES,
};
use crate::error::{AppError, Result};

/// Check the PIN format constraint: 4 to 6 decimal digits.
pub fn is_valid_pin(pin: &str) -> bool {
    (PIN_MIN_DIGITS..=PIN_MAX_DIGITS).contains(&pin.len())
        && pin.bytes().all(|b| b.is_ascii_digit())
}

/// Produce a fresh random salt, base64-encoded.
pub fn create_salt() -> String {
    let mut salt = [0u8; PIN_SALT_BYTES];
    OsRng.fill_bytes(&mut salt);
    BASE64.encode(salt)
}

/// Derive the PIN hash from a pin and a base64 salt.
///
/// Rejects malformed PINs before any derivation is attempted.
pub fn derive_pin_hash(pin: &str, salt_b64: &str) -> Result<String> {
    if !is_valid_pin(pin) {
        return Err(AppError::Validation(
            "PIN must be 4 to 6 digits".to_string(),
        ));
    }

    let salt = BASE64
        .decode(salt_b64)
        .map_err(|e| AppError::Generic(format!("Invalid PIN salt encoding: {}", e)))?;

    let mut hash = [0u8; PIN_HASH_BYTES];
    pbkdf2_hmac::<Sha256>(pin.as_bytes(), &salt, PIN_KDF_ITERATIONS, &mut hash);

    Ok(BASE64.encode(hash))
}

/// Check a PIN against stored hash and salt.
///
/// Returns false, never an error, when either stored value is absent or the
/// candidate PIN is malformed. Wrong PINs are an expected path, not a fault.
pub fn verify_pin(pin: &str, stored_hash: Option<&str>, stored_salt: Option<&str>) -> bool {
    let (Some(hash), Some(salt)) = (stored_hash, stored_salt) else {
        return false;
    };

    match derive_pin_hash(pin, salt) {
        Ok(candidate) => candidate == hash,
        Err(_) => false,
    }
}
