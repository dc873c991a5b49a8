use base64::{engine::general_purpose::STANDARD as Base64, Engine as _};
use pbkdf2::pbkdf2_hmac;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::error::{AppError, AppResult};

const VERSION_PREFIX: &str = "pbkdf2-sha256$";
const SALT_LEN: usize = 16;
const KEY_LEN: usize = 32;
const PBKDF2_ITERATIONS: u32 = 120_000;

/// Hashes a password into `pbkdf2-sha256$<iterations>$<salt>$<hash>`.
pub fn hash_password(password: &str) -> AppResult<String> {
    if password.is_empty() {
        return Err(AppError::validation("password must not be empty"));
    }

    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    let key = derive_key(password.as_bytes(), &salt, PBKDF2_ITERATIONS);

    Ok(format!(
        "{VERSION_PREFIX}{PBKDF2_ITERATIONS}${}${}",
        Base64.encode(salt),
        Base64.encode(key)
    ))
}

pub fn verify_password(password: &str, encoded: &str) -> AppResult<bool> {
    let body = encoded
        .strip_prefix(VERSION_PREFIX)
        .ok_or_else(|| AppError::other("unsupported password hash format"))?;

    let mut parts = body.splitn(3, '$');
    let (Some(iterations), Some(salt), Some(expected)) = (parts.next(), parts.next(), parts.next())
    else {
        return Err(AppError::other("malformed password hash"));
    };

    let iterations: u32 = iterations
        .parse()
        .map_err(|_| AppError::other("malformed password hash iterations"))?;
    let salt = Base64
        .decode(salt.as_bytes())
        .map_err(|_| AppError::other("password salt is corrupt"))?;
    let expected = Base64
        .decode(expected.as_bytes())
        .map_err(|_| AppError::other("password hash is corrupt"))?;

    let actual = derive_key(password.as_bytes(), &salt, iterations);
    Ok(constant_time_eq(&actual, &expected))
}

/// Short, stable fingerprint used in log lines instead of identifying values.
pub fn fingerprint(value: &str) -> String {
    let digest = Sha256::digest(value.as_bytes());
    let mut hex = String::with_capacity(12);
    for byte in digest[..6].iter() {
        hex.push_str(&format!("{:02x}", byte));
    }
    hex
}

fn derive_key(password: &[u8], salt: &[u8], iterations: u32) -> [u8; KEY_LEN] {
    let mut key = [0u8; KEY_LEN];
    pbkdf2_hmac::<Sha256>(password, salt, iterations, &mut key);
    key
}

fn constant_time_eq(left: &[u8], right: &[u8]) -> bool {
    if left.len() != right.len() {
        return false;
    }
    left.iter()
        .zip(right.iter())
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}
