//! Password-derived content cipher.
//!
//! Keys come from PBKDF2-HMAC-SHA256 over a salt derived from the owner's
//! numeric id, so one password opens every locked note of that user. Content
//! is sealed with AES-256-GCM and serialized as a single printable token:
//!
//! ```text
//! base64url( version (1) || nonce (12) || ciphertext || tag (16) )
//! ```

use crate::error::AppError;
use aes_gcm::{
    Aes256Gcm, Key, Nonce,
    aead::{Aead, AeadCore, KeyInit, OsRng},
};
use base64::{Engine, engine::general_purpose::URL_SAFE};
use log::debug;
use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop};

pub const SALT_LEN: usize = 16;
pub const KEY_LEN: usize = 32;
pub const PBKDF2_ITERATIONS: u32 = 100_000;

/// Token format version. Changing the KDF or cipher requires a new version and a migration.
pub const TOKEN_VERSION: u8 = 0x01;

const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;
const HEADER_LEN: usize = 1 + NONCE_LEN;

/// Per-user salt: the decimal user id, right-padded with `'0'` and cut to 16 bytes.
pub fn salt_for_user(user_id: u64) -> [u8; SALT_LEN] {
    let mut salt = [b'0'; SALT_LEN];
    let digits = user_id.to_string();
    let len = digits.len().min(SALT_LEN);
    salt[..len].copy_from_slice(&digits.as_bytes()[..len]);
    salt
}

/// Symmetric key material. Never persisted; wiped on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct EncryptionKey {
    key: [u8; KEY_LEN],
}

impl EncryptionKey {
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.key
    }
}

impl std::fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptionKey")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

pub fn derive_key(password: &str, salt: &[u8; SALT_LEN]) -> Result<EncryptionKey, AppError> {
    if password.is_empty() {
        return Err(AppError::Validation("Password is required.".to_string()));
    }
    let mut key = [0u8; KEY_LEN];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, PBKDF2_ITERATIONS, &mut key);
    let derived = EncryptionKey { key };
    key.zeroize();
    Ok(derived)
}

pub fn encrypt(plaintext: &str, password: &str, user_id: u64) -> Result<String, AppError> {
    let key = derive_key(password, &salt_for_user(user_id))?;
    encrypt_with_key(plaintext, &key)
}

/// Opens a token. Every failure collapses into [`AppError::Authentication`].
pub fn decrypt(token: &str, password: &str, user_id: u64) -> Result<String, AppError> {
    let key = derive_key(password, &salt_for_user(user_id))?;
    decrypt_with_key(token, &key)
}

pub(crate) fn encrypt_with_key(plaintext: &str, key: &EncryptionKey) -> Result<String, AppError> {
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_bytes()));
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

    let ciphertext = cipher
        .encrypt(&nonce, plaintext.as_bytes())
        .map_err(|e| AppError::Encryption(format!("Encryption failed: {e}")))?;

    let mut token = Vec::with_capacity(HEADER_LEN + ciphertext.len());
    token.push(TOKEN_VERSION);
    token.extend_from_slice(nonce.as_slice());
    token.extend_from_slice(&ciphertext);
    Ok(URL_SAFE.encode(token))
}

pub(crate) fn decrypt_with_key(token: &str, key: &EncryptionKey) -> Result<String, AppError> {
    let raw = URL_SAFE.decode(token.trim()).map_err(|e| {
        debug!("Token is not valid base64: {e}");
        AppError::Authentication
    })?;

    if raw.len() < HEADER_LEN + TAG_LEN {
        debug!("Token too short ({} bytes)", raw.len());
        return Err(AppError::Authentication);
    }
    if raw[0] != TOKEN_VERSION {
        debug!("Unsupported token version {}", raw[0]);
        return Err(AppError::Authentication);
    }

    let (nonce, ciphertext) = raw[1..].split_at(NONCE_LEN);
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_bytes()));

    let plaintext = cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| {
            debug!("Authentication tag mismatch");
            AppError::Authentication
        })?;

    String::from_utf8(plaintext).map_err(|e| {
        debug!("Decrypted content is not UTF-8");
        e.into_bytes().zeroize();
        AppError::Authentication
    })
}

/// Heuristic used only to bridge unmarked legacy notes: does `text` parse as a token?
///
/// A plaintext title made of base64url characters with a plausible length can
/// still produce a false positive.
pub fn looks_like_ciphertext(text: &str) -> bool {
    match URL_SAFE.decode(text.trim()) {
        Ok(raw) => raw.len() >= HEADER_LEN + TAG_LEN && raw[0] == TOKEN_VERSION,
        Err(_) => false,
    }
}

#[cfg(test)]
mod cipher_test;
