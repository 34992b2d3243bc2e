#![cfg(test)]

use super::*;

#[test]
fn test_salt_pads_short_ids_with_ascii_zero() {
    assert_eq!(&salt_for_user(42), b"4200000000000000");
    assert_eq!(&salt_for_user(0), b"0000000000000000");
}

#[test]
fn test_salt_truncates_long_ids() {
    // u64::MAX has 20 digits
    assert_eq!(&salt_for_user(u64::MAX), b"1844674407370955");
}

#[test]
fn test_derive_key_is_deterministic() -> Result<(), AppError> {
    let salt = salt_for_user(7);
    let first = derive_key("hunter2", &salt)?;
    let second = derive_key("hunter2", &salt)?;
    assert_eq!(first.as_bytes(), second.as_bytes());

    let other_user = derive_key("hunter2", &salt_for_user(8))?;
    assert_ne!(first.as_bytes(), other_user.as_bytes());
    Ok(())
}

#[test]
fn test_derive_key_rejects_empty_password() {
    let result = derive_key("", &salt_for_user(1));
    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[test]
fn test_key_debug_is_redacted() -> Result<(), AppError> {
    let key = derive_key("secret", &salt_for_user(1))?;
    let rendered = format!("{key:?}");
    assert!(rendered.contains("REDACTED"));
    Ok(())
}

#[test]
fn test_buy_milk_example() -> Result<(), AppError> {
    let token = encrypt("Buy milk", "correct-horse", 42)?;
    assert_ne!(token, "Buy milk");
    assert_eq!(decrypt(&token, "correct-horse", 42)?, "Buy milk");
    assert!(matches!(
        decrypt(&token, "wrong-pw", 42),
        Err(AppError::Authentication)
    ));
    Ok(())
}

#[test]
fn test_round_trip_empty_and_unicode() -> Result<(), AppError> {
    let key = derive_key("pässwörd", &salt_for_user(3))?;
    for text in ["", "plain ascii", "日本語のメモ 🍣", "line one\nline two\r\n\ttabbed"] {
        let token = encrypt_with_key(text, &key)?;
        assert_eq!(decrypt_with_key(&token, &key)?, text);
    }
    Ok(())
}

#[test]
fn test_encryption_uses_fresh_nonce() -> Result<(), AppError> {
    let key = derive_key("pw", &salt_for_user(1))?;
    let a = encrypt_with_key("same text", &key)?;
    let b = encrypt_with_key("same text", &key)?;
    assert_ne!(a, b);
    Ok(())
}

#[test]
fn test_cross_user_isolation() -> Result<(), AppError> {
    let token = encrypt("shared password, different owner", "pw", 1)?;
    assert!(matches!(decrypt(&token, "pw", 2), Err(AppError::Authentication)));
    Ok(())
}

#[test]
fn test_corrupted_tokens_fail_as_authentication() -> Result<(), AppError> {
    let key = derive_key("pw", &salt_for_user(5))?;
    let token = encrypt_with_key("payload", &key)?;

    let mut raw = URL_SAFE.decode(&token).map_err(|e| AppError::Encryption(e.to_string()))?;
    let last = raw.len() - 1;
    raw[last] ^= 0x01;
    let tampered = URL_SAFE.encode(&raw);

    let truncated = &token[..token.len() / 2];
    for bad in [tampered.as_str(), truncated, "not a token at all!", "", "AAAA"] {
        assert!(matches!(
            decrypt_with_key(bad, &key),
            Err(AppError::Authentication)
        ));
    }
    Ok(())
}

#[test]
fn test_unknown_version_is_rejected() -> Result<(), AppError> {
    let key = derive_key("pw", &salt_for_user(5))?;
    let token = encrypt_with_key("payload", &key)?;
    let mut raw = URL_SAFE.decode(&token).map_err(|e| AppError::Encryption(e.to_string()))?;
    raw[0] = 0x7f;
    let reversioned = URL_SAFE.encode(&raw);

    assert!(matches!(
        decrypt_with_key(&reversioned, &key),
        Err(AppError::Authentication)
    ));
    assert!(!looks_like_ciphertext(&reversioned));
    Ok(())
}

#[test]
fn test_looks_like_ciphertext() -> Result<(), AppError> {
    let token = encrypt("Groceries", "pw", 9)?;
    assert!(looks_like_ciphertext(&token));
    assert!(!looks_like_ciphertext("Groceries"));
    assert!(!looks_like_ciphertext("Meeting notes: Q3 plan"));
    assert!(!looks_like_ciphertext(""));
    Ok(())
}
