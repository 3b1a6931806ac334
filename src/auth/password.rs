use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};

use super::errors::AuthErrorCode;

pub const MIN_PASSWORD_LEN: usize = 8;

fn hasher() -> Result<Argon2<'static>, String> {
    // Argon2id, 19 MiB, 2 passes, 1 lane
    let params = Params::new(19 * 1024, 2, 1, None).map_err(|e| format!("Invalid params: {e}"))?;
    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

pub fn hash(password: &str) -> Result<String, String> {
    let salt = SaltString::generate(&mut OsRng);
    hasher()?
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| format!("Hashing failed: {e}"))
}

/// Parameters are read back from the PHC string, so hashes made with older settings still verify.
pub fn verify(password: &str, hash: &str) -> Result<bool, String> {
    let parsed = PasswordHash::new(hash).map_err(|e| format!("Invalid hash: {e}"))?;
    Ok(hasher()?
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

pub fn check_strength(password: &str) -> Result<(), AuthErrorCode> {
    if password.chars().count() < MIN_PASSWORD_LEN || password.trim().is_empty() {
        Err(AuthErrorCode::WeakPassword)
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify() {
        let h = hash("correct horse").unwrap();
        assert!(h.starts_with("$argon2id$"));
        assert!(verify("correct horse", &h).unwrap());
        assert!(!verify("battery staple", &h).unwrap());
    }

    #[test]
    fn garbage_hash_is_an_error() {
        assert!(verify("x", "not-a-phc-string").is_err());
    }

    #[test]
    fn short_passwords_are_weak() {
        assert_eq!(check_strength("short"), Err(AuthErrorCode::WeakPassword));
        assert_eq!(check_strength("        "), Err(AuthErrorCode::WeakPassword));
        assert!(check_strength("long enough").is_ok());
    }
}
