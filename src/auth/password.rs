use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use lazy_static::lazy_static;
use rand::rngs::OsRng;
use tracing::error;

lazy_static! {
    // Hash of a throwaway password; verified against when no user matches.
    static ref DUMMY_HASH: String =
        hash_password("shopai-dummy-password").unwrap_or_default();
}

/// Salted Argon2id hash in PHC string form.
pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            anyhow::anyhow!(e.to_string())
        })?
        .to_string();
    Ok(hash)
}

/// Returns `false` for a mismatch and for a stored hash that cannot be parsed,
/// so callers cannot tell the two apart.
pub fn verify_password(plain: &str, hash: &str) -> bool {
    let parsed = match PasswordHash::new(hash) {
        Ok(p) => p,
        Err(e) => {
            error!(error = %e, "stored password hash is malformed");
            return false;
        }
    };
    Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok()
}

/// Runs one full Argon2 verification against a fixed hash so a lookup miss
/// costs the same as a wrong password. The result is always discarded.
pub fn verify_dummy(plain: &str) {
    let _ = verify_password(plain, &DUMMY_HASH);
}
