use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};

use crate::{
    error::AppResult,
    models::{Role, User},
    repository::Repository,
};

/// Hashes a password into an Argon2id PHC string with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)?
        .to_string())
}

/// Salted-hash comparison. A stored value that is not a valid PHC string never matches.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            tracing::warn!("stored password hash is malformed: {e}");
            false
        }
    }
}

/// verify_credentials
///
/// Resolves an email/password pair to a user. Only users holding the privileged
/// role can authenticate against the admin surface; everyone else gets `None`,
/// exactly as for a wrong password.
pub async fn verify_credentials(
    repo: &dyn Repository,
    email: &str,
    password: &str,
) -> AppResult<Option<User>> {
    let Some(user) = repo.find_user_by_email(email).await? else {
        return Ok(None);
    };

    if !verify_password(password, &user.password) || user.role != Role::Admin {
        return Ok(None);
    }

    Ok(Some(user))
}
