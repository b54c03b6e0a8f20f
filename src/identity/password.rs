use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version};

pub fn hash_password(params: &Params, password: &str) -> Result<String, argon2::password_hash::Error> {
    let hasher = Argon2::new(Algorithm::Argon2id, Version::V0x13, params.clone());
    let salt = SaltString::generate(&mut OsRng);
    hasher
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
}

/// Parameters are read back from the stored hash.
pub fn verify_password(password: &str, hash: &str) -> Result<(), argon2::password_hash::Error> {
    let parsed_hash = PasswordHash::new(hash)?;
    Argon2::default().verify_password(password.as_bytes(), &parsed_hash)
}

#[cfg(test)]
mod tests {
    use argon2::Params;

    use super::{hash_password, verify_password};

    #[test]
    fn hash_verifies_only_the_original_password() {
        let params = Params::new(1024, 1, 1, None).unwrap();
        let hash = hash_password(&params, "s3cret!").unwrap();

        assert!(verify_password("s3cret!", &hash).is_ok());
        assert!(verify_password("s3cret?", &hash).is_err());
    }
}
