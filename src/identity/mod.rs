pub mod local;
pub mod password;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::AppError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityUser {
    pub uid: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub token: String,
    pub uid: String,
    pub expires_at: DateTime<Utc>,
}

/// Credential and session authority for administrator accounts.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn create_user(&self, email: &str, password: &str) -> Result<String, AppError>;

    /// Checks the credentials and returns the uid they belong to.
    async fn verify(&self, email: &str, password: &str) -> Result<String, AppError>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AppError>;

    async fn sign_out(&self, token: &str) -> Result<(), AppError>;

    async fn current_user(&self, token: &str) -> Result<Option<IdentityUser>, AppError>;

    /// Requires `current_password` to verify before the change is applied.
    async fn change_password(
        &self,
        uid: &str,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AppError>;

    async fn change_email(&self, uid: &str, new_email: &str) -> Result<(), AppError>;
}

pub const MIN_PASSWORD_LEN: usize = 6;

pub fn validate_email(email: &str) -> Result<(), AppError> {
    let well_formed = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));

    if well_formed && !email.chars().any(char::is_whitespace) {
        Ok(())
    } else {
        Err(AppError::Validation(format!("invalid email address: {email}")))
    }
}

pub fn validate_password(password: &str) -> Result<(), AppError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{validate_email, validate_password};

    #[test]
    fn email_needs_local_part_and_dotted_domain() {
        assert!(validate_email("ops@delivery.sn").is_ok());
        assert!(validate_email("@delivery.sn").is_err());
        assert!(validate_email("ops@localhost").is_err());
        assert!(validate_email("o ps@delivery.sn").is_err());
    }

    #[test]
    fn short_passwords_are_rejected() {
        assert!(validate_password("12345").is_err());
        assert!(validate_password("123456").is_ok());
    }
}
