use argon2::Params;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::AppError;
use crate::identity::password::{hash_password, verify_password};
use crate::identity::{
    validate_email, validate_password, IdentityProvider, IdentityUser, Session,
};

struct Credential {
    email: String,
    password_hash: String,
}

struct SessionEntry {
    uid: String,
    expires_at: DateTime<Utc>,
}

/// In-process identity provider: argon2 password hashes and opaque bearer
/// tokens with a fixed lifetime.
pub struct LocalIdentityProvider {
    credentials: DashMap<String, Credential>,
    uid_by_email: DashMap<String, String>,
    sessions: DashMap<String, SessionEntry>,
    session_ttl: Duration,
    hash_params: Params,
}

impl LocalIdentityProvider {
    pub fn new(session_ttl: Duration) -> Self {
        Self::with_hash_params(session_ttl, Params::default())
    }

    pub fn with_hash_params(session_ttl: Duration, hash_params: Params) -> Self {
        Self {
            credentials: DashMap::new(),
            uid_by_email: DashMap::new(),
            sessions: DashMap::new(),
            session_ttl,
            hash_params,
        }
    }

    fn hash(&self, password: &str) -> Result<String, AppError> {
        hash_password(&self.hash_params, password)
            .map_err(|err| AppError::Internal(format!("failed to hash password: {err}")))
    }

    fn check(&self, uid: &str, password: &str) -> Result<(), AppError> {
        let credential = self.credentials.get(uid).ok_or(AppError::Unauthorized)?;
        verify_password(password, &credential.password_hash).map_err(|_| AppError::Unauthorized)
    }
}

fn normalize(email: &str) -> String {
    email.trim().to_lowercase()
}

#[async_trait]
impl IdentityProvider for LocalIdentityProvider {
    async fn create_user(&self, email: &str, password: &str) -> Result<String, AppError> {
        let email = normalize(email);
        validate_email(&email)?;
        validate_password(password)?;

        let password_hash = self.hash(password)?;
        let uid = Uuid::new_v4().to_string();

        match self.uid_by_email.entry(email.clone()) {
            Entry::Occupied(_) => {
                return Err(AppError::Conflict(format!("email {email} already in use")));
            }
            Entry::Vacant(slot) => {
                slot.insert(uid.clone());
            }
        }

        self.credentials.insert(
            uid.clone(),
            Credential {
                email,
                password_hash,
            },
        );

        info!(uid = %uid, "identity created");
        Ok(uid)
    }

    async fn verify(&self, email: &str, password: &str) -> Result<String, AppError> {
        let uid = self
            .uid_by_email
            .get(&normalize(email))
            .map(|entry| entry.value().clone())
            .ok_or(AppError::Unauthorized)?;

        self.check(&uid, password)?;
        Ok(uid)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AppError> {
        let uid = self.verify(email, password).await?;

        let now = Utc::now();
        self.sessions.retain(|_, entry| entry.expires_at > now);

        let session = Session {
            token: Uuid::new_v4().to_string(),
            uid: uid.clone(),
            expires_at: now + self.session_ttl,
        };
        self.sessions.insert(
            session.token.clone(),
            SessionEntry {
                uid,
                expires_at: session.expires_at,
            },
        );

        debug!(uid = %session.uid, "session opened");
        Ok(session)
    }

    async fn sign_out(&self, token: &str) -> Result<(), AppError> {
        if let Some((_, entry)) = self.sessions.remove(token) {
            debug!(uid = %entry.uid, "session closed");
        }
        Ok(())
    }

    async fn current_user(&self, token: &str) -> Result<Option<IdentityUser>, AppError> {
        let Some((uid, expires_at)) = self
            .sessions
            .get(token)
            .map(|entry| (entry.uid.clone(), entry.expires_at))
        else {
            return Ok(None);
        };

        if expires_at <= Utc::now() {
            self.sessions.remove(token);
            return Ok(None);
        }

        Ok(self.credentials.get(&uid).map(|credential| IdentityUser {
            uid: uid.clone(),
            email: credential.email.clone(),
        }))
    }

    async fn change_password(
        &self,
        uid: &str,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AppError> {
        self.check(uid, current_password)?;
        validate_password(new_password)?;

        let password_hash = self.hash(new_password)?;
        let mut credential = self
            .credentials
            .get_mut(uid)
            .ok_or_else(|| AppError::NotFound(format!("identity {uid} not found")))?;
        credential.password_hash = password_hash;

        info!(uid = %uid, "password changed");
        Ok(())
    }

    async fn change_email(&self, uid: &str, new_email: &str) -> Result<(), AppError> {
        let new_email = normalize(new_email);
        validate_email(&new_email)?;

        let old_email = self
            .credentials
            .get(uid)
            .map(|credential| credential.email.clone())
            .ok_or_else(|| AppError::NotFound(format!("identity {uid} not found")))?;
        if old_email == new_email {
            return Ok(());
        }

        match self.uid_by_email.entry(new_email.clone()) {
            Entry::Occupied(_) => {
                return Err(AppError::Conflict(format!(
                    "email {new_email} already in use"
                )));
            }
            Entry::Vacant(slot) => {
                slot.insert(uid.to_string());
            }
        }
        self.uid_by_email.remove(&old_email);

        if let Some(mut credential) = self.credentials.get_mut(uid) {
            credential.email = new_email;
        }

        info!(uid = %uid, "email changed");
        Ok(())
    }
}
