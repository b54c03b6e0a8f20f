use std::env;

use crate::directory::admins::SuperAdminSeed;
use crate::error::AppError;

#[derive(Clone)]
pub struct StoreConfig {
    pub project_id: String,
    pub api_key: String,
}

impl std::fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreConfig")
            .field("project_id", &self.project_id)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub log_level: String,
    pub event_buffer_size: usize,
    pub session_ttl_secs: i64,
    pub store: StoreConfig,
    pub super_admin: Option<SuperAdminConfig>,
}

#[derive(Debug, Clone)]
pub struct SuperAdminConfig {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}

impl SuperAdminConfig {
    pub fn seed(&self) -> SuperAdminSeed {
        SuperAdminSeed {
            email: self.email.clone(),
            password: self.password.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let _ = dotenvy::dotenv();

        let store = StoreConfig {
            project_id: required("STORE_PROJECT_ID")?,
            api_key: required("STORE_API_KEY")?,
        };

        let super_admin = match (optional("SUPERADMIN_EMAIL"), optional("SUPERADMIN_PASSWORD")) {
            (Some(email), Some(password)) => Some(SuperAdminConfig {
                email,
                password,
                first_name: optional("SUPERADMIN_FIRST_NAME").unwrap_or_else(|| "Super".to_string()),
                last_name: optional("SUPERADMIN_LAST_NAME").unwrap_or_else(|| "Admin".to_string()),
            }),
            (None, None) => None,
            _ => {
                return Err(AppError::Internal(
                    "SUPERADMIN_EMAIL and SUPERADMIN_PASSWORD must be set together".to_string(),
                ));
            }
        };

        let session_ttl_secs = parse_or_default("SESSION_TTL_SECS", 8 * 60 * 60)?;
        if session_ttl_secs <= 0 {
            return Err(AppError::Internal(
                "invalid SESSION_TTL_SECS: must be positive".to_string(),
            ));
        }

        let event_buffer_size = positive_buffer_size(parse_or_default("EVENT_BUFFER_SIZE", 1024)?)?;

        Ok(Self {
            http_port: parse_or_default("HTTP_PORT", 3000)?,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            event_buffer_size,
            session_ttl_secs,
            store,
            super_admin,
        })
    }
}

/// The transition feed is a broadcast channel, which needs room for at least
/// one event.
fn positive_buffer_size(value: usize) -> Result<usize, AppError> {
    if value == 0 {
        return Err(AppError::Internal(
            "invalid EVENT_BUFFER_SIZE: must be positive".to_string(),
        ));
    }
    Ok(value)
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn required(key: &str) -> Result<String, AppError> {
    optional(key).ok_or_else(|| AppError::Internal(format!("missing required {key}")))
}

fn parse_or_default<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|err| AppError::Internal(format!("invalid {key}: {err}"))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::{positive_buffer_size, StoreConfig};
    use crate::error::AppError;

    #[test]
    fn zero_event_buffer_is_rejected_at_load() {
        let err = positive_buffer_size(0).unwrap_err();
        assert!(matches!(err, AppError::Internal(msg) if msg.contains("EVENT_BUFFER_SIZE")));
        assert_eq!(positive_buffer_size(1).unwrap(), 1);
        assert_eq!(positive_buffer_size(1024).unwrap(), 1024);
    }

    #[test]
    fn store_config_debug_hides_api_key() {
        let config = StoreConfig {
            project_id: "delivery-desk".to_string(),
            api_key: "s3cret-key".to_string(),
        };
        let rendered = format!("{config:?}");
        assert!(rendered.contains("delivery-desk"));
        assert!(!rendered.contains("s3cret-key"));
    }
}
