use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AdminRole {
    Superadmin,
    Admin,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Admin {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: AdminRole,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
}

/// The authenticated caller of an admin operation. Handlers build one per
/// request from the session token and pass it down explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminContext {
    pub admin_id: String,
    pub email: String,
    pub role: AdminRole,
}

impl From<&Admin> for AdminContext {
    fn from(admin: &Admin) -> Self {
        Self {
            admin_id: admin.id.clone(),
            email: admin.email.clone(),
            role: admin.role,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAdminData {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
    pub role: AdminRole,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
}
