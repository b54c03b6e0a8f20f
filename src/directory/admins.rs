use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use tracing::info;

use crate::error::AppError;
use crate::identity::IdentityProvider;
use crate::models::admin::{Admin, AdminContext, AdminRole, CreateAdminData, ProfileUpdate};

pub struct SuperAdminSeed {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}

/// Administrator records, keyed by the identity uid they belong to.
pub struct AdminDirectory {
    identity: Arc<dyn IdentityProvider>,
    admins: DashMap<String, Admin>,
}

impl AdminDirectory {
    pub fn new(identity: Arc<dyn IdentityProvider>) -> Self {
        Self {
            identity,
            admins: DashMap::new(),
        }
    }

    pub fn identity(&self) -> &Arc<dyn IdentityProvider> {
        &self.identity
    }

    pub fn len(&self) -> usize {
        self.admins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.admins.is_empty()
    }

    /// Returns `false` when a superadmin with this email is already on file.
    pub async fn initialize_super_admin(&self, seed: &SuperAdminSeed) -> Result<bool, AppError> {
        let email = seed.email.trim().to_lowercase();
        if self.find_by_email(&email).is_some() {
            info!("super admin already exists");
            return Ok(false);
        }

        let uid = match self.identity.create_user(&email, &seed.password).await {
            Ok(uid) => uid,
            Err(AppError::Conflict(_)) => self.identity.verify(&email, &seed.password).await?,
            Err(err) => return Err(err),
        };

        self.admins.insert(
            uid.clone(),
            Admin {
                id: uid.clone(),
                email,
                first_name: seed.first_name.clone(),
                last_name: seed.last_name.clone(),
                role: AdminRole::Superadmin,
                phone: None,
                created_at: Utc::now(),
                created_by: None,
            },
        );

        info!(admin_id = %uid, "super admin created");
        Ok(true)
    }

    /// Resolves a bearer token into the admin performing the request.
    pub async fn authenticate(&self, token: &str) -> Result<AdminContext, AppError> {
        let user = self
            .identity
            .current_user(token)
            .await?
            .ok_or(AppError::Unauthorized)?;

        self.admins
            .get(&user.uid)
            .map(|admin| AdminContext::from(admin.value()))
            .ok_or(AppError::Unauthorized)
    }

    pub fn list_admins(&self) -> Vec<Admin> {
        let mut admins: Vec<Admin> = self
            .admins
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        admins.sort_by_key(|admin| admin.created_at);
        admins
    }

    pub async fn create_admin(
        &self,
        actor: &AdminContext,
        data: CreateAdminData,
    ) -> Result<Admin, AppError> {
        let actor_role = self.admins.get(&actor.admin_id).map(|admin| admin.role);
        if actor_role != Some(AdminRole::Superadmin) {
            return Err(AppError::Forbidden(
                "only the super administrator can create admin accounts".to_string(),
            ));
        }
        require_name(&data.first_name, &data.last_name)?;

        let uid = self.identity.create_user(&data.email, &data.password).await?;
        let admin = Admin {
            id: uid.clone(),
            email: data.email.trim().to_lowercase(),
            first_name: data.first_name,
            last_name: data.last_name,
            role: data.role,
            phone: None,
            created_at: Utc::now(),
            created_by: Some(actor.admin_id.clone()),
        };
        self.admins.insert(uid, admin.clone());

        info!(admin_id = %admin.id, created_by = %actor.admin_id, "admin created");
        Ok(admin)
    }

    pub fn current_admin(&self, actor: &AdminContext) -> Result<Admin, AppError> {
        self.admins
            .get(&actor.admin_id)
            .map(|admin| admin.value().clone())
            .ok_or_else(|| AppError::NotFound(format!("admin {} not found", actor.admin_id)))
    }

    pub async fn update_profile(
        &self,
        actor: &AdminContext,
        update: ProfileUpdate,
    ) -> Result<Admin, AppError> {
        require_name(&update.first_name, &update.last_name)?;
        let current = self.current_admin(actor)?;

        let email = update.email.trim().to_lowercase();
        if email != current.email {
            self.identity.change_email(&actor.admin_id, &email).await?;
        }

        let phone = update.phone.trim();
        let mut admin = self
            .admins
            .get_mut(&actor.admin_id)
            .ok_or_else(|| AppError::NotFound(format!("admin {} not found", actor.admin_id)))?;
        admin.first_name = update.first_name;
        admin.last_name = update.last_name;
        admin.email = email;
        admin.phone = (!phone.is_empty()).then(|| phone.to_string());

        info!(admin_id = %actor.admin_id, "profile updated");
        Ok(admin.clone())
    }

    pub async fn update_password(
        &self,
        actor: &AdminContext,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AppError> {
        self.identity
            .change_password(&actor.admin_id, current_password, new_password)
            .await
    }

    fn find_by_email(&self, email: &str) -> Option<Admin> {
        self.admins
            .iter()
            .find(|entry| entry.email == email)
            .map(|entry| entry.value().clone())
    }
}

fn require_name(first_name: &str, last_name: &str) -> Result<(), AppError> {
    if first_name.trim().is_empty() || last_name.trim().is_empty() {
        return Err(AppError::Validation(
            "first and last name are required".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use argon2::Params;
    use chrono::Duration;

    use super::{AdminDirectory, SuperAdminSeed};
    use crate::error::AppError;
    use crate::identity::local::LocalIdentityProvider;
    use crate::identity::IdentityProvider;
    use crate::models::admin::{AdminContext, AdminRole, CreateAdminData, ProfileUpdate};

    fn directory() -> AdminDirectory {
        let identity = LocalIdentityProvider::with_hash_params(
            Duration::hours(1),
            Params::new(1024, 1, 1, None).unwrap(),
        );
        AdminDirectory::new(Arc::new(identity))
    }

    fn seed() -> SuperAdminSeed {
        SuperAdminSeed {
            email: "root@delivery.sn".to_string(),
            password: "rootpass".to_string(),
            first_name: "Root".to_string(),
            last_name: "Admin".to_string(),
        }
    }

    fn new_admin(email: &str) -> CreateAdminData {
        CreateAdminData {
            email: email.to_string(),
            first_name: "Fatou".to_string(),
            last_name: "Sow".to_string(),
            password: "fatou123".to_string(),
            role: AdminRole::Admin,
        }
    }

    async fn sign_in(directory: &AdminDirectory, email: &str, password: &str) -> AdminContext {
        let session = directory.identity().sign_in(email, password).await.unwrap();
        directory.authenticate(&session.token).await.unwrap()
    }

    #[tokio::test]
    async fn super_admin_bootstrap_is_idempotent() {
        let directory = directory();

        assert!(directory.initialize_super_admin(&seed()).await.unwrap());
        assert!(!directory.initialize_super_admin(&seed()).await.unwrap());
        assert_eq!(directory.len(), 1);
        assert_eq!(directory.list_admins()[0].role, AdminRole::Superadmin);
    }

    #[tokio::test]
    async fn only_superadmin_creates_admins() {
        let directory = directory();
        directory.initialize_super_admin(&seed()).await.unwrap();
        let root = sign_in(&directory, "root@delivery.sn", "rootpass").await;

        let created = directory
            .create_admin(&root, new_admin("fatou@delivery.sn"))
            .await
            .unwrap();
        assert_eq!(created.created_by.as_deref(), Some(root.admin_id.as_str()));

        let fatou = sign_in(&directory, "fatou@delivery.sn", "fatou123").await;
        let err = directory
            .create_admin(&fatou, new_admin("other@delivery.sn"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn profile_update_changes_login_email() {
        let directory = directory();
        directory.initialize_super_admin(&seed()).await.unwrap();
        let root = sign_in(&directory, "root@delivery.sn", "rootpass").await;

        let updated = directory
            .update_profile(
                &root,
                ProfileUpdate {
                    first_name: "Baye".to_string(),
                    last_name: "Niang".to_string(),
                    email: "boss@delivery.sn".to_string(),
                    phone: "+221770001122".to_string(),
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.email, "boss@delivery.sn");
        assert_eq!(updated.phone.as_deref(), Some("+221770001122"));
        assert!(
            directory
                .identity()
                .verify("boss@delivery.sn", "rootpass")
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn unknown_token_is_unauthorized() {
        let directory = directory();
        let err = directory.authenticate("not-a-token").await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized));
    }

    #[tokio::test]
    async fn profile_update_to_a_taken_email_changes_nothing() {
        let directory = directory();
        directory.initialize_super_admin(&seed()).await.unwrap();
        let root = sign_in(&directory, "root@delivery.sn", "rootpass").await;
        directory
            .create_admin(&root, new_admin("fatou@delivery.sn"))
            .await
            .unwrap();

        let err = directory
            .update_profile(
                &root,
                ProfileUpdate {
                    first_name: "Baye".to_string(),
                    last_name: "Niang".to_string(),
                    email: "fatou@delivery.sn".to_string(),
                    phone: "+221770001122".to_string(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let unchanged = directory.current_admin(&root).unwrap();
        assert_eq!(unchanged.email, "root@delivery.sn");
        assert_eq!(unchanged.first_name, "Root");
        assert_eq!(unchanged.phone, None);
    }
}
