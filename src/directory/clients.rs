use chrono::Utc;
use dashmap::DashMap;
use tracing::info;
use uuid::Uuid;

use crate::error::AppError;
use crate::identity::validate_email;
use crate::models::client::{Client, NewClient};

#[derive(Default)]
pub struct ClientDirectory {
    clients: DashMap<String, Client>,
}

impl ClientDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    /// Newest clients first.
    pub fn list_clients(&self) -> Vec<Client> {
        let mut clients: Vec<Client> = self
            .clients
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        clients.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        clients
    }

    pub fn get_client(&self, id: &str) -> Result<Client, AppError> {
        self.clients
            .get(id)
            .map(|client| client.value().clone())
            .ok_or_else(|| AppError::NotFound(format!("client {id} not found")))
    }

    pub fn register_client(&self, new_client: NewClient) -> Result<Client, AppError> {
        validate_email(new_client.email.trim())?;
        if new_client.company.name.trim().is_empty() {
            return Err(AppError::Validation("company name is required".to_string()));
        }

        let client = Client {
            id: Uuid::new_v4().to_string(),
            email: new_client.email.trim().to_lowercase(),
            company: new_client.company,
            created_at: Utc::now(),
        };
        self.clients.insert(client.id.clone(), client.clone());

        info!(client_id = %client.id, "client registered");
        Ok(client)
    }
}

#[cfg(test)]
mod tests {
    use super::ClientDirectory;
    use crate::error::AppError;
    use crate::models::client::{Company, NewClient};

    fn new_client(name: &str) -> NewClient {
        NewClient {
            email: "contact@shop.sn".to_string(),
            company: Company {
                name: name.to_string(),
                industry: "retail".to_string(),
                ..Company::default()
            },
        }
    }

    #[test]
    fn registered_client_can_be_fetched() {
        let clients = ClientDirectory::new();
        let client = clients.register_client(new_client("Shop SN")).unwrap();

        let fetched = clients.get_client(&client.id).unwrap();
        assert_eq!(fetched.company.name, "Shop SN");
        assert_eq!(clients.list_clients().len(), 1);
    }

    #[test]
    fn blank_company_name_is_rejected() {
        let clients = ClientDirectory::new();
        let err = clients.register_client(new_client("  ")).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(clients.is_empty());
    }

    #[test]
    fn unknown_client_is_not_found() {
        let clients = ClientDirectory::new();
        assert!(matches!(
            clients.get_client("nobody"),
            Err(AppError::NotFound(_))
        ));
    }
}
