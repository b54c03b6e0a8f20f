use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::config::StoreConfig;
use crate::models::delivery::{DeliveryRecord, StoredDelivery};
use crate::store::{DeliveryStore, Partition, StoreError};

/// Process-local document store. Partitions keep insertion order, and
/// relocation runs under a single write lock so a record is never visible in
/// two partitions at once.
pub struct InMemoryStore {
    project_id: String,
    partitions: RwLock<HashMap<Partition, Vec<StoredDelivery>>>,
}

impl InMemoryStore {
    pub fn new(project_id: impl Into<String>) -> Self {
        let partitions = Partition::ALL
            .into_iter()
            .map(|partition| (partition, Vec::new()))
            .collect();

        Self {
            project_id: project_id.into(),
            partitions: RwLock::new(partitions),
        }
    }

    /// Opens the store for a configured project. Blank credentials are
    /// rejected the same way a remote store would reject them.
    pub fn connect(config: &StoreConfig) -> Result<Self, StoreError> {
        if config.project_id.trim().is_empty() {
            return Err(StoreError::Unavailable("store project id is blank".to_string()));
        }
        if config.api_key.trim().is_empty() {
            return Err(StoreError::Unavailable("store api key is blank".to_string()));
        }
        Ok(Self::new(config.project_id.clone()))
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }
}

#[async_trait]
impl DeliveryStore for InMemoryStore {
    async fn read_all(&self, partition: Partition) -> Result<Vec<StoredDelivery>, StoreError> {
        let partitions = self.partitions.read().await;
        Ok(partitions.get(&partition).cloned().unwrap_or_default())
    }

    async fn read_one(
        &self,
        partition: Partition,
        id: &str,
    ) -> Result<Option<DeliveryRecord>, StoreError> {
        let partitions = self.partitions.read().await;
        Ok(partitions.get(&partition).and_then(|docs| {
            docs.iter()
                .find(|doc| doc.id == id)
                .map(|doc| doc.record.clone())
        }))
    }

    async fn insert(
        &self,
        partition: Partition,
        record: DeliveryRecord,
    ) -> Result<String, StoreError> {
        let id = Uuid::new_v4().to_string();
        let mut partitions = self.partitions.write().await;
        partitions.entry(partition).or_default().push(StoredDelivery {
            id: id.clone(),
            record,
        });
        Ok(id)
    }

    async fn delete(&self, partition: Partition, id: &str) -> Result<(), StoreError> {
        let mut partitions = self.partitions.write().await;
        take(&mut partitions, partition, id).map(|_| ())
    }

    async fn relocate(
        &self,
        from: Partition,
        id: &str,
        to: Partition,
        record: DeliveryRecord,
    ) -> Result<String, StoreError> {
        let mut partitions = self.partitions.write().await;
        take(&mut partitions, from, id)?;
        partitions.entry(to).or_default().push(StoredDelivery {
            id: id.to_string(),
            record,
        });
        Ok(id.to_string())
    }

    async fn count(&self, partition: Partition) -> Result<usize, StoreError> {
        let partitions = self.partitions.read().await;
        Ok(partitions.get(&partition).map_or(0, Vec::len))
    }
}

fn take(
    partitions: &mut HashMap<Partition, Vec<StoredDelivery>>,
    partition: Partition,
    id: &str,
) -> Result<StoredDelivery, StoreError> {
    let docs = partitions.entry(partition).or_default();
    let position = docs
        .iter()
        .position(|doc| doc.id == id)
        .ok_or_else(|| StoreError::NotFound {
            partition,
            id: id.to_string(),
        })?;
    Ok(docs.remove(position))
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::InMemoryStore;
    use crate::config::StoreConfig;
    use crate::models::delivery::{DeliveryRecord, DeliveryStatus, NewDeliveryRequest, Person, Sender};
    use crate::store::{DeliveryStore, Partition, StoreError};

    fn record(description: &str) -> DeliveryRecord {
        NewDeliveryRequest {
            pickup_address: "Plateau, Dakar".to_string(),
            delivery_address: "Almadies, Dakar".to_string(),
            package_description: description.to_string(),
            cash_collection: false,
            cash_amount: 0.0,
            is_immediate: true,
            selected_vehicles: vec!["moto".to_string()],
            sender: Sender::default(),
            receiver: Person::default(),
            scheduled_time: String::new(),
        }
        .into_record(Utc::now())
    }

    #[tokio::test]
    async fn read_all_keeps_insertion_order() {
        let store = InMemoryStore::new("test");
        let first = store.insert(Partition::Pending, record("first")).await.unwrap();
        let second = store.insert(Partition::Pending, record("second")).await.unwrap();

        let docs = store.read_all(Partition::Pending).await.unwrap();
        let ids: Vec<&str> = docs.iter().map(|doc| doc.id.as_str()).collect();
        assert_eq!(ids, vec![first.as_str(), second.as_str()]);
        assert!(store.read_all(Partition::Accepted).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_missing_document_is_not_found() {
        let store = InMemoryStore::new("test");
        let err = store.delete(Partition::Pending, "nope").await.unwrap_err();
        assert_eq!(
            err,
            StoreError::NotFound {
                partition: Partition::Pending,
                id: "nope".to_string()
            }
        );
    }

    #[tokio::test]
    async fn relocate_moves_and_keeps_identifier() {
        let store = InMemoryStore::new("test");
        let id = store.insert(Partition::Pending, record("parcel")).await.unwrap();

        let mut moved = record("parcel");
        moved.status = DeliveryStatus::Accepted;
        let new_id = store
            .relocate(Partition::Pending, &id, Partition::Accepted, moved)
            .await
            .unwrap();

        assert_eq!(new_id, id);
        assert_eq!(store.count(Partition::Pending).await.unwrap(), 0);
        let accepted = store.read_one(Partition::Accepted, &id).await.unwrap().unwrap();
        assert_eq!(accepted.status, DeliveryStatus::Accepted);
    }

    #[tokio::test]
    async fn relocate_of_missing_source_writes_nothing() {
        let store = InMemoryStore::new("test");
        let result = store
            .relocate(Partition::Pending, "ghost", Partition::Accepted, record("x"))
            .await;

        assert!(matches!(result, Err(StoreError::NotFound { .. })));
        assert_eq!(store.count(Partition::Accepted).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn relocate_within_one_partition_moves_to_the_end() {
        let store = InMemoryStore::new("test");
        let first = store.insert(Partition::Accepted, record("first")).await.unwrap();
        let second = store.insert(Partition::Accepted, record("second")).await.unwrap();

        let mut updated = record("first, updated");
        updated.status = DeliveryStatus::Accepted;
        store
            .relocate(Partition::Accepted, &first, Partition::Accepted, updated)
            .await
            .unwrap();

        let docs = store.read_all(Partition::Accepted).await.unwrap();
        let ids: Vec<&str> = docs.iter().map(|doc| doc.id.as_str()).collect();
        assert_eq!(ids, vec![second.as_str(), first.as_str()]);
        assert_eq!(docs[1].record.package_description, "first, updated");
    }

    #[test]
    fn connect_requires_credentials() {
        let config = StoreConfig {
            project_id: "delivery-desk".to_string(),
            api_key: "key".to_string(),
        };
        let store = InMemoryStore::connect(&config).unwrap();
        assert_eq!(store.project_id(), "delivery-desk");

        let blank_key = StoreConfig {
            api_key: "  ".to_string(),
            ..config
        };
        assert!(matches!(
            InMemoryStore::connect(&blank_key),
            Err(StoreError::Unavailable(_))
        ));
    }
}
