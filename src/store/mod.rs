pub mod memory;

use std::fmt::Display;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::delivery::{DeliveryRecord, DeliveryStatus, StoredDelivery};

/// A store-side collection holding records of exactly one status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Partition {
    Pending,
    Accepted,
    Completed,
    Rejected,
    Rescheduled,
}

impl Partition {
    pub const ALL: [Partition; 5] = [
        Partition::Pending,
        Partition::Accepted,
        Partition::Completed,
        Partition::Rejected,
        Partition::Rescheduled,
    ];

    pub fn for_status(status: DeliveryStatus) -> Self {
        match status {
            DeliveryStatus::Pending => Partition::Pending,
            DeliveryStatus::Accepted => Partition::Accepted,
            DeliveryStatus::Completed => Partition::Completed,
            DeliveryStatus::Rejected => Partition::Rejected,
            DeliveryStatus::Rescheduled => Partition::Rescheduled,
        }
    }

    pub fn collection_name(self) -> &'static str {
        match self {
            Partition::Pending => "delivery_requests",
            Partition::Accepted => "accepted_deliveries",
            Partition::Completed => "completed_deliveries",
            Partition::Rejected => "rejected_deliveries",
            Partition::Rescheduled => "rescheduled_deliveries",
        }
    }
}

impl Display for Partition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.collection_name())
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum StoreError {
    #[error("document {id} not found in {partition}")]
    NotFound { partition: Partition, id: String },

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Status-partitioned delivery storage.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DeliveryStore: Send + Sync {
    async fn read_all(&self, partition: Partition) -> Result<Vec<StoredDelivery>, StoreError>;

    async fn read_one(
        &self,
        partition: Partition,
        id: &str,
    ) -> Result<Option<DeliveryRecord>, StoreError>;

    /// Files `record` under a fresh identifier and returns it.
    async fn insert(&self, partition: Partition, record: DeliveryRecord)
        -> Result<String, StoreError>;

    async fn delete(&self, partition: Partition, id: &str) -> Result<(), StoreError>;

    /// Moves document `id` out of `from` and files `record` in `to`, returning
    /// the identifier it ends up under.
    ///
    /// Implementations that can do this atomically must; the provided default
    /// is copy-then-delete and leaves a duplicate if the delete fails.
    ///
    /// When `from == to` the document is replaced and moves to the end of the
    /// partition's read order.
    async fn relocate(
        &self,
        from: Partition,
        id: &str,
        to: Partition,
        record: DeliveryRecord,
    ) -> Result<String, StoreError> {
        relocate_by_copy(self, from, id, to, record).await
    }

    async fn count(&self, partition: Partition) -> Result<usize, StoreError> {
        Ok(self.read_all(partition).await?.len())
    }
}

/// Insert into `to`, then delete from `from`. The delete is never attempted
/// when the insert fails.
pub async fn relocate_by_copy<S>(
    store: &S,
    from: Partition,
    id: &str,
    to: Partition,
    record: DeliveryRecord,
) -> Result<String, StoreError>
where
    S: DeliveryStore + ?Sized,
{
    let new_id = store.insert(to, record).await?;

    if let Err(err) = store.delete(from, id).await {
        tracing::warn!(
            delivery_id = %id,
            new_id = %new_id,
            from = %from,
            to = %to,
            error = %err,
            "relocation left a copy in both partitions"
        );
        return Err(err);
    }

    Ok(new_id)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use mockall::predicate::eq;

    use super::{relocate_by_copy, MockDeliveryStore, Partition, StoreError};
    use crate::models::delivery::{DeliveryStatus, NewDeliveryRequest, Person, Sender};

    fn record() -> crate::models::delivery::DeliveryRecord {
        NewDeliveryRequest {
            pickup_address: "1 Rue A".to_string(),
            delivery_address: "2 Rue B".to_string(),
            package_description: "box".to_string(),
            cash_collection: false,
            cash_amount: 0.0,
            is_immediate: false,
            selected_vehicles: vec!["van".to_string()],
            sender: Sender::default(),
            receiver: Person::default(),
            scheduled_time: String::new(),
        }
        .into_record(Utc::now())
    }

    #[test]
    fn every_status_maps_to_its_own_partition() {
        let statuses = [
            DeliveryStatus::Pending,
            DeliveryStatus::Accepted,
            DeliveryStatus::Completed,
            DeliveryStatus::Rejected,
            DeliveryStatus::Rescheduled,
        ];
        let partitions: Vec<Partition> = statuses.into_iter().map(Partition::for_status).collect();
        assert_eq!(partitions, Partition::ALL.to_vec());
        assert_eq!(Partition::Pending.collection_name(), "delivery_requests");
    }

    #[tokio::test]
    async fn failed_insert_never_deletes_the_source() {
        let mut store = MockDeliveryStore::new();
        store
            .expect_insert()
            .times(1)
            .returning(|_, _| Err(StoreError::Unavailable("write rejected".to_string())));
        store.expect_delete().times(0);

        let result =
            relocate_by_copy(&store, Partition::Pending, "A", Partition::Accepted, record()).await;

        assert_eq!(
            result,
            Err(StoreError::Unavailable("write rejected".to_string()))
        );
    }

    #[tokio::test]
    async fn failed_delete_surfaces_after_insert() {
        let mut store = MockDeliveryStore::new();
        store
            .expect_insert()
            .with(eq(Partition::Accepted), mockall::predicate::always())
            .times(1)
            .returning(|_, _| Ok("new-id".to_string()));
        store
            .expect_delete()
            .withf(|partition, id| *partition == Partition::Pending && id == "A")
            .times(1)
            .returning(|_, _| Err(StoreError::Unavailable("timeout".to_string())));

        let result =
            relocate_by_copy(&store, Partition::Pending, "A", Partition::Accepted, record()).await;

        assert!(matches!(result, Err(StoreError::Unavailable(_))));
    }
}
