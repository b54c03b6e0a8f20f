use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{error, info, warn};

use crate::error::AppError;
use crate::models::delivery::{DeliveryRecord, DeliveryStatus, NewDeliveryRequest, StoredDelivery};
use crate::observability::metrics::Metrics;
use crate::store::{DeliveryStore, Partition};

/// Partitions a transition may pull a record from, in search order.
pub const SEARCH_ORDER: [Partition; 3] = [
    Partition::Rescheduled,
    Partition::Accepted,
    Partition::Pending,
];

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionOptions {
    #[serde(default)]
    pub schedule_time: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
}

impl TransitionOptions {
    pub fn schedule(time: impl Into<String>) -> Self {
        Self {
            schedule_time: Some(time.into()),
            reason: None,
        }
    }

    pub fn reason(reason: impl Into<String>) -> Self {
        Self {
            schedule_time: None,
            reason: Some(reason.into()),
        }
    }

    fn schedule_time(&self) -> Option<&str> {
        non_blank(self.schedule_time.as_deref())
    }

    fn reason_text(&self) -> Option<&str> {
        non_blank(self.reason.as_deref())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

/// Published after every successful relocation so dashboards know which
/// partitions to re-read.
#[derive(Debug, Clone, Serialize)]
pub struct TransitionEvent {
    pub delivery_id: String,
    pub from: Partition,
    pub to: Partition,
    pub status: DeliveryStatus,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BulkFailure {
    pub id: String,
    pub kind: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct BulkReport {
    pub succeeded: Vec<String>,
    pub failed: Vec<BulkFailure>,
}

pub struct LifecycleManager {
    store: Arc<dyn DeliveryStore>,
    events_tx: broadcast::Sender<TransitionEvent>,
    metrics: Metrics,
}

impl LifecycleManager {
    pub fn new(
        store: Arc<dyn DeliveryStore>,
        events_tx: broadcast::Sender<TransitionEvent>,
        metrics: Metrics,
    ) -> Self {
        Self {
            store,
            events_tx,
            metrics,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TransitionEvent> {
        self.events_tx.subscribe()
    }

    pub async fn list(&self, partition: Partition) -> Result<Vec<StoredDelivery>, AppError> {
        Ok(self.store.read_all(partition).await?)
    }

    pub async fn count(&self, partition: Partition) -> Result<usize, AppError> {
        Ok(self.store.count(partition).await?)
    }

    /// Files a new request in the pending partition.
    pub async fn submit(&self, request: NewDeliveryRequest) -> Result<StoredDelivery, AppError> {
        if request.pickup_address.trim().is_empty() || request.delivery_address.trim().is_empty() {
            return Err(AppError::Validation(
                "pickup and delivery addresses are required".to_string(),
            ));
        }
        if request.cash_amount < 0.0 {
            return Err(AppError::Validation(
                "cash amount cannot be negative".to_string(),
            ));
        }

        let record = request.into_record(Utc::now());
        let id = self.store.insert(Partition::Pending, record.clone()).await?;

        self.metrics
            .deliveries_in_partition
            .with_label_values(&[Partition::Pending.collection_name()])
            .inc();
        info!(delivery_id = %id, "delivery request received");

        Ok(StoredDelivery { id, record })
    }

    /// Finds `id` in the first searchable partition that holds it. Completed
    /// and rejected records are never returned.
    pub async fn locate(&self, id: &str) -> Result<(DeliveryRecord, Partition), AppError> {
        for partition in SEARCH_ORDER {
            if let Some(record) = self.store.read_one(partition, id).await? {
                return Ok((record, partition));
            }
        }

        Err(AppError::NotFound(format!("delivery {id} not found")))
    }

    pub async fn transition(
        &self,
        id: &str,
        target: DeliveryStatus,
        options: &TransitionOptions,
    ) -> Result<StoredDelivery, AppError> {
        let start = Instant::now();
        let result = self.relocate(id, target, options).await;
        let outcome = if result.is_ok() { "success" } else { "error" };

        self.metrics
            .transition_latency_seconds
            .with_label_values(&[outcome])
            .observe(start.elapsed().as_secs_f64());
        self.metrics
            .transitions_total
            .with_label_values(&[&target.to_string(), outcome])
            .inc();

        if let Err(err) = &result {
            warn!(delivery_id = %id, to_status = %target, error = %err, "transition failed");
        }

        result
    }

    /// Runs the same transition for every distinct id concurrently. Moves that
    /// succeed stay in place even when others fail.
    pub async fn bulk_transition(
        &self,
        ids: &[String],
        target: DeliveryStatus,
        options: &TransitionOptions,
    ) -> Result<Vec<StoredDelivery>, AppError> {
        validate(target, options)?;

        let mut seen = HashSet::new();
        let unique: Vec<&String> = ids.iter().filter(|id| seen.insert(id.as_str())).collect();

        let outcomes = join_all(unique.into_iter().map(|id| async move {
            (id.clone(), self.transition(id, target, options).await)
        }))
        .await;

        let mut moved = Vec::new();
        let mut report = BulkReport {
            succeeded: Vec::new(),
            failed: Vec::new(),
        };

        for (id, outcome) in outcomes {
            match outcome {
                Ok(delivery) => {
                    report.succeeded.push(id);
                    moved.push(delivery);
                }
                Err(err) => report.failed.push(BulkFailure {
                    id,
                    kind: err.kind(),
                }),
            }
        }

        if report.failed.is_empty() {
            Ok(moved)
        } else {
            error!(
                to_status = %target,
                succeeded = report.succeeded.len(),
                failed = report.failed.len(),
                "bulk transition partially failed"
            );
            Err(AppError::PartialBulkFailure(report))
        }
    }

    async fn relocate(
        &self,
        id: &str,
        target: DeliveryStatus,
        options: &TransitionOptions,
    ) -> Result<StoredDelivery, AppError> {
        validate(target, options)?;

        let (record, from) = self.locate(id).await?;
        let to = Partition::for_status(target);
        let derived = derive(record, target, options, Utc::now());

        let new_id = self.store.relocate(from, id, to, derived.clone()).await?;

        self.metrics.partition_moved(from, to);
        let _ = self.events_tx.send(TransitionEvent {
            delivery_id: new_id.clone(),
            from,
            to,
            status: target,
            at: Utc::now(),
        });

        info!(delivery_id = %id, new_id = %new_id, from = %from, to = %to, "delivery relocated");

        Ok(StoredDelivery {
            id: new_id,
            record: derived,
        })
    }
}

pub fn validate(target: DeliveryStatus, options: &TransitionOptions) -> Result<(), AppError> {
    match target {
        DeliveryStatus::Pending => Err(AppError::Validation(
            "deliveries cannot be moved back to pending".to_string(),
        )),
        DeliveryStatus::Rejected if options.reason_text().is_none() => Err(AppError::Validation(
            "a rejection reason is required".to_string(),
        )),
        DeliveryStatus::Rescheduled if options.schedule_time().is_none() => Err(
            AppError::Validation("a new schedule time is required".to_string()),
        ),
        _ => Ok(()),
    }
}

/// Copy of `record` carrying the new status and the stamps that go with it.
pub fn derive(
    record: DeliveryRecord,
    target: DeliveryStatus,
    options: &TransitionOptions,
    now: DateTime<Utc>,
) -> DeliveryRecord {
    let mut derived = record;
    derived.status = target;

    if let Some(time) = options.schedule_time() {
        derived.scheduled_time = time.to_string();
    }

    match target {
        DeliveryStatus::Completed => derived.completed_at = Some(now),
        DeliveryStatus::Rejected => {
            derived.rejected_at = Some(now);
            derived.rejection_reason = options.reason_text().map(str::to_string);
        }
        DeliveryStatus::Rescheduled => {
            derived.rescheduled_at = Some(now);
            derived.rescheduled_time = options.schedule_time().map(str::to_string);
        }
        DeliveryStatus::Pending | DeliveryStatus::Accepted => {}
    }

    derived
}
