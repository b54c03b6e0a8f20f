use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    Pending,
    Accepted,
    Completed,
    Rejected,
    Rescheduled,
}

impl Display for DeliveryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status = match self {
            DeliveryStatus::Pending => "pending",
            DeliveryStatus::Accepted => "accepted",
            DeliveryStatus::Completed => "completed",
            DeliveryStatus::Rejected => "rejected",
            DeliveryStatus::Rescheduled => "rescheduled",
        };
        write!(f, "{}", status)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    pub first_name: String,
    pub last_name: String,
    pub is_company: bool,
    #[serde(default)]
    pub company_name: String,
    pub phone: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Sender {
    #[serde(flatten)]
    pub person: Person,
    #[serde(default)]
    pub special_instructions: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryRecord {
    pub pickup_address: String,
    pub delivery_address: String,
    pub package_description: String,
    pub cash_collection: bool,
    #[serde(default)]
    pub cash_amount: f64,
    #[serde(default)]
    pub is_immediate: bool,
    #[serde(default)]
    pub selected_vehicles: Vec<String>,
    pub sender: Sender,
    pub receiver: Person,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub scheduled_time: String,
    pub status: DeliveryStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejected_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rescheduled_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rescheduled_time: Option<String>,
}

/// A record together with the identifier the store filed it under.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredDelivery {
    pub id: String,
    #[serde(flatten)]
    pub record: DeliveryRecord,
}

/// Intake payload for a new delivery request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDeliveryRequest {
    pub pickup_address: String,
    pub delivery_address: String,
    pub package_description: String,
    #[serde(default)]
    pub cash_collection: bool,
    #[serde(default)]
    pub cash_amount: f64,
    #[serde(default)]
    pub is_immediate: bool,
    #[serde(default)]
    pub selected_vehicles: Vec<String>,
    pub sender: Sender,
    pub receiver: Person,
    #[serde(default)]
    pub scheduled_time: String,
}

impl NewDeliveryRequest {
    pub fn into_record(self, created_at: DateTime<Utc>) -> DeliveryRecord {
        DeliveryRecord {
            pickup_address: self.pickup_address,
            delivery_address: self.delivery_address,
            package_description: self.package_description,
            cash_collection: self.cash_collection,
            cash_amount: self.cash_amount,
            is_immediate: self.is_immediate,
            selected_vehicles: self.selected_vehicles,
            sender: self.sender,
            receiver: self.receiver,
            created_at,
            scheduled_time: self.scheduled_time,
            status: DeliveryStatus::Pending,
            completed_at: None,
            rejected_at: None,
            rejection_reason: None,
            rescheduled_at: None,
            rescheduled_time: None,
        }
    }
}
