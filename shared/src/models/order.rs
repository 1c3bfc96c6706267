//! Order Model
//!
//! The order aggregate as it arrives on the ingestion stream and as it is
//! served by the lookup API. Field names follow the inbound JSON document.

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Delivery recipient (1:1 with the order)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
#[serde(default)]
pub struct Delivery {
    pub name: String,
    pub phone: String,
    pub zip: String,
    pub city: String,
    pub address: String,
    pub region: String,
    pub email: String,
}

/// Payment record (1:1 with the order)
///
/// Amounts are integer minor units as sent by the upstream producer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
#[serde(default)]
pub struct Payment {
    pub transaction: String,
    pub request_id: String,
    pub currency: String,
    pub provider: String,
    pub amount: i64,
    /// Unix seconds
    pub payment_dt: i64,
    pub bank: String,
    pub delivery_cost: i64,
    pub goods_total: i64,
    pub custom_fee: i64,
}

/// Order line item
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
#[serde(default)]
pub struct Item {
    /// Catalog id
    pub chrt_id: i64,
    pub track_number: String,
    pub price: i64,
    /// Row id
    pub rid: String,
    pub name: String,
    /// Discount percent
    pub sale: i64,
    pub size: String,
    pub total_price: i64,
    /// Model id
    pub nm_id: i64,
    pub brand: String,
    pub status: i64,
}

/// Order aggregate root, identified by `order_uid`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
#[serde(default)]
pub struct Order {
    pub order_uid: String,
    pub track_number: String,
    pub entry: String,
    #[cfg_attr(feature = "db", sqlx(flatten))]
    pub delivery: Delivery,
    #[cfg_attr(feature = "db", sqlx(flatten))]
    pub payment: Payment,
    #[cfg_attr(feature = "db", sqlx(skip))]
    pub items: Vec<Item>,
    pub locale: String,
    pub internal_signature: String,
    pub customer_id: String,
    pub delivery_service: String,
    #[serde(rename = "shardkey")]
    #[cfg_attr(feature = "db", sqlx(rename = "shardkey"))]
    pub shard_key: String,
    pub sm_id: i64,
    /// `None` is the zero value and fails validation
    pub date_created: Option<DateTime<Utc>>,
    pub oof_shard: String,
}

/// Reasons an inbound order is rejected before it reaches storage
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("empty order_uid")]
    EmptyOrderUid,

    #[error("empty track_number")]
    EmptyTrackNumber,

    #[error("empty date_created")]
    EmptyDateCreated,
}

impl Order {
    /// Check the mandatory fields of an inbound order
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.order_uid.is_empty() {
            return Err(ValidationError::EmptyOrderUid);
        }
        if self.track_number.is_empty() {
            return Err(ValidationError::EmptyTrackNumber);
        }
        match self.date_created {
            Some(ts) if !is_zero_timestamp(&ts) => Ok(()),
            _ => Err(ValidationError::EmptyDateCreated),
        }
    }
}

/// Producers that serialize an unset timestamp emit `0001-01-01T00:00:00Z`.
fn is_zero_timestamp(ts: &DateTime<Utc>) -> bool {
    ts.year() <= 1
}
