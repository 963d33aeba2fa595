// src/models/system.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Global key/value configuration row
/// DOCUMENTATION: Behavioural knobs editable at runtime by admins
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SystemConfiguration {
    pub key: String,
    pub value: String,
    pub description: Option<String>,
    pub last_updated: DateTime<Utc>,
}

/// Well-known configuration keys and their defaults
pub mod config_keys {
    /// Minutes after creation during which a cancellation is fully refunded
    pub const CANCELLATION_GRACE_PERIOD_MINUTES: &str = "CANCELLATION_GRACE_PERIOD_MINUTES";
    pub const DEFAULT_GRACE_PERIOD_MINUTES: i64 = 30;

    /// Guest-side service fee percentage applied on bookings
    pub const TENANT_SERVICE_FEE_PERCENTAGE: &str = "TENANT_SERVICE_FEE_PERCENTAGE";
    pub const DEFAULT_TENANT_SERVICE_FEE: f64 = 7.0;

    /// Owner-side commission percentage for owners without a subscription
    pub const OWNER_COMMISSION_PERCENTAGE: &str = "OWNER_COMMISSION_PERCENTAGE";
    pub const DEFAULT_OWNER_COMMISSION: f64 = 3.0;
}

/// Request DTO for PUT /admin/configs/{key}
#[derive(Debug, Deserialize)]
pub struct SetConfigRequest {
    pub value: String,
    pub description: Option<String>,
}
