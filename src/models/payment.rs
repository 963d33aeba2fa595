// src/models/payment.rs
// DOCUMENTATION: Payment methods, transactions, payouts and commissions
// PURPOSE: Financial models mapping to the findam_* payment tables

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Internal payment/transaction states
/// DOCUMENTATION: Shared vocabulary between gateway attempts and the ledger
pub mod transaction_status {
    pub const PENDING: &str = "pending";
    pub const PROCESSING: &str = "processing";
    pub const COMPLETED: &str = "completed";
    pub const FAILED: &str = "failed";
    pub const REFUNDED: &str = "refunded";
    pub const CANCELLED: &str = "cancelled";
}

/// Ledger transaction types
pub mod transaction_type {
    pub const PAYMENT: &str = "payment";
    pub const REFUND: &str = "refund";
    pub const PAYOUT: &str = "payout";
    pub const SUBSCRIPTION: &str = "subscription";
    pub const COMMISSION: &str = "commission";
    pub const ADJUSTMENT: &str = "adjustment";
}

/// Kinds of stored payment methods
pub mod payment_method_type {
    pub const MOBILE_MONEY: &str = "mobile_money";
    pub const CREDIT_CARD: &str = "credit_card";
    pub const BANK_ACCOUNT: &str = "bank_account";

    pub const ALL: &[&str] = &[MOBILE_MONEY, CREDIT_CARD, BANK_ACCOUNT];

    pub fn is_valid(value: &str) -> bool {
        ALL.contains(&value)
    }
}

/// Payment method registered by a user
/// DOCUMENTATION: At most one default method per user
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PaymentMethod {
    pub id: Uuid,
    pub user_id: Uuid,
    pub payment_type: String,
    pub is_default: bool,
    pub is_verified: bool,
    pub nickname: Option<String>,
    /// Mobile Money fields
    pub phone_number: Option<String>,
    pub operator: Option<String>,
    /// Card fields (only masked digits are stored)
    pub last_digits: Option<String>,
    /// Bank fields
    pub bank_name: Option<String>,
    pub account_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Gateway payment attempt tied to a booking
/// DOCUMENTATION: Stores the raw NotchPay response for later reconciliation
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PaymentTransaction {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub amount: i64,
    pub payment_method: String,
    pub status: String,
    /// Our reference sent to the gateway (findam-xxxxxxxx-ts)
    pub reference: String,
    /// Gateway-side reference (trx.xxx), filled after initialization
    pub gateway_reference: Option<String>,
    pub gateway_response: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Ledger entry for every financial movement on the platform
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Transaction {
    pub id: Uuid,
    pub user_id: Uuid,
    pub transaction_type: String,
    pub status: String,
    pub amount: i64,
    pub currency: String,
    pub booking_id: Option<Uuid>,
    pub payment_transaction_id: Option<Uuid>,
    pub external_reference: Option<String>,
    pub description: String,
    pub admin_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
}

/// Platform commission split for a booking
/// DOCUMENTATION: Owner side depends on the subscription tier, tenant
/// side is the booking service fee
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Commission {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub owner_amount: i64,
    pub tenant_amount: i64,
    pub total_amount: i64,
    pub owner_rate: f64,
    pub tenant_rate: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payout owed to an owner for one or more bookings
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Payout {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub amount: i64,
    pub currency: String,
    pub payment_method_id: Option<Uuid>,
    pub status: String,
    pub period_start: Option<NaiveDate>,
    pub period_end: Option<NaiveDate>,
    pub notes: Option<String>,
    pub admin_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
}

/// Request DTO for POST /payments/init
#[derive(Debug, Deserialize, Validate)]
pub struct InitPaymentRequest {
    pub booking_id: Uuid,

    /// Mobile Money operator: orange, mtn or mobile_money
    pub operator: Option<String>,

    /// Phone number charged for the Mobile Money payment
    #[validate(length(min = 9, max = 15))]
    pub phone_number: String,
}

/// Response DTO after a payment has been initialized
#[derive(Debug, Serialize)]
pub struct InitPaymentResponse {
    pub payment_transaction_id: Uuid,
    pub reference: String,
    pub gateway_reference: Option<String>,
    pub authorization_url: Option<String>,
    pub status: String,
    pub amount: i64,
    pub currency: &'static str,
}

/// Request DTO for registering a payment method
#[derive(Debug, Deserialize, Validate)]
pub struct CreatePaymentMethodRequest {
    pub payment_type: String,
    #[validate(length(max = 100))]
    pub nickname: Option<String>,
    pub phone_number: Option<String>,
    pub operator: Option<String>,
    #[validate(length(min = 4, max = 4))]
    pub last_digits: Option<String>,
    pub bank_name: Option<String>,
    pub account_name: Option<String>,
    #[serde(default)]
    pub is_default: bool,
}

/// Query parameters for transaction listings
#[derive(Debug, Deserialize)]
pub struct TransactionListQuery {
    pub transaction_type: Option<String>,
    pub status: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}
