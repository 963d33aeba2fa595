// src/models/booking.rs
// DOCUMENTATION: Booking, promo code and booking review models
// PURPOSE: Reservation lifecycle structs plus their request/response DTOs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Booking lifecycle states
pub mod booking_status {
    pub const PENDING: &str = "pending";
    pub const CONFIRMED: &str = "confirmed";
    pub const CANCELLED: &str = "cancelled";
    pub const COMPLETED: &str = "completed";

    pub const ALL: &[&str] = &[PENDING, CONFIRMED, CANCELLED, COMPLETED];

    /// Allowed lifecycle transitions
    pub fn can_transition(from: &str, to: &str) -> bool {
        matches!(
            (from, to),
            (PENDING, CONFIRMED)
                | (PENDING, CANCELLED)
                | (CONFIRMED, CANCELLED)
                | (CONFIRMED, COMPLETED)
        )
    }
}

/// Payment states carried on the booking itself
pub mod payment_status {
    pub const PENDING: &str = "pending";
    pub const AUTHORIZED: &str = "authorized";
    pub const PAID: &str = "paid";
    pub const REFUNDED: &str = "refunded";
    pub const FAILED: &str = "failed";
}

/// Promo code that can be applied to a booking
/// DOCUMENTATION: Issued by an owner for a property and a specific tenant
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PromoCode {
    pub id: Uuid,
    pub code: String,
    pub property_id: Uuid,
    pub tenant_id: Uuid,
    pub discount_percentage: f64,
    pub is_active: bool,
    pub expiry_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<Uuid>,
}

impl PromoCode {
    /// A code is usable while active and before its expiry date
    pub fn is_valid(&self) -> bool {
        self.is_active && Utc::now() < self.expiry_date
    }
}

/// Represents a complete booking record from the database
/// DOCUMENTATION: Maps directly to the findam_bookings table
/// All amounts are whole FCFA
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Booking {
    pub id: Uuid,
    pub property_id: Uuid,
    pub tenant_id: Uuid,

    pub check_in_date: NaiveDate,
    pub check_out_date: NaiveDate,
    pub guests_count: i16,

    /// Price breakdown computed at creation time
    pub base_price: i64,
    pub cleaning_fee: i64,
    pub security_deposit: i64,
    pub promo_code_id: Option<Uuid>,
    pub discount_amount: i64,
    pub service_fee: i64,
    pub total_price: i64,

    pub status: String,
    pub payment_status: String,

    pub special_requests: Option<String>,
    pub notes: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub cancelled_by: Option<Uuid>,
}

impl Booking {
    /// Number of nights covered by the stay
    pub fn nights(&self) -> i64 {
        (self.check_out_date - self.check_in_date).num_days()
    }

    pub fn to_response(&self) -> BookingResponse {
        BookingResponse {
            id: self.id,
            property_id: self.property_id,
            tenant_id: self.tenant_id,
            check_in_date: self.check_in_date,
            check_out_date: self.check_out_date,
            nights: self.nights(),
            guests_count: self.guests_count,
            base_price: self.base_price,
            cleaning_fee: self.cleaning_fee,
            security_deposit: self.security_deposit,
            discount_amount: self.discount_amount,
            service_fee: self.service_fee,
            total_price: self.total_price,
            currency: "XAF",
            status: self.status.clone(),
            payment_status: self.payment_status.clone(),
            special_requests: self.special_requests.clone(),
            created_at: self.created_at,
            cancelled_at: self.cancelled_at,
        }
    }
}

/// Review attached 1:1 to a completed booking
/// DOCUMENTATION: is_from_owner distinguishes owner and tenant reviews
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct BookingReview {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub rating: i16,
    pub comment: String,
    pub is_from_owner: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request DTO for POST /bookings/quote and POST /bookings
#[derive(Debug, Deserialize, Validate, Clone)]
pub struct BookingRequest {
    pub property_id: Uuid,
    pub check_in_date: NaiveDate,
    pub check_out_date: NaiveDate,

    #[validate(range(min = 1, max = 50))]
    #[serde(default = "default_guests")]
    pub guests_count: i16,

    /// Optional promo code string
    pub promo_code: Option<String>,

    #[validate(length(max = 2000))]
    pub special_requests: Option<String>,
}

fn default_guests() -> i16 {
    1
}

/// Query parameters for GET /bookings
#[derive(Debug, Deserialize)]
pub struct BookingListQuery {
    pub status: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Request DTO for POST /bookings/{id}/cancel
#[derive(Debug, Deserialize)]
pub struct CancelBookingRequest {
    #[serde(default)]
    pub reason: Option<String>,
}

/// Request DTO for creating a promo code (owner only)
#[derive(Debug, Deserialize, Validate)]
pub struct CreatePromoCodeRequest {
    #[validate(length(min = 3, max = 20))]
    pub code: String,
    pub property_id: Uuid,
    pub tenant_id: Uuid,
    #[validate(range(min = 0.0, max = 100.0))]
    pub discount_percentage: f64,
    pub expiry_date: DateTime<Utc>,
}

/// Request DTO for POST /promo-codes/validate
#[derive(Debug, Deserialize)]
pub struct ValidatePromoCodeRequest {
    pub code: String,
    pub property_id: Uuid,
}

/// Request DTO for POST /bookings/{id}/review
#[derive(Debug, Deserialize, Validate)]
pub struct CreateBookingReviewRequest {
    #[validate(range(min = 1, max = 5))]
    pub rating: i16,
    #[validate(length(min = 1, max = 2000))]
    pub comment: String,
}

/// Booking DTO exposed via the API
#[derive(Debug, Serialize)]
pub struct BookingResponse {
    pub id: Uuid,
    pub property_id: Uuid,
    pub tenant_id: Uuid,
    pub check_in_date: NaiveDate,
    pub check_out_date: NaiveDate,
    pub nights: i64,
    pub guests_count: i16,
    pub base_price: i64,
    pub cleaning_fee: i64,
    pub security_deposit: i64,
    pub discount_amount: i64,
    pub service_fee: i64,
    pub total_price: i64,
    pub currency: &'static str,
    pub status: String,
    pub payment_status: String,
    pub special_requests: Option<String>,
    pub created_at: DateTime<Utc>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

/// Paginated booking list response
#[derive(Debug, Serialize)]
pub struct BookingListResponse {
    pub data: Vec<BookingResponse>,
    pub total_count: i64,
    pub page: i64,
    pub limit: i64,
    pub has_more: bool,
}

/// Refund outcome reported after a cancellation
#[derive(Debug, Serialize)]
pub struct CancellationResponse {
    pub booking_id: Uuid,
    pub status: String,
    pub cancelled_at: DateTime<Utc>,
    pub refund_amount: i64,
    pub refund_percentage: f64,
    pub within_grace_period: bool,
    pub owner_compensation: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_booking_status_transitions() {
        assert!(booking_status::can_transition("pending", "confirmed"));
        assert!(booking_status::can_transition("pending", "cancelled"));
        assert!(booking_status::can_transition("confirmed", "cancelled"));
        assert!(booking_status::can_transition("confirmed", "completed"));

        assert!(!booking_status::can_transition("cancelled", "confirmed"));
        assert!(!booking_status::can_transition("completed", "cancelled"));
        assert!(!booking_status::can_transition("pending", "completed"));
    }

    #[test]
    fn test_promo_code_validity() {
        let mut promo = PromoCode {
            id: Uuid::new_v4(),
            code: "WELCOME10".to_string(),
            property_id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            discount_percentage: 10.0,
            is_active: true,
            expiry_date: Utc::now() + chrono::Duration::days(7),
            created_at: Utc::now(),
            created_by: None,
        };
        assert!(promo.is_valid());

        promo.is_active = false;
        assert!(!promo.is_valid());

        promo.is_active = true;
        promo.expiry_date = Utc::now() - chrono::Duration::hours(1);
        assert!(!promo.is_valid());
    }
}
