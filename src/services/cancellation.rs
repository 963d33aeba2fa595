// src/services/cancellation.rs
// DOCUMENTATION: Cancellation policies and refund computation
// PURPOSE: Decide refund and owner compensation amounts when a booking
// is cancelled

use crate::models::Booking;
use crate::services::pricing::apply_rate;
use chrono::{DateTime, Duration, NaiveDate, Utc};

/// Refund windows of a cancellation policy, in days before check-in
#[derive(Debug, Clone, Copy)]
pub struct CancellationPolicy {
    /// Full refund when cancelling at least this many days before arrival
    pub full_refund_days: i64,
    /// Partial refund when cancelling at least this many days before
    pub partial_refund_days: i64,
    /// Fraction refunded inside the partial window
    pub partial_rate: f64,
}

/// Policy table for the three levels offered to owners
pub fn policy_for(name: &str) -> CancellationPolicy {
    match name {
        "flexible" => CancellationPolicy {
            full_refund_days: 1,
            partial_refund_days: 0,
            partial_rate: 0.5,
        },
        "strict" => CancellationPolicy {
            full_refund_days: 14,
            partial_refund_days: 7,
            partial_rate: 0.5,
        },
        // "moderate" is also the fallback for unknown values
        _ => CancellationPolicy {
            full_refund_days: 5,
            partial_refund_days: 0,
            partial_rate: 0.5,
        },
    }
}

/// Whether a cancellation happens inside the post-booking grace period
pub fn is_within_grace_period(
    booking_created_at: DateTime<Utc>,
    cancelled_at: DateTime<Utc>,
    grace_minutes: i64,
) -> bool {
    cancelled_at <= booking_created_at + Duration::minutes(grace_minutes)
}

/// Fraction of the refundable amount returned to the tenant
pub fn refund_rate(
    policy: CancellationPolicy,
    check_in_date: NaiveDate,
    today: NaiveDate,
    within_grace: bool,
) -> f64 {
    if within_grace {
        return 1.0;
    }

    let days_until_checkin = (check_in_date - today).num_days();

    if days_until_checkin >= policy.full_refund_days {
        1.0
    } else if days_until_checkin >= policy.partial_refund_days {
        policy.partial_rate
    } else {
        0.0
    }
}

/// Amount returned to the tenant
/// DOCUMENTATION: Base price and cleaning fee are refundable, the
/// service fee never is; the security deposit is handled at checkout
pub fn refund_amount(booking: &Booking, rate: f64) -> i64 {
    if booking.payment_status != "paid" {
        return 0;
    }
    let refundable = booking.base_price + booking.cleaning_fee;
    apply_rate(refundable, rate * 100.0)
}

/// Compensation kept by the owner when the refund is partial
/// The owner receives the non-refunded share of the base price, minus
/// the platform commission on that share
pub fn owner_compensation(base_price: i64, rate: f64, owner_commission_rate: f64) -> i64 {
    if rate >= 1.0 {
        return 0;
    }

    let kept_share = apply_rate(base_price, (1.0 - rate) * 100.0);
    let commission = apply_rate(kept_share, owner_commission_rate);
    kept_share - commission
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use uuid::Uuid;

    fn paid_booking(base: i64, cleaning: i64) -> Booking {
        let now = Utc::now();
        Booking {
            id: Uuid::new_v4(),
            property_id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            check_in_date: NaiveDate::from_ymd_opt(2025, 7, 10).unwrap(),
            check_out_date: NaiveDate::from_ymd_opt(2025, 7, 15).unwrap(),
            guests_count: 2,
            base_price: base,
            cleaning_fee: cleaning,
            security_deposit: 50_000,
            promo_code_id: None,
            discount_amount: 0,
            service_fee: 7_000,
            total_price: base + cleaning + 50_000 + 7_000,
            status: "confirmed".to_string(),
            payment_status: "paid".to_string(),
            special_requests: None,
            notes: None,
            created_at: now,
            updated_at: now,
            cancelled_at: None,
            cancelled_by: None,
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_flexible_policy_windows() {
        let policy = policy_for("flexible");
        let check_in = date(2025, 7, 10);

        // 3 days ahead: full refund
        assert_eq!(refund_rate(policy, check_in, date(2025, 7, 7), false), 1.0);
        // Same day: partial
        assert_eq!(refund_rate(policy, check_in, date(2025, 7, 10), false), 0.5);
    }

    #[test]
    fn test_moderate_policy_windows() {
        let policy = policy_for("moderate");
        let check_in = date(2025, 7, 10);

        assert_eq!(refund_rate(policy, check_in, date(2025, 7, 4), false), 1.0);
        assert_eq!(refund_rate(policy, check_in, date(2025, 7, 8), false), 0.5);
    }

    #[test]
    fn test_strict_policy_windows() {
        let policy = policy_for("strict");
        let check_in = date(2025, 7, 20);

        // 15 days ahead: full refund
        assert_eq!(refund_rate(policy, check_in, date(2025, 7, 5), false), 1.0);
        // 10 days ahead: inside the 7-14 partial window
        assert_eq!(refund_rate(policy, check_in, date(2025, 7, 10), false), 0.5);
        // 3 days ahead: nothing
        assert_eq!(refund_rate(policy, check_in, date(2025, 7, 17), false), 0.0);
    }

    #[test]
    fn test_unknown_policy_falls_back_to_moderate() {
        let policy = policy_for("whatever");
        assert_eq!(policy.full_refund_days, 5);
    }

    #[test]
    fn test_grace_period_forces_full_refund() {
        let policy = policy_for("strict");
        let check_in = date(2025, 7, 20);

        assert_eq!(refund_rate(policy, check_in, date(2025, 7, 19), true), 1.0);
    }

    #[test]
    fn test_grace_period_window() {
        let created = Utc::now();
        assert!(is_within_grace_period(
            created,
            created + Duration::minutes(20),
            30
        ));
        assert!(!is_within_grace_period(
            created,
            created + Duration::minutes(45),
            30
        ));
    }

    #[test]
    fn test_refund_amount_excludes_service_fee() {
        let booking = paid_booking(100_000, 5_000);
        // Full refund covers base + cleaning only
        assert_eq!(refund_amount(&booking, 1.0), 105_000);
        assert_eq!(refund_amount(&booking, 0.5), 52_500);
    }

    #[test]
    fn test_unpaid_booking_refunds_nothing() {
        let mut booking = paid_booking(100_000, 5_000);
        booking.payment_status = "pending".to_string();
        assert_eq!(refund_amount(&booking, 1.0), 0);
    }

    #[test]
    fn test_owner_compensation() {
        // Half kept on 100 000 = 50 000, minus 3% commission = 48 500
        assert_eq!(owner_compensation(100_000, 0.5, 3.0), 48_500);
        // Full refund leaves nothing for the owner
        assert_eq!(owner_compensation(100_000, 1.0, 3.0), 0);
        // No refund: owner keeps everything minus commission
        assert_eq!(owner_compensation(100_000, 0.0, 3.0), 97_000);
    }
}
