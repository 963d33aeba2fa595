// src/services/payout_service.rs
// DOCUMENTATION: Owner payout processing
// PURPOSE: Sweep due payouts to completion and build payouts for
// finished stays

use crate::db::{BookingRepository, PaymentRepository, UserRepository};
use crate::errors::FindamError;
use crate::models::*;
use chrono::Utc;
use sqlx::PgPool;
use std::time::Duration;
use uuid::Uuid;

pub struct PayoutService;

impl PayoutService {
    /// Build a payout covering an owner's finished, paid, not yet
    /// paid-out bookings (net of the platform commission)
    pub async fn build_payout_for_owner(
        pool: &PgPool,
        owner_id: Uuid,
    ) -> Result<Option<Payout>, FindamError> {
        let today = Utc::now().date_naive();
        let bookings = BookingRepository::list_payable_for_owner(pool, owner_id, today).await?;

        if bookings.is_empty() {
            return Ok(None);
        }

        let mut total: i64 = 0;
        let mut booking_ids = Vec::with_capacity(bookings.len());
        let mut period_start = bookings[0].check_in_date;
        let mut period_end = bookings[0].check_out_date;

        for booking in &bookings {
            let commission = match PaymentRepository::get_commission(pool, booking.id).await? {
                Some(commission) => commission.owner_amount,
                // Commission not computed yet: fall back to the default rate
                None => crate::services::pricing::apply_rate(booking.base_price, 3.0),
            };

            // The deposit is returned to the tenant at checkout and the
            // service fee stays with the platform
            let owner_share =
                booking.base_price + booking.cleaning_fee - commission;
            total += owner_share;
            booking_ids.push(booking.id);
            period_start = period_start.min(booking.check_in_date);
            period_end = period_end.max(booking.check_out_date);
        }

        let payout = PaymentRepository::create_payout(
            pool,
            owner_id,
            total,
            None,
            Some(period_start),
            Some(period_end),
            Some(&format!(
                "Versement pour {} réservation(s) terminée(s)",
                booking_ids.len()
            )),
            &booking_ids,
        )
        .await?;

        Ok(Some(payout))
    }

    /// Move due pending payouts to completed and write ledger entries
    /// Returns the number of payouts processed
    pub async fn process_due_payouts(pool: &PgPool) -> Result<u32, FindamError> {
        let due = PaymentRepository::list_due_payouts(pool).await?;
        let mut processed = 0;

        for payout in due {
            PaymentRepository::update_payout_status(pool, payout.id, transaction_status::PROCESSING)
                .await?;

            // Disbursement happens outside the gateway; completing the
            // payout here records it in the ledger
            PaymentRepository::update_payout_status(pool, payout.id, transaction_status::COMPLETED)
                .await?;

            PaymentRepository::create_transaction(
                pool,
                payout.owner_id,
                transaction_type::PAYOUT,
                transaction_status::COMPLETED,
                payout.amount,
                None,
                None,
                None,
                &format!(
                    "Versement {} ({} XAF)",
                    payout.id, payout.amount
                ),
            )
            .await?;

            processed += 1;
        }

        if processed > 0 {
            log::info!("Processed {} due payout(s)", processed);
        }

        Ok(processed)
    }

    /// Subscription payment shortcut: opens the plan and records the
    /// ledger entry
    pub async fn subscribe_owner(
        pool: &PgPool,
        owner_id: Uuid,
        subscription_type: &str,
    ) -> Result<OwnerSubscription, FindamError> {
        if !crate::models::subscription_type::is_valid(subscription_type) {
            return Err(FindamError::InvalidInput(format!(
                "Unknown subscription type '{}'",
                subscription_type
            )));
        }

        let duration = crate::models::subscription_type::duration_days(subscription_type);
        let subscription =
            UserRepository::create_subscription(pool, owner_id, subscription_type, duration)
                .await?;

        let price = crate::models::subscription_type::plan_price(subscription_type);
        if price > 0 {
            PaymentRepository::create_transaction(
                pool,
                owner_id,
                transaction_type::SUBSCRIPTION,
                transaction_status::PENDING,
                price,
                None,
                None,
                subscription.payment_reference.as_deref(),
                &format!("Abonnement propriétaire '{}'", subscription_type),
            )
            .await?;
        }

        Ok(subscription)
    }
}

/// Start the background payout processing task
/// DOCUMENTATION: Periodically completes payouts whose period has closed
pub fn start_payout_processor(pool: PgPool, interval_seconds: u64) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(interval_seconds));

        loop {
            interval.tick().await;
            if let Err(e) = PayoutService::process_due_payouts(&pool).await {
                log::error!("Payout processing failed: {}", e);
            }
        }
    });
}
