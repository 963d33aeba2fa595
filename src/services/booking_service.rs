// src/services/booking_service.rs
// DOCUMENTATION: Business logic for the booking lifecycle
// PURPOSE: Intermediary between handlers and repositories - quotes,
// creation, confirmation, cancellation, completion

use crate::db::{BookingRepository, PaymentRepository, PropertyRepository, UserRepository};
use crate::errors::FindamError;
use crate::models::*;
use crate::services::cancellation;
use crate::services::config_cache::ConfigCache;
use crate::services::pricing::{self, PriceQuote};
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

pub struct BookingService;

impl BookingService {
    /// Price a stay without persisting anything
    /// DOCUMENTATION: Validates the dates, the promo code and the
    /// calendar before computing the quote
    pub async fn quote(
        pool: &PgPool,
        config_cache: &ConfigCache,
        req: &BookingRequest,
    ) -> Result<PriceQuote, FindamError> {
        let property = PropertyRepository::get_by_id(pool, req.property_id).await?;

        if !property.is_published {
            return Err(FindamError::NotFound(format!("Property {}", req.property_id)));
        }

        Self::validate_dates(req)?;

        if req.guests_count > property.capacity {
            return Err(FindamError::ValidationError(format!(
                "Property sleeps {} guests at most",
                property.capacity
            )));
        }

        if PropertyRepository::has_overlap(
            pool,
            req.property_id,
            req.check_in_date,
            req.check_out_date,
        )
        .await?
        {
            return Err(FindamError::BookingConflict(
                "Property is not available on the requested dates".to_string(),
            ));
        }

        let promo_rate = match &req.promo_code {
            Some(code) => Some(Self::resolve_promo_rate(pool, code, &property).await?),
            None => None,
        };

        let discounts = PropertyRepository::get_discounts(pool, property.id).await?;

        let nights = (req.check_out_date - req.check_in_date).num_days();
        let service_fee_rate = config_cache
            .get_f64(
                pool,
                config_keys::TENANT_SERVICE_FEE_PERCENTAGE,
                config_keys::DEFAULT_TENANT_SERVICE_FEE,
            )
            .await?;

        pricing::compute_quote(&property, nights, &discounts, promo_rate, service_fee_rate)
    }

    /// Create a pending booking with its price snapshot
    pub async fn create_booking(
        pool: &PgPool,
        config_cache: &ConfigCache,
        tenant_id: Uuid,
        req: &BookingRequest,
    ) -> Result<BookingResponse, FindamError> {
        let property = PropertyRepository::get_by_id(pool, req.property_id).await?;

        if property.owner_id == tenant_id {
            return Err(FindamError::ValidationError(
                "Owners cannot book their own property".to_string(),
            ));
        }

        let quote = Self::quote(pool, config_cache, req).await?;

        let promo_code_id = match &req.promo_code {
            Some(code) => Some(BookingRepository::get_promo_by_code(pool, code).await?.id),
            None => None,
        };

        let booking =
            BookingRepository::create_booking(pool, tenant_id, req, &quote, promo_code_id).await?;

        log::info!(
            "Booking {} created for property {} ({} XAF)",
            booking.id,
            booking.property_id,
            booking.total_price
        );
        Ok(booking.to_response())
    }

    /// Confirm a pending booking (owner action)
    /// DOCUMENTATION: Blocks the calendar dates and consumes the promo
    /// code
    pub async fn confirm_booking(
        pool: &PgPool,
        owner_id: Uuid,
        booking_id: Uuid,
    ) -> Result<BookingResponse, FindamError> {
        let booking = BookingRepository::get_by_id(pool, booking_id).await?;
        let property = PropertyRepository::get_by_id(pool, booking.property_id).await?;

        if property.owner_id != owner_id {
            return Err(FindamError::Forbidden);
        }

        if !booking_status::can_transition(&booking.status, booking_status::CONFIRMED) {
            return Err(FindamError::BookingConflict(format!(
                "Booking in status '{}' cannot be confirmed",
                booking.status
            )));
        }

        BookingRepository::update_status(pool, booking_id, booking_status::CONFIRMED).await?;

        PropertyRepository::add_unavailability(
            pool,
            booking.property_id,
            booking.check_in_date,
            booking.check_out_date,
            unavailability_type::BOOKING,
            Some(booking.id),
            None,
            None,
            None,
        )
        .await?;

        if let Some(promo_id) = booking.promo_code_id {
            BookingRepository::set_promo_active(pool, promo_id, false).await?;
        }

        let confirmed = BookingRepository::get_by_id(pool, booking_id).await?;
        log::info!("Booking {} confirmed", booking_id);
        Ok(confirmed.to_response())
    }

    /// Cancel a booking, applying the property's cancellation policy
    pub async fn cancel_booking(
        pool: &PgPool,
        config_cache: &ConfigCache,
        actor_id: Uuid,
        booking_id: Uuid,
        reason: Option<&str>,
    ) -> Result<CancellationResponse, FindamError> {
        let booking = BookingRepository::get_by_id(pool, booking_id).await?;
        let property = PropertyRepository::get_by_id(pool, booking.property_id).await?;

        if booking.tenant_id != actor_id && property.owner_id != actor_id {
            return Err(FindamError::Forbidden);
        }

        if booking.status == booking_status::CANCELLED
            || booking.status == booking_status::COMPLETED
        {
            return Err(FindamError::BookingConflict(
                "Booking is already finished or cancelled".to_string(),
            ));
        }

        let today = Utc::now().date_naive();
        if booking.check_in_date < today {
            return Err(FindamError::BookingConflict(
                "Bookings cannot be cancelled after check-in".to_string(),
            ));
        }

        let cancelled_at = Utc::now();

        // Refund computation
        let grace_minutes = config_cache
            .get_i64(
                pool,
                config_keys::CANCELLATION_GRACE_PERIOD_MINUTES,
                config_keys::DEFAULT_GRACE_PERIOD_MINUTES,
            )
            .await?;
        let within_grace =
            cancellation::is_within_grace_period(booking.created_at, cancelled_at, grace_minutes);

        let policy = cancellation::policy_for(&property.cancellation_policy);
        let rate = cancellation::refund_rate(policy, booking.check_in_date, today, within_grace);
        let refund_amount = cancellation::refund_amount(&booking, rate);

        let subscription = UserRepository::get_active_subscription(pool, property.owner_id).await?;
        let owner_rate =
            pricing::owner_commission_rate(subscription.as_ref().map(|s| s.subscription_type.as_str()));
        let compensation = if booking.payment_status == payment_status::PAID {
            cancellation::owner_compensation(booking.base_price, rate, owner_rate)
        } else {
            0
        };

        // Cancel, with the reason recorded in the booking notes
        let note = match (reason, within_grace) {
            (Some(reason), true) => Some(format!(
                "Annulation: {} (période de grâce de {} minutes)",
                reason, grace_minutes
            )),
            (Some(reason), false) => Some(format!("Annulation: {}", reason)),
            (None, true) => Some(format!(
                "Annulation pendant la période de grâce ({} minutes)",
                grace_minutes
            )),
            (None, false) => None,
        };
        BookingRepository::mark_cancelled(
            pool,
            booking_id,
            actor_id,
            cancelled_at,
            note.as_deref(),
        )
        .await?;

        // Free the calendar
        PropertyRepository::release_booking_dates(pool, booking.property_id, booking.id).await?;

        // Give the promo code back
        if let Some(promo_id) = booking.promo_code_id {
            BookingRepository::set_promo_active(pool, promo_id, true).await?;
        }

        // Ledger entries for the refund and the owner compensation
        if refund_amount > 0 {
            PaymentRepository::create_transaction(
                pool,
                booking.tenant_id,
                transaction_type::REFUND,
                transaction_status::PENDING,
                refund_amount,
                Some(booking.id),
                None,
                None,
                &format!("Remboursement annulation réservation {}", booking.id),
            )
            .await?;
            BookingRepository::update_payment_status(pool, booking.id, payment_status::REFUNDED)
                .await?;
        }

        if compensation > 0 {
            PaymentRepository::create_payout(
                pool,
                property.owner_id,
                compensation,
                None,
                Some(booking.check_in_date),
                Some(booking.check_out_date),
                Some(&format!(
                    "Compensation suite à l'annulation de la réservation {}",
                    booking.id
                )),
                &[booking.id],
            )
            .await?;
        }

        log::info!(
            "Booking {} cancelled (refund {} XAF, compensation {} XAF)",
            booking_id,
            refund_amount,
            compensation
        );

        Ok(CancellationResponse {
            booking_id,
            status: booking_status::CANCELLED.to_string(),
            cancelled_at,
            refund_amount,
            refund_percentage: rate * 100.0,
            within_grace_period: within_grace,
            owner_compensation: compensation,
        })
    }

    /// Mark a confirmed stay as completed
    pub async fn complete_booking(
        pool: &PgPool,
        actor_id: Uuid,
        booking_id: Uuid,
    ) -> Result<BookingResponse, FindamError> {
        let booking = BookingRepository::get_by_id(pool, booking_id).await?;
        let property = PropertyRepository::get_by_id(pool, booking.property_id).await?;

        if property.owner_id != actor_id {
            return Err(FindamError::Forbidden);
        }

        if !booking_status::can_transition(&booking.status, booking_status::COMPLETED) {
            return Err(FindamError::BookingConflict(format!(
                "Booking in status '{}' cannot be completed",
                booking.status
            )));
        }

        BookingRepository::update_status(pool, booking_id, booking_status::COMPLETED).await?;

        let completed = BookingRepository::get_by_id(pool, booking_id).await?;
        Ok(completed.to_response())
    }

    /// Attach a review to a booking and fold the rating into the
    /// relevant average
    pub async fn review_booking(
        pool: &PgPool,
        reviewer_id: Uuid,
        booking_id: Uuid,
        req: &CreateBookingReviewRequest,
    ) -> Result<BookingReview, FindamError> {
        let booking = BookingRepository::get_by_id(pool, booking_id).await?;
        let property = PropertyRepository::get_by_id(pool, booking.property_id).await?;

        let is_from_owner = if reviewer_id == property.owner_id {
            true
        } else if reviewer_id == booking.tenant_id {
            false
        } else {
            return Err(FindamError::Forbidden);
        };

        if booking.status != booking_status::COMPLETED {
            return Err(FindamError::BookingConflict(
                "Only completed stays can be reviewed".to_string(),
            ));
        }

        let review = BookingRepository::create_booking_review(
            pool,
            booking_id,
            req.rating,
            &req.comment,
            is_from_owner,
        )
        .await?;

        // Guest reviews rate the property, owner reviews rate the tenant
        if is_from_owner {
            UserRepository::update_profile_rating(pool, booking.tenant_id, req.rating).await?;
        } else {
            PropertyRepository::update_rating(pool, booking.property_id, req.rating).await?;
            UserRepository::update_profile_rating(pool, property.owner_id, req.rating).await?;
        }

        Ok(review)
    }

    fn validate_dates(req: &BookingRequest) -> Result<(), FindamError> {
        if req.check_out_date <= req.check_in_date {
            return Err(FindamError::ValidationError(
                "Check-out date must be after check-in date".to_string(),
            ));
        }

        if req.check_in_date < Utc::now().date_naive() {
            return Err(FindamError::ValidationError(
                "Check-in date cannot be in the past".to_string(),
            ));
        }

        Ok(())
    }

    /// Validate a promo code against a property and return its rate
    async fn resolve_promo_rate(
        pool: &PgPool,
        code: &str,
        property: &Property,
    ) -> Result<f64, FindamError> {
        let promo = BookingRepository::get_promo_by_code(pool, code).await?;

        if promo.property_id != property.id {
            return Err(FindamError::InvalidInput(format!(
                "Promo code '{}' is not valid for this property",
                code
            )));
        }

        if !promo.is_valid() {
            return Err(FindamError::InvalidInput(format!(
                "Promo code '{}' is expired or already used",
                code
            )));
        }

        Ok(promo.discount_percentage)
    }
}
