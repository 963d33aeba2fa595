// src/db/booking_repository.rs
// DOCUMENTATION: Database access layer - bookings, promo codes and
// booking reviews

use crate::errors::FindamError;
use crate::models::*;
use crate::services::pricing::PriceQuote;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

pub struct BookingRepository;

impl BookingRepository {
    /// Persist a booking with its computed price breakdown
    pub async fn create_booking(
        pool: &PgPool,
        tenant_id: Uuid,
        req: &BookingRequest,
        quote: &PriceQuote,
        promo_code_id: Option<Uuid>,
    ) -> Result<Booking, FindamError> {
        sqlx::query_as::<_, Booking>(
            r#"
            INSERT INTO findam_bookings (
                id, property_id, tenant_id,
                check_in_date, check_out_date, guests_count,
                base_price, cleaning_fee, security_deposit,
                promo_code_id, discount_amount, service_fee, total_price,
                status, payment_status, special_requests,
                created_at, updated_at
            )
            VALUES (
                $1, $2, $3,
                $4, $5, $6,
                $7, $8, $9,
                $10, $11, $12, $13,
                'pending', 'pending', $14,
                NOW(), NOW()
            )
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(req.property_id)
        .bind(tenant_id)
        .bind(req.check_in_date)
        .bind(req.check_out_date)
        .bind(req.guests_count)
        .bind(quote.base_price)
        .bind(quote.cleaning_fee)
        .bind(quote.security_deposit)
        .bind(promo_code_id)
        .bind(quote.discount_amount)
        .bind(quote.service_fee)
        .bind(quote.total_price)
        .bind(&req.special_requests)
        .fetch_one(pool)
        .await
        .map_err(|e| {
            log::error!("Failed to create booking: {}", e);
            FindamError::DatabaseError(e.to_string())
        })
    }

    /// Retrieve booking by ID
    pub async fn get_by_id(pool: &PgPool, id: Uuid) -> Result<Booking, FindamError> {
        sqlx::query_as::<_, Booking>("SELECT * FROM findam_bookings WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(|e| {
                log::error!("Database error fetching booking: {}", e);
                FindamError::DatabaseError(e.to_string())
            })?
            .ok_or_else(|| {
                log::warn!("Booking not found: {}", id);
                FindamError::NotFound(format!("Booking {}", id))
            })
    }

    /// Bookings made by a tenant, newest first
    pub async fn list_for_tenant(
        pool: &PgPool,
        tenant_id: Uuid,
        query: &BookingListQuery,
    ) -> Result<(Vec<Booking>, i64), FindamError> {
        Self::list_filtered(pool, "tenant_id", tenant_id, query).await
    }

    /// Bookings on any property of an owner, newest first
    pub async fn list_for_owner(
        pool: &PgPool,
        owner_id: Uuid,
        query: &BookingListQuery,
    ) -> Result<(Vec<Booking>, i64), FindamError> {
        let limit = query.limit.unwrap_or(20).min(100);
        let page = query.page.unwrap_or(1).max(1);
        let offset = (page - 1) * limit;

        let mut where_clauses = vec!["p.owner_id = $1".to_string()];
        if let Some(status) = &query.status {
            where_clauses.push(format!("b.status = '{}'", status.replace('\'', "''")));
        }
        let where_clause = format!("WHERE {}", where_clauses.join(" AND "));

        let count_sql = format!(
            "SELECT COUNT(*) FROM findam_bookings b \
             JOIN findam_properties p ON p.id = b.property_id {}",
            where_clause
        );
        let count: (i64,) = sqlx::query_as(&count_sql)
            .bind(owner_id)
            .fetch_one(pool)
            .await
            .map_err(|e| {
                log::error!("Booking count error: {}", e);
                FindamError::DatabaseError(e.to_string())
            })?;

        let sql = format!(
            "SELECT b.* FROM findam_bookings b \
             JOIN findam_properties p ON p.id = b.property_id {} \
             ORDER BY b.created_at DESC LIMIT {} OFFSET {}",
            where_clause, limit, offset
        );

        let bookings = sqlx::query_as::<_, Booking>(&sql)
            .bind(owner_id)
            .fetch_all(pool)
            .await
            .map_err(|e| {
                log::error!("Booking list error: {}", e);
                FindamError::DatabaseError(e.to_string())
            })?;

        Ok((bookings, count.0))
    }

    async fn list_filtered(
        pool: &PgPool,
        column: &str,
        user_id: Uuid,
        query: &BookingListQuery,
    ) -> Result<(Vec<Booking>, i64), FindamError> {
        let limit = query.limit.unwrap_or(20).min(100);
        let page = query.page.unwrap_or(1).max(1);
        let offset = (page - 1) * limit;

        let mut where_clauses = vec![format!("{} = $1", column)];
        if let Some(status) = &query.status {
            where_clauses.push(format!("status = '{}'", status.replace('\'', "''")));
        }
        let where_clause = format!("WHERE {}", where_clauses.join(" AND "));

        let count_sql = format!("SELECT COUNT(*) FROM findam_bookings {}", where_clause);
        let count: (i64,) = sqlx::query_as(&count_sql)
            .bind(user_id)
            .fetch_one(pool)
            .await
            .map_err(|e| {
                log::error!("Booking count error: {}", e);
                FindamError::DatabaseError(e.to_string())
            })?;

        let sql = format!(
            "SELECT * FROM findam_bookings {} ORDER BY created_at DESC LIMIT {} OFFSET {}",
            where_clause, limit, offset
        );

        let bookings = sqlx::query_as::<_, Booking>(&sql)
            .bind(user_id)
            .fetch_all(pool)
            .await
            .map_err(|e| {
                log::error!("Booking list error: {}", e);
                FindamError::DatabaseError(e.to_string())
            })?;

        Ok((bookings, count.0))
    }

    /// Move a booking to a new lifecycle status
    pub async fn update_status(pool: &PgPool, id: Uuid, status: &str) -> Result<(), FindamError> {
        sqlx::query("UPDATE findam_bookings SET status = $1, updated_at = NOW() WHERE id = $2")
            .bind(status)
            .bind(id)
            .execute(pool)
            .await
            .map_err(|e| {
                log::error!("Failed to update booking {} status: {}", id, e);
                FindamError::DatabaseError(e.to_string())
            })?;
        Ok(())
    }

    /// Update the payment state carried on the booking
    pub async fn update_payment_status(
        pool: &PgPool,
        id: Uuid,
        payment_status: &str,
    ) -> Result<(), FindamError> {
        sqlx::query(
            "UPDATE findam_bookings SET payment_status = $1, updated_at = NOW() WHERE id = $2",
        )
        .bind(payment_status)
        .bind(id)
        .execute(pool)
        .await
        .map_err(|e| {
            log::error!("Failed to update booking {} payment status: {}", id, e);
            FindamError::DatabaseError(e.to_string())
        })?;
        Ok(())
    }

    /// Mark a booking cancelled with the actor and an optional note
    pub async fn mark_cancelled(
        pool: &PgPool,
        id: Uuid,
        cancelled_by: Uuid,
        cancelled_at: DateTime<Utc>,
        note: Option<&str>,
    ) -> Result<(), FindamError> {
        sqlx::query(
            r#"
            UPDATE findam_bookings
            SET status = 'cancelled',
                cancelled_at = $1,
                cancelled_by = $2,
                notes = CASE
                    WHEN $3::text IS NULL THEN notes
                    WHEN notes IS NULL OR notes = '' THEN $3
                    ELSE notes || E'\n' || $3
                END,
                updated_at = NOW()
            WHERE id = $4
            "#,
        )
        .bind(cancelled_at)
        .bind(cancelled_by)
        .bind(note)
        .bind(id)
        .execute(pool)
        .await
        .map_err(|e| {
            log::error!("Failed to cancel booking {}: {}", id, e);
            FindamError::DatabaseError(e.to_string())
        })?;
        Ok(())
    }

    /// Create a promo code for a property and tenant
    pub async fn create_promo_code(
        pool: &PgPool,
        created_by: Uuid,
        req: &CreatePromoCodeRequest,
    ) -> Result<PromoCode, FindamError> {
        sqlx::query_as::<_, PromoCode>(
            r#"
            INSERT INTO findam_promo_codes (
                id, code, property_id, tenant_id, discount_percentage,
                is_active, expiry_date, created_at, created_by
            )
            VALUES ($1, $2, $3, $4, $5, true, $6, NOW(), $7)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&req.code)
        .bind(req.property_id)
        .bind(req.tenant_id)
        .bind(req.discount_percentage)
        .bind(req.expiry_date)
        .bind(created_by)
        .fetch_one(pool)
        .await
        .map_err(|e| {
            if let Some(db_err) = e.as_database_error() {
                if db_err.code().as_deref() == Some("23505") {
                    return FindamError::AlreadyExists(format!("Promo code '{}'", req.code));
                }
            }
            log::error!("Failed to create promo code: {}", e);
            FindamError::DatabaseError(e.to_string())
        })
    }

    /// Look up a promo code by id
    pub async fn get_promo_by_id(pool: &PgPool, promo_id: Uuid) -> Result<PromoCode, FindamError> {
        sqlx::query_as::<_, PromoCode>("SELECT * FROM findam_promo_codes WHERE id = $1")
            .bind(promo_id)
            .fetch_optional(pool)
            .await
            .map_err(|e| {
                log::error!("Database error fetching promo code: {}", e);
                FindamError::DatabaseError(e.to_string())
            })?
            .ok_or_else(|| FindamError::NotFound(format!("Promo code {}", promo_id)))
    }

    /// Look up a promo code by its string
    pub async fn get_promo_by_code(pool: &PgPool, code: &str) -> Result<PromoCode, FindamError> {
        sqlx::query_as::<_, PromoCode>("SELECT * FROM findam_promo_codes WHERE code = $1")
            .bind(code)
            .fetch_optional(pool)
            .await
            .map_err(|e| {
                log::error!("Database error fetching promo code: {}", e);
                FindamError::DatabaseError(e.to_string())
            })?
            .ok_or_else(|| FindamError::NotFound(format!("Promo code '{}'", code)))
    }

    /// Promo codes issued for the properties of an owner
    pub async fn list_promo_codes_for_owner(
        pool: &PgPool,
        owner_id: Uuid,
    ) -> Result<Vec<PromoCode>, FindamError> {
        sqlx::query_as::<_, PromoCode>(
            r#"
            SELECT pc.* FROM findam_promo_codes pc
            JOIN findam_properties p ON p.id = pc.property_id
            WHERE p.owner_id = $1
            ORDER BY pc.created_at DESC
            "#,
        )
        .bind(owner_id)
        .fetch_all(pool)
        .await
        .map_err(|e| {
            log::error!("Failed to list promo codes for {}: {}", owner_id, e);
            FindamError::DatabaseError(e.to_string())
        })
    }

    /// Activate or deactivate a promo code
    /// DOCUMENTATION: Codes are consumed on booking confirmation and
    /// reactivated when that booking is cancelled
    pub async fn set_promo_active(
        pool: &PgPool,
        promo_id: Uuid,
        active: bool,
    ) -> Result<(), FindamError> {
        sqlx::query("UPDATE findam_promo_codes SET is_active = $1 WHERE id = $2")
            .bind(active)
            .bind(promo_id)
            .execute(pool)
            .await
            .map_err(|e| {
                log::error!("Failed to toggle promo code {}: {}", promo_id, e);
                FindamError::DatabaseError(e.to_string())
            })?;
        Ok(())
    }

    /// Attach a review to a booking (one per side)
    pub async fn create_booking_review(
        pool: &PgPool,
        booking_id: Uuid,
        rating: i16,
        comment: &str,
        is_from_owner: bool,
    ) -> Result<BookingReview, FindamError> {
        sqlx::query_as::<_, BookingReview>(
            r#"
            INSERT INTO findam_booking_reviews (
                id, booking_id, rating, comment, is_from_owner, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, NOW(), NOW())
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(booking_id)
        .bind(rating)
        .bind(comment)
        .bind(is_from_owner)
        .fetch_one(pool)
        .await
        .map_err(|e| {
            if let Some(db_err) = e.as_database_error() {
                if db_err.code().as_deref() == Some("23505") {
                    return FindamError::AlreadyExists(format!(
                        "Review for booking {} already submitted",
                        booking_id
                    ));
                }
            }
            log::error!("Failed to create booking review: {}", e);
            FindamError::DatabaseError(e.to_string())
        })
    }

    /// Reviews on a booking (tenant and owner sides)
    pub async fn get_booking_reviews(
        pool: &PgPool,
        booking_id: Uuid,
    ) -> Result<Vec<BookingReview>, FindamError> {
        sqlx::query_as::<_, BookingReview>(
            "SELECT * FROM findam_booking_reviews WHERE booking_id = $1 ORDER BY created_at ASC",
        )
        .bind(booking_id)
        .fetch_all(pool)
        .await
        .map_err(|e| {
            log::error!("Failed to fetch reviews for booking {}: {}", booking_id, e);
            FindamError::DatabaseError(e.to_string())
        })
    }

    /// Count of bookings grouped by status (admin statistics)
    pub async fn count_by_status(pool: &PgPool) -> Result<Vec<(String, i64)>, FindamError> {
        sqlx::query_as::<_, (String, i64)>(
            "SELECT status, COUNT(*) FROM findam_bookings GROUP BY status ORDER BY status",
        )
        .fetch_all(pool)
        .await
        .map_err(|e| {
            log::error!("Failed to count bookings by status: {}", e);
            FindamError::DatabaseError(e.to_string())
        })
    }

    /// Confirmed bookings that ended before a given date, not yet paid out
    pub async fn list_payable_for_owner(
        pool: &PgPool,
        owner_id: Uuid,
        before: NaiveDate,
    ) -> Result<Vec<Booking>, FindamError> {
        sqlx::query_as::<_, Booking>(
            r#"
            SELECT b.* FROM findam_bookings b
            JOIN findam_properties p ON p.id = b.property_id
            WHERE p.owner_id = $1
              AND b.status IN ('confirmed', 'completed')
              AND b.payment_status = 'paid'
              AND b.check_out_date <= $2
              AND NOT EXISTS (
                  SELECT 1 FROM findam_payout_bookings pb WHERE pb.booking_id = b.id
              )
            ORDER BY b.check_out_date ASC
            "#,
        )
        .bind(owner_id)
        .bind(before)
        .fetch_all(pool)
        .await
        .map_err(|e| {
            log::error!("Failed to list payable bookings for {}: {}", owner_id, e);
            FindamError::DatabaseError(e.to_string())
        })
    }
}
