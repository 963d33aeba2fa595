// src/db/payment_repository.rs
// DOCUMENTATION: Database access layer - payment methods, gateway
// transactions, ledger, commissions and payouts

use crate::errors::FindamError;
use crate::models::*;
use chrono::NaiveDate;
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

pub struct PaymentRepository;

impl PaymentRepository {
    /// Register a payment method for a user
    /// DOCUMENTATION: Setting is_default demotes every other method of
    /// the same user
    pub async fn create_payment_method(
        pool: &PgPool,
        user_id: Uuid,
        req: &CreatePaymentMethodRequest,
    ) -> Result<PaymentMethod, FindamError> {
        if req.is_default {
            sqlx::query("UPDATE findam_payment_methods SET is_default = false WHERE user_id = $1")
                .bind(user_id)
                .execute(pool)
                .await
                .map_err(|e| {
                    log::error!("Failed to demote default methods for {}: {}", user_id, e);
                    FindamError::DatabaseError(e.to_string())
                })?;
        }

        sqlx::query_as::<_, PaymentMethod>(
            r#"
            INSERT INTO findam_payment_methods (
                id, user_id, payment_type, is_default, is_verified,
                nickname, phone_number, operator, last_digits,
                bank_name, account_name, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, false, $5, $6, $7, $8, $9, $10, NOW(), NOW())
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(&req.payment_type)
        .bind(req.is_default)
        .bind(&req.nickname)
        .bind(&req.phone_number)
        .bind(&req.operator)
        .bind(&req.last_digits)
        .bind(&req.bank_name)
        .bind(&req.account_name)
        .fetch_one(pool)
        .await
        .map_err(|e| {
            log::error!("Failed to create payment method: {}", e);
            FindamError::DatabaseError(e.to_string())
        })
    }

    /// Payment methods of a user, default first
    pub async fn list_payment_methods(
        pool: &PgPool,
        user_id: Uuid,
    ) -> Result<Vec<PaymentMethod>, FindamError> {
        sqlx::query_as::<_, PaymentMethod>(
            r#"
            SELECT * FROM findam_payment_methods
            WHERE user_id = $1
            ORDER BY is_default DESC, created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
        .map_err(|e| {
            log::error!("Failed to list payment methods for {}: {}", user_id, e);
            FindamError::DatabaseError(e.to_string())
        })
    }

    /// Promote a method to default, demoting the user's others
    pub async fn set_default_payment_method(
        pool: &PgPool,
        user_id: Uuid,
        method_id: Uuid,
    ) -> Result<PaymentMethod, FindamError> {
        let mut tx = pool.begin().await.map_err(|e| {
            log::error!("Failed to open transaction: {}", e);
            FindamError::DatabaseError(e.to_string())
        })?;

        sqlx::query("UPDATE findam_payment_methods SET is_default = false WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                log::error!("Failed to demote default methods for {}: {}", user_id, e);
                FindamError::DatabaseError(e.to_string())
            })?;

        let method = sqlx::query_as::<_, PaymentMethod>(
            r#"
            UPDATE findam_payment_methods
            SET is_default = true, updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING *
            "#,
        )
        .bind(method_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| {
            log::error!("Failed to promote payment method {}: {}", method_id, e);
            FindamError::DatabaseError(e.to_string())
        })?
        .ok_or_else(|| FindamError::NotFound(format!("Payment method {}", method_id)))?;

        tx.commit().await.map_err(|e| {
            log::error!("Failed to commit default switch: {}", e);
            FindamError::DatabaseError(e.to_string())
        })?;

        Ok(method)
    }

    /// Delete a payment method owned by the user
    pub async fn delete_payment_method(
        pool: &PgPool,
        user_id: Uuid,
        method_id: Uuid,
    ) -> Result<(), FindamError> {
        let rows = sqlx::query(
            "DELETE FROM findam_payment_methods WHERE id = $1 AND user_id = $2",
        )
        .bind(method_id)
        .bind(user_id)
        .execute(pool)
        .await
        .map_err(|e| {
            log::error!("Failed to delete payment method {}: {}", method_id, e);
            FindamError::DatabaseError(e.to_string())
        })?
        .rows_affected();

        if rows == 0 {
            return Err(FindamError::NotFound(format!("Payment method {}", method_id)));
        }

        Ok(())
    }

    /// Record a gateway payment attempt for a booking
    pub async fn create_payment_transaction(
        pool: &PgPool,
        booking_id: Uuid,
        amount: i64,
        payment_method: &str,
        reference: &str,
    ) -> Result<PaymentTransaction, FindamError> {
        sqlx::query_as::<_, PaymentTransaction>(
            r#"
            INSERT INTO findam_payment_transactions (
                id, booking_id, amount, payment_method, status,
                reference, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, 'pending', $5, NOW(), NOW())
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(booking_id)
        .bind(amount)
        .bind(payment_method)
        .bind(reference)
        .fetch_one(pool)
        .await
        .map_err(|e| {
            log::error!("Failed to create payment transaction: {}", e);
            FindamError::DatabaseError(e.to_string())
        })
    }

    /// Find a gateway attempt by our reference or the gateway's
    pub async fn get_payment_transaction_by_reference(
        pool: &PgPool,
        reference: &str,
    ) -> Result<PaymentTransaction, FindamError> {
        sqlx::query_as::<_, PaymentTransaction>(
            r#"
            SELECT * FROM findam_payment_transactions
            WHERE reference = $1 OR gateway_reference = $1
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(reference)
        .fetch_optional(pool)
        .await
        .map_err(|e| {
            log::error!("Database error fetching payment transaction: {}", e);
            FindamError::DatabaseError(e.to_string())
        })?
        .ok_or_else(|| FindamError::NotFound(format!("Payment transaction '{}'", reference)))
    }

    /// Store the gateway response and references after initialization
    pub async fn attach_gateway_response(
        pool: &PgPool,
        id: Uuid,
        gateway_reference: Option<&str>,
        response: &Value,
    ) -> Result<(), FindamError> {
        sqlx::query(
            r#"
            UPDATE findam_payment_transactions
            SET gateway_reference = COALESCE($1, gateway_reference),
                gateway_response = $2,
                updated_at = NOW()
            WHERE id = $3
            "#,
        )
        .bind(gateway_reference)
        .bind(response)
        .bind(id)
        .execute(pool)
        .await
        .map_err(|e| {
            log::error!("Failed to attach gateway response to {}: {}", id, e);
            FindamError::DatabaseError(e.to_string())
        })?;
        Ok(())
    }

    /// Update the status of a gateway attempt
    pub async fn update_payment_transaction_status(
        pool: &PgPool,
        id: Uuid,
        status: &str,
    ) -> Result<(), FindamError> {
        sqlx::query(
            "UPDATE findam_payment_transactions SET status = $1, updated_at = NOW() WHERE id = $2",
        )
        .bind(status)
        .bind(id)
        .execute(pool)
        .await
        .map_err(|e| {
            log::error!("Failed to update payment transaction {}: {}", id, e);
            FindamError::DatabaseError(e.to_string())
        })?;
        Ok(())
    }

    /// Append an entry to the financial ledger
    pub async fn create_transaction(
        pool: &PgPool,
        user_id: Uuid,
        transaction_type: &str,
        status: &str,
        amount: i64,
        booking_id: Option<Uuid>,
        payment_transaction_id: Option<Uuid>,
        external_reference: Option<&str>,
        description: &str,
    ) -> Result<Transaction, FindamError> {
        sqlx::query_as::<_, Transaction>(
            r#"
            INSERT INTO findam_transactions (
                id, user_id, transaction_type, status, amount, currency,
                booking_id, payment_transaction_id, external_reference,
                description, created_at, updated_at,
                processed_at
            )
            VALUES (
                $1, $2, $3, $4, $5, 'XAF',
                $6, $7, $8,
                $9, NOW(), NOW(),
                CASE WHEN $4 = 'completed' THEN NOW() ELSE NULL END
            )
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(transaction_type)
        .bind(status)
        .bind(amount)
        .bind(booking_id)
        .bind(payment_transaction_id)
        .bind(external_reference)
        .bind(description)
        .fetch_one(pool)
        .await
        .map_err(|e| {
            log::error!("Failed to create ledger transaction: {}", e);
            FindamError::DatabaseError(e.to_string())
        })
    }

    /// Ledger entries of a user, newest first
    pub async fn list_transactions(
        pool: &PgPool,
        user_id: Uuid,
        query: &TransactionListQuery,
    ) -> Result<Vec<Transaction>, FindamError> {
        let limit = query.limit.unwrap_or(20).min(100);
        let page = query.page.unwrap_or(1).max(1);
        let offset = (page - 1) * limit;

        let mut where_clauses = vec!["user_id = $1".to_string()];
        if let Some(t) = &query.transaction_type {
            where_clauses.push(format!("transaction_type = '{}'", t.replace('\'', "''")));
        }
        if let Some(s) = &query.status {
            where_clauses.push(format!("status = '{}'", s.replace('\'', "''")));
        }

        let sql = format!(
            "SELECT * FROM findam_transactions WHERE {} ORDER BY created_at DESC LIMIT {} OFFSET {}",
            where_clauses.join(" AND "),
            limit,
            offset
        );

        sqlx::query_as::<_, Transaction>(&sql)
            .bind(user_id)
            .fetch_all(pool)
            .await
            .map_err(|e| {
                log::error!("Failed to list transactions for {}: {}", user_id, e);
                FindamError::DatabaseError(e.to_string())
            })
    }

    /// Create or refresh the commission split for a booking
    pub async fn upsert_commission(
        pool: &PgPool,
        booking_id: Uuid,
        owner_amount: i64,
        tenant_amount: i64,
        owner_rate: f64,
        tenant_rate: f64,
    ) -> Result<Commission, FindamError> {
        sqlx::query_as::<_, Commission>(
            r#"
            INSERT INTO findam_commissions (
                id, booking_id, owner_amount, tenant_amount, total_amount,
                owner_rate, tenant_rate, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $3 + $4, $5, $6, NOW(), NOW())
            ON CONFLICT (booking_id) DO UPDATE
            SET owner_amount = EXCLUDED.owner_amount,
                tenant_amount = EXCLUDED.tenant_amount,
                total_amount = EXCLUDED.total_amount,
                owner_rate = EXCLUDED.owner_rate,
                tenant_rate = EXCLUDED.tenant_rate,
                updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(booking_id)
        .bind(owner_amount)
        .bind(tenant_amount)
        .bind(owner_rate)
        .bind(tenant_rate)
        .fetch_one(pool)
        .await
        .map_err(|e| {
            log::error!("Failed to upsert commission for {}: {}", booking_id, e);
            FindamError::DatabaseError(e.to_string())
        })
    }

    /// Commission attached to a booking, if computed
    pub async fn get_commission(
        pool: &PgPool,
        booking_id: Uuid,
    ) -> Result<Option<Commission>, FindamError> {
        sqlx::query_as::<_, Commission>(
            "SELECT * FROM findam_commissions WHERE booking_id = $1",
        )
        .bind(booking_id)
        .fetch_optional(pool)
        .await
        .map_err(|e| {
            log::error!("Failed to fetch commission for {}: {}", booking_id, e);
            FindamError::DatabaseError(e.to_string())
        })
    }

    /// All commissions, newest first (admin)
    pub async fn list_commissions(pool: &PgPool) -> Result<Vec<Commission>, FindamError> {
        sqlx::query_as::<_, Commission>(
            "SELECT * FROM findam_commissions ORDER BY created_at DESC LIMIT 200",
        )
        .fetch_all(pool)
        .await
        .map_err(|e| {
            log::error!("Failed to list commissions: {}", e);
            FindamError::DatabaseError(e.to_string())
        })
    }

    /// Create a payout for an owner and link the covered bookings
    pub async fn create_payout(
        pool: &PgPool,
        owner_id: Uuid,
        amount: i64,
        payment_method_id: Option<Uuid>,
        period_start: Option<NaiveDate>,
        period_end: Option<NaiveDate>,
        notes: Option<&str>,
        booking_ids: &[Uuid],
    ) -> Result<Payout, FindamError> {
        let mut tx = pool.begin().await.map_err(|e| {
            log::error!("Failed to open transaction: {}", e);
            FindamError::DatabaseError(e.to_string())
        })?;

        let payout = sqlx::query_as::<_, Payout>(
            r#"
            INSERT INTO findam_payouts (
                id, owner_id, amount, currency, payment_method_id, status,
                period_start, period_end, notes, created_at, updated_at
            )
            VALUES ($1, $2, $3, 'XAF', $4, 'pending', $5, $6, $7, NOW(), NOW())
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(owner_id)
        .bind(amount)
        .bind(payment_method_id)
        .bind(period_start)
        .bind(period_end)
        .bind(notes)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            log::error!("Failed to create payout for {}: {}", owner_id, e);
            FindamError::DatabaseError(e.to_string())
        })?;

        for booking_id in booking_ids {
            sqlx::query(
                "INSERT INTO findam_payout_bookings (payout_id, booking_id) VALUES ($1, $2)",
            )
            .bind(payout.id)
            .bind(booking_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                log::error!("Failed to link booking {} to payout: {}", booking_id, e);
                FindamError::DatabaseError(e.to_string())
            })?;
        }

        tx.commit().await.map_err(|e| {
            log::error!("Failed to commit payout: {}", e);
            FindamError::DatabaseError(e.to_string())
        })?;

        log::info!(
            "Created payout {} of {} XAF for owner {}",
            payout.id,
            payout.amount,
            owner_id
        );
        Ok(payout)
    }

    /// Payouts of an owner, newest first
    pub async fn list_payouts_for_owner(
        pool: &PgPool,
        owner_id: Uuid,
    ) -> Result<Vec<Payout>, FindamError> {
        sqlx::query_as::<_, Payout>(
            "SELECT * FROM findam_payouts WHERE owner_id = $1 ORDER BY created_at DESC",
        )
        .bind(owner_id)
        .fetch_all(pool)
        .await
        .map_err(|e| {
            log::error!("Failed to list payouts for {}: {}", owner_id, e);
            FindamError::DatabaseError(e.to_string())
        })
    }

    /// Pending payouts whose period has closed
    pub async fn list_due_payouts(pool: &PgPool) -> Result<Vec<Payout>, FindamError> {
        sqlx::query_as::<_, Payout>(
            r#"
            SELECT * FROM findam_payouts
            WHERE status = 'pending'
              AND (period_end IS NULL OR period_end <= CURRENT_DATE)
            ORDER BY created_at ASC
            "#,
        )
        .fetch_all(pool)
        .await
        .map_err(|e| {
            log::error!("Failed to list due payouts: {}", e);
            FindamError::DatabaseError(e.to_string())
        })
    }

    /// Update payout status, stamping processed_at on completion
    pub async fn update_payout_status(
        pool: &PgPool,
        payout_id: Uuid,
        status: &str,
    ) -> Result<(), FindamError> {
        sqlx::query(
            r#"
            UPDATE findam_payouts
            SET status = $1,
                processed_at = CASE WHEN $1 = 'completed' THEN NOW() ELSE processed_at END,
                updated_at = NOW()
            WHERE id = $2
            "#,
        )
        .bind(status)
        .bind(payout_id)
        .execute(pool)
        .await
        .map_err(|e| {
            log::error!("Failed to update payout {}: {}", payout_id, e);
            FindamError::DatabaseError(e.to_string())
        })?;
        Ok(())
    }

    /// Total of completed booking payments (admin revenue statistic)
    pub async fn total_completed_payments(pool: &PgPool) -> Result<i64, FindamError> {
        let total: (Option<i64>,) = sqlx::query_as(
            "SELECT SUM(amount) FROM findam_payment_transactions WHERE status = 'completed'",
        )
        .fetch_one(pool)
        .await
        .map_err(|e| {
            log::error!("Failed to compute revenue: {}", e);
            FindamError::DatabaseError(e.to_string())
        })?;

        Ok(total.0.unwrap_or(0))
    }
}
