// src/db/user_repository.rs
// DOCUMENTATION: Database access layer for accounts
// PURPOSE: Users, profiles and owner subscriptions

use crate::errors::FindamError;
use crate::models::user::verification_status;
use crate::models::{OwnerSubscription, Profile, UpdateProfileRequest, User};
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

pub struct UserRepository;

impl UserRepository {
    /// Create a user and its empty profile in one transaction
    /// DOCUMENTATION: Mirrors the registration flow - a profile always
    /// exists for every user
    pub async fn create_user(
        pool: &PgPool,
        email: &str,
        phone_number: &str,
        password_hash: &str,
        first_name: &str,
        last_name: &str,
        user_type: &str,
    ) -> Result<User, FindamError> {
        let mut tx = pool.begin().await.map_err(|e| {
            log::error!("Failed to open transaction: {}", e);
            FindamError::DatabaseError(e.to_string())
        })?;

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO findam_users (
                id, email, phone_number, first_name, last_name,
                user_type, password_hash, is_active, is_verified, date_joined
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, true, false, NOW())
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(phone_number)
        .bind(first_name)
        .bind(last_name)
        .bind(user_type)
        .bind(password_hash)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if let Some(db_err) = e.as_database_error() {
                // Unique violation on email or phone
                if db_err.code().as_deref() == Some("23505") {
                    return FindamError::AlreadyExists(format!(
                        "Account with email '{}' or phone '{}' already exists",
                        email, phone_number
                    ));
                }
            }
            log::error!("Failed to create user: {}", e);
            FindamError::DatabaseError(e.to_string())
        })?;

        sqlx::query(
            r#"
            INSERT INTO findam_profiles (id, user_id, country, verification_status)
            VALUES ($1, $2, 'Cameroun', 'pending')
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user.id)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            log::error!("Failed to create profile for {}: {}", user.id, e);
            FindamError::DatabaseError(e.to_string())
        })?;

        tx.commit().await.map_err(|e| {
            log::error!("Failed to commit user creation: {}", e);
            FindamError::DatabaseError(e.to_string())
        })?;

        log::info!("Created user {} ({})", user.id, user.email);
        Ok(user)
    }

    /// Retrieve user by id
    pub async fn get_by_id(pool: &PgPool, id: Uuid) -> Result<User, FindamError> {
        sqlx::query_as::<_, User>("SELECT * FROM findam_users WHERE id = $1 AND is_active = true")
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(|e| {
                log::error!("Database error fetching user: {}", e);
                FindamError::DatabaseError(e.to_string())
            })?
            .ok_or_else(|| FindamError::NotFound(format!("User {}", id)))
    }

    /// Retrieve user by email (login path)
    pub async fn get_by_email(pool: &PgPool, email: &str) -> Result<User, FindamError> {
        sqlx::query_as::<_, User>(
            "SELECT * FROM findam_users WHERE email = $1 AND is_active = true",
        )
        .bind(email)
        .fetch_optional(pool)
        .await
        .map_err(|e| {
            log::error!("Database error fetching user by email: {}", e);
            FindamError::DatabaseError(e.to_string())
        })?
        .ok_or_else(|| FindamError::NotFound(format!("User with email '{}'", email)))
    }

    /// Record a successful login
    pub async fn touch_last_login(pool: &PgPool, id: Uuid) -> Result<(), FindamError> {
        sqlx::query("UPDATE findam_users SET last_login = NOW() WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await
            .map_err(|e| {
                log::error!("Failed to update last_login for {}: {}", id, e);
                FindamError::DatabaseError(e.to_string())
            })?;
        Ok(())
    }

    /// Replace the stored password hash
    pub async fn update_password(
        pool: &PgPool,
        id: Uuid,
        password_hash: &str,
    ) -> Result<(), FindamError> {
        sqlx::query("UPDATE findam_users SET password_hash = $1 WHERE id = $2")
            .bind(password_hash)
            .bind(id)
            .execute(pool)
            .await
            .map_err(|e| {
                log::error!("Failed to update password for {}: {}", id, e);
                FindamError::DatabaseError(e.to_string())
            })?;
        Ok(())
    }

    /// Retrieve the profile attached to a user
    pub async fn get_profile(pool: &PgPool, user_id: Uuid) -> Result<Profile, FindamError> {
        sqlx::query_as::<_, Profile>("SELECT * FROM findam_profiles WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(pool)
            .await
            .map_err(|e| {
                log::error!("Database error fetching profile: {}", e);
                FindamError::DatabaseError(e.to_string())
            })?
            .ok_or_else(|| FindamError::NotFound(format!("Profile for user {}", user_id)))
    }

    /// Partial update of user names and profile fields
    pub async fn update_profile(
        pool: &PgPool,
        user_id: Uuid,
        req: &UpdateProfileRequest,
    ) -> Result<Profile, FindamError> {
        sqlx::query(
            r#"
            UPDATE findam_users
            SET first_name = COALESCE($1, first_name),
                last_name = COALESCE($2, last_name)
            WHERE id = $3
            "#,
        )
        .bind(&req.first_name)
        .bind(&req.last_name)
        .bind(user_id)
        .execute(pool)
        .await
        .map_err(|e| {
            log::error!("Failed to update user {}: {}", user_id, e);
            FindamError::DatabaseError(e.to_string())
        })?;

        sqlx::query(
            r#"
            UPDATE findam_profiles
            SET bio = COALESCE($1, bio),
                birth_date = COALESCE($2, birth_date),
                city = COALESCE($3, city),
                updated_at = NOW()
            WHERE user_id = $4
            "#,
        )
        .bind(&req.bio)
        .bind(req.birth_date)
        .bind(&req.city)
        .bind(user_id)
        .execute(pool)
        .await
        .map_err(|e| {
            log::error!("Failed to update profile for {}: {}", user_id, e);
            FindamError::DatabaseError(e.to_string())
        })?;

        Self::get_profile(pool, user_id).await
    }

    /// Submit identity documents for verification
    pub async fn submit_identity_verification(
        pool: &PgPool,
        user_id: Uuid,
        id_card_number: &str,
    ) -> Result<(), FindamError> {
        sqlx::query(
            r#"
            UPDATE findam_profiles
            SET id_card_number = $1,
                verification_status = 'pending',
                verification_notes = NULL,
                updated_at = NOW()
            WHERE user_id = $2
            "#,
        )
        .bind(id_card_number)
        .bind(user_id)
        .execute(pool)
        .await
        .map_err(|e| {
            log::error!("Failed to submit verification for {}: {}", user_id, e);
            FindamError::DatabaseError(e.to_string())
        })?;
        Ok(())
    }

    /// Admin decision on a pending identity verification
    pub async fn apply_verification_decision(
        pool: &PgPool,
        user_id: Uuid,
        approve: bool,
        notes: Option<&str>,
    ) -> Result<(), FindamError> {
        let status = if approve {
            verification_status::VERIFIED
        } else {
            verification_status::REJECTED
        };

        let rows = sqlx::query(
            r#"
            UPDATE findam_profiles
            SET verification_status = $1,
                verification_notes = $2,
                verification_date = NOW(),
                updated_at = NOW()
            WHERE user_id = $3
            "#,
        )
        .bind(status)
        .bind(notes)
        .bind(user_id)
        .execute(pool)
        .await
        .map_err(|e| {
            log::error!("Failed to apply verification decision for {}: {}", user_id, e);
            FindamError::DatabaseError(e.to_string())
        })?
        .rows_affected();

        if rows == 0 {
            return Err(FindamError::NotFound(format!("Profile for user {}", user_id)));
        }

        sqlx::query("UPDATE findam_users SET is_verified = $1 WHERE id = $2")
            .bind(approve)
            .bind(user_id)
            .execute(pool)
            .await
            .map_err(|e| {
                log::error!("Failed to flag user {} verified: {}", user_id, e);
                FindamError::DatabaseError(e.to_string())
            })?;

        Ok(())
    }

    /// Profiles waiting for an admin verification decision
    pub async fn list_pending_verifications(pool: &PgPool) -> Result<Vec<Profile>, FindamError> {
        sqlx::query_as::<_, Profile>(
            r#"
            SELECT * FROM findam_profiles
            WHERE verification_status = 'pending' AND id_card_number IS NOT NULL
            ORDER BY updated_at ASC
            "#,
        )
        .fetch_all(pool)
        .await
        .map_err(|e| {
            log::error!("Failed to list pending verifications: {}", e);
            FindamError::DatabaseError(e.to_string())
        })
    }

    /// Incrementally fold a new rating into the profile average
    pub async fn update_profile_rating(
        pool: &PgPool,
        user_id: Uuid,
        new_rating: i16,
    ) -> Result<(), FindamError> {
        sqlx::query(
            r#"
            UPDATE findam_profiles
            SET avg_rating = (avg_rating * rating_count + $1) / (rating_count + 1),
                rating_count = rating_count + 1,
                updated_at = NOW()
            WHERE user_id = $2
            "#,
        )
        .bind(new_rating as f64)
        .bind(user_id)
        .execute(pool)
        .await
        .map_err(|e| {
            log::error!("Failed to update rating for {}: {}", user_id, e);
            FindamError::DatabaseError(e.to_string())
        })?;
        Ok(())
    }

    /// Currently active subscription for an owner, if any
    pub async fn get_active_subscription(
        pool: &PgPool,
        owner_id: Uuid,
    ) -> Result<Option<OwnerSubscription>, FindamError> {
        let subscription = sqlx::query_as::<_, OwnerSubscription>(
            r#"
            SELECT * FROM findam_owner_subscriptions
            WHERE owner_id = $1 AND status = 'active'
              AND (end_date IS NULL OR end_date > NOW())
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(owner_id)
        .fetch_optional(pool)
        .await
        .map_err(|e| {
            log::error!("Failed to fetch subscription for {}: {}", owner_id, e);
            FindamError::DatabaseError(e.to_string())
        })?;

        Ok(subscription)
    }

    /// Open a subscription for an owner, expiring previous active ones
    pub async fn create_subscription(
        pool: &PgPool,
        owner_id: Uuid,
        subscription_type: &str,
        duration_days: Option<i64>,
    ) -> Result<OwnerSubscription, FindamError> {
        let mut tx = pool.begin().await.map_err(|e| {
            log::error!("Failed to open transaction: {}", e);
            FindamError::DatabaseError(e.to_string())
        })?;

        sqlx::query(
            "UPDATE findam_owner_subscriptions SET status = 'expired', updated_at = NOW() \
             WHERE owner_id = $1 AND status = 'active'",
        )
        .bind(owner_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            log::error!("Failed to expire subscriptions for {}: {}", owner_id, e);
            FindamError::DatabaseError(e.to_string())
        })?;

        let end_date = duration_days.map(|days| Utc::now() + chrono::Duration::days(days));

        let subscription = sqlx::query_as::<_, OwnerSubscription>(
            r#"
            INSERT INTO findam_owner_subscriptions (
                id, owner_id, subscription_type, status, start_date, end_date
            )
            VALUES ($1, $2, $3, 'active', NOW(), $4)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(owner_id)
        .bind(subscription_type)
        .bind(end_date)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            log::error!("Failed to create subscription for {}: {}", owner_id, e);
            FindamError::DatabaseError(e.to_string())
        })?;

        tx.commit().await.map_err(|e| {
            log::error!("Failed to commit subscription: {}", e);
            FindamError::DatabaseError(e.to_string())
        })?;

        log::info!(
            "Owner {} subscribed to plan '{}'",
            owner_id,
            subscription.subscription_type
        );
        Ok(subscription)
    }
}
