// src/db/review_repository.rs
// DOCUMENTATION: Review database operations
// PURPOSE: Handle CRUD operations for detailed property reviews

use crate::errors::FindamError;
use crate::models::{CreatePropertyReviewRequest, PropertyReview, RatingBreakdown, ReviewReply};
use sqlx::PgPool;
use uuid::Uuid;

pub struct ReviewRepository;

impl ReviewRepository {
    /// Create a detailed review for a property
    pub async fn create_review(
        pool: &PgPool,
        reviewer_id: Uuid,
        verified_stay: bool,
        req: &CreatePropertyReviewRequest,
    ) -> Result<PropertyReview, FindamError> {
        sqlx::query_as::<_, PropertyReview>(
            r#"
            INSERT INTO findam_detailed_reviews (
                id, property_id, reviewer_id,
                rating, cleanliness_rating, location_rating,
                value_rating, communication_rating,
                title, comment, stay_date,
                is_public, is_verified_stay,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, true, $12, NOW(), NOW())
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(req.property_id)
        .bind(reviewer_id)
        .bind(req.rating)
        .bind(req.cleanliness_rating)
        .bind(req.location_rating)
        .bind(req.value_rating)
        .bind(req.communication_rating)
        .bind(&req.title)
        .bind(&req.comment)
        .bind(req.stay_date)
        .bind(verified_stay)
        .fetch_one(pool)
        .await
        .map_err(|e| {
            log::error!("Failed to create review: {}", e);
            FindamError::DatabaseError(format!("Create review failed: {}", e))
        })
    }

    /// Retrieve a review by id
    pub async fn get_by_id(pool: &PgPool, id: Uuid) -> Result<PropertyReview, FindamError> {
        sqlx::query_as::<_, PropertyReview>(
            "SELECT * FROM findam_detailed_reviews WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(|e| {
            log::error!("Database error fetching review: {}", e);
            FindamError::DatabaseError(e.to_string())
        })?
        .ok_or_else(|| FindamError::NotFound(format!("Review {}", id)))
    }

    /// Public reviews of a property, newest first
    pub async fn get_reviews_by_property(
        pool: &PgPool,
        property_id: Uuid,
    ) -> Result<Vec<PropertyReview>, FindamError> {
        sqlx::query_as::<_, PropertyReview>(
            r#"
            SELECT * FROM findam_detailed_reviews
            WHERE property_id = $1 AND is_public = true
            ORDER BY created_at DESC
            "#,
        )
        .bind(property_id)
        .fetch_all(pool)
        .await
        .map_err(|e| {
            log::error!("Failed to fetch reviews for property {}: {}", property_id, e);
            FindamError::DatabaseError(format!("Fetch reviews failed: {}", e))
        })
    }

    /// Owner reply for a review, if any
    pub async fn get_reply(
        pool: &PgPool,
        review_id: Uuid,
    ) -> Result<Option<ReviewReply>, FindamError> {
        sqlx::query_as::<_, ReviewReply>(
            "SELECT * FROM findam_review_replies WHERE review_id = $1",
        )
        .bind(review_id)
        .fetch_optional(pool)
        .await
        .map_err(|e| {
            log::error!("Failed to fetch reply for review {}: {}", review_id, e);
            FindamError::DatabaseError(e.to_string())
        })
    }

    /// Attach the owner reply to a review (one per review)
    pub async fn create_reply(
        pool: &PgPool,
        review_id: Uuid,
        author_id: Uuid,
        content: &str,
    ) -> Result<ReviewReply, FindamError> {
        sqlx::query_as::<_, ReviewReply>(
            r#"
            INSERT INTO findam_review_replies (id, review_id, author_id, content, created_at)
            VALUES ($1, $2, $3, $4, NOW())
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(review_id)
        .bind(author_id)
        .bind(content)
        .fetch_one(pool)
        .await
        .map_err(|e| {
            if let Some(db_err) = e.as_database_error() {
                if db_err.code().as_deref() == Some("23505") {
                    return FindamError::AlreadyExists(format!(
                        "Reply for review {} already exists",
                        review_id
                    ));
                }
            }
            log::error!("Failed to create reply: {}", e);
            FindamError::DatabaseError(e.to_string())
        })
    }

    /// Aggregated per-category averages for a property
    pub async fn get_rating_breakdown(
        pool: &PgPool,
        property_id: Uuid,
    ) -> Result<RatingBreakdown, FindamError> {
        sqlx::query_as::<_, RatingBreakdown>(
            r#"
            SELECT
                COUNT(*) as review_count,
                AVG(rating::float8) as avg_rating,
                AVG(cleanliness_rating::float8) as avg_cleanliness,
                AVG(location_rating::float8) as avg_location,
                AVG(value_rating::float8) as avg_value,
                AVG(communication_rating::float8) as avg_communication
            FROM findam_detailed_reviews
            WHERE property_id = $1 AND is_public = true
            "#,
        )
        .bind(property_id)
        .fetch_one(pool)
        .await
        .map_err(|e| {
            log::error!("Failed to fetch rating breakdown for {}: {}", property_id, e);
            FindamError::DatabaseError(e.to_string())
        })
    }
}
