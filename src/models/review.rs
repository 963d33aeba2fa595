// src/models/review.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Detailed property review, independent from booking reviews
/// DOCUMENTATION: Carries per-category ratings in addition to the
/// overall note
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PropertyReview {
    pub id: Uuid,
    pub property_id: Uuid,
    pub reviewer_id: Option<Uuid>,
    pub rating: i16,
    pub cleanliness_rating: i16,
    pub location_rating: i16,
    pub value_rating: i16,
    pub communication_rating: i16,
    pub title: String,
    pub comment: String,
    pub stay_date: NaiveDate,
    pub is_public: bool,
    pub is_verified_stay: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Owner reply attached 1:1 to a review
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ReviewReply {
    pub id: Uuid,
    pub review_id: Uuid,
    pub author_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Request DTO for POST /reviews
#[derive(Debug, Deserialize, Validate)]
pub struct CreatePropertyReviewRequest {
    pub property_id: Uuid,
    #[validate(range(min = 1, max = 5))]
    pub rating: i16,
    #[validate(range(min = 1, max = 5))]
    pub cleanliness_rating: i16,
    #[validate(range(min = 1, max = 5))]
    pub location_rating: i16,
    #[validate(range(min = 1, max = 5))]
    pub value_rating: i16,
    #[validate(range(min = 1, max = 5))]
    pub communication_rating: i16,
    #[validate(length(min = 1, max = 100))]
    pub title: String,
    #[validate(length(min = 1, max = 5000))]
    pub comment: String,
    pub stay_date: NaiveDate,
}

/// Request DTO for replying to a review
#[derive(Debug, Deserialize, Validate)]
pub struct CreateReviewReplyRequest {
    #[validate(length(min = 1, max = 2000))]
    pub content: String,
}

/// Review DTO exposed via API, with the optional owner reply
#[derive(Debug, Serialize)]
pub struct PropertyReviewResponse {
    pub id: Uuid,
    pub property_id: Uuid,
    pub reviewer_id: Option<Uuid>,
    pub rating: i16,
    pub cleanliness_rating: i16,
    pub location_rating: i16,
    pub value_rating: i16,
    pub communication_rating: i16,
    pub title: String,
    pub comment: String,
    pub stay_date: NaiveDate,
    pub is_verified_stay: bool,
    pub created_at: DateTime<Utc>,
    pub reply: Option<ReviewReply>,
}

impl PropertyReview {
    pub fn to_response(&self, reply: Option<ReviewReply>) -> PropertyReviewResponse {
        PropertyReviewResponse {
            id: self.id,
            property_id: self.property_id,
            reviewer_id: self.reviewer_id,
            rating: self.rating,
            cleanliness_rating: self.cleanliness_rating,
            location_rating: self.location_rating,
            value_rating: self.value_rating,
            communication_rating: self.communication_rating,
            title: self.title.clone(),
            comment: self.comment.clone(),
            stay_date: self.stay_date,
            is_verified_stay: self.is_verified_stay,
            created_at: self.created_at,
            reply,
        }
    }
}

/// Aggregated rating breakdown for a property
#[derive(Debug, Serialize, FromRow)]
pub struct RatingBreakdown {
    pub review_count: i64,
    pub avg_rating: Option<f64>,
    pub avg_cleanliness: Option<f64>,
    pub avg_location: Option<f64>,
    pub avg_value: Option<f64>,
    pub avg_communication: Option<f64>,
}
