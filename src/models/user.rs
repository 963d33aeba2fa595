// src/models/user.rs
// DOCUMENTATION: User, profile and owner subscription models
// PURPOSE: Defines account-related database structs and API DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// User types supported by the platform
pub mod user_type {
    pub const TENANT: &str = "tenant";
    pub const OWNER: &str = "owner";
    pub const ADMIN: &str = "admin";

    pub const ALL: &[&str] = &[TENANT, OWNER, ADMIN];

    pub fn is_valid(value: &str) -> bool {
        ALL.contains(&value)
    }
}

/// Identity verification states for a profile
pub mod verification_status {
    pub const PENDING: &str = "pending";
    pub const VERIFIED: &str = "verified";
    pub const REJECTED: &str = "rejected";
}

/// Represents a user account from the database
/// DOCUMENTATION: Maps directly to the findam_users table
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub phone_number: String,
    pub first_name: String,
    pub last_name: String,
    pub user_type: String,
    /// Argon2 PHC string, never serialized in responses
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_active: bool,
    pub is_verified: bool,
    pub date_joined: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl User {
    /// Full display name, falling back to the email local part
    pub fn full_name(&self) -> String {
        let name = format!("{} {}", self.first_name, self.last_name);
        let name = name.trim().to_string();
        if name.is_empty() {
            self.email.split('@').next().unwrap_or(&self.email).to_string()
        } else {
            name
        }
    }

    pub fn to_response(&self) -> UserResponse {
        UserResponse {
            id: self.id,
            email: self.email.clone(),
            phone_number: self.phone_number.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            user_type: self.user_type.clone(),
            is_verified: self.is_verified,
            date_joined: self.date_joined,
        }
    }
}

/// Extended profile attached 1:1 to a user
/// DOCUMENTATION: Created automatically at registration time
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Profile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub bio: Option<String>,
    pub birth_date: Option<chrono::NaiveDate>,
    pub city: Option<String>,
    pub country: String,
    pub id_card_number: Option<String>,
    pub verification_status: String,
    pub verification_notes: Option<String>,
    pub verification_date: Option<DateTime<Utc>>,
    pub avg_rating: f64,
    pub rating_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Owner subscription plans and their commission impact
pub mod subscription_type {
    pub const FREE: &str = "free";
    pub const MONTHLY: &str = "monthly";
    pub const QUARTERLY: &str = "quarterly";
    pub const YEARLY: &str = "yearly";

    pub const ALL: &[&str] = &[FREE, MONTHLY, QUARTERLY, YEARLY];

    pub fn is_valid(value: &str) -> bool {
        ALL.contains(&value)
    }

    /// Subscription duration in days, None for the free plan
    pub fn duration_days(value: &str) -> Option<i64> {
        match value {
            MONTHLY => Some(30),
            QUARTERLY => Some(90),
            YEARLY => Some(365),
            _ => None,
        }
    }

    /// Plan price in whole FCFA
    pub fn plan_price(value: &str) -> i64 {
        match value {
            MONTHLY => 5_000,
            QUARTERLY => 12_000,
            YEARLY => 40_000,
            _ => 0,
        }
    }
}

/// Owner subscription record
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct OwnerSubscription {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub subscription_type: String,
    pub status: String,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub payment_reference: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OwnerSubscription {
    /// Active means status is active and the end date has not passed
    pub fn is_active(&self) -> bool {
        self.status == "active"
            && self.end_date.map(|end| end > Utc::now()).unwrap_or(true)
    }
}

/// Request DTO for POST /auth/register
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email)]
    pub email: String,

    /// Cameroonian number, normalized before storage
    #[validate(length(min = 9, max = 15))]
    pub phone_number: String,

    #[validate(length(min = 8, max = 128))]
    pub password: String,

    #[validate(length(max = 30))]
    #[serde(default)]
    pub first_name: String,

    #[validate(length(max = 30))]
    #[serde(default)]
    pub last_name: String,

    /// "tenant" or "owner" (admin accounts are provisioned manually)
    pub user_type: String,
}

/// Request DTO for POST /auth/login
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    pub password: String,
}

/// Request DTO for POST /auth/refresh
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Request DTO for POST /auth/change-password
#[derive(Debug, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    #[validate(length(min = 8, max = 128))]
    pub new_password: String,
}

/// Request DTO for PUT /auth/profile
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(max = 30))]
    pub first_name: Option<String>,
    #[validate(length(max = 30))]
    pub last_name: Option<String>,
    #[validate(length(max = 500))]
    pub bio: Option<String>,
    pub birth_date: Option<chrono::NaiveDate>,
    #[validate(length(max = 100))]
    pub city: Option<String>,
}

/// Request DTO for POST /auth/verify-identity
#[derive(Debug, Deserialize, Validate)]
pub struct IdentityVerificationRequest {
    #[validate(length(min = 1, max = 50))]
    pub id_card_number: String,
}

/// Request DTO for admin verification decisions
#[derive(Debug, Deserialize)]
pub struct VerificationDecisionRequest {
    pub approve: bool,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Request DTO for POST /auth/subscriptions
#[derive(Debug, Deserialize)]
pub struct SubscribeRequest {
    pub subscription_type: String,
}

/// User DTO exposed via the API (no credentials)
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub phone_number: String,
    pub first_name: String,
    pub last_name: String,
    pub user_type: String,
    pub is_verified: bool,
    pub date_joined: DateTime<Utc>,
}

/// Combined user + profile response for GET /auth/profile
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    #[serde(flatten)]
    pub user: UserResponse,
    pub bio: Option<String>,
    pub birth_date: Option<chrono::NaiveDate>,
    pub city: Option<String>,
    pub country: String,
    pub verification_status: String,
    pub avg_rating: f64,
    pub rating_count: i32,
}

/// Token pair returned by login and refresh
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenPairResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
}
