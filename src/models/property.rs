// src/models/property.rs
// DOCUMENTATION: Core data structures for rental properties
// PURPOSE: Defines all serialization/deserialization models for API and database

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Property categories offered on the platform
pub mod property_type {
    pub const APARTMENT: &str = "apartment";
    pub const HOUSE: &str = "house";
    pub const VILLA: &str = "villa";
    pub const STUDIO: &str = "studio";
    pub const ROOM: &str = "room";
    pub const OTHER: &str = "other";

    pub const ALL: &[&str] = &[APARTMENT, HOUSE, VILLA, STUDIO, ROOM, OTHER];

    pub fn is_valid(value: &str) -> bool {
        ALL.contains(&value)
    }
}

/// Cancellation policy levels, interpreted by the cancellation engine
pub mod cancellation_policy {
    pub const FLEXIBLE: &str = "flexible";
    pub const MODERATE: &str = "moderate";
    pub const STRICT: &str = "strict";

    pub const ALL: &[&str] = &[FLEXIBLE, MODERATE, STRICT];

    pub fn is_valid(value: &str) -> bool {
        ALL.contains(&value)
    }
}

/// Reason a date range is blocked on the calendar
pub mod unavailability_type {
    pub const BOOKING: &str = "booking";
    pub const EXTERNAL: &str = "external";
    pub const BLOCKED: &str = "blocked";

    pub const ALL: &[&str] = &[BOOKING, EXTERNAL, BLOCKED];

    pub fn is_valid(value: &str) -> bool {
        ALL.contains(&value)
    }
}

/// City available on the platform (single market: Cameroon)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct City {
    pub id: i32,
    pub name: String,
}

/// Neighborhood within a city
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Neighborhood {
    pub id: i32,
    pub city_id: i32,
    pub name: String,
}

/// Amenity available in properties (WiFi, air conditioning, ...)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Amenity {
    pub id: i32,
    pub name: String,
    pub icon: Option<String>,
    pub category: Option<String>,
}

/// Represents a complete property record from the database
/// DOCUMENTATION: This struct maps directly to the findam_properties table
/// All amounts are whole FCFA (XAF has no minor unit)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Property {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub description: String,
    pub property_type: String,

    /// Maximum number of guests
    pub capacity: i16,
    pub bedrooms: i16,
    pub bathrooms: i16,

    pub city_id: i32,
    pub neighborhood_id: i32,
    pub address: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,

    /// Nightly rate (required), weekly and monthly tiers optional
    pub price_per_night: i64,
    pub price_per_week: Option<i64>,
    pub price_per_month: Option<i64>,
    pub cleaning_fee: i64,
    pub security_deposit: i64,

    pub allow_discount: bool,
    pub cancellation_policy: String,

    /// Amenity ids attached to this property
    pub amenity_ids: Vec<i32>,

    pub is_published: bool,
    pub is_verified: bool,

    /// Running average maintained incrementally by reviews
    pub avg_rating: f64,
    pub rating_count: i32,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    /// Main photo URL derived from associated images
    #[sqlx(default)]
    pub main_image_url: Option<String>,
}

/// Property image registered by URL
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PropertyImage {
    pub id: Uuid,
    pub property_id: Uuid,
    pub image_url: String,
    pub is_main: bool,
    pub display_order: i16,
    pub caption: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Blocked period on a property calendar
/// DOCUMENTATION: Availability is stored as *un*availability records
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Unavailability {
    pub id: Uuid,
    pub property_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub booking_type: String,
    pub booking_id: Option<Uuid>,
    pub external_client_name: Option<String>,
    pub external_client_phone: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Percentage discount granted from a minimum stay length
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LongStayDiscount {
    pub id: Uuid,
    pub property_id: Uuid,
    pub min_days: i32,
    pub discount_percentage: f64,
}

/// Request DTO for creating a new property
/// DOCUMENTATION: Data transfer object for POST /properties endpoint
#[derive(Debug, Deserialize, Validate, Clone)]
pub struct CreatePropertyRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,

    #[validate(length(min = 1))]
    pub description: String,

    pub property_type: String,

    #[validate(range(min = 1, max = 50))]
    #[serde(default = "default_one")]
    pub capacity: i16,

    #[validate(range(min = 0, max = 50))]
    #[serde(default = "default_one")]
    pub bedrooms: i16,

    #[validate(range(min = 0, max = 50))]
    #[serde(default = "default_one")]
    pub bathrooms: i16,

    pub city_id: i32,
    pub neighborhood_id: i32,

    #[validate(length(min = 1, max = 255))]
    pub address: String,

    pub latitude: Option<f64>,
    pub longitude: Option<f64>,

    #[validate(range(min = 1))]
    pub price_per_night: i64,
    pub price_per_week: Option<i64>,
    pub price_per_month: Option<i64>,

    #[serde(default)]
    pub cleaning_fee: i64,
    #[serde(default)]
    pub security_deposit: i64,

    #[serde(default = "default_true")]
    pub allow_discount: bool,

    #[serde(default = "default_policy")]
    pub cancellation_policy: String,

    #[serde(default)]
    pub amenity_ids: Vec<i32>,
}

fn default_one() -> i16 {
    1
}

fn default_true() -> bool {
    true
}

fn default_policy() -> String {
    cancellation_policy::MODERATE.to_string()
}

/// Request DTO for updating an existing property
/// DOCUMENTATION: All fields optional - only provided fields are updated
#[derive(Debug, Deserialize, Validate)]
pub struct UpdatePropertyRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    pub description: Option<String>,
    pub price_per_night: Option<i64>,
    pub price_per_week: Option<i64>,
    pub price_per_month: Option<i64>,
    pub cleaning_fee: Option<i64>,
    pub security_deposit: Option<i64>,
    pub capacity: Option<i16>,
    pub allow_discount: Option<bool>,
    pub cancellation_policy: Option<String>,
    pub amenity_ids: Option<Vec<i32>>,
}

/// Request DTO for registering a property image
#[derive(Debug, Deserialize, Validate)]
pub struct CreateImageRequest {
    #[validate(url)]
    pub image_url: String,
    #[serde(default)]
    pub is_main: bool,
    #[serde(default)]
    pub display_order: i16,
    #[validate(length(max = 100))]
    pub caption: Option<String>,
}

/// Request DTO for blocking dates on the calendar
#[derive(Debug, Deserialize)]
pub struct CreateUnavailabilityRequest {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub booking_type: String,
    pub external_client_name: Option<String>,
    pub external_client_phone: Option<String>,
    pub notes: Option<String>,
}

/// Request DTO for adding a long-stay discount
#[derive(Debug, Deserialize, Validate)]
pub struct CreateDiscountRequest {
    #[validate(range(min = 2))]
    pub min_days: i32,
    #[validate(range(min = 0.0, max = 100.0))]
    pub discount_percentage: f64,
}

/// Search query parameters
/// DOCUMENTATION: DTO for parsing query string in /properties endpoint
/// All parameters are optional for flexible searching
#[derive(Debug, Deserialize)]
pub struct PropertySearchQuery {
    /// Full-text search on title and description
    pub q: Option<String>,

    pub city_id: Option<i32>,
    pub neighborhood_id: Option<i32>,
    pub property_type: Option<String>,

    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub capacity: Option<i16>,
    pub min_rating: Option<f64>,

    /// Page number (1-based)
    pub page: Option<i64>,

    /// Results per page (max 100)
    pub limit: Option<i64>,
}

/// Property DTO exposed via API listings
#[derive(Debug, Serialize)]
pub struct PropertyResponse {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub description: String,
    pub property_type: String,
    pub capacity: i16,
    pub bedrooms: i16,
    pub bathrooms: i16,
    pub city_id: i32,
    pub neighborhood_id: i32,
    pub address: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub price_per_night: i64,
    pub price_per_week: Option<i64>,
    pub price_per_month: Option<i64>,
    pub cleaning_fee: i64,
    pub security_deposit: i64,
    pub allow_discount: bool,
    pub cancellation_policy: String,
    pub amenity_ids: Vec<i32>,
    pub is_published: bool,
    pub is_verified: bool,
    pub avg_rating: f64,
    pub rating_count: i32,
    pub created_at: DateTime<Utc>,
    pub main_image_url: Option<String>,
}

/// Detailed response with images and discounts
/// DOCUMENTATION: Used for GET /properties/{id} endpoint
#[derive(Debug, Serialize)]
pub struct PropertyDetailResponse {
    #[serde(flatten)]
    pub property: PropertyResponse,
    pub images: Vec<PropertyImage>,
    pub long_stay_discounts: Vec<LongStayDiscount>,
}

/// Paginated search response
#[derive(Debug, Serialize)]
pub struct PropertySearchResponse {
    pub data: Vec<PropertyResponse>,
    pub total_count: i64,
    pub page: i64,
    pub limit: i64,
    pub has_more: bool,
}

impl Property {
    /// Convert Property to PropertyResponse for API
    pub fn to_response(&self) -> PropertyResponse {
        PropertyResponse {
            id: self.id,
            owner_id: self.owner_id,
            title: self.title.clone(),
            description: self.description.clone(),
            property_type: self.property_type.clone(),
            capacity: self.capacity,
            bedrooms: self.bedrooms,
            bathrooms: self.bathrooms,
            city_id: self.city_id,
            neighborhood_id: self.neighborhood_id,
            address: self.address.clone(),
            latitude: self.latitude,
            longitude: self.longitude,
            price_per_night: self.price_per_night,
            price_per_week: self.price_per_week,
            price_per_month: self.price_per_month,
            cleaning_fee: self.cleaning_fee,
            security_deposit: self.security_deposit,
            allow_discount: self.allow_discount,
            cancellation_policy: self.cancellation_policy.clone(),
            amenity_ids: self.amenity_ids.clone(),
            is_published: self.is_published,
            is_verified: self.is_verified,
            avg_rating: self.avg_rating,
            rating_count: self.rating_count,
            created_at: self.created_at,
            main_image_url: self.main_image_url.clone(),
        }
    }
}
