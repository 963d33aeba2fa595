// src/db/property_repository.rs
// DOCUMENTATION: Database access layer - property catalog queries
// PURPOSE: Abstract database operations from business logic

use crate::errors::FindamError;
use crate::models::*;
use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

/// Columns shared by every property SELECT, with the main image
/// resolved through a lateral join on findam_property_images
const PROPERTY_SELECT: &str = r#"
    SELECT
        p.id, p.owner_id, p.title, p.description, p.property_type,
        p.capacity, p.bedrooms, p.bathrooms,
        p.city_id, p.neighborhood_id, p.address, p.latitude, p.longitude,
        p.price_per_night, p.price_per_week, p.price_per_month,
        p.cleaning_fee, p.security_deposit,
        p.allow_discount, p.cancellation_policy, p.amenity_ids,
        p.is_published, p.is_verified,
        p.avg_rating, p.rating_count,
        p.created_at, p.updated_at,
        img.image_url as main_image_url
    FROM findam_properties p
    LEFT JOIN LATERAL (
        SELECT image_url
        FROM findam_property_images
        WHERE property_id = p.id
        ORDER BY is_main DESC, display_order ASC, created_at ASC
        LIMIT 1
    ) img ON true
"#;

/// PropertyRepository: All database operations for the property catalog
pub struct PropertyRepository;

impl PropertyRepository {
    /// Create new property in database
    /// DOCUMENTATION: Inserts property and returns created record
    /// Used by POST /properties endpoint
    pub async fn create_property(
        pool: &PgPool,
        owner_id: Uuid,
        req: &CreatePropertyRequest,
    ) -> Result<Property, FindamError> {
        let inserted: (Uuid,) = sqlx::query_as(
            r#"
            INSERT INTO findam_properties (
                id, owner_id, title, description, property_type,
                capacity, bedrooms, bathrooms,
                city_id, neighborhood_id, address, latitude, longitude,
                price_per_night, price_per_week, price_per_month,
                cleaning_fee, security_deposit,
                allow_discount, cancellation_policy, amenity_ids,
                is_published, is_verified, avg_rating, rating_count,
                created_at, updated_at
            )
            VALUES (
                $1, $2, $3, $4, $5,
                $6, $7, $8,
                $9, $10, $11, $12, $13,
                $14, $15, $16,
                $17, $18,
                $19, $20, $21,
                false, false, 0, 0,
                NOW(), NOW()
            )
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(owner_id)
        .bind(&req.title)
        .bind(&req.description)
        .bind(&req.property_type)
        .bind(req.capacity)
        .bind(req.bedrooms)
        .bind(req.bathrooms)
        .bind(req.city_id)
        .bind(req.neighborhood_id)
        .bind(&req.address)
        .bind(req.latitude)
        .bind(req.longitude)
        .bind(req.price_per_night)
        .bind(req.price_per_week)
        .bind(req.price_per_month)
        .bind(req.cleaning_fee)
        .bind(req.security_deposit)
        .bind(req.allow_discount)
        .bind(&req.cancellation_policy)
        .bind(&req.amenity_ids)
        .fetch_one(pool)
        .await
        .map_err(|e| {
            log::error!("Failed to create property: {}", e);
            FindamError::DatabaseError(e.to_string())
        })?;

        let property = Self::get_by_id(pool, inserted.0).await?;
        log::info!("Created property {} for owner {}", property.id, owner_id);
        Ok(property)
    }

    /// Retrieve property by ID
    /// DOCUMENTATION: Used for GET /properties/{id} endpoint
    pub async fn get_by_id(pool: &PgPool, id: Uuid) -> Result<Property, FindamError> {
        let sql = format!("{} WHERE p.id = $1", PROPERTY_SELECT);

        sqlx::query_as::<_, Property>(&sql)
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(|e| {
                log::error!("Database error fetching property: {}", e);
                FindamError::DatabaseError(e.to_string())
            })?
            .ok_or_else(|| {
                log::warn!("Property not found: {}", id);
                FindamError::NotFound(format!("Property {}", id))
            })
    }

    /// Search published properties with filters
    /// DOCUMENTATION: Used for GET /properties endpoint
    /// Returns tuple: (results, total_count) for pagination
    pub async fn search(
        pool: &PgPool,
        query: &PropertySearchQuery,
    ) -> Result<(Vec<Property>, i64), FindamError> {
        let limit = query.limit.unwrap_or(20).min(100);
        let page = query.page.unwrap_or(1).max(1);
        let offset = (page - 1) * limit;

        // Build dynamic query based on provided filters
        let mut where_clauses = vec!["p.is_published = true".to_string()];

        // Full-text search on title and description
        if let Some(q) = &query.q {
            let escaped = q.replace('\'', "''");
            where_clauses.push(format!(
                "(p.title ILIKE '%{}%' OR p.description ILIKE '%{}%')",
                escaped, escaped
            ));
        }

        if let Some(city_id) = query.city_id {
            where_clauses.push(format!("p.city_id = {}", city_id));
        }

        if let Some(neighborhood_id) = query.neighborhood_id {
            where_clauses.push(format!("p.neighborhood_id = {}", neighborhood_id));
        }

        if let Some(property_type) = &query.property_type {
            where_clauses.push(format!(
                "p.property_type = '{}'",
                property_type.replace('\'', "''")
            ));
        }

        if let Some(min_price) = query.min_price {
            where_clauses.push(format!("p.price_per_night >= {}", min_price));
        }

        if let Some(max_price) = query.max_price {
            where_clauses.push(format!("p.price_per_night <= {}", max_price));
        }

        if let Some(capacity) = query.capacity {
            where_clauses.push(format!("p.capacity >= {}", capacity));
        }

        if let Some(min_rating) = query.min_rating {
            where_clauses.push(format!("p.avg_rating >= {}", min_rating));
        }

        let where_clause = format!("WHERE {}", where_clauses.join(" AND "));

        // Get total count
        let count_sql = format!("SELECT COUNT(*) FROM findam_properties p {}", where_clause);
        let count_result: (i64,) = sqlx::query_as(&count_sql)
            .fetch_one(pool)
            .await
            .map_err(|e| {
                log::error!("Count query error: {}", e);
                FindamError::DatabaseError(e.to_string())
            })?;

        let total = count_result.0;

        // Build final query with ordering and pagination
        let sql = format!(
            "{} {} ORDER BY p.avg_rating DESC, p.created_at DESC LIMIT {} OFFSET {}",
            PROPERTY_SELECT, where_clause, limit, offset
        );

        log::debug!("Executing property search: {}", sql);

        let properties = sqlx::query_as::<_, Property>(&sql)
            .fetch_all(pool)
            .await
            .map_err(|e| {
                log::error!("Search query error: {}", e);
                FindamError::DatabaseError(e.to_string())
            })?;

        log::info!(
            "Property search: {} results, {} total (page {})",
            properties.len(),
            total,
            page
        );

        Ok((properties, total))
    }

    /// Properties belonging to an owner (published or not)
    pub async fn list_by_owner(pool: &PgPool, owner_id: Uuid) -> Result<Vec<Property>, FindamError> {
        let sql = format!(
            "{} WHERE p.owner_id = $1 ORDER BY p.created_at DESC",
            PROPERTY_SELECT
        );

        sqlx::query_as::<_, Property>(&sql)
            .bind(owner_id)
            .fetch_all(pool)
            .await
            .map_err(|e| {
                log::error!("Failed to list properties for owner {}: {}", owner_id, e);
                FindamError::DatabaseError(e.to_string())
            })
    }

    /// Update existing property
    /// DOCUMENTATION: Partial update - only provided fields are modified
    pub async fn update_property(
        pool: &PgPool,
        id: Uuid,
        req: &UpdatePropertyRequest,
    ) -> Result<Property, FindamError> {
        sqlx::query(
            r#"
            UPDATE findam_properties
            SET title = COALESCE($1, title),
                description = COALESCE($2, description),
                price_per_night = COALESCE($3, price_per_night),
                price_per_week = COALESCE($4, price_per_week),
                price_per_month = COALESCE($5, price_per_month),
                cleaning_fee = COALESCE($6, cleaning_fee),
                security_deposit = COALESCE($7, security_deposit),
                capacity = COALESCE($8, capacity),
                allow_discount = COALESCE($9, allow_discount),
                cancellation_policy = COALESCE($10, cancellation_policy),
                amenity_ids = COALESCE($11, amenity_ids),
                updated_at = NOW()
            WHERE id = $12
            "#,
        )
        .bind(&req.title)
        .bind(&req.description)
        .bind(req.price_per_night)
        .bind(req.price_per_week)
        .bind(req.price_per_month)
        .bind(req.cleaning_fee)
        .bind(req.security_deposit)
        .bind(req.capacity)
        .bind(req.allow_discount)
        .bind(&req.cancellation_policy)
        .bind(&req.amenity_ids)
        .bind(id)
        .execute(pool)
        .await
        .map_err(|e| {
            log::error!("Update failed for property {}: {}", id, e);
            FindamError::DatabaseError(e.to_string())
        })?;

        let property = Self::get_by_id(pool, id).await?;
        log::info!("Updated property: {}", id);
        Ok(property)
    }

    /// Toggle publication of a property
    pub async fn set_published(
        pool: &PgPool,
        id: Uuid,
        published: bool,
    ) -> Result<(), FindamError> {
        let rows = sqlx::query(
            "UPDATE findam_properties SET is_published = $1, updated_at = NOW() WHERE id = $2",
        )
        .bind(published)
        .bind(id)
        .execute(pool)
        .await
        .map_err(|e| {
            log::error!("Publish toggle failed for property {}: {}", id, e);
            FindamError::DatabaseError(e.to_string())
        })?
        .rows_affected();

        if rows == 0 {
            return Err(FindamError::NotFound(format!("Property {}", id)));
        }

        Ok(())
    }

    /// Delete a property
    /// DOCUMENTATION: Bookings reference properties with ON DELETE RESTRICT,
    /// so deletion fails with a conflict once reservations exist
    pub async fn delete_property(pool: &PgPool, id: Uuid) -> Result<(), FindamError> {
        let result = sqlx::query("DELETE FROM findam_properties WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await
            .map_err(|e| {
                if let Some(db_err) = e.as_database_error() {
                    // Foreign key violation: bookings exist for this property
                    if db_err.code().as_deref() == Some("23503") {
                        return FindamError::BookingConflict(
                            "Property has bookings and cannot be deleted".to_string(),
                        );
                    }
                }
                log::error!("Delete failed for property {}: {}", id, e);
                FindamError::DatabaseError(e.to_string())
            })?;

        if result.rows_affected() == 0 {
            return Err(FindamError::NotFound(format!("Property {}", id)));
        }

        log::info!("Deleted property: {}", id);
        Ok(())
    }

    /// Incrementally fold a new rating into the property average
    pub async fn update_rating(
        pool: &PgPool,
        id: Uuid,
        new_rating: i16,
    ) -> Result<(), FindamError> {
        sqlx::query(
            r#"
            UPDATE findam_properties
            SET avg_rating = (avg_rating * rating_count + $1) / (rating_count + 1),
                rating_count = rating_count + 1,
                updated_at = NOW()
            WHERE id = $2
            "#,
        )
        .bind(new_rating as f64)
        .bind(id)
        .execute(pool)
        .await
        .map_err(|e| {
            log::error!("Failed to update rating for property {}: {}", id, e);
            FindamError::DatabaseError(e.to_string())
        })?;
        Ok(())
    }

    /// Register an image for a property
    /// DOCUMENTATION: Setting is_main demotes every other image of the
    /// same property
    pub async fn add_image(
        pool: &PgPool,
        property_id: Uuid,
        req: &CreateImageRequest,
    ) -> Result<PropertyImage, FindamError> {
        if req.is_main {
            sqlx::query(
                "UPDATE findam_property_images SET is_main = false WHERE property_id = $1",
            )
            .bind(property_id)
            .execute(pool)
            .await
            .map_err(|e| {
                log::error!("Failed to demote main images for {}: {}", property_id, e);
                FindamError::DatabaseError(e.to_string())
            })?;
        }

        sqlx::query_as::<_, PropertyImage>(
            r#"
            INSERT INTO findam_property_images (
                id, property_id, image_url, is_main, display_order, caption, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, NOW())
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(property_id)
        .bind(&req.image_url)
        .bind(req.is_main)
        .bind(req.display_order)
        .bind(&req.caption)
        .fetch_one(pool)
        .await
        .map_err(|e| {
            log::error!("Failed to add image for {}: {}", property_id, e);
            FindamError::DatabaseError(e.to_string())
        })
    }

    /// All images of a property, main first
    pub async fn get_images(
        pool: &PgPool,
        property_id: Uuid,
    ) -> Result<Vec<PropertyImage>, FindamError> {
        sqlx::query_as::<_, PropertyImage>(
            r#"
            SELECT * FROM findam_property_images
            WHERE property_id = $1
            ORDER BY is_main DESC, display_order ASC, created_at ASC
            "#,
        )
        .bind(property_id)
        .fetch_all(pool)
        .await
        .map_err(|e| {
            log::error!("Failed to fetch images for {}: {}", property_id, e);
            FindamError::DatabaseError(e.to_string())
        })
    }

    /// Record a blocked period on the calendar
    pub async fn add_unavailability(
        pool: &PgPool,
        property_id: Uuid,
        start_date: NaiveDate,
        end_date: NaiveDate,
        booking_type: &str,
        booking_id: Option<Uuid>,
        external_client_name: Option<&str>,
        external_client_phone: Option<&str>,
        notes: Option<&str>,
    ) -> Result<Unavailability, FindamError> {
        sqlx::query_as::<_, Unavailability>(
            r#"
            INSERT INTO findam_property_unavailabilities (
                id, property_id, start_date, end_date, booking_type, booking_id,
                external_client_name, external_client_phone, notes,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, NOW(), NOW())
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(property_id)
        .bind(start_date)
        .bind(end_date)
        .bind(booking_type)
        .bind(booking_id)
        .bind(external_client_name)
        .bind(external_client_phone)
        .bind(notes)
        .fetch_one(pool)
        .await
        .map_err(|e| {
            log::error!("Failed to block dates for {}: {}", property_id, e);
            FindamError::DatabaseError(e.to_string())
        })
    }

    /// All blocked periods of a property
    pub async fn get_unavailabilities(
        pool: &PgPool,
        property_id: Uuid,
    ) -> Result<Vec<Unavailability>, FindamError> {
        sqlx::query_as::<_, Unavailability>(
            r#"
            SELECT * FROM findam_property_unavailabilities
            WHERE property_id = $1
            ORDER BY start_date ASC
            "#,
        )
        .bind(property_id)
        .fetch_all(pool)
        .await
        .map_err(|e| {
            log::error!("Failed to fetch calendar for {}: {}", property_id, e);
            FindamError::DatabaseError(e.to_string())
        })
    }

    /// Check whether a stay overlaps any blocked period
    /// DOCUMENTATION: Overlap rule for the half-open [check_in, check_out)
    /// stay interval
    pub async fn has_overlap(
        pool: &PgPool,
        property_id: Uuid,
        check_in: NaiveDate,
        check_out: NaiveDate,
    ) -> Result<bool, FindamError> {
        let count: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM findam_property_unavailabilities
            WHERE property_id = $1 AND start_date < $3 AND end_date > $2
            "#,
        )
        .bind(property_id)
        .bind(check_in)
        .bind(check_out)
        .fetch_one(pool)
        .await
        .map_err(|e| {
            log::error!("Overlap check failed for {}: {}", property_id, e);
            FindamError::DatabaseError(e.to_string())
        })?;

        Ok(count.0 > 0)
    }

    /// Remove a blocked period (owner calendar management)
    pub async fn delete_unavailability(
        pool: &PgPool,
        property_id: Uuid,
        unavailability_id: Uuid,
    ) -> Result<(), FindamError> {
        let rows = sqlx::query(
            "DELETE FROM findam_property_unavailabilities WHERE id = $1 AND property_id = $2",
        )
        .bind(unavailability_id)
        .bind(property_id)
        .execute(pool)
        .await
        .map_err(|e| {
            log::error!("Failed to delete unavailability {}: {}", unavailability_id, e);
            FindamError::DatabaseError(e.to_string())
        })?
        .rows_affected();

        if rows == 0 {
            return Err(FindamError::NotFound(format!(
                "Unavailability {}",
                unavailability_id
            )));
        }

        Ok(())
    }

    /// Release the blocked period created for a booking
    pub async fn release_booking_dates(
        pool: &PgPool,
        property_id: Uuid,
        booking_id: Uuid,
    ) -> Result<(), FindamError> {
        sqlx::query(
            "DELETE FROM findam_property_unavailabilities WHERE property_id = $1 AND booking_id = $2",
        )
        .bind(property_id)
        .bind(booking_id)
        .execute(pool)
        .await
        .map_err(|e| {
            log::error!("Failed to release dates for booking {}: {}", booking_id, e);
            FindamError::DatabaseError(e.to_string())
        })?;
        Ok(())
    }

    /// Add a long-stay discount tier to a property
    pub async fn add_discount(
        pool: &PgPool,
        property_id: Uuid,
        req: &CreateDiscountRequest,
    ) -> Result<LongStayDiscount, FindamError> {
        sqlx::query_as::<_, LongStayDiscount>(
            r#"
            INSERT INTO findam_property_discounts (id, property_id, min_days, discount_percentage)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(property_id)
        .bind(req.min_days)
        .bind(req.discount_percentage)
        .fetch_one(pool)
        .await
        .map_err(|e| {
            log::error!("Failed to add discount for {}: {}", property_id, e);
            FindamError::DatabaseError(e.to_string())
        })
    }

    /// Long-stay discount tiers of a property, shortest stay first
    pub async fn get_discounts(
        pool: &PgPool,
        property_id: Uuid,
    ) -> Result<Vec<LongStayDiscount>, FindamError> {
        sqlx::query_as::<_, LongStayDiscount>(
            r#"
            SELECT * FROM findam_property_discounts
            WHERE property_id = $1
            ORDER BY min_days ASC
            "#,
        )
        .bind(property_id)
        .fetch_all(pool)
        .await
        .map_err(|e| {
            log::error!("Failed to fetch discounts for {}: {}", property_id, e);
            FindamError::DatabaseError(e.to_string())
        })
    }

    /// Cities available on the platform
    pub async fn list_cities(pool: &PgPool) -> Result<Vec<City>, FindamError> {
        sqlx::query_as::<_, City>("SELECT * FROM findam_cities ORDER BY name ASC")
            .fetch_all(pool)
            .await
            .map_err(|e| {
                log::error!("Failed to list cities: {}", e);
                FindamError::DatabaseError(e.to_string())
            })
    }

    /// Neighborhoods of a city
    pub async fn list_neighborhoods(
        pool: &PgPool,
        city_id: i32,
    ) -> Result<Vec<Neighborhood>, FindamError> {
        sqlx::query_as::<_, Neighborhood>(
            "SELECT * FROM findam_neighborhoods WHERE city_id = $1 ORDER BY name ASC",
        )
        .bind(city_id)
        .fetch_all(pool)
        .await
        .map_err(|e| {
            log::error!("Failed to list neighborhoods for city {}: {}", city_id, e);
            FindamError::DatabaseError(e.to_string())
        })
    }

    /// Amenity catalog
    pub async fn list_amenities(pool: &PgPool) -> Result<Vec<Amenity>, FindamError> {
        sqlx::query_as::<_, Amenity>("SELECT * FROM findam_amenities ORDER BY name ASC")
            .fetch_all(pool)
            .await
            .map_err(|e| {
                log::error!("Failed to list amenities: {}", e);
                FindamError::DatabaseError(e.to_string())
            })
    }
}
