// src/handlers/properties.rs
// DOCUMENTATION: HTTP handlers for the property catalog
// PURPOSE: Parse requests, call services, return responses

use crate::config::Config;
use crate::db::{PropertyRepository, ReviewRepository};
use crate::errors::FindamError;
use crate::models::*;
use crate::services::auth;
use actix_web::{web, HttpRequest, HttpResponse, Responder};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

/// POST /properties
/// Create a new property (owner only, starts unpublished)
pub async fn create_property(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    http_req: HttpRequest,
    req: web::Json<CreatePropertyRequest>,
) -> Result<impl Responder, FindamError> {
    let claims = auth::authenticate(&http_req, &config)?;
    auth::require_owner(&claims)?;

    if let Err(e) = req.validate() {
        return Err(FindamError::ValidationError(e.to_string()));
    }

    if !property_type::is_valid(&req.property_type) {
        return Err(FindamError::ValidationError(format!(
            "Unknown property type '{}'",
            req.property_type
        )));
    }

    if !cancellation_policy::is_valid(&req.cancellation_policy) {
        return Err(FindamError::ValidationError(format!(
            "Unknown cancellation policy '{}'",
            req.cancellation_policy
        )));
    }

    let property =
        PropertyRepository::create_property(pool.get_ref(), claims.sub, &req).await?;
    Ok(HttpResponse::Created().json(property.to_response()))
}

/// GET /properties
/// Search published properties with filters
pub async fn search_properties(
    pool: web::Data<PgPool>,
    query: web::Query<PropertySearchQuery>,
) -> Result<impl Responder, FindamError> {
    let query = query.into_inner();
    let (properties, total_count) = PropertyRepository::search(pool.get_ref(), &query).await?;

    let limit = query.limit.unwrap_or(20).max(1);
    let page = query.page.unwrap_or(1).max(1);
    let has_more = total_count > page * limit;

    Ok(HttpResponse::Ok().json(PropertySearchResponse {
        data: properties.iter().map(|p| p.to_response()).collect(),
        total_count,
        page,
        limit,
        has_more,
    }))
}

/// GET /properties/mine
/// Properties of the authenticated owner, drafts included
pub async fn my_properties(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    http_req: HttpRequest,
) -> Result<impl Responder, FindamError> {
    let claims = auth::authenticate(&http_req, &config)?;
    auth::require_owner(&claims)?;

    let properties = PropertyRepository::list_by_owner(pool.get_ref(), claims.sub).await?;
    let responses: Vec<PropertyResponse> = properties.iter().map(|p| p.to_response()).collect();
    Ok(HttpResponse::Ok().json(responses))
}

/// GET /properties/{id}
/// Property detail with images and long-stay discounts
pub async fn get_property(
    pool: web::Data<PgPool>,
    path: web::Path<Uuid>,
) -> Result<impl Responder, FindamError> {
    let id = path.into_inner();
    let property = PropertyRepository::get_by_id(pool.get_ref(), id).await?;
    let images = PropertyRepository::get_images(pool.get_ref(), id).await?;
    let discounts = PropertyRepository::get_discounts(pool.get_ref(), id).await?;

    Ok(HttpResponse::Ok().json(PropertyDetailResponse {
        property: property.to_response(),
        images,
        long_stay_discounts: discounts,
    }))
}

/// PUT /properties/{id}
pub async fn update_property(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    http_req: HttpRequest,
    path: web::Path<Uuid>,
    req: web::Json<UpdatePropertyRequest>,
) -> Result<impl Responder, FindamError> {
    let claims = auth::authenticate(&http_req, &config)?;
    let id = path.into_inner();

    require_property_owner(pool.get_ref(), &claims, id).await?;

    if let Err(e) = req.validate() {
        return Err(FindamError::ValidationError(e.to_string()));
    }

    let property = PropertyRepository::update_property(pool.get_ref(), id, &req).await?;
    Ok(HttpResponse::Ok().json(property.to_response()))
}

/// DELETE /properties/{id}
pub async fn delete_property(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    http_req: HttpRequest,
    path: web::Path<Uuid>,
) -> Result<impl Responder, FindamError> {
    let claims = auth::authenticate(&http_req, &config)?;
    let id = path.into_inner();

    require_property_owner(pool.get_ref(), &claims, id).await?;

    PropertyRepository::delete_property(pool.get_ref(), id).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// POST /properties/{id}/publish
pub async fn publish_property(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    http_req: HttpRequest,
    path: web::Path<Uuid>,
) -> Result<impl Responder, FindamError> {
    let claims = auth::authenticate(&http_req, &config)?;
    let id = path.into_inner();

    require_property_owner(pool.get_ref(), &claims, id).await?;

    PropertyRepository::set_published(pool.get_ref(), id, true).await?;
    let property = PropertyRepository::get_by_id(pool.get_ref(), id).await?;
    Ok(HttpResponse::Ok().json(property.to_response()))
}

/// POST /properties/{id}/images
/// Register an image by URL
pub async fn add_image(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    http_req: HttpRequest,
    path: web::Path<Uuid>,
    req: web::Json<CreateImageRequest>,
) -> Result<impl Responder, FindamError> {
    let claims = auth::authenticate(&http_req, &config)?;
    let id = path.into_inner();

    require_property_owner(pool.get_ref(), &claims, id).await?;

    if let Err(e) = req.validate() {
        return Err(FindamError::ValidationError(e.to_string()));
    }

    let image = PropertyRepository::add_image(pool.get_ref(), id, &req).await?;
    Ok(HttpResponse::Created().json(image))
}

/// GET /properties/{id}/availability
/// Blocked periods of the property calendar
pub async fn get_availability(
    pool: web::Data<PgPool>,
    path: web::Path<Uuid>,
) -> Result<impl Responder, FindamError> {
    let id = path.into_inner();
    // 404 for unknown properties rather than an empty calendar
    let _ = PropertyRepository::get_by_id(pool.get_ref(), id).await?;

    let unavailabilities = PropertyRepository::get_unavailabilities(pool.get_ref(), id).await?;
    Ok(HttpResponse::Ok().json(unavailabilities))
}

/// POST /properties/{id}/availability
/// Block dates (external booking or owner block)
pub async fn block_dates(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    http_req: HttpRequest,
    path: web::Path<Uuid>,
    req: web::Json<CreateUnavailabilityRequest>,
) -> Result<impl Responder, FindamError> {
    let claims = auth::authenticate(&http_req, &config)?;
    let id = path.into_inner();

    require_property_owner(pool.get_ref(), &claims, id).await?;

    if req.end_date < req.start_date {
        return Err(FindamError::ValidationError(
            "End date must not precede start date".to_string(),
        ));
    }

    if !unavailability_type::is_valid(&req.booking_type)
        || req.booking_type == unavailability_type::BOOKING
    {
        return Err(FindamError::ValidationError(
            "booking_type must be 'external' or 'blocked'".to_string(),
        ));
    }

    let unavailability = PropertyRepository::add_unavailability(
        pool.get_ref(),
        id,
        req.start_date,
        req.end_date,
        &req.booking_type,
        None,
        req.external_client_name.as_deref(),
        req.external_client_phone.as_deref(),
        req.notes.as_deref(),
    )
    .await?;

    Ok(HttpResponse::Created().json(unavailability))
}

/// DELETE /properties/{id}/availability/{unavailability_id}
pub async fn unblock_dates(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    http_req: HttpRequest,
    path: web::Path<(Uuid, Uuid)>,
) -> Result<impl Responder, FindamError> {
    let claims = auth::authenticate(&http_req, &config)?;
    let (property_id, unavailability_id) = path.into_inner();

    require_property_owner(pool.get_ref(), &claims, property_id).await?;

    PropertyRepository::delete_unavailability(pool.get_ref(), property_id, unavailability_id)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

/// POST /properties/{id}/discounts
/// Add a long-stay discount tier
pub async fn add_discount(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    http_req: HttpRequest,
    path: web::Path<Uuid>,
    req: web::Json<CreateDiscountRequest>,
) -> Result<impl Responder, FindamError> {
    let claims = auth::authenticate(&http_req, &config)?;
    let id = path.into_inner();

    require_property_owner(pool.get_ref(), &claims, id).await?;

    if let Err(e) = req.validate() {
        return Err(FindamError::ValidationError(e.to_string()));
    }

    let discount = PropertyRepository::add_discount(pool.get_ref(), id, &req).await?;
    Ok(HttpResponse::Created().json(discount))
}

/// GET /properties/{id}/rating-breakdown
/// Per-category review averages
pub async fn rating_breakdown(
    pool: web::Data<PgPool>,
    path: web::Path<Uuid>,
) -> Result<impl Responder, FindamError> {
    let id = path.into_inner();
    let _ = PropertyRepository::get_by_id(pool.get_ref(), id).await?;

    let breakdown = ReviewRepository::get_rating_breakdown(pool.get_ref(), id).await?;
    Ok(HttpResponse::Ok().json(breakdown))
}

/// GET /cities
pub async fn list_cities(pool: web::Data<PgPool>) -> Result<impl Responder, FindamError> {
    let cities = PropertyRepository::list_cities(pool.get_ref()).await?;
    Ok(HttpResponse::Ok().json(cities))
}

/// GET /cities/{id}/neighborhoods
pub async fn list_neighborhoods(
    pool: web::Data<PgPool>,
    path: web::Path<i32>,
) -> Result<impl Responder, FindamError> {
    let neighborhoods =
        PropertyRepository::list_neighborhoods(pool.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(neighborhoods))
}

/// GET /amenities
pub async fn list_amenities(pool: web::Data<PgPool>) -> Result<impl Responder, FindamError> {
    let amenities = PropertyRepository::list_amenities(pool.get_ref()).await?;
    Ok(HttpResponse::Ok().json(amenities))
}

/// Helper: the acting user must own the property (admins pass)
async fn require_property_owner(
    pool: &PgPool,
    claims: &auth::Claims,
    property_id: Uuid,
) -> Result<(), FindamError> {
    let property = PropertyRepository::get_by_id(pool, property_id).await?;
    if property.owner_id != claims.sub && !claims.is_admin() {
        log::warn!(
            "User {} attempted to manage property {} they do not own",
            claims.sub,
            property_id
        );
        return Err(FindamError::Forbidden);
    }
    Ok(())
}

/// Configuration for property routes
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/properties")
            .route("", web::post().to(create_property))
            .route("", web::get().to(search_properties))
            .route("/mine", web::get().to(my_properties))
            .route("/{id}", web::get().to(get_property))
            .route("/{id}", web::put().to(update_property))
            .route("/{id}", web::delete().to(delete_property))
            .route("/{id}/publish", web::post().to(publish_property))
            .route("/{id}/images", web::post().to(add_image))
            .route("/{id}/availability", web::get().to(get_availability))
            .route("/{id}/availability", web::post().to(block_dates))
            .route(
                "/{id}/availability/{unavailability_id}",
                web::delete().to(unblock_dates),
            )
            .route("/{id}/discounts", web::post().to(add_discount))
            .route("/{id}/rating-breakdown", web::get().to(rating_breakdown)),
    )
    .route("/cities", web::get().to(list_cities))
    .route("/cities/{id}/neighborhoods", web::get().to(list_neighborhoods))
    .route("/amenities", web::get().to(list_amenities));
}
