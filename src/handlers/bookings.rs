// src/handlers/bookings.rs
// DOCUMENTATION: HTTP handlers for the booking lifecycle
// PURPOSE: Quotes, reservations, cancellations, reviews, promo codes
// and the HTML invoice

use crate::config::Config;
use crate::db::{BookingRepository, PropertyRepository, UserRepository};
use crate::errors::FindamError;
use crate::models::*;
use crate::services::config_cache::ConfigCache;
use crate::services::{auth, invoice, BookingService};
use actix_web::{web, HttpRequest, HttpResponse, Responder};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

/// POST /bookings/quote
/// Price a stay without booking it
pub async fn quote(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    config_cache: web::Data<Arc<ConfigCache>>,
    http_req: HttpRequest,
    req: web::Json<BookingRequest>,
) -> Result<impl Responder, FindamError> {
    let _ = auth::authenticate(&http_req, &config)?;

    if let Err(e) = req.validate() {
        return Err(FindamError::ValidationError(e.to_string()));
    }

    let quote = BookingService::quote(pool.get_ref(), config_cache.get_ref(), &req).await?;
    Ok(HttpResponse::Ok().json(quote))
}

/// POST /bookings
/// Create a pending booking
pub async fn create_booking(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    config_cache: web::Data<Arc<ConfigCache>>,
    http_req: HttpRequest,
    req: web::Json<BookingRequest>,
) -> Result<impl Responder, FindamError> {
    let claims = auth::authenticate(&http_req, &config)?;

    if let Err(e) = req.validate() {
        return Err(FindamError::ValidationError(e.to_string()));
    }

    let booking = BookingService::create_booking(
        pool.get_ref(),
        config_cache.get_ref(),
        claims.sub,
        &req,
    )
    .await?;
    Ok(HttpResponse::Created().json(booking))
}

/// GET /bookings
/// Bookings of the authenticated user (as tenant, or as owner of the
/// stayed properties)
pub async fn list_bookings(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    http_req: HttpRequest,
    query: web::Query<BookingListQuery>,
) -> Result<impl Responder, FindamError> {
    let claims = auth::authenticate(&http_req, &config)?;
    let query = query.into_inner();

    if let Some(status) = &query.status {
        if !booking_status::ALL.contains(&status.as_str()) {
            return Err(FindamError::ValidationError(format!(
                "Unknown booking status '{}'",
                status
            )));
        }
    }

    let (bookings, total_count) = if claims.is_owner() {
        BookingRepository::list_for_owner(pool.get_ref(), claims.sub, &query).await?
    } else {
        BookingRepository::list_for_tenant(pool.get_ref(), claims.sub, &query).await?
    };

    let limit = query.limit.unwrap_or(20).max(1);
    let page = query.page.unwrap_or(1).max(1);

    Ok(HttpResponse::Ok().json(BookingListResponse {
        data: bookings.iter().map(|b| b.to_response()).collect(),
        total_count,
        page,
        limit,
        has_more: total_count > page * limit,
    }))
}

/// GET /bookings/{id}
pub async fn get_booking(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    http_req: HttpRequest,
    path: web::Path<Uuid>,
) -> Result<impl Responder, FindamError> {
    let claims = auth::authenticate(&http_req, &config)?;

    let booking = load_booking_for(pool.get_ref(), &claims, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(booking.to_response()))
}

/// POST /bookings/{id}/confirm
/// Owner accepts the reservation
pub async fn confirm_booking(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    http_req: HttpRequest,
    path: web::Path<Uuid>,
) -> Result<impl Responder, FindamError> {
    let claims = auth::authenticate(&http_req, &config)?;

    let booking =
        BookingService::confirm_booking(pool.get_ref(), claims.sub, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(booking))
}

/// POST /bookings/{id}/cancel
/// Either party cancels; the policy decides the refund
pub async fn cancel_booking(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    config_cache: web::Data<Arc<ConfigCache>>,
    http_req: HttpRequest,
    path: web::Path<Uuid>,
    req: web::Json<CancelBookingRequest>,
) -> Result<impl Responder, FindamError> {
    let claims = auth::authenticate(&http_req, &config)?;

    let outcome = BookingService::cancel_booking(
        pool.get_ref(),
        config_cache.get_ref(),
        claims.sub,
        path.into_inner(),
        req.reason.as_deref(),
    )
    .await?;
    Ok(HttpResponse::Ok().json(outcome))
}

/// POST /bookings/{id}/complete
pub async fn complete_booking(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    http_req: HttpRequest,
    path: web::Path<Uuid>,
) -> Result<impl Responder, FindamError> {
    let claims = auth::authenticate(&http_req, &config)?;

    let booking =
        BookingService::complete_booking(pool.get_ref(), claims.sub, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(booking))
}

/// GET /bookings/{id}/invoice
/// Server-rendered HTML receipt for the booking
pub async fn booking_invoice(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    http_req: HttpRequest,
    path: web::Path<Uuid>,
) -> Result<impl Responder, FindamError> {
    let claims = auth::authenticate(&http_req, &config)?;

    let booking = load_booking_for(pool.get_ref(), &claims, path.into_inner()).await?;
    let property = PropertyRepository::get_by_id(pool.get_ref(), booking.property_id).await?;
    let tenant = UserRepository::get_by_id(pool.get_ref(), booking.tenant_id).await?;
    let owner = UserRepository::get_by_id(pool.get_ref(), property.owner_id).await?;

    let html = invoice::render_invoice(&booking, &property, &tenant, &owner);

    Ok(HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(html))
}

/// POST /bookings/{id}/review
pub async fn review_booking(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    http_req: HttpRequest,
    path: web::Path<Uuid>,
    req: web::Json<CreateBookingReviewRequest>,
) -> Result<impl Responder, FindamError> {
    let claims = auth::authenticate(&http_req, &config)?;

    if let Err(e) = req.validate() {
        return Err(FindamError::ValidationError(e.to_string()));
    }

    let review =
        BookingService::review_booking(pool.get_ref(), claims.sub, path.into_inner(), &req)
            .await?;
    Ok(HttpResponse::Created().json(review))
}

/// GET /bookings/{id}/reviews
pub async fn booking_reviews(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    http_req: HttpRequest,
    path: web::Path<Uuid>,
) -> Result<impl Responder, FindamError> {
    let claims = auth::authenticate(&http_req, &config)?;

    let booking = load_booking_for(pool.get_ref(), &claims, path.into_inner()).await?;
    let reviews = BookingRepository::get_booking_reviews(pool.get_ref(), booking.id).await?;
    Ok(HttpResponse::Ok().json(reviews))
}

/// POST /promo-codes
/// Issue a promo code (owner of the property only)
pub async fn create_promo_code(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    http_req: HttpRequest,
    req: web::Json<CreatePromoCodeRequest>,
) -> Result<impl Responder, FindamError> {
    let claims = auth::authenticate(&http_req, &config)?;
    auth::require_owner(&claims)?;

    if let Err(e) = req.validate() {
        return Err(FindamError::ValidationError(e.to_string()));
    }

    let property = PropertyRepository::get_by_id(pool.get_ref(), req.property_id).await?;
    if property.owner_id != claims.sub {
        return Err(FindamError::Forbidden);
    }

    let promo = BookingRepository::create_promo_code(pool.get_ref(), claims.sub, &req).await?;
    Ok(HttpResponse::Created().json(promo))
}

/// GET /promo-codes
/// Promo codes issued on the owner's properties
pub async fn list_promo_codes(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    http_req: HttpRequest,
) -> Result<impl Responder, FindamError> {
    let claims = auth::authenticate(&http_req, &config)?;
    auth::require_owner(&claims)?;

    let promos = BookingRepository::list_promo_codes_for_owner(pool.get_ref(), claims.sub).await?;
    Ok(HttpResponse::Ok().json(promos))
}

/// POST /promo-codes/validate
/// Check a code against a property before booking
pub async fn validate_promo_code(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    http_req: HttpRequest,
    req: web::Json<ValidatePromoCodeRequest>,
) -> Result<impl Responder, FindamError> {
    let _ = auth::authenticate(&http_req, &config)?;

    let promo = BookingRepository::get_promo_by_code(pool.get_ref(), &req.code).await?;
    let valid = promo.is_valid() && promo.property_id == req.property_id;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "code": promo.code,
        "valid": valid,
        "discount_percentage": if valid { Some(promo.discount_percentage) } else { None },
        "expiry_date": promo.expiry_date,
    })))
}

/// DELETE /promo-codes/{id}
/// Deactivate a promo code before its expiry
pub async fn deactivate_promo_code(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    http_req: HttpRequest,
    path: web::Path<Uuid>,
) -> Result<impl Responder, FindamError> {
    let claims = auth::authenticate(&http_req, &config)?;
    auth::require_owner(&claims)?;

    let promo = BookingRepository::get_promo_by_id(pool.get_ref(), path.into_inner()).await?;
    let property = PropertyRepository::get_by_id(pool.get_ref(), promo.property_id).await?;
    if property.owner_id != claims.sub && !claims.is_admin() {
        return Err(FindamError::Forbidden);
    }

    BookingRepository::set_promo_active(pool.get_ref(), promo.id, false).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Load a booking the user is allowed to see (tenant, owner or admin)
async fn load_booking_for(
    pool: &PgPool,
    claims: &auth::Claims,
    booking_id: Uuid,
) -> Result<Booking, FindamError> {
    let booking = BookingRepository::get_by_id(pool, booking_id).await?;
    let property = PropertyRepository::get_by_id(pool, booking.property_id).await?;

    if booking.tenant_id != claims.sub && property.owner_id != claims.sub && !claims.is_admin() {
        return Err(FindamError::Forbidden);
    }

    Ok(booking)
}

/// Configuration for booking routes
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/bookings")
            .route("", web::post().to(create_booking))
            .route("", web::get().to(list_bookings))
            .route("/quote", web::post().to(quote))
            .route("/{id}", web::get().to(get_booking))
            .route("/{id}/confirm", web::post().to(confirm_booking))
            .route("/{id}/cancel", web::post().to(cancel_booking))
            .route("/{id}/complete", web::post().to(complete_booking))
            .route("/{id}/invoice", web::get().to(booking_invoice))
            .route("/{id}/review", web::post().to(review_booking))
            .route("/{id}/reviews", web::get().to(booking_reviews)),
    )
    .service(
        web::scope("/promo-codes")
            .route("", web::post().to(create_promo_code))
            .route("", web::get().to(list_promo_codes))
            .route("/validate", web::post().to(validate_promo_code))
            .route("/{id}", web::delete().to(deactivate_promo_code)),
    );
}
