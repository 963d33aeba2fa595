// src/handlers/reviews.rs
// DOCUMENTATION: HTTP handlers for detailed property reviews

use crate::config::Config;
use crate::db::{BookingRepository, PropertyRepository, ReviewRepository};
use crate::errors::FindamError;
use crate::models::*;
use crate::services::auth;
use actix_web::{web, HttpRequest, HttpResponse, Responder};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

/// POST /reviews
/// Leave a detailed review on a property
pub async fn create_review(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    http_req: HttpRequest,
    req: web::Json<CreatePropertyReviewRequest>,
) -> Result<impl Responder, FindamError> {
    let claims = auth::authenticate(&http_req, &config)?;

    if let Err(e) = req.validate() {
        return Err(FindamError::ValidationError(e.to_string()));
    }

    let property = PropertyRepository::get_by_id(pool.get_ref(), req.property_id).await?;

    if property.owner_id == claims.sub {
        return Err(FindamError::ValidationError(
            "Owners cannot review their own property".to_string(),
        ));
    }

    // A completed stay marks the review as verified
    let completed = BookingRepository::list_for_tenant(
        pool.get_ref(),
        claims.sub,
        &BookingListQuery {
            status: Some("completed".to_string()),
            page: None,
            limit: Some(100),
        },
    )
    .await?
    .0
    .iter()
    .any(|b| b.property_id == req.property_id);

    let review =
        ReviewRepository::create_review(pool.get_ref(), claims.sub, completed, &req).await?;

    // Public detailed reviews feed the property average
    PropertyRepository::update_rating(pool.get_ref(), req.property_id, req.rating).await?;

    Ok(HttpResponse::Created().json(review))
}

/// GET /reviews/properties/{id}
/// Public reviews of a property, with owner replies
pub async fn property_reviews(
    pool: web::Data<PgPool>,
    path: web::Path<Uuid>,
) -> Result<impl Responder, FindamError> {
    let property_id = path.into_inner();
    let _ = PropertyRepository::get_by_id(pool.get_ref(), property_id).await?;

    let reviews = ReviewRepository::get_reviews_by_property(pool.get_ref(), property_id).await?;

    let mut responses = Vec::with_capacity(reviews.len());
    for review in reviews {
        let reply = ReviewRepository::get_reply(pool.get_ref(), review.id).await?;
        responses.push(review.to_response(reply));
    }

    Ok(HttpResponse::Ok().json(responses))
}

/// POST /reviews/{id}/reply
/// Owner answers a review on their property
pub async fn reply_to_review(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    http_req: HttpRequest,
    path: web::Path<Uuid>,
    req: web::Json<CreateReviewReplyRequest>,
) -> Result<impl Responder, FindamError> {
    let claims = auth::authenticate(&http_req, &config)?;

    if let Err(e) = req.validate() {
        return Err(FindamError::ValidationError(e.to_string()));
    }

    let review = ReviewRepository::get_by_id(pool.get_ref(), path.into_inner()).await?;
    let property = PropertyRepository::get_by_id(pool.get_ref(), review.property_id).await?;

    if property.owner_id != claims.sub {
        return Err(FindamError::Forbidden);
    }

    let reply =
        ReviewRepository::create_reply(pool.get_ref(), review.id, claims.sub, &req.content)
            .await?;
    Ok(HttpResponse::Created().json(reply))
}

/// Configuration for review routes
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/reviews")
            .route("", web::post().to(create_review))
            .route("/properties/{id}", web::get().to(property_reviews))
            .route("/{id}/reply", web::post().to(reply_to_review)),
    );
}
