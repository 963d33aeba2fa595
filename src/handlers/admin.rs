// src/handlers/admin.rs
// DOCUMENTATION: Admin handlers for platform operations
// PURPOSE: Statistics, identity verification, configuration and payout
// processing

use crate::config::Config;
use crate::db::{BookingRepository, ConfigRepository, PaymentRepository, UserRepository};
use crate::errors::FindamError;
use crate::models::*;
use crate::services::config_cache::ConfigCache;
use crate::services::{auth, PayoutService};
use actix_web::{web, HttpRequest, HttpResponse, Responder};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

/// GET /admin/stats
/// Platform statistics: bookings, properties, users, revenue
pub async fn platform_stats(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    http_req: HttpRequest,
) -> Result<impl Responder, FindamError> {
    let claims = auth::authenticate(&http_req, &config)?;
    auth::require_admin(&claims)?;

    let bookings_by_status = BookingRepository::count_by_status(pool.get_ref()).await?;

    #[derive(Debug, serde::Serialize, sqlx::FromRow)]
    struct CityCount {
        city_id: Option<i32>,
        count: Option<i64>,
    }

    let properties_by_city: Vec<CityCount> = sqlx::query_as(
        "SELECT city_id, COUNT(*) as count FROM findam_properties \
         WHERE is_published = true GROUP BY city_id ORDER BY count DESC LIMIT 10",
    )
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| FindamError::DatabaseError(e.to_string()))?;

    let user_count: (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM findam_users WHERE is_active = true")
            .fetch_one(pool.get_ref())
            .await
            .map_err(|e| FindamError::DatabaseError(e.to_string()))?;

    let revenue = PaymentRepository::total_completed_payments(pool.get_ref()).await?;

    let bookings: serde_json::Map<String, serde_json::Value> = bookings_by_status
        .into_iter()
        .map(|(status, count)| (status, serde_json::json!(count)))
        .collect();

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "bookings_by_status": bookings,
        "properties_by_city": properties_by_city,
        "active_users": user_count.0,
        "completed_payment_volume": revenue,
        "currency": "XAF",
    })))
}

/// GET /admin/pending-verifications
/// Identity submissions waiting for a decision
pub async fn pending_verifications(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    http_req: HttpRequest,
) -> Result<impl Responder, FindamError> {
    let claims = auth::authenticate(&http_req, &config)?;
    auth::require_admin(&claims)?;

    let profiles = UserRepository::list_pending_verifications(pool.get_ref()).await?;
    Ok(HttpResponse::Ok().json(profiles))
}

/// POST /admin/users/{id}/verify
/// Approve or reject an identity submission
pub async fn decide_verification(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    http_req: HttpRequest,
    path: web::Path<Uuid>,
    req: web::Json<VerificationDecisionRequest>,
) -> Result<impl Responder, FindamError> {
    let claims = auth::authenticate(&http_req, &config)?;
    auth::require_admin(&claims)?;

    let user_id = path.into_inner();
    UserRepository::apply_verification_decision(
        pool.get_ref(),
        user_id,
        req.approve,
        req.notes.as_deref(),
    )
    .await?;

    log::info!(
        "Identity verification for {} {} by {}",
        user_id,
        if req.approve { "approved" } else { "rejected" },
        claims.sub
    );

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "user_id": user_id,
        "verification_status": if req.approve { "verified" } else { "rejected" },
    })))
}

/// GET /admin/configs
pub async fn list_configs(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    http_req: HttpRequest,
) -> Result<impl Responder, FindamError> {
    let claims = auth::authenticate(&http_req, &config)?;
    auth::require_admin(&claims)?;

    let configs = ConfigRepository::list(pool.get_ref()).await?;
    Ok(HttpResponse::Ok().json(configs))
}

/// PUT /admin/configs/{key}
/// Update a configuration value and drop it from the cache
pub async fn set_config(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    config_cache: web::Data<Arc<ConfigCache>>,
    http_req: HttpRequest,
    path: web::Path<String>,
    req: web::Json<SetConfigRequest>,
) -> Result<impl Responder, FindamError> {
    let claims = auth::authenticate(&http_req, &config)?;
    auth::require_admin(&claims)?;

    let key = path.into_inner();
    let updated =
        ConfigRepository::set(pool.get_ref(), &key, &req.value, req.description.as_deref())
            .await?;
    config_cache.invalidate(&key).await;

    log::info!("Config '{}' set to '{}' by {}", key, req.value, claims.sub);
    Ok(HttpResponse::Ok().json(updated))
}

/// GET /admin/configs/cache-stats
pub async fn config_cache_stats(
    config: web::Data<Config>,
    config_cache: web::Data<Arc<ConfigCache>>,
    http_req: HttpRequest,
) -> Result<impl Responder, FindamError> {
    let claims = auth::authenticate(&http_req, &config)?;
    auth::require_admin(&claims)?;

    Ok(HttpResponse::Ok().json(config_cache.stats().await))
}

/// POST /admin/payouts/process
/// Trigger the payout sweep outside its schedule
pub async fn process_payouts(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    http_req: HttpRequest,
) -> Result<impl Responder, FindamError> {
    let claims = auth::authenticate(&http_req, &config)?;
    auth::require_admin(&claims)?;

    let processed = PayoutService::process_due_payouts(pool.get_ref()).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "processed": processed })))
}

/// GET /admin/commissions
pub async fn list_commissions(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    http_req: HttpRequest,
) -> Result<impl Responder, FindamError> {
    let claims = auth::authenticate(&http_req, &config)?;
    auth::require_admin(&claims)?;

    let commissions = PaymentRepository::list_commissions(pool.get_ref()).await?;
    Ok(HttpResponse::Ok().json(commissions))
}

/// Configuration for admin routes
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/admin")
            .route("/stats", web::get().to(platform_stats))
            .route("/pending-verifications", web::get().to(pending_verifications))
            .route("/users/{id}/verify", web::post().to(decide_verification))
            .route("/configs", web::get().to(list_configs))
            .route("/configs/cache-stats", web::get().to(config_cache_stats))
            .route("/configs/{key}", web::put().to(set_config))
            .route("/payouts/process", web::post().to(process_payouts))
            .route("/commissions", web::get().to(list_commissions)),
    );
}
