// src/handlers/auth.rs
// DOCUMENTATION: HTTP handlers for registration, login and profiles
// PURPOSE: Parse requests, call services, return responses

use crate::config::Config;
use crate::db::UserRepository;
use crate::errors::FindamError;
use crate::models::*;
use crate::services::{auth, notchpay, PayoutService};
use actix_web::{web, HttpRequest, HttpResponse, Responder};
use sqlx::PgPool;
use validator::Validate;

/// POST /auth/register
/// Create a tenant or owner account
pub async fn register(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    req: web::Json<RegisterRequest>,
) -> Result<impl Responder, FindamError> {
    if let Err(e) = req.validate() {
        return Err(FindamError::ValidationError(e.to_string()));
    }

    // Admin accounts are provisioned manually
    if !user_type::is_valid(&req.user_type) || req.user_type == user_type::ADMIN {
        return Err(FindamError::ValidationError(
            "user_type must be 'tenant' or 'owner'".to_string(),
        ));
    }

    let phone = notchpay::format_phone_number(&req.phone_number);
    if phone.len() != 12 || !phone.starts_with("2376") {
        return Err(FindamError::ValidationError(
            "Phone number must be a Cameroonian mobile number".to_string(),
        ));
    }

    let password_hash = auth::hash_password(&req.password)?;

    let user = UserRepository::create_user(
        pool.get_ref(),
        &req.email,
        &phone,
        &password_hash,
        &req.first_name,
        &req.last_name,
        &req.user_type,
    )
    .await?;

    let tokens = auth::generate_token_pair(&config, &user)?;

    Ok(HttpResponse::Created().json(serde_json::json!({
        "user": user.to_response(),
        "tokens": tokens,
    })))
}

/// POST /auth/login
/// Exchange credentials for a token pair
pub async fn login(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    req: web::Json<LoginRequest>,
) -> Result<impl Responder, FindamError> {
    if let Err(e) = req.validate() {
        return Err(FindamError::ValidationError(e.to_string()));
    }

    // A wrong email and a wrong password answer identically
    let user = match UserRepository::get_by_email(pool.get_ref(), &req.email).await {
        Ok(user) => user,
        Err(FindamError::NotFound(_)) => return Err(FindamError::Unauthorized),
        Err(e) => return Err(e),
    };

    if !auth::verify_password(&req.password, &user.password_hash)? {
        log::warn!("Failed login attempt for {}", req.email);
        return Err(FindamError::Unauthorized);
    }

    UserRepository::touch_last_login(pool.get_ref(), user.id).await?;

    let tokens = auth::generate_token_pair(&config, &user)?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "user": user.to_response(),
        "tokens": tokens,
    })))
}

/// POST /auth/refresh
/// Issue a fresh token pair from a refresh token
pub async fn refresh(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    req: web::Json<RefreshRequest>,
) -> Result<impl Responder, FindamError> {
    let claims = auth::decode_token(&config, &req.refresh_token, auth::token_kind::REFRESH)?;

    // The account may have been deactivated since the token was issued
    let user = UserRepository::get_by_id(pool.get_ref(), claims.sub).await?;

    let tokens = auth::generate_token_pair(&config, &user)?;
    Ok(HttpResponse::Ok().json(tokens))
}

/// GET /auth/profile
pub async fn get_profile(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    http_req: HttpRequest,
) -> Result<impl Responder, FindamError> {
    let claims = auth::authenticate(&http_req, &config)?;

    let user = UserRepository::get_by_id(pool.get_ref(), claims.sub).await?;
    let profile = UserRepository::get_profile(pool.get_ref(), claims.sub).await?;

    Ok(HttpResponse::Ok().json(ProfileResponse {
        user: user.to_response(),
        bio: profile.bio,
        birth_date: profile.birth_date,
        city: profile.city,
        country: profile.country,
        verification_status: profile.verification_status,
        avg_rating: profile.avg_rating,
        rating_count: profile.rating_count,
    }))
}

/// PUT /auth/profile
pub async fn update_profile(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    http_req: HttpRequest,
    req: web::Json<UpdateProfileRequest>,
) -> Result<impl Responder, FindamError> {
    let claims = auth::authenticate(&http_req, &config)?;

    if let Err(e) = req.validate() {
        return Err(FindamError::ValidationError(e.to_string()));
    }

    let profile = UserRepository::update_profile(pool.get_ref(), claims.sub, &req).await?;
    Ok(HttpResponse::Ok().json(profile))
}

/// POST /auth/change-password
pub async fn change_password(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    http_req: HttpRequest,
    req: web::Json<ChangePasswordRequest>,
) -> Result<impl Responder, FindamError> {
    let claims = auth::authenticate(&http_req, &config)?;

    if let Err(e) = req.validate() {
        return Err(FindamError::ValidationError(e.to_string()));
    }

    let user = UserRepository::get_by_id(pool.get_ref(), claims.sub).await?;

    if !auth::verify_password(&req.current_password, &user.password_hash)? {
        return Err(FindamError::Unauthorized);
    }

    let new_hash = auth::hash_password(&req.new_password)?;
    UserRepository::update_password(pool.get_ref(), user.id, &new_hash).await?;

    log::info!("Password changed for user {}", user.id);
    Ok(HttpResponse::NoContent().finish())
}

/// POST /auth/verify-identity
/// Submit identity information for manual review
pub async fn verify_identity(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    http_req: HttpRequest,
    req: web::Json<IdentityVerificationRequest>,
) -> Result<impl Responder, FindamError> {
    let claims = auth::authenticate(&http_req, &config)?;

    if let Err(e) = req.validate() {
        return Err(FindamError::ValidationError(e.to_string()));
    }

    UserRepository::submit_identity_verification(pool.get_ref(), claims.sub, &req.id_card_number)
        .await?;

    Ok(HttpResponse::Accepted().json(serde_json::json!({
        "status": "pending",
        "message": "Identity submitted for verification"
    })))
}

/// POST /auth/subscriptions
/// Subscribe the authenticated owner to a plan
pub async fn subscribe(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    http_req: HttpRequest,
    req: web::Json<SubscribeRequest>,
) -> Result<impl Responder, FindamError> {
    let claims = auth::authenticate(&http_req, &config)?;
    auth::require_owner(&claims)?;

    let subscription =
        PayoutService::subscribe_owner(pool.get_ref(), claims.sub, &req.subscription_type).await?;

    Ok(HttpResponse::Created().json(subscription))
}

/// GET /auth/subscriptions/current
pub async fn current_subscription(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    http_req: HttpRequest,
) -> Result<impl Responder, FindamError> {
    let claims = auth::authenticate(&http_req, &config)?;
    auth::require_owner(&claims)?;

    let subscription =
        UserRepository::get_active_subscription(pool.get_ref(), claims.sub).await?;

    match subscription {
        Some(subscription) if subscription.is_active() => {
            Ok(HttpResponse::Ok().json(subscription))
        }
        _ => Ok(HttpResponse::Ok().json(serde_json::json!({
            "subscription_type": subscription_type::FREE,
            "status": "active",
        }))),
    }
}

/// Configuration for auth routes
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .route("/register", web::post().to(register))
            .route("/login", web::post().to(login))
            .route("/refresh", web::post().to(refresh))
            .route("/profile", web::get().to(get_profile))
            .route("/profile", web::put().to(update_profile))
            .route("/change-password", web::post().to(change_password))
            .route("/verify-identity", web::post().to(verify_identity))
            .route("/subscriptions", web::post().to(subscribe))
            .route("/subscriptions/current", web::get().to(current_subscription)),
    );
}
