// src/handlers/payments.rs
// DOCUMENTATION: HTTP handlers for payments, transactions and payouts
// PURPOSE: Parse requests, call services, return responses

use crate::config::Config;
use crate::db::PaymentRepository;
use crate::errors::FindamError;
use crate::models::*;
use crate::services::{auth, NotchPayClient, PaymentService, PayoutService};
use actix_web::{web, HttpRequest, HttpResponse, Responder};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

/// POST /payments/init
/// Start a Mobile Money payment for a booking
pub async fn init_payment(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    notchpay: web::Data<Arc<NotchPayClient>>,
    http_req: HttpRequest,
    req: web::Json<InitPaymentRequest>,
) -> Result<impl Responder, FindamError> {
    let claims = auth::authenticate(&http_req, &config)?;

    if let Err(e) = req.validate() {
        return Err(FindamError::ValidationError(e.to_string()));
    }

    if config.notchpay_public_key.is_empty() {
        return Err(FindamError::PaymentGatewayError(
            "Payment gateway not configured".to_string(),
        ));
    }

    let callback_url = format!("{}/api/v1/webhooks/notchpay", config.public_base_url);

    let response = PaymentService::init_booking_payment(
        pool.get_ref(),
        notchpay.get_ref(),
        claims.sub,
        &req,
        &callback_url,
    )
    .await?;

    Ok(HttpResponse::Ok().json(response))
}

/// POST /payments/verify/{reference}
/// Re-check a payment against the gateway
pub async fn verify_payment(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    notchpay: web::Data<Arc<NotchPayClient>>,
    http_req: HttpRequest,
    path: web::Path<String>,
) -> Result<impl Responder, FindamError> {
    let _ = auth::authenticate(&http_req, &config)?;

    let transaction =
        PaymentService::verify_payment(pool.get_ref(), notchpay.get_ref(), &path.into_inner())
            .await?;
    Ok(HttpResponse::Ok().json(transaction))
}

/// GET /payments/channels
/// Mobile Money channels currently available on the gateway
pub async fn payment_channels(
    config: web::Data<Config>,
    notchpay: web::Data<Arc<NotchPayClient>>,
    http_req: HttpRequest,
) -> Result<impl Responder, FindamError> {
    let _ = auth::authenticate(&http_req, &config)?;

    let channels = notchpay.get_payment_channels().await?;
    Ok(HttpResponse::Ok().json(channels))
}

/// GET /payments/transactions
/// Ledger entries of the authenticated user
pub async fn list_transactions(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    http_req: HttpRequest,
    query: web::Query<TransactionListQuery>,
) -> Result<impl Responder, FindamError> {
    let claims = auth::authenticate(&http_req, &config)?;

    let transactions =
        PaymentRepository::list_transactions(pool.get_ref(), claims.sub, &query).await?;
    Ok(HttpResponse::Ok().json(transactions))
}

/// POST /payments/methods
pub async fn create_payment_method(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    http_req: HttpRequest,
    req: web::Json<CreatePaymentMethodRequest>,
) -> Result<impl Responder, FindamError> {
    let claims = auth::authenticate(&http_req, &config)?;

    if let Err(e) = req.validate() {
        return Err(FindamError::ValidationError(e.to_string()));
    }

    if !payment_method_type::is_valid(&req.payment_type) {
        return Err(FindamError::ValidationError(format!(
            "Unknown payment type '{}'",
            req.payment_type
        )));
    }

    let method =
        PaymentRepository::create_payment_method(pool.get_ref(), claims.sub, &req).await?;
    Ok(HttpResponse::Created().json(method))
}

/// GET /payments/methods
pub async fn list_payment_methods(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    http_req: HttpRequest,
) -> Result<impl Responder, FindamError> {
    let claims = auth::authenticate(&http_req, &config)?;

    let methods = PaymentRepository::list_payment_methods(pool.get_ref(), claims.sub).await?;
    Ok(HttpResponse::Ok().json(methods))
}

/// PUT /payments/methods/{id}/default
pub async fn set_default_payment_method(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    http_req: HttpRequest,
    path: web::Path<Uuid>,
) -> Result<impl Responder, FindamError> {
    let claims = auth::authenticate(&http_req, &config)?;

    let method = PaymentRepository::set_default_payment_method(
        pool.get_ref(),
        claims.sub,
        path.into_inner(),
    )
    .await?;
    Ok(HttpResponse::Ok().json(method))
}

/// DELETE /payments/methods/{id}
pub async fn delete_payment_method(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    http_req: HttpRequest,
    path: web::Path<Uuid>,
) -> Result<impl Responder, FindamError> {
    let claims = auth::authenticate(&http_req, &config)?;

    PaymentRepository::delete_payment_method(pool.get_ref(), claims.sub, path.into_inner())
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

/// GET /payments/payouts
/// Payouts of the authenticated owner
pub async fn list_payouts(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    http_req: HttpRequest,
) -> Result<impl Responder, FindamError> {
    let claims = auth::authenticate(&http_req, &config)?;
    auth::require_owner(&claims)?;

    let payouts = PaymentRepository::list_payouts_for_owner(pool.get_ref(), claims.sub).await?;
    Ok(HttpResponse::Ok().json(payouts))
}

/// POST /payments/payouts/build
/// Assemble a payout from the owner's finished stays
pub async fn build_payout(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    http_req: HttpRequest,
) -> Result<impl Responder, FindamError> {
    let claims = auth::authenticate(&http_req, &config)?;
    auth::require_owner(&claims)?;

    match PayoutService::build_payout_for_owner(pool.get_ref(), claims.sub).await? {
        Some(payout) => Ok(HttpResponse::Created().json(payout)),
        None => Ok(HttpResponse::Ok().json(serde_json::json!({
            "message": "No finished stay awaiting payout"
        }))),
    }
}

/// Configuration for payment routes
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/payments")
            .route("/init", web::post().to(init_payment))
            .route("/verify/{reference}", web::post().to(verify_payment))
            .route("/channels", web::get().to(payment_channels))
            .route("/transactions", web::get().to(list_transactions))
            .route("/methods", web::post().to(create_payment_method))
            .route("/methods", web::get().to(list_payment_methods))
            .route("/methods/{id}", web::delete().to(delete_payment_method))
            .route(
                "/methods/{id}/default",
                web::put().to(set_default_payment_method),
            )
            .route("/payouts", web::get().to(list_payouts))
            .route("/payouts/build", web::post().to(build_payout)),
    );
}
