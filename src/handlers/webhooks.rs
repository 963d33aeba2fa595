// src/handlers/webhooks.rs
// DOCUMENTATION: Payment gateway webhook endpoint
// PURPOSE: Receive NotchPay events, verify their signature and sync
// payment state

use crate::errors::FindamError;
use crate::services::{NotchPayClient, PaymentService};
use actix_web::{web, HttpRequest, HttpResponse, Responder};
use sqlx::PgPool;
use std::sync::Arc;

/// POST /webhooks/notchpay
/// DOCUMENTATION: The body must be read raw - the signature covers the
/// exact bytes NotchPay sent
pub async fn notchpay_webhook(
    pool: web::Data<PgPool>,
    notchpay: web::Data<Arc<NotchPayClient>>,
    http_req: HttpRequest,
    body: web::Bytes,
) -> Result<impl Responder, FindamError> {
    let signature = http_req
        .headers()
        .get("X-Notch-Signature")
        .and_then(|h| h.to_str().ok())
        .unwrap_or("");

    if !notchpay.verify_webhook_signature(&body, signature) {
        log::warn!("Webhook with missing or invalid signature rejected");
        return Err(FindamError::Unauthorized);
    }

    let event: serde_json::Value = serde_json::from_slice(&body).map_err(|e| {
        log::error!("Webhook body is not valid JSON: {}", e);
        FindamError::InvalidInput("Invalid webhook body".to_string())
    })?;

    let event_type = event
        .get("event")
        .and_then(|e| e.as_str())
        .unwrap_or("unknown");
    log::info!("NotchPay webhook received: {}", event_type);

    match PaymentService::handle_webhook_event(pool.get_ref(), &event).await {
        Ok(()) => {}
        // Unknown references happen when webhooks outlive their
        // transaction records; acknowledge so the gateway stops retrying
        Err(FindamError::NotFound(reference)) => {
            log::warn!("Webhook for unknown payment ignored: {}", reference);
        }
        Err(e) => return Err(e),
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({ "received": true })))
}

/// Configuration for webhook routes
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/webhooks").route("/notchpay", web::post().to(notchpay_webhook)),
    );
}
