// src/handlers/messages.rs
// DOCUMENTATION: HTTP handlers for conversations and messages
// PURPOSE: REST messaging with contact-information filtering

use crate::config::Config;
use crate::db::{ConversationRepository, PropertyRepository, UserRepository};
use crate::errors::FindamError;
use crate::models::*;
use crate::services::{auth, message_filter};
use actix_web::{web, HttpRequest, HttpResponse, Responder};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

/// POST /conversations
/// Start (or reuse) a conversation with another user
pub async fn start_conversation(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    http_req: HttpRequest,
    req: web::Json<StartConversationRequest>,
) -> Result<impl Responder, FindamError> {
    let claims = auth::authenticate(&http_req, &config)?;

    if req.recipient_id == claims.sub {
        return Err(FindamError::ValidationError(
            "Cannot start a conversation with yourself".to_string(),
        ));
    }

    // Both sides must exist
    let _ = UserRepository::get_by_id(pool.get_ref(), req.recipient_id).await?;
    if let Some(property_id) = req.property_id {
        let _ = PropertyRepository::get_by_id(pool.get_ref(), property_id).await?;
    }

    let conversation = ConversationRepository::find_or_create(
        pool.get_ref(),
        claims.sub,
        req.recipient_id,
        req.property_id,
    )
    .await?;

    if let Some(first_message) = &req.message {
        send_filtered(
            pool.get_ref(),
            &conversation,
            claims.sub,
            first_message,
            message_type::TEXT,
        )
        .await?;
    }

    Ok(HttpResponse::Created().json(conversation))
}

/// GET /conversations
/// Conversations of the authenticated user with unread counts
pub async fn list_conversations(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    http_req: HttpRequest,
) -> Result<impl Responder, FindamError> {
    let claims = auth::authenticate(&http_req, &config)?;

    let conversations =
        ConversationRepository::list_for_user(pool.get_ref(), claims.sub).await?;

    let mut responses = Vec::with_capacity(conversations.len());
    for conversation in conversations {
        let unread =
            ConversationRepository::unread_count(pool.get_ref(), conversation.id, claims.sub)
                .await?;
        responses.push(ConversationResponse {
            id: conversation.id,
            property_id: conversation.property_id,
            other_participant: conversation.other_participant(claims.sub),
            is_active: conversation.is_active,
            unread_count: unread,
            updated_at: conversation.updated_at,
        });
    }

    Ok(HttpResponse::Ok().json(responses))
}

/// GET /conversations/{id}/messages
/// Messages of a conversation; reading marks them as read
pub async fn list_messages(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    http_req: HttpRequest,
    path: web::Path<Uuid>,
) -> Result<impl Responder, FindamError> {
    let claims = auth::authenticate(&http_req, &config)?;

    let conversation = ConversationRepository::get_by_id(pool.get_ref(), path.into_inner()).await?;
    if !conversation.includes(claims.sub) {
        return Err(FindamError::Forbidden);
    }

    ConversationRepository::mark_read(pool.get_ref(), conversation.id, claims.sub).await?;
    let messages = ConversationRepository::list_messages(pool.get_ref(), conversation.id).await?;
    Ok(HttpResponse::Ok().json(messages))
}

/// POST /conversations/{id}/messages
/// Send a message through the contact filter
pub async fn send_message(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    http_req: HttpRequest,
    path: web::Path<Uuid>,
    req: web::Json<SendMessageRequest>,
) -> Result<impl Responder, FindamError> {
    let claims = auth::authenticate(&http_req, &config)?;

    if let Err(e) = req.validate() {
        return Err(FindamError::ValidationError(e.to_string()));
    }

    if !message_type::is_valid(&req.message_type) {
        return Err(FindamError::ValidationError(format!(
            "Unknown message type '{}'",
            req.message_type
        )));
    }

    let conversation = ConversationRepository::get_by_id(pool.get_ref(), path.into_inner()).await?;
    if !conversation.includes(claims.sub) {
        return Err(FindamError::Forbidden);
    }

    let message = send_filtered(
        pool.get_ref(),
        &conversation,
        claims.sub,
        &req.content,
        &req.message_type,
    )
    .await?;

    Ok(HttpResponse::Created().json(message))
}

/// Run a message through the contact filter and store it
async fn send_filtered(
    pool: &PgPool,
    conversation: &Conversation,
    sender_id: Uuid,
    content: &str,
    kind: &str,
) -> Result<Message, FindamError> {
    let other = conversation.other_participant(sender_id);
    let booking_confirmed =
        ConversationRepository::have_confirmed_booking(pool, sender_id, other).await?;

    let outcome = message_filter::filter_message_content(content, booking_confirmed);
    if outcome.was_filtered {
        log::info!(
            "Message in conversation {} filtered ({})",
            conversation.id,
            outcome.flags.join(", ")
        );
    }

    ConversationRepository::add_message(
        pool,
        conversation.id,
        sender_id,
        &outcome.content,
        kind,
        outcome.was_filtered,
    )
    .await
}

/// Configuration for messaging routes
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/conversations")
            .route("", web::post().to(start_conversation))
            .route("", web::get().to(list_conversations))
            .route("/{id}/messages", web::get().to(list_messages))
            .route("/{id}/messages", web::post().to(send_message)),
    );
}
