// src/db/conversation_repository.rs
// DOCUMENTATION: Conversation and message database operations

use crate::errors::FindamError;
use crate::models::{Conversation, Message};
use sqlx::PgPool;
use uuid::Uuid;

pub struct ConversationRepository;

impl ConversationRepository {
    /// Find an existing conversation between two users about a property,
    /// or create one
    pub async fn find_or_create(
        pool: &PgPool,
        user_a: Uuid,
        user_b: Uuid,
        property_id: Option<Uuid>,
    ) -> Result<Conversation, FindamError> {
        let existing = sqlx::query_as::<_, Conversation>(
            r#"
            SELECT * FROM findam_conversations
            WHERE ((participant_a = $1 AND participant_b = $2)
                OR (participant_a = $2 AND participant_b = $1))
              AND (property_id IS NOT DISTINCT FROM $3)
            LIMIT 1
            "#,
        )
        .bind(user_a)
        .bind(user_b)
        .bind(property_id)
        .fetch_optional(pool)
        .await
        .map_err(|e| {
            log::error!("Conversation lookup failed: {}", e);
            FindamError::DatabaseError(e.to_string())
        })?;

        if let Some(conversation) = existing {
            return Ok(conversation);
        }

        sqlx::query_as::<_, Conversation>(
            r#"
            INSERT INTO findam_conversations (
                id, property_id, participant_a, participant_b, is_active,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, true, NOW(), NOW())
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(property_id)
        .bind(user_a)
        .bind(user_b)
        .fetch_one(pool)
        .await
        .map_err(|e| {
            log::error!("Failed to create conversation: {}", e);
            FindamError::DatabaseError(e.to_string())
        })
    }

    /// Retrieve a conversation by id
    pub async fn get_by_id(pool: &PgPool, id: Uuid) -> Result<Conversation, FindamError> {
        sqlx::query_as::<_, Conversation>("SELECT * FROM findam_conversations WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(|e| {
                log::error!("Database error fetching conversation: {}", e);
                FindamError::DatabaseError(e.to_string())
            })?
            .ok_or_else(|| FindamError::NotFound(format!("Conversation {}", id)))
    }

    /// Conversations of a user, most recently active first
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: Uuid,
    ) -> Result<Vec<Conversation>, FindamError> {
        sqlx::query_as::<_, Conversation>(
            r#"
            SELECT * FROM findam_conversations
            WHERE (participant_a = $1 OR participant_b = $1) AND is_active = true
            ORDER BY updated_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
        .map_err(|e| {
            log::error!("Failed to list conversations for {}: {}", user_id, e);
            FindamError::DatabaseError(e.to_string())
        })
    }

    /// Append a message and bump the conversation timestamp
    pub async fn add_message(
        pool: &PgPool,
        conversation_id: Uuid,
        sender_id: Uuid,
        content: &str,
        message_type: &str,
        is_filtered: bool,
    ) -> Result<Message, FindamError> {
        let mut tx = pool.begin().await.map_err(|e| {
            log::error!("Failed to open transaction: {}", e);
            FindamError::DatabaseError(e.to_string())
        })?;

        let message = sqlx::query_as::<_, Message>(
            r#"
            INSERT INTO findam_messages (
                id, conversation_id, sender_id, content, message_type,
                is_filtered, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, NOW())
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(conversation_id)
        .bind(sender_id)
        .bind(content)
        .bind(message_type)
        .bind(is_filtered)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            log::error!("Failed to create message: {}", e);
            FindamError::DatabaseError(e.to_string())
        })?;

        sqlx::query("UPDATE findam_conversations SET updated_at = NOW() WHERE id = $1")
            .bind(conversation_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                log::error!("Failed to bump conversation {}: {}", conversation_id, e);
                FindamError::DatabaseError(e.to_string())
            })?;

        tx.commit().await.map_err(|e| {
            log::error!("Failed to commit message: {}", e);
            FindamError::DatabaseError(e.to_string())
        })?;

        Ok(message)
    }

    /// Messages of a conversation, oldest first
    pub async fn list_messages(
        pool: &PgPool,
        conversation_id: Uuid,
    ) -> Result<Vec<Message>, FindamError> {
        sqlx::query_as::<_, Message>(
            r#"
            SELECT * FROM findam_messages
            WHERE conversation_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(conversation_id)
        .fetch_all(pool)
        .await
        .map_err(|e| {
            log::error!("Failed to list messages for {}: {}", conversation_id, e);
            FindamError::DatabaseError(e.to_string())
        })
    }

    /// Mark every message from the other participant as read
    pub async fn mark_read(
        pool: &PgPool,
        conversation_id: Uuid,
        reader_id: Uuid,
    ) -> Result<u64, FindamError> {
        let result = sqlx::query(
            r#"
            UPDATE findam_messages
            SET read_at = NOW()
            WHERE conversation_id = $1 AND sender_id <> $2 AND read_at IS NULL
            "#,
        )
        .bind(conversation_id)
        .bind(reader_id)
        .execute(pool)
        .await
        .map_err(|e| {
            log::error!("Failed to mark messages read in {}: {}", conversation_id, e);
            FindamError::DatabaseError(e.to_string())
        })?;

        Ok(result.rows_affected())
    }

    /// Unread message count for a user in one conversation
    pub async fn unread_count(
        pool: &PgPool,
        conversation_id: Uuid,
        user_id: Uuid,
    ) -> Result<i64, FindamError> {
        let count: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM findam_messages
            WHERE conversation_id = $1 AND sender_id <> $2 AND read_at IS NULL
            "#,
        )
        .bind(conversation_id)
        .bind(user_id)
        .fetch_one(pool)
        .await
        .map_err(|e| {
            log::error!("Failed to count unread messages: {}", e);
            FindamError::DatabaseError(e.to_string())
        })?;

        Ok(count.0)
    }

    /// Whether the two users share a confirmed booking
    /// DOCUMENTATION: Gate for the contact-information filter
    pub async fn have_confirmed_booking(
        pool: &PgPool,
        user_a: Uuid,
        user_b: Uuid,
    ) -> Result<bool, FindamError> {
        let count: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM findam_bookings b
            JOIN findam_properties p ON p.id = b.property_id
            WHERE b.status IN ('confirmed', 'completed')
              AND ((b.tenant_id = $1 AND p.owner_id = $2)
                OR (b.tenant_id = $2 AND p.owner_id = $1))
            "#,
        )
        .bind(user_a)
        .bind(user_b)
        .fetch_one(pool)
        .await
        .map_err(|e| {
            log::error!("Confirmed booking check failed: {}", e);
            FindamError::DatabaseError(e.to_string())
        })?;

        Ok(count.0 > 0)
    }
}
