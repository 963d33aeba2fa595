// src/models/message.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Message content kinds
pub mod message_type {
    pub const TEXT: &str = "text";
    pub const IMAGE: &str = "image";
    pub const SYSTEM: &str = "system";
    pub const PROMO_CODE: &str = "promo_code";

    pub const ALL: &[&str] = &[TEXT, IMAGE, SYSTEM, PROMO_CODE];

    pub fn is_valid(value: &str) -> bool {
        ALL.contains(&value)
    }
}

/// Two-party conversation, optionally about a property
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Conversation {
    pub id: Uuid,
    pub property_id: Option<Uuid>,
    pub participant_a: Uuid,
    pub participant_b: Uuid,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    /// Other side of the conversation for a given user
    pub fn other_participant(&self, user_id: Uuid) -> Uuid {
        if self.participant_a == user_id {
            self.participant_b
        } else {
            self.participant_a
        }
    }

    pub fn includes(&self, user_id: Uuid) -> bool {
        self.participant_a == user_id || self.participant_b == user_id
    }
}

/// Message within a conversation
/// DOCUMENTATION: is_filtered marks content rewritten by the contact filter
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Message {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub sender_id: Uuid,
    pub content: String,
    pub message_type: String,
    pub is_filtered: bool,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Request DTO for POST /conversations
#[derive(Debug, Deserialize)]
pub struct StartConversationRequest {
    /// User on the other side (usually the property owner)
    pub recipient_id: Uuid,
    pub property_id: Option<Uuid>,
    /// Optional first message
    pub message: Option<String>,
}

/// Request DTO for POST /conversations/{id}/messages
#[derive(Debug, Deserialize, Validate)]
pub struct SendMessageRequest {
    #[validate(length(min = 1, max = 5000))]
    pub content: String,
    #[serde(default = "default_message_type")]
    pub message_type: String,
}

fn default_message_type() -> String {
    message_type::TEXT.to_string()
}

/// Conversation DTO with unread counter
#[derive(Debug, Serialize)]
pub struct ConversationResponse {
    pub id: Uuid,
    pub property_id: Option<Uuid>,
    pub other_participant: Uuid,
    pub is_active: bool,
    pub unread_count: i64,
    pub updated_at: DateTime<Utc>,
}
