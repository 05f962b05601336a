use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize};

pub type UserId = i64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatUser {
    pub id: UserId,
    pub nombre: String,
    #[serde(default)]
    pub apellido: Option<String>,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub rol: String,
    #[serde(default)]
    pub is_online: bool,
    #[serde(default)]
    pub last_seen: Option<String>,
}

/// Message as created by the backend. The client never mutates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: i64,
    pub sender_id: UserId,
    pub receiver_id: UserId,
    pub content: String,
    pub timestamp: String,
    #[serde(default)]
    pub is_read: bool,
}

impl ChatMessage {
    /// The other party of the conversation from `me`'s point of view.
    pub fn peer_of(&self, me: UserId) -> UserId {
        if self.sender_id == me {
            self.receiver_id
        } else {
            self.sender_id
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresenceEvent {
    pub user_id: UserId,
    pub is_online: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingEvent {
    pub user_id: UserId,
    pub is_typing: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadReceipt {
    pub read_by_id: UserId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageError {
    pub error: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatUsersResponse {
    #[serde(default)]
    pub users: Vec<ChatUser>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatMessagesResponse {
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
}

/// `/api/chat/unread-counts` answers with a JSON object keyed by the
/// sender id as a string.
pub(crate) fn deserialize_unread_counts<'de, D>(
    deserializer: D,
) -> Result<HashMap<UserId, u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = HashMap::<String, u32>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .filter_map(|(key, count)| key.parse::<UserId>().ok().map(|id| (id, count)))
        .collect())
}

#[derive(Debug, Deserialize)]
pub(crate) struct UnreadCountsResponse(
    #[serde(deserialize_with = "deserialize_unread_counts")] pub HashMap<UserId, u32>,
);
