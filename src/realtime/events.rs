use serde_json::{json, Value};

use crate::error::Result;
use crate::models::{
    ChatMessage, MessageError, PresenceEvent, ReadReceipt, TypingEvent, UserId,
};

use super::protocol::Packet;

/// Events the client emits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    Authenticate(UserId),
    SendMessage { receiver_id: UserId, content: String },
    MarkAsRead { sender_id: UserId },
    Typing { receiver_id: UserId, is_typing: bool },
}

impl ClientEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ClientEvent::Authenticate(_) => "authenticate",
            ClientEvent::SendMessage { .. } => "send_message",
            ClientEvent::MarkAsRead { .. } => "mark_as_read",
            ClientEvent::Typing { .. } => "typing",
        }
    }

    pub fn payload(&self) -> Value {
        match self {
            ClientEvent::Authenticate(user_id) => json!(user_id),
            ClientEvent::SendMessage {
                receiver_id,
                content,
            } => json!({ "receiverId": receiver_id, "content": content }),
            ClientEvent::MarkAsRead { sender_id } => json!({ "senderId": sender_id }),
            ClientEvent::Typing {
                receiver_id,
                is_typing,
            } => json!({ "receiverId": receiver_id, "isTyping": is_typing }),
        }
    }

    pub fn into_packet(self) -> Packet {
        Packet::event(self.name(), self.payload())
    }
}

/// Events pushed by the server.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerEvent {
    /// A peer sent us a message.
    NewMessage(ChatMessage),
    /// Echo of a message we sent, as persisted.
    MessageSent(ChatMessage),
    MessageError(MessageError),
    UserOnline(PresenceEvent),
    UserTyping(TypingEvent),
    MessagesRead(ReadReceipt),
    Unknown(String),
}

impl ServerEvent {
    pub fn parse(name: &str, payload: Value) -> Result<Self> {
        let event = match name {
            "new_message" => ServerEvent::NewMessage(serde_json::from_value(payload)?),
            "message_sent" => ServerEvent::MessageSent(serde_json::from_value(payload)?),
            "message_error" => ServerEvent::MessageError(serde_json::from_value(payload)?),
            "user_online" => ServerEvent::UserOnline(serde_json::from_value(payload)?),
            "user_typing" => ServerEvent::UserTyping(serde_json::from_value(payload)?),
            "messages_read" => ServerEvent::MessagesRead(serde_json::from_value(payload)?),
            other => ServerEvent::Unknown(other.to_string()),
        };
        Ok(event)
    }
}
