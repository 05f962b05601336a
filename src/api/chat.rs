use std::collections::HashMap;

use super::ApiClient;
use crate::error::Result;
use crate::models::{
    ChatMessage, ChatMessagesResponse, ChatUser, ChatUsersResponse, UnreadCountsResponse, UserId,
};

/// `/api/chat/*`: contacts, history and unread counters. Live traffic goes
/// through the realtime relay.
pub struct ChatApi<'a> {
    client: &'a ApiClient,
}

impl<'a> ChatApi<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn users(&self) -> Result<Vec<ChatUser>> {
        let body: ChatUsersResponse = self.client.get_json("/api/chat/users", &[]).await?;
        Ok(body.users)
    }

    /// Conversation between two users, oldest first.
    pub async fn messages(&self, user1: UserId, user2: UserId) -> Result<Vec<ChatMessage>> {
        let query = [("user1", user1.to_string()), ("user2", user2.to_string())];
        let body: ChatMessagesResponse = self.client.get_json("/api/chat/messages", &query).await?;
        Ok(body.messages)
    }

    pub async fn unread_counts(&self) -> Result<HashMap<UserId, u32>> {
        let body: UnreadCountsResponse = self.client.get_json("/api/chat/unread-counts", &[]).await?;
        Ok(body.0)
    }
}
