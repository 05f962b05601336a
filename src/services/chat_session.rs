use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::api::ApiClient;
use crate::error::Result;
use crate::models::{ChatMessage, UserId};
use crate::realtime::{ChatRelay, UnreadCounts};

#[derive(Default)]
struct ChatState {
    unread: UnreadCounts,
    conversations: HashMap<UserId, Vec<ChatMessage>>,
}

impl ChatState {
    fn ingest(&mut self, me: UserId, message: ChatMessage) {
        if message.sender_id != me && message.receiver_id != me {
            debug!(message_id = message.id, "ignoring message for another user");
            return;
        }
        self.unread.record_incoming(&message, me);
        self.conversations
            .entry(message.peer_of(me))
            .or_default()
            .push(message);
    }
}

/// Conversations and unread counters of the logged-in user.
pub struct ChatSession {
    me: UserId,
    relay: Arc<ChatRelay>,
    state: Arc<Mutex<ChatState>>,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl ChatSession {
    pub fn new(me: UserId, relay: Arc<ChatRelay>) -> Self {
        Self {
            me,
            relay,
            state: Arc::new(Mutex::new(ChatState::default())),
            listener: Mutex::new(None),
        }
    }

    pub fn me(&self) -> UserId {
        self.me
    }

    /// Starts consuming relay messages. Calling it again while the listener
    /// runs does nothing.
    pub fn start(&self) {
        let mut listener = self.listener.lock();
        if listener.as_ref().is_some_and(|h| !h.is_finished()) {
            return;
        }
        let mut messages = self.relay.subscribe_messages();
        let state = Arc::clone(&self.state);
        let me = self.me;
        *listener = Some(tokio::spawn(async move {
            while let Some(message) = messages.recv().await {
                state.lock().ingest(me, message);
            }
        }));
    }

    pub fn stop(&self) {
        if let Some(handle) = self.listener.lock().take() {
            handle.abort();
        }
    }

    /// Records a message obtained outside the relay subscription.
    pub fn ingest(&self, message: ChatMessage) {
        self.state.lock().ingest(self.me, message);
    }

    pub fn send(&self, peer: UserId, content: &str) -> Result<()> {
        self.relay.send_message(peer, content)
    }

    /// Zeroes the counter for `peer` and tells the server. The counter stays
    /// at zero when the `mark_as_read` emit cannot be queued; the error is
    /// still returned so the caller knows the server was not told.
    pub fn open_conversation(&self, peer: UserId) -> Result<()> {
        self.state.lock().unread.clear(peer);
        if let Err(e) = self.relay.mark_as_read(peer) {
            warn!(peer, error = %e, "mark_as_read not sent");
            return Err(e);
        }
        Ok(())
    }

    pub fn close_conversation(&self, peer: UserId) {
        self.state.lock().unread.clear(peer);
    }

    pub fn unread_count(&self, peer: UserId) -> u32 {
        self.state.lock().unread.get(peer)
    }

    pub fn total_unread(&self) -> u32 {
        self.state.lock().unread.total()
    }

    pub fn unread_snapshot(&self) -> HashMap<UserId, u32> {
        self.state.lock().unread.snapshot()
    }

    pub fn conversation(&self, peer: UserId) -> Vec<ChatMessage> {
        self.state
            .lock()
            .conversations
            .get(&peer)
            .cloned()
            .unwrap_or_default()
    }

    /// Seeds counters from the backend. Counters are untouched on failure.
    ///
    /// The snapshot replaces every counter, including increments the
    /// listener recorded while the request was in flight. Call it before
    /// [`start`](Self::start).
    pub async fn load_unread_counts(&self, api: &ApiClient) -> Result<()> {
        let counts = api.chat().unread_counts().await?;
        self.state.lock().unread.replace_all(counts);
        Ok(())
    }

    /// Replaces the log for `peer` with the stored history.
    pub async fn load_history(&self, api: &ApiClient, peer: UserId) -> Result<usize> {
        let messages = api.chat().messages(self.me, peer).await?;
        let count = messages.len();
        self.state.lock().conversations.insert(peer, messages);
        Ok(count)
    }
}

impl Drop for ChatSession {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::realtime::{FrameSink, FrameStream, Transport};
    use async_trait::async_trait;

    struct Offline;

    #[async_trait]
    impl Transport for Offline {
        async fn open(&self) -> Result<(FrameSink, FrameStream)> {
            Err(crate::error::AppError::Transport("offline".into()))
        }
    }

    fn message(id: i64, from: UserId, to: UserId) -> ChatMessage {
        ChatMessage {
            id,
            sender_id: from,
            receiver_id: to,
            content: "hola".into(),
            timestamp: "2025-03-14T10:22:00.000Z".into(),
            is_read: false,
        }
    }

    #[test]
    fn test_ingest_logs_by_peer_and_counts() {
        let session = ChatSession::new(7, Arc::new(ChatRelay::new(Arc::new(Offline))));
        session.ingest(message(1, 42, 7));
        session.ingest(message(2, 7, 42));
        session.ingest(message(3, 42, 7));
        session.ingest(message(4, 1, 2));

        assert_eq!(session.unread_count(42), 2);
        assert_eq!(session.conversation(42).len(), 3);
        assert!(session.conversation(1).is_empty());
    }

    #[test]
    fn test_open_while_disconnected_still_clears() {
        let session = ChatSession::new(7, Arc::new(ChatRelay::new(Arc::new(Offline))));
        for id in 0..3 {
            session.ingest(message(id, 42, 7));
        }
        session.ingest(message(9, 5, 7));
        assert!(matches!(
            session.open_conversation(42),
            Err(crate::error::AppError::NotConnected)
        ));
        assert_eq!(session.unread_count(42), 0);
        assert_eq!(session.total_unread(), 1);

        session.close_conversation(5);
        assert_eq!(session.total_unread(), 0);
    }
}
