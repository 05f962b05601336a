use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::{mpsc, watch, Mutex as AsyncMutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::{AppError, Result};
use crate::models::{
    ChatMessage, MessageError, PresenceEvent, ReadReceipt, TypingEvent, UserId,
};

use super::events::{ClientEvent, ServerEvent};
use super::protocol::Packet;
use super::subscription::{Registry, Subscription};
use super::transport::{FrameSink, FrameStream, Transport};

const CLOSE_GRACE: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

#[derive(Default)]
struct Channels {
    messages: Registry<ChatMessage>,
    presence: Registry<PresenceEvent>,
    typing: Registry<TypingEvent>,
    reads: Registry<ReadReceipt>,
    errors: Registry<MessageError>,
}

struct Driver {
    user_id: UserId,
    handle: JoinHandle<()>,
}

/// The single realtime connection of a session.
///
/// Subscriptions live on the relay, not on a connection, so they keep
/// receiving after a disconnect/connect cycle.
pub struct ChatRelay {
    transport: Arc<dyn Transport>,
    driver: AsyncMutex<Option<Driver>>,
    outbound: Mutex<Option<mpsc::UnboundedSender<Packet>>>,
    state: Arc<watch::Sender<ConnectionState>>,
    channels: Arc<Channels>,
}

impl ChatRelay {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            transport,
            driver: AsyncMutex::new(None),
            outbound: Mutex::new(None),
            state: Arc::new(state),
            channels: Arc::new(Channels::default()),
        }
    }

    /// Opens the socket and authenticates as `user_id` once the server
    /// acknowledges the namespace. A no-op while a connection for the same
    /// user is alive; a live connection for another user is closed first.
    pub async fn connect(&self, user_id: UserId) -> Result<()> {
        let mut driver = self.driver.lock().await;
        match self.live_user(&driver) {
            Some(current) if current == user_id => {
                debug!(user_id, "relay already connected");
                return Ok(());
            }
            Some(current) => {
                info!(
                    connected_as = current,
                    requested = user_id,
                    "relay switching user"
                );
                self.shutdown(&mut driver).await;
            }
            None => {}
        }

        self.state.send_replace(ConnectionState::Connecting);
        let (sink, stream) = match self.transport.open().await {
            Ok(pair) => pair,
            Err(e) => {
                self.state.send_replace(ConnectionState::Disconnected);
                warn!(user_id, error = %e, "realtime connection failed");
                return Err(e);
            }
        };

        let (tx, rx) = mpsc::unbounded_channel();
        *self.outbound.lock() = Some(tx);

        let connection = Connection {
            sink,
            stream,
            outbound: rx,
            user_id,
            state: Arc::clone(&self.state),
            channels: Arc::clone(&self.channels),
        };
        let handle = tokio::spawn(connection.drive());
        *driver = Some(Driver { user_id, handle });
        info!(user_id, "realtime relay started");
        Ok(())
    }

    /// Closes the socket. Subscriptions stay registered.
    pub async fn disconnect(&self) {
        let mut driver = self.driver.lock().await;
        self.shutdown(&mut driver).await;
    }

    /// User the live connection authenticates as, if any.
    pub async fn connected_user(&self) -> Option<UserId> {
        let driver = self.driver.lock().await;
        self.live_user(&driver)
    }

    fn live_user(&self, driver: &Option<Driver>) -> Option<UserId> {
        driver
            .as_ref()
            .filter(|active| {
                !active.handle.is_finished() && self.state() != ConnectionState::Disconnected
            })
            .map(|active| active.user_id)
    }

    async fn shutdown(&self, driver: &mut Option<Driver>) {
        let outbound = self.outbound.lock().take();
        if let Some(tx) = outbound {
            let _ = tx.send(Packet::Disconnect);
        }
        if let Some(active) = driver.take() {
            let abort = active.handle.abort_handle();
            if tokio::time::timeout(CLOSE_GRACE, active.handle).await.is_err() {
                warn!(user_id = active.user_id, "relay did not close in time, aborting");
                abort.abort();
            }
        }
        self.state.send_replace(ConnectionState::Disconnected);
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    pub fn state_changes(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    /// Waits for the handshake started by [`connect`](Self::connect) to
    /// settle.
    pub async fn wait_until_connected(&self, timeout: Duration) -> Result<()> {
        let mut rx = self.state.subscribe();
        let settled = tokio::time::timeout(
            timeout,
            rx.wait_for(|s| *s != ConnectionState::Connecting),
        )
        .await;
        let state = match settled {
            Ok(Ok(state)) => *state,
            _ => ConnectionState::Disconnected,
        };
        if state == ConnectionState::Connected {
            Ok(())
        } else {
            Err(AppError::NotConnected)
        }
    }

    pub fn send_message(&self, receiver_id: UserId, content: &str) -> Result<()> {
        let content = content.trim();
        if content.is_empty() {
            return Err(AppError::Validation("message content is empty".to_string()));
        }
        self.emit(ClientEvent::SendMessage {
            receiver_id,
            content: content.to_string(),
        })
    }

    /// Tells the server that every message from `sender_id` has been read.
    pub fn mark_as_read(&self, sender_id: UserId) -> Result<()> {
        self.emit(ClientEvent::MarkAsRead { sender_id })
    }

    pub fn send_typing(&self, receiver_id: UserId, is_typing: bool) -> Result<()> {
        self.emit(ClientEvent::Typing {
            receiver_id,
            is_typing,
        })
    }

    /// Both peers' messages and the echo of our own sends.
    pub fn subscribe_messages(&self) -> Subscription<ChatMessage> {
        self.channels.messages.subscribe()
    }

    pub fn subscribe_presence(&self) -> Subscription<PresenceEvent> {
        self.channels.presence.subscribe()
    }

    pub fn subscribe_typing(&self) -> Subscription<TypingEvent> {
        self.channels.typing.subscribe()
    }

    pub fn subscribe_read_receipts(&self) -> Subscription<ReadReceipt> {
        self.channels.reads.subscribe()
    }

    pub fn subscribe_errors(&self) -> Subscription<MessageError> {
        self.channels.errors.subscribe()
    }

    fn emit(&self, event: ClientEvent) -> Result<()> {
        if !self.is_connected() {
            debug!(event = event.name(), "emit while disconnected");
            return Err(AppError::NotConnected);
        }
        let outbound = self.outbound.lock();
        let tx = outbound.as_ref().ok_or(AppError::NotConnected)?;
        tx.send(event.into_packet())
            .map_err(|_| AppError::NotConnected)
    }
}

struct Connection {
    sink: FrameSink,
    stream: FrameStream,
    outbound: mpsc::UnboundedReceiver<Packet>,
    user_id: UserId,
    state: Arc<watch::Sender<ConnectionState>>,
    channels: Arc<Channels>,
}

impl Connection {
    async fn drive(mut self) {
        let reason = self.run().await;
        let _ = self.sink.close().await;
        self.state.send_replace(ConnectionState::Disconnected);
        info!(user_id = self.user_id, reason, "realtime relay disconnected");
    }

    async fn run(&mut self) -> &'static str {
        loop {
            tokio::select! {
                frame = self.stream.next() => {
                    let text = match frame {
                        Some(Ok(text)) => text,
                        Some(Err(e)) => {
                            warn!(error = %e, "socket read failed");
                            return "transport error";
                        }
                        None => return "stream closed",
                    };
                    let packet = match Packet::decode(&text) {
                        Ok(packet) => packet,
                        Err(e) => {
                            warn!(error = %e, "dropping malformed frame");
                            continue;
                        }
                    };
                    match self.handle(packet).await {
                        Ok(true) => {}
                        Ok(false) => return "server closed",
                        Err(e) => {
                            warn!(error = %e, "socket write failed");
                            return "transport error";
                        }
                    }
                }
                packet = self.outbound.recv() => match packet {
                    Some(packet) => {
                        let closing = packet == Packet::Disconnect;
                        if let Err(e) = self.sink.send(packet.encode()).await {
                            warn!(error = %e, "socket write failed");
                            return "transport error";
                        }
                        if closing {
                            return "client disconnect";
                        }
                    }
                    None => return "relay dropped",
                },
            }
        }
    }

    /// Returns `false` when the server ended the session.
    async fn handle(&mut self, packet: Packet) -> Result<bool> {
        match packet {
            Packet::Open(handshake) => {
                debug!(sid = %handshake.sid, "engine.io session opened");
                self.sink.send(Packet::Connect(None).encode()).await?;
            }
            Packet::Connect(_) => {
                let auth = ClientEvent::Authenticate(self.user_id).into_packet();
                self.sink.send(auth.encode()).await?;
                self.state.send_replace(ConnectionState::Connected);
                info!(user_id = self.user_id, "realtime relay connected");
            }
            Packet::Ping => self.sink.send(Packet::Pong.encode()).await?,
            Packet::Event { name, payload } => self.dispatch(&name, payload),
            Packet::ConnectError(data) => {
                warn!(%data, "server refused realtime connection");
                return Ok(false);
            }
            Packet::Disconnect | Packet::Close => return Ok(false),
            Packet::Pong | Packet::Noop => {}
        }
        Ok(true)
    }

    fn dispatch(&self, name: &str, payload: Value) {
        let event = match ServerEvent::parse(name, payload) {
            Ok(event) => event,
            Err(e) => {
                warn!(event = name, error = %e, "dropping malformed event");
                return;
            }
        };
        match event {
            ServerEvent::NewMessage(message) | ServerEvent::MessageSent(message) => {
                self.channels.messages.publish(&message);
            }
            ServerEvent::MessageError(error) => {
                warn!(error = %error.error, "server rejected chat message");
                self.channels.errors.publish(&error);
            }
            ServerEvent::UserOnline(presence) => {
                self.channels.presence.publish(&presence);
            }
            ServerEvent::UserTyping(typing) => {
                self.channels.typing.publish(&typing);
            }
            ServerEvent::MessagesRead(receipt) => {
                self.channels.reads.publish(&receipt);
            }
            ServerEvent::Unknown(name) => debug!(event = %name, "ignoring unknown event"),
        }
    }
}
