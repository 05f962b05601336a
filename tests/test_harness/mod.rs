//! Test Harness Module
//!
//! In-memory Socket.IO transport for relay tests. Every `open()` hands the
//! server side of a fresh channel pair to the test through `servers`.

#![allow(dead_code)]

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use creditpro_client::error::{AppError, Result};
use creditpro_client::models::{ChatMessage, UserId};
use creditpro_client::realtime::{FrameSink, FrameStream, Transport};
use serde_json::json;
use tokio::sync::mpsc;

const RECV_TIMEOUT: Duration = Duration::from_secs(2);

pub struct MemoryTransport {
    opened: AtomicUsize,
    servers: mpsc::UnboundedSender<ServerEnd>,
}

impl MemoryTransport {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<ServerEnd>) {
        let (servers, rx) = mpsc::unbounded_channel();
        let transport = Arc::new(Self {
            opened: AtomicUsize::new(0),
            servers,
        });
        (transport, rx)
    }

    pub fn open_count(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn open(&self) -> Result<(FrameSink, FrameStream)> {
        let (client_tx, from_client) = mpsc::unbounded_channel::<String>();
        let (to_client, client_rx) = mpsc::unbounded_channel::<Result<String>>();

        self.opened.fetch_add(1, Ordering::SeqCst);
        self.servers
            .send(ServerEnd {
                to_client,
                from_client,
            })
            .map_err(|_| AppError::Transport("no server listening".to_string()))?;

        let sink = futures_util::sink::unfold(client_tx, |tx, frame: String| async move {
            tx.send(frame)
                .map_err(|_| AppError::Transport("server gone".to_string()))?;
            Ok::<_, AppError>(tx)
        });
        let stream = futures_util::stream::unfold(client_rx, |mut rx| async move {
            rx.recv().await.map(|item| (item, rx))
        });

        Ok((Box::pin(sink), Box::pin(stream)))
    }
}

/// Server side of one connection.
pub struct ServerEnd {
    to_client: mpsc::UnboundedSender<Result<String>>,
    from_client: mpsc::UnboundedReceiver<String>,
}

impl ServerEnd {
    pub async fn next(servers: &mut mpsc::UnboundedReceiver<ServerEnd>) -> ServerEnd {
        tokio::time::timeout(RECV_TIMEOUT, servers.recv())
            .await
            .expect("no connection opened")
            .expect("transport dropped")
    }

    pub fn send(&self, frame: &str) {
        self.to_client
            .send(Ok(frame.to_string()))
            .expect("client gone");
    }

    pub fn emit(&self, event: &str, payload: serde_json::Value) {
        self.send(&format!("42{}", json!([event, payload])));
    }

    pub fn push_message(&self, message: &ChatMessage) {
        self.emit(
            "new_message",
            serde_json::to_value(message).expect("serialize message"),
        );
    }

    pub async fn recv(&mut self) -> String {
        tokio::time::timeout(RECV_TIMEOUT, self.from_client.recv())
            .await
            .expect("timed out waiting for client frame")
            .expect("client closed the connection")
    }

    /// Engine.IO open, namespace ack and the `authenticate` emit.
    pub async fn accept(&mut self, user_id: UserId) {
        self.send(r#"0{"sid":"test-sid","upgrades":[],"pingInterval":25000,"pingTimeout":20000}"#);
        assert_eq!(self.recv().await, "40");
        self.send(r#"40{"sid":"ns-sid"}"#);
        assert_eq!(
            self.recv().await,
            format!(r#"42["authenticate",{}]"#, user_id)
        );
    }
}

pub fn message(id: i64, from: UserId, to: UserId, content: &str) -> ChatMessage {
    ChatMessage {
        id,
        sender_id: from,
        receiver_id: to,
        content: content.to_string(),
        timestamp: "2025-03-14T10:22:00.000Z".to_string(),
        is_read: false,
    }
}

/// Polls `check` until it holds or two seconds pass.
pub async fn eventually<F>(mut check: F) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + RECV_TIMEOUT;
    while tokio::time::Instant::now() < deadline {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check()
}

pub async fn within<T>(future: impl Future<Output = T>) -> T {
    tokio::time::timeout(RECV_TIMEOUT, future)
        .await
        .expect("timed out")
}
