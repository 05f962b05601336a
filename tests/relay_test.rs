//! Realtime relay tests over the in-memory transport.
//!
//! Run: cargo test --test relay_test

use std::sync::Arc;
use std::time::Duration;

use creditpro_client::error::AppError;
use creditpro_client::models::{PresenceEvent, ReadReceipt, TypingEvent};
use creditpro_client::realtime::{ChatRelay, ConnectionState};
use creditpro_client::services::ChatSession;
use serde_json::json;
use tokio_test::{assert_err, assert_ok};

mod test_harness;
use test_harness::{eventually, message, within, MemoryTransport, ServerEnd};

const ME: i64 = 7;
const PEER: i64 = 42;

async fn connected_relay() -> (
    Arc<ChatRelay>,
    Arc<MemoryTransport>,
    ServerEnd,
    tokio::sync::mpsc::UnboundedReceiver<ServerEnd>,
) {
    let (transport, mut servers) = MemoryTransport::new();
    let relay = Arc::new(ChatRelay::new(transport.clone()));
    relay.connect(ME).await.unwrap();
    let mut server = ServerEnd::next(&mut servers).await;
    server.accept(ME).await;
    relay
        .wait_until_connected(Duration::from_secs(2))
        .await
        .unwrap();
    (relay, transport, server, servers)
}

#[tokio::test]
async fn test_connect_twice_opens_one_connection() {
    let (transport, mut servers) = MemoryTransport::new();
    let relay = Arc::new(ChatRelay::new(transport.clone()));

    let (first, second) = tokio::join!(relay.connect(ME), relay.connect(ME));
    assert_ok!(first);
    assert_ok!(second);
    assert_ok!(relay.connect(ME).await);
    assert_eq!(transport.open_count(), 1);

    let mut server = ServerEnd::next(&mut servers).await;
    server.accept(ME).await;
    relay
        .wait_until_connected(Duration::from_secs(2))
        .await
        .unwrap();
    relay.connect(ME).await.unwrap();
    assert_eq!(transport.open_count(), 1);
    assert_eq!(relay.state(), ConnectionState::Connected);
}

#[tokio::test]
async fn test_answers_server_ping() {
    let (_relay, _transport, mut server, _servers) = connected_relay().await;
    server.send("2");
    assert_eq!(server.recv().await, "3");
}

#[tokio::test]
async fn test_emits_use_wire_event_names() {
    let (relay, _transport, mut server, _servers) = connected_relay().await;

    relay.send_message(PEER, "  ¿Aprobaron el crédito?  ").unwrap();
    assert_eq!(
        server.recv().await,
        r#"42["send_message",{"content":"¿Aprobaron el crédito?","receiverId":42}]"#
    );

    relay.send_typing(PEER, true).unwrap();
    assert_eq!(
        server.recv().await,
        r#"42["typing",{"isTyping":true,"receiverId":42}]"#
    );

    relay.mark_as_read(PEER).unwrap();
    assert_eq!(server.recv().await, r#"42["mark_as_read",{"senderId":42}]"#);

    assert!(matches!(
        relay.send_message(PEER, "   "),
        Err(AppError::Validation(_))
    ));
}

#[tokio::test]
async fn test_emit_while_disconnected_is_rejected() {
    let (transport, _servers) = MemoryTransport::new();
    let relay = ChatRelay::new(transport);
    assert_eq!(relay.state(), ConnectionState::Disconnected);
    assert!(matches!(
        relay.send_message(PEER, "hola"),
        Err(AppError::NotConnected)
    ));
    assert!(matches!(relay.mark_as_read(PEER), Err(AppError::NotConnected)));
    assert_err!(relay.send_typing(PEER, true));
}

#[tokio::test]
async fn test_messages_reach_subscribers_in_order_without_dedup() {
    let (relay, _transport, server, _servers) = connected_relay().await;
    let mut first = relay.subscribe_messages();
    let mut second = relay.subscribe_messages();

    let incoming = message(1, PEER, ME, "hola");
    server.push_message(&incoming);
    server.push_message(&incoming);
    let echo = message(2, ME, PEER, "buenas");
    server.emit("message_sent", serde_json::to_value(&echo).unwrap());

    for sub in [&mut first, &mut second] {
        assert_eq!(within(sub.recv()).await, Some(incoming.clone()));
        assert_eq!(within(sub.recv()).await, Some(incoming.clone()));
        assert_eq!(within(sub.recv()).await, Some(echo.clone()));
    }
}

#[tokio::test]
async fn test_side_channel_events_are_typed() {
    let (relay, _transport, server, _servers) = connected_relay().await;
    let mut presence = relay.subscribe_presence();
    let mut typing = relay.subscribe_typing();
    let mut reads = relay.subscribe_read_receipts();
    let mut errors = relay.subscribe_errors();

    server.emit("user_online", json!({ "userId": PEER, "isOnline": true }));
    server.emit("user_typing", json!({ "userId": PEER, "isTyping": false }));
    server.emit("messages_read", json!({ "readById": PEER }));
    server.emit("message_error", json!({ "error": "Usuario no encontrado" }));
    server.emit("unrelated", json!({}));

    assert_eq!(
        within(presence.recv()).await,
        Some(PresenceEvent {
            user_id: PEER,
            is_online: true
        })
    );
    assert_eq!(
        within(typing.recv()).await,
        Some(TypingEvent {
            user_id: PEER,
            is_typing: false
        })
    );
    assert_eq!(
        within(reads.recv()).await,
        Some(ReadReceipt { read_by_id: PEER })
    );
    assert_eq!(
        within(errors.recv()).await.map(|e| e.error),
        Some("Usuario no encontrado".to_string())
    );
}

#[tokio::test]
async fn test_dropped_subscription_stops_delivery() {
    let (relay, _transport, server, _servers) = connected_relay().await;
    let dropped = relay.subscribe_messages();
    let mut kept = relay.subscribe_messages();
    dropped.unsubscribe();

    server.push_message(&message(1, PEER, ME, "hola"));
    assert!(within(kept.recv()).await.is_some());
}

#[tokio::test]
async fn test_unread_counts_follow_inbound_and_reset_on_open() {
    let (relay, _transport, mut server, _servers) = connected_relay().await;
    let chat = ChatSession::new(ME, relay.clone());
    chat.start();

    for id in 1..=3 {
        server.push_message(&message(id, PEER, ME, "mensaje"));
    }
    assert!(eventually(|| chat.unread_count(PEER) == 3).await);
    assert_eq!(chat.conversation(PEER).len(), 3);
    assert_eq!(chat.total_unread(), 3);

    chat.open_conversation(PEER).unwrap();
    assert_eq!(chat.unread_count(PEER), 0);
    assert_eq!(server.recv().await, r#"42["mark_as_read",{"senderId":42}]"#);
}

#[tokio::test]
async fn test_open_while_disconnected_still_clears_count() {
    let (relay, _transport, mut server, _servers) = connected_relay().await;
    let chat = ChatSession::new(ME, relay.clone());
    chat.start();
    server.push_message(&message(1, PEER, ME, "uno"));
    server.push_message(&message(2, PEER, ME, "dos"));
    assert!(eventually(|| chat.unread_count(PEER) == 2).await);

    relay.disconnect().await;
    assert_eq!(server.recv().await, "41");

    assert!(matches!(
        chat.open_conversation(PEER),
        Err(AppError::NotConnected)
    ));
    assert_eq!(chat.unread_count(PEER), 0);
}

#[tokio::test]
async fn test_connect_as_another_user_replaces_connection() {
    let (relay, transport, mut server, mut servers) = connected_relay().await;
    assert_eq!(relay.connected_user().await, Some(ME));

    relay.connect(PEER).await.unwrap();
    assert_eq!(server.recv().await, "41");
    let mut server = ServerEnd::next(&mut servers).await;
    server.accept(PEER).await;
    relay
        .wait_until_connected(Duration::from_secs(2))
        .await
        .unwrap();

    assert_eq!(transport.open_count(), 2);
    assert_eq!(relay.connected_user().await, Some(PEER));
}

#[tokio::test]
async fn test_subscriptions_survive_reconnect() {
    let (relay, transport, mut server, mut servers) = connected_relay().await;
    let mut messages = relay.subscribe_messages();

    relay.disconnect().await;
    assert_eq!(server.recv().await, "41");
    assert_eq!(relay.state(), ConnectionState::Disconnected);

    relay.connect(ME).await.unwrap();
    let mut server = ServerEnd::next(&mut servers).await;
    server.accept(ME).await;
    relay
        .wait_until_connected(Duration::from_secs(2))
        .await
        .unwrap();
    assert_eq!(transport.open_count(), 2);

    let incoming = message(9, PEER, ME, "de nuevo");
    server.push_message(&incoming);
    assert_eq!(within(messages.recv()).await, Some(incoming));
}

#[tokio::test]
async fn test_server_disconnect_allows_new_connection() {
    let (relay, transport, server, mut servers) = connected_relay().await;
    let mut states = relay.state_changes();

    server.send("41");
    within(states.wait_for(|s| *s == ConnectionState::Disconnected))
        .await
        .unwrap();

    relay.connect(ME).await.unwrap();
    let mut server = ServerEnd::next(&mut servers).await;
    server.accept(ME).await;
    assert_eq!(transport.open_count(), 2);
}

#[tokio::test]
async fn test_connect_error_packet_ends_connection() {
    let (transport, mut servers) = MemoryTransport::new();
    let relay = ChatRelay::new(transport);
    relay.connect(ME).await.unwrap();
    let mut server = ServerEnd::next(&mut servers).await;
    server.send(r#"0{"sid":"s","pingInterval":25000,"pingTimeout":20000}"#);
    assert_eq!(server.recv().await, "40");
    server.send(r#"44{"message":"Not authorized"}"#);

    assert!(matches!(
        relay.wait_until_connected(Duration::from_secs(2)).await,
        Err(AppError::NotConnected)
    ));
    assert_eq!(relay.state(), ConnectionState::Disconnected);
}
