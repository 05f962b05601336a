//! Engine.IO v4 / Socket.IO v5 text framing, default namespace only.
//!
//! A frame is one WebSocket text message. The first character is the
//! Engine.IO packet type; Engine.IO `message` packets (`4`) carry a
//! Socket.IO packet whose type is the second character.

use serde::Deserialize;
use serde_json::Value;

use crate::error::{AppError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenHandshake {
    pub sid: String,
    #[serde(default)]
    pub ping_interval: u64,
    #[serde(default)]
    pub ping_timeout: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Packet {
    /// `0{...}` Engine.IO session opened by the server.
    Open(OpenHandshake),
    /// `1`
    Close,
    /// `2`
    Ping,
    /// `3`
    Pong,
    /// `6`
    Noop,
    /// `40` / `40{...}` namespace connect (request or ack).
    Connect(Option<Value>),
    /// `41`
    Disconnect,
    /// `42["name", payload]`
    Event { name: String, payload: Value },
    /// `44{...}` namespace connect refused.
    ConnectError(Value),
}

impl Packet {
    pub fn event(name: impl Into<String>, payload: Value) -> Self {
        Packet::Event {
            name: name.into(),
            payload,
        }
    }

    pub fn encode(&self) -> String {
        match self {
            Packet::Open(handshake) => format!(
                "0{}",
                serde_json::json!({
                    "sid": handshake.sid,
                    "pingInterval": handshake.ping_interval,
                    "pingTimeout": handshake.ping_timeout,
                })
            ),
            Packet::Close => "1".to_string(),
            Packet::Ping => "2".to_string(),
            Packet::Pong => "3".to_string(),
            Packet::Noop => "6".to_string(),
            Packet::Connect(None) => "40".to_string(),
            Packet::Connect(Some(data)) => format!("40{}", data),
            Packet::Disconnect => "41".to_string(),
            Packet::Event { name, payload } => {
                let frame = if payload.is_null() {
                    serde_json::json!([name])
                } else {
                    serde_json::json!([name, payload])
                };
                format!("42{}", frame)
            }
            Packet::ConnectError(data) => format!("44{}", data),
        }
    }

    pub fn decode(frame: &str) -> Result<Packet> {
        let mut chars = frame.chars();
        let kind = chars
            .next()
            .ok_or_else(|| AppError::Protocol("empty frame".to_string()))?;
        let rest = chars.as_str();

        match kind {
            '0' => Ok(Packet::Open(serde_json::from_str(rest)?)),
            '1' => Ok(Packet::Close),
            '2' => Ok(Packet::Ping),
            '3' => Ok(Packet::Pong),
            '6' => Ok(Packet::Noop),
            '4' => decode_socket_packet(rest),
            other => Err(AppError::Protocol(format!(
                "unsupported engine.io packet type {:?}",
                other
            ))),
        }
    }
}

fn decode_socket_packet(body: &str) -> Result<Packet> {
    let mut chars = body.chars();
    let kind = chars
        .next()
        .ok_or_else(|| AppError::Protocol("empty socket.io packet".to_string()))?;
    let data = strip_namespace(chars.as_str())?;

    match kind {
        '0' => {
            if data.is_empty() {
                Ok(Packet::Connect(None))
            } else {
                Ok(Packet::Connect(Some(serde_json::from_str(data)?)))
            }
        }
        '1' => Ok(Packet::Disconnect),
        '2' => decode_event(data),
        '4' => Ok(Packet::ConnectError(
            serde_json::from_str(data).unwrap_or(Value::String(data.to_string())),
        )),
        other => Err(AppError::Protocol(format!(
            "unsupported socket.io packet type {:?}",
            other
        ))),
    }
}

/// Only the default namespace is used; a leading `/` namespace other than
/// `/` is rejected.
fn strip_namespace(data: &str) -> Result<&str> {
    if !data.starts_with('/') {
        return Ok(data);
    }
    let (namespace, rest) = data.split_once(',').unwrap_or((data, ""));
    if namespace == "/" {
        Ok(rest)
    } else {
        Err(AppError::Protocol(format!(
            "unexpected namespace {}",
            namespace
        )))
    }
}

fn decode_event(data: &str) -> Result<Packet> {
    // optional ack id before the array
    let data = data.trim_start_matches(|c: char| c.is_ascii_digit());
    let mut items: Vec<Value> = serde_json::from_str(data)?;
    if items.is_empty() {
        return Err(AppError::Protocol("event without name".to_string()));
    }
    let name = match items.remove(0) {
        Value::String(name) => name,
        other => {
            return Err(AppError::Protocol(format!(
                "event name must be a string, got {}",
                other
            )))
        }
    };
    let payload = if items.is_empty() {
        Value::Null
    } else {
        items.swap_remove(0)
    };
    Ok(Packet::Event { name, payload })
}
