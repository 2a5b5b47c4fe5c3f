//! Engine.IO v4 / Socket.IO v4 text frames, as carried by the websocket
//! transport of the streaming channel.

use crate::objects::TransportError;
use serde::Deserialize;
use serde_json::Value;

/// Joins the default namespace once the engine handshake arrived.
pub const CONNECT_FRAME: &str = "40";
/// Leaves the default namespace.
pub const DISCONNECT_FRAME: &str = "41";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Handshake {
    pub sid: String,
    #[serde(default)]
    pub upgrades: Vec<String>,
    #[serde(default)]
    pub ping_interval: u64,
    #[serde(default)]
    pub ping_timeout: u64,
    #[serde(default)]
    pub max_payload: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EnginePacket {
    Open(Handshake),
    Close,
    Ping(String),
    Pong(String),
    Message(String),
    Upgrade,
    Noop,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SocketPacket {
    Connect(Value),
    Disconnect,
    Event { tag: String, payload: Value },
    Ack,
    ConnectError(Value),
    Binary,
}

fn frame_error(frame: &str, reason: &str) -> TransportError {
    let shown: String = frame.chars().take(64).collect();

    TransportError::Frame(format!("{} in \"{}\"", reason, shown))
}

pub fn decode_engine(frame: &str) -> Result<EnginePacket, TransportError> {
    let mut chars = frame.chars();
    let kind = chars.next().ok_or_else(|| frame_error(frame, "empty frame"))?;
    let data = chars.as_str();

    match kind {
        '0' => serde_json::from_str(data)
            .map(EnginePacket::Open)
            .map_err(|e| frame_error(frame, &e.to_string())),
        '1' => Ok(EnginePacket::Close),
        '2' => Ok(EnginePacket::Ping(String::from(data))),
        '3' => Ok(EnginePacket::Pong(String::from(data))),
        '4' => Ok(EnginePacket::Message(String::from(data))),
        '5' => Ok(EnginePacket::Upgrade),
        '6' => Ok(EnginePacket::Noop),
        _ => Err(frame_error(frame, "unknown engine packet type")),
    }
}

/// Decodes `<type>[<attachments>-][<namespace>,][<ack id>][<json>]`.
pub fn decode_socket(data: &str) -> Result<SocketPacket, TransportError> {
    let mut chars = data.chars();
    let kind = chars.next().ok_or_else(|| frame_error(data, "empty packet"))?;
    let mut rest = chars.as_str();

    if matches!(kind, '5' | '6') {
        return Ok(SocketPacket::Binary);
    }
    if rest.starts_with('/') {
        rest = match rest.find(',') {
            Some(pos) => &rest[pos + 1..],
            None => "",
        };
    }
    rest = rest.trim_start_matches(|c: char| c.is_ascii_digit());

    let json = || -> Result<Value, TransportError> {
        match rest.is_empty() {
            true => Ok(Value::Null),
            false => serde_json::from_str(rest).map_err(|e| frame_error(data, &e.to_string())),
        }
    };

    match kind {
        '0' => Ok(SocketPacket::Connect(json()?)),
        '1' => Ok(SocketPacket::Disconnect),
        '2' => match json()? {
            Value::Array(mut args) if !args.is_empty() => {
                let payload = match args.len() > 1 {
                    true => args.swap_remove(1),
                    false => Value::Null,
                };

                match &args[0] {
                    Value::String(tag) => Ok(SocketPacket::Event {
                        tag: tag.clone(),
                        payload,
                    }),
                    _ => Err(frame_error(data, "event name is not a string")),
                }
            }
            _ => Err(frame_error(data, "event is not a non-empty array")),
        },
        '3' => Ok(SocketPacket::Ack),
        '4' => Ok(SocketPacket::ConnectError(json()?)),
        _ => Err(frame_error(data, "unknown socket packet type")),
    }
}

pub fn encode_pong(ping: &str) -> String {
    format!("3{}", ping)
}
