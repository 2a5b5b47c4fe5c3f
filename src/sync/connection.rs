//! Lifecycle of the streaming connection, independent of the browser socket.
//!
//! The socket agent feeds frames and close events in and carries out the
//! returned actions. Reconnection is a fixed number of attempts with a fixed
//! delay; once the budget is spent the connection stays down. A session that
//! goes `pingInterval + pingTimeout` without a ping is treated as lost.

use super::codec::{self, EnginePacket, SocketPacket};
use super::router::StreamEvent;
use crate::objects::{ClientConfig, TransportError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub attempts: u32,
    pub delay_ms: u32,
}

impl From<&ClientConfig> for ReconnectPolicy {
    fn from(config: &ClientConfig) -> Self {
        Self {
            attempts: config.reconnection_attempts,
            delay_ms: config.reconnection_delay_ms,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Send(String),
    Emit(StreamEvent),
    Reconnect { attempt: u32, delay_ms: u32 },
    GiveUp(TransportError),
    /// Report back `beat` through `on_heartbeat` after `delay_ms`.
    ArmHeartbeat { beat: u32, delay_ms: u32 },
}

#[derive(Debug)]
pub struct Connection {
    policy: ReconnectPolicy,
    attempts: u32,
    connected: bool,
    closing: bool,
    server_closed: bool,
    engine_open: bool,
    heartbeat_ms: u32,
    // bumped on every open, ping and close; older heartbeats are stale
    beat: u32,
}

impl Connection {
    pub fn new(policy: ReconnectPolicy) -> Self {
        Self {
            policy,
            attempts: 0,
            connected: false,
            closing: false,
            server_closed: false,
            engine_open: false,
            heartbeat_ms: 0,
            beat: 0,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Called whenever a socket is about to be opened.
    pub fn opening(&mut self) {
        self.closing = false;
        self.server_closed = false;
        self.disarm();
    }

    fn disarm(&mut self) {
        self.engine_open = false;
        self.beat = self.beat.wrapping_add(1);
    }

    fn arm(&mut self) -> Option<Action> {
        self.beat = self.beat.wrapping_add(1);
        match self.engine_open && self.heartbeat_ms > 0 {
            true => Some(Action::ArmHeartbeat {
                beat: self.beat,
                delay_ms: self.heartbeat_ms,
            }),
            false => None,
        }
    }

    pub fn on_frame(&mut self, frame: &str) -> Vec<Action> {
        let packet = match codec::decode_engine(frame) {
            Ok(packet) => packet,
            Err(e) => {
                log::warn!("dropping frame: {}", e);
                return Vec::new();
            }
        };

        match packet {
            EnginePacket::Open(handshake) => {
                log::debug!("engine session {} opened", handshake.sid);
                let window = handshake.ping_interval.saturating_add(handshake.ping_timeout);

                self.heartbeat_ms = u32::try_from(window).unwrap_or(u32::MAX);
                self.engine_open = true;

                let mut actions = vec![Action::Send(String::from(codec::CONNECT_FRAME))];
                actions.extend(self.arm());
                actions
            }
            EnginePacket::Ping(data) => {
                let mut actions = vec![Action::Send(codec::encode_pong(&data))];
                actions.extend(self.arm());
                actions
            }
            EnginePacket::Message(data) => self.on_message(&data),
            EnginePacket::Close | EnginePacket::Pong(_) | EnginePacket::Upgrade | EnginePacket::Noop => {
                Vec::new()
            }
        }
    }

    fn on_message(&mut self, data: &str) -> Vec<Action> {
        let packet = match codec::decode_socket(data) {
            Ok(packet) => packet,
            Err(e) => {
                log::warn!("dropping packet: {}", e);
                return Vec::new();
            }
        };

        match packet {
            SocketPacket::Connect(_) => {
                self.connected = true;
                self.attempts = 0;
                vec![Action::Emit(StreamEvent::Connect)]
            }
            SocketPacket::Disconnect => {
                self.server_closed = true;
                self.lost("io server disconnect")
            }
            SocketPacket::Event { tag, payload } => {
                vec![Action::Emit(StreamEvent::from_tagged(tag, payload))]
            }
            SocketPacket::ConnectError(detail) => {
                log::warn!("namespace connection refused: {}", detail);
                Vec::new()
            }
            SocketPacket::Ack | SocketPacket::Binary => {
                log::debug!("ignoring unsupported packet");
                Vec::new()
            }
        }
    }

    fn lost(&mut self, reason: &str) -> Vec<Action> {
        match self.connected {
            true => {
                self.connected = false;
                vec![Action::Emit(StreamEvent::Disconnect(String::from(reason)))]
            }
            false => Vec::new(),
        }
    }

    /// A heartbeat armed earlier has expired.
    pub fn on_heartbeat(&mut self, beat: u32) -> Vec<Action> {
        if !self.engine_open || beat != self.beat {
            return Vec::new();
        }

        let err = TransportError::Lost(String::from("ping timeout"));
        log::warn!("{}", err);
        self.on_close("ping timeout")
    }

    /// The socket closed or could not be opened.
    pub fn on_close(&mut self, reason: &str) -> Vec<Action> {
        self.disarm();
        let mut actions = self.lost(reason);

        if self.closing || self.server_closed {
            return actions;
        }

        if self.attempts < self.policy.attempts {
            self.attempts += 1;
            actions.push(Action::Reconnect {
                attempt: self.attempts,
                delay_ms: self.policy.delay_ms,
            });
        } else {
            // only once; any later close stays silent
            self.closing = true;
            actions.push(Action::GiveUp(TransportError::Exhausted(self.policy.attempts)));
        }

        actions
    }

    /// User-initiated shutdown; never followed by a retry.
    pub fn close(&mut self) -> Vec<Action> {
        self.closing = true;
        self.disarm();

        match self.connected {
            true => {
                self.connected = false;
                vec![Action::Send(String::from(codec::DISCONNECT_FRAME))]
            }
            false => Vec::new(),
        }
    }
}
