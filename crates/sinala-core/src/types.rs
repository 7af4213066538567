//! Public types for the sinala-core crate.

use std::fmt;
use std::time::Duration;

use serde::Serialize;

use crate::config::ConfigError;

/// Reason codes carried by [`LossReason`].
pub mod reason_code {
    /// Disconnect requested by this client. Never retried.
    pub const MANUAL_DISCONNECT: i32 = 0;
    /// No CONNACK within the connect timeout.
    pub const TIMEOUT: i32 = 1;
    /// Unexpected packet or client state error.
    pub const PROTOCOL: i32 = 5;
    /// Broker answered CONNECT with a refusal.
    pub const CONNECTION_REFUSED: i32 = 6;
    /// Socket, TLS or WebSocket failure.
    pub const TRANSPORT: i32 = 7;
}

/// Connection state as seen by the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConnectionState::Disconnected => "Disconnected",
            ConnectionState::Connecting => "Connecting...",
            ConnectionState::Connected => "Connected",
        };
        f.write_str(s)
    }
}

/// Why the manager stopped scheduling retries for this session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HaltReason {
    /// The reconnect ceiling was reached.
    Exhausted,
    /// The connection was closed on purpose.
    ManualDisconnect,
}

/// Why a connect attempt failed or an established connection dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LossReason {
    pub code: i32,
    pub message: String,
}

impl LossReason {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn manual() -> Self {
        Self::new(reason_code::MANUAL_DISCONNECT, "disconnect requested")
    }

    /// `true` when the loss was requested by this client.
    pub fn is_manual(&self) -> bool {
        self.code == reason_code::MANUAL_DISCONNECT
    }
}

impl fmt::Display for LossReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "code={}, {}", self.code, self.message)
    }
}

/// Identifies one connect attempt and everything reported for it.
pub type SessionId = u64;

/// Options for a single connect attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectOptions {
    /// Use TLS (`wss://`) for the WebSocket transport.
    pub secure: bool,
    /// Give up on the attempt if no CONNACK arrives within this window.
    pub timeout: Duration,
    /// Tag for every event reported about this attempt.
    pub session: SessionId,
}

/// Events a [`BrokerClient`](crate::BrokerClient) reports back to the manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    ConnectSucceeded,
    ConnectFailed(LossReason),
    ConnectionLost(LossReason),
    MessageArrived { topic: String, payload: String },
}

/// Everything the manager's run loop reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManagerEvent {
    /// An outcome reported by the broker client for one session. Events from
    /// a session other than the current one are stale and ignored.
    Client {
        session: SessionId,
        event: ClientEvent,
    },
    /// The user came back to the dashboard.
    FocusRegained,
    /// Explicit "retry now": leaves a halted session.
    Resume,
    /// Close the connection on purpose; no retry follows.
    Disconnect,
    /// The dashboard is going away.
    Unload,
}

impl ClientEvent {
    /// Tag this event with the session it belongs to.
    pub fn for_session(self, session: SessionId) -> ManagerEvent {
        ManagerEvent::Client {
            session,
            event: self,
        }
    }
}

/// Errors returned by this crate.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("unsupported broker URL: {0}")]
    BrokerUrl(String),
}
