//! Wire types for the shared-scope RPC, framed as newline-delimited JSON over a
//! unix domain socket. One request per line, one response per line, in order.

use serde::{Deserialize, Serialize};

/// A request a client sends to the coordinator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Request {
    RegisterResource {
        name: String,
        error_threshold: usize,
        error_timeout_ms: u64,
        success_threshold: usize,
    },
    ReportError {
        name: String,
    },
    ReportSuccess {
        name: String,
    },
    GetState {
        name: String,
    },
    GetOpenStates,
    Subscribe {
        name: String,
        subscriber_ref: String,
    },
    Unsubscribe {
        name: String,
        subscriber_ref: String,
    },
}

/// The coordinator's reply to a [`Request`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Response {
    Registered {
        registered: bool,
        state: WireState,
    },
    StateChanged {
        state: Option<WireState>,
    },
    State {
        state: WireState,
    },
    OpenStates {
        states: std::collections::HashMap<String, WireState>,
    },
    Subscribed,
    Unsubscribed,
    Error {
        message: String,
    },
}

/// An out-of-band push from server to client, distinct from request/response
/// traffic: broadcast to every subscriber of `name` whenever its state changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateChangeNotification {
    pub name: String,
    pub state: WireState,
}

/// Every line the server writes is one of these, so a client reading the
/// connection can tell a reply to its own request apart from an unsolicited
/// subscription push without a request-id field on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ServerMessage {
    Response(Response),
    Notify(StateChangeNotification),
}

/// The over-the-wire representation of [`semian_core::CircuitState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WireState {
    Closed,
    Open,
    HalfOpen,
}

impl From<semian_core::CircuitState> for WireState {
    fn from(state: semian_core::CircuitState) -> Self {
        match state {
            semian_core::CircuitState::Closed => WireState::Closed,
            semian_core::CircuitState::Open => WireState::Open,
            semian_core::CircuitState::HalfOpen => WireState::HalfOpen,
        }
    }
}
