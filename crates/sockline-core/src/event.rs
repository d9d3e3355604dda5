//! Event vocabulary delivered to the host
//!
//! Every transport-level occurrence is forwarded to the host as an
//! [`EventKind`] plus an optional text payload. Kinds carry stable integer
//! codes so hosts that multiplex notifications over an integer channel keep
//! working across versions.

use core::fmt;

// ----------------------------------------------------------------------------
// Event Kinds
// ----------------------------------------------------------------------------

/// Kind of a transport event forwarded through the callback bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// The connection attempt failed before or during the handshake.
    ConnectionError,
    /// The handshake completed and the connection is live.
    ClientEstablished,
    /// The connection closed (remote close frame or stream end).
    Closed,
    /// A data frame arrived; non-empty bytes are passed as the text payload.
    DataReceived,
    /// A pong frame arrived.
    PongReceived,
    /// The server proposed an extension; payload is the extension name.
    ExtensionNegotiation,
}

impl EventKind {
    /// Stable integer code for this event kind.
    pub fn code(self) -> i32 {
        match self {
            EventKind::ConnectionError => 1,
            EventKind::ClientEstablished => 3,
            EventKind::Closed => 4,
            EventKind::DataReceived => 8,
            EventKind::PongReceived => 9,
            EventKind::ExtensionNegotiation => 25,
        }
    }

    /// Reverse lookup from an integer code.
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            1 => Some(EventKind::ConnectionError),
            3 => Some(EventKind::ClientEstablished),
            4 => Some(EventKind::Closed),
            8 => Some(EventKind::DataReceived),
            9 => Some(EventKind::PongReceived),
            25 => Some(EventKind::ExtensionNegotiation),
            _ => None,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EventKind::ConnectionError => "connection-error",
            EventKind::ClientEstablished => "client-established",
            EventKind::Closed => "closed",
            EventKind::DataReceived => "data-received",
            EventKind::PongReceived => "pong-received",
            EventKind::ExtensionNegotiation => "extension-negotiation",
        };
        write!(f, "{name}")
    }
}

// ----------------------------------------------------------------------------
// Disposition
// ----------------------------------------------------------------------------

/// Outcome of dispatching an event through the bridge.
///
/// Only extension negotiation events can produce [`Disposition::Reject`];
/// every other kind yields the neutral continue code after notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Keep going; the transport may proceed.
    Continue,
    /// Refuse the proposed extension.
    Reject,
}

impl Disposition {
    /// Integer code (0 = continue, 1 = reject).
    pub fn code(self) -> i32 {
        match self {
            Disposition::Continue => 0,
            Disposition::Reject => 1,
        }
    }

    pub fn is_reject(self) -> bool {
        matches!(self, Disposition::Reject)
    }
}

// ----------------------------------------------------------------------------
// Event Handler
// ----------------------------------------------------------------------------

/// Host callback invoked once per transport event during a service tick.
///
/// Dispatch is synchronous: transport processing is paused for the duration
/// of the callback, so implementations must not block. The handler is
/// registered at `initialize` and released at `teardown`.
pub trait EventHandler: Send {
    fn on_event(&mut self, kind: EventKind, payload: Option<&str>);
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
