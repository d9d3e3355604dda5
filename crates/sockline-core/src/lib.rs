//! Core vocabulary for the Sockline WebSocket connection engine
//!
//! This crate holds the I/O-free half of Sockline: the connection parameters
//! store, the event vocabulary delivered to the host, the extension
//! negotiation policy, the error taxonomy, and the padded staging buffer used
//! by the send path. The engine itself (lifecycle controller, transport glue,
//! service tick) lives in `sockline-ws`.

// ----------------------------------------------------------------------------
// Module Declarations
// ----------------------------------------------------------------------------

pub mod error;
pub mod event;
pub mod framing;
pub mod params;
pub mod policy;

// ----------------------------------------------------------------------------
// Public API
// ----------------------------------------------------------------------------

pub use error::EngineError;
pub use event::{Disposition, EventHandler, EventKind};
pub use framing::{FrameBuffer, SEND_PRE_PADDING};
pub use params::{ConnectionParameters, TlsMaterial};
pub use policy::ExtensionPolicy;

/// Convenience result alias used across the workspace.
pub type Result<T> = core::result::Result<T, EngineError>;
