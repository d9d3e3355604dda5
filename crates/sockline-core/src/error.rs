//! Error types for the connection engine

use thiserror::Error;

// ----------------------------------------------------------------------------
// Error Types
// ----------------------------------------------------------------------------

/// Errors reported synchronously by the boundary operations.
///
/// Failures that occur after `connect` has returned (handshake rejected,
/// remote close, transport error) are never surfaced here; they arrive through
/// the event callback bridge instead.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Connection parameters not configured")]
    NotConfigured,

    #[error("Address and path must be non-empty")]
    InvalidParameters,

    #[error("Engine already initialized")]
    AlreadyInitialized,

    #[error("Engine not initialized")]
    NotInitialized,

    #[error("Engine context allocation failed: {reason}")]
    Allocation { reason: String },

    #[error("A connection attempt is already active or pending")]
    AlreadyConnected,

    #[error("No live connection")]
    NotConnected,

    #[error("Empty payload")]
    EmptyPayload,

    #[error("Payload could not be encoded: {reason}")]
    Encoding { reason: String },

    #[error("Payload too large: {size} bytes (max: {max})")]
    PayloadTooLarge { size: usize, max: usize },

    #[error("Invalid connection request: {reason}")]
    Request { reason: String },

    #[error("Send failed: {reason}")]
    SendFailed { reason: String },
}
