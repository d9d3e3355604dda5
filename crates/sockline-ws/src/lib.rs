//! WebSocket connection engine for Sockline
//!
//! This crate provides [`ConnectionEngine`], a single-connection lifecycle
//! controller over `tokio-tungstenite`. The engine owns parameter staging,
//! connection establishment, a host-driven service tick, the send path, and a
//! synchronous event-callback bridge; WebSocket framing, masking, extension
//! negotiation mechanics, and TLS record handling are supplied by the wrapped
//! library.
//!
//! ## Architecture
//!
//! - [`engine`] - Lifecycle controller and service tick
//! - [`connection`] - Live connection handle, send path, choke check
//! - [`bridge`] - Synchronous callback dispatch with extension policy
//! - [`tls`] - Relaxed-trust TLS connector from staged PEM material
//!
//! ## Usage
//!
//! ```rust,no_run
//! use sockline_core::{EventHandler, EventKind};
//! use sockline_ws::ConnectionEngine;
//!
//! struct Printer;
//!
//! impl EventHandler for Printer {
//!     fn on_event(&mut self, kind: EventKind, payload: Option<&str>) {
//!         println!("{} {:?}", kind, payload);
//!     }
//! }
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut engine = ConnectionEngine::new();
//! engine.set_connection_parameters("echo.example.com", 443, "/ws")?;
//! engine.initialize(Box::new(Printer))?;
//! engine.connect()?;
//!
//! // The host drives the engine; events are dispatched synchronously
//! // inside each tick.
//! loop {
//!     engine.service_tick(50).await;
//!     # break;
//! }
//! engine.teardown();
//! # Ok(())
//! # }
//! ```
//!
//! The engine performs no polling of its own and contains no retry or
//! reconnection logic; cadence, retries, and backoff belong to the host.

mod bridge;
mod connection;
mod engine;
mod tls;

// Public API exports
pub use engine::{ConnectionEngine, EngineState};

// Re-export the core vocabulary for convenience
pub use sockline_core::{
    ConnectionParameters, Disposition, EngineError, EventHandler, EventKind, ExtensionPolicy,
    TlsMaterial,
};
