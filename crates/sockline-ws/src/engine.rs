//! Connection lifecycle controller
//!
//! [`ConnectionEngine`] owns the staged parameters, the engine context, and
//! the single logical connection. The host drives it: `connect` only admits
//! the attempt, and all transport progress (handshake results, inbound
//! frames, keep-alive pings) happens inside `service_tick`, where events are
//! dispatched synchronously through the callback bridge.

use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::client::Response;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{connect_async_tls_with_config, Connector};
use tracing::{debug, info, warn};
use url::Url;

use sockline_core::{
    ConnectionParameters, EngineError, EventHandler, EventKind, ExtensionPolicy,
};

use crate::bridge::CallbackBridge;
use crate::connection::{ActiveConnection, WsStream};
use crate::tls;

// ----------------------------------------------------------------------------
// Engine State
// ----------------------------------------------------------------------------

/// Lifecycle state of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// No context allocated.
    Uninitialized,
    /// Context live, no connection.
    Initialized,
    /// Connection established.
    Connected,
    /// Connection ended (remote close or transport error); the context is
    /// still live and a new `connect` is allowed.
    Closed,
}

// ----------------------------------------------------------------------------
// Internal Transport Events
// ----------------------------------------------------------------------------

/// Result of a spawned connection attempt, handed back to the service tick.
enum TransportEvent {
    Opened {
        stream: Box<WsStream>,
        extensions: Vec<String>,
    },
    OpenFailed {
        reason: String,
    },
}

/// One unit of work surfaced by a service tick.
enum Step {
    Transport(TransportEvent),
    Frame(Option<Result<Message, WsError>>),
    PingDue,
}

// ----------------------------------------------------------------------------
// Engine Context
// ----------------------------------------------------------------------------

/// Process state created by `initialize` and destroyed by `teardown`.
///
/// Timeout, ping interval, TLS config, and the callback bridge are snapshots
/// of the parameters at initialization time.
struct EngineContext {
    event_tx: mpsc::UnboundedSender<TransportEvent>,
    event_rx: mpsc::UnboundedReceiver<TransportEvent>,
    bridge: CallbackBridge,
    tls_config: Option<Arc<rustls::ClientConfig>>,
    timeout: Option<Duration>,
    ping_interval: Option<Duration>,
}

// ----------------------------------------------------------------------------
// Connection Engine
// ----------------------------------------------------------------------------

/// Single-connection WebSocket client engine.
///
/// All methods take `&mut self`; the host is responsible for serializing
/// access (ownership already enforces this within one task). The engine
/// contains no retry or reconnection logic and never polls on its own.
pub struct ConnectionEngine {
    params: ConnectionParameters,
    context: Option<EngineContext>,
    connection: Option<ActiveConnection>,
    attempt_pending: bool,
    state: EngineState,
}

impl Default for ConnectionEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionEngine {
    pub fn new() -> Self {
        Self {
            params: ConnectionParameters::new(),
            context: None,
            connection: None,
            attempt_pending: false,
            state: EngineState::Uninitialized,
        }
    }

    // ------------------------------------------------------------------
    // Parameter staging
    // ------------------------------------------------------------------

    /// Stage the target endpoint. Fails and leaves the store unconfigured if
    /// address or path is empty; resets any staged TLS material.
    pub fn set_connection_parameters(
        &mut self,
        address: &str,
        port: u16,
        path: &str,
    ) -> Result<(), EngineError> {
        self.params.set_endpoint(address, port, path)
    }

    /// Stage TLS material and enable relaxed-trust TLS. Empty path strings
    /// are treated as absent. Bound at the next `initialize`.
    pub fn set_ca_cert(&mut self, ca_path: &str, cert_path: &str, key_path: &str) {
        self.params.set_tls_material(ca_path, cert_path, key_path);
    }

    /// Connection-establishment timeout in seconds; `0` disables. Effective
    /// at the next `initialize`.
    pub fn set_timeout(&mut self, seconds: u64) {
        self.params.set_timeout(seconds);
    }

    /// Keep-alive ping interval in seconds; `0` disables. Effective at the
    /// next `initialize`.
    pub fn set_ping_interval(&mut self, seconds: u64) {
        self.params.set_ping_interval(seconds);
    }

    /// Cap on a single outbound payload in bytes.
    pub fn set_max_payload(&mut self, bytes: usize) {
        self.params.set_max_payload(bytes);
    }

    /// Extension negotiation policy, bound at the next `initialize`.
    pub fn set_extension_policy(&mut self, policy: ExtensionPolicy) {
        self.params.set_extension_policy(policy);
    }

    /// Staged parameters.
    pub fn params(&self) -> &ConnectionParameters {
        &self.params
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Allocate the engine context and register the event handler.
    ///
    /// Rejects a second initialization while a context is live, rejects an
    /// unconfigured parameter store, and fails if the staged TLS material
    /// cannot be loaded.
    pub fn initialize(&mut self, handler: Box<dyn EventHandler>) -> Result<(), EngineError> {
        if self.context.is_some() {
            return Err(EngineError::AlreadyInitialized);
        }
        if !self.params.is_configured() {
            return Err(EngineError::NotConfigured);
        }

        let tls_config = match self.params.tls_material() {
            Some(material) => Some(tls::build_client_config(material)?),
            None => None,
        };

        let (event_tx, event_rx) = mpsc::unbounded_channel();
        self.context = Some(EngineContext {
            event_tx,
            event_rx,
            bridge: CallbackBridge::new(handler, self.params.extension_policy()),
            tls_config,
            timeout: self.params.timeout(),
            ping_interval: self.params.ping_interval(),
        });
        self.state = EngineState::Initialized;
        info!(tls = self.params.tls_enabled(), "engine initialized");
        Ok(())
    }

    /// Start a connection attempt against the live context.
    ///
    /// Success means the attempt was admitted, not that the handshake
    /// completed: establishment or failure is reported later through the
    /// bridge (`ClientEstablished` / `ConnectionError`) during a service
    /// tick. Must be called from within a Tokio runtime.
    pub fn connect(&mut self) -> Result<(), EngineError> {
        if !self.params.is_configured() {
            return Err(EngineError::NotConfigured);
        }
        let ctx = self.context.as_ref().ok_or(EngineError::NotInitialized)?;
        if self.attempt_pending || self.connection.is_some() {
            return Err(EngineError::AlreadyConnected);
        }

        let url = self.params.url();
        Url::parse(&url).map_err(|e| EngineError::Request {
            reason: e.to_string(),
        })?;
        let request = url
            .as_str()
            .into_client_request()
            .map_err(|e| EngineError::Request {
                reason: e.to_string(),
            })?;

        let connector = if self.params.tls_enabled() {
            ctx.tls_config.clone().map(Connector::Rustls)
        } else {
            None
        };
        let timeout = ctx.timeout;
        let event_tx = ctx.event_tx.clone();

        info!(%url, "starting connection attempt");
        tokio::spawn(async move {
            let attempt = connect_async_tls_with_config(request, None, true, connector);
            let outcome = match timeout {
                Some(limit) => match tokio::time::timeout(limit, attempt).await {
                    Ok(result) => result,
                    Err(_) => Err(WsError::Io(std::io::Error::new(
                        std::io::ErrorKind::TimedOut,
                        "connection attempt timed out",
                    ))),
                },
                None => attempt.await,
            };
            let event = match outcome {
                Ok((stream, response)) => TransportEvent::Opened {
                    stream: Box::new(stream),
                    extensions: negotiated_extensions(&response),
                },
                Err(e) => TransportEvent::OpenFailed {
                    reason: e.to_string(),
                },
            };
            // A failed send means the engine was torn down mid-attempt.
            let _ = event_tx.send(event);
        });

        self.attempt_pending = true;
        Ok(())
    }

    /// Drive the transport for one tick, dispatching events synchronously.
    ///
    /// No-op when uninitialized. Runs for at most `timeout_ms` milliseconds,
    /// even under a continuous inbound flood; the host must call this on a
    /// steady cadence since the engine performs no polling on its own.
    pub async fn service_tick(&mut self, timeout_ms: u64) {
        if self.context.is_none() {
            return;
        }
        let deadline = Instant::now() + Duration::from_millis(timeout_ms);
        while Instant::now() < deadline {
            match self.next_step(deadline).await {
                Some(step) => self.process_step(step).await,
                None => break,
            }
        }
    }

    /// Destroy the context, release the bridge, and invalidate the
    /// connection handle. Idempotent.
    pub fn teardown(&mut self) {
        if self.context.take().is_some() {
            info!("engine context destroyed");
        }
        self.connection = None;
        self.attempt_pending = false;
        self.state = EngineState::Uninitialized;
    }

    /// Current lifecycle state.
    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Whether a connection handle is live.
    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    // ------------------------------------------------------------------
    // Send path
    // ------------------------------------------------------------------

    /// Stage and dispatch an outbound payload, returning the number of
    /// payload bytes accepted.
    ///
    /// `as_frame == true` sends a text frame; `false` sends a raw body write
    /// (expressed as a binary frame by the underlying transport). Fails fast
    /// when no connection handle is live, when the payload is empty, or when
    /// it exceeds the staged payload cap.
    pub async fn send_message(
        &mut self,
        payload: &str,
        as_frame: bool,
    ) -> Result<usize, EngineError> {
        let max_payload = self.params.max_payload();
        let conn = self
            .connection
            .as_mut()
            .ok_or(EngineError::NotConnected)?;
        conn.send_payload(payload, as_frame, max_payload).await
    }

    /// Whether the outbound pipe is currently saturated. Conservatively true
    /// when no connection handle is live.
    pub async fn is_send_blocked(&mut self) -> bool {
        match self.connection.as_mut() {
            None => true,
            Some(conn) => conn.is_choked().await,
        }
    }

    // ------------------------------------------------------------------
    // Service tick internals
    // ------------------------------------------------------------------

    /// Wait for the next unit of work, or `None` once the tick deadline
    /// passes with nothing ready. Pending work is drained before the
    /// deadline is consulted.
    async fn next_step(&mut self, deadline: Instant) -> Option<Step> {
        let ctx = self.context.as_mut()?;
        match self.connection.as_mut() {
            Some(conn) => {
                let ping_enabled = conn.ping_enabled();
                let next_ping = conn.next_ping();
                tokio::select! {
                    biased;
                    event = ctx.event_rx.recv() => event.map(Step::Transport),
                    frame = conn.stream.next() => Some(Step::Frame(frame)),
                    _ = tokio::time::sleep_until(next_ping), if ping_enabled => Some(Step::PingDue),
                    _ = tokio::time::sleep_until(deadline) => None,
                }
            }
            None => {
                tokio::select! {
                    biased;
                    event = ctx.event_rx.recv() => event.map(Step::Transport),
                    _ = tokio::time::sleep_until(deadline) => None,
                }
            }
        }
    }

    async fn process_step(&mut self, step: Step) {
        match step {
            Step::Transport(TransportEvent::Opened { stream, extensions }) => {
                self.attempt_pending = false;
                let Some(ctx) = self.context.as_mut() else {
                    return;
                };

                // Extension proposals are checked before the connection is
                // admitted; one rejection aborts the attempt.
                let denied = extensions.iter().find(|ext| {
                    ctx.bridge
                        .dispatch(EventKind::ExtensionNegotiation, Some(ext))
                        .is_reject()
                });
                if let Some(ext) = denied {
                    let reason = format!("denied extension: {ext}");
                    warn!(%reason, "connection attempt aborted");
                    ctx.bridge.dispatch(EventKind::ConnectionError, Some(&reason));
                    self.state = EngineState::Initialized;
                    return;
                }

                self.connection = Some(ActiveConnection::new(*stream, ctx.ping_interval));
                self.state = EngineState::Connected;
                info!("connection established");
                ctx.bridge.dispatch(EventKind::ClientEstablished, None);
            }
            Step::Transport(TransportEvent::OpenFailed { reason }) => {
                self.attempt_pending = false;
                warn!(%reason, "connection attempt failed");
                if let Some(ctx) = self.context.as_mut() {
                    ctx.bridge.dispatch(EventKind::ConnectionError, Some(&reason));
                }
                self.state = EngineState::Initialized;
            }
            Step::Frame(frame) => self.process_frame(frame).await,
            Step::PingDue => {
                if let Some(conn) = self.connection.as_mut() {
                    if let Err(e) = conn.send_keepalive_ping().await {
                        warn!(error = %e, "keep-alive ping failed");
                    }
                }
            }
        }
    }

    async fn process_frame(&mut self, frame: Option<Result<Message, WsError>>) {
        let Some(ctx) = self.context.as_mut() else {
            return;
        };
        match frame {
            Some(Ok(Message::Text(text))) => {
                let payload = if text.is_empty() {
                    None
                } else {
                    Some(text.as_str())
                };
                ctx.bridge.dispatch(EventKind::DataReceived, payload);
            }
            Some(Ok(Message::Binary(data))) => {
                if data.is_empty() {
                    ctx.bridge.dispatch(EventKind::DataReceived, None);
                } else {
                    let text = String::from_utf8_lossy(&data);
                    ctx.bridge.dispatch(EventKind::DataReceived, Some(&text));
                }
            }
            Some(Ok(Message::Ping(data))) => {
                debug!("answering ping");
                if let Some(conn) = self.connection.as_mut() {
                    if let Err(e) = conn.send_pong(data).await {
                        warn!(error = %e, "pong reply failed");
                    }
                }
            }
            Some(Ok(Message::Pong(_))) => {
                ctx.bridge.dispatch(EventKind::PongReceived, None);
            }
            Some(Ok(Message::Close(close_frame))) => {
                let reason = close_frame
                    .map(|f| f.reason.into_owned())
                    .filter(|r| !r.is_empty());
                info!(reason = reason.as_deref().unwrap_or(""), "connection closed by peer");
                ctx.bridge.dispatch(EventKind::Closed, reason.as_deref());
                self.connection = None;
                self.state = EngineState::Closed;
            }
            Some(Ok(Message::Frame(_))) => {
                // Raw frames are transport internals; skip.
            }
            Some(Err(e)) => {
                let reason = e.to_string();
                warn!(%reason, "transport error");
                ctx.bridge.dispatch(EventKind::ConnectionError, Some(&reason));
                self.connection = None;
                self.state = EngineState::Closed;
            }
            None => {
                ctx.bridge.dispatch(EventKind::Closed, None);
                self.connection = None;
                self.state = EngineState::Closed;
            }
        }
    }
}

// ----------------------------------------------------------------------------
// Helpers
// ----------------------------------------------------------------------------

/// Extension names the server accepted, taken from the handshake response.
fn negotiated_extensions(response: &Response) -> Vec<String> {
    response
        .headers()
        .get_all("Sec-WebSocket-Extensions")
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .filter_map(|entry| entry.split(';').next())
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .collect()
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negotiated_extensions_parsing() {
        let response = http_response(&[("Sec-WebSocket-Extensions", "deflate-frame; max_window_bits=10, x-google-mux")]);
        assert_eq!(
            negotiated_extensions(&response),
            vec!["deflate-frame".to_string(), "x-google-mux".to_string()]
        );
    }

    #[test]
    fn test_no_extensions_header_yields_empty() {
        let response = http_response(&[]);
        assert!(negotiated_extensions(&response).is_empty());
    }

    fn http_response(headers: &[(&str, &str)]) -> Response {
        let mut builder = tokio_tungstenite::tungstenite::http::Response::builder().status(101);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(None).unwrap()
    }
}
