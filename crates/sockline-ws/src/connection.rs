//! Live connection handle
//!
//! Wraps the established WebSocket stream together with its keep-alive
//! deadline. The engine holds at most one of these at a time; send and
//! choke-check operations fail fast while it is absent.

use std::task::Poll;
use std::time::Duration;

use futures_util::SinkExt;
use tokio::net::TcpStream;
use tokio::time::Instant;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, trace};

use sockline_core::{EngineError, FrameBuffer};

/// Concrete stream type for an established client connection.
pub(crate) type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

// ----------------------------------------------------------------------------
// Active Connection
// ----------------------------------------------------------------------------

pub(crate) struct ActiveConnection {
    pub(crate) stream: WsStream,
    ping_interval: Option<Duration>,
    next_ping: Instant,
}

impl ActiveConnection {
    pub(crate) fn new(stream: WsStream, ping_interval: Option<Duration>) -> Self {
        let next_ping = Instant::now() + ping_interval.unwrap_or(Duration::ZERO);
        Self {
            stream,
            ping_interval,
            next_ping,
        }
    }

    pub(crate) fn ping_enabled(&self) -> bool {
        self.ping_interval.is_some()
    }

    /// Deadline of the next keep-alive ping; meaningful only when enabled.
    pub(crate) fn next_ping(&self) -> Instant {
        self.next_ping
    }

    /// Send the keep-alive ping and reschedule the deadline.
    pub(crate) async fn send_keepalive_ping(&mut self) -> Result<(), EngineError> {
        if let Some(interval) = self.ping_interval {
            self.next_ping = Instant::now() + interval;
        }
        trace!("sending keep-alive ping");
        self.stream
            .send(Message::Ping(Vec::new()))
            .await
            .map_err(|e| EngineError::SendFailed {
                reason: e.to_string(),
            })
    }

    /// Answer an inbound ping with its payload echoed back.
    pub(crate) async fn send_pong(&mut self, data: Vec<u8>) -> Result<(), EngineError> {
        self.stream
            .send(Message::Pong(data))
            .await
            .map_err(|e| EngineError::SendFailed {
                reason: e.to_string(),
            })
    }

    /// Stage and dispatch an outbound payload.
    ///
    /// `as_frame` selects a text frame; otherwise the payload goes out as a
    /// raw body write (binary frame). Returns the number of payload bytes the
    /// transport accepted. The staging buffer is released on every path.
    pub(crate) async fn send_payload(
        &mut self,
        payload: &str,
        as_frame: bool,
        max_payload: usize,
    ) -> Result<usize, EngineError> {
        if payload.is_empty() {
            return Err(EngineError::EmptyPayload);
        }
        let size = payload.len();
        if size > max_payload {
            return Err(EngineError::PayloadTooLarge {
                size,
                max: max_payload,
            });
        }

        let staged = FrameBuffer::stage(payload.as_bytes());
        let accepted = staged.payload_len();
        let message = if as_frame {
            let text =
                String::from_utf8(staged.into_payload()).map_err(|e| EngineError::Encoding {
                    reason: e.to_string(),
                })?;
            Message::Text(text)
        } else {
            Message::Binary(staged.into_payload())
        };

        self.stream
            .send(message)
            .await
            .map_err(|e| EngineError::SendFailed {
                reason: e.to_string(),
            })?;

        debug!(bytes = accepted, as_frame, "payload dispatched");
        Ok(accepted)
    }

    /// Whether the outbound sink is currently unable to accept another frame.
    pub(crate) async fn is_choked(&mut self) -> bool {
        futures_util::future::poll_fn(|cx| {
            let ready = self.stream.poll_ready_unpin(cx);
            Poll::Ready(ready.is_pending())
        })
        .await
    }
}
