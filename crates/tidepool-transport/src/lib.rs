//! Frame transport: a blocking `tungstenite` client per connection URL,
//! plus a fixed-script `TestTransport` used to drive deterministic
//! scenarios without a live exchange feed.

use std::net::TcpStream;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tungstenite::stream::MaybeTlsStream;
use tungstenite::{Message, WebSocket};

const INITIAL_BACKOFF: Duration = Duration::from_millis(250);
const MAX_BACKOFF: Duration = Duration::from_secs(30);

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("failed to connect to '{url}'")]
    Connect {
        url: String,
        #[source]
        source: tungstenite::Error,
    },
}

/// A source of UTF-8 text frames. `next_frame` blocks until a frame
/// arrives, the transport is shut down, or (for the network
/// implementation) a transient failure is being retried internally.
pub trait Transport: Send {
    fn connect(&mut self) -> Result<(), TransportError>;
    fn next_frame(&mut self) -> Option<String>;
    fn shutdown(&mut self);
}

pub struct WebSocketTransport {
    url: String,
    socket: Option<WebSocket<MaybeTlsStream<TcpStream>>>,
    shutdown: Arc<AtomicBool>,
    backoff: Duration,
}

impl WebSocketTransport {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            socket: None,
            shutdown: Arc::new(AtomicBool::new(false)),
            backoff: INITIAL_BACKOFF,
        }
    }

    fn dial(&mut self) -> Result<(), TransportError> {
        let (socket, _response) =
            tungstenite::connect(&self.url).map_err(|source| TransportError::Connect {
                url: self.url.clone(),
                source,
            })?;
        self.socket = Some(socket);
        self.backoff = INITIAL_BACKOFF;
        Ok(())
    }

    fn reconnect_with_backoff(&mut self) {
        self.socket = None;
        while !self.shutdown.load(Ordering::Acquire) {
            tracing::warn!(url = %self.url, backoff_ms = self.backoff.as_millis(), "reconnecting");
            std::thread::sleep(self.backoff);
            if self.dial().is_ok() {
                return;
            }
            self.backoff = (self.backoff * 2).min(MAX_BACKOFF);
        }
    }
}

impl Transport for WebSocketTransport {
    fn connect(&mut self) -> Result<(), TransportError> {
        self.dial()
    }

    fn next_frame(&mut self) -> Option<String> {
        loop {
            if self.shutdown.load(Ordering::Acquire) {
                return None;
            }
            let Some(socket) = self.socket.as_mut() else {
                self.reconnect_with_backoff();
                continue;
            };
            match socket.read() {
                Ok(Message::Text(text)) => return Some(text.to_string()),
                Ok(Message::Binary(_) | Message::Ping(_) | Message::Pong(_) | Message::Frame(_)) => {
                    continue;
                }
                Ok(Message::Close(_)) | Err(_) => {
                    self.reconnect_with_backoff();
                }
            }
        }
    }

    fn shutdown(&mut self) {
        self.shutdown.store(true, Ordering::Release);
        if let Some(socket) = self.socket.as_mut() {
            let _ = socket.close(None);
        }
    }
}

/// Replays a fixed script of frames, then returns `None` forever (as if
/// the remote end closed cleanly). Used to drive the S1-S6 scenarios
/// through the real engine without a network dependency.
pub struct TestTransport {
    frames: std::collections::VecDeque<String>,
    shutdown: bool,
}

impl TestTransport {
    pub fn new(frames: Vec<String>) -> Self {
        Self {
            frames: frames.into(),
            shutdown: false,
        }
    }
}

impl Transport for TestTransport {
    fn connect(&mut self) -> Result<(), TransportError> {
        Ok(())
    }

    fn next_frame(&mut self) -> Option<String> {
        if self.shutdown {
            return None;
        }
        self.frames.pop_front()
    }

    fn shutdown(&mut self) {
        self.shutdown = true;
        self.frames.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_replays_in_order_then_ends() {
        let mut transport = TestTransport::new(vec!["a".into(), "b".into()]);
        transport.connect().unwrap();
        assert_eq!(transport.next_frame(), Some("a".into()));
        assert_eq!(transport.next_frame(), Some("b".into()));
        assert_eq!(transport.next_frame(), None);
    }

    #[test]
    fn shutdown_empties_remaining_frames() {
        let mut transport = TestTransport::new(vec!["a".into(), "b".into(), "c".into()]);
        transport.shutdown();
        assert_eq!(transport.next_frame(), None);
    }
}
