//! Transport layer: the connection between a client and the relay.
//!
//! The [`Transport`] trait is injected into the sync session so the
//! emit/replay contract can be tested against an in-process transport.
//! [`WsTransport`] is the production implementation: a background thread
//! driving a WebSocket connection, surfaced through non-blocking polls.

use thiserror::Error;

use crate::protocol::SyncMessage;

/// Transport errors. Send failures are logged by the session and never
/// surfaced to the document model; the local edit stays applied.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Already connected")]
    AlreadyConnected,
    #[error("Not connected")]
    NotConnected,
    #[error("Invalid relay URL: {0}")]
    InvalidUrl(String),
    #[error("Send failed: {0}")]
    Send(String),
}

/// Connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Error,
}

/// Events surfaced by a transport poll.
#[derive(Debug, Clone)]
pub enum TransportEvent {
    Connected,
    Disconnected,
    /// An inbound sync message from another client, via the relay.
    Message(SyncMessage),
    Error(String),
}

/// A bidirectional channel to the relay.
///
/// Delivery is at-most-once, best effort: no acknowledgement, no retry.
/// Only FIFO ordering per connection is assumed.
pub trait Transport {
    fn connect(&mut self, url: &str) -> Result<(), TransportError>;
    fn disconnect(&mut self);
    fn send(&mut self, message: &SyncMessage) -> Result<(), TransportError>;
    /// Poll for pending events (non-blocking).
    fn poll_events(&mut self) -> Vec<TransportEvent>;
    fn state(&self) -> ConnectionState;
    fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }
}

// ============================================================================
// Native WebSocket transport
// ============================================================================

#[cfg(not(target_arch = "wasm32"))]
mod ws {
    use super::*;
    use std::sync::mpsc::{channel, Receiver, Sender, TryRecvError};
    use std::thread::{self, JoinHandle};
    use std::time::Duration;
    use tungstenite::{connect, Message};
    use url::Url;

    /// Commands sent to the WebSocket thread.
    enum WsCommand {
        Send(String),
        Close,
    }

    /// WebSocket transport backed by a background thread.
    pub struct WsTransport {
        state: ConnectionState,
        events: Vec<TransportEvent>,
        cmd_tx: Option<Sender<WsCommand>>,
        event_rx: Option<Receiver<TransportEvent>>,
        _thread: Option<JoinHandle<()>>,
    }

    impl WsTransport {
        /// Create a new disconnected transport.
        pub fn new() -> Self {
            Self {
                state: ConnectionState::Disconnected,
                events: Vec::new(),
                cmd_tx: None,
                event_rx: None,
                _thread: None,
            }
        }
    }

    impl Default for WsTransport {
        fn default() -> Self {
            Self::new()
        }
    }

    impl Transport for WsTransport {
        fn connect(&mut self, url: &str) -> Result<(), TransportError> {
            if self.cmd_tx.is_some() {
                return Err(TransportError::AlreadyConnected);
            }

            let parsed = Url::parse(url).map_err(|e| TransportError::InvalidUrl(e.to_string()))?;
            if parsed.scheme() != "ws" && parsed.scheme() != "wss" {
                return Err(TransportError::InvalidUrl(format!(
                    "unsupported scheme: {}",
                    parsed.scheme()
                )));
            }

            self.state = ConnectionState::Connecting;

            let (cmd_tx, cmd_rx) = channel::<WsCommand>();
            let (event_tx, event_rx) = channel::<TransportEvent>();
            let url = url.to_string();

            let handle = thread::spawn(move || {
                log::info!("relay connection: connecting to {url}");

                let (mut socket, response) = match connect(url.as_str()) {
                    Ok(pair) => pair,
                    Err(e) => {
                        log::error!("relay connection failed: {e}");
                        let _ = event_tx.send(TransportEvent::Error(format!(
                            "Connection failed: {e}"
                        )));
                        return;
                    }
                };
                log::info!("relay connected, status: {}", response.status());
                let _ = event_tx.send(TransportEvent::Connected);

                // Short read timeout so the loop stays responsive to
                // outbound commands.
                if let tungstenite::stream::MaybeTlsStream::Plain(tcp) = socket.get_mut() {
                    let _ = tcp.set_read_timeout(Some(Duration::from_millis(50)));
                    let _ = tcp.set_write_timeout(Some(Duration::from_secs(5)));
                }

                loop {
                    match cmd_rx.try_recv() {
                        Ok(WsCommand::Send(text)) => {
                            if let Err(e) = socket.send(Message::Text(text)) {
                                log::error!("relay send error: {e}");
                                break;
                            }
                        }
                        Ok(WsCommand::Close) | Err(TryRecvError::Disconnected) => {
                            let _ = socket.close(None);
                            break;
                        }
                        Err(TryRecvError::Empty) => {}
                    }

                    match socket.read() {
                        Ok(Message::Text(text)) => {
                            match serde_json::from_str::<SyncMessage>(&text) {
                                Ok(msg) => {
                                    let _ = event_tx.send(TransportEvent::Message(msg));
                                }
                                Err(e) => {
                                    log::warn!("unparseable relay message: {e}");
                                }
                            }
                        }
                        Ok(Message::Ping(data)) => {
                            let _ = socket.send(Message::Pong(data));
                        }
                        Ok(Message::Close(_)) => break,
                        Ok(_) => {}
                        Err(tungstenite::Error::Io(ref e))
                            if e.kind() == std::io::ErrorKind::WouldBlock
                                || e.kind() == std::io::ErrorKind::TimedOut =>
                        {
                            continue;
                        }
                        Err(e) => {
                            log::error!("relay read error: {e}");
                            break;
                        }
                    }
                }

                log::info!("relay connection closed");
                let _ = event_tx.send(TransportEvent::Disconnected);
            });

            self.cmd_tx = Some(cmd_tx);
            self.event_rx = Some(event_rx);
            self._thread = Some(handle);
            Ok(())
        }

        fn disconnect(&mut self) {
            if let Some(tx) = self.cmd_tx.take() {
                let _ = tx.send(WsCommand::Close);
            }
            self.event_rx = None;
            self._thread = None;
            self.state = ConnectionState::Disconnected;
        }

        fn send(&mut self, message: &SyncMessage) -> Result<(), TransportError> {
            let tx = self.cmd_tx.as_ref().ok_or(TransportError::NotConnected)?;
            let json = serde_json::to_string(message)
                .map_err(|e| TransportError::Send(e.to_string()))?;
            tx.send(WsCommand::Send(json))
                .map_err(|e| TransportError::Send(e.to_string()))
        }

        fn poll_events(&mut self) -> Vec<TransportEvent> {
            if let Some(ref rx) = self.event_rx {
                while let Ok(event) = rx.try_recv() {
                    match &event {
                        TransportEvent::Connected => self.state = ConnectionState::Connected,
                        TransportEvent::Disconnected => self.state = ConnectionState::Disconnected,
                        TransportEvent::Error(_) => self.state = ConnectionState::Error,
                        TransportEvent::Message(_) => {}
                    }
                    self.events.push(event);
                }
            }
            std::mem::take(&mut self.events)
        }

        fn state(&self) -> ConnectionState {
            self.state
        }
    }

    impl Drop for WsTransport {
        fn drop(&mut self) {
            self.disconnect();
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub use ws::WsTransport;

// ============================================================================
// In-process loopback transport
// ============================================================================

use std::sync::mpsc::{channel, Receiver, Sender};

/// An in-process transport: two halves wired directly to each other.
///
/// Used by tests and by anything that wants to drive two stores against
/// each other without a relay. Each half's sends arrive as `Message`
/// events on the peer.
pub struct ChannelTransport {
    state: ConnectionState,
    tx: Sender<SyncMessage>,
    rx: Receiver<SyncMessage>,
}

impl ChannelTransport {
    /// Create a connected pair of transports.
    pub fn pair() -> (Self, Self) {
        let (a_tx, b_rx) = channel();
        let (b_tx, a_rx) = channel();
        (
            Self {
                state: ConnectionState::Connected,
                tx: a_tx,
                rx: a_rx,
            },
            Self {
                state: ConnectionState::Connected,
                tx: b_tx,
                rx: b_rx,
            },
        )
    }
}

impl Transport for ChannelTransport {
    fn connect(&mut self, _url: &str) -> Result<(), TransportError> {
        self.state = ConnectionState::Connected;
        Ok(())
    }

    fn disconnect(&mut self) {
        self.state = ConnectionState::Disconnected;
    }

    fn send(&mut self, message: &SyncMessage) -> Result<(), TransportError> {
        if self.state != ConnectionState::Connected {
            return Err(TransportError::NotConnected);
        }
        self.tx
            .send(message.clone())
            .map_err(|e| TransportError::Send(e.to_string()))
    }

    fn poll_events(&mut self) -> Vec<TransportEvent> {
        let mut events = Vec::new();
        while let Ok(msg) = self.rx.try_recv() {
            events.push(TransportEvent::Message(msg));
        }
        events
    }

    fn state(&self) -> ConnectionState {
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_pair_delivers_both_ways() {
        let (mut a, mut b) = ChannelTransport::pair();
        let msg = SyncMessage::JoinRoom { room_id: "r1".into() };
        a.send(&msg).unwrap();

        let events = b.poll_events();
        assert_eq!(events.len(), 1);
        assert!(matches!(
            &events[0],
            TransportEvent::Message(m) if m == &msg
        ));
        assert!(a.poll_events().is_empty());

        b.send(&msg).unwrap();
        assert_eq!(a.poll_events().len(), 1);
    }

    #[test]
    fn disconnected_channel_refuses_sends() {
        let (mut a, _b) = ChannelTransport::pair();
        a.disconnect();
        let msg = SyncMessage::LeaveRoom { room_id: "r1".into() };
        assert!(matches!(a.send(&msg), Err(TransportError::NotConnected)));
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn ws_transport_rejects_bad_urls() {
        let mut ws = WsTransport::new();
        assert!(matches!(
            ws.connect("http://localhost:3030"),
            Err(TransportError::InvalidUrl(_))
        ));
        assert!(matches!(
            ws.connect("not a url"),
            Err(TransportError::InvalidUrl(_))
        ));
        assert_eq!(ws.state(), ConnectionState::Disconnected);
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn ws_transport_send_requires_connection() {
        let mut ws = WsTransport::new();
        let msg = SyncMessage::JoinRoom { room_id: "r1".into() };
        assert!(matches!(ws.send(&msg), Err(TransportError::NotConnected)));
    }
}
