//! Sync session: wires a room store to a transport.
//!
//! One session per active room, constructed on room entry and torn down
//! on leave. The session owns the transport (no process-wide connection
//! singleton) and enforces the two protocol rules that matter:
//! membership is announced once per session, and inbound messages are
//! replayed through [`RoomStore::apply_remote`], which never re-emits.

use crate::protocol::SyncMessage;
use crate::store::RoomStore;
use crate::transport::{Transport, TransportError, TransportEvent};

/// An editing session's connection to the relay for one room.
pub struct SyncSession<T: Transport> {
    transport: T,
    room_id: String,
    joined: bool,
}

impl<T: Transport> SyncSession<T> {
    pub fn new(transport: T, room_id: impl Into<String>) -> Self {
        Self {
            transport,
            room_id: room_id.into(),
            joined: false,
        }
    }

    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    pub fn is_joined(&self) -> bool {
        self.joined
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Connect the underlying transport to the relay.
    pub fn connect(&mut self, url: &str) -> Result<(), TransportError> {
        self.transport.connect(url)
    }

    /// Announce membership. Idempotent: a second call on a joined session
    /// sends nothing.
    pub fn join(&mut self) {
        if self.joined {
            return;
        }
        let msg = SyncMessage::JoinRoom {
            room_id: self.room_id.clone(),
        };
        match self.transport.send(&msg) {
            Ok(()) => self.joined = true,
            Err(e) => log::warn!("join_room send failed: {e}"),
        }
    }

    /// Announce departure and stop issuing messages. Idempotent. In-flight
    /// messages are not cancelled.
    pub fn leave(&mut self) {
        if !self.joined {
            return;
        }
        let msg = SyncMessage::LeaveRoom {
            room_id: self.room_id.clone(),
        };
        if let Err(e) = self.transport.send(&msg) {
            log::warn!("leave_room send failed: {e}");
        }
        self.joined = false;
    }

    /// Drain the store's outbox to the wire.
    ///
    /// A send failure is logged and the message dropped; the local edit
    /// stays applied and only its propagation is lost. No retry, no
    /// buffering.
    pub fn flush(&mut self, store: &mut RoomStore) {
        for msg in store.take_outgoing() {
            if let Err(e) = self.transport.send(&msg) {
                log::warn!("sync send failed, edit not propagated: {e}");
            }
        }
    }

    /// Poll the transport and replay inbound mutations into the store.
    pub fn pump(&mut self, store: &mut RoomStore) {
        for event in self.transport.poll_events() {
            match event {
                TransportEvent::Message(msg) => store.apply_remote(msg),
                TransportEvent::Connected => {
                    log::info!("relay connected for room {}", self.room_id);
                }
                TransportEvent::Disconnected => {
                    log::info!("relay disconnected for room {}", self.room_id);
                    self.joined = false;
                }
                TransportEvent::Error(message) => {
                    log::error!("relay error for room {}: {message}", self.room_id);
                }
            }
        }
    }

    /// Tear the session down: leave the room and drop the connection.
    pub fn shutdown(mut self) {
        self.leave();
        self.transport.disconnect();
    }
}
