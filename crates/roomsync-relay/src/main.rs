//! RoomSync WebSocket Relay Server
//!
//! Relays sync messages between clients editing the same room. The relay
//! never inspects document state: it parses just enough of each message
//! to learn which room it targets, then forwards the original text to
//! every other member of that room. Loop breaking is the client's job;
//! the relay only guarantees the sender never receives its own message.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
    routing::get,
    Router,
};
use dashmap::DashMap;
use futures_util::{SinkExt, StreamExt};
use roomsync_core::SyncMessage;
use std::{collections::HashSet, net::SocketAddr, sync::Arc};
use tokio::sync::broadcast;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};
use uuid::Uuid;

const CHANNEL_CAPACITY: usize = 256;

/// Room state
struct Room {
    /// Broadcast channel for this room; payload is (sender peer id, raw text).
    tx: broadcast::Sender<(String, String)>,
    /// Connected peer IDs
    peers: HashSet<String>,
}

impl Room {
    fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            tx,
            peers: HashSet::new(),
        }
    }
}

/// Shared application state
struct AppState {
    /// Active rooms
    rooms: DashMap<String, Room>,
}

impl AppState {
    fn new() -> Self {
        Self {
            rooms: DashMap::new(),
        }
    }

    /// Add peer to room, returning a receiver for its broadcasts and the
    /// current peer count.
    fn join_room(&self, room_id: &str, peer_id: &str) -> (broadcast::Receiver<(String, String)>, usize) {
        let mut room = self.rooms.entry(room_id.to_string()).or_insert_with(Room::new);
        room.peers.insert(peer_id.to_string());
        let rx = room.tx.subscribe();
        let peer_count = room.peers.len();
        (rx, peer_count)
    }

    /// Remove peer from room, dropping the room once it empties.
    fn leave_room(&self, room_id: &str, peer_id: &str) {
        if let Some(mut room) = self.rooms.get_mut(room_id) {
            room.peers.remove(peer_id);
            if room.peers.is_empty() {
                drop(room);
                self.rooms.remove(room_id);
            }
        }
    }

    /// Forward a raw message to everyone subscribed to a room.
    fn forward(&self, room_id: &str, from: &str, text: String) {
        if let Some(room) = self.rooms.get(room_id) {
            let _ = room.tx.send((from.to_string(), text));
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "roomsync_relay=info,tower_http=info".into()),
        )
        .init();

    let state = Arc::new(AppState::new());

    let app = Router::new()
        .route("/", get(index))
        .route("/ws", get(ws_handler))
        .route("/health", get(health))
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], 3030));
    info!("RoomSync relay server listening on {}", addr);
    info!("WebSocket endpoint: ws://localhost:3030/ws");

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}

/// Index page
async fn index() -> &'static str {
    "RoomSync Relay Server - Connect via WebSocket at /ws"
}

/// Health check
async fn health() -> &'static str {
    "ok"
}

/// WebSocket upgrade handler
async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle a WebSocket connection
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let peer_id = Uuid::new_v4().to_string();
    info!("New connection: {}", peer_id);

    let (mut sender, mut receiver) = socket.split();
    let mut current_room: Option<String> = None;
    let mut room_rx: Option<broadcast::Receiver<(String, String)>> = None;

    loop {
        tokio::select! {
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let parsed = match serde_json::from_str::<SyncMessage>(&text) {
                            Ok(parsed) => parsed,
                            Err(e) => {
                                warn!("Invalid message from {}: {}", peer_id, e);
                                continue;
                            }
                        };
                        match parsed {
                            SyncMessage::JoinRoom { room_id } => {
                                // Re-joining the current room is a no-op.
                                if current_room.as_deref() == Some(room_id.as_str()) {
                                    continue;
                                }
                                if let Some(ref old_room) = current_room {
                                    state.leave_room(old_room, &peer_id);
                                }
                                let (rx, peer_count) = state.join_room(&room_id, &peer_id);
                                room_rx = Some(rx);
                                current_room = Some(room_id.clone());
                                info!("Peer {} joined room {} ({} peers)", peer_id, room_id, peer_count);
                            }
                            SyncMessage::LeaveRoom { room_id } => {
                                if current_room.as_deref() == Some(room_id.as_str()) {
                                    state.leave_room(&room_id, &peer_id);
                                    current_room = None;
                                    room_rx = None;
                                    info!("Peer {} left room {}", peer_id, room_id);
                                }
                            }
                            other => {
                                // Edits are routed by the room id they carry,
                                // forwarded as the original text.
                                state.forward(other.room_id(), &peer_id, text.to_string());
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        break;
                    }
                    Some(Ok(_)) => {} // Ignore binary/ping/pong
                    Some(Err(e)) => {
                        warn!("WebSocket error for {}: {}", peer_id, e);
                        break;
                    }
                }
            }

            msg = async {
                match &mut room_rx {
                    Some(rx) => rx.recv().await.ok(),
                    None => {
                        // No room joined, just wait forever
                        std::future::pending::<Option<(String, String)>>().await
                    }
                }
            } => {
                if let Some((from, text)) = msg {
                    // Never echo back to the sender.
                    if from != peer_id {
                        if sender.send(Message::Text(text.into())).await.is_err() {
                            break;
                        }
                    }
                }
            }
        }
    }

    // Cleanup on disconnect
    if let Some(ref room) = current_room {
        state.leave_room(room, &peer_id);
    }
    info!("Connection closed: {}", peer_id);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_is_idempotent_per_peer() {
        let state = AppState::new();
        let (_rx1, count) = state.join_room("r1", "p1");
        assert_eq!(count, 1);
        let (_rx2, count) = state.join_room("r1", "p1");
        assert_eq!(count, 1);
        let (_rx3, count) = state.join_room("r1", "p2");
        assert_eq!(count, 2);
    }

    #[test]
    fn empty_rooms_are_dropped() {
        let state = AppState::new();
        let (_rx1, _) = state.join_room("r1", "p1");
        let (_rx2, _) = state.join_room("r1", "p2");

        state.leave_room("r1", "p1");
        assert!(state.rooms.contains_key("r1"));
        state.leave_room("r1", "p2");
        assert!(!state.rooms.contains_key("r1"));
    }

    #[test]
    fn forward_reaches_subscribers() {
        let state = AppState::new();
        let (mut rx, _) = state.join_room("r1", "p1");
        state.forward("r1", "p2", "{\"event\":\"view_background\"}".into());

        let (from, text) = rx.try_recv().unwrap();
        assert_eq!(from, "p2");
        assert!(text.contains("view_background"));
    }

    #[test]
    fn forward_to_unknown_room_is_a_noop() {
        let state = AppState::new();
        state.forward("nowhere", "p1", "{}".into());
        assert!(!state.rooms.contains_key("nowhere"));
    }
}
