//! Persistence gateway: backend access with a process-lifetime room cache.

use std::collections::HashMap;

use super::{PersistenceResult, RoomBackend};
use crate::model::{Room, RoomUpdate};

/// Caching front for a [`RoomBackend`].
///
/// The cache is keyed by room id, filled on first successful load,
/// overwritten on successful save, and never expired; it lives as long
/// as the process. Remote edits do not invalidate cached rooms; the
/// cache only reflects what this client last loaded or saved.
pub struct PersistenceGateway<B: RoomBackend> {
    backend: B,
    cache: HashMap<String, Room>,
}

impl<B: RoomBackend> PersistenceGateway<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            cache: HashMap::new(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Whether a room is cached (no backend round trip).
    pub fn is_cached(&self, room_id: &str) -> bool {
        self.cache.contains_key(room_id)
    }

    /// Load a room, consulting the cache first.
    ///
    /// A backend failure leaves the cache untouched and surfaces the
    /// error; the caller's working document stays unset.
    pub async fn load(&mut self, room_id: &str) -> PersistenceResult<Room> {
        if let Some(room) = self.cache.get(room_id) {
            log::debug!("room {room_id} served from cache");
            return Ok(room.clone());
        }
        let room = self.backend.fetch(room_id).await?;
        self.cache.insert(room_id.to_string(), room.clone());
        Ok(room)
    }

    /// Save a room update. The cache entry is overwritten only on
    /// success; a failed save leaves both the cache and the caller's
    /// working copy as they were.
    pub async fn save(&mut self, room_id: &str, update: RoomUpdate) -> PersistenceResult<Room> {
        let room = self.backend.store(room_id, update).await?;
        self.cache.insert(room_id.to_string(), room.clone());
        Ok(room)
    }
}
