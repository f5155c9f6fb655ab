//! In-memory room backend for testing and ephemeral use.

use std::collections::HashMap;
use std::sync::RwLock;

use super::{BoxFuture, PersistenceError, PersistenceResult, RoomBackend};
use crate::model::{Room, RoomUpdate};

/// In-memory backend. Rooms are seeded with [`MemoryBackend::insert`];
/// `store` updates existing rooms only, matching the remote API's PUT
/// semantics.
#[derive(Default)]
pub struct MemoryBackend {
    rooms: RwLock<HashMap<String, Room>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a room, as if it had been created server-side.
    pub fn insert(&self, room: Room) {
        if let Ok(mut rooms) = self.rooms.write() {
            rooms.insert(room.id.clone(), room);
        }
    }
}

impl RoomBackend for MemoryBackend {
    fn fetch(&self, id: &str) -> BoxFuture<'_, PersistenceResult<Room>> {
        let id = id.to_string();
        Box::pin(async move {
            let rooms = self
                .rooms
                .read()
                .map_err(|e| PersistenceError::Other(format!("Lock error: {e}")))?;
            rooms.get(&id).cloned().ok_or(PersistenceError::NotFound(id))
        })
    }

    fn store(&self, id: &str, update: RoomUpdate) -> BoxFuture<'_, PersistenceResult<Room>> {
        let id = id.to_string();
        Box::pin(async move {
            let mut rooms = self
                .rooms
                .write()
                .map_err(|e| PersistenceError::Other(format!("Lock error: {e}")))?;
            let room = rooms
                .get_mut(&id)
                .ok_or(PersistenceError::NotFound(id))?;
            if let Some(name) = update.name {
                room.name = name;
            }
            if let Some(views) = update.views {
                room.views = views;
            }
            Ok(room.clone())
        })
    }

    fn delete(&self, id: &str) -> BoxFuture<'_, PersistenceResult<()>> {
        let id = id.to_string();
        Box::pin(async move {
            let mut rooms = self
                .rooms
                .write()
                .map_err(|e| PersistenceError::Other(format!("Lock error: {e}")))?;
            rooms.remove(&id);
            Ok(())
        })
    }

    fn list(&self) -> BoxFuture<'_, PersistenceResult<Vec<String>>> {
        Box::pin(async move {
            let rooms = self
                .rooms
                .read()
                .map_err(|e| PersistenceError::Other(format!("Lock error: {e}")))?;
            Ok(rooms.keys().cloned().collect())
        })
    }

    fn exists(&self, id: &str) -> BoxFuture<'_, PersistenceResult<bool>> {
        let id = id.to_string();
        Box::pin(async move {
            let rooms = self
                .rooms
                .read()
                .map_err(|e| PersistenceError::Other(format!("Lock error: {e}")))?;
            Ok(rooms.contains_key(&id))
        })
    }
}
