//! Persistence boundary: loading and saving full room snapshots.

mod gateway;
mod memory;

#[cfg(not(target_arch = "wasm32"))]
mod file;

pub use gateway::PersistenceGateway;
pub use memory::MemoryBackend;

#[cfg(not(target_arch = "wasm32"))]
pub use file::FileBackend;

use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

use crate::model::{Room, RoomUpdate};

/// Persistence errors. A failed load leaves the working document unset;
/// a failed save leaves it unchanged but unsaved. Local edits are never
/// rolled back because persistence failed.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Room not found: {0}")]
    NotFound(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Persistence error: {0}")]
    Other(String),
}

/// Result type for persistence operations.
pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Boxed future for async operations (compatible with WASM).
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// A remote store of room snapshots.
///
/// `fetch` is `GET room(id)`; `store` is `PUT room(id, {name?, views?})`
/// and returns the updated room. Used only on room entry and explicit
/// save, never during editing.
pub trait RoomBackend {
    /// Fetch the full room snapshot.
    fn fetch(&self, id: &str) -> BoxFuture<'_, PersistenceResult<Room>>;

    /// Apply a partial update and return the stored room.
    fn store(&self, id: &str, update: RoomUpdate) -> BoxFuture<'_, PersistenceResult<Room>>;

    /// Delete a room.
    fn delete(&self, id: &str) -> BoxFuture<'_, PersistenceResult<()>>;

    /// List all known room ids.
    fn list(&self) -> BoxFuture<'_, PersistenceResult<Vec<String>>>;

    /// Check whether a room exists.
    fn exists(&self, id: &str) -> BoxFuture<'_, PersistenceResult<bool>>;
}
