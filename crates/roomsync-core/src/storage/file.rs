//! File-based room backend for native platforms.

use std::fs;
use std::path::PathBuf;

use super::{BoxFuture, PersistenceError, PersistenceResult, RoomBackend};
use crate::model::{Room, RoomUpdate};

/// Stores each room as a JSON file in a directory.
pub struct FileBackend {
    base_path: PathBuf,
}

impl FileBackend {
    /// Create a file backend over the given directory, creating it if
    /// needed.
    pub fn new(base_path: PathBuf) -> PersistenceResult<Self> {
        if !base_path.exists() {
            fs::create_dir_all(&base_path).map_err(|e| {
                PersistenceError::Io(format!("Failed to create storage directory: {e}"))
            })?;
        }
        Ok(Self { base_path })
    }

    /// Create a backend in the platform's local data directory
    /// (`~/.local/share/roomsync/rooms` on Linux).
    pub fn default_location() -> PersistenceResult<Self> {
        let base = dirs::data_local_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| PersistenceError::Io("Could not determine home directory".to_string()))?;
        Self::new(base.join("roomsync").join("rooms"))
    }

    pub fn base_path(&self) -> &PathBuf {
        &self.base_path
    }

    fn room_path(&self, id: &str) -> PathBuf {
        // Sanitize ids so they are safe as filenames.
        let safe_id: String = id
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.base_path.join(format!("{safe_id}.json"))
    }

    fn read_room(&self, id: &str) -> PersistenceResult<Room> {
        let path = self.room_path(id);
        if !path.exists() {
            return Err(PersistenceError::NotFound(id.to_string()));
        }
        let json = fs::read_to_string(&path)
            .map_err(|e| PersistenceError::Io(format!("Failed to read {}: {e}", path.display())))?;
        serde_json::from_str(&json).map_err(|e| {
            PersistenceError::Serialization(format!("Failed to parse {}: {e}", path.display()))
        })
    }

    fn write_room(&self, id: &str, room: &Room) -> PersistenceResult<()> {
        let path = self.room_path(id);
        let json = serde_json::to_string_pretty(room)
            .map_err(|e| PersistenceError::Serialization(e.to_string()))?;
        fs::write(&path, json)
            .map_err(|e| PersistenceError::Io(format!("Failed to write {}: {e}", path.display())))
    }

    /// Seed a room file, as the remote room-creation endpoint would.
    pub fn insert(&self, room: &Room) -> PersistenceResult<()> {
        self.write_room(&room.id, room)
    }
}

impl RoomBackend for FileBackend {
    fn fetch(&self, id: &str) -> BoxFuture<'_, PersistenceResult<Room>> {
        let id = id.to_string();
        Box::pin(async move { self.read_room(&id) })
    }

    fn store(&self, id: &str, update: RoomUpdate) -> BoxFuture<'_, PersistenceResult<Room>> {
        let id = id.to_string();
        Box::pin(async move {
            let mut room = self.read_room(&id)?;
            if let Some(name) = update.name {
                room.name = name;
            }
            if let Some(views) = update.views {
                room.views = views;
            }
            self.write_room(&id, &room)?;
            Ok(room)
        })
    }

    fn delete(&self, id: &str) -> BoxFuture<'_, PersistenceResult<()>> {
        let path = self.room_path(id);
        Box::pin(async move {
            if path.exists() {
                fs::remove_file(&path).map_err(|e| {
                    PersistenceError::Io(format!("Failed to delete {}: {e}", path.display()))
                })?;
            }
            Ok(())
        })
    }

    fn list(&self) -> BoxFuture<'_, PersistenceResult<Vec<String>>> {
        let base = self.base_path.clone();
        Box::pin(async move {
            if !base.exists() {
                return Ok(vec![]);
            }
            let entries = fs::read_dir(&base)
                .map_err(|e| PersistenceError::Io(format!("Failed to read directory: {e}")))?;

            let mut ids = Vec::new();
            for entry in entries.flatten() {
                let path = entry.path();
                if path.extension().map(|e| e == "json").unwrap_or(false) {
                    if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                        ids.push(stem.to_string());
                    }
                }
            }
            Ok(ids)
        })
    }

    fn exists(&self, id: &str) -> BoxFuture<'_, PersistenceResult<bool>> {
        let path = self.room_path(id);
        Box::pin(async move { Ok(path.exists()) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::View;
    use crate::storage::test_util::block_on;
    use tempfile::tempdir;

    #[test]
    fn room_roundtrips_through_disk() {
        let dir = tempdir().unwrap();
        let backend = FileBackend::new(dir.path().to_path_buf()).unwrap();

        let mut room = Room::new("r1", "Disk Room");
        room.views.push(View::new("main", "Main View"));
        backend.insert(&room).unwrap();

        let loaded = block_on(backend.fetch("r1")).unwrap();
        assert_eq!(loaded, room);
    }

    #[test]
    fn fetch_missing_room_is_not_found() {
        let dir = tempdir().unwrap();
        let backend = FileBackend::new(dir.path().to_path_buf()).unwrap();
        let result = block_on(backend.fetch("nope"));
        assert!(matches!(result, Err(PersistenceError::NotFound(_))));
    }

    #[test]
    fn store_updates_and_persists() {
        let dir = tempdir().unwrap();
        let backend = FileBackend::new(dir.path().to_path_buf()).unwrap();
        backend.insert(&Room::new("r1", "Old")).unwrap();

        let updated = block_on(backend.store(
            "r1",
            RoomUpdate {
                name: Some("New".into()),
                views: None,
            },
        ))
        .unwrap();
        assert_eq!(updated.name, "New");

        let reloaded = block_on(backend.fetch("r1")).unwrap();
        assert_eq!(reloaded.name, "New");
    }

    #[test]
    fn list_and_delete() {
        let dir = tempdir().unwrap();
        let backend = FileBackend::new(dir.path().to_path_buf()).unwrap();
        backend.insert(&Room::new("r1", "One")).unwrap();
        backend.insert(&Room::new("r2", "Two")).unwrap();

        let ids = block_on(backend.list()).unwrap();
        assert_eq!(ids.len(), 2);

        block_on(backend.delete("r1")).unwrap();
        assert!(!block_on(backend.exists("r1")).unwrap());
        assert!(block_on(backend.exists("r2")).unwrap());
    }

    #[test]
    fn ids_are_sanitized_for_filenames() {
        let dir = tempdir().unwrap();
        let backend = FileBackend::new(dir.path().to_path_buf()).unwrap();
        backend.insert(&Room::new("a/b:c*d", "Odd Id")).unwrap();

        let loaded = block_on(backend.fetch("a/b:c*d")).unwrap();
        assert_eq!(loaded.name, "Odd Id");
    }
}
