//! RoomSync Core Library
//!
//! Platform-agnostic core data structures and logic for collaborative
//! room editing: the document model, the mutation store, the sync
//! protocol and transport, spatial constraints, persistence, and the
//! design-file codec.

pub mod codec;
pub mod constraint;
pub mod model;
pub mod protocol;
pub mod session;
pub mod storage;
pub mod store;
pub mod transport;

pub use codec::{export_design, import_design, CodecError, DesignDocument, FORMAT_VERSION};
pub use constraint::{constrain, drop_position, snap_and_constrain, snap_to_grid, GRID_SIZE};
pub use model::{Component, ComponentPatch, ComponentProperties, ComponentType, Position, Room, RoomUpdate, Size, View};
pub use protocol::SyncMessage;
pub use session::SyncSession;
pub use storage::{MemoryBackend, PersistenceError, PersistenceGateway, RoomBackend};
pub use store::{Mutation, Origin, RoomStore, MAIN_VIEW_ID};
pub use transport::{ChannelTransport, ConnectionState, Transport, TransportError, TransportEvent};

#[cfg(not(target_arch = "wasm32"))]
pub use storage::FileBackend;
#[cfg(not(target_arch = "wasm32"))]
pub use transport::WsTransport;
