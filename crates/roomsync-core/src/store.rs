//! The room store: one authoritative local copy of the shared document
//! plus the only sanctioned mutation surface over it.
//!
//! Every mutation goes through [`RoomStore::apply`] with an explicit
//! [`Origin`] tag. A `Local` mutation updates state and enqueues the
//! matching [`SyncMessage`] for the transport to flush; a `Remote` one
//! (replayed from the relay) updates state and emits nothing. That single
//! rule is what keeps edits from echoing around the relay forever.
//!
//! Operations validate their target and silently no-op when it is missing;
//! a stale message about a deleted component must never panic or surface
//! an error.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::model::{
    Component, ComponentPatch, ComponentProperties, Position, Room, Size, View,
};
use crate::protocol::SyncMessage;

/// The view id the store falls back to when the active view is removed.
///
/// Preserved as a literal: if no view with this id exists the active-view
/// pointer dangles until the next `set_active_view`. Callers that delete
/// views are expected to keep a "main" view around.
pub const MAIN_VIEW_ID: &str = "main";

/// Where a mutation originated. Only `Local` mutations reach the outbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// This client's own user action.
    Local,
    /// Replayed from the relay; applying it must not re-emit.
    Remote,
}

/// A mutation of room/view/component state.
///
/// Selection transitions are mutations too, but they are local UI state
/// and never produce sync messages.
#[derive(Debug, Clone)]
pub enum Mutation {
    SetRoom(Room),
    AddView { id: String, name: String },
    RemoveView { view_id: String },
    UpdateViewName { view_id: String, name: String },
    UpdateViewBackground { view_id: String, background_color: String },
    AddComponent { view_id: String, component: Component },
    RemoveComponent { view_id: String, component_id: String },
    UpdateComponent { view_id: String, component_id: String, updates: ComponentPatch },
    UpdateComponentPosition { view_id: String, component_id: String, position: Position },
    UpdateComponentProperties { view_id: String, component_id: String, properties: ComponentProperties },
    UpdateComponentSize { view_id: String, component_id: String, size: Size },
    SetActiveView { view_id: String },
    SetSelectedComponent { component_id: Option<String> },
}

/// The working copy of a room during an editing session.
#[derive(Debug, Clone)]
pub struct RoomStore {
    views: Vec<View>,
    active_view_id: Option<String>,
    selected_component_id: Option<String>,
    room_id: Option<String>,
    room_name: Option<String>,
    /// Pending outbound sync messages, drained by the sync session.
    outgoing: Vec<SyncMessage>,
}

impl Default for RoomStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RoomStore {
    /// A fresh store with the default "main" view and no bound room.
    /// Nothing syncs until a room is bound via [`RoomStore::set_room`] or
    /// [`RoomStore::load_from_room`].
    pub fn new() -> Self {
        Self {
            views: vec![View::new(MAIN_VIEW_ID, "Main View")],
            active_view_id: Some(MAIN_VIEW_ID.to_string()),
            selected_component_id: None,
            room_id: None,
            room_name: None,
            outgoing: Vec::new(),
        }
    }

    // --- Accessors ---

    pub fn views(&self) -> &[View] {
        &self.views
    }

    pub fn view(&self, id: &str) -> Option<&View> {
        self.views.iter().find(|v| v.id == id)
    }

    pub fn active_view_id(&self) -> Option<&str> {
        self.active_view_id.as_deref()
    }

    pub fn active_view(&self) -> Option<&View> {
        self.active_view_id.as_deref().and_then(|id| self.view(id))
    }

    pub fn selected_component_id(&self) -> Option<&str> {
        self.selected_component_id.as_deref()
    }

    pub fn room_id(&self) -> Option<&str> {
        self.room_id.as_deref()
    }

    pub fn room_name(&self) -> Option<&str> {
        self.room_name.as_deref()
    }

    /// Snapshot the working copy as a [`Room`], for saving or export.
    pub fn room_snapshot(&self) -> Room {
        Room {
            id: self.room_id.clone().unwrap_or_default(),
            name: self
                .room_name
                .clone()
                .unwrap_or_else(|| "Untitled Design".to_string()),
            views: self.views.clone(),
        }
    }

    // --- Outbox ---

    /// Drain pending outbound messages. The sync session calls this and
    /// hands each message to the transport.
    pub fn take_outgoing(&mut self) -> Vec<SyncMessage> {
        std::mem::take(&mut self.outgoing)
    }

    pub fn has_outgoing(&self) -> bool {
        !self.outgoing.is_empty()
    }

    // --- Local operation surface ---

    /// Replace the whole working room. Resets the active view to the
    /// room's first view when it has one.
    pub fn set_room(&mut self, room: Room) {
        self.apply(Mutation::SetRoom(room), Origin::Local);
    }

    /// Load a freshly fetched room: replaces the working copy, binds the
    /// room id, resets the active view and clears the selection.
    pub fn load_from_room(&mut self, room: Room) {
        self.room_id = Some(room.id);
        self.room_name = Some(room.name);
        self.active_view_id = room.views.first().map(|v| v.id.clone());
        self.selected_component_id = None;
        self.views = room.views;
    }

    /// Create a new empty view and make it active. Returns the new id.
    /// View ids are time-based (`view-{millis}`) and bumped until unique.
    pub fn add_view(&mut self, name: Option<&str>) -> String {
        let id = self.fresh_view_id();
        let name = name
            .map(str::to_string)
            .unwrap_or_else(|| format!("View {}", self.views.len() + 1));
        self.apply(
            Mutation::AddView { id: id.clone(), name },
            Origin::Local,
        );
        id
    }

    pub fn remove_view(&mut self, view_id: &str) {
        self.apply(
            Mutation::RemoveView { view_id: view_id.to_string() },
            Origin::Local,
        );
    }

    pub fn update_view_name(&mut self, view_id: &str, name: &str) {
        self.apply(
            Mutation::UpdateViewName {
                view_id: view_id.to_string(),
                name: name.to_string(),
            },
            Origin::Local,
        );
    }

    pub fn update_view_background(&mut self, view_id: &str, background_color: &str) {
        self.apply(
            Mutation::UpdateViewBackground {
                view_id: view_id.to_string(),
                background_color: background_color.to_string(),
            },
            Origin::Local,
        );
    }

    /// Append a component to a view and select it. The component id is
    /// pre-assigned by the caller and must be unique within the view; the
    /// store does not re-check uniqueness.
    pub fn add_component(&mut self, view_id: &str, component: Component) {
        self.apply(
            Mutation::AddComponent {
                view_id: view_id.to_string(),
                component,
            },
            Origin::Local,
        );
    }

    pub fn remove_component(&mut self, view_id: &str, component_id: &str) {
        self.apply(
            Mutation::RemoveComponent {
                view_id: view_id.to_string(),
                component_id: component_id.to_string(),
            },
            Origin::Local,
        );
    }

    /// Shallow-merge top-level component fields (type, x, y, width,
    /// height).
    pub fn update_component(&mut self, view_id: &str, component_id: &str, updates: ComponentPatch) {
        self.apply(
            Mutation::UpdateComponent {
                view_id: view_id.to_string(),
                component_id: component_id.to_string(),
                updates,
            },
            Origin::Local,
        );
    }

    /// Set a component's position directly.
    ///
    /// No clamping happens here: the drag/drop layer runs
    /// [`crate::constraint::constrain`] before calling in. The store trusts
    /// the position it is given.
    pub fn update_component_position(&mut self, view_id: &str, component_id: &str, position: Position) {
        self.apply(
            Mutation::UpdateComponentPosition {
                view_id: view_id.to_string(),
                component_id: component_id.to_string(),
                position,
            },
            Origin::Local,
        );
    }

    /// Shallow-merge into the component's properties bag. Never replaces
    /// the whole bag.
    pub fn update_component_properties(
        &mut self,
        view_id: &str,
        component_id: &str,
        properties: ComponentProperties,
    ) {
        self.apply(
            Mutation::UpdateComponentProperties {
                view_id: view_id.to_string(),
                component_id: component_id.to_string(),
                properties,
            },
            Origin::Local,
        );
    }

    /// Set a component's size directly, without min/max clamping.
    ///
    /// Size changes do not sync on their own; collaborative resizes go
    /// through [`RoomStore::update_component`] as a width/height patch.
    pub fn update_component_size(&mut self, view_id: &str, component_id: &str, size: Size) {
        self.apply(
            Mutation::UpdateComponentSize {
                view_id: view_id.to_string(),
                component_id: component_id.to_string(),
                size,
            },
            Origin::Local,
        );
    }

    /// Selection state only; never synced.
    pub fn set_active_view(&mut self, view_id: &str) {
        self.apply(
            Mutation::SetActiveView { view_id: view_id.to_string() },
            Origin::Local,
        );
    }

    /// Selection state only; never synced. `None` deselects.
    pub fn set_selected_component(&mut self, component_id: Option<&str>) {
        self.apply(
            Mutation::SetSelectedComponent {
                component_id: component_id.map(str::to_string),
            },
            Origin::Local,
        );
    }

    // --- Remote replay ---

    /// Apply an inbound message from the relay. Membership announcements
    /// are not mutations and are ignored here. The message's `roomId` is
    /// not checked against the bound room; the relay only fans out within
    /// a room.
    pub fn apply_remote(&mut self, message: SyncMessage) {
        let mutation = match message {
            SyncMessage::ComponentUpdate { view_id, component_id, updates, .. } => {
                Mutation::UpdateComponent { view_id, component_id, updates }
            }
            SyncMessage::ComponentPosition { view_id, component_id, position, .. } => {
                Mutation::UpdateComponentPosition { view_id, component_id, position }
            }
            SyncMessage::ComponentProperties { view_id, component_id, properties, .. } => {
                Mutation::UpdateComponentProperties { view_id, component_id, properties }
            }
            SyncMessage::ViewBackground { view_id, background_color, .. } => {
                Mutation::UpdateViewBackground { view_id, background_color }
            }
            SyncMessage::ComponentAdd { view_id, component, .. } => {
                Mutation::AddComponent { view_id, component }
            }
            SyncMessage::ComponentRemove { view_id, component_id, .. } => {
                Mutation::RemoveComponent { view_id, component_id }
            }
            SyncMessage::JoinRoom { .. } | SyncMessage::LeaveRoom { .. } => return,
        };
        self.apply(mutation, Origin::Remote);
    }

    // --- Core apply ---

    /// Apply a mutation. State changes happen unconditionally for valid
    /// targets; the outbox is touched only for `Local` origin, only when
    /// a room id is bound, and only when the mutation actually changed
    /// something.
    pub fn apply(&mut self, mutation: Mutation, origin: Origin) {
        match mutation {
            Mutation::SetRoom(room) => {
                self.room_id = Some(room.id);
                self.room_name = Some(room.name);
                if let Some(first) = room.views.first() {
                    self.active_view_id = Some(first.id.clone());
                }
                self.views = room.views;
            }
            Mutation::AddView { id, name } => {
                if self.view(&id).is_some() {
                    log::warn!("add_view: id {id:?} already exists, ignoring");
                    return;
                }
                self.views.push(View::new(id.clone(), name));
                self.active_view_id = Some(id);
            }
            Mutation::RemoveView { view_id } => {
                let before = self.views.len();
                self.views.retain(|v| v.id != view_id);
                if self.views.len() == before {
                    return;
                }
                if self.active_view_id.as_deref() == Some(view_id.as_str()) {
                    if self.view(MAIN_VIEW_ID).is_none() {
                        log::warn!(
                            "remove_view: fallback view {MAIN_VIEW_ID:?} does not exist, active view id dangles"
                        );
                    }
                    self.active_view_id = Some(MAIN_VIEW_ID.to_string());
                }
                self.selected_component_id = None;
            }
            Mutation::UpdateViewName { view_id, name } => {
                if let Some(view) = self.view_mut(&view_id) {
                    view.name = name;
                }
            }
            Mutation::UpdateViewBackground { view_id, background_color } => {
                let Some(view) = self.view_mut(&view_id) else { return };
                view.background_color = Some(background_color.clone());
                self.emit(origin, |room_id| SyncMessage::ViewBackground {
                    room_id,
                    view_id,
                    background_color,
                });
            }
            Mutation::AddComponent { view_id, component } => {
                let Some(view) = self.view_mut(&view_id) else { return };
                view.components.push(component.clone());
                self.selected_component_id = Some(component.id.clone());
                self.emit(origin, |room_id| SyncMessage::ComponentAdd {
                    room_id,
                    view_id,
                    component,
                });
            }
            Mutation::RemoveComponent { view_id, component_id } => {
                let Some(view) = self.view_mut(&view_id) else { return };
                let before = view.components.len();
                view.components.retain(|c| c.id != component_id);
                if view.components.len() == before {
                    return;
                }
                if self.selected_component_id.as_deref() == Some(component_id.as_str()) {
                    self.selected_component_id = None;
                }
                self.emit(origin, |room_id| SyncMessage::ComponentRemove {
                    room_id,
                    view_id,
                    component_id,
                });
            }
            Mutation::UpdateComponent { view_id, component_id, updates } => {
                let Some(component) = self.component_mut(&view_id, &component_id) else {
                    return;
                };
                component.apply_patch(&updates);
                self.emit(origin, |room_id| SyncMessage::ComponentUpdate {
                    room_id,
                    view_id,
                    component_id,
                    updates,
                });
            }
            Mutation::UpdateComponentPosition { view_id, component_id, position } => {
                let Some(component) = self.component_mut(&view_id, &component_id) else {
                    return;
                };
                component.x = position.x;
                component.y = position.y;
                self.emit(origin, |room_id| SyncMessage::ComponentPosition {
                    room_id,
                    view_id,
                    component_id,
                    position,
                });
            }
            Mutation::UpdateComponentProperties { view_id, component_id, properties } => {
                let Some(component) = self.component_mut(&view_id, &component_id) else {
                    return;
                };
                component.properties.merge(properties.clone());
                self.emit(origin, |room_id| SyncMessage::ComponentProperties {
                    room_id,
                    view_id,
                    component_id,
                    properties,
                });
            }
            Mutation::UpdateComponentSize { view_id, component_id, size } => {
                if let Some(component) = self.component_mut(&view_id, &component_id) {
                    component.width = Some(size.width);
                    component.height = Some(size.height);
                }
            }
            Mutation::SetActiveView { view_id } => {
                self.active_view_id = Some(view_id);
            }
            Mutation::SetSelectedComponent { component_id } => {
                self.selected_component_id = component_id;
            }
        }
    }

    // --- Internals ---

    fn view_mut(&mut self, id: &str) -> Option<&mut View> {
        self.views.iter_mut().find(|v| v.id == id)
    }

    fn component_mut(&mut self, view_id: &str, component_id: &str) -> Option<&mut Component> {
        self.view_mut(view_id)
            .and_then(|v| v.component_mut(component_id))
    }

    fn emit(&mut self, origin: Origin, build: impl FnOnce(String) -> SyncMessage) {
        if origin != Origin::Local {
            return;
        }
        let Some(room_id) = self.room_id.clone() else { return };
        self.outgoing.push(build(room_id));
    }

    fn fresh_view_id(&self) -> String {
        let mut millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or(0);
        loop {
            let id = format!("view-{millis}");
            if self.view(&id).is_none() {
                return id;
            }
            millis += 1;
        }
    }
}
