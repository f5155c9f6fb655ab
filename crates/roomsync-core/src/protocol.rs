//! Wire protocol for room synchronization.
//!
//! Messages are symmetric: a client emits them for local mutations and
//! applies inbound ones through the same mutation engine operations. The
//! relay forwards them verbatim to every other client in the room.

use serde::{Deserialize, Serialize};

use crate::model::{Component, ComponentPatch, ComponentProperties, Position};

/// A sync message as it travels over the wire.
///
/// The `event` tag and camelCase payload fields are the relay protocol;
/// `join_room`/`leave_room` are session-scoped membership announcements,
/// everything else maps 1:1 onto a mutation engine operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SyncMessage {
    #[serde(rename_all = "camelCase")]
    ComponentUpdate {
        room_id: String,
        view_id: String,
        component_id: String,
        updates: ComponentPatch,
    },
    #[serde(rename_all = "camelCase")]
    ComponentPosition {
        room_id: String,
        view_id: String,
        component_id: String,
        position: Position,
    },
    #[serde(rename_all = "camelCase")]
    ComponentProperties {
        room_id: String,
        view_id: String,
        component_id: String,
        properties: ComponentProperties,
    },
    #[serde(rename_all = "camelCase")]
    ViewBackground {
        room_id: String,
        view_id: String,
        background_color: String,
    },
    #[serde(rename_all = "camelCase")]
    ComponentAdd {
        room_id: String,
        view_id: String,
        component: Component,
    },
    #[serde(rename_all = "camelCase")]
    ComponentRemove {
        room_id: String,
        view_id: String,
        component_id: String,
    },
    #[serde(rename_all = "camelCase")]
    JoinRoom { room_id: String },
    #[serde(rename_all = "camelCase")]
    LeaveRoom { room_id: String },
}

impl SyncMessage {
    /// The room this message belongs to. Every message carries one; the
    /// relay uses it to pick the fan-out group.
    pub fn room_id(&self) -> &str {
        match self {
            SyncMessage::ComponentUpdate { room_id, .. }
            | SyncMessage::ComponentPosition { room_id, .. }
            | SyncMessage::ComponentProperties { room_id, .. }
            | SyncMessage::ViewBackground { room_id, .. }
            | SyncMessage::ComponentAdd { room_id, .. }
            | SyncMessage::ComponentRemove { room_id, .. }
            | SyncMessage::JoinRoom { room_id }
            | SyncMessage::LeaveRoom { room_id } => room_id,
        }
    }

    /// Whether this is a membership announcement rather than a document
    /// mutation.
    pub fn is_membership(&self) -> bool {
        matches!(
            self,
            SyncMessage::JoinRoom { .. } | SyncMessage::LeaveRoom { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ComponentType;

    #[test]
    fn position_message_wire_shape() {
        let msg = SyncMessage::ComponentPosition {
            room_id: "r1".into(),
            view_id: "main".into(),
            component_id: "c1".into(),
            position: Position::new(120.0, 48.0),
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["event"], "component_position");
        assert_eq!(json["roomId"], "r1");
        assert_eq!(json["viewId"], "main");
        assert_eq!(json["componentId"], "c1");
        assert_eq!(json["position"]["x"], 120.0);
        assert_eq!(json["position"]["y"], 48.0);
    }

    #[test]
    fn join_message_wire_shape() {
        let msg = SyncMessage::JoinRoom { room_id: "r1".into() };
        let json = serde_json::to_string(&msg).unwrap();
        assert_eq!(json, r#"{"event":"join_room","roomId":"r1"}"#);
    }

    #[test]
    fn component_add_roundtrip() {
        let mut component = Component::new("c1", ComponentType::Text, 10.0, 10.0);
        component.width = Some(200.0);
        component.properties.text = Some("hi".into());

        let msg = SyncMessage::ComponentAdd {
            room_id: "r1".into(),
            view_id: "main".into(),
            component,
        };
        let json = serde_json::to_string(&msg).unwrap();
        let parsed: SyncMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, msg);
    }

    #[test]
    fn inbound_update_parses_partial_fields() {
        let json = r#"{
            "event": "component_update",
            "roomId": "r1",
            "viewId": "main",
            "componentId": "c1",
            "updates": { "width": 300 }
        }"#;
        let msg: SyncMessage = serde_json::from_str(json).unwrap();
        match msg {
            SyncMessage::ComponentUpdate { updates, .. } => {
                assert_eq!(updates.width, Some(300.0));
                assert!(updates.x.is_none());
            }
            other => panic!("wrong variant: {other:?}"),
        }
    }

    #[test]
    fn room_id_accessor_covers_all_variants() {
        let msg = SyncMessage::ViewBackground {
            room_id: "r9".into(),
            view_id: "main".into(),
            background_color: "#fff".into(),
        };
        assert_eq!(msg.room_id(), "r9");
        assert!(!msg.is_membership());
        assert!(SyncMessage::LeaveRoom { room_id: "r9".into() }.is_membership());
    }
}
