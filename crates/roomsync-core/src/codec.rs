//! Versioned interchange format for file-based export/import.
//!
//! The on-disk shape is `{version, timestamp, room: {id, name, views}}`.
//! Export is a pure projection of the document model. Import validates
//! the structural shape of every view and component before touching
//! anything; one bad component rejects the whole file.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::model::{Component, ComponentProperties, ComponentType, Room, View};

/// The only interchange version this codec accepts.
pub const FORMAT_VERSION: &str = "1.0";

/// Import failures. No partial state is ever applied; the caller's
/// working document is untouched on error.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Unsupported design file version: {0}")]
    UnsupportedVersion(String),
    #[error("Invalid design file: {0}")]
    MalformedDocument(String),
}

/// A complete interchange document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DesignDocument {
    pub version: String,
    /// Informational only; never validated on import.
    pub timestamp: String,
    pub room: Room,
}

impl DesignDocument {
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Project a room into an interchange document. Always succeeds.
///
/// Components without an explicit size get their per-type default
/// materialized, since the interchange format requires width and height
/// on every component.
pub fn export_design(room: &Room) -> DesignDocument {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    let mut room = room.clone();
    for view in &mut room.views {
        for component in &mut view.components {
            component.width = Some(component.effective_width());
            component.height = Some(component.effective_height());
        }
    }
    DesignDocument {
        version: FORMAT_VERSION.to_string(),
        timestamp: millis.to_string(),
        room,
    }
}

/// Parse and validate an interchange document.
///
/// On success the returned room fully replaces the working document
/// (callers hand it to `RoomStore::load_from_room`, which resets the
/// active view to the first view and clears the selection).
pub fn import_design(json: &str) -> Result<Room, CodecError> {
    let value: Value = serde_json::from_str(json)
        .map_err(|e| CodecError::MalformedDocument(format!("invalid JSON: {e}")))?;

    let version = value
        .get("version")
        .ok_or_else(|| CodecError::MalformedDocument("missing version field".into()))?;
    match version.as_str() {
        Some(v) if v == FORMAT_VERSION => {}
        Some(v) => return Err(CodecError::UnsupportedVersion(v.to_string())),
        None => return Err(CodecError::UnsupportedVersion(version.to_string())),
    }

    let room = value
        .get("room")
        .and_then(Value::as_object)
        .ok_or_else(|| CodecError::MalformedDocument("missing room object".into()))?;

    let id = room.get("id").and_then(Value::as_str).unwrap_or("");
    let name = room
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or("Untitled Design");
    let raw_views = room
        .get("views")
        .and_then(Value::as_array)
        .ok_or_else(|| CodecError::MalformedDocument("missing views array".into()))?;

    let mut views = Vec::with_capacity(raw_views.len());
    for raw_view in raw_views {
        views.push(import_view(raw_view)?);
    }

    Ok(Room {
        id: id.to_string(),
        name: name.to_string(),
        views,
    })
}

fn import_view(value: &Value) -> Result<View, CodecError> {
    let id = value
        .get("id")
        .and_then(Value::as_str)
        .ok_or_else(|| CodecError::MalformedDocument("view id must be a string".into()))?;
    let name = value
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| CodecError::MalformedDocument(format!("view {id:?}: name must be a string")))?;
    let raw_components = value
        .get("components")
        .and_then(Value::as_array)
        .ok_or_else(|| {
            CodecError::MalformedDocument(format!("view {id:?}: components must be an array"))
        })?;

    let mut components = Vec::with_capacity(raw_components.len());
    for raw in raw_components {
        components.push(import_component(id, raw)?);
    }

    Ok(View {
        id: id.to_string(),
        name: name.to_string(),
        background_color: value
            .get("backgroundColor")
            .and_then(Value::as_str)
            .map(str::to_string),
        components,
    })
}

fn import_component(view_id: &str, value: &Value) -> Result<Component, CodecError> {
    let id = value.get("id").and_then(Value::as_str).ok_or_else(|| {
        CodecError::MalformedDocument(format!("view {view_id:?}: component id must be a string"))
    })?;

    let component_type: ComponentType = value
        .get("type")
        .and_then(Value::as_str)
        .and_then(|t| serde_json::from_value(Value::String(t.to_string())).ok())
        .ok_or_else(|| {
            CodecError::MalformedDocument(format!(
                "component {id:?}: type must be one of the known component types"
            ))
        })?;

    let number = |field: &str| -> Result<f64, CodecError> {
        value.get(field).and_then(Value::as_f64).ok_or_else(|| {
            CodecError::MalformedDocument(format!("component {id:?}: {field} must be a number"))
        })
    };
    let x = number("x")?;
    let y = number("y")?;
    let width = number("width")?;
    let height = number("height")?;

    let mut properties: ComponentProperties = match value.get("properties") {
        Some(raw) => serde_json::from_value(raw.clone()).map_err(|e| {
            CodecError::MalformedDocument(format!("component {id:?}: invalid properties: {e}"))
        })?,
        None => ComponentProperties::default(),
    };
    // Normalization defaults; everything else stays unset if absent.
    properties
        .background_color
        .get_or_insert_with(|| "transparent".to_string());
    properties.items.get_or_insert_with(Vec::new);
    properties.checked.get_or_insert(false);

    Ok(Component {
        id: id.to_string(),
        component_type,
        x,
        y,
        width: Some(width),
        height: Some(height),
        properties,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_room() -> Room {
        // Components carry the normalization defaults explicitly so the
        // export/import round trip is exact.
        let mut text = Component::new("c1", ComponentType::Text, 10.0, 10.0);
        text.width = Some(200.0);
        text.height = Some(40.0);
        text.properties.text = Some("hi".into());
        text.properties.background_color = Some("transparent".into());
        text.properties.items = Some(vec![]);
        text.properties.checked = Some(false);

        let mut listbox = Component::new("c2", ComponentType::Listbox, 50.0, 120.0);
        listbox.width = Some(100.0);
        listbox.height = Some(33.0);
        listbox.properties.background_color = Some("#ffffff".into());
        listbox.properties.items = Some(vec!["Item 1".into(), "Item 2".into()]);
        listbox.properties.checked = Some(false);

        let mut view = View::new("v1", "First View");
        view.background_color = Some("#fafafa".into());
        view.components = vec![text, listbox];

        Room {
            id: "r1".into(),
            name: "Sample".into(),
            views: vec![view],
        }
    }

    #[test]
    fn export_import_round_trip() {
        let room = sample_room();
        let json = export_design(&room).to_json_pretty().unwrap();
        let imported = import_design(&json).unwrap();
        assert_eq!(imported, room);

        // And a second pass is the identity.
        let json2 = export_design(&imported).to_json_pretty().unwrap();
        assert_eq!(import_design(&json2).unwrap(), imported);
    }

    #[test]
    fn export_materializes_default_sizes_so_round_trip_survives() {
        // A component added without an explicit size is a valid model
        // state; its export must still carry numeric width/height and
        // re-import cleanly.
        let mut view = View::new("v1", "View");
        view.components
            .push(Component::new("c1", ComponentType::Text, 10.0, 10.0));
        let room = Room {
            id: "r1".into(),
            name: "Defaulted".into(),
            views: vec![view],
        };

        let json = export_design(&room).to_json_pretty().unwrap();
        let imported = import_design(&json).unwrap();
        let comp = &imported.views[0].components[0];
        assert_eq!(comp.width, Some(200.0));
        assert_eq!(comp.height, Some(40.0));
    }

    #[test]
    fn unsupported_version_is_rejected() {
        let mut doc = serde_json::to_value(export_design(&sample_room())).unwrap();
        doc["version"] = "2.0".into();
        let err = import_design(&doc.to_string()).unwrap_err();
        match err {
            CodecError::UnsupportedVersion(v) => assert_eq!(v, "2.0"),
            other => panic!("expected UnsupportedVersion, got {other:?}"),
        }
    }

    #[test]
    fn missing_version_is_malformed() {
        let err = import_design(r#"{"room":{"id":"r1","name":"x","views":[]}}"#).unwrap_err();
        assert!(matches!(err, CodecError::MalformedDocument(_)));
    }

    #[test]
    fn component_missing_width_rejects_whole_import() {
        let json = r#"{
            "version": "1.0",
            "timestamp": "0",
            "room": {
                "id": "r1",
                "name": "Broken",
                "views": [{
                    "id": "v1",
                    "name": "View",
                    "components": [{
                        "id": "c1", "type": "text", "x": 1, "y": 2, "height": 40
                    }]
                }]
            }
        }"#;
        let err = import_design(json).unwrap_err();
        match err {
            CodecError::MalformedDocument(msg) => assert!(msg.contains("width")),
            other => panic!("expected MalformedDocument, got {other:?}"),
        }
    }

    #[test]
    fn one_bad_component_fails_even_with_valid_views() {
        let json = r#"{
            "version": "1.0",
            "timestamp": "0",
            "room": {
                "id": "r1",
                "name": "Mixed",
                "views": [
                    {
                        "id": "good",
                        "name": "Good View",
                        "components": [{
                            "id": "ok", "type": "button",
                            "x": 0, "y": 0, "width": 120, "height": 40
                        }]
                    },
                    {
                        "id": "bad",
                        "name": "Bad View",
                        "components": [{
                            "id": "broken", "type": "button",
                            "x": "not-a-number", "y": 0, "width": 120, "height": 40
                        }]
                    }
                ]
            }
        }"#;
        assert!(matches!(
            import_design(json),
            Err(CodecError::MalformedDocument(_))
        ));
    }

    #[test]
    fn unknown_component_type_is_malformed() {
        let json = r#"{
            "version": "1.0",
            "timestamp": "0",
            "room": {
                "id": "r1", "name": "x",
                "views": [{
                    "id": "v1", "name": "View",
                    "components": [{
                        "id": "c1", "type": "hologram",
                        "x": 0, "y": 0, "width": 10, "height": 10
                    }]
                }]
            }
        }"#;
        assert!(matches!(
            import_design(json),
            Err(CodecError::MalformedDocument(_))
        ));
    }

    #[test]
    fn property_defaults_are_applied() {
        let json = r#"{
            "version": "1.0",
            "timestamp": "0",
            "room": {
                "id": "r1", "name": "Defaults",
                "views": [{
                    "id": "v1", "name": "View",
                    "components": [{
                        "id": "c1", "type": "checkbox",
                        "x": 0, "y": 0, "width": 120, "height": 24,
                        "properties": { "text": "Check option" }
                    }]
                }]
            }
        }"#;
        let room = import_design(json).unwrap();
        let props = &room.views[0].components[0].properties;
        assert_eq!(props.background_color.as_deref(), Some("transparent"));
        assert_eq!(props.items.as_deref(), Some(&[][..]));
        assert_eq!(props.checked, Some(false));
        assert_eq!(props.text.as_deref(), Some("Check option"));
        // Fields without defaults stay unset.
        assert!(props.color.is_none());
        assert!(props.font_size.is_none());
    }

    #[test]
    fn missing_properties_object_gets_defaults() {
        let json = r#"{
            "version": "1.0",
            "timestamp": "0",
            "room": {
                "id": "r1", "name": "x",
                "views": [{
                    "id": "v1", "name": "View",
                    "components": [{
                        "id": "c1", "type": "ellipse",
                        "x": 5, "y": 5, "width": 100, "height": 100
                    }]
                }]
            }
        }"#;
        let room = import_design(json).unwrap();
        let props = &room.views[0].components[0].properties;
        assert_eq!(props.background_color.as_deref(), Some("transparent"));
        assert_eq!(props.checked, Some(false));
    }

    #[test]
    fn room_defaults_for_missing_id_and_name() {
        let json = r#"{
            "version": "1.0",
            "timestamp": "0",
            "room": { "views": [] }
        }"#;
        let room = import_design(json).unwrap();
        assert_eq!(room.id, "");
        assert_eq!(room.name, "Untitled Design");
        assert!(room.views.is_empty());
    }
}
