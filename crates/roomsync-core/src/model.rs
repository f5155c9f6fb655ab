//! Document model: rooms, views and components.
//!
//! These are the shared-document types every other module operates on.
//! They carry no behavior beyond field-level merging; all mutation goes
//! through [`crate::store::RoomStore`].

use serde::{Deserialize, Serialize};

/// A position in canvas pixel space, relative to the owning view's origin.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A width/height pair in canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// The closed set of component kinds a view can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentType {
    Text,
    Button,
    Image,
    Container,
    Table,
    Checkbox,
    Listbox,
    Edittext,
    Ellipse,
}

impl ComponentType {
    /// Stable lowercase name, matching the wire representation.
    pub fn as_str(self) -> &'static str {
        match self {
            ComponentType::Text => "text",
            ComponentType::Button => "button",
            ComponentType::Image => "image",
            ComponentType::Container => "container",
            ComponentType::Table => "table",
            ComponentType::Checkbox => "checkbox",
            ComponentType::Listbox => "listbox",
            ComponentType::Edittext => "edittext",
            ComponentType::Ellipse => "ellipse",
        }
    }

    /// Default size applied when a component of this type is placed
    /// without an explicit width/height.
    pub fn default_size(self) -> Size {
        match self {
            ComponentType::Text => Size::new(200.0, 40.0),
            ComponentType::Button => Size::new(120.0, 40.0),
            ComponentType::Image => Size::new(200.0, 200.0),
            ComponentType::Container => Size::new(300.0, 200.0),
            ComponentType::Table => Size::new(250.0, 1.0),
            ComponentType::Checkbox => Size::new(120.0, 24.0),
            ComponentType::Listbox => Size::new(100.0, 33.0),
            ComponentType::Edittext => Size::new(200.0, 40.0),
            ComponentType::Ellipse => Size::new(100.0, 100.0),
        }
    }
}

/// Per-component property bag.
///
/// The set of meaningful fields depends on the component type (`text` for
/// text blocks, `rows`/`columns` for tables, `items` for listboxes, ...).
/// Fields that are not relevant to a type are simply ignored, never
/// rejected. Every field is optional so a partial bag doubles as a patch.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ComponentProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub padding: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub columns: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checked: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border_width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border_radius: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_fit: Option<String>,
}

impl ComponentProperties {
    /// Shallow-merge `patch` into `self`: fields the patch sets overwrite,
    /// fields it leaves unset are kept. Field-level last-writer-wins.
    pub fn merge(&mut self, patch: ComponentProperties) {
        macro_rules! take {
            ($field:ident) => {
                if patch.$field.is_some() {
                    self.$field = patch.$field;
                }
            };
        }
        take!(text);
        take!(color);
        take!(background_color);
        take!(font_size);
        take!(padding);
        take!(src);
        take!(rows);
        take!(columns);
        take!(border_color);
        take!(text_color);
        take!(checked);
        take!(items);
        take!(placeholder);
        take!(border_width);
        take!(border_radius);
        take!(aspect_ratio);
        take!(object_fit);
    }
}

/// A typed, positioned, sized element within a view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    /// Unique within the owning view; pre-assigned by the creator.
    pub id: String,
    #[serde(rename = "type")]
    pub component_type: ComponentType,
    pub x: f64,
    pub y: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default)]
    pub properties: ComponentProperties,
}

impl Component {
    pub fn new(id: impl Into<String>, component_type: ComponentType, x: f64, y: f64) -> Self {
        Self {
            id: id.into(),
            component_type,
            x,
            y,
            width: None,
            height: None,
            properties: ComponentProperties::default(),
        }
    }

    /// Create a component at a drop point with a freshly generated id
    /// and the per-type default size. Ids are `{type}-{uuid}` so two
    /// clients placing components concurrently never collide.
    pub fn create(component_type: ComponentType, x: f64, y: f64) -> Self {
        let mut component = Self::new(
            format!("{}-{}", component_type.as_str(), uuid::Uuid::new_v4()),
            component_type,
            x,
            y,
        );
        let size = component_type.default_size();
        component.width = Some(size.width);
        component.height = Some(size.height);
        component
    }

    /// Effective width, falling back to the per-type default.
    pub fn effective_width(&self) -> f64 {
        self.width
            .unwrap_or_else(|| self.component_type.default_size().width)
    }

    /// Effective height, falling back to the per-type default.
    pub fn effective_height(&self) -> f64 {
        self.height
            .unwrap_or_else(|| self.component_type.default_size().height)
    }

    /// Shallow-merge a top-level field patch (type, x, y, width, height).
    /// The properties bag is untouched; use
    /// [`ComponentProperties::merge`] for property patches.
    pub fn apply_patch(&mut self, patch: &ComponentPatch) {
        if let Some(t) = patch.component_type {
            self.component_type = t;
        }
        if let Some(x) = patch.x {
            self.x = x;
        }
        if let Some(y) = patch.y {
            self.y = y;
        }
        if let Some(w) = patch.width {
            self.width = Some(w);
        }
        if let Some(h) = patch.height {
            self.height = Some(h);
        }
    }
}

/// Partial top-level component fields, used by generic `component_update`
/// messages.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ComponentPatch {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub component_type: Option<ComponentType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
}

/// A single canvas/screen within a room. Component order is z-order
/// (back to front, insertion order significant).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct View {
    /// Unique within the owning room.
    pub id: String,
    pub name: String,
    #[serde(rename = "backgroundColor", skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(default)]
    pub components: Vec<Component>,
}

impl View {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            background_color: None,
            components: Vec::new(),
        }
    }

    pub fn component(&self, id: &str) -> Option<&Component> {
        self.components.iter().find(|c| c.id == id)
    }

    pub fn component_mut(&mut self, id: &str) -> Option<&mut Component> {
        self.components.iter_mut().find(|c| c.id == id)
    }
}

/// The top-level shared document: an ordered sequence of views.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub views: Vec<View>,
}

impl Room {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            views: Vec::new(),
        }
    }

    pub fn view(&self, id: &str) -> Option<&View> {
        self.views.iter().find(|v| v.id == id)
    }
}

/// Partial room fields for a save (`PUT room(id, {name?, views?})`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RoomUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub views: Option<Vec<View>>,
}
