// SPDX-License-Identifier: MIT OR Apache-2.0
//! Boundary payloads: construction input, bulk-update patches, exported
//! snapshots, and context-menu configuration.
//!
//! Payload types deserialize leniently: every field is optional and unknown
//! keys are dropped. Upstream owns data integrity; the model accepts what it
//! is given.

use crate::anchor::Anchor;
use crate::node::{NodeId, TextModel};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Mode-specific auxiliary payload attached alongside an element state
pub type AdditionData = Value;

/// Error decoding an external payload
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// Payload did not match the expected shape
    #[error("invalid node payload: {0}")]
    InvalidPayload(#[from] serde_json::Error),
}

/// Label input accepted at construction: a bare string or a full record
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum TextInput {
    /// Bare label content; position is copied from the node
    Value(String),
    /// Full label record, assigned as-is
    Record(TextModel),
}

impl From<&str> for TextInput {
    fn from(value: &str) -> Self {
        Self::Value(value.into())
    }
}

impl From<String> for TextInput {
    fn from(value: String) -> Self {
        Self::Value(value)
    }
}

impl From<TextModel> for TextInput {
    fn from(record: TextModel) -> Self {
        Self::Record(record)
    }
}

/// Construction payload for a node.
///
/// Any subset of the documented attributes may be present; absent fields
/// fall back to the theme-derived defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Identifier; generated when absent
    pub id: Option<NodeId>,
    /// Node variant tag
    pub node_type: Option<String>,
    /// Position x
    pub x: Option<f64>,
    /// Position y
    pub y: Option<f64>,
    /// Node width
    pub width: Option<f64>,
    /// Node height
    pub height: Option<f64>,
    /// Fill color
    pub fill: Option<String>,
    /// Fill opacity
    pub fill_opacity: Option<f64>,
    /// Stroke color
    pub stroke: Option<String>,
    /// Stroke width
    pub stroke_width: Option<f64>,
    /// Stroke opacity
    pub stroke_opacity: Option<f64>,
    /// Overall opacity
    pub opacity: Option<f64>,
    /// Selection outline color
    pub outline_color: Option<String>,
    /// Stacking order
    pub z_index: Option<i32>,
    /// Label: bare string or full record
    pub text: Option<TextInput>,
    /// User/business metadata attached to the node
    pub properties: Option<IndexMap<String, Value>>,
    /// Connection anchors
    pub anchors: Option<Vec<Anchor>>,
    /// Context-menu configuration
    pub menu: Option<MenuConfig>,
}

impl NodeConfig {
    /// Payload carrying just a position
    pub fn at(x: f64, y: f64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            ..Self::default()
        }
    }

    /// Decode a payload from a dynamic value; unknown keys are ignored
    pub fn from_json(value: Value) -> Result<Self, ModelError> {
        Ok(serde_json::from_value(value)?)
    }
}

/// Restricted bulk-update payload.
///
/// Only `node_type`, `x`, `y`, `text`, and `properties` can be written
/// through bulk update; decoding drops every other key.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NodePatch {
    /// New variant tag
    pub node_type: Option<String>,
    /// New position x
    pub x: Option<f64>,
    /// New position y
    pub y: Option<f64>,
    /// New label: bare string keeps the current label position
    pub text: Option<TextInput>,
    /// Replacement properties mapping
    pub properties: Option<IndexMap<String, Value>>,
}

impl NodePatch {
    /// Decode from a dynamic value; keys outside the allow-list are ignored
    pub fn from_json(value: Value) -> Result<Self, ModelError> {
        Ok(serde_json::from_value(value)?)
    }
}

/// Reduced label projection in the exported snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextData {
    /// Label x
    pub x: f64,
    /// Label y
    pub y: f64,
    /// Label content
    pub value: String,
}

/// Snapshot of a node as persisted by the owning editor.
///
/// Style and interaction fields are deliberately excluded from this
/// projection, as is the label's `draggable` flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeData {
    /// Node identifier
    pub id: NodeId,
    /// Node variant tag
    pub node_type: String,
    /// Position x
    pub x: f64,
    /// Position y
    pub y: f64,
    /// Label projection
    pub text: TextData,
    /// Deep-cloned metadata mapping
    pub properties: IndexMap<String, Value>,
}

/// One context-menu entry; the activation callback lives in the external
/// menu-rendering component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuItem {
    /// Entry label
    pub text: String,
    /// Styling hook for the renderer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    /// Whether the renderer should reserve icon space
    #[serde(default)]
    pub icon: bool,
}

/// Context menu shown for a node while its menu flag is set
pub type MenuConfig = Vec<MenuItem>;
