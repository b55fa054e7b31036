// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node model for the Flowgrid editor.
//!
//! A [`NodeModel`] owns everything the renderer observes about a single
//! diagram node: geometry, style, label, interaction state, and the
//! connection rules consulted before an edge may use the node as an
//! endpoint. All mutation goes through action methods; each action commits
//! its field writes as one [`Changeset`], so observers never see a
//! half-applied action.
//!
//! The owning graph controller constructs the model, calls actions in
//! response to user input, reads [`NodeModel::export_data`] for
//! persistence, and queries the rule evaluator before materializing an
//! edge.

use crate::anchor::Anchor;
use crate::change::{Changeset, NodeField, ObserverId, ObserverRegistry};
use crate::data::{AdditionData, MenuConfig, NodeConfig, NodeData, NodePatch, TextData, TextInput};
use crate::rules::{ConnectRule, ConnectRuleResult};
use crate::theme::{NodeStyle, Theme, ThemeProvider};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, trace};
use uuid::Uuid;

/// Unique identifier for a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub Uuid);

impl NodeId {
    /// Create a new random node ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of graph element a model represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelType {
    /// A diagram node
    Node,
    /// A connecting edge
    Edge,
}

/// Interaction mode a node is currently in.
///
/// `Default` is the normal resting state; the remaining values are set by
/// the owning editor to drive mode-specific rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ElementState {
    /// Normal state
    #[default]
    Default = 1,
    /// Label is being edited inline
    TextEdit = 2,
    /// Context menu is shown
    ShowMenu = 3,
    /// Valid endpoint for the edge currently being drawn
    AllowConnect = 4,
    /// Invalid endpoint for the edge currently being drawn
    NotAllowConnect = 5,
}

/// Stacking order of unselected nodes
pub const DEFAULT_Z_INDEX: i32 = 1;
/// Stacking order applied while a node is selected
pub const ELEMENT_MAX_Z_INDEX: i32 = 9999;
/// Anchor index meaning no anchor is active
pub const NO_ACTIVE_ANCHOR: i32 = -1;

/// Label attached to a node.
///
/// The label position normally follows node translation; `draggable`
/// marks labels the interaction layer may reposition independently.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextModel {
    /// Label x in diagram coordinates
    pub x: f64,
    /// Label y in diagram coordinates
    pub y: f64,
    /// Label content
    pub value: String,
    /// Whether the label may be dragged independently of the node
    pub draggable: bool,
}

/// Mutable model of a single diagram node
#[derive(Debug)]
pub struct NodeModel {
    id: NodeId,
    model_type: ModelType,
    node_type: String,
    x: f64,
    y: f64,
    width: f64,
    height: f64,
    fill: String,
    fill_opacity: f64,
    stroke: String,
    stroke_width: f64,
    stroke_opacity: f64,
    opacity: f64,
    outline_color: String,
    z_index: i32,
    text: TextModel,
    properties: IndexMap<String, Value>,
    is_selected: bool,
    is_hovered: bool,
    is_hitable: bool,
    is_context_menu: bool,
    active_anchor: i32,
    state: ElementState,
    addition_state_data: Option<AdditionData>,
    anchors: Vec<Anchor>,
    source_rules: Vec<ConnectRule>,
    target_rules: Vec<ConnectRule>,
    menu: Option<MenuConfig>,
    observers: ObserverRegistry,
}

impl NodeModel {
    /// Build a node from an initial payload merged over the theme's
    /// defaults. Payload values win on conflict; a missing or bare-string
    /// label is normalized into a full record positioned at the node.
    pub fn new(config: NodeConfig, theme: &Theme) -> Self {
        let defaults = theme.node_defaults();
        let x = config.x.unwrap_or(defaults.x);
        let y = config.y.unwrap_or(defaults.y);
        let text = match config.text {
            None => TextModel {
                value: String::new(),
                x,
                y,
                draggable: false,
            },
            Some(TextInput::Value(value)) => TextModel {
                value,
                x,
                y,
                draggable: false,
            },
            Some(TextInput::Record(record)) => record,
        };
        Self {
            id: config.id.unwrap_or_default(),
            model_type: ModelType::Node,
            node_type: config.node_type.unwrap_or_default(),
            x,
            y,
            width: config.width.unwrap_or(defaults.width),
            height: config.height.unwrap_or(defaults.height),
            fill: config.fill.unwrap_or_else(|| defaults.fill.clone()),
            fill_opacity: config.fill_opacity.unwrap_or(defaults.fill_opacity),
            stroke: config.stroke.unwrap_or_else(|| defaults.stroke.clone()),
            stroke_width: config.stroke_width.unwrap_or(defaults.stroke_width),
            stroke_opacity: config.stroke_opacity.unwrap_or(defaults.stroke_opacity),
            opacity: config.opacity.unwrap_or(defaults.opacity),
            outline_color: config
                .outline_color
                .unwrap_or_else(|| defaults.outline_color.clone()),
            z_index: config.z_index.unwrap_or(DEFAULT_Z_INDEX),
            text,
            properties: config.properties.unwrap_or_default(),
            is_selected: false,
            is_hovered: false,
            is_hitable: true,
            is_context_menu: false,
            active_anchor: NO_ACTIVE_ANCHOR,
            state: ElementState::Default,
            addition_state_data: None,
            anchors: config.anchors.unwrap_or_default(),
            source_rules: Vec::new(),
            target_rules: Vec::new(),
            menu: config.menu,
            observers: ObserverRegistry::default(),
        }
    }

    /// Node identifier, assigned once at construction
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Element-kind discriminator; always [`ModelType::Node`]
    pub fn model_type(&self) -> ModelType {
        self.model_type
    }

    /// Node variant tag
    pub fn node_type(&self) -> &str {
        &self.node_type
    }

    /// Position x in diagram coordinates
    pub fn x(&self) -> f64 {
        self.x
    }

    /// Position y in diagram coordinates
    pub fn y(&self) -> f64 {
        self.y
    }

    /// Node width
    pub fn width(&self) -> f64 {
        self.width
    }

    /// Node height
    pub fn height(&self) -> f64 {
        self.height
    }

    /// Fill color
    pub fn fill(&self) -> &str {
        &self.fill
    }

    /// Fill opacity
    pub fn fill_opacity(&self) -> f64 {
        self.fill_opacity
    }

    /// Stroke color
    pub fn stroke(&self) -> &str {
        &self.stroke
    }

    /// Stroke width
    pub fn stroke_width(&self) -> f64 {
        self.stroke_width
    }

    /// Stroke opacity
    pub fn stroke_opacity(&self) -> f64 {
        self.stroke_opacity
    }

    /// Overall opacity
    pub fn opacity(&self) -> f64 {
        self.opacity
    }

    /// Selection outline color
    pub fn outline_color(&self) -> &str {
        &self.outline_color
    }

    /// Current stacking order
    pub fn z_index(&self) -> i32 {
        self.z_index
    }

    /// Label record
    pub fn text(&self) -> &TextModel {
        &self.text
    }

    /// Live metadata mapping (use [`Self::export_properties`] for a copy)
    pub fn properties(&self) -> &IndexMap<String, Value> {
        &self.properties
    }

    /// Selection flag
    pub fn is_selected(&self) -> bool {
        self.is_selected
    }

    /// Hover flag
    pub fn is_hovered(&self) -> bool {
        self.is_hovered
    }

    /// Whether the interaction layer should hit-test this node
    pub fn is_hitable(&self) -> bool {
        self.is_hitable
    }

    /// Whether a context menu is currently shown for this node
    pub fn is_context_menu(&self) -> bool {
        self.is_context_menu
    }

    /// Index of the active anchor, [`NO_ACTIVE_ANCHOR`] for none
    pub fn active_anchor(&self) -> i32 {
        self.active_anchor
    }

    /// Current interaction state
    pub fn state(&self) -> ElementState {
        self.state
    }

    /// Auxiliary payload of the current interaction state
    pub fn addition_state_data(&self) -> Option<&AdditionData> {
        self.addition_state_data.as_ref()
    }

    /// Connection anchors on the node perimeter
    pub fn anchors(&self) -> &[Anchor] {
        &self.anchors
    }

    /// Context-menu configuration, if any
    pub fn menu(&self) -> Option<&MenuConfig> {
        self.menu.as_ref()
    }

    /// Number of changesets committed so far
    pub fn version(&self) -> u64 {
        self.observers.version()
    }

    /// Snapshot persisted by the owning editor.
    ///
    /// Style and interaction fields are excluded from this projection, and
    /// `properties` is deep-cloned so callers never hold references into
    /// live state.
    pub fn export_data(&self) -> NodeData {
        NodeData {
            id: self.id,
            node_type: self.node_type.clone(),
            x: self.x,
            y: self.y,
            text: TextData {
                x: self.text.x,
                y: self.text.y,
                value: self.text.value.clone(),
            },
            properties: self.properties.clone(),
        }
    }

    /// Deep-cloned copy of the metadata mapping
    pub fn export_properties(&self) -> IndexMap<String, Value> {
        self.properties.clone()
    }

    /// Register an observer, called once per committed changeset
    pub fn subscribe(&mut self, observer: impl FnMut(&Changeset) + 'static) -> ObserverId {
        self.observers.subscribe(observer)
    }

    /// Remove a previously registered observer
    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        self.observers.unsubscribe(id)
    }

    fn commit(&mut self, fields: &[NodeField]) {
        let version = self.observers.commit(fields);
        trace!(node = %self.id, version, ?fields, "changeset committed");
    }

    /// Rules consulted when this node is proposed as an edge source
    pub fn get_connected_source_rules(&self) -> &[ConnectRule] {
        &self.source_rules
    }

    /// Rules consulted when this node is proposed as an edge target
    pub fn get_connected_target_rules(&self) -> &[ConnectRule] {
        &self.target_rules
    }

    /// Append a rule to the source chain; rules run in registration order
    pub fn add_source_rule(&mut self, rule: ConnectRule) {
        self.source_rules.push(rule);
    }

    /// Append a rule to the target chain; rules run in registration order
    pub fn add_target_rule(&mut self, rule: ConnectRule) {
        self.target_rules.push(rule);
    }

    /// Whether this node may act as the source endpoint of an edge to
    /// `target`.
    ///
    /// Rules run in order and evaluation stops at the first failure, whose
    /// message is surfaced. Rejection is a normal result the editor shows
    /// to the user, not an error.
    pub fn is_allow_connected_as_source(&self, target: &NodeModel) -> ConnectRuleResult {
        for rule in &self.source_rules {
            if !rule.validate(self, target) {
                return ConnectRuleResult::fail(rule.message());
            }
        }
        ConnectRuleResult::pass()
    }

    /// Whether this node may act as the target endpoint of an edge from
    /// `source`. Symmetric to [`Self::is_allow_connected_as_source`].
    pub fn is_allow_connected_as_target(&self, source: &NodeModel) -> ConnectRuleResult {
        for rule in &self.target_rules {
            if !rule.validate(source, self) {
                return ConnectRuleResult::fail(rule.message());
            }
        }
        ConnectRuleResult::pass()
    }

    /// Translate the node, carrying the label by the same delta
    pub fn move_by(&mut self, delta_x: f64, delta_y: f64) {
        self.x += delta_x;
        self.y += delta_y;
        self.shift_text(delta_x, delta_y);
        self.commit(&[NodeField::Position, NodeField::Text]);
    }

    /// Move the node to an absolute position; the label shifts by the
    /// resulting delta
    pub fn move_to(&mut self, x: f64, y: f64) {
        let delta_x = x - self.x;
        let delta_y = y - self.y;
        self.shift_text(delta_x, delta_y);
        self.x = x;
        self.y = y;
        self.commit(&[NodeField::Position, NodeField::Text]);
    }

    /// Move only the label
    pub fn move_text(&mut self, delta_x: f64, delta_y: f64) {
        self.shift_text(delta_x, delta_y);
        self.commit(&[NodeField::Text]);
    }

    fn shift_text(&mut self, delta_x: f64, delta_y: f64) {
        self.text.x += delta_x;
        self.text.y += delta_y;
    }

    /// Replace the label content
    pub fn update_text(&mut self, value: impl Into<String>) {
        self.text.value = value.into();
        self.commit(&[NodeField::Text]);
    }

    /// Select or deselect the node.
    ///
    /// With `update_z_index` set, the node is promoted to
    /// [`ELEMENT_MAX_Z_INDEX`] while selected and reverted to
    /// [`DEFAULT_Z_INDEX`] on deselection; without it the stacking order is
    /// left untouched.
    pub fn set_selected(&mut self, flag: bool, update_z_index: bool) {
        self.is_selected = flag;
        if update_z_index {
            self.z_index = if self.is_selected {
                ELEMENT_MAX_Z_INDEX
            } else {
                DEFAULT_Z_INDEX
            };
            self.commit(&[NodeField::Selection, NodeField::ZIndex]);
        } else {
            self.commit(&[NodeField::Selection]);
        }
    }

    /// Set the hover flag
    pub fn set_hovered(&mut self, flag: bool) {
        self.is_hovered = flag;
        self.commit(&[NodeField::Hover]);
    }

    /// Toggle whether the interaction layer should hit-test this node,
    /// independent of visibility
    pub fn set_hitable(&mut self, flag: bool) {
        self.is_hitable = flag;
        self.commit(&[NodeField::Hitable]);
    }

    /// Mark which anchor is active ([`NO_ACTIVE_ANCHOR`] for none)
    pub fn set_anchor_active(&mut self, index: i32) {
        self.active_anchor = index;
        self.commit(&[NodeField::ActiveAnchor]);
    }

    /// Enter an interaction state together with its auxiliary payload;
    /// both fields change in the same changeset
    pub fn set_element_state(
        &mut self,
        state: ElementState,
        addition_state_data: Option<AdditionData>,
    ) {
        debug!(node = %self.id, ?state, "element state changed");
        self.state = state;
        self.addition_state_data = addition_state_data;
        self.commit(&[NodeField::State]);
    }

    /// Show or hide the context menu
    pub fn show_menu(&mut self, flag: bool) {
        self.is_context_menu = flag;
        self.commit(&[NodeField::Menu]);
    }

    /// Replace the stroke color
    pub fn update_stroke(&mut self, color: impl Into<String>) {
        self.stroke = color.into();
        self.commit(&[NodeField::Style]);
    }

    /// Merge a restricted patch onto the node.
    ///
    /// Only `node_type`, `x`, `y`, `text`, and `properties` can be written
    /// this way; a bare-string label keeps the current label position, and
    /// a patched `properties` mapping replaces the existing one wholesale.
    pub fn update_data(&mut self, patch: NodePatch) {
        let mut fields = Vec::new();
        if let Some(node_type) = patch.node_type {
            self.node_type = node_type;
            fields.push(NodeField::NodeType);
        }
        if patch.x.is_some() || patch.y.is_some() {
            if let Some(x) = patch.x {
                self.x = x;
            }
            if let Some(y) = patch.y {
                self.y = y;
            }
            fields.push(NodeField::Position);
        }
        match patch.text {
            Some(TextInput::Value(value)) => {
                self.text.value = value;
                fields.push(NodeField::Text);
            }
            Some(TextInput::Record(record)) => {
                self.text = record;
                fields.push(NodeField::Text);
            }
            None => {}
        }
        if let Some(properties) = patch.properties {
            self.properties = properties;
            fields.push(NodeField::Properties);
        }
        if !fields.is_empty() {
            self.commit(&fields);
        }
    }

    /// Set one entry in the metadata mapping
    pub fn set_property(&mut self, key: impl Into<String>, value: Value) {
        self.properties.insert(key.into(), value);
        self.commit(&[NodeField::Properties]);
    }

    /// Shallow-merge entries into the metadata mapping; existing keys are
    /// overwritten, other keys are kept
    pub fn set_properties(&mut self, properties: IndexMap<String, Value>) {
        self.properties.extend(properties);
        self.commit(&[NodeField::Properties]);
    }

    /// Apply the style the graph's theme registers for `type_key`, if any.
    /// Only the fields the theme entry carries are overwritten.
    pub fn set_style_from_theme<P: ThemeProvider>(&mut self, type_key: &str, graph: &P) {
        if let Some(style) = graph.theme().style(type_key) {
            self.apply_style(style);
            self.commit(&[NodeField::Style]);
        }
    }

    fn apply_style(&mut self, style: &NodeStyle) {
        if let Some(width) = style.width {
            self.width = width;
        }
        if let Some(height) = style.height {
            self.height = height;
        }
        if let Some(fill) = &style.fill {
            self.fill = fill.clone();
        }
        if let Some(fill_opacity) = style.fill_opacity {
            self.fill_opacity = fill_opacity;
        }
        if let Some(stroke) = &style.stroke {
            self.stroke = stroke.clone();
        }
        if let Some(stroke_width) = style.stroke_width {
            self.stroke_width = stroke_width;
        }
        if let Some(stroke_opacity) = style.stroke_opacity {
            self.stroke_opacity = stroke_opacity;
        }
        if let Some(opacity) = style.opacity {
            self.opacity = opacity;
        }
        if let Some(outline_color) = &style.outline_color {
            self.outline_color = outline_color.clone();
        }
    }

    /// Replace the anchor set (normally derived from node geometry by the
    /// owning editor)
    pub fn set_anchors(&mut self, anchors: Vec<Anchor>) {
        self.anchors = anchors;
        self.commit(&[NodeField::Anchors]);
    }

    /// Replace the context-menu configuration
    pub fn set_menu(&mut self, menu: Option<MenuConfig>) {
        self.menu = menu;
        self.commit(&[NodeField::Menu]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::MenuItem;
    use serde_json::json;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn node_at(x: f64, y: f64) -> NodeModel {
        NodeModel::new(NodeConfig::at(x, y), &Theme::default())
    }

    #[test]
    fn test_construction_defaults() {
        let node = node_at(3.0, 4.0);
        assert_eq!(node.model_type(), ModelType::Node);
        assert_eq!((node.x(), node.y()), (3.0, 4.0));
        assert_eq!((node.width(), node.height()), (100.0, 80.0));
        assert_eq!(node.fill(), "#FFFFFF");
        assert_eq!(node.stroke(), "#000000");
        assert_eq!(node.z_index(), DEFAULT_Z_INDEX);
        assert_eq!(node.state(), ElementState::Default);
        assert_eq!(node.active_anchor(), NO_ACTIVE_ANCHOR);
        assert!(node.is_hitable());
        assert!(!node.is_selected());
        assert!(node.anchors().is_empty());
        assert!(node.properties().is_empty());
    }

    #[test]
    fn test_construction_normalizes_missing_text() {
        let node = node_at(5.0, 6.0);
        assert_eq!(node.text().value, "");
        assert_eq!((node.text().x, node.text().y), (5.0, 6.0));
        assert!(!node.text().draggable);
    }

    #[test]
    fn test_construction_normalizes_bare_string_text() {
        let config = NodeConfig {
            text: Some("hello".into()),
            ..NodeConfig::at(5.0, 6.0)
        };
        let node = NodeModel::new(config, &Theme::default());
        assert_eq!(node.text().value, "hello");
        assert_eq!((node.text().x, node.text().y), (5.0, 6.0));
        assert!(!node.text().draggable);
    }

    #[test]
    fn test_construction_keeps_text_record_as_is() {
        let record = TextModel {
            x: 1.0,
            y: 2.0,
            value: "pinned".into(),
            draggable: true,
        };
        let config = NodeConfig {
            text: Some(record.clone().into()),
            ..NodeConfig::at(5.0, 6.0)
        };
        let node = NodeModel::new(config, &Theme::default());
        assert_eq!(node.text(), &record);
    }

    #[test]
    fn test_construction_keeps_supplied_id() {
        let id = NodeId::new();
        let config = NodeConfig {
            id: Some(id),
            ..NodeConfig::at(0.0, 0.0)
        };
        let node = NodeModel::new(config, &Theme::default());
        assert_eq!(node.id(), id);
    }

    #[test]
    fn test_move_by_carries_label() {
        let mut node = node_at(10.0, 20.0);
        node.move_by(3.0, -4.0);
        assert_eq!((node.x(), node.y()), (13.0, 16.0));
        assert_eq!((node.text().x, node.text().y), (13.0, 16.0));
    }

    #[test]
    fn test_move_to_shifts_label_by_delta() {
        let config = NodeConfig {
            text: Some(
                TextModel {
                    x: 15.0,
                    y: 25.0,
                    value: "offset".into(),
                    draggable: false,
                }
                .into(),
            ),
            ..NodeConfig::at(10.0, 20.0)
        };
        let mut node = NodeModel::new(config, &Theme::default());
        node.move_to(30.0, 50.0);
        assert_eq!((node.x(), node.y()), (30.0, 50.0));
        // Label keeps its offset from the node: shifted by (20, 30)
        assert_eq!((node.text().x, node.text().y), (35.0, 55.0));
    }

    #[test]
    fn test_update_text_changes_only_value() {
        let mut node = node_at(1.0, 2.0);
        node.update_text("foo");
        assert_eq!(node.text().value, "foo");
        assert_eq!((node.text().x, node.text().y), (1.0, 2.0));
        assert!(!node.text().draggable);
    }

    #[test]
    fn test_selection_controls_z_index() {
        let mut node = node_at(0.0, 0.0);
        node.set_selected(true, true);
        assert!(node.is_selected());
        assert_eq!(node.z_index(), ELEMENT_MAX_Z_INDEX);

        node.set_selected(false, true);
        assert!(!node.is_selected());
        assert_eq!(node.z_index(), DEFAULT_Z_INDEX);
    }

    #[test]
    fn test_selection_can_suppress_z_index_update() {
        let mut node = node_at(0.0, 0.0);
        node.set_selected(true, false);
        assert!(node.is_selected());
        assert_eq!(node.z_index(), DEFAULT_Z_INDEX);
    }

    #[test]
    fn test_export_data_shape() {
        let config = NodeConfig {
            node_type: Some("rect".into()),
            text: Some("label".into()),
            ..NodeConfig::at(7.0, 8.0)
        };
        let mut node = NodeModel::new(config, &Theme::default());
        node.set_property("weight", json!(3));

        let data = node.export_data();
        assert_eq!(data.id, node.id());
        assert_eq!(data.node_type, "rect");
        assert_eq!((data.x, data.y), (7.0, 8.0));
        assert_eq!(data.text.value, "label");
        assert_eq!(data.properties["weight"], json!(3));
    }

    #[test]
    fn test_export_properties_is_a_deep_copy() {
        let mut node = node_at(0.0, 0.0);
        node.set_property("tag", json!({"kind": "pump"}));

        let mut exported = node.export_properties();
        exported.insert("tag".into(), json!("overwritten"));
        exported.insert("extra".into(), json!(true));

        assert_eq!(node.properties()["tag"], json!({"kind": "pump"}));
        assert!(!node.properties().contains_key("extra"));
    }

    #[test]
    fn test_export_data_round_trips_through_ron() {
        let config = NodeConfig {
            node_type: Some("circle".into()),
            text: Some("hub".into()),
            ..NodeConfig::at(1.0, 2.0)
        };
        let node = NodeModel::new(config, &Theme::default());
        let data = node.export_data();
        let encoded = ron::to_string(&data).unwrap();
        let decoded: NodeData = ron::from_str(&encoded).unwrap();
        assert_eq!(decoded, data);
    }

    #[test]
    fn test_source_rules_short_circuit() {
        let theme = Theme::default();
        let mut source = node_at(0.0, 0.0);
        let target = NodeModel::new(NodeConfig::at(1.0, 1.0), &theme);

        let second_rule_ran = Rc::new(RefCell::new(false));
        let flag = Rc::clone(&second_rule_ran);

        source.add_source_rule(ConnectRule::new("first rule rejects", |_, _| false));
        source.add_source_rule(ConnectRule::new("never reached", move |_, _| {
            *flag.borrow_mut() = true;
            true
        }));

        let result = source.is_allow_connected_as_source(&target);
        assert!(!result.is_all_pass);
        assert_eq!(result.msg.as_deref(), Some("first rule rejects"));
        assert!(!*second_rule_ran.borrow());
    }

    #[test]
    fn test_source_rules_all_pass() {
        let theme = Theme::default();
        let mut source = node_at(0.0, 0.0);
        let target = NodeModel::new(NodeConfig::at(1.0, 1.0), &theme);

        source.add_source_rule(ConnectRule::new("a", |_, _| true));
        source.add_source_rule(ConnectRule::new("b", |_, _| true));

        let result = source.is_allow_connected_as_source(&target);
        assert!(result.is_all_pass);
        assert_eq!(result.msg, None);
    }

    #[test]
    fn test_target_rules_receive_source_and_target_in_order() {
        let theme = Theme::default();
        let source = NodeModel::new(
            NodeConfig {
                node_type: Some("start".into()),
                ..NodeConfig::at(0.0, 0.0)
            },
            &theme,
        );
        let mut target = NodeModel::new(NodeConfig::at(1.0, 1.0), &theme);

        target.add_target_rule(ConnectRule::new("start nodes cannot point here", |s, _| {
            s.node_type() != "start"
        }));

        let result = target.is_allow_connected_as_target(&source);
        assert!(!result.is_all_pass);
        assert_eq!(result.msg.as_deref(), Some("start nodes cannot point here"));
    }

    #[test]
    fn test_nodes_without_rules_always_connect() {
        let theme = Theme::default();
        let a = NodeModel::new(NodeConfig::at(0.0, 0.0), &theme);
        let b = NodeModel::new(NodeConfig::at(1.0, 1.0), &theme);
        assert!(a.is_allow_connected_as_source(&b).is_all_pass);
        assert!(b.is_allow_connected_as_target(&a).is_all_pass);
    }

    #[test]
    fn test_update_data_ignores_unknown_keys() {
        let mut node = node_at(0.0, 0.0);
        let patch = NodePatch::from_json(json!({
            "x": 5.0,
            "y": 5.0,
            "bogus_field": "x",
            "z_index": 42,
        }))
        .unwrap();
        node.update_data(patch);
        assert_eq!((node.x(), node.y()), (5.0, 5.0));
        // z_index is outside the allow-list
        assert_eq!(node.z_index(), DEFAULT_Z_INDEX);
    }

    #[test]
    fn test_update_data_replaces_properties_wholesale() {
        let mut node = node_at(0.0, 0.0);
        node.set_property("a", json!(1));
        let patch = NodePatch::from_json(json!({ "properties": { "b": 2 } })).unwrap();
        node.update_data(patch);
        assert!(!node.properties().contains_key("a"));
        assert_eq!(node.properties()["b"], json!(2));
    }

    #[test]
    fn test_update_data_bare_string_text_keeps_label_position() {
        let mut node = node_at(9.0, 9.0);
        node.update_data(NodePatch {
            text: Some("renamed".into()),
            ..NodePatch::default()
        });
        assert_eq!(node.text().value, "renamed");
        assert_eq!((node.text().x, node.text().y), (9.0, 9.0));
    }

    #[test]
    fn test_set_properties_merges_additively() {
        let mut node = node_at(0.0, 0.0);
        node.set_properties([("a".to_string(), json!(1))].into_iter().collect());
        node.set_properties([("b".to_string(), json!(2))].into_iter().collect());
        assert_eq!(node.properties()["a"], json!(1));
        assert_eq!(node.properties()["b"], json!(2));
    }

    #[test]
    fn test_set_element_state_sets_both_fields() {
        let mut node = node_at(0.0, 0.0);
        node.set_element_state(ElementState::TextEdit, Some(json!({"caret": 3})));
        assert_eq!(node.state(), ElementState::TextEdit);
        assert_eq!(node.addition_state_data(), Some(&json!({"caret": 3})));

        node.set_element_state(ElementState::Default, None);
        assert_eq!(node.state(), ElementState::Default);
        assert_eq!(node.addition_state_data(), None);
    }

    #[test]
    fn test_set_style_from_theme_applies_only_present_fields() {
        let mut theme = Theme::default();
        theme.set_style(
            "pump",
            NodeStyle {
                fill: Some("#ABCDEF".into()),
                stroke_width: Some(4.0),
                ..NodeStyle::default()
            },
        );
        let mut node = node_at(0.0, 0.0);
        node.set_style_from_theme("pump", &theme);
        assert_eq!(node.fill(), "#ABCDEF");
        assert_eq!(node.stroke_width(), 4.0);
        // Fields the entry does not carry stay untouched
        assert_eq!(node.stroke(), "#000000");
        assert_eq!(node.width(), 100.0);
    }

    #[test]
    fn test_set_style_from_theme_unknown_kind_is_a_no_op() {
        let theme = Theme::default();
        let mut node = node_at(0.0, 0.0);
        let version = node.version();
        node.set_style_from_theme("missing", &theme);
        assert_eq!(node.version(), version);
        assert_eq!(node.fill(), "#FFFFFF");
    }

    #[test]
    fn test_actions_commit_one_changeset_each() {
        let mut node = node_at(0.0, 0.0);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        node.subscribe(move |changeset| sink.borrow_mut().push(changeset.clone()));

        node.move_by(1.0, 1.0);
        node.set_hovered(true);
        node.update_stroke("#FF0000");

        let seen = seen.borrow();
        assert_eq!(seen.len(), 3);
        assert!(seen[0].contains(NodeField::Position));
        assert!(seen[0].contains(NodeField::Text));
        assert_eq!(seen[1].fields(), &[NodeField::Hover]);
        assert_eq!(seen[2].fields(), &[NodeField::Style]);
        assert_eq!(node.version(), 3);
    }

    #[test]
    fn test_observer_sees_committed_state_only() {
        // The observer fires after every field write of the action has
        // landed, so a move is never visible without its label shift.
        let mut node = node_at(0.0, 0.0);
        let observed = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&observed);
        node.subscribe(move |changeset| {
            sink.borrow_mut().push(changeset.version());
        });

        node.move_by(2.0, 2.0);
        assert_eq!((node.x(), node.text().x), (2.0, 2.0));
        assert_eq!(*observed.borrow(), vec![1]);
    }

    #[test]
    fn test_misc_flag_actions() {
        let mut node = node_at(0.0, 0.0);

        node.set_hovered(true);
        assert!(node.is_hovered());

        node.set_hitable(false);
        assert!(!node.is_hitable());

        node.set_anchor_active(2);
        assert_eq!(node.active_anchor(), 2);
        node.set_anchor_active(NO_ACTIVE_ANCHOR);
        assert_eq!(node.active_anchor(), NO_ACTIVE_ANCHOR);

        node.show_menu(true);
        assert!(node.is_context_menu());
        node.show_menu(false);
        assert!(!node.is_context_menu());

        node.update_stroke("#00FF00");
        assert_eq!(node.stroke(), "#00FF00");
    }

    #[test]
    fn test_set_anchors_and_menu() {
        let mut node = node_at(10.0, 10.0);
        node.set_anchors(Anchor::rect_midpoints(10.0, 10.0, 100.0, 80.0));
        assert_eq!(node.anchors().len(), 4);

        node.set_menu(Some(vec![MenuItem {
            text: "Delete".into(),
            class_name: None,
            icon: false,
        }]));
        assert_eq!(node.menu().unwrap()[0].text, "Delete");
    }
}
