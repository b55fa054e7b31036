// SPDX-License-Identifier: MIT OR Apache-2.0
//! Default styling per node kind.
//!
//! A [`Theme`] is constructed once by the embedding editor and passed by
//! reference wherever defaults are needed. Node construction merges the
//! payload over [`NodeDefaults`]; `set_style_from_theme` looks up the
//! per-kind [`NodeStyle`] table through a [`ThemeProvider`].

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Style fields a theme entry may carry for one node kind.
///
/// Every field is optional; applying a style overwrites only the fields the
/// entry actually carries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeStyle {
    /// Node width
    pub width: Option<f64>,
    /// Node height
    pub height: Option<f64>,
    /// Fill color
    pub fill: Option<String>,
    /// Fill opacity in `0.0..=1.0`
    pub fill_opacity: Option<f64>,
    /// Stroke color
    pub stroke: Option<String>,
    /// Stroke width
    pub stroke_width: Option<f64>,
    /// Stroke opacity in `0.0..=1.0`
    pub stroke_opacity: Option<f64>,
    /// Overall opacity in `0.0..=1.0`
    pub opacity: Option<f64>,
    /// Selection outline color
    pub outline_color: Option<String>,
}

/// Fully resolved defaults a node is built from before the construction
/// payload is merged on top
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDefaults {
    /// Default x
    pub x: f64,
    /// Default y
    pub y: f64,
    /// Default width
    pub width: f64,
    /// Default height
    pub height: f64,
    /// Default fill color
    pub fill: String,
    /// Default fill opacity
    pub fill_opacity: f64,
    /// Default stroke color
    pub stroke: String,
    /// Default stroke width
    pub stroke_width: f64,
    /// Default stroke opacity
    pub stroke_opacity: f64,
    /// Default overall opacity
    pub opacity: f64,
    /// Default selection outline color
    pub outline_color: String,
}

impl Default for NodeDefaults {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: 100.0,
            height: 80.0,
            fill: "#FFFFFF".into(),
            fill_opacity: 1.0,
            stroke: "#000000".into(),
            stroke_width: 2.0,
            stroke_opacity: 1.0,
            opacity: 1.0,
            outline_color: "#1E90FF".into(),
        }
    }
}

/// Per-kind style table plus the construction defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    defaults: NodeDefaults,
    styles: IndexMap<String, NodeStyle>,
}

impl Theme {
    /// Theme with the given defaults and no per-kind entries
    pub fn new(defaults: NodeDefaults) -> Self {
        Self {
            defaults,
            styles: IndexMap::new(),
        }
    }

    /// Defaults merged under every construction payload
    pub fn node_defaults(&self) -> &NodeDefaults {
        &self.defaults
    }

    /// Style registered for a node kind
    pub fn style(&self, type_key: &str) -> Option<&NodeStyle> {
        self.styles.get(type_key)
    }

    /// Register (or replace) the style for a node kind
    pub fn set_style(&mut self, type_key: impl Into<String>, style: NodeStyle) {
        self.styles.insert(type_key.into(), style);
    }
}

impl Default for Theme {
    /// Built-in theme seeded with the basic shape kinds
    fn default() -> Self {
        let mut theme = Self::new(NodeDefaults::default());
        theme.set_style(
            "rect",
            NodeStyle {
                width: Some(100.0),
                height: Some(80.0),
                ..NodeStyle::default()
            },
        );
        theme.set_style(
            "circle",
            NodeStyle {
                width: Some(100.0),
                height: Some(100.0),
                ..NodeStyle::default()
            },
        );
        theme.set_style(
            "diamond",
            NodeStyle {
                width: Some(120.0),
                height: Some(80.0),
                ..NodeStyle::default()
            },
        );
        theme.set_style(
            "ellipse",
            NodeStyle {
                width: Some(120.0),
                height: Some(80.0),
                ..NodeStyle::default()
            },
        );
        theme
    }
}

/// Access to the graph-level theme, implemented by the embedding editor's
/// graph model
pub trait ThemeProvider {
    /// The active theme
    fn theme(&self) -> &Theme;
}

impl ThemeProvider for Theme {
    fn theme(&self) -> &Theme {
        self
    }
}
