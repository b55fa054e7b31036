// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node-model core for the Flowgrid diagram editor.
//!
//! This crate owns the mutable state of a single diagram node:
//! - Geometry, style, and label attributes merged over theme defaults
//! - Mutation actions that commit field writes as atomic changesets
//! - Connection rules consulted before a node may serve as an edge endpoint
//! - The snapshot shape the owning editor persists
//!
//! ## Architecture
//!
//! The embedding editor constructs a [`NodeModel`] from a [`NodeConfig`],
//! mutates it through action methods in response to user input, observes
//! committed [`Changeset`]s to re-render, and asks the rule evaluator
//! whether a proposed edge may use the node as source or target. Layout,
//! hit-testing, rendering, and the graph-level model of edges stay outside
//! this crate.

pub mod anchor;
pub mod change;
pub mod data;
pub mod node;
pub mod rules;
pub mod theme;

pub use anchor::Anchor;
pub use change::{Changeset, NodeField, ObserverId, ObserverRegistry};
pub use data::{
    AdditionData, MenuConfig, MenuItem, ModelError, NodeConfig, NodeData, NodePatch, TextData,
    TextInput,
};
pub use node::{
    ElementState, ModelType, NodeId, NodeModel, TextModel, DEFAULT_Z_INDEX, ELEMENT_MAX_Z_INDEX,
    NO_ACTIVE_ANCHOR,
};
pub use rules::{ConnectRule, ConnectRuleResult};
pub use theme::{NodeDefaults, NodeStyle, Theme, ThemeProvider};
