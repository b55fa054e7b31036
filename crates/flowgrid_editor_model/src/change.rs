// SPDX-License-Identifier: MIT OR Apache-2.0
//! Changeset notification for node mutations.
//!
//! Every mutation action on a node commits its field writes as one
//! [`Changeset`]. Observers registered on the model receive the changeset
//! only after all writes of the action have landed, so they never see a
//! half-applied action (e.g. a moved node whose label has not shifted yet).

/// Field group touched by a mutation action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeField {
    /// Node position (`x`/`y`)
    Position,
    /// Label record (position or content)
    Text,
    /// Node variant tag
    NodeType,
    /// Selection flag
    Selection,
    /// Stacking order
    ZIndex,
    /// Hover flag
    Hover,
    /// Hit-test participation flag
    Hitable,
    /// Active anchor index
    ActiveAnchor,
    /// Interaction state and its auxiliary payload
    State,
    /// Context-menu visibility or configuration
    Menu,
    /// Any style attribute
    Style,
    /// Open properties mapping
    Properties,
    /// Anchor set
    Anchors,
}

/// Atomic set of field updates produced by one mutation action
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Changeset {
    version: u64,
    fields: Vec<NodeField>,
}

impl Changeset {
    /// Sequence number of this changeset (1 for the first commit)
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Field groups the action touched
    pub fn fields(&self) -> &[NodeField] {
        &self.fields
    }

    /// Check whether the changeset touches a field group
    pub fn contains(&self, field: NodeField) -> bool {
        self.fields.contains(&field)
    }
}

/// Handle for removing a registered observer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

type ObserverFn = Box<dyn FnMut(&Changeset)>;

/// Subscriber registry with a monotonically increasing commit counter.
///
/// Dispatch is synchronous and single-threaded; the embedding editor's event
/// loop serializes all access to a node and its observers.
#[derive(Default)]
pub struct ObserverRegistry {
    next_id: u64,
    version: u64,
    observers: Vec<(ObserverId, ObserverFn)>,
}

impl std::fmt::Debug for ObserverRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObserverRegistry")
            .field("version", &self.version)
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl ObserverRegistry {
    /// Register an observer, called once per committed changeset
    pub fn subscribe(&mut self, observer: impl FnMut(&Changeset) + 'static) -> ObserverId {
        self.next_id += 1;
        let id = ObserverId(self.next_id);
        self.observers.push((id, Box::new(observer)));
        id
    }

    /// Remove an observer; returns whether it was registered
    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(observer_id, _)| *observer_id != id);
        self.observers.len() != before
    }

    /// Commit one changeset and notify every observer
    pub fn commit(&mut self, fields: &[NodeField]) -> u64 {
        self.version += 1;
        let changeset = Changeset {
            version: self.version,
            fields: fields.to_vec(),
        };
        for (_, observer) in &mut self.observers {
            observer(&changeset);
        }
        self.version
    }

    /// Number of changesets committed so far
    pub fn version(&self) -> u64 {
        self.version
    }
}
