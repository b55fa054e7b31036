// SPDX-License-Identifier: MIT OR Apache-2.0
//! Connection rules: predicates consulted before an edge may use a node as
//! an endpoint.
//!
//! Rules are registered on a node in the order they should run; evaluation
//! short-circuits on the first failing rule and surfaces its message.
//! Rejection is a normal outcome the editor shows to the user, not an error.

use crate::node::NodeModel;
use serde::{Deserialize, Serialize};

/// A named predicate deciding whether an edge may connect a pair of nodes.
///
/// The predicate receives `(source, target)` and must not mutate either
/// endpoint; it is re-run on every connection attempt.
pub struct ConnectRule {
    message: String,
    validate: Box<dyn Fn(&NodeModel, &NodeModel) -> bool>,
}

impl ConnectRule {
    /// Create a rule from a rejection message and a pure predicate
    pub fn new(
        message: impl Into<String>,
        validate: impl Fn(&NodeModel, &NodeModel) -> bool + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            validate: Box::new(validate),
        }
    }

    /// Message surfaced to the user when this rule rejects a connection
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Run the predicate against a `(source, target)` pair
    pub fn validate(&self, source: &NodeModel, target: &NodeModel) -> bool {
        (self.validate)(source, target)
    }
}

impl std::fmt::Debug for ConnectRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectRule")
            .field("message", &self.message)
            .finish_non_exhaustive()
    }
}

/// Outcome of evaluating a node's rule chain for one proposed edge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectRuleResult {
    /// Whether every rule passed
    pub is_all_pass: bool,
    /// Message of the first failing rule
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,
}

impl ConnectRuleResult {
    /// All rules passed
    pub fn pass() -> Self {
        Self {
            is_all_pass: true,
            msg: None,
        }
    }

    /// A rule rejected the connection
    pub fn fail(msg: impl Into<String>) -> Self {
        Self {
            is_all_pass: false,
            msg: Some(msg.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::NodeConfig;
    use crate::theme::Theme;

    #[test]
    fn test_rule_message_and_predicate() {
        let rule = ConnectRule::new("only to the right", |source, target| {
            target.x() > source.x()
        });
        assert_eq!(rule.message(), "only to the right");

        let theme = Theme::default();
        let left = NodeModel::new(NodeConfig::at(0.0, 0.0), &theme);
        let right = NodeModel::new(NodeConfig::at(10.0, 0.0), &theme);
        assert!(rule.validate(&left, &right));
        assert!(!rule.validate(&right, &left));
    }

    #[test]
    fn test_result_constructors() {
        assert_eq!(
            ConnectRuleResult::pass(),
            ConnectRuleResult {
                is_all_pass: true,
                msg: None
            }
        );
        let failed = ConnectRuleResult::fail("no self loops");
        assert!(!failed.is_all_pass);
        assert_eq!(failed.msg.as_deref(), Some("no self loops"));
    }
}
