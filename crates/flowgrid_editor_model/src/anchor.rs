// SPDX-License-Identifier: MIT OR Apache-2.0
//! Connection anchors: points on a node's perimeter where edges may attach.

use serde::{Deserialize, Serialize};

/// A point on a node's perimeter where an edge endpoint may attach
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anchor {
    /// Anchor x in diagram coordinates
    pub x: f64,
    /// Anchor y in diagram coordinates
    pub y: f64,
    /// Optional stable identifier, so edges can re-attach after reload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl Anchor {
    /// Create an anchor at a position
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y, id: None }
    }

    /// Attach a stable identifier
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// The four side-midpoint anchors of a rectangular node centered at
    /// (`x`, `y`), in top/right/bottom/left order
    pub fn rect_midpoints(x: f64, y: f64, width: f64, height: f64) -> Vec<Anchor> {
        vec![
            Anchor::new(x, y - height / 2.0),
            Anchor::new(x + width / 2.0, y),
            Anchor::new(x, y + height / 2.0),
            Anchor::new(x - width / 2.0, y),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_midpoints() {
        let anchors = Anchor::rect_midpoints(10.0, 20.0, 100.0, 80.0);
        assert_eq!(anchors.len(), 4);
        assert_eq!((anchors[0].x, anchors[0].y), (10.0, -20.0));
        assert_eq!((anchors[1].x, anchors[1].y), (60.0, 20.0));
        assert_eq!((anchors[2].x, anchors[2].y), (10.0, 60.0));
        assert_eq!((anchors[3].x, anchors[3].y), (-40.0, 20.0));
    }

    #[test]
    fn test_with_id() {
        let anchor = Anchor::new(0.0, 0.0).with_id("left");
        assert_eq!(anchor.id.as_deref(), Some("left"));
    }
}
