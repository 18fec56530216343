//! # Hierarchical Layout
//!
//! Structural, session-independent placement of every node.
//!
//! 1. Level assignment: axioms are level 0; an argument whose dependencies
//!    are all levelled gets `1 + max(dependency levels)`. Passes repeat until
//!    nothing changes. Arguments still unlevelled (cycles, dangling targets,
//!    or chains through such nodes) fall back to level 1 and are reported.
//! 2. Coordinates: nodes are grouped by level in input order, laid out left
//!    to right, centred on x = 0. Level 0 sits at the bottom; higher levels
//!    render above it.
//!
//! All geometry is integer pixels.

use crate::primitives::{
    DEFAULT_HORIZONTAL_SPACING, DEFAULT_LEVEL_HEIGHT, DEFAULT_NODE_HEIGHT, DEFAULT_NODE_WIDTH,
    DEFAULT_VERTICAL_OFFSET, FALLBACK_LEVEL,
};
use crate::{AxiomsError, Node, NodeId, NodeKind};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

// =============================================================================
// CONFIGURATION
// =============================================================================

/// Cosmetic layout constants. Ordering and centring do not depend on them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub level_height: i64,
    pub node_width: i64,
    pub node_height: i64,
    pub horizontal_spacing: i64,
    pub vertical_offset: i64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            level_height: DEFAULT_LEVEL_HEIGHT,
            node_width: DEFAULT_NODE_WIDTH,
            node_height: DEFAULT_NODE_HEIGHT,
            horizontal_spacing: DEFAULT_HORIZONTAL_SPACING,
            vertical_offset: DEFAULT_VERTICAL_OFFSET,
        }
    }
}

impl LayoutConfig {
    /// Reject geometry that would collapse or invert the layout.
    pub fn validate(&self) -> Result<(), AxiomsError> {
        if self.node_width <= 0 || self.node_height <= 0 {
            return Err(AxiomsError::InvalidConfig(format!(
                "node size must be positive, got {}x{}",
                self.node_width, self.node_height
            )));
        }
        if self.level_height <= 0 {
            return Err(AxiomsError::InvalidConfig(format!(
                "level_height must be positive, got {}",
                self.level_height
            )));
        }
        if self.horizontal_spacing < 0 {
            return Err(AxiomsError::InvalidConfig(format!(
                "horizontal_spacing must not be negative, got {}",
                self.horizontal_spacing
            )));
        }
        Ok(())
    }
}

// =============================================================================
// OUTPUT TYPES
// =============================================================================

/// Placement of a single node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutNode {
    pub id: NodeId,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    pub level: u32,
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
}

/// Levels for every node plus the ids that needed the fallback.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LevelAssignment {
    pub levels: BTreeMap<NodeId, u32>,
    /// Arguments whose dependencies never bottomed out at an axiom.
    pub fallback: BTreeSet<NodeId>,
}

impl LevelAssignment {
    #[must_use]
    pub fn level(&self, id: &str) -> Option<u32> {
        self.levels.get(id).copied()
    }

    #[must_use]
    pub fn max_level(&self) -> u32 {
        self.levels.values().copied().max().unwrap_or(0)
    }
}

/// Layout of a whole graph, keyed by node id.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Layout {
    pub nodes: BTreeMap<NodeId, LayoutNode>,
    pub max_level: u32,
    /// Nodes placed at the fallback level; structurally suspect.
    pub fallback: BTreeSet<NodeId>,
}

impl Layout {
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&LayoutNode> {
        self.nodes.get(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

// =============================================================================
// LEVEL ASSIGNMENT
// =============================================================================

/// Assign a level to every node. Never fails.
#[must_use]
pub fn compute_levels(nodes: &[Node]) -> LevelAssignment {
    let mut levels: BTreeMap<NodeId, u32> = BTreeMap::new();

    for node in nodes.iter().filter(|n| n.is_axiom()) {
        levels.entry(node.id.clone()).or_insert(0);
    }

    let mut changed = true;
    while changed {
        changed = false;

        for node in nodes.iter().filter(|n| n.is_argument()) {
            if levels.contains_key(&node.id) {
                continue;
            }

            let mut max_dependency = 0u32;
            let mut resolved = true;
            for dependency in node.dependencies() {
                match levels.get(dependency) {
                    Some(&level) => max_dependency = max_dependency.max(level),
                    None => {
                        resolved = false;
                        break;
                    }
                }
            }

            if resolved {
                levels.insert(node.id.clone(), max_dependency.saturating_add(1));
                changed = true;
            }
        }
    }

    let mut fallback = BTreeSet::new();
    for node in nodes.iter().filter(|n| n.is_argument()) {
        if !levels.contains_key(&node.id) {
            levels.insert(node.id.clone(), FALLBACK_LEVEL);
            fallback.insert(node.id.clone());
        }
    }

    LevelAssignment { levels, fallback }
}

// =============================================================================
// COORDINATES
// =============================================================================

/// Compute the full layered layout for `nodes`.
///
/// Every input node gets an entry. Ties inside a level follow input order.
#[must_use]
pub fn hierarchical_layout(nodes: &[Node], config: &LayoutConfig) -> Layout {
    let assignment = compute_levels(nodes);
    let max_level = assignment.max_level();

    let mut by_level: BTreeMap<u32, Vec<&Node>> = BTreeMap::new();
    let mut placed = BTreeSet::new();
    for node in nodes {
        // Duplicate ids are placed once, at their first occurrence.
        if !placed.insert(node.id.as_str()) {
            continue;
        }
        let level = assignment.level(node.id.as_str()).unwrap_or(FALLBACK_LEVEL);
        by_level.entry(level).or_default().push(node);
    }

    let stride = config.node_width.saturating_add(config.horizontal_spacing);
    let mut layout_nodes = BTreeMap::new();

    for (level, row) in &by_level {
        let count = row.len() as i64;
        let total_width = count
            .saturating_mul(config.node_width)
            .saturating_add(count.saturating_sub(1).saturating_mul(config.horizontal_spacing));
        let start_x = -(total_width / 2);
        let rows_from_top = i64::from(max_level.saturating_sub(*level));
        let y = config
            .vertical_offset
            .saturating_add(rows_from_top.saturating_mul(config.level_height));

        for (index, node) in row.iter().enumerate() {
            let x = start_x.saturating_add((index as i64).saturating_mul(stride));
            layout_nodes.insert(
                node.id.clone(),
                LayoutNode {
                    id: node.id.clone(),
                    kind: node.kind(),
                    level: *level,
                    x,
                    y,
                    width: config.node_width,
                    height: config.node_height,
                },
            );
        }
    }

    Layout {
        nodes: layout_nodes,
        max_level,
        fallback: assignment.fallback,
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn chain() -> Vec<Node> {
        vec![
            Node::new("ax1"),
            Node::new("arg1").depends_on("ax1"),
            Node::new("arg2").depends_on("arg1"),
        ]
    }

    #[test]
    fn chain_levels_increase() {
        let assignment = compute_levels(&chain());
        assert_eq!(assignment.level("ax1"), Some(0));
        assert_eq!(assignment.level("arg1"), Some(1));
        assert_eq!(assignment.level("arg2"), Some(2));
        assert!(assignment.fallback.is_empty());
    }

    #[test]
    fn level_is_one_more_than_deepest_dependency() {
        let nodes = vec![
            Node::new("ax1"),
            Node::new("arg1").depends_on("ax1"),
            Node::new("arg2").depends_on("arg1"),
            Node::new("arg3").depends_on("ax1").depends_on("arg2"),
        ];
        assert_eq!(compute_levels(&nodes).level("arg3"), Some(3));
    }

    #[test]
    fn higher_level_renders_above() {
        let layout = hierarchical_layout(&chain(), &LayoutConfig::default());
        let arg1 = layout.get("arg1").expect("arg1");
        let arg2 = layout.get("arg2").expect("arg2");
        let ax1 = layout.get("ax1").expect("ax1");

        assert_eq!(arg2.level, 2);
        assert!(arg2.y < arg1.y);
        assert!(arg1.y < ax1.y);
        assert_eq!(layout.max_level, 2);
        assert_eq!(arg2.y, DEFAULT_VERTICAL_OFFSET);
    }

    #[test]
    fn rows_are_centred_and_ordered_by_input() {
        let nodes = vec![Node::new("a"), Node::new("b"), Node::new("c")];
        let config = LayoutConfig::default();
        let layout = hierarchical_layout(&nodes, &config);

        let xs: Vec<i64> = ["a", "b", "c"]
            .iter()
            .map(|id| layout.get(id).map(|n| n.x).unwrap_or_default())
            .collect();
        assert!(xs[0] < xs[1] && xs[1] < xs[2]);

        // Symmetric: left edge of the first node mirrors the right edge of the last.
        let right_edge = xs[2] + config.node_width;
        assert_eq!(xs[0], -right_edge);
    }

    #[test]
    fn single_node_is_centred_on_origin() {
        let layout = hierarchical_layout(&[Node::new("solo")], &LayoutConfig::default());
        let solo = layout.get("solo").expect("solo");
        assert_eq!(solo.x, -(DEFAULT_NODE_WIDTH / 2));
        assert_eq!(solo.kind, NodeKind::Axiom);
    }

    #[test]
    fn dangling_argument_gets_fallback_level() {
        let nodes = vec![Node::new("arg1").depends_on("ghost")];
        let layout = hierarchical_layout(&nodes, &LayoutConfig::default());
        let arg1 = layout.get("arg1").expect("arg1");

        assert_eq!(arg1.level, FALLBACK_LEVEL);
        assert!(layout.fallback.contains("arg1"));
        assert_eq!(arg1.y, DEFAULT_VERTICAL_OFFSET);
    }

    #[test]
    fn cycle_gets_fallback_level() {
        let nodes = vec![
            Node::new("ax"),
            Node::new("a").depends_on("b"),
            Node::new("b").depends_on("a"),
            Node::new("c").depends_on("a"),
        ];
        let assignment = compute_levels(&nodes);
        for id in ["a", "b", "c"] {
            assert_eq!(assignment.level(id), Some(FALLBACK_LEVEL));
            assert!(assignment.fallback.contains(id));
        }
    }

    #[test]
    fn empty_input_is_empty_layout() {
        let layout = hierarchical_layout(&[], &LayoutConfig::default());
        assert!(layout.is_empty());
        assert_eq!(layout.max_level, 0);
    }

    #[test]
    fn layout_node_wire_shape() {
        let layout = hierarchical_layout(&chain(), &LayoutConfig::default());
        let json = serde_json::to_value(layout.get("arg1").expect("arg1")).expect("ser");
        assert_eq!(json["type"], "argument");
        assert_eq!(json["level"], 1);
        assert_eq!(json["width"], DEFAULT_NODE_WIDTH);
    }

    #[test]
    fn config_validation() {
        assert!(LayoutConfig::default().validate().is_ok());
        let bad = LayoutConfig {
            node_width: 0,
            ..LayoutConfig::default()
        };
        assert!(matches!(bad.validate(), Err(AxiomsError::InvalidConfig(_))));
        let bad = LayoutConfig {
            level_height: -5,
            ..LayoutConfig::default()
        };
        assert!(bad.validate().is_err());
    }
}
