//! # Property-Based Tests
//!
//! Invariants of the reachability and layout engines over arbitrary graphs,
//! including cyclic graphs and graphs with dangling edges.

use philsaxioms_core::{
    ArgumentValidator, Graph, LayoutConfig, Node, NodeId, ValidationContext, check,
    compute_levels, hierarchical_layout, valid_arguments,
};
use proptest::collection::vec;
use proptest::prelude::*;
use std::collections::BTreeSet;

const MAX_NODES: usize = 12;

// =============================================================================
// GENERATORS
// =============================================================================

/// Build a node list from raw edge lists.
///
/// Node `i` gets id `n{i}`. A target index beyond the node count becomes a
/// dangling edge to `missing{t}`.
fn build_nodes(edge_lists: &[Vec<usize>]) -> Vec<Node> {
    let count = edge_lists.len();
    edge_lists
        .iter()
        .enumerate()
        .map(|(i, targets)| {
            targets.iter().fold(Node::new(format!("n{}", i)), |node, &t| {
                if t < count {
                    node.depends_on(format!("n{}", t))
                } else {
                    node.depends_on(format!("missing{}", t))
                }
            })
        })
        .collect()
}

fn select_axioms(nodes: &[Node], mask: &[bool]) -> BTreeSet<NodeId> {
    nodes
        .iter()
        .zip(mask.iter().chain(std::iter::repeat(&false)))
        .filter(|(node, selected)| node.is_axiom() && **selected)
        .map(|(node, _)| node.id.clone())
        .collect()
}

fn edge_lists() -> impl Strategy<Value = Vec<Vec<usize>>> {
    vec(vec(0usize..MAX_NODES + 2, 0..4), 0..MAX_NODES)
}

// =============================================================================
// REACHABILITY PROPERTIES
// =============================================================================

proptest! {
    /// Accepting more axioms never invalidates an argument.
    #[test]
    fn reachability_is_monotonic(
        lists in edge_lists(),
        larger in vec(any::<bool>(), MAX_NODES),
        keep in vec(any::<bool>(), MAX_NODES),
    ) {
        let nodes = build_nodes(&lists);
        let smaller_mask: Vec<bool> = larger.iter().zip(&keep).map(|(a, b)| *a && *b).collect();

        let big = select_axioms(&nodes, &larger);
        let small = select_axioms(&nodes, &smaller_mask);
        prop_assert!(small.is_subset(&big));

        let valid_small = valid_arguments(&nodes, &small);
        let valid_big = valid_arguments(&nodes, &big);
        prop_assert!(valid_small.is_subset(&valid_big));
    }

    /// Same input, same output.
    #[test]
    fn reachability_is_idempotent(lists in edge_lists(), mask in vec(any::<bool>(), MAX_NODES)) {
        let nodes = build_nodes(&lists);
        let accepted = select_axioms(&nodes, &mask);
        let validator = ArgumentValidator::new();

        prop_assert_eq!(
            validator.valid_arguments(&nodes, &accepted),
            validator.valid_arguments(&nodes, &accepted)
        );
    }

    /// The result does not depend on authored order.
    #[test]
    fn reachability_ignores_node_order(lists in edge_lists(), mask in vec(any::<bool>(), MAX_NODES)) {
        let nodes = build_nodes(&lists);
        let accepted = select_axioms(&nodes, &mask);
        let mut reversed = nodes.clone();
        reversed.reverse();

        prop_assert_eq!(valid_arguments(&nodes, &accepted), valid_arguments(&reversed, &accepted));
    }

    /// Every valid argument is directly supported by accepted axioms or
    /// other valid arguments, and nothing else is ever reported.
    #[test]
    fn valid_arguments_are_supported(lists in edge_lists(), mask in vec(any::<bool>(), MAX_NODES)) {
        let nodes = build_nodes(&lists);
        let graph = Graph::from_nodes(nodes.clone());
        let accepted = select_axioms(&nodes, &mask);
        let valid = valid_arguments(&nodes, &accepted);

        for id in &valid {
            let node = graph.node(id.as_str());
            prop_assert!(node.is_some_and(Node::is_argument));
            if let Some(node) = node {
                for dependency in node.dependencies() {
                    prop_assert!(graph.contains(dependency.as_str()));
                    prop_assert!(accepted.contains(dependency) || valid.contains(dependency));
                }
            }
        }
    }

    /// Arguments caught in a dependency cycle are never valid.
    #[test]
    fn cyclic_arguments_never_validate(lists in edge_lists()) {
        let nodes = build_nodes(&lists);
        let all_axioms: BTreeSet<NodeId> =
            nodes.iter().filter(|n| n.is_axiom()).map(|n| n.id.clone()).collect();
        let valid = valid_arguments(&nodes, &all_axioms);
        let report = check(&Graph::from_nodes(nodes));

        for cycle in &report.cycles {
            for id in cycle {
                prop_assert!(!valid.contains(id));
            }
        }
    }

    /// A single recursive check from scratch agrees with the batch result.
    #[test]
    fn single_checks_agree_with_batch(lists in edge_lists(), mask in vec(any::<bool>(), MAX_NODES)) {
        let nodes = build_nodes(&lists);
        let accepted = select_axioms(&nodes, &mask);
        let valid = valid_arguments(&nodes, &accepted);
        let none = BTreeSet::new();
        let ctx = ValidationContext::new(&nodes, &accepted, &none);
        let validator = ArgumentValidator::new();

        for node in nodes.iter().filter(|n| n.is_argument()) {
            prop_assert_eq!(validator.can_activate(node, &ctx), valid.contains(&node.id));
        }
    }
}

// =============================================================================
// LAYOUT PROPERTIES
// =============================================================================

proptest! {
    /// Every node is placed, whatever the graph looks like.
    #[test]
    fn layout_is_total(lists in edge_lists()) {
        let nodes = build_nodes(&lists);
        let layout = hierarchical_layout(&nodes, &LayoutConfig::default());

        prop_assert_eq!(layout.len(), nodes.len());
        for node in &nodes {
            let placed = layout.get(node.id.as_str());
            prop_assert!(placed.is_some());
            if let Some(placed) = placed {
                prop_assert_eq!(placed.kind, node.kind());
            }
        }
    }

    /// Levels strictly increase along every dependency edge, except at
    /// fallback-leveled nodes, which still sit at level 1 or higher.
    #[test]
    fn levels_increase_along_edges(lists in edge_lists()) {
        let nodes = build_nodes(&lists);
        let assignment = compute_levels(&nodes);

        for node in &nodes {
            let level = assignment.level(node.id.as_str());
            prop_assert!(level.is_some());
            let level = level.unwrap_or_default();

            if node.is_axiom() {
                prop_assert_eq!(level, 0);
                continue;
            }
            prop_assert!(level >= 1);
            if assignment.fallback.contains(&node.id) {
                continue;
            }
            for dependency in node.dependencies() {
                let dependency_level = assignment.level(dependency.as_str());
                prop_assert!(dependency_level.is_some_and(|d| level > d));
            }
        }
    }

    /// Higher levels are drawn above lower ones.
    #[test]
    fn higher_levels_render_above(lists in edge_lists()) {
        let nodes = build_nodes(&lists);
        let layout = hierarchical_layout(&nodes, &LayoutConfig::default());

        for a in layout.nodes.values() {
            for b in layout.nodes.values() {
                if a.level > b.level {
                    prop_assert!(a.y < b.y);
                } else if a.level == b.level {
                    prop_assert_eq!(a.y, b.y);
                }
            }
        }
    }

    /// Nodes on the same level never overlap.
    #[test]
    fn rows_do_not_overlap(lists in edge_lists()) {
        let nodes = build_nodes(&lists);
        let config = LayoutConfig::default();
        let layout = hierarchical_layout(&nodes, &config);

        let mut rows: std::collections::BTreeMap<u32, Vec<i64>> = std::collections::BTreeMap::new();
        for placed in layout.nodes.values() {
            rows.entry(placed.level).or_default().push(placed.x);
        }
        for xs in rows.values_mut() {
            xs.sort_unstable();
            for pair in xs.windows(2) {
                prop_assert!(pair[1] - pair[0] >= config.node_width + config.horizontal_spacing);
            }
        }
    }
}
