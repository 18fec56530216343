//! # Argument Validator
//!
//! The reachability engine: given the full node set and the accepted axiom
//! ids, compute the maximal set of arguments that are transitively supported.
//!
//! An argument is valid iff every edge target resolves and is satisfied:
//! an axiom target must be accepted, an argument target must itself be valid.
//!
//! ## Failure policy
//!
//! - A dependency that re-enters the current recursion path is unsatisfied
//!   (cycles fail closed, evaluation always terminates).
//! - A dependency whose target does not exist is unsatisfied (dangling
//!   edges fail closed).
//! - A node with no edges at all is vacuously satisfied.
//!
//! [`ArgumentValidator::valid_arguments`] computes the least fixed point
//! with a worklist: every argument counts its unproven argument
//! dependencies and is released when the count reaches zero. Arguments on a
//! cycle never reach zero. The work is linear in nodes plus edges (times a
//! map lookup) and the answer does not depend on node order.

use crate::graph::Graph;
use crate::{Node, NodeId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Outcome of one recursive activation check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Activation {
    Holds,
    /// Fails whatever the recursion path.
    Fails,
    /// Failed only because a dependency re-entered the current path.
    Blocked,
}

// =============================================================================
// VALIDATION CONTEXT
// =============================================================================

/// Read-only state consulted by a single activation check.
#[derive(Debug)]
pub struct ValidationContext<'a> {
    /// Accepted axiom ids supplied by the caller.
    pub accepted_axioms: &'a BTreeSet<NodeId>,
    /// Arguments already proven valid in earlier passes.
    pub valid_arguments: &'a BTreeSet<NodeId>,
    /// Id -> node lookup over the whole input.
    nodes: BTreeMap<&'a str, &'a Node>,
}

impl<'a> ValidationContext<'a> {
    /// Build a context over `nodes`. The first node with a given id wins.
    #[must_use]
    pub fn new(
        nodes: &'a [Node],
        accepted_axioms: &'a BTreeSet<NodeId>,
        valid_arguments: &'a BTreeSet<NodeId>,
    ) -> Self {
        let mut index = BTreeMap::new();
        for node in nodes {
            index.entry(node.id.as_str()).or_insert(node);
        }
        Self {
            accepted_axioms,
            valid_arguments,
            nodes: index,
        }
    }

    fn resolve(&self, id: &NodeId) -> Option<&'a Node> {
        self.nodes.get(id.as_str()).copied()
    }
}

// =============================================================================
// EVALUATION
// =============================================================================

/// Result of evaluating a user's accept/reject state against a graph.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Evaluation {
    /// Arguments valid under the effective accepted set.
    pub valid_arguments: BTreeSet<NodeId>,
    /// Accepted ids that are axioms of the graph and not rejected.
    pub accepted_axioms: BTreeSet<NodeId>,
    /// Rejected ids that are axioms of the graph.
    pub rejected_axioms: BTreeSet<NodeId>,
    /// Supplied ids that do not name an axiom of the graph.
    pub unknown_ids: BTreeSet<NodeId>,
}

// =============================================================================
// ARGUMENT VALIDATOR
// =============================================================================

/// Stateless reachability engine. Safe to call repeatedly; retains nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArgumentValidator;

impl ArgumentValidator {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Check whether `argument` is activatable under `ctx`.
    ///
    /// Uses a fresh recursion path per call, so independent checks never
    /// share cycle state. Within the call, outcomes that do not depend on
    /// the path are memoised, so shared sub-graphs are expanded once.
    #[must_use]
    pub fn can_activate(&self, argument: &Node, ctx: &ValidationContext<'_>) -> bool {
        let mut path = BTreeSet::new();
        let mut settled = BTreeMap::new();
        self.activation(argument, ctx, &mut path, &mut settled) == Activation::Holds
    }

    fn activation<'n>(
        &self,
        argument: &'n Node,
        ctx: &ValidationContext<'n>,
        path: &mut BTreeSet<&'n str>,
        settled: &mut BTreeMap<&'n str, Activation>,
    ) -> Activation {
        if let Some(outcome) = settled.get(argument.id.as_str()) {
            return *outcome;
        }
        if !path.insert(argument.id.as_str()) {
            return Activation::Blocked;
        }

        let mut outcome = Activation::Holds;
        for edge in &argument.edges {
            let dependency_outcome = match ctx.resolve(&edge.to) {
                None => Activation::Fails,
                Some(dependency) if dependency.is_axiom() => {
                    if ctx.accepted_axioms.contains(&dependency.id) {
                        Activation::Holds
                    } else {
                        Activation::Fails
                    }
                }
                Some(dependency) if ctx.valid_arguments.contains(&dependency.id) => {
                    Activation::Holds
                }
                Some(dependency) => self.activation(dependency, ctx, path, settled),
            };
            match dependency_outcome {
                Activation::Holds => {}
                Activation::Fails => {
                    outcome = Activation::Fails;
                    break;
                }
                Activation::Blocked => outcome = Activation::Blocked,
            }
        }

        // Backtrack: siblings see only their own ancestors.
        path.remove(argument.id.as_str());
        if outcome != Activation::Blocked {
            settled.insert(argument.id.as_str(), outcome);
        }
        outcome
    }

    /// Compute every valid argument id for the accepted axiom set.
    ///
    /// Total and deterministic: terminates on cyclic or dangling data and
    /// returns the same set for any ordering of `nodes`. When ids repeat,
    /// the first node with the id is the one evaluated.
    #[must_use]
    pub fn valid_arguments(
        &self,
        nodes: &[Node],
        accepted_axioms: &BTreeSet<NodeId>,
    ) -> BTreeSet<NodeId> {
        let mut index: BTreeMap<&str, &Node> = BTreeMap::new();
        for node in nodes {
            index.entry(node.id.as_str()).or_insert(node);
        }

        // Unproven argument dependencies per argument, by edge.
        let mut pending: BTreeMap<&str, usize> = BTreeMap::new();
        let mut dependants: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        let mut ready: Vec<&Node> = Vec::new();

        for argument in index.values().copied().filter(|n| n.is_argument()) {
            let mut argument_dependencies = Vec::new();
            let mut blocked = false;
            for edge in &argument.edges {
                match index.get(edge.to.as_str()) {
                    None => blocked = true,
                    Some(dependency) if dependency.is_axiom() => {
                        blocked |= !accepted_axioms.contains(&dependency.id);
                    }
                    Some(dependency) => argument_dependencies.push(dependency.id.as_str()),
                }
            }
            if blocked {
                continue;
            }

            if argument_dependencies.is_empty() {
                ready.push(argument);
            } else {
                pending.insert(argument.id.as_str(), argument_dependencies.len());
                for dependency in argument_dependencies {
                    dependants
                        .entry(dependency)
                        .or_default()
                        .push(argument.id.as_str());
                }
            }
        }

        let mut valid = BTreeSet::new();
        while let Some(argument) = ready.pop() {
            valid.insert(argument.id.clone());
            let Some(waiting) = dependants.get(argument.id.as_str()) else {
                continue;
            };
            for dependant in waiting {
                let Some(count) = pending.get_mut(dependant) else {
                    continue;
                };
                *count = count.saturating_sub(1);
                if *count == 0 {
                    pending.remove(dependant);
                    if let Some(node) = index.get(dependant) {
                        ready.push(*node);
                    }
                }
            }
        }

        valid
    }

    /// Evaluate a session state against a graph.
    ///
    /// Ids that are not axioms of `graph` are reported and ignored. An id
    /// listed as both accepted and rejected counts as rejected.
    #[must_use]
    pub fn evaluate(
        &self,
        graph: &Graph,
        accepted: &BTreeSet<NodeId>,
        rejected: &BTreeSet<NodeId>,
    ) -> Evaluation {
        let mut evaluation = Evaluation::default();

        for id in accepted.iter().chain(rejected) {
            if graph.axiom(id.as_str()).is_none() {
                evaluation.unknown_ids.insert(id.clone());
            }
        }

        evaluation.rejected_axioms = rejected
            .iter()
            .filter(|id| graph.axiom(id.as_str()).is_some())
            .cloned()
            .collect();
        evaluation.accepted_axioms = accepted
            .iter()
            .filter(|id| graph.axiom(id.as_str()).is_some())
            .filter(|id| !rejected.contains(*id))
            .cloned()
            .collect();
        evaluation.valid_arguments = self.valid_arguments(graph.nodes(), &evaluation.accepted_axioms);

        evaluation
    }
}

/// Convenience wrapper around [`ArgumentValidator::valid_arguments`].
#[must_use]
pub fn valid_arguments(nodes: &[Node], accepted_axioms: &BTreeSet<NodeId>) -> BTreeSet<NodeId> {
    ArgumentValidator::new().valid_arguments(nodes, accepted_axioms)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(list: &[&str]) -> BTreeSet<NodeId> {
        list.iter().map(|s| NodeId::new(*s)).collect()
    }

    #[test]
    fn argument_needs_accepted_axiom() {
        let nodes = vec![Node::new("ax1"), Node::new("arg1").depends_on("ax1")];

        assert!(valid_arguments(&nodes, &ids(&[])).is_empty());
        assert_eq!(valid_arguments(&nodes, &ids(&["ax1"])), ids(&["arg1"]));
    }

    #[test]
    fn validity_is_transitive() {
        let nodes = vec![
            Node::new("ax1"),
            Node::new("arg1").depends_on("ax1"),
            Node::new("arg2").depends_on("arg1"),
        ];
        assert_eq!(
            valid_arguments(&nodes, &ids(&["ax1"])),
            ids(&["arg1", "arg2"])
        );
    }

    #[test]
    fn order_of_nodes_does_not_matter() {
        let nodes = vec![
            Node::new("arg3").depends_on("arg2"),
            Node::new("arg2").depends_on("arg1"),
            Node::new("arg1").depends_on("ax1"),
            Node::new("ax1"),
        ];
        assert_eq!(
            valid_arguments(&nodes, &ids(&["ax1"])),
            ids(&["arg1", "arg2", "arg3"])
        );
    }

    #[test]
    fn every_dependency_must_hold() {
        let nodes = vec![
            Node::new("ax1"),
            Node::new("ax2"),
            Node::new("arg").depends_on("ax1").depends_on("ax2"),
        ];
        assert!(valid_arguments(&nodes, &ids(&["ax1"])).is_empty());
        assert_eq!(valid_arguments(&nodes, &ids(&["ax1", "ax2"])), ids(&["arg"]));
    }

    #[test]
    fn two_cycle_fails_closed() {
        let nodes = vec![
            Node::new("argA").depends_on("argB"),
            Node::new("argB").depends_on("argA"),
        ];
        assert!(valid_arguments(&nodes, &ids(&[])).is_empty());
    }

    #[test]
    fn self_loop_fails_closed() {
        let nodes = vec![Node::new("ax1"), Node::new("arg").depends_on("ax1").depends_on("arg")];
        assert!(valid_arguments(&nodes, &ids(&["ax1"])).is_empty());
    }

    #[test]
    fn cycle_with_axiom_base_still_fails() {
        let nodes = vec![
            Node::new("ax1"),
            Node::new("argA").depends_on("ax1").depends_on("argB"),
            Node::new("argB").depends_on("argA"),
        ];
        assert!(valid_arguments(&nodes, &ids(&["ax1"])).is_empty());
    }

    #[test]
    fn diamond_is_not_mistaken_for_cycle() {
        let nodes = vec![
            Node::new("ax"),
            Node::new("left").depends_on("ax"),
            Node::new("right").depends_on("ax"),
            Node::new("top").depends_on("left").depends_on("right"),
        ];
        assert_eq!(
            valid_arguments(&nodes, &ids(&["ax"])),
            ids(&["left", "right", "top"])
        );
    }

    #[test]
    fn dangling_edge_fails_closed() {
        let nodes = vec![Node::new("arg1").depends_on("nonexistent")];
        assert!(valid_arguments(&nodes, &ids(&[])).is_empty());
        assert!(valid_arguments(&nodes, &ids(&["nonexistent"])).is_empty());
    }

    #[test]
    fn dangling_edge_poisons_otherwise_valid_argument() {
        let nodes = vec![
            Node::new("ax1"),
            Node::new("arg").depends_on("ax1").depends_on("ghost"),
        ];
        assert!(valid_arguments(&nodes, &ids(&["ax1"])).is_empty());
    }

    #[test]
    fn node_without_edges_is_vacuously_activatable() {
        let nodes = vec![Node::new("lonely")];
        let accepted = ids(&[]);
        let valid = BTreeSet::new();
        let ctx = ValidationContext::new(&nodes, &accepted, &valid);
        assert!(ArgumentValidator::new().can_activate(&nodes[0], &ctx));
        // Still an axiom, so never reported as a valid argument.
        assert!(valid_arguments(&nodes, &accepted).is_empty());
    }

    /// `a_i` and `b_i` both depend on `a_{i-1}` and `b_{i-1}`.
    fn ladder(depth: usize) -> Vec<Node> {
        let mut nodes = vec![Node::new("a0"), Node::new("b0")];
        for i in 1..=depth {
            for side in ["a", "b"] {
                nodes.push(
                    Node::new(format!("{}{}", side, i))
                        .depends_on(format!("a{}", i - 1))
                        .depends_on(format!("b{}", i - 1)),
                );
            }
        }
        nodes
    }

    #[test]
    fn shared_dependencies_are_expanded_once() {
        let nodes = ladder(40);
        let valid = valid_arguments(&nodes, &ids(&["a0", "b0"]));
        assert_eq!(valid.len(), 80);

        let accepted = ids(&["a0", "b0"]);
        let none = BTreeSet::new();
        let ctx = ValidationContext::new(&nodes, &accepted, &none);
        let top = nodes.last().expect("top rung");
        assert!(ArgumentValidator::new().can_activate(top, &ctx));

        let half = ids(&["a0"]);
        let ctx = ValidationContext::new(&nodes, &half, &none);
        assert!(!ArgumentValidator::new().can_activate(top, &ctx));
        assert!(valid_arguments(&nodes, &half).is_empty());
    }

    #[test]
    fn repeated_edge_counts_once_released() {
        let nodes = vec![
            Node::new("ax"),
            Node::new("arg1").depends_on("ax"),
            Node::new("arg2").depends_on("arg1").depends_on("arg1"),
        ];
        assert_eq!(valid_arguments(&nodes, &ids(&["ax"])), ids(&["arg1", "arg2"]));
    }

    #[test]
    fn dependant_of_cycle_fails_closed() {
        let nodes = vec![
            Node::new("ax"),
            Node::new("argA").depends_on("argB"),
            Node::new("argB").depends_on("argA"),
            Node::new("top").depends_on("ax").depends_on("argA"),
        ];
        let accepted = ids(&["ax"]);
        assert!(valid_arguments(&nodes, &accepted).is_empty());

        let none = BTreeSet::new();
        let ctx = ValidationContext::new(&nodes, &accepted, &none);
        assert!(!ArgumentValidator::new().can_activate(&nodes[3], &ctx));
    }

    #[test]
    fn accepted_ids_that_are_not_axioms_are_ignored() {
        let nodes = vec![
            Node::new("ax1"),
            Node::new("arg1").depends_on("ax1"),
            Node::new("arg2").depends_on("arg1"),
        ];
        // Accepting an argument id directly does not make dependants valid.
        assert!(valid_arguments(&nodes, &ids(&["arg1"])).is_empty());
    }

    #[test]
    fn evaluate_reports_unknown_ids_and_rejections_win() {
        let graph = Graph::from_nodes(vec![
            Node::new("ax1"),
            Node::new("ax2"),
            Node::new("arg1").depends_on("ax1"),
        ]);
        let evaluation = ArgumentValidator::new().evaluate(
            &graph,
            &ids(&["ax1", "ax2", "ghost", "arg1"]),
            &ids(&["ax2"]),
        );

        assert_eq!(evaluation.accepted_axioms, ids(&["ax1"]));
        assert_eq!(evaluation.rejected_axioms, ids(&["ax2"]));
        assert_eq!(evaluation.unknown_ids, ids(&["arg1", "ghost"]));
        assert_eq!(evaluation.valid_arguments, ids(&["arg1"]));
    }
}
