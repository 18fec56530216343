//! # Diagnostics
//!
//! Authoring-time consistency report over a dataset.
//!
//! The engines tolerate bad data by degrading their output. This module is
//! where the same problems are named so a content author can fix them:
//!
//! | Finding | Severity |
//! |---------|----------|
//! | Edge target missing | error |
//! | Duplicate node id | error |
//! | Dependency cycle | error |
//! | Category not in table | warning |
//! | Argument with no path to any axiom | warning |
//! | Node placed at the fallback level | warning |

use crate::layout::compute_levels;
use crate::validator::ArgumentValidator;
use crate::{Graph, Node, NodeId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

// =============================================================================
// REPORT TYPES
// =============================================================================

/// An edge whose target does not exist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DanglingEdge {
    pub from: NodeId,
    pub to: NodeId,
}

/// A node referencing a category missing from the category table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnknownCategory {
    pub node: NodeId,
    pub category: String,
}

/// Dataset counts.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub axioms: usize,
    pub arguments: usize,
    pub edges: usize,
    pub categories: usize,
    /// Arguments that become valid when every axiom is accepted.
    pub activatable_with_all_axioms: usize,
}

/// Full consistency report.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub dangling_edges: Vec<DanglingEdge>,
    pub duplicate_ids: Vec<NodeId>,
    pub unknown_categories: Vec<UnknownCategory>,
    /// Each entry is one strongly connected group of mutually dependent nodes.
    pub cycles: Vec<Vec<NodeId>>,
    pub orphaned_arguments: Vec<NodeId>,
    pub fallback_leveled: Vec<NodeId>,
    pub summary: Summary,
}

// =============================================================================
// CHECKS
// =============================================================================

/// Run every consistency check over the graph.
#[must_use]
pub fn check(graph: &Graph) -> Report {
    let mut report = Report {
        dangling_edges: dangling_edges(graph),
        duplicate_ids: graph.duplicate_ids().to_vec(),
        unknown_categories: unknown_categories(graph),
        cycles: dependency_cycles(graph.nodes()),
        orphaned_arguments: orphaned_arguments(graph),
        fallback_leveled: compute_levels(graph.nodes()).fallback.into_iter().collect(),
        summary: summarize(graph),
        ..Report::default()
    };

    for edge in &report.dangling_edges {
        report.errors.push(format!(
            "Node {} depends on non-existent node: {}",
            edge.from, edge.to
        ));
    }
    for id in &report.duplicate_ids {
        report.errors.push(format!("Duplicate node id: {}", id));
    }
    for cycle in &report.cycles {
        let members: Vec<&str> = cycle.iter().map(NodeId::as_str).collect();
        report.errors.push(format!(
            "Circular dependency detected involving: {}",
            members.join(", ")
        ));
    }
    for unknown in &report.unknown_categories {
        report.warnings.push(format!(
            "Node {} references unknown category: {}",
            unknown.node, unknown.category
        ));
    }
    for id in &report.orphaned_arguments {
        report
            .warnings
            .push(format!("Argument {} has no dependency path to any axiom", id));
    }
    for id in &report.fallback_leveled {
        report
            .warnings
            .push(format!("Node {} was placed at the fallback level", id));
    }

    report.is_valid = report.errors.is_empty();
    report
}

fn dangling_edges(graph: &Graph) -> Vec<DanglingEdge> {
    graph
        .nodes()
        .iter()
        .flat_map(|node| {
            node.dependencies()
                .filter(|target| !graph.contains(target.as_str()))
                .map(|target| DanglingEdge {
                    from: node.id.clone(),
                    to: target.clone(),
                })
        })
        .collect()
}

fn unknown_categories(graph: &Graph) -> Vec<UnknownCategory> {
    graph
        .nodes()
        .iter()
        .filter(|n| !n.category.is_empty() && graph.category(&n.category).is_none())
        .map(|n| UnknownCategory {
            node: n.id.clone(),
            category: n.category.clone(),
        })
        .collect()
}

/// Arguments with no resolved dependency chain ending at an axiom.
fn orphaned_arguments(graph: &Graph) -> Vec<NodeId> {
    let mut grounded: BTreeSet<&str> = graph.axioms().map(|n| n.id.as_str()).collect();

    let mut changed = true;
    while changed {
        changed = false;
        for argument in graph.arguments() {
            if grounded.contains(argument.id.as_str()) {
                continue;
            }
            if argument
                .dependencies()
                .any(|d| grounded.contains(d.as_str()))
            {
                grounded.insert(argument.id.as_str());
                changed = true;
            }
        }
    }

    graph
        .arguments()
        .filter(|a| !grounded.contains(a.id.as_str()))
        .map(|a| a.id.clone())
        .collect()
}

fn summarize(graph: &Graph) -> Summary {
    let all_axioms: BTreeSet<NodeId> = graph.axioms().map(|n| n.id.clone()).collect();
    Summary {
        axioms: all_axioms.len(),
        arguments: graph.arguments().count(),
        edges: graph.edge_count(),
        categories: graph.categories().len(),
        activatable_with_all_axioms: ArgumentValidator::new()
            .valid_arguments(graph.nodes(), &all_axioms)
            .len(),
    }
}

// =============================================================================
// CYCLE DETECTION (Tarjan)
// =============================================================================

struct Tarjan<'a> {
    adjacency: BTreeMap<&'a str, Vec<&'a str>>,
    index: BTreeMap<&'a str, usize>,
    lowlink: BTreeMap<&'a str, usize>,
    stack: Vec<&'a str>,
    on_stack: BTreeSet<&'a str>,
    next_index: usize,
    components: Vec<Vec<&'a str>>,
}

impl<'a> Tarjan<'a> {
    fn visit(&mut self, v: &'a str) {
        self.index.insert(v, self.next_index);
        self.lowlink.insert(v, self.next_index);
        self.next_index = self.next_index.saturating_add(1);
        self.stack.push(v);
        self.on_stack.insert(v);

        let successors = self.adjacency.get(v).cloned().unwrap_or_default();
        for w in successors {
            if !self.index.contains_key(w) {
                self.visit(w);
                let low = self.lowlink[v].min(self.lowlink[w]);
                self.lowlink.insert(v, low);
            } else if self.on_stack.contains(w) {
                let low = self.lowlink[v].min(self.index[w]);
                self.lowlink.insert(v, low);
            }
        }

        if self.lowlink[v] == self.index[v] {
            let mut component = Vec::new();
            while let Some(w) = self.stack.pop() {
                self.on_stack.remove(w);
                component.push(w);
                if w == v {
                    break;
                }
            }
            self.components.push(component);
        }
    }
}

/// Groups of nodes that depend on each other, including self-loops.
///
/// Members of each group follow authored order; groups are ordered by
/// their first member.
#[must_use]
pub fn dependency_cycles(nodes: &[Node]) -> Vec<Vec<NodeId>> {
    let mut order: BTreeMap<&str, usize> = BTreeMap::new();
    for (i, node) in nodes.iter().enumerate() {
        order.entry(node.id.as_str()).or_insert(i);
    }

    let mut adjacency: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for node in nodes {
        if adjacency.contains_key(node.id.as_str()) {
            continue;
        }
        let targets = node
            .dependencies()
            .map(NodeId::as_str)
            .filter(|t| order.contains_key(t))
            .collect();
        adjacency.insert(node.id.as_str(), targets);
    }

    let mut tarjan = Tarjan {
        adjacency,
        index: BTreeMap::new(),
        lowlink: BTreeMap::new(),
        stack: Vec::new(),
        on_stack: BTreeSet::new(),
        next_index: 0,
        components: Vec::new(),
    };
    let roots: Vec<&str> = tarjan.adjacency.keys().copied().collect();
    for root in roots {
        if !tarjan.index.contains_key(root) {
            tarjan.visit(root);
        }
    }

    let is_self_loop = |id: &str| {
        tarjan
            .adjacency
            .get(id)
            .is_some_and(|targets| targets.contains(&id))
    };

    let mut cycles: Vec<Vec<&str>> = tarjan
        .components
        .iter()
        .filter(|c| c.len() > 1 || c.first().is_some_and(|id| is_self_loop(id)))
        .cloned()
        .collect();
    for cycle in &mut cycles {
        cycle.sort_by_key(|id| order.get(id).copied().unwrap_or(usize::MAX));
    }
    cycles.sort_by_key(|c| c.first().and_then(|id| order.get(id).copied()));

    cycles
        .into_iter()
        .map(|c| c.into_iter().map(NodeId::new).collect())
        .collect()
}

// =============================================================================
// TESTS
// =============================================================================
