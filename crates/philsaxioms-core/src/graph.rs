//! # Graph Model
//!
//! An indexed, insertion-ordered view over a [`GraphData`] snapshot.
//!
//! Node order is the authored order and is preserved everywhere: it is the
//! tie-breaker the layout engine uses inside a level, so re-renders of the
//! same data stay visually stable. The id index is a `BTreeMap` for
//! deterministic lookups.

use crate::{AxiomCategory, AxiomsError, GraphData, Node, NodeId, NodeKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =============================================================================
// CONNECTIONS
// =============================================================================

/// Which way a connection points relative to the queried node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Another node depends on the queried node.
    Incoming,
    /// The queried node depends on this node.
    Outgoing,
}

/// A neighbour of a node together with the direction of the link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    pub node: Node,
    pub direction: Direction,
}

// =============================================================================
// GRAPH
// =============================================================================

/// The main Graph structure.
///
/// Read-only input to the engines. Rebuilt wholesale whenever the data
/// layer reloads; the two mutators exist for the authoring endpoints.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    /// Nodes in authored order.
    nodes: Vec<Node>,

    /// Reverse lookup: NodeId -> position in `nodes`
    index: BTreeMap<NodeId, usize>,

    categories: Vec<AxiomCategory>,

    /// Ids that appeared more than once in the input; later copies are dropped.
    duplicates: Vec<NodeId>,
}

impl Graph {
    /// Create a new empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from a dataset. The first occurrence of an id wins.
    #[must_use]
    pub fn from_data(data: GraphData) -> Self {
        let mut graph = Self {
            categories: data.categories,
            ..Self::default()
        };
        for node in data.nodes {
            if graph.index.contains_key(&node.id) {
                graph.duplicates.push(node.id);
                continue;
            }
            graph.index.insert(node.id.clone(), graph.nodes.len());
            graph.nodes.push(node);
        }
        graph
    }

    /// Build a graph from bare nodes with no category table.
    #[must_use]
    pub fn from_nodes(nodes: Vec<Node>) -> Self {
        Self::from_data(GraphData {
            nodes,
            categories: Vec::new(),
        })
    }

    /// Convert back into the served dataset shape.
    #[must_use]
    pub fn to_data(&self) -> GraphData {
        GraphData {
            nodes: self.nodes.clone(),
            categories: self.categories.clone(),
        }
    }

    /// All nodes in authored order.
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    #[must_use]
    pub fn categories(&self) -> &[AxiomCategory] {
        &self.categories
    }

    /// Ids dropped by `from_data` because they were already present.
    #[must_use]
    pub fn duplicate_ids(&self) -> &[NodeId] {
        &self.duplicates
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Lookup a node by id.
    #[must_use]
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.index.get(id).and_then(|&i| self.nodes.get(i))
    }

    /// Lookup a node by id, only if it is an axiom.
    #[must_use]
    pub fn axiom(&self, id: &str) -> Option<&Node> {
        self.node(id).filter(|n| n.kind() == NodeKind::Axiom)
    }

    /// Lookup a node by id, only if it is an argument.
    #[must_use]
    pub fn argument(&self, id: &str) -> Option<&Node> {
        self.node(id).filter(|n| n.kind() == NodeKind::Argument)
    }

    /// All axioms in authored order.
    pub fn axioms(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(|n| n.is_axiom())
    }

    /// All arguments in authored order.
    pub fn arguments(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(|n| n.is_argument())
    }

    /// Axioms belonging to the given category.
    pub fn axioms_by_category<'a>(&'a self, category: &'a str) -> impl Iterator<Item = &'a Node> {
        self.axioms().filter(move |n| n.category == category)
    }

    #[must_use]
    pub fn category(&self, id: &str) -> Option<&AxiomCategory> {
        self.categories.iter().find(|c| c.id == id)
    }

    /// Total number of dependency edges, dangling ones included.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.nodes.iter().map(|n| n.edges.len()).sum()
    }

    /// Outgoing then incoming neighbours of a node.
    ///
    /// Outgoing entries follow the node's edge order and skip dangling
    /// targets. Incoming entries follow authored node order. Unknown ids
    /// yield an empty list.
    #[must_use]
    pub fn connections(&self, id: &str) -> Vec<Connection> {
        let mut result = Vec::new();

        if let Some(source) = self.node(id) {
            for target in source.dependencies() {
                if let Some(node) = self.node(target.as_str()) {
                    result.push(Connection {
                        node: node.clone(),
                        direction: Direction::Outgoing,
                    });
                }
            }
        }

        for node in &self.nodes {
            for edge in &node.edges {
                if edge.to.as_str() == id {
                    result.push(Connection {
                        node: node.clone(),
                        direction: Direction::Incoming,
                    });
                }
            }
        }

        result
    }

    /// Append a node. Fails if the id is already taken.
    pub fn insert_node(&mut self, node: Node) -> Result<(), AxiomsError> {
        if self.index.contains_key(&node.id) {
            return Err(AxiomsError::DuplicateNode(node.id));
        }
        self.index.insert(node.id.clone(), self.nodes.len());
        self.nodes.push(node);
        Ok(())
    }

    /// Remove a node and every edge pointing at it.
    ///
    /// Arguments whose only dependency was the removed node become axioms;
    /// the classification is re-derived, never patched.
    pub fn remove_node(&mut self, id: &str) -> Result<Node, AxiomsError> {
        let Some(position) = self.index.get(id).copied() else {
            return Err(AxiomsError::NodeNotFound(NodeId::new(id)));
        };

        let removed = self.nodes.remove(position);
        for node in &mut self.nodes {
            node.edges.retain(|e| e.to.as_str() != id);
        }
        self.reindex();

        Ok(removed)
    }

    fn reindex(&mut self) {
        self.index = self
            .nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.id.clone(), i))
            .collect();
    }
}

impl From<GraphData> for Graph {
    fn from(data: GraphData) -> Self {
        Self::from_data(data)
    }
}

impl From<&Graph> for GraphData {
    fn from(graph: &Graph) -> Self {
        graph.to_data()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Graph {
        Graph::from_nodes(vec![
            Node::new("ax1").with_category("ethics"),
            Node::new("ax2").with_category("epistemology"),
            Node::new("arg1").depends_on("ax1"),
            Node::new("arg2").depends_on("arg1").depends_on("ax2"),
        ])
    }

    #[test]
    fn lookup_preserves_authored_order() {
        let graph = sample();
        let ids: Vec<_> = graph.nodes().iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["ax1", "ax2", "arg1", "arg2"]);
        assert!(graph.contains("arg2"));
        assert!(graph.node("missing").is_none());
    }

    #[test]
    fn axiom_and_argument_lookups_filter_by_kind() {
        let graph = sample();
        assert!(graph.axiom("ax1").is_some());
        assert!(graph.axiom("arg1").is_none());
        assert!(graph.argument("arg1").is_some());
        assert!(graph.argument("ax1").is_none());
        assert_eq!(graph.axioms().count(), 2);
        assert_eq!(graph.arguments().count(), 2);
    }

    #[test]
    fn axioms_by_category() {
        let graph = sample();
        let ethics: Vec<_> = graph.axioms_by_category("ethics").collect();
        assert_eq!(ethics.len(), 1);
        assert_eq!(ethics[0].id.as_str(), "ax1");
    }

    #[test]
    fn duplicate_ids_keep_first_occurrence() {
        let graph = Graph::from_nodes(vec![
            Node::new("a").with_title("first"),
            Node::new("a").with_title("second"),
        ]);
        assert_eq!(graph.len(), 1);
        assert_eq!(graph.node("a").map(|n| n.title.as_str()), Some("first"));
        assert_eq!(graph.duplicate_ids(), &[NodeId::new("a")]);
    }

    #[test]
    fn connections_list_outgoing_then_incoming() {
        let graph = sample();
        let connections = graph.connections("arg1");
        assert_eq!(connections.len(), 2);
        assert_eq!(connections[0].node.id.as_str(), "ax1");
        assert_eq!(connections[0].direction, Direction::Outgoing);
        assert_eq!(connections[1].node.id.as_str(), "arg2");
        assert_eq!(connections[1].direction, Direction::Incoming);
    }

    #[test]
    fn connections_skip_dangling_targets() {
        let graph = Graph::from_nodes(vec![Node::new("arg").depends_on("ghost")]);
        assert!(graph.connections("arg").is_empty());
    }

    #[test]
    fn insert_rejects_duplicates() {
        let mut graph = sample();
        let result = graph.insert_node(Node::new("ax1"));
        assert!(matches!(result, Err(AxiomsError::DuplicateNode(_))));
        graph.insert_node(Node::new("ax3")).expect("insert");
        assert_eq!(graph.len(), 5);
    }

    #[test]
    fn remove_strips_incoming_edges() {
        let mut graph = sample();
        graph.remove_node("arg1").expect("remove");

        assert!(!graph.contains("arg1"));
        let arg2 = graph.node("arg2").expect("arg2");
        assert_eq!(arg2.edges.len(), 1);
        assert_eq!(arg2.edges[0].to.as_str(), "ax2");
        // Index still resolves after the shift.
        assert_eq!(graph.node("arg2").map(|n| n.id.as_str()), Some("arg2"));
    }

    #[test]
    fn remove_can_demote_argument_to_axiom() {
        let mut graph = sample();
        graph.remove_node("ax1").expect("remove");
        assert!(graph.axiom("arg1").is_some());
    }

    #[test]
    fn remove_missing_node_fails() {
        let mut graph = sample();
        assert!(matches!(
            graph.remove_node("nope"),
            Err(AxiomsError::NodeNotFound(_))
        ));
    }
}
