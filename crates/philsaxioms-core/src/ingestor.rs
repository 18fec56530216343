//! # Ingestor Module
//!
//! Boundary validation for authored nodes entering a graph.
//!
//! - Reject nodes missing an id, title or description
//! - Reject oversized fields
//! - Refuse duplicate ids
//! - No enrichment: dangling edges and cycles are accepted here and
//!   surface later in the diagnostics report

use crate::graph::Graph;
use crate::primitives::{MAX_EDGES_PER_NODE, MAX_NODE_ID_LENGTH, MAX_TEXT_LENGTH, MAX_TITLE_LENGTH};
use crate::{AxiomsError, Node, NodeId};

/// The Ingestor validates authored nodes and inserts them into a graph.
pub struct Ingestor;

impl Ingestor {
    /// Validate a node.
    ///
    /// A node is valid if:
    /// - id, title and description are non-empty (after trimming)
    /// - every field is within its length limit
    /// - it has at most `MAX_EDGES_PER_NODE` edges, none with an empty target
    pub fn validate(node: &Node) -> Result<(), AxiomsError> {
        let id = node.id.as_str();

        if id.trim().is_empty() || node.title.trim().is_empty() || node.description.trim().is_empty()
        {
            return Err(AxiomsError::InvalidNode(
                "Missing required fields: id, title, description".to_string(),
            ));
        }

        if id.len() > MAX_NODE_ID_LENGTH {
            return Err(AxiomsError::InvalidNode(format!(
                "id length {} exceeds maximum {}",
                id.len(),
                MAX_NODE_ID_LENGTH
            )));
        }

        if node.title.len() > MAX_TITLE_LENGTH {
            return Err(AxiomsError::InvalidNode(format!(
                "title length {} exceeds maximum {}",
                node.title.len(),
                MAX_TITLE_LENGTH
            )));
        }

        let longest_text = [
            node.description.len(),
            node.conclusion.as_ref().map_or(0, String::len),
        ]
        .into_iter()
        .chain(node.edges.iter().map(|e| e.description.len()))
        .max()
        .unwrap_or(0);
        if longest_text > MAX_TEXT_LENGTH {
            return Err(AxiomsError::InvalidNode(format!(
                "text length {} exceeds maximum {}",
                longest_text, MAX_TEXT_LENGTH
            )));
        }

        if node.edges.len() > MAX_EDGES_PER_NODE {
            return Err(AxiomsError::InvalidNode(format!(
                "{} edges exceeds maximum {}",
                node.edges.len(),
                MAX_EDGES_PER_NODE
            )));
        }

        if node.edges.iter().any(|e| e.to.as_str().trim().is_empty()) {
            return Err(AxiomsError::InvalidNode(
                "edge target must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Validate and append a node to the graph.
    pub fn ingest_node(graph: &mut Graph, node: Node) -> Result<NodeId, AxiomsError> {
        Self::validate(&node)?;
        let id = node.id.clone();
        graph.insert_node(node)?;
        Ok(id)
    }

    /// Check whether a node with the same id is already present.
    #[must_use]
    pub fn is_duplicate(graph: &Graph, node: &Node) -> bool {
        graph.contains(node.id.as_str())
    }

    /// Validate and append a node to an authored node list.
    ///
    /// Existing entries are kept exactly as written, repeated ids included,
    /// so the list can be written back without losing anything.
    pub fn append_node(nodes: &mut Vec<Node>, node: Node) -> Result<NodeId, AxiomsError> {
        Self::validate(&node)?;
        if nodes.iter().any(|n| n.id == node.id) {
            return Err(AxiomsError::DuplicateNode(node.id));
        }
        let id = node.id.clone();
        nodes.push(node);
        Ok(id)
    }

    /// Remove every entry with `id` from an authored node list, and every
    /// edge pointing at it. Returns the first removed entry.
    pub fn retract_node(nodes: &mut Vec<Node>, id: &str) -> Result<Node, AxiomsError> {
        let Some(position) = nodes.iter().position(|n| n.id.as_str() == id) else {
            return Err(AxiomsError::NodeNotFound(NodeId::new(id)));
        };
        let removed = nodes.remove(position);
        nodes.retain(|n| n.id.as_str() != id);
        for node in nodes.iter_mut() {
            node.edges.retain(|e| e.to.as_str() != id);
        }
        Ok(removed)
    }
}
