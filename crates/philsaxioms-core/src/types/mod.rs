//! # Core Type Definitions
//!
//! This module contains the graph model shared by every PhilsAxioms component:
//! - Identifiers (`NodeId`)
//! - Graph vertices and dependency links (`Node`, `NodeEdge`)
//! - The derived classification (`NodeKind`)
//! - Presentation grouping (`AxiomCategory`) and the served dataset (`GraphData`)
//! - Error types (`AxiomsError`)
//!
//! ## The Derived-Type Invariant
//!
//! A node is an **axiom** iff its edge list is empty, otherwise it is an
//! **argument**. There is no stored type tag. [`Node::kind`] is the single
//! place this is decided; the validator, the layout engine, the diagnostics
//! and the HTTP layer all go through it.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Unique, session-stable identifier of a graph node.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl NodeId {
    /// Create a new node identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::borrow::Borrow<str> for NodeId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

// =============================================================================
// NODE KIND
// =============================================================================

/// Derived classification of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// No outgoing dependency edges: a foundational claim the user accepts or rejects.
    Axiom,
    /// At least one outgoing dependency edge: validity is derived.
    Argument,
}

impl NodeKind {
    /// Lowercase wire name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Axiom => "axiom",
            NodeKind::Argument => "argument",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// EDGES
// =============================================================================

/// Directed dependency link: the owning node builds upon `to`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeEdge {
    /// Target node this node depends on.
    pub to: NodeId,
    /// Human-readable explanation of the relation.
    #[serde(default)]
    pub description: String,
}

impl NodeEdge {
    /// Create a new edge.
    #[must_use]
    pub fn new(to: impl Into<NodeId>, description: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            description: description.into(),
        }
    }

    /// Create an edge with an empty description.
    #[must_use]
    pub fn to(to: impl Into<NodeId>) -> Self {
        Self::new(to, "")
    }
}

// =============================================================================
// NODE
// =============================================================================

/// Author-pinned coordinate, passed through to the front end untouched.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// A graph vertex: either an axiom or an argument, depending on its edges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    /// Outgoing dependency links, in authored order.
    #[serde(default)]
    pub edges: Vec<NodeEdge>,
    /// Conventionally present on arguments only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conclusion: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
}

impl Node {
    /// Create a node with the given id and no edges (an axiom).
    #[must_use]
    pub fn new(id: impl Into<NodeId>) -> Self {
        Self {
            id: id.into(),
            title: String::new(),
            description: String::new(),
            category: String::new(),
            edges: Vec::new(),
            conclusion: None,
            position: None,
        }
    }

    /// Builder: set title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Builder: set description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Builder: set category.
    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Builder: set conclusion.
    #[must_use]
    pub fn with_conclusion(mut self, conclusion: impl Into<String>) -> Self {
        self.conclusion = Some(conclusion.into());
        self
    }

    /// Builder: append a dependency edge on `to`.
    #[must_use]
    pub fn depends_on(mut self, to: impl Into<NodeId>) -> Self {
        self.edges.push(NodeEdge::to(to));
        self
    }

    /// The derived classification. This is the only place it is computed.
    #[must_use]
    pub fn kind(&self) -> NodeKind {
        if self.edges.is_empty() {
            NodeKind::Axiom
        } else {
            NodeKind::Argument
        }
    }

    #[must_use]
    pub fn is_axiom(&self) -> bool {
        self.kind() == NodeKind::Axiom
    }

    #[must_use]
    pub fn is_argument(&self) -> bool {
        self.kind() == NodeKind::Argument
    }

    /// Ids of the nodes this node depends on, in authored order.
    pub fn dependencies(&self) -> impl Iterator<Item = &NodeId> {
        self.edges.iter().map(|e| &e.to)
    }
}

// =============================================================================
// CATEGORIES & DATASET
// =============================================================================

/// Presentational grouping referenced by `Node::category`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxiomCategory {
    pub id: String,
    pub name: String,
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// The full dataset handed from the data layer to the engines and the front end.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GraphData {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub categories: Vec<AxiomCategory>,
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the PhilsAxioms core.
///
/// The engines themselves never return these for malformed graph data;
/// dangling edges and cycles degrade the output instead. Errors are for
/// broken caller contracts and unparsable input.
#[derive(Debug, Error)]
pub enum AxiomsError {
    /// The requested node was not found in the graph.
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    /// A node with this id already exists.
    #[error("Node already exists: {0}")]
    DuplicateNode(NodeId),

    /// A node failed boundary validation (empty id, title, description...).
    #[error("Invalid node: {0}")]
    InvalidNode(String),

    /// Layout or engine configuration is unusable.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The dataset text could not be parsed.
    #[error("Parse error: {0}")]
    Parse(String),

    /// A serialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

// =============================================================================
// TESTS
// =============================================================================
