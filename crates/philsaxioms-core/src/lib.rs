//! # philsaxioms-core
//!
//! The deterministic engine behind PhilsAxioms.
//!
//! A dataset is a directed graph of philosophical statements. Nodes with no
//! outgoing dependency edges are **axioms** (foundational premises a reader
//! accepts or rejects); every other node is an **argument** whose edges name
//! the statements it depends on.
//!
//! ## Engines
//!
//! - `validator`: given a set of accepted axioms, which arguments are
//!   supported all the way down to accepted axioms
//! - `layout`: dependency levels and layered 2-D coordinates
//! - `diagnostics`: the authoring-time consistency report
//!
//! ## Architectural Constraints
//!
//! - Pure Rust: no async, no network, no file I/O
//! - Deterministic: ordered collections only, integer coordinates
//! - Total: dangling edges, cycles and duplicates degrade results, they
//!   never abort an evaluation

// =============================================================================
// MODULES
// =============================================================================

pub mod diagnostics;
pub mod formats;
pub mod graph;
pub mod ingestor;
pub mod layout;
pub mod primitives;
pub mod questionnaire;
pub mod types;
pub mod validator;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{AxiomCategory, AxiomsError, GraphData, Node, NodeEdge, NodeId, NodeKind, Position};

// =============================================================================
// RE-EXPORTS: Engines
// =============================================================================

pub use diagnostics::{DanglingEdge, Report, Summary, UnknownCategory, check};
pub use graph::{Connection, Direction, Graph};
pub use ingestor::Ingestor;
pub use layout::{
    Layout, LayoutConfig, LayoutNode, LevelAssignment, compute_levels, hierarchical_layout,
};
pub use questionnaire::{QuestionnaireItem, build_questionnaire};
pub use validator::{ArgumentValidator, Evaluation, ValidationContext, valid_arguments};

// =============================================================================
// RE-EXPORTS: Formats (from formats module)
// =============================================================================

pub use formats::{
    StaticBundle, build_static_bundle, dataset_checksum, graph_data_from_json, graph_data_to_json,
    nodes_to_yaml, parse_categories_yaml, parse_nodes_yaml,
};
