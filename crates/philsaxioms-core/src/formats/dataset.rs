//! # Dataset Format
//!
//! The authored dataset lives in two YAML documents:
//!
//! ```yaml
//! # categories.yaml
//! categories:
//!   - { id: ethics, name: Ethics, color: "#EF4444" }
//!
//! # nodes.yaml
//! nodes:
//!   - id: ax1
//!     title: Moral realism
//!     description: ...
//!     category: ethics
//!     edges: []
//! ```
//!
//! The same data is served, and pre-baked for the static front end, as JSON
//! (`graph-data.json` and `questionnaire.json`).
//!
//! ## Checksums
//!
//! [`dataset_checksum`] fingerprints the canonical JSON rendering. With the
//! `crypto-hash` feature it is BLAKE3; otherwise a 64-bit FNV-1a digest.

use crate::questionnaire::{QuestionnaireItem, build_questionnaire};
use crate::{AxiomCategory, AxiomsError, Graph, GraphData, Node};
use serde::{Deserialize, Serialize};

/// File name of the category table inside the data directory.
pub const CATEGORIES_FILE: &str = "categories.yaml";

/// File name of the node list inside the data directory.
pub const NODES_FILE: &str = "nodes.yaml";

/// File name of the pre-baked graph dataset.
pub const STATIC_GRAPH_FILE: &str = "graph-data.json";

/// File name of the pre-baked questionnaire.
pub const STATIC_QUESTIONNAIRE_FILE: &str = "questionnaire.json";

// =============================================================================
// YAML DOCUMENTS
// =============================================================================

/// `nodes.yaml` document. A missing or null `nodes` key is an empty list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodesDocument {
    #[serde(default)]
    pub nodes: Option<Vec<Node>>,
}

/// `categories.yaml` document. A missing or null `categories` key is an empty list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CategoriesDocument {
    #[serde(default)]
    pub categories: Option<Vec<AxiomCategory>>,
}

fn parse_yaml_document<T>(content: &str, what: &str) -> Result<T, AxiomsError>
where
    T: for<'de> Deserialize<'de> + Default,
{
    if content.trim().is_empty() {
        return Ok(T::default());
    }
    serde_yaml::from_str(content)
        .map_err(|e| AxiomsError::Parse(format!("{}: {}", what, e)))
}

/// Parse the contents of `nodes.yaml`.
pub fn parse_nodes_yaml(content: &str) -> Result<Vec<Node>, AxiomsError> {
    let document: NodesDocument = parse_yaml_document(content, NODES_FILE)?;
    Ok(document.nodes.unwrap_or_default())
}

/// Parse the contents of `categories.yaml`.
pub fn parse_categories_yaml(content: &str) -> Result<Vec<AxiomCategory>, AxiomsError> {
    let document: CategoriesDocument = parse_yaml_document(content, CATEGORIES_FILE)?;
    Ok(document.categories.unwrap_or_default())
}

/// Render a node list back to the `nodes.yaml` shape.
pub fn nodes_to_yaml(nodes: &[Node]) -> Result<String, AxiomsError> {
    let document = NodesDocument {
        nodes: Some(nodes.to_vec()),
    };
    serde_yaml::to_string(&document).map_err(|e| AxiomsError::Serialization(e.to_string()))
}

// =============================================================================
// JSON
// =============================================================================

/// Parse a served or pre-baked `GraphData` JSON document.
pub fn graph_data_from_json(content: &str) -> Result<GraphData, AxiomsError> {
    serde_json::from_str(content).map_err(|e| AxiomsError::Parse(format!("graph data: {}", e)))
}

/// Canonical compact JSON rendering of a dataset.
pub fn graph_data_to_json(data: &GraphData) -> Result<String, AxiomsError> {
    serde_json::to_string(data).map_err(|e| AxiomsError::Serialization(e.to_string()))
}

/// The two files consumed by the static front end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticBundle {
    /// Pretty-printed `GraphData`.
    pub graph_data: String,
    /// Pretty-printed questionnaire item list.
    pub questionnaire: String,
}

/// Render the static bundle for a graph.
pub fn build_static_bundle(graph: &Graph) -> Result<StaticBundle, AxiomsError> {
    let questionnaire: Vec<QuestionnaireItem> = build_questionnaire(graph);
    let graph_data = serde_json::to_string_pretty(&graph.to_data())
        .map_err(|e| AxiomsError::Serialization(e.to_string()))?;
    let questionnaire = serde_json::to_string_pretty(&questionnaire)
        .map_err(|e| AxiomsError::Serialization(e.to_string()))?;
    Ok(StaticBundle {
        graph_data,
        questionnaire,
    })
}

// =============================================================================
// CHECKSUM
// =============================================================================

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0100_0000_01b3;

#[cfg(not(feature = "crypto-hash"))]
fn digest_hex(bytes: &[u8]) -> String {
    format!("{:016x}", fnv1a(bytes))
}

#[cfg(feature = "crypto-hash")]
fn digest_hex(bytes: &[u8]) -> String {
    blake3::hash(bytes).to_hex().to_string()
}

/// 64-bit FNV-1a over `bytes`.
#[must_use]
pub fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV_OFFSET_BASIS, |hash, byte| {
        (hash ^ u64::from(*byte)).wrapping_mul(FNV_PRIME)
    })
}

/// Deterministic fingerprint of a dataset, as lowercase hex.
///
/// Equal datasets always share a checksum, so it is safe to key cached
/// engine results on it.
#[must_use]
pub fn dataset_checksum(data: &GraphData) -> String {
    let canonical = graph_data_to_json(data).unwrap_or_default();
    digest_hex(canonical.as_bytes())
}

// =============================================================================
// TESTS
// =============================================================================
