//! # API Request/Response Types
//!
//! This module defines the JSON structures for the HTTP API. Field names
//! are camelCase on the wire.

use chrono::{DateTime, Utc};
use philsaxioms_core::{AxiomCategory, Node, NodeId, primitives::MAX_SELECTION_SIZE};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// =============================================================================
// GENERIC RESPONSES
// =============================================================================

/// Error body for every non-2xx response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Response of `POST /api/nodes`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeCreatedResponse {
    pub message: String,
    pub node: Node,
}

// =============================================================================
// SERVICE RESPONSES
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: DateTime<Utc>,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: Utc::now(),
        }
    }
}

/// Response of `GET /api`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceInfo {
    pub name: String,
    pub version: String,
    pub endpoints: Vec<String>,
}

// =============================================================================
// SESSIONS
// =============================================================================

/// A reader's accept/reject state. Held in memory only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSession {
    pub id: String,
    pub accepted_axioms: Vec<NodeId>,
    pub rejected_axioms: Vec<NodeId>,
    pub explored_connections: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of `POST /api/sessions`. Both lists default to empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateSessionRequest {
    pub accepted_axioms: Vec<NodeId>,
    pub rejected_axioms: Vec<NodeId>,
}

/// Body of `PUT /api/sessions/:id`. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateSessionRequest {
    pub accepted_axioms: Option<Vec<NodeId>>,
    pub rejected_axioms: Option<Vec<NodeId>>,
    pub explored_connections: Option<Vec<String>>,
}

impl UserSession {
    #[must_use]
    pub fn new(id: String, request: CreateSessionRequest) -> Self {
        let now = Utc::now();
        Self {
            id,
            accepted_axioms: request.accepted_axioms,
            rejected_axioms: request.rejected_axioms,
            explored_connections: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply(&mut self, update: UpdateSessionRequest) {
        if let Some(accepted) = update.accepted_axioms {
            self.accepted_axioms = accepted;
        }
        if let Some(rejected) = update.rejected_axioms {
            self.rejected_axioms = rejected;
        }
        if let Some(explored) = update.explored_connections {
            self.explored_connections = explored;
        }
        self.updated_at = Utc::now();
    }
}

// =============================================================================
// EVALUATION
// =============================================================================

/// Body of `POST /api/evaluate`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateRequest {
    pub accepted_axioms: BTreeSet<NodeId>,
    #[serde(default)]
    pub rejected_axioms: BTreeSet<NodeId>,
}

impl EvaluateRequest {
    /// Reject oversized selections and ids listed on both sides.
    pub fn validate(&self) -> Result<(), String> {
        check_selection(&self.accepted_axioms, &self.rejected_axioms)
    }
}

/// Shared selection check for evaluate requests and stored sessions.
pub fn check_selection(
    accepted: &BTreeSet<NodeId>,
    rejected: &BTreeSet<NodeId>,
) -> Result<(), String> {
    let size = accepted.len().saturating_add(rejected.len());
    if size > MAX_SELECTION_SIZE {
        return Err(format!(
            "Selection of {} ids exceeds maximum {}",
            size, MAX_SELECTION_SIZE
        ));
    }
    if let Some(id) = accepted.intersection(rejected).next() {
        return Err(format!("Axiom {} cannot be both accepted and rejected", id));
    }
    Ok(())
}

// =============================================================================
// SNAPSHOTS
// =============================================================================

/// Body of `POST /api/snapshots`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSnapshotRequest {
    pub session_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_public: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotMetadata {
    pub is_public: bool,
    /// Session the snapshot was taken from.
    pub created_by: String,
}

/// A frozen copy of a session's accepted axioms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// The session's accepted ids, as stored.
    pub axioms: Vec<NodeId>,
    /// Those of `axioms` that are axioms of the dataset at capture time.
    pub nodes: Vec<NodeId>,
    pub metadata: SnapshotMetadata,
    pub created_at: DateTime<Utc>,
}

/// Response of `GET /api/snapshots/:id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotDetail {
    #[serde(flatten)]
    pub snapshot: Snapshot,
    pub node_data: Vec<Node>,
    pub categories: Vec<AxiomCategory>,
}

/// Entry of `GET /api/snapshots`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotSummary {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub node_count: usize,
}

impl From<&Snapshot> for SnapshotSummary {
    fn from(snapshot: &Snapshot) -> Self {
        Self {
            id: snapshot.id.clone(),
            title: snapshot.title.clone(),
            description: snapshot.description.clone(),
            created_at: snapshot.created_at,
            node_count: snapshot.nodes.len(),
        }
    }
}
