//! Unit tests for API types serialization/deserialization.

// Allow unwrap and panic in tests - these are standard for test code
#![allow(clippy::unwrap_used, clippy::panic)]

use philsaxioms::api::{
    CreateSessionRequest, CreateSnapshotRequest, ErrorResponse, EvaluateRequest, HealthResponse,
    Snapshot, SnapshotMetadata, SnapshotSummary, UpdateSessionRequest, UserSession,
    check_selection,
};
use philsaxioms_core::NodeId;
use philsaxioms_core::primitives::MAX_SELECTION_SIZE;
use std::collections::BTreeSet;

fn ids(items: &[&str]) -> Vec<NodeId> {
    items.iter().map(|s| NodeId::new(*s)).collect()
}

// =============================================================================
// HEALTH RESPONSE TESTS
// =============================================================================

#[test]
fn test_health_response_default() {
    let health = HealthResponse::default();
    assert_eq!(health.status, "ok");
    assert!(!health.version.is_empty());
}

#[test]
fn test_health_response_serialization() {
    let json = serde_json::to_string(&HealthResponse::default()).unwrap();
    assert!(json.contains("\"status\":\"ok\""));
    assert!(json.contains("\"timestamp\":"));
}

#[test]
fn test_error_response_serialization() {
    let json = serde_json::to_string(&ErrorResponse::new("Node not found")).unwrap();
    assert_eq!(json, r#"{"error":"Node not found"}"#);
}

// =============================================================================
// SESSION TESTS
// =============================================================================

#[test]
fn test_create_session_request_defaults() {
    let request: CreateSessionRequest = serde_json::from_str("{}").unwrap();
    assert!(request.accepted_axioms.is_empty());
    assert!(request.rejected_axioms.is_empty());

    let request: CreateSessionRequest =
        serde_json::from_str(r#"{"acceptedAxioms":["ax1"]}"#).unwrap();
    assert_eq!(request.accepted_axioms, ids(&["ax1"]));
}

#[test]
fn test_session_serializes_camel_case() {
    let session = UserSession::new("s1".to_string(), CreateSessionRequest::default());
    let json = serde_json::to_string(&session).unwrap();

    assert!(json.contains("\"acceptedAxioms\":[]"));
    assert!(json.contains("\"rejectedAxioms\":[]"));
    assert!(json.contains("\"exploredConnections\":[]"));
    assert!(json.contains("\"createdAt\":"));
    assert!(json.contains("\"updatedAt\":"));
}

#[test]
fn test_session_partial_update() {
    let mut session = UserSession::new(
        "s1".to_string(),
        CreateSessionRequest {
            accepted_axioms: ids(&["ax1"]),
            rejected_axioms: ids(&["ax2"]),
        },
    );
    let created = session.updated_at;

    let update: UpdateSessionRequest =
        serde_json::from_str(r#"{"rejectedAxioms":[]}"#).unwrap();
    session.apply(update);

    assert_eq!(session.accepted_axioms, ids(&["ax1"]));
    assert!(session.rejected_axioms.is_empty());
    assert!(session.updated_at >= created);
    assert_eq!(session.created_at, created);
}

// =============================================================================
// EVALUATE REQUEST TESTS
// =============================================================================

#[test]
fn test_evaluate_request_deserialization() {
    let request: EvaluateRequest =
        serde_json::from_str(r#"{"acceptedAxioms":["b","a","a"]}"#).unwrap();

    assert_eq!(request.accepted_axioms.len(), 2);
    assert!(request.rejected_axioms.is_empty());
    assert!(request.validate().is_ok());
}

#[test]
fn test_evaluate_request_requires_accepted_list() {
    let result: Result<EvaluateRequest, _> = serde_json::from_str(r#"{"rejectedAxioms":[]}"#);
    assert!(result.is_err());
}

#[test]
fn test_selection_overlap_rejected() {
    let request: EvaluateRequest =
        serde_json::from_str(r#"{"acceptedAxioms":["a"],"rejectedAxioms":["a"]}"#).unwrap();

    let err = request.validate().unwrap_err();
    assert_eq!(err, "Axiom a cannot be both accepted and rejected");
}

#[test]
fn test_selection_size_limit() {
    let accepted: BTreeSet<NodeId> = (0..=MAX_SELECTION_SIZE)
        .map(|i| NodeId::new(format!("ax{}", i)))
        .collect();

    let err = check_selection(&accepted, &BTreeSet::new()).unwrap_err();
    assert!(err.contains("exceeds maximum"));
}

// =============================================================================
// SNAPSHOT TESTS
// =============================================================================

fn sample_snapshot() -> Snapshot {
    Snapshot {
        id: "snap1".to_string(),
        title: "Worldview".to_string(),
        description: None,
        axioms: ids(&["ax1", "arg1"]),
        nodes: ids(&["ax1"]),
        metadata: SnapshotMetadata {
            is_public: true,
            created_by: "s1".to_string(),
        },
        created_at: chrono::Utc::now(),
    }
}

#[test]
fn test_create_snapshot_request_defaults() {
    let request: CreateSnapshotRequest = serde_json::from_str(r#"{"sessionId":"s1"}"#).unwrap();

    assert_eq!(request.session_id, "s1");
    assert!(request.title.is_empty());
    assert!(request.description.is_none());
    assert!(!request.is_public);
}

#[test]
fn test_snapshot_serialization() {
    let json = serde_json::to_string(&sample_snapshot()).unwrap();

    assert!(json.contains("\"isPublic\":true"));
    assert!(json.contains("\"createdBy\":\"s1\""));
    assert!(json.contains("\"createdAt\":"));
    assert!(!json.contains("description"));
}

#[test]
fn test_snapshot_summary_counts_nodes() {
    let summary = SnapshotSummary::from(&sample_snapshot());
    assert_eq!(summary.node_count, 1);

    let json = serde_json::to_string(&summary).unwrap();
    assert!(json.contains("\"nodeCount\":1"));
}
