//! # API Endpoint Handlers
//!
//! This module implements the actual HTTP endpoint handlers.

use super::{
    AppState, ENDPOINTS,
    types::{
        CreateSessionRequest, CreateSnapshotRequest, EvaluateRequest, HealthResponse,
        MessageResponse, NodeCreatedResponse, ServiceInfo, Snapshot, SnapshotDetail,
        SnapshotMetadata, SnapshotSummary, UpdateSessionRequest, UserSession,
    },
};
use crate::AppError;
use crate::store::run_engine;
use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use chrono::Utc;
use philsaxioms_core::{
    Connection, Evaluation, GraphData, Layout, Node, NodeId, QuestionnaireItem, Report, check,
};
use std::collections::BTreeSet;
use uuid::Uuid;

fn new_id() -> String {
    Uuid::new_v4().simple().to_string()
}

// =============================================================================
// SERVICE HANDLERS
// =============================================================================

/// Service description and endpoint list.
pub async fn service_info_handler() -> Json<ServiceInfo> {
    Json(ServiceInfo {
        name: "PhilsAxioms API".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        endpoints: ENDPOINTS.iter().map(|e| (*e).to_string()).collect(),
    })
}

/// Health check endpoint.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::default())
}

// =============================================================================
// DATASET HANDLERS
// =============================================================================

/// Full dataset. Tagged with the dataset checksum; a matching
/// `If-None-Match` gets `304 Not Modified`.
pub async fn graph_handler(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let dataset = state.store.load().await;
    let etag = format!("\"{}\"", dataset.checksum);

    let not_modified = headers
        .get(header::IF_NONE_MATCH)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.split(',').any(|tag| tag.trim() == etag || tag.trim() == "*"));

    let etag_header = match HeaderValue::from_str(&etag) {
        Ok(value) => value,
        Err(_) => HeaderValue::from_static("\"\""),
    };

    if not_modified {
        return (StatusCode::NOT_MODIFIED, [(header::ETAG, etag_header)]).into_response();
    }

    let data: GraphData = dataset.graph.to_data();
    (StatusCode::OK, [(header::ETAG, etag_header)], Json(data)).into_response()
}

/// Questionnaire generated from the dataset's axioms.
pub async fn questionnaire_handler(State(state): State<AppState>) -> Json<Vec<QuestionnaireItem>> {
    let dataset = state.store.load().await;
    Json(dataset.questionnaire.clone())
}

pub async fn axiom_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Node>, AppError> {
    let dataset = state.store.load().await;
    dataset
        .graph
        .axiom(&id)
        .cloned()
        .map(Json)
        .ok_or_else(|| AppError::not_found("Axiom not found"))
}

pub async fn axioms_by_category_handler(
    State(state): State<AppState>,
    Path(category): Path<String>,
) -> Json<Vec<Node>> {
    let dataset = state.store.load().await;
    Json(dataset.graph.axioms_by_category(&category).cloned().collect())
}

pub async fn argument_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Node>, AppError> {
    let dataset = state.store.load().await;
    dataset
        .graph
        .argument(&id)
        .cloned()
        .map(Json)
        .ok_or_else(|| AppError::not_found("Argument not found"))
}

/// Outgoing then incoming neighbours. Unknown ids yield an empty list.
pub async fn connections_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Json<Vec<Connection>> {
    let dataset = state.store.load().await;
    Json(dataset.graph.connections(&id))
}

// =============================================================================
// AUTHORING HANDLERS
// =============================================================================

/// Append a node to the dataset.
pub async fn create_node_handler(
    State(state): State<AppState>,
    payload: Result<Json<Node>, JsonRejection>,
) -> Result<Json<NodeCreatedResponse>, AppError> {
    let Json(node) = payload.map_err(|rejection| match rejection {
        JsonRejection::JsonDataError(_) => {
            AppError::bad_request("Missing required fields: id, title, description")
        }
        other => AppError::bad_request(other.body_text()),
    })?;

    let node = state.store.add_node(node).await?;
    Ok(Json(NodeCreatedResponse {
        message: "Node created successfully".to_string(),
        node,
    }))
}

/// Delete a node and every edge pointing at it.
pub async fn delete_node_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    state.store.delete_node(&id).await?;
    Ok(Json(MessageResponse {
        message: "Node deleted successfully".to_string(),
    }))
}

// =============================================================================
// SESSION HANDLERS
// =============================================================================

pub async fn create_session_handler(
    State(state): State<AppState>,
    Json(request): Json<CreateSessionRequest>,
) -> Json<UserSession> {
    let session = UserSession::new(new_id(), request);
    state
        .sessions
        .write()
        .await
        .insert(session.id.clone(), session.clone());
    tracing::debug!("Session created: {}", session.id);
    Json(session)
}

pub async fn get_session_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<UserSession>, AppError> {
    state
        .sessions
        .read()
        .await
        .get(&id)
        .cloned()
        .map(Json)
        .ok_or_else(|| AppError::not_found("Session not found"))
}

/// Partial update; absent fields are kept.
pub async fn update_session_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(update): Json<UpdateSessionRequest>,
) -> Result<Json<UserSession>, AppError> {
    let mut sessions = state.sessions.write().await;
    let session = sessions
        .get_mut(&id)
        .ok_or_else(|| AppError::not_found("Session not found"))?;
    session.apply(update);
    Ok(Json(session.clone()))
}

/// Evaluate a stored session. Ids both accepted and rejected count as
/// rejected.
pub async fn session_evaluation_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Evaluation>, AppError> {
    let (accepted, rejected) = {
        let sessions = state.sessions.read().await;
        let session = sessions
            .get(&id)
            .ok_or_else(|| AppError::not_found("Session not found"))?;
        let accepted: BTreeSet<NodeId> = session.accepted_axioms.iter().cloned().collect();
        let rejected: BTreeSet<NodeId> = session.rejected_axioms.iter().cloned().collect();
        (accepted, rejected)
    };

    let evaluation = state.store.evaluate(&accepted, &rejected).await?;
    Ok(Json(Evaluation::clone(&evaluation)))
}

// =============================================================================
// ENGINE HANDLERS
// =============================================================================

/// Stateless evaluation of an accept/reject selection.
pub async fn evaluate_handler(
    State(state): State<AppState>,
    Json(request): Json<EvaluateRequest>,
) -> Result<Json<Evaluation>, AppError> {
    request.validate().map_err(AppError::BadRequest)?;
    let evaluation = state
        .store
        .evaluate(&request.accepted_axioms, &request.rejected_axioms)
        .await?;
    Ok(Json(Evaluation::clone(&evaluation)))
}

pub async fn layout_handler(State(state): State<AppState>) -> Result<Json<Layout>, AppError> {
    let layout = state.store.layout().await?;
    Ok(Json(Layout::clone(&layout)))
}

pub async fn diagnostics_handler(State(state): State<AppState>) -> Result<Json<Report>, AppError> {
    let dataset = state.store.load().await;
    let report = run_engine(move || check(&dataset.graph)).await?;
    Ok(Json(report))
}

// =============================================================================
// SNAPSHOT HANDLERS
// =============================================================================

/// Freeze a session's accepted axioms.
pub async fn create_snapshot_handler(
    State(state): State<AppState>,
    Json(request): Json<CreateSnapshotRequest>,
) -> Result<Json<Snapshot>, AppError> {
    let accepted = state
        .sessions
        .read()
        .await
        .get(&request.session_id)
        .map(|s| s.accepted_axioms.clone())
        .ok_or_else(|| AppError::not_found("Session not found"))?;

    let dataset = state.store.load().await;
    let nodes = accepted
        .iter()
        .filter(|id| dataset.graph.axiom(id.as_str()).is_some())
        .cloned()
        .collect();

    let snapshot = Snapshot {
        id: new_id(),
        title: request.title,
        description: request.description,
        axioms: accepted,
        nodes,
        metadata: SnapshotMetadata {
            is_public: request.is_public,
            created_by: request.session_id,
        },
        created_at: Utc::now(),
    };
    state
        .snapshots
        .write()
        .await
        .insert(snapshot.id.clone(), snapshot.clone());
    tracing::debug!("Snapshot created: {}", snapshot.id);
    Ok(Json(snapshot))
}

/// Snapshot together with the current node data and categories.
pub async fn get_snapshot_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SnapshotDetail>, AppError> {
    let snapshot = state
        .snapshots
        .read()
        .await
        .get(&id)
        .cloned()
        .ok_or_else(|| AppError::not_found("Snapshot not found"))?;

    let dataset = state.store.load().await;
    let node_data = dataset
        .graph
        .nodes()
        .iter()
        .filter(|n| snapshot.nodes.contains(&n.id))
        .cloned()
        .collect();

    Ok(Json(SnapshotDetail {
        snapshot,
        node_data,
        categories: dataset.graph.categories().to_vec(),
    }))
}

/// Public snapshots, oldest first.
pub async fn list_snapshots_handler(State(state): State<AppState>) -> Json<Vec<SnapshotSummary>> {
    let snapshots = state.snapshots.read().await;
    let mut public: Vec<&Snapshot> = snapshots
        .values()
        .filter(|s| s.metadata.is_public)
        .collect();
    public.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
    Json(public.into_iter().map(SnapshotSummary::from).collect())
}
