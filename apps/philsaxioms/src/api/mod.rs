//! # PhilsAxioms HTTP API Module
//!
//! This module implements the HTTP REST API server using axum.
//!
//! ## Endpoints
//!
//! - `GET /api/graph` - Full dataset (with `ETag`)
//! - `GET /api/questionnaire` - One prompt per axiom
//! - `GET /api/axioms/{id}`, `GET /api/arguments/{id}` - Single node by kind
//! - `GET /api/nodes/{id}/connections` - Neighbours of a node
//! - `POST /api/nodes`, `DELETE /api/nodes/{id}` - Authoring
//! - `POST /api/sessions` ... - In-memory reader sessions
//! - `POST /api/evaluate` - Valid arguments for a selection
//! - `GET /api/layout` - Layered layout
//! - `GET /api/diagnostics` - Dataset consistency report
//! - `POST /api/snapshots` ... - Shareable copies of a session
//!
//! ## Configuration (Environment Variables)
//!
//! - `PHILSAXIOMS_CORS_ORIGINS`: Comma-separated list of allowed origins, or "*" for all (default: localhost only)
//! - `PHILSAXIOMS_RATE_LIMIT`: Requests per second (default: 100, 0 to disable)

mod handlers;
mod middleware;
mod types;

pub use middleware::{create_rate_limiter, get_rate_limit_from_env};
pub use types::{
    CreateSessionRequest, CreateSnapshotRequest, ErrorResponse, EvaluateRequest, HealthResponse,
    MessageResponse, NodeCreatedResponse, ServiceInfo, Snapshot, SnapshotDetail, SnapshotMetadata,
    SnapshotSummary, UpdateSessionRequest, UserSession, check_selection,
};

use crate::{AppError, Config, DataChange, DatasetStore};
use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware as axum_middleware,
    routing::{get, post},
};
use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;
use tokio::sync::{RwLock, broadcast};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Route table, as advertised by `GET /api`.
pub const ENDPOINTS: &[&str] = &[
    "GET /api/health",
    "GET /api/graph",
    "GET /api/questionnaire",
    "GET /api/axioms/{id}",
    "GET /api/axioms/category/{category}",
    "GET /api/arguments/{id}",
    "GET /api/nodes/{id}/connections",
    "POST /api/nodes",
    "DELETE /api/nodes/{id}",
    "POST /api/sessions",
    "GET /api/sessions/{id}",
    "PUT /api/sessions/{id}",
    "GET /api/sessions/{id}/evaluation",
    "POST /api/evaluate",
    "GET /api/layout",
    "GET /api/diagnostics",
    "POST /api/snapshots",
    "GET /api/snapshots",
    "GET /api/snapshots/{id}",
];

/// Maximum request body size (2 MiB).
const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

// =============================================================================
// SERVER STATE
// =============================================================================

/// Default number of sessions, and of snapshots, held in memory.
pub const DEFAULT_STATE_CAPACITY: usize = 10_000;

/// In-memory map that evicts its oldest insertion once full.
#[derive(Debug)]
pub struct BoundedMap<T> {
    capacity: usize,
    entries: BTreeMap<String, T>,
    order: VecDeque<String>,
}

impl<T> BoundedMap<T> {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: BTreeMap::new(),
            order: VecDeque::new(),
        }
    }

    /// Insert under a fresh key, evicting the oldest entries as needed.
    pub fn insert(&mut self, key: String, value: T) {
        if let Some(slot) = self.entries.get_mut(&key) {
            *slot = value;
            return;
        }
        while self.order.len() >= self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                tracing::debug!("Evicting {} from in-memory state", oldest);
                self.entries.remove(&oldest);
            }
        }
        self.order.push_back(key.clone());
        self.entries.insert(key, value);
    }

    pub fn get(&self, key: &str) -> Option<&T> {
        self.entries.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut T> {
        self.entries.get_mut(key)
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.entries.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Shared server state: the dataset store plus in-memory sessions and
/// snapshots.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<DatasetStore>,
    pub sessions: Arc<RwLock<BoundedMap<UserSession>>>,
    pub snapshots: Arc<RwLock<BoundedMap<Snapshot>>>,
}

impl AppState {
    #[must_use]
    pub fn new(store: Arc<DatasetStore>) -> Self {
        Self::with_capacity(store, DEFAULT_STATE_CAPACITY)
    }

    /// State holding at most `capacity` sessions and `capacity` snapshots.
    #[must_use]
    pub fn with_capacity(store: Arc<DatasetStore>, capacity: usize) -> Self {
        Self {
            store,
            sessions: Arc::new(RwLock::new(BoundedMap::new(capacity))),
            snapshots: Arc::new(RwLock::new(BoundedMap::new(capacity))),
        }
    }
}

// =============================================================================
// CORS CONFIGURATION
// =============================================================================

/// Build CORS layer from `PHILSAXIOMS_CORS_ORIGINS`.
///
/// - `*`: allows all origins
/// - unset: localhost only
/// - otherwise: comma-separated list of allowed origins
fn build_cors_layer() -> CorsLayer {
    let origins_env = std::env::var("PHILSAXIOMS_CORS_ORIGINS").ok();

    match origins_env.as_deref() {
        Some("*") => {
            tracing::warn!("CORS: Allowing ALL origins (PHILSAXIOMS_CORS_ORIGINS=*)");
            CorsLayer::permissive()
        }
        Some(origins) => {
            let allowed_origins: Vec<HeaderValue> = origins
                .split(',')
                .filter_map(|s| {
                    let trimmed = s.trim();
                    match trimmed.parse::<HeaderValue>() {
                        Ok(hv) => {
                            tracing::info!("CORS: Allowing origin: {}", trimmed);
                            Some(hv)
                        }
                        Err(e) => {
                            tracing::warn!("CORS: Invalid origin '{}': {}", trimmed, e);
                            None
                        }
                    }
                })
                .collect();

            if allowed_origins.is_empty() {
                tracing::warn!(
                    "CORS: No valid origins in PHILSAXIOMS_CORS_ORIGINS, defaulting to localhost only"
                );
                build_localhost_cors()
            } else {
                with_allowed_methods(CorsLayer::new().allow_origin(allowed_origins))
            }
        }
        None => {
            tracing::info!("CORS: No PHILSAXIOMS_CORS_ORIGINS set, defaulting to localhost only");
            build_localhost_cors()
        }
    }
}

fn with_allowed_methods(layer: CorsLayer) -> CorsLayer {
    layer
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::IF_NONE_MATCH])
        .expose_headers([header::ETAG])
}

/// Dev-server origins of the front end.
fn build_localhost_cors() -> CorsLayer {
    let localhost_origins = vec![
        "http://localhost:3000".parse::<HeaderValue>().ok(),
        "http://localhost:5173".parse::<HeaderValue>().ok(),
        "http://127.0.0.1:3000".parse::<HeaderValue>().ok(),
        "http://127.0.0.1:5173".parse::<HeaderValue>().ok(),
    ];
    let origins: Vec<HeaderValue> = localhost_origins.into_iter().flatten().collect();

    with_allowed_methods(CorsLayer::new().allow_origin(origins))
}

// =============================================================================
// ROUTER CREATION
// =============================================================================

/// Create the axum router with all endpoints and middleware.
///
/// Middleware stack (outer to inner):
/// 1. Tracing - logs all requests
/// 2. CORS - handles preflight requests
/// 3. Body limit
/// 4. Rate Limiting (if enabled)
pub fn create_router(state: AppState) -> Router {
    let cors = build_cors_layer();

    let rate_limit = get_rate_limit_from_env();
    let rate_limiter = if rate_limit > 0 {
        tracing::info!("Rate limiting enabled: {} requests/second", rate_limit);
        Some(create_rate_limiter(rate_limit))
    } else {
        tracing::info!("Rate limiting disabled");
        None
    };

    let mut router = Router::new()
        .route("/api", get(handlers::service_info_handler))
        .route("/api/health", get(handlers::health_handler))
        .route("/api/graph", get(handlers::graph_handler))
        .route("/api/questionnaire", get(handlers::questionnaire_handler))
        .route("/api/axioms/{id}", get(handlers::axiom_handler))
        .route(
            "/api/axioms/category/{category}",
            get(handlers::axioms_by_category_handler),
        )
        .route("/api/arguments/{id}", get(handlers::argument_handler))
        .route(
            "/api/nodes/{id}/connections",
            get(handlers::connections_handler),
        )
        .route("/api/nodes", post(handlers::create_node_handler))
        .route(
            "/api/nodes/{id}",
            axum::routing::delete(handlers::delete_node_handler),
        )
        .route("/api/sessions", post(handlers::create_session_handler))
        .route(
            "/api/sessions/{id}",
            get(handlers::get_session_handler).put(handlers::update_session_handler),
        )
        .route(
            "/api/sessions/{id}/evaluation",
            get(handlers::session_evaluation_handler),
        )
        .route("/api/evaluate", post(handlers::evaluate_handler))
        .route("/api/layout", get(handlers::layout_handler))
        .route("/api/diagnostics", get(handlers::diagnostics_handler))
        .route(
            "/api/snapshots",
            get(handlers::list_snapshots_handler).post(handlers::create_snapshot_handler),
        )
        .route("/api/snapshots/{id}", get(handlers::get_snapshot_handler));

    if let Some(limiter) = rate_limiter {
        router = router.layer(axum_middleware::from_fn_with_state(
            limiter,
            middleware::rate_limit_middleware,
        ));
    }

    router
        .layer(axum::extract::DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

/// Open the dataset, optionally start the file watcher, and serve until
/// Ctrl+C.
pub async fn run_server(config: &Config) -> Result<(), AppError> {
    let store = DatasetStore::open(&config.data_dir, config.layout, config.cache_capacity).await;

    if config.watch {
        store.watch()?;
    }

    tokio::spawn(log_changes(store.subscribe()));

    let router = create_router(AppState::new(store));
    let addr = config.bind_addr();

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::Server(format!("Bind failed on {}: {}", addr, e)))?;

    tracing::info!("PhilsAxioms HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::Server(e.to_string()))
}

/// Log dataset changes until the store is dropped. Returns the number of
/// changes seen; changes missed while lagging are skipped, not fatal.
async fn log_changes(mut changes: broadcast::Receiver<DataChange>) -> usize {
    let mut seen = 0usize;
    loop {
        match changes.recv().await {
            Ok(DataChange::FilesChanged(paths)) => {
                tracing::info!("Dataset reloaded after {} file event(s)", paths.len());
            }
            Ok(other) => tracing::debug!("Dataset changed: {:?}", other),
            Err(broadcast::error::RecvError::Lagged(missed)) => {
                tracing::warn!("Change log lagged, skipped {} change(s)", missed);
                continue;
            }
            Err(broadcast::error::RecvError::Closed) => return seen,
        }
        seen = seen.saturating_add(1);
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
