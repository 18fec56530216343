//! # Dataset Store
//!
//! Owns the on-disk dataset (`categories.yaml` + `nodes.yaml`) and the
//! in-memory views derived from it.
//!
//! The parsed [`Dataset`] is cached behind an `RwLock` until
//! [`DatasetStore::invalidate`] drops it. Invalidation happens on file
//! changes (see [`DatasetStore::watch`]) and after authoring writes, and is
//! announced to every [`DatasetStore::subscribe`] receiver.
//!
//! Engine results are memoised in an [`EngineCache`] keyed by the dataset
//! checksum, so a stale entry can never be served for new data.

use crate::AppError;
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use philsaxioms_core::formats::{CATEGORIES_FILE, NODES_FILE};
use philsaxioms_core::{
    ArgumentValidator, AxiomCategory, Evaluation, Graph, GraphData, Ingestor, Layout,
    LayoutConfig, Node, NodeId, QuestionnaireItem, build_questionnaire, dataset_checksum,
    hierarchical_layout, nodes_to_yaml, parse_categories_yaml, parse_nodes_yaml,
};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock, broadcast};

/// Capacity of the change notification channel.
const CHANGE_CHANNEL_CAPACITY: usize = 64;

// =============================================================================
// DATASET
// =============================================================================

/// One consistent load of the data directory.
#[derive(Debug)]
pub struct Dataset {
    pub graph: Graph,
    pub questionnaire: Vec<QuestionnaireItem>,
    /// Fingerprint of the dataset; served as the graph ETag.
    pub checksum: String,
}

impl Dataset {
    #[must_use]
    pub fn new(data: GraphData) -> Self {
        let checksum = dataset_checksum(&data);
        let graph = Graph::from_data(data);
        let questionnaire = build_questionnaire(&graph);
        Self {
            graph,
            questionnaire,
            checksum,
        }
    }
}

/// Reason the cached dataset was dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataChange {
    /// Files in the data directory changed on disk.
    FilesChanged(Vec<PathBuf>),
    NodeAdded(NodeId),
    NodeDeleted(NodeId),
    /// Explicit invalidation with no specific cause.
    Invalidated,
}

// =============================================================================
// ENGINE CACHE
// =============================================================================

/// Dataset checksum, accepted ids, rejected ids.
type EvaluationKey = (String, BTreeSet<NodeId>, BTreeSet<NodeId>);

fn evaluation_key(
    dataset: &Dataset,
    accepted: &BTreeSet<NodeId>,
    rejected: &BTreeSet<NodeId>,
) -> EvaluationKey {
    (dataset.checksum.clone(), accepted.clone(), rejected.clone())
}

/// Run CPU-bound engine work on the blocking pool.
pub async fn run_engine<T, F>(job: F) -> Result<T, AppError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(job)
        .await
        .map_err(|e| AppError::Server(format!("Engine task failed: {}", e)))
}

/// Bounded memo of engine results. The oldest evaluation is evicted first.
#[derive(Debug)]
pub struct EngineCache {
    capacity: usize,
    evaluations: BTreeMap<EvaluationKey, Arc<Evaluation>>,
    order: VecDeque<EvaluationKey>,
    layout: Option<(String, Arc<Layout>)>,
}

impl EngineCache {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            evaluations: BTreeMap::new(),
            order: VecDeque::new(),
            layout: None,
        }
    }

    /// Evaluation of `dataset` for an accept/reject selection, computed at
    /// most once per dataset version.
    pub fn evaluate(
        &mut self,
        dataset: &Dataset,
        accepted: &BTreeSet<NodeId>,
        rejected: &BTreeSet<NodeId>,
    ) -> Arc<Evaluation> {
        let key = evaluation_key(dataset, accepted, rejected);
        if let Some(hit) = self.cached_evaluation(&key) {
            return hit;
        }
        let result = Arc::new(ArgumentValidator::new().evaluate(&dataset.graph, accepted, rejected));
        self.insert_evaluation(key, Arc::clone(&result));
        result
    }

    fn cached_evaluation(&self, key: &EvaluationKey) -> Option<Arc<Evaluation>> {
        self.evaluations.get(key).map(Arc::clone)
    }

    fn insert_evaluation(&mut self, key: EvaluationKey, evaluation: Arc<Evaluation>) {
        if self.evaluations.contains_key(&key) {
            return;
        }
        while self.order.len() >= self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.evaluations.remove(&oldest);
            }
        }
        self.order.push_back(key.clone());
        self.evaluations.insert(key, evaluation);
    }

    /// Layout of `dataset`, recomputed only when the checksum changes.
    pub fn layout(&mut self, dataset: &Dataset, config: &LayoutConfig) -> Arc<Layout> {
        if let Some(hit) = self.cached_layout(dataset) {
            return hit;
        }
        let layout = Arc::new(hierarchical_layout(dataset.graph.nodes(), config));
        self.insert_layout(dataset, Arc::clone(&layout));
        layout
    }

    fn cached_layout(&self, dataset: &Dataset) -> Option<Arc<Layout>> {
        self.layout
            .as_ref()
            .filter(|(checksum, _)| *checksum == dataset.checksum)
            .map(|(_, layout)| Arc::clone(layout))
    }

    fn insert_layout(&mut self, dataset: &Dataset, layout: Arc<Layout>) {
        self.layout = Some((dataset.checksum.clone(), layout));
    }

    pub fn clear(&mut self) {
        self.evaluations.clear();
        self.order.clear();
        self.layout = None;
    }

    /// Number of memoised evaluations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.evaluations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.evaluations.is_empty()
    }
}

// =============================================================================
// STORE
// =============================================================================

/// YAML-backed dataset store shared by the server and the CLI.
#[derive(Debug)]
pub struct DatasetStore {
    data_dir: PathBuf,
    layout_config: LayoutConfig,
    cache: RwLock<Option<Arc<Dataset>>>,
    engine: Mutex<EngineCache>,
    /// Serialises read-modify-write cycles on `nodes.yaml`.
    write_lock: Mutex<()>,
    changes: broadcast::Sender<DataChange>,
}

impl DatasetStore {
    /// Create a store over `data_dir`. Nothing is read until [`Self::load`].
    #[must_use]
    pub fn new(
        data_dir: impl Into<PathBuf>,
        layout_config: LayoutConfig,
        cache_capacity: usize,
    ) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            data_dir: data_dir.into(),
            layout_config,
            cache: RwLock::new(None),
            engine: Mutex::new(EngineCache::new(cache_capacity)),
            write_lock: Mutex::new(()),
            changes,
        }
    }

    /// Create a shared store and load the dataset once.
    pub async fn open(
        data_dir: impl Into<PathBuf>,
        layout_config: LayoutConfig,
        cache_capacity: usize,
    ) -> Arc<Self> {
        let store = Arc::new(Self::new(data_dir, layout_config, cache_capacity));
        if !store.data_dir.is_dir() {
            tracing::warn!(
                "Data directory {} does not exist; serving an empty dataset",
                store.data_dir.display()
            );
        }
        store.load().await;
        store
    }

    #[must_use]
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    #[must_use]
    pub fn layout_config(&self) -> &LayoutConfig {
        &self.layout_config
    }

    /// The current dataset, read from disk only on a cache miss.
    pub async fn load(&self) -> Arc<Dataset> {
        if let Some(dataset) = self.cache.read().await.as_ref() {
            return Arc::clone(dataset);
        }

        let mut cache = self.cache.write().await;
        // Another task may have loaded while we waited for the write lock.
        if let Some(dataset) = cache.as_ref() {
            return Arc::clone(dataset);
        }

        tracing::info!("Loading dataset from {}", self.data_dir.display());
        let categories = self.read_categories().await;
        let nodes = self.read_nodes().await;
        tracing::info!(
            "Loaded {} nodes, {} categories",
            nodes.len(),
            categories.len()
        );

        let dataset = Arc::new(Dataset::new(GraphData { nodes, categories }));
        *cache = Some(Arc::clone(&dataset));
        dataset
    }

    /// Drop the cached dataset and engine results, then notify subscribers.
    pub async fn invalidate(&self, reason: DataChange) {
        *self.cache.write().await = None;
        self.engine.lock().await.clear();
        tracing::debug!("Dataset cache invalidated: {:?}", reason);
        // No receivers is fine.
        let _ = self.changes.send(reason);
    }

    /// Receive every future invalidation.
    pub fn subscribe(&self) -> broadcast::Receiver<DataChange> {
        self.changes.subscribe()
    }

    /// Evaluate a selection against the current dataset, memoised.
    ///
    /// The engine runs on the blocking pool; the cache lock is held only for
    /// lookup and insert.
    pub async fn evaluate(
        &self,
        accepted: &BTreeSet<NodeId>,
        rejected: &BTreeSet<NodeId>,
    ) -> Result<Arc<Evaluation>, AppError> {
        let dataset = self.load().await;
        let key = evaluation_key(&dataset, accepted, rejected);
        if let Some(hit) = self.engine.lock().await.cached_evaluation(&key) {
            return Ok(hit);
        }

        let (accepted, rejected) = (accepted.clone(), rejected.clone());
        let evaluation = run_engine(move || {
            Arc::new(ArgumentValidator::new().evaluate(&dataset.graph, &accepted, &rejected))
        })
        .await?;

        self.engine
            .lock()
            .await
            .insert_evaluation(key, Arc::clone(&evaluation));
        Ok(evaluation)
    }

    /// Layout of the current dataset, memoised per checksum.
    pub async fn layout(&self) -> Result<Arc<Layout>, AppError> {
        let dataset = self.load().await;
        if let Some(hit) = self.engine.lock().await.cached_layout(&dataset) {
            return Ok(hit);
        }

        let config = self.layout_config;
        let job = Arc::clone(&dataset);
        let layout =
            run_engine(move || Arc::new(hierarchical_layout(job.graph.nodes(), &config))).await?;

        self.engine
            .lock()
            .await
            .insert_layout(&dataset, Arc::clone(&layout));
        Ok(layout)
    }

    // -------------------------------------------------------------------------
    // Authoring
    // -------------------------------------------------------------------------

    /// Validate and append a node to `nodes.yaml`. Existing entries are
    /// written back as authored.
    pub async fn add_node(&self, node: Node) -> Result<Node, AppError> {
        Ingestor::validate(&node)?;

        let guard = self.write_lock.lock().await;
        let mut nodes = self.read_nodes_strict().await?;
        Ingestor::append_node(&mut nodes, node.clone())?;
        self.write_nodes(&nodes).await?;
        drop(guard);

        tracing::info!("Node created: {}", node.id);
        self.invalidate(DataChange::NodeAdded(node.id.clone())).await;
        Ok(node)
    }

    /// Remove a node, and every edge pointing at it, from `nodes.yaml`.
    /// Other entries, including repeated ids, are written back unchanged.
    pub async fn delete_node(&self, id: &str) -> Result<Node, AppError> {
        let guard = self.write_lock.lock().await;
        let mut nodes = self.read_nodes_strict().await?;
        let removed = Ingestor::retract_node(&mut nodes, id)?;
        self.write_nodes(&nodes).await?;
        drop(guard);

        tracing::info!("Node deleted: {}", removed.id);
        self.invalidate(DataChange::NodeDeleted(removed.id.clone())).await;
        Ok(removed)
    }

    // -------------------------------------------------------------------------
    // File watching
    // -------------------------------------------------------------------------

    /// Invalidate the cache whenever files in the data directory change.
    ///
    /// The watcher lives as long as the spawned task, which ends when the
    /// event channel closes.
    pub fn watch(self: &Arc<Self>) -> Result<(), AppError> {
        let (tx, mut rx) = tokio::sync::mpsc::channel::<Event>(CHANGE_CHANNEL_CAPACITY);

        let mut watcher = RecommendedWatcher::new(
            move |result: notify::Result<Event>| match result {
                Ok(event) => {
                    let _ = tx.blocking_send(event);
                }
                Err(e) => tracing::warn!("File watcher error: {}", e),
            },
            notify::Config::default(),
        )?;
        watcher.watch(&self.data_dir, RecursiveMode::Recursive)?;
        tracing::info!("Watching {} for changes", self.data_dir.display());

        let store = Arc::clone(self);
        tokio::spawn(async move {
            let _watcher = watcher;
            while let Some(event) = rx.recv().await {
                if event.kind.is_create() || event.kind.is_modify() || event.kind.is_remove() {
                    tracing::info!("Dataset files changed, reloading");
                    store.invalidate(DataChange::FilesChanged(event.paths)).await;
                }
            }
        });

        Ok(())
    }

    // -------------------------------------------------------------------------
    // File access
    // -------------------------------------------------------------------------

    async fn read_file(&self, name: &str) -> Option<String> {
        let path = self.data_dir.join(name);
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => Some(content),
            Err(e) => {
                tracing::warn!("Error loading YAML file {}: {}", path.display(), e);
                None
            }
        }
    }

    async fn read_categories(&self) -> Vec<AxiomCategory> {
        let Some(content) = self.read_file(CATEGORIES_FILE).await else {
            return Vec::new();
        };
        parse_categories_yaml(&content).unwrap_or_else(|e| {
            tracing::warn!("{}", e);
            Vec::new()
        })
    }

    async fn read_nodes(&self) -> Vec<Node> {
        let Some(content) = self.read_file(NODES_FILE).await else {
            return Vec::new();
        };
        parse_nodes_yaml(&content).unwrap_or_else(|e| {
            tracing::warn!("{}", e);
            Vec::new()
        })
    }

    /// Read `nodes.yaml` for a rewrite. A missing file is an empty list, but
    /// an unparsable one is an error so a write never clobbers it.
    async fn read_nodes_strict(&self) -> Result<Vec<Node>, AppError> {
        let path = self.data_dir.join(NODES_FILE);
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => Ok(parse_nodes_yaml(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_nodes(&self, nodes: &[Node]) -> Result<(), AppError> {
        let yaml = nodes_to_yaml(nodes)?;
        tokio::fs::create_dir_all(&self.data_dir).await?;
        tokio::fs::write(self.data_dir.join(NODES_FILE), yaml).await?;
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
