//! Lazily expandable view over the reference graph
//!
//! The model starts in `Loading`, shows a placeholder until a pipeline run
//! commits, and only ever swaps in a complete graph. Each rebuild takes a new
//! generation; a run whose generation is no longer current commits nothing.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{broadcast, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::Result;
use super::graph::ReferenceGraph;
use super::pipeline::{Pipeline, PipelineReport};
use super::FileKey;

pub const LOADING_LABEL: &str = "Please wait, building the reference graph...";
pub const DEPENDENCIES_LABEL: &str = "Dependencies";
pub const REFERENCES_LABEL: &str = "References";

/// A node handed to the display layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TreeNode {
    /// Leaf shown while loading, or after a fatal error
    Placeholder { message: String },
    /// A file; only root-level file nodes expand
    File { file: FileKey, expandable: bool },
    /// Files `target` depends on
    Dependencies { target: FileKey },
    /// Files that reference `target`
    References { target: FileKey },
}

impl TreeNode {
    pub fn label(&self) -> String {
        match self {
            TreeNode::Placeholder { message } => message.clone(),
            TreeNode::File { file, .. } => file.display_name(),
            TreeNode::Dependencies { .. } => DEPENDENCIES_LABEL.to_string(),
            TreeNode::References { .. } => REFERENCES_LABEL.to_string(),
        }
    }

    /// Secondary text: the full path for files
    pub fn description(&self) -> Option<String> {
        match self {
            TreeNode::File { file, .. } => Some(file.to_string()),
            _ => None,
        }
    }

    pub fn is_expandable(&self) -> bool {
        match self {
            TreeNode::Placeholder { .. } => false,
            TreeNode::File { expandable, .. } => *expandable,
            TreeNode::Dependencies { .. } | TreeNode::References { .. } => true,
        }
    }
}

/// Change notification; `node: None` means the whole tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEvent {
    pub node: Option<TreeNode>,
}

#[derive(Debug, Clone)]
pub enum ModelState {
    Loading { error: Option<String> },
    Ready(Arc<ReferenceGraph>),
}

#[derive(Debug, Clone)]
pub enum RebuildOutcome {
    Committed(PipelineReport),
    /// A newer rebuild started while this one ran; nothing was committed
    Superseded,
}

struct ModelInner {
    pipeline: Pipeline,
    state: RwLock<ModelState>,
    generation: AtomicU64,
    events: broadcast::Sender<TreeEvent>,
    background: Mutex<Option<JoinHandle<()>>>,
}

/// Owner of the graph and its readiness state
#[derive(Clone)]
pub struct GraphTreeModel {
    inner: Arc<ModelInner>,
}

impl GraphTreeModel {
    pub fn new(pipeline: Pipeline) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            inner: Arc::new(ModelInner {
                pipeline,
                state: RwLock::new(ModelState::Loading { error: None }),
                generation: AtomicU64::new(0),
                events,
                background: Mutex::new(None),
            }),
        }
    }

    /// Root directory the pipeline walks
    pub fn root(&self) -> &FileKey {
        self.inner.pipeline.root()
    }

    /// Number of rebuilds started so far
    pub fn generation(&self) -> u64 {
        self.inner.generation.load(Ordering::SeqCst)
    }

    pub async fn state(&self) -> ModelState {
        self.inner.state.read().await.clone()
    }

    pub async fn is_ready(&self) -> bool {
        matches!(*self.inner.state.read().await, ModelState::Ready(_))
    }

    /// The committed graph, once ready
    pub async fn graph(&self) -> Option<Arc<ReferenceGraph>> {
        match &*self.inner.state.read().await {
            ModelState::Ready(graph) => Some(Arc::clone(graph)),
            ModelState::Loading { .. } => None,
        }
    }

    pub async fn root_nodes(&self) -> Vec<TreeNode> {
        match &*self.inner.state.read().await {
            ModelState::Loading { error: None } => vec![TreeNode::Placeholder {
                message: LOADING_LABEL.to_string(),
            }],
            ModelState::Loading { error: Some(error) } => vec![TreeNode::Placeholder {
                message: format!("Could not build the reference graph: {}", error),
            }],
            ModelState::Ready(graph) => graph
                .files()
                .map(|file| TreeNode::File {
                    file: file.clone(),
                    expandable: true,
                })
                .collect(),
        }
    }

    pub async fn children(&self, node: &TreeNode) -> Vec<TreeNode> {
        match node {
            TreeNode::Placeholder { .. } => Vec::new(),
            TreeNode::File { expandable: false, .. } => Vec::new(),
            TreeNode::File { file, expandable: true } => vec![
                TreeNode::Dependencies { target: file.clone() },
                TreeNode::References { target: file.clone() },
            ],
            TreeNode::Dependencies { target } => {
                let Some(graph) = self.graph().await else {
                    return Vec::new();
                };
                graph.dependencies_of(target).map(leaf).collect()
            }
            TreeNode::References { target } => {
                let Some(graph) = self.graph().await else {
                    return Vec::new();
                };
                graph.references_of(target).map(leaf).collect()
            }
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TreeEvent> {
        self.inner.events.subscribe()
    }

    /// Tell listeners to re-render `node`, or everything when `None`
    pub fn refresh(&self, node: Option<TreeNode>) {
        // No subscribers is fine
        let _ = self.inner.events.send(TreeEvent { node });
    }

    /// Run the whole pipeline and commit its graph if no newer rebuild started
    pub async fn rebuild(&self) -> Result<RebuildOutcome> {
        let generation = {
            let mut state = self.inner.state.write().await;
            let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
            *state = ModelState::Loading { error: None };
            generation
        };
        self.refresh(None);
        debug!("Rebuild generation {} started", generation);

        let result = self.inner.pipeline.run().await;

        let mut state = self.inner.state.write().await;
        if self.inner.generation.load(Ordering::SeqCst) != generation {
            info!("Discarding results of superseded rebuild generation {}", generation);
            return Ok(RebuildOutcome::Superseded);
        }

        match result {
            Ok((graph, report)) => {
                *state = ModelState::Ready(Arc::new(graph));
                drop(state);
                self.refresh(None);
                Ok(RebuildOutcome::Committed(report))
            }
            Err(e) => {
                *state = ModelState::Loading {
                    error: Some(e.to_string()),
                };
                drop(state);
                self.refresh(None);
                Err(e)
            }
        }
    }

    /// Start a rebuild in the background, aborting the previous background run
    pub fn spawn_rebuild(&self) {
        let model = self.clone();
        let handle = tokio::spawn(async move {
            if let Err(e) = model.rebuild().await {
                warn!("Reference graph rebuild failed: {}", e);
            }
        });

        let previous = match self.inner.background.lock() {
            Ok(mut slot) => slot.replace(handle),
            Err(poisoned) => poisoned.into_inner().replace(handle),
        };
        if let Some(previous) = previous {
            previous.abort();
        }
    }

    /// Wait for the most recent background rebuild to finish
    pub async fn wait_for_background(&self) {
        let handle = match self.inner.background.lock() {
            Ok(mut slot) => slot.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                if !e.is_cancelled() {
                    warn!("Background rebuild task failed: {}", e);
                }
            }
        }
    }
}

fn leaf(file: &FileKey) -> TreeNode {
    TreeNode::File {
        file: file.clone(),
        expandable: false,
    }
}
