use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::Result;
use super::collector::{CollectionStats, SymbolReferenceCollector};
use super::discovery::{FileDiscovery, SuffixPattern};
use super::graph::{GraphStats, ReferenceGraph};
use super::providers::{DirectoryLister, ReferenceProvider, SymbolProvider};
use super::{ExclusionPolicy, FileKey};

/// Inputs that stay fixed across rebuilds
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub root: FileKey,
    pub extension: String,
    pub exclude_dirs: Vec<String>,
    pub concurrency: usize,
    pub provider_timeout: Duration,
}

impl PipelineSettings {
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            root: FileKey::new(&config.project.root)?,
            extension: config.project.extension.clone(),
            exclude_dirs: config.project.exclude_dirs.clone(),
            concurrency: config.collection.concurrency,
            provider_timeout: Duration::from_millis(config.collection.provider_timeout_ms),
        })
    }
}

/// What one run did
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub files_discovered: usize,
    pub collection: CollectionStats,
    pub graph: GraphStats,
    pub fingerprint: String,
    pub elapsed_ms: u128,
}

/// Discovery, provider preparation, collection and inversion, strictly in order.
///
/// Runs never overlap: providers hold state between `prepare` and the last
/// lookup of a run, so a second run waits until the first has finished.
pub struct Pipeline {
    lister: Arc<dyn DirectoryLister>,
    symbols: Arc<dyn SymbolProvider>,
    references: Arc<dyn ReferenceProvider>,
    pattern: SuffixPattern,
    exclusion: Arc<ExclusionPolicy>,
    collector: SymbolReferenceCollector,
    running: Mutex<()>,
}

impl Pipeline {
    pub fn new(
        settings: PipelineSettings,
        lister: Arc<dyn DirectoryLister>,
        symbols: Arc<dyn SymbolProvider>,
        references: Arc<dyn ReferenceProvider>,
    ) -> Result<Self> {
        let pattern = SuffixPattern::for_extension(&settings.extension)?;
        let exclusion = Arc::new(ExclusionPolicy::new(settings.root, settings.exclude_dirs));
        let collector = SymbolReferenceCollector::new(
            Arc::clone(&exclusion),
            settings.concurrency,
            settings.provider_timeout,
        );

        Ok(Self {
            lister,
            symbols,
            references,
            pattern,
            exclusion,
            collector,
            running: Mutex::new(()),
        })
    }

    pub fn root(&self) -> &FileKey {
        self.exclusion.root()
    }

    pub async fn run(&self) -> Result<(ReferenceGraph, PipelineReport)> {
        let _running = self.running.lock().await;
        let start_time = Instant::now();

        info!("🔍 Discovering files under {}", self.root());
        let files = FileDiscovery::new(self.lister.as_ref(), &self.pattern, &self.exclusion)
            .discover()
            .await?;

        if let Err(e) = self.references.prepare(&files).await {
            warn!("{} could not prepare: {}", self.references.provider_name(), e);
        }

        let (references, collection) = self
            .collector
            .collect(&files, Arc::clone(&self.symbols), Arc::clone(&self.references))
            .await;

        let graph = ReferenceGraph::from_references(references);
        let stats = graph.stats();

        for (file, referencing) in graph.references() {
            debug!("{} referenced from {:?}", file, referencing.iter().map(|f| f.display_name()).collect::<Vec<_>>());
        }

        let report = PipelineReport {
            files_discovered: files.len(),
            collection,
            graph: stats,
            fingerprint: graph.fingerprint().to_string(),
            elapsed_ms: start_time.elapsed().as_millis(),
        };

        info!(
            "📊 Graph ready: {} files, {} edges, {} isolated ({} ms)",
            stats.files, stats.edges, stats.isolated_files, report.elapsed_ms
        );
        Ok((graph, report))
    }
}
