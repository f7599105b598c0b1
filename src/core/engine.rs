use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::ReftreeError;
use super::pipeline::{Pipeline, PipelineReport, PipelineSettings};
use super::providers::{FsDirectoryLister, LexicalReferenceProvider, SyntaxSymbolProvider};
use super::render::{GraphSnapshot, TreeRenderer};
use super::tree::{GraphTreeModel, ModelState, RebuildOutcome};
use super::FileKey;

/// Per-invocation overrides of the `[project]` section
#[derive(Debug, Clone, Default)]
pub struct ProjectOverrides {
    pub root: Option<PathBuf>,
    pub extension: Option<String>,
}

/// Main orchestration engine: wires the shipped providers into a model and
/// serves the CLI commands
pub struct Engine {
    config: Config,
}

impl Engine {
    pub async fn new(config_path: Option<&Path>) -> Result<Self> {
        let config = Config::load_or_default(config_path)?;
        debug!("Loaded configuration: {:?}", config);
        Ok(Self::with_config(config))
    }

    pub fn with_config(config: Config) -> Self {
        Self { config }
    }

    fn effective_config(&self, overrides: &ProjectOverrides) -> Result<Config> {
        let mut config = self.config.clone();
        if let Some(root) = &overrides.root {
            config.project.root = root.clone();
        }
        if let Some(extension) = &overrides.extension {
            config.project.extension = extension.trim_start_matches('.').to_string();
        }
        config.validate()?;
        Ok(config)
    }

    /// A model in `Loading` state, backed by the file system and the shipped providers
    pub fn build_model(&self, overrides: &ProjectOverrides) -> Result<GraphTreeModel> {
        let config = self.effective_config(overrides)?;
        let settings = PipelineSettings::from_config(&config)?;

        let pipeline = Pipeline::new(
            settings,
            Arc::new(FsDirectoryLister::new()),
            Arc::new(SyntaxSymbolProvider::new(&config.parsing)?),
            Arc::new(LexicalReferenceProvider::new()?),
        )?;
        Ok(GraphTreeModel::new(pipeline))
    }

    /// Build a model and run its pipeline once
    pub async fn build_graph(&self, overrides: &ProjectOverrides) -> Result<(GraphTreeModel, PipelineReport)> {
        let model = self.build_model(overrides)?;
        match model.rebuild().await? {
            RebuildOutcome::Committed(report) => Ok((model, report)),
            RebuildOutcome::Superseded => bail!("reference graph rebuild was superseded"),
        }
    }

    /// Open the tree the way a viewer does: show the placeholder, rebuild in
    /// the background, and wait for the model to settle
    pub async fn activate(&self, overrides: &ProjectOverrides) -> Result<GraphTreeModel> {
        let model = self.build_model(overrides)?;
        let mut events = model.subscribe();

        model.spawn_rebuild();
        for node in model.root_nodes().await {
            info!("⏳ {}", node.label());
        }
        model.wait_for_background().await;

        let mut refreshes = 0;
        while events.try_recv().is_ok() {
            refreshes += 1;
        }
        debug!(
            "Tree refreshed {} times while building generation {}",
            refreshes,
            model.generation()
        );

        match model.state().await {
            ModelState::Ready(_) => Ok(model),
            ModelState::Loading { error: Some(error) } => bail!(error),
            ModelState::Loading { error: None } => bail!("reference graph rebuild did not finish"),
        }
    }

    pub async fn tree_output(&self, overrides: &ProjectOverrides, json: bool) -> Result<String> {
        if json || self.config.output.format == "json" {
            let (model, report) = self.build_graph(overrides).await?;
            return self.snapshot_json(&model, &report).await;
        }

        let model = self.activate(overrides).await?;
        Ok(TreeRenderer::new(&self.config.output).render(&model).await)
    }

    pub async fn show_output(&self, file: &Path, overrides: &ProjectOverrides) -> Result<String> {
        let target = FileKey::new(file)?;
        let model = self.activate(overrides).await?;

        TreeRenderer::new(&self.config.output)
            .render_file(&model, &target)
            .await
            .with_context(|| format!("{} is not part of the reference graph", target))
    }

    pub async fn stats_output(&self, overrides: &ProjectOverrides) -> Result<String> {
        let (_, report) = self.build_graph(overrides).await?;
        let collection = &report.collection;

        Ok(format!(
            "Files:               {}\n\
             Edges:               {}\n\
             Isolated files:      {}\n\
             Symbols:             {}\n\
             Reference lookups:   {}\n\
             Failed lookups:      {}\n\
             Self references:     {}\n\
             Excluded references: {}\n\
             Fingerprint:         {}\n\
             Elapsed:             {} ms\n",
            report.graph.files,
            report.graph.edges,
            report.graph.isolated_files,
            collection.symbols,
            collection.reference_lookups,
            collection.failed_lookups,
            collection.self_references,
            collection.excluded_references,
            report.fingerprint,
            report.elapsed_ms,
        ))
    }

    async fn snapshot_json(&self, model: &GraphTreeModel, report: &PipelineReport) -> Result<String> {
        let graph = model
            .graph()
            .await
            .context("reference graph is not ready")?;
        let snapshot = GraphSnapshot::new(model.root().clone(), &graph, Some(report.collection));
        Ok(snapshot.to_json()?)
    }

    pub async fn tree(&self, overrides: ProjectOverrides, json: bool) -> Result<()> {
        info!("🌳 Building reference tree...");
        print!("{}", self.tree_output(&overrides, json).await?);
        Ok(())
    }

    pub async fn show(&self, file: PathBuf, overrides: ProjectOverrides) -> Result<()> {
        info!("🔎 Showing {}", file.display());
        print!("{}", self.show_output(&file, &overrides).await?);
        Ok(())
    }

    pub async fn export(&self, output: Option<PathBuf>, overrides: ProjectOverrides) -> Result<()> {
        let (model, report) = self.build_graph(&overrides).await?;
        let json = self.snapshot_json(&model, &report).await?;

        match output {
            Some(path) => {
                tokio::fs::write(&path, json)
                    .await
                    .map_err(ReftreeError::from)
                    .with_context(|| format!("could not write {}", path.display()))?;
                info!("✅ Snapshot written to {}", path.display());
            }
            None => println!("{}", json),
        }
        Ok(())
    }

    pub async fn stats(&self, overrides: ProjectOverrides) -> Result<()> {
        print!("{}", self.stats_output(&overrides).await?);
        Ok(())
    }

    /// Write a default config file into `path` (or the working directory)
    pub async fn init(&self, path: Option<PathBuf>, force: bool) -> Result<()> {
        let target_dir = match path {
            Some(path) => path,
            None => std::env::current_dir().context("no current directory")?,
        };
        let config_path = target_dir.join("Reftree.toml");
        info!("Initializing reftree in: {}", target_dir.display());

        if config_path.exists() && !force {
            bail!("{} already exists (use --force to overwrite)", config_path.display());
        }

        let mut config = Config::default();
        if let Some(name) = target_dir.file_name() {
            config.project.name = name.to_string_lossy().to_string();
        }
        config.save(&config_path)?;

        info!("✅ Wrote {}", config_path.display());
        Ok(())
    }
}
