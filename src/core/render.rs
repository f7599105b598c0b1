use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt::Write as _;

use crate::config::OutputConfig;
use super::collector::CollectionStats;
use super::graph::{GraphStats, ReferenceGraph};
use super::tree::{GraphTreeModel, TreeNode};
use super::{DependencyMap, FileKey, ReferenceMap};

/// Point-in-time export of a committed graph
#[derive(Debug, Clone, Serialize)]
pub struct GraphSnapshot {
    pub generated_at: DateTime<Utc>,
    pub root: FileKey,
    pub fingerprint: String,
    pub stats: GraphStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collection: Option<CollectionStats>,
    pub references: ReferenceMap,
    pub dependencies: DependencyMap,
}

impl GraphSnapshot {
    pub fn new(root: FileKey, graph: &ReferenceGraph, collection: Option<CollectionStats>) -> Self {
        Self {
            generated_at: Utc::now(),
            root,
            fingerprint: graph.fingerprint().to_string(),
            stats: graph.stats(),
            collection,
            references: graph.references().clone(),
            dependencies: graph.dependencies().clone(),
        }
    }

    pub fn to_json(&self) -> crate::error::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Prints the tree exactly as the model exposes it, one node per line
pub struct TreeRenderer {
    show_full_paths: bool,
    indent: usize,
}

impl TreeRenderer {
    pub fn new(config: &OutputConfig) -> Self {
        Self {
            show_full_paths: config.show_full_paths,
            indent: 2,
        }
    }

    /// Every root node, fully expanded
    pub async fn render(&self, model: &GraphTreeModel) -> String {
        let roots = model.root_nodes().await;
        self.render_from(model, roots).await
    }

    /// The subtree of one root-level file, or `None` when the graph does not
    /// know it (or is not ready)
    pub async fn render_file(&self, model: &GraphTreeModel, file: &FileKey) -> Option<String> {
        if !model.graph().await?.contains(file) {
            return None;
        }
        let root = TreeNode::File {
            file: file.clone(),
            expandable: true,
        };
        Some(self.render_from(model, vec![root]).await)
    }

    async fn render_from(&self, model: &GraphTreeModel, roots: Vec<TreeNode>) -> String {
        let mut out = String::new();
        let mut pending: Vec<(TreeNode, usize)> = roots.into_iter().rev().map(|n| (n, 0)).collect();

        while let Some((node, depth)) = pending.pop() {
            self.write_line(&mut out, &node, depth);
            if node.is_expandable() {
                let children = model.children(&node).await;
                pending.extend(children.into_iter().rev().map(|c| (c, depth + 1)));
            }
        }

        out
    }

    fn write_line(&self, out: &mut String, node: &TreeNode, depth: usize) {
        let pad = " ".repeat(depth * self.indent);
        match node.description() {
            Some(description) if self.show_full_paths => {
                let _ = writeln!(out, "{}{}  ({})", pad, node.label(), description);
            }
            _ => {
                let _ = writeln!(out, "{}{}", pad, node.label());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::pipeline::{Pipeline, PipelineSettings};
    use crate::core::providers::Position;
    use crate::core::testing::{key, MemoryLister, ScriptedReferences, ScriptedSymbols};
    use crate::core::tree::LOADING_LABEL;
    use std::sync::Arc;
    use std::time::Duration;

    fn model() -> GraphTreeModel {
        let settings = PipelineSettings {
            root: key("/ws"),
            extension: "ts".to_string(),
            exclude_dirs: vec![],
            concurrency: 2,
            provider_timeout: Duration::from_secs(1),
        };
        let lister = MemoryLister::new().with_files("/ws", &["a.ts", "b.ts"]);
        let symbols = ScriptedSymbols::new().declare("/ws/a.ts", "X", Position::new(0, 0));
        let references = ScriptedReferences::new()
            .occurrences("/ws/a.ts", Position::new(0, 0), &[("/ws/b.ts", Position::new(4, 2))]);
        let pipeline = Pipeline::new(settings, Arc::new(lister), Arc::new(symbols), Arc::new(references)).unwrap();
        GraphTreeModel::new(pipeline)
    }

    #[tokio::test]
    async fn test_render_loading_placeholder() {
        let renderer = TreeRenderer::new(&OutputConfig::default());
        let text = renderer.render(&model()).await;
        assert_eq!(text, format!("{}\n", LOADING_LABEL));
    }

    #[tokio::test]
    async fn test_render_expanded_tree() {
        let model = model();
        model.rebuild().await.unwrap();

        let text = TreeRenderer::new(&OutputConfig::default()).render(&model).await;
        let expected = "\
a.ts
  Dependencies
  References
    b.ts
b.ts
  Dependencies
    a.ts
  References
";
        assert_eq!(text, expected);
    }

    #[tokio::test]
    async fn test_render_single_file_with_paths() {
        let model = model();
        model.rebuild().await.unwrap();

        let config = OutputConfig {
            show_full_paths: true,
            ..OutputConfig::default()
        };
        let renderer = TreeRenderer::new(&config);

        let text = renderer.render_file(&model, &key("/ws/b.ts")).await.unwrap();
        assert!(text.starts_with("b.ts  (/ws/b.ts)\n"));
        assert!(text.contains("    a.ts  (/ws/a.ts)\n"));
        assert!(renderer.render_file(&model, &key("/ws/missing.ts")).await.is_none());
    }

    #[tokio::test]
    async fn test_snapshot_json_shape() {
        let model = model();
        model.rebuild().await.unwrap();
        let graph = model.graph().await.unwrap();

        let snapshot = GraphSnapshot::new(key("/ws"), &graph, None);
        let value: serde_json::Value = serde_json::from_str(&snapshot.to_json().unwrap()).unwrap();

        assert_eq!(value["fingerprint"], graph.fingerprint());
        assert_eq!(value["stats"]["edges"], 1);
        assert_eq!(value["references"]["/ws/a.ts"][0], "/ws/b.ts");
        assert_eq!(value["dependencies"]["/ws/b.ts"][0], "/ws/a.ts");
        assert!(value.get("collection").is_none());
        assert!(value["generated_at"].is_string());
    }
}
