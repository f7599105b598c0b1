use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::error::{ReftreeError, Result};
use super::providers::{ReferenceProvider, SymbolProvider};
use super::{ExclusionPolicy, FileKey, ReferenceMap};

/// Counters for one collection run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CollectionStats {
    pub files: usize,
    pub symbols: usize,
    pub reference_lookups: usize,
    pub failed_lookups: usize,
    pub edges: usize,
    pub self_references: usize,
    pub excluded_references: usize,
}

impl CollectionStats {
    fn absorb(&mut self, other: &CollectionStats) {
        self.files += other.files;
        self.symbols += other.symbols;
        self.reference_lookups += other.reference_lookups;
        self.failed_lookups += other.failed_lookups;
        self.self_references += other.self_references;
        self.excluded_references += other.excluded_references;
    }
}

/// Queries the symbol and reference providers for every discovered file
#[derive(Debug, Clone)]
pub struct SymbolReferenceCollector {
    exclusion: Arc<ExclusionPolicy>,
    concurrency: usize,
    timeout: Duration,
}

impl SymbolReferenceCollector {
    pub fn new(exclusion: Arc<ExclusionPolicy>, concurrency: usize, timeout: Duration) -> Self {
        Self {
            exclusion,
            concurrency: concurrency.max(1),
            timeout,
        }
    }

    /// Build the reference map for `files`.
    ///
    /// Every file becomes a key. Provider failures and timeouts count as "no
    /// answer" for that file or symbol and never stop the run.
    pub async fn collect(
        &self,
        files: &[FileKey],
        symbols: Arc<dyn SymbolProvider>,
        references: Arc<dyn ReferenceProvider>,
    ) -> (ReferenceMap, CollectionStats) {
        info!(
            "🔗 Collecting references for {} files ({} at a time, {} / {})",
            files.len(),
            self.concurrency,
            symbols.provider_name(),
            references.provider_name()
        );

        let permits = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();

        for file in files.iter().cloned() {
            let permits = Arc::clone(&permits);
            let worker = self.clone();
            let symbols = Arc::clone(&symbols);
            let references = Arc::clone(&references);

            tasks.spawn(async move {
                let _permit = permits.acquire_owned().await.ok();
                let (referencing, stats) = worker
                    .collect_file(&file, symbols.as_ref(), references.as_ref())
                    .await;
                (file, referencing, stats)
            });
        }

        let mut map = ReferenceMap::new();
        let mut stats = CollectionStats::default();

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((file, referencing, file_stats)) => {
                    stats.absorb(&file_stats);
                    map.entry(file).or_default().extend(referencing);
                }
                Err(e) => warn!("Collection task failed: {}", e),
            }
        }

        // Files whose task died still appear as nodes
        for file in files {
            map.entry(file.clone()).or_default();
        }

        stats.edges = map.values().map(BTreeSet::len).sum();
        info!(
            "Collected {} edges from {} symbols ({} failed lookups)",
            stats.edges, stats.symbols, stats.failed_lookups
        );
        (map, stats)
    }

    async fn collect_file(
        &self,
        file: &FileKey,
        symbols: &dyn SymbolProvider,
        references: &dyn ReferenceProvider,
    ) -> (BTreeSet<FileKey>, CollectionStats) {
        let mut stats = CollectionStats {
            files: 1,
            ..CollectionStats::default()
        };
        let mut referencing = BTreeSet::new();

        let declared = match self.bounded(symbols.symbols_of(file)).await {
            Ok(declared) => declared,
            Err(e) => {
                warn!("No symbols for {}: {}", file, e);
                stats.failed_lookups += 1;
                return (referencing, stats);
            }
        };
        stats.symbols = declared.len();

        for symbol in &declared {
            stats.reference_lookups += 1;
            let locations = match self.bounded(references.references_of(file, symbol.position)).await {
                Ok(locations) => locations,
                Err(e) => {
                    warn!("No references for {} in {}: {}", symbol.name, file, e);
                    stats.failed_lookups += 1;
                    continue;
                }
            };

            for location in locations {
                if location.file == *file {
                    stats.self_references += 1;
                } else if self.exclusion.excludes(&location.file) {
                    stats.excluded_references += 1;
                } else {
                    referencing.insert(location.file);
                }
            }
        }

        debug!("{}: {} symbols, referenced from {} files", file, declared.len(), referencing.len());
        (referencing, stats)
    }

    async fn bounded<T, F>(&self, call: F) -> Result<T>
    where
        F: std::future::Future<Output = Result<T>>,
    {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(ReftreeError::Timeout(self.timeout.as_millis() as u64)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::providers::Position;
    use crate::core::testing::{key, ScriptedReferences, ScriptedSymbols};

    fn collector(concurrency: usize) -> SymbolReferenceCollector {
        let exclusion = ExclusionPolicy::new(key("/ws"), ["node_modules"]);
        SymbolReferenceCollector::new(Arc::new(exclusion), concurrency, Duration::from_millis(200))
    }

    #[tokio::test]
    async fn test_call_site_in_other_file_records_edge() {
        let symbols = ScriptedSymbols::new().declare("/ws/a.ts", "X", Position::new(0, 16));
        let references = ScriptedReferences::new().occurrences(
            "/ws/a.ts",
            Position::new(0, 16),
            &[("/ws/a.ts", Position::new(0, 16)), ("/ws/b.ts", Position::new(1, 0))],
        );

        let files = vec![key("/ws/a.ts"), key("/ws/b.ts")];
        let (map, stats) = collector(4)
            .collect(&files, Arc::new(symbols), Arc::new(references))
            .await;

        assert_eq!(map[&key("/ws/a.ts")], [key("/ws/b.ts")].into_iter().collect());
        assert!(map[&key("/ws/b.ts")].is_empty());
        assert_eq!(stats.edges, 1);
        assert_eq!(stats.self_references, 1);
    }

    #[tokio::test]
    async fn test_declaration_only_reference_adds_nothing() {
        let symbols = ScriptedSymbols::new().declare("/ws/a.ts", "X", Position::new(2, 4));
        let references = ScriptedReferences::new().occurrences(
            "/ws/a.ts",
            Position::new(2, 4),
            &[("/ws/a.ts", Position::new(2, 4))],
        );

        let files = vec![key("/ws/a.ts")];
        let (map, stats) = collector(1)
            .collect(&files, Arc::new(symbols), Arc::new(references))
            .await;

        assert!(map[&key("/ws/a.ts")].is_empty());
        assert_eq!(stats.edges, 0);
    }

    #[tokio::test]
    async fn test_excluded_reference_is_filtered() {
        let symbols = ScriptedSymbols::new().declare("/ws/a.ts", "X", Position::new(0, 0));
        let references = ScriptedReferences::new().occurrences(
            "/ws/a.ts",
            Position::new(0, 0),
            &[("/ws/node_modules/c.ts", Position::new(3, 1)), ("/ws/b.ts", Position::new(0, 0))],
        );

        let files = vec![key("/ws/a.ts"), key("/ws/b.ts")];
        let (map, stats) = collector(2)
            .collect(&files, Arc::new(symbols), Arc::new(references))
            .await;

        assert_eq!(map[&key("/ws/a.ts")], [key("/ws/b.ts")].into_iter().collect());
        assert!(!map.values().flatten().any(|f| f.as_str().contains("node_modules")));
        assert_eq!(stats.excluded_references, 1);
    }

    #[tokio::test]
    async fn test_provider_failures_do_not_abort() {
        let symbols = ScriptedSymbols::new()
            .declare("/ws/a.ts", "X", Position::new(0, 0))
            .declare("/ws/a.ts", "Broken", Position::new(5, 0))
            .declare("/ws/c.ts", "Slow", Position::new(0, 0))
            .failing("/ws/b.ts");
        let references = ScriptedReferences::new()
            .occurrences("/ws/a.ts", Position::new(0, 0), &[("/ws/d.ts", Position::new(0, 0))])
            .failing("/ws/a.ts", Position::new(5, 0))
            .hanging("/ws/c.ts", Position::new(0, 0));

        let files = vec![key("/ws/a.ts"), key("/ws/b.ts"), key("/ws/c.ts"), key("/ws/d.ts")];
        let (map, stats) = collector(4)
            .collect(&files, Arc::new(symbols), Arc::new(references))
            .await;

        assert_eq!(map.len(), 4);
        assert_eq!(map[&key("/ws/a.ts")], [key("/ws/d.ts")].into_iter().collect());
        assert!(map[&key("/ws/b.ts")].is_empty());
        assert!(map[&key("/ws/c.ts")].is_empty());
        assert_eq!(stats.failed_lookups, 3);
    }

    #[tokio::test]
    async fn test_collection_is_idempotent() {
        let symbols = ScriptedSymbols::new()
            .declare("/ws/a.ts", "X", Position::new(0, 0))
            .declare("/ws/b.ts", "Y", Position::new(0, 0));
        let references = ScriptedReferences::new()
            .occurrences("/ws/a.ts", Position::new(0, 0), &[("/ws/b.ts", Position::new(1, 0)), ("/ws/c.ts", Position::new(1, 0))])
            .occurrences("/ws/b.ts", Position::new(0, 0), &[("/ws/c.ts", Position::new(2, 0))]);

        let symbols: Arc<dyn SymbolProvider> = Arc::new(symbols);
        let references: Arc<dyn ReferenceProvider> = Arc::new(references);
        let files = vec![key("/ws/a.ts"), key("/ws/b.ts"), key("/ws/c.ts")];

        let (first, _) = collector(3).collect(&files, Arc::clone(&symbols), Arc::clone(&references)).await;
        let (second, _) = collector(1).collect(&files, symbols, references).await;

        assert_eq!(first, second);
        for (file, referencing) in &first {
            assert!(!referencing.contains(file));
        }
    }
}
