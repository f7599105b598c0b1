use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet};

use super::FileKey;

/// `A -> {B, ...}`: a symbol declared in A is referenced from inside B
pub type ReferenceMap = BTreeMap<FileKey, BTreeSet<FileKey>>;

/// `B -> {A, ...}`: B depends on A. The transpose of a `ReferenceMap`.
pub type DependencyMap = BTreeMap<FileKey, BTreeSet<FileKey>>;

/// Transpose a finished reference map.
///
/// Keys with empty value sets contribute nothing; they stay visible through
/// the reference map's own key set.
pub fn invert(references: &ReferenceMap) -> DependencyMap {
    let mut dependencies = DependencyMap::new();

    for (declaring, referencing) in references {
        for file in referencing {
            dependencies
                .entry(file.clone())
                .or_default()
                .insert(declaring.clone());
        }
    }

    dependencies
}

/// Immutable, fully built pair of maps
#[derive(Debug, Clone, Serialize)]
pub struct ReferenceGraph {
    references: ReferenceMap,
    dependencies: DependencyMap,
    fingerprint: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GraphStats {
    pub files: usize,
    pub edges: usize,
    /// Files with neither references nor dependencies
    pub isolated_files: usize,
}

impl ReferenceGraph {
    /// Freeze a reference map and derive its dependency map in one pass
    pub fn from_references(references: ReferenceMap) -> Self {
        let dependencies = invert(&references);
        let fingerprint = fingerprint(&references);
        Self {
            references,
            dependencies,
            fingerprint,
        }
    }

    pub fn references(&self) -> &ReferenceMap {
        &self.references
    }

    pub fn dependencies(&self) -> &DependencyMap {
        &self.dependencies
    }

    /// Files that reference a symbol declared in `file`
    pub fn references_of(&self, file: &FileKey) -> impl Iterator<Item = &FileKey> {
        self.references.get(file).into_iter().flatten()
    }

    /// Files declaring symbols that `file` uses
    pub fn dependencies_of(&self, file: &FileKey) -> impl Iterator<Item = &FileKey> {
        self.dependencies.get(file).into_iter().flatten()
    }

    /// Graph nodes, in key order
    pub fn files(&self) -> impl Iterator<Item = &FileKey> {
        self.references.keys()
    }

    pub fn contains(&self, file: &FileKey) -> bool {
        self.references.contains_key(file)
    }

    /// SHA-256 over the sorted edge list; equal graphs share a fingerprint
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn stats(&self) -> GraphStats {
        let edges = self.references.values().map(BTreeSet::len).sum();
        let isolated_files = self
            .references
            .iter()
            .filter(|(file, referencing)| {
                referencing.is_empty() && !self.dependencies.contains_key(*file)
            })
            .count();

        GraphStats {
            files: self.references.len(),
            edges,
            isolated_files,
        }
    }
}

fn fingerprint(references: &ReferenceMap) -> String {
    let mut hasher = Sha256::new();
    for (declaring, referencing) in references {
        hasher.update(declaring.as_str().as_bytes());
        hasher.update(b"\n");
        for file in referencing {
            hasher.update(b"\t");
            hasher.update(file.as_str().as_bytes());
            hasher.update(b"\n");
        }
    }
    format!("{:x}", hasher.finalize())
}
