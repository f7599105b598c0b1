mod engine;

// Graph building blocks
mod file_key;
mod exclusion;
mod discovery;
mod collector;
mod graph;
mod pipeline;

// Presentation
mod tree;
mod render;

// Collaborators
mod providers;
mod languages;

#[cfg(test)]
mod testing;

pub use file_key::FileKey;
pub use exclusion::ExclusionPolicy;
pub use discovery::{FileDiscovery, SuffixPattern};
pub use collector::{CollectionStats, SymbolReferenceCollector};
pub use graph::{invert, DependencyMap, GraphStats, ReferenceGraph, ReferenceMap};
pub use pipeline::{Pipeline, PipelineReport, PipelineSettings};
pub use tree::{GraphTreeModel, ModelState, RebuildOutcome, TreeEvent, TreeNode};
pub use render::{GraphSnapshot, TreeRenderer};
pub use providers::{
    DeclaredSymbol, DirectoryLister, FsDirectoryLister, LexicalReferenceProvider, ListedEntry,
    Position, ReferenceLocation, ReferenceProvider, SymbolProvider, SyntaxSymbolProvider,
};

// Export the main engine
pub use engine::{Engine, ProjectOverrides};
