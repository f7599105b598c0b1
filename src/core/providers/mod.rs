//! Collaborator interfaces consumed by the pipeline
//!
//! The core only talks to the outside world through these traits: a directory
//! lister for discovery, a symbol provider for declarations and a reference
//! provider for use sites. The shipped implementations are a tokio file system
//! lister, a tree-sitter backed symbol provider and a lexical occurrence index.

mod fs;
mod lexical;
mod syntax;

pub use fs::FsDirectoryLister;
pub use lexical::LexicalReferenceProvider;
pub use syntax::SyntaxSymbolProvider;

use async_trait::async_trait;
use serde::Serialize;
use std::path::Path;

use crate::error::Result;
use super::FileKey;

/// Zero-based line and byte column inside a file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Position {
    pub line: usize,
    pub character: usize,
}

impl Position {
    pub fn new(line: usize, character: usize) -> Self {
        Self { line, character }
    }
}

/// A referenceable declaration inside a file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeclaredSymbol {
    pub name: String,
    pub position: Position,
}

/// A use site returned by a reference provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReferenceLocation {
    pub file: FileKey,
    pub position: Position,
}

/// One entry of a directory listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedEntry {
    pub name: String,
    pub is_file: bool,
}

impl ListedEntry {
    pub fn file(name: impl Into<String>) -> Self {
        Self { name: name.into(), is_file: true }
    }

    pub fn dir(name: impl Into<String>) -> Self {
        Self { name: name.into(), is_file: false }
    }
}

/// Lists the entries of a single directory
#[async_trait]
pub trait DirectoryLister: Send + Sync {
    async fn list(&self, dir: &Path) -> Result<Vec<ListedEntry>>;
}

/// Reports the top-level declarations of a file
#[async_trait]
pub trait SymbolProvider: Send + Sync {
    async fn symbols_of(&self, file: &FileKey) -> Result<Vec<DeclaredSymbol>>;

    /// Provider name used in log output
    fn provider_name(&self) -> &str;
}

/// Resolves every use site of the symbol declared at a position
#[async_trait]
pub trait ReferenceProvider: Send + Sync {
    async fn references_of(&self, file: &FileKey, position: Position) -> Result<Vec<ReferenceLocation>>;

    /// Called once per pipeline run with the discovered files, before collection
    async fn prepare(&self, _files: &[FileKey]) -> Result<()> {
        Ok(())
    }

    /// Provider name used in log output
    fn provider_name(&self) -> &str;
}
