//! In-memory collaborators for tests

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

use crate::error::{ReftreeError, Result};
use super::providers::{
    DeclaredSymbol, DirectoryLister, ListedEntry, Position, ReferenceLocation, ReferenceProvider,
    SymbolProvider,
};
use super::FileKey;

pub fn key(path: &str) -> FileKey {
    FileKey::new(path).unwrap()
}

/// Directory tree held in memory
#[derive(Default)]
pub struct MemoryLister {
    dirs: HashMap<PathBuf, Vec<ListedEntry>>,
    failing: HashSet<PathBuf>,
}

impl MemoryLister {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_files(mut self, dir: &str, names: &[&str]) -> Self {
        let entries = self.dirs.entry(PathBuf::from(dir)).or_default();
        entries.extend(names.iter().map(|n| ListedEntry::file(*n)));
        self
    }

    pub fn with_dirs(mut self, dir: &str, names: &[&str]) -> Self {
        self.dirs
            .entry(PathBuf::from(dir))
            .or_default()
            .extend(names.iter().map(|n| ListedEntry::dir(*n)));
        for name in names {
            self.dirs.entry(Path::new(dir).join(name)).or_default();
        }
        self
    }

    pub fn failing(mut self, dir: &str) -> Self {
        self.failing.insert(PathBuf::from(dir));
        self
    }
}

#[async_trait]
impl DirectoryLister for MemoryLister {
    async fn list(&self, dir: &Path) -> Result<Vec<ListedEntry>> {
        if self.failing.contains(dir) {
            return Err(ReftreeError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "permission denied",
            )));
        }
        self.dirs.get(dir).cloned().ok_or_else(|| {
            ReftreeError::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "no such directory"))
        })
    }
}

/// Symbol provider answering from a fixed table
#[derive(Default)]
pub struct ScriptedSymbols {
    symbols: HashMap<FileKey, Vec<DeclaredSymbol>>,
    failing: HashSet<FileKey>,
}

impl ScriptedSymbols {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declare(mut self, file: &str, name: &str, position: Position) -> Self {
        self.symbols.entry(key(file)).or_default().push(DeclaredSymbol {
            name: name.to_string(),
            position,
        });
        self
    }

    pub fn failing(mut self, file: &str) -> Self {
        self.failing.insert(key(file));
        self
    }
}

#[async_trait]
impl SymbolProvider for ScriptedSymbols {
    async fn symbols_of(&self, file: &FileKey) -> Result<Vec<DeclaredSymbol>> {
        if self.failing.contains(file) {
            return Err(ReftreeError::Provider(format!("symbols unavailable for {}", file)));
        }
        Ok(self.symbols.get(file).cloned().unwrap_or_default())
    }

    fn provider_name(&self) -> &str {
        "scripted symbols"
    }
}

enum Answer {
    Locations(Vec<ReferenceLocation>),
    Fail,
    Hang,
}

/// Reference provider answering from a fixed table
#[derive(Default)]
pub struct ScriptedReferences {
    answers: HashMap<(FileKey, Position), Answer>,
}

impl ScriptedReferences {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn occurrences(mut self, file: &str, position: Position, sites: &[(&str, Position)]) -> Self {
        let locations = sites
            .iter()
            .map(|(site, at)| ReferenceLocation { file: key(site), position: *at })
            .collect();
        self.answers.insert((key(file), position), Answer::Locations(locations));
        self
    }

    pub fn failing(mut self, file: &str, position: Position) -> Self {
        self.answers.insert((key(file), position), Answer::Fail);
        self
    }

    pub fn hanging(mut self, file: &str, position: Position) -> Self {
        self.answers.insert((key(file), position), Answer::Hang);
        self
    }
}

#[async_trait]
impl ReferenceProvider for ScriptedReferences {
    async fn references_of(&self, file: &FileKey, position: Position) -> Result<Vec<ReferenceLocation>> {
        match self.answers.get(&(file.clone(), position)) {
            Some(Answer::Locations(locations)) => Ok(locations.clone()),
            Some(Answer::Fail) => Err(ReftreeError::Provider("reference lookup failed".to_string())),
            Some(Answer::Hang) => std::future::pending().await,
            None => Ok(Vec::new()),
        }
    }

    fn provider_name(&self) -> &str {
        "scripted references"
    }
}

/// Answers the first call from `first` only after `release` is notified,
/// and every later call from `rest` immediately.
pub struct SequencedSymbols {
    first: ScriptedSymbols,
    rest: ScriptedSymbols,
    calls: AtomicUsize,
    started: Arc<Notify>,
    release: Arc<Notify>,
}

impl SequencedSymbols {
    pub fn new(first: ScriptedSymbols, rest: ScriptedSymbols) -> Self {
        Self {
            first,
            rest,
            calls: AtomicUsize::new(0),
            started: Arc::new(Notify::new()),
            release: Arc::new(Notify::new()),
        }
    }

    /// Notified once the first call is waiting
    pub fn started_handle(&self) -> Arc<Notify> {
        Arc::clone(&self.started)
    }

    pub fn release_handle(&self) -> Arc<Notify> {
        Arc::clone(&self.release)
    }
}

#[async_trait]
impl SymbolProvider for SequencedSymbols {
    async fn symbols_of(&self, file: &FileKey) -> Result<Vec<DeclaredSymbol>> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            self.started.notify_one();
            self.release.notified().await;
            self.first.symbols_of(file).await
        } else {
            self.rest.symbols_of(file).await
        }
    }

    fn provider_name(&self) -> &str {
        "sequenced symbols"
    }
}

/// Holds the first listing until `release` is notified and answers it from
/// `first`; every later listing comes from `rest`.
pub struct SequencedLister {
    first: MemoryLister,
    rest: Box<dyn DirectoryLister>,
    calls: AtomicUsize,
    started: Arc<Notify>,
    release: Arc<Notify>,
}

impl SequencedLister {
    pub fn new(first: MemoryLister, rest: impl DirectoryLister + 'static) -> Self {
        Self {
            first,
            rest: Box::new(rest),
            calls: AtomicUsize::new(0),
            started: Arc::new(Notify::new()),
            release: Arc::new(Notify::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn started_handle(&self) -> Arc<Notify> {
        Arc::clone(&self.started)
    }

    pub fn release_handle(&self) -> Arc<Notify> {
        Arc::clone(&self.release)
    }
}

#[async_trait]
impl DirectoryLister for SequencedLister {
    async fn list(&self, dir: &Path) -> Result<Vec<ListedEntry>> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            self.started.notify_one();
            self.release.notified().await;
            self.first.list(dir).await
        } else {
            self.rest.list(dir).await
        }
    }
}
