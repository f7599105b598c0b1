use async_trait::async_trait;
use std::path::Path;

use crate::error::Result;
use super::{DirectoryLister, ListedEntry};

/// Directory lister backed by `tokio::fs`.
///
/// Symlinked directories are reported as neither files nor directories and are
/// skipped, so the walk stays finite.
#[derive(Debug, Default, Clone)]
pub struct FsDirectoryLister;

impl FsDirectoryLister {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DirectoryLister for FsDirectoryLister {
    async fn list(&self, dir: &Path) -> Result<Vec<ListedEntry>> {
        let mut entries = Vec::new();
        let mut read_dir = tokio::fs::read_dir(dir).await?;

        while let Some(entry) = read_dir.next_entry().await? {
            let file_type = entry.file_type().await?;
            let name = entry.file_name().to_string_lossy().to_string();

            if file_type.is_file() {
                entries.push(ListedEntry::file(name));
            } else if file_type.is_dir() {
                entries.push(ListedEntry::dir(name));
            }
        }

        Ok(entries)
    }
}
