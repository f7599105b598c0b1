use regex::Regex;
use std::future::Future;
use std::pin::Pin;
use tracing::{debug, info, warn};

use crate::error::{ReftreeError, Result};
use super::providers::DirectoryLister;
use super::{ExclusionPolicy, FileKey};

/// Case-sensitive filename filter for one extension.
///
/// Accepts names built from ASCII word characters, spaces, dots, dashes,
/// parentheses and colons that end in `.<extension>`.
#[derive(Debug, Clone)]
pub struct SuffixPattern {
    regex: Regex,
}

impl SuffixPattern {
    pub fn for_extension(extension: &str) -> Result<Self> {
        let extension = extension.trim_start_matches('.');
        if extension.is_empty() {
            return Err(ReftreeError::Config("extension must not be empty".to_string()));
        }
        let regex = Regex::new(&format!(
            r"^[A-Za-z0-9_ .\-():]+\.{}$",
            regex::escape(extension)
        ))?;
        Ok(Self { regex })
    }

    pub fn matches(&self, file_name: &str) -> bool {
        self.regex.is_match(file_name)
    }
}

/// Recursive file discovery over a `DirectoryLister`
pub struct FileDiscovery<'a> {
    lister: &'a dyn DirectoryLister,
    pattern: &'a SuffixPattern,
    exclusion: &'a ExclusionPolicy,
}

type WalkFuture<'f> = Pin<Box<dyn Future<Output = ()> + Send + 'f>>;

impl<'a> FileDiscovery<'a> {
    pub fn new(
        lister: &'a dyn DirectoryLister,
        pattern: &'a SuffixPattern,
        exclusion: &'a ExclusionPolicy,
    ) -> Self {
        Self { lister, pattern, exclusion }
    }

    /// Every matching file below the exclusion policy's root.
    ///
    /// Entries are visited in name order so repeated runs list files in the
    /// same order. Only a root that cannot be listed is an error.
    pub async fn discover(&self) -> Result<Vec<FileKey>> {
        let root = self.exclusion.root();

        let entries = self.lister.list(root.path()).await.map_err(|e| match e {
            ReftreeError::Io(source) if source.kind() == std::io::ErrorKind::NotFound => {
                ReftreeError::RootNotFound(root.path().to_path_buf())
            }
            ReftreeError::Io(source) => ReftreeError::RootUnreadable {
                path: root.path().to_path_buf(),
                source,
            },
            other => ReftreeError::RootUnreadable {
                path: root.path().to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::Other, other.to_string()),
            },
        })?;

        let mut files = Vec::new();
        self.visit_entries(root, entries, &mut files).await;

        info!("Discovered {} files under {}", files.len(), root);
        Ok(files)
    }

    fn walk<'f>(&'f self, dir: FileKey, files: &'f mut Vec<FileKey>) -> WalkFuture<'f> {
        Box::pin(async move {
            match self.lister.list(dir.path()).await {
                Ok(entries) => self.visit_entries(&dir, entries, files).await,
                Err(e) => warn!("Skipping unreadable directory {}: {}", dir, e),
            }
        })
    }

    async fn visit_entries(
        &self,
        dir: &FileKey,
        mut entries: Vec<super::providers::ListedEntry>,
        files: &mut Vec<FileKey>,
    ) {
        entries.sort_by(|a, b| a.name.cmp(&b.name));

        let (regular, subdirs): (Vec<_>, Vec<_>) = entries.into_iter().partition(|e| e.is_file);

        for entry in regular {
            if self.pattern.matches(&entry.name) {
                files.push(dir.join(&entry.name));
            }
        }

        for entry in subdirs {
            if self.exclusion.excludes_dir_name(&entry.name) {
                debug!("Pruning excluded directory {}/{}", dir, entry.name);
                continue;
            }
            // A directory is finished only once its whole subtree is
            self.walk(dir.join(&entry.name), files).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::providers::FsDirectoryLister;
    use crate::core::testing::MemoryLister;

    #[test]
    fn test_suffix_pattern() {
        let pattern = SuffixPattern::for_extension("ts").unwrap();
        assert!(pattern.matches("foo.ts"));
        assert!(pattern.matches("my file (1).ts"));
        assert!(pattern.matches("node-deps.spec.ts"));
        assert!(!pattern.matches("foo.tsx"));
        assert!(!pattern.matches("foo.ts.bak"));
        assert!(!pattern.matches("fo$o.ts"));
        assert!(!pattern.matches("foo.TS"));
        assert!(!pattern.matches("fooxts"));
    }

    #[tokio::test]
    async fn test_nested_tree_is_fully_discovered() {
        let lister = MemoryLister::new()
            .with_files("/ws", &["a.ts", "readme.md"])
            .with_dirs("/ws", &["src", "node_modules"])
            .with_files("/ws/src", &["b.ts"])
            .with_dirs("/ws/src", &["deep"])
            .with_files("/ws/src/deep", &["c.ts", "d.ts"])
            .with_files("/ws/node_modules", &["x.ts", "y.ts"])
            .with_dirs("/ws/node_modules", &["pkg"])
            .with_files("/ws/node_modules/pkg", &["z.ts"]);

        let pattern = SuffixPattern::for_extension("ts").unwrap();
        let exclusion = ExclusionPolicy::new(FileKey::new("/ws").unwrap(), ["node_modules"]);
        let files = FileDiscovery::new(&lister, &pattern, &exclusion).discover().await.unwrap();

        let names: Vec<String> = files.iter().map(|f| f.as_str().to_string()).collect();
        assert_eq!(
            names,
            vec!["/ws/a.ts", "/ws/src/b.ts", "/ws/src/deep/c.ts", "/ws/src/deep/d.ts"]
        );
    }

    #[tokio::test]
    async fn test_unreadable_subdirectory_is_skipped() {
        let lister = MemoryLister::new()
            .with_files("/ws", &["a.ts"])
            .with_dirs("/ws", &["locked", "open"])
            .with_files("/ws/open", &["b.ts"])
            .failing("/ws/locked");

        let pattern = SuffixPattern::for_extension("ts").unwrap();
        let exclusion = ExclusionPolicy::new(FileKey::new("/ws").unwrap(), Vec::<String>::new());
        let files = FileDiscovery::new(&lister, &pattern, &exclusion).discover().await.unwrap();

        assert_eq!(files.len(), 2);
    }

    #[tokio::test]
    async fn test_missing_root_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let root = FileKey::new(dir.path().join("missing")).unwrap();

        let lister = FsDirectoryLister::new();
        let pattern = SuffixPattern::for_extension("ts").unwrap();
        let exclusion = ExclusionPolicy::new(root, ["node_modules"]);
        let result = FileDiscovery::new(&lister, &pattern, &exclusion).discover().await;

        assert!(matches!(result, Err(ReftreeError::RootNotFound(_))));
    }

    #[tokio::test]
    async fn test_discovery_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("src/nested")).unwrap();
        std::fs::create_dir_all(dir.path().join("node_modules/lib")).unwrap();
        std::fs::write(dir.path().join("src/a.ts"), "").unwrap();
        std::fs::write(dir.path().join("src/nested/b.ts"), "").unwrap();
        std::fs::write(dir.path().join("src/nested/b.js"), "").unwrap();
        std::fs::write(dir.path().join("node_modules/lib/c.ts"), "").unwrap();

        let lister = FsDirectoryLister::new();
        let pattern = SuffixPattern::for_extension("ts").unwrap();
        let exclusion = ExclusionPolicy::new(FileKey::new(dir.path()).unwrap(), ["node_modules"]);
        let files = FileDiscovery::new(&lister, &pattern, &exclusion).discover().await.unwrap();

        let names: Vec<String> = files.iter().map(|f| f.display_name()).collect();
        assert_eq!(names, vec!["a.ts", "b.ts"]);
    }
}
