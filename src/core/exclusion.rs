use std::collections::BTreeSet;

use super::file_key::fold_case;
use super::FileKey;

/// Excluded-directory rule shared by discovery and edge recording.
///
/// A path is excluded when one of its directory segments below the root is
/// exactly one of the configured names, compared with the same case folding
/// as `FileKey` equality.
#[derive(Debug, Clone)]
pub struct ExclusionPolicy {
    root: FileKey,
    names: BTreeSet<String>,
}

impl ExclusionPolicy {
    pub fn new<I, S>(root: FileKey, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            root,
            names: names
                .into_iter()
                .map(Into::<String>::into)
                .map(|name| fold_case(&name))
                .collect(),
        }
    }

    pub fn root(&self) -> &FileKey {
        &self.root
    }

    /// Whether a directory entry with this name is pruned
    pub fn excludes_dir_name(&self, name: &str) -> bool {
        self.names.contains(&fold_case(name))
    }

    /// Whether a file lies inside an excluded directory
    pub fn excludes(&self, key: &FileKey) -> bool {
        key.segments_below(&self.root)
            .iter()
            .any(|segment| self.names.contains(segment))
    }
}
