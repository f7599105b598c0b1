use serde::{Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::{Component, Path, PathBuf};

use crate::error::{ReftreeError, Result};

/// Canonical identifier for a source file.
///
/// Two keys are equal iff their comparison forms are equal. The comparison
/// form is the lexically normalized absolute path joined with `/`, folded to
/// lowercase on case-insensitive platforms. The normalized path itself is kept
/// for I/O and display.
#[derive(Debug, Clone)]
pub struct FileKey {
    path: PathBuf,
    canonical: String,
}

impl FileKey {
    /// Build a key from any path. Relative paths are resolved against the
    /// current working directory.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()
                .map_err(|e| {
                    ReftreeError::FileSystem(format!(
                        "cannot resolve {} without a working directory: {}",
                        path.display(),
                        e
                    ))
                })?
                .join(path)
        };

        let path = normalize(&absolute);
        let canonical = canonical_form(&path);
        Ok(Self { path, canonical })
    }

    /// The normalized absolute path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The comparison form.
    pub fn as_str(&self) -> &str {
        &self.canonical
    }

    /// Short label for display: the last path segment.
    pub fn display_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.canonical.clone())
    }

    /// Key for a child entry of this directory key.
    pub fn join(&self, name: &str) -> Self {
        let path = normalize(&self.path.join(name));
        let canonical = canonical_form(&path);
        Self { path, canonical }
    }

    /// Directory segments between `root` and this key, excluding the file name,
    /// in comparison form. Keys outside `root` yield all of their directory
    /// segments.
    pub fn segments_below(&self, root: &FileKey) -> Vec<String> {
        let root = root.canonical.trim_end_matches('/');
        let relative = self
            .canonical
            .strip_prefix(root)
            .filter(|rest| rest.starts_with('/'))
            .unwrap_or(&self.canonical);

        let mut segments: Vec<String> = relative
            .split('/')
            .filter(|segment| !segment.is_empty())
            .map(str::to_string)
            .collect();
        segments.pop();
        segments
    }
}

/// Resolve `.` and `..` lexically. Symlinks are not followed.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

fn canonical_form(path: &Path) -> String {
    fold_case(&path.to_string_lossy().replace('\\', "/"))
}

/// Case folding used by key comparison: lowercase on case-insensitive platforms
pub(crate) fn fold_case(text: &str) -> String {
    if cfg!(any(windows, target_os = "macos")) {
        text.to_lowercase()
    } else {
        text.to_string()
    }
}

impl PartialEq for FileKey {
    fn eq(&self, other: &Self) -> bool {
        self.canonical == other.canonical
    }
}

impl Eq for FileKey {}

impl Hash for FileKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical.hash(state);
    }
}

impl PartialOrd for FileKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FileKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.canonical.cmp(&other.canonical)
    }
}

impl fmt::Display for FileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

impl Serialize for FileKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.path.to_string_lossy())
    }
}
