use std::path::PathBuf;
use thiserror::Error;

/// Main error type for reftree operations
#[derive(Error, Debug)]
pub enum ReftreeError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Root directory does not exist: {}", .0.display())]
    RootNotFound(PathBuf),

    #[error("Root directory {} could not be read: {source}", path.display())]
    RootUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Provider call timed out after {0} ms")]
    Timeout(u64),

    #[error("Parser error: {0}")]
    Parser(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Pattern error: {0}")]
    Pattern(#[from] regex::Error),

    #[error("File system error: {0}")]
    FileSystem(String),
}

impl ReftreeError {
    /// Fatal errors abort the pipeline; everything else is recovered per file or symbol.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ReftreeError::Config(_)
                | ReftreeError::RootNotFound(_)
                | ReftreeError::RootUnreadable { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, ReftreeError>;
