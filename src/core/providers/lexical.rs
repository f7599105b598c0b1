use async_trait::async_trait;
use regex::Regex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::error::{ReftreeError, Result};
use super::super::FileKey;
use super::{Position, ReferenceLocation, ReferenceProvider};

/// Identifier occurrences across the prepared file set
#[derive(Debug, Default)]
struct OccurrenceIndex {
    /// identifier -> every place it appears
    occurrences: HashMap<String, Vec<ReferenceLocation>>,
    /// file -> identifier starting at each position
    identifiers: HashMap<FileKey, HashMap<Position, String>>,
}

/// Reference provider backed by a lexical identifier index.
///
/// A lookup takes the identifier that starts at the requested position and
/// returns every occurrence of that identifier in the prepared files, the
/// declaration site included. Names are matched textually, so shadowing and
/// homonyms resolve to the same set of locations.
pub struct LexicalReferenceProvider {
    identifier_regex: Regex,
    index: RwLock<Arc<OccurrenceIndex>>,
}

impl LexicalReferenceProvider {
    pub fn new() -> Result<Self> {
        Ok(Self {
            identifier_regex: Regex::new(r"[\p{L}_$][\p{L}\p{N}_$]*")?,
            index: RwLock::new(Arc::new(OccurrenceIndex::default())),
        })
    }

    fn index_source(&self, file: &FileKey, source: &str, index: &mut OccurrenceIndex) {
        let mut at_position = HashMap::new();

        for (line_number, line) in source.lines().enumerate() {
            for token in self.identifier_regex.find_iter(line) {
                let position = Position::new(line_number, token.start());
                let name = token.as_str().to_string();

                index
                    .occurrences
                    .entry(name.clone())
                    .or_default()
                    .push(ReferenceLocation { file: file.clone(), position });
                at_position.insert(position, name);
            }
        }

        index.identifiers.insert(file.clone(), at_position);
    }
}

#[async_trait]
impl ReferenceProvider for LexicalReferenceProvider {
    async fn references_of(&self, file: &FileKey, position: Position) -> Result<Vec<ReferenceLocation>> {
        let index = Arc::clone(&*self.index.read().await);

        let identifiers = index
            .identifiers
            .get(file)
            .ok_or_else(|| ReftreeError::Provider(format!("{} was not indexed", file)))?;

        let Some(name) = identifiers.get(&position) else {
            debug!("No identifier at {}:{}:{}", file, position.line, position.character);
            return Ok(Vec::new());
        };

        Ok(index.occurrences.get(name).cloned().unwrap_or_default())
    }

    async fn prepare(&self, files: &[FileKey]) -> Result<()> {
        let mut index = OccurrenceIndex::default();

        for file in files {
            match tokio::fs::read_to_string(file.path()).await {
                Ok(source) => self.index_source(file, &source, &mut index),
                Err(e) => warn!("Skipping {} while indexing identifiers: {}", file, e),
            }
        }

        info!(
            "Indexed {} identifiers across {} files",
            index.occurrences.len(),
            index.identifiers.len()
        );

        *self.index.write().await = Arc::new(index);
        Ok(())
    }

    fn provider_name(&self) -> &str {
        "lexical occurrences"
    }
}
