use async_trait::async_trait;
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::config::ParsingConfig;
use crate::error::{ReftreeError, Result};
use super::super::languages::create_parser;
use super::super::FileKey;
use super::{DeclaredSymbol, SymbolProvider};

/// Symbol provider that reports top-level declarations found by tree-sitter
pub struct SyntaxSymbolProvider {
    /// extension -> language name
    extensions: HashMap<String, String>,
    max_file_size: usize,
}

impl SyntaxSymbolProvider {
    pub fn new(config: &ParsingConfig) -> Result<Self> {
        let mut extensions = HashMap::new();

        for language in &config.languages {
            match create_parser(language) {
                Ok(parser) => {
                    for extension in parser.file_extensions() {
                        extensions.insert(extension.to_string(), parser.language_name().to_string());
                    }
                }
                Err(e) => {
                    // For now, skip unsupported languages
                    warn!("Skipping language '{}': {}", language, e);
                }
            }
        }

        debug!("Syntax provider handles extensions: {:?}", extensions.keys().collect::<Vec<_>>());

        Ok(Self {
            extensions,
            max_file_size: config.max_file_size,
        })
    }

    fn language_for(&self, file: &FileKey) -> Result<&str> {
        file.path()
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| self.extensions.get(ext))
            .map(String::as_str)
            .ok_or_else(|| {
                ReftreeError::Parser(format!("Could not detect language for file: {}", file))
            })
    }
}

#[async_trait]
impl SymbolProvider for SyntaxSymbolProvider {
    async fn symbols_of(&self, file: &FileKey) -> Result<Vec<DeclaredSymbol>> {
        let language = self.language_for(file)?.to_string();
        let content = tokio::fs::read_to_string(file.path()).await?;

        if content.len() > self.max_file_size {
            return Err(ReftreeError::Parser(format!(
                "File {} exceeds maximum size limit",
                file
            )));
        }

        let path = file.path().to_path_buf();
        tokio::task::spawn_blocking(move || {
            let mut parser = create_parser(&language)?;
            parser.declarations(&content, &path)
        })
        .await
        .map_err(|e| ReftreeError::Provider(format!("declaration task failed: {}", e)))?
    }

    fn provider_name(&self) -> &str {
        "tree-sitter declarations"
    }
}
