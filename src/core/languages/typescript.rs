use std::path::Path;
use tree_sitter::Parser;

use crate::error::{ReftreeError, Result};
use super::javascript::module_items;
use super::{parse_tree, DeclaredSymbol, LanguageParser};

/// TypeScript parser; `.tsx` files use the TSX dialect of the grammar
pub struct TypeScriptParser {
    typescript: Parser,
    tsx: Parser,
}

impl TypeScriptParser {
    pub fn new() -> Result<Self> {
        let mut typescript = Parser::new();
        typescript
            .set_language(&tree_sitter_typescript::language_typescript())
            .map_err(|e| ReftreeError::Parser(format!("Failed to set TypeScript language: {}", e)))?;

        let mut tsx = Parser::new();
        tsx.set_language(&tree_sitter_typescript::language_tsx())
            .map_err(|e| ReftreeError::Parser(format!("Failed to set TSX language: {}", e)))?;

        Ok(Self { typescript, tsx })
    }
}

impl LanguageParser for TypeScriptParser {
    fn declarations(&mut self, content: &str, file_path: &Path) -> Result<Vec<DeclaredSymbol>> {
        let is_tsx = file_path.extension().and_then(|ext| ext.to_str()) == Some("tsx");
        let parser = if is_tsx { &mut self.tsx } else { &mut self.typescript };

        let tree = parse_tree(parser, content, "TypeScript")?;
        let mut symbols = Vec::new();
        module_items(tree.root_node(), content, &mut symbols);
        Ok(symbols)
    }

    fn file_extensions(&self) -> &[&str] {
        &["ts", "tsx", "mts", "cts"]
    }

    fn language_name(&self) -> &str {
        "typescript"
    }
}
