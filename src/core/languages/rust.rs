use std::path::Path;
use tree_sitter::{Node, Parser};

use crate::error::{ReftreeError, Result};
use super::{named_declaration, parse_tree, DeclaredSymbol, LanguageParser};

/// Item kinds that introduce a name other files can refer to
const DECLARATION_KINDS: &[&str] = &[
    "function_item",
    "struct_item",
    "enum_item",
    "union_item",
    "trait_item",
    "type_item",
    "const_item",
    "static_item",
    "mod_item",
    "macro_definition",
];

/// Rust-specific parser using Tree-sitter
pub struct RustParser {
    parser: Parser,
}

impl RustParser {
    pub fn new() -> Result<Self> {
        let mut parser = Parser::new();
        let rust_language = tree_sitter_rust::language();
        parser.set_language(&rust_language)
            .map_err(|e| ReftreeError::Parser(format!("Failed to set Rust language: {}", e)))?;

        Ok(Self { parser })
    }

    fn extract_rust_items(&self, node: Node, source: &str, symbols: &mut Vec<DeclaredSymbol>) {
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            if DECLARATION_KINDS.contains(&child.kind()) {
                if let Some(symbol) = named_declaration(child, source) {
                    symbols.push(symbol);
                }
            }
        }
    }
}

impl LanguageParser for RustParser {
    fn declarations(&mut self, content: &str, _file_path: &Path) -> Result<Vec<DeclaredSymbol>> {
        let tree = parse_tree(&mut self.parser, content, "Rust")?;
        let mut symbols = Vec::new();
        self.extract_rust_items(tree.root_node(), content, &mut symbols);
        Ok(symbols)
    }

    fn file_extensions(&self) -> &[&str] {
        &["rs"]
    }

    fn language_name(&self) -> &str {
        "rust"
    }
}
