use std::path::Path;
use tree_sitter::{Node, Parser};

use crate::error::{ReftreeError, Result};
use super::{named_declaration, parse_tree, DeclaredSymbol, LanguageParser};

const DECLARATION_KINDS: &[&str] = &[
    "class_declaration",
    "interface_declaration",
    "enum_declaration",
    "record_declaration",
    "annotation_type_declaration",
];

/// Java-specific parser using Tree-sitter
pub struct JavaParser {
    parser: Parser,
}

impl JavaParser {
    pub fn new() -> Result<Self> {
        let mut parser = Parser::new();
        let java_language = tree_sitter_java::language();
        parser.set_language(&java_language)
            .map_err(|e| ReftreeError::Parser(format!("Failed to set Java language: {}", e)))?;

        Ok(Self { parser })
    }

    fn extract_java_types(&self, node: Node, source: &str, symbols: &mut Vec<DeclaredSymbol>) {
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

impl LanguageParser for JavaParser {
    fn declarations(&mut self, content: &str, _file_path: &Path) -> Result<Vec<DeclaredSymbol>> {
        let tree = parse_tree(&mut self.parser, content, "Java")?;
        let mut symbols = Vec::new();
        self.extract_java_types(tree.root_node(), content, &mut symbols);
        Ok(symbols)
    }

    fn file_extensions(&self) -> &[&str] {
        &["java"]
    }

    fn language_name(&self) -> &str {
        "java"
    }
}
