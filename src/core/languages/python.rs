use std::path::Path;
use tree_sitter::{Node, Parser};

use crate::error::{ReftreeError, Result};
use super::{identifier_symbol, named_declaration, parse_tree, DeclaredSymbol, LanguageParser};

/// Python-specific parser using Tree-sitter
pub struct PythonParser {
    parser: Parser,
}

impl PythonParser {
    pub fn new() -> Result<Self> {
        let mut parser = Parser::new();
        let python_language = tree_sitter_python::language();
        parser.set_language(&python_language)
            .map_err(|e| ReftreeError::Parser(format!("Failed to set Python language: {}", e)))?;

        Ok(Self { parser })
    }

    fn extract_python_items(&self, node: Node, source: &str, symbols: &mut Vec<DeclaredSymbol>) {
        let mut cursor = node.walk();

        for child in node.named_children(&mut cursor) {
            match child.kind() {
                "function_definition" | "class_definition" => {
                    if let Some(symbol) = named_declaration(child, source) {
                        symbols.push(symbol);
                    }
                }
                "decorated_definition" => {
                    if let Some(definition) = child.child_by_field_name("definition") {
                        if let Some(symbol) = named_declaration(definition, source) {
                            symbols.push(symbol);
                        }
                    }
                }
                "expression_statement" => {
                    // Module-level `NAME = value`
                    if let Some(assignment) = child.named_child(0).filter(|n| n.kind() == "assignment") {
                        if let Some(left) = assignment.child_by_field_name("left") {
                            if left.kind() == "identifier" {
                                if let Some(symbol) = identifier_symbol(left, source) {
                                    symbols.push(symbol);
                                }
                            }
                        }
                    }
                }
                _ => {}
            }
        }
    }
}

impl LanguageParser for PythonParser {
    fn declarations(&mut self, content: &str, _file_path: &Path) -> Result<Vec<DeclaredSymbol>> {
        let tree = parse_tree(&mut self.parser, content, "Python")?;
        let mut symbols = Vec::new();
        self.extract_python_items(tree.root_node(), content, &mut symbols);
        Ok(symbols)
    }

    fn file_extensions(&self) -> &[&str] {
        &["py"]
    }

    fn language_name(&self) -> &str {
        "python"
    }
}
