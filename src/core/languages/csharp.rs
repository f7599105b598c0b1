use std::path::Path;
use tree_sitter::{Node, Parser};

use crate::error::{ReftreeError, Result};
use super::{named_declaration, parse_tree, DeclaredSymbol, LanguageParser};

const DECLARATION_KINDS: &[&str] = &[
    "class_declaration",
    "struct_declaration",
    "interface_declaration",
    "enum_declaration",
    "record_declaration",
    "delegate_declaration",
];

/// Namespaces hold declarations without being declarations themselves
const CONTAINER_KINDS: &[&str] = &[
    "namespace_declaration",
    "file_scoped_namespace_declaration",
    "declaration_list",
];

/// C#-specific parser using Tree-sitter
pub struct CSharpParser {
    parser: Parser,
}

impl CSharpParser {
    pub fn new() -> Result<Self> {
        let mut parser = Parser::new();
        let csharp_language = tree_sitter_c_sharp::language();
        parser.set_language(&csharp_language)
            .map_err(|e| ReftreeError::Parser(format!("Failed to set C# language: {}", e)))?;

        Ok(Self { parser })
    }

    fn extract_csharp_types(&self, node: Node, source: &str, symbols: &mut Vec<DeclaredSymbol>) {
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            let kind = child.kind();
            if DECLARATION_KINDS.contains(&kind) {
                if let Some(symbol) = named_declaration(child, source) {
                    symbols.push(symbol);
                }
            } else if CONTAINER_KINDS.contains(&kind) {
                self.extract_csharp_types(child, source, symbols);
            }
        }
    }
}

impl LanguageParser for CSharpParser {
    fn declarations(&mut self, content: &str, _file_path: &Path) -> Result<Vec<DeclaredSymbol>> {
        let tree = parse_tree(&mut self.parser, content, "C#")?;
        let mut symbols = Vec::new();
        self.extract_csharp_types(tree.root_node(), content, &mut symbols);
        Ok(symbols)
    }

    fn file_extensions(&self) -> &[&str] {
        &["cs"]
    }

    fn language_name(&self) -> &str {
        "csharp"
    }
}
