use std::path::Path;
use tree_sitter::{Node, Parser};

use crate::error::{ReftreeError, Result};
use super::{identifier_symbol, named_declaration, parse_tree, DeclaredSymbol, LanguageParser};

/// JavaScript-specific parser using Tree-sitter
pub struct JavaScriptParser {
    parser: Parser,
}

impl JavaScriptParser {
    pub fn new() -> Result<Self> {
        let mut parser = Parser::new();
        let javascript_language = tree_sitter_javascript::language();
        parser.set_language(&javascript_language)
            .map_err(|e| ReftreeError::Parser(format!("Failed to set JavaScript language: {}", e)))?;

        Ok(Self { parser })
    }
}

/// Kinds with a `name` field, in either ECMAScript grammar
const NAMED_KINDS: &[&str] = &[
    "function_declaration",
    "generator_function_declaration",
    "class_declaration",
    "abstract_class_declaration",
    "interface_declaration",
    "type_alias_declaration",
    "enum_declaration",
    "module",
    "internal_module",
];

/// Top-level declarations among the children of `node`.
///
/// Shared by the JavaScript and TypeScript parsers; the TypeScript-only kinds
/// never occur in a JavaScript tree.
pub(super) fn module_items(node: Node, source: &str, symbols: &mut Vec<DeclaredSymbol>) {
    let mut cursor = node.walk();

    for child in node.named_children(&mut cursor) {
        match child.kind() {
            "export_statement" => {
                // `export function f` wraps the declaration; `export { f }` re-exports
                if let Some(declaration) = child.child_by_field_name("declaration") {
                    declaration_item(declaration, source, symbols);
                }
            }
            // `declare class C {}`
            "ambient_declaration" => module_items(child, source, symbols),
            "expression_statement" => {
                // `namespace N {}` parses as an expression statement in the TS grammar
                module_items(child, source, symbols);
            }
            _ => declaration_item(child, source, symbols),
        }
    }
}

fn declaration_item(node: Node, source: &str, symbols: &mut Vec<DeclaredSymbol>) {
    match node.kind() {
        "lexical_declaration" | "variable_declaration" => declarators(node, source, symbols),
        kind if NAMED_KINDS.contains(&kind) => {
            if let Some(symbol) = named_declaration(node, source) {
                symbols.push(symbol);
            }
        }
        _ => {}
    }
}

/// `const a = 1, b = () => {}` declares `a` and `b`
fn declarators(node: Node, source: &str, symbols: &mut Vec<DeclaredSymbol>) {
    let mut cursor = node.walk();
    for declarator in node.named_children(&mut cursor) {
        if declarator.kind() != "variable_declarator" {
            continue;
        }
        if let Some(name_node) = declarator.child_by_field_name("name") {
            if name_node.kind() == "identifier" {
                if let Some(symbol) = identifier_symbol(name_node, source) {
                    symbols.push(symbol);
                }
            }
        }
    }
}

impl LanguageParser for JavaScriptParser {
    fn declarations(&mut self, content: &str, _file_path: &Path) -> Result<Vec<DeclaredSymbol>> {
        let tree = parse_tree(&mut self.parser, content, "JavaScript")?;
        let mut symbols = Vec::new();
        module_items(tree.root_node(), content, &mut symbols);
        Ok(symbols)
    }

    fn file_extensions(&self) -> &[&str] {
        &["js", "jsx", "mjs", "cjs"]
    }

    fn language_name(&self) -> &str {
        "javascript"
    }
}
