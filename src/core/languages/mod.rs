//! Language-specific declaration extractors
//!
//! Each language gets its own module with a consistent interface for turning
//! source code into the top-level declarations a file exposes to others.

mod rust;
mod java;
mod python;
mod csharp;
mod javascript;
mod typescript;

pub use rust::RustParser;
pub use java::JavaParser;
pub use python::PythonParser;
pub use csharp::CSharpParser;
pub use javascript::JavaScriptParser;
pub use typescript::TypeScriptParser;

use tree_sitter::{Node, Parser, Tree};

use crate::error::{ReftreeError, Result};
use super::providers::{DeclaredSymbol, Position};

/// Trait that all language parsers must implement
pub trait LanguageParser: Send {
    /// Extract the top-level declarations of a file
    fn declarations(&mut self, content: &str, file_path: &std::path::Path) -> Result<Vec<DeclaredSymbol>>;

    /// Get the file extensions this parser handles
    fn file_extensions(&self) -> &[&str];

    /// Get the language name
    fn language_name(&self) -> &str;
}

/// Create the parser registered under a language name
pub fn create_parser(language: &str) -> Result<Box<dyn LanguageParser>> {
    match language {
        "rust" => Ok(Box::new(RustParser::new()?)),
        "java" => Ok(Box::new(JavaParser::new()?)),
        "python" => Ok(Box::new(PythonParser::new()?)),
        "csharp" => Ok(Box::new(CSharpParser::new()?)),
        "javascript" => Ok(Box::new(JavaScriptParser::new()?)),
        "typescript" => Ok(Box::new(TypeScriptParser::new()?)),
        _ => Err(ReftreeError::Config(format!("Unsupported language: {}", language))),
    }
}

fn parse_tree(parser: &mut Parser, content: &str, language: &str) -> Result<Tree> {
    parser
        .parse(content, None)
        .ok_or_else(|| ReftreeError::Parser(format!("Failed to parse {} code", language)))
}

/// Symbol for a node carrying a `name` field, positioned at the name itself
fn named_declaration(node: Node, source: &str) -> Option<DeclaredSymbol> {
    let name_node = node.child_by_field_name("name")?;
    identifier_symbol(name_node, source)
}

fn identifier_symbol(name_node: Node, source: &str) -> Option<DeclaredSymbol> {
    let name = name_node.utf8_text(source.as_bytes()).ok()?.trim();
    if name.is_empty() {
        return None;
    }
    let start = name_node.start_position();
    Some(DeclaredSymbol {
        name: name.to_string(),
        position: Position::new(start.row, start.column),
    })
}
