use std::path::Path;

use tree_sitter::Node;

use crate::error::{IndexerError, Result};

/// Turns Rust source text into a tree-sitter syntax tree.
pub struct Parser {
    inner: tree_sitter::Parser,
}

impl Parser {
    pub fn new() -> Result<Self> {
        let mut inner = tree_sitter::Parser::new();
        inner
            .set_language(&tree_sitter_rust::LANGUAGE.into())
            .map_err(|e| IndexerError::Index(format!("Failed to load Rust grammar: {}", e)))?;
        Ok(Self { inner })
    }

    /// Reads and parses one file. `display_path` names the file in errors.
    ///
    /// Read failures, invalid UTF-8 and syntax errors are all reported as
    /// `IndexerError::Parse` so the caller can skip just this file.
    pub fn parse_file(&mut self, path: &Path, display_path: &str) -> Result<ParsedFile> {
        let bytes = std::fs::read(path).map_err(|e| IndexerError::Parse {
            path: display_path.to_string(),
            message: e.to_string(),
        })?;
        let source = String::from_utf8(bytes).map_err(|e| IndexerError::Parse {
            path: display_path.to_string(),
            message: format!("invalid UTF-8: {}", e.utf8_error()),
        })?;
        self.parse_source(source, display_path)
    }

    pub fn parse_source(&mut self, source: String, display_path: &str) -> Result<ParsedFile> {
        let tree = self
            .inner
            .parse(&source, None)
            .ok_or_else(|| IndexerError::Parse {
                path: display_path.to_string(),
                message: "Failed to parse source".to_string(),
            })?;

        if tree.root_node().has_error() {
            let message = match first_error(tree.root_node()) {
                Some(node) => format!(
                    "syntax error at line {}, column {}",
                    node.start_position().row + 1,
                    node.start_position().column + 1
                ),
                None => "syntax error".to_string(),
            };
            return Err(IndexerError::Parse {
                path: display_path.to_string(),
                message,
            });
        }

        Ok(ParsedFile { tree, source })
    }
}

fn first_error(node: Node<'_>) -> Option<Node<'_>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if let Some(found) = first_error(child) {
            return Some(found);
        }
    }
    None
}

pub struct ParsedFile {
    pub tree: tree_sitter::Tree,
    pub source: String,
}

impl ParsedFile {
    pub fn root_node(&self) -> Node<'_> {
        self.tree.root_node()
    }

    pub fn source_bytes(&self) -> &[u8] {
        self.source.as_bytes()
    }

    pub fn node_text(&self, node: &Node) -> &str {
        node.utf8_text(self.source_bytes()).unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_valid_source() {
        let mut parser = Parser::new().unwrap();
        let parsed = parser
            .parse_source("pub struct Point { pub x: i32 }".to_string(), "src/lib.rs")
            .unwrap();

        let root = parsed.root_node();
        assert_eq!(root.kind(), "source_file");
        assert_eq!(root.child(0).unwrap().kind(), "struct_item");
    }

    #[test]
    fn test_parse_error_reports_line() {
        let mut parser = Parser::new().unwrap();
        let err = parser
            .parse_source("pub fn ok() {}\npub struct {".to_string(), "src/bad.rs")
            .err()
            .unwrap();

        match err {
            IndexerError::Parse { path, message } => {
                assert_eq!(path, "src/bad.rs");
                assert!(message.contains("line 2"), "message was {}", message);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_parse_file_rejects_invalid_utf8() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("bin.rs");
        std::fs::write(&path, [0x66, 0x6e, 0xff, 0xfe]).unwrap();

        let mut parser = Parser::new().unwrap();
        let err = parser.parse_file(&path, "src/bin.rs").err().unwrap();
        assert!(matches!(err, IndexerError::Parse { .. }));
    }

    #[test]
    fn test_parse_file_missing_is_parse_failure() {
        let temp_dir = TempDir::new().unwrap();
        let mut parser = Parser::new().unwrap();
        let err = parser
            .parse_file(&temp_dir.path().join("nope.rs"), "src/nope.rs")
            .err()
            .unwrap();
        assert!(!err.is_io_failure());
    }
}
