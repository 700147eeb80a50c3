// Parser module - turns source code into language-neutral syntax trees
use std::path::Path;
use std::sync::Arc;

use crate::errors::ParseError;
use crate::tree::SyntaxNode;
use crate::{Result, TrastformerError};

pub mod language;
pub mod tree_sitter_parser;
pub mod unify;

pub use language::Language;
pub use tree_sitter_parser::TreeSitterParser;

/// Trait for all source parsers
pub trait SourceParser: Send {
    /// Parse source code into a syntax tree
    fn parse(&mut self, source: &str) -> std::result::Result<Arc<SyntaxNode>, ParseError>;

    /// Parse a file
    fn parse_file(&mut self, path: &Path) -> Result<Arc<SyntaxNode>> {
        let source = std::fs::read_to_string(path).map_err(|e| TrastformerError::io(path, e))?;
        Ok(self.parse(&source)?)
    }

    /// Language this parser reads
    fn language(&self) -> Language;

    /// Get parser name for debugging
    fn name(&self) -> &'static str;
}

/// Create a parser for a language
pub fn create_parser(language: Language) -> std::result::Result<Box<dyn SourceParser>, ParseError> {
    Ok(Box::new(TreeSitterParser::new(language)?))
}

/// Parse a source text in one call
pub fn parse_source(source: &str, language: Language) -> std::result::Result<Arc<SyntaxNode>, ParseError> {
    create_parser(language)?.parse(source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_every_language_has_a_parser() {
        for language in Language::ALL {
            let parser = create_parser(language).unwrap();
            assert_eq!(parser.language(), language);
        }
    }

    #[test]
    fn test_parse_file() {
        let mut file = tempfile::Builder::new().suffix(".py").tempfile().unwrap();
        writeln!(file, "total = price * 2").unwrap();

        let mut parser = create_parser(Language::Python).unwrap();
        let root = parser.parse_file(file.path()).unwrap();
        assert!(root.descendants().any(|node| node.kind() == "Multiplication"));
    }

    #[test]
    fn test_missing_file_is_an_io_error() {
        let mut parser = create_parser(Language::Java).unwrap();
        let err = parser.parse_file(Path::new("/nonexistent/Main.java")).unwrap_err();
        assert!(matches!(err, TrastformerError::Io { .. }));
    }

    #[test]
    fn test_parse_source() {
        let root = parse_source("const a = b - 1;", Language::JavaScript).unwrap();
        assert!(root.descendants().any(|node| node.kind() == "Subtraction"));
    }
}
