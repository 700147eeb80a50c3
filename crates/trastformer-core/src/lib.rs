//! # Trastformer Core
//!
//! Tree rewriting engine for source code transformations, including:
//! - A small rule language (`Pattern -> Replacement;`) and its parser
//! - Structural pattern matching with numbered captures
//! - A bottom-up rewriter that preserves unchanged subtrees
//! - Source parsers producing language-neutral syntax trees
//! - JSON serialization of trees
//!
//! The [`pipeline`] module ties these together into the
//! parse / rewrite / serialize flow used by the command line tool.

#![warn(clippy::all)]

pub mod dsl;
pub mod errors;
pub mod matcher;
pub mod parser;
pub mod pipeline;
pub mod rewriter;
pub mod tree;

use std::path::{Path, PathBuf};

use tracing::warn;

// Re-export commonly used types
pub use dsl::{load_rules, parse_rules, PatternNode, Rule, RuleSet, Template};
pub use errors::{DslSyntaxError, ParseError, TransformError};
pub use matcher::{match_node, Binding};
pub use parser::{create_parser, parse_source, Language, SourceParser};
pub use pipeline::{run, PipelineReport};
pub use rewriter::{transform, RewriteSummary, Rewriter, RuleStats};
pub use tree::{from_json, read_tree, to_json, write_tree, SyntaxNode, TreeDocument};

/// Trastformer version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize tracing for the transformer components.
///
/// `RUST_LOG` takes precedence over the `debug` flag when it is set.
/// Calling this more than once keeps the first subscriber.
pub fn init_tracing(debug: bool) {
    let level = if debug { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!("trastformer_core={level},trastformer_cli={level}"))
    });

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// What the pipeline reads from the source path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// Source code parsed with the grammar of the given language
    Source(Language),
    /// A JSON tree document written by a previous run
    Tree,
}

impl InputKind {
    /// Decide how to read `path`.
    ///
    /// `.txt` files have no language of their own and need `language`.
    /// For other extensions the extension wins over `language`.
    pub fn resolve(path: &Path, language: Option<Language>) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        match ext.as_str() {
            "json" => Ok(InputKind::Tree),
            "txt" => language.map(InputKind::Source).ok_or_else(|| {
                TrastformerError::Config(
                    "The option [--lang] should be specified with txt source file".to_string(),
                )
            }),
            _ => {
                let detected = Language::from_path(path).ok_or_else(|| {
                    TrastformerError::Config(format!(
                        "The parameter [{}] should be a source file",
                        path.display()
                    ))
                })?;
                if let Some(requested) = language.filter(|lang| *lang != detected) {
                    warn!(
                        path = %path.display(),
                        requested = %requested,
                        detected = %detected,
                        "Ignoring --lang for a file with a known extension"
                    );
                }
                Ok(InputKind::Source(detected))
            }
        }
    }
}

/// Configuration of one transformer run
#[derive(Debug, Clone)]
pub struct TransformerConfig {
    /// Source file, or a JSON tree
    pub source: PathBuf,
    /// Rule file
    pub rules: PathBuf,
    /// Where the transformed tree is written
    pub json: PathBuf,
    /// Language override for `.txt` sources
    pub language: Option<Language>,
    /// Enable debug logging
    pub debug: bool,
}

impl TransformerConfig {
    pub fn new(source: impl Into<PathBuf>, rules: impl Into<PathBuf>, json: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            rules: rules.into(),
            json: json.into(),
            ..Self::default()
        }
    }

    pub fn with_language(mut self, language: Language) -> Self {
        self.language = Some(language);
        self
    }

    pub fn input_kind(&self) -> Result<InputKind> {
        InputKind::resolve(&self.source, self.language)
    }
}

impl Default for TransformerConfig {
    fn default() -> Self {
        Self {
            source: PathBuf::new(),
            rules: PathBuf::new(),
            json: "./output.json".into(),
            language: None,
            debug: false,
        }
    }
}

/// Error types for transformer operations
#[derive(thiserror::Error, Debug)]
pub enum TrastformerError {
    /// Rule file could not be parsed
    #[error("Rule syntax error: {0}")]
    Dsl(#[from] DslSyntaxError),

    /// Rewriting failed
    #[error("Transform error: {0}")]
    Transform(#[from] TransformError),

    /// Source code could not be parsed
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Tree document could not be read or written
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl TrastformerError {
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

/// Result type for transformer operations
pub type Result<T> = std::result::Result<T, TrastformerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_kind_from_extension() {
        assert_eq!(
            InputKind::resolve(Path::new("Main.java"), None).unwrap(),
            InputKind::Source(Language::Java)
        );
        assert_eq!(
            InputKind::resolve(Path::new("tree.JSON"), None).unwrap(),
            InputKind::Tree
        );
        // the extension wins over the override
        assert_eq!(
            InputKind::resolve(Path::new("app.js"), Some(Language::Python)).unwrap(),
            InputKind::Source(Language::JavaScript)
        );
    }

    #[test]
    fn test_txt_needs_a_language() {
        let err = InputKind::resolve(Path::new("code.txt"), None).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Configuration error: The option [--lang] should be specified with txt source file"
        );
        assert_eq!(
            InputKind::resolve(Path::new("code.txt"), Some(Language::Python)).unwrap(),
            InputKind::Source(Language::Python)
        );
    }

    #[test]
    fn test_unknown_extension_is_rejected() {
        assert!(matches!(
            InputKind::resolve(Path::new("notes.md"), None),
            Err(TrastformerError::Config(_))
        ));
    }

    #[test]
    fn test_config_builder() {
        let config = TransformerConfig::new("a.txt", "r.dsl", "out.json").with_language(Language::Java);
        assert_eq!(config.input_kind().unwrap(), InputKind::Source(Language::Java));
        assert!(!config.debug);
    }
}
