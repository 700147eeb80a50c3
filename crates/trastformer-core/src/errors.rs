use thiserror::Error;

use crate::parser::Language;

/// Malformed rule text, reported at the position of the offending token
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{line}:{column}: {message}")]
pub struct DslSyntaxError {
    pub line: u32,
    pub column: u32,
    pub message: String,
}

impl DslSyntaxError {
    pub fn new(line: u32, column: u32, message: impl Into<String>) -> Self {
        Self {
            line,
            column,
            message: message.into(),
        }
    }
}

/// Errors raised while rewriting a tree
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransformError {
    /// The tree handed to the rewriter is empty or malformed
    #[error("Input tree error: {reason}")]
    InputTree { reason: String },

    /// A replacement referenced a capture the pattern did not bind.
    /// Rule parsing rejects such rules, so this indicates an engine bug.
    #[error("Internal consistency fault: rule {rule} references unbound capture #{capture}")]
    InternalConsistency { rule: usize, capture: u32 },
}

impl TransformError {
    pub fn input_tree(reason: impl Into<String>) -> Self {
        Self::InputTree {
            reason: reason.into(),
        }
    }
}

/// Errors raised by the source code parsers
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Failed to load the {language} grammar: {message}")]
    Grammar { language: Language, message: String },

    #[error("The {language} parser produced no tree")]
    NoTree { language: Language },

    #[error("Syntax error in {language} source at {line}:{column} near '{snippet}'")]
    Syntax {
        language: Language,
        line: usize,
        column: usize,
        snippet: String,
    },

    #[error("Unsupported language: {name}")]
    UnsupportedLanguage { name: String },
}

impl ParseError {
    pub fn unsupported(name: &str) -> Self {
        Self::UnsupportedLanguage {
            name: name.to_string(),
        }
    }
}
