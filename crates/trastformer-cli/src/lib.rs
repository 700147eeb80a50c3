//! Trastformer CLI - command line front end for the tree transformer
//!
//! This crate provides argument parsing and validation for the `trastformer`
//! binary and turns the parsed arguments into a [`TransformerConfig`].
//!
//! [`TransformerConfig`]: trastformer_core::TransformerConfig

pub mod cli;

// Re-export commonly used items for convenience
pub use cli::{build_command, config_from_matches, SOURCE_EXTENSIONS};
