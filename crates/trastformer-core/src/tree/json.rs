/*!
# JSON Trees

Serializer and reader for the JSON tree document:

```json
{
  "language": "java",
  "root": { "type": "Addition", "children": [ { "type": "IntegerLiteral", "data": "2" } ] }
}
```
*/

use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::SyntaxNode;
use crate::errors::TransformError;
use crate::parser::Language;
use crate::{Result, TrastformerError};

/// Top-level JSON document wrapping a tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default)]
    pub root: Option<Arc<SyntaxNode>>,
}

impl TreeDocument {
    pub fn new(root: Arc<SyntaxNode>, language: Option<Language>) -> Self {
        Self {
            language: language.map(|lang| lang.as_str().to_string()),
            root: Some(root),
        }
    }

    /// Language recorded in the document, if it names a known one
    pub fn language(&self) -> Option<Language> {
        let name = self.language.as_deref()?;
        match name.parse() {
            Ok(language) => Some(language),
            Err(_) => {
                warn!(language = name, "Ignoring unknown language in tree document");
                None
            }
        }
    }
}

/// Serialize a tree to pretty-printed JSON
pub fn to_json(root: &Arc<SyntaxNode>, language: Option<Language>) -> Result<String> {
    let document = TreeDocument::new(Arc::clone(root), language);
    let mut text = serde_json::to_string_pretty(&document)?;
    text.push('\n');
    Ok(text)
}

/// Serialize a tree into a file, creating parent directories as needed
pub fn write_tree(
    path: impl AsRef<Path>,
    root: &Arc<SyntaxNode>,
    language: Option<Language>,
) -> Result<()> {
    let path = path.as_ref();
    let text = to_json(root, language)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| TrastformerError::io(parent, e))?;
    }
    fs::write(path, text).map_err(|e| TrastformerError::io(path, e))?;

    debug!(path = %path.display(), nodes = root.node_count(), "Wrote JSON tree");
    Ok(())
}

/// Read a tree document from JSON text.
///
/// An empty document or a document without a root is an input tree error.
pub fn from_json(text: &str) -> Result<(Arc<SyntaxNode>, Option<Language>)> {
    if text.trim().is_empty() {
        return Err(TransformError::input_tree("tree document is empty").into());
    }

    // Each tree level is two JSON nesting levels, so serde_json's default
    // limit would reject trees deeper than 64.
    let mut deserializer = serde_json::Deserializer::from_str(text);
    deserializer.disable_recursion_limit();
    let document = TreeDocument::deserialize(serde_stacker::Deserializer::new(&mut deserializer))?;
    deserializer.end()?;

    let language = document.language();
    let root = document
        .root
        .ok_or_else(|| TransformError::input_tree("tree document has no root node"))?;
    root.validate()?;

    Ok((root, language))
}

pub fn read_tree(path: impl AsRef<Path>) -> Result<(Arc<SyntaxNode>, Option<Language>)> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|e| TrastformerError::io(path, e))?;
    from_json(&text)
}
