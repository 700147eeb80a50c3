/*!
# Syntax Trees

Language-neutral syntax tree shared by the source parsers, the rewriter and
the JSON serializer.

A node is a type tag plus optional scalar data plus ordered children. Nodes
are immutable once built and children are reference counted, so a rewritten
tree shares every unchanged subtree with the tree it was produced from.
*/

pub mod json;

use std::fmt;
use std::sync::Arc;

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

use crate::errors::TransformError;

pub use json::{from_json, read_tree, to_json, write_tree, TreeDocument};

/// Stack kept free before serializing one more level of a tree
const STACK_RED_ZONE: usize = 64 * 1024;
/// Size of each stack segment allocated once the red zone is reached
const STACK_SEGMENT: usize = 2 * 1024 * 1024;

/// A single node of a syntax tree
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
pub struct SyntaxNode {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: Option<String>,
    #[serde(default)]
    children: Vec<Arc<SyntaxNode>>,
}

impl SyntaxNode {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            data: None,
            children: Vec::new(),
        }
    }

    /// Leaf node carrying a literal value
    pub fn leaf(kind: impl Into<String>, data: impl Into<String>) -> Self {
        Self::new(kind).with_data(data)
    }

    pub fn with_data(mut self, data: impl Into<String>) -> Self {
        self.data = Some(data.into());
        self
    }

    pub fn with_children(mut self, children: Vec<Arc<SyntaxNode>>) -> Self {
        self.children = children;
        self
    }

    pub fn push_child(&mut self, child: Arc<SyntaxNode>) {
        self.children.push(child);
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn data(&self) -> Option<&str> {
        self.data.as_deref()
    }

    pub fn children(&self) -> &[Arc<SyntaxNode>] {
        &self.children
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Same tag and data with a different set of children
    pub fn rebuild(&self, children: Vec<Arc<SyntaxNode>>) -> Self {
        Self {
            kind: self.kind.clone(),
            data: self.data.clone(),
            children,
        }
    }

    /// Total number of nodes in this subtree, including this one
    pub fn node_count(&self) -> usize {
        self.descendants().count()
    }

    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(self, 1)];
        while let Some((node, depth)) = stack.pop() {
            deepest = deepest.max(depth);
            stack.extend(node.children.iter().map(|child| (child.as_ref(), depth + 1)));
        }
        deepest
    }

    /// Reject trees that contain a node without a type tag.
    ///
    /// The first offending node in pre-order is reported with its path,
    /// e.g. `root/Block[0]`.
    pub fn validate(&self) -> Result<(), TransformError> {
        // (node, depth, parent tag and index of the node in its parent)
        let mut stack: Vec<(&SyntaxNode, usize, Option<(&str, usize)>)> = vec![(self, 0, None)];
        let mut trail: Vec<(&str, usize)> = Vec::new();

        while let Some((node, depth, step)) = stack.pop() {
            trail.truncate(depth.saturating_sub(1));
            trail.extend(step);

            if node.kind.trim().is_empty() {
                let path: String = trail
                    .iter()
                    .map(|(parent, index)| format!("/{parent}[{index}]"))
                    .collect();
                return Err(TransformError::input_tree(format!(
                    "node at root{path} has an empty type tag"
                )));
            }
            for (index, child) in node.children.iter().enumerate().rev() {
                stack.push((child.as_ref(), depth + 1, Some((node.kind.as_str(), index))));
            }
        }
        Ok(())
    }

    /// Iterate over this subtree in pre-order
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants { stack: vec![self] }
    }
}

/// Pre-order iterator returned by [`SyntaxNode::descendants`]
pub struct Descendants<'a> {
    stack: Vec<&'a SyntaxNode>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a SyntaxNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack
            .extend(node.children.iter().rev().map(|child| child.as_ref()));
        Some(node)
    }
}

/// Escape a data value for the `Tag<"data">` notation
pub(crate) fn quote_data(data: &str) -> String {
    let mut quoted = String::with_capacity(data.len() + 2);
    quoted.push('"');
    for c in data.chars() {
        match c {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            '\t' => quoted.push_str("\\t"),
            other => quoted.push(other),
        }
    }
    quoted.push('"');
    quoted
}

/// Renders the node in the same notation the rule DSL uses,
/// e.g. `Addition(IntegerLiteral<"2">, IntegerLiteral<"3">)`.
impl fmt::Display for SyntaxNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        enum Piece<'a> {
            Node(&'a SyntaxNode),
            Text(&'static str),
        }

        let mut stack = vec![Piece::Node(self)];
        while let Some(piece) = stack.pop() {
            let node = match piece {
                Piece::Text(text) => {
                    f.write_str(text)?;
                    continue;
                }
                Piece::Node(node) => node,
            };

            f.write_str(&node.kind)?;
            if let Some(data) = &node.data {
                write!(f, "<{}>", quote_data(data))?;
            }
            if !node.children.is_empty() {
                f.write_str("(")?;
                stack.push(Piece::Text(")"));
                for (i, child) in node.children.iter().enumerate().rev() {
                    stack.push(Piece::Node(child));
                    if i > 0 {
                        stack.push(Piece::Text(", "));
                    }
                }
            }
        }
        Ok(())
    }
}

/// Serialized as `{"type", "data", "children"}`, with `data` omitted when
/// absent and `children` omitted when empty. Deep trees grow the stack on
/// demand instead of overflowing it.
impl Serialize for SyntaxNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_SEGMENT, || {
            let fields = 1 + usize::from(self.data.is_some()) + usize::from(!self.children.is_empty());
            let mut state = serializer.serialize_struct("SyntaxNode", fields)?;
            state.serialize_field("type", &self.kind)?;
            match &self.data {
                Some(data) => state.serialize_field("data", data)?,
                None => state.skip_field("data")?,
            }
            if self.children.is_empty() {
                state.skip_field("children")?;
            } else {
                state.serialize_field("children", &self.children)?;
            }
            state.end()
        })
    }
}

/// Children are released with an explicit stack so that dropping a very
/// deep tree does not recurse once per level.
impl Drop for SyntaxNode {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(child) = pending.pop() {
            if let Ok(mut node) = Arc::try_unwrap(child) {
                pending.append(&mut node.children);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SyntaxNode {
        SyntaxNode::new("Addition").with_children(vec![
            Arc::new(SyntaxNode::leaf("IntegerLiteral", "2")),
            Arc::new(SyntaxNode::new("Multiplication").with_children(vec![
                Arc::new(SyntaxNode::leaf("Identifier", "x")),
                Arc::new(SyntaxNode::leaf("IntegerLiteral", "3")),
            ])),
        ])
    }

    #[test]
    fn test_display_uses_rule_notation() {
        assert_eq!(
            sample().to_string(),
            r#"Addition(IntegerLiteral<"2">, Multiplication(Identifier<"x">, IntegerLiteral<"3">))"#
        );
    }

    #[test]
    fn test_display_escapes_data() {
        let node = SyntaxNode::leaf("StringLiteral", "say \"hi\"\n");
        assert_eq!(node.to_string(), r#"StringLiteral<"say \"hi\"\n">"#);
    }

    #[test]
    fn test_counts() {
        let tree = sample();
        assert_eq!(tree.node_count(), 5);
        assert_eq!(tree.depth(), 3);
        assert!(!tree.is_leaf());
    }

    #[test]
    fn test_descendants_pre_order() {
        let tree = sample();
        let kinds: Vec<&str> = tree.descendants().map(|n| n.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                "Addition",
                "IntegerLiteral",
                "Multiplication",
                "Identifier",
                "IntegerLiteral"
            ]
        );
    }

    #[test]
    fn test_validate_rejects_empty_tag() {
        let tree = SyntaxNode::new("Block").with_children(vec![Arc::new(SyntaxNode::new(" "))]);
        let err = tree.validate().unwrap_err();
        assert!(matches!(err, TransformError::InputTree { .. }));
        assert!(err.to_string().contains("root/Block[0]"));
        assert!(sample().validate().is_ok());
    }

    #[test]
    fn test_deep_chain_is_walked_without_recursion() {
        let mut node = Arc::new(SyntaxNode::leaf("Identifier", "x"));
        for _ in 0..100_000 {
            node = Arc::new(SyntaxNode::new("Negation").with_children(vec![node]));
        }
        assert!(node.validate().is_ok());
        assert_eq!(node.depth(), 100_001);
        assert_eq!(node.node_count(), 100_001);
        assert!(node.to_string().ends_with(r#"Identifier<"x">)))"#));
        drop(node);
    }

    #[test]
    fn test_rebuild_keeps_tag_and_data() {
        let node = SyntaxNode::leaf("Literal", "7");
        let rebuilt = node.rebuild(vec![Arc::new(SyntaxNode::new("Child"))]);
        assert_eq!(rebuilt.kind(), "Literal");
        assert_eq!(rebuilt.data(), Some("7"));
        assert_eq!(rebuilt.children().len(), 1);
    }
}
