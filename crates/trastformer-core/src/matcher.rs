/*!
# Pattern Matching

Structural, non-backtracking matching of rule patterns against tree nodes.

A capture matches any subtree. Any other pattern node matches when the type
tags are equal, the data constraint (if present) equals the node's data, and
the children match pairwise with equal counts. A failed match is an ordinary
outcome, not an error.
*/

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::dsl::PatternNode;
use crate::tree::SyntaxNode;

/// Subtrees bound by one successful match, keyed by capture number
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Binding {
    captures: BTreeMap<u32, Arc<SyntaxNode>>,
}

impl Binding {
    pub fn get(&self, capture: u32) -> Option<&Arc<SyntaxNode>> {
        self.captures.get(&capture)
    }

    pub fn len(&self) -> usize {
        self.captures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.captures.is_empty()
    }
}

/// Match `pattern` against `node`, returning the captures on success
pub fn match_node(pattern: &PatternNode, node: &Arc<SyntaxNode>) -> Option<Binding> {
    let mut binding = Binding::default();
    if match_into(pattern, node, &mut binding) {
        Some(binding)
    } else {
        None
    }
}

fn match_into(pattern: &PatternNode, node: &Arc<SyntaxNode>, binding: &mut Binding) -> bool {
    match pattern {
        PatternNode::Capture(n) => {
            binding.captures.insert(*n, Arc::clone(node));
            true
        }
        PatternNode::Node {
            kind,
            data,
            children,
        } => {
            if kind != node.kind() {
                return false;
            }
            if let Some(expected) = data {
                if node.data() != Some(expected.as_str()) {
                    return false;
                }
            }
            if children.len() != node.children().len() {
                return false;
            }
            children
                .iter()
                .zip(node.children())
                .all(|(child_pattern, child)| match_into(child_pattern, child, binding))
        }
    }
}

impl PatternNode {
    pub fn matches(&self, node: &Arc<SyntaxNode>) -> bool {
        match_node(self, node).is_some()
    }
}
