use std::sync::Arc;

use tracing::debug;

use super::unify::{self, BINARY_KINDS, TRANSPARENT_KINDS};
use super::{Language, SourceParser};
use crate::errors::ParseError;
use crate::tree::SyntaxNode;

const SNIPPET_LEN: usize = 24;

/// Source parser backed by a bundled tree-sitter grammar
pub struct TreeSitterParser {
    language: Language,
    parser: tree_sitter::Parser,
}

impl TreeSitterParser {
    pub fn new(language: Language) -> Result<Self, ParseError> {
        let mut parser = tree_sitter::Parser::new();
        parser
            .set_language(&grammar(language))
            .map_err(|e| ParseError::Grammar {
                language,
                message: e.to_string(),
            })?;

        Ok(Self { language, parser })
    }
}

fn grammar(language: Language) -> tree_sitter::Language {
    match language {
        Language::Java => tree_sitter_java::LANGUAGE.into(),
        Language::Python => tree_sitter_python::LANGUAGE.into(),
        Language::JavaScript => tree_sitter_javascript::LANGUAGE.into(),
    }
}

impl SourceParser for TreeSitterParser {
    fn parse(&mut self, source: &str) -> Result<Arc<SyntaxNode>, ParseError> {
        let tree = self
            .parser
            .parse(source, None)
            .ok_or(ParseError::NoTree {
                language: self.language,
            })?;

        let root = tree.root_node();
        if root.has_error() {
            return Err(syntax_error(self.language, root, source));
        }

        let converted = Converter { source }.convert(root);
        debug!(
            language = %self.language,
            nodes = converted.node_count(),
            "Converted tree-sitter tree"
        );
        Ok(converted)
    }

    fn language(&self) -> Language {
        self.language
    }

    fn name(&self) -> &'static str {
        "tree-sitter"
    }
}

/// Report the first error or missing node in document order
fn syntax_error(language: Language, root: tree_sitter::Node, source: &str) -> ParseError {
    let culprit = first_error(root).unwrap_or(root);
    let position = culprit.start_position();
    let snippet = if culprit.is_missing() {
        format!("missing {}", culprit.kind())
    } else {
        source[culprit.byte_range()].chars().take(SNIPPET_LEN).collect()
    };

    ParseError::Syntax {
        language,
        line: position.row + 1,
        column: position.column + 1,
        snippet,
    }
}

fn first_error(root: tree_sitter::Node) -> Option<tree_sitter::Node> {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.is_error() || node.is_missing() {
            return Some(node);
        }
        if node.has_error() {
            let mut cursor = node.walk();
            let children: Vec<_> = node.children(&mut cursor).collect();
            stack.extend(children.into_iter().rev());
        }
    }
    None
}

struct Converter<'s> {
    source: &'s str,
}

/// A tree-sitter node whose named children are being converted
struct Pending<'t> {
    node: tree_sitter::Node<'t>,
    children: Vec<tree_sitter::Node<'t>>,
    converted: Vec<Arc<SyntaxNode>>,
}

enum Visit<'t> {
    Done(Arc<SyntaxNode>),
    Descend(Pending<'t>),
}

impl<'s> Converter<'s> {
    /// Post-order conversion over an explicit stack. Long operator chains
    /// nest one level per operand, far deeper than the thread's stack allows.
    fn convert(&self, root: tree_sitter::Node) -> Arc<SyntaxNode> {
        let mut stack = match self.visit(root) {
            Visit::Done(node) => return node,
            Visit::Descend(pending) => vec![pending],
        };

        while let Some(mut top) = stack.pop() {
            if let Some(child) = top.children.get(top.converted.len()).copied() {
                match self.visit(child) {
                    Visit::Done(node) => {
                        top.converted.push(node);
                        stack.push(top);
                    }
                    Visit::Descend(inner) => {
                        stack.push(top);
                        stack.push(inner);
                    }
                }
                continue;
            }

            let node = self.finish(top);
            match stack.last_mut() {
                Some(parent) => parent.converted.push(node),
                None => return node,
            }
        }

        Arc::new(SyntaxNode::new(unify::camel_case(root.kind())))
    }

    /// Convert a node outright when it is a leaf, otherwise schedule its children
    fn visit<'t>(&self, mut node: tree_sitter::Node<'t>) -> Visit<'t> {
        loop {
            let kind = node.kind();
            let text = self.text(node);

            if let Some(tag) = unify::literal_tag(kind, text) {
                return Visit::Done(Arc::new(SyntaxNode::leaf(tag, text)));
            }

            let children = self.named_children(node);

            if TRANSPARENT_KINDS.contains(&kind) && children.len() == 1 {
                node = children[0];
                continue;
            }

            if children.is_empty() {
                return Visit::Done(Arc::new(SyntaxNode::leaf(unify::camel_case(kind), text)));
            }

            return Visit::Descend(Pending {
                node,
                converted: Vec::with_capacity(children.len()),
                children,
            });
        }
    }

    fn finish(&self, pending: Pending) -> Arc<SyntaxNode> {
        let Pending {
            node, converted, ..
        } = pending;
        let kind = node.kind();

        if BINARY_KINDS.contains(&kind) && converted.len() == 2 {
            return self.convert_binary(node, converted);
        }
        Arc::new(SyntaxNode::new(unify::camel_case(kind)).with_children(converted))
    }

    fn convert_binary(
        &self,
        node: tree_sitter::Node,
        operands: Vec<Arc<SyntaxNode>>,
    ) -> Arc<SyntaxNode> {
        let operator = self.operator(node);

        let converted = match operator.and_then(unify::binary_tag) {
            Some(tag) => SyntaxNode::new(tag),
            None => {
                let fallback = SyntaxNode::new(unify::camel_case(node.kind()));
                match operator {
                    Some(op) => fallback.with_data(op),
                    None => fallback,
                }
            }
        };
        Arc::new(converted.with_children(operands))
    }

    /// Operator token of a binary node, by field name or as the first anonymous child
    fn operator(&self, node: tree_sitter::Node) -> Option<&'s str> {
        if let Some(op) = node.child_by_field_name("operator") {
            return Some(self.text(op));
        }
        let mut cursor = node.walk();
        let found = node
            .children(&mut cursor)
            .find(|child| !child.is_named() && !child.is_extra());
        found.map(|op| self.text(op))
    }

    fn named_children<'t>(&self, node: tree_sitter::Node<'t>) -> Vec<tree_sitter::Node<'t>> {
        let mut cursor = node.walk();
        node.named_children(&mut cursor)
            .filter(|child| !child.is_extra())
            .collect()
    }

    fn text(&self, node: tree_sitter::Node) -> &'s str {
        &self.source[node.byte_range()]
    }
}
