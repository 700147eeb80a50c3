/*!
# Rewriter

Applies a [`RuleSet`] to a syntax tree in a single bottom-up pass.

Children are rewritten before their parent is tested, so a rewrite can
expose a new match for the parent, but the replacement produced for a node is
never matched again in the same pass. For each node the rules are tried in
declaration order and the first match wins. Nodes without a match are kept,
and a node whose children did not change is returned as the very same `Arc`.
*/

use std::sync::Arc;

use tracing::debug;

use crate::dsl::{Rule, RuleSet, Template};
use crate::errors::TransformError;
use crate::matcher::{match_node, Binding};
use crate::tree::SyntaxNode;

/// Per-rule execution statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleStats {
    pub rule: String,
    pub attempts: u64,
    pub applications: u64,
}

impl RuleStats {
    pub fn new(rule: String) -> Self {
        Self {
            rule,
            attempts: 0,
            applications: 0,
        }
    }

    pub fn success_rate(&self) -> f64 {
        if self.attempts == 0 {
            0.0
        } else {
            (self.applications as f64) / (self.attempts as f64)
        }
    }
}

/// Summary of one or more rewrite passes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RewriteSummary {
    pub nodes_visited: u64,
    pub rewrites: u64,
}

impl RewriteSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn merge(&mut self, other: &RewriteSummary) {
        self.nodes_visited += other.nodes_visited;
        self.rewrites += other.rewrites;
    }

    pub fn changed(&self) -> bool {
        self.rewrites > 0
    }
}

/// Bottom-up rewrite engine over a borrowed rule set
pub struct Rewriter<'r> {
    rules: &'r RuleSet,
    stats: Vec<RuleStats>,
    summary: RewriteSummary,
}

impl<'r> Rewriter<'r> {
    pub fn new(rules: &'r RuleSet) -> Self {
        Self {
            rules,
            stats: rules
                .iter()
                .map(|rule| RuleStats::new(rule.to_string()))
                .collect(),
            summary: RewriteSummary::new(),
        }
    }

    /// Rewrite a whole tree. The input is validated first and never modified.
    pub fn transform(&mut self, tree: &Arc<SyntaxNode>) -> Result<Arc<SyntaxNode>, TransformError> {
        tree.validate()?;

        let mut pass = RewriteSummary::new();
        let result = self.rewrite_tree(tree, &mut pass)?;
        self.summary.merge(&pass);

        debug!(
            nodes = pass.nodes_visited,
            rewrites = pass.rewrites,
            "Rewrite pass finished"
        );
        for stats in self.stats.iter().filter(|s| s.applications > 0) {
            debug!(
                rule = %stats.rule,
                applications = stats.applications,
                attempts = stats.attempts,
                "Rule applied"
            );
        }

        Ok(result)
    }

    /// Post-order walk over an explicit stack, so tree depth is bounded by
    /// memory rather than by the thread's stack.
    fn rewrite_tree(
        &mut self,
        root: &Arc<SyntaxNode>,
        pass: &mut RewriteSummary,
    ) -> Result<Arc<SyntaxNode>, TransformError> {
        let mut stack = vec![Frame::new(root)];

        while let Some(mut frame) = stack.pop() {
            if let Some(child) = frame.next_child() {
                stack.push(frame);
                stack.push(Frame::new(child));
                continue;
            }

            let rewritten = self.apply_rules(frame.finish(), pass)?;
            match stack.last_mut() {
                Some(parent) => parent.accept(rewritten),
                None => return Ok(rewritten),
            }
        }

        Ok(Arc::clone(root))
    }

    /// Try the rules in order on a node whose children are already rewritten
    fn apply_rules(
        &mut self,
        node: Arc<SyntaxNode>,
        pass: &mut RewriteSummary,
    ) -> Result<Arc<SyntaxNode>, TransformError> {
        pass.nodes_visited += 1;

        let rules = self.rules;
        for rule in rules {
            let stats = &mut self.stats[rule.index()];
            stats.attempts += 1;
            if let Some(binding) = match_node(rule.pattern(), &node) {
                stats.applications += 1;
                pass.rewrites += 1;
                return instantiate(rule, rule.replacement(), &binding);
            }
        }

        Ok(node)
    }

    pub fn stats(&self) -> &[RuleStats] {
        &self.stats
    }

    pub fn summary(&self) -> &RewriteSummary {
        &self.summary
    }

    pub fn clear_stats(&mut self) {
        for stats in &mut self.stats {
            *stats = RuleStats::new(std::mem::take(&mut stats.rule));
        }
        self.summary = RewriteSummary::new();
    }
}

/// A node whose children are being rewritten
struct Frame<'t> {
    node: &'t Arc<SyntaxNode>,
    children: Vec<Arc<SyntaxNode>>,
    changed: bool,
}

impl<'t> Frame<'t> {
    fn new(node: &'t Arc<SyntaxNode>) -> Self {
        Self {
            node,
            children: Vec::with_capacity(node.children().len()),
            changed: false,
        }
    }

    fn next_child(&self) -> Option<&'t Arc<SyntaxNode>> {
        let node: &'t Arc<SyntaxNode> = self.node;
        node.children().get(self.children.len())
    }

    fn accept(&mut self, rewritten: Arc<SyntaxNode>) {
        if let Some(original) = self.next_child() {
            self.changed |= !Arc::ptr_eq(&rewritten, original);
        }
        self.children.push(rewritten);
    }

    /// The node itself when no child changed, otherwise a copy with the new children
    fn finish(self) -> Arc<SyntaxNode> {
        if self.changed {
            Arc::new(self.node.rebuild(self.children))
        } else {
            Arc::clone(self.node)
        }
    }
}

/// Build the output subtree for a matched rule
pub fn instantiate(
    rule: &Rule,
    template: &Template,
    binding: &Binding,
) -> Result<Arc<SyntaxNode>, TransformError> {
    match template {
        Template::Capture(n) => binding.get(*n).map(Arc::clone).ok_or(
            TransformError::InternalConsistency {
                rule: rule.index(),
                capture: *n,
            },
        ),
        Template::Node {
            kind,
            data,
            children,
        } => {
            let mut node = SyntaxNode::new(kind.as_str());
            if let Some(data) = data {
                node = node.with_data(data.as_str());
            }
            for child in children {
                node.push_child(instantiate(rule, child, binding)?);
            }
            Ok(Arc::new(node))
        }
    }
}

/// One-shot helper for callers that do not need statistics
pub fn transform(rules: &RuleSet, tree: &Arc<SyntaxNode>) -> Result<Arc<SyntaxNode>, TransformError> {
    Rewriter::new(rules).transform(tree)
}
