/*!
# Rules

Parsed form of `Pattern -> Replacement;` statements.
*/

use std::fmt;
use std::slice;

use crate::tree::quote_data;

/// Left-hand side of a rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternNode {
    /// `#N`, matches any subtree
    Capture(u32),
    /// `Tag<"data">(child, ...)`; a missing data constraint matches any data
    Node {
        kind: String,
        data: Option<String>,
        children: Vec<PatternNode>,
    },
}

impl PatternNode {
    /// Capture numbers in left-to-right order
    pub fn captures(&self) -> Vec<u32> {
        let mut out = Vec::new();
        self.collect_captures(&mut out);
        out
    }

    fn collect_captures(&self, out: &mut Vec<u32>) {
        match self {
            PatternNode::Capture(n) => out.push(*n),
            PatternNode::Node { children, .. } => {
                for child in children {
                    child.collect_captures(out);
                }
            }
        }
    }

    pub fn kind(&self) -> Option<&str> {
        match self {
            PatternNode::Capture(_) => None,
            PatternNode::Node { kind, .. } => Some(kind),
        }
    }
}

/// Right-hand side of a rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Template {
    /// Re-inserts the subtree bound to `#N`
    Capture(u32),
    Node {
        kind: String,
        data: Option<String>,
        children: Vec<Template>,
    },
}

impl Template {
    pub fn captures(&self) -> Vec<u32> {
        let mut out = Vec::new();
        self.collect_captures(&mut out);
        out
    }

    fn collect_captures(&self, out: &mut Vec<u32>) {
        match self {
            Template::Capture(n) => out.push(*n),
            Template::Node { children, .. } => {
                for child in children {
                    child.collect_captures(out);
                }
            }
        }
    }
}

/// A single rewrite rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub(crate) index: usize,
    pub(crate) line: u32,
    pub(crate) column: u32,
    pub(crate) pattern: PatternNode,
    pub(crate) replacement: Template,
}

impl Rule {
    /// Position of the rule in its rule set; earlier rules win
    pub fn index(&self) -> usize {
        self.index
    }

    /// Source position of the rule's first token
    pub fn position(&self) -> (u32, u32) {
        (self.line, self.column)
    }

    pub fn pattern(&self) -> &PatternNode {
        &self.pattern
    }

    pub fn replacement(&self) -> &Template {
        &self.replacement
    }
}

/// Ordered, immutable collection of rules
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    pub(crate) fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Rule> {
        self.rules.get(index)
    }

    pub fn iter(&self) -> slice::Iter<'_, Rule> {
        self.rules.iter()
    }
}

impl<'a> IntoIterator for &'a RuleSet {
    type Item = &'a Rule;
    type IntoIter = slice::Iter<'a, Rule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}

fn write_node<T: fmt::Display>(
    f: &mut fmt::Formatter<'_>,
    kind: &str,
    data: &Option<String>,
    children: &[T],
) -> fmt::Result {
    write!(f, "{kind}")?;
    if let Some(data) = data {
        write!(f, "<{}>", quote_data(data))?;
    }
    if !children.is_empty() {
        write!(f, "(")?;
        for (i, child) in children.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{child}")?;
        }
        write!(f, ")")?;
    }
    Ok(())
}

impl fmt::Display for PatternNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternNode::Capture(n) => write!(f, "#{n}"),
            PatternNode::Node {
                kind,
                data,
                children,
            } => write_node(f, kind, data, children),
        }
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Template::Capture(n) => write!(f, "#{n}"),
            Template::Node {
                kind,
                data,
                children,
            } => write_node(f, kind, data, children),
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {};", self.pattern, self.replacement)
    }
}

impl fmt::Display for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rule in &self.rules {
            writeln!(f, "{rule}")?;
        }
        Ok(())
    }
}
