/*!
# Pipeline

One transformer run: load the rules, read the input tree (parsing source code
or reading a serialized tree), rewrite it and write the result as JSON.

Rules are loaded first, so a malformed rule file aborts the run before any
source is parsed and before the output file is touched.
*/

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, error, info};

use crate::dsl::{load_rules, RuleSet};
use crate::parser::{create_parser, Language};
use crate::rewriter::{RewriteSummary, Rewriter, RuleStats};
use crate::tree::{read_tree, write_tree, SyntaxNode};
use crate::{InputKind, Result, TransformerConfig};

/// Outcome of a successful run
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineReport {
    pub rules: usize,
    pub language: Option<Language>,
    pub summary: RewriteSummary,
    pub stats: Vec<RuleStats>,
    pub output: PathBuf,
}

impl PipelineReport {
    pub fn nodes_visited(&self) -> u64 {
        self.summary.nodes_visited
    }

    pub fn rewrites(&self) -> u64 {
        self.summary.rewrites
    }
}

/// Run the whole transformation described by `config`
pub fn run(config: &TransformerConfig) -> Result<PipelineReport> {
    let rules = load_rules(&config.rules).inspect_err(|e| {
        error!(initiator = "rules", path = %config.rules.display(), "{e}");
    })?;

    let (tree, language) = read_input(config).inspect_err(|e| {
        error!(initiator = "parser", path = %config.source.display(), "{e}");
    })?;

    let (transformed, mut report) = rewrite(&rules, &tree).inspect_err(|e| {
        error!(initiator = "transformer", "{e}");
    })?;

    write_tree(&config.json, &transformed, language).inspect_err(|e| {
        error!(initiator = "serializer", path = %config.json.display(), "{e}");
    })?;

    report.language = language;
    report.output = config.json.clone();
    info!(
        source = %config.source.display(),
        output = %report.output.display(),
        rules = report.rules,
        nodes = report.nodes_visited(),
        rewrites = report.rewrites(),
        "Transformation finished"
    );
    Ok(report)
}

fn read_input(config: &TransformerConfig) -> Result<(Arc<SyntaxNode>, Option<Language>)> {
    match config.input_kind()? {
        InputKind::Source(language) => {
            let mut parser = create_parser(language)?;
            debug!(
                path = %config.source.display(),
                language = %language,
                parser = parser.name(),
                "Parsing source"
            );
            let tree = parser.parse_file(&config.source)?;
            Ok((tree, Some(language)))
        }
        InputKind::Tree => {
            debug!(path = %config.source.display(), "Reading serialized tree");
            read_tree(&config.source)
        }
    }
}

fn rewrite(rules: &RuleSet, tree: &Arc<SyntaxNode>) -> Result<(Arc<SyntaxNode>, PipelineReport)> {
    let mut rewriter = Rewriter::new(rules);
    let transformed = rewriter.transform(tree)?;

    let report = PipelineReport {
        rules: rules.len(),
        language: None,
        summary: rewriter.summary().clone(),
        stats: rewriter.stats().to_vec(),
        output: PathBuf::new(),
    };
    Ok((transformed, report))
}
