/*!
# Deep Tree Tests

Long operator chains nest one tree level per operand. Parsing, rewriting,
serializing and reading such trees must not depend on the thread's stack.
*/

use std::fmt::Write as _;
use std::fs;
use std::sync::Arc;

use trastformer_core::{
    from_json, parse_rules, parse_source, read_tree, run, to_json, Language, Rewriter,
    SyntaxNode, TransformerConfig,
};

const OPERANDS: usize = 20_000;
/// Pretty-printed JSON indents every level, so its size grows with the square of the depth
const JSON_OPERANDS: usize = 2_000;

fn java_chain(operator: &str, operands: usize) -> String {
    let mut source = String::from("class Deep { int calc() { return 0");
    for i in 1..operands {
        write!(source, " {operator} {i}").unwrap();
    }
    source.push_str("; } }\n");
    source
}

fn count(tree: &SyntaxNode, kind: &str) -> usize {
    tree.descendants().filter(|node| node.kind() == kind).count()
}

#[test]
fn test_long_chain_is_parsed_and_rewritten() {
    let tree = parse_source(&java_chain("+", OPERANDS), Language::Java).unwrap();
    assert_eq!(count(&tree, "Addition"), OPERANDS - 1);
    assert!(tree.depth() > OPERANDS);

    let rules = parse_rules("Addition(#1, #2) -> Subtraction(#1, #2);").unwrap();
    let mut rewriter = Rewriter::new(&rules);
    let result = rewriter.transform(&tree).unwrap();

    assert_eq!(rewriter.summary().rewrites, (OPERANDS - 1) as u64);
    assert_eq!(rewriter.summary().nodes_visited, tree.node_count() as u64);
    assert_eq!(count(&result, "Addition"), 0);
    assert_eq!(count(&result, "Subtraction"), OPERANDS - 1);
    assert_eq!(result.depth(), tree.depth());

    let text = result.to_string();
    assert!(text.contains(r#"Subtraction(Subtraction(IntegerLiteral<"0">, IntegerLiteral<"1">), IntegerLiteral<"2">)"#));
}

#[test]
fn test_long_chain_without_match_is_shared() {
    let tree = parse_source(&java_chain("*", OPERANDS), Language::Java).unwrap();
    let rules = parse_rules("Addition(#1, #2) -> Subtraction(#1, #2);").unwrap();
    let result = Rewriter::new(&rules).transform(&tree).unwrap();
    assert!(Arc::ptr_eq(&result, &tree));
}

#[test]
fn test_long_chain_survives_json() {
    let tree = parse_source(&java_chain("-", JSON_OPERANDS), Language::Java).unwrap();
    let text = to_json(&tree, Some(Language::Java)).unwrap();
    let (read, language) = from_json(&text).unwrap();

    assert_eq!(language, Some(Language::Java));
    assert_eq!(read.node_count(), tree.node_count());
    assert_eq!(read.depth(), tree.depth());
    assert_eq!(read.to_string(), tree.to_string());
}

#[test]
fn test_pipeline_output_is_valid_input() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let source = dir.path().join("Deep.java");
    fs::write(&source, java_chain("*", 80))?;
    let rules = dir.path().join("rules.dsl");
    fs::write(&rules, "Multiplication(#1, #2) -> Division(#1, #2);")?;

    let first = TransformerConfig::new(&source, &rules, dir.path().join("first.json"));
    assert_eq!(run(&first)?.rewrites(), 79);

    let (tree, _) = read_tree(&first.json)?;
    assert_eq!(count(&tree, "Division"), 79);

    // feed the serialized tree back in
    fs::write(&rules, "Division(#1, #2) -> Multiplication(#1, #2);")?;
    let second = TransformerConfig::new(&first.json, &rules, dir.path().join("second.json"));
    let report = run(&second)?;
    assert_eq!(report.rewrites(), 79);
    assert_eq!(report.language, Some(Language::Java));
    Ok(())
}
