use std::collections::BTreeSet;

use super::lexer::{lex, Spanned, Token};
use super::rule::{PatternNode, Rule, RuleSet, Template};
use crate::errors::DslSyntaxError;

type ParseResult<T> = Result<T, DslSyntaxError>;

/// Where a capture placeholder appeared in the rule text
#[derive(Debug, Clone, Copy)]
struct CaptureSite {
    number: u32,
    line: u32,
    column: u32,
}

/// Parse DSL text into an ordered rule set.
///
/// Validation is eager: any malformed statement rejects the whole text.
pub fn parse_rules(src: &str) -> ParseResult<RuleSet> {
    let tokens = lex(src)?;
    RuleParser { tokens, pos: 0 }.parse_all()
}

struct RuleParser {
    tokens: Vec<Spanned>,
    pos: usize,
}

impl RuleParser {
    fn peek(&self) -> &Spanned {
        // lex() always terminates the stream with Eof
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> Spanned {
        let tok = self.peek().clone();
        if tok.token != Token::Eof {
            self.pos += 1;
        }
        tok
    }

    fn error_at(tok: &Spanned, message: impl Into<String>) -> DslSyntaxError {
        DslSyntaxError::new(tok.line, tok.column, message)
    }

    fn parse_all(mut self) -> ParseResult<RuleSet> {
        let mut rules = Vec::new();
        while self.peek().token != Token::Eof {
            let rule = self.parse_rule(rules.len())?;
            rules.push(rule);
        }
        Ok(RuleSet::new(rules))
    }

    fn parse_rule(&mut self, index: usize) -> ParseResult<Rule> {
        let start = self.peek().clone();
        match &start.token {
            Token::Tag(_) => {}
            Token::Capture(n) => {
                return Err(Self::error_at(
                    &start,
                    format!("a pattern must start with a type name, found capture '#{n}'"),
                ))
            }
            other => {
                return Err(Self::error_at(
                    &start,
                    format!("expected a type name at the start of a rule, found {other}"),
                ))
            }
        }

        let mut pattern_sites = Vec::new();
        let pattern = self.parse_pattern(&mut pattern_sites)?;

        let arrow = self.advance();
        if arrow.token != Token::Arrow {
            return Err(Self::error_at(
                &arrow,
                format!("expected '->' after the pattern, found {}", arrow.token),
            ));
        }

        let mut template_sites = Vec::new();
        let replacement = self.parse_template(&mut template_sites)?;

        let terminator = self.advance();
        if terminator.token != Token::Semicolon {
            return Err(Self::error_at(
                &terminator,
                format!(
                    "expected ';' after the replacement, found {}",
                    terminator.token
                ),
            ));
        }

        let bound = check_pattern_captures(&pattern_sites)?;
        check_template_captures(&bound, &template_sites)?;

        Ok(Rule {
            index,
            line: start.line,
            column: start.column,
            pattern,
            replacement,
        })
    }

    fn parse_pattern(&mut self, sites: &mut Vec<CaptureSite>) -> ParseResult<PatternNode> {
        let tok = self.advance();
        match tok.token {
            Token::Capture(number) => {
                sites.push(CaptureSite {
                    number,
                    line: tok.line,
                    column: tok.column,
                });
                Ok(PatternNode::Capture(number))
            }
            Token::Tag(ref kind) => {
                let data = self.parse_data()?;
                let children = self.parse_children(kind, &tok, |p| p.parse_pattern(sites))?;
                Ok(PatternNode::Node {
                    kind: kind.clone(),
                    data,
                    children,
                })
            }
            ref other => Err(Self::error_at(
                &tok,
                format!("expected a type name or capture, found {other}"),
            )),
        }
    }

    fn parse_template(&mut self, sites: &mut Vec<CaptureSite>) -> ParseResult<Template> {
        let tok = self.advance();
        match tok.token {
            Token::Capture(number) => {
                sites.push(CaptureSite {
                    number,
                    line: tok.line,
                    column: tok.column,
                });
                Ok(Template::Capture(number))
            }
            Token::Tag(ref kind) => {
                let data = self.parse_data()?;
                let children = self.parse_children(kind, &tok, |p| p.parse_template(sites))?;
                Ok(Template::Node {
                    kind: kind.clone(),
                    data,
                    children,
                })
            }
            ref other => Err(Self::error_at(
                &tok,
                format!("expected a type name or capture, found {other}"),
            )),
        }
    }

    /// Optional `<"data">` suffix after a type name
    fn parse_data(&mut self) -> ParseResult<Option<String>> {
        if self.peek().token != Token::LAngle {
            return Ok(None);
        }
        self.advance();

        let value = self.advance();
        let data = match value.token {
            Token::Str(s) => s,
            ref other => {
                return Err(Self::error_at(
                    &value,
                    format!("expected a quoted string after '<', found {other}"),
                ))
            }
        };

        let close = self.advance();
        if close.token != Token::RAngle {
            return Err(Self::error_at(
                &close,
                format!("expected '>' to close the data literal, found {}", close.token),
            ));
        }
        Ok(Some(data))
    }

    /// Optional parenthesized, comma-separated child list
    fn parse_children<T>(
        &mut self,
        kind: &str,
        opened: &Spanned,
        mut item: impl FnMut(&mut Self) -> ParseResult<T>,
    ) -> ParseResult<Vec<T>> {
        if self.peek().token != Token::LParen {
            return Ok(Vec::new());
        }
        self.advance();

        let mut children = Vec::new();
        if self.peek().token == Token::RParen {
            self.advance();
            return Ok(children);
        }

        loop {
            children.push(item(self)?);
            let next = self.advance();
            match next.token {
                Token::Comma => continue,
                Token::RParen => return Ok(children),
                ref other => {
                    return Err(Self::error_at(
                        &next,
                        format!(
                            "expected ',' or ')' in the children of '{kind}' opened at {}:{}, found {other}",
                            opened.line, opened.column
                        ),
                    ))
                }
            }
        }
    }
}

/// Pattern captures must be exactly #1..#N, each used once
fn check_pattern_captures(sites: &[CaptureSite]) -> ParseResult<BTreeSet<u32>> {
    let mut ordered: Vec<&CaptureSite> = sites.iter().collect();
    ordered.sort_by_key(|site| (site.number, site.line, site.column));

    let mut expected = 1;
    for site in ordered {
        if site.number < expected {
            return Err(DslSyntaxError::new(
                site.line,
                site.column,
                format!("duplicate capture #{} in pattern", site.number),
            ));
        }
        if site.number > expected {
            return Err(DslSyntaxError::new(
                site.line,
                site.column,
                format!(
                    "capture #{} skips #{expected}; pattern captures must be numbered contiguously from #1",
                    site.number
                ),
            ));
        }
        expected += 1;
    }

    Ok(sites.iter().map(|site| site.number).collect())
}

fn check_template_captures(bound: &BTreeSet<u32>, sites: &[CaptureSite]) -> ParseResult<()> {
    for site in sites {
        if !bound.contains(&site.number) {
            let available = match bound.last() {
                Some(last) => format!("the pattern binds #1..#{last}"),
                None => "the pattern binds no captures".to_string(),
            };
            return Err(DslSyntaxError::new(
                site.line,
                site.column,
                format!(
                    "undefined capture #{} in replacement; {available}",
                    site.number
                ),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn node(kind: &str, children: Vec<PatternNode>) -> PatternNode {
        PatternNode::Node {
            kind: kind.to_string(),
            data: None,
            children,
        }
    }

    #[test]
    fn test_parse_example_rule() {
        let rules = parse_rules("Addition(#1, #2) -> Subtraction(#1, #2);").unwrap();
        assert_eq!(rules.len(), 1);

        let rule = rules.get(0).unwrap();
        assert_eq!(rule.index(), 0);
        assert_eq!(rule.position(), (1, 1));
        assert_eq!(
            rule.pattern(),
            &node(
                "Addition",
                vec![PatternNode::Capture(1), PatternNode::Capture(2)]
            )
        );
        assert_eq!(
            rule.replacement(),
            &Template::Node {
                kind: "Subtraction".into(),
                data: None,
                children: vec![Template::Capture(1), Template::Capture(2)],
            }
        );
    }

    #[test]
    fn test_rules_keep_declaration_order() {
        let text = "
            // arithmetic
            Addition(#1, #2) -> Subtraction(#1, #2);
            Multiplication(#1, #2) -> Division(#1, #2);
        ";
        let rules = parse_rules(text).unwrap();
        let kinds: Vec<_> = rules.iter().map(|r| r.pattern().kind()).collect();
        assert_eq!(kinds, vec![Some("Addition"), Some("Multiplication")]);
        assert_eq!(rules.get(1).unwrap().index(), 1);
        assert_eq!(rules.get(1).unwrap().position(), (4, 13));
    }

    #[test]
    fn test_empty_text_is_an_empty_rule_set() {
        assert!(parse_rules("").unwrap().is_empty());
        assert!(parse_rules("  // nothing here\n").unwrap().is_empty());
    }

    #[test]
    fn test_nested_captures_and_data() {
        let text = r#"Return(Addition(#1, IntegerLiteral<"0">)) -> Return(#1);"#;
        let rules = parse_rules(text).unwrap();
        let rule = rules.get(0).unwrap();
        assert_eq!(rule.pattern().captures(), vec![1]);
        assert_eq!(rule.to_string(), text);
    }

    #[test]
    fn test_bare_tag_and_empty_parens_mean_no_children() {
        let rules = parse_rules("This -> Self(); Self() -> This;").unwrap();
        assert_eq!(rules.get(0).unwrap().pattern(), &node("This", vec![]));
        assert_eq!(rules.get(1).unwrap().pattern(), &node("Self", vec![]));
    }

    #[test]
    fn test_template_may_be_a_bare_capture() {
        let rules = parse_rules("Parenthesized(#1) -> #1;").unwrap();
        assert_eq!(rules.get(0).unwrap().replacement(), &Template::Capture(1));
    }

    #[test]
    fn test_captures_may_be_dropped_or_repeated() {
        let rules = parse_rules("Pair(#1, #2) -> Pair(#1, #1);").unwrap();
        assert_eq!(rules.get(0).unwrap().replacement().captures(), vec![1, 1]);
    }

    #[test]
    fn test_rejects_non_contiguous_captures() {
        let err = parse_rules("Addition(#1, #3) -> Subtraction(#1, #3);").unwrap_err();
        assert_eq!((err.line, err.column), (1, 14));
        assert!(err.message.contains("capture #3 skips #2"), "{err}");
    }

    #[test]
    fn test_rejects_duplicate_captures() {
        let err = parse_rules("Addition(#1, #1) -> Subtraction(#1, #1);").unwrap_err();
        assert_eq!(err.message, "duplicate capture #1 in pattern");
        assert_eq!(err.column, 14);
    }

    #[test]
    fn test_rejects_captures_not_starting_at_one() {
        let err = parse_rules("Negation(#2) -> Negation(#2);").unwrap_err();
        assert!(err.message.contains("skips #1"));
    }

    #[test]
    fn test_rejects_undefined_template_capture() {
        let err = parse_rules("Addition(#1, #2) -> Subtraction(#1, #3);").unwrap_err();
        assert_eq!((err.line, err.column), (1, 37));
        assert_eq!(
            err.message,
            "undefined capture #3 in replacement; the pattern binds #1..#2"
        );

        let err = parse_rules("Empty -> Wrapper(#1);").unwrap_err();
        assert!(err.message.contains("the pattern binds no captures"));
    }

    #[test]
    fn test_rejects_unbalanced_parentheses() {
        let err = parse_rules("Addition(#1, #2 -> Subtraction(#1, #2);").unwrap_err();
        assert_eq!((err.line, err.column), (1, 17));
        assert!(err.message.contains("opened at 1:1"), "{err}");

        let err = parse_rules("Addition(#1, #2)) -> Subtraction(#1, #2);").unwrap_err();
        assert_eq!(err.message, "expected '->' after the pattern, found ')'");
    }

    #[test]
    fn test_rejects_missing_terminator() {
        let err = parse_rules("Addition(#1, #2) -> Subtraction(#1, #2)").unwrap_err();
        assert_eq!(
            err.message,
            "expected ';' after the replacement, found end of input"
        );

        let err = parse_rules("A -> B\nC -> D;").unwrap_err();
        assert_eq!((err.line, err.column), (2, 1));
    }

    #[test]
    fn test_rejects_capture_at_pattern_root() {
        let err = parse_rules("#1 -> Wrapper(#1);").unwrap_err();
        assert!(err.message.contains("must start with a type name"));
    }

    #[test]
    fn test_rejects_malformed_data() {
        let err = parse_rules("Literal<Two> -> Literal;").unwrap_err();
        assert_eq!(
            err.message,
            "expected a quoted string after '<', found 'Two'"
        );

        let err = parse_rules("Literal<\"2\" -> Literal;").unwrap_err();
        assert!(err.message.contains("expected '>'"));
    }

    #[test]
    fn test_no_partial_rule_set_on_late_error() {
        let text = "Addition(#1, #2) -> Subtraction(#1, #2);\nBroken(#1 -> X;";
        assert!(parse_rules(text).is_err());
    }
}
