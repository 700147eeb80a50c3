/*!
# Node Kind Unification

Maps grammar-specific tree-sitter node kinds onto language-neutral type tags,
so one rule file can be applied to trees parsed from different languages.
*/

/// Kinds whose two named children are operands around an operator token
pub const BINARY_KINDS: &[&str] = &[
    "binary_expression",
    "binary_operator",
    "boolean_operator",
    "comparison_operator",
];

/// Kinds that are dropped so their single inner expression takes their place
pub const TRANSPARENT_KINDS: &[&str] = &["parenthesized_expression"];

const INTEGER_KINDS: &[&str] = &[
    "decimal_integer_literal",
    "hex_integer_literal",
    "octal_integer_literal",
    "binary_integer_literal",
    "integer",
];

const FLOAT_KINDS: &[&str] = &[
    "decimal_floating_point_literal",
    "hex_floating_point_literal",
    "float",
];

const STRING_KINDS: &[&str] = &["string_literal", "string", "template_string"];

/// Tag for a binary operator token, if it has a unified name
pub fn binary_tag(operator: &str) -> Option<&'static str> {
    let tag = match operator {
        "+" => "Addition",
        "-" => "Subtraction",
        "*" => "Multiplication",
        "/" => "Division",
        "%" => "Modulus",
        "==" | "===" => "Equal",
        "!=" | "!==" => "NotEqual",
        "<" => "LessThan",
        ">" => "GreaterThan",
        "<=" => "LessOrEqual",
        ">=" => "GreaterOrEqual",
        "&&" | "and" => "LogicalAnd",
        "||" | "or" => "LogicalOr",
        _ => return None,
    };
    Some(tag)
}

/// Tag for a literal-like node whose source text becomes its data.
///
/// JavaScript has a single `number` kind, split here by the shape of the text.
pub fn literal_tag(kind: &str, text: &str) -> Option<&'static str> {
    if INTEGER_KINDS.contains(&kind) {
        return Some("IntegerLiteral");
    }
    if FLOAT_KINDS.contains(&kind) {
        return Some("FloatLiteral");
    }
    if STRING_KINDS.contains(&kind) {
        return Some("StringLiteral");
    }
    match kind {
        "number" => {
            let integral = !text.contains(['.', 'e', 'E']) || text.starts_with("0x");
            Some(if integral { "IntegerLiteral" } else { "FloatLiteral" })
        }
        "true" | "false" => Some("BooleanLiteral"),
        "null_literal" | "null" | "none" => Some("NullLiteral"),
        "identifier" => Some("Identifier"),
        _ => None,
    }
}

/// `class_declaration` -> `ClassDeclaration`
pub fn camel_case(kind: &str) -> String {
    kind.split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binary_tags() {
        assert_eq!(binary_tag("+"), Some("Addition"));
        assert_eq!(binary_tag("and"), Some("LogicalAnd"));
        assert_eq!(binary_tag("==="), Some("Equal"));
        assert_eq!(binary_tag("<<"), None);
    }

    #[test]
    fn test_literal_tags() {
        assert_eq!(literal_tag("decimal_integer_literal", "2"), Some("IntegerLiteral"));
        assert_eq!(literal_tag("number", "42"), Some("IntegerLiteral"));
        assert_eq!(literal_tag("number", "0xFF"), Some("IntegerLiteral"));
        assert_eq!(literal_tag("number", "4.5"), Some("FloatLiteral"));
        assert_eq!(literal_tag("number", "1e3"), Some("FloatLiteral"));
        assert_eq!(literal_tag("string", "'x'"), Some("StringLiteral"));
        assert_eq!(literal_tag("none", "None"), Some("NullLiteral"));
        assert_eq!(literal_tag("type_identifier", "Foo"), None);
    }

    #[test]
    fn test_camel_case() {
        assert_eq!(camel_case("class_declaration"), "ClassDeclaration");
        assert_eq!(camel_case("program"), "Program");
        assert_eq!(camel_case("__weird__kind"), "WeirdKind");
    }
}
