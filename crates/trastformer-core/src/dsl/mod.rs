/*!
# Rule DSL

Text format for rewrite rules:

```text
// comments are allowed
Addition(#1, #2) -> Subtraction(#1, #2);
Return(Addition(#1, IntegerLiteral<"0">)) -> Return(#1);
```

Each statement is `Pattern -> Replacement;`. Patterns are type tags with an
optional `<"data">` constraint and optional parenthesized children; a child
is a nested pattern or a capture `#N`. Pattern captures are numbered
`#1..#N` without gaps or repeats and replacements may only use those.
*/

pub mod lexer;
pub mod parser;
pub mod rule;

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::{Result, TrastformerError};

pub use parser::parse_rules;
pub use rule::{PatternNode, Rule, RuleSet, Template};

/// Read and parse a rule file
pub fn load_rules(path: impl AsRef<Path>) -> Result<RuleSet> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|e| TrastformerError::io(path, e))?;
    let rules = parse_rules(&text)?;
    debug!(path = %path.display(), rules = rules.len(), "Loaded rewrite rules");
    Ok(rules)
}
