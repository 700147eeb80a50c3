use std::fmt;

use crate::errors::DslSyntaxError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Node type tag
    Tag(String),
    /// Capture placeholder `#N`
    Capture(u32),
    /// Quoted data literal (content without quotes, escapes resolved)
    Str(String),
    LParen,
    RParen,
    LAngle,
    RAngle,
    Comma,
    Arrow,
    Semicolon,
    Eof,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Tag(name) => write!(f, "'{name}'"),
            Token::Capture(n) => write!(f, "'#{n}'"),
            Token::Str(_) => write!(f, "string literal"),
            Token::LParen => write!(f, "'('"),
            Token::RParen => write!(f, "')'"),
            Token::LAngle => write!(f, "'<'"),
            Token::RAngle => write!(f, "'>'"),
            Token::Comma => write!(f, "','"),
            Token::Arrow => write!(f, "'->'"),
            Token::Semicolon => write!(f, "';'"),
            Token::Eof => write!(f, "end of input"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spanned {
    pub token: Token,
    pub line: u32,
    pub column: u32,
}

struct Cursor {
    chars: Vec<char>,
    pos: usize,
    line: u32,
    column: u32,
}

impl Cursor {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_next(&self) -> Option<char> {
        self.chars.get(self.pos + 1).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }
}

pub fn lex(src: &str) -> Result<Vec<Spanned>, DslSyntaxError> {
    let mut cursor = Cursor {
        chars: src.chars().collect(),
        pos: 0,
        line: 1,
        column: 1,
    };
    let mut tokens = Vec::new();

    while let Some(c) = cursor.peek() {
        let (line, column) = (cursor.line, cursor.column);

        // Line comment
        if c == '/' && cursor.peek_next() == Some('/') {
            while cursor.peek().is_some_and(|c| c != '\n') {
                cursor.bump();
            }
            continue;
        }

        // Block comment
        if c == '/' && cursor.peek_next() == Some('*') {
            cursor.bump();
            cursor.bump();
            loop {
                match cursor.bump() {
                    None => {
                        return Err(DslSyntaxError::new(
                            line,
                            column,
                            "unterminated block comment",
                        ))
                    }
                    Some('*') if cursor.peek() == Some('/') => {
                        cursor.bump();
                        break;
                    }
                    Some(_) => {}
                }
            }
            continue;
        }

        if c.is_whitespace() {
            cursor.bump();
            continue;
        }

        let token = match c {
            '(' => {
                cursor.bump();
                Token::LParen
            }
            ')' => {
                cursor.bump();
                Token::RParen
            }
            '<' => {
                cursor.bump();
                Token::LAngle
            }
            '>' => {
                cursor.bump();
                Token::RAngle
            }
            ',' => {
                cursor.bump();
                Token::Comma
            }
            ';' => {
                cursor.bump();
                Token::Semicolon
            }
            '-' if cursor.peek_next() == Some('>') => {
                cursor.bump();
                cursor.bump();
                Token::Arrow
            }
            '#' => {
                cursor.bump();
                lex_capture(&mut cursor, line, column)?
            }
            '"' => {
                cursor.bump();
                lex_string(&mut cursor, line, column)?
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let mut name = String::new();
                while let Some(c) = cursor.peek() {
                    if c.is_ascii_alphanumeric() || c == '_' {
                        name.push(c);
                        cursor.bump();
                    } else {
                        break;
                    }
                }
                Token::Tag(name)
            }
            other => {
                return Err(DslSyntaxError::new(
                    line,
                    column,
                    format!("unexpected character '{other}'"),
                ))
            }
        };

        tokens.push(Spanned {
            token,
            line,
            column,
        });
    }

    tokens.push(Spanned {
        token: Token::Eof,
        line: cursor.line,
        column: cursor.column,
    });
    Ok(tokens)
}

fn lex_capture(cursor: &mut Cursor, line: u32, column: u32) -> Result<Token, DslSyntaxError> {
    let mut digits = String::new();
    while let Some(c) = cursor.peek().filter(char::is_ascii_digit) {
        digits.push(c);
        cursor.bump();
    }
    if digits.is_empty() {
        return Err(DslSyntaxError::new(
            line,
            column,
            "expected a capture number after '#'",
        ));
    }
    let number: u32 = digits.parse().map_err(|_| {
        DslSyntaxError::new(line, column, format!("capture number #{digits} is too large"))
    })?;
    if number == 0 {
        return Err(DslSyntaxError::new(
            line,
            column,
            "capture numbers start at #1",
        ));
    }
    Ok(Token::Capture(number))
}

fn lex_string(cursor: &mut Cursor, line: u32, column: u32) -> Result<Token, DslSyntaxError> {
    let mut value = String::new();
    loop {
        match cursor.bump() {
            None | Some('\n') => {
                return Err(DslSyntaxError::new(
                    line,
                    column,
                    "unterminated string literal",
                ))
            }
            Some('"') => return Ok(Token::Str(value)),
            Some('\\') => match cursor.bump() {
                Some('"') => value.push('"'),
                Some('\\') => value.push('\\'),
                Some('n') => value.push('\n'),
                Some('t') => value.push('\t'),
                Some(other) => {
                    value.push('\\');
                    value.push(other);
                }
                None => {
                    return Err(DslSyntaxError::new(
                        line,
                        column,
                        "unterminated escape in string literal",
                    ))
                }
            },
            Some(c) => value.push(c),
        }
    }
}
