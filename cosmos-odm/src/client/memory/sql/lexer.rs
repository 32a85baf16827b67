use crate::errors::{CosmosError, CosmosResult, ErrorKind};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    Ident(String),
    Param(String),
    Str(String),
    Number(serde_json::Number),
    Star,
    Dot,
    Comma,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl Token {
    /// Case-insensitive keyword check.
    pub(crate) fn is_keyword(&self, keyword: &str) -> bool {
        matches!(self, Token::Ident(ident) if ident.eq_ignore_ascii_case(keyword))
    }
}

/// Splits native query text into tokens.
pub(crate) fn tokenize(text: &str) -> CosmosResult<Vec<Token>> {
    let chars: Vec<char> = text.chars().collect();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < chars.len() {
        let c = chars[pos];
        match c {
            c if c.is_whitespace() => pos += 1,
            '*' => push(&mut tokens, &mut pos, Token::Star, 1),
            '.' => push(&mut tokens, &mut pos, Token::Dot, 1),
            ',' => push(&mut tokens, &mut pos, Token::Comma, 1),
            '(' => push(&mut tokens, &mut pos, Token::LParen, 1),
            ')' => push(&mut tokens, &mut pos, Token::RParen, 1),
            '[' => push(&mut tokens, &mut pos, Token::LBracket, 1),
            ']' => push(&mut tokens, &mut pos, Token::RBracket, 1),
            '=' => push(&mut tokens, &mut pos, Token::Eq, 1),
            '!' if peek(&chars, pos + 1) == Some('=') => push(&mut tokens, &mut pos, Token::Ne, 2),
            '<' => match peek(&chars, pos + 1) {
                Some('=') => push(&mut tokens, &mut pos, Token::Le, 2),
                Some('>') => push(&mut tokens, &mut pos, Token::Ne, 2),
                _ => push(&mut tokens, &mut pos, Token::Lt, 1),
            },
            '>' => match peek(&chars, pos + 1) {
                Some('=') => push(&mut tokens, &mut pos, Token::Ge, 2),
                _ => push(&mut tokens, &mut pos, Token::Gt, 1),
            },
            '@' => {
                let start = pos;
                pos += 1;
                while pos < chars.len() && is_ident_char(chars[pos]) {
                    pos += 1;
                }
                if pos == start + 1 {
                    return Err(syntax_error("empty parameter name", start));
                }
                tokens.push(Token::Param(chars[start..pos].iter().collect()));
            }
            '"' | '\'' => {
                let (value, next) = read_string(&chars, pos)?;
                tokens.push(Token::Str(value));
                pos = next;
            }
            c if c.is_ascii_digit() || (c == '-' && peek(&chars, pos + 1).is_some_and(|n| n.is_ascii_digit())) => {
                let start = pos;
                pos += 1;
                while pos < chars.len() && (chars[pos].is_ascii_digit() || chars[pos] == '.') {
                    pos += 1;
                }
                let literal: String = chars[start..pos].iter().collect();
                tokens.push(Token::Number(parse_number(&literal, start)?));
            }
            c if is_ident_start(c) => {
                let start = pos;
                while pos < chars.len() && is_ident_char(chars[pos]) {
                    pos += 1;
                }
                tokens.push(Token::Ident(chars[start..pos].iter().collect()));
            }
            other => {
                return Err(syntax_error(&format!("unexpected character '{}'", other), pos));
            }
        }
    }

    Ok(tokens)
}

#[inline]
fn push(tokens: &mut Vec<Token>, pos: &mut usize, token: Token, width: usize) {
    tokens.push(token);
    *pos += width;
}

#[inline]
fn peek(chars: &[char], pos: usize) -> Option<char> {
    chars.get(pos).copied()
}

#[inline]
fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

#[inline]
fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn read_string(chars: &[char], start: usize) -> CosmosResult<(String, usize)> {
    let quote = chars[start];
    let mut value = String::new();
    let mut pos = start + 1;
    while pos < chars.len() {
        match chars[pos] {
            '\\' if pos + 1 < chars.len() => {
                value.push(chars[pos + 1]);
                pos += 2;
            }
            c if c == quote => return Ok((value, pos + 1)),
            c => {
                value.push(c);
                pos += 1;
            }
        }
    }
    Err(syntax_error("unterminated string literal", start))
}

fn parse_number(literal: &str, at: usize) -> CosmosResult<serde_json::Number> {
    if let Ok(i) = literal.parse::<i64>() {
        return Ok(serde_json::Number::from(i));
    }
    literal
        .parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
        .ok_or_else(|| syntax_error(&format!("invalid number '{}'", literal), at))
}

fn syntax_error(message: &str, at: usize) -> CosmosError {
    log::error!("Syntax error at position {}: {}", at, message);
    CosmosError::new(
        &format!("Syntax error at position {}: {}", at, message),
        ErrorKind::InvalidQuery,
    )
}
