//! Parser for the single-call expressions accepted by `formula-regex eval`.
//!
//! Grammar: `NAME(arg, ...)` where an argument is a string literal (`"..."`, with `""` for a
//! quote), a number, `TRUE`/`FALSE`, an error literal such as `#N/A`, or nothing at all
//! (an omitted argument).

use std::iter::Peekable;
use std::str::CharIndices;

use formula_regex::{ErrorKind, Value};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub name: String,
    pub args: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CallParseError {
    #[error("expected `NAME(arg, ...)`")]
    NotACall,
    #[error("invalid function name `{0}`")]
    InvalidName(String),
    #[error("unterminated string literal")]
    UnterminatedString,
    #[error("unexpected `{found}` at offset {offset}")]
    Unexpected { found: char, offset: usize },
    #[error("invalid argument `{0}`")]
    InvalidLiteral(String),
}

pub fn parse_call(src: &str) -> Result<Call, CallParseError> {
    let src = src.trim();
    let open = src.find('(').ok_or(CallParseError::NotACall)?;
    let name = src[..open].trim();
    if name.is_empty()
        || !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
    {
        return Err(CallParseError::InvalidName(name.to_string()));
    }
    let body = src[open + 1..]
        .strip_suffix(')')
        .ok_or(CallParseError::NotACall)?;
    Ok(Call {
        name: name.to_string(),
        args: parse_args(body)?,
    })
}

fn parse_args(body: &str) -> Result<Vec<Value>, CallParseError> {
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }

    let mut args = Vec::new();
    let mut chars = body.char_indices().peekable();
    loop {
        skip_whitespace(&mut chars);
        let value = match chars.peek() {
            Some(&(_, '"')) => {
                chars.next();
                Value::Text(string_literal(&mut chars)?)
            }
            _ => {
                let mut token = String::new();
                while let Some(&(_, c)) = chars.peek() {
                    if c == ',' {
                        break;
                    }
                    token.push(c);
                    chars.next();
                }
                bare_literal(token.trim())?
            }
        };
        args.push(value);

        skip_whitespace(&mut chars);
        match chars.next() {
            None => break,
            Some((_, ',')) => continue,
            Some((offset, found)) => return Err(CallParseError::Unexpected { found, offset }),
        }
    }
    Ok(args)
}

fn skip_whitespace(chars: &mut Peekable<CharIndices<'_>>) {
    while matches!(chars.peek(), Some((_, c)) if c.is_whitespace()) {
        chars.next();
    }
}

/// Reads up to the closing quote; the opening quote has already been consumed.
fn string_literal(chars: &mut Peekable<CharIndices<'_>>) -> Result<String, CallParseError> {
    let mut out = String::new();
    loop {
        match chars.next() {
            Some((_, '"')) => {
                if matches!(chars.peek(), Some((_, '"'))) {
                    chars.next();
                    out.push('"');
                } else {
                    return Ok(out);
                }
            }
            Some((_, c)) => out.push(c),
            None => return Err(CallParseError::UnterminatedString),
        }
    }
}

fn bare_literal(token: &str) -> Result<Value, CallParseError> {
    if token.is_empty() {
        return Ok(Value::Missing);
    }
    if token.eq_ignore_ascii_case("TRUE") {
        return Ok(Value::Bool(true));
    }
    if token.eq_ignore_ascii_case("FALSE") {
        return Ok(Value::Bool(false));
    }
    let error = [ErrorKind::Value, ErrorKind::NA, ErrorKind::Name, ErrorKind::Num]
        .into_iter()
        .find(|kind| kind.as_code().eq_ignore_ascii_case(token));
    if let Some(kind) = error {
        return Ok(Value::Error(kind));
    }
    token
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .map(Value::Number)
        .ok_or_else(|| CallParseError::InvalidLiteral(token.to_string()))
}
