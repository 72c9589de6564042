//! Argument coercions for the regex worksheet functions.
//!
//! Every semantic parameter gets its own total coercion so the quirks of each one stay visible
//! in a single place. Empty cells are treated like omitted arguments throughout.

use crate::value::{ErrorKind, Value};

/// Text argument that must be present and non-empty (`input`, `pattern`).
pub fn required_text(value: &Value) -> Result<String, ErrorKind> {
    match optional_text(value)? {
        Some(text) if !text.is_empty() => Ok(text),
        _ => Err(ErrorKind::Value),
    }
}

/// Optional text argument. Empty text is kept as `Some("")`; callers decide whether an empty
/// template means "no template".
pub fn optional_text(value: &Value) -> Result<Option<String>, ErrorKind> {
    match value {
        Value::Missing | Value::Blank => Ok(None),
        Value::Error(e) => Err(*e),
        Value::Text(s) => Ok(Some(s.clone())),
        Value::Number(_) | Value::Bool(_) => Ok(Some(value.to_string())),
    }
}

/// Integer flag arguments (`options`, `MaxMatches`). Omitted means 0.
pub fn to_int_flag(value: &Value) -> Result<i64, ErrorKind> {
    match value {
        Value::Missing | Value::Blank => Ok(0),
        Value::Error(e) => Err(*e),
        Value::Number(n) => truncate(*n),
        Value::Bool(b) => Ok(i64::from(*b)),
        Value::Text(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Ok(0);
            }
            parse_int(trimmed).ok_or(ErrorKind::Value)
        }
    }
}

/// `MaxGroups`: numbers truncate, integer text parses, `TRUE` means one group per match.
pub fn to_max_groups(value: &Value) -> Result<i64, ErrorKind> {
    match value {
        Value::Missing | Value::Blank => Ok(0),
        Value::Error(e) => Err(*e),
        Value::Number(n) => truncate(*n),
        Value::Text(s) if s.is_empty() => Ok(0),
        Value::Text(s) => parse_int(s.trim()).ok_or(ErrorKind::Value),
        Value::Bool(true) => Ok(1),
        Value::Bool(false) => Ok(0),
    }
}

/// `IncludeDuplicates`, defaulting to `true`.
///
/// Text is tested for emptiness, not truthiness: `""` includes duplicates and *any* non-empty
/// text (even `"TRUE"`) excludes them.
pub fn to_include_duplicates(value: &Value) -> Result<bool, ErrorKind> {
    match value {
        Value::Missing | Value::Blank => Ok(true),
        Value::Error(e) => Err(*e),
        Value::Bool(b) => Ok(*b),
        Value::Number(n) => Ok(*n > 0.0),
        Value::Text(s) => Ok(s.is_empty()),
    }
}

/// List delimiter. Only text is accepted; an empty delimiter concatenates.
pub fn to_delimiter(value: &Value) -> Result<String, ErrorKind> {
    match value {
        Value::Missing | Value::Blank => Ok(",".to_string()),
        Value::Error(e) => Err(*e),
        Value::Text(s) => Ok(s.clone()),
        Value::Number(_) | Value::Bool(_) => Err(ErrorKind::Value),
    }
}

fn truncate(n: f64) -> Result<i64, ErrorKind> {
    if !n.is_finite() || n.abs() >= i64::MAX as f64 {
        return Err(ErrorKind::Num);
    }
    Ok(n.trunc() as i64)
}

/// Integer parsing with an optional sign and no fractional part.
fn parse_int(s: &str) -> Option<i64> {
    let digits = s.strip_prefix('+').unwrap_or(s);
    if digits.starts_with('+') {
        return None;
    }
    digits.parse::<i64>().ok()
}
