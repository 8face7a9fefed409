use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Result, RouteError};
use crate::types::{Parameter, Segment};

/// Valid parameter name: identifier characters, not starting with a digit
static PARAM_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("PARAM_NAME: hardcoded regex is invalid")
});

/// Parse a route pattern into an ordered sequence of segments.
///
/// Syntax:
/// - `{name}` - parameter matching one path component
/// - `{name:regex}` - parameter matching `regex` (braces may nest, e.g. `{id:\d{2,4}}`)
/// - `:name` - shorthand for `{name}`
/// - `\{`, `\}`, `\:`, `\\` - escaped literal characters
///
/// Everything else is literal text. Adjacent literal text is merged, so the
/// result never contains an empty literal. An empty pattern yields no segments.
pub fn parse_pattern(pattern: &str) -> Result<Vec<Segment>> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut chars = pattern.char_indices().peekable();

    while let Some((pos, ch)) = chars.next() {
        match ch {
            '\\' => {
                let (_, escaped) = chars
                    .next()
                    .ok_or_else(|| parse_error(pattern, pos, "trailing '\\'"))?;
                literal.push(escaped);
            }
            '{' => {
                let end = find_closing_brace(pattern, pos)?;
                let param = parse_braced(pattern, pos, &pattern[pos + 1..end])?;
                flush_literal(&mut literal, &mut segments);
                segments.push(Segment::Parameter(param));
                // Skip to the closing brace
                while let Some(&(i, _)) = chars.peek() {
                    chars.next();
                    if i == end {
                        break;
                    }
                }
            }
            '}' => return Err(parse_error(pattern, pos, "unmatched '}'")),
            ':' if matches!(chars.peek(), Some(&(_, c)) if c.is_ascii_alphabetic() || c == '_') => {
                let mut name = String::new();
                while let Some(&(_, c)) = chars.peek() {
                    if !(c.is_ascii_alphanumeric() || c == '_') {
                        break;
                    }
                    name.push(c);
                    chars.next();
                }
                flush_literal(&mut literal, &mut segments);
                segments.push(Segment::Parameter(Parameter::new(name)));
            }
            _ => literal.push(ch),
        }
    }

    flush_literal(&mut literal, &mut segments);
    Ok(segments)
}

fn flush_literal(literal: &mut String, segments: &mut Vec<Segment>) {
    if !literal.is_empty() {
        segments.push(Segment::Literal(std::mem::take(literal)));
    }
}

/// Byte offset of the `}` closing the `{` at `open`
fn find_closing_brace(pattern: &str, open: usize) -> Result<usize> {
    let mut depth = 0usize;
    let mut escaped = false;

    for (i, c) in pattern[open..].char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(open + i);
                }
            }
            _ => {}
        }
    }

    Err(parse_error(pattern, open, "unclosed '{'"))
}

/// Parse the inside of `{...}` into a parameter
fn parse_braced(pattern: &str, pos: usize, body: &str) -> Result<Parameter> {
    let (name, constraint) = match body.split_once(':') {
        Some((name, constraint)) => (name.trim(), Some(constraint)),
        None => (body.trim(), None),
    };

    if !PARAM_NAME.is_match(name) {
        return Err(parse_error(
            pattern,
            pos,
            &format!("invalid parameter name: {:?}", name),
        ));
    }

    match constraint {
        None => Ok(Parameter::new(name)),
        Some("") => Err(parse_error(
            pattern,
            pos,
            &format!("empty constraint for parameter {:?}", name),
        )),
        Some(constraint) => {
            Regex::new(constraint).map_err(|e| {
                parse_error(
                    pattern,
                    pos,
                    &format!("invalid constraint for parameter {:?}: {}", name, e),
                )
            })?;
            Ok(Parameter::with_constraint(name, constraint))
        }
    }
}

fn parse_error(pattern: &str, position: usize, message: &str) -> RouteError {
    RouteError::ParseError {
        pattern: pattern.to_string(),
        position,
        message: message.to_string(),
    }
}
