//! Small lookahead helpers over raw cell source.
//!
//! Only the few tokens in front of a cell body are read this way: the
//! `viewof` qualifier, a binding name and its `=`, or the `import` keyword.

use crate::error::SyntaxError;

/// Words that can never be a binding name.
const RESERVED: &[&str] = &[
    "await", "break", "case", "catch", "class", "const", "continue", "debugger", "default", "delete",
    "do", "else", "enum", "export", "extends", "false", "finally", "for", "function", "if",
    "implements", "import", "in", "instanceof", "interface", "let", "new", "null", "package",
    "private", "protected", "public", "return", "static", "super", "switch", "this", "throw",
    "true", "try", "typeof", "var", "void", "while", "with", "yield",
];

pub(crate) fn is_reserved(word: &str) -> bool {
    RESERVED.contains(&word)
}

fn is_word_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

fn is_word_part(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$' || c == '\u{200c}' || c == '\u{200d}'
}

/// Offset of the first character at or after `offset` that is neither
/// whitespace nor part of a comment. An unterminated block comment runs to
/// the end of the source.
pub(crate) fn skip_trivia(source: &str, mut offset: usize) -> usize {
    loop {
        let Some(rest) = source.get(offset..) else {
            return source.len();
        };
        let trimmed = rest.trim_start();
        offset += rest.len() - trimmed.len();

        if trimmed.starts_with("//") {
            offset += trimmed.find('\n').unwrap_or(trimmed.len());
        } else if let Some(comment) = trimmed.strip_prefix("/*") {
            offset += comment.find("*/").map_or(trimmed.len(), |end| end + 4);
        } else {
            return offset;
        }
    }
}

/// The identifier-like word starting exactly at `offset`, if any.
pub(crate) fn word_at(source: &str, offset: usize) -> Option<&str> {
    let rest = source.get(offset..)?;
    rest.chars().next().filter(|&c| is_word_start(c))?;
    let len = rest
        .char_indices()
        .skip(1)
        .find(|&(_, c)| !is_word_part(c))
        .map_or(rest.len(), |(i, _)| i);
    rest.get(..len)
}

/// True if a plain `=` (not `==`, `===` or `=>`) starts at `offset`.
pub(crate) fn is_assign_at(source: &str, offset: usize) -> bool {
    let rest = source.get(offset..).unwrap_or_default();
    rest.starts_with('=') && !rest[1..].starts_with(['=', '>'])
}

/// Error for whatever token starts at `offset`.
pub(crate) fn unexpected_at(source: &str, offset: usize) -> SyntaxError {
    match token_text(source, offset) {
        Some(token) => SyntaxError::new(format!("Unexpected token '{}'", token), offset),
        None => SyntaxError::new("Unexpected end of input", source.len()),
    }
}

/// Text of the token at `offset`: a whole word or number, otherwise the
/// single character found there.
fn token_text(source: &str, offset: usize) -> Option<&str> {
    let rest = source.get(offset..)?;
    let first = rest.chars().next()?;
    if let Some(word) = word_at(source, offset) {
        return Some(word);
    }
    if first.is_ascii_digit() {
        let len = rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '.' || c == '_'))
            .unwrap_or(rest.len());
        return rest.get(..len);
    }
    rest.get(..first.len_utf8())
}
