//! Nesting limit, checked on the raw source before it reaches the parser.
//!
//! The ECMAScript parser descends recursively into groups, prefix operators,
//! right-associative operators (`**`, assignment, `?:`, arrows) and nested
//! statements. A cell such as `((((...))))` or `a ** a ** ... ** a` a few
//! thousand levels deep would exhaust the stack, so those constructs are
//! counted here first with a flat token scan.
//!
//! The count is approximate but never low: it is the number of open groups
//! plus, in each of them, the recursive operators seen since the last `,`,
//! `;` or statement boundary.

use crate::error::{SyntaxError, SyntaxResult};

/// Deepest nesting accepted, counted as described above.
#[cfg(not(debug_assertions))]
pub(crate) const MAX_NESTING_DEPTH: usize = 200;
/// Debug builds get a lower limit because their stack frames are much
/// larger.
#[cfg(debug_assertions)]
pub(crate) const MAX_NESTING_DEPTH: usize = 32;

pub(crate) const TOO_DEEP: &str = "Expression nested too deeply";

/// Longest match first.
const PUNCTUATORS: &[&str] = &[
    ">>>=", "...", "===", "!==", "**=", "<<=", ">>=", ">>>", "&&=", "||=", "??=", "=>", "==", "!=",
    "<=", ">=", "&&", "||", "??", "?.", "++", "--", "+=", "-=", "*=", "/=", "%=", "&=", "|=", "^=",
    "**", "<<", ">>",
];

const ASSIGNMENT_OPERATORS: &[&str] = &[
    "=", "+=", "-=", "*=", "/=", "%=", "**=", "<<=", ">>=", ">>>=", "&=", "|=", "^=", "&&=", "||=",
    "??=",
];

/// Keywords the parser recurses on.
const RECURSIVE_KEYWORDS: &[&str] = &[
    "typeof", "void", "delete", "await", "new", "yield", "if", "for", "while", "do", "with",
];

/// Keywords after which an operand follows, so `/` starts a regex.
const OPERAND_KEYWORDS: &[&str] = &[
    "await", "case", "delete", "do", "else", "extends", "in", "instanceof", "new", "of", "return",
    "throw", "typeof", "void", "yield",
];

/// Words that continue the previous line's statement.
const CONTINUATION_KEYWORDS: &[&str] =
    &["in", "instanceof", "of", "else", "catch", "finally", "while"];

/// Fail if `source` nests deeper than `limit`.
pub(crate) fn check_nesting(source: &str, limit: usize) -> SyntaxResult<()> {
    Scanner::new(source, limit).run()
}

struct Group {
    /// Closing this group resumes a template literal (`${ ... }`).
    in_template: bool,
    /// Recursive operators seen since the last reset.
    operators: usize,
}

struct Scanner<'s> {
    source: &'s str,
    bytes: &'s [u8],
    pos: usize,
    limit: usize,
    /// Innermost last; the first entry is the top level and is never closed.
    groups: Vec<Group>,
    depth: usize,
    /// The previous token can end an operand.
    after_operand: bool,
    newline_before: bool,
}

impl<'s> Scanner<'s> {
    fn new(source: &'s str, limit: usize) -> Scanner<'s> {
        Scanner {
            source,
            bytes: source.as_bytes(),
            pos: 0,
            limit,
            groups: vec![Group {
                in_template: false,
                operators: 0,
            }],
            depth: 0,
            after_operand: false,
            newline_before: false,
        }
    }

    fn peek(&self, ahead: usize) -> Option<u8> {
        self.bytes.get(self.pos + ahead).copied()
    }

    fn run(mut self) -> SyntaxResult<()> {
        while let Some(byte) = self.peek(0) {
            match byte {
                b'\n' | b'\r' => {
                    self.newline_before = true;
                    self.pos += 1;
                }
                b' ' | b'\t' | 0x0b | 0x0c => self.pos += 1,
                b'/' if self.peek(1) == Some(b'/') => self.skip_line_comment(),
                b'/' if self.peek(1) == Some(b'*') => self.skip_block_comment(),
                b'/' if !self.after_operand => {
                    self.newline_before = false;
                    self.skip_regex();
                }
                b'\'' | b'"' => {
                    self.statement_boundary();
                    self.skip_string(byte);
                }
                b'`' => {
                    self.newline_before = false;
                    self.pos += 1;
                    self.scan_template()?;
                }
                b'0'..=b'9' => {
                    self.statement_boundary();
                    self.skip_number();
                }
                b'.' if self.peek(1).is_some_and(|b| b.is_ascii_digit()) => {
                    self.statement_boundary();
                    self.skip_number();
                }
                _ if is_word_byte(byte) || byte == b'#' => self.word()?,
                _ => self.punctuator()?,
            }
        }
        Ok(())
    }

    /// A value token on a new line right after an operand starts a new
    /// statement.
    fn statement_boundary(&mut self) {
        if self.newline_before && self.after_operand {
            self.reset();
        }
        self.newline_before = false;
    }

    fn enter(&mut self) -> SyntaxResult<()> {
        self.depth += 1;
        if self.depth > self.limit {
            return Err(SyntaxError::new(TOO_DEEP, self.pos));
        }
        Ok(())
    }

    fn operator(&mut self) -> SyntaxResult<()> {
        if let Some(group) = self.groups.last_mut() {
            group.operators += 1;
        }
        self.enter()
    }

    fn open(&mut self, in_template: bool) -> SyntaxResult<()> {
        self.groups.push(Group {
            in_template,
            operators: 0,
        });
        self.enter()
    }

    /// Close the innermost group. Returns whether it was a template
    /// substitution.
    fn close(&mut self) -> bool {
        if self.groups.len() < 2 {
            return false;
        }
        match self.groups.pop() {
            Some(group) => {
                self.depth = self.depth.saturating_sub(group.operators + 1);
                group.in_template
            }
            None => false,
        }
    }

    fn reset(&mut self) {
        if let Some(group) = self.groups.last_mut() {
            self.depth = self.depth.saturating_sub(group.operators);
            group.operators = 0;
        }
    }

    fn word(&mut self) -> SyntaxResult<()> {
        let start = self.pos;
        self.pos += 1;
        while self.peek(0).is_some_and(is_word_byte) {
            self.pos += 1;
        }
        let word = self.source.get(start..self.pos).unwrap_or_default();

        if self.newline_before && self.after_operand && !CONTINUATION_KEYWORDS.contains(&word) {
            self.reset();
        }
        self.newline_before = false;
        if word == "case" || word == "default" {
            self.reset();
        }
        if RECURSIVE_KEYWORDS.contains(&word) {
            self.pos = start;
            self.operator()?;
            self.pos = start + word.len();
        }
        self.after_operand = !OPERAND_KEYWORDS.contains(&word);
        Ok(())
    }

    fn punctuator(&mut self) -> SyntaxResult<()> {
        self.newline_before = false;
        let rest = self.source.get(self.pos..).unwrap_or_default();
        let token = PUNCTUATORS
            .iter()
            .copied()
            .find(|p| rest.starts_with(p))
            .filter(|&p| p != "?." || !rest[2..].starts_with(|c: char| c.is_ascii_digit()))
            .unwrap_or_else(|| rest.get(..1).unwrap_or_default());
        if token.is_empty() {
            self.pos += 1;
            return Ok(());
        }

        let after_operand = self.after_operand;
        self.after_operand = false;
        match token {
            "(" | "[" | "{" => self.open(false)?,
            ")" | "]" => {
                self.close();
                self.after_operand = true;
            }
            "}" => {
                self.pos += 1;
                if self.close() {
                    return self.scan_template();
                }
                self.after_operand = true;
                return Ok(());
            }
            "," | ";" => self.reset(),
            "++" | "--" if after_operand => self.after_operand = true,
            "+" | "-" | "++" | "--" if !after_operand => self.operator()?,
            "**" | "=>" | "?" | ":" | "!" | "~" => self.operator()?,
            _ if ASSIGNMENT_OPERATORS.contains(&token) => self.operator()?,
            _ => {}
        }
        self.pos += token.len();
        Ok(())
    }

    /// Template characters up to the closing backtick or the next `${`.
    fn scan_template(&mut self) -> SyntaxResult<()> {
        while let Some(byte) = self.peek(0) {
            match byte {
                b'\\' => self.pos += 2,
                b'`' => {
                    self.pos += 1;
                    self.after_operand = true;
                    return Ok(());
                }
                b'$' if self.peek(1) == Some(b'{') => {
                    self.open(true)?;
                    self.pos += 2;
                    self.after_operand = false;
                    return Ok(());
                }
                _ => self.pos += 1,
            }
        }
        Ok(())
    }

    fn skip_string(&mut self, quote: u8) {
        self.pos += 1;
        while let Some(byte) = self.peek(0) {
            match byte {
                b'\\' => self.pos += 2,
                b'\n' => break,
                _ if byte == quote => {
                    self.pos += 1;
                    break;
                }
                _ => self.pos += 1,
            }
        }
        self.after_operand = true;
    }

    fn skip_regex(&mut self) {
        self.pos += 1;
        let mut in_class = false;
        while let Some(byte) = self.peek(0) {
            match byte {
                b'\\' => self.pos += 2,
                b'\n' => break,
                b'[' => {
                    in_class = true;
                    self.pos += 1;
                }
                b']' => {
                    in_class = false;
                    self.pos += 1;
                }
                b'/' if !in_class => {
                    self.pos += 1;
                    break;
                }
                _ => self.pos += 1,
            }
        }
        while self.peek(0).is_some_and(is_word_byte) {
            self.pos += 1;
        }
        self.after_operand = true;
    }

    fn skip_number(&mut self) {
        while self
            .peek(0)
            .is_some_and(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'.')
        {
            self.pos += 1;
        }
        self.after_operand = true;
    }

    fn skip_line_comment(&mut self) {
        while self.peek(0).is_some_and(|b| b != b'\n') {
            self.pos += 1;
        }
    }

    fn skip_block_comment(&mut self) {
        self.pos += 2;
        while let Some(byte) = self.peek(0) {
            if byte == b'*' && self.peek(1) == Some(b'/') {
                self.pos += 2;
                return;
            }
            if byte == b'\n' {
                self.newline_before = true;
            }
            self.pos += 1;
        }
    }
}

/// Identifier bytes. Any non-ASCII byte is taken as part of an identifier.
fn is_word_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'_' || byte == b'$' || byte == b'\\' || byte >= 0x80
}

#[cfg(test)]
mod tests {
    use super::*;

    fn depth_ok(source: &str, limit: usize) -> bool {
        check_nesting(source, limit).is_ok()
    }

    #[test]
    fn test_groups_count() {
        assert!(depth_ok("((1))", 2));
        assert!(!depth_ok("(((1)))", 2));
        assert!(depth_ok("((1))((1))((1))", 2));
    }

    #[test]
    fn test_error_points_at_the_deepest_group() {
        let err = check_nesting("a + [[[b]]]", 2).unwrap_err();
        assert_eq!((err.message.as_str(), err.offset), (TOO_DEEP, 6));
    }

    #[test]
    fn test_right_associative_operators_count() {
        assert!(!depth_ok(&"a ** ".repeat(10), 5));
        assert!(!depth_ok("a = b = c = d = e = f = g", 5));
        assert!(!depth_ok("a ? b : c ? d : e ? f : g", 5));
        assert!(!depth_ok("x => y => z => w => v => u", 4));
        assert!(!depth_ok("!!!!!!x", 5));
        assert!(!depth_ok("typeof typeof typeof typeof typeof typeof x", 5));
    }

    #[test]
    fn test_left_associative_operators_are_free() {
        let chain = format!("x = a{}", " + a".repeat(5000));
        assert!(depth_ok(&chain, 5));
        let members = format!("a{}", ".b".repeat(5000));
        assert!(depth_ok(&members, 5));
    }

    #[test]
    fn test_binary_minus_is_not_prefix() {
        assert!(depth_ok("a - b - c - d - e - f - g", 2));
        assert!(!depth_ok("- - - - - - a", 2));
    }

    #[test]
    fn test_statements_reset_the_count() {
        let statements = "a = 1;".repeat(100);
        assert!(depth_ok(&format!("{{{}}}", statements), 3));
        let lines = "const a = b\n".repeat(100);
        assert!(depth_ok(&format!("{{\n{}}}", lines), 3));
        let cases = "case 1:\n".repeat(100);
        assert!(depth_ok(&format!("{{ switch (x) {{ {} }} }}", cases), 4));
    }

    #[test]
    fn test_lists_reset_the_count() {
        let items = "a = 1, ".repeat(100);
        assert!(depth_ok(&format!("f({})", items), 3));
        let props = "k: v, ".repeat(100);
        assert!(depth_ok(&format!("({{{}}})", props), 3));
    }

    #[test]
    fn test_strings_comments_and_regexes_are_skipped() {
        assert!(depth_ok("'(((((' + \"[[[[[\" // (((((\n/* {{{{{ */", 1));
        assert!(depth_ok("x = /((((((/.test(y)", 2));
        assert!(depth_ok("x = a / b / c", 1));
    }

    #[test]
    fn test_template_substitutions_are_groups() {
        assert!(depth_ok("md`((((( ${a} )))))`", 1));
        assert!(!depth_ok("`${`${`${x}`}`}`", 2));
        assert!(depth_ok("`${a}${b}${c}` + x", 1));
    }
}
