//! Line-partitioned tokenizer and the parser's consumption buffer.
//!
//! Source text is lexed one line at a time: `//` comments are stripped, every
//! delimiter and operator is surrounded by spaces (two-character forms before
//! their one-character prefixes), and the result is split on whitespace.
//! Tokens stay plain strings; the parser gives them meaning. Empty lines are
//! kept so line numbers survive, and are skipped during consumption.

pub mod words;

use std::collections::VecDeque;

/// One source line after lexing: its 1-based number, the tokens still to be
/// consumed, and the full token text kept for diagnostic context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub number: usize,
    pub text: String,
    tokens: VecDeque<String>,
}

impl Line {
    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().map(String::as_str)
    }
}

/// Lex `source` into its line-partitioned token form.
pub fn tokenize(source: &str) -> Vec<Line> {
    source
        .lines()
        .enumerate()
        .map(|(index, raw)| {
            let code = strip_comment(raw);
            let padded = pad_delimiters(code);
            let tokens: VecDeque<String> =
                padded.split_whitespace().map(str::to_string).collect();
            let text = tokens
                .iter()
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(" ");
            Line {
                number: index + 1,
                text,
                tokens,
            }
        })
        .collect()
}

fn strip_comment(line: &str) -> &str {
    match line.find("//") {
        Some(at) => &line[..at],
        None => line,
    }
}

/// Surround every delimiter and operator with spaces so a whitespace split
/// yields one token per lexeme. A `.` adjacent to a digit is part of a
/// decimal literal and stays attached.
fn pad_delimiters(line: &str) -> String {
    let chars: Vec<char> = line.chars().collect();
    let mut out = String::with_capacity(line.len() * 2);
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();
        match c {
            '+' | '-' if next == Some(c) => {
                out.push(' ');
                out.push(c);
                out.push(c);
                out.push(' ');
                i += 2;
            }
            '<' | '>' | '=' | '!' if next == Some('=') => {
                out.push(' ');
                out.push(c);
                out.push('=');
                out.push(' ');
                i += 2;
            }
            '&' | '|' if next == Some(c) => {
                out.push(' ');
                out.push(c);
                out.push(c);
                out.push(' ');
                i += 2;
            }
            '.' => {
                let prev_digit = i > 0 && chars[i - 1].is_ascii_digit();
                let next_digit = next.is_some_and(|n| n.is_ascii_digit());
                if prev_digit || next_digit {
                    out.push('.');
                } else {
                    out.push(' ');
                    out.push('.');
                    out.push(' ');
                }
                i += 1;
            }
            '{' | '}' | '(' | ')' | '[' | ']' | ';' | ',' | ':' | '"' | '+' | '-' | '*' | '/'
            | '<' | '>' | '!' | '&' | '|' | '=' => {
                out.push(' ');
                out.push(c);
                out.push(' ');
                i += 1;
            }
            _ => {
                out.push(c);
                i += 1;
            }
        }
    }
    out
}

/// Ordered token stream with single-token pushback.
///
/// Invariants: tokens are never silently dropped, and the current line number
/// never decreases as tokens are consumed.
#[derive(Debug)]
pub struct TokenBuffer {
    lines: Vec<Line>,
    pos: usize,
}

impl TokenBuffer {
    pub fn new(source: &str) -> Self {
        Self {
            lines: tokenize(source),
            pos: 0,
        }
    }

    fn first_content(&self) -> usize {
        let mut at = self.pos;
        while at < self.lines.len() && self.lines[at].tokens.is_empty() {
            at += 1;
        }
        at
    }

    /// First remaining token, without consuming it.
    pub fn peek(&self) -> Option<&str> {
        self.lines
            .get(self.first_content())
            .and_then(|line| line.tokens.front())
            .map(String::as_str)
    }

    /// Consume and return the next token, advancing across empty lines.
    pub fn shift(&mut self) -> Option<String> {
        self.pos = self.first_content();
        self.lines
            .get_mut(self.pos)
            .and_then(|line| line.tokens.pop_front())
    }

    /// Push `token` back; must be the inverse of the most recent `shift`.
    pub fn unshift(&mut self, token: String) {
        self.lines[self.pos].tokens.push_front(token);
    }

    pub fn is_empty(&self) -> bool {
        self.first_content() >= self.lines.len()
    }

    /// Source line of the next token (or of the last line once exhausted).
    pub fn line_number(&self) -> usize {
        let at = self.first_content();
        match self.lines.get(at) {
            Some(line) => line.number,
            None => self.lines.last().map(|line| line.number).unwrap_or(0),
        }
    }

    /// Token text of the current line, for diagnostic context.
    pub fn line_text(&self) -> &str {
        let at = self.first_content();
        match self.lines.get(at) {
            Some(line) => &line.text,
            None => self
                .lines
                .last()
                .map(|line| line.text.as_str())
                .unwrap_or(""),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    fn flat_tokens(source: &str) -> Vec<String> {
        let lines = tokenize(source);
        lines
            .iter()
            .flat_map(|line| line.tokens().map(str::to_string).collect::<Vec<_>>())
            .collect()
    }

    #[test]
    fn pads_single_char_delimiters() {
        assert_eq!(flat_tokens("int x=3;"), vec!["int", "x", "=", "3", ";"]);
        assert_eq!(
            flat_tokens("foo(a,b)"),
            vec!["foo", "(", "a", ",", "b", ")"]
        );
    }

    #[test]
    fn recognizes_double_char_operators_first() {
        assert_eq!(flat_tokens("a<=b"), vec!["a", "<=", "b"]);
        assert_eq!(flat_tokens("a==b"), vec!["a", "==", "b"]);
        assert_eq!(flat_tokens("a!=b"), vec!["a", "!=", "b"]);
        assert_eq!(flat_tokens("a&&b||c"), vec!["a", "&&", "b", "||", "c"]);
        assert_eq!(flat_tokens("i++;"), vec!["i", "++", ";"]);
        assert_eq!(flat_tokens("i--;"), vec!["i", "--", ";"]);
    }

    #[test]
    fn keeps_decimal_literals_intact() {
        assert_eq!(flat_tokens("x = 3.14;"), vec!["x", "=", "3.14", ";"]);
        assert_eq!(flat_tokens("a.b"), vec!["a", ".", "b"]);
        assert_eq!(
            flat_tokens("x.foo(3.5)"),
            vec!["x", ".", "foo", "(", "3.5", ")"]
        );
    }

    #[test]
    fn pads_enhanced_for_colon() {
        assert_eq!(
            flat_tokens("for (int x:xs)"),
            vec!["for", "(", "int", "x", ":", "xs", ")"]
        );
    }

    #[test]
    fn strips_line_comments() {
        assert_eq!(flat_tokens("int x; // the count"), vec!["int", "x", ";"]);
        assert_eq!(flat_tokens("// all comment"), Vec::<String>::new());
    }

    #[test]
    fn splits_strings_around_quotes() {
        assert_eq!(
            flat_tokens("s = \"hello world\";"),
            vec!["s", "=", "\"", "hello", "world", "\"", ";"]
        );
    }

    #[test]
    fn preserves_line_numbers_across_empty_lines() {
        let source = indoc! {"
            class A {

            }
        "};
        let mut buffer = TokenBuffer::new(source);
        assert_eq!(buffer.line_number(), 1);
        assert_eq!(buffer.shift().as_deref(), Some("class"));
        assert_eq!(buffer.shift().as_deref(), Some("A"));
        assert_eq!(buffer.shift().as_deref(), Some("{"));
        assert_eq!(buffer.line_number(), 3);
        assert_eq!(buffer.shift().as_deref(), Some("}"));
        assert!(buffer.is_empty());
        assert_eq!(buffer.shift(), None);
    }

    #[test]
    fn unshift_is_inverse_of_shift() {
        let mut buffer = TokenBuffer::new("a b c");
        let first = buffer.shift().expect("token");
        assert_eq!(first, "a");
        buffer.unshift(first);
        assert_eq!(buffer.peek(), Some("a"));
        assert_eq!(buffer.shift().as_deref(), Some("a"));
        assert_eq!(buffer.shift().as_deref(), Some("b"));
    }

    #[test]
    fn line_text_joins_tokens_with_spaces() {
        let buffer = TokenBuffer::new("int x=3;");
        assert_eq!(buffer.line_text(), "int x = 3 ;");
    }
}
