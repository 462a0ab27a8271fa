//! Tokenizer with significant indentation.
//!
//! Produces `Newline`, `Indent` and `Dedent` tokens the way an offside-rule
//! parser expects. Newlines inside brackets, blank lines and comment-only
//! lines produce no tokens.

// Column arithmetic stays well inside u32 for any realistic snippet
#![allow(clippy::cast_possible_truncation)]

use super::SyntaxError;

/// Reserved words. Some are only reserved so they cannot be used as names.
const KEYWORDS: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global",
    "if", "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return",
    "try", "while", "with", "yield",
];

/// Operators and delimiters, longest first so greedy matching works.
const OPERATORS: &[&str] = &[
    "**=", "//=", "**", "//", "==", "!=", "<=", ">=", "+=", "-=", "*=", "/=", "%=", "+", "-",
    "*", "/", "%", "<", ">", "=", "(", ")", "[", "]", "{", "}", ",", ":", ".", ";",
];

/// Tab stops advance indentation to the next multiple of this width.
const TAB_WIDTH: usize = 8;

/// Token kinds.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Tok {
    Name(String),
    Keyword(&'static str),
    Int(i64),
    Float(f64),
    Str(String),
    Op(&'static str),
    Newline,
    Indent,
    Dedent,
    Eof,
}

/// A token and where it starts.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Token {
    pub(crate) tok: Tok,
    pub(crate) line: u32,
    pub(crate) col: u32,
}

struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: u32,
    line_start: usize,
    depth: usize,
    indents: Vec<usize>,
    tokens: Vec<Token>,
}

/// Split `source` into tokens.
pub(crate) fn tokenize(source: &str) -> Result<Vec<Token>, SyntaxError> {
    let mut lexer = Lexer {
        chars: source.chars().collect(),
        pos: 0,
        line: 1,
        line_start: 0,
        depth: 0,
        indents: vec![0],
        tokens: Vec::new(),
    };
    lexer.run()?;
    Ok(lexer.tokens)
}

impl Lexer {
    fn run(&mut self) -> Result<(), SyntaxError> {
        let mut at_line_start = true;
        while self.pos < self.chars.len() {
            if at_line_start {
                if !self.indentation()? {
                    continue;
                }
                at_line_start = false;
            }
            let c = self.chars[self.pos];
            match c {
                '\n' => {
                    self.newline_token();
                    self.advance_line();
                    at_line_start = self.depth == 0;
                }
                ' ' | '\t' | '\r' | '\x0c' => self.pos += 1,
                '#' => self.skip_comment(),
                '\\' => {
                    if self.peek(1) == Some('\n') {
                        self.pos += 2;
                        self.line += 1;
                        self.line_start = self.pos;
                    } else {
                        return Err(self.error("unexpected character after line continuation"));
                    }
                }
                '\'' | '"' => self.string(c)?,
                c if c.is_ascii_digit() => self.number()?,
                '.' if self.peek(1).is_some_and(|n| n.is_ascii_digit()) => self.number()?,
                c if c.is_alphabetic() || c == '_' => self.word(),
                _ => self.operator()?,
            }
        }

        self.newline_token();
        while self.indents.len() > 1 {
            self.indents.pop();
            self.push(Tok::Dedent, self.pos);
        }
        self.push(Tok::Eof, self.pos);
        Ok(())
    }

    /// Measure indentation at the start of a logical line.
    ///
    /// Returns `false` when the line is blank or comment-only and was skipped.
    fn indentation(&mut self) -> Result<bool, SyntaxError> {
        let mut width = 0;
        while let Some(&c) = self.chars.get(self.pos) {
            match c {
                ' ' => width += 1,
                '\t' => width = (width / TAB_WIDTH + 1) * TAB_WIDTH,
                '\x0c' | '\r' => {}
                _ => break,
            }
            self.pos += 1;
        }

        match self.chars.get(self.pos) {
            None => return Ok(false),
            Some('\n') => {
                self.advance_line();
                return Ok(false);
            }
            Some('#') => {
                self.skip_comment();
                if self.chars.get(self.pos) == Some(&'\n') {
                    self.advance_line();
                }
                return Ok(false);
            }
            Some(_) => {}
        }

        let current = self.indents.last().copied().unwrap_or(0);
        if width > current {
            self.indents.push(width);
            self.push(Tok::Indent, self.pos);
        } else if width < current {
            while self.indents.last().is_some_and(|&level| level > width) {
                self.indents.pop();
                self.push(Tok::Dedent, self.pos);
            }
            if self.indents.last() != Some(&width) {
                return Err(self.error("unindent does not match any outer indentation level"));
            }
        }
        Ok(true)
    }

    fn newline_token(&mut self) {
        if self.depth > 0 {
            return;
        }
        match self.tokens.last().map(|t| &t.tok) {
            None | Some(Tok::Newline | Tok::Indent | Tok::Dedent) => {}
            Some(_) => self.push(Tok::Newline, self.pos),
        }
    }

    /// Step over the `\n` at the current position.
    fn advance_line(&mut self) {
        self.pos += 1;
        self.line += 1;
        self.line_start = self.pos;
    }

    fn skip_comment(&mut self) {
        while self.chars.get(self.pos).is_some_and(|&c| c != '\n') {
            self.pos += 1;
        }
    }

    fn string(&mut self, quote: char) -> Result<(), SyntaxError> {
        let start = self.pos;
        self.pos += 1;
        let mut value = String::new();
        loop {
            let Some(&c) = self.chars.get(self.pos) else {
                return Err(self.error_at(start, "unterminated string literal"));
            };
            match c {
                '\n' => return Err(self.error_at(start, "unterminated string literal")),
                '\\' => {
                    let Some(&escaped) = self.chars.get(self.pos + 1) else {
                        return Err(self.error_at(start, "unterminated string literal"));
                    };
                    match escaped {
                        'n' => value.push('\n'),
                        't' => value.push('\t'),
                        'r' => value.push('\r'),
                        '0' => value.push('\0'),
                        '\\' => value.push('\\'),
                        '\'' => value.push('\''),
                        '"' => value.push('"'),
                        '\n' => {
                            self.line += 1;
                            self.line_start = self.pos + 2;
                        }
                        other => {
                            value.push('\\');
                            value.push(other);
                        }
                    }
                    self.pos += 2;
                }
                c if c == quote => {
                    self.pos += 1;
                    break;
                }
                c => {
                    value.push(c);
                    self.pos += 1;
                }
            }
        }
        self.push(Tok::Str(value), start);
        Ok(())
    }

    fn number(&mut self) -> Result<(), SyntaxError> {
        let start = self.pos;
        let mut text = String::new();
        let mut is_float = false;

        self.digits(&mut text);
        if self.chars.get(self.pos) == Some(&'.') {
            is_float = true;
            text.push('.');
            self.pos += 1;
            self.digits(&mut text);
        }
        if matches!(self.chars.get(self.pos), Some('e' | 'E')) {
            let sign = self.peek(1);
            let digit_at = if matches!(sign, Some('+' | '-')) { 2 } else { 1 };
            if self.peek(digit_at).is_some_and(|c| c.is_ascii_digit()) {
                is_float = true;
                text.push('e');
                if digit_at == 2 {
                    text.extend(sign);
                }
                self.pos += digit_at;
                self.digits(&mut text);
            }
        }
        if self
            .chars
            .get(self.pos)
            .is_some_and(|c| c.is_alphanumeric() || *c == '_')
        {
            return Err(self.error_at(start, "invalid decimal literal"));
        }

        let tok = if is_float {
            if text.starts_with('.') {
                text.insert(0, '0');
            }
            let value = text
                .parse::<f64>()
                .map_err(|_| self.error_at(start, "invalid float literal"))?;
            Tok::Float(value)
        } else {
            let value = text
                .parse::<i64>()
                .map_err(|_| self.error_at(start, "integer literal is too large"))?;
            Tok::Int(value)
        };
        self.push(tok, start);
        Ok(())
    }

    fn digits(&mut self, text: &mut String) {
        while let Some(&c) = self.chars.get(self.pos) {
            if c.is_ascii_digit() {
                text.push(c);
            } else if c != '_' {
                break;
            }
            self.pos += 1;
        }
    }

    fn word(&mut self) {
        let start = self.pos;
        while self
            .chars
            .get(self.pos)
            .is_some_and(|c| c.is_alphanumeric() || *c == '_')
        {
            self.pos += 1;
        }
        let word: String = self.chars[start..self.pos].iter().collect();
        let tok = match KEYWORDS.iter().find(|&&k| k == word) {
            Some(keyword) => Tok::Keyword(*keyword),
            None => Tok::Name(word),
        };
        self.push(tok, start);
    }

    fn operator(&mut self) -> Result<(), SyntaxError> {
        let start = self.pos;
        for op in OPERATORS {
            let matches = op
                .chars()
                .enumerate()
                .all(|(i, c)| self.chars.get(start + i) == Some(&c));
            if matches {
                self.pos += op.chars().count();
                match *op {
                    "(" | "[" | "{" => self.depth += 1,
                    ")" | "]" | "}" => {
                        if self.depth == 0 {
                            return Err(self.error_at(start, format!("unmatched '{op}'")));
                        }
                        self.depth -= 1;
                    }
                    _ => {}
                }
                self.push(Tok::Op(*op), start);
                return Ok(());
            }
        }
        let c = self.chars[start];
        Err(self.error_at(start, format!("invalid character '{c}'")))
    }

    fn peek(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn push(&mut self, tok: Tok, at: usize) {
        let col = at.saturating_sub(self.line_start) as u32 + 1;
        self.tokens.push(Token {
            tok,
            line: self.line,
            col,
        });
    }

    fn error(&self, message: impl Into<String>) -> SyntaxError {
        self.error_at(self.pos, message)
    }

    fn error_at(&self, at: usize, message: impl Into<String>) -> SyntaxError {
        SyntaxError {
            message: message.into(),
            line: self.line,
            col: at.saturating_sub(self.line_start) as u32 + 1,
        }
    }
}
