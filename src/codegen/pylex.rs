use std::fmt;

/// 1-based line/column position in a source text. Columns count characters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct Location {
    /// Line number, starting at 1.
    pub line: usize,
    /// Column number, starting at 1.
    pub column: usize,
}

impl Location {
    pub(crate) const START: Location = Location { line: 1, column: 1 };
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Token {
    pub(crate) kind: TokenKind,
    pub(crate) at: Location,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TokenKind {
    Name(String),
    Number,
    Str,
    Op(&'static str),
    Open(char),
    Close(char),
    Newline,
    Indent,
    Dedent,
    Eof,
}

impl Token {
    pub(crate) fn is_name(&self, s: &str) -> bool {
        matches!(&self.kind, TokenKind::Name(n) if n == s)
    }

    pub(crate) fn is_op(&self, s: &str) -> bool {
        matches!(self.kind, TokenKind::Op(o) if o == s)
    }

    pub(crate) fn name(&self) -> Option<&str> {
        match &self.kind {
            TokenKind::Name(n) => Some(n),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LexError {
    pub(crate) at: Location,
    pub(crate) message: String,
}

impl LexError {
    fn new(at: Location, message: impl Into<String>) -> Self {
        Self {
            at,
            message: message.into(),
        }
    }
}

const OPS: &[&str] = &[
    "**=", "//=", ">>=", "<<=", "...", "->", ":=", "**", "//", "<<", ">>", "<=", ">=", "==", "!=",
    "+=", "-=", "*=", "/=", "%=", "&=", "|=", "^=", "@=", "+", "-", "*", "/", "%", "@", "&", "|",
    "^", "~", "<", ">", "=", ".", ",", ":", ";",
];

const STRING_PREFIXES: &[&str] = &["r", "u", "b", "f", "br", "rb", "fr", "rf"];

/// Tokenize Python source into names, literals, operators and layout tokens.
///
/// Layout follows the language rules: newlines inside brackets or after `\` do not end a
/// logical line, blank and comment-only lines never change indentation.
pub(crate) fn lex(src: &str) -> Result<Vec<Token>, LexError> {
    Lexer {
        chars: src.chars().collect(),
        i: 0,
        line: 1,
        col: 1,
        out: Vec::new(),
        indents: vec![0],
        brackets: Vec::new(),
    }
    .run()
}

struct Lexer {
    chars: Vec<char>,
    i: usize,
    line: usize,
    col: usize,
    out: Vec<Token>,
    indents: Vec<usize>,
    brackets: Vec<(char, Location)>,
}

impl Lexer {
    fn run(mut self) -> Result<Vec<Token>, LexError> {
        let mut line_start = true;
        while let Some(c) = self.peek() {
            if line_start && self.brackets.is_empty() {
                line_start = false;
                let width = self.skip_indentation();
                if !matches!(self.peek(), None | Some('\n' | '\r' | '#')) {
                    let at = self.loc();
                    self.indent_to(width, at)?;
                }
                continue;
            }

            let at = self.loc();
            match c {
                '\n' => {
                    self.bump();
                    if self.brackets.is_empty() {
                        self.newline(at);
                        line_start = true;
                    }
                }
                ' ' | '\t' | '\r' | '\x0c' => self.bump(),
                '#' => {
                    while !matches!(self.peek(), None | Some('\n')) {
                        self.bump();
                    }
                }
                '\\' => {
                    self.bump();
                    if self.peek() == Some('\r') {
                        self.bump();
                    }
                    if self.peek() != Some('\n') {
                        return Err(LexError::new(
                            at,
                            "unexpected character after line continuation character",
                        ));
                    }
                    self.bump();
                }
                '"' | '\'' => self.string(at)?,
                c if c.is_ascii_digit() => self.number(at)?,
                '.' if self.peek_at(1).is_some_and(|d| d.is_ascii_digit()) => self.number(at)?,
                c if c.is_alphabetic() || c == '_' => self.name(at)?,
                '(' | '[' | '{' => {
                    self.bump();
                    self.brackets.push((c, at));
                    self.push(TokenKind::Open(c), at);
                }
                ')' | ']' | '}' => {
                    self.bump();
                    let want = match c {
                        ')' => '(',
                        ']' => '[',
                        _ => '{',
                    };
                    match self.brackets.pop() {
                        Some((open, _)) if open == want => {}
                        Some((open, _)) => {
                            return Err(LexError::new(
                                at,
                                format!("closing '{c}' does not match opening '{open}'"),
                            ));
                        }
                        None => return Err(LexError::new(at, format!("unmatched '{c}'"))),
                    }
                    self.push(TokenKind::Close(c), at);
                }
                _ => {
                    let Some(op) = OPS.iter().copied().find(|op| self.starts_with(op)) else {
                        return Err(LexError::new(at, format!("invalid character '{c}'")));
                    };
                    for _ in 0..op.chars().count() {
                        self.bump();
                    }
                    self.push(TokenKind::Op(op), at);
                }
            }
        }

        if let Some((open, at)) = self.brackets.last() {
            return Err(LexError::new(*at, format!("'{open}' was never closed")));
        }
        let at = self.loc();
        self.newline(at);
        while self.indents.len() > 1 {
            self.indents.pop();
            self.push(TokenKind::Dedent, at);
        }
        self.push(TokenKind::Eof, at);
        Ok(self.out)
    }

    fn skip_indentation(&mut self) -> usize {
        let mut width = 0usize;
        while let Some(c) = self.peek() {
            match c {
                ' ' => width += 1,
                '\t' => width = (width / 8 + 1) * 8,
                '\x0c' => width = 0,
                _ => break,
            }
            self.bump();
        }
        width
    }

    fn indent_to(&mut self, width: usize, at: Location) -> Result<(), LexError> {
        let top = self.indents.last().copied().unwrap_or(0);
        if width > top {
            self.indents.push(width);
            self.push(TokenKind::Indent, at);
            return Ok(());
        }
        while width < self.indents.last().copied().unwrap_or(0) {
            self.indents.pop();
            self.push(TokenKind::Dedent, at);
        }
        if width != self.indents.last().copied().unwrap_or(0) {
            return Err(LexError::new(
                at,
                "unindent does not match any outer indentation level",
            ));
        }
        Ok(())
    }

    fn newline(&mut self, at: Location) {
        let ends_line = self.out.last().is_some_and(|t| {
            !matches!(
                t.kind,
                TokenKind::Newline | TokenKind::Indent | TokenKind::Dedent
            )
        });
        if ends_line {
            self.push(TokenKind::Newline, at);
        }
    }

    fn string(&mut self, at: Location) -> Result<(), LexError> {
        let Some(q) = self.peek() else {
            return Err(LexError::new(at, "expected string literal"));
        };
        let triple = self.peek_at(1) == Some(q) && self.peek_at(2) == Some(q);
        if triple {
            self.bump_n(3);
            loop {
                match self.peek() {
                    None => {
                        return Err(LexError::new(at, "unterminated triple-quoted string literal"));
                    }
                    Some('\\') => self.bump_n(2),
                    Some(c) if c == q && self.peek_at(1) == Some(q) && self.peek_at(2) == Some(q) => {
                        self.bump_n(3);
                        break;
                    }
                    Some(_) => self.bump(),
                }
            }
        } else {
            self.bump();
            loop {
                match self.peek() {
                    None | Some('\n') => {
                        return Err(LexError::new(at, "unterminated string literal"));
                    }
                    Some('\\') => {
                        self.bump();
                        if self.peek().is_none() {
                            return Err(LexError::new(at, "unterminated string literal"));
                        }
                        self.bump();
                    }
                    Some(c) if c == q => {
                        self.bump();
                        break;
                    }
                    Some(_) => self.bump(),
                }
            }
        }
        self.push(TokenKind::Str, at);
        Ok(())
    }

    fn number(&mut self, at: Location) -> Result<(), LexError> {
        let radix_prefix = self.peek() == Some('0')
            && matches!(self.peek_at(1), Some('x' | 'X' | 'o' | 'O' | 'b' | 'B'));
        if radix_prefix {
            self.bump_n(2);
            while self.peek().is_some_and(|c| c.is_ascii_hexdigit() || c == '_') {
                self.bump();
            }
        } else {
            self.digits();
            if self.peek() == Some('.') {
                self.bump();
                self.digits();
            }
            if matches!(self.peek(), Some('e' | 'E')) {
                let signed = matches!(self.peek_at(1), Some('+' | '-'));
                let digit_at = if signed { 2 } else { 1 };
                if self.peek_at(digit_at).is_some_and(|c| c.is_ascii_digit()) {
                    self.bump_n(digit_at);
                    self.digits();
                } else {
                    return Err(LexError::new(self.loc(), "invalid decimal literal"));
                }
            }
            if matches!(self.peek(), Some('j' | 'J')) {
                self.bump();
            }
        }
        if self.peek().is_some_and(|c| c.is_alphanumeric() || c == '_') {
            return Err(LexError::new(at, "invalid decimal literal"));
        }
        self.push(TokenKind::Number, at);
        Ok(())
    }

    fn digits(&mut self) {
        while self.peek().is_some_and(|c| c.is_ascii_digit() || c == '_') {
            self.bump();
        }
    }

    fn name(&mut self, at: Location) -> Result<(), LexError> {
        let start = self.i;
        while self.peek().is_some_and(|c| c.is_alphanumeric() || c == '_') {
            self.bump();
        }
        let name: String = self.chars[start..self.i].iter().collect();
        if matches!(self.peek(), Some('"' | '\''))
            && STRING_PREFIXES.contains(&name.to_ascii_lowercase().as_str())
        {
            return self.string(at);
        }
        self.push(TokenKind::Name(name), at);
        Ok(())
    }

    fn starts_with(&self, s: &str) -> bool {
        s.chars()
            .enumerate()
            .all(|(k, c)| self.peek_at(k) == Some(c))
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.i).copied()
    }

    fn peek_at(&self, k: usize) -> Option<char> {
        self.chars.get(self.i + k).copied()
    }

    fn bump(&mut self) {
        if let Some(c) = self.peek() {
            self.i += 1;
            if c == '\n' {
                self.line += 1;
                self.col = 1;
            } else {
                self.col += 1;
            }
        }
    }

    fn bump_n(&mut self, n: usize) {
        for _ in 0..n {
            self.bump();
        }
    }

    fn loc(&self) -> Location {
        Location {
            line: self.line,
            column: self.col,
        }
    }

    fn push(&mut self, kind: TokenKind, at: Location) {
        self.out.push(Token { kind, at });
    }
}

#[cfg(test)]
#[path = "../../tests/unit/codegen/pylex.rs"]
mod tests;
