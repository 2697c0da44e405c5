//! Statement grammar over lexed logical lines.
//!
//! Builds no tree: each logical line is walked the way the Python grammar would consume it, and
//! the first token that cannot continue the statement is reported. Only the shape of an
//! expression is tracked, which is enough to reject assignments without a target.

use crate::codegen::pylex::{Location, Token, TokenKind};

const KEYWORDS: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global", "if",
    "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return", "try",
    "while", "with", "yield",
];
const BINARY_OPS: &[&str] = &["|", "^", "&", "<<", ">>", "+", "-", "*", "/", "//", "%", "@"];
const COMPARE_OPS: &[&str] = &["<", ">", "==", ">=", "<=", "!="];
const AUG_ASSIGN: &[&str] = &[
    "+=", "-=", "*=", "/=", "//=", "%=", "**=", "@=", "&=", "|=", "^=", ">>=", "<<=",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SyntaxError {
    pub(crate) at: Location,
    pub(crate) message: String,
}

impl SyntaxError {
    fn new(at: Location, message: impl Into<String>) -> Self {
        Self {
            at,
            message: message.into(),
        }
    }
}

/// What a logical line opens, as far as `elif`/`else`/`except`/`finally` pairing cares.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Clause {
    Simple,
    If,
    Elif,
    Else,
    For,
    While,
    Try,
    Except,
    Finally,
    /// `def`, `class`, `with`, `match`, `case`.
    Block,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Shape {
    Name,
    /// Attribute access or subscription.
    Member,
    Seq {
        assignable: bool,
    },
    Starred {
        assignable: bool,
    },
    Value,
}

impl Shape {
    fn assignable(self) -> bool {
        match self {
            Self::Name | Self::Member => true,
            Self::Seq { assignable } | Self::Starred { assignable } => assignable,
            Self::Value => false,
        }
    }

    fn single_target(self) -> bool {
        matches!(self, Self::Name | Self::Member)
    }
}

type PResult<T> = Result<T, SyntaxError>;

/// Check one logical line (no newline or layout tokens) and classify it.
pub(crate) fn parse_line(toks: &[Token]) -> PResult<Clause> {
    let mut p = Parser {
        toks,
        pos: 0,
        eol: toks.last().map_or(Location::START, |t| t.at),
    };
    p.statement()
}

/// Index of the colon ending a compound statement header, skipping bracketed and lambda colons.
pub(crate) fn header_colon(toks: &[Token], kw_idx: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut lambdas = 0usize;
    for (i, t) in toks.iter().enumerate().skip(kw_idx + 1) {
        match t.kind {
            TokenKind::Open(_) => depth += 1,
            TokenKind::Close(_) => depth = depth.saturating_sub(1),
            TokenKind::Name(ref n) if depth == 0 && n == "lambda" => lambdas += 1,
            TokenKind::Op(":") if depth == 0 => {
                if lambdas == 0 {
                    return Some(i);
                }
                lambdas -= 1;
            }
            _ => {}
        }
    }
    None
}

fn is_identifier(name: &str) -> bool {
    !KEYWORDS.contains(&name)
}

fn describe(t: &Token) -> String {
    match &t.kind {
        TokenKind::Name(n) => format!("'{n}'"),
        TokenKind::Number => "number".to_owned(),
        TokenKind::Str => "string".to_owned(),
        TokenKind::Op(o) => format!("'{o}'"),
        TokenKind::Open(c) | TokenKind::Close(c) => format!("'{c}'"),
        TokenKind::Newline | TokenKind::Indent | TokenKind::Dedent | TokenKind::Eof => {
            "end of line".to_owned()
        }
    }
}

fn starts_pattern(t: &Token) -> bool {
    matches!(
        t.kind,
        TokenKind::Name(_) | TokenKind::Number | TokenKind::Str | TokenKind::Open(_)
    ) || t.is_op("-")
        || t.is_op("*")
}

struct Parser<'a> {
    toks: &'a [Token],
    pos: usize,
    eol: Location,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&'a Token> {
        self.toks.get(self.pos)
    }

    fn peek_at(&self, k: usize) -> Option<&'a Token> {
        self.toks.get(self.pos + k)
    }

    fn bump(&mut self) {
        if self.pos < self.toks.len() {
            self.pos += 1;
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.toks.len()
    }

    fn here(&self) -> Location {
        self.peek().map_or(self.eol, |t| t.at)
    }

    fn is_name(&self, s: &str) -> bool {
        self.peek().is_some_and(|t| t.is_name(s))
    }

    fn is_op(&self, s: &str) -> bool {
        self.peek().is_some_and(|t| t.is_op(s))
    }

    fn is_close(&self, c: char) -> bool {
        self.peek().is_some_and(|t| t.kind == TokenKind::Close(c))
    }

    fn is_identifier_then(&self, op: &str) -> bool {
        self.peek()
            .and_then(Token::name)
            .is_some_and(is_identifier)
            && self.peek_at(1).is_some_and(|t| t.is_op(op))
    }

    fn eat_name(&mut self, s: &str) -> bool {
        let hit = self.is_name(s);
        if hit {
            self.bump();
        }
        hit
    }

    fn eat_op(&mut self, s: &str) -> bool {
        let hit = self.is_op(s);
        if hit {
            self.bump();
        }
        hit
    }

    fn eat_open(&mut self, c: char) -> bool {
        let hit = self.peek().is_some_and(|t| t.kind == TokenKind::Open(c));
        if hit {
            self.bump();
        }
        hit
    }

    fn eat_close(&mut self, c: char) -> bool {
        let hit = self.is_close(c);
        if hit {
            self.bump();
        }
        hit
    }

    fn unexpected<T>(&self) -> PResult<T> {
        Err(match self.peek() {
            Some(t) => SyntaxError::new(t.at, format!("invalid syntax: unexpected {}", describe(t))),
            None => SyntaxError::new(self.eol, "invalid syntax: statement ends too early"),
        })
    }

    fn expected<T>(&self, what: &str) -> PResult<T> {
        let found = self.peek().map_or_else(|| "end of line".to_owned(), describe);
        Err(SyntaxError::new(
            self.here(),
            format!("invalid syntax: expected {what}, found {found}"),
        ))
    }

    fn expect_op(&mut self, s: &str) -> PResult<()> {
        if self.eat_op(s) {
            Ok(())
        } else {
            self.expected(&format!("'{s}'"))
        }
    }

    fn expect_name(&mut self, s: &str) -> PResult<()> {
        if self.eat_name(s) {
            Ok(())
        } else {
            self.expected(&format!("'{s}'"))
        }
    }

    fn expect_close(&mut self, c: char) -> PResult<()> {
        if self.eat_close(c) {
            Ok(())
        } else {
            self.expected(&format!("',' or '{c}'"))
        }
    }

    fn identifier(&mut self) -> PResult<()> {
        match self.peek().and_then(Token::name) {
            Some(n) if is_identifier(n) => {
                self.bump();
                Ok(())
            }
            _ => self.expected("a name"),
        }
    }

    fn dotted(&mut self) -> PResult<()> {
        self.identifier()?;
        while self.eat_op(".") {
            self.identifier()?;
        }
        Ok(())
    }

    fn finish(&self) -> PResult<()> {
        if self.at_end() {
            Ok(())
        } else {
            self.unexpected()
        }
    }

    fn starts_expr(&self) -> bool {
        let Some(t) = self.peek() else {
            return false;
        };
        match &t.kind {
            TokenKind::Name(n) => {
                is_identifier(n)
                    || matches!(
                        n.as_str(),
                        "not" | "lambda" | "await" | "None" | "True" | "False"
                    )
            }
            TokenKind::Number | TokenKind::Str | TokenKind::Open(_) => true,
            TokenKind::Op(o) => matches!(*o, "-" | "+" | "~" | "*" | "..."),
            _ => false,
        }
    }

    fn at_comprehension(&self) -> bool {
        self.is_name("for")
            || (self.is_name("async") && self.peek_at(1).is_some_and(|t| t.is_name("for")))
    }

    // ---- statements ----

    fn statement(&mut self) -> PResult<Clause> {
        if self.eat_op("@") {
            self.named_expr()?;
            self.finish()?;
            return Ok(Clause::Simple);
        }
        if self.is_name("async")
            && self
                .peek_at(1)
                .is_some_and(|t| t.is_name("def") || t.is_name("for") || t.is_name("with"))
        {
            self.bump();
        }

        let keyword = self.peek().and_then(Token::name).unwrap_or("");
        let clause = match keyword {
            "if" | "elif" | "while" => {
                self.bump();
                self.named_expr()?;
                match keyword {
                    "if" => Clause::If,
                    "elif" => Clause::Elif,
                    _ => Clause::While,
                }
            }
            "else" => {
                self.bump();
                Clause::Else
            }
            "try" => {
                self.bump();
                Clause::Try
            }
            "finally" => {
                self.bump();
                Clause::Finally
            }
            "for" => {
                self.bump();
                self.targets()?;
                self.expect_name("in")?;
                self.star_exprs()?;
                Clause::For
            }
            "with" => {
                self.bump();
                self.with_items()?;
                Clause::Block
            }
            "except" => {
                self.bump();
                if !self.is_op(":") {
                    self.eat_op("*");
                    self.expr()?;
                    if self.eat_name("as") {
                        self.identifier()?;
                    }
                }
                Clause::Except
            }
            "def" => {
                self.bump();
                self.identifier()?;
                if !self.eat_open('(') {
                    return self.expected("'('");
                }
                self.params(false)?;
                self.expect_close(')')?;
                if self.eat_op("->") {
                    self.expr()?;
                }
                Clause::Block
            }
            "class" => {
                self.bump();
                self.identifier()?;
                if self.eat_open('(') {
                    self.call_args()?;
                }
                Clause::Block
            }
            "match" | "case" if self.peek_at(1).is_some_and(starts_pattern) => {
                let Some(colon) = header_colon(self.toks, self.pos) else {
                    self.simple_statements()?;
                    return Ok(Clause::Simple);
                };
                // Patterns are not checked.
                self.pos = colon;
                Clause::Block
            }
            _ => {
                self.simple_statements()?;
                return Ok(Clause::Simple);
            }
        };
        self.expect_op(":")?;
        if !self.at_end() {
            self.simple_statements()?;
        }
        Ok(clause)
    }

    fn simple_statements(&mut self) -> PResult<()> {
        loop {
            self.simple_statement()?;
            if !self.eat_op(";") || self.at_end() {
                break;
            }
        }
        self.finish()
    }

    fn simple_statement(&mut self) -> PResult<()> {
        let keyword = self.peek().and_then(Token::name).unwrap_or("");
        match keyword {
            "pass" | "break" | "continue" => self.bump(),
            "return" => {
                self.bump();
                if self.starts_expr() {
                    self.star_exprs()?;
                }
            }
            "raise" => {
                self.bump();
                if self.starts_expr() {
                    self.expr()?;
                    if self.eat_name("from") {
                        self.expr()?;
                    }
                }
            }
            "global" | "nonlocal" => {
                self.bump();
                self.identifier()?;
                while self.eat_op(",") {
                    self.identifier()?;
                }
            }
            "del" => {
                self.bump();
                let at = self.here();
                if !self.star_exprs()?.assignable() {
                    return Err(SyntaxError::new(at, "cannot delete expression"));
                }
            }
            "assert" => {
                self.bump();
                self.expr()?;
                if self.eat_op(",") {
                    self.expr()?;
                }
            }
            "import" => {
                self.bump();
                loop {
                    self.dotted()?;
                    if self.eat_name("as") {
                        self.identifier()?;
                    }
                    if !self.eat_op(",") {
                        break;
                    }
                }
            }
            "from" => self.from_import()?,
            _ => self.expression_statement()?,
        }
        Ok(())
    }

    fn from_import(&mut self) -> PResult<()> {
        self.bump();
        let mut relative = false;
        while self.is_op(".") || self.is_op("...") {
            self.bump();
            relative = true;
        }
        if !(relative && self.is_name("import")) {
            self.dotted()?;
        }
        self.expect_name("import")?;
        if self.eat_op("*") {
            return Ok(());
        }
        let parenthesized = self.eat_open('(');
        loop {
            self.identifier()?;
            if self.eat_name("as") {
                self.identifier()?;
            }
            if !self.eat_op(",") || (parenthesized && self.is_close(')')) {
                break;
            }
        }
        if parenthesized {
            self.expect_close(')')?;
        }
        Ok(())
    }

    fn expression_statement(&mut self) -> PResult<()> {
        if self.is_name("yield") {
            return self.yield_expr();
        }
        let mut target_at = self.here();
        let mut target = self.star_exprs()?;

        if self.eat_op(":") {
            if !target.single_target() {
                return Err(SyntaxError::new(
                    target_at,
                    "illegal target for annotation",
                ));
            }
            self.expr()?;
            if self.eat_op("=") {
                self.assigned_value()?;
            }
            return Ok(());
        }

        if AUG_ASSIGN.iter().any(|op| self.is_op(op)) {
            if !target.single_target() {
                return Err(SyntaxError::new(
                    target_at,
                    "illegal expression for augmented assignment",
                ));
            }
            self.bump();
            self.assigned_value()?;
            return Ok(());
        }

        while self.is_op("=") {
            if !target.assignable() {
                return Err(SyntaxError::new(target_at, "cannot assign to expression"));
            }
            self.bump();
            target_at = self.here();
            target = self.assigned_value()?;
        }
        Ok(())
    }

    fn assigned_value(&mut self) -> PResult<Shape> {
        if self.is_name("yield") {
            self.yield_expr()?;
            return Ok(Shape::Value);
        }
        self.star_exprs()
    }

    fn yield_expr(&mut self) -> PResult<()> {
        self.bump();
        if self.eat_name("from") {
            self.expr()?;
        } else if self.starts_expr() {
            self.star_exprs()?;
        }
        Ok(())
    }

    /// Targets of a `for` clause, up to `in`.
    fn targets(&mut self) -> PResult<()> {
        let at = self.here();
        let mut assignable = true;
        loop {
            let shape = if self.eat_op("*") {
                Shape::Starred {
                    assignable: self.bitwise()?.assignable(),
                }
            } else {
                self.bitwise()?
            };
            assignable &= shape.assignable();
            if !self.eat_op(",") || self.is_name("in") {
                break;
            }
        }
        if assignable {
            Ok(())
        } else {
            Err(SyntaxError::new(at, "cannot assign to expression in 'for' target"))
        }
    }

    fn with_items(&mut self) -> PResult<()> {
        if self.peek().is_some_and(|t| t.kind == TokenKind::Open('(')) {
            let save = self.pos;
            self.bump();
            if self.with_item_list(true).is_ok() && self.is_op(":") {
                return Ok(());
            }
            self.pos = save;
        }
        self.with_item_list(false)
    }

    fn with_item_list(&mut self, parenthesized: bool) -> PResult<()> {
        loop {
            self.expr()?;
            if self.eat_name("as") {
                let at = self.here();
                if !self.bitwise()?.assignable() {
                    return Err(SyntaxError::new(at, "cannot assign to expression in 'with'"));
                }
            }
            if !self.eat_op(",") {
                break;
            }
            if parenthesized && self.is_close(')') {
                break;
            }
        }
        if parenthesized {
            self.expect_close(')')?;
        }
        Ok(())
    }

    /// Parameters of a `def` (up to `)`) or a `lambda` (up to `:`).
    fn params(&mut self, lambda: bool) -> PResult<()> {
        while !self.params_done(lambda) {
            if self.eat_op("**") {
                self.identifier()?;
                if !lambda && self.eat_op(":") {
                    self.expr()?;
                }
            } else if self.eat_op("*") {
                if self.peek().and_then(Token::name).is_some_and(is_identifier) {
                    self.identifier()?;
                    if !lambda && self.eat_op(":") {
                        self.expr()?;
                    }
                }
            } else if !self.eat_op("/") {
                self.identifier()?;
                if !lambda && self.eat_op(":") {
                    self.expr()?;
                }
                if self.eat_op("=") {
                    self.expr()?;
                }
            }
            if self.params_done(lambda) {
                break;
            }
            self.expect_op(",")?;
        }
        Ok(())
    }

    fn params_done(&self, lambda: bool) -> bool {
        if lambda {
            self.is_op(":")
        } else {
            self.is_close(')')
        }
    }

    // ---- expressions ----

    fn star_exprs(&mut self) -> PResult<Shape> {
        let first = self.star_item()?;
        if !self.is_op(",") {
            return Ok(first);
        }
        let mut assignable = first.assignable();
        while self.eat_op(",") {
            if !self.starts_expr() {
                break;
            }
            assignable &= self.star_item()?.assignable();
        }
        Ok(Shape::Seq { assignable })
    }

    fn star_item(&mut self) -> PResult<Shape> {
        if self.eat_op("*") {
            let inner = self.bitwise()?;
            return Ok(Shape::Starred {
                assignable: inner.assignable(),
            });
        }
        self.named_expr()
    }

    fn named_expr(&mut self) -> PResult<Shape> {
        if self.is_identifier_then(":=") {
            self.bump();
            self.bump();
            self.expr()?;
            return Ok(Shape::Value);
        }
        self.expr()
    }

    fn expr(&mut self) -> PResult<Shape> {
        if self.eat_name("lambda") {
            self.params(true)?;
            self.expect_op(":")?;
            self.expr()?;
            return Ok(Shape::Value);
        }
        let shape = self.or_test()?;
        if self.eat_name("if") {
            self.or_test()?;
            self.expect_name("else")?;
            self.expr()?;
            return Ok(Shape::Value);
        }
        Ok(shape)
    }

    fn or_test(&mut self) -> PResult<Shape> {
        let mut shape = self.and_test()?;
        while self.eat_name("or") {
            self.and_test()?;
            shape = Shape::Value;
        }
        Ok(shape)
    }

    fn and_test(&mut self) -> PResult<Shape> {
        let mut shape = self.not_test()?;
        while self.eat_name("and") {
            self.not_test()?;
            shape = Shape::Value;
        }
        Ok(shape)
    }

    fn not_test(&mut self) -> PResult<Shape> {
        if self.eat_name("not") {
            self.not_test()?;
            return Ok(Shape::Value);
        }
        self.comparison()
    }

    fn comparison(&mut self) -> PResult<Shape> {
        let mut shape = self.bitwise()?;
        loop {
            if COMPARE_OPS.iter().any(|op| self.is_op(op)) || self.is_name("in") {
                self.bump();
            } else if self.is_name("not") && self.peek_at(1).is_some_and(|t| t.is_name("in")) {
                self.bump();
                self.bump();
            } else if self.eat_name("is") {
                self.eat_name("not");
            } else {
                break;
            }
            self.bitwise()?;
            shape = Shape::Value;
        }
        Ok(shape)
    }

    fn bitwise(&mut self) -> PResult<Shape> {
        let mut shape = self.unary()?;
        while BINARY_OPS.iter().any(|op| self.is_op(op)) {
            self.bump();
            self.unary()?;
            shape = Shape::Value;
        }
        Ok(shape)
    }

    fn unary(&mut self) -> PResult<Shape> {
        if self.eat_op("-") || self.eat_op("+") || self.eat_op("~") {
            self.unary()?;
            return Ok(Shape::Value);
        }
        self.power()
    }

    fn power(&mut self) -> PResult<Shape> {
        let awaited = self.eat_name("await");
        let mut shape = self.primary()?;
        if awaited {
            shape = Shape::Value;
        }
        if self.eat_op("**") {
            self.unary()?;
            shape = Shape::Value;
        }
        Ok(shape)
    }

    fn primary(&mut self) -> PResult<Shape> {
        let mut shape = self.atom()?;
        loop {
            if self.eat_open('(') {
                self.call_args()?;
                shape = Shape::Value;
            } else if self.eat_open('[') {
                self.subscripts()?;
                shape = Shape::Member;
            } else if self.eat_op(".") {
                self.identifier()?;
                shape = Shape::Member;
            } else {
                return Ok(shape);
            }
        }
    }

    fn atom(&mut self) -> PResult<Shape> {
        let Some(t) = self.peek() else {
            return self.unexpected();
        };
        match &t.kind {
            TokenKind::Name(n) if matches!(n.as_str(), "None" | "True" | "False") => {
                self.bump();
                Ok(Shape::Value)
            }
            TokenKind::Name(n) if is_identifier(n) => {
                self.bump();
                Ok(Shape::Name)
            }
            TokenKind::Number | TokenKind::Op("...") => {
                self.bump();
                Ok(Shape::Value)
            }
            TokenKind::Str => {
                while self.peek().is_some_and(|t| t.kind == TokenKind::Str) {
                    self.bump();
                }
                Ok(Shape::Value)
            }
            TokenKind::Open('(') => {
                self.bump();
                self.parenthesized()
            }
            TokenKind::Open('[') => {
                self.bump();
                self.list_display()
            }
            TokenKind::Open('{') => {
                self.bump();
                self.brace_display()
            }
            _ => self.unexpected(),
        }
    }

    fn parenthesized(&mut self) -> PResult<Shape> {
        if self.eat_close(')') {
            return Ok(Shape::Value);
        }
        if self.is_name("yield") {
            self.yield_expr()?;
            self.expect_close(')')?;
            return Ok(Shape::Value);
        }
        let first = self.star_item()?;
        if self.at_comprehension() {
            self.comprehension()?;
            self.expect_close(')')?;
            return Ok(Shape::Value);
        }
        if self.eat_close(')') {
            return Ok(first);
        }
        let assignable = self.sequence_rest(first, ')')?;
        Ok(Shape::Seq { assignable })
    }

    fn list_display(&mut self) -> PResult<Shape> {
        if self.eat_close(']') {
            return Ok(Shape::Seq { assignable: true });
        }
        let first = self.star_item()?;
        if self.at_comprehension() {
            self.comprehension()?;
            self.expect_close(']')?;
            return Ok(Shape::Value);
        }
        let assignable = self.sequence_rest(first, ']')?;
        Ok(Shape::Seq { assignable })
    }

    /// Remaining `, item` entries of a tuple or list display, through `close`.
    fn sequence_rest(&mut self, first: Shape, close: char) -> PResult<bool> {
        let mut assignable = first.assignable();
        while !self.eat_close(close) {
            if !self.eat_op(",") {
                return self.expected(&format!("',' or '{close}'"));
            }
            if self.eat_close(close) {
                break;
            }
            assignable &= self.star_item()?.assignable();
        }
        Ok(assignable)
    }

    fn brace_display(&mut self) -> PResult<Shape> {
        if self.eat_close('}') {
            return Ok(Shape::Value);
        }
        let dict = if self.eat_op("**") {
            self.bitwise()?;
            true
        } else {
            self.star_item()?;
            if self.eat_op(":") {
                self.expr()?;
                true
            } else {
                false
            }
        };
        if self.at_comprehension() {
            self.comprehension()?;
            self.expect_close('}')?;
            return Ok(Shape::Value);
        }
        while !self.eat_close('}') {
            if !self.eat_op(",") {
                return self.expected("',' or '}'");
            }
            if self.eat_close('}') {
                break;
            }
            if !dict {
                self.star_item()?;
            } else if self.eat_op("**") {
                self.bitwise()?;
            } else {
                self.expr()?;
                self.expect_op(":")?;
                self.expr()?;
            }
        }
        Ok(Shape::Value)
    }

    fn comprehension(&mut self) -> PResult<()> {
        while self.at_comprehension() {
            self.eat_name("async");
            self.bump();
            self.targets()?;
            self.expect_name("in")?;
            self.or_test()?;
            while self.eat_name("if") {
                self.or_test()?;
            }
        }
        Ok(())
    }

    /// Call arguments after `(`, through `)`.
    fn call_args(&mut self) -> PResult<()> {
        while !self.eat_close(')') {
            if self.eat_op("*") || self.eat_op("**") {
                self.expr()?;
            } else if self.is_identifier_then("=") {
                self.bump();
                self.bump();
                self.expr()?;
            } else {
                self.named_expr()?;
                if self.at_comprehension() {
                    self.comprehension()?;
                }
            }
            if self.eat_close(')') {
                break;
            }
            if !self.eat_op(",") {
                return self.expected("',' or ')'");
            }
        }
        Ok(())
    }

    /// Subscript items after `[`, through `]`.
    fn subscripts(&mut self) -> PResult<()> {
        loop {
            self.slice_item()?;
            if self.eat_close(']') {
                return Ok(());
            }
            if !self.eat_op(",") {
                return self.expected("',' or ']'");
            }
            if self.eat_close(']') {
                return Ok(());
            }
        }
    }

    fn slice_item(&mut self) -> PResult<()> {
        if self.eat_op("*") {
            self.bitwise()?;
            return Ok(());
        }
        if !self.is_op(":") {
            self.named_expr()?;
        }
        if self.eat_op(":") {
            if self.starts_expr() {
                self.expr()?;
            }
            if self.eat_op(":") && self.starts_expr() {
                self.expr()?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/codegen/pyparse.rs"]
mod tests;
