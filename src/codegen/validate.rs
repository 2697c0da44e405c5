//! Static checks for generated Manim fragments and scripts.
//!
//! Nothing here executes code. Fragments are tokenized, grouped into logical lines and checked
//! for the structural errors that would make the renderer fail before drawing a frame.

pub use crate::codegen::pylex::Location;
use crate::codegen::pylex::{Token, TokenKind, lex};
use crate::codegen::pyparse::{Clause, header_colon, parse_line};
use crate::foundation::error::{ManimlineError, ManimlineResult};
use std::fmt;

/// Why a fragment was rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvalidKind {
    /// The fragment does not parse.
    SyntaxError,
    /// The fragment has no code at all.
    EmptyFragment,
    /// The fragment parses but contains a construct the renderer must not receive.
    UnknownConstruct,
}

impl fmt::Display for InvalidKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::SyntaxError => "syntax_error",
            Self::EmptyFragment => "empty_fragment",
            Self::UnknownConstruct => "unknown_construct",
        })
    }
}

/// Outcome of a validation run.
#[derive(Clone, Debug, PartialEq)]
pub enum Validation {
    /// Accepted, possibly with warnings.
    Valid {
        /// Non-fatal findings.
        warnings: Vec<String>,
    },
    /// Rejected.
    Invalid {
        /// Failure class.
        kind: InvalidKind,
        /// Human-readable reason.
        message: String,
        /// Where the problem was found.
        location: Location,
    },
}

impl Validation {
    /// Return `true` for [`Validation::Valid`].
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid { .. })
    }

    /// Warnings of a valid result; empty for invalid ones.
    pub fn warnings(&self) -> &[String] {
        match self {
            Self::Valid { warnings } => warnings,
            Self::Invalid { .. } => &[],
        }
    }

    /// Convert into a result carrying the warnings, or a [`ManimlineError::Validation`].
    pub fn into_result(self) -> ManimlineResult<Vec<String>> {
        match self {
            Self::Valid { warnings } => Ok(warnings),
            invalid => Err(ManimlineError::validation(invalid.to_string())),
        }
    }
}

impl fmt::Display for Validation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Valid { warnings } if warnings.is_empty() => f.write_str("valid"),
            Self::Valid { warnings } => write!(f, "valid ({} warning(s))", warnings.len()),
            Self::Invalid {
                kind,
                message,
                location,
            } => write!(f, "{kind} at {location}: {message}"),
        }
    }
}

/// Static validator for Manim fragments.
#[derive(Clone, Debug, Default)]
pub struct CodeValidator {
    strict_vocabulary: bool,
}

/// Warning attached to fragments that never touch the Manim vocabulary.
pub const NO_VOCABULARY_WARNING: &str = "fragment uses no recognizable Manim construct";

const BLOCK_KEYWORDS: &[&str] = &[
    "def", "class", "if", "elif", "else", "for", "while", "with", "try", "except", "finally",
];
const SOFT_BLOCK_KEYWORDS: &[&str] = &["match", "case"];

const DANGLING_OPS: &[&str] = &[
    "+", "-", "*", "/", "//", "%", "**", "@", "<<", ">>", "&", "|", "^", "~", "<", ">", "<=", ">=",
    "==", "!=", "=", "+=", "-=", "*=", "/=", "//=", "%=", "**=", "@=", "&=", "|=", "^=", ">>=",
    "<<=", ".", "->", ":=",
];
const DANGLING_WORDS: &[&str] = &["and", "or", "not", "in", "is", "if", "else"];
const LEADING_INVALID_OPS: &[&str] = &[
    "=", "==", "!=", "<=", ">=", "<", ">", "/", "//", "%", "**", "|", "&", "^", "<<", ">>", ".", ",",
    ";", ":", "->", ":=", "+=", "-=", "*=", "/=", "//=", "%=", "**=", "@=", "&=", "|=", "^=", ">>=",
    "<<=",
];
const CATCH_ALL_TYPES: &[&str] = &["Exception", "BaseException"];
const TRIVIAL_STATEMENTS: &[&str] = &["pass", "continue"];

const SCENE_METHODS: &[&str] = &[
    "play",
    "add",
    "wait",
    "remove",
    "clear",
    "bring_to_front",
    "bring_to_back",
    "add_foreground_mobject",
    "set_camera_orientation",
    "move_camera",
    "begin_ambient_camera_rotation",
    "stop_ambient_camera_rotation",
];
const MANIM_NAMES: &[&str] = &[
    "Circle",
    "Square",
    "Rectangle",
    "Triangle",
    "Star",
    "RegularPolygon",
    "Polygon",
    "Ellipse",
    "Arrow",
    "Line",
    "Dot",
    "Dot3D",
    "Text",
    "MathTex",
    "Tex",
    "VGroup",
    "Group",
    "Axes",
    "ThreeDAxes",
    "NumberPlane",
    "Graph",
    "ArrowVectorField",
    "StreamLines",
    "Sphere",
    "Cube",
    "Surface",
    "ValueTracker",
    "Create",
    "Uncreate",
    "Write",
    "FadeIn",
    "FadeOut",
    "FadeToColor",
    "Transform",
    "ReplacementTransform",
    "Rotate",
    "GrowFromCenter",
    "DrawBorderThenFill",
    "Indicate",
    "Circumscribe",
    "LaggedStart",
    "AnimationGroup",
    "MoveAlongPath",
];

struct Issue {
    kind: InvalidKind,
    message: String,
    at: Location,
}

impl Issue {
    fn syntax(message: impl Into<String>, at: Location) -> Self {
        Self {
            kind: InvalidKind::SyntaxError,
            message: message.into(),
            at,
        }
    }

    fn construct(message: impl Into<String>, at: Location) -> Self {
        Self {
            kind: InvalidKind::UnknownConstruct,
            message: message.into(),
            at,
        }
    }
}

enum Event<'a> {
    Indent(Location),
    Dedent(Location),
    Line(&'a [Token]),
}

impl CodeValidator {
    /// Validator with default rules.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject fragments without Manim vocabulary instead of warning about them.
    pub fn strict_vocabulary(mut self, strict: bool) -> Self {
        self.strict_vocabulary = strict;
        self
    }

    /// Check one scene fragment (statements run inside a scene method).
    ///
    /// Uniformly indented fragments are accepted; locations refer to the original text.
    pub fn check(&self, code: &str) -> Validation {
        let (src, shift) = dedent(code);
        let report = |issue: Issue| Validation::Invalid {
            kind: issue.kind,
            message: issue.message,
            location: Location {
                line: issue.at.line,
                column: issue.at.column + shift,
            },
        };
        match self.analyze(&src, false) {
            Ok(warnings) => Validation::Valid { warnings },
            Err(issue) => report(issue),
        }
    }

    /// Check a complete render script: fragment rules plus a Manim import and a `Scene`
    /// subclass defining `construct`.
    pub fn check_script(&self, script: &str) -> Validation {
        match self.analyze(script, true) {
            Ok(warnings) => Validation::Valid { warnings },
            Err(issue) => Validation::Invalid {
                kind: issue.kind,
                message: issue.message,
                location: issue.at,
            },
        }
    }

    fn analyze(&self, src: &str, script: bool) -> Result<Vec<String>, Issue> {
        let tokens = lex(src).map_err(|e| Issue::syntax(e.message, e.at))?;
        let events = events(&tokens);
        if !events.iter().any(|e| matches!(e, Event::Line(_))) {
            return Err(Issue {
                kind: InvalidKind::EmptyFragment,
                message: "fragment contains no code".to_owned(),
                at: Location::START,
            });
        }
        let eof = tokens.last().map_or(Location::START, |t| t.at);
        check_structure(&events, eof)?;
        check_suppression(&events)?;
        if script {
            check_script_shape(&events)?;
        }

        let mut warnings = Vec::new();
        if !uses_vocabulary(&tokens) {
            if self.strict_vocabulary {
                return Err(Issue::construct(NO_VOCABULARY_WARNING, Location::START));
            }
            warnings.push(NO_VOCABULARY_WARNING.to_owned());
        }
        Ok(warnings)
    }
}

/// Remove the whitespace prefix shared by every non-blank line.
///
/// Returns the dedented text and the prefix width in characters.
pub(crate) fn dedent(code: &str) -> (String, usize) {
    let mut prefix: Option<&str> = None;
    for line in code.lines().filter(|l| !l.trim().is_empty()) {
        let ws = &line[..line.len() - line.trim_start().len()];
        prefix = Some(match prefix {
            None => ws,
            Some(p) => common_prefix(p, ws),
        });
    }
    let prefix = prefix.unwrap_or("");
    if prefix.is_empty() {
        return (code.to_owned(), 0);
    }
    let out = code
        .lines()
        .map(|l| l.strip_prefix(prefix).unwrap_or(l.trim_start()))
        .collect::<Vec<_>>()
        .join("\n");
    (out, prefix.chars().count())
}

fn common_prefix<'a>(a: &'a str, b: &str) -> &'a str {
    let n = a
        .char_indices()
        .zip(b.chars())
        .find(|((_, x), y)| x != y)
        .map_or(a.len().min(b.len()), |((i, _), _)| i);
    &a[..n]
}

fn events(tokens: &[Token]) -> Vec<Event<'_>> {
    let mut out = Vec::new();
    let mut i = 0;
    while i < tokens.len() {
        match tokens[i].kind {
            TokenKind::Indent => out.push(Event::Indent(tokens[i].at)),
            TokenKind::Dedent => out.push(Event::Dedent(tokens[i].at)),
            TokenKind::Eof => break,
            TokenKind::Newline => {}
            _ => {
                let end = tokens[i..]
                    .iter()
                    .position(|t| matches!(t.kind, TokenKind::Newline | TokenKind::Eof))
                    .map_or(tokens.len(), |p| i + p);
                out.push(Event::Line(&tokens[i..end]));
                i = end;
                continue;
            }
        }
        i += 1;
    }
    out
}

fn check_structure(events: &[Event<'_>], eof: Location) -> Result<(), Issue> {
    let mut pending: Option<(String, Location)> = None;
    let mut levels = vec![Chain::Open];
    for ev in events {
        match ev {
            Event::Indent(at) => {
                if pending.take().is_none() {
                    return Err(Issue::syntax("unexpected indent", *at));
                }
                levels.push(Chain::Open);
            }
            Event::Dedent(at) => {
                if let Some((kw, header)) = pending.take() {
                    return Err(expected_block(&kw, header, *at));
                }
                if levels.pop() == Some(Chain::Try) {
                    return Err(Issue::syntax(MISSING_HANDLER, *at));
                }
            }
            Event::Line(toks) => {
                if let Some((kw, header)) = pending.take() {
                    return Err(expected_block(&kw, header, toks[0].at));
                }
                pending = check_line(toks)?;
                let clause = parse_line(toks).map_err(|e| Issue::syntax(e.message, e.at))?;
                if let Some(state) = levels.last_mut() {
                    *state = state.next(clause, toks[0].at)?;
                }
            }
        }
    }
    if let Some((kw, header)) = pending {
        return Err(expected_block(&kw, header, eof));
    }
    if levels.contains(&Chain::Try) {
        return Err(Issue::syntax(MISSING_HANDLER, eof));
    }
    Ok(())
}

const MISSING_HANDLER: &str = "expected 'except' or 'finally' block";

/// Which continuation clauses the previous statement at one indentation level admits.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Chain {
    Open,
    Conditional,
    Loop,
    Try,
    Handler,
    TryElse,
}

impl Chain {
    fn next(self, clause: Clause, at: Location) -> Result<Self, Issue> {
        if self == Self::Try && !matches!(clause, Clause::Except | Clause::Finally) {
            return Err(Issue::syntax(MISSING_HANDLER, at));
        }
        let unmatched = |kw: &str, openers: &str| {
            Err(Issue::syntax(
                format!("'{kw}' without a matching {openers}"),
                at,
            ))
        };
        match clause {
            Clause::Elif => match self {
                Self::Conditional => Ok(Self::Conditional),
                _ => unmatched("elif", "'if'"),
            },
            Clause::Else => match self {
                Self::Conditional | Self::Loop => Ok(Self::Open),
                Self::Handler => Ok(Self::TryElse),
                _ => unmatched("else", "'if', 'for', 'while' or 'try'"),
            },
            Clause::Except => match self {
                Self::Try | Self::Handler => Ok(Self::Handler),
                _ => unmatched("except", "'try'"),
            },
            Clause::Finally => match self {
                Self::Try | Self::Handler | Self::TryElse => Ok(Self::Open),
                _ => unmatched("finally", "'try'"),
            },
            Clause::If => Ok(Self::Conditional),
            Clause::For | Clause::While => Ok(Self::Loop),
            Clause::Try => Ok(Self::Try),
            Clause::Simple | Clause::Block => Ok(Self::Open),
        }
    }
}

fn expected_block(kw: &str, header: Location, at: Location) -> Issue {
    Issue::syntax(
        format!(
            "expected an indented block after '{kw}' statement on line {}",
            header.line
        ),
        at,
    )
}

/// Check one logical line. Returns the block keyword when the line opens a block.
fn check_line(toks: &[Token]) -> Result<Option<(String, Location)>, Issue> {
    let first = &toks[0];
    let Some(last) = toks.last() else {
        return Ok(None);
    };
    if let TokenKind::Op(op) = first.kind
        && LEADING_INVALID_OPS.contains(&op)
    {
        return Err(Issue::syntax(
            format!("invalid syntax: unexpected '{op}'"),
            first.at,
        ));
    }

    let kw_idx = usize::from(first.is_name("async"));
    let kw = toks.get(kw_idx).and_then(Token::name).filter(|n| {
        BLOCK_KEYWORDS.contains(n) || (SOFT_BLOCK_KEYWORDS.contains(n) && last.is_op(":"))
    });

    let Some(kw) = kw else {
        if last.is_op(":") {
            return Err(Issue::syntax(
                "invalid syntax: unexpected ':' at end of statement",
                last.at,
            ));
        }
        check_dangling(first, last)?;
        return Ok(None);
    };

    let Some(colon) = header_colon(toks, kw_idx) else {
        return Err(Issue::syntax(
            format!("expected ':' after '{kw}' statement"),
            last.at,
        ));
    };
    if matches!(kw, "else" | "try" | "finally") && colon != kw_idx + 1 {
        return Err(Issue::syntax(
            format!("expected ':' right after '{kw}'"),
            toks[kw_idx + 1].at,
        ));
    }
    if matches!(kw, "def" | "class")
        && toks.get(kw_idx + 1).and_then(Token::name).is_none()
    {
        return Err(Issue::syntax(
            format!("expected a name after '{kw}'"),
            toks[kw_idx + 1].at,
        ));
    }
    if colon + 1 == toks.len() {
        return Ok(Some((kw.to_owned(), first.at)));
    }
    check_dangling(first, last)?;
    Ok(None)
}

fn check_dangling(first: &Token, last: &Token) -> Result<(), Issue> {
    match &last.kind {
        TokenKind::Op("*") if first.is_name("from") => Ok(()),
        TokenKind::Op(op) if DANGLING_OPS.contains(op) => Err(Issue::syntax(
            format!("line ends with dangling operator '{op}'"),
            last.at,
        )),
        TokenKind::Name(n) if DANGLING_WORDS.contains(&n.as_str()) => Err(Issue::syntax(
            format!("line ends with dangling '{n}'"),
            last.at,
        )),
        _ => Ok(()),
    }
}

fn check_suppression(events: &[Event<'_>]) -> Result<(), Issue> {
    for (idx, ev) in events.iter().enumerate() {
        let Event::Line(toks) = ev else {
            continue;
        };
        let kw_idx = usize::from(toks[0].is_name("async"));
        let Some(kw) = toks.get(kw_idx) else {
            continue;
        };
        if kw.is_name("with") && suppresses_everything(toks) {
            return Err(Issue::construct(
                "'suppress' over every exception hides render failures",
                kw.at,
            ));
        }
        if !kw.is_name("except") {
            continue;
        }
        let Some(colon) = header_colon(toks, kw_idx) else {
            continue;
        };
        if !catches_everything(&toks[kw_idx + 1..colon]) {
            continue;
        }
        let body = &toks[colon + 1..];
        let trivial = if body.is_empty() {
            block_is_trivial(&events[idx + 1..])
        } else {
            statements_are_trivial(body)
        };
        if trivial {
            return Err(Issue::construct(
                "catch-all 'except' that silently swallows errors",
                kw.at,
            ));
        }
    }
    Ok(())
}

fn catches_everything(expr: &[Token]) -> bool {
    let expr = match expr.iter().position(|t| t.is_name("as")) {
        Some(p) => &expr[..p],
        None => expr,
    };
    let names: Vec<&str> = expr.iter().filter_map(Token::name).collect();
    names.is_empty() && expr.iter().all(|t| !matches!(t.kind, TokenKind::Str))
        || names.iter().any(|n| CATCH_ALL_TYPES.contains(n))
}

fn suppresses_everything(toks: &[Token]) -> bool {
    toks.windows(3).enumerate().any(|(i, w)| {
        w[0].is_name("suppress")
            && w[1].kind == TokenKind::Open('(')
            && toks[i + 2..]
                .iter()
                .take_while(|t| t.kind != TokenKind::Close(')'))
                .filter_map(Token::name)
                .any(|n| CATCH_ALL_TYPES.contains(&n))
    })
}

fn statements_are_trivial(toks: &[Token]) -> bool {
    toks.split(|t| t.is_op(";"))
        .filter(|part| !part.is_empty())
        .all(|part| {
            part.len() == 1
                && (part[0].is_op("...")
                    || part[0]
                        .name()
                        .is_some_and(|n| TRIVIAL_STATEMENTS.contains(&n)))
        })
}

fn block_is_trivial(rest: &[Event<'_>]) -> bool {
    let mut it = rest.iter();
    if !matches!(it.next(), Some(Event::Indent(_))) {
        return false;
    }
    for ev in it {
        match ev {
            Event::Line(toks) if statements_are_trivial(toks) => {}
            Event::Dedent(_) => return true,
            _ => return false,
        }
    }
    true
}

fn check_script_shape(events: &[Event<'_>]) -> Result<(), Issue> {
    let imports_manim = events.iter().any(|ev| match ev {
        Event::Line(toks) => {
            (toks.len() >= 3
                && toks[0].is_name("from")
                && toks[1].is_name("manim")
                && toks[2].is_name("import"))
                || (toks.len() >= 2 && toks[0].is_name("import") && toks[1].is_name("manim"))
        }
        _ => false,
    });
    if !imports_manim {
        return Err(Issue::construct(
            "script does not import manim",
            Location::START,
        ));
    }

    let has_scene = events.iter().enumerate().any(|(idx, ev)| {
        matches!(ev, Event::Line(toks) if is_scene_class(toks))
            && class_has_construct(&events[idx + 1..])
    });
    if has_scene {
        return Ok(());
    }
    Err(Issue::construct(
        "script defines no Scene subclass with a construct method",
        Location::START,
    ))
}

fn is_scene_class(toks: &[Token]) -> bool {
    toks.first().is_some_and(|t| t.is_name("class"))
        && toks.get(2).is_some_and(|t| t.kind == TokenKind::Open('('))
        && toks
            .iter()
            .skip(3)
            .take_while(|t| t.kind != TokenKind::Close(')'))
            .filter_map(Token::name)
            .any(|n| n.ends_with("Scene"))
}

fn class_has_construct(rest: &[Event<'_>]) -> bool {
    let mut depth = 0usize;
    for ev in rest {
        match ev {
            Event::Indent(_) => depth += 1,
            Event::Dedent(_) => {
                if depth <= 1 {
                    return false;
                }
                depth -= 1;
            }
            Event::Line(toks) => {
                if depth == 0 {
                    return false;
                }
                if depth == 1
                    && toks.first().is_some_and(|t| t.is_name("def"))
                    && toks.get(1).is_some_and(|t| t.is_name("construct"))
                {
                    return true;
                }
            }
        }
    }
    false
}

fn uses_vocabulary(tokens: &[Token]) -> bool {
    let method_call = tokens.windows(3).any(|w| {
        w[0].is_name("self")
            && w[1].is_op(".")
            && w[2].name().is_some_and(|m| SCENE_METHODS.contains(&m))
    });
    method_call
        || tokens
            .iter()
            .filter_map(Token::name)
            .any(|n| MANIM_NAMES.contains(&n))
}

#[cfg(test)]
#[path = "../../tests/unit/codegen/validate.rs"]
mod tests;
