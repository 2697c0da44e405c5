use super::*;
use crate::codegen::pylex::lex;

fn line(src: &str) -> Vec<Token> {
    lex(src)
        .unwrap()
        .into_iter()
        .filter(|t| !matches!(t.kind, TokenKind::Newline | TokenKind::Eof))
        .collect()
}

fn parse(src: &str) -> PResult<Clause> {
    parse_line(&line(src))
}

#[test]
fn accepts_everyday_statements() {
    let cases = [
        "x = y = 3",
        "a, *b = 1, 2, 3",
        "a, = t",
        "[a, b] = pair",
        "self.obj[0].color: str = 'red'",
        "total += step ** -1",
        "n = -x if x < 0 else +x",
        "ok = a is not b and c not in d or not e",
        "f(*args, key=1, **kw)",
        "g(x for x in xs if x)",
        "sq = {k: v ** 2 for k, v in pairs.items()}",
        "s = {m for m in mobs if m not in seen}",
        "d = {**base, 'a': 1, 'b': [1, 2][::-1]}",
        "t = (yield)",
        "v = m[1:2, ::3, ...]",
        "fn = lambda p, *rest, scale=1, **kw: p * scale",
        "name = 'a' 'b' f'{c}'",
        "from . import sibling",
        "from ..pkg.mod import (a as b, c,)",
        "import os.path as osp, sys",
        "del self.items[0], x",
        "raise ValueError('bad') from err",
        "assert x > 0, 'positive'",
        "global a, b",
        "return",
        "x = 1; y = 2;",
        "@dataclass(frozen=True)",
        "match = 3",
        "self.play(*[FadeIn(m) for m in mobs], run_time=2)",
        "remaining = t - self.renderer.time",
        "x = await fetch()",
    ];
    for src in cases {
        assert_eq!(parse(src), Ok(Clause::Simple), "{src}");
    }
}

#[test]
fn classifies_compound_headers() {
    let cases = [
        ("if (n := len(xs)) > 3: print(n)", Clause::If),
        ("elif x:", Clause::Elif),
        ("else: pass", Clause::Else),
        ("for i, (a, b) in enumerate(pairs):", Clause::For),
        ("while (line := read()): pass", Clause::While),
        ("try:", Clause::Try),
        ("except* ValueError as group: pass", Clause::Except),
        ("except:", Clause::Except),
        ("finally:", Clause::Finally),
        ("async def run(self, *, dt: float = 0.1, **kw) -> None: pass", Clause::Block),
        ("def f(a, /, b, *args, c=2, **kw): return a", Clause::Block),
        ("class Demo(Scene, metaclass=Meta): pass", Clause::Block),
        ("with open(p) as fh, lock: pass", Clause::Block),
        ("with (open(p) as fh, lock as l,): pass", Clause::Block),
        ("with (ctx): pass", Clause::Block),
        ("match command.split():", Clause::Block),
        ("case [x, y, *rest]:", Clause::Block),
    ];
    for (src, clause) in cases {
        assert_eq!(parse(src), Ok(clause), "{src}");
    }
}

#[test]
fn rejects_malformed_lines() {
    let cases = [
        "x = = 1",
        "f() = 3",
        "a + 1 = 2",
        "(a, b()) = t",
        "f(a b)",
        "f(,)",
        "[1, 2 3]",
        "{1: 2, 3}",
        "return return",
        "pass pass",
        "import",
        "from x import",
        "lambda: = 1",
        "def (): pass",
        "for f() in xs: pass",
        "del f()",
        "a += b = 1",
        "x = 1 2",
        "if x y: pass",
    ];
    for src in cases {
        assert!(parse(src).is_err(), "{src}");
    }
}

#[test]
fn errors_point_at_the_offending_token() {
    let err = parse("self.add(Circle()) self.wait(1)").unwrap_err();
    assert_eq!(err.at, Location { line: 1, column: 20 });
    assert_eq!(err.message, "invalid syntax: unexpected 'self'");

    let err = parse("f(a b)").unwrap_err();
    assert_eq!(err.at, Location { line: 1, column: 5 });
    assert_eq!(err.message, "invalid syntax: expected ',' or ')', found 'b'");

    let err = parse("x = 1 +").unwrap_err();
    assert_eq!(err.message, "invalid syntax: statement ends too early");
}

#[test]
fn header_colon_skips_brackets_and_lambdas() {
    let toks = line("if f(lambda x: x)[1:2] and (lambda: 0)(): pass");
    let colon = header_colon(&toks, 0).unwrap();
    assert!(toks[colon].is_op(":"));
    assert!(toks[colon + 1].is_name("pass"));

    let toks = line("with lambda: ctx:");
    assert_eq!(header_colon(&toks, 0), Some(toks.len() - 1));
}
