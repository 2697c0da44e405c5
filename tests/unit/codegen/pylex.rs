use super::*;

fn kinds(src: &str) -> Vec<TokenKind> {
    lex(src).unwrap().into_iter().map(|t| t.kind).collect()
}

fn name(s: &str) -> TokenKind {
    TokenKind::Name(s.to_owned())
}

#[test]
fn simple_statement() {
    assert_eq!(
        kinds("x = f(1, 'a')\n"),
        vec![
            name("x"),
            TokenKind::Op("="),
            name("f"),
            TokenKind::Open('('),
            TokenKind::Number,
            TokenKind::Op(","),
            TokenKind::Str,
            TokenKind::Close(')'),
            TokenKind::Newline,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn indentation_produces_indent_and_dedent() {
    let k = kinds("if x:\n    y = 1\n\n    # note\nz = 2\n");
    assert_eq!(
        k,
        vec![
            name("if"),
            name("x"),
            TokenKind::Op(":"),
            TokenKind::Newline,
            TokenKind::Indent,
            name("y"),
            TokenKind::Op("="),
            TokenKind::Number,
            TokenKind::Newline,
            TokenKind::Dedent,
            name("z"),
            TokenKind::Op("="),
            TokenKind::Number,
            TokenKind::Newline,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn brackets_and_backslash_join_lines() {
    let k = kinds("a = (1,\n     2)\nb = 1 + \\\n    2\n");
    let newlines = k.iter().filter(|t| **t == TokenKind::Newline).count();
    assert_eq!(newlines, 2);
    assert!(!k.contains(&TokenKind::Indent));
}

#[test]
fn strings_with_prefixes_and_triple_quotes() {
    let k = kinds("s = rb'\\q'\nt = f\"{x}\"\nd = \"\"\"a\n'b'\n\"\"\"\n");
    assert_eq!(k.iter().filter(|t| **t == TokenKind::Str).count(), 3);
    assert!(!k.contains(&name("rb")));
}

#[test]
fn longest_operator_wins() {
    assert_eq!(
        kinds("a **= b // c ...")[..6],
        [
            name("a"),
            TokenKind::Op("**="),
            name("b"),
            TokenKind::Op("//"),
            name("c"),
            TokenKind::Op("..."),
        ]
    );
}

#[test]
fn numbers() {
    let k = kinds("1 0.5 .5 1e-3 0xff 1_000 2j");
    assert_eq!(k.iter().filter(|t| **t == TokenKind::Number).count(), 7);
    assert!(lex("1e+").is_err());
    assert!(lex("12abc").is_err());
}

#[test]
fn errors_carry_locations() {
    let e = lex("x = 'abc\n").unwrap_err();
    assert_eq!(e.at, Location { line: 1, column: 5 });
    assert!(e.message.contains("unterminated"));

    let e = lex("f(\n  [1, 2)\n").unwrap_err();
    assert_eq!(e.at, Location { line: 2, column: 8 });

    let e = lex("f(1,\n").unwrap_err();
    assert_eq!(e.at, Location { line: 1, column: 2 });
    assert!(e.message.contains("never closed"));

    let e = lex("if x:\n        a\n    b\n").unwrap_err();
    assert_eq!(e.at.line, 3);
    assert!(e.message.contains("unindent"));

    assert!(lex("x = 1 $ 2").is_err());
    assert!(lex("s = \"\"\"open").is_err());
}

#[test]
fn dedents_are_closed_at_eof() {
    let k = kinds("def f():\n    if x:\n        pass");
    let tail: Vec<_> = k.iter().rev().take(4).cloned().collect();
    assert_eq!(
        tail,
        vec![
            TokenKind::Eof,
            TokenKind::Dedent,
            TokenKind::Dedent,
            TokenKind::Newline
        ]
    );
}
