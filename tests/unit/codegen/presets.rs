use super::*;

#[test]
fn color_expr_accepts_names_and_hex_only() {
    assert_eq!(color_expr("red").as_deref(), Some("RED"));
    assert_eq!(color_expr(" Blue_C ").as_deref(), Some("BLUE_C"));
    assert_eq!(color_expr("#FFaa00").as_deref(), Some("\"#ffaa00\""));
    assert_eq!(color_expr("#ffaa0"), None);
    assert_eq!(color_expr("RED); import os; ("), None);
}

#[test]
fn find_color_matches_whole_words() {
    assert_eq!(find_color("a red square spinning"), Some("RED"));
    assert_eq!(find_color("reduced noise"), None);
    assert_eq!(find_color("Gold and teal"), Some("GOLD"));
}

#[test]
fn py_num_is_a_python_float_literal() {
    assert_eq!(py_num(2.0), "2.0");
    assert_eq!(py_num(1.5), "1.5");
    assert_eq!(py_num(3.0 * 0.7), "2.1");
    assert_eq!(py_num(0.12345), "0.123");
}

#[test]
fn every_shape_template_has_a_color_slot() {
    for (name, tpl) in SHAPES {
        assert!(tpl.contains("{color}"), "{name}");
    }
}

#[test]
fn py_str_escapes_quotes_and_control_characters() {
    assert_eq!(py_str("hello"), r#""hello""#);
    assert_eq!(py_str(r#"say "hi""#), r#""say \"hi\"""#);
    assert_eq!(py_str("a\\b\nc"), r#""a\\b\nc""#);
    assert_eq!(py_str("bell\u{7}"), r#""bell\u0007""#);
}

#[test]
fn py_float_keeps_precision() {
    assert_eq!(py_float(2.0), "2.0");
    assert_eq!(py_float(0.00012), "0.00012");
    assert_eq!(py_float(-3.25), "-3.25");
}
