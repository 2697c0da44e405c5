use std::fmt::Write as _;

/// Manim color constants.
pub const MANIM_COLORS: &[&str] = &[
    "WHITE", "BLACK", "RED", "GREEN", "BLUE", "YELLOW", "ORANGE", "PURPLE", "PINK", "GRAY", "GREY",
    "BROWN", "TEAL", "MAROON", "GOLD", "RED_A", "RED_B", "RED_C", "RED_D", "RED_E", "BLUE_A",
    "BLUE_B", "BLUE_C", "BLUE_D", "BLUE_E", "GREEN_A", "GREEN_B", "GREEN_C", "GREEN_D", "GREEN_E",
    "YELLOW_A", "YELLOW_B", "YELLOW_C", "YELLOW_D", "YELLOW_E", "PURPLE_A", "PURPLE_B", "PURPLE_C",
    "PURPLE_D", "PURPLE_E", "GRAY_A", "GRAY_B", "GRAY_C", "GRAY_D", "GRAY_E", "TEAL_A", "TEAL_B",
    "TEAL_C", "TEAL_D", "TEAL_E", "GOLD_A", "GOLD_B", "GOLD_C", "GOLD_D", "GOLD_E",
];

/// Manim rate functions accepted as easing.
pub const EASINGS: &[&str] = &[
    "linear",
    "smooth",
    "rush_into",
    "rush_from",
    "slow_into",
    "double_smooth",
    "there_and_back",
    "there_and_back_with_pause",
    "running_start",
    "not_quite_there",
    "wiggle",
    "lingering",
    "exponential_decay",
    "ease_in_sine",
    "ease_out_sine",
    "ease_in_out_sine",
    "ease_in_out_cubic",
    "ease_out_bounce",
    "ease_in_out_elastic",
];

/// Constructors for shapes recognized in prompts, by keyword.
///
/// `{color}` is substituted with a color expression.
pub const SHAPES: &[(&str, &str)] = &[
    ("circle", "Circle(radius=1, color={color})"),
    ("square", "Square(side_length=2, color={color})"),
    ("rectangle", "Rectangle(width=4, height=2, color={color})"),
    ("triangle", "Triangle(color={color})"),
    ("star", "Star(n=5, outer_radius=1, inner_radius=0.5, color={color})"),
    ("hexagon", "RegularPolygon(n=6, radius=1, color={color})"),
    ("polygon", "RegularPolygon(n=6, radius=1, color={color})"),
    ("ellipse", "Ellipse(width=4, height=2, color={color})"),
    ("arrow", "Arrow(start=LEFT * 2, end=RIGHT * 2, color={color})"),
    ("line", "Line(start=LEFT * 2, end=RIGHT * 2, color={color})"),
    ("dot", "Dot(radius=0.2, color={color})"),
    ("sphere", "Sphere(radius=1).set_color({color})"),
    ("cube", "Cube(side_length=2, fill_color={color})"),
];

/// Color used when neither the style nor the prompt names one.
pub const DEFAULT_COLOR: &str = "BLUE";

/// Python expression for a color name or `#rrggbb` value.
pub fn color_expr(raw: &str) -> Option<String> {
    let s = raw.trim();
    if let Some(hex) = s.strip_prefix('#')
        && hex.len() == 6
        && hex.bytes().all(|b| b.is_ascii_hexdigit())
    {
        return Some(format!("\"#{}\"", hex.to_ascii_lowercase()));
    }
    let upper = s.to_ascii_uppercase();
    MANIM_COLORS
        .iter()
        .find(|c| **c == upper)
        .map(|c| (*c).to_owned())
}

/// First Manim color named in `text`, matched on whole words.
pub fn find_color(text: &str) -> Option<&'static str> {
    words(text).find_map(|w| {
        let upper = w.to_ascii_uppercase();
        MANIM_COLORS.iter().copied().find(|c| *c == upper)
    })
}

/// Lowercased words of `text` (letters, digits and `_`).
pub fn words(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
}

/// Format a number as a Python literal, rounded to three decimals.
pub fn py_num(v: f64) -> String {
    let r = (v * 1000.0).round() / 1000.0;
    if r.fract() == 0.0 {
        format!("{r:.1}")
    } else {
        format!("{r}")
    }
}

/// Python float literal keeping full precision.
pub fn py_float(v: f64) -> String {
    format!("{v:?}")
}

/// Double-quoted Python string literal holding `s`.
pub fn py_str(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                let _ = write!(out, "\\u{:04x}", u32::from(c));
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
#[path = "../../tests/unit/codegen/presets.rs"]
mod tests;
