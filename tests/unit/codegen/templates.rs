use super::*;
use crate::codegen::validate::CodeValidator;

fn assert_clean(code: &str) {
    let v = CodeValidator::new().check(code);
    assert!(v.is_valid(), "{v}\n---\n{code}");
    assert!(v.warnings().is_empty(), "{:?}\n---\n{code}", v.warnings());
}

#[test]
fn every_visual_type_yields_valid_code() {
    let prompts = [
        "a swirling vector field",
        "stream lines flowing outward from a source",
        "stock price trend rising over the year",
        "exponential decay curve",
        "3d scatter of 100 points",
        "a social network of 12 nodes",
        "snow particles falling",
        "a red square rotating and moving left",
        "",
        "   ",
        "{weird} \"quoted\" 'prompt' with \\ backslash",
    ];
    let types = [
        VisualType::Auto,
        VisualType::VectorField,
        VisualType::TimeSeries,
        VisualType::Scatter3d,
        VisualType::Graph,
        VisualType::Particles,
        VisualType::Custom,
    ];
    let styles = [
        StyleParams::default(),
        StyleParams {
            color: Some("#FF8800".to_owned()),
            easing: "bogus".to_owned(),
            run_time: -1.0,
        },
    ];
    for p in prompts {
        for vt in types {
            for style in &styles {
                assert_clean(&rule_based(p, vt, style));
            }
        }
    }
}

#[test]
fn output_is_deterministic() {
    let s = StyleParams::default();
    assert_eq!(
        rule_based("blue circle that pulses", VisualType::Auto, &s),
        rule_based("blue circle that pulses", VisualType::Auto, &s)
    );
}

#[test]
fn auto_is_resolved_by_keywords() {
    assert_eq!(infer_visual_type("magnetic field lines"), VisualType::VectorField);
    assert_eq!(infer_visual_type("Plot the revenue"), VisualType::TimeSeries);
    assert_eq!(infer_visual_type("3D point cloud"), VisualType::Scatter3d);
    assert_eq!(infer_visual_type("a tree of nodes"), VisualType::Graph);
    assert_eq!(infer_visual_type("sparkles everywhere"), VisualType::Particles);
    assert_eq!(infer_visual_type("a lonely triangle"), VisualType::Custom);

    let code = rule_based("3D point cloud", VisualType::Auto, &StyleParams::default());
    assert!(code.starts_with("# scatter3d: 3D point cloud\n"), "{code}");
}

#[test]
fn custom_picks_shape_color_and_actions() {
    let code = rule_based(
        "A red   triangle that rotates",
        VisualType::Custom,
        &StyleParams::default(),
    );
    assert!(code.starts_with("# custom: A red triangle that rotates\n"));
    assert!(code.contains("Triangle(color=RED)"), "{code}");
    assert!(code.contains("Rotate(obj, angle=PI)"), "{code}");
    assert!(code.contains("rate_func=smooth"), "{code}");
}

#[test]
fn style_color_overrides_prompt_color() {
    let style = StyleParams {
        color: Some("green".to_owned()),
        ..StyleParams::default()
    };
    let code = rule_based("a red circle", VisualType::Custom, &style);
    assert!(code.contains("Circle(radius=1, color=GREEN)"), "{code}");
    assert!(!code.contains("RED"));
}

#[test]
fn prompt_text_only_reaches_the_comment() {
    let code = rule_based(
        "circle\nself.play(FadeOut(everything))",
        VisualType::Custom,
        &StyleParams::default(),
    );
    assert_eq!(code.matches("FadeOut(everything)").count(), 1);
    assert!(code.lines().next().is_some_and(|l| l.starts_with('#')));
}

#[test]
fn long_prompts_are_truncated_in_the_comment() {
    let prompt = "word ".repeat(40);
    let code = rule_based(&prompt, VisualType::Custom, &StyleParams::default());
    let first = code.lines().next().unwrap_or_default();
    assert_eq!(first.len(), "# custom: ".len() + 80);
}

#[test]
fn refine_recolors_resizes_and_retimes() {
    let code = "obj = Circle(radius=1, color=BLUE)\nself.play(Create(obj), run_time=2.0, rate_func=smooth)\n";

    let red = refine_with_rules(code, "make it red");
    assert!(red.contains("color=RED"), "{red}");
    assert!(!red.contains("BLUE"));

    let big = refine_with_rules(code, "bigger please");
    assert!(big.contains("radius=1.5"), "{big}");

    let fast = refine_with_rules(code, "Faster!");
    assert!(fast.contains("run_time=1.0"), "{fast}");

    let slow_small = refine_with_rules(code, "smaller and slower");
    assert!(slow_small.contains("radius=0.7"), "{slow_small}");
    assert!(slow_small.contains("run_time=4.0"), "{slow_small}");

    assert_eq!(refine_with_rules(code, "looks great"), code);
}

#[test]
fn refine_keeps_generated_code_valid() {
    let style = StyleParams::default();
    for vt in [VisualType::Custom, VisualType::Graph, VisualType::TimeSeries] {
        let code = rule_based("a blue star", vt, &style);
        assert_clean(&refine_with_rules(&code, "yellow, bigger and faster"));
    }
}

fn table(columns: &[&str], rows: &[&[f64]]) -> DataTable {
    DataTable::new(
        columns.iter().map(|c| (*c).to_owned()).collect(),
        rows.iter().map(|r| r.to_vec()).collect(),
    )
    .unwrap()
}

#[test]
fn data_variants_yield_valid_code() {
    let tables = [
        table(&["value"], &[&[3.0], &[1.0], &[2.0]]),
        table(&["t", "price \"usd\""], &[&[0.0, 10.5], &[1.0, 11.0], &[2.0, 9.75]]),
        table(&["src", "dst", "w"], &[&[0.0, 1.0, 1.0], &[1.0, 2.0, 0.5], &[2.0, 0.0, 2.0]]),
        table(
            &["x", "y", "u", "v"],
            &[&[0.0, 0.0, 1.0, 0.0], &[1.0, 1.0, 0.0, 2.0], &[2.0, 2.0, 0.0, 0.0]],
        ),
        table(&["x", "y"], &[&[5.0, 5.0]]),
    ];
    let types = [
        VisualType::Auto,
        VisualType::VectorField,
        VisualType::TimeSeries,
        VisualType::Scatter3d,
        VisualType::Graph,
        VisualType::Particles,
        VisualType::Custom,
    ];
    for t in &tables {
        for vt in types {
            assert_clean(&rule_based_with_data("data", vt, &StyleParams::default(), Some(t)));
        }
    }
}

#[test]
fn time_series_plots_sorted_columns() {
    let t = table(&["t", "price"], &[&[2.0, 9.75], &[0.0, 10.5], &[1.0, 11.0]]);
    let code = rule_based_with_data("stock", VisualType::TimeSeries, &StyleParams::default(), Some(&t));
    assert!(code.starts_with("# time_series: stock (data: 3 rows x 2 columns)\n"), "{code}");
    assert!(code.contains("axes = Axes(x_range=[0.0, 2.0, 0.4], y_range=[9.75, 11.0, 0.25]"), "{code}");
    assert!(code.contains("x_values = [0.0, 1.0, 2.0]\n"), "{code}");
    assert!(code.contains("y_values=[10.5, 11.0, 9.75]"), "{code}");
    assert!(code.contains("Text(\"price\", font_size=24)"), "{code}");
    assert_eq!(code.matches("series.add(").count(), 1);
}

#[test]
fn auto_prompts_with_data_become_charts() {
    let t = table(&["x", "a", "b"], &[&[0.0, 1.0, 2.0], &[1.0, 2.0, 3.0]]);
    let style = StyleParams::default();
    let code = rule_based_with_data("the quarter", VisualType::Auto, &style, Some(&t));
    assert!(code.starts_with("# time_series:"), "{code}");
    assert_eq!(code.matches("series.add(").count(), 2);

    let custom = rule_based_with_data("the quarter", VisualType::Custom, &style, Some(&t));
    assert_eq!(custom, rule_based("the quarter", VisualType::Custom, &style));
    assert_eq!(
        rule_based_with_data("the quarter", VisualType::Auto, &style, None),
        rule_based("the quarter", VisualType::Auto, &style)
    );
}

#[test]
fn graph_edges_come_from_the_first_two_columns() {
    let t = table(
        &["from", "to"],
        &[&[0.0, 1.0], &[1.0, 2.0], &[2.0, 0.0], &[1.0, 0.0], &[3.0, 3.0]],
    );
    let code = rule_based_with_data("links", VisualType::Graph, &StyleParams::default(), Some(&t));
    assert!(code.contains("vertices = [0, 1, 2]\n"), "{code}");
    assert!(code.contains("edges = [(0, 1), (1, 2), (0, 2)]\n"), "{code}");

    let fractional = table(&["from", "to"], &[&[0.5, 1.0]]);
    let code =
        rule_based_with_data("links", VisualType::Graph, &StyleParams::default(), Some(&fractional));
    assert!(code.contains("vertices = list(range("), "{code}");
}

#[test]
fn vector_field_arrows_are_fitted_and_scaled() {
    let t = table(&["x", "y", "u", "v"], &[&[0.0, 0.0, 1.0, 0.0], &[1.0, 1.0, 0.0, 2.0]]);
    let code =
        rule_based_with_data("wind", VisualType::VectorField, &StyleParams::default(), Some(&t));
    assert!(code.contains("arrows = [[-6.0, -3.5, -5.6, -3.5], [6.0, 3.5, 6.0, 4.3]]\n"), "{code}");

    let narrow = table(&["x", "y"], &[&[0.0, 0.0]]);
    let code =
        rule_based_with_data("wind", VisualType::VectorField, &StyleParams::default(), Some(&narrow));
    assert!(code.contains("ArrowVectorField("), "{code}");
}
