//! Deterministic template generator used as the last step of the fallback chain.
//!
//! Output depends only on `(prompt, visual_type, style)` plus the data table when one is given.
//! Prompt text never reaches the generated code except inside the leading comment.

use crate::codegen::data::{DataTable, MAX_EMBEDDED_ROWS};
use crate::codegen::presets::{self, DEFAULT_COLOR, SHAPES, py_float, py_num, py_str, words};
use crate::codegen::style::StyleParams;
use crate::foundation::core::collapse_whitespace;
use crate::scene::model::VisualType;
use regex::Regex;

/// Resolve [`VisualType::Auto`] with keyword heuristics over the prompt.
pub fn infer_visual_type(prompt: &str) -> VisualType {
    let w: Vec<String> = words(prompt).collect();
    let any = |stems: &[&str]| w.iter().any(|x| stems.iter().any(|s| x.starts_with(s)));
    if any(&["vector", "field", "flow", "stream", "vortex"]) {
        VisualType::VectorField
    } else if any(&["3d", "scatter", "cloud", "cluster"]) {
        VisualType::Scatter3d
    } else if any(&["graph", "network", "node", "edge", "tree"]) {
        VisualType::Graph
    } else if any(&["chart", "plot", "series", "trend", "curve", "stock", "timeline"]) {
        VisualType::TimeSeries
    } else if any(&["particle", "swarm", "dust", "spark", "firework", "snow", "rain"]) {
        VisualType::Particles
    } else {
        VisualType::Custom
    }
}

/// Produce a fragment for `(prompt, visual_type, style)`.
pub fn rule_based(prompt: &str, visual_type: VisualType, style: &StyleParams) -> String {
    rule_based_with_data(prompt, visual_type, style, None)
}

/// [`rule_based`], plotting `data` when the visual type has a data-driven form.
///
/// An `Auto` prompt that names no visual type is charted as a time series. Tables too narrow for
/// the resolved type fall back to the procedural template.
pub fn rule_based_with_data(
    prompt: &str,
    visual_type: VisualType,
    style: &StyleParams,
    data: Option<&DataTable>,
) -> String {
    let mut resolved = match visual_type {
        VisualType::Auto => infer_visual_type(prompt),
        other => other,
    };
    let ctx = Ctx::new(prompt, style);
    if let Some(table) = data {
        if visual_type == VisualType::Auto && resolved == VisualType::Custom {
            resolved = VisualType::TimeSeries;
        }
        if let Some(body) = data_body(resolved, &ctx, table) {
            return format!(
                "# {}: {} (data: {} rows x {} columns)\n{body}",
                resolved.as_str(),
                ctx.summary,
                table.len(),
                table.width()
            );
        }
        tracing::debug!(
            visual_type = %resolved,
            columns = table.width(),
            "data does not fit the visual type; using the procedural template"
        );
    }
    let body = match resolved {
        VisualType::VectorField => vector_field(&ctx),
        VisualType::TimeSeries => time_series(&ctx),
        VisualType::Scatter3d => scatter3d(&ctx),
        VisualType::Graph => graph(&ctx),
        VisualType::Particles => particles(&ctx),
        VisualType::Auto | VisualType::Custom => custom(&ctx),
    };
    format!("# {}: {}\n{body}", resolved.as_str(), ctx.summary)
}

struct Ctx {
    words: Vec<String>,
    summary: String,
    color: String,
    easing: String,
    run_time: String,
}

impl Ctx {
    fn new(prompt: &str, style: &StyleParams) -> Self {
        let color = style
            .color_expr()
            .or_else(|| presets::find_color(prompt).map(str::to_owned))
            .unwrap_or_else(|| DEFAULT_COLOR.to_owned());
        let mut summary = collapse_whitespace(prompt);
        if summary.is_empty() {
            summary = "untitled".to_owned();
        }
        if let Some((cut, _)) = summary.char_indices().nth(80) {
            summary.truncate(cut);
        }
        Self {
            words: words(prompt).collect(),
            summary,
            color,
            easing: style.rate_func().to_owned(),
            run_time: py_num(style.run_time_secs()),
        }
    }

    fn mentions(&self, stems: &[&str]) -> bool {
        self.words
            .iter()
            .any(|w| stems.iter().any(|s| w.starts_with(s)))
    }

    fn count_in(&self, lo: u32, hi: u32) -> Option<u32> {
        self.words
            .iter()
            .filter_map(|w| w.parse::<u32>().ok())
            .find(|n| (lo..=hi).contains(n))
    }

    fn play(&self, anim: &str) -> String {
        format!(
            "self.play({anim}, run_time={}, rate_func={})\n",
            self.run_time, self.easing
        )
    }
}

fn vector_field(ctx: &Ctx) -> String {
    let func = if ctx.mentions(&["source", "outward", "diverg", "explod"]) {
        "lambda p: p * 0.4"
    } else if ctx.mentions(&["sink", "inward", "converg", "drain"]) {
        "lambda p: -p * 0.4"
    } else if ctx.mentions(&["wave", "ripple"]) {
        "lambda p: np.array([1, np.sin(p[0]), 0]) * 0.5"
    } else {
        "lambda p: np.array([-p[1], p[0], 0]) * 0.4"
    };
    if ctx.mentions(&["stream", "flow", "current"]) {
        return format!(
            "stream = StreamLines({func}, stroke_width=2, max_anchors_per_line=30, color={color})\n\
             self.add(stream)\n\
             stream.start_animation(warm_up=False, flow_speed=1.5)\n\
             self.wait({rt})\n",
            color = ctx.color,
            rt = ctx.run_time,
        );
    }
    format!(
        "field = ArrowVectorField({func}, x_range=[-7, 7, 1], y_range=[-4, 4, 1])\n\
         field.set_color({color})\n{play}",
        color = ctx.color,
        play = ctx.play("Create(field)"),
    )
}

fn time_series(ctx: &Ctx) -> String {
    let func = if ctx.mentions(&["grow", "exponential", "ris", "increas", "boom"]) {
        "0.2 * np.exp(0.25 * x) - 1.5"
    } else if ctx.mentions(&["decay", "fall", "declin", "decreas", "drop"]) {
        "1.8 * np.exp(-0.4 * x)"
    } else if ctx.mentions(&["linear", "trend", "steady"]) {
        "0.3 * x - 1.5"
    } else {
        "np.sin(x)"
    };
    format!(
        "axes = Axes(x_range=[0, 10, 1], y_range=[-2, 2, 1], x_length=10, y_length=5)\n\
         curve = axes.plot(lambda x: {func}, x_range=[0, 10], color={color})\n\
         self.play(Create(axes))\n{play}",
        color = ctx.color,
        play = ctx.play("Create(curve)"),
    )
}

fn scatter3d(ctx: &Ctx) -> String {
    let n = ctx.count_in(5, 400).unwrap_or(40);
    format!(
        "self.set_camera_orientation(phi=65 * DEGREES, theta=30 * DEGREES)\n\
         axes = ThreeDAxes(x_range=[-3, 3, 1], y_range=[-3, 3, 1], z_range=[-3, 3, 1])\n\
         rng = np.random.default_rng(7)\n\
         points = VGroup(*[Dot3D(point=axes.c2p(*xyz), radius=0.06, color={color}) \
         for xyz in rng.uniform(-3, 3, size=({n}, 3))])\n\
         self.play(Create(axes))\n{play}\
         self.begin_ambient_camera_rotation(rate=0.15)\n\
         self.wait({rt})\n\
         self.stop_ambient_camera_rotation()\n",
        color = ctx.color,
        play = ctx.play("FadeIn(points)"),
        rt = ctx.run_time,
    )
}

fn graph(ctx: &Ctx) -> String {
    let n = ctx.count_in(3, 30).unwrap_or(8);
    let layout = if ctx.mentions(&["spring", "network", "web", "social"]) {
        "layout=\"spring\", layout_config={\"seed\": 7}"
    } else {
        "layout=\"circular\""
    };
    format!(
        "vertices = list(range({n}))\n\
         edges = [(i, (i + 1) % {n}) for i in vertices] + [(0, {half})]\n\
         graph = Graph(vertices, edges, {layout}, \
         vertex_config={{\"radius\": 0.2, \"color\": {color}}}, edge_config={{\"color\": GRAY}})\n{play}",
        half = n / 2,
        color = ctx.color,
        play = ctx.play("Create(graph)"),
    )
}

fn particle_motion(ctx: &Ctx) -> &'static str {
    if ctx.mentions(&["ris", "float", "rise", "up", "bubbl"]) {
        "group.shift(UP * 0.4 * dt)"
    } else if ctx.mentions(&["fall", "rain", "snow", "down", "drop"]) {
        "group.shift(DOWN * 0.4 * dt)"
    } else if ctx.mentions(&["explod", "burst", "firework", "expand"]) {
        "group.scale(1 + 0.3 * dt)"
    } else {
        "group.rotate(0.3 * dt)"
    }
}

fn particles(ctx: &Ctx) -> String {
    let n = ctx.count_in(10, 500).unwrap_or(120);
    let motion = particle_motion(ctx);
    format!(
        "rng = np.random.default_rng(11)\n\
         particles = VGroup(*[Dot(point=[x, y, 0], radius=0.05, color={color}) \
         for x, y in rng.uniform([-6, -3.5], [6, 3.5], size=({n}, 2))])\n\
         particles.add_updater(lambda group, dt: {motion})\n\
         self.add(particles)\n\
         self.wait({rt})\n\
         particles.clear_updaters()\n",
        color = ctx.color,
        rt = ctx.run_time,
    )
}

fn custom(ctx: &Ctx) -> String {
    let shape = SHAPES
        .iter()
        .find(|&&(kw, _)| {
            ctx.words
                .iter()
                .any(|w| w == kw || w.strip_suffix('s') == Some(kw))
        })
        .map_or(SHAPES[0].1, |&(_, tpl)| tpl);
    let mut out = format!("obj = {}\n", shape.replace("{color}", &ctx.color));

    let placement = if ctx.mentions(&["left"]) && !ctx.mentions(&["mov", "shift", "slid"]) {
        "obj.to_edge(LEFT)"
    } else if ctx.mentions(&["right"]) && !ctx.mentions(&["mov", "shift", "slid"]) {
        "obj.to_edge(RIGHT)"
    } else if ctx.mentions(&["top"]) {
        "obj.to_edge(UP)"
    } else if ctx.mentions(&["bottom"]) {
        "obj.to_edge(DOWN)"
    } else {
        "obj.move_to(ORIGIN)"
    };
    out.push_str(placement);
    out.push('\n');

    let mut actions = Vec::new();
    if ctx.mentions(&["rotat", "spin", "turn", "twirl"]) {
        actions.push("Rotate(obj, angle=PI)".to_owned());
    }
    if ctx.mentions(&["grow", "scal", "bigger", "expand"]) {
        actions.push("obj.animate.scale(1.5)".to_owned());
    }
    if ctx.mentions(&["shrink", "smaller"]) {
        actions.push("obj.animate.scale(0.5)".to_owned());
    }
    if ctx.mentions(&["mov", "shift", "slid"]) {
        let dir = if ctx.mentions(&["left"]) {
            "LEFT"
        } else if ctx.mentions(&["up"]) {
            "UP"
        } else if ctx.mentions(&["down"]) {
            "DOWN"
        } else {
            "RIGHT"
        };
        actions.push(format!("obj.animate.shift({dir} * 2)"));
    }
    if ctx.mentions(&["puls", "beat", "throb"]) {
        actions.push("obj.animate.scale(1.2)".to_owned());
        actions.push("obj.animate.scale(1 / 1.2)".to_owned());
    }

    let intro = if ctx.mentions(&["fad", "appear"]) {
        "FadeIn(obj)"
    } else {
        "Create(obj)"
    };
    if actions.is_empty() {
        out.push_str(&ctx.play(intro));
    } else {
        out.push_str(&format!("self.play({intro})\n"));
        for a in &actions {
            out.push_str(&ctx.play(a));
        }
    }
    if ctx.mentions(&["disappear", "vanish"]) {
        out.push_str("self.play(FadeOut(obj))\n");
    }
    out
}

const SERIES_COLORS: &[&str] = &["BLUE", "GREEN", "ORANGE", "PURPLE", "TEAL"];
const MAX_SERIES: usize = 5;
const MAX_GRAPH_EDGES: usize = 200;
const FRAME_X: f64 = 6.0;
const FRAME_Y: f64 = 3.5;
/// Longest arrow drawn for data vector fields, in scene units.
const MAX_ARROW: f64 = 0.8;

fn data_body(visual_type: VisualType, ctx: &Ctx, table: &DataTable) -> Option<String> {
    match visual_type {
        VisualType::TimeSeries => Some(series_from_data(ctx, table)),
        VisualType::Scatter3d if table.width() >= 2 => Some(scatter_from_data(ctx, table)),
        VisualType::Graph if table.width() >= 2 => graph_from_data(ctx, table),
        VisualType::Particles if table.width() >= 2 => Some(particles_from_data(ctx, table)),
        VisualType::VectorField if table.width() >= 4 => vector_field_from_data(ctx, table),
        _ => None,
    }
}

/// One line per series; the first column is x unless the table has a single column.
fn series_from_data(ctx: &Ctx, table: &DataTable) -> String {
    let mut rows = table.sample(MAX_EMBEDDED_ROWS);
    let (xs, series): (Vec<f64>, Vec<(usize, Vec<f64>)>) = if table.width() == 1 {
        let xs = (0..rows.len()).map(|i| i as f64).collect();
        (xs, vec![(0, rows.iter().map(|r| r[0]).collect())])
    } else {
        rows.sort_by(|a, b| a[0].total_cmp(&b[0]));
        let xs = rows.iter().map(|r| r[0]).collect();
        let series = (1..table.width().min(MAX_SERIES + 1))
            .map(|c| (c, rows.iter().map(|r| r[c]).collect()))
            .collect();
        (xs, series)
    };
    let all_y: Vec<f64> = series.iter().flat_map(|(_, ys)| ys.iter().copied()).collect();

    let x_label = if table.width() == 1 { "index" } else { table.columns()[0].as_str() };
    let y_label = if series.len() == 1 {
        table.columns()[series[0].0].as_str()
    } else {
        "value"
    };
    let mut out = format!(
        "axes = Axes(x_range={}, y_range={}, x_length=10, y_length=5)\n\
         labels = axes.get_axis_labels(x_label=Text({}, font_size=24), y_label=Text({}, font_size=24))\n\
         x_values = {}\n\
         series = VGroup()\n",
        axis_range(&xs),
        axis_range(&all_y),
        py_str(x_label),
        py_str(y_label),
        py_list(&xs),
    );
    for (i, (_, ys)) in series.iter().enumerate() {
        let color = if i == 0 {
            ctx.color.as_str()
        } else {
            SERIES_COLORS[(i - 1) % SERIES_COLORS.len()]
        };
        out.push_str(&format!(
            "series.add(axes.plot_line_graph(x_values=x_values, y_values={}, line_color={color}, add_vertex_dots=False))\n",
            py_list(ys)
        ));
    }
    out.push_str("self.play(Create(axes), FadeIn(labels))\n");
    out.push_str(&ctx.play("Create(series)"));
    out
}

/// Columns x, y and optionally z.
fn scatter_from_data(ctx: &Ctx, table: &DataTable) -> String {
    let rows = table.sample(MAX_EMBEDDED_ROWS);
    let pick = |c: usize| -> Vec<f64> {
        rows.iter().map(|r| r.get(c).copied().unwrap_or(0.0)).collect()
    };
    let (xs, ys, zs) = (pick(0), pick(1), pick(2));
    let points: Vec<String> = (0..rows.len())
        .map(|i| format!("[{}, {}, {}]", py_float(xs[i]), py_float(ys[i]), py_float(zs[i])))
        .collect();
    format!(
        "self.set_camera_orientation(phi=65 * DEGREES, theta=30 * DEGREES)\n\
         axes = ThreeDAxes(x_range={}, y_range={}, z_range={})\n\
         data = [{}]\n\
         points = VGroup(*[Dot3D(point=axes.c2p(*xyz), radius=0.06, color={color}) for xyz in data])\n\
         self.play(Create(axes))\n{play}\
         self.begin_ambient_camera_rotation(rate=0.15)\n\
         self.wait({rt})\n\
         self.stop_ambient_camera_rotation()\n",
        axis_range(&xs),
        axis_range(&ys),
        axis_range(&zs),
        points.join(", "),
        color = ctx.color,
        play = ctx.play("FadeIn(points)"),
        rt = ctx.run_time,
    )
}

/// Edge list from the first two columns. Ids must be non-negative integers.
fn graph_from_data(ctx: &Ctx, table: &DataTable) -> Option<String> {
    let id = |v: f64| (v >= 0.0 && v.fract() == 0.0 && v < 1e9).then_some(v as u64);
    let mut edges: Vec<(u64, u64)> = Vec::new();
    for row in table.rows() {
        let (a, b) = (id(row[0])?, id(row[1])?);
        let edge = (a.min(b), a.max(b));
        if a != b && !edges.contains(&edge) {
            edges.push(edge);
            if edges.len() == MAX_GRAPH_EDGES {
                break;
            }
        }
    }
    if edges.is_empty() {
        return None;
    }
    let mut vertices: Vec<u64> = edges.iter().flat_map(|&(a, b)| [a, b]).collect();
    vertices.sort_unstable();
    vertices.dedup();

    let vertex_list: Vec<String> = vertices.iter().map(u64::to_string).collect();
    let edge_list: Vec<String> = edges.iter().map(|(a, b)| format!("({a}, {b})")).collect();
    let layout = if vertices.len() > 12 || ctx.mentions(&["spring", "network", "web", "social"]) {
        "layout=\"spring\", layout_config={\"seed\": 7}"
    } else {
        "layout=\"circular\""
    };
    Some(format!(
        "vertices = [{}]\n\
         edges = [{}]\n\
         graph = Graph(vertices, edges, {layout}, \
         vertex_config={{\"radius\": 0.2, \"color\": {color}}}, edge_config={{\"color\": GRAY}})\n{play}",
        vertex_list.join(", "),
        edge_list.join(", "),
        color = ctx.color,
        play = ctx.play("Create(graph)"),
    ))
}

/// Columns x and y, fitted to the frame.
fn particles_from_data(ctx: &Ctx, table: &DataTable) -> String {
    let rows = table.sample(MAX_EMBEDDED_ROWS);
    let xs: Vec<f64> = rows.iter().map(|r| r[0]).collect();
    let ys: Vec<f64> = rows.iter().map(|r| r[1]).collect();
    let (fx, fy) = (Fit::new(&xs, FRAME_X), Fit::new(&ys, FRAME_Y));
    let positions: Vec<String> = xs
        .iter()
        .zip(&ys)
        .map(|(&x, &y)| format!("[{}, {}]", py_num(fx.apply(x)), py_num(fy.apply(y))))
        .collect();
    format!(
        "positions = [{}]\n\
         particles = VGroup(*[Dot(point=[x, y, 0], radius=0.05, color={color}) for x, y in positions])\n\
         particles.add_updater(lambda group, dt: {motion})\n\
         self.add(particles)\n\
         self.wait({rt})\n\
         particles.clear_updaters()\n",
        positions.join(", "),
        color = ctx.color,
        motion = particle_motion(ctx),
        rt = ctx.run_time,
    )
}

/// Columns x, y, u, v: one arrow per row, scaled so the longest is [`MAX_ARROW`].
fn vector_field_from_data(ctx: &Ctx, table: &DataTable) -> Option<String> {
    let rows: Vec<&[f64]> = table
        .sample(MAX_EMBEDDED_ROWS)
        .into_iter()
        .filter(|r| r[2].hypot(r[3]) > 1e-12)
        .collect();
    let longest = rows.iter().map(|r| r[2].hypot(r[3])).fold(0.0, f64::max);
    if rows.is_empty() || !longest.is_finite() {
        return None;
    }
    let xs: Vec<f64> = rows.iter().map(|r| r[0]).collect();
    let ys: Vec<f64> = rows.iter().map(|r| r[1]).collect();
    let (fx, fy) = (Fit::new(&xs, FRAME_X), Fit::new(&ys, FRAME_Y));
    let scale = MAX_ARROW / longest;
    let arrows: Vec<String> = rows
        .iter()
        .map(|r| {
            let (x, y) = (fx.apply(r[0]), fy.apply(r[1]));
            format!(
                "[{}, {}, {}, {}]",
                py_num(x),
                py_num(y),
                py_num(x + r[2] * scale),
                py_num(y + r[3] * scale)
            )
        })
        .collect();
    Some(format!(
        "arrows = [{}]\n\
         field = VGroup(*[Arrow(start=[a, b, 0], end=[c, d, 0], buff=0, color={color}) for a, b, c, d in arrows])\n{play}",
        arrows.join(", "),
        color = ctx.color,
        play = ctx.play("Create(field)"),
    ))
}

/// Linear map of a data range onto `[-half, half]`; a flat range maps to 0.
struct Fit {
    lo: f64,
    span: f64,
    half: f64,
}

impl Fit {
    fn new(values: &[f64], half: f64) -> Self {
        let lo = values.iter().copied().fold(f64::INFINITY, f64::min);
        let hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Self {
            lo,
            span: hi - lo,
            half,
        }
    }

    fn apply(&self, v: f64) -> f64 {
        if self.span.is_finite() && self.span > 1e-12 {
            (v - self.lo) / self.span * 2.0 * self.half - self.half
        } else {
            0.0
        }
    }
}

/// `[lo, hi, step]` covering `values`, widened by one on each side when flat.
fn axis_range(values: &[f64]) -> String {
    let mut lo = values.iter().copied().fold(f64::INFINITY, f64::min);
    let mut hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !(lo.is_finite() && hi.is_finite()) {
        (lo, hi) = (-1.0, 1.0);
    }
    if hi - lo <= f64::EPSILON * lo.abs().max(1.0) {
        lo -= 1.0;
        hi += 1.0;
    }
    format!("[{}, {}, {}]", py_float(lo), py_float(hi), py_float((hi - lo) / 5.0))
}

fn py_list(values: &[f64]) -> String {
    let items: Vec<String> = values.iter().map(|&v| py_float(v)).collect();
    format!("[{}]", items.join(", "))
}

/// Apply simple feedback rules to existing code: recolor, resize and retime.
///
/// Code that matches no rule is returned unchanged.
pub fn refine_with_rules(code: &str, feedback: &str) -> String {
    let fb: Vec<String> = words(feedback).collect();
    let said = |stems: &[&str]| fb.iter().any(|w| stems.iter().any(|s| w.starts_with(s)));
    let mut out = code.to_owned();

    if let Some(color) = presets::find_color(feedback)
        && let Ok(re) =
            Regex::new(r##"\b(color|fill_color|stroke_color)\s*=\s*(?:[A-Z][A-Z0-9_]*|"#[0-9a-fA-F]{6}")"##)
    {
        out = re
            .replace_all(&out, |caps: &regex::Captures<'_>| format!("{}={color}", &caps[1]))
            .into_owned();
    }

    let size = if said(&["bigger", "larger", "enlarg"]) {
        Some(1.5)
    } else if said(&["smaller", "tinier", "shrink"]) {
        Some(0.7)
    } else {
        None
    };
    if let Some(f) = size {
        out = scale_numbers(&out, "radius|side_length|width|height|outer_radius|inner_radius", f);
    }

    let pace = if said(&["faster", "quicker", "speed"]) {
        Some(0.5)
    } else if said(&["slower", "slowly"]) {
        Some(2.0)
    } else {
        None
    };
    if let Some(f) = pace {
        out = scale_numbers(&out, "run_time", f);
    }
    out
}

fn scale_numbers(code: &str, params: &str, factor: f64) -> String {
    let Ok(re) = Regex::new(&format!(r"\b({params})\s*=\s*(\d+(?:\.\d+)?)")) else {
        return code.to_owned();
    };
    re.replace_all(code, |caps: &regex::Captures<'_>| {
        let v: f64 = caps[2].parse().unwrap_or(1.0);
        format!("{}={}", &caps[1], py_num(v * factor))
    })
    .into_owned()
}

#[cfg(test)]
#[path = "../../tests/unit/codegen/templates.rs"]
mod tests;
