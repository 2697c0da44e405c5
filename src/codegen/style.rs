use crate::codegen::presets;

/// Style parameters shared by every generator. Part of the code synthesis cache key.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct StyleParams {
    /// Manim color constant (`"RED"`) or `#rrggbb`. `None` lets the prompt decide.
    pub color: Option<String>,
    /// Manim rate function name.
    pub easing: String,
    /// Default `run_time` of the main animation in seconds.
    pub run_time: f64,
}

impl Default for StyleParams {
    fn default() -> Self {
        Self {
            color: None,
            easing: "smooth".to_owned(),
            run_time: 2.0,
        }
    }
}

impl StyleParams {
    /// Ordered `(field, value)` pairs hashed into cache keys.
    pub fn cache_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("color", self.color.clone().unwrap_or_default()),
            ("easing", self.easing.clone()),
            ("run_time", self.run_time.to_string()),
        ]
    }

    /// Color override as a Python expression, if it names a usable color.
    pub fn color_expr(&self) -> Option<String> {
        self.color.as_deref().and_then(presets::color_expr)
    }

    /// Rate function name; unknown names fall back to `smooth`.
    pub fn rate_func(&self) -> &str {
        if presets::EASINGS.contains(&self.easing.as_str()) {
            &self.easing
        } else {
            "smooth"
        }
    }

    /// Main animation duration; non-finite or non-positive values fall back to 1 s.
    pub fn run_time_secs(&self) -> f64 {
        if self.run_time.is_finite() && self.run_time > 0.0 {
            self.run_time
        } else {
            1.0
        }
    }

    /// One-line description passed to LLM backends.
    pub fn describe(&self) -> String {
        let mut parts = vec![
            format!("rate_func={}", self.rate_func()),
            format!("run_time={}", presets::py_num(self.run_time_secs())),
        ];
        if let Some(c) = self.color_expr() {
            parts.push(format!("color={c}"));
        }
        parts.join(", ")
    }
}
