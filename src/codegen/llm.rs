use crate::codegen::data::DataTable;
use crate::codegen::style::StyleParams;
use crate::foundation::error::{ManimlineError, ManimlineResult};
use crate::scene::model::VisualType;
use regex::Regex;
use std::fmt;
use std::time::Duration;

/// Default environment variable holding the API key.
pub const DEFAULT_API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Settings for the chat-completions backend.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Use the backend at all. Without a key it stays off regardless.
    pub enabled: bool,
    /// API root, without the `/chat/completions` suffix.
    pub base_url: String,
    pub model: String,
    /// Whole-request timeout.
    pub timeout_ms: u64,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Environment variable the key is read from. Keys never live in config files.
    pub api_key_env: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "https://api.openai.com/v1".to_owned(),
            model: "gpt-4o-mini".to_owned(),
            timeout_ms: 20_000,
            temperature: 0.7,
            max_tokens: 500,
            api_key_env: DEFAULT_API_KEY_ENV.to_owned(),
        }
    }
}

/// One completion request.
#[derive(Clone, Debug, PartialEq)]
pub struct LlmRequest {
    pub system: String,
    pub user: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Wall-clock budget for the call, retries included. `None` leaves the client default.
    pub timeout: Option<Duration>,
}

/// Rows of a data table shown to the model.
const DATA_PREVIEW_ROWS: usize = 8;

impl LlmRequest {
    /// Append an excerpt of `table` and ask for its values to be written into the code.
    pub fn with_data(mut self, table: &DataTable) -> Self {
        self.user.push_str(&format!(
            "\nData (embed the values you plot as Python literals; no file access):\n{}",
            table.preview(DATA_PREVIEW_ROWS)
        ));
        self
    }
}

/// Failure of a single completion call.
#[derive(thiserror::Error, Clone, Debug, PartialEq, Eq)]
pub enum LlmError {
    #[error("request timed out after {0} ms")]
    Timeout(u64),
    #[error("backend unreachable: {0}")]
    Unreachable(String),
    /// Rate limiting or a server-side error; worth one retry.
    #[error("transient backend failure (status {status})")]
    Transient { status: u16 },
    #[error("backend rejected the request: {0}")]
    Fatal(String),
}

impl LlmError {
    /// Whether a retry may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }
}

/// Text completion service used by the synthesizer.
pub trait LlmBackend: Send + Sync + fmt::Debug {
    /// Short name for logs.
    fn name(&self) -> &str;

    /// Run one completion and return the raw assistant text.
    fn complete(&self, request: &LlmRequest) -> Result<String, LlmError>;
}

/// Secret that never shows up in `Debug` output.
#[derive(Clone)]
pub struct ApiKey(String);

impl ApiKey {
    /// Wrap a key taken from somewhere other than the environment.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Read a non-empty key from `var`.
    pub fn from_env(var: &str) -> Option<Self> {
        std::env::var(var)
            .ok()
            .map(|k| k.trim().to_owned())
            .filter(|k| !k.is_empty())
            .map(Self)
    }

    fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(<redacted>)")
    }
}

#[derive(serde::Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    max_tokens: u32,
}

#[derive(serde::Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(serde::Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(serde::Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(serde::Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

/// OpenAI-compatible `chat/completions` client over blocking HTTP.
#[derive(Debug)]
pub struct OpenAiBackend {
    client: reqwest::blocking::Client,
    endpoint: String,
    model: String,
    api_key: ApiKey,
    timeout_ms: u64,
}

impl OpenAiBackend {
    /// Client for the `chat/completions` endpoint under `base_url`. `timeout` bounds every request.
    pub fn new(
        base_url: &str,
        model: impl Into<String>,
        api_key: ApiKey,
        timeout: Duration,
    ) -> ManimlineResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("manimline/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(|e| ManimlineError::validation(format!("http client setup failed: {e}")))?;
        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            model: model.into(),
            api_key,
            timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        })
    }

    /// Backend described by `config`, or `None` when disabled or no key is set.
    pub fn from_config(config: &LlmConfig) -> ManimlineResult<Option<Self>> {
        if !config.enabled {
            return Ok(None);
        }
        let Some(key) = ApiKey::from_env(&config.api_key_env) else {
            tracing::info!(
                var = %config.api_key_env,
                "no API key in environment; LLM generation disabled"
            );
            return Ok(None);
        };
        Self::new(
            &config.base_url,
            config.model.clone(),
            key,
            Duration::from_millis(config.timeout_ms),
        )
        .map(Some)
    }

    fn map_send_error(&self, e: reqwest::Error, timeout_ms: u64) -> LlmError {
        if e.is_timeout() {
            LlmError::Timeout(timeout_ms)
        } else if e.is_connect() {
            LlmError::Unreachable(format!("cannot connect to {}", self.endpoint))
        } else {
            LlmError::Unreachable(e.without_url().to_string())
        }
    }
}

impl LlmBackend for OpenAiBackend {
    fn name(&self) -> &str {
        "openai"
    }

    fn complete(&self, request: &LlmRequest) -> Result<String, LlmError> {
        let body = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &request.system,
                },
                ChatMessage {
                    role: "user",
                    content: &request.user,
                },
            ],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };
        let mut builder = self
            .client
            .post(&self.endpoint)
            .bearer_auth(self.api_key.expose())
            .json(&body);
        let mut timeout_ms = self.timeout_ms;
        if let Some(t) = request.timeout {
            builder = builder.timeout(t);
            timeout_ms = u64::try_from(t.as_millis()).unwrap_or(u64::MAX);
        }
        let resp = builder
            .send()
            .map_err(|e| self.map_send_error(e, timeout_ms))?;

        let status = resp.status();
        if status.as_u16() == 429 || status.is_server_error() {
            return Err(LlmError::Transient {
                status: status.as_u16(),
            });
        }
        if !status.is_success() {
            return Err(LlmError::Fatal(format!("status {status}")));
        }
        let parsed: ChatResponse = resp.json().map_err(|e| {
            if e.is_timeout() {
                LlmError::Timeout(timeout_ms)
            } else {
                LlmError::Fatal("unparseable completion response".to_owned())
            }
        })?;
        parsed
            .choices
            .into_iter()
            .find_map(|c| c.message.content)
            .map(|c| c.trim().to_owned())
            .filter(|c| !c.is_empty())
            .ok_or_else(|| LlmError::Fatal("completion had no content".to_owned()))
    }
}

const GENERATE_SYSTEM: &str = "\
You are a Manim code generator. Write the body of a Scene.construct() method for the \
described animation.

Rules:
1. Output only the statements inside construct(); no imports, no class, no def construct.
2. Use Manim Community classes (Circle, Square, Text, Axes, VGroup, ...) and self.play / \
self.add / self.wait.
3. Do not wrap code in try/except.
4. Keep it short and focused on the described visual.

Example:
Prompt: A blue circle rotating in the center
Code:
circle = Circle(radius=1, color=BLUE)
self.play(Create(circle))
self.play(Rotate(circle, PI), run_time=2)";

const REFINE_SYSTEM: &str = "\
You are a Manim code refiner. Modify the given construct() body according to the feedback. \
Keep the structure, apply only the requested changes, and output only the code.";

/// Request asking for a new fragment.
pub fn generate_request(
    prompt: &str,
    visual_type: VisualType,
    style: &StyleParams,
    config: &LlmConfig,
) -> LlmRequest {
    let mut user = format!("Generate Manim code for: {}", prompt.trim());
    if visual_type != VisualType::Auto {
        user.push_str(&format!("\nVisualization type: {visual_type}"));
    }
    user.push_str(&format!("\nStyle: {}", style.describe()));
    LlmRequest {
        system: GENERATE_SYSTEM.to_owned(),
        user,
        temperature: config.temperature,
        max_tokens: config.max_tokens,
        timeout: Some(Duration::from_millis(config.timeout_ms)),
    }
}

/// Request asking to rework `code` per `feedback`.
pub fn refine_request(prompt: &str, code: &str, feedback: &str, config: &LlmConfig) -> LlmRequest {
    LlmRequest {
        system: REFINE_SYSTEM.to_owned(),
        user: format!(
            "Original prompt: {}\n\nCurrent code:\n{code}\n\nUser feedback: {}\n\nProvide the refined code:",
            prompt.trim(),
            feedback.trim()
        ),
        temperature: (config.temperature - 0.2).max(0.0),
        max_tokens: config.max_tokens,
        timeout: Some(Duration::from_millis(config.timeout_ms)),
    }
}

/// Strip a Markdown code fence, returning the first fenced block or the trimmed text.
pub fn extract_code_block(text: &str) -> String {
    let fenced = Regex::new(r"(?s)```[ \t]*(?:python3?|py)?[ \t]*\r?\n(.*?)```")
        .ok()
        .and_then(|re| re.captures(text).and_then(|c| c.get(1)))
        .map(|m| m.as_str());
    match fenced {
        Some(code) => code.trim_end().trim_start_matches(['\n', '\r']).to_owned(),
        None => text.trim().to_owned(),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/codegen/llm.rs"]
mod tests;
