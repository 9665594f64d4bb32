//! Generative-language client for SEO rewrites.
//!
//! One blocking `generateContent` call per product. The reply's text payload
//! is stripped of a surrounding code fence and parsed as JSON exactly once;
//! the `{name, description}` schema check is left to the caller.
use crate::config::RewriteConfig;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::time::Instant;

/// Why a rewrite call produced no usable JSON.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RewriteError {
    /// The service could not be reached, answered non-2xx, or sent no text.
    Transport(String),
    /// The text payload was not valid JSON.
    Parse(String),
}

impl fmt::Display for RewriteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(detail) => write!(f, "rewrite service failed: {detail}"),
            Self::Parse(detail) => write!(f, "rewrite reply is not valid JSON: {detail}"),
        }
    }
}

impl std::error::Error for RewriteError {}

/// Validated rewrite payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewriteResult {
    pub name: String,
    pub description: String,
}

impl RewriteResult {
    /// Accept only an object carrying string `name` and `description`.
    pub fn from_value(value: &Value) -> Result<Self, String> {
        let Some(object) = value.as_object() else {
            return Err(format!("expected a JSON object, got {}", json_kind(value)));
        };
        let missing: Vec<&str> = ["name", "description"]
            .into_iter()
            .filter(|key| !object.get(*key).is_some_and(Value::is_string))
            .collect();
        if !missing.is_empty() {
            return Err(format!(
                "missing some required attributes ({})",
                missing.join(" or ")
            ));
        }
        let text = |key: &str| {
            object
                .get(key)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        Ok(Self {
            name: text("name"),
            description: text("description"),
        })
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// A service that rewrites a prompt into a JSON value.
pub trait Rewriter {
    fn optimize(&self, model: &str, prompt: &str) -> Result<Value, RewriteError>;
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: [RequestContent<'a>; 1],
}

#[derive(Serialize)]
struct RequestContent<'a> {
    parts: [RequestPart<'a>; 1],
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

/// HTTP client for the Gemini `generateContent` endpoint.
pub struct GeminiClient {
    agent: ureq::Agent,
    endpoint: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(config: &RewriteConfig) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .into();
        Self {
            agent,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        }
    }

    fn generate_url(&self, model: &str) -> String {
        format!("{}/v1beta/models/{model}:generateContent", self.endpoint)
    }

    fn generate_text(&self, model: &str, prompt: &str) -> Result<String, RewriteError> {
        let url = self.generate_url(model);
        let request = GenerateRequest {
            contents: [RequestContent {
                parts: [RequestPart { text: prompt }],
            }],
        };
        let start = Instant::now();
        let mut response = self
            .agent
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .send_json(&request)
            .map_err(|err| RewriteError::Transport(format!("POST {url}: {err}")))?;
        let status = response.status();
        tracing::info!(
            model,
            status = status.as_u16(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            prompt_bytes = prompt.len(),
            "rewrite invoke complete"
        );
        if !status.is_success() {
            return Err(RewriteError::Transport(format!(
                "POST {url} returned HTTP {}",
                status.as_u16()
            )));
        }
        let reply: GenerateResponse = response
            .body_mut()
            .read_json()
            .map_err(|err| RewriteError::Transport(format!("decode reply envelope: {err}")))?;
        first_candidate_text(reply)
            .ok_or_else(|| RewriteError::Transport("reply has no candidate text".to_string()))
    }
}

impl Rewriter for GeminiClient {
    fn optimize(&self, model: &str, prompt: &str) -> Result<Value, RewriteError> {
        let text = self.generate_text(model, prompt)?;
        tracing::debug!(response_bytes = text.len(), "rewrite text received");
        parse_reply_text(&text)
    }
}

fn first_candidate_text(reply: GenerateResponse) -> Option<String> {
    reply
        .candidates
        .into_iter()
        .next()?
        .content?
        .parts
        .into_iter()
        .next()?
        .text
}

/// Strip one surrounding code fence and parse the remainder as JSON.
pub fn parse_reply_text(text: &str) -> Result<Value, RewriteError> {
    let cleaned = strip_code_fences(text);
    serde_json::from_str(cleaned).map_err(|err| {
        let preview: String = cleaned.chars().take(200).collect();
        RewriteError::Parse(format!("{err} (reply starts with {preview:?})"))
    })
}

/// Remove a leading `` ``` `` or `` ```lang `` marker and a trailing
/// `` ``` ``, whether or not they sit on their own lines.
fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = match rest.split_once('\n') {
        Some((tag, body)) if tag.trim().chars().all(|c| c.is_ascii_alphanumeric()) => body,
        _ => rest.strip_prefix("json").unwrap_or(rest),
    };
    let body = body.trim_end();
    body.strip_suffix("```").unwrap_or(body).trim()
}
