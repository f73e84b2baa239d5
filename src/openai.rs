//! Solve and Judge stages backed by an OpenAI-compatible chat completions API.

use anyhow::{Context, Result};
use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

use crate::case::Case;
use crate::config::Config;
use crate::error::StageError;
use crate::evaluation::{Judge, Solver};

const MAX_ERROR_BODY: usize = 500;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    max_completion_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: Vec<ContentPart>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: MessageContent,
}

#[derive(Debug, Deserialize)]
struct MessageContent {
    #[serde(default)]
    content: Option<String>,
}

pub struct OpenAiClient {
    client: reqwest::Client,
    api_base: String,
    api_key: String,
}

impl OpenAiClient {
    pub fn new(config: &Config, api_key: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.request_timeout_secs))
            .build()
            .context("Failed to build HTTP client for the model API")?;
        Ok(Self {
            client,
            api_base: config.api_base.clone(),
            api_key: api_key.to_string(),
        })
    }

    async fn chat(&self, request: &ChatRequest<'_>) -> Result<String, StageError> {
        let url = format!("{}/chat/completions", self.api_base.trim_end_matches('/'));
        let start = Instant::now();

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await?;

        let status = resp.status();
        debug!(
            model = %request.model,
            status = %status.as_u16(),
            latency_ms = %start.elapsed().as_millis(),
            "Model API responded"
        );

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(StageError::Api {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        let parsed: ChatResponse = resp.json().await?;
        first_content(parsed, request.model)
    }
}

fn first_content(resp: ChatResponse, model: &str) -> Result<String, StageError> {
    resp.choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .filter(|text| !text.trim().is_empty())
        .ok_or_else(|| StageError::EmptyResponse {
            model: model.to_string(),
        })
}

fn truncate_body(body: &str) -> String {
    body.chars().take(MAX_ERROR_BODY).collect()
}

fn image_mime(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        _ => "image/png",
    }
}

/// Read an image artifact and wrap it as a base64 data URL.
async fn image_part(path: &Path) -> Result<ContentPart, StageError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| StageError::Artifact {
            path: path.to_path_buf(),
            source,
        })?;
    let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
    Ok(ContentPart::ImageUrl {
        image_url: ImageUrl {
            url: format!("data:{};base64,{}", image_mime(path), encoded),
        },
    })
}

fn solver_prompt() -> String {
    "You are a math tutor. Solve the problem shown in the image.\n\
     Work through it and state the final answer clearly at the end."
        .to_string()
}

fn judge_prompt(case: &Case, answer: &str) -> String {
    format!(
        r#"You are grading another model's answer to a math problem given as an image.

You receive the problem image, an image of the expected answer, and the candidate answer text.
Solve the problem yourself, compare the candidate answer with the expected answer image, and decide
whether the math is correct and whether the answer has the expected structure.

Expected valid style label: {valid}
Expected invalid style label: {invalid}

Label meanings:
- "Step-by-Step": clear, logical steps are shown.
- "Complete": every required part is present even if not every step is shown.
- "Accurate": the result is correct and precisely stated.
- "Incomplete": required parts or steps are missing.
- "Wrong Answer": the math result is incorrect.
- "Clarification Needed": the answer cannot be graded without more information.

Reply with a JSON object with exactly these keys:
- "pass": true or false
- "reason": one or two sentences
- "style_label": one of ["Step-by-Step", "Complete", "Accurate"] when pass is true, otherwise one of ["Incomplete", "Wrong Answer", "Clarification Needed"]
- "correct_math": true or false

Problem description: {problem}

Candidate answer:
{answer}
"#,
        valid = case.expected_valid_label,
        invalid = case.expected_invalid_label,
        problem = case.problem,
        answer = answer,
    )
}

pub struct OpenAiSolver {
    client: Arc<OpenAiClient>,
    model: String,
    max_tokens: u32,
}

impl OpenAiSolver {
    pub fn new(client: Arc<OpenAiClient>, config: &Config) -> Self {
        Self {
            client,
            model: config.solver_model.clone(),
            max_tokens: config.solver_max_tokens,
        }
    }

    async fn build_request(&self, case: &Case) -> Result<ChatRequest<'_>, StageError> {
        let image = image_part(&case.problem_artifact).await?;
        Ok(ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: vec![
                    ContentPart::Text {
                        text: solver_prompt(),
                    },
                    image,
                ],
            }],
            max_completion_tokens: self.max_tokens,
            response_format: None,
        })
    }
}

#[async_trait]
impl Solver for OpenAiSolver {
    async fn solve(&self, case: &Case) -> Result<String, StageError> {
        let request = self.build_request(case).await?;
        let answer = self.client.chat(&request).await?;
        Ok(answer.trim().to_string())
    }
}

pub struct OpenAiJudge {
    client: Arc<OpenAiClient>,
    model: String,
    max_tokens: u32,
}

impl OpenAiJudge {
    pub fn new(client: Arc<OpenAiClient>, config: &Config) -> Self {
        Self {
            client,
            model: config.judge_model.clone(),
            max_tokens: config.judge_max_tokens,
        }
    }

    async fn build_request(&self, case: &Case, answer: &str) -> Result<ChatRequest<'_>, StageError> {
        let problem = image_part(&case.problem_artifact).await?;
        let expected = image_part(&case.expected_artifact).await?;
        Ok(ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: vec![
                    problem,
                    expected,
                    ContentPart::Text {
                        text: judge_prompt(case, answer),
                    },
                ],
            }],
            max_completion_tokens: self.max_tokens,
            response_format: Some(ResponseFormat {
                kind: "json_object",
            }),
        })
    }
}

#[async_trait]
impl Judge for OpenAiJudge {
    async fn judge(&self, case: &Case, answer: &str) -> Result<String, StageError> {
        let request = self.build_request(case, answer).await?;
        self.client.chat(&request).await
    }
}
