//! Gemini `generateContent` provider with JSON-constrained output.

use super::provider::{ProviderError, ProviderRequest, TextProvider};
use crate::model::GeneratorConfig;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub struct GeminiProvider {
    http: reqwest::Client,
    endpoint: reqwest::Url,
    api_key: String,
}

impl GeminiProvider {
    pub fn new(cfg: &GeneratorConfig, api_key: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(cfg.user_agent.clone())
            .timeout(cfg.request_timeout)
            .build()
            .context("build http client")?;

        let base = cfg.base_url.trim_end_matches('/');
        let endpoint = reqwest::Url::parse(&format!(
            "{base}/v1beta/models/{}:generateContent",
            cfg.model
        ))
        .with_context(|| format!("invalid provider base url: {}", cfg.base_url))?;

        Ok(Self {
            http,
            endpoint,
            api_key: api_key.to_string(),
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: [Content<'a>; 1],
    generation_config: GenerationConfig<'a>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig<'a> {
    response_mime_type: &'static str,
    response_schema: &'a Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    details: Vec<Value>,
}

#[async_trait]
impl TextProvider for GeminiProvider {
    fn name(&self) -> &'static str {
        "gemini"
    }

    async fn generate_json(&self, request: &ProviderRequest) -> Result<String, ProviderError> {
        let body = GenerateContentRequest {
            contents: [Content {
                parts: [Part {
                    text: &request.prompt,
                }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                response_schema: &request.schema,
            },
        };

        log::debug!("POST {} ({} prompt bytes)", self.endpoint, request.prompt.len());

        let resp = self
            .http
            .post(self.endpoint.clone())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = resp.status();
        let text = resp.text().await.map_err(transport_error)?;
        if !status.is_success() {
            return Err(classify_status(status, &text));
        }

        extract_text(&text)
    }
}

fn transport_error(e: reqwest::Error) -> ProviderError {
    let detail = if e.is_timeout() {
        "request timed out".to_string()
    } else if e.is_connect() {
        "connection failed".to_string()
    } else {
        e.to_string()
    };
    ProviderError::Transport(detail)
}

/// Map a non-success HTTP response onto a provider error.
///
/// Gemini reports a bad key as 400 INVALID_ARGUMENT with an `API_KEY_INVALID`
/// reason, so that case is treated like 401/403.
pub(crate) fn classify_status(status: StatusCode, body: &str) -> ProviderError {
    let parsed = serde_json::from_str::<ErrorEnvelope>(body).ok();
    let message = parsed
        .as_ref()
        .map(|env| env.error.message.clone())
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("unknown error")
                .to_string()
        });
    let key_invalid = parsed.as_ref().is_some_and(|env| {
        env.error
            .details
            .iter()
            .any(|d| d.get("reason").and_then(Value::as_str) == Some("API_KEY_INVALID"))
            || env.error.message.contains("API key not valid")
    });

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ProviderError::Unauthorized {
            status: status.as_u16(),
            message,
        },
        StatusCode::BAD_REQUEST if key_invalid => ProviderError::Unauthorized {
            status: status.as_u16(),
            message,
        },
        _ => ProviderError::Status {
            status: status.as_u16(),
            message,
        },
    }
}

/// Pull the model's JSON text out of a successful `generateContent` body.
pub(crate) fn extract_text(body: &str) -> Result<String, ProviderError> {
    let resp: GenerateContentResponse = serde_json::from_str(body)
        .map_err(|e| ProviderError::MalformedEnvelope(format!("undecodable response: {e}")))?;

    let Some(candidate) = resp.candidates.into_iter().next() else {
        let reason = resp
            .prompt_feedback
            .and_then(|f| f.block_reason)
            .map(|r| format!("no candidates (blocked: {r})"))
            .unwrap_or_else(|| "no candidates".to_string());
        return Err(ProviderError::MalformedEnvelope(reason));
    };

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        let reason = candidate.finish_reason.unwrap_or_else(|| "UNKNOWN".into());
        return Err(ProviderError::MalformedEnvelope(format!(
            "candidate has no text (finish reason {reason})"
        )));
    }
    Ok(text)
}
