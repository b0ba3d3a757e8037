//! Minimal client for the Gemini `generateContent` endpoint.

use std::time::Duration;

use reqwest::{Client, StatusCode, Url};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GeminiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Gemini API error {status}: {message}")]
    Api { status: StatusCode, message: String },

    #[error("Gemini returned no text")]
    EmptyResponse,

    #[error("invalid Gemini base URL: {0}")]
    InvalidBaseUrl(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentRole {
    User,
    Model,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Part {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<ContentRole>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    pub fn text(role: ContentRole, text: impl Into<String>) -> Self {
        Self {
            role: Some(role),
            parts: vec![Part { text: text.into() }],
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    system_instruction: Content,
    contents: &'a [Content],
    generation_config: GenerationConfig,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

const MAX_OUTPUT_TOKENS: u32 = 512;

#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: SecretString,
    model: String,
    base_url: Url,
}

impl GeminiClient {
    pub fn with_base_url(
        api_key: SecretString,
        model: &str,
        base_url: &str,
        timeout_secs: u64,
    ) -> Result<Self, GeminiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised)
            .map_err(|e| GeminiError::InvalidBaseUrl(format!("{base_url}: {e}")))?;

        Ok(Self {
            client,
            api_key,
            model: model.to_string(),
            base_url,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Generate a single reply for `contents` under `system` instructions.
    #[tracing::instrument(skip_all, fields(model = %self.model, turns = contents.len()))]
    pub async fn generate(
        &self,
        system: &str,
        contents: &[Content],
    ) -> Result<String, GeminiError> {
        let url = self
            .base_url
            .join(&format!("v1beta/models/{}:generateContent", self.model))
            .map_err(|e| GeminiError::InvalidBaseUrl(e.to_string()))?;

        let request = GenerateRequest {
            system_instruction: Content {
                role: None,
                parts: vec![Part {
                    text: system.to_string(),
                }],
            },
            contents,
            generation_config: GenerationConfig {
                temperature: 0.4,
                max_output_tokens: MAX_OUTPUT_TOKENS,
            },
        };

        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", self.api_key.expose_secret())
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorBody>(&body)
                .map(|b| b.error.message)
                .unwrap_or(body);
            return Err(GeminiError::Api { status, message });
        }

        let parsed: GenerateResponse = response.json().await?;
        let text = parsed
            .candidates
            .into_iter()
            .filter_map(|c| c.content)
            .flat_map(|c| c.parts)
            .map(|p| p.text)
            .collect::<Vec<_>>()
            .join("");

        let text = text.trim();
        if text.is_empty() {
            return Err(GeminiError::EmptyResponse);
        }
        Ok(text.to_string())
    }
}
