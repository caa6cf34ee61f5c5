use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tracing::{error, info};

use crate::config::ConfigError;

const SYSTEM_PROMPT: &str = "You are a veterinary dermatology expert AI. Analyze dog skin condition images and provide:
1. Disease name (most likely condition)
2. Severity level (mild, moderate, or severe)
3. Whether veterinary consultation is needed (true/false)
4. Reason for consultation if needed
5. Cure suggestions (professional treatment options)
6. Home remedies (safe at-home care steps)

Provide your response in a structured format.";

const LOG_PREVIEW_CHARS: usize = 1000;

#[derive(Debug, Error)]
pub enum AiServiceError {
    #[error("rate limited by AI service")] RateLimited,
    #[error("AI service quota exceeded")] QuotaExceeded,
    #[error("AI service error (status={status:?}): {body}")]
    Service { status: Option<u16>, body: String },
}

impl AiServiceError {
    /// Only a rate limit is worth retrying, and only after a delay.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AiServiceError::RateLimited)
    }
}

/// Anything that can turn an image and a symptom description into the model's raw reply.
#[async_trait]
pub trait SkinAnalyzer: Send + Sync {
    async fn analyze(&self, image_url: &str, problem_description: &str) -> Result<String, AiServiceError>;
}

// Char-safe truncation for log lines; model replies are often multi-byte.
pub(crate) fn preview(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...[{} chars total]", &s[..idx], s.chars().count()),
        None => s.to_string(),
    }
}

pub struct AiServiceClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl AiServiceClient {
    pub fn new(api_key: String, base_url: String, model: String) -> Result<Self, ConfigError> {
        if api_key.trim().is_empty() {
            return Err(ConfigError::Missing("LOVABLE_API_KEY"));
        }
        Ok(Self {
            client: Client::new(),
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
        })
    }

    pub fn build_user_prompt(problem_description: &str) -> String {
        format!("Problem description: {problem_description}\n\nPlease analyze this dog's skin condition and provide a detailed diagnosis.")
    }

    fn request_body(&self, image_url: &str, problem_description: &str) -> serde_json::Value {
        json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                {
                    "role": "user",
                    "content": [
                        { "type": "text", "text": Self::build_user_prompt(problem_description) },
                        { "type": "image_url", "image_url": { "url": image_url } }
                    ]
                }
            ]
        })
    }
}

#[async_trait]
impl SkinAnalyzer for AiServiceClient {
    async fn analyze(&self, image_url: &str, problem_description: &str) -> Result<String, AiServiceError> {
        let url = format!("{}/chat/completions", self.base_url);
        info!(%url, model = %self.model, "🔗 Requesting skin analysis");

        let response = self.client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&self.request_body(image_url, problem_description))
            .send()
            .await
            .map_err(|e| {
                error!("❌ AI gateway unreachable: {}", e);
                AiServiceError::Service { status: None, body: e.to_string() }
            })?;

        let status = response.status();
        info!("📥 Response status: {}", status);

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            if status == StatusCode::TOO_MANY_REQUESTS {
                error!(status = status.as_u16(), body = %preview(&body, LOG_PREVIEW_CHARS), "❌ AI gateway rate limited the request");
                return Err(AiServiceError::RateLimited);
            }
            if status == StatusCode::PAYMENT_REQUIRED {
                error!(status = status.as_u16(), body = %preview(&body, LOG_PREVIEW_CHARS), "❌ AI gateway reports exhausted credits");
                return Err(AiServiceError::QuotaExceeded);
            }
            error!(status = status.as_u16(), body = %preview(&body, LOG_PREVIEW_CHARS), "❌ AI gateway error");
            return Err(AiServiceError::Service { status: Some(status.as_u16()), body });
        }

        let body = response.text().await
            .map_err(|e| AiServiceError::Service { status: Some(status.as_u16()), body: e.to_string() })?;

        let parsed: ChatCompletionResponse = serde_json::from_str(&body).map_err(|e| {
            error!("❌ Unparseable AI gateway response: {}: {}", e, preview(&body, LOG_PREVIEW_CHARS));
            AiServiceError::Service { status: Some(status.as_u16()), body: format!("parse error: {e}") }
        })?;

        let content = parsed.first_content().ok_or_else(|| {
            error!("⚠️ No message content in AI gateway response: {}", preview(&body, LOG_PREVIEW_CHARS));
            AiServiceError::Service { status: Some(status.as_u16()), body: "empty response from AI service".into() }
        })?;

        info!("📥 AI response: {}", preview(&content, LOG_PREVIEW_CHARS));
        Ok(content)
    }
}

// --- Response Parsing Helpers ---

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice { message: Message }

#[derive(Debug, Deserialize)]
struct Message { #[serde(default)] content: Option<String> }

impl ChatCompletionResponse {
    fn first_content(&self) -> Option<String> {
        self.choices
            .first()
            .and_then(|c| c.message.content.as_ref())
            .filter(|c| !c.trim().is_empty())
            .cloned()
    }
}
