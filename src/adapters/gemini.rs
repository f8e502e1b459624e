use crate::core::{AIAnalysisResult, ConfigProvider, ImageAnalyzer, ImagePayload};
use crate::utils::error::{MarketError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;
pub const DEFAULT_INSTRUCTION: &str = "Analyze this electronic item and provide a professional marketplace listing. Suggest a title, a detailed description for a college student buyer, a realistic suggested price in Indian Rupees (INR), and a category.";

const API_KEY_HEADER: &str = "x-goog-api-key";
const MAX_ERROR_BODY_CHARS: usize = 300;

/// Gemini `generateContent` 的結構化輸出客戶端；每次呼叫只送一次請求，不重試
pub struct GeminiAnalyzer {
    client: Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    instruction: String,
}

impl GeminiAnalyzer {
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MarketError::ConfigError {
                message: format!("failed to build HTTP client: {}", e),
            })?;

        if api_key.is_none() {
            tracing::warn!("No API key configured; the inference service will likely reject requests");
        }

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            model: model.into(),
            api_key,
            instruction: DEFAULT_INSTRUCTION.to_string(),
        })
    }

    pub fn from_config<C: ConfigProvider + ?Sized>(config: &C) -> Result<Self> {
        Ok(Self::new(
            config.ai_endpoint(),
            config.model(),
            config.api_key().map(str::to_string),
            config.request_timeout(),
        )?
        .with_instruction(config.instruction()))
    }

    pub fn with_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.instruction = instruction.into();
        self
    }

    fn request_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.endpoint.trim_end_matches('/'),
            self.model
        )
    }

    fn request_body(&self, image: &ImagePayload) -> serde_json::Value {
        json!({
            "contents": [{
                "parts": [
                    {
                        "inlineData": {
                            "mimeType": image.mime_type(),
                            "data": image.base64_data(),
                        }
                    },
                    { "text": self.instruction }
                ]
            }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": {
                    "type": "OBJECT",
                    "properties": {
                        "title": { "type": "STRING" },
                        "description": { "type": "STRING" },
                        "suggestedPrice": {
                            "type": "NUMBER",
                            "description": "The suggested price for the item in Indian Rupees (INR)."
                        },
                        "category": { "type": "STRING" }
                    },
                    "required": ["title", "description", "suggestedPrice", "category"]
                }
            }
        })
    }
}

#[async_trait]
impl ImageAnalyzer for GeminiAnalyzer {
    async fn analyze(&self, image: &ImagePayload) -> Result<AIAnalysisResult> {
        if image.is_empty() {
            return Err(MarketError::enrichment("image payload is empty"));
        }

        let url = self.request_url();
        tracing::debug!("Sending {} image to {}", image.mime_type(), url);

        let mut request = self.client.post(&url).json(&self.request_body(image));
        if let Some(key) = &self.api_key {
            request = request.header(API_KEY_HEADER, key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| MarketError::enrichment(format!("request failed: {}", e)))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| MarketError::enrichment(format!("failed to read response: {}", e)))?;

        tracing::debug!("Inference service responded with {}", status);
        if !status.is_success() {
            let snippet: String = body.chars().take(MAX_ERROR_BODY_CHARS).collect();
            return Err(MarketError::enrichment(format!(
                "service returned {}: {}",
                status, snippet
            )));
        }

        let text = extract_candidate_text(&body)?;
        parse_analysis(&text)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ContentPart>,
}

#[derive(Debug, Deserialize)]
struct ContentPart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

fn extract_candidate_text(body: &str) -> Result<String> {
    let response: GenerateContentResponse = serde_json::from_str(body)
        .map_err(|e| MarketError::enrichment(format!("malformed service response: {}", e)))?;

    if let Some(reason) = response
        .prompt_feedback
        .and_then(|feedback| feedback.block_reason)
    {
        return Err(MarketError::enrichment(format!(
            "request was blocked: {}",
            reason
        )));
    }

    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| MarketError::enrichment("response contained no candidates"))?;

    let text: String = candidate
        .content
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect()
        })
        .unwrap_or_default();

    if text.trim().is_empty() {
        let reason = candidate.finish_reason.unwrap_or_else(|| "unknown".to_string());
        return Err(MarketError::enrichment(format!(
            "candidate had no text (finish reason: {})",
            reason
        )));
    }
    Ok(text)
}

/// 解析模型輸出的 JSON；容忍外層的 ``` 區塊
fn parse_analysis(text: &str) -> Result<AIAnalysisResult> {
    let trimmed = text.trim();
    let json_text = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .unwrap_or(trimmed);

    let result: AIAnalysisResult = serde_json::from_str(json_text.trim()).map_err(|e| {
        MarketError::enrichment(format!("response does not match the listing schema: {}", e))
    })?;

    if !result.suggested_price.is_finite() || result.suggested_price < 0.0 {
        return Err(MarketError::enrichment(format!(
            "suggested price {} is not a valid amount",
            result.suggested_price
        )));
    }
    Ok(result)
}
