//! Minimal OpenAI-compatible client implementing the structured-generation capability.
//!
//! We only call chat.completions with a `json_schema` response format.
//! Calls are instrumented and log model names, latencies, and response sizes (not contents).
//!
//! NOTE: We never log the API key.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info, instrument};

use crate::capability::{GenerationCall, ReasoningBudget, StructuredGenerator};
use crate::config::OpenAiSettings;
use crate::error::CapabilityError;

const SCHEMA_NAME: &str = "story_response";

#[derive(Clone)]
pub struct OpenAI {
  pub client: reqwest::Client,
  pub api_key: String,
  pub base_url: String,
  pub model: String,
  pub send_reasoning_effort: bool,
}

impl OpenAI {
  /// Construct the client if we find OPENAI_API_KEY; otherwise return None.
  pub fn from_settings(settings: &OpenAiSettings) -> Option<Self> {
    let api_key = std::env::var("OPENAI_API_KEY").ok().filter(|k| !k.trim().is_empty())?;
    match Self::new(api_key, settings) {
      Ok(oa) => Some(oa),
      Err(e) => {
        error!(target: "storyteller", error = %e, "Failed to build OpenAI HTTP client");
        None
      }
    }
  }

  pub fn new(api_key: String, settings: &OpenAiSettings) -> Result<Self, CapabilityError> {
    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(settings.timeout_secs))
      .build()
      .map_err(|e| CapabilityError::Configuration(format!("Failed to create HTTP client: {e}")))?;

    Ok(Self {
      client,
      api_key,
      base_url: settings.base_url.trim_end_matches('/').to_string(),
      model: settings.model.clone(),
      send_reasoning_effort: settings.send_reasoning_effort,
    })
  }

  fn build_request(&self, call: GenerationCall) -> ChatCompletionRequest {
    let mut messages = Vec::with_capacity(2);
    if let Some(system) = call.system_instruction {
      messages.push(ChatMessageReq { role: "system".into(), content: system });
    }
    messages.push(ChatMessageReq { role: "user".into(), content: call.prompt });

    let reasoning_effort = match call.reasoning {
      ReasoningBudget::Minimal if self.send_reasoning_effort => Some("minimal".to_string()),
      _ => None,
    };

    ChatCompletionRequest {
      model: self.model.clone(),
      messages,
      temperature: call.temperature,
      response_format: ResponseFormat {
        r#type: "json_schema".into(),
        json_schema: JsonSchemaFormat { name: SCHEMA_NAME.into(), schema: call.schema, strict: false },
      },
      reasoning_effort,
    }
  }
}

#[async_trait]
impl StructuredGenerator for OpenAI {
  #[instrument(level = "info", skip(self, call), fields(model = %self.model, temperature = call.temperature, prompt_len = call.prompt.len()))]
  async fn generate(&self, call: GenerationCall) -> Result<String, CapabilityError> {
    let url = format!("{}/chat/completions", self.base_url);
    let req = self.build_request(call);
    let start = Instant::now();

    let res = self.client.post(&url)
      .header(USER_AGENT, "storyteller-backend/0.1")
      .header(CONTENT_TYPE, "application/json")
      .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
      .json(&req).send().await?;

    if !res.status().is_success() {
      let status = res.status();
      let body = res.text().await.unwrap_or_default();
      let message = extract_openai_error(&body).unwrap_or(body);
      return Err(CapabilityError::Http { status: status.as_u16(), message });
    }

    let body: ChatCompletionResponse = res.json().await?;
    if let Some(usage) = &body.usage {
      info!(prompt_tokens = ?usage.prompt_tokens, completion_tokens = ?usage.completion_tokens, total_tokens = ?usage.total_tokens, "OpenAI usage");
    }
    let text = body.choices.into_iter().next()
      .and_then(|c| c.message.content)
      .unwrap_or_default();

    info!(elapsed = ?start.elapsed(), response_len = text.len(), "Model response received");
    if text.trim().is_empty() {
      return Err(CapabilityError::EmptyResponse);
    }
    Ok(text)
  }

  fn model_name(&self) -> &str {
    &self.model
  }
}

// --- Chat DTOs ---

#[derive(Serialize)]
struct ChatCompletionRequest {
  model: String,
  messages: Vec<ChatMessageReq>,
  temperature: f32,
  response_format: ResponseFormat,
  #[serde(skip_serializing_if = "Option::is_none")]
  reasoning_effort: Option<String>,
}
#[derive(Serialize)]
struct ChatMessageReq { role: String, content: String }
#[derive(Serialize)]
struct ResponseFormat {
  #[serde(rename = "type")] r#type: String,
  json_schema: JsonSchemaFormat,
}
#[derive(Serialize)]
struct JsonSchemaFormat { name: String, schema: Value, strict: bool }

#[derive(Deserialize)]
struct ChatCompletionResponse {
  choices: Vec<ChatChoice>,
  #[serde(default)] usage: Option<Usage>,
}
#[derive(Deserialize)]
struct ChatChoice { message: ChatMessageResp }
#[derive(Deserialize)]
struct ChatMessageResp { content: Option<String> }
#[derive(Deserialize)]
struct Usage {
  #[serde(default)] prompt_tokens: Option<u32>,
  #[serde(default)] completion_tokens: Option<u32>,
  #[serde(default)] total_tokens: Option<u32>,
}

/// Try to extract a clean error message from OpenAI error body.
fn extract_openai_error(body: &str) -> Option<String> {
  #[derive(Deserialize)]
  struct EWrap { error: EObj }
  #[derive(Deserialize)]
  struct EObj { message: String }
  serde_json::from_str::<EWrap>(body).ok().map(|w| w.error.message)
}
