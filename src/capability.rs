//! The structured-generation capability the pipeline depends on.
//!
//! Submit system instruction + prompt + schema + temperature, get back the raw text
//! payload. Sanitizing and parsing are the caller's business.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::CapabilityError;

/// How much internal deliberation the capability may spend before answering.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReasoningBudget {
  /// Provider default.
  Default,
  /// No extended thinking; bounds latency.
  Minimal,
}

#[derive(Clone, Debug)]
pub struct GenerationCall {
  pub system_instruction: Option<String>,
  pub prompt: String,
  pub schema: Value,
  pub temperature: f32,
  pub reasoning: ReasoningBudget,
}

#[async_trait]
pub trait StructuredGenerator: Send + Sync {
  async fn generate(&self, call: GenerationCall) -> Result<String, CapabilityError>;

  fn model_name(&self) -> &str;
}
