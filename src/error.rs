//! Error types for the generation boundary, the pipeline and the HTTP surface.

use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use thiserror::Error;

/// Failures of a single structured-generation call.
#[derive(Error, Debug)]
pub enum CapabilityError {
  #[error("transport error: {0}")]
  Transport(String),

  #[error("HTTP {status}: {message}")]
  Http { status: u16, message: String },

  #[error("empty response text")]
  EmptyResponse,

  #[error("configuration error: {0}")]
  Configuration(String),
}

impl From<reqwest::Error> for CapabilityError {
  fn from(err: reqwest::Error) -> Self {
    CapabilityError::Transport(err.to_string())
  }
}

/// Why a phase of the pipeline produced no usable story object.
#[derive(Error, Debug)]
pub enum PhaseError {
  #[error(transparent)]
  Capability(#[from] CapabilityError),

  #[error("JSON parse error: {0}")]
  Parse(#[from] serde_json::Error),

  #[error("response does not match the schema: {0}")]
  NonConformant(String),
}

/// Surfaced to callers. Only the draft phase can fail an invocation.
#[derive(Error, Debug)]
pub enum GenerationError {
  #[error("Could not generate story. Please try again.")]
  Draft {
    #[source]
    source: PhaseError,
  },
}

#[derive(Error, Debug)]
pub enum HistoryError {
  #[error("story has no current page")]
  NoCurrentPage,
}

#[derive(Error, Debug)]
pub enum ApiError {
  #[error("unknown story id: {0}")]
  NotFound(String),

  #[error("story generation is not configured (OPENAI_API_KEY missing)")]
  GeneratorUnavailable,

  #[error(transparent)]
  Generation(#[from] GenerationError),

  #[error(transparent)]
  History(#[from] HistoryError),
}

impl ApiError {
  pub fn status(&self) -> StatusCode {
    match self {
      ApiError::NotFound(_) => StatusCode::NOT_FOUND,
      ApiError::History(_) => StatusCode::BAD_REQUEST,
      ApiError::GeneratorUnavailable => StatusCode::SERVICE_UNAVAILABLE,
      ApiError::Generation(_) => StatusCode::BAD_GATEWAY,
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> axum::response::Response {
    (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
  }
}
