//! Core behaviors shared by both HTTP and WebSocket handlers.
//!
//! This includes:
//!   - Starting a story (first page)
//!   - Paging forward (reuse an existing page or generate a continuation)
//!   - Paging back
//!   - Rewriting the current page at a new level, in place
//!   - Parsing inline markup for the display layer

use tracing::{info, instrument};
use uuid::Uuid;

use crate::domain::{CefrLevel, StoryRequest, TaskMode};
use crate::error::ApiError;
use crate::history::{StoryHistory, StorySession};
use crate::level::topics_for;
use crate::markup::{render_story, Segment};
use crate::pipeline::StoryPipeline;
use crate::protocol::{to_out, NewStoryIn, StoryOut};
use crate::state::AppState;
use crate::util::now_ms;

fn pipeline(state: &AppState) -> Result<&StoryPipeline, ApiError> {
  state.pipeline.as_deref().ok_or(ApiError::GeneratorUnavailable)
}

fn request_for(s: &StorySession, level: CefrLevel, topic: String, mode: TaskMode) -> StoryRequest {
  StoryRequest {
    language: s.language,
    level,
    topic,
    style: s.style,
    output_language: s.app_language,
    quiz_enabled: s.quiz_enabled,
    flashcards_enabled: s.flashcards_enabled,
    mode,
  }
}

#[instrument(level = "info", skip(state, input), fields(language = %input.language, level = %input.level, style = %input.style))]
pub async fn start_story(state: &AppState, input: NewStoryIn) -> Result<StoryOut, ApiError> {
  let pipeline = pipeline(state)?;
  let topic = input
    .topic
    .map(|t| t.trim().to_string())
    .filter(|t| !t.is_empty())
    .or_else(|| topics_for(input.level).first().map(|t| t.to_string()))
    .unwrap_or_else(|| pipeline.settings().default_topic.clone());

  let req = StoryRequest {
    language: input.language,
    level: input.level,
    topic: topic.clone(),
    style: input.style,
    output_language: input.output_language,
    quiz_enabled: input.quiz,
    flashcards_enabled: input.flashcards,
    mode: TaskMode::New,
  };
  let first = pipeline.generate(&req).await?;

  let session = StorySession {
    id: Uuid::new_v4().to_string(),
    created_at_ms: now_ms(),
    language: req.language,
    level: req.level,
    style: req.style,
    topic,
    app_language: req.output_language,
    quiz_enabled: req.quiz_enabled,
    flashcards_enabled: req.flashcards_enabled,
    history: StoryHistory::new(first),
  };
  let out = to_out(&session);
  info!(target: "story", id = %session.id, "Story started");
  state.insert_session(session).await;
  Ok(out)
}

#[instrument(level = "info", skip(state), fields(%id))]
pub async fn get_story(state: &AppState, id: &str) -> Result<StoryOut, ApiError> {
  state
    .get_session(id)
    .await
    .map(|s| to_out(&s))
    .ok_or_else(|| ApiError::NotFound(id.to_string()))
}

/// Move to the next page; generate a continuation of the last page when there is none.
#[instrument(level = "info", skip(state), fields(%id))]
pub async fn next_page(state: &AppState, id: &str) -> Result<StoryOut, ApiError> {
  let moved = state
    .update_session(id, |s| s.history.advance().then(|| to_out(s)))
    .await
    .ok_or_else(|| ApiError::NotFound(id.to_string()))?;
  if let Some(out) = moved {
    return Ok(out);
  }

  let snapshot = state.get_session(id).await.ok_or_else(|| ApiError::NotFound(id.to_string()))?;
  let last = snapshot.history.last().ok_or(crate::error::HistoryError::NoCurrentPage)?;
  let req = request_for(
    &snapshot,
    snapshot.level,
    format!("Continuation of: {}", last.title),
    TaskMode::Continuation {
      previous_title: last.title.clone(),
      previous_content: last.content.clone(),
    },
  );
  let page = pipeline(state)?.generate(&req).await?;

  let out = state
    .update_session(id, |s| {
      s.history.push(page);
      to_out(s)
    })
    .await
    .ok_or_else(|| ApiError::NotFound(id.to_string()))?;
  info!(target: "story", %id, pages = out.page_count, "Continuation appended");
  Ok(out)
}

#[instrument(level = "info", skip(state), fields(%id))]
pub async fn prev_page(state: &AppState, id: &str) -> Result<StoryOut, ApiError> {
  state
    .update_session(id, |s| {
      s.history.back();
      to_out(s)
    })
    .await
    .ok_or_else(|| ApiError::NotFound(id.to_string()))
}

/// Regenerate the current page at `level`, replacing it in place.
#[instrument(level = "info", skip(state), fields(%id, %level))]
pub async fn rewrite_page(state: &AppState, id: &str, level: CefrLevel) -> Result<StoryOut, ApiError> {
  let snapshot = state.get_session(id).await.ok_or_else(|| ApiError::NotFound(id.to_string()))?;
  let index = snapshot.history.current_index();
  let current = snapshot.history.current().ok_or(crate::error::HistoryError::NoCurrentPage)?;
  let req = request_for(
    &snapshot,
    level,
    snapshot.topic.clone(),
    TaskMode::Rewrite { content: current.content.clone() },
  );
  let page = pipeline(state)?.generate(&req).await?;

  let out = state
    .update_session(id, |s| -> Result<StoryOut, ApiError> {
      s.history.rewrite_at(index, page)?;
      s.level = level;
      Ok(to_out(s))
    })
    .await
    .ok_or_else(|| ApiError::NotFound(id.to_string()))??;
  info!(target: "story", %id, index, "Page rewritten");
  Ok(out)
}

pub fn parse_markup(content: &str) -> Vec<Vec<Segment>> {
  render_story(content)
}
