//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.
//! Each handler is instrumented and logs parameters and basic result info.

use std::sync::Arc;
use axum::{extract::{Path, State}, Json, response::IntoResponse};
use tracing::{info, instrument};

use crate::domain::{CefrLevel, StoryStyle};
use crate::error::ApiError;
use crate::level::{topics_for, vocab_count_for};
use crate::logic::*;
use crate::protocol::*;
use crate::state::AppState;
use crate::style::temperature_for;

#[instrument(level = "info", skip(state))]
pub async fn http_health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(HealthOut {
    ok: true,
    generator: state.pipeline.is_some(),
    model: state.pipeline.as_ref().map(|p| p.model_name().to_string()),
  })
}

#[instrument(level = "info")]
pub async fn http_get_levels() -> impl IntoResponse {
  let levels: Vec<LevelOut> = CefrLevel::ALL
    .into_iter()
    .map(|level| LevelOut {
      level,
      tier: level.tier(),
      vocab_band: vocab_count_for(level).to_string(),
      suggested_topics: topics_for(level),
    })
    .collect();
  Json(levels)
}

#[instrument(level = "info")]
pub async fn http_get_styles() -> impl IntoResponse {
  let styles: Vec<StyleOut> = StoryStyle::ALL
    .into_iter()
    .map(|style| StyleOut { style, temperature: temperature_for(style) })
    .collect();
  Json(styles)
}

#[instrument(level = "info", skip(state, body), fields(language = %body.language, level = %body.level))]
pub async fn http_post_story(
  State(state): State<Arc<AppState>>,
  Json(body): Json<NewStoryIn>,
) -> Result<Json<StoryOut>, ApiError> {
  let out = start_story(&state, body).await?;
  info!(target: "story", id = %out.id, "HTTP story started");
  Ok(Json(out))
}

#[instrument(level = "info", skip(state), fields(%id))]
pub async fn http_get_story(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
) -> Result<Json<StoryOut>, ApiError> {
  Ok(Json(get_story(&state, &id).await?))
}

#[instrument(level = "info", skip(state), fields(%id))]
pub async fn http_post_next(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
) -> Result<Json<StoryOut>, ApiError> {
  let out = next_page(&state, &id).await?;
  info!(target: "story", %id, pages = out.page_count, "HTTP next page served");
  Ok(Json(out))
}

#[instrument(level = "info", skip(state), fields(%id))]
pub async fn http_post_prev(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
) -> Result<Json<StoryOut>, ApiError> {
  Ok(Json(prev_page(&state, &id).await?))
}

#[instrument(level = "info", skip(state, body), fields(%id, level = %body.level))]
pub async fn http_post_rewrite(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
  Json(body): Json<RewriteIn>,
) -> Result<Json<StoryOut>, ApiError> {
  let out = rewrite_page(&state, &id, body.level).await?;
  info!(target: "story", %id, level = %body.level, "HTTP page rewritten");
  Ok(Json(out))
}

#[instrument(level = "info", skip(body), fields(content_len = body.content.len()))]
pub async fn http_post_parse_markup(Json(body): Json<MarkupIn>) -> impl IntoResponse {
  Json(MarkupOut { paragraphs: parse_markup(&body.content) })
}
