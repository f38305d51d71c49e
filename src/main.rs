//! Storyteller · CEFR-leveled story generation backend
//!
//! - Axum HTTP + WebSocket API
//! - Two-phase (draft, audit) structured generation via an OpenAI-compatible API
//! - In-memory story sessions (pages, continuation, rewrite-in-place)
//!
//! Important env variables:
//!   PORT                : u16 (default 3000, or [server].port from config)
//!   OPENAI_API_KEY      : enables story generation if present
//!   OPENAI_BASE_URL     : default "https://api.openai.com/v1"
//!   OPENAI_MODEL        : default "gpt-4o-mini"
//!   OPENAI_TIMEOUT_SECS : default 60
//!   STORY_AUDIT         : "off" disables the audit pass
//!   STORY_CONFIG_PATH   : path to TOML config (model, pipeline knobs, persona prompts)
//!   LOG_LEVEL           : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT          : "pretty" (default) or "json"

mod capability;
mod config;
mod domain;
mod error;
mod history;
mod level;
mod logic;
mod markup;
mod openai;
mod pipeline;
mod prompt;
mod protocol;
mod routes;
mod sanitize;
mod schema;
mod state;
mod style;
mod telemetry;
mod util;

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::info;

use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  // Shared state: session store, config, injected generation pipeline.
  let state = Arc::new(AppState::new());
  let addr = SocketAddr::from(([0, 0, 0, 0], state.config.server.port));

  let app = build_router(state);

  let listener = TcpListener::bind(addr).await?;
  info!(target: "storyteller", %addr, "HTTP server listening");
  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await?;
  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    tracing::error!(target: "storyteller", error = %e, "Failed to listen for ctrl-c");
    std::future::pending::<()>().await;
  }
  info!(target: "storyteller", "Shutdown signal received");
}
