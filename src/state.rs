//! Application state: the story-session store and the generation pipeline.
//!
//! This module owns:
//!   - story sessions by id (pages of each story being read)
//!   - the loaded configuration
//!   - the optional pipeline (absent when no generator is configured)
//!
//! The store is capped at `[server].max_sessions`; the oldest session goes first.
//! Locks are never held across a generation call: callers snapshot, generate,
//! then write back.

use std::{collections::HashMap, sync::Arc};
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

use crate::capability::StructuredGenerator;
use crate::config::{load_config_from_env, AppConfig};
use crate::history::StorySession;
use crate::openai::OpenAI;
use crate::pipeline::StoryPipeline;

#[derive(Clone)]
pub struct AppState {
    pub stories: Arc<RwLock<HashMap<String, StorySession>>>,
    pub pipeline: Option<Arc<StoryPipeline>>,
    pub config: AppConfig,
}

impl AppState {
    /// Build state from env: load config, init the OpenAI generator if a key is present.
    #[instrument(level = "info", skip_all)]
    pub fn new() -> Self {
        let config = load_config_from_env();

        let generator: Option<Arc<dyn StructuredGenerator>> = match OpenAI::from_settings(&config.openai) {
            Some(oa) => {
                info!(target: "storyteller", base_url = %oa.base_url, model = %oa.model, audit = config.pipeline.audit_enabled, "OpenAI enabled.");
                Some(Arc::new(oa))
            }
            None => {
                warn!(target: "storyteller", "OpenAI disabled (no OPENAI_API_KEY). Story generation will fail with 503.");
                None
            }
        };

        Self::from_parts(config, generator)
    }

    pub fn from_parts(config: AppConfig, generator: Option<Arc<dyn StructuredGenerator>>) -> Self {
        let pipeline = generator.map(|g| {
            Arc::new(StoryPipeline::new(g, config.pipeline.clone(), config.prompts.clone()))
        });
        Self {
            stories: Arc::new(RwLock::new(HashMap::new())),
            pipeline,
            config,
        }
    }

    #[instrument(level = "debug", skip(self, s), fields(id = %s.id))]
    pub async fn insert_session(&self, s: StorySession) {
        let cap = self.config.server.max_sessions.max(1);
        let mut stories = self.stories.write().await;
        while stories.len() >= cap && !stories.contains_key(&s.id) {
            let Some(oldest) = stories.values().min_by_key(|v| v.created_at_ms).map(|v| v.id.clone()) else {
                break;
            };
            stories.remove(&oldest);
            debug!(target: "story", id = %oldest, cap, "Evicted oldest session");
        }
        stories.insert(s.id.clone(), s);
    }

    /// Read-only snapshot of a session by id.
    #[instrument(level = "debug", skip(self), fields(%id))]
    pub async fn get_session(&self, id: &str) -> Option<StorySession> {
        self.stories.read().await.get(id).cloned()
    }

    /// Mutate a session under the write lock. Returns None for unknown ids.
    pub async fn update_session<R>(&self, id: &str, f: impl FnOnce(&mut StorySession) -> R) -> Option<R> {
        let mut stories = self.stories.write().await;
        stories.get_mut(id).map(f)
    }
}
