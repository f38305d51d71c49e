//! Loading service configuration (model settings, pipeline knobs, persona prompts) from TOML.
//!
//! Every section is optional; missing keys fall back to defaults. A handful of env
//! variables override the file so deployments can stay config-free.

use serde::Deserialize;
use tracing::{error, info};

#[derive(Clone, Debug, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
  pub server: ServerSettings,
  pub openai: OpenAiSettings,
  pub pipeline: PipelineSettings,
  pub prompts: Prompts,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
  pub port: u16,
  /// Sessions kept in memory; the oldest is evicted past this.
  pub max_sessions: usize,
}

impl Default for ServerSettings {
  fn default() -> Self {
    Self { port: 3000, max_sessions: 1000 }
  }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct OpenAiSettings {
  pub base_url: String,
  pub model: String,
  pub timeout_secs: u64,
  /// Send `reasoning_effort` for minimal-budget calls. Only reasoning models accept it.
  pub send_reasoning_effort: bool,
}

impl Default for OpenAiSettings {
  fn default() -> Self {
    Self {
      base_url: "https://api.openai.com/v1".into(),
      model: "gpt-4o-mini".into(),
      timeout_secs: 60,
      send_reasoning_effort: false,
    }
  }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
  pub audit_enabled: bool,
  pub audit_temperature: f32,
  /// Extra audit attempts before falling back to the draft.
  pub audit_retries: u32,
  /// Ask the generator for a minimal reasoning budget on every call.
  pub minimal_reasoning: bool,
  pub default_topic: String,
}

impl Default for PipelineSettings {
  fn default() -> Self {
    Self {
      audit_enabled: true,
      audit_temperature: 0.2,
      audit_retries: 0,
      minimal_reasoning: true,
      default_topic: "A random adventure".into(),
    }
  }
}

/// Persona system instructions. `{level}`, `{constraints}`, `{language}` and
/// `{tag_rule}` are filled in at call time.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Prompts {
  pub draft_system: String,
  pub audit_system: String,
}

impl Default for Prompts {
  fn default() -> Self {
    Self {
      draft_system: "You are a Senior Language Education Specialist and CEFR Level Auditor.\n\
Your mission is to generate stories that STRICTLY adhere to specific CEFR proficiency levels.\n\n\
CRITICAL RULES:\n\
1. NEVER use grammar or vocabulary above the target level.\n\
2. If a creative choice requires complex language, you MUST simplify the idea instead of using the complex language.\n\
3. The \"Forbidden\" constraints for the level are absolute.\n\n\
TARGET LEVEL: {level}\n\n\
LEVEL CONSTRAINTS:\n{constraints}".into(),
      audit_system: "You are a Strict Linguistic Editor and Proofreader for {language}.\n\
Your job is to take the provided JSON story object and rigorously check it for mistakes.\n\n\
VALIDATION RULES:\n\
1. GRAMMAR: Fix any grammatical errors in the 'content' field.\n\
2. NATURALNESS: Ensure phrases sound natural to a native speaker, not like robotic translation.\n\
3. LEVEL COMPLIANCE: Ensure strict adherence to CEFR Level {level}. If a phrase is too complex, simplify it immediately.\n\
4. INTEGRITY:\n\
   - Ensure 'englishTranslation' accurately reflects the corrected content.\n\
   - Ensure 'quiz' questions and answers are still valid based on the content.\n\
   - {tag_rule}\n\n\
OUTPUT: Return the CLEANED and CORRECTED JSON object matching the exact same schema.".into(),
    }
  }
}

impl AppConfig {
  /// Apply env overrides on top of whatever the file provided.
  pub fn apply_env(&mut self) {
    if let Some(port) = std::env::var("PORT").ok().and_then(|p| p.parse::<u16>().ok()) {
      self.server.port = port;
    }
    if let Ok(url) = std::env::var("OPENAI_BASE_URL") {
      self.openai.base_url = url;
    }
    if let Ok(model) = std::env::var("OPENAI_MODEL") {
      self.openai.model = model;
    }
    if let Some(secs) = std::env::var("OPENAI_TIMEOUT_SECS").ok().and_then(|s| s.parse::<u64>().ok()) {
      self.openai.timeout_secs = secs;
    }
    if let Ok(v) = std::env::var("STORY_AUDIT") {
      self.pipeline.audit_enabled = !matches!(v.trim().to_ascii_lowercase().as_str(), "off" | "0" | "false");
    }
  }
}

/// Parse a TOML document into `AppConfig`.
pub fn parse_config(s: &str) -> Result<AppConfig, toml::de::Error> {
  toml::from_str::<AppConfig>(s)
}

/// Load from STORY_CONFIG_PATH (if set), then apply env overrides. IO or parse
/// errors are logged and defaults are used.
pub fn load_config_from_env() -> AppConfig {
  let mut cfg = match std::env::var("STORY_CONFIG_PATH") {
    Ok(path) => match std::fs::read_to_string(&path) {
      Ok(s) => match parse_config(&s) {
        Ok(cfg) => {
          info!(target: "storyteller", %path, "Loaded config (TOML)");
          cfg
        }
        Err(e) => {
          error!(target: "storyteller", %path, error = %e, "Failed to parse TOML config; using defaults");
          AppConfig::default()
        }
      },
      Err(e) => {
        error!(target: "storyteller", %path, error = %e, "Failed to read TOML config file; using defaults");
        AppConfig::default()
      }
    },
    Err(_) => AppConfig::default(),
  };
  cfg.apply_env();
  cfg
}
