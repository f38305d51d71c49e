//! Story generation driver: draft, then audit, then post-process.
//!
//! Idle -> Drafting -> SanitizingDraft -> Auditing -> SanitizingAudit -> Done,
//! with Auditing failure -> Done(draft). Only the draft phase can fail the call;
//! the audit is a best-effort quality pass. Nothing here retries the draft.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, error, info, instrument, warn};

use crate::capability::{GenerationCall, ReasoningBudget, StructuredGenerator};
use crate::config::{PipelineSettings, Prompts};
use crate::domain::{StoryRequest, StoryResponse, TaskMode};
use crate::error::{CapabilityError, GenerationError, PhaseError};
use crate::level::{vocab_count_for, VocabRange};
use crate::markup::highlighted_words;
use crate::prompt::{compose_audit, compose_draft, ComposedPrompt};
use crate::sanitize::sanitize;
use crate::schema::{build_schema, ResponseSchema, SchemaExtension};
use crate::style::config_for;
use crate::util::trunc_for_log;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GenerationPhase {
  Idle,
  Drafting,
  SanitizingDraft,
  Auditing,
  SanitizingAudit,
  Done,
}

impl GenerationPhase {
  pub fn as_str(self) -> &'static str {
    match self {
      GenerationPhase::Idle => "idle",
      GenerationPhase::Drafting => "drafting",
      GenerationPhase::SanitizingDraft => "sanitizing_draft",
      GenerationPhase::Auditing => "auditing",
      GenerationPhase::SanitizingAudit => "sanitizing_audit",
      GenerationPhase::Done => "done",
    }
  }

  fn sanitizing(self) -> Self {
    match self {
      GenerationPhase::Auditing => GenerationPhase::SanitizingAudit,
      _ => GenerationPhase::SanitizingDraft,
    }
  }
}

fn enter(phase: GenerationPhase) {
  debug!(target: "story", phase = phase.as_str(), "Pipeline phase");
}

/// Local check of the highlighted vocabulary against the level band.
/// Informational only: drift is logged, never re-requested.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VocabularyReport {
  pub highlighted: usize,
  pub band: VocabRange,
  pub missing_metadata: Vec<String>,
}

impl VocabularyReport {
  pub fn inspect(story: &StoryResponse, band: VocabRange) -> Self {
    let surface: BTreeSet<String> = highlighted_words(&story.content)
      .into_iter()
      .map(|u| u.content)
      .collect();
    let missing_metadata = surface
      .iter()
      .filter(|w| {
        !story.vocabulary_metadata.contains_key(w.as_str())
          && !story.vocabulary_metadata.keys().any(|k| k.to_lowercase() == w.to_lowercase())
      })
      .cloned()
      .collect();
    Self { highlighted: surface.len(), band, missing_metadata }
  }

  pub fn in_band(&self) -> bool {
    self.band.contains(self.highlighted)
  }

  pub fn is_clean(&self) -> bool {
    self.in_band() && self.missing_metadata.is_empty()
  }
}

pub struct StoryPipeline {
  generator: Arc<dyn StructuredGenerator>,
  settings: PipelineSettings,
  prompts: Prompts,
}

impl StoryPipeline {
  pub fn new(generator: Arc<dyn StructuredGenerator>, settings: PipelineSettings, prompts: Prompts) -> Self {
    Self { generator, settings, prompts }
  }

  pub fn model_name(&self) -> &str {
    self.generator.model_name()
  }

  pub fn settings(&self) -> &PipelineSettings {
    &self.settings
  }

  #[instrument(
    level = "info",
    skip(self, req),
    fields(language = %req.language, level = %req.level, style = %req.style, mode = mode_name(&req.mode),
           quiz = req.quiz_enabled, flashcards = req.flashcards_enabled, model = %self.generator.model_name())
  )]
  pub async fn generate(&self, req: &StoryRequest) -> Result<StoryResponse, GenerationError> {
    enter(GenerationPhase::Idle);
    let style = config_for(req.style, req.level);
    let band = vocab_count_for(req.level);
    let schema = build_schema(req.quiz_enabled, req.flashcards_enabled);

    let draft_prompt = compose_draft(&self.prompts, req, &style);
    let draft = self
      .call_structured(GenerationPhase::Drafting, draft_prompt, &schema, style.temperature)
      .await
      .map_err(|source| {
        error!(target: "story", error = %source, "Draft phase failed");
        GenerationError::Draft { source }
      })?;
    info!(target: "story", title = %trunc_for_log(&draft.title, 60), "Draft received");

    let story = if self.settings.audit_enabled {
      self.audit(req, &schema, draft).await
    } else {
      draft
    };

    let story = finalize(story, req);
    if schema.has(SchemaExtension::Quiz) {
      let unanswerable = story.quiz.iter().filter(|q| !q.is_answerable()).count();
      if unanswerable > 0 {
        warn!(target: "story", unanswerable, questions = story.quiz.len(), "Quiz answers missing from their options");
      }
    }
    if schema.has(SchemaExtension::Flashcards) {
      let report = VocabularyReport::inspect(&story, band);
      if !report.is_clean() {
        warn!(
          target: "story",
          highlighted = report.highlighted,
          band = %report.band,
          missing_metadata = report.missing_metadata.len(),
          "Highlighted vocabulary drifted from the level band"
        );
      }
    }
    enter(GenerationPhase::Done);
    Ok(story)
  }

  async fn audit(&self, req: &StoryRequest, schema: &ResponseSchema, draft: StoryResponse) -> StoryResponse {
    let draft_json = match serde_json::to_string(&draft) {
      Ok(s) => s,
      Err(e) => {
        warn!(target: "story", error = %e, "Could not serialise draft for audit; keeping draft");
        return draft;
      }
    };

    let attempts = self.settings.audit_retries.saturating_add(1);
    for attempt in 1..=attempts {
      let prompt = compose_audit(&self.prompts, req, &draft_json);
      match self
        .call_structured(GenerationPhase::Auditing, prompt, schema, self.settings.audit_temperature)
        .await
      {
        Ok(audited) => {
          info!(target: "story", attempt, "Audit applied");
          return audited;
        }
        Err(e) => warn!(target: "story", attempt, attempts, error = %e, "Audit phase failed"),
      }
    }
    warn!(target: "story", "Keeping unaudited draft");
    draft
  }

  async fn call_structured(
    &self,
    phase: GenerationPhase,
    prompt: ComposedPrompt,
    schema: &ResponseSchema,
    temperature: f32,
  ) -> Result<StoryResponse, PhaseError> {
    enter(phase);
    let call = GenerationCall {
      system_instruction: Some(prompt.system),
      prompt: prompt.prompt,
      schema: schema.to_json().clone(),
      temperature,
      reasoning: if self.settings.minimal_reasoning { ReasoningBudget::Minimal } else { ReasoningBudget::Default },
    };
    let raw = self.generator.generate(call).await?;

    enter(phase.sanitizing());
    let cleaned = sanitize(&raw);
    if cleaned.is_empty() {
      return Err(CapabilityError::EmptyResponse.into());
    }
    let reply: Value = serde_json::from_str(&cleaned)?;
    let missing = schema.missing_fields(&reply);
    if !missing.is_empty() {
      return Err(PhaseError::NonConformant(format!("missing {}", missing.join(", "))));
    }
    let story: StoryResponse = serde_json::from_value(reply)?;
    if story.content.trim().is_empty() {
      return Err(PhaseError::NonConformant("empty content".into()));
    }
    Ok(story)
  }
}

fn mode_name(mode: &TaskMode) -> &'static str {
  match mode {
    TaskMode::New => "new",
    TaskMode::Continuation { .. } => "continuation",
    TaskMode::Rewrite { .. } => "rewrite",
  }
}

/// Disabled features come back uniformly empty whatever the model produced.
fn finalize(mut story: StoryResponse, req: &StoryRequest) -> StoryResponse {
  if !req.quiz_enabled {
    story.quiz.clear();
  }
  if !req.flashcards_enabled {
    story.vocabulary_metadata.clear();
  }
  story
}

#[cfg(test)]
pub(crate) mod tests {
  use super::*;
  use crate::capability::testing::ScriptedGenerator;
  use crate::domain::{AppLanguage, CefrLevel, Language, StoryStyle};
  use serde_json::json;

  pub fn request(level: CefrLevel, quiz: bool, flashcards: bool, mode: TaskMode) -> StoryRequest {
    StoryRequest {
      language: Language::Spanish,
      level,
      topic: "Pets".into(),
      style: StoryStyle::Standard,
      output_language: AppLanguage::English,
      quiz_enabled: quiz,
      flashcards_enabled: flashcards,
      mode,
    }
  }

  /// Three paragraphs with `n` distinct highlighted words, plus metadata and a quiz.
  pub fn story_json(title: &str, n: usize) -> String {
    let words: Vec<String> = (0..n).map(|i| format!("palabra{i}")).collect();
    let tagged: Vec<String> = words.iter().map(|w| format!("{{{w}|word}}")).collect();
    let third = tagged.len() / 3;
    let content = format!(
      "{}.\n\n{}.\n\n{}.",
      tagged[..third].join(" "),
      tagged[third..2 * third].join(" "),
      tagged[2 * third..].join(" ")
    );
    let metadata: serde_json::Map<String, Value> = words
      .iter()
      .map(|w| (w.clone(), json!({"level": "A1", "reason": "common noun"})))
      .collect();
    json!({
      "title": title,
      "shortDescription": "A story about pets.",
      "content": content,
      "englishTranslation": "Translation.",
      "grammarPoint": "Present simple of 'ser'.",
      "quiz": [{
        "question": "What animal?",
        "options": ["A cat", "A dog"],
        "correctAnswer": "A dog",
        "explanation": "The story is about a dog."
      }],
      "vocabularyMetadata": metadata,
    })
    .to_string()
  }

  fn pipeline(script: Vec<Result<String, CapabilityError>>) -> (Arc<ScriptedGenerator>, StoryPipeline) {
    let generator = Arc::new(ScriptedGenerator::new(script));
    let p = StoryPipeline::new(generator.clone(), PipelineSettings::default(), Prompts::default());
    (generator, p)
  }

  #[tokio::test]
  async fn new_story_end_to_end_meets_a1_expectations() {
    let draft = story_json("El perro", 30);
    let audited = story_json("Mi perro", 28);
    let (generator, p) = pipeline(vec![Ok(format!("```json\n{draft}\n```")), Ok(audited)]);

    let req = request(CefrLevel::A1_1, true, true, TaskMode::New);
    let story = p.generate(&req).await.unwrap();

    assert_eq!(story.title, "Mi perro");
    let report = VocabularyReport::inspect(&story, vocab_count_for(CefrLevel::A1_1));
    assert_eq!(report.band.to_string(), "25-35");
    assert!(report.is_clean(), "{report:?}");
    assert!(!story.quiz.is_empty());
    assert!(story.quiz.iter().all(|q| q.is_answerable()));

    let calls = generator.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].temperature, 0.5);
    assert_eq!(calls[1].temperature, 0.2);
    assert!(calls.iter().all(|c| c.reasoning == ReasoningBudget::Minimal));
    assert_eq!(calls[0].schema, calls[1].schema);
    assert!(calls[0].system_instruction.as_deref().unwrap().contains("CEFR Level Auditor"));
    assert!(calls[1].system_instruction.as_deref().unwrap().contains("Strict Linguistic Editor"));
    assert!(calls[1].prompt.contains("El perro"));
  }

  #[tokio::test]
  async fn audit_transport_failure_returns_draft_unmodified() {
    let draft = story_json("Borrador", 26);
    let (_, p) = pipeline(vec![Ok(draft.clone()), Err(CapabilityError::Transport("reset".into()))]);
    let story = p.generate(&request(CefrLevel::A1_1, true, true, TaskMode::New)).await.unwrap();
    let expected: StoryResponse = serde_json::from_str(&draft).unwrap();
    assert_eq!(story, expected);
  }

  #[tokio::test]
  async fn audit_garbage_also_falls_back() {
    let draft = story_json("Borrador", 26);
    let (_, p) = pipeline(vec![Ok(draft), Ok("not json".into())]);
    let story = p.generate(&request(CefrLevel::A1_1, true, true, TaskMode::New)).await.unwrap();
    assert_eq!(story.title, "Borrador");
  }

  #[tokio::test]
  async fn audit_retries_are_honoured() {
    let generator = Arc::new(ScriptedGenerator::new(vec![
      Ok(story_json("Borrador", 26)),
      Err(CapabilityError::EmptyResponse),
      Ok(story_json("Revisado", 26)),
    ]));
    let settings = PipelineSettings { audit_retries: 1, ..PipelineSettings::default() };
    let p = StoryPipeline::new(generator.clone(), settings, Prompts::default());
    let story = p.generate(&request(CefrLevel::A1_1, true, true, TaskMode::New)).await.unwrap();
    assert_eq!(story.title, "Revisado");
    assert_eq!(generator.calls().len(), 3);
  }

  #[tokio::test]
  async fn audit_reply_missing_fields_keeps_the_draft() {
    let draft = story_json("Borrador", 26);
    let (generator, p) = pipeline(vec![Ok(draft.clone()), Ok(json!({"title": "X", "content": "Hola."}).to_string())]);
    let story = p.generate(&request(CefrLevel::A1_1, true, true, TaskMode::New)).await.unwrap();
    let expected: StoryResponse = serde_json::from_str(&draft).unwrap();
    assert_eq!(story, expected);
    assert_eq!(generator.calls().len(), 2);
  }

  #[tokio::test]
  async fn audit_reply_without_enabled_quiz_keeps_the_draft() {
    let mut stub: Value = serde_json::from_str(&story_json("Revisado", 26)).unwrap();
    stub.as_object_mut().unwrap().remove("quiz");
    let (_, p) = pipeline(vec![Ok(story_json("Borrador", 26)), Ok(stub.to_string())]);
    let story = p.generate(&request(CefrLevel::A1_1, true, true, TaskMode::New)).await.unwrap();
    assert_eq!(story.title, "Borrador");
    assert_eq!(story.quiz.len(), 1);
  }

  #[tokio::test]
  async fn non_conformant_drafts_fail_the_call() {
    for reply in [
      json!({"title": "X", "content": "Hola."}),
      json!({"title": "X", "content": "  ", "englishTranslation": "Hi.", "quiz": [], "vocabularyMetadata": {}}),
    ] {
      let (generator, p) = pipeline(vec![Ok(reply.to_string())]);
      let err = p.generate(&request(CefrLevel::A1_1, true, true, TaskMode::New)).await.unwrap_err();
      assert!(matches!(err, GenerationError::Draft { source: PhaseError::NonConformant(_) }), "{err:?}");
      assert_eq!(generator.calls().len(), 1);
    }
  }

  #[tokio::test]
  async fn reasoning_budget_follows_settings() {
    let generator = Arc::new(ScriptedGenerator::new(vec![Ok(story_json("Solo", 20))]));
    let settings = PipelineSettings { audit_enabled: false, minimal_reasoning: false, ..PipelineSettings::default() };
    let p = StoryPipeline::new(generator.clone(), settings, Prompts::default());
    p.generate(&request(CefrLevel::A2_2, true, true, TaskMode::New)).await.unwrap();
    assert_eq!(generator.calls()[0].reasoning, ReasoningBudget::Default);
  }

  #[tokio::test]
  async fn unbounded_audit_retries_do_not_overflow() {
    let generator = Arc::new(ScriptedGenerator::new(vec![Ok(story_json("Borrador", 26)), Ok(story_json("Revisado", 26))]));
    let settings = PipelineSettings { audit_retries: u32::MAX, ..PipelineSettings::default() };
    let p = StoryPipeline::new(generator.clone(), settings, Prompts::default());
    let story = p.generate(&request(CefrLevel::A1_1, true, true, TaskMode::New)).await.unwrap();
    assert_eq!(story.title, "Revisado");
  }

  #[tokio::test]
  async fn draft_failures_surface_as_generation_errors() {
    for script in [
      vec![Err(CapabilityError::Http { status: 500, message: "boom".into() })],
      vec![Ok("   ".into())],
      vec![Ok("```json\n{\"title\": \n```".into())],
    ] {
      let (generator, p) = pipeline(script);
      let err = p.generate(&request(CefrLevel::B1_1, false, false, TaskMode::New)).await.unwrap_err();
      assert!(matches!(err, GenerationError::Draft { .. }));
      assert_eq!(generator.calls().len(), 1, "draft must not be retried or audited");
    }
  }

  #[tokio::test]
  async fn disabled_features_are_forced_empty() {
    let (generator, p) = pipeline(vec![Ok(story_json("T", 20)), Ok(story_json("T2", 20))]);
    let story = p.generate(&request(CefrLevel::B2_1, false, false, TaskMode::New)).await.unwrap();
    assert!(story.quiz.is_empty());
    assert!(story.vocabulary_metadata.is_empty());
    let schema = &generator.calls()[0].schema;
    assert!(schema["properties"].get("quiz").is_none());
    assert!(schema["properties"].get("vocabularyMetadata").is_none());
  }

  #[tokio::test]
  async fn audit_can_be_switched_off() {
    let generator = Arc::new(ScriptedGenerator::new(vec![Ok(story_json("Solo", 20))]));
    let settings = PipelineSettings { audit_enabled: false, ..PipelineSettings::default() };
    let p = StoryPipeline::new(generator.clone(), settings, Prompts::default());
    let story = p.generate(&request(CefrLevel::A2_2, true, true, TaskMode::New)).await.unwrap();
    assert_eq!(story.title, "Solo");
    assert_eq!(generator.calls().len(), 1);
  }

  #[tokio::test]
  async fn rewrite_targets_the_new_level() {
    let (generator, p) = pipeline(vec![Ok(story_json("El perro", 20)), Ok(story_json("El perro", 20))]);
    let req = request(
      CefrLevel::B1_1,
      true,
      true,
      TaskMode::Rewrite { content: "Hay un {perro|dog}.".into() },
    );
    p.generate(&req).await.unwrap();
    let calls = generator.calls();
    assert!(calls[0].prompt.contains("EXACTLY level B1.1"));
    assert!(calls[0].prompt.contains("Select 18-24 words"));
    let system = calls[0].system_instruction.as_deref().unwrap();
    assert!(system.contains("Simple Passive Voice"));
    assert!(!system.contains("Top 100 nouns only"));
    assert!(calls[1].system_instruction.as_deref().unwrap().contains("B1.1"));
  }

  #[test]
  fn report_flags_missing_metadata_and_out_of_band_counts() {
    let story = StoryResponse {
      title: "t".into(),
      short_description: String::new(),
      content: "{Gato|cat} y {perro|dog}.".into(),
      english_translation: String::new(),
      grammar_point: String::new(),
      quiz: vec![],
      vocabulary_metadata: [("gato".to_string(), Default::default())].into_iter().collect(),
    };
    let report = VocabularyReport::inspect(&story, vocab_count_for(CefrLevel::C1C2));
    assert_eq!(report.highlighted, 2);
    assert!(!report.in_band());
    assert_eq!(report.missing_metadata, vec!["perro".to_string()]);
  }
}
