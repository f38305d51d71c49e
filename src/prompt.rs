//! Prompt composition for the draft and audit calls.
//!
//! The system instruction carries persona and absolute level constraints; the task
//! prompt carries the creative task. Persona templates come from `Prompts` so they can
//! be tuned in TOML.

use crate::config::Prompts;
use crate::domain::{StoryRequest, TaskMode};
use crate::level::{constraints_for, vocab_count_for};
use crate::style::StyleConfig;
use crate::util::fill_template;

const LENGTH_RULE: &str = "LENGTH: 200-300 words. 3 distinct paragraphs. Use \\n\\n separators.";

#[derive(Clone, Debug, PartialEq)]
pub struct ComposedPrompt {
  pub system: String,
  pub prompt: String,
}

pub fn draft_system_instruction(prompts: &Prompts, req: &StoryRequest) -> String {
  let constraints = constraints_for(req.level).render();
  fill_template(
    &prompts.draft_system,
    &[("level", req.level.label()), ("constraints", &constraints)],
  )
}

fn task_instructions(req: &StoryRequest) -> String {
  let language = req.language.to_string();
  match &req.mode {
    TaskMode::New => format!(
      "TASK: Generate a {language} story about \"{topic}\".\nDRAFTING: Write a coherent narrative in {language}.",
      topic = req.topic,
    ),
    TaskMode::Continuation { previous_title, previous_content } => format!(
      "TASK: Generate the next part of a {language} story about \"{topic}\".\n\
       CONTEXT: This is a continuation of the previous part titled \"{previous_title}\": \"{previous_content}\"\n\
       DRAFTING: Continue the plot with the same characters in {language}. Do NOT repeat or summarise the previous part.",
      topic = req.topic,
    ),
    TaskMode::Rewrite { content } => format!(
      "TASK: REWRITE the provided story content to be EXACTLY level {level}.\n\
       - Maintain the original plot, characters, and meaning.\n\
       - Adjust vocabulary and grammar to match {level}.\n\
       - ORIGINAL CONTENT: \"{content}\"",
      level = req.level,
    ),
  }
}

pub fn task_prompt(req: &StoryRequest, style: &StyleConfig) -> String {
  let out = req.output_language;
  let mut metadata = format!("   - shortDescription in {out}\n   - grammarPoint in {out}");
  if req.quiz_enabled {
    metadata.push_str(&format!("\n   - quiz explanations in {out}"));
  }

  let highlighting = if req.flashcards_enabled {
    format!(
      "3. HIGHLIGHTING: Select {count} words and mark each as {{inflected_word|translation}}. \
       Use the inflected form exactly as it appears in the sentence (not the dictionary form). \
       The translation must be in {out}.",
      count = vocab_count_for(req.level),
    )
  } else {
    "3. HIGHLIGHTING: None. Do not use {word|translation} tags.".to_string()
  };

  let mut prompt = format!(
    "{task}\n\nCONFIGURATION:\n{style}\n\nREQUIREMENTS:\n1. {LENGTH_RULE}\n2. METADATA (all in {out}, not in {language}):\n{metadata}\n{highlighting}\n",
    task = task_instructions(req),
    style = style.instructions,
    language = req.language,
  );
  if req.flashcards_enabled {
    prompt.push_str("\nVOCABULARY METADATA:\n- Map every highlighted word to its CEFR level and the reason it was selected in 'vocabularyMetadata'.\n");
  }
  if req.quiz_enabled {
    prompt.push_str("\nQUIZ:\n- Every correctAnswer must be copied verbatim from its options.\n");
  }
  prompt.push_str("\nOUTPUT FORMAT: JSON matching the schema.");
  prompt
}

pub fn compose_draft(prompts: &Prompts, req: &StoryRequest, style: &StyleConfig) -> ComposedPrompt {
  ComposedPrompt {
    system: draft_system_instruction(prompts, req),
    prompt: task_prompt(req, style),
  }
}

pub fn audit_system_instruction(prompts: &Prompts, req: &StoryRequest) -> String {
  let tag_rule = if req.flashcards_enabled {
    "PRESERVE all {word|translation} tags exactly as they are unless the word itself is grammatically wrong."
  } else {
    "Do not add highlighting tags."
  };
  let language = req.language.to_string();
  fill_template(
    &prompts.audit_system,
    &[("language", &language), ("level", req.level.label()), ("tag_rule", tag_rule)],
  )
}

pub fn audit_prompt(draft_json: &str) -> String {
  format!(
    "Here is the drafted story object:\n{draft_json}\n\nPlease review, edit, and fix any mistakes. Return the final polished JSON."
  )
}

pub fn compose_audit(prompts: &Prompts, req: &StoryRequest, draft_json: &str) -> ComposedPrompt {
  ComposedPrompt {
    system: audit_system_instruction(prompts, req),
    prompt: audit_prompt(draft_json),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::{AppLanguage, CefrLevel, Language, StoryStyle};
  use crate::style::config_for;

  fn request(mode: TaskMode, flashcards: bool, quiz: bool) -> StoryRequest {
    StoryRequest {
      language: Language::Spanish,
      level: CefrLevel::A1_1,
      topic: "Pets".into(),
      style: StoryStyle::Standard,
      output_language: AppLanguage::Finnish,
      quiz_enabled: quiz,
      flashcards_enabled: flashcards,
      mode,
    }
  }

  #[test]
  fn system_instruction_restates_level_constraints() {
    let req = request(TaskMode::New, true, true);
    let sys = draft_system_instruction(&Prompts::default(), &req);
    assert!(sys.contains("CEFR Level Auditor"));
    assert!(sys.contains("TARGET LEVEL: A1.1"));
    assert!(sys.contains(constraints_for(CefrLevel::A1_1).forbidden));
    assert!(!sys.contains("{constraints}"));
  }

  #[test]
  fn new_story_prompt_carries_topic_band_and_metadata_language() {
    let req = request(TaskMode::New, true, true);
    let p = task_prompt(&req, &config_for(req.style, req.level));
    assert!(p.contains("Spanish story about \"Pets\""));
    assert!(p.contains("Select 25-35 words"));
    assert!(p.contains("{inflected_word|translation}"));
    assert!(p.contains("shortDescription in Finnish"));
    assert!(p.contains("quiz explanations in Finnish"));
    assert!(p.contains("GENRE: STANDARD STORY."));
    assert!(p.contains("200-300 words"));
  }

  #[test]
  fn disabled_features_drop_their_instructions() {
    let req = request(TaskMode::New, false, false);
    let p = task_prompt(&req, &config_for(req.style, req.level));
    assert!(p.contains("HIGHLIGHTING: None."));
    assert!(!p.contains("VOCABULARY METADATA"));
    assert!(!p.contains("quiz explanations"));
  }

  #[test]
  fn continuation_and_rewrite_modes_change_the_task() {
    let cont = request(
      TaskMode::Continuation { previous_title: "El gato".into(), previous_content: "Hay un gato.".into() },
      true,
      false,
    );
    let p = task_prompt(&cont, &config_for(cont.style, cont.level));
    assert!(p.contains("next part"));
    assert!(p.contains("\"Hay un gato.\""));
    assert!(p.contains("Do NOT repeat"));

    let mut rw = request(TaskMode::Rewrite { content: "Hay un gato.".into() }, true, false);
    rw.level = CefrLevel::B1_1;
    let p = task_prompt(&rw, &config_for(rw.style, rw.level));
    assert!(p.contains("REWRITE"));
    assert!(p.contains("EXACTLY level B1.1"));
    assert!(p.contains("ORIGINAL CONTENT: \"Hay un gato.\""));
  }

  #[test]
  fn audit_instruction_follows_flashcard_flag() {
    let with = audit_system_instruction(&Prompts::default(), &request(TaskMode::New, true, false));
    let without = audit_system_instruction(&Prompts::default(), &request(TaskMode::New, false, false));
    assert!(with.contains("PRESERVE all {word|translation} tags"));
    assert!(without.contains("Do not add highlighting tags."));
    assert!(with.contains("Spanish") && with.contains("A1.1"));
    assert!(audit_prompt("{\"title\":\"x\"}").contains("{\"title\":\"x\"}"));
  }
}
