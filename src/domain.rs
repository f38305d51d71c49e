//! Domain models: CEFR levels, story styles, languages, the generation request and the
//! generated story object.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// CEFR proficiency band, subdivided the way the curriculum is taught.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CefrLevel {
  #[serde(rename = "A1.1")] A1_1,
  #[serde(rename = "A1.2")] A1_2,
  #[serde(rename = "A1.3")] A1_3,
  #[serde(rename = "A2.1")] A2_1,
  #[serde(rename = "A2.2")] A2_2,
  #[serde(rename = "B1.1")] B1_1,
  #[serde(rename = "B1.2")] B1_2,
  #[serde(rename = "B2.1")] B2_1,
  #[serde(rename = "B2.2")] B2_2,
  #[serde(rename = "C1-C2")] C1C2,
}

/// Coarse complexity classification used by style instructions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplexityTier {
  Beginner,
  Advanced,
}

impl CefrLevel {
  /// Curriculum order, lowest first.
  pub const ALL: [CefrLevel; 10] = [
    CefrLevel::A1_1, CefrLevel::A1_2, CefrLevel::A1_3,
    CefrLevel::A2_1, CefrLevel::A2_2,
    CefrLevel::B1_1, CefrLevel::B1_2,
    CefrLevel::B2_1, CefrLevel::B2_2,
    CefrLevel::C1C2,
  ];

  pub fn label(self) -> &'static str {
    match self {
      CefrLevel::A1_1 => "A1.1",
      CefrLevel::A1_2 => "A1.2",
      CefrLevel::A1_3 => "A1.3",
      CefrLevel::A2_1 => "A2.1",
      CefrLevel::A2_2 => "A2.2",
      CefrLevel::B1_1 => "B1.1",
      CefrLevel::B1_2 => "B1.2",
      CefrLevel::B2_1 => "B2.1",
      CefrLevel::B2_2 => "B2.2",
      CefrLevel::C1C2 => "C1-C2",
    }
  }

  /// All A1 sub-levels and A2.1 are treated as beginner material.
  pub fn tier(self) -> ComplexityTier {
    match self {
      CefrLevel::A1_1 | CefrLevel::A1_2 | CefrLevel::A1_3 | CefrLevel::A2_1 => ComplexityTier::Beginner,
      _ => ComplexityTier::Advanced,
    }
  }

  pub fn is_beginner(self) -> bool {
    self.tier() == ComplexityTier::Beginner
  }
}

impl fmt::Display for CefrLevel {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.label())
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant(pub String);

impl fmt::Display for UnknownVariant {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "unknown value '{}'", self.0)
  }
}

impl std::error::Error for UnknownVariant {}

impl FromStr for CefrLevel {
  type Err = UnknownVariant;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let s = s.trim();
    CefrLevel::ALL
      .into_iter()
      .find(|l| l.label().eq_ignore_ascii_case(s))
      .ok_or_else(|| UnknownVariant(s.to_string()))
  }
}

/// Narrative style of a generated story.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum StoryStyle {
  Adventure,
  // Older clients saved these under their long labels.
  #[serde(alias = "Bedtime Story")]
  Bedtime,
  Biography,
  #[serde(alias = "Dialogue-heavy")]
  Dialogue,
  Diary,
  Fantasy,
  Funny,
  History,
  Mystery,
  News,
  Romance,
  #[serde(rename = "Sci-Fi")]
  SciFi,
  Serious,
  #[default]
  Standard,
  Thriller,
}

impl StoryStyle {
  pub const ALL: [StoryStyle; 15] = [
    StoryStyle::Adventure, StoryStyle::Bedtime, StoryStyle::Biography, StoryStyle::Dialogue,
    StoryStyle::Diary, StoryStyle::Fantasy, StoryStyle::Funny, StoryStyle::History,
    StoryStyle::Mystery, StoryStyle::News, StoryStyle::Romance, StoryStyle::SciFi,
    StoryStyle::Serious, StoryStyle::Standard, StoryStyle::Thriller,
  ];

  pub fn label(self) -> &'static str {
    match self {
      StoryStyle::Adventure => "Adventure",
      StoryStyle::Bedtime => "Bedtime",
      StoryStyle::Biography => "Biography",
      StoryStyle::Dialogue => "Dialogue",
      StoryStyle::Diary => "Diary",
      StoryStyle::Fantasy => "Fantasy",
      StoryStyle::Funny => "Funny",
      StoryStyle::History => "History",
      StoryStyle::Mystery => "Mystery",
      StoryStyle::News => "News",
      StoryStyle::Romance => "Romance",
      StoryStyle::SciFi => "Sci-Fi",
      StoryStyle::Serious => "Serious",
      StoryStyle::Standard => "Standard",
      StoryStyle::Thriller => "Thriller",
    }
  }

  /// Genre heading used at the top of the style instructions.
  pub fn genre_name(self) -> &'static str {
    match self {
      StoryStyle::Adventure => "ADVENTURE",
      StoryStyle::Bedtime => "BEDTIME STORY",
      StoryStyle::Biography => "BIOGRAPHY",
      StoryStyle::Dialogue => "DIALOGUE / SCRIPT",
      StoryStyle::Diary => "DIARY ENTRY",
      StoryStyle::Fantasy => "FANTASY",
      StoryStyle::Funny => "COMEDY / FUNNY",
      StoryStyle::History => "HISTORICAL FICTION / HISTORY",
      StoryStyle::Mystery => "MYSTERY",
      StoryStyle::News => "NEWS ARTICLE",
      StoryStyle::Romance => "ROMANCE",
      StoryStyle::SciFi => "SCIENCE FICTION",
      StoryStyle::Serious => "SERIOUS / DRAMA",
      StoryStyle::Standard => "STANDARD STORY",
      StoryStyle::Thriller => "THRILLER",
    }
  }
}

impl fmt::Display for StoryStyle {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.label())
  }
}

/// Target language the story is written in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
  Bulgarian, Chinese, Croatian, Czech, Danish, Dutch, English,
  Estonian, Finnish, French, German, Greek, Hungarian,
  Irish, Italian, Japanese, Korean, Latvian, Lithuanian, Maltese, Polish,
  Portuguese, Romanian, Slovak, Slovenian, Spanish, Swedish, Vietnamese,
}

impl fmt::Display for Language {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    // Variant names are the English language names.
    fmt::Debug::fmt(self, f)
  }
}

/// Interface language: short description, grammar point, quiz explanations and
/// vocabulary translations are written in it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum AppLanguage {
  #[default]
  English,
  Finnish,
  Vietnamese,
}

impl fmt::Display for AppLanguage {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    fmt::Debug::fmt(self, f)
  }
}

/// What the generation call is asked to do.
#[derive(Clone, Debug, PartialEq)]
pub enum TaskMode {
  /// Fresh story about the request topic.
  New,
  /// Next part of a story; the previous page is context and must not be repeated.
  Continuation { previous_title: String, previous_content: String },
  /// Same plot and characters, regenerated strictly at the request level.
  Rewrite { content: String },
}

#[derive(Clone, Debug)]
pub struct StoryRequest {
  pub language: Language,
  pub level: CefrLevel,
  pub topic: String,
  pub style: StoryStyle,
  pub output_language: AppLanguage,
  pub quiz_enabled: bool,
  pub flashcards_enabled: bool,
  pub mode: TaskMode,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
  pub question: String,
  pub options: Vec<String>,
  pub correct_answer: String,
  #[serde(default)]
  pub explanation: String,
}

impl QuizQuestion {
  pub fn is_answerable(&self) -> bool {
    self.options.iter().any(|o| o == &self.correct_answer)
  }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Default)]
pub struct VocabEntry {
  #[serde(default)] pub level: String,
  #[serde(default)] pub reason: String,
}

/// One generated page. Immutable once handed out by the pipeline.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryResponse {
  pub title: String,
  #[serde(default)]
  pub short_description: String,
  pub content: String,
  pub english_translation: String,
  #[serde(default)]
  pub grammar_point: String,
  #[serde(default)]
  pub quiz: Vec<QuizQuestion>,
  #[serde(default)]
  pub vocabulary_metadata: BTreeMap<String, VocabEntry>,
}
