//! Level policy: grammar/vocabulary envelope and highlight band per CEFR level.
//!
//! Each level is an allow-list plus a deny-list. Lower levels deny everything the
//! curriculum has not reached yet, so the generator cannot drift upwards by default.
//! Curriculum order: Present Simple, Past Simple, Present Perfect, Passive,
//! Conditionals, Mixed Conditionals, unrestricted.

use std::fmt;

use crate::domain::CefrLevel;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LevelConstraints {
  pub positive: &'static str,
  pub forbidden: &'static str,
}

impl LevelConstraints {
  /// Block embedded in the system instruction.
  pub fn render(&self) -> String {
    format!("- POSITIVE: {}\n- FORBIDDEN: {}", self.positive, self.forbidden)
  }
}

/// Inclusive range of words to highlight as flashcards.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VocabRange {
  pub min: usize,
  pub max: usize,
}

impl VocabRange {
  pub fn contains(&self, n: usize) -> bool {
    (self.min..=self.max).contains(&n)
  }
}

impl fmt::Display for VocabRange {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}-{}", self.min, self.max)
  }
}

pub fn constraints_for(level: CefrLevel) -> LevelConstraints {
  match level {
    CefrLevel::A1_1 => LevelConstraints {
      positive: "Top 100 nouns only. Present Simple 'be' and 'have'. Short sentences.",
      forbidden: "NO 'but', NO 'because', NO Past tenses, NO Future tenses, NO adjectives (except colors/size), NO dependent clauses.",
    },
    CefrLevel::A1_2 => LevelConstraints {
      positive: "Basic Present Simple. Connectors: 'and', 'or'.",
      forbidden: "NO Past Continuous, NO Perfect tenses, NO 'if' clauses, NO 'when' clauses.",
    },
    CefrLevel::A1_3 => LevelConstraints {
      positive: "Past Simple (Regular verbs), Present Continuous. Connector: 'because'.",
      forbidden: "NO Passive voice, NO Conditional moods, NO Irregular past forms unless very common (went, saw).",
    },
    CefrLevel::A2_1 => LevelConstraints {
      positive: "Future 'will', basic Comparatives (better, bigger).",
      forbidden: "NO Present Perfect, NO Modal verbs like 'should' or 'must'.",
    },
    CefrLevel::A2_2 => LevelConstraints {
      positive: "Present Perfect, Modal verbs (can, must), First Conditional.",
      forbidden: "NO Past Perfect, NO Third Conditional, NO Passive Voice.",
    },
    CefrLevel::B1_1 => LevelConstraints {
      positive: "Simple Passive Voice, Second Conditional.",
      forbidden: "NO Future Perfect, NO Subjunctive Mood, NO Inversion.",
    },
    CefrLevel::B1_2 => LevelConstraints {
      positive: "Past Perfect, Reported Speech, Connector: 'although'.",
      forbidden: "NO Mixed Conditionals, NO complex Gerund vs Infinitive nuances.",
    },
    CefrLevel::B2_1 => LevelConstraints {
      positive: "Future Continuous, Mixed Conditionals.",
      forbidden: "NO Archaic vocabulary, NO overly formal academic structures.",
    },
    CefrLevel::B2_2 => LevelConstraints {
      positive: "All tenses and moods including Future Perfect, Subjunctive and Inversion for emphasis. Idiomatic expressions in common use.",
      forbidden: "NO Archaic vocabulary, NO dense academic or legal register.",
    },
    CefrLevel::C1C2 => LevelConstraints {
      positive: "Unrestricted natural language: full range of grammar, nuanced vocabulary, idioms and stylistic variation.",
      forbidden: "NO obscure archaisms, NO regional slang the context does not explain.",
    },
  }
}

pub fn vocab_count_for(level: CefrLevel) -> VocabRange {
  match level {
    CefrLevel::A1_1 | CefrLevel::A1_2 | CefrLevel::A1_3 => VocabRange { min: 25, max: 35 },
    CefrLevel::A2_1 | CefrLevel::A2_2 => VocabRange { min: 20, max: 28 },
    CefrLevel::B1_1 | CefrLevel::B1_2 => VocabRange { min: 18, max: 24 },
    CefrLevel::B2_1 | CefrLevel::B2_2 => VocabRange { min: 15, max: 20 },
    CefrLevel::C1C2 => VocabRange { min: 12, max: 18 },
  }
}

/// Suggested topics per level, easiest first. The first entry is the empty-topic default.
pub fn topics_for(level: CefrLevel) -> &'static [&'static str] {
  match level {
    CefrLevel::A1_1 => &["Greetings", "Colors", "Numbers", "Family", "Pets", "House", "Classroom", "Weekdays", "Fruits", "Body", "Objects", "Weather", "Intro", "Country", "Yes/No", "Names"],
    CefrLevel::A1_2 => &["Routine", "Room", "Coffee", "Directions", "Hobbies", "Time", "Clothes", "Seasons", "Transport", "Friends", "Food", "Market", "Emotions", "Jobs", "Weekend", "Pet"],
    CefrLevel::A1_3 => &["Birthday", "Holidays", "Shopping", "Menu", "School", "People", "Town", "Picnic", "Sports", "Music", "TV", "Weekend", "Holiday", "Email", "Sickness", "Apartment"],
    CefrLevel::A2_1 => &["Travel", "Doctor", "Hotel", "Advice", "Cooking", "Bus", "Movies", "Celebrities", "Childhood", "Nature", "Tech", "Shopping", "Party", "Apologies", "Restaurant", "Weather"],
    CefrLevel::A2_2 => &["Interview", "Problems", "Accident", "Festivals", "Education", "Media", "Health", "Recycling", "Books", "Goals", "Dating", "Rules", "Complaints", "Culture", "Directions", "Emergency"],
    CefrLevel::B1_1 => &["Careers", "News", "Tech", "Fitness", "Travel", "University", "Art", "Society", "Climate", "Traditions", "Ads", "Personality", "Languages", "Remote Work", "Volunteers", "Rural"],
    CefrLevel::B1_2 => &["Politics", "Economics", "Science", "Mental Health", "Globalization", "History", "Architecture", "Fashion", "Consumers", "Education", "Space", "AI", "Law", "Immigration", "Speech", "Biography"],
    CefrLevel::B2_1 => &["Business", "Geopolitics", "Ethics", "Philosophy", "Science", "Literature", "Music", "Theatre", "Psychology", "Relations", "Energy", "Crisis", "Culture", "Journalism", "Dining", "Investing"],
    CefrLevel::B2_2 => &["Diplomacy", "Innovation", "Criticism", "Welfare", "Urbanism", "Sociology", "Theology", "Astronomy", "Genomics", "Security", "Taxes", "Heritage", "Rhetoric", "Satire", "Mindfulness", "Leadership"],
    CefrLevel::C1C2 => &["Metaphysics", "Physics", "Geopolitics", "Nuance", "Irony", "Dialects", "Law", "Neuroscience", "Cosmology", "Existentialism", "Aesthetics", "Ideology", "Anthropology", "Epistemology", "Paradoxes", "Biochemistry"],
  }
}
