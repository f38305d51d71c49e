//! Style policy: genre instructions and sampling temperature per (style, level).
//!
//! The same genre is structurally simpler for beginner tiers. Factual styles run cold,
//! comedic and fantastical ones run hot.

use crate::domain::{CefrLevel, StoryStyle};

#[derive(Clone, Debug, PartialEq)]
pub struct StyleConfig {
  pub instructions: String,
  pub temperature: f32,
}

pub fn temperature_for(style: StoryStyle) -> f32 {
  match style {
    StoryStyle::News => 0.2,
    StoryStyle::Biography | StoryStyle::History => 0.3,
    StoryStyle::Bedtime | StoryStyle::Serious => 0.4,
    StoryStyle::Dialogue | StoryStyle::Diary | StoryStyle::Standard => 0.5,
    StoryStyle::Adventure | StoryStyle::Mystery | StoryStyle::Romance => 0.6,
    StoryStyle::Fantasy | StoryStyle::SciFi | StoryStyle::Thriller => 0.7,
    StoryStyle::Funny => 0.8,
  }
}

pub fn config_for(style: StoryStyle, level: CefrLevel) -> StyleConfig {
  let beginner = level.is_beginner();
  let pick = |simple: &str, rich: &str| if beginner { simple.to_string() } else { rich.to_string() };

  let body: Vec<String> = match style {
    StoryStyle::Adventure => vec![
      "Focus on action, travel, and discovery.".into(),
      pick(
        "Keep the plot linear. Simple 'Problem -> Journey -> Solution' structure.",
        "Include suspense, diverse locations, and unexpected obstacles.",
      ),
    ],
    StoryStyle::Bedtime => vec![
      "Tone: Soothing, calm, repetitive, and gentle.".into(),
      "Structure: Begin with \"Once upon a time\" (or language equivalent) and end happily.".into(),
      pick(
        "Use heavy repetition of key vocabulary for reinforcement.",
        "Use descriptive, dream-like imagery.",
      ),
    ],
    StoryStyle::Biography => vec![
      "Format: Factual account of a person's life (real or fictional).".into(),
      "Tone: Respectful, informative, chronological.".into(),
      pick(
        "Focus on basic life events: birth, school, job, family.",
        "Discuss achievements, historical context, and legacy.",
      ),
    ],
    StoryStyle::Dialogue => vec![
      "Format: Use a script format (e.g., 'Person A: [Text]').".into(),
      format!("Focus: Spoken language, natural conversational fillers appropriate for {level}."),
      pick(
        "Topics: Greetings, ordering food, asking directions.",
        "Topics: Debates, expressing complex opinions, negotiating.",
      ),
    ],
    StoryStyle::Diary => vec![
      "Format: Start with a date or 'Dear Diary'. First-person perspective ('I').".into(),
      "Tone: Personal, reflective, informal.".into(),
      pick(
        "Describe daily routine, weather, and basic feelings.",
        "Express deep thoughts, regrets, hopes, and complex emotions.",
      ),
    ],
    StoryStyle::Fantasy => vec![
      "Elements: Magic, mythical creatures, imaginary worlds.".into(),
      pick(
        "Keep magic simple (e.g., a flying cat, a magic stone). Avoid complex lore.",
        "Build a rich world. Use descriptive adjectives for settings.",
      ),
    ],
    StoryStyle::Funny => vec![
      "Goal: Make the reader laugh using situational humor.".into(),
      pick(
        "Use physical comedy or simple misunderstandings. NO puns or wordplay (too hard).",
        "Use wit, irony, and sarcasm.",
      ),
    ],
    StoryStyle::History => vec![
      "Setting: A specific time in the past.".into(),
      pick(
        "Focus on a single event or day. Use simple Past Simple sentences.",
        "Describe the era, costumes, and social atmosphere.",
      ),
    ],
    StoryStyle::Mystery => vec![
      "Plot: A puzzle, missing object, or strange event needs solving.".into(),
      pick(
        "The solution should be obvious and physical (e.g., the dog hid the keys).",
        "Include red herrings and subtle clues.",
      ),
    ],
    StoryStyle::News => vec![
      "Format: Headline at the top. Third-person 'Reporter' voice.".into(),
      "Tone: Objective, factual, formal.".into(),
      pick(
        "Short sentences. 'Who, What, Where'. Simple reported speech.",
        "Use passive voice. 'It was reported that...'. Interview quotes.",
      ),
    ],
    StoryStyle::Romance => vec![
      "Focus: Relationships, feelings, dates.".into(),
      "Tone: Warm, emotional.".into(),
      pick(
        "Focus on first meeting, liking someone, going to the movies.",
        "Focus on deep connection, relationship struggles, and resolution.",
      ),
    ],
    StoryStyle::SciFi => vec![
      "Elements: Robots, space, future technology.".into(),
      pick(
        "Focus on everyday life with a robot helper. Simple gadgets.",
        "Explore themes of AI, space travel, or ethical dilemmas.",
      ),
    ],
    StoryStyle::Serious => vec![
      "Tone: Grounded, realistic, perhaps slightly melancholic or focused on important issues.".into(),
      pick(
        "A serious day at work or a lost pet.",
        "Social issues, personal loss, or difficult decisions.",
      ),
    ],
    StoryStyle::Thriller => vec![
      "Tone: Tense, urgent, fast-paced.".into(),
      pick(
        "Someone is late, running for a bus, or hearing a strange noise.",
        "High stakes, racing against time, psychological tension.",
      ),
    ],
    StoryStyle::Standard => vec![
      "A balanced, engaging narrative suitable for general reading practice.".into(),
      pick(
        "Keep one main character and one simple event.",
        "Allow a small cast and a clear turning point.",
      ),
    ],
  };

  let mut instructions = format!("GENRE: {}.", style.genre_name());
  for line in body {
    instructions.push_str("\n- ");
    instructions.push_str(&line);
  }

  StyleConfig { instructions, temperature: temperature_for(style) }
}
