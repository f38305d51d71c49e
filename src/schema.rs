//! Structured-output schema for the story object.
//!
//! A fixed base record plus optional extensions. Disabled extensions are absent from
//! both the property set and the required list.

use serde_json::{json, Map, Value};

pub const BASE_FIELDS: [&str; 5] = ["title", "shortDescription", "content", "englishTranslation", "grammarPoint"];

/// Required in the schema but defaulted to empty when a reply leaves them out.
const LENIENT_FIELDS: [&str; 2] = ["shortDescription", "grammarPoint"];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchemaExtension {
  Quiz,
  Flashcards,
}

impl SchemaExtension {
  pub fn field_name(self) -> &'static str {
    match self {
      SchemaExtension::Quiz => "quiz",
      SchemaExtension::Flashcards => "vocabularyMetadata",
    }
  }

  fn property(self) -> Value {
    match self {
      SchemaExtension::Quiz => json!({
        "type": "array",
        "items": {
          "type": "object",
          "properties": {
            "question": { "type": "string" },
            "options": { "type": "array", "items": { "type": "string" } },
            "correctAnswer": { "type": "string" },
            "explanation": {
              "type": "string",
              "description": "Explanation of why the answer is correct, in the user's interface language."
            }
          },
          "required": ["question", "options", "correctAnswer", "explanation"]
        }
      }),
      SchemaExtension::Flashcards => json!({
        "type": "object",
        "description": "A mapping of every highlighted {word} to its verified CEFR level and reason for selection.",
        "additionalProperties": {
          "type": "object",
          "properties": {
            "level": { "type": "string" },
            "reason": { "type": "string" }
          },
          "required": ["level", "reason"]
        }
      }),
    }
  }
}

/// Immutable schema descriptor. Build with [`SchemaBuilder`].
#[derive(Clone, Debug, PartialEq)]
pub struct ResponseSchema {
  extensions: Vec<SchemaExtension>,
  json: Value,
}

impl ResponseSchema {
  pub fn properties(&self) -> Vec<&'static str> {
    BASE_FIELDS
      .iter()
      .copied()
      .chain(self.extensions.iter().map(|e| e.field_name()))
      .collect()
  }

  /// Every property is required; optional features are expressed by absence.
  pub fn required(&self) -> Vec<&'static str> {
    self.properties()
  }

  /// Required fields absent (or null) in a decoded reply, lenient fields excepted.
  pub fn missing_fields(&self, reply: &Value) -> Vec<&'static str> {
    self
      .required()
      .into_iter()
      .filter(|f| !LENIENT_FIELDS.contains(f))
      .filter(|f| reply.get(*f).map_or(true, Value::is_null))
      .collect()
  }

  pub fn has(&self, ext: SchemaExtension) -> bool {
    self.extensions.contains(&ext)
  }

  pub fn to_json(&self) -> &Value {
    &self.json
  }
}

#[derive(Clone, Debug, Default)]
pub struct SchemaBuilder {
  quiz: bool,
  flashcards: bool,
}

impl SchemaBuilder {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_quiz(mut self, enabled: bool) -> Self {
    self.quiz = enabled;
    self
  }

  pub fn with_flashcards(mut self, enabled: bool) -> Self {
    self.flashcards = enabled;
    self
  }

  pub fn build(self) -> ResponseSchema {
    let mut extensions = Vec::new();
    if self.quiz { extensions.push(SchemaExtension::Quiz); }
    if self.flashcards { extensions.push(SchemaExtension::Flashcards); }

    let content_description = if self.flashcards {
      "The main body of the story in the target language. Use {word|translation} for highlights. MUST contain multiple paragraphs separated by newlines."
    } else {
      "The main body of the story in the target language. Do NOT use {word|translation} tags. Plain text only. MUST contain multiple paragraphs separated by newlines."
    };

    let mut properties = Map::new();
    properties.insert("title".into(), json!({
      "type": "string",
      "description": "The title of the story in the target language."
    }));
    properties.insert("shortDescription".into(), json!({
      "type": "string",
      "description": "A 1-sentence summary of the story in the user's interface language."
    }));
    properties.insert("content".into(), json!({
      "type": "string",
      "description": content_description
    }));
    properties.insert("englishTranslation".into(), json!({
      "type": "string",
      "description": "A full translation of the story in the user's interface language."
    }));
    properties.insert("grammarPoint".into(), json!({
      "type": "string",
      "description": "A short explanation of a specific grammar rule or structure used in the story, written in the user's interface language."
    }));
    for ext in &extensions {
      properties.insert(ext.field_name().into(), ext.property());
    }

    let required: Vec<&str> = BASE_FIELDS
      .iter()
      .copied()
      .chain(extensions.iter().map(|e| e.field_name()))
      .collect();

    let json = json!({
      "type": "object",
      "properties": Value::Object(properties),
      "required": required,
    });

    ResponseSchema { extensions, json }
  }
}

pub fn build_schema(quiz_enabled: bool, flashcards_enabled: bool) -> ResponseSchema {
  SchemaBuilder::new()
    .with_quiz(quiz_enabled)
    .with_flashcards(flashcards_enabled)
    .build()
}

#[cfg(test)]
mod tests {
  use super::*;

  fn json_keys(schema: &ResponseSchema) -> Vec<String> {
    let mut keys: Vec<String> = schema.to_json()["properties"]
      .as_object()
      .unwrap()
      .keys()
      .cloned()
      .collect();
    keys.sort();
    keys
  }

  fn json_required(schema: &ResponseSchema) -> Vec<String> {
    let mut req: Vec<String> = schema.to_json()["required"]
      .as_array()
      .unwrap()
      .iter()
      .map(|v| v.as_str().unwrap().to_string())
      .collect();
    req.sort();
    req
  }

  #[test]
  fn base_schema_has_exactly_the_five_required_fields() {
    let schema = build_schema(false, false);
    let mut base: Vec<String> = BASE_FIELDS.iter().map(|s| s.to_string()).collect();
    base.sort();
    assert_eq!(json_keys(&schema), base);
    assert_eq!(json_required(&schema), base);
    assert_eq!(schema.properties().len(), 5);
  }

  #[test]
  fn each_flag_adds_one_property_and_one_requirement() {
    for (quiz, cards, field) in [(true, false, "quiz"), (false, true, "vocabularyMetadata")] {
      let schema = build_schema(quiz, cards);
      let keys = json_keys(&schema);
      let req = json_required(&schema);
      assert_eq!(keys.len(), 6);
      assert_eq!(req.len(), 6);
      assert!(keys.iter().any(|k| k == field));
      assert!(req.iter().any(|k| k == field));
    }
    let both = build_schema(true, true);
    assert_eq!(both.required().len(), 7);
    assert!(both.has(SchemaExtension::Quiz) && both.has(SchemaExtension::Flashcards));
  }

  #[test]
  fn content_description_follows_flashcard_flag() {
    let plain = build_schema(false, false);
    let tagged = build_schema(false, true);
    let desc = |s: &ResponseSchema| s.to_json()["properties"]["content"]["description"].as_str().unwrap().to_string();
    assert!(desc(&plain).contains("Do NOT use"));
    assert!(desc(&tagged).contains("Use {word|translation}"));
  }

  #[test]
  fn missing_fields_follow_enabled_extensions() {
    let reply = json!({ "title": "X", "content": "Hola." });
    assert_eq!(build_schema(false, false).missing_fields(&reply), vec!["englishTranslation"]);
    assert_eq!(
      build_schema(true, true).missing_fields(&reply),
      vec!["englishTranslation", "quiz", "vocabularyMetadata"]
    );

    let full = json!({ "title": "X", "content": "Hola.", "englishTranslation": "Hi.", "quiz": [], "vocabularyMetadata": null });
    assert!(build_schema(true, false).missing_fields(&full).is_empty());
    assert_eq!(build_schema(true, true).missing_fields(&full), vec!["vocabularyMetadata"]);
  }
}
