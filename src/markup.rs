//! Inline vocabulary markup: `{surface form|translation}` tokens inside story prose.
//!
//! Parsing is pure. A paragraph is split into plain text and vocabulary units, then
//! punctuation touching a unit is moved onto it so it renders glued to its word.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

static TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{([^{}|]*)\|([^{}|]*)\}").expect("static token pattern"));

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct VocabUnit {
  pub content: String,
  pub translation: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub pre: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub post: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Segment {
  Text { content: String },
  Vocab(VocabUnit),
}

impl Segment {
  fn text(s: &str) -> Self {
    Segment::Text { content: s.to_string() }
  }
}

fn is_opening(c: char) -> bool {
  matches!(c, '(' | '[' | '{' | '"' | '«' | '“' | '‘' | '„' | '¿' | '¡')
}

fn is_closing(c: char) -> bool {
  matches!(c, '.' | ',' | ')' | ']' | '}' | '"' | '»' | '”' | '’' | '!' | '?' | ';' | ':' | '…')
}

fn push_text(segments: &mut Vec<Segment>, s: &str) {
  if s.is_empty() {
    return;
  }
  match segments.last_mut() {
    Some(Segment::Text { content }) => content.push_str(s),
    _ => segments.push(Segment::text(s)),
  }
}

fn take_trailing(text: &mut String, pred: fn(char) -> bool) -> Option<String> {
  let keep = text.trim_end_matches(pred).len();
  if keep == text.len() { None } else { Some(text.split_off(keep)) }
}

fn take_leading(text: &mut String, pred: fn(char) -> bool) -> Option<String> {
  let cut = text.len() - text.trim_start_matches(pred).len();
  if cut == 0 { None } else { Some(text.drain(..cut).collect()) }
}

/// Parse one paragraph into ordered segments. Malformed tokens stay literal text.
pub fn parse_paragraph(text: &str) -> Vec<Segment> {
  let mut segments = Vec::new();
  let mut last = 0;

  for caps in TOKEN.captures_iter(text) {
    let Some(whole) = caps.get(0) else { continue };
    push_text(&mut segments, &text[last..whole.start()]);

    let word = caps.get(1).map_or("", |m| m.as_str()).trim();
    let translation = caps.get(2).map_or("", |m| m.as_str()).trim();
    if word.is_empty() || translation.is_empty() {
      push_text(&mut segments, whole.as_str());
    } else {
      segments.push(Segment::Vocab(VocabUnit {
        content: word.to_string(),
        translation: translation.to_string(),
        pre: None,
        post: None,
      }));
    }
    last = whole.end();
  }
  push_text(&mut segments, &text[last..]);

  reattach_punctuation(&mut segments);
  segments.retain(|s| !matches!(s, Segment::Text { content } if content.is_empty()));
  segments
}

fn reattach_punctuation(segments: &mut [Segment]) {
  for i in 0..segments.len() {
    if !matches!(segments[i], Segment::Vocab(_)) {
      continue;
    }
    let pre = match i.checked_sub(1) {
      Some(j) => match &mut segments[j] {
        Segment::Text { content } => take_trailing(content, is_opening),
        Segment::Vocab(_) => None,
      },
      None => None,
    };
    let post = match segments.get_mut(i + 1) {
      Some(Segment::Text { content }) => take_leading(content, is_closing),
      _ => None,
    };
    if let Segment::Vocab(unit) = &mut segments[i] {
      unit.pre = pre;
      unit.post = post;
    }
  }
}

/// Split story content into paragraphs. A literal backslash-n counts as a newline.
pub fn split_paragraphs(content: &str) -> Vec<String> {
  content
    .replace("\\n", "\n")
    .split('\n')
    .map(str::trim)
    .filter(|p| !p.is_empty())
    .map(str::to_string)
    .collect()
}

/// Paragraphs of segments, ready for the display layer.
pub fn render_story(content: &str) -> Vec<Vec<Segment>> {
  split_paragraphs(content).iter().map(|p| parse_paragraph(p)).collect()
}

/// Every vocabulary unit in the content, in reading order.
pub fn highlighted_words(content: &str) -> Vec<VocabUnit> {
  render_story(content)
    .into_iter()
    .flatten()
    .filter_map(|s| match s {
      Segment::Vocab(unit) => Some(unit),
      Segment::Text { .. } => None,
    })
    .collect()
}
