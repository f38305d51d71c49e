//! Story history: the pages of one ongoing story.
//!
//! Append-only, except that a rewrite replaces the page at the current index.

use serde::Serialize;

use crate::domain::{AppLanguage, CefrLevel, Language, StoryResponse, StoryStyle};
use crate::error::HistoryError;

#[derive(Clone, Debug, Default, Serialize)]
pub struct StoryHistory {
  pages: Vec<StoryResponse>,
  current: usize,
}

impl StoryHistory {
  pub fn new(first: StoryResponse) -> Self {
    Self { pages: vec![first], current: 0 }
  }

  pub fn len(&self) -> usize {
    self.pages.len()
  }

  pub fn current_index(&self) -> usize {
    self.current
  }

  pub fn current(&self) -> Option<&StoryResponse> {
    self.pages.get(self.current)
  }

  pub fn last(&self) -> Option<&StoryResponse> {
    self.pages.last()
  }

  pub fn has_next(&self) -> bool {
    self.current + 1 < self.pages.len()
  }

  /// Append a generated page and make it current.
  pub fn push(&mut self, page: StoryResponse) {
    self.pages.push(page);
    self.current = self.pages.len() - 1;
  }

  /// Move forward if a later page exists. Returns whether the index moved.
  pub fn advance(&mut self) -> bool {
    if self.has_next() {
      self.current += 1;
      true
    } else {
      false
    }
  }

  pub fn back(&mut self) -> bool {
    if self.current > 0 {
      self.current -= 1;
      true
    } else {
      false
    }
  }

  /// Replace the page a rewrite was started from, even if the reader moved since.
  /// The page count is unchanged.
  pub fn rewrite_at(&mut self, index: usize, page: StoryResponse) -> Result<(), HistoryError> {
    let slot = self.pages.get_mut(index).ok_or(HistoryError::NoCurrentPage)?;
    *slot = page;
    Ok(())
  }
}

/// A story being read: the generation settings plus its history.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StorySession {
  pub id: String,
  pub created_at_ms: u64,
  pub language: Language,
  pub level: CefrLevel,
  pub style: StoryStyle,
  pub topic: String,
  pub app_language: AppLanguage,
  pub quiz_enabled: bool,
  pub flashcards_enabled: bool,
  pub history: StoryHistory,
}
