//! Public protocol structs for WebSocket and HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.

use serde::{Deserialize, Serialize};

use crate::domain::{AppLanguage, CefrLevel, ComplexityTier, Language, StoryResponse, StoryStyle};
use crate::history::StorySession;
use crate::markup::{render_story, Segment};

fn default_true() -> bool { true }

/// Body of a new-story request (HTTP) and payload of `new_story` (WS).
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewStoryIn {
    pub language: Language,
    pub level: CefrLevel,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub style: StoryStyle,
    #[serde(default)]
    pub output_language: AppLanguage,
    #[serde(default = "default_true")]
    pub quiz: bool,
    #[serde(default = "default_true")]
    pub flashcards: bool,
}

/// Messages the client can send over WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientWsMessage {
    Ping,
    NewStory(NewStoryIn),
    NextPage {
        #[serde(rename = "storyId")]
        story_id: String,
    },
    PrevPage {
        #[serde(rename = "storyId")]
        story_id: String,
    },
    RewritePage {
        #[serde(rename = "storyId")]
        story_id: String,
        level: CefrLevel,
    },
    ParseMarkup {
        content: String,
    },
}

/// Messages the server sends back over WebSocket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
    Pong,
    Story {
        story: StoryOut,
    },
    Segments {
        paragraphs: Vec<Vec<Segment>>,
    },
    Error {
        message: String,
    },
}

/// One page plus its parsed paragraphs.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageOut {
    pub index: usize,
    pub story: StoryResponse,
    pub paragraphs: Vec<Vec<Segment>>,
}

/// DTO used by both WS and HTTP for story delivery.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryOut {
    pub id: String,
    pub language: Language,
    pub level: CefrLevel,
    pub style: StoryStyle,
    pub topic: String,
    pub page_count: usize,
    pub has_next: bool,
    pub page: Option<PageOut>,
}

/// Convert the internal session to the public DTO, rendering the current page.
pub fn to_out(s: &StorySession) -> StoryOut {
    let page = s.history.current().map(|story| PageOut {
        index: s.history.current_index(),
        paragraphs: render_story(&story.content),
        story: story.clone(),
    });
    StoryOut {
        id: s.id.clone(),
        language: s.language,
        level: s.level,
        style: s.style,
        topic: s.topic.clone(),
        page_count: s.history.len(),
        has_next: s.history.has_next(),
        page,
    }
}

//
// HTTP request/response DTOs
//

#[derive(Debug, Deserialize)]
pub struct RewriteIn {
    pub level: CefrLevel,
}

#[derive(Debug, Deserialize)]
pub struct MarkupIn {
    pub content: String,
}
#[derive(Serialize)]
pub struct MarkupOut {
    pub paragraphs: Vec<Vec<Segment>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelOut {
    pub level: CefrLevel,
    pub tier: ComplexityTier,
    pub vocab_band: String,
    pub suggested_topics: &'static [&'static str],
}

#[derive(Serialize)]
pub struct StyleOut {
    pub style: StoryStyle,
    pub temperature: f32,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
    pub generator: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}
