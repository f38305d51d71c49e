//! WebSocket upgrade + message loop. Each client message is parsed as JSON and
//! forwarded to core logic. We reply with a single JSON message per request.

use std::sync::Arc;
use axum::{
  extract::{
    ws::{Message, WebSocket},
    State, WebSocketUpgrade,
  },
  response::IntoResponse,
};
use tracing::{info, error, instrument, debug};

use crate::error::ApiError;
use crate::protocol::{ClientWsMessage, ServerWsMessage, StoryOut};
use crate::logic::*;
use crate::state::AppState;

#[instrument(level = "info", skip(state))]
pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
  info!(target: "storyteller", "WebSocket upgrade requested");
  ws.on_upgrade(move |socket| handle_ws(socket, state))
}

#[instrument(level = "info", skip(socket, state))]
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
  info!(target: "storyteller", "WebSocket connected");
  while let Some(Ok(msg)) = socket.recv().await {
    match msg {
      Message::Text(txt) => {
        // Parse, dispatch, serialize response.
        let reply_msg = match serde_json::from_str::<ClientWsMessage>(&txt) {
          Ok(incoming) => {
            debug!(target: "storyteller", "WS received: {:?}", &incoming);
            handle_client_ws(incoming, &state).await
          }
          Err(e) => ServerWsMessage::Error { message: format!("Invalid JSON: {}", e) },
        };

        let out = serde_json::to_string(&reply_msg).unwrap_or_else(|e| {
          serde_json::json!({ "type": "error", "message": format!("Serialization error: {}", e) }).to_string()
        });

        if let Err(e) = socket.send(Message::Text(out)).await {
          error!(target: "storyteller", error = %e, "WS send error");
          break;
        }
      }
      Message::Ping(payload) => { let _ = socket.send(Message::Pong(payload)).await; }
      Message::Close(_) => break,
      _ => {}
    }
  }
  info!(target: "storyteller", "WebSocket disconnected");
}

fn story_reply(res: Result<StoryOut, ApiError>) -> ServerWsMessage {
  match res {
    Ok(story) => ServerWsMessage::Story { story },
    Err(e) => ServerWsMessage::Error { message: e.to_string() },
  }
}

#[instrument(level = "info", skip(state))]
pub(crate) async fn handle_client_ws(msg: ClientWsMessage, state: &AppState) -> ServerWsMessage {
  match msg {
    ClientWsMessage::Ping => ServerWsMessage::Pong,

    ClientWsMessage::NewStory(req) => {
      let res = start_story(state, req).await;
      if let Ok(story) = &res {
        tracing::info!(target: "story", id = %story.id, "WS new_story served");
      }
      story_reply(res)
    }

    ClientWsMessage::NextPage { story_id } => story_reply(next_page(state, &story_id).await),

    ClientWsMessage::PrevPage { story_id } => story_reply(prev_page(state, &story_id).await),

    ClientWsMessage::RewritePage { story_id, level } => {
      story_reply(rewrite_page(state, &story_id, level).await)
    }

    ClientWsMessage::ParseMarkup { content } => ServerWsMessage::Segments { paragraphs: parse_markup(&content) },
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::AppConfig;

  #[tokio::test]
  async fn ping_and_markup_need_no_generator() {
    let state = AppState::from_parts(AppConfig::default(), None);
    assert!(matches!(handle_client_ws(ClientWsMessage::Ping, &state).await, ServerWsMessage::Pong));

    let reply = handle_client_ws(ClientWsMessage::ParseMarkup { content: "Un {gato|cat}.".into() }, &state).await;
    match reply {
      ServerWsMessage::Segments { paragraphs } => assert_eq!(paragraphs[0].len(), 2),
      other => panic!("unexpected {other:?}"),
    }
  }

  #[tokio::test]
  async fn unknown_story_turns_into_error_message() {
    let state = AppState::from_parts(AppConfig::default(), None);
    let reply = handle_client_ws(ClientWsMessage::PrevPage { story_id: "missing".into() }, &state).await;
    assert!(matches!(reply, ServerWsMessage::Error { ref message } if message.contains("missing")));
  }
}
