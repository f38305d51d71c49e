//! Router assembly: HTTP endpoints, WebSocket upgrade, CORS, and HTTP tracing.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::state::AppState;

pub mod http;
pub mod ws;

/// Build the application router with:
/// - WebSocket at `/ws`
/// - REST-ish API under `/api/v1/...`
/// - CORS (allow any origin/method/headers), adjust for production if needed
/// - HTTP trace layer (per-request spans w/ method, path, status, latency)
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        // WebSocket
        .route("/ws", get(ws::ws_upgrade))
        // HTTP API
        .route("/api/v1/health", get(http::http_health))
        .route("/api/v1/levels", get(http::http_get_levels))
        .route("/api/v1/styles", get(http::http_get_styles))
        .route("/api/v1/stories", post(http::http_post_story))
        .route("/api/v1/stories/:id", get(http::http_get_story))
        .route("/api/v1/stories/:id/next", post(http::http_post_next))
        .route("/api/v1/stories/:id/prev", post(http::http_post_prev))
        .route("/api/v1/stories/:id/rewrite", post(http::http_post_rewrite))
        .route("/api/v1/markup/parse", post(http::http_post_parse_markup))
        // State + CORS + HTTP tracing
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::capability::testing::ScriptedGenerator;
    use crate::config::AppConfig;
    use crate::pipeline::tests::story_json;

    async fn call(app: Router, req: Request<Body>) -> (StatusCode, Value) {
        let res = app.oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn health_reports_missing_generator() {
        let app = build_router(Arc::new(AppState::from_parts(AppConfig::default(), None)));
        let (status, body) = call(app, Request::get("/api/v1/health").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["generator"], false);
    }

    #[tokio::test]
    async fn levels_list_every_band() {
        let app = build_router(Arc::new(AppState::from_parts(AppConfig::default(), None)));
        let (_, body) = call(app, Request::get("/api/v1/levels").body(Body::empty()).unwrap()).await;
        let levels = body.as_array().unwrap();
        assert_eq!(levels.len(), 10);
        assert_eq!(levels[0]["level"], "A1.1");
        assert_eq!(levels[0]["vocabBand"], "25-35");
        assert_eq!(levels[0]["tier"], "beginner");
        assert_eq!(levels[0]["suggestedTopics"][0], "Greetings");
        assert_eq!(levels[9]["suggestedTopics"].as_array().unwrap().len(), 16);
    }

    #[tokio::test]
    async fn story_without_generator_is_503() {
        let app = build_router(Arc::new(AppState::from_parts(AppConfig::default(), None)));
        let (status, body) = call(app, post_json("/api/v1/stories", r#"{"language":"Spanish","level":"A1.1"}"#)).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(body["error"].as_str().unwrap().contains("not configured"));
    }

    #[tokio::test]
    async fn story_lifecycle_over_http() {
        let generator = Arc::new(ScriptedGenerator::new(vec![
            Ok(story_json("Uno", 27)),
            Ok(story_json("Uno", 27)),
            Err(crate::error::CapabilityError::EmptyResponse),
        ]));
        let state = Arc::new(AppState::from_parts(AppConfig::default(), Some(generator)));
        let app = build_router(state);

        let (status, body) = call(
            app.clone(),
            post_json("/api/v1/stories", r#"{"language":"Spanish","level":"A1.1","topic":"Pets"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let id = body["id"].as_str().unwrap().to_string();
        assert_eq!(body["pageCount"], 1);
        assert_eq!(body["page"]["paragraphs"].as_array().unwrap().len(), 3);

        let (status, body) = call(app.clone(), post_json(&format!("/api/v1/stories/{id}/next"), "")).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"], "Could not generate story. Please try again.");

        let (status, _) = call(app, Request::get("/api/v1/stories/unknown").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn markup_endpoint_returns_segments() {
        let app = build_router(Arc::new(AppState::from_parts(AppConfig::default(), None)));
        let (status, body) = call(app, post_json("/api/v1/markup/parse", r#"{"content":"({x|y})\\n\\nfin"}"#)).await;
        assert_eq!(status, StatusCode::OK);
        let paras = body["paragraphs"].as_array().unwrap();
        assert_eq!(paras.len(), 2);
        assert_eq!(paras[0][0]["pre"], "(");
        assert_eq!(paras[0][0]["post"], ")");
    }
}
