use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde_json::Value;
use tower_http::set_header::SetResponseHeaderLayer;
use tracing::warn;

use crate::error::ToolError;
use crate::schema::tool_definitions;
use crate::tools::{EventFilter, KnowledgeBase};

pub async fn api_tools() -> impl IntoResponse {
    Json(tool_definitions())
}

/// `POST /tools/{name}` with the tool's arguments as the JSON body.
pub async fn api_call_tool(
    State(kb): State<Arc<KnowledgeBase>>,
    Path(name): Path<String>,
    Json(args): Json<Value>,
) -> impl IntoResponse {
    match kb.call(&name, args) {
        Ok(result) => Json(result).into_response(),
        Err(e @ ToolError::UnknownTool(_)) => {
            (StatusCode::NOT_FOUND, Json(serde_json::json!({ "error": e.to_string() }))).into_response()
        }
        Err(e @ ToolError::InvalidArguments { .. }) => {
            (StatusCode::BAD_REQUEST, Json(serde_json::json!({ "error": e.to_string() }))).into_response()
        }
        Err(e) => {
            warn!(tool = name.as_str(), error = %e, "Tool call failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

pub async fn api_events(State(kb): State<Arc<KnowledgeBase>>, Query(filter): Query<EventFilter>) -> impl IntoResponse {
    Json(serde_json::json!({ "events": kb.get_events(&filter) }))
}

pub async fn api_calendar(State(kb): State<Arc<KnowledgeBase>>) -> impl IntoResponse {
    Json(serde_json::json!({ "events": kb.calendar() }))
}

pub fn router(kb: Arc<KnowledgeBase>) -> Router {
    Router::new()
        // Health check
        .route("/", get(|| async { "ok" }))
        // Tool contract
        .route("/tools", get(api_tools))
        .route("/tools/{name}", post(api_call_tool))
        // Convenience views
        .route("/api/events", get(api_events))
        .route("/api/calendar", get(api_calendar))
        .with_state(kb)
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
        // Answers change with every sync pass
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(
            tower_http::trace::TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    path = %request.uri().path(),
                )
            }),
        )
}
