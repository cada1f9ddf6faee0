//! Question answering over the user's indexed documents.

use std::convert::Infallible;

use axum::{
    extract::Extension,
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use futures::{stream, Stream, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::server::app::AppState;
use crate::server::error::ApiError;
use crate::server::middleware::AuthUser;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
    pub sources: Vec<String>,
}

/// POST /api/chat - answer a question in one shot
pub async fn chat_handler(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    if request.message.trim().is_empty() {
        return Err(ApiError::bad_request(
            "empty_message",
            "message must not be blank",
        ));
    }

    let answer = state
        .answers
        .answer(&user.user_id.to_string(), &request.message)
        .await?;

    Ok(Json(ChatResponse {
        response: answer.text,
        sources: answer.sources,
    }))
}

/// POST /api/chat/stream - answer a question as server-sent events
///
/// Emits one `sources` event with the retrieved snippets, then a
/// `message` event per generated fragment, then a final `done` event.
/// Generation failures mid-stream surface as an `error` event since the
/// 200 status has already been sent.
pub async fn chat_stream_handler(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Json(request): Json<ChatRequest>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    if request.message.trim().is_empty() {
        return Err(ApiError::bad_request(
            "empty_message",
            "message must not be blank",
        ));
    }

    let (sources, tokens) = state
        .answers
        .answer_stream(&user.user_id.to_string(), &request.message)
        .await?;

    let sources_event = Event::default()
        .event("sources")
        .json_data(&sources)
        .map_err(|e| ApiError::internal(e.to_string()))?;

    let token_events = tokens.map(|item| {
        let event = match item {
            Ok(chunk) => Event::default()
                .event("message")
                .json_data(json!({ "chunk": chunk })),
            Err(e) => Event::default()
                .event("error")
                .json_data(json!({ "message": e.to_string() })),
        };
        Ok::<_, Infallible>(
            event.unwrap_or_else(|_| Event::default().event("error").data("serialization failed")),
        )
    });

    let body = stream::once(async move { Ok(sources_event) })
        .chain(token_events)
        .chain(stream::once(async {
            Ok(Event::default().event("done").data(""))
        }));

    Ok(Sse::new(body).keep_alive(KeepAlive::default()))
}
