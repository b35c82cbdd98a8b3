use std::convert::Infallible;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
};
use futures::Stream;
use uuid::Uuid;

use crate::{
    dto::chat::{MessageList, SendMessageRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    models::ChatMessage,
    response::ApiResponse,
    routes::params::Pagination,
    services::chat_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/rooms/{room_id}/messages",
            get(list_messages).post(send_message),
        )
        .route("/rooms/{room_id}/events", get(room_events))
}

#[utoipa::path(
    get,
    path = "/api/chat/rooms/{room_id}/messages",
    params(
        ("room_id" = Uuid, Path, description = "Room ID"),
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20")
    ),
    responses(
        (status = 200, description = "Newest-first message history", body = ApiResponse<MessageList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Chat"
)]
pub async fn list_messages(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(room_id): Path<Uuid>,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<MessageList>>> {
    let resp = chat_service::list_messages(&state, room_id, pagination).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/chat/rooms/{room_id}/messages",
    params(
        ("room_id" = Uuid, Path, description = "Room ID")
    ),
    request_body = SendMessageRequest,
    responses(
        (status = 200, description = "Message persisted", body = ApiResponse<ChatMessage>),
        (status = 400, description = "Empty body"),
        (status = 401, description = "Authentication required"),
    ),
    security(("bearer_auth" = [])),
    tag = "Chat"
)]
pub async fn send_message(
    State(state): State<AppState>,
    user: AuthUser,
    Path(room_id): Path<Uuid>,
    Json(payload): Json<SendMessageRequest>,
) -> AppResult<Json<ApiResponse<ChatMessage>>> {
    let resp = chat_service::send_message(&state, &user, room_id, payload).await?;
    Ok(Json(resp))
}

/// Server-sent invalidation events: one event per change in the room, no
/// payload beyond the room id. The room slot is released when the client
/// disconnects and the stream is dropped.
#[utoipa::path(
    get,
    path = "/api/chat/rooms/{room_id}/events",
    params(
        ("room_id" = Uuid, Path, description = "Room ID")
    ),
    responses(
        (status = 200, description = "SSE stream of room invalidation events", body = String)
    ),
    security(("bearer_auth" = [])),
    tag = "Chat"
)]
pub async fn room_events(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(room_id): Path<Uuid>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let subscription = state.hub.subscribe(room_id);
    let stream = futures::stream::unfold(subscription, |mut subscription| async move {
        let event = subscription.recv().await?;
        let sse = Event::default()
            .event("invalidate")
            .data(event.room_id.to_string());
        Some((Ok::<_, Infallible>(sse), subscription))
    });
    Sse::new(stream).keep_alive(KeepAlive::default())
}
