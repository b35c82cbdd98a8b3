use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set};
use sea_orm::{ActiveModelTrait, ColumnTrait};
use uuid::Uuid;

use crate::entity::chat_messages::{ActiveModel, Column, Entity as ChatMessages, Model};
use crate::{
    dto::chat::{MessageList, SendMessageRequest},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::ChatMessage,
    response::ApiResponse,
    routes::params::Pagination,
    state::AppState,
};

pub async fn list_messages(
    state: &AppState,
    room_id: Uuid,
    pagination: Pagination,
) -> AppResult<ApiResponse<MessageList>> {
    let (page, limit, offset) = pagination.normalize();

    let finder = ChatMessages::find()
        .filter(Column::RoomId.eq(room_id))
        .order_by_desc(Column::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(message_from_entity)
        .collect();

    Ok(ApiResponse::paginated(
        "OK",
        MessageList { items },
        page,
        limit,
        total,
    ))
}

/// Persist a message, then notify: room subscribers get an invalidation
/// event, and the configured recipient gets a fire-and-forget email.
pub async fn send_message(
    state: &AppState,
    user: &AuthUser,
    room_id: Uuid,
    payload: SendMessageRequest,
) -> AppResult<ApiResponse<ChatMessage>> {
    let body = payload.body.trim().to_string();
    if body.is_empty() {
        return Err(AppError::BadRequest("message body is empty".to_string()));
    }

    let active = ActiveModel {
        id: Set(Uuid::new_v4()),
        room_id: Set(room_id),
        sender_id: Set(user.user_id),
        body: Set(body),
        created_at: NotSet,
    };
    let message = active.insert(&state.orm).await?;

    state.hub.publish(room_id);

    if let Some(recipient) = state.chat_notify_email.clone() {
        let mailer = state.mailer.clone();
        let pool = state.pool.clone();
        let preview = crate::email::escape_html(&message.body);
        tokio::spawn(async move {
            let subject = format!("New message in room {room_id}");
            let html = format!("<p>{preview}</p>");
            if let Err(err) = mailer.send(&pool, &recipient, &subject, &html).await {
                tracing::warn!(error = %err, "chat notification email failed");
            }
        });
    }

    Ok(ApiResponse::success(
        "Message sent",
        message_from_entity(message),
        None,
    ))
}

fn message_from_entity(model: Model) -> ChatMessage {
    ChatMessage {
        id: model.id,
        room_id: model.room_id,
        sender_id: model.sender_id,
        body: model.body,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
