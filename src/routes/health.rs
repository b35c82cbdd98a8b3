use axum::{Json, extract::State};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    response::{ApiResponse, Meta},
    state::AppState,
};

#[derive(Serialize, ToSchema)]
pub struct HealthData {
    pub status: String,
}

/// Diagnostic snapshot backed by the authoritative tables.
#[derive(Serialize, ToSchema)]
pub struct DbHealthData {
    pub status: String,
    pub chat_messages: i64,
    pub emails_logged: i64,
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "OK", body = ApiResponse<HealthData>),
    ),
    tag = "Health"
)]
pub async fn health_check() -> Json<ApiResponse<HealthData>> {
    let data = HealthData {
        status: "ok".to_string(),
    };

    Json(ApiResponse::success(
        "Health check",
        data,
        Some(Meta::empty()),
    ))
}

#[utoipa::path(
    get,
    path = "/health/db",
    responses(
        (status = 200, description = "Database reachable", body = ApiResponse<DbHealthData>),
        (status = 500, description = "Database unreachable"),
    ),
    tag = "Health"
)]
pub async fn db_health(State(state): State<AppState>) -> AppResult<Json<ApiResponse<DbHealthData>>> {
    sqlx::query("SELECT 1").execute(&state.pool).await?;

    let chat_messages: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM chat_messages")
        .fetch_one(&state.pool)
        .await?;
    let emails_logged: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM email_logs")
        .fetch_one(&state.pool)
        .await?;

    let data = DbHealthData {
        status: "ok".to_string(),
        chat_messages: chat_messages.0,
        emails_logged: emails_logged.0,
    };

    Ok(Json(ApiResponse::success(
        "Database health",
        data,
        Some(Meta::empty()),
    )))
}
