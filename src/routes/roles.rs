use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::{
    dto::roles::{AccessDecision, RoleProfile},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    response::ApiResponse,
    services::role_service,
    state::AppState,
    tier::FeatureTier,
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct AccessQuery {
    /// Required feature tier: open, basic, growth, pro or premium.
    pub tier: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/me", get(me))
        .route("/access", get(access))
}

#[utoipa::path(
    get,
    path = "/api/roles/me",
    responses(
        (status = 200, description = "Current marketplace role and subscription tier", body = ApiResponse<RoleProfile>),
        (status = 401, description = "Authentication required"),
    ),
    security(("bearer_auth" = [])),
    tag = "Roles"
)]
pub async fn me(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<RoleProfile>>> {
    let resp = role_service::role_profile(&state.orm, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/roles/access",
    params(
        ("tier" = String, Query, description = "Required feature tier: open, basic, growth, pro or premium")
    ),
    responses(
        (status = 200, description = "Gate decision for the current session", body = ApiResponse<AccessDecision>),
        (status = 400, description = "Unknown tier"),
        (status = 401, description = "Authentication required"),
    ),
    security(("bearer_auth" = [])),
    tag = "Roles"
)]
pub async fn access(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<AccessQuery>,
) -> AppResult<Json<ApiResponse<AccessDecision>>> {
    let required = query
        .tier
        .parse::<FeatureTier>()
        .map_err(|_| AppError::BadRequest(format!("unknown tier '{}'", query.tier)))?;
    let resp = role_service::check_access(&state.orm, &user, required).await?;
    Ok(Json(resp))
}
