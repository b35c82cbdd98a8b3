use sea_orm::EntityTrait;

use crate::{
    db::OrmConn,
    dto::roles::{AccessDecision, RoleProfile},
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    tier::{self, FeatureTier, Tier},
};
use crate::entity::user_roles::Entity as UserRoles;

/// Load the session's subscription tier. A missing row means no tier is
/// assigned, which is not an error; an unknown tier string in a stored row
/// is a decode failure.
pub async fn current_tier(orm: &OrmConn, user: &AuthUser) -> AppResult<Option<Tier>> {
    let record = UserRoles::find_by_id(user.user_id).one(orm).await?;
    match record {
        Some(row) => Ok(Some(row.tier.parse::<Tier>()?)),
        None => Ok(None),
    }
}

pub async fn role_profile(orm: &OrmConn, user: &AuthUser) -> AppResult<ApiResponse<RoleProfile>> {
    let tier = current_tier(orm, user).await?;
    let profile = RoleProfile {
        role: user.role,
        tier,
    };
    Ok(ApiResponse::success("OK", profile, None))
}

/// Evaluate the tier gate for the session against a required feature tier.
pub async fn check_access(
    orm: &OrmConn,
    user: &AuthUser,
    required: FeatureTier,
) -> AppResult<ApiResponse<AccessDecision>> {
    let current = current_tier(orm, user).await?;
    let decision = AccessDecision {
        granted: tier::allows(current, required),
        current,
        required: match required {
            FeatureTier::Open => "open".to_string(),
            FeatureTier::AtLeast(t) => t.as_str().to_string(),
        },
    };
    Ok(ApiResponse::success("OK", decision, None))
}
