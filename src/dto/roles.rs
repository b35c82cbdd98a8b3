use serde::Serialize;
use utoipa::ToSchema;

use crate::{models::MarketRole, tier::Tier};

/// Session authorization snapshot: marketplace role plus subscription tier.
/// `tier` is null when no tier record exists for the user.
#[derive(Debug, Serialize, ToSchema)]
pub struct RoleProfile {
    pub role: MarketRole,
    pub tier: Option<Tier>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AccessDecision {
    pub granted: bool,
    pub current: Option<Tier>,
    pub required: String,
}
