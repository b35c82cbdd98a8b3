//! Subscription-tier access gate.
//!
//! Tiers form a fixed total order (Basic < Growth < Pro < Premium). A
//! feature is visible when the session's tier is at least the feature's
//! required tier; sessions without a tier are denied every gated feature.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use utoipa::ToSchema;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Basic,
    Growth,
    Pro,
    Premium,
}

impl Tier {
    pub const ALL: [Tier; 4] = [Tier::Basic, Tier::Growth, Tier::Pro, Tier::Premium];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Basic => "basic",
            Tier::Growth => "growth",
            Tier::Pro => "pro",
            Tier::Premium => "premium",
        }
    }
}

impl FromStr for Tier {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "basic" => Ok(Tier::Basic),
            "growth" => Ok(Tier::Growth),
            "pro" => Ok(Tier::Pro),
            "premium" => Ok(Tier::Premium),
            other => Err(AppError::Decode(format!("unknown tier '{other}'"))),
        }
    }
}

/// Requirement attached to a feature: `Open` features are visible to
/// everyone, including tierless sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureTier {
    Open,
    AtLeast(Tier),
}

impl FromStr for FeatureTier {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" | "none" => Ok(FeatureTier::Open),
            other => Ok(FeatureTier::AtLeast(other.parse()?)),
        }
    }
}

/// Pure gate decision. `current` is `None` for sessions with no tier record.
pub fn allows(current: Option<Tier>, required: FeatureTier) -> bool {
    match required {
        FeatureTier::Open => true,
        FeatureTier::AtLeast(required) => match current {
            Some(current) => current >= required,
            None => false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_is_monotone_over_the_tier_order() {
        for current in Tier::ALL {
            for required in Tier::ALL {
                assert_eq!(
                    allows(Some(current), FeatureTier::AtLeast(required)),
                    current >= required,
                    "current={current:?} required={required:?}"
                );
            }
        }
    }

    #[test]
    fn growth_reaches_basic_but_basic_not_pro() {
        assert!(allows(Some(Tier::Growth), FeatureTier::AtLeast(Tier::Basic)));
        assert!(!allows(Some(Tier::Basic), FeatureTier::AtLeast(Tier::Pro)));
    }

    #[test]
    fn tierless_sessions_are_denied_every_gated_feature() {
        for required in Tier::ALL {
            assert!(!allows(None, FeatureTier::AtLeast(required)));
        }
    }

    #[test]
    fn open_features_ignore_the_tier() {
        assert!(allows(None, FeatureTier::Open));
        assert!(allows(Some(Tier::Premium), FeatureTier::Open));
    }

    #[test]
    fn tier_parses_the_closed_set_only() {
        assert_eq!("premium".parse::<Tier>().unwrap(), Tier::Premium);
        assert!(matches!(
            "platinum".parse::<Tier>().unwrap_err(),
            AppError::Decode(_)
        ));
    }
}
