use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::AppError;

/// Marketplace role carried on the user row and the session token.
/// Distinct from the subscription tier in `user_roles` (see `tier`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MarketRole {
    Admin,
    Vendor,
    Buyer,
}

impl MarketRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MarketRole::Admin => "admin",
            MarketRole::Vendor => "vendor",
            MarketRole::Buyer => "buyer",
        }
    }
}

impl FromStr for MarketRole {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(MarketRole::Admin),
            "vendor" => Ok(MarketRole::Vendor),
            "buyer" => Ok(MarketRole::Buyer),
            other => Err(AppError::Decode(format!("unknown market role '{other}'"))),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct Product {
    pub id: Uuid,
    pub vendor_id: Uuid,
    pub category_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: i64,
    pub stock: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct Vendor {
    pub id: Uuid,
    pub name: String,
    pub contact_email: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// One row of a user's cart: at most one line per (user, product).
#[derive(Debug, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct CartLine {
    pub id: Uuid,
    pub user_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct ChatMessage {
    pub id: Uuid,
    pub room_id: Uuid,
    pub sender_id: Uuid,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn market_role_round_trips_known_values() {
        for role in [MarketRole::Admin, MarketRole::Vendor, MarketRole::Buyer] {
            assert_eq!(role.as_str().parse::<MarketRole>().unwrap(), role);
        }
    }

    #[test]
    fn market_role_rejects_unknown_value() {
        let err = "superuser".parse::<MarketRole>().unwrap_err();
        assert!(matches!(err, AppError::Decode(_)));
    }
}
