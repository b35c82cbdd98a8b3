use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::Product;

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddLineRequest {
    pub product_id: Uuid,
    /// Defaults to 1 when omitted.
    pub quantity: Option<i32>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SetQuantityRequest {
    pub quantity: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartList {
    pub items: Vec<CartLineDto>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartLineDto {
    pub id: Uuid,
    pub product: Product,
    pub quantity: i32,
}

/// Derived totals, recomputed per request and never stored.
#[derive(Debug, Serialize, ToSchema)]
pub struct CartSummary {
    pub lines: i64,
    pub total_quantity: i64,
}
