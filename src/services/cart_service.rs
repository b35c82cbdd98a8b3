use chrono::DateTime;
use sqlx::FromRow;
use uuid::Uuid;

use crate::{
    audit::{AuditAction, log_audit},
    db::DbPool,
    dto::cart::{AddLineRequest, CartLineDto, CartList, CartSummary},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{CartLine, Product},
    response::{ApiResponse, Meta},
    routes::params::Pagination,
};

#[derive(FromRow)]
struct LineWithProductRow {
    line_id: Uuid,
    quantity: i32,
    product_id: Uuid,
    vendor_id: Uuid,
    category_id: Uuid,
    name: String,
    description: Option<String>,
    price: i64,
    stock: i32,
    created_at: DateTime<chrono::Utc>,
}

pub async fn list_cart(
    pool: &DbPool,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<CartList>> {
    let (page, limit, offset) = pagination.normalize();
    let rows = sqlx::query_as::<_, LineWithProductRow>(
        r#"
        SELECT cl.id AS line_id, cl.quantity,
               p.id AS product_id, p.vendor_id, p.category_id, p.name,
               p.description, p.price, p.stock, p.created_at
        FROM cart_lines cl
        JOIN products p ON p.id = cl.product_id
        WHERE cl.user_id = $1
        ORDER BY cl.created_at DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(user.user_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM cart_lines WHERE user_id = $1")
        .bind(user.user_id)
        .fetch_one(pool)
        .await?;

    let items = rows
        .into_iter()
        .map(|row| CartLineDto {
            id: row.line_id,
            product: Product {
                id: row.product_id,
                vendor_id: row.vendor_id,
                category_id: row.category_id,
                name: row.name,
                description: row.description,
                price: row.price,
                stock: row.stock,
                created_at: row.created_at,
            },
            quantity: row.quantity,
        })
        .collect();

    Ok(ApiResponse::paginated(
        "OK",
        CartList { items },
        page,
        limit,
        total.0,
    ))
}

/// Add a product to the cart, merging with any existing line for the same
/// product. The merge is one atomic statement so concurrent adds never lose
/// an increment.
pub async fn add_line(
    pool: &DbPool,
    user: &AuthUser,
    payload: AddLineRequest,
) -> AppResult<ApiResponse<CartLine>> {
    let quantity = payload.quantity.unwrap_or(1);
    if quantity <= 0 {
        return Err(AppError::BadRequest(
            "quantity must be greater than 0".to_string(),
        ));
    }

    let product_exist: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM products WHERE id = $1")
        .bind(payload.product_id)
        .fetch_optional(pool)
        .await?;
    if product_exist.is_none() {
        return Err(AppError::BadRequest("product not found".to_string()));
    }

    let line = sqlx::query_as::<_, CartLine>(
        r#"
        INSERT INTO cart_lines (id, user_id, product_id, quantity)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (user_id, product_id)
        DO UPDATE SET quantity = cart_lines.quantity + EXCLUDED.quantity,
                      updated_at = now()
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user.user_id)
    .bind(payload.product_id)
    .bind(quantity)
    .fetch_one(pool)
    .await?;

    if let Err(err) = log_audit(
        pool,
        Some(user.user_id),
        AuditAction::CartAdd,
        Some(serde_json::json!({ "product_id": payload.product_id, "quantity": quantity })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success("OK", line, None))
}

/// Overwrite a line's quantity. Zero or negative behaves as removal, and
/// removing an already-absent line is a successful no-op.
pub async fn set_quantity(
    pool: &DbPool,
    user: &AuthUser,
    line_id: Uuid,
    quantity: i32,
) -> AppResult<ApiResponse<Option<CartLine>>> {
    if quantity <= 0 {
        remove_line(pool, user, line_id).await?;
        return Ok(ApiResponse::success("Removed", None, Some(Meta::empty())));
    }

    let line = sqlx::query_as::<_, CartLine>(
        r#"
        UPDATE cart_lines
        SET quantity = $3, updated_at = now()
        WHERE id = $1 AND user_id = $2
        RETURNING *
        "#,
    )
    .bind(line_id)
    .bind(user.user_id)
    .bind(quantity)
    .fetch_optional(pool)
    .await?;

    let line = match line {
        Some(line) => line,
        None => return Err(AppError::NotFound),
    };

    Ok(ApiResponse::success("Updated", Some(line), None))
}

/// Unconditional delete: absent lines are not an error.
pub async fn remove_line(
    pool: &DbPool,
    user: &AuthUser,
    line_id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = sqlx::query("DELETE FROM cart_lines WHERE id = $1 AND user_id = $2")
        .bind(line_id)
        .bind(user.user_id)
        .execute(pool)
        .await?;

    if result.rows_affected() > 0 {
        if let Err(err) = log_audit(
            pool,
            Some(user.user_id),
            AuditAction::CartRemove,
            Some(serde_json::json!({ "line_id": line_id })),
        )
        .await
        {
            tracing::warn!(error = %err, "audit log failed");
        }
    }

    Ok(ApiResponse::success(
        "Removed from cart",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

/// Delete every line owned by the user.
pub async fn clear_cart(
    pool: &DbPool,
    user: &AuthUser,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = sqlx::query("DELETE FROM cart_lines WHERE user_id = $1")
        .bind(user.user_id)
        .execute(pool)
        .await?;

    if let Err(err) = log_audit(
        pool,
        Some(user.user_id),
        AuditAction::CartClear,
        Some(serde_json::json!({ "removed": result.rows_affected() })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Cart cleared",
        serde_json::json!({ "removed": result.rows_affected() }),
        Some(Meta::empty()),
    ))
}

/// Derived totals across the user's visible lines.
pub async fn cart_summary(pool: &DbPool, user: &AuthUser) -> AppResult<ApiResponse<CartSummary>> {
    let row: (i64, i64) = sqlx::query_as(
        "SELECT COUNT(*), COALESCE(SUM(quantity), 0) FROM cart_lines WHERE user_id = $1",
    )
    .bind(user.user_id)
    .fetch_one(pool)
    .await?;

    let summary = CartSummary {
        lines: row.0,
        total_quantity: row.1,
    };
    Ok(ApiResponse::success("OK", summary, None))
}
