//! Custom clothing order endpoints: intake, status lifecycle, and the
//! approve-and-convert workflow that synthesizes a standard order.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::types::Json as Jsonb;
use sqlx::{Postgres, Transaction};
use uuid::Uuid;
use validator::Validate;

use crate::domain::aggregates::custom_order::UnknownStatus;
use crate::domain::aggregates::{quote_price, CustomOrderStatus, OrderStatus};
use crate::domain::events::DomainEvent;
use crate::domain::value_objects::{CustomerInfo, DeliveryInfo, OrderLine};
use crate::{validation_message, ApiError, ApiResponse, Result};

use super::orders::Order;
use super::AppState;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CustomOrder {
    pub id: Uuid,
    pub user_id: String,
    pub design_id: Option<Uuid>,
    pub image_url: String,
    pub clothing_type: String,
    pub size: String,
    pub quantity: i32,
    pub price: Decimal,
    pub status: String,
    pub customer_info: Jsonb<CustomerInfo>,
    pub delivery_info: Jsonb<DeliveryInfo>,
    pub converted_to_order: bool,
    pub order_id: Option<Uuid>,
    pub conversion_error: Option<String>,
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn parse_id(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).map_err(|_| ApiError::BadRequest("Invalid custom order id".to_string()))
}

fn parse_status(raw: &str) -> Result<CustomOrderStatus> {
    raw.parse()
        .map_err(|e: UnknownStatus| ApiError::BadRequest(e.to_string()))
}

/// Human-readable order number for converted custom orders.
pub fn custom_order_number() -> String {
    format!("CUSTOM-{:06x}", rand::random::<u32>() & 0xFF_FFFF)
}

#[derive(Debug, Default, Deserialize)]
pub struct CustomerInfoInput {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DeliveryInfoInput {
    pub address: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCustomOrderRequest {
    #[validate(length(min = 1, message = "user id is required"))]
    pub user_id: String,
    #[validate(length(min = 1, message = "an image url is required"))]
    pub image_url: String,
    #[validate(length(min = 1, message = "clothing type is required"))]
    pub clothing_type: String,
    #[validate(length(min = 1, message = "size is required"))]
    pub size: String,
    #[validate(range(min = 1, message = "quantity must be at least 1"))]
    pub quantity: Option<i32>,
    /// Attached only when it parses as a valid id.
    pub design_id: Option<String>,
    pub customer_info: Option<CustomerInfoInput>,
    pub delivery_info: Option<DeliveryInfoInput>,
}

pub async fn create(
    State(s): State<AppState>,
    Json(r): Json<CreateCustomOrderRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CustomOrder>>)> {
    r.validate().map_err(|e| ApiError::Validation(validation_message(&e)))?;
    let quantity = r.quantity.unwrap_or(1);
    let price = quote_price(&r.clothing_type, quantity);
    let design_id = r.design_id.as_deref().and_then(|d| Uuid::parse_str(d).ok());
    let customer = r.customer_info.unwrap_or_default();
    let delivery = r.delivery_info.unwrap_or_default();
    let now = Utc::now();

    let order = sqlx::query_as::<_, CustomOrder>(
        "INSERT INTO custom_orders (id, user_id, design_id, image_url, clothing_type, size, \
         quantity, price, status, customer_info, delivery_info, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $12) RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(&r.user_id)
    .bind(design_id)
    .bind(&r.image_url)
    .bind(&r.clothing_type)
    .bind(&r.size)
    .bind(quantity)
    .bind(price)
    .bind(CustomOrderStatus::Pending.as_str())
    .bind(Jsonb(CustomerInfo::snapshot(customer.name, customer.email, customer.phone)))
    .bind(Jsonb(DeliveryInfo::snapshot(
        delivery.address,
        delivery.city,
        delivery.postal_code,
        delivery.country,
    )))
    .bind(now)
    .fetch_one(&s.db)
    .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(order))))
}

pub async fn list(State(s): State<AppState>) -> Result<Json<ApiResponse<Vec<CustomOrder>>>> {
    let orders = sqlx::query_as::<_, CustomOrder>(
        "SELECT * FROM custom_orders ORDER BY created_at DESC",
    )
    .fetch_all(&s.db)
    .await?;
    Ok(Json(ApiResponse::ok(orders)))
}

pub async fn by_user(
    State(s): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<ApiResponse<Vec<CustomOrder>>>> {
    let orders = sqlx::query_as::<_, CustomOrder>(
        "SELECT * FROM custom_orders WHERE user_id = $1 ORDER BY created_at DESC",
    )
    .bind(&user_id)
    .fetch_all(&s.db)
    .await?;
    Ok(Json(ApiResponse::ok(orders)))
}

pub async fn by_id(
    State(s): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<CustomOrder>>> {
    let id = parse_id(&id)?;
    let order = sqlx::query_as::<_, CustomOrder>("SELECT * FROM custom_orders WHERE id = $1")
        .bind(id)
        .fetch_optional(&s.db)
        .await?
        .ok_or(ApiError::NotFound("Custom order"))?;
    Ok(Json(ApiResponse::ok(order)))
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: String,
}

/// Generic status mutation, guarded by the same transition table as every
/// other lifecycle endpoint.
pub async fn update_status(
    State(s): State<AppState>,
    Path(id): Path<String>,
    Json(r): Json<StatusUpdateRequest>,
) -> Result<Json<ApiResponse<CustomOrder>>> {
    let id = parse_id(&id)?;
    let to = parse_status(&r.status)?;
    let current = sqlx::query_as::<_, CustomOrder>("SELECT * FROM custom_orders WHERE id = $1")
        .bind(id)
        .fetch_optional(&s.db)
        .await?
        .ok_or(ApiError::NotFound("Custom order"))?;
    let from = parse_status(&current.status)?;
    let next = from.transition(to).map_err(|e| ApiError::InvalidTransition {
        entity: "custom order",
        from: e.from.to_string(),
        to: e.to.to_string(),
    })?;
    let order = sqlx::query_as::<_, CustomOrder>(
        "UPDATE custom_orders SET status = $2, updated_at = $3 WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(next.as_str())
    .bind(Utc::now())
    .fetch_one(&s.db)
    .await?;
    Ok(Json(ApiResponse::ok(order)))
}

#[derive(Debug, Serialize)]
pub struct ConversionOutcome {
    pub custom_order: CustomOrder,
    pub order: Order,
}

/// Approves a pending custom order and synthesizes a standard order from
/// it. The order insert and the custom-order update share one transaction:
/// either both land or neither does. A failed conversion leaves the custom
/// order pending (this endpoint is the retry entry point) with the failure
/// recorded in `conversion_error`.
pub async fn approve(
    State(s): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<ConversionOutcome>>> {
    let id = parse_id(&id)?;
    let mut tx = s.db.begin().await?;
    let co = sqlx::query_as::<_, CustomOrder>(
        "SELECT * FROM custom_orders WHERE id = $1 FOR UPDATE",
    )
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or(ApiError::NotFound("Custom order"))?;

    let status = parse_status(&co.status)?;
    if status != CustomOrderStatus::Pending {
        return Err(ApiError::BadRequest(format!("Order is already {}", co.status)));
    }

    match convert(tx, &co).await {
        Ok((custom_order, order)) => {
            s.publish(DomainEvent::CustomOrderConverted {
                custom_order_id: custom_order.id,
                order_id: order.id,
                order_number: order.order_number.clone(),
            })
            .await;
            s.publish(DomainEvent::OrderCreated {
                order_id: order.id,
                order_number: order.order_number.clone(),
                total: order.total,
            })
            .await;
            Ok(Json(ApiResponse::ok_with(
                "Custom order approved and converted",
                ConversionOutcome { custom_order, order },
            )))
        }
        Err(err) => {
            let message = format!("Order conversion failed: {err}");
            tracing::error!(custom_order_id = %co.id, %err, "custom order conversion failed");
            // The transaction rolled back; record the failure so back office
            // staff can see why the order is still pending.
            let resource = sqlx::query_as::<_, CustomOrder>(
                "UPDATE custom_orders SET conversion_error = $2, updated_at = $3 \
                 WHERE id = $1 RETURNING *",
            )
            .bind(co.id)
            .bind(&message)
            .bind(Utc::now())
            .fetch_optional(&s.db)
            .await
            .ok()
            .flatten()
            .and_then(|c| serde_json::to_value(c).ok())
            .unwrap_or(serde_json::Value::Null);
            Err(ApiError::Conversion { message, resource })
        }
    }
}

/// Builds the single order line from a custom order, substituting fallback
/// values for anything missing.
pub fn order_line_from(co: &CustomOrder) -> OrderLine {
    let quantity = if co.quantity > 0 { co.quantity } else { 1 };
    OrderLine {
        item_id: co
            .design_id
            .map(|d| d.to_string())
            .unwrap_or_else(|| "custom-design".to_string()),
        title: format!("Custom {}", co.clothing_type),
        quantity,
        price: co.price / Decimal::from(quantity),
        size: if co.size.trim().is_empty() { "M".to_string() } else { co.size.clone() },
        color: "custom".to_string(),
        image: co.image_url.clone(),
    }
}

async fn convert(
    mut tx: Transaction<'_, Postgres>,
    co: &CustomOrder,
) -> sqlx::Result<(CustomOrder, Order)> {
    let line = order_line_from(co);
    let now = Utc::now();
    let order = sqlx::query_as::<_, Order>(
        "INSERT INTO orders (id, order_number, user_id, items, total, customer_info, \
         delivery_info, payment_method, status, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $10) RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(custom_order_number())
    .bind(&co.user_id)
    .bind(Jsonb(vec![line]))
    .bind(co.price)
    .bind(&co.customer_info)
    .bind(&co.delivery_info)
    .bind("Cash")
    .bind(OrderStatus::Processing.as_str())
    .bind(now)
    .fetch_one(&mut *tx)
    .await?;

    let custom_order = sqlx::query_as::<_, CustomOrder>(
        "UPDATE custom_orders SET status = $2, converted_to_order = TRUE, order_id = $3, \
         conversion_error = NULL, updated_at = $4 WHERE id = $1 RETURNING *",
    )
    .bind(co.id)
    .bind(CustomOrderStatus::Approved.as_str())
    .bind(order.id)
    .bind(now)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok((custom_order, order))
}

#[derive(Debug, Deserialize)]
pub struct RejectRequest {
    pub reason: Option<String>,
}

pub async fn reject(
    State(s): State<AppState>,
    Path(id): Path<String>,
    Json(r): Json<RejectRequest>,
) -> Result<Json<ApiResponse<CustomOrder>>> {
    let id = parse_id(&id)?;
    let current = sqlx::query_as::<_, CustomOrder>("SELECT * FROM custom_orders WHERE id = $1")
        .bind(id)
        .fetch_optional(&s.db)
        .await?
        .ok_or(ApiError::NotFound("Custom order"))?;
    let from = parse_status(&current.status)?;
    from.transition(CustomOrderStatus::Rejected)
        .map_err(|e| ApiError::InvalidTransition {
            entity: "custom order",
            from: e.from.to_string(),
            to: e.to.to_string(),
        })?;
    let reason = r
        .reason
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| "No reason provided".to_string());
    let order = sqlx::query_as::<_, CustomOrder>(
        "UPDATE custom_orders SET status = $2, rejection_reason = $3, updated_at = $4 \
         WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(CustomOrderStatus::Rejected.as_str())
    .bind(&reason)
    .bind(Utc::now())
    .fetch_one(&s.db)
    .await?;
    Ok(Json(ApiResponse::ok(order)))
}

pub async fn delete(
    State(s): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>> {
    let id = parse_id(&id)?;
    let done = sqlx::query("DELETE FROM custom_orders WHERE id = $1")
        .bind(id)
        .execute(&s.db)
        .await?;
    if done.rows_affected() == 0 {
        return Err(ApiError::NotFound("Custom order"));
    }
    Ok(Json(ApiResponse::message("Custom order deleted")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample(quantity: i32, size: &str, design_id: Option<Uuid>) -> CustomOrder {
        CustomOrder {
            id: Uuid::nil(),
            user_id: "u1".into(),
            design_id,
            image_url: "http://x/y.png".into(),
            clothing_type: "dress".into(),
            size: size.into(),
            quantity,
            price: quote_price("dress", quantity),
            status: "pending".into(),
            customer_info: Jsonb(CustomerInfo::default()),
            delivery_info: Jsonb(DeliveryInfo::default()),
            converted_to_order: false,
            order_id: None,
            conversion_error: None,
            rejection_reason: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn line_synthesis_with_fallbacks() {
        let line = order_line_from(&sample(0, "", None));
        assert_eq!(line.item_id, "custom-design");
        assert_eq!(line.quantity, 1);
        assert_eq!(line.size, "M");
        assert_eq!(line.color, "custom");
    }

    #[test]
    fn line_unit_price_is_total_over_quantity() {
        let line = order_line_from(&sample(2, "L", None));
        assert_eq!(line.quantity, 2);
        assert_eq!(line.price, dec!(45.99));
        assert_eq!(line.line_total(), dec!(91.98));
    }

    #[test]
    fn line_keeps_design_reference() {
        let design = Uuid::now_v7();
        let line = order_line_from(&sample(1, "S", Some(design)));
        assert_eq!(line.item_id, design.to_string());
    }

    #[test]
    fn order_number_shape() {
        for _ in 0..32 {
            let n = custom_order_number();
            let hex = n.strip_prefix("CUSTOM-").expect("prefix");
            assert_eq!(hex.len(), 6);
            assert!(hex.chars().all(|c| c.is_ascii_hexdigit()));
        }
    }
}
