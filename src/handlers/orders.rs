//! Order endpoints: checkout, listing, fulfillment status, deletion.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::types::Json as Jsonb;
use uuid::Uuid;
use validator::Validate;

use crate::domain::aggregates::custom_order::UnknownStatus;
use crate::domain::aggregates::OrderStatus;
use crate::domain::events::DomainEvent;
use crate::domain::value_objects::{CustomerInfo, DeliveryInfo, OrderLine};
use crate::{validation_message, ApiError, ApiResponse, ListParams, Paginated, Result};

use super::custom_orders::{CustomerInfoInput, DeliveryInfoInput};
use super::AppState;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Order {
    pub id: Uuid,
    pub order_number: String,
    pub user_id: Option<String>,
    pub items: Jsonb<Vec<OrderLine>>,
    pub total: Decimal,
    pub customer_info: Jsonb<CustomerInfo>,
    pub delivery_info: Jsonb<DeliveryInfo>,
    pub payment_method: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn parse_id(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).map_err(|_| ApiError::BadRequest("Invalid order id".to_string()))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OrderLineInput {
    pub item_id: String,
    pub title: String,
    pub quantity: i32,
    pub price: Decimal,
    pub size: Option<String>,
    pub color: Option<String>,
    pub image: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateOrderRequest {
    pub user_id: Option<String>,
    #[validate(length(min = 1, message = "at least one line item is required"))]
    pub items: Vec<OrderLineInput>,
    pub customer_info: Option<CustomerInfoInput>,
    pub delivery_info: Option<DeliveryInfoInput>,
    pub payment_method: Option<String>,
}

pub async fn create(
    State(s): State<AppState>,
    Json(r): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Order>>)> {
    r.validate().map_err(|e| ApiError::Validation(validation_message(&e)))?;
    let mut lines = Vec::with_capacity(r.items.len());
    for item in r.items {
        if item.quantity < 1 {
            return Err(ApiError::BadRequest(format!(
                "line item '{}' must have a quantity of at least 1",
                item.title
            )));
        }
        lines.push(OrderLine {
            item_id: item.item_id,
            title: item.title,
            quantity: item.quantity,
            price: item.price,
            size: item.size.unwrap_or_else(|| "M".to_string()),
            color: item.color.unwrap_or_default(),
            image: item.image.unwrap_or_default(),
        });
    }
    let total: Decimal = lines.iter().map(OrderLine::line_total).sum();
    let customer = r.customer_info.unwrap_or_default();
    let delivery = r.delivery_info.unwrap_or_default();
    let order_number = format!("ORD-{:08}", rand::random::<u32>());
    let now = Utc::now();

    let order = sqlx::query_as::<_, Order>(
        "INSERT INTO orders (id, order_number, user_id, items, total, customer_info, \
         delivery_info, payment_method, status, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $10) RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(&order_number)
    .bind(&r.user_id)
    .bind(Jsonb(lines))
    .bind(total)
    .bind(Jsonb(CustomerInfo::snapshot(customer.name, customer.email, customer.phone)))
    .bind(Jsonb(DeliveryInfo::snapshot(
        delivery.address,
        delivery.city,
        delivery.postal_code,
        delivery.country,
    )))
    .bind(r.payment_method.as_deref().unwrap_or("Cash"))
    .bind(OrderStatus::Pending.as_str())
    .bind(now)
    .fetch_one(&s.db)
    .await?;

    s.publish(DomainEvent::OrderCreated {
        order_id: order.id,
        order_number: order.order_number.clone(),
        total: order.total,
    })
    .await;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(order))))
}

pub async fn list(
    State(s): State<AppState>,
    Query(p): Query<ListParams>,
) -> Result<Json<ApiResponse<Paginated<Order>>>> {
    let orders = sqlx::query_as::<_, Order>(
        "SELECT * FROM orders ORDER BY created_at DESC LIMIT $1 OFFSET $2",
    )
    .bind(p.limit() as i64)
    .bind(p.offset())
    .fetch_all(&s.db)
    .await?;
    let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM orders")
        .fetch_one(&s.db)
        .await?;
    Ok(Json(ApiResponse::ok(Paginated::new(orders, total.0, p.page(), p.limit()))))
}

pub async fn by_id(
    State(s): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Order>>> {
    let id = parse_id(&id)?;
    let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1")
        .bind(id)
        .fetch_optional(&s.db)
        .await?
        .ok_or(ApiError::NotFound("Order"))?;
    Ok(Json(ApiResponse::ok(order)))
}

pub async fn by_user(
    State(s): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<ApiResponse<Vec<Order>>>> {
    let orders = sqlx::query_as::<_, Order>(
        "SELECT * FROM orders WHERE user_id = $1 ORDER BY created_at DESC",
    )
    .bind(&user_id)
    .fetch_all(&s.db)
    .await?;
    Ok(Json(ApiResponse::ok(orders)))
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: String,
}

pub async fn update_status(
    State(s): State<AppState>,
    Path(id): Path<String>,
    Json(r): Json<StatusUpdateRequest>,
) -> Result<Json<ApiResponse<Order>>> {
    let id = parse_id(&id)?;
    let to: OrderStatus = r
        .status
        .parse()
        .map_err(|e: UnknownStatus| ApiError::BadRequest(e.to_string()))?;
    let current = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1")
        .bind(id)
        .fetch_optional(&s.db)
        .await?
        .ok_or(ApiError::NotFound("Order"))?;
    let from: OrderStatus = current
        .status
        .parse()
        .map_err(|e: UnknownStatus| ApiError::BadRequest(e.to_string()))?;
    let next = from.transition(to).map_err(|e| ApiError::InvalidTransition {
        entity: "order",
        from: e.from.to_string(),
        to: e.to.to_string(),
    })?;

    let order = sqlx::query_as::<_, Order>(
        "UPDATE orders SET status = $2, updated_at = $3 WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(next.as_str())
    .bind(Utc::now())
    .fetch_one(&s.db)
    .await?;

    s.publish(DomainEvent::OrderStatusChanged {
        order_id: order.id,
        from: from.as_str().to_string(),
        to: next.as_str().to_string(),
    })
    .await;
    Ok(Json(ApiResponse::ok(order)))
}

pub async fn delete(
    State(s): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>> {
    let id = parse_id(&id)?;
    let done = sqlx::query("DELETE FROM orders WHERE id = $1")
        .bind(id)
        .execute(&s.db)
        .await?;
    if done.rows_affected() == 0 {
        return Err(ApiError::NotFound("Order"));
    }
    Ok(Json(ApiResponse::message("Order deleted")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn checkout_requires_a_line_item() {
        let empty = CreateOrderRequest {
            user_id: None,
            items: vec![],
            customer_info: None,
            delivery_info: None,
            payment_method: None,
        };
        assert!(empty.validate().is_err());

        let one_line = CreateOrderRequest {
            user_id: Some("u1".into()),
            items: vec![OrderLineInput {
                item_id: "42".into(),
                title: "Linen Shirt".into(),
                quantity: 1,
                price: dec!(25.99),
                size: None,
                color: None,
                image: None,
            }],
            customer_info: None,
            delivery_info: None,
            payment_method: None,
        };
        assert!(one_line.validate().is_ok());
    }
}
