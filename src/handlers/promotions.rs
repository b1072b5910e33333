//! Promotion endpoints. Discount arithmetic lives in
//! [`crate::domain::aggregates::promotion`]; these handlers only manage the
//! rule records, keyed by the numeric `promotion_id` business key.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::domain::aggregates::Discount;
use crate::{validation_message, ApiError, ApiResponse, Result};

use super::AppState;

const PROMOTION_TYPES: &[&str] = &["Discount Code", "Loyalty"];

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Promotion {
    pub id: Uuid,
    pub promotion_id: i64,
    pub promotion_type: String,
    pub discount_value: Option<Decimal>,
    pub discount_percentage: Option<Decimal>,
    pub valid_until: DateTime<Utc>,
    pub usage_count: i32,
    pub applicable_products: Vec<String>,
    pub min_purchase: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreatePromotionRequest {
    #[validate(length(min = 1, message = "promotion type is required"))]
    pub promotion_type: String,
    pub discount_value: Option<Decimal>,
    pub discount_percentage: Option<Decimal>,
    pub valid_until: DateTime<Utc>,
    pub applicable_products: Option<Vec<String>>,
    pub min_purchase: Option<Decimal>,
}

fn check_type(promotion_type: &str) -> Result<()> {
    if PROMOTION_TYPES.contains(&promotion_type) {
        Ok(())
    } else {
        Err(ApiError::BadRequest(format!(
            "promotion type must be one of: {}",
            PROMOTION_TYPES.join(", ")
        )))
    }
}

fn check_discount(value: Option<Decimal>, percentage: Option<Decimal>) -> Result<()> {
    Discount::from_fields(value, percentage)
        .map(|_| ())
        .map_err(|e| ApiError::BadRequest(e.to_string()))
}

pub async fn create(
    State(s): State<AppState>,
    Json(r): Json<CreatePromotionRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Promotion>>)> {
    r.validate().map_err(|e| ApiError::Validation(validation_message(&e)))?;
    check_type(&r.promotion_type)?;
    check_discount(r.discount_value, r.discount_percentage)?;
    let now = Utc::now();
    let promotion = sqlx::query_as::<_, Promotion>(
        "INSERT INTO promotions (id, promotion_type, discount_value, discount_percentage, \
         valid_until, applicable_products, min_purchase, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8) RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(&r.promotion_type)
    .bind(r.discount_value)
    .bind(r.discount_percentage)
    .bind(r.valid_until)
    .bind(r.applicable_products.unwrap_or_default())
    .bind(r.min_purchase)
    .bind(now)
    .fetch_one(&s.db)
    .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(promotion))))
}

pub async fn list(State(s): State<AppState>) -> Result<Json<ApiResponse<Vec<Promotion>>>> {
    let promotions = sqlx::query_as::<_, Promotion>(
        "SELECT * FROM promotions ORDER BY created_at DESC",
    )
    .fetch_all(&s.db)
    .await?;
    Ok(Json(ApiResponse::ok(promotions)))
}

pub async fn by_id(
    State(s): State<AppState>,
    Path(promotion_id): Path<i64>,
) -> Result<Json<ApiResponse<Promotion>>> {
    let promotion = sqlx::query_as::<_, Promotion>(
        "SELECT * FROM promotions WHERE promotion_id = $1",
    )
    .bind(promotion_id)
    .fetch_optional(&s.db)
    .await?
    .ok_or(ApiError::NotFound("Promotion"))?;
    Ok(Json(ApiResponse::ok(promotion)))
}

#[derive(Debug, Deserialize)]
pub struct UpdatePromotionRequest {
    pub promotion_type: Option<String>,
    pub discount_value: Option<Decimal>,
    pub discount_percentage: Option<Decimal>,
    pub valid_until: Option<DateTime<Utc>>,
    pub applicable_products: Option<Vec<String>>,
    pub min_purchase: Option<Decimal>,
}

pub async fn update(
    State(s): State<AppState>,
    Path(promotion_id): Path<i64>,
    Json(r): Json<UpdatePromotionRequest>,
) -> Result<Json<ApiResponse<Promotion>>> {
    let current = sqlx::query_as::<_, Promotion>(
        "SELECT * FROM promotions WHERE promotion_id = $1",
    )
    .bind(promotion_id)
    .fetch_optional(&s.db)
    .await?
    .ok_or(ApiError::NotFound("Promotion"))?;

    let promotion_type = r.promotion_type.unwrap_or(current.promotion_type);
    check_type(&promotion_type)?;
    // A supplied discount field replaces the pair wholesale so the
    // exactly-one-of invariant survives partial updates.
    let (value, percentage) = if r.discount_value.is_some() || r.discount_percentage.is_some() {
        (r.discount_value, r.discount_percentage)
    } else {
        (current.discount_value, current.discount_percentage)
    };
    check_discount(value, percentage)?;

    let promotion = sqlx::query_as::<_, Promotion>(
        "UPDATE promotions SET promotion_type = $2, discount_value = $3, \
         discount_percentage = $4, valid_until = $5, applicable_products = $6, \
         min_purchase = $7, updated_at = $8 WHERE promotion_id = $1 RETURNING *",
    )
    .bind(promotion_id)
    .bind(&promotion_type)
    .bind(value)
    .bind(percentage)
    .bind(r.valid_until.unwrap_or(current.valid_until))
    .bind(r.applicable_products.unwrap_or(current.applicable_products))
    .bind(r.min_purchase.or(current.min_purchase))
    .bind(Utc::now())
    .fetch_one(&s.db)
    .await?;
    Ok(Json(ApiResponse::ok(promotion)))
}

/// Bumps the usage counter when a promotion is redeemed at checkout.
/// Expired promotions cannot be redeemed.
pub async fn redeem(
    State(s): State<AppState>,
    Path(promotion_id): Path<i64>,
) -> Result<Json<ApiResponse<Promotion>>> {
    let current = sqlx::query_as::<_, Promotion>(
        "SELECT * FROM promotions WHERE promotion_id = $1",
    )
    .bind(promotion_id)
    .fetch_optional(&s.db)
    .await?
    .ok_or(ApiError::NotFound("Promotion"))?;
    if Utc::now() > current.valid_until {
        return Err(ApiError::BadRequest("promotion has expired".to_string()));
    }
    let promotion = sqlx::query_as::<_, Promotion>(
        "UPDATE promotions SET usage_count = usage_count + 1, updated_at = $2 \
         WHERE promotion_id = $1 RETURNING *",
    )
    .bind(promotion_id)
    .bind(Utc::now())
    .fetch_one(&s.db)
    .await?;
    Ok(Json(ApiResponse::ok(promotion)))
}

pub async fn delete(
    State(s): State<AppState>,
    Path(promotion_id): Path<i64>,
) -> Result<Json<ApiResponse<()>>> {
    let done = sqlx::query("DELETE FROM promotions WHERE promotion_id = $1")
        .bind(promotion_id)
        .execute(&s.db)
        .await?;
    if done.rows_affected() == 0 {
        return Err(ApiError::NotFound("Promotion"));
    }
    Ok(Json(ApiResponse::message("Promotion deleted")))
}
