//! Feedback endpoints. Item titles and prices are copied from the
//! referenced order at submission time; later order edits never touch an
//! existing feedback record.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::types::Json as Jsonb;
use uuid::Uuid;
use validator::Validate;

use crate::{validation_message, ApiError, ApiResponse, Result};

use super::orders::Order;
use super::AppState;

/// Snapshot of one ordered item, frozen when the feedback is submitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackItem {
    pub title: String,
    pub price: Decimal,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Feedback {
    pub id: Uuid,
    pub feedback_id: i64,
    pub user_id: String,
    pub order_id: Uuid,
    pub items: Jsonb<Vec<FeedbackItem>>,
    pub rating: String,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateFeedbackRequest {
    #[validate(length(min = 1, message = "user id is required"))]
    pub user_id: String,
    #[validate(length(min = 1, message = "order id is required"))]
    pub order_id: String,
    #[validate(length(min = 1, message = "rating is required"))]
    pub rating: String,
    pub comment: Option<String>,
}

pub async fn create(
    State(s): State<AppState>,
    Json(r): Json<CreateFeedbackRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Feedback>>)> {
    r.validate().map_err(|e| ApiError::Validation(validation_message(&e)))?;
    let order_id = Uuid::parse_str(&r.order_id)
        .map_err(|_| ApiError::BadRequest("Invalid order id".to_string()))?;
    let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1")
        .bind(order_id)
        .fetch_optional(&s.db)
        .await?
        .ok_or(ApiError::NotFound("Order"))?;
    let items: Vec<FeedbackItem> = order
        .items
        .0
        .iter()
        .map(|line| FeedbackItem { title: line.title.clone(), price: line.price })
        .collect();

    let feedback = sqlx::query_as::<_, Feedback>(
        "INSERT INTO feedback (id, user_id, order_id, items, rating, comment, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(&r.user_id)
    .bind(order_id)
    .bind(Jsonb(items))
    .bind(&r.rating)
    .bind(r.comment.unwrap_or_default())
    .bind(Utc::now())
    .fetch_one(&s.db)
    .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(feedback))))
}

pub async fn list(State(s): State<AppState>) -> Result<Json<ApiResponse<Vec<Feedback>>>> {
    let feedback = sqlx::query_as::<_, Feedback>(
        "SELECT * FROM feedback ORDER BY created_at DESC",
    )
    .fetch_all(&s.db)
    .await?;
    Ok(Json(ApiResponse::ok(feedback)))
}

pub async fn by_id(
    State(s): State<AppState>,
    Path(feedback_id): Path<i64>,
) -> Result<Json<ApiResponse<Feedback>>> {
    let feedback = sqlx::query_as::<_, Feedback>(
        "SELECT * FROM feedback WHERE feedback_id = $1",
    )
    .bind(feedback_id)
    .fetch_optional(&s.db)
    .await?
    .ok_or(ApiError::NotFound("Feedback"))?;
    Ok(Json(ApiResponse::ok(feedback)))
}

pub async fn delete(
    State(s): State<AppState>,
    Path(feedback_id): Path<i64>,
) -> Result<Json<ApiResponse<()>>> {
    let done = sqlx::query("DELETE FROM feedback WHERE feedback_id = $1")
        .bind(feedback_id)
        .execute(&s.db)
        .await?;
    if done.rows_affected() == 0 {
        return Err(ApiError::NotFound("Feedback"));
    }
    Ok(Json(ApiResponse::message("Feedback deleted")))
}
