//! Saved AI-generated design assets. Token verification happens upstream;
//! these handlers take the owning user id explicitly.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::{validation_message, ApiError, ApiResponse, Result};

use super::AppState;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Design {
    pub id: Uuid,
    pub user_id: String,
    pub image_url: String,
    pub clothing_type: String,
    pub prompt: String,
    pub preview_mode: String,
    pub is_favorite: bool,
    pub model_path: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateDesignRequest {
    #[validate(length(min = 1, message = "user id is required"))]
    pub user_id: String,
    #[validate(length(min = 1, message = "an image url is required"))]
    pub image_url: String,
    #[validate(length(min = 1, message = "clothing type is required"))]
    pub clothing_type: String,
    #[validate(length(min = 1, message = "the generation prompt is required"))]
    pub prompt: String,
    pub preview_mode: Option<String>,
    pub model_path: Option<String>,
}

pub async fn create(
    State(s): State<AppState>,
    Json(r): Json<CreateDesignRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Design>>)> {
    r.validate().map_err(|e| ApiError::Validation(validation_message(&e)))?;
    let design = sqlx::query_as::<_, Design>(
        "INSERT INTO designs (id, user_id, image_url, clothing_type, prompt, preview_mode, \
         model_path, created_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(&r.user_id)
    .bind(&r.image_url)
    .bind(&r.clothing_type)
    .bind(&r.prompt)
    .bind(r.preview_mode.as_deref().unwrap_or("standard"))
    .bind(&r.model_path)
    .bind(Utc::now())
    .fetch_one(&s.db)
    .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(design))))
}

pub async fn by_user(
    State(s): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<ApiResponse<Vec<Design>>>> {
    let designs = sqlx::query_as::<_, Design>(
        "SELECT * FROM designs WHERE user_id = $1 ORDER BY created_at DESC",
    )
    .bind(&user_id)
    .fetch_all(&s.db)
    .await?;
    Ok(Json(ApiResponse::ok(designs)))
}

pub async fn toggle_favorite(
    State(s): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Design>>> {
    let design = sqlx::query_as::<_, Design>(
        "UPDATE designs SET is_favorite = NOT is_favorite WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .fetch_optional(&s.db)
    .await?
    .ok_or(ApiError::NotFound("Design"))?;
    Ok(Json(ApiResponse::ok(design)))
}

pub async fn delete(
    State(s): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>> {
    let done = sqlx::query("DELETE FROM designs WHERE id = $1")
        .bind(id)
        .execute(&s.db)
        .await?;
    if done.rows_affected() == 0 {
        return Err(ApiError::NotFound("Design"));
    }
    Ok(Json(ApiResponse::message("Design deleted")))
}
