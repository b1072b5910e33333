//! User endpoints. Passwords are bcrypt-hashed before storage and the hash
//! never serializes into a response.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::{validation_message, ApiError, ApiResponse, Result};

use super::AppState;

const ROLES: &[&str] = &["admin", "customer"];

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub user_id: i64,
    pub user_name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: String,
    pub address: Option<String>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn check_role(role: &str) -> Result<()> {
    if ROLES.contains(&role) {
        Ok(())
    } else {
        Err(ApiError::BadRequest(format!(
            "role must be one of: {}",
            ROLES.join(", ")
        )))
    }
}

fn hash_password(password: &str) -> Result<String> {
    bcrypt::hash(password, bcrypt::DEFAULT_COST)
        .map_err(|e| ApiError::Internal(format!("password hashing failed: {e}")))
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .map(|db| db.is_unique_violation())
        .unwrap_or(false)
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(length(min = 1, message = "user name is required"))]
    pub user_name: String,
    #[validate(email(message = "a valid email is required"))]
    pub email: String,
    #[validate(length(min = 6, message = "password must be at least 6 characters"))]
    pub password: String,
    pub role: Option<String>,
    pub address: Option<String>,
    pub image_url: Option<String>,
}

pub async fn create(
    State(s): State<AppState>,
    Json(r): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<ApiResponse<User>>)> {
    r.validate().map_err(|e| ApiError::Validation(validation_message(&e)))?;
    let role = r.role.as_deref().unwrap_or("customer").to_string();
    check_role(&role)?;
    let password_hash = hash_password(&r.password)?;
    let now = Utc::now();
    let user = sqlx::query_as::<_, User>(
        "INSERT INTO users (id, user_name, email, password_hash, role, address, image_url, \
         created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8) RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(&r.user_name)
    .bind(&r.email)
    .bind(&password_hash)
    .bind(&role)
    .bind(&r.address)
    .bind(&r.image_url)
    .bind(now)
    .fetch_one(&s.db)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            ApiError::BadRequest("email is already registered".to_string())
        } else {
            ApiError::Database(e)
        }
    })?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(user))))
}

pub async fn list(State(s): State<AppState>) -> Result<Json<ApiResponse<Vec<User>>>> {
    let users = sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY created_at DESC")
        .fetch_all(&s.db)
        .await?;
    Ok(Json(ApiResponse::ok(users)))
}

pub async fn by_id(
    State(s): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<ApiResponse<User>>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(&s.db)
        .await?
        .ok_or(ApiError::NotFound("User"))?;
    Ok(Json(ApiResponse::ok(user)))
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUserRequest {
    pub user_name: Option<String>,
    #[validate(email(message = "a valid email is required"))]
    pub email: Option<String>,
    #[validate(length(min = 6, message = "password must be at least 6 characters"))]
    pub password: Option<String>,
    pub role: Option<String>,
    pub address: Option<String>,
    pub image_url: Option<String>,
}

pub async fn update(
    State(s): State<AppState>,
    Path(user_id): Path<i64>,
    Json(r): Json<UpdateUserRequest>,
) -> Result<Json<ApiResponse<User>>> {
    r.validate().map_err(|e| ApiError::Validation(validation_message(&e)))?;
    let current = sqlx::query_as::<_, User>("SELECT * FROM users WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(&s.db)
        .await?
        .ok_or(ApiError::NotFound("User"))?;

    let role = r.role.unwrap_or(current.role);
    check_role(&role)?;
    let password_hash = match r.password.as_deref() {
        Some(password) => hash_password(password)?,
        None => current.password_hash,
    };
    let user = sqlx::query_as::<_, User>(
        "UPDATE users SET user_name = $2, email = $3, password_hash = $4, role = $5, \
         address = $6, image_url = $7, updated_at = $8 WHERE user_id = $1 RETURNING *",
    )
    .bind(user_id)
    .bind(r.user_name.unwrap_or(current.user_name))
    .bind(r.email.unwrap_or(current.email))
    .bind(&password_hash)
    .bind(&role)
    .bind(r.address.or(current.address))
    .bind(r.image_url.or(current.image_url))
    .bind(Utc::now())
    .fetch_one(&s.db)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            ApiError::BadRequest("email is already registered".to_string())
        } else {
            ApiError::Database(e)
        }
    })?;
    Ok(Json(ApiResponse::ok(user)))
}

pub async fn delete(
    State(s): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<ApiResponse<()>>> {
    let done = sqlx::query("DELETE FROM users WHERE user_id = $1")
        .bind(user_id)
        .execute(&s.db)
        .await?;
    if done.rows_affected() == 0 {
        return Err(ApiError::NotFound("User"));
    }
    Ok(Json(ApiResponse::message("User deleted")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_whitelist() {
        assert!(check_role("admin").is_ok());
        assert!(check_role("customer").is_ok());
        assert!(check_role("superuser").is_err());
    }

    #[test]
    fn password_hash_round_trip() {
        let hash = hash_password("hunter2!").unwrap();
        assert_ne!(hash, "hunter2!");
        assert!(bcrypt::verify("hunter2!", &hash).unwrap());
    }
}
