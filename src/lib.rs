//! Threadcraft Fashion Commerce Platform
//!
//! Storefront and back-office API for a fashion retailer.
//!
//! ## Features
//! - Inventory tracking with derived stock status
//! - Stock retrieval / re-pricing staging workflow
//! - Custom clothing orders with approval-to-order conversion
//! - Promotions, orders, feedback, users, saved designs

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod domain;
pub mod handlers;

// =============================================================================
// Response Envelope
// =============================================================================

/// Uniform JSON envelope returned by every handler.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self { success: true, message: None, data: Some(data) }
    }

    pub fn ok_with(message: impl Into<String>, data: T) -> Self {
        Self { success: true, message: Some(message.into()), data: Some(data) }
    }
}

impl ApiResponse<()> {
    pub fn message(message: impl Into<String>) -> Self {
        Self { success: true, message: Some(message.into()), data: None }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl ListParams {
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn limit(&self) -> u32 {
        self.limit.unwrap_or(10).clamp(1, 100)
    }

    pub fn offset(&self) -> i64 {
        (self.page() as i64 - 1) * self.limit() as i64
    }
}

#[derive(Debug, Serialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: u32,
    pub pages: i64,
}

impl<T> Paginated<T> {
    pub fn new(items: Vec<T>, total: i64, page: u32, limit: u32) -> Self {
        let pages = (total + limit as i64 - 1) / limit as i64;
        Self { items, total, page, pages }
    }
}

// =============================================================================
// Error Types
// =============================================================================

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("cannot transition {entity} from '{from}' to '{to}'")]
    InvalidTransition { entity: &'static str, from: String, to: String },

    #[error("{message}")]
    Conversion { message: String, resource: serde_json::Value },

    #[error("{0}")]
    Internal(String),

    #[error("{0}")]
    Database(#[from] sqlx::Error),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::BadRequest(_) | Self::InvalidTransition { .. } => {
                StatusCode::BAD_REQUEST
            }
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Database(sqlx::Error::RowNotFound) => StatusCode::NOT_FOUND,
            Self::Conversion { .. } | Self::Internal(_) | Self::Database(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        // Underlying messages are surfaced as-is; there is no sanitization layer.
        let body = match self {
            Self::Conversion { message, resource } => ApiResponse {
                success: false,
                message: Some(message),
                data: Some(resource),
            },
            other => ApiResponse {
                success: false,
                message: Some(other.to_string()),
                data: None,
            },
        };
        (status, Json(body)).into_response()
    }
}

/// Flattens validator output into per-field messages for the 400 body.
pub fn validation_message(errors: &validator::ValidationErrors) -> String {
    let mut parts: Vec<String> = errors
        .field_errors()
        .iter()
        .map(|(field, errs)| {
            let detail = errs
                .iter()
                .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
                .collect::<Vec<_>>()
                .join(", ");
            if detail.is_empty() {
                format!("{field} is invalid")
            } else {
                format!("{field}: {detail}")
            }
        })
        .collect();
    parts.sort();
    parts.join("; ")
}

pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_defaults() {
        let p = ListParams { page: None, limit: None };
        assert_eq!(p.page(), 1);
        assert_eq!(p.limit(), 10);
        assert_eq!(p.offset(), 0);
    }

    #[test]
    fn pagination_offset_survives_huge_pages() {
        let p = ListParams { page: Some(u32::MAX), limit: Some(100) };
        assert_eq!(p.offset(), (u32::MAX as i64 - 1) * 100);
    }

    #[test]
    fn pagination_page_count_rounds_up() {
        let page: Paginated<u8> = Paginated::new(vec![], 21, 1, 10);
        assert_eq!(page.pages, 3);
    }

    #[test]
    fn not_found_maps_to_404() {
        assert_eq!(ApiError::NotFound("Order").status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::Database(sqlx::Error::RowNotFound).status(),
            StatusCode::NOT_FOUND
        );
    }
}
