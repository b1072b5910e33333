//! Inventory endpoints: CRUD, stock-status transitions, and the
//! retrieve / send-to-store staging workflow.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::domain::events::DomainEvent;
use crate::domain::value_objects::StockStatus;
use crate::{validation_message, ApiError, ApiResponse, ListParams, Paginated, Result};

use super::AppState;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct InventoryItem {
    pub id: Uuid,
    pub inventory_id: i64,
    pub item_name: String,
    pub category: String,
    pub brand: Option<String>,
    pub sizes: Vec<String>,
    pub colors: Vec<String>,
    pub gender: Option<String>,
    pub style: Option<String>,
    pub quantity: i32,
    pub reorder_threshold: i32,
    pub stock_status: String,
    pub unit_price: Option<Decimal>,
    pub supplier_name: Option<String>,
    pub supplier_contact: Option<String>,
    pub image_path: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct RetrievedInventory {
    pub id: Uuid,
    pub inventory_id: i64,
    pub item_name: String,
    pub category: String,
    pub brand: Option<String>,
    pub image_path: String,
    pub retrieved_quantity: i32,
    pub unit_price: Option<Decimal>,
    pub retrieved_at: DateTime<Utc>,
}

/// Reduces whatever the upload layer hands us (absolute path, URL, bare
/// filename) to the relative `uploads/inventory/...` form stored in the
/// database.
pub fn normalize_image_path(raw: &str) -> String {
    let raw = raw.trim().replace('\\', "/");
    if let Some(idx) = raw.find("uploads/") {
        return raw[idx..].to_string();
    }
    let file = raw.rsplit('/').next().unwrap_or(&raw);
    format!("uploads/inventory/{file}")
}

/// Splits a comma-separated field ("S, M,L") into a trimmed list.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateInventoryRequest {
    #[validate(length(min = 1, message = "item name is required"))]
    pub item_name: String,
    #[validate(length(min = 1, message = "category is required"))]
    pub category: String,
    pub brand: Option<String>,
    /// Comma-separated, e.g. "S,M,L".
    pub sizes: Option<String>,
    pub colors: Option<String>,
    pub gender: Option<String>,
    pub style: Option<String>,
    #[validate(range(min = 0, message = "quantity must be a non-negative integer"))]
    pub quantity: i32,
    #[validate(range(min = 0, message = "reorder threshold must be a non-negative integer"))]
    pub reorder_threshold: i32,
    pub unit_price: Option<Decimal>,
    pub supplier_name: Option<String>,
    pub supplier_contact: Option<String>,
    #[validate(length(min = 1, message = "an item image is required"))]
    pub image: String,
}

pub async fn create_item(
    State(s): State<AppState>,
    Json(r): Json<CreateInventoryRequest>,
) -> Result<(StatusCode, Json<ApiResponse<InventoryItem>>)> {
    r.validate().map_err(|e| ApiError::Validation(validation_message(&e)))?;
    let status = StockStatus::derive(r.quantity, r.reorder_threshold);
    let now = Utc::now();
    let item = sqlx::query_as::<_, InventoryItem>(
        "INSERT INTO inventory (id, item_name, category, brand, sizes, colors, gender, style, \
         quantity, reorder_threshold, stock_status, unit_price, supplier_name, supplier_contact, \
         image_path, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $16) \
         RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(&r.item_name)
    .bind(&r.category)
    .bind(&r.brand)
    .bind(r.sizes.as_deref().map(split_list).unwrap_or_default())
    .bind(r.colors.as_deref().map(split_list).unwrap_or_default())
    .bind(&r.gender)
    .bind(&r.style)
    .bind(r.quantity)
    .bind(r.reorder_threshold)
    .bind(status.as_str())
    .bind(r.unit_price)
    .bind(&r.supplier_name)
    .bind(&r.supplier_contact)
    .bind(normalize_image_path(&r.image))
    .bind(now)
    .fetch_one(&s.db)
    .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(item))))
}

pub async fn list_items(
    State(s): State<AppState>,
    Query(p): Query<ListParams>,
) -> Result<Json<ApiResponse<Paginated<InventoryItem>>>> {
    let items = sqlx::query_as::<_, InventoryItem>(
        "SELECT * FROM inventory ORDER BY created_at DESC LIMIT $1 OFFSET $2",
    )
    .bind(p.limit() as i64)
    .bind(p.offset())
    .fetch_all(&s.db)
    .await?;
    let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM inventory")
        .fetch_one(&s.db)
        .await?;
    Ok(Json(ApiResponse::ok(Paginated::new(items, total.0, p.page(), p.limit()))))
}

pub async fn get_item(
    State(s): State<AppState>,
    Path(inventory_id): Path<i64>,
) -> Result<Json<ApiResponse<InventoryItem>>> {
    let item = sqlx::query_as::<_, InventoryItem>("SELECT * FROM inventory WHERE inventory_id = $1")
        .bind(inventory_id)
        .fetch_optional(&s.db)
        .await?
        .ok_or(ApiError::NotFound("Inventory item"))?;
    Ok(Json(ApiResponse::ok(item)))
}

pub async fn by_category(
    State(s): State<AppState>,
    Path(category): Path<String>,
) -> Result<Json<ApiResponse<Vec<InventoryItem>>>> {
    let items = sqlx::query_as::<_, InventoryItem>(
        "SELECT * FROM inventory WHERE category = $1 ORDER BY item_name",
    )
    .bind(&category)
    .fetch_all(&s.db)
    .await?;
    if items.is_empty() {
        return Err(ApiError::NotFound("Inventory for this category"));
    }
    Ok(Json(ApiResponse::ok(items)))
}

pub async fn low_stock(State(s): State<AppState>) -> Result<Json<ApiResponse<Vec<InventoryItem>>>> {
    let items = sqlx::query_as::<_, InventoryItem>(
        "SELECT * FROM inventory WHERE stock_status <> 'in-stock' ORDER BY quantity ASC",
    )
    .fetch_all(&s.db)
    .await?;
    Ok(Json(ApiResponse::ok(items)))
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateInventoryRequest {
    pub item_name: Option<String>,
    pub category: Option<String>,
    pub brand: Option<String>,
    pub sizes: Option<String>,
    pub colors: Option<String>,
    pub gender: Option<String>,
    pub style: Option<String>,
    #[validate(range(min = 0, message = "quantity must be a non-negative integer"))]
    pub quantity: Option<i32>,
    #[validate(range(min = 0, message = "reorder threshold must be a non-negative integer"))]
    pub reorder_threshold: Option<i32>,
    pub unit_price: Option<Decimal>,
    pub supplier_name: Option<String>,
    pub supplier_contact: Option<String>,
    pub image: Option<String>,
}

pub async fn update_item(
    State(s): State<AppState>,
    Path(inventory_id): Path<i64>,
    Json(r): Json<UpdateInventoryRequest>,
) -> Result<Json<ApiResponse<InventoryItem>>> {
    r.validate().map_err(|e| ApiError::Validation(validation_message(&e)))?;
    let current = sqlx::query_as::<_, InventoryItem>("SELECT * FROM inventory WHERE inventory_id = $1")
        .bind(inventory_id)
        .fetch_optional(&s.db)
        .await?
        .ok_or(ApiError::NotFound("Inventory item"))?;

    let quantity = r.quantity.unwrap_or(current.quantity);
    let threshold = r.reorder_threshold.unwrap_or(current.reorder_threshold);
    let status = StockStatus::derive(quantity, threshold);
    let item = sqlx::query_as::<_, InventoryItem>(
        "UPDATE inventory SET item_name = $2, category = $3, brand = $4, sizes = $5, colors = $6, \
         gender = $7, style = $8, quantity = $9, reorder_threshold = $10, stock_status = $11, \
         unit_price = $12, supplier_name = $13, supplier_contact = $14, image_path = $15, \
         updated_at = $16 WHERE inventory_id = $1 RETURNING *",
    )
    .bind(inventory_id)
    .bind(r.item_name.unwrap_or(current.item_name))
    .bind(r.category.unwrap_or(current.category))
    .bind(r.brand.or(current.brand))
    .bind(r.sizes.as_deref().map(split_list).unwrap_or(current.sizes))
    .bind(r.colors.as_deref().map(split_list).unwrap_or(current.colors))
    .bind(r.gender.or(current.gender))
    .bind(r.style.or(current.style))
    .bind(quantity)
    .bind(threshold)
    .bind(status.as_str())
    .bind(r.unit_price.or(current.unit_price))
    .bind(r.supplier_name.or(current.supplier_name))
    .bind(r.supplier_contact.or(current.supplier_contact))
    .bind(r.image.as_deref().map(normalize_image_path).unwrap_or(current.image_path))
    .bind(Utc::now())
    .fetch_one(&s.db)
    .await?;
    Ok(Json(ApiResponse::ok(item)))
}

pub async fn delete_item(
    State(s): State<AppState>,
    Path(inventory_id): Path<i64>,
) -> Result<Json<ApiResponse<()>>> {
    let done = sqlx::query("DELETE FROM inventory WHERE inventory_id = $1")
        .bind(inventory_id)
        .execute(&s.db)
        .await?;
    if done.rows_affected() == 0 {
        return Err(ApiError::NotFound("Inventory item"));
    }
    Ok(Json(ApiResponse::message("Inventory item deleted")))
}

/// Quantity pulled from the shelf when stock drops to `new_quantity`.
/// Retrieval only ever lowers stock, so the new quantity cannot exceed
/// what is currently on the shelf.
pub fn staged_withdrawal(current: i32, new_quantity: i32) -> Result<i32> {
    if new_quantity > current {
        return Err(ApiError::BadRequest(format!(
            "new quantity {new_quantity} cannot exceed current stock {current}"
        )));
    }
    Ok(current - new_quantity)
}

#[derive(Debug, Deserialize)]
pub struct StockUpdateRequest {
    pub quantity: i32,
    /// "retrieve" to stage stock for re-pricing, "add" to restock.
    pub action: Option<String>,
    pub unit_price: Option<Decimal>,
}

/// The only place stock transitions happen. Recomputes the derived status
/// and, for `retrieve`, writes the staging snapshot in the same transaction
/// as the quantity change.
pub async fn update_stock_status(
    State(s): State<AppState>,
    Path(inventory_id): Path<i64>,
    Json(r): Json<StockUpdateRequest>,
) -> Result<Json<ApiResponse<InventoryItem>>> {
    if r.quantity < 0 {
        return Err(ApiError::BadRequest(
            "quantity must be a non-negative integer".to_string(),
        ));
    }

    let mut tx = s.db.begin().await?;
    let current = sqlx::query_as::<_, InventoryItem>(
        "SELECT * FROM inventory WHERE inventory_id = $1 FOR UPDATE",
    )
    .bind(inventory_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or(ApiError::NotFound("Inventory item"))?;

    let action = r.action.as_deref().unwrap_or("");
    let mut retrieved = None;
    if action == "retrieve" {
        let retrieved_quantity = staged_withdrawal(current.quantity, r.quantity)?;
        sqlx::query(
            "INSERT INTO retrieved_inventory (id, inventory_id, item_name, category, brand, \
             image_path, retrieved_quantity, unit_price, retrieved_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(Uuid::now_v7())
        .bind(current.inventory_id)
        .bind(&current.item_name)
        .bind(&current.category)
        .bind(&current.brand)
        .bind(&current.image_path)
        .bind(retrieved_quantity)
        .bind(r.unit_price)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;
        retrieved = Some(retrieved_quantity);
    }

    let unit_price = if action == "add" && r.unit_price.is_some() {
        r.unit_price
    } else {
        current.unit_price
    };
    let status = StockStatus::derive(r.quantity, current.reorder_threshold);
    let item = sqlx::query_as::<_, InventoryItem>(
        "UPDATE inventory SET quantity = $2, stock_status = $3, unit_price = $4, updated_at = $5 \
         WHERE inventory_id = $1 RETURNING *",
    )
    .bind(inventory_id)
    .bind(r.quantity)
    .bind(status.as_str())
    .bind(unit_price)
    .bind(Utc::now())
    .fetch_one(&mut *tx)
    .await?;
    tx.commit().await?;

    if let Some(retrieved_quantity) = retrieved {
        s.publish(DomainEvent::InventoryRetrieved { inventory_id, retrieved_quantity })
            .await;
    }
    Ok(Json(ApiResponse::ok(item)))
}

pub async fn list_retrieved(
    State(s): State<AppState>,
) -> Result<Json<ApiResponse<Vec<RetrievedInventory>>>> {
    let records = sqlx::query_as::<_, RetrievedInventory>(
        "SELECT * FROM retrieved_inventory ORDER BY retrieved_at DESC",
    )
    .fetch_all(&s.db)
    .await?;
    Ok(Json(ApiResponse::ok(records)))
}

#[derive(Debug, Deserialize)]
pub struct SendToStoreRequest {
    pub unit_price: Decimal,
}

/// Re-price and re-list a staged withdrawal: the new price lands on the
/// source item, the staged quantity returns to shelf stock, and the staging
/// row is consumed. One transaction, so a failure leaves the staging row
/// intact.
pub async fn send_to_store(
    State(s): State<AppState>,
    Path(id): Path<Uuid>,
    Json(r): Json<SendToStoreRequest>,
) -> Result<Json<ApiResponse<InventoryItem>>> {
    if r.unit_price <= Decimal::ZERO {
        return Err(ApiError::BadRequest("unit price must be positive".to_string()));
    }

    let mut tx = s.db.begin().await?;
    let staged = sqlx::query_as::<_, RetrievedInventory>(
        "SELECT * FROM retrieved_inventory WHERE id = $1 FOR UPDATE",
    )
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or(ApiError::NotFound("Retrieved inventory record"))?;

    let current = sqlx::query_as::<_, InventoryItem>(
        "SELECT * FROM inventory WHERE inventory_id = $1 FOR UPDATE",
    )
    .bind(staged.inventory_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or(ApiError::NotFound("Inventory item"))?;

    let quantity = current.quantity + staged.retrieved_quantity;
    let status = StockStatus::derive(quantity, current.reorder_threshold);
    let item = sqlx::query_as::<_, InventoryItem>(
        "UPDATE inventory SET quantity = $2, stock_status = $3, unit_price = $4, updated_at = $5 \
         WHERE inventory_id = $1 RETURNING *",
    )
    .bind(staged.inventory_id)
    .bind(quantity)
    .bind(status.as_str())
    .bind(r.unit_price)
    .bind(Utc::now())
    .fetch_one(&mut *tx)
    .await?;
    sqlx::query("DELETE FROM retrieved_inventory WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;
    Ok(Json(ApiResponse::ok(item)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_path_normalization() {
        assert_eq!(
            normalize_image_path("http://cdn.example.com/uploads/inventory/shirt.png"),
            "uploads/inventory/shirt.png"
        );
        assert_eq!(
            normalize_image_path("/var/tmp/staging/shirt.png"),
            "uploads/inventory/shirt.png"
        );
        assert_eq!(normalize_image_path("shirt.png"), "uploads/inventory/shirt.png");
        assert_eq!(
            normalize_image_path("C:\\images\\shirt.png"),
            "uploads/inventory/shirt.png"
        );
        assert_eq!(
            normalize_image_path("uploads/inventory/shirt.png"),
            "uploads/inventory/shirt.png"
        );
    }

    #[test]
    fn withdrawal_is_current_minus_new() {
        assert_eq!(staged_withdrawal(10, 4).unwrap(), 6);
        assert_eq!(staged_withdrawal(10, 10).unwrap(), 0);
    }

    #[test]
    fn withdrawal_rejects_quantity_above_stock() {
        let err = staged_withdrawal(5, 8).unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
        assert_eq!(
            err.to_string(),
            "new quantity 8 cannot exceed current stock 5"
        );
    }

    #[test]
    fn list_splitting() {
        assert_eq!(split_list("S, M,L"), vec!["S", "M", "L"]);
        assert_eq!(split_list(" , ,"), Vec::<String>::new());
        assert_eq!(split_list("red"), vec!["red"]);
    }
}
