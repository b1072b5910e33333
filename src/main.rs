//! Threadcraft - Fashion E-commerce and Custom Clothing Order Service

use anyhow::Result;
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use sqlx::postgres::PgPoolOptions;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use threadcraft::handlers::{
    custom_orders, designs, feedback, inventory, orders, promotions, users, AppState,
};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let db = PgPoolOptions::new()
        .max_connections(10)
        .connect(&std::env::var("DATABASE_URL")?)
        .await?;
    sqlx::migrate!("./migrations").run(&db).await?;
    let nats = match std::env::var("NATS_URL") {
        Ok(url) => async_nats::connect(&url).await.ok(),
        Err(_) => None,
    };
    let state = AppState { db, nats };

    let app = Router::new()
        .route("/health", get(|| async {
            Json(serde_json::json!({"status": "healthy", "service": "threadcraft"}))
        }))
        .route("/api/inventory", get(inventory::list_items).post(inventory::create_item))
        .route("/api/inventory/retrieved", get(inventory::list_retrieved))
        .route("/api/inventory/retrieved/:id/send-to-store", put(inventory::send_to_store))
        .route("/api/inventory/category/:category", get(inventory::by_category))
        .route("/api/inventory/status/low-stock", get(inventory::low_stock))
        .route(
            "/api/inventory/:id",
            get(inventory::get_item).put(inventory::update_item).delete(inventory::delete_item),
        )
        .route("/api/inventory/:id/stock-status", put(inventory::update_stock_status))
        .route("/api/custom-orders/create", post(custom_orders::create))
        .route("/api/custom-orders", get(custom_orders::list))
        .route("/api/custom-orders/user/:user_id", get(custom_orders::by_user))
        .route(
            "/api/custom-orders/:id",
            get(custom_orders::by_id).delete(custom_orders::delete),
        )
        .route("/api/custom-orders/:id/status", put(custom_orders::update_status))
        .route("/api/custom-orders/:id/approve", put(custom_orders::approve))
        .route("/api/custom-orders/:id/reject", put(custom_orders::reject))
        .route("/api/promotions", get(promotions::list).post(promotions::create))
        .route(
            "/api/promotions/:id",
            get(promotions::by_id).put(promotions::update).delete(promotions::delete),
        )
        .route("/api/promotions/:id/redeem", post(promotions::redeem))
        .route("/api/orders", get(orders::list).post(orders::create))
        .route("/api/orders/user/:user_id", get(orders::by_user))
        .route("/api/orders/:id", get(orders::by_id).delete(orders::delete))
        .route("/api/orders/:id/status", put(orders::update_status))
        .route("/api/feedbacks", get(feedback::list).post(feedback::create))
        .route("/api/feedbacks/:id", get(feedback::by_id).delete(feedback::delete))
        .route("/api/users", get(users::list).post(users::create))
        .route(
            "/api/users/:id",
            get(users::by_id).put(users::update).delete(users::delete),
        )
        .route("/api/designs", post(designs::create))
        .route("/api/designs/user/:user_id", get(designs::by_user))
        .route("/api/designs/:id", delete(designs::delete))
        .route("/api/designs/:id/favorite", put(designs::toggle_favorite))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    let port = std::env::var("PORT").unwrap_or_else(|_| "8084".to_string());
    tracing::info!("threadcraft listening on 0.0.0.0:{}", port);
    axum::serve(tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?, app).await?;
    Ok(())
}
