//! HTTP handlers, one module per resource.
//!
//! Every handler catches at its own boundary and converts failures into the
//! JSON envelope via [`crate::ApiError`].

use crate::domain::events::DomainEvent;

pub mod custom_orders;
pub mod designs;
pub mod feedback;
pub mod inventory;
pub mod orders;
pub mod promotions;
pub mod users;

#[derive(Clone)]
pub struct AppState {
    pub db: sqlx::PgPool,
    pub nats: Option<async_nats::Client>,
}

impl AppState {
    /// Best-effort event publish; the request never fails because the bus is
    /// down or absent.
    pub async fn publish(&self, event: DomainEvent) {
        let Some(nats) = &self.nats else { return };
        match serde_json::to_vec(&event) {
            Ok(payload) => {
                if let Err(err) = nats.publish(event.subject(), payload.into()).await {
                    tracing::warn!(subject = event.subject(), %err, "event publish failed");
                }
            }
            Err(err) => tracing::warn!(%err, "event serialization failed"),
        }
    }
}
