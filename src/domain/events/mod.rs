//! Domain events published to the message bus when one is configured.

use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DomainEvent {
    OrderCreated { order_id: Uuid, order_number: String, total: Decimal },
    OrderStatusChanged { order_id: Uuid, from: String, to: String },
    CustomOrderConverted { custom_order_id: Uuid, order_id: Uuid, order_number: String },
    InventoryRetrieved { inventory_id: i64, retrieved_quantity: i32 },
}

impl DomainEvent {
    /// NATS subject the event is published on.
    pub fn subject(&self) -> &'static str {
        match self {
            Self::OrderCreated { .. } => "threadcraft.orders.created",
            Self::OrderStatusChanged { .. } => "threadcraft.orders.status",
            Self::CustomOrderConverted { .. } => "threadcraft.custom_orders.converted",
            Self::InventoryRetrieved { .. } => "threadcraft.inventory.retrieved",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn event_payload_shape() {
        let e = DomainEvent::OrderCreated {
            order_id: Uuid::nil(),
            order_number: "CUSTOM-1a2b3c".into(),
            total: dec!(91.98),
        };
        let json = serde_json::to_value(&e).unwrap();
        assert_eq!(json["event"], "order_created");
        assert_eq!(json["order_number"], "CUSTOM-1a2b3c");
        assert_eq!(e.subject(), "threadcraft.orders.created");
    }
}
