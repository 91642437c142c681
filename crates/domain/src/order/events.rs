//! Order domain events as received from the delivery system.

use chrono::{DateTime, Utc};
use common::OrderId;
use serde::{Deserialize, Serialize};

use super::{Money, OrderError, Sku, UserId};

/// The kind of an order domain event.
///
/// `Placed` is the only event that originates an aggregate; all others apply
/// to an order that already exists. `Created` is also the event the engine
/// emits downstream once an order has been persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderEventName {
    Placed,
    Created,
    StockDepleted,
    StockAllocated,
    PaymentRejected,
    PaymentAccepted,
    Shipped,
    Delivered,
    Canceled,
}

impl OrderEventName {
    /// Number of event names.
    pub const COUNT: usize = 9;

    /// Every event name, in declaration order.
    pub const ALL: [OrderEventName; Self::COUNT] = [
        OrderEventName::Placed,
        OrderEventName::Created,
        OrderEventName::StockDepleted,
        OrderEventName::StockAllocated,
        OrderEventName::PaymentRejected,
        OrderEventName::PaymentAccepted,
        OrderEventName::Shipped,
        OrderEventName::Delivered,
        OrderEventName::Canceled,
    ];

    /// Column of this event in the transition table.
    pub(crate) const fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderEventName::Placed => "Placed",
            OrderEventName::Created => "Created",
            OrderEventName::StockDepleted => "StockDepleted",
            OrderEventName::StockAllocated => "StockAllocated",
            OrderEventName::PaymentRejected => "PaymentRejected",
            OrderEventName::PaymentAccepted => "PaymentAccepted",
            OrderEventName::Shipped => "Shipped",
            OrderEventName::Delivered => "Delivered",
            OrderEventName::Canceled => "Canceled",
        }
    }
}

impl std::fmt::Display for OrderEventName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Largest unit count an order may carry; units are stored in a signed
/// 32-bit column.
pub const MAX_UNITS: u32 = i32::MAX as u32;

/// Order attributes carried by every incoming event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderEventData {
    pub order_id: OrderId,
    pub sku: Sku,
    pub units: u32,
    pub price: Money,
    pub user_id: UserId,
}

/// The payload of one delivery message after deserialization.
///
/// Wire format (camelCase JSON):
/// ```json
/// {
///   "eventName": "Placed",
///   "eventData": {"orderId": "o-1", "sku": "SKU-1", "units": 2, "price": 1999, "userId": "u-1"},
///   "createdAt": "2024-01-01T00:00:00Z",
///   "updatedAt": "2024-01-01T00:00:00Z"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomingOrderEvent {
    pub event_name: OrderEventName,
    pub event_data: OrderEventData,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl IncomingOrderEvent {
    /// Returns the identifier of the order this event targets.
    pub fn order_id(&self) -> &OrderId {
        &self.event_data.order_id
    }

    /// Returns true if this event originates an order.
    pub fn is_placed(&self) -> bool {
        self.event_name == OrderEventName::Placed
    }

    /// Checks the structural invariants every event must satisfy before it
    /// reaches the engine.
    pub fn validate(&self) -> Result<(), OrderError> {
        let data = &self.event_data;

        if data.order_id.is_blank() {
            return Err(OrderError::OrderIdRequired);
        }
        if data.sku.is_blank() {
            return Err(OrderError::SkuRequired);
        }
        if data.user_id.is_blank() {
            return Err(OrderError::UserIdRequired);
        }
        for (field, value) in [
            ("orderId", data.order_id.as_str()),
            ("sku", data.sku.as_str()),
            ("userId", data.user_id.as_str()),
        ] {
            if value.contains('\0') {
                return Err(OrderError::NulCharacter { field });
            }
        }
        if data.units == 0 || data.units > MAX_UNITS {
            return Err(OrderError::InvalidUnits { units: data.units });
        }
        if data.price.is_negative() {
            return Err(OrderError::InvalidPrice {
                price: data.price.cents(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_json() -> serde_json::Value {
        serde_json::json!({
            "eventName": "StockAllocated",
            "eventData": {
                "orderId": "order-1",
                "sku": "SKU-001",
                "units": 3,
                "price": 1250,
                "userId": "user-7"
            },
            "createdAt": "2024-03-01T10:00:00Z",
            "updatedAt": "2024-03-01T10:05:00Z"
        })
    }

    #[test]
    fn test_deserializes_wire_format() {
        let event: IncomingOrderEvent = serde_json::from_value(sample_json()).unwrap();

        assert_eq!(event.event_name, OrderEventName::StockAllocated);
        assert_eq!(event.order_id(), &OrderId::new("order-1"));
        assert_eq!(event.event_data.units, 3);
        assert_eq!(event.event_data.price, Money::from_cents(1250));
        assert!(!event.is_placed());
        assert!(event.validate().is_ok());
    }

    #[test]
    fn test_unknown_event_name_is_rejected() {
        let mut json = sample_json();
        json["eventName"] = serde_json::json!("Refunded");
        assert!(serde_json::from_value::<IncomingOrderEvent>(json).is_err());
    }

    #[test]
    fn test_missing_event_data_is_rejected() {
        let mut json = sample_json();
        json.as_object_mut().unwrap().remove("eventData");
        assert!(serde_json::from_value::<IncomingOrderEvent>(json).is_err());
    }

    #[test]
    fn test_validate_rejects_blank_order_id() {
        let mut event: IncomingOrderEvent = serde_json::from_value(sample_json()).unwrap();
        event.event_data.order_id = OrderId::new("");
        assert_eq!(event.validate(), Err(OrderError::OrderIdRequired));
    }

    #[test]
    fn test_validate_rejects_zero_units() {
        let mut event: IncomingOrderEvent = serde_json::from_value(sample_json()).unwrap();
        event.event_data.units = 0;
        assert_eq!(event.validate(), Err(OrderError::InvalidUnits { units: 0 }));
    }

    #[test]
    fn test_validate_rejects_negative_price() {
        let mut event: IncomingOrderEvent = serde_json::from_value(sample_json()).unwrap();
        event.event_data.price = Money::from_cents(-1);
        assert_eq!(event.validate(), Err(OrderError::InvalidPrice { price: -1 }));
    }

    #[test]
    fn test_validate_rejects_units_beyond_column_range() {
        let mut event: IncomingOrderEvent = serde_json::from_value(sample_json()).unwrap();
        event.event_data.units = 3_000_000_000;
        assert_eq!(
            event.validate(),
            Err(OrderError::InvalidUnits {
                units: 3_000_000_000
            })
        );

        event.event_data.units = MAX_UNITS;
        assert!(event.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_nul_characters() {
        let mut json = sample_json();
        json["eventData"]["sku"] = serde_json::json!("SKU\u{0}001");
        let event: IncomingOrderEvent = serde_json::from_value(json).unwrap();
        assert_eq!(
            event.validate(),
            Err(OrderError::NulCharacter { field: "sku" })
        );
    }

    #[test]
    fn test_validate_accepts_free_items() {
        let mut event: IncomingOrderEvent = serde_json::from_value(sample_json()).unwrap();
        event.event_data.price = Money::zero();
        assert!(event.validate().is_ok());
    }

    #[test]
    fn test_event_name_index_matches_position_in_all() {
        for (position, name) in OrderEventName::ALL.into_iter().enumerate() {
            assert_eq!(name.index(), position);
        }
    }
}
