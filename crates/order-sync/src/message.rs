//! Delivery-system message and partial batch failure report.

use serde::{Deserialize, Serialize};

/// One message of a delivery batch.
///
/// The body is an opaque string expected to hold a JSON `IncomingOrderEvent`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub message_id: String,
    pub body: String,
}

impl Message {
    pub fn new(message_id: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            message_id: message_id.into(),
            body: body.into(),
        }
    }
}

/// A message the delivery system must redeliver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchItemFailure {
    pub item_identifier: String,
}

/// Partial batch failure report.
///
/// Messages without an entry are fully handled and must not be redelivered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchResponse {
    pub batch_item_failures: Vec<BatchItemFailure>,
}

impl BatchResponse {
    /// Adds a message to the redelivery set.
    pub fn push_failure(&mut self, message_id: impl Into<String>) {
        self.batch_item_failures.push(BatchItemFailure {
            item_identifier: message_id.into(),
        });
    }

    /// Identifiers of the messages to redeliver, in batch order.
    pub fn failed_ids(&self) -> Vec<&str> {
        self.batch_item_failures
            .iter()
            .map(|f| f.item_identifier.as_str())
            .collect()
    }

    /// Returns true if the whole batch was handled.
    pub fn is_empty(&self) -> bool {
        self.batch_item_failures.is_empty()
    }
}
