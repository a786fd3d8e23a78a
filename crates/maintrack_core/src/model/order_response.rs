//! Recorded checklist answers.

use super::checklist_item::{ChecklistItemId, ResponseType};
use super::service_order::ServiceOrderId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type OrderResponseId = Uuid;

/// Answer to one checklist item within one service order.
///
/// At most one row exists per (`service_order_id`, `checklist_item_id`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderResponse {
    pub id: OrderResponseId,
    pub service_order_id: ServiceOrderId,
    pub checklist_item_id: ChecklistItemId,
    /// Raw answer text; its meaning depends on the item's response kind.
    pub response_value: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Response joined with the checklist item it answers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderResponseView {
    #[serde(flatten)]
    pub response: OrderResponse,
    pub description: String,
    pub response_type: ResponseType,
    pub unit: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderResponseInput {
    pub service_order_id: ServiceOrderId,
    pub checklist_item_id: ChecklistItemId,
    pub response_value: String,
}

/// One entry of a batch save; the order id comes from the batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseEntry {
    pub checklist_item_id: ChecklistItemId,
    pub response_value: String,
}

impl ResponseEntry {
    pub fn new(checklist_item_id: ChecklistItemId, response_value: impl Into<String>) -> Self {
        Self {
            checklist_item_id,
            response_value: response_value.into(),
        }
    }

    pub(crate) fn for_order(&self, service_order_id: ServiceOrderId) -> OrderResponseInput {
        OrderResponseInput {
            service_order_id,
            checklist_item_id: self.checklist_item_id,
            response_value: self.response_value.clone(),
        }
    }
}
