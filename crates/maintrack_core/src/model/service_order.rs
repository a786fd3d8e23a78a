//! Service orders: one scheduled execution of a maintenance type against
//! one equipment unit, assigned to one employee.
//!
//! # Invariants
//! - `order_number` is generated once (`OS` + `yymm` + 3-digit sequence)
//!   and never rewritten.
//! - Status changes are unrestricted; only a change to `Completed` through
//!   the status operation stamps `completion_date`.

use super::checklist_item::ChecklistItem;
use super::employee::EmployeeId;
use super::equipment::EquipmentId;
use super::maintenance_type::MaintenanceTypeId;
use super::order_response::{OrderResponseId, OrderResponseView};
use super::{normalize_optional, require_text, ValidationError};
use chrono::{DateTime, Datelike, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use uuid::Uuid;

pub type ServiceOrderId = Uuid;

static ORDER_SEQUENCE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{3})$").expect("valid order sequence regex"));

/// Service order lifecycle state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceOrderStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

impl ServiceOrderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(Self::Pending),
            "in_progress" => Some(Self::InProgress),
            "completed" => Some(Self::Completed),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }
}

impl Display for ServiceOrderStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceOrderStatus {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value.trim()).ok_or_else(|| {
            ValidationError::invalid(
                "status",
                format!("unknown status `{value}`; expected pending|in_progress|completed|cancelled"),
            )
        })
    }
}

/// Stored service order row.
///
/// Reference columns are nullable in storage; rows written by this crate
/// always carry them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceOrder {
    pub id: ServiceOrderId,
    pub order_number: String,
    pub equipment_id: Option<EquipmentId>,
    pub maintenance_type_id: Option<MaintenanceTypeId>,
    pub assigned_to: Option<EmployeeId>,
    pub status: ServiceOrderStatus,
    pub scheduled_date: String,
    pub completion_date: Option<String>,
    pub completion_notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Service order enriched with display names of its references.
///
/// Names are `None` when the referenced row no longer exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceOrderView {
    #[serde(flatten)]
    pub order: ServiceOrder,
    pub equipment_name: Option<String>,
    pub maintenance_type_name: Option<String>,
    pub assigned_to_name: Option<String>,
}

/// Service order with its recorded responses, ordered by checklist position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceOrderDetail {
    #[serde(flatten)]
    pub view: ServiceOrderView,
    pub responses: Vec<OrderResponseView>,
}

/// One line of the fill-in form: a checklist item plus its current answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistFormItem {
    #[serde(flatten)]
    pub item: ChecklistItem,
    pub response_value: Option<String>,
    pub response_id: Option<OrderResponseId>,
}

/// Fill-in form for one order: the full checklist of its maintenance type
/// merged with any responses already recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceOrderForm {
    #[serde(flatten)]
    pub detail: ServiceOrderDetail,
    pub checklist_items: Vec<ChecklistFormItem>,
}

/// Create / full-replace input for service orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceOrderInput {
    pub equipment_id: EquipmentId,
    pub maintenance_type_id: MaintenanceTypeId,
    pub assigned_to: EmployeeId,
    #[serde(default)]
    pub status: ServiceOrderStatus,
    pub scheduled_date: String,
    #[serde(default)]
    pub completion_date: Option<String>,
    #[serde(default)]
    pub completion_notes: Option<String>,
}

impl ServiceOrderInput {
    pub fn new(
        equipment_id: EquipmentId,
        maintenance_type_id: MaintenanceTypeId,
        assigned_to: EmployeeId,
        scheduled_date: impl Into<String>,
    ) -> Self {
        Self {
            equipment_id,
            maintenance_type_id,
            assigned_to,
            status: ServiceOrderStatus::Pending,
            scheduled_date: scheduled_date.into(),
            completion_date: None,
            completion_notes: None,
        }
    }

    pub fn with_status(mut self, status: ServiceOrderStatus) -> Self {
        self.status = status;
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("scheduled_date", &self.scheduled_date)
    }

    pub(crate) fn completion_date(&self) -> Option<&str> {
        normalize_optional(self.completion_date.as_deref())
    }

    pub(crate) fn completion_notes(&self) -> Option<&str> {
        normalize_optional(self.completion_notes.as_deref())
    }
}

/// Optional, conjunctive filters for listing service orders.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceOrderFilter {
    pub status: Option<ServiceOrderStatus>,
    /// Inclusive lower bound on `scheduled_date`.
    pub start_date: Option<String>,
    /// Inclusive upper bound on `scheduled_date`.
    pub end_date: Option<String>,
    pub equipment_id: Option<EquipmentId>,
    pub maintenance_type_id: Option<MaintenanceTypeId>,
    pub assigned_to: Option<EmployeeId>,
}

/// `yymm` period used as order-number prefix and counter key.
pub fn order_period(at: DateTime<Utc>) -> String {
    format!("{:02}{:02}", at.year() % 100, at.month())
}

/// Formats an order number such as `OS2503001`.
pub fn format_order_number(period: &str, sequence: i64) -> String {
    format!("OS{period}{sequence:03}")
}

/// Trailing 3-digit sequence of an order number, if numeric.
pub fn order_sequence_suffix(order_number: &str) -> Option<i64> {
    ORDER_SEQUENCE_RE
        .captures(order_number)
        .and_then(|caps| caps.get(1))
        .and_then(|digits| digits.as_str().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::{
        format_order_number, order_period, order_sequence_suffix, ServiceOrderStatus,
    };
    use chrono::{TimeZone, Utc};

    #[test]
    fn order_number_uses_two_digit_year_and_month() {
        let at = Utc.with_ymd_and_hms(2025, 3, 31, 23, 59, 0).unwrap();
        assert_eq!(order_period(at), "2503");
        assert_eq!(format_order_number("2503", 1), "OS2503001");
        assert_eq!(format_order_number("2512", 42), "OS2512042");
    }

    #[test]
    fn sequence_suffix_reads_trailing_digits_only() {
        assert_eq!(order_sequence_suffix("OS2503007"), Some(7));
        assert_eq!(order_sequence_suffix("OS2503ABC"), None);
        assert_eq!(order_sequence_suffix("12"), None);
    }

    #[test]
    fn status_round_trips_through_storage_text() {
        for status in [
            ServiceOrderStatus::Pending,
            ServiceOrderStatus::InProgress,
            ServiceOrderStatus::Completed,
            ServiceOrderStatus::Cancelled,
        ] {
            assert_eq!(ServiceOrderStatus::parse(status.as_str()), Some(status));
        }
        assert!("done".parse::<ServiceOrderStatus>().is_err());
        assert_eq!(
            " in_progress ".parse::<ServiceOrderStatus>().unwrap(),
            ServiceOrderStatus::InProgress
        );
    }
}
