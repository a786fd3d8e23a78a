//! Core of the maintenance record keeper.
//! This crate is the single source of truth for business invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod store;

pub use config::AppConfig;
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use logging::{default_log_level, init_logging, init_logging_from_config, logging_status};
pub use model::checklist_item::{
    ChecklistItem, ChecklistItemDraft, ChecklistItemId, ChecklistItemInput, ResponseKind,
    ResponseType,
};
pub use model::employee::{Employee, EmployeeId, EmployeeInput};
pub use model::equipment::{Equipment, EquipmentId, EquipmentInput};
pub use model::maintenance_type::{
    MaintenanceType, MaintenanceTypeId, MaintenanceTypeInput, MaintenanceTypeWithChecklist,
};
pub use model::order_response::{
    OrderResponse, OrderResponseId, OrderResponseInput, OrderResponseView, ResponseEntry,
};
pub use model::service_order::{
    ChecklistFormItem, ServiceOrder, ServiceOrderDetail, ServiceOrderFilter, ServiceOrderForm,
    ServiceOrderId, ServiceOrderInput, ServiceOrderStatus, ServiceOrderView,
};
pub use model::ValidationError;
pub use repo::checklist_item_repo::{ChecklistItemRepository, SqliteChecklistItemRepository};
pub use repo::employee_repo::{EmployeeRepository, SqliteEmployeeRepository};
pub use repo::equipment_repo::{EquipmentRepository, SqliteEquipmentRepository};
pub use repo::maintenance_type_repo::{MaintenanceTypeRepository, SqliteMaintenanceTypeRepository};
pub use repo::order_response_repo::{OrderResponseRepository, SqliteOrderResponseRepository};
pub use repo::service_order_repo::{ServiceOrderRepository, SqliteServiceOrderRepository};
pub use repo::{Entity, ErrorKind, RepoError, RepoResult};
pub use store::Store;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
