//! Service order repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Create, read, update and delete service orders.
//! - Generate order numbers from a per-period counter.
//! - Assemble read views: reference names, recorded responses, and the
//!   fill-in checklist form.
//!
//! # Invariants
//! - `order_number` is allocated inside the insert transaction and never
//!   rewritten afterwards.
//! - Lists are ordered by `scheduled_date DESC, order_number DESC`.
//! - Deleting an order deletes its responses first, in one transaction.
//! - An order with recorded responses keeps its maintenance type.

use super::checklist_item_repo::load_items_for_type;
use super::order_response_repo::load_responses_for_order;
use super::{
    count_by_id, ensure_exists, parse_optional_uuid, parse_uuid, timestamp_or_empty,
    with_immediate_tx, Entity, RepoError, RepoResult,
};
use crate::model::format_timestamp;
use crate::model::service_order::{
    format_order_number, order_period, order_sequence_suffix, ChecklistFormItem, ServiceOrder,
    ServiceOrderDetail, ServiceOrderFilter, ServiceOrderForm, ServiceOrderId, ServiceOrderInput,
    ServiceOrderStatus, ServiceOrderView,
};
use chrono::{DateTime, Utc};
use log::info;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::collections::HashMap;
use uuid::Uuid;

const SERVICE_ORDER_VIEW_SELECT_SQL: &str = "SELECT
    so.id AS id,
    so.order_number AS order_number,
    so.equipment_id AS equipment_id,
    so.maintenance_type_id AS maintenance_type_id,
    so.assigned_to AS assigned_to,
    so.status AS status,
    so.scheduled_date AS scheduled_date,
    so.completion_date AS completion_date,
    so.completion_notes AS completion_notes,
    so.created_at AS created_at,
    so.updated_at AS updated_at,
    e.name AS equipment_name,
    mt.name AS maintenance_type_name,
    emp.name AS assigned_to_name
FROM service_orders so
LEFT JOIN equipment e ON e.id = so.equipment_id
LEFT JOIN maintenance_types mt ON mt.id = so.maintenance_type_id
LEFT JOIN employees emp ON emp.id = so.assigned_to";

/// Repository interface for service orders.
pub trait ServiceOrderRepository {
    /// Lists orders matching every supplied filter, newest schedule first.
    fn list_service_orders(&self, filter: &ServiceOrderFilter) -> RepoResult<Vec<ServiceOrderView>>;
    fn get_service_order(&self, id: ServiceOrderId) -> RepoResult<Option<ServiceOrderDetail>>;
    /// Order detail plus every checklist item of its type with the current answer.
    fn get_service_order_with_checklist(
        &self,
        id: ServiceOrderId,
    ) -> RepoResult<Option<ServiceOrderForm>>;
    fn create_service_order(&self, input: ServiceOrderInput) -> RepoResult<ServiceOrder>;
    fn update_service_order(
        &self,
        id: ServiceOrderId,
        input: ServiceOrderInput,
    ) -> RepoResult<ServiceOrder>;
    /// Sets the status; `Completed` also stamps `completion_date`.
    fn update_service_order_status(
        &self,
        id: ServiceOrderId,
        status: ServiceOrderStatus,
        notes: Option<&str>,
    ) -> RepoResult<ServiceOrder>;
    fn delete_service_order(&self, id: ServiceOrderId) -> RepoResult<()>;
}

pub struct SqliteServiceOrderRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteServiceOrderRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Creates an order numbered for the period containing `now`.
    pub fn create_service_order_at(
        &self,
        input: ServiceOrderInput,
        now: DateTime<Utc>,
    ) -> RepoResult<ServiceOrder> {
        input.validate()?;

        with_immediate_tx(self.conn, |conn| {
            ensure_references(conn, &input)?;

            let period = order_period(now);
            let sequence = next_order_sequence(conn, &period)?;
            let timestamp = format_timestamp(now);
            let order = ServiceOrder {
                id: Uuid::new_v4(),
                order_number: format_order_number(&period, sequence),
                equipment_id: Some(input.equipment_id),
                maintenance_type_id: Some(input.maintenance_type_id),
                assigned_to: Some(input.assigned_to),
                status: input.status,
                scheduled_date: input.scheduled_date.clone(),
                completion_date: input.completion_date().map(str::to_string),
                completion_notes: input.completion_notes().map(str::to_string),
                created_at: timestamp.clone(),
                updated_at: timestamp,
            };

            conn.execute(
                "INSERT INTO service_orders (
                    id,
                    order_number,
                    equipment_id,
                    maintenance_type_id,
                    assigned_to,
                    status,
                    scheduled_date,
                    completion_date,
                    completion_notes,
                    created_at,
                    updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11);",
                params![
                    order.id.to_string(),
                    order.order_number,
                    input.equipment_id.to_string(),
                    input.maintenance_type_id.to_string(),
                    input.assigned_to.to_string(),
                    order.status.as_str(),
                    order.scheduled_date,
                    order.completion_date,
                    order.completion_notes,
                    order.created_at,
                    order.updated_at,
                ],
            )?;

            info!(
                "event=service_order_create module=repo status=ok order_number={}",
                order.order_number
            );
            Ok(order)
        })
    }

    /// Status change evaluated against an explicit clock.
    pub fn update_service_order_status_at(
        &self,
        id: ServiceOrderId,
        status: ServiceOrderStatus,
        notes: Option<&str>,
        now: DateTime<Utc>,
    ) -> RepoResult<ServiceOrder> {
        let timestamp = format_timestamp(now);
        let changed = match (status, notes) {
            (ServiceOrderStatus::Completed, _) => self.conn.execute(
                "UPDATE service_orders
                 SET status = ?2, completion_date = ?3, completion_notes = ?4, updated_at = ?3
                 WHERE id = ?1;",
                params![id.to_string(), status.as_str(), timestamp, notes],
            )?,
            (_, Some(notes)) => self.conn.execute(
                "UPDATE service_orders
                 SET status = ?2, completion_notes = ?3, updated_at = ?4
                 WHERE id = ?1;",
                params![id.to_string(), status.as_str(), notes, timestamp],
            )?,
            (_, None) => self.conn.execute(
                "UPDATE service_orders SET status = ?2, updated_at = ?3 WHERE id = ?1;",
                params![id.to_string(), status.as_str(), timestamp],
            )?,
        };
        if changed == 0 {
            return Err(RepoError::not_found(Entity::ServiceOrder, id));
        }

        info!(
            "event=service_order_status module=repo status=ok new_status={}",
            status.as_str()
        );
        load_order(self.conn, id)
    }
}

impl ServiceOrderRepository for SqliteServiceOrderRepository<'_> {
    fn list_service_orders(&self, filter: &ServiceOrderFilter) -> RepoResult<Vec<ServiceOrderView>> {
        let mut sql = format!("{SERVICE_ORDER_VIEW_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(status) = filter.status {
            sql.push_str(" AND so.status = ?");
            bind_values.push(Value::Text(status.as_str().to_string()));
        }
        if let Some(start_date) = &filter.start_date {
            sql.push_str(" AND so.scheduled_date >= ?");
            bind_values.push(Value::Text(start_date.clone()));
        }
        if let Some(end_date) = &filter.end_date {
            sql.push_str(" AND so.scheduled_date <= ?");
            bind_values.push(Value::Text(end_date.clone()));
        }
        if let Some(equipment_id) = filter.equipment_id {
            sql.push_str(" AND so.equipment_id = ?");
            bind_values.push(Value::Text(equipment_id.to_string()));
        }
        if let Some(maintenance_type_id) = filter.maintenance_type_id {
            sql.push_str(" AND so.maintenance_type_id = ?");
            bind_values.push(Value::Text(maintenance_type_id.to_string()));
        }
        if let Some(assigned_to) = filter.assigned_to {
            sql.push_str(" AND so.assigned_to = ?");
            bind_values.push(Value::Text(assigned_to.to_string()));
        }
        sql.push_str(" ORDER BY so.scheduled_date DESC, so.order_number DESC");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut orders = Vec::new();
        while let Some(row) = rows.next()? {
            orders.push(parse_service_order_view_row(row)?);
        }
        Ok(orders)
    }

    fn get_service_order(&self, id: ServiceOrderId) -> RepoResult<Option<ServiceOrderDetail>> {
        let Some(view) = get_view(self.conn, id)? else {
            return Ok(None);
        };
        let responses = load_responses_for_order(self.conn, id)?;
        Ok(Some(ServiceOrderDetail { view, responses }))
    }

    fn get_service_order_with_checklist(
        &self,
        id: ServiceOrderId,
    ) -> RepoResult<Option<ServiceOrderForm>> {
        let Some(detail) = self.get_service_order(id)? else {
            return Ok(None);
        };
        let items = match detail.view.order.maintenance_type_id {
            Some(type_id) => load_items_for_type(self.conn, type_id)?,
            None => Vec::new(),
        };

        let answers: HashMap<Uuid, (String, Uuid)> = detail
            .responses
            .iter()
            .map(|view| {
                (
                    view.response.checklist_item_id,
                    (view.response.response_value.clone(), view.response.id),
                )
            })
            .collect();
        let checklist_items = items
            .into_iter()
            .map(|item| {
                let answer = answers.get(&item.id).cloned();
                ChecklistFormItem {
                    response_value: answer.as_ref().map(|(value, _)| value.clone()),
                    response_id: answer.map(|(_, response_id)| response_id),
                    item,
                }
            })
            .collect();

        Ok(Some(ServiceOrderForm {
            detail,
            checklist_items,
        }))
    }

    fn create_service_order(&self, input: ServiceOrderInput) -> RepoResult<ServiceOrder> {
        self.create_service_order_at(input, Utc::now())
    }

    fn update_service_order(
        &self,
        id: ServiceOrderId,
        input: ServiceOrderInput,
    ) -> RepoResult<ServiceOrder> {
        input.validate()?;

        with_immediate_tx(self.conn, |conn| {
            let stored_type: Option<Option<String>> = conn
                .query_row(
                    "SELECT maintenance_type_id FROM service_orders WHERE id = ?1;",
                    [id.to_string()],
                    |row| row.get(0),
                )
                .optional()?;
            let Some(stored_type) = stored_type else {
                return Err(RepoError::not_found(Entity::ServiceOrder, id));
            };
            ensure_references(conn, &input)?;

            let stored_type =
                parse_optional_uuid(stored_type, "service_orders.maintenance_type_id")?;
            if stored_type != Some(input.maintenance_type_id) {
                let responses = count_by_id(
                    conn,
                    "SELECT COUNT(*) FROM order_responses WHERE service_order_id = ?1;",
                    id,
                )?;
                if responses > 0 {
                    return Err(RepoError::Conflict(format!(
                        "service order {id} has {responses} recorded response(s); \
                         its maintenance type cannot change"
                    )));
                }
            }

            conn.execute(
                "UPDATE service_orders
                 SET
                    equipment_id = ?2,
                    maintenance_type_id = ?3,
                    assigned_to = ?4,
                    status = ?5,
                    scheduled_date = ?6,
                    completion_date = ?7,
                    completion_notes = ?8,
                    updated_at = ?9
                 WHERE id = ?1;",
                params![
                    id.to_string(),
                    input.equipment_id.to_string(),
                    input.maintenance_type_id.to_string(),
                    input.assigned_to.to_string(),
                    input.status.as_str(),
                    input.scheduled_date,
                    input.completion_date(),
                    input.completion_notes(),
                    format_timestamp(Utc::now()),
                ],
            )?;
            load_order(conn, id)
        })
    }

    fn update_service_order_status(
        &self,
        id: ServiceOrderId,
        status: ServiceOrderStatus,
        notes: Option<&str>,
    ) -> RepoResult<ServiceOrder> {
        self.update_service_order_status_at(id, status, notes, Utc::now())
    }

    fn delete_service_order(&self, id: ServiceOrderId) -> RepoResult<()> {
        with_immediate_tx(self.conn, |conn| {
            ensure_exists(conn, "service_orders", Entity::ServiceOrder, id)?;
            let responses = conn.execute(
                "DELETE FROM order_responses WHERE service_order_id = ?1;",
                [id.to_string()],
            )?;
            conn.execute("DELETE FROM service_orders WHERE id = ?1;", [id.to_string()])?;
            info!("event=service_order_delete module=repo status=ok responses={responses}");
            Ok(())
        })
    }
}

fn ensure_references(conn: &Connection, input: &ServiceOrderInput) -> RepoResult<()> {
    ensure_exists(conn, "equipment", Entity::Equipment, input.equipment_id)?;
    ensure_exists(
        conn,
        "maintenance_types",
        Entity::MaintenanceType,
        input.maintenance_type_id,
    )?;
    ensure_exists(conn, "employees", Entity::Employee, input.assigned_to)
}

/// Bumps and returns the counter of `period`.
///
/// A period without a counter row starts from the highest order number
/// already stored under its prefix.
fn next_order_sequence(conn: &Connection, period: &str) -> RepoResult<i64> {
    let current: Option<i64> = conn
        .query_row(
            "SELECT last_value FROM order_sequences WHERE period = ?1;",
            [period],
            |row| row.get(0),
        )
        .optional()?;

    let last_value = match current {
        Some(value) => value,
        None => {
            let latest: Option<String> = conn
                .query_row(
                    "SELECT order_number FROM service_orders
                     WHERE order_number LIKE ?1
                     ORDER BY order_number DESC
                     LIMIT 1;",
                    [format!("OS{period}%")],
                    |row| row.get(0),
                )
                .optional()?;
            latest
                .as_deref()
                .and_then(order_sequence_suffix)
                .unwrap_or(0)
        }
    };

    let next = last_value + 1;
    conn.execute(
        "INSERT INTO order_sequences (period, last_value) VALUES (?1, ?2)
         ON CONFLICT(period) DO UPDATE SET last_value = excluded.last_value;",
        params![period, next],
    )?;
    Ok(next)
}

fn get_view(conn: &Connection, id: ServiceOrderId) -> RepoResult<Option<ServiceOrderView>> {
    let mut stmt = conn.prepare(&format!("{SERVICE_ORDER_VIEW_SELECT_SQL} WHERE so.id = ?1;"))?;
    let mut rows = stmt.query([id.to_string()])?;
    match rows.next()? {
        Some(row) => Ok(Some(parse_service_order_view_row(row)?)),
        None => Ok(None),
    }
}

fn load_order(conn: &Connection, id: ServiceOrderId) -> RepoResult<ServiceOrder> {
    get_view(conn, id)?
        .map(|view| view.order)
        .ok_or(RepoError::not_found(Entity::ServiceOrder, id))
}

fn parse_service_order_view_row(row: &Row<'_>) -> RepoResult<ServiceOrderView> {
    let id_text: String = row.get("id")?;
    let status_text: String = row.get("status")?;
    let status = ServiceOrderStatus::parse(&status_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid status `{status_text}` in service_orders.status"))
    })?;

    let order = ServiceOrder {
        id: parse_uuid(&id_text, "service_orders.id")?,
        order_number: row.get("order_number")?,
        equipment_id: parse_optional_uuid(row.get("equipment_id")?, "service_orders.equipment_id")?,
        maintenance_type_id: parse_optional_uuid(
            row.get("maintenance_type_id")?,
            "service_orders.maintenance_type_id",
        )?,
        assigned_to: parse_optional_uuid(row.get("assigned_to")?, "service_orders.assigned_to")?,
        status,
        scheduled_date: row.get("scheduled_date")?,
        completion_date: row.get("completion_date")?,
        completion_notes: row.get("completion_notes")?,
        created_at: timestamp_or_empty(row.get("created_at")?),
        updated_at: timestamp_or_empty(row.get("updated_at")?),
    };

    Ok(ServiceOrderView {
        order,
        equipment_name: row.get("equipment_name")?,
        maintenance_type_name: row.get("maintenance_type_name")?,
        assigned_to_name: row.get("assigned_to_name")?,
    })
}
