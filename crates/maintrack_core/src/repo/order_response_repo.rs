//! Order response repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Record checklist answers for service orders with upsert semantics.
//! - Save a batch of answers atomically.
//!
//! # Invariants
//! - At most one response exists per (service order, checklist item).
//! - An answered item belongs to the order's maintenance type and the value
//!   matches the item's response kind.
//! - A failed batch leaves previously stored responses untouched.

use super::checklist_item_repo::get_item;
use super::{
    ensure_exists, parse_optional_uuid, parse_uuid, timestamp_or_empty, with_immediate_tx, Entity,
    RepoError, RepoResult,
};
use crate::model::checklist_item::ResponseType;
use crate::model::order_response::{
    OrderResponse, OrderResponseId, OrderResponseInput, OrderResponseView, ResponseEntry,
};
use crate::model::service_order::ServiceOrderId;
use crate::model::{now_timestamp, ValidationError};
use log::info;
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

const RESPONSE_VIEW_SELECT_SQL: &str = "SELECT
    r.id AS id,
    r.service_order_id AS service_order_id,
    r.checklist_item_id AS checklist_item_id,
    r.response_value AS response_value,
    r.created_at AS created_at,
    r.updated_at AS updated_at,
    ci.description AS description,
    ci.response_type AS response_type,
    ci.unit AS unit
FROM order_responses r
JOIN checklist_items ci ON ci.id = r.checklist_item_id";

/// Repository interface for checklist answers.
pub trait OrderResponseRepository {
    /// Responses of one order in checklist order.
    fn list_by_service_order(
        &self,
        service_order_id: ServiceOrderId,
    ) -> RepoResult<Vec<OrderResponseView>>;
    fn get_order_response(&self, id: OrderResponseId) -> RepoResult<Option<OrderResponseView>>;
    /// Inserts or overwrites the answer for one (order, item) pair.
    fn create_or_update_response(&self, input: OrderResponseInput) -> RepoResult<OrderResponse>;
    /// Upserts every entry in one transaction; any failure rolls back all.
    fn save_responses(
        &self,
        service_order_id: ServiceOrderId,
        entries: &[ResponseEntry],
    ) -> RepoResult<Vec<OrderResponse>>;
    fn delete_order_response(&self, id: OrderResponseId) -> RepoResult<()>;
}

pub struct SqliteOrderResponseRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteOrderResponseRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl OrderResponseRepository for SqliteOrderResponseRepository<'_> {
    fn list_by_service_order(
        &self,
        service_order_id: ServiceOrderId,
    ) -> RepoResult<Vec<OrderResponseView>> {
        load_responses_for_order(self.conn, service_order_id)
    }

    fn get_order_response(&self, id: OrderResponseId) -> RepoResult<Option<OrderResponseView>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{RESPONSE_VIEW_SELECT_SQL} WHERE r.id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_response_view_row(row)?)),
            None => Ok(None),
        }
    }

    fn create_or_update_response(&self, input: OrderResponseInput) -> RepoResult<OrderResponse> {
        with_immediate_tx(self.conn, |conn| upsert_response(conn, &input))
    }

    fn save_responses(
        &self,
        service_order_id: ServiceOrderId,
        entries: &[ResponseEntry],
    ) -> RepoResult<Vec<OrderResponse>> {
        let saved: RepoResult<Vec<OrderResponse>> = with_immediate_tx(self.conn, |conn| {
            ensure_exists(conn, "service_orders", Entity::ServiceOrder, service_order_id)?;
            let mut saved = Vec::with_capacity(entries.len());
            for entry in entries {
                saved.push(upsert_response(conn, &entry.for_order(service_order_id))?);
            }
            Ok(saved)
        });

        match &saved {
            Ok(rows) => info!(
                "event=responses_save module=repo status=ok responses={}",
                rows.len()
            ),
            Err(err) => info!(
                "event=responses_save module=repo status=rolled_back kind={:?}",
                err.kind()
            ),
        }
        saved
    }

    fn delete_order_response(&self, id: OrderResponseId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM order_responses WHERE id = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::not_found(Entity::OrderResponse, id));
        }
        Ok(())
    }
}

/// Responses of one order joined with their items, in checklist order.
pub(crate) fn load_responses_for_order(
    conn: &Connection,
    service_order_id: ServiceOrderId,
) -> RepoResult<Vec<OrderResponseView>> {
    let mut stmt = conn.prepare(&format!(
        "{RESPONSE_VIEW_SELECT_SQL}
         WHERE r.service_order_id = ?1
         ORDER BY ci.item_order ASC, r.id ASC;"
    ))?;
    let mut rows = stmt.query([service_order_id.to_string()])?;
    let mut responses = Vec::new();
    while let Some(row) = rows.next()? {
        responses.push(parse_response_view_row(row)?);
    }
    Ok(responses)
}

/// Check-then-write body of an upsert; the caller owns the transaction.
fn upsert_response(conn: &Connection, input: &OrderResponseInput) -> RepoResult<OrderResponse> {
    let order_type: Option<Option<String>> = conn
        .query_row(
            "SELECT maintenance_type_id FROM service_orders WHERE id = ?1;",
            [input.service_order_id.to_string()],
            |row| row.get(0),
        )
        .optional()?;
    let Some(order_type) = order_type else {
        return Err(RepoError::not_found(
            Entity::ServiceOrder,
            input.service_order_id,
        ));
    };
    let order_type = parse_optional_uuid(order_type, "service_orders.maintenance_type_id")?;

    let item = get_item(conn, input.checklist_item_id)?.ok_or(RepoError::not_found(
        Entity::ChecklistItem,
        input.checklist_item_id,
    ))?;
    if order_type != Some(item.maintenance_type_id) {
        return Err(ValidationError::invalid(
            "checklist_item_id",
            format!(
                "checklist item {} does not belong to the order's maintenance type",
                item.id
            ),
        )
        .into());
    }
    item.kind.validate_value(&input.response_value, item.required)?;

    let now = now_timestamp();
    let updated = conn.execute(
        "UPDATE order_responses
         SET response_value = ?3, updated_at = ?4
         WHERE service_order_id = ?1 AND checklist_item_id = ?2;",
        params![
            input.service_order_id.to_string(),
            input.checklist_item_id.to_string(),
            input.response_value,
            now,
        ],
    )?;
    if updated == 0 {
        conn.execute(
            "INSERT INTO order_responses (
                id,
                service_order_id,
                checklist_item_id,
                response_value,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                Uuid::new_v4().to_string(),
                input.service_order_id.to_string(),
                input.checklist_item_id.to_string(),
                input.response_value,
                now,
                now,
            ],
        )?;
    }

    let mut stmt = conn.prepare(
        "SELECT id, service_order_id, checklist_item_id, response_value, created_at, updated_at
         FROM order_responses
         WHERE service_order_id = ?1 AND checklist_item_id = ?2;",
    )?;
    let mut rows = stmt.query(params![
        input.service_order_id.to_string(),
        input.checklist_item_id.to_string(),
    ])?;
    match rows.next()? {
        Some(row) => parse_response_row(row),
        None => Err(RepoError::InvalidData(format!(
            "response for order {} vanished during upsert",
            input.service_order_id
        ))),
    }
}

fn parse_response_row(row: &Row<'_>) -> RepoResult<OrderResponse> {
    let id_text: String = row.get("id")?;
    let order_text: Option<String> = row.get("service_order_id")?;
    let item_text: Option<String> = row.get("checklist_item_id")?;
    let id = parse_uuid(&id_text, "order_responses.id")?;
    let missing = |column: &str| {
        RepoError::InvalidData(format!("order response {id} has no {column}"))
    };

    Ok(OrderResponse {
        id,
        service_order_id: parse_optional_uuid(order_text, "order_responses.service_order_id")?
            .ok_or_else(|| missing("service_order_id"))?,
        checklist_item_id: parse_optional_uuid(item_text, "order_responses.checklist_item_id")?
            .ok_or_else(|| missing("checklist_item_id"))?,
        response_value: row.get("response_value")?,
        created_at: timestamp_or_empty(row.get("created_at")?),
        updated_at: timestamp_or_empty(row.get("updated_at")?),
    })
}

fn parse_response_view_row(row: &Row<'_>) -> RepoResult<OrderResponseView> {
    let response = parse_response_row(row)?;
    let response_type_text: String = row.get("response_type")?;
    let response_type = ResponseType::parse(&response_type_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid response_type `{response_type_text}` in checklist_items.response_type"
        ))
    })?;

    Ok(OrderResponseView {
        response,
        description: row.get("description")?,
        response_type,
        unit: row.get("unit")?,
    })
}
