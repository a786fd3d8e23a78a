//! Checklist item repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - CRUD for single checklist items of a maintenance type.
//! - Shared row decoding and insert helpers used by the maintenance type
//!   and service order repositories.
//!
//! # Invariants
//! - `item_order` is unique within one maintenance type.
//! - Items referenced by an order response are never deleted, moved to
//!   another type, or given another response kind.
//! - Unreadable stored options decode to an empty list with a warning.

use super::{
    bool_to_int, count_by_id, ensure_exists, parse_uuid, timestamp_or_empty, with_immediate_tx,
    Entity, RepoError, RepoResult,
};
use crate::model::checklist_item::{
    parse_options_column, ChecklistItem, ChecklistItemId, ChecklistItemInput, ResponseKind,
    ResponseType,
};
use crate::model::maintenance_type::MaintenanceTypeId;
use crate::model::now_timestamp;
use log::{info, warn};
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

pub(crate) const CHECKLIST_ITEM_SELECT_SQL: &str = "SELECT
    id,
    maintenance_type_id,
    description,
    item_order,
    response_type,
    required,
    options,
    unit,
    created_at
FROM checklist_items";

/// Repository interface for checklist item CRUD operations.
pub trait ChecklistItemRepository {
    /// All items ordered by maintenance type, then position.
    fn list_checklist_items(&self) -> RepoResult<Vec<ChecklistItem>>;
    fn list_by_maintenance_type(
        &self,
        maintenance_type_id: MaintenanceTypeId,
    ) -> RepoResult<Vec<ChecklistItem>>;
    fn get_checklist_item(&self, id: ChecklistItemId) -> RepoResult<Option<ChecklistItem>>;
    fn create_checklist_item(&self, input: ChecklistItemInput) -> RepoResult<ChecklistItem>;
    fn update_checklist_item(
        &self,
        id: ChecklistItemId,
        input: ChecklistItemInput,
    ) -> RepoResult<ChecklistItem>;
    fn delete_checklist_item(&self, id: ChecklistItemId) -> RepoResult<()>;
}

pub struct SqliteChecklistItemRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteChecklistItemRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl ChecklistItemRepository for SqliteChecklistItemRepository<'_> {
    fn list_checklist_items(&self) -> RepoResult<Vec<ChecklistItem>> {
        let mut stmt = self.conn.prepare(&format!(
            "{CHECKLIST_ITEM_SELECT_SQL} ORDER BY maintenance_type_id ASC, item_order ASC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse_checklist_item_row(row)?);
        }
        Ok(items)
    }

    fn list_by_maintenance_type(
        &self,
        maintenance_type_id: MaintenanceTypeId,
    ) -> RepoResult<Vec<ChecklistItem>> {
        load_items_for_type(self.conn, maintenance_type_id)
    }

    fn get_checklist_item(&self, id: ChecklistItemId) -> RepoResult<Option<ChecklistItem>> {
        get_item(self.conn, id)
    }

    fn create_checklist_item(&self, input: ChecklistItemInput) -> RepoResult<ChecklistItem> {
        input.validate()?;

        with_immediate_tx(self.conn, |conn| {
            ensure_exists(
                conn,
                "maintenance_types",
                Entity::MaintenanceType,
                input.maintenance_type_id,
            )?;
            ensure_order_free(conn, input.maintenance_type_id, input.item_order, None)?;

            let item = input.draft.into_record(
                Uuid::new_v4(),
                input.maintenance_type_id,
                input.item_order,
                now_timestamp(),
            );
            insert_checklist_item(conn, &item)?;
            Ok(item)
        })
    }

    fn update_checklist_item(
        &self,
        id: ChecklistItemId,
        input: ChecklistItemInput,
    ) -> RepoResult<ChecklistItem> {
        input.validate()?;

        with_immediate_tx(self.conn, |conn| {
            let current =
                get_item(conn, id)?.ok_or(RepoError::not_found(Entity::ChecklistItem, id))?;
            ensure_exists(
                conn,
                "maintenance_types",
                Entity::MaintenanceType,
                input.maintenance_type_id,
            )?;
            ensure_order_free(conn, input.maintenance_type_id, input.item_order, Some(id))?;

            if current.maintenance_type_id != input.maintenance_type_id
                || current.kind != input.draft.kind
            {
                let responses = count_by_id(
                    conn,
                    "SELECT COUNT(*) FROM order_responses WHERE checklist_item_id = ?1;",
                    id,
                )?;
                if responses > 0 {
                    return Err(RepoError::Conflict(format!(
                        "checklist item {id} has {responses} recorded response(s); \
                         its maintenance type and response kind are fixed"
                    )));
                }
            }

            let item = input.draft.into_record(
                id,
                input.maintenance_type_id,
                input.item_order,
                current.created_at,
            );
            let options = encode_options(&item.kind)?;
            conn.execute(
                "UPDATE checklist_items
                 SET
                    maintenance_type_id = ?2,
                    description = ?3,
                    item_order = ?4,
                    response_type = ?5,
                    required = ?6,
                    options = ?7,
                    unit = ?8
                 WHERE id = ?1;",
                params![
                    id.to_string(),
                    item.maintenance_type_id.to_string(),
                    item.description,
                    item.item_order,
                    item.kind.response_type().as_str(),
                    bool_to_int(item.required),
                    options,
                    item.kind.unit(),
                ],
            )?;
            Ok(item)
        })
    }

    fn delete_checklist_item(&self, id: ChecklistItemId) -> RepoResult<()> {
        with_immediate_tx(self.conn, |conn| {
            ensure_exists(conn, "checklist_items", Entity::ChecklistItem, id)?;

            let responses = count_by_id(
                conn,
                "SELECT COUNT(*) FROM order_responses WHERE checklist_item_id = ?1;",
                id,
            )?;
            if responses > 0 {
                return Err(RepoError::Conflict(format!(
                    "checklist item {id} has {responses} recorded response(s)"
                )));
            }

            conn.execute("DELETE FROM checklist_items WHERE id = ?1;", [id.to_string()])?;
            info!("event=checklist_item_delete module=repo status=ok");
            Ok(())
        })
    }
}

pub(crate) fn get_item(conn: &Connection, id: ChecklistItemId) -> RepoResult<Option<ChecklistItem>> {
    let mut stmt = conn.prepare(&format!("{CHECKLIST_ITEM_SELECT_SQL} WHERE id = ?1;"))?;
    let mut rows = stmt.query([id.to_string()])?;
    match rows.next()? {
        Some(row) => Ok(Some(parse_checklist_item_row(row)?)),
        None => Ok(None),
    }
}

/// Items of one maintenance type in checklist order.
pub(crate) fn load_items_for_type(
    conn: &Connection,
    maintenance_type_id: MaintenanceTypeId,
) -> RepoResult<Vec<ChecklistItem>> {
    let mut stmt = conn.prepare(&format!(
        "{CHECKLIST_ITEM_SELECT_SQL}
         WHERE maintenance_type_id = ?1
         ORDER BY item_order ASC, id ASC;"
    ))?;
    let mut rows = stmt.query([maintenance_type_id.to_string()])?;
    let mut items = Vec::new();
    while let Some(row) = rows.next()? {
        items.push(parse_checklist_item_row(row)?);
    }
    Ok(items)
}

pub(crate) fn insert_checklist_item(conn: &Connection, item: &ChecklistItem) -> RepoResult<()> {
    let options = encode_options(&item.kind)?;
    conn.execute(
        "INSERT INTO checklist_items (
            id,
            maintenance_type_id,
            description,
            item_order,
            response_type,
            required,
            options,
            unit,
            created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9);",
        params![
            item.id.to_string(),
            item.maintenance_type_id.to_string(),
            item.description,
            item.item_order,
            item.kind.response_type().as_str(),
            bool_to_int(item.required),
            options,
            item.kind.unit(),
            item.created_at,
        ],
    )?;
    Ok(())
}

pub(crate) fn parse_checklist_item_row(row: &Row<'_>) -> RepoResult<ChecklistItem> {
    let id_text: String = row.get("id")?;
    let id = parse_uuid(&id_text, "checklist_items.id")?;
    let type_text: Option<String> = row.get("maintenance_type_id")?;
    let maintenance_type_id = match type_text {
        Some(text) => parse_uuid(&text, "checklist_items.maintenance_type_id")?,
        None => {
            return Err(RepoError::InvalidData(format!(
                "checklist item {id} has no maintenance type"
            )))
        }
    };

    let response_type_text: String = row.get("response_type")?;
    let response_type = ResponseType::parse(&response_type_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid response_type `{response_type_text}` in checklist_items.response_type"
        ))
    })?;

    let raw_options: Option<String> = row.get("options")?;
    let options = match parse_options_column(raw_options.as_deref()) {
        Ok(options) => options,
        Err(err) => {
            warn!(
                "event=checklist_options_decode module=repo status=error item_id={id} error={err}"
            );
            Vec::new()
        }
    };

    Ok(ChecklistItem {
        id,
        maintenance_type_id,
        description: row.get("description")?,
        item_order: row.get("item_order")?,
        kind: ResponseKind::from_columns(response_type, options, row.get("unit")?),
        required: row.get::<_, Option<bool>>("required")?.unwrap_or(true),
        created_at: timestamp_or_empty(row.get("created_at")?),
    })
}

fn encode_options(kind: &ResponseKind) -> RepoResult<Option<String>> {
    kind.options_column()
        .map_err(|err| RepoError::InvalidData(format!("cannot encode options: {err}")))
}

/// Rejects a position already taken by another item of the same type.
fn ensure_order_free(
    conn: &Connection,
    maintenance_type_id: MaintenanceTypeId,
    item_order: i64,
    except: Option<ChecklistItemId>,
) -> RepoResult<()> {
    let taken: Option<String> = conn
        .query_row(
            "SELECT id FROM checklist_items
             WHERE maintenance_type_id = ?1 AND item_order = ?2 AND (?3 IS NULL OR id <> ?3)
             LIMIT 1;",
            params![
                maintenance_type_id.to_string(),
                item_order,
                except.map(|id| id.to_string()),
            ],
            |row| row.get(0),
        )
        .optional()?;
    match taken {
        Some(other) => Err(RepoError::Conflict(format!(
            "item_order {item_order} is already used by checklist item {other}"
        ))),
        None => Ok(()),
    }
}
