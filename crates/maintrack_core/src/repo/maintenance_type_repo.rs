//! Maintenance type repository contracts and SQLite implementation.
//!
//! # Invariants
//! - Embedded checklists get `item_order` from list position (1-based).
//! - Checklist replacement is all-or-nothing and refused while responses
//!   reference the current items.
//! - Deleting a type deletes its checklist in the same transaction.

use super::checklist_item_repo::{insert_checklist_item, load_items_for_type};
use super::{
    count_by_id, ensure_exists, parse_uuid, timestamp_or_empty, with_immediate_tx, Entity,
    RepoError, RepoResult,
};
use crate::model::checklist_item::{ChecklistItem, ChecklistItemDraft};
use crate::model::maintenance_type::{
    MaintenanceType, MaintenanceTypeId, MaintenanceTypeInput, MaintenanceTypeWithChecklist,
};
use crate::model::now_timestamp;
use log::info;
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

const MAINTENANCE_TYPE_SELECT_SQL: &str = "SELECT
    id,
    name,
    description,
    frequency,
    created_at
FROM maintenance_types";

const RESPONSES_FOR_TYPE_SQL: &str = "SELECT COUNT(*)
FROM order_responses r
JOIN checklist_items ci ON ci.id = r.checklist_item_id
WHERE ci.maintenance_type_id = ?1;";

/// Repository interface for maintenance type templates.
pub trait MaintenanceTypeRepository {
    fn list_maintenance_types(&self) -> RepoResult<Vec<MaintenanceType>>;
    fn get_maintenance_type(&self, id: MaintenanceTypeId) -> RepoResult<Option<MaintenanceType>>;
    fn get_maintenance_type_with_checklist(
        &self,
        id: MaintenanceTypeId,
    ) -> RepoResult<Option<MaintenanceTypeWithChecklist>>;
    fn create_maintenance_type(
        &self,
        input: MaintenanceTypeInput,
    ) -> RepoResult<MaintenanceTypeWithChecklist>;
    /// Replaces the type fields and, when supplied, the whole checklist.
    fn update_maintenance_type(
        &self,
        id: MaintenanceTypeId,
        input: MaintenanceTypeInput,
    ) -> RepoResult<MaintenanceTypeWithChecklist>;
    fn delete_maintenance_type(&self, id: MaintenanceTypeId) -> RepoResult<()>;
}

pub struct SqliteMaintenanceTypeRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteMaintenanceTypeRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl MaintenanceTypeRepository for SqliteMaintenanceTypeRepository<'_> {
    fn list_maintenance_types(&self) -> RepoResult<Vec<MaintenanceType>> {
        let mut stmt = self.conn.prepare(&format!(
            "{MAINTENANCE_TYPE_SELECT_SQL} ORDER BY name ASC, id ASC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut types = Vec::new();
        while let Some(row) = rows.next()? {
            types.push(parse_maintenance_type_row(row)?);
        }
        Ok(types)
    }

    fn get_maintenance_type(&self, id: MaintenanceTypeId) -> RepoResult<Option<MaintenanceType>> {
        get_type(self.conn, id)
    }

    fn get_maintenance_type_with_checklist(
        &self,
        id: MaintenanceTypeId,
    ) -> RepoResult<Option<MaintenanceTypeWithChecklist>> {
        let Some(maintenance_type) = get_type(self.conn, id)? else {
            return Ok(None);
        };
        let checklist_items = load_items_for_type(self.conn, id)?;
        Ok(Some(MaintenanceTypeWithChecklist {
            maintenance_type,
            checklist_items,
        }))
    }

    fn create_maintenance_type(
        &self,
        input: MaintenanceTypeInput,
    ) -> RepoResult<MaintenanceTypeWithChecklist> {
        input.validate()?;

        let now = now_timestamp();
        let maintenance_type = MaintenanceType {
            id: Uuid::new_v4(),
            name: input.name.clone(),
            description: input.description().map(str::to_string),
            frequency: input.frequency.clone(),
            created_at: now.clone(),
        };

        with_immediate_tx(self.conn, |conn| {
            conn.execute(
                "INSERT INTO maintenance_types (id, name, description, frequency, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5);",
                params![
                    maintenance_type.id.to_string(),
                    maintenance_type.name,
                    maintenance_type.description,
                    maintenance_type.frequency,
                    maintenance_type.created_at,
                ],
            )?;

            let checklist_items = insert_checklist(
                conn,
                maintenance_type.id,
                input.checklist_items.unwrap_or_default(),
                &now,
            )?;
            info!(
                "event=maintenance_type_create module=repo status=ok checklist_items={}",
                checklist_items.len()
            );
            Ok(MaintenanceTypeWithChecklist {
                maintenance_type,
                checklist_items,
            })
        })
    }

    fn update_maintenance_type(
        &self,
        id: MaintenanceTypeId,
        input: MaintenanceTypeInput,
    ) -> RepoResult<MaintenanceTypeWithChecklist> {
        input.validate()?;

        with_immediate_tx(self.conn, |conn| {
            let changed = conn.execute(
                "UPDATE maintenance_types
                 SET name = ?2, description = ?3, frequency = ?4
                 WHERE id = ?1;",
                params![id.to_string(), input.name, input.description(), input.frequency],
            )?;
            if changed == 0 {
                return Err(RepoError::not_found(Entity::MaintenanceType, id));
            }

            if let Some(drafts) = input.checklist_items {
                let responses = count_by_id(conn, RESPONSES_FOR_TYPE_SQL, id)?;
                if responses > 0 {
                    return Err(RepoError::Conflict(format!(
                        "checklist of maintenance type {id} has {responses} recorded response(s)"
                    )));
                }

                conn.execute(
                    "DELETE FROM checklist_items WHERE maintenance_type_id = ?1;",
                    [id.to_string()],
                )?;
                let inserted = insert_checklist(conn, id, drafts, &now_timestamp())?;
                info!(
                    "event=checklist_replace module=repo status=ok checklist_items={}",
                    inserted.len()
                );
            }

            let maintenance_type =
                get_type(conn, id)?.ok_or(RepoError::not_found(Entity::MaintenanceType, id))?;
            let checklist_items = load_items_for_type(conn, id)?;
            Ok(MaintenanceTypeWithChecklist {
                maintenance_type,
                checklist_items,
            })
        })
    }

    fn delete_maintenance_type(&self, id: MaintenanceTypeId) -> RepoResult<()> {
        with_immediate_tx(self.conn, |conn| {
            ensure_exists(conn, "maintenance_types", Entity::MaintenanceType, id)?;

            let orders = count_by_id(
                conn,
                "SELECT COUNT(*) FROM service_orders WHERE maintenance_type_id = ?1;",
                id,
            )?;
            if orders > 0 {
                return Err(RepoError::Conflict(format!(
                    "maintenance type {id} is referenced by {orders} service order(s)"
                )));
            }

            let responses = count_by_id(conn, RESPONSES_FOR_TYPE_SQL, id)?;
            if responses > 0 {
                return Err(RepoError::Conflict(format!(
                    "checklist of maintenance type {id} has {responses} recorded response(s)"
                )));
            }

            let items = conn.execute(
                "DELETE FROM checklist_items WHERE maintenance_type_id = ?1;",
                [id.to_string()],
            )?;
            conn.execute("DELETE FROM maintenance_types WHERE id = ?1;", [id.to_string()])?;
            info!("event=maintenance_type_delete module=repo status=ok checklist_items={items}");
            Ok(())
        })
    }
}

fn get_type(conn: &Connection, id: MaintenanceTypeId) -> RepoResult<Option<MaintenanceType>> {
    let mut stmt = conn.prepare(&format!("{MAINTENANCE_TYPE_SELECT_SQL} WHERE id = ?1;"))?;
    let mut rows = stmt.query([id.to_string()])?;
    match rows.next()? {
        Some(row) => Ok(Some(parse_maintenance_type_row(row)?)),
        None => Ok(None),
    }
}

fn insert_checklist(
    conn: &Connection,
    maintenance_type_id: MaintenanceTypeId,
    drafts: Vec<ChecklistItemDraft>,
    created_at: &str,
) -> RepoResult<Vec<ChecklistItem>> {
    let mut items = Vec::with_capacity(drafts.len());
    for (index, draft) in drafts.into_iter().enumerate() {
        let item = draft.into_record(
            Uuid::new_v4(),
            maintenance_type_id,
            (index + 1) as i64,
            created_at.to_string(),
        );
        insert_checklist_item(conn, &item)?;
        items.push(item);
    }
    Ok(items)
}

fn parse_maintenance_type_row(row: &Row<'_>) -> RepoResult<MaintenanceType> {
    let id_text: String = row.get("id")?;
    Ok(MaintenanceType {
        id: parse_uuid(&id_text, "maintenance_types.id")?,
        name: row.get("name")?,
        description: row.get("description")?,
        frequency: row.get("frequency")?,
        created_at: timestamp_or_empty(row.get("created_at")?),
    })
}
