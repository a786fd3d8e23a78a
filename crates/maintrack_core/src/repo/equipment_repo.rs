//! Equipment repository contracts and SQLite implementation.
//!
//! # Invariants
//! - Lists are ordered by `name`.
//! - Equipment referenced by any service order is never deleted.

use super::{
    count_by_id, ensure_exists, parse_uuid, timestamp_or_empty, with_immediate_tx, Entity,
    RepoError, RepoResult,
};
use crate::model::equipment::{Equipment, EquipmentId, EquipmentInput};
use crate::model::now_timestamp;
use log::info;
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

const EQUIPMENT_SELECT_SQL: &str = "SELECT
    id,
    name,
    model,
    serial_number,
    location,
    last_maintenance,
    next_maintenance,
    notes,
    created_at,
    updated_at
FROM equipment";

/// Repository interface for equipment CRUD operations.
pub trait EquipmentRepository {
    fn list_equipment(&self) -> RepoResult<Vec<Equipment>>;
    fn get_equipment(&self, id: EquipmentId) -> RepoResult<Option<Equipment>>;
    fn create_equipment(&self, input: EquipmentInput) -> RepoResult<Equipment>;
    fn update_equipment(&self, id: EquipmentId, input: EquipmentInput) -> RepoResult<Equipment>;
    fn delete_equipment(&self, id: EquipmentId) -> RepoResult<()>;
}

/// SQLite-backed equipment repository.
pub struct SqliteEquipmentRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteEquipmentRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl EquipmentRepository for SqliteEquipmentRepository<'_> {
    fn list_equipment(&self) -> RepoResult<Vec<Equipment>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{EQUIPMENT_SELECT_SQL} ORDER BY name ASC, id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse_equipment_row(row)?);
        }
        Ok(items)
    }

    fn get_equipment(&self, id: EquipmentId) -> RepoResult<Option<Equipment>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{EQUIPMENT_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_equipment_row(row)?));
        }
        Ok(None)
    }

    fn create_equipment(&self, input: EquipmentInput) -> RepoResult<Equipment> {
        input.validate()?;

        let now = now_timestamp();
        let record = input.into_record(Uuid::new_v4(), now.clone(), now);
        self.conn.execute(
            "INSERT INTO equipment (
                id,
                name,
                model,
                serial_number,
                location,
                last_maintenance,
                next_maintenance,
                notes,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10);",
            params![
                record.id.to_string(),
                record.name,
                record.model,
                record.serial_number,
                record.location,
                record.last_maintenance,
                record.next_maintenance,
                record.notes,
                record.created_at,
                record.updated_at,
            ],
        )?;

        Ok(record)
    }

    fn update_equipment(&self, id: EquipmentId, input: EquipmentInput) -> RepoResult<Equipment> {
        input.validate()?;

        let now = now_timestamp();
        let record = input.into_record(id, String::new(), now);
        let changed = self.conn.execute(
            "UPDATE equipment
             SET
                name = ?2,
                model = ?3,
                serial_number = ?4,
                location = ?5,
                last_maintenance = ?6,
                next_maintenance = ?7,
                notes = ?8,
                updated_at = ?9
             WHERE id = ?1;",
            params![
                id.to_string(),
                record.name,
                record.model,
                record.serial_number,
                record.location,
                record.last_maintenance,
                record.next_maintenance,
                record.notes,
                record.updated_at,
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::not_found(Entity::Equipment, id));
        }

        self.get_equipment(id)?
            .ok_or(RepoError::not_found(Entity::Equipment, id))
    }

    fn delete_equipment(&self, id: EquipmentId) -> RepoResult<()> {
        with_immediate_tx(self.conn, |conn| {
            ensure_exists(conn, "equipment", Entity::Equipment, id)?;

            let orders = count_by_id(
                conn,
                "SELECT COUNT(*) FROM service_orders WHERE equipment_id = ?1;",
                id,
            )?;
            if orders > 0 {
                return Err(RepoError::Conflict(format!(
                    "equipment {id} is referenced by {orders} service order(s)"
                )));
            }

            conn.execute("DELETE FROM equipment WHERE id = ?1;", [id.to_string()])?;
            info!("event=equipment_delete module=repo status=ok");
            Ok(())
        })
    }
}

fn parse_equipment_row(row: &Row<'_>) -> RepoResult<Equipment> {
    let id_text: String = row.get("id")?;
    Ok(Equipment {
        id: parse_uuid(&id_text, "equipment.id")?,
        name: row.get("name")?,
        model: row.get("model")?,
        serial_number: row.get("serial_number")?,
        location: row.get("location")?,
        last_maintenance: row.get("last_maintenance")?,
        next_maintenance: row.get("next_maintenance")?,
        notes: row.get("notes")?,
        created_at: timestamp_or_empty(row.get("created_at")?),
        updated_at: timestamp_or_empty(row.get("updated_at")?),
    })
}
