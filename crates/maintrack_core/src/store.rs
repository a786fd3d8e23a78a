//! Long-lived owner of the maintenance database connection.
//!
//! # Responsibility
//! - Open and bootstrap exactly one connection at startup.
//! - Hand out repositories that borrow that connection.
//! - Close the connection and surface close failures.
//!
//! # Invariants
//! - There is no process-global handle; callers pass the store around.
//! - Repositories cannot outlive the store they borrow from.

use crate::db::{open_db, open_db_in_memory, DbError, DbResult};
use crate::repo::checklist_item_repo::SqliteChecklistItemRepository;
use crate::repo::employee_repo::SqliteEmployeeRepository;
use crate::repo::equipment_repo::SqliteEquipmentRepository;
use crate::repo::maintenance_type_repo::SqliteMaintenanceTypeRepository;
use crate::repo::order_response_repo::SqliteOrderResponseRepository;
use crate::repo::service_order_repo::SqliteServiceOrderRepository;
use log::{error, info};
use rusqlite::Connection;
use std::path::Path;

pub struct Store {
    conn: Connection,
}

impl Store {
    /// Opens (creating when missing) the database file at `path`.
    pub fn open(path: impl AsRef<Path>) -> DbResult<Self> {
        Ok(Self {
            conn: open_db(path)?,
        })
    }

    pub fn open_in_memory() -> DbResult<Self> {
        Ok(Self {
            conn: open_db_in_memory()?,
        })
    }

    /// Raw connection for callers that need their own transaction.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn equipment(&self) -> SqliteEquipmentRepository<'_> {
        SqliteEquipmentRepository::new(&self.conn)
    }

    pub fn employees(&self) -> SqliteEmployeeRepository<'_> {
        SqliteEmployeeRepository::new(&self.conn)
    }

    pub fn maintenance_types(&self) -> SqliteMaintenanceTypeRepository<'_> {
        SqliteMaintenanceTypeRepository::new(&self.conn)
    }

    pub fn checklist_items(&self) -> SqliteChecklistItemRepository<'_> {
        SqliteChecklistItemRepository::new(&self.conn)
    }

    pub fn service_orders(&self) -> SqliteServiceOrderRepository<'_> {
        SqliteServiceOrderRepository::new(&self.conn)
    }

    pub fn order_responses(&self) -> SqliteOrderResponseRepository<'_> {
        SqliteOrderResponseRepository::new(&self.conn)
    }

    /// Closes the connection, flushing pending work.
    pub fn close(self) -> DbResult<()> {
        match self.conn.close() {
            Ok(()) => {
                info!("event=db_close module=store status=ok");
                Ok(())
            }
            Err((_conn, err)) => {
                error!("event=db_close module=store status=error error={err}");
                Err(DbError::Sqlite(err))
            }
        }
    }
}
