//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define one data access contract per entity plus a SQLite
//!   implementation borrowing the shared connection.
//! - Enforce referential business rules (delete blocking, cascades,
//!   upserts, order numbering) inside the persistence boundary.
//!
//! # Invariants
//! - Write paths validate inputs before SQL mutations.
//! - Repository APIs return semantic errors (`NotFound`, `Conflict`) in
//!   addition to store errors.
//! - Check-then-act sequences run inside one IMMEDIATE transaction.

use crate::db::DbError;
use crate::model::ValidationError;
use rusqlite::{Connection, ErrorCode, OptionalExtension};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub mod checklist_item_repo;
pub mod employee_repo;
pub mod equipment_repo;
pub mod maintenance_type_repo;
pub mod order_response_repo;
pub mod service_order_repo;

pub(crate) use crate::db::with_immediate_tx;

pub type RepoResult<T> = Result<T, RepoError>;

/// Entity named by `NotFound` errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Equipment,
    Employee,
    MaintenanceType,
    ChecklistItem,
    ServiceOrder,
    OrderResponse,
}

impl Display for Entity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Equipment => "equipment",
            Self::Employee => "employee",
            Self::MaintenanceType => "maintenance type",
            Self::ChecklistItem => "checklist item",
            Self::ServiceOrder => "service order",
            Self::OrderResponse => "order response",
        })
    }
}

/// Coarse error class for callers that translate errors to transport codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Conflict,
    Validation,
    Store,
}

/// Repository error for persistence and business-rule failures.
#[derive(Debug)]
pub enum RepoError {
    Validation(ValidationError),
    Db(DbError),
    NotFound { entity: Entity, id: Uuid },
    /// Blocked by dependent rows or a uniqueness rule.
    Conflict(String),
    /// Persisted row cannot be decoded into a record.
    InvalidData(String),
}

impl RepoError {
    pub(crate) fn not_found(entity: Entity, id: Uuid) -> Self {
        Self::NotFound { entity, id }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::Db(_) | Self::InvalidData(_) => ErrorKind::Store,
        }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::Conflict(message) => write!(f, "conflict: {message}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound { .. } => None,
            Self::Conflict(_) => None,
            Self::InvalidData(_) => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        if is_unique_violation(&value) {
            return Self::Conflict(value.to_string());
        }
        Self::Db(DbError::Sqlite(value))
    }
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(failure, _) => {
            failure.code == ErrorCode::ConstraintViolation
                && matches!(
                    failure.extended_code,
                    rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                        | rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
                )
        }
        _ => false,
    }
}

pub(crate) fn parse_uuid(value: &str, column: &str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{value}` in {column}")))
}

pub(crate) fn parse_optional_uuid(value: Option<String>, column: &str) -> RepoResult<Option<Uuid>> {
    value.map(|text| parse_uuid(&text, column)).transpose()
}

/// Reads a nullable timestamp column; rows from older writers may lack it.
pub(crate) fn timestamp_or_empty(value: Option<String>) -> String {
    value.unwrap_or_default()
}

/// Runs a `SELECT COUNT(*) ... WHERE <column> = ?1` style query.
pub(crate) fn count_by_id(conn: &Connection, sql: &str, id: Uuid) -> RepoResult<i64> {
    let count = conn.query_row(sql, [id.to_string()], |row| row.get(0))?;
    Ok(count)
}

/// Returns whether `table` has a row with the given id.
///
/// `table` is always a crate-internal constant, never caller input.
pub(crate) fn row_exists(conn: &Connection, table: &'static str, id: Uuid) -> RepoResult<bool> {
    let found = conn
        .query_row(
            &format!("SELECT 1 FROM {table} WHERE id = ?1;"),
            [id.to_string()],
            |row| row.get::<_, i64>(0),
        )
        .optional()?;
    Ok(found.is_some())
}

pub(crate) fn ensure_exists(
    conn: &Connection,
    table: &'static str,
    entity: Entity,
    id: Uuid,
) -> RepoResult<()> {
    if row_exists(conn, table, id)? {
        Ok(())
    } else {
        Err(RepoError::not_found(entity, id))
    }
}

pub(crate) fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}
