//! Employee repository contracts and SQLite implementation.

use super::{
    count_by_id, ensure_exists, parse_uuid, timestamp_or_empty, with_immediate_tx, Entity,
    RepoError, RepoResult,
};
use crate::model::employee::{Employee, EmployeeId, EmployeeInput};
use crate::model::now_timestamp;
use log::info;
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

const EMPLOYEE_SELECT_SQL: &str = "SELECT
    id,
    name,
    workload,
    department,
    created_at,
    updated_at
FROM employees";

/// Repository interface for employee CRUD operations.
pub trait EmployeeRepository {
    fn list_employees(&self) -> RepoResult<Vec<Employee>>;
    fn get_employee(&self, id: EmployeeId) -> RepoResult<Option<Employee>>;
    fn create_employee(&self, input: EmployeeInput) -> RepoResult<Employee>;
    fn update_employee(&self, id: EmployeeId, input: EmployeeInput) -> RepoResult<Employee>;
    /// Fails with `Conflict` while any service order is assigned to the employee.
    fn delete_employee(&self, id: EmployeeId) -> RepoResult<()>;
}

pub struct SqliteEmployeeRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteEmployeeRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl EmployeeRepository for SqliteEmployeeRepository<'_> {
    fn list_employees(&self) -> RepoResult<Vec<Employee>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{EMPLOYEE_SELECT_SQL} ORDER BY name ASC, id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut employees = Vec::new();
        while let Some(row) = rows.next()? {
            employees.push(parse_employee_row(row)?);
        }
        Ok(employees)
    }

    fn get_employee(&self, id: EmployeeId) -> RepoResult<Option<Employee>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{EMPLOYEE_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_employee_row(row)?)),
            None => Ok(None),
        }
    }

    fn create_employee(&self, input: EmployeeInput) -> RepoResult<Employee> {
        input.validate()?;

        let now = now_timestamp();
        let employee = Employee {
            id: Uuid::new_v4(),
            name: input.name,
            workload: input.workload,
            department: input.department,
            created_at: now.clone(),
            updated_at: now,
        };
        self.conn.execute(
            "INSERT INTO employees (id, name, workload, department, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                employee.id.to_string(),
                employee.name,
                employee.workload,
                employee.department,
                employee.created_at,
                employee.updated_at,
            ],
        )?;

        Ok(employee)
    }

    fn update_employee(&self, id: EmployeeId, input: EmployeeInput) -> RepoResult<Employee> {
        input.validate()?;

        let changed = self.conn.execute(
            "UPDATE employees
             SET name = ?2, workload = ?3, department = ?4, updated_at = ?5
             WHERE id = ?1;",
            params![
                id.to_string(),
                input.name,
                input.workload,
                input.department,
                now_timestamp(),
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::not_found(Entity::Employee, id));
        }

        self.get_employee(id)?
            .ok_or(RepoError::not_found(Entity::Employee, id))
    }

    fn delete_employee(&self, id: EmployeeId) -> RepoResult<()> {
        with_immediate_tx(self.conn, |conn| {
            ensure_exists(conn, "employees", Entity::Employee, id)?;

            let assigned = count_by_id(
                conn,
                "SELECT COUNT(*) FROM service_orders WHERE assigned_to = ?1;",
                id,
            )?;
            if assigned > 0 {
                return Err(RepoError::Conflict(format!(
                    "employee {id} is assigned to {assigned} service order(s)"
                )));
            }

            conn.execute("DELETE FROM employees WHERE id = ?1;", [id.to_string()])?;
            info!("event=employee_delete module=repo status=ok");
            Ok(())
        })
    }
}

fn parse_employee_row(row: &Row<'_>) -> RepoResult<Employee> {
    let id_text: String = row.get("id")?;
    Ok(Employee {
        id: parse_uuid(&id_text, "employees.id")?,
        name: row.get("name")?,
        workload: row.get("workload")?,
        department: row.get("department")?,
        created_at: timestamp_or_empty(row.get("created_at")?),
        updated_at: timestamp_or_empty(row.get("updated_at")?),
    })
}
