//! Operator CLI for the maintenance store.
//!
//! # Responsibility
//! - Bootstrap the database file (schema + built-in templates).
//! - Print records as pretty JSON for inspection and scripting.
//!
//! Exit codes: 0 success, 2 not found, 3 conflict or validation, 1 other.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{error, info};
use maintrack_core::config::{ENV_DB_PATH, ENV_LOG_DIR, ENV_LOG_LEVEL};
use maintrack_core::{
    core_version, init_logging_from_config, AppConfig, EmployeeRepository, Entity,
    EquipmentRepository, ErrorKind, MaintenanceTypeRepository, RepoError,
    ServiceOrderFilter, ServiceOrderRepository, ServiceOrderStatus, Store,
};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "maintrack", version, about = "Maintenance records: equipment, staff, templates and service orders")]
struct Cli {
    /// Database file; created with schema and templates when missing
    #[arg(long, global = true, env = ENV_DB_PATH)]
    db: Option<PathBuf>,

    /// trace|debug|info|warn|error
    #[arg(long, global = true, env = ENV_LOG_LEVEL)]
    log_level: Option<String>,

    /// Absolute directory for rotating log files; stderr when omitted
    #[arg(long, global = true, env = ENV_LOG_DIR)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create or migrate the database and seed built-in templates
    Init,
    /// Equipment records
    #[command(subcommand)]
    Equipment(ListCommand),
    /// Employee records
    #[command(subcommand)]
    Employees(ListCommand),
    /// Maintenance type templates
    #[command(subcommand)]
    Types(TypesCommand),
    /// Service orders
    #[command(subcommand)]
    Orders(OrdersCommand),
}

#[derive(Subcommand, Debug)]
enum ListCommand {
    List,
}

#[derive(Subcommand, Debug)]
enum TypesCommand {
    List,
    /// Show one template with its checklist
    Show { id: Uuid },
}

#[derive(Subcommand, Debug)]
enum OrdersCommand {
    List {
        #[arg(long)]
        status: Option<ServiceOrderStatus>,
        /// Inclusive lower bound on the scheduled date
        #[arg(long)]
        from: Option<String>,
        /// Inclusive upper bound on the scheduled date
        #[arg(long)]
        to: Option<String>,
        #[arg(long)]
        equipment: Option<Uuid>,
        #[arg(long)]
        maintenance_type: Option<Uuid>,
        #[arg(long)]
        assignee: Option<Uuid>,
    },
    /// Show one order with its recorded responses
    Show { id: Uuid },
    /// Show the fill-in checklist of one order
    Form { id: Uuid },
}

#[derive(Serialize)]
struct InitSummary {
    database_path: PathBuf,
    maintenance_types: usize,
    core_version: &'static str,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("event=cli_command module=cli status=error error={err:#}");
            eprintln!("error: {err:#}");
            ExitCode::from(exit_code(&err))
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let defaults = AppConfig::default();
    let config = AppConfig {
        database_path: cli.db.unwrap_or(defaults.database_path),
        log_level: cli.log_level.unwrap_or(defaults.log_level),
        log_dir: cli.log_dir.or(defaults.log_dir),
    };
    init_logging_from_config(&config).context("failed to initialize logging")?;

    let store = Store::open(&config.database_path).with_context(|| {
        format!("failed to open database `{}`", config.database_path.display())
    })?;
    info!("event=cli_command module=cli status=start");

    match cli.command {
        Commands::Init => {
            let types = store.maintenance_types().list_maintenance_types()?;
            print_json(&InitSummary {
                database_path: config.database_path.clone(),
                maintenance_types: types.len(),
                core_version: core_version(),
            })?;
        }
        Commands::Equipment(ListCommand::List) => {
            print_json(&store.equipment().list_equipment()?)?;
        }
        Commands::Employees(ListCommand::List) => {
            print_json(&store.employees().list_employees()?)?;
        }
        Commands::Types(TypesCommand::List) => {
            print_json(&store.maintenance_types().list_maintenance_types()?)?;
        }
        Commands::Types(TypesCommand::Show { id }) => {
            let found = store
                .maintenance_types()
                .get_maintenance_type_with_checklist(id)?
                .ok_or(RepoError::NotFound {
                    entity: Entity::MaintenanceType,
                    id,
                })?;
            print_json(&found)?;
        }
        Commands::Orders(OrdersCommand::List {
            status,
            from,
            to,
            equipment,
            maintenance_type,
            assignee,
        }) => {
            let filter = ServiceOrderFilter {
                status,
                start_date: from,
                end_date: to,
                equipment_id: equipment,
                maintenance_type_id: maintenance_type,
                assigned_to: assignee,
            };
            print_json(&store.service_orders().list_service_orders(&filter)?)?;
        }
        Commands::Orders(OrdersCommand::Show { id }) => {
            let found = store
                .service_orders()
                .get_service_order(id)?
                .ok_or(RepoError::NotFound {
                    entity: Entity::ServiceOrder,
                    id,
                })?;
            print_json(&found)?;
        }
        Commands::Orders(OrdersCommand::Form { id }) => {
            let found = store
                .service_orders()
                .get_service_order_with_checklist(id)?
                .ok_or(RepoError::NotFound {
                    entity: Entity::ServiceOrder,
                    id,
                })?;
            print_json(&found)?;
        }
    }

    store.close().context("failed to close database")?;
    info!("event=cli_command module=cli status=ok");
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("failed to encode output")?;
    println!("{text}");
    Ok(())
}

fn exit_code(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<RepoError>().map(RepoError::kind) {
        Some(ErrorKind::NotFound) => 2,
        Some(ErrorKind::Conflict) | Some(ErrorKind::Validation) => 3,
        Some(ErrorKind::Store) | None => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::{exit_code, Cli, Commands, OrdersCommand};
    use clap::Parser;
    use maintrack_core::{Entity, RepoError, ServiceOrderStatus};
    use uuid::Uuid;

    #[test]
    fn orders_list_parses_filters() {
        let cli = Cli::try_parse_from([
            "maintrack",
            "--db",
            "/tmp/maintrack.db",
            "orders",
            "list",
            "--status",
            "in_progress",
            "--from",
            "2025-03-01",
        ])
        .unwrap();

        match cli.command {
            Commands::Orders(OrdersCommand::List { status, from, to, .. }) => {
                assert_eq!(status, Some(ServiceOrderStatus::InProgress));
                assert_eq!(from.as_deref(), Some("2025-03-01"));
                assert!(to.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn unknown_status_is_rejected() {
        let parsed = Cli::try_parse_from(["maintrack", "orders", "list", "--status", "done"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn exit_codes_follow_error_kind() {
        let missing = anyhow::Error::new(RepoError::NotFound {
            entity: Entity::ServiceOrder,
            id: Uuid::nil(),
        });
        assert_eq!(exit_code(&missing), 2);

        let conflict = anyhow::Error::new(RepoError::Conflict("in use".to_string()));
        assert_eq!(exit_code(&conflict), 3);

        assert_eq!(exit_code(&anyhow::anyhow!("disk full")), 1);
    }
}
