//! Canonical maintenance type templates inserted on first boot.
//!
//! # Responsibility
//! - Provide the four built-in maintenance types and their fixed checklists.
//! - Insert them once, and only into an empty `maintenance_types` table.
//!
//! # Invariants
//! - Template ids are fixed so orders created against them stay portable
//!   between data files.
//! - Existing rows are never updated; user edits to seeded templates win.
//! - Types and items are written in one transaction.

use super::{with_immediate_tx, DbError, DbResult};
use crate::model::checklist_item::ResponseKind;
use crate::model::now_timestamp;
use log::info;
use rusqlite::{params, Connection};
use uuid::Uuid;

struct SeedType {
    id: &'static str,
    name: &'static str,
    description: &'static str,
    frequency: &'static str,
    items: &'static [SeedItem],
}

struct SeedItem {
    description: &'static str,
    kind: SeedKind,
}

enum SeedKind {
    YesNoNa,
    Numeric(&'static str),
    Choice(&'static [&'static str]),
}

const fn check(description: &'static str) -> SeedItem {
    SeedItem {
        description,
        kind: SeedKind::YesNoNa,
    }
}

const fn measure(description: &'static str, unit: &'static str) -> SeedItem {
    SeedItem {
        description,
        kind: SeedKind::Numeric(unit),
    }
}

const fn choose(description: &'static str, options: &'static [&'static str]) -> SeedItem {
    SeedItem {
        description,
        kind: SeedKind::Choice(options),
    }
}

const OK_NOK: &[&str] = &["OK", "NOK"];

const SEED_TYPES: &[SeedType] = &[
    SeedType {
        id: "ac6a7e7a-c6a9-4c1f-8f7d-d3f2d7e8c9b0",
        name: "Monthly Preventive - Air Conditioning",
        description: "Monthly preventive maintenance of air-conditioning units",
        frequency: "monthly",
        items: &[
            check("Clean the air filter"),
            check("Check for refrigerant gas leaks"),
            check("Lubricate mechanical components"),
            check("Inspect the electrical system"),
            measure("Check system pressure", "PSI"),
            measure("Check air outlet temperature", "°C"),
            check("Check the remote control"),
            check("Check the drain system"),
            measure("Measure equipment voltage (V)", "V"),
            measure("Measure equipment current (A)", "A"),
        ],
    },
    SeedType {
        id: "bc6a7e7a-c6a9-4c1f-8f7d-d3f2d7e8c9b1",
        name: "Monthly Preventive - Electrical Panels",
        description: "Monthly preventive maintenance of electrical panels",
        frequency: "monthly",
        items: &[
            check("General cleaning of the cabinet"),
            check("Check that the panel door has a lock or padlock"),
            check("Retighten connections where possible"),
            measure("Phase-to-phase voltage (RS)", "V"),
            measure("Phase-to-phase voltage (RT)", "V"),
            measure("Phase-to-phase voltage (ST)", "V"),
            measure("Phase-to-neutral voltage (RN)", "V"),
            measure("Phase-to-neutral voltage (SN)", "V"),
            measure("Phase-to-neutral voltage (TN)", "V"),
            measure("Current (phase R)", "A"),
            measure("Current (phase S)", "A"),
            measure("Current (phase T)", "A"),
            measure("Phase-to-ground voltage", "V"),
            check("Check for signs of overheating"),
        ],
    },
    SeedType {
        id: "cc6a7e7a-c6a9-4c1f-8f7d-d3f2d7e8c9b2",
        name: "Daily Round - Generators",
        description: "Daily inspection of generators",
        frequency: "daily",
        items: &[
            measure("Diesel level (litres)", "L"),
            measure("Battery voltage (V)", "V"),
            choose("Lubricating oil level", OK_NOK),
            choose("Radiator water level", OK_NOK),
            choose("Pre-heating system operation", OK_NOK),
        ],
    },
    SeedType {
        id: "dc6a7e7a-c6a9-4c1f-8f7d-d3f2d7e8c9b3",
        name: "Daily Round - Booster Pumps",
        description: "Daily inspection of booster pumps",
        frequency: "daily",
        items: &[
            check("Check for leaks at the pump and piping"),
            choose("Pump in use", &["BOMBA 01", "BOMBA 02"]),
            check("General condition of the electrical panel"),
            measure("Current phase R (A)", "A"),
            measure("Current phase S (A)", "A"),
            measure("Current phase T (A)", "A"),
        ],
    },
];

/// Ids of the built-in maintenance types, in seed order.
pub fn seed_maintenance_type_ids() -> Vec<Uuid> {
    SEED_TYPES
        .iter()
        .filter_map(|seed| Uuid::parse_str(seed.id).ok())
        .collect()
}

/// Inserts the built-in templates when `maintenance_types` is empty.
///
/// Returns `true` when rows were inserted, `false` when the table already
/// had data and nothing was touched.
pub fn seed_maintenance_types(conn: &Connection) -> DbResult<bool> {
    with_immediate_tx(conn, |conn| {
        let existing: i64 =
            conn.query_row("SELECT COUNT(*) FROM maintenance_types;", [], |row| row.get(0))?;
        if existing > 0 {
            info!("event=db_seed module=db status=skipped reason=not_empty");
            return Ok(false);
        }

        let now = now_timestamp();
        let mut item_count = 0usize;
        for seed in SEED_TYPES {
            conn.execute(
                "INSERT INTO maintenance_types (id, name, description, frequency, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5);",
                params![seed.id, seed.name, seed.description, seed.frequency, now],
            )?;

            for (index, item) in seed.items.iter().enumerate() {
                let kind = item.kind.to_response_kind();
                let options = kind
                    .options_column()
                    .map_err(|err| DbError::Seed(err.to_string()))?;
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
                    ) VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6, ?7, ?8);",
                    params![
                        Uuid::new_v4().to_string(),
                        seed.id,
                        item.description,
                        (index + 1) as i64,
                        kind.response_type().as_str(),
                        options,
                        kind.unit(),
                        now,
                    ],
                )?;
                item_count += 1;
            }
        }

        info!(
            "event=db_seed module=db status=ok maintenance_types={} checklist_items={}",
            SEED_TYPES.len(),
            item_count
        );
        Ok(true)
    })
}

impl SeedKind {
    fn to_response_kind(&self) -> ResponseKind {
        match self {
            Self::YesNoNa => ResponseKind::YesNoNa,
            Self::Numeric(unit) => ResponseKind::numeric(*unit),
            Self::Choice(options) => ResponseKind::multiple_choice(options.iter().copied()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{seed_maintenance_type_ids, SEED_TYPES};

    #[test]
    fn seed_templates_have_expected_checklist_sizes() {
        let sizes: Vec<usize> = SEED_TYPES.iter().map(|seed| seed.items.len()).collect();
        assert_eq!(sizes, vec![10, 14, 5, 6]);
    }

    #[test]
    fn seed_ids_are_valid_uuids() {
        assert_eq!(seed_maintenance_type_ids().len(), SEED_TYPES.len());
    }

    #[test]
    fn seed_choice_items_have_options() {
        for seed in SEED_TYPES {
            for item in seed.items {
                let kind = item.kind.to_response_kind();
                assert!(kind.validate_definition().is_ok(), "{}", item.description);
            }
        }
    }
}
