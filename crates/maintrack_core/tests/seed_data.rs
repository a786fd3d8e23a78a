use maintrack_core::db::open_db_in_memory;
use maintrack_core::db::seed::{seed_maintenance_type_ids, seed_maintenance_types};
use maintrack_core::{
    ChecklistItemRepository, MaintenanceTypeInput, MaintenanceTypeRepository, ResponseKind,
    ResponseType, SqliteChecklistItemRepository, SqliteMaintenanceTypeRepository,
};
use rusqlite::Connection;

#[test]
fn first_open_seeds_four_templates_with_fixed_checklists() {
    let conn = open_db_in_memory().unwrap();
    assert_seeded(&conn);
}

#[test]
fn running_seed_again_changes_nothing() {
    let conn = open_db_in_memory().unwrap();

    let inserted = seed_maintenance_types(&conn).unwrap();
    assert!(!inserted);
    assert_seeded(&conn);

    let inserted_again = seed_maintenance_types(&conn).unwrap();
    assert!(!inserted_again);
    assert_seeded(&conn);
}

#[test]
fn seed_keeps_user_edits_to_templates() {
    let conn = open_db_in_memory().unwrap();
    let types = SqliteMaintenanceTypeRepository::new(&conn);
    let generator_id = seed_maintenance_type_ids()[2];

    types
        .update_maintenance_type(
            generator_id,
            MaintenanceTypeInput::new("Generator round (edited)", "weekly"),
        )
        .unwrap();
    seed_maintenance_types(&conn).unwrap();

    let loaded = types.get_maintenance_type(generator_id).unwrap().unwrap();
    assert_eq!(loaded.name, "Generator round (edited)");
    assert_eq!(loaded.frequency, "weekly");
}

#[test]
fn seed_fills_an_emptied_table() {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch("DELETE FROM checklist_items; DELETE FROM maintenance_types;")
        .unwrap();

    assert!(seed_maintenance_types(&conn).unwrap());
    assert_seeded(&conn);
}

#[test]
fn seeded_items_carry_kinds_units_and_options() {
    let conn = open_db_in_memory().unwrap();
    let items = SqliteChecklistItemRepository::new(&conn);
    let ids = seed_maintenance_type_ids();

    let air_conditioning = items.list_by_maintenance_type(ids[0]).unwrap();
    assert_eq!(air_conditioning[0].kind, ResponseKind::YesNoNa);
    assert_eq!(air_conditioning[4].kind, ResponseKind::numeric("PSI"));
    assert!(air_conditioning.iter().all(|item| item.required));

    let generators = items.list_by_maintenance_type(ids[2]).unwrap();
    assert_eq!(generators[0].kind.unit(), Some("L"));
    assert_eq!(
        generators[2].kind,
        ResponseKind::multiple_choice(["OK", "NOK"])
    );

    let pumps = items.list_by_maintenance_type(ids[3]).unwrap();
    assert_eq!(pumps[1].kind.response_type(), ResponseType::MultipleChoice);
    assert_eq!(pumps[1].kind.options(), ["BOMBA 01", "BOMBA 02"]);
}

fn assert_seeded(conn: &Connection) {
    let types = SqliteMaintenanceTypeRepository::new(conn);
    let listed = types.list_maintenance_types().unwrap();
    assert_eq!(listed.len(), 4);

    let expected = [(10usize, "monthly"), (14, "monthly"), (5, "daily"), (6, "daily")];
    for (id, (item_count, frequency)) in seed_maintenance_type_ids().into_iter().zip(expected) {
        let loaded = types.get_maintenance_type_with_checklist(id).unwrap().unwrap();
        assert_eq!(loaded.maintenance_type.frequency, frequency);
        assert_eq!(loaded.checklist_items.len(), item_count);

        let orders: Vec<i64> = loaded
            .checklist_items
            .iter()
            .map(|item| item.item_order)
            .collect();
        let expected_orders: Vec<i64> = (1..=item_count as i64).collect();
        assert_eq!(orders, expected_orders);
    }
}
