use maintrack_core::db::open_db_in_memory;
use maintrack_core::db::seed::seed_maintenance_type_ids;
use maintrack_core::{
    ChecklistItemDraft, ChecklistItemInput, ChecklistItemRepository, EmployeeInput,
    EmployeeRepository, Entity, EquipmentInput, EquipmentRepository, ErrorKind,
    MaintenanceTypeInput, MaintenanceTypeRepository, OrderResponseRepository, RepoError,
    ResponseEntry, ResponseKind, ServiceOrderInput, ServiceOrderRepository, Store,
    SqliteChecklistItemRepository, SqliteMaintenanceTypeRepository,
};
use uuid::Uuid;

fn empty_type(store: &Store, name: &str) -> Uuid {
    store
        .maintenance_types()
        .create_maintenance_type(MaintenanceTypeInput::new(name, "monthly"))
        .unwrap()
        .maintenance_type
        .id
}

#[test]
fn create_and_get_checklist_item_roundtrip() {
    let store = Store::open_in_memory().unwrap();
    let type_id = empty_type(&store, "Elevator inspection");
    let repo = store.checklist_items();

    let created = repo
        .create_checklist_item(ChecklistItemInput::new(
            type_id,
            1,
            ChecklistItemDraft::new("Cabin level offset", ResponseKind::numeric("mm")),
        ))
        .unwrap();
    assert!(!created.id.is_nil());
    assert!(!created.created_at.is_empty());

    let loaded = repo.get_checklist_item(created.id).unwrap().unwrap();
    assert_eq!(loaded, created);
    assert_eq!(loaded.maintenance_type_id, type_id);
    assert_eq!(loaded.kind.unit(), Some("mm"));
    assert!(loaded.required);
}

#[test]
fn list_by_type_is_ordered_by_position() {
    let store = Store::open_in_memory().unwrap();
    let type_id = empty_type(&store, "Elevator inspection");
    let repo = store.checklist_items();

    for (order, description) in [(3, "Doors"), (1, "Cables"), (2, "Brakes")] {
        repo.create_checklist_item(ChecklistItemInput::new(
            type_id,
            order,
            ChecklistItemDraft::new(description, ResponseKind::YesNoNa),
        ))
        .unwrap();
    }

    let descriptions: Vec<String> = repo
        .list_by_maintenance_type(type_id)
        .unwrap()
        .into_iter()
        .map(|item| item.description)
        .collect();
    assert_eq!(descriptions, vec!["Cables", "Brakes", "Doors"]);

    let all = repo.list_checklist_items().unwrap();
    assert_eq!(all.len(), 10 + 14 + 5 + 6 + 3);
}

#[test]
fn create_rejects_missing_parent_and_taken_position() {
    let store = Store::open_in_memory().unwrap();
    let type_id = empty_type(&store, "Elevator inspection");
    let repo = store.checklist_items();
    let draft = ChecklistItemDraft::new("Cables", ResponseKind::YesNoNa);

    let missing_type = Uuid::new_v4();
    let err = repo
        .create_checklist_item(ChecklistItemInput::new(missing_type, 1, draft.clone()))
        .unwrap_err();
    match err {
        RepoError::NotFound { entity, id } => {
            assert_eq!(entity, Entity::MaintenanceType);
            assert_eq!(id, missing_type);
        }
        other => panic!("unexpected error: {other}"),
    }

    repo.create_checklist_item(ChecklistItemInput::new(type_id, 1, draft.clone()))
        .unwrap();
    let err = repo
        .create_checklist_item(ChecklistItemInput::new(type_id, 1, draft.clone()))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    let err = repo
        .create_checklist_item(ChecklistItemInput::new(type_id, 0, draft))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[test]
fn multiple_choice_items_need_options() {
    let store = Store::open_in_memory().unwrap();
    let type_id = empty_type(&store, "Elevator inspection");

    let err = store
        .checklist_items()
        .create_checklist_item(ChecklistItemInput::new(
            type_id,
            1,
            ChecklistItemDraft::new(
                "Motor in use",
                ResponseKind::multiple_choice(Vec::<String>::new()),
            ),
        ))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[test]
fn update_replaces_item_and_allows_keeping_own_position() {
    let store = Store::open_in_memory().unwrap();
    let type_id = empty_type(&store, "Elevator inspection");
    let repo = store.checklist_items();
    let first = repo
        .create_checklist_item(ChecklistItemInput::new(
            type_id,
            1,
            ChecklistItemDraft::new("Cables", ResponseKind::YesNoNa),
        ))
        .unwrap();
    let second = repo
        .create_checklist_item(ChecklistItemInput::new(
            type_id,
            2,
            ChecklistItemDraft::new("Brakes", ResponseKind::YesNoNa),
        ))
        .unwrap();

    let updated = repo
        .update_checklist_item(
            first.id,
            ChecklistItemInput::new(
                type_id,
                1,
                ChecklistItemDraft::new("Cable wear", ResponseKind::multiple_choice(["OK", "NOK"]))
                    .optional(),
            ),
        )
        .unwrap();
    assert_eq!(updated.created_at, first.created_at);
    let loaded = repo.get_checklist_item(first.id).unwrap().unwrap();
    assert_eq!(loaded, updated);
    assert!(!loaded.required);
    assert_eq!(loaded.kind.options(), ["OK", "NOK"]);

    let err = repo
        .update_checklist_item(
            second.id,
            ChecklistItemInput::new(
                type_id,
                1,
                ChecklistItemDraft::new("Brakes", ResponseKind::YesNoNa),
            ),
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    let err = repo
        .update_checklist_item(
            Uuid::new_v4(),
            ChecklistItemInput::new(type_id, 5, ChecklistItemDraft::new("x", ResponseKind::Text)),
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn answered_item_cannot_be_deleted() {
    let store = Store::open_in_memory().unwrap();
    let created = store
        .maintenance_types()
        .create_maintenance_type(
            MaintenanceTypeInput::new("Elevator inspection", "monthly").with_checklist(vec![
                ChecklistItemDraft::new("Cables", ResponseKind::YesNoNa),
                ChecklistItemDraft::new("Brakes", ResponseKind::YesNoNa),
            ]),
        )
        .unwrap();
    let equipment = store
        .equipment()
        .create_equipment(EquipmentInput::new("Elevator A", "Tower 1"))
        .unwrap();
    let employee = store
        .employees()
        .create_employee(EmployeeInput::new("Eva Martins", "44h", "Lifts"))
        .unwrap();
    let order = store
        .service_orders()
        .create_service_order(ServiceOrderInput::new(
            equipment.id,
            created.maintenance_type.id,
            employee.id,
            "2025-03-20",
        ))
        .unwrap();
    let answered = created.checklist_items[0].id;
    let unanswered = created.checklist_items[1].id;
    store
        .order_responses()
        .save_responses(order.id, &[ResponseEntry::new(answered, "no")])
        .unwrap();

    let err = store
        .checklist_items()
        .delete_checklist_item(answered)
        .unwrap_err();
    assert!(matches!(err, RepoError::Conflict(_)));

    store
        .checklist_items()
        .delete_checklist_item(unanswered)
        .unwrap();
    assert!(store
        .checklist_items()
        .get_checklist_item(unanswered)
        .unwrap()
        .is_none());
}

#[test]
fn unreadable_stored_options_decode_to_empty_list() {
    let conn = open_db_in_memory().unwrap();
    let type_id = SqliteMaintenanceTypeRepository::new(&conn)
        .create_maintenance_type(
            MaintenanceTypeInput::new("Generator round", "daily").with_checklist(vec![
                ChecklistItemDraft::new("Oil level", ResponseKind::multiple_choice(["OK", "NOK"])),
            ]),
        )
        .unwrap()
        .maintenance_type
        .id;
    conn.execute(
        "UPDATE checklist_items SET options = 'OK;NOK' WHERE maintenance_type_id = ?1;",
        [type_id.to_string()],
    )
    .unwrap();

    let items = SqliteChecklistItemRepository::new(&conn)
        .list_by_maintenance_type(type_id)
        .unwrap();
    assert_eq!(items.len(), 1);
    assert!(items[0].kind.options().is_empty());
}

#[test]
fn answered_item_keeps_its_type_and_response_kind() {
    let store = Store::open_in_memory().unwrap();
    let generators = seed_maintenance_type_ids()[2];
    let air_conditioning = seed_maintenance_type_ids()[0];
    let equipment = store
        .equipment()
        .create_equipment(EquipmentInput::new("Generator G1", "Yard"))
        .unwrap();
    let employee = store
        .employees()
        .create_employee(EmployeeInput::new("Helena Dias", "44h", "Power"))
        .unwrap();
    let order = store
        .service_orders()
        .create_service_order(ServiceOrderInput::new(
            equipment.id,
            generators,
            employee.id,
            "2025-03-14",
        ))
        .unwrap();
    let diesel = store
        .checklist_items()
        .list_by_maintenance_type(generators)
        .unwrap()
        .remove(0);
    store
        .order_responses()
        .save_responses(order.id, &[ResponseEntry::new(diesel.id, "120")])
        .unwrap();
    let repo = store.checklist_items();

    let err = repo
        .update_checklist_item(
            diesel.id,
            ChecklistItemInput::new(
                air_conditioning,
                99,
                ChecklistItemDraft::new("Diesel level (litres)", ResponseKind::numeric("L")),
            ),
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    let err = repo
        .update_checklist_item(
            diesel.id,
            ChecklistItemInput::new(
                generators,
                diesel.item_order,
                ChecklistItemDraft::new(
                    "Diesel level",
                    ResponseKind::multiple_choice(["OK", "NOK"]),
                ),
            ),
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!(repo.get_checklist_item(diesel.id).unwrap().unwrap(), diesel);

    let renamed = repo
        .update_checklist_item(
            diesel.id,
            ChecklistItemInput::new(
                generators,
                diesel.item_order,
                ChecklistItemDraft::new("Diesel tank level", ResponseKind::numeric("L")),
            ),
        )
        .unwrap();
    assert_eq!(renamed.description, "Diesel tank level");
    let responses = store
        .order_responses()
        .list_by_service_order(order.id)
        .unwrap();
    assert_eq!(responses[0].description, "Diesel tank level");
    assert_eq!(responses[0].response.response_value, "120");
}
