use rentbook_core::db::open_db_in_memory;
use rentbook_core::{
    DepositStatus, NewUnit, OccupancyStatus, RecordStore, SqliteKvRepository, StoreConfig,
    StoreError, UnitPatch, ValidationError,
};

fn open_store() -> RecordStore<SqliteKvRepository> {
    let repo = SqliteKvRepository::new(open_db_in_memory().unwrap());
    RecordStore::open(repo, &StoreConfig::default())
}

#[test]
fn add_then_get_returns_defaulted_record() {
    let mut store = open_store();
    let id = store.add_unit(NewUnit::new("Flat 3", "Oak Street 12")).unwrap();

    let unit = store.get_unit(&id).unwrap();
    assert_eq!(unit.created_at, unit.updated_at);
    assert_eq!(unit.rent_start_date, unit.created_at);
    assert_eq!(unit.occupancy_status, OccupancyStatus::Vacant);
    assert_eq!(unit.deposit_status, DepositStatus::Unknown);
    assert_eq!(unit.rent_amount, None);
    assert_eq!(unit.tenant_name, None);
    assert!(unit.photos.is_empty());
    assert_eq!(unit.water_account, "");
}

#[test]
fn add_rejects_blank_name_or_address_without_changing_store() {
    let mut store = open_store();

    let err = store.add_unit(NewUnit::new("  ", "Oak Street 12")).unwrap_err();
    assert!(matches!(err, StoreError::Validation(ValidationError::BlankName)));

    let err = store.add_unit(NewUnit::new("Flat", "")).unwrap_err();
    assert!(matches!(err, StoreError::Validation(ValidationError::BlankAddress)));

    assert!(store.list_units().is_empty());
}

#[test]
fn ids_are_unique_under_rapid_creation() {
    let mut store = open_store();
    for index in 0..50 {
        store
            .add_unit(NewUnit::new(format!("Flat {index}"), "Block A"))
            .unwrap();
    }
    let mut ids: Vec<&str> = store.list_units().iter().map(|u| u.id.as_str()).collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 50);
}

#[test]
fn list_keeps_insertion_order() {
    let mut store = open_store();
    let first = store.add_unit(NewUnit::new("Zeta", "a")).unwrap();
    let second = store.add_unit(NewUnit::new("Alpha", "b")).unwrap();

    let ids: Vec<&str> = store.list_units().iter().map(|u| u.id.as_str()).collect();
    assert_eq!(ids, vec![first.as_str(), second.as_str()]);
}

#[test]
fn update_keeps_created_at_and_advances_updated_at() {
    let mut store = open_store();
    let id = store.add_unit(NewUnit::new("Flat", "Addr")).unwrap();
    let before = store.get_unit(&id).unwrap().clone();

    store
        .update_unit(
            &id,
            UnitPatch {
                occupancy_status: Some(OccupancyStatus::Occupied),
                rent_amount: Some(Some(1200.0)),
                tenant_name: Some(Some("J. Doe".to_string())),
                ..UnitPatch::default()
            },
        )
        .unwrap();

    let after = store.get_unit(&id).unwrap();
    assert_eq!(after.created_at, before.created_at);
    assert!(after.updated_at >= before.updated_at);
    assert_eq!(after.occupancy_status, OccupancyStatus::Occupied);
    assert_eq!(after.rent_amount, Some(1200.0));
    assert_eq!(after.tenant_name.as_deref(), Some("J. Doe"));
    assert_eq!(after.name, "Flat");
}

#[test]
fn update_unknown_id_returns_not_found() {
    let mut store = open_store();
    let err = store.update_unit("missing", UnitPatch::default()).unwrap_err();
    assert!(matches!(err, StoreError::NotFound(id) if id == "missing"));
}

#[test]
fn update_that_blanks_name_is_rejected_and_unit_unchanged() {
    let mut store = open_store();
    let id = store.add_unit(NewUnit::new("Flat", "Addr")).unwrap();
    let before = store.get_unit(&id).unwrap().clone();

    let err = store
        .update_unit(
            &id,
            UnitPatch {
                name: Some(" ".to_string()),
                ..UnitPatch::default()
            },
        )
        .unwrap_err();
    assert!(matches!(err, StoreError::Validation(ValidationError::BlankName)));
    assert_eq!(store.get_unit(&id).unwrap(), &before);
}

#[test]
fn delete_removes_unit_and_missing_id_is_not_found() {
    let mut store = open_store();
    let id = store.add_unit(NewUnit::new("Flat", "Addr")).unwrap();

    store.delete_unit(&id).unwrap();
    assert!(store.get_unit(&id).is_none());

    let err = store.delete_unit(&id).unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)));
}

#[test]
fn photo_helpers_preserve_relative_order() {
    let mut store = open_store();
    let id = store.add_unit(NewUnit::new("Flat", "Addr")).unwrap();
    for uri in ["file:///a.jpg", "file:///b.jpg", "file:///c.jpg"] {
        store.add_photo(&id, uri).unwrap();
    }

    store.remove_photo(&id, 1).unwrap();
    assert_eq!(
        store.get_unit(&id).unwrap().photos,
        vec!["file:///a.jpg".to_string(), "file:///c.jpg".to_string()]
    );

    let err = store.remove_photo(&id, 5).unwrap_err();
    assert!(matches!(
        err,
        StoreError::Validation(ValidationError::PhotoIndexOutOfRange { index: 5, len: 2 })
    ));
}

#[test]
fn mutations_survive_reopening_the_same_storage() {
    let mut store = open_store();
    let id = store.add_unit(NewUnit::new("Flat", "Addr")).unwrap();
    store.add_photo(&id, "file:///front.jpg").unwrap();
    let expected = store.list_units().to_vec();

    let reopened = RecordStore::open(store.into_repository(), &StoreConfig::default());
    assert_eq!(reopened.list_units(), expected.as_slice());
}
