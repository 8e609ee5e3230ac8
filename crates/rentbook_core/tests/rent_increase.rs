use chrono::Duration;
use rentbook_core::db::open_db_in_memory;
use rentbook_core::{
    NewUnit, RecordStore, SqliteKvRepository, StoreConfig, StoreError, ValidationError,
};

fn open_store() -> RecordStore<SqliteKvRepository> {
    let repo = SqliteKvRepository::new(open_db_in_memory().unwrap());
    RecordStore::open(repo, &StoreConfig::default())
}

fn add_rented_unit(store: &mut RecordStore<SqliteKvRepository>, rent: f64) -> String {
    let mut input = NewUnit::new("Flat", "Addr");
    input.rent_amount = Some(rent);
    store.add_unit(input).unwrap()
}

#[test]
fn increase_appends_event_and_moves_unit_rent_together() {
    let mut store = open_store();
    let unit_id = add_rented_unit(&mut store, 1000.0);

    let event_id = store
        .record_rent_increase(&unit_id, 1000.0, 1250.0, Some("yearly CPI".to_string()))
        .unwrap();

    let history = store.increase_history_for(&unit_id);
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].id, event_id);
    assert!((history[0].increase_rate_percent - 25.0).abs() < 1e-9);
    assert_eq!(history[0].justification.as_deref(), Some("yearly CPI"));

    let unit = store.get_unit(&unit_id).unwrap();
    assert_eq!(unit.rent_amount, Some(1250.0));
    assert_eq!(unit.last_rent_increase_date, Some(history[0].increase_date));
}

#[test]
fn non_increasing_amount_is_rejected_and_nothing_changes() {
    let mut store = open_store();
    let unit_id = add_rented_unit(&mut store, 1000.0);
    let before = store.get_unit(&unit_id).unwrap().clone();

    for new_amount in [1000.0, 900.0] {
        let err = store
            .record_rent_increase(&unit_id, 1000.0, new_amount, None)
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::Validation(ValidationError::NotAnIncrease { .. })
        ));
    }

    assert!(store.list_events().is_empty());
    assert_eq!(store.get_unit(&unit_id).unwrap(), &before);
}

#[test]
fn increase_requires_existing_unit_with_current_rent() {
    let mut store = open_store();
    let err = store
        .record_rent_increase("ghost", 100.0, 200.0, None)
        .unwrap_err();
    assert!(matches!(
        err,
        StoreError::Validation(ValidationError::UnknownUnit(_))
    ));

    let no_rent = store.add_unit(NewUnit::new("Empty", "Addr")).unwrap();
    let err = store
        .record_rent_increase(&no_rent, 100.0, 200.0, None)
        .unwrap_err();
    assert!(matches!(
        err,
        StoreError::Validation(ValidationError::NoCurrentRent(_))
    ));
    assert!(store.list_events().is_empty());
}

#[test]
fn history_is_newest_first_and_scoped_to_unit() {
    let mut store = open_store();
    let unit_id = add_rented_unit(&mut store, 1000.0);
    let other_id = add_rented_unit(&mut store, 500.0);

    let first = store
        .record_rent_increase(&unit_id, 1000.0, 1100.0, None)
        .unwrap();
    store
        .record_rent_increase(&other_id, 500.0, 550.0, None)
        .unwrap();
    let second = store
        .record_rent_increase(&unit_id, 1100.0, 1200.0, None)
        .unwrap();

    let history: Vec<&str> = store
        .increase_history_for(&unit_id)
        .iter()
        .map(|event| event.id.as_str())
        .collect();
    // Same-millisecond events keep insertion order, so only strictly
    // later dates may move ahead.
    let first_date = store.get_event(&first).unwrap().increase_date;
    let second_date = store.get_event(&second).unwrap().increase_date;
    if second_date > first_date {
        assert_eq!(history, vec![second.as_str(), first.as_str()]);
    } else {
        assert_eq!(history, vec![first.as_str(), second.as_str()]);
    }

    let in_order: Vec<&str> = store
        .events_for_unit(&unit_id)
        .iter()
        .map(|event| event.id.as_str())
        .collect();
    assert_eq!(in_order, vec![first.as_str(), second.as_str()]);
}

#[test]
fn history_sort_uses_increase_date_not_insertion_order() {
    let json = r#"{
        "units": [{"id": "u1", "name": "Flat", "address": "Addr", "rentAmount": 1300}],
        "events": [
            {"id": "old", "unitId": "u1", "oldAmount": 1000, "newAmount": 1100,
             "increaseRatePercent": 10, "increaseDate": "2022-01-01T00:00:00.000Z"},
            {"id": "new", "unitId": "u1", "oldAmount": 1200, "newAmount": 1300,
             "increaseRatePercent": 8.33, "increaseDate": "2024-01-01T00:00:00.000Z"},
            {"id": "mid", "unitId": "u1", "oldAmount": 1100, "newAmount": 1200,
             "increaseRatePercent": 9.09, "increaseDate": "2023-01-01T00:00:00.000Z"}
        ],
        "backupDate": "2024-02-01T00:00:00.000Z",
        "version": "1.0"
    }"#;
    let mut store = open_store();
    assert!(store.restore_backup(json));

    let ids: Vec<&str> = store
        .increase_history_for("u1")
        .iter()
        .map(|event| event.id.as_str())
        .collect();
    assert_eq!(ids, vec!["new", "mid", "old"]);
    let newest = store.get_event("new").unwrap();
    let oldest = store.get_event("old").unwrap();
    assert_eq!(newest.increase_date - oldest.increase_date, Duration::days(730));
}

#[test]
fn deleting_unit_leaves_orphaned_events_reachable() {
    let mut store = open_store();
    let unit_id = add_rented_unit(&mut store, 800.0);
    let event_id = store
        .record_rent_increase(&unit_id, 800.0, 900.0, None)
        .unwrap();

    store.delete_unit(&unit_id).unwrap();

    let event = store.get_event(&event_id).unwrap();
    assert_eq!(event.unit_id, unit_id);
    assert!(store.get_unit(&event.unit_id).is_none());
    assert_eq!(store.increase_history_for(&unit_id).len(), 1);
}
