//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose one explicit session handle over the record store to Dart via FRB.
//! - Translate core results into envelopes with a short human-readable notice.
//!
//! # Invariants
//! - Exported functions must not panic across the FFI boundary.
//! - Notices never carry tenant data or raw storage errors.
//! - Dates cross the boundary as UTC epoch milliseconds.

use chrono::{DateTime, Utc};
use log::{error, warn};
use rentbook_core::db::open_db;
use rentbook_core::stats::{income_series as series_inner, occupancy, monthly_income, top_rents};
use rentbook_core::{
    core_version as core_version_inner, default_log_level as default_log_level_inner,
    init_logging as init_logging_inner, DepositStatus,
    IncomeBucket, IncomePeriod, NewUnit, OccupancyStatus, RecordStore, RentIncreaseEvent,
    SqliteKvRepository, StoreConfig, StoreError, Unit, UnitPatch,
};
use std::sync::{Mutex, MutexGuard, PoisonError};

const DASHBOARD_TOP_RENTS: usize = 5;

/// Minimal health-check API for FRB smoke integration.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    "pong".to_string()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Level the host passes to `init_logging` when the user has not chosen one.
///
/// `debug` in debug builds, `info` in release builds.
#[flutter_rust_bridge::frb(sync)]
pub fn default_log_level() -> String {
    default_log_level_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir`.
/// - Returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Editable unit fields as submitted by the unit form.
///
/// Status fields take `present|absent|unknown` and `occupied|vacant`;
/// unrecognized values fall back to `unknown` and `vacant`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UnitForm {
    pub name: String,
    pub address: String,
    pub water_account: String,
    pub electricity_account: String,
    pub gas_account: String,
    pub insurance_policy: String,
    pub deposit_status: String,
    pub deposit_amount: Option<f64>,
    pub rent_start_epoch_ms: Option<i64>,
    pub rent_amount: Option<f64>,
    pub next_rent_increase_epoch_ms: Option<i64>,
    pub expected_rent_increase_rate: Option<f64>,
    pub tenant_name: Option<String>,
    pub tenant_phone: Option<String>,
    pub occupancy_status: String,
    pub photos: Vec<String>,
    pub notes: Option<String>,
}

/// Unit projection returned to the UI.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitItem {
    pub id: String,
    pub name: String,
    pub address: String,
    pub water_account: String,
    pub electricity_account: String,
    pub gas_account: String,
    pub insurance_policy: String,
    pub deposit_status: String,
    pub deposit_amount: Option<f64>,
    pub rent_start_epoch_ms: i64,
    pub rent_amount: Option<f64>,
    pub last_rent_increase_epoch_ms: Option<i64>,
    pub next_rent_increase_epoch_ms: Option<i64>,
    pub expected_rent_increase_rate: Option<f64>,
    pub tenant_name: Option<String>,
    pub tenant_phone: Option<String>,
    pub occupancy_status: String,
    pub photos: Vec<String>,
    pub notes: Option<String>,
    pub created_epoch_ms: i64,
    pub updated_epoch_ms: i64,
}

/// One rent-increase history row.
#[derive(Debug, Clone, PartialEq)]
pub struct RentIncreaseItem {
    pub id: String,
    pub unit_id: String,
    pub old_amount: f64,
    pub new_amount: f64,
    pub increase_rate_percent: f64,
    pub increase_epoch_ms: i64,
    pub justification: Option<String>,
}

/// Generic action envelope for mutations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionResponse {
    pub ok: bool,
    /// Id of the created or touched record.
    pub record_id: Option<String>,
    pub message: String,
}

impl ActionResponse {
    fn success(message: impl Into<String>, record_id: String) -> Self {
        Self {
            ok: true,
            record_id: Some(record_id),
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            record_id: None,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnitListResponse {
    pub items: Vec<UnitItem>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnitLookupResponse {
    pub ok: bool,
    pub unit: Option<UnitItem>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IncreaseHistoryResponse {
    pub items: Vec<RentIncreaseItem>,
    pub message: String,
}

/// Backup export/import envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupResponse {
    pub ok: bool,
    /// Snapshot text on export; `None` on import and on failure.
    pub backup_text: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TopRentItem {
    pub unit_id: String,
    pub name: String,
    pub rent_amount: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardStats {
    pub total_units: u32,
    pub occupied_units: u32,
    pub vacant_units: u32,
    pub occupancy_rate_percent: f64,
    pub monthly_income: f64,
    /// Sum of deposits currently held across all units.
    pub deposits_held: f64,
    pub top_rents: Vec<TopRentItem>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IncomeBucketItem {
    pub label: String,
    pub income: f64,
    pub is_current: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IncomeSeriesResponse {
    pub ok: bool,
    pub buckets: Vec<IncomeBucketItem>,
    pub message: String,
}

/// Open record store bound to one database file.
#[flutter_rust_bridge::frb(opaque)]
pub struct RentbookSession {
    store: Mutex<RecordStore<SqliteKvRepository>>,
}

impl RentbookSession {
    /// Opens (or creates) the database at `db_path` and loads all records.
    ///
    /// # FFI contract
    /// - Sync call; runs migrations on first open.
    /// - Returns an error notice when the database cannot be opened.
    #[flutter_rust_bridge::frb(sync)]
    pub fn open(db_path: String) -> Result<RentbookSession, String> {
        let path = db_path.trim();
        if path.is_empty() {
            return Err("Database path is required.".to_string());
        }
        let conn = open_db(path).map_err(|err| {
            error!("event=session_open module=ffi status=error error={err}");
            "Could not open the local database.".to_string()
        })?;
        let store = RecordStore::open(SqliteKvRepository::new(conn), &StoreConfig::default());
        Ok(Self {
            store: Mutex::new(store),
        })
    }

    #[flutter_rust_bridge::frb(sync)]
    pub fn add_unit(&self, form: UnitForm) -> ActionResponse {
        match self.lock().add_unit(new_unit_from_form(form)) {
            Ok(id) => ActionResponse::success("Unit added.", id),
            Err(err) => ActionResponse::failure(notice_for(&err)),
        }
    }

    /// Replaces the editable fields of a unit with the submitted form.
    #[flutter_rust_bridge::frb(sync)]
    pub fn update_unit(&self, unit_id: String, form: UnitForm) -> ActionResponse {
        match self.lock().update_unit(&unit_id, patch_from_form(form)) {
            Ok(()) => ActionResponse::success("Unit updated.", unit_id),
            Err(err) => ActionResponse::failure(notice_for(&err)),
        }
    }

    #[flutter_rust_bridge::frb(sync)]
    pub fn delete_unit(&self, unit_id: String) -> ActionResponse {
        match self.lock().delete_unit(&unit_id) {
            Ok(()) => ActionResponse::success("Unit deleted.", unit_id),
            Err(err) => ActionResponse::failure(notice_for(&err)),
        }
    }

    #[flutter_rust_bridge::frb(sync)]
    pub fn add_photo(&self, unit_id: String, uri: String) -> ActionResponse {
        match self.lock().add_photo(&unit_id, uri) {
            Ok(()) => ActionResponse::success("Photo added.", unit_id),
            Err(err) => ActionResponse::failure(notice_for(&err)),
        }
    }

    #[flutter_rust_bridge::frb(sync)]
    pub fn remove_photo(&self, unit_id: String, index: u32) -> ActionResponse {
        match self.lock().remove_photo(&unit_id, index as usize) {
            Ok(()) => ActionResponse::success("Photo removed.", unit_id),
            Err(err) => ActionResponse::failure(notice_for(&err)),
        }
    }

    /// Records a rent increase; `record_id` is the new event id.
    #[flutter_rust_bridge::frb(sync)]
    pub fn record_rent_increase(
        &self,
        unit_id: String,
        old_amount: f64,
        new_amount: f64,
        justification: Option<String>,
    ) -> ActionResponse {
        let justification = justification.filter(|text| !text.trim().is_empty());
        match self
            .lock()
            .record_rent_increase(&unit_id, old_amount, new_amount, justification)
        {
            Ok(event_id) => ActionResponse::success("Rent increase recorded.", event_id),
            Err(err) => ActionResponse::failure(notice_for(&err)),
        }
    }

    #[flutter_rust_bridge::frb(sync)]
    pub fn list_units(&self) -> UnitListResponse {
        let store = self.lock();
        let items: Vec<UnitItem> = store.list_units().iter().map(unit_item).collect();
        let message = if items.is_empty() {
            "No units yet.".to_string()
        } else {
            format!("{} unit(s).", items.len())
        };
        UnitListResponse { items, message }
    }

    #[flutter_rust_bridge::frb(sync)]
    pub fn get_unit(&self, unit_id: String) -> UnitLookupResponse {
        match self.lock().get_unit(&unit_id).map(unit_item) {
            Some(unit) => UnitLookupResponse {
                ok: true,
                unit: Some(unit),
                message: String::new(),
            },
            None => UnitLookupResponse {
                ok: false,
                unit: None,
                message: "Unit not found.".to_string(),
            },
        }
    }

    /// Rent increases for a unit, newest first.
    #[flutter_rust_bridge::frb(sync)]
    pub fn increase_history_for(&self, unit_id: String) -> IncreaseHistoryResponse {
        let store = self.lock();
        let items: Vec<RentIncreaseItem> = store
            .increase_history_for(&unit_id)
            .into_iter()
            .map(increase_item)
            .collect();
        let message = if items.is_empty() {
            "No rent increases recorded.".to_string()
        } else {
            format!("{} rent increase(s).", items.len())
        };
        IncreaseHistoryResponse { items, message }
    }

    #[flutter_rust_bridge::frb(sync)]
    pub fn create_backup(&self) -> BackupResponse {
        match self.lock().create_backup() {
            Ok(text) => BackupResponse {
                ok: true,
                backup_text: Some(text),
                message: "Backup created.".to_string(),
            },
            Err(err) => BackupResponse {
                ok: false,
                backup_text: None,
                message: notice_for(&err),
            },
        }
    }

    /// Replaces all records with the content of `backup_text`.
    #[flutter_rust_bridge::frb(sync)]
    pub fn restore_backup(&self, backup_text: String) -> BackupResponse {
        match self.lock().try_restore_backup(&backup_text) {
            Ok(summary) => BackupResponse {
                ok: true,
                backup_text: None,
                message: format!(
                    "Backup restored: {} unit(s), {} rent increase(s).",
                    summary.units, summary.events
                ),
            },
            Err(err) => BackupResponse {
                ok: false,
                backup_text: None,
                message: notice_for(&err),
            },
        }
    }

    /// Creation time of the latest backup, `None` if none was taken.
    #[flutter_rust_bridge::frb(sync)]
    pub fn last_backup_timestamp(&self) -> Option<i64> {
        self.lock()
            .last_backup_timestamp()
            .map(|stamp| stamp.timestamp_millis())
    }

    #[flutter_rust_bridge::frb(sync)]
    pub fn dashboard_stats(&self) -> DashboardStats {
        let store = self.lock();
        let units = store.list_units();
        let counts = occupancy(units);
        DashboardStats {
            total_units: counts.total as u32,
            occupied_units: counts.occupied as u32,
            vacant_units: counts.vacant as u32,
            occupancy_rate_percent: counts.rate_percent(),
            monthly_income: monthly_income(units),
            deposits_held: units.iter().filter_map(Unit::held_deposit).sum(),
            top_rents: top_rents(units, DASHBOARD_TOP_RENTS)
                .into_iter()
                .map(|unit| TopRentItem {
                    unit_id: unit.id.clone(),
                    name: unit.name.clone(),
                    rent_amount: unit.rent_amount.unwrap_or_default(),
                })
                .collect(),
        }
    }

    /// Income history for `period` (`monthly` or `yearly`), oldest first.
    #[flutter_rust_bridge::frb(sync)]
    pub fn income_series(&self, period: String) -> IncomeSeriesResponse {
        let period = match period.trim().to_ascii_lowercase().as_str() {
            "monthly" => IncomePeriod::Monthly,
            "yearly" => IncomePeriod::Yearly,
            other => {
                warn!("event=income_series module=ffi status=rejected period={other}");
                return IncomeSeriesResponse {
                    ok: false,
                    buckets: Vec::new(),
                    message: "Unsupported period; expected monthly or yearly.".to_string(),
                };
            }
        };
        let store = self.lock();
        let buckets = series_inner(store.list_units(), period, Utc::now())
            .into_iter()
            .map(bucket_item)
            .collect();
        IncomeSeriesResponse {
            ok: true,
            buckets,
            message: String::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, RecordStore<SqliteKvRepository>> {
        // Store calls validate before mutating; a poisoned guard holds whole records.
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn notice_for(err: &StoreError) -> String {
    match err {
        StoreError::Validation(inner) => format!("Invalid input: {inner}."),
        StoreError::NotFound(_) => "Unit not found.".to_string(),
        StoreError::Persistence(_) => "Could not reach local storage.".to_string(),
        StoreError::Decode(_) => "This is not a valid backup file.".to_string(),
    }
}

fn new_unit_from_form(form: UnitForm) -> NewUnit {
    NewUnit {
        name: form.name,
        address: form.address,
        water_account: form.water_account,
        electricity_account: form.electricity_account,
        gas_account: form.gas_account,
        insurance_policy: form.insurance_policy,
        deposit_status: parse_deposit_status(&form.deposit_status),
        deposit_amount: form.deposit_amount,
        rent_start_date: form.rent_start_epoch_ms.and_then(from_epoch_ms),
        rent_amount: form.rent_amount,
        last_rent_increase_date: None,
        next_rent_increase_date: form.next_rent_increase_epoch_ms.and_then(from_epoch_ms),
        expected_rent_increase_rate: form.expected_rent_increase_rate,
        tenant_name: form.tenant_name,
        tenant_phone: form.tenant_phone,
        occupancy_status: parse_occupancy_status(&form.occupancy_status),
        photos: form.photos,
        notes: form.notes,
    }
}

fn patch_from_form(form: UnitForm) -> UnitPatch {
    UnitPatch {
        name: Some(form.name),
        address: Some(form.address),
        water_account: Some(form.water_account),
        electricity_account: Some(form.electricity_account),
        gas_account: Some(form.gas_account),
        insurance_policy: Some(form.insurance_policy),
        deposit_status: Some(parse_deposit_status(&form.deposit_status)),
        deposit_amount: Some(form.deposit_amount),
        rent_start_date: form.rent_start_epoch_ms.and_then(from_epoch_ms),
        rent_amount: Some(form.rent_amount),
        last_rent_increase_date: None,
        next_rent_increase_date: Some(form.next_rent_increase_epoch_ms.and_then(from_epoch_ms)),
        expected_rent_increase_rate: Some(form.expected_rent_increase_rate),
        tenant_name: Some(form.tenant_name),
        tenant_phone: Some(form.tenant_phone),
        occupancy_status: Some(parse_occupancy_status(&form.occupancy_status)),
        photos: Some(form.photos),
        notes: Some(form.notes),
    }
}

fn parse_deposit_status(raw: &str) -> DepositStatus {
    match raw.trim().to_ascii_lowercase().as_str() {
        "present" => DepositStatus::Present,
        "absent" => DepositStatus::Absent,
        _ => DepositStatus::Unknown,
    }
}

fn parse_occupancy_status(raw: &str) -> OccupancyStatus {
    match raw.trim().to_ascii_lowercase().as_str() {
        "occupied" => OccupancyStatus::Occupied,
        _ => OccupancyStatus::Vacant,
    }
}

fn deposit_status_label(status: DepositStatus) -> &'static str {
    match status {
        DepositStatus::Present => "present",
        DepositStatus::Absent => "absent",
        DepositStatus::Unknown => "unknown",
    }
}

fn occupancy_status_label(status: OccupancyStatus) -> &'static str {
    match status {
        OccupancyStatus::Occupied => "occupied",
        OccupancyStatus::Vacant => "vacant",
    }
}

fn from_epoch_ms(value: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(value)
}

fn unit_item(unit: &Unit) -> UnitItem {
    UnitItem {
        id: unit.id.clone(),
        name: unit.name.clone(),
        address: unit.address.clone(),
        water_account: unit.water_account.clone(),
        electricity_account: unit.electricity_account.clone(),
        gas_account: unit.gas_account.clone(),
        insurance_policy: unit.insurance_policy.clone(),
        deposit_status: deposit_status_label(unit.deposit_status).to_string(),
        deposit_amount: unit.deposit_amount,
        rent_start_epoch_ms: unit.rent_start_date.timestamp_millis(),
        rent_amount: unit.rent_amount,
        last_rent_increase_epoch_ms: unit.last_rent_increase_date.map(|d| d.timestamp_millis()),
        next_rent_increase_epoch_ms: unit.next_rent_increase_date.map(|d| d.timestamp_millis()),
        expected_rent_increase_rate: unit.expected_rent_increase_rate,
        tenant_name: unit.tenant_name.clone(),
        tenant_phone: unit.tenant_phone.clone(),
        occupancy_status: occupancy_status_label(unit.occupancy_status).to_string(),
        photos: unit.photos.clone(),
        notes: unit.notes.clone(),
        created_epoch_ms: unit.created_at.timestamp_millis(),
        updated_epoch_ms: unit.updated_at.timestamp_millis(),
    }
}

fn increase_item(event: &RentIncreaseEvent) -> RentIncreaseItem {
    RentIncreaseItem {
        id: event.id.clone(),
        unit_id: event.unit_id.clone(),
        old_amount: event.old_amount,
        new_amount: event.new_amount,
        increase_rate_percent: event.increase_rate_percent,
        increase_epoch_ms: event.increase_date.timestamp_millis(),
        justification: event.justification.clone(),
    }
}

fn bucket_item(bucket: IncomeBucket) -> IncomeBucketItem {
    IncomeBucketItem {
        label: bucket.label,
        income: bucket.income,
        is_current: bucket.is_current,
    }
}

#[cfg(test)]
mod tests {
    use super::{core_version, default_log_level, init_logging, ping, RentbookSession, UnitForm};
    use tempfile::TempDir;

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_unsupported_level() {
        let error = init_logging("verbose".to_string(), "/tmp/rentbook-logs".to_string());
        assert!(!error.is_empty());
    }

    #[test]
    fn default_log_level_is_accepted_by_init_logging() {
        let level = default_log_level();
        assert!(matches!(level.as_str(), "debug" | "info"));

        let log_dir = std::env::temp_dir().join(format!("rentbook-ffi-logs-{}", std::process::id()));
        let error = init_logging(level, log_dir.to_string_lossy().into_owned());
        assert!(error.is_empty(), "{error}");
    }

    #[test]
    fn open_rejects_blank_path() {
        assert!(RentbookSession::open("  ".to_string()).is_err());
    }

    #[test]
    fn unit_lifecycle_round_trips_through_envelopes() {
        let (_dir, session) = open_session();

        let added = session.add_unit(occupied_form("Flat 1", 1000.0));
        assert!(added.ok, "{}", added.message);
        let unit_id = added.record_id.expect("unit id");

        let mut edited = occupied_form("Flat 1A", 1000.0);
        edited.tenant_name = Some("   ".to_string());
        let updated = session.update_unit(unit_id.clone(), edited);
        assert!(updated.ok, "{}", updated.message);

        let lookup = session.get_unit(unit_id.clone());
        let unit = lookup.unit.expect("unit present");
        assert_eq!(unit.name, "Flat 1A");
        assert_eq!(unit.occupancy_status, "occupied");
        assert_eq!(unit.tenant_name, None);

        let deleted = session.delete_unit(unit_id.clone());
        assert!(deleted.ok);
        let missing = session.get_unit(unit_id);
        assert!(!missing.ok);
        assert_eq!(missing.message, "Unit not found.");
        assert!(session.list_units().items.is_empty());
    }

    #[test]
    fn blank_name_is_reported_as_short_notice() {
        let (_dir, session) = open_session();
        let response = session.add_unit(occupied_form("  ", 500.0));
        assert!(!response.ok);
        assert!(response.record_id.is_none());
        assert!(response.message.starts_with("Invalid input"));
    }

    #[test]
    fn rent_increase_updates_history_and_dashboard() {
        let (_dir, session) = open_session();
        let unit_id = session
            .add_unit(occupied_form("Flat 2", 1000.0))
            .record_id
            .expect("unit id");

        let increase =
            session.record_rent_increase(unit_id.clone(), 1000.0, 1100.0, Some(" ".to_string()));
        assert!(increase.ok, "{}", increase.message);

        let history = session.increase_history_for(unit_id.clone());
        assert_eq!(history.items.len(), 1);
        assert!((history.items[0].increase_rate_percent - 10.0).abs() < 1e-9);
        assert_eq!(history.items[0].justification, None);

        let rejected = session.record_rent_increase(unit_id, 1100.0, 1000.0, None);
        assert!(!rejected.ok);

        let stats = session.dashboard_stats();
        assert_eq!(stats.total_units, 1);
        assert_eq!(stats.occupied_units, 1);
        assert!((stats.occupancy_rate_percent - 100.0).abs() < 1e-9);
        assert!((stats.monthly_income - 1100.0).abs() < 1e-9);
        assert!((stats.deposits_held - 2000.0).abs() < 1e-9);
        assert_eq!(stats.top_rents.len(), 1);
    }

    #[test]
    fn income_series_validates_period() {
        let (_dir, session) = open_session();
        session.add_unit(occupied_form("Flat 3", 800.0));

        let monthly = session.income_series("Monthly".to_string());
        assert!(monthly.ok);
        assert_eq!(monthly.buckets.len(), 12);
        let current = monthly.buckets.last().expect("current bucket");
        assert!(current.is_current);
        assert!((current.income - 800.0).abs() < 1e-9);

        let yearly = session.income_series("yearly".to_string());
        assert_eq!(yearly.buckets.len(), 5);

        let weekly = session.income_series("weekly".to_string());
        assert!(!weekly.ok);
        assert!(weekly.buckets.is_empty());
    }

    #[test]
    fn backup_restores_into_fresh_database() {
        let (_dir, source) = open_session();
        source.add_unit(occupied_form("Flat 4", 900.0));
        let exported = source.create_backup();
        assert!(exported.ok);
        assert!(source.last_backup_timestamp().is_some());
        let text = exported.backup_text.expect("backup text");

        let (_other_dir, target) = open_session();
        let bad = target.restore_backup("not a backup".to_string());
        assert!(!bad.ok);
        assert_eq!(bad.message, "This is not a valid backup file.");

        let restored = target.restore_backup(text);
        assert!(restored.ok, "{}", restored.message);
        let names: Vec<String> = target
            .list_units()
            .items
            .into_iter()
            .map(|unit| unit.name)
            .collect();
        assert_eq!(names, vec!["Flat 4".to_string()]);
    }

    #[test]
    fn reopened_session_sees_saved_units() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("rentbook.sqlite3");
        let path = path.to_str().expect("utf-8 path").to_string();

        let first = RentbookSession::open(path.clone()).expect("open first");
        let unit_id = first
            .add_unit(occupied_form("Flat 5", 700.0))
            .record_id
            .expect("unit id");
        first.add_photo(unit_id.clone(), "file:///a.jpg".to_string());
        drop(first);

        let second = RentbookSession::open(path).expect("open second");
        let unit = second.get_unit(unit_id).unit.expect("persisted unit");
        assert_eq!(unit.photos, vec!["file:///a.jpg".to_string()]);
        assert!(second.last_backup_timestamp().is_some());
    }

    fn open_session() -> (TempDir, RentbookSession) {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("rentbook.sqlite3");
        let session = RentbookSession::open(path.to_string_lossy().into_owned()).expect("open");
        (dir, session)
    }

    fn occupied_form(name: &str, rent: f64) -> UnitForm {
        UnitForm {
            name: name.to_string(),
            address: "1 Main St".to_string(),
            deposit_status: "present".to_string(),
            deposit_amount: Some(rent * 2.0),
            rent_amount: Some(rent),
            tenant_name: Some("Tenant".to_string()),
            occupancy_status: "occupied".to_string(),
            ..UnitForm::default()
        }
    }
}
