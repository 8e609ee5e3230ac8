//! Rental unit domain model.
//!
//! # Responsibility
//! - Define the canonical unit record persisted and exported by core.
//! - Provide creation input (`NewUnit`) and partial update (`UnitPatch`)
//!   shapes, plus the validation run before any write.
//!
//! # Invariants
//! - `id` is stable and never reused for another unit.
//! - `name` and `address` are non-empty after trimming.
//! - `created_at` never changes after creation.
//! - `photos` order is display order.
//!
//! # See also
//! - model::rent_increase for the events that reference units.

use crate::model::timestamp::{self, now_utc, to_millis};
use crate::model::{or_default, record_id, RecordId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Whether a security deposit was taken for the current lease.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepositStatus {
    /// Deposit held; `deposit_amount` may carry the value.
    Present,
    /// No deposit held.
    Absent,
    /// Not recorded, or a value this build does not know.
    #[default]
    #[serde(other)]
    Unknown,
}

/// Occupancy state used by every income view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OccupancyStatus {
    Occupied,
    /// Also the reading of any unrecognized stored value.
    #[default]
    #[serde(other)]
    Vacant,
}

/// Canonical rental unit record.
///
/// Field names serialize in camelCase; unknown fields are ignored and
/// missing or unreadable fields are defaulted on decode. Only a record
/// without a usable `id` fails to decode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Unit {
    #[serde(deserialize_with = "record_id")]
    pub id: RecordId,
    #[serde(default, deserialize_with = "or_default")]
    pub name: String,
    #[serde(default, deserialize_with = "or_default")]
    pub address: String,
    #[serde(default, deserialize_with = "or_default")]
    pub water_account: String,
    #[serde(default, deserialize_with = "or_default")]
    pub electricity_account: String,
    #[serde(default, deserialize_with = "or_default")]
    pub gas_account: String,
    #[serde(default, deserialize_with = "or_default")]
    pub insurance_policy: String,
    #[serde(default, deserialize_with = "or_default")]
    pub deposit_status: DepositStatus,
    /// Meaningful only when `deposit_status == DepositStatus::Present`.
    #[serde(
        default,
        deserialize_with = "or_default",
        skip_serializing_if = "Option::is_none"
    )]
    pub deposit_amount: Option<f64>,
    #[serde(default = "now_utc", with = "timestamp::or_now")]
    pub rent_start_date: DateTime<Utc>,
    /// Presence means a rent is currently agreed.
    #[serde(
        default,
        deserialize_with = "or_default",
        skip_serializing_if = "Option::is_none"
    )]
    pub rent_amount: Option<f64>,
    #[serde(
        default,
        with = "timestamp::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_rent_increase_date: Option<DateTime<Utc>>,
    #[serde(
        default,
        with = "timestamp::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub next_rent_increase_date: Option<DateTime<Utc>>,
    #[serde(
        default,
        deserialize_with = "or_default",
        skip_serializing_if = "Option::is_none"
    )]
    pub expected_rent_increase_rate: Option<f64>,
    #[serde(
        default,
        deserialize_with = "non_blank_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub tenant_name: Option<String>,
    #[serde(
        default,
        deserialize_with = "non_blank_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub tenant_phone: Option<String>,
    #[serde(default, deserialize_with = "or_default")]
    pub occupancy_status: OccupancyStatus,
    #[serde(default, deserialize_with = "or_default")]
    pub photos: Vec<String>,
    #[serde(
        default,
        deserialize_with = "or_default",
        skip_serializing_if = "Option::is_none"
    )]
    pub notes: Option<String>,
    #[serde(default = "now_utc", with = "timestamp::or_now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "now_utc", with = "timestamp::or_now")]
    pub updated_at: DateTime<Utc>,
}

impl Unit {
    /// Builds a unit from creation input with a fresh random id.
    ///
    /// `created_at == updated_at == now`; `rent_start_date` falls back to
    /// `now` when the input leaves it unset. Does not validate.
    pub fn from_new(input: NewUnit, now: DateTime<Utc>) -> Self {
        let now = to_millis(now);
        Self {
            id: Uuid::new_v4().to_string(),
            name: input.name,
            address: input.address,
            water_account: input.water_account,
            electricity_account: input.electricity_account,
            gas_account: input.gas_account,
            insurance_policy: input.insurance_policy,
            deposit_status: input.deposit_status,
            deposit_amount: input.deposit_amount,
            rent_start_date: input.rent_start_date.map(to_millis).unwrap_or(now),
            rent_amount: input.rent_amount,
            last_rent_increase_date: input.last_rent_increase_date.map(to_millis),
            next_rent_increase_date: input.next_rent_increase_date.map(to_millis),
            expected_rent_increase_rate: input.expected_rent_increase_rate,
            tenant_name: normalize_text(input.tenant_name),
            tenant_phone: normalize_text(input.tenant_phone),
            occupancy_status: input.occupancy_status,
            photos: input.photos,
            notes: input.notes,
            created_at: now,
            updated_at: now,
        }
    }

    /// Validates write-path invariants.
    ///
    /// # Errors
    /// - `BlankName` / `BlankAddress` for empty or whitespace-only text.
    /// - `InvalidAmount` for a non-positive deposit or a negative rent.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::BlankName);
        }
        if self.address.trim().is_empty() {
            return Err(ValidationError::BlankAddress);
        }
        if let Some(amount) = self.deposit_amount {
            if !amount.is_finite() || amount <= 0.0 {
                return Err(ValidationError::InvalidAmount {
                    field: "deposit_amount",
                    value: amount,
                });
            }
        }
        if let Some(amount) = self.rent_amount {
            if !amount.is_finite() || amount < 0.0 {
                return Err(ValidationError::InvalidAmount {
                    field: "rent_amount",
                    value: amount,
                });
            }
        }
        Ok(())
    }

    /// Applies a partial update in place and refreshes `updated_at`.
    ///
    /// `updated_at` never moves backwards, even if the wall clock does.
    pub fn apply_patch(&mut self, patch: UnitPatch, now: DateTime<Utc>) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(address) = patch.address {
            self.address = address;
        }
        if let Some(value) = patch.water_account {
            self.water_account = value;
        }
        if let Some(value) = patch.electricity_account {
            self.electricity_account = value;
        }
        if let Some(value) = patch.gas_account {
            self.gas_account = value;
        }
        if let Some(value) = patch.insurance_policy {
            self.insurance_policy = value;
        }
        if let Some(status) = patch.deposit_status {
            self.deposit_status = status;
        }
        if let Some(amount) = patch.deposit_amount {
            self.deposit_amount = amount;
        }
        if let Some(date) = patch.rent_start_date {
            self.rent_start_date = to_millis(date);
        }
        if let Some(amount) = patch.rent_amount {
            self.rent_amount = amount;
        }
        if let Some(date) = patch.last_rent_increase_date {
            self.last_rent_increase_date = date.map(to_millis);
        }
        if let Some(date) = patch.next_rent_increase_date {
            self.next_rent_increase_date = date.map(to_millis);
        }
        if let Some(rate) = patch.expected_rent_increase_rate {
            self.expected_rent_increase_rate = rate;
        }
        if let Some(name) = patch.tenant_name {
            self.tenant_name = normalize_text(name);
        }
        if let Some(phone) = patch.tenant_phone {
            self.tenant_phone = normalize_text(phone);
        }
        if let Some(status) = patch.occupancy_status {
            self.occupancy_status = status;
        }
        if let Some(photos) = patch.photos {
            self.photos = photos;
        }
        if let Some(notes) = patch.notes {
            self.notes = notes;
        }
        self.touch(now);
    }

    /// Refreshes `updated_at` without letting it move backwards.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = to_millis(now).max(self.updated_at);
    }

    pub fn is_occupied(&self) -> bool {
        self.occupancy_status == OccupancyStatus::Occupied
    }

    /// Deposit amount, only when a deposit is actually held.
    pub fn held_deposit(&self) -> Option<f64> {
        match self.deposit_status {
            DepositStatus::Present => self.deposit_amount,
            DepositStatus::Absent | DepositStatus::Unknown => None,
        }
    }
}

/// Creation input for a unit (the add-form payload).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewUnit {
    pub name: String,
    pub address: String,
    pub water_account: String,
    pub electricity_account: String,
    pub gas_account: String,
    pub insurance_policy: String,
    pub deposit_status: DepositStatus,
    pub deposit_amount: Option<f64>,
    /// Defaults to creation time when unset.
    pub rent_start_date: Option<DateTime<Utc>>,
    pub rent_amount: Option<f64>,
    pub last_rent_increase_date: Option<DateTime<Utc>>,
    pub next_rent_increase_date: Option<DateTime<Utc>>,
    pub expected_rent_increase_rate: Option<f64>,
    pub tenant_name: Option<String>,
    pub tenant_phone: Option<String>,
    pub occupancy_status: OccupancyStatus,
    pub photos: Vec<String>,
    pub notes: Option<String>,
}

impl NewUnit {
    /// Creation input with the two required fields and defaults elsewhere.
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
            ..Self::default()
        }
    }
}

/// Partial update for a unit.
///
/// Outer `None` leaves a field untouched. For optional fields the inner
/// `Option` is the new value, so `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UnitPatch {
    pub name: Option<String>,
    pub address: Option<String>,
    pub water_account: Option<String>,
    pub electricity_account: Option<String>,
    pub gas_account: Option<String>,
    pub insurance_policy: Option<String>,
    pub deposit_status: Option<DepositStatus>,
    pub deposit_amount: Option<Option<f64>>,
    pub rent_start_date: Option<DateTime<Utc>>,
    pub rent_amount: Option<Option<f64>>,
    pub last_rent_increase_date: Option<Option<DateTime<Utc>>>,
    pub next_rent_increase_date: Option<Option<DateTime<Utc>>>,
    pub expected_rent_increase_rate: Option<Option<f64>>,
    pub tenant_name: Option<Option<String>>,
    pub tenant_phone: Option<Option<String>>,
    pub occupancy_status: Option<OccupancyStatus>,
    pub photos: Option<Vec<String>>,
    pub notes: Option<Option<String>>,
}

/// Write-path validation failure for units and rent increases.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    BlankName,
    BlankAddress,
    InvalidAmount { field: &'static str, value: f64 },
    /// Rent increase references a unit that does not exist.
    UnknownUnit(RecordId),
    /// Rent increase on a unit without a current rent to compare against.
    NoCurrentRent(RecordId),
    /// `new_amount` is not strictly greater than `old_amount`.
    NotAnIncrease { old_amount: f64, new_amount: f64 },
    PhotoIndexOutOfRange { index: usize, len: usize },
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankName => write!(f, "unit name must not be empty"),
            Self::BlankAddress => write!(f, "unit address must not be empty"),
            Self::InvalidAmount { field, value } => write!(f, "invalid {field}: {value}"),
            Self::UnknownUnit(id) => write!(f, "rent increase references unknown unit {id}"),
            Self::NoCurrentRent(id) => write!(f, "unit {id} has no current rent amount"),
            Self::NotAnIncrease {
                old_amount,
                new_amount,
            } => write!(
                f,
                "new rent {new_amount} must be greater than old rent {old_amount}"
            ),
            Self::PhotoIndexOutOfRange { index, len } => {
                write!(f, "photo index {index} out of range for {len} photo(s)")
            }
        }
    }
}

impl Error for ValidationError {}

fn normalize_text(value: Option<String>) -> Option<String> {
    value.filter(|text| !text.trim().is_empty())
}

fn non_blank_text<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    Ok(normalize_text(or_default(deserializer)?))
}
