//! Rent-increase event model.
//!
//! # Responsibility
//! - Define the immutable record written when a unit's rent goes up.
//! - Compute the stored increase rate once, at creation.
//!
//! # Invariants
//! - `new_amount > old_amount` is checked by the creating operation.
//! - `increase_rate_percent` is never recomputed after creation.
//! - `unit_id` is a non-owning reference; the unit may later disappear.

use crate::model::timestamp::{self, now_utc, to_millis};
use crate::model::unit::ValidationError;
use crate::model::{or_default, record_id, RecordId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One recorded rent increase for a unit.
///
/// Decoding needs a usable `id` and `unitId` plus the three amounts; dates
/// and the justification are defaulted when missing or unreadable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RentIncreaseEvent {
    #[serde(deserialize_with = "record_id")]
    pub id: RecordId,
    #[serde(deserialize_with = "record_id")]
    pub unit_id: RecordId,
    pub old_amount: f64,
    pub new_amount: f64,
    /// `(new - old) / old * 100`, frozen at creation.
    pub increase_rate_percent: f64,
    #[serde(default = "now_utc", with = "timestamp::or_now")]
    pub increase_date: DateTime<Utc>,
    #[serde(
        default,
        deserialize_with = "or_default",
        skip_serializing_if = "Option::is_none"
    )]
    pub justification: Option<String>,
    #[serde(default = "now_utc", with = "timestamp::or_now")]
    pub created_at: DateTime<Utc>,
}

impl RentIncreaseEvent {
    /// Creates an event dated `now` after checking the amounts.
    ///
    /// # Errors
    /// - `InvalidAmount` when either amount is non-finite or `old_amount`
    ///   is not positive (the rate would be undefined).
    /// - `NotAnIncrease` when `new_amount <= old_amount`.
    pub fn new(
        unit_id: impl Into<RecordId>,
        old_amount: f64,
        new_amount: f64,
        justification: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        check_increase(old_amount, new_amount)?;
        let now = to_millis(now);
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            unit_id: unit_id.into(),
            old_amount,
            new_amount,
            increase_rate_percent: increase_rate_percent(old_amount, new_amount),
            increase_date: now,
            justification: justification.filter(|text| !text.trim().is_empty()),
            created_at: now,
        })
    }
}

/// Checks that a pair of amounts describes a real increase.
pub fn check_increase(old_amount: f64, new_amount: f64) -> Result<(), ValidationError> {
    if !old_amount.is_finite() || old_amount <= 0.0 {
        return Err(ValidationError::InvalidAmount {
            field: "old_amount",
            value: old_amount,
        });
    }
    if !new_amount.is_finite() {
        return Err(ValidationError::InvalidAmount {
            field: "new_amount",
            value: new_amount,
        });
    }
    if new_amount <= old_amount {
        return Err(ValidationError::NotAnIncrease {
            old_amount,
            new_amount,
        });
    }
    Ok(())
}

/// Percentage increase from `old_amount` to `new_amount`.
pub fn increase_rate_percent(old_amount: f64, new_amount: f64) -> f64 {
    (new_amount - old_amount) / old_amount * 100.0
}

#[cfg(test)]
mod tests {
    use super::{increase_rate_percent, RentIncreaseEvent};
    use crate::model::unit::ValidationError;
    use crate::model::timestamp::now_utc;

    #[test]
    fn rate_is_relative_to_old_amount() {
        assert!((increase_rate_percent(1000.0, 1250.0) - 25.0).abs() < f64::EPSILON);
    }

    #[test]
    fn equal_amounts_are_rejected() {
        let err = RentIncreaseEvent::new("unit", 1000.0, 1000.0, None, now_utc())
            .expect_err("equal amounts are not an increase");
        assert!(matches!(err, ValidationError::NotAnIncrease { .. }));
    }

    #[test]
    fn zero_old_amount_is_rejected() {
        let err = RentIncreaseEvent::new("unit", 0.0, 100.0, None, now_utc())
            .expect_err("rate undefined for zero base");
        assert!(matches!(
            err,
            ValidationError::InvalidAmount {
                field: "old_amount",
                ..
            }
        ));
    }

    #[test]
    fn blank_justification_is_dropped() {
        let event = RentIncreaseEvent::new("unit", 100.0, 110.0, Some(" ".to_string()), now_utc())
            .expect("valid increase");
        assert_eq!(event.justification, None);
        assert_eq!(event.increase_date, event.created_at);
    }

    #[test]
    fn decode_defaults_dates_but_needs_amounts() {
        let event: RentIncreaseEvent = serde_json::from_str(
            r#"{"id":"e1","unitId":1712000000000,"oldAmount":100,"newAmount":110,"increaseRatePercent":10,"increaseDate":"01/02/2023","justification":false}"#,
        )
        .expect("lenient decode");
        assert_eq!(event.unit_id, "1712000000000");
        assert_eq!(event.justification, None);
        assert!(event.increase_date <= now_utc());

        let missing_amount = serde_json::from_str::<RentIncreaseEvent>(
            r#"{"id":"e2","unitId":"u","newAmount":110,"increaseRatePercent":10}"#,
        );
        assert!(missing_amount.is_err());
    }
}
