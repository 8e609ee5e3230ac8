//! Aggregates computed on demand from the current records.
//!
//! # Responsibility
//! - Occupancy counts and rate.
//! - Current rent income and per-period income history.
//! - Highest rents and per-unit increase history.
//!
//! # Invariants
//! - Every function is pure; nothing is cached between calls.
//! - Only occupied units contribute income, whatever their stored rent.
//! - Calendar periods are evaluated in UTC.

use crate::model::rent_increase::RentIncreaseEvent;
use crate::model::unit::Unit;
use chrono::{DateTime, Datelike, Utc};

/// Number of monthly buckets in a monthly income series.
pub const MONTHLY_PERIODS: u32 = 12;
/// Number of yearly buckets in a yearly income series.
pub const YEARLY_PERIODS: u32 = 5;

/// Occupancy counts over all units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OccupancyStats {
    pub total: usize,
    pub occupied: usize,
    pub vacant: usize,
    /// `occupied / total`, `0.0` when there are no units.
    pub rate: f64,
}

impl OccupancyStats {
    pub fn rate_percent(&self) -> f64 {
        self.rate * 100.0
    }
}

/// Granularity of an income series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncomePeriod {
    /// Trailing 12 calendar months, rent counted once per month.
    Monthly,
    /// Trailing 5 calendar years, rent counted twelve times per year.
    Yearly,
}

/// One period of an income series.
#[derive(Debug, Clone, PartialEq)]
pub struct IncomeBucket {
    /// `YYYY-MM` for monthly buckets, `YYYY` for yearly ones.
    pub label: String,
    pub year: i32,
    /// Calendar month `1..=12`; `None` for yearly buckets.
    pub month: Option<u32>,
    pub income: f64,
    /// Bucket containing `now`.
    pub is_current: bool,
}

pub fn occupancy(units: &[Unit]) -> OccupancyStats {
    let total = units.len();
    let occupied = units.iter().filter(|unit| unit.is_occupied()).count();
    let rate = if total == 0 {
        0.0
    } else {
        occupied as f64 / total as f64
    };
    OccupancyStats {
        total,
        occupied,
        vacant: total - occupied,
        rate,
    }
}

/// Current monthly rent income: sum of rents over occupied units.
pub fn monthly_income(units: &[Unit]) -> f64 {
    units.iter().filter_map(earning_rent).sum()
}

/// Income per period, oldest bucket first.
///
/// A unit counts toward a bucket only when its lease had started by then:
/// its `rent_start_date` month (monthly) or year (yearly) is at or before
/// the bucket's.
pub fn income_series(units: &[Unit], period: IncomePeriod, now: DateTime<Utc>) -> Vec<IncomeBucket> {
    match period {
        IncomePeriod::Monthly => (0..MONTHLY_PERIODS)
            .rev()
            .map(|back| {
                let (year, month) = months_before(now, back);
                let income = units
                    .iter()
                    .filter(|unit| started_by(unit, year, Some(month)))
                    .filter_map(earning_rent)
                    .sum();
                IncomeBucket {
                    label: format!("{year:04}-{month:02}"),
                    year,
                    month: Some(month),
                    income,
                    is_current: back == 0,
                }
            })
            .collect(),
        IncomePeriod::Yearly => (0..YEARLY_PERIODS)
            .rev()
            .map(|back| {
                let year = now.year() - back as i32;
                let income = units
                    .iter()
                    .filter(|unit| started_by(unit, year, None))
                    .filter_map(earning_rent)
                    .map(|rent| rent * 12.0)
                    .sum();
                IncomeBucket {
                    label: format!("{year:04}"),
                    year,
                    month: None,
                    income,
                    is_current: back == 0,
                }
            })
            .collect(),
    }
}

/// Up to `limit` occupied units with a positive rent, highest rent first.
///
/// Equal rents keep their collection order.
pub fn top_rents(units: &[Unit], limit: usize) -> Vec<&Unit> {
    let mut ranked: Vec<(&Unit, f64)> = units
        .iter()
        .filter_map(|unit| earning_rent(unit).map(|rent| (unit, rent)))
        .filter(|(_, rent)| *rent > 0.0)
        .collect();
    ranked.sort_by(|left, right| right.1.total_cmp(&left.1));
    ranked.into_iter().take(limit).map(|(unit, _)| unit).collect()
}

/// Events for `unit_id`, newest `increase_date` first.
///
/// Equal dates keep insertion order.
pub fn increase_history<'a>(
    events: &'a [RentIncreaseEvent],
    unit_id: &str,
) -> Vec<&'a RentIncreaseEvent> {
    let mut history: Vec<&RentIncreaseEvent> = events
        .iter()
        .filter(|event| event.unit_id == unit_id)
        .collect();
    history.sort_by(|left, right| right.increase_date.cmp(&left.increase_date));
    history
}

fn earning_rent(unit: &Unit) -> Option<f64> {
    if unit.is_occupied() {
        unit.rent_amount
    } else {
        None
    }
}

fn started_by(unit: &Unit, year: i32, month: Option<u32>) -> bool {
    let start = unit.rent_start_date;
    match month {
        Some(month) => (start.year(), start.month()) <= (year, month),
        None => start.year() <= year,
    }
}

fn months_before(now: DateTime<Utc>, back: u32) -> (i32, u32) {
    let index = now.year() * 12 + now.month0() as i32 - back as i32;
    (index.div_euclid(12), index.rem_euclid(12) as u32 + 1)
}
