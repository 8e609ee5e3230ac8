//! Derived views over the record store.
//!
//! # Responsibility
//! - Expose dashboard aggregates without holding state of their own.
//!
//! # See also
//! - service::record_store for the collections these views read.

pub mod views;

pub use views::{
    income_series, increase_history, monthly_income, occupancy, top_rents, IncomeBucket,
    IncomePeriod, OccupancyStats, MONTHLY_PERIODS, YEARLY_PERIODS,
};
