//! UI-facing boundary of the rentbook core.

pub mod api;
