//! Core use-case services.
//!
//! # Responsibility
//! - Own session state and orchestrate persistence and hooks around it.
//! - Keep UI/FFI layers decoupled from storage details.

pub mod record_store;
