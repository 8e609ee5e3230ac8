//! Storage layer: key-value contract and record collection persistence.
//!
//! # Responsibility
//! - Define the durable key-value contract the record store writes through.
//! - Map record collections to and from their stored text form.
//!
//! # Invariants
//! - Every stored value is a complete JSON document.
//! - Load paths degrade to empty collections instead of failing.

pub mod kv_repo;
pub mod record_repo;
