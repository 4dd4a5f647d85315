//! Catalog domain model.
//!
//! # Responsibility
//! - Define the persisted `Record` shape and the `RecordValues` write payload.
//! - Own field-level validation shared by insert and update paths.
//!
//! # Invariants
//! - Every record is identified by a store-assigned `RecordId`.
//! - `quantity` and `price` are never negative.

pub mod record;
