//! Use-case services over the record store.
//!
//! # Responsibility
//! - Turn editor/list use-cases into store calls.
//! - Keep UI layers decoupled from addresses, payloads and SQL.

pub mod record_service;
