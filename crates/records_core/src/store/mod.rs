//! Record store: the addressable, validated CRUD boundary.
//!
//! # Responsibility
//! - Define the store contract (`RecordStore`) callers program against.
//! - Keep SQL and connection handling inside the persistence boundary.
//!
//! # Invariants
//! - Every call resolves its address exactly once.
//! - Writes validate before touching SQLite; rejected payloads write nothing.
//! - Change notifications fire only after a write affected at least one row.

mod error;
mod record_store;
mod row_set;

pub use error::{StoreError, StoreResult};
pub use record_store::{RecordStore, SqliteRecordStore};
pub use row_set::{RecordQuery, RowSet, RowView, Selection};
