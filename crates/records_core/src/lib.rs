//! Vinyl record catalog store.
//! Addressable CRUD over SQLite with change notification.

pub mod address;
pub mod config;
pub mod contract;
pub mod db;
pub mod logging;
pub mod model;
pub mod notify;
pub mod service;
pub mod store;

pub use address::{Address, AddressKind, AddressLike, AddressMatcher, AddressPatternError};
pub use config::{load_config, ConfigError, StoreConfig};
pub use contract::{Column, RecordId, DEFAULT_AUTHORITY};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::record::{Record, RecordValidationError, RecordValues};
pub use notify::{ChangeNotifier, ChangeObserver, SubscriptionHandle};
pub use service::record_service::{
    DeleteOutcome, FormError, RecordForm, RecordService, RecordSummary, SaveOutcome,
};
pub use store::{
    RecordQuery, RecordStore, RowSet, RowView, Selection, SqliteRecordStore, StoreError,
    StoreResult,
};

/// Minimal health-check API for host wiring.
pub fn ping() -> &'static str {
    "pong"
}

pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
