//! Record store error contract.

use crate::address::Address;
use crate::db::DbError;
use crate::model::record::RecordValidationError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type StoreResult<T> = Result<T, StoreError>;

/// Errors returned synchronously by record store operations.
///
/// The store never retries; every variant is reported to the immediate caller.
#[derive(Debug)]
pub enum StoreError {
    /// Address matches no registered pattern.
    InvalidAddress(String),
    /// Operation is not defined for the address kind (e.g. insert on an item).
    UnsupportedOperation {
        operation: &'static str,
        address: Address,
    },
    /// Payload rejected before any write was attempted.
    Validation(RecordValidationError),
    /// Engine failed the write; `None` when it reported zero rows written.
    StorageWriteFailed(Option<DbError>),
    StorageReadFailed(DbError),
    /// Persisted or projected row does not fit the record model.
    InvalidData(String),
    /// Open/migration failure.
    Db(DbError),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl StoreError {
    pub(crate) fn read(err: rusqlite::Error) -> Self {
        Self::StorageReadFailed(DbError::Sqlite(err))
    }

    pub(crate) fn write(err: rusqlite::Error) -> Self {
        Self::StorageWriteFailed(Some(DbError::Sqlite(err)))
    }

    /// Stable short code used in log events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidAddress(_) => "invalid_address",
            Self::UnsupportedOperation { .. } => "unsupported_operation",
            Self::Validation(_) => "validation_failed",
            Self::StorageWriteFailed(_) => "storage_write_failed",
            Self::StorageReadFailed(_) => "storage_read_failed",
            Self::InvalidData(_) => "invalid_data",
            Self::Db(_) => "db_error",
            Self::UninitializedConnection { .. } => "uninitialized_connection",
            Self::MissingRequiredTable(_) => "missing_table",
            Self::MissingRequiredColumn { .. } => "missing_column",
        }
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidAddress(uri) => write!(f, "unknown record address `{uri}`"),
            Self::UnsupportedOperation { operation, address } => {
                write!(f, "{operation} is not supported for `{address}`")
            }
            Self::Validation(err) => write!(f, "{err}"),
            Self::StorageWriteFailed(Some(err)) => write!(f, "failed to write record: {err}"),
            Self::StorageWriteFailed(None) => write!(f, "failed to write record: no row written"),
            Self::StorageReadFailed(err) => write!(f, "failed to read records: {err}"),
            Self::InvalidData(message) => write!(f, "invalid record data: {message}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} does not match expected {expected_version}; open it through `open_db`"
            ),
            Self::MissingRequiredTable(table) => write!(f, "missing required table `{table}`"),
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "missing required column `{table}.{column}`")
            }
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::StorageWriteFailed(Some(err)) | Self::StorageReadFailed(err) | Self::Db(err) => {
                Some(err)
            }
            _ => None,
        }
    }
}

impl From<RecordValidationError> for StoreError {
    fn from(value: RecordValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}
