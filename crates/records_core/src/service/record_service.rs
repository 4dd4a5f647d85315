//! Record editor and list use-cases.
//!
//! # Responsibility
//! - Convert raw editor form input into validated store writes.
//! - Provide the list projection used by catalog views.
//!
//! # Invariants
//! - A blank form for a new record never reaches the store.
//! - Existing records are only ever written through their item address.

use crate::address::Address;
use crate::contract::Column;
use crate::model::record::{Record, RecordValues};
use crate::store::{RecordQuery, RecordStore, Selection, StoreError, StoreResult};
use log::info;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Raw editor input. Numbers arrive as typed text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordForm {
    pub album_name: String,
    pub band_name: String,
    pub quantity: String,
    pub price: String,
    /// Path/URI handed over by the image picker, if one was chosen.
    pub cover: Option<String>,
    pub supplier_name: String,
    pub supplier_email: String,
}

impl RecordForm {
    /// Pre-fills a form from a stored record (edit flow).
    pub fn from_record(record: &Record) -> Self {
        Self {
            album_name: record.album_name.clone(),
            band_name: record.band_name.clone(),
            quantity: record.quantity.to_string(),
            price: record.price.to_string(),
            cover: Some(record.cover.clone()),
            supplier_name: record.supplier_name.clone(),
            supplier_email: record.supplier_email.clone(),
        }
    }

    /// True when every field is blank and no cover was picked.
    pub fn is_blank(&self) -> bool {
        [
            &self.album_name,
            &self.band_name,
            &self.quantity,
            &self.price,
            &self.supplier_name,
            &self.supplier_email,
        ]
        .iter()
        .all(|value| value.trim().is_empty())
            && self
                .cover
                .as_deref()
                .map_or(true, |cover| cover.trim().is_empty())
    }

    /// Builds the full write payload. Blank numbers default to 0.
    pub fn to_values(&self) -> Result<RecordValues, FormError> {
        Ok(RecordValues {
            album_name: Some(self.album_name.trim().to_string()),
            band_name: Some(self.band_name.trim().to_string()),
            quantity: Some(parse_number(&self.quantity, Column::Quantity)?),
            price: Some(parse_number(&self.price, Column::Price)?),
            cover: self.cover.clone(),
            supplier_name: Some(self.supplier_name.trim().to_string()),
            supplier_email: Some(self.supplier_email.trim().to_string()),
        })
    }
}

/// Result of an editor save.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// New-record form was blank; nothing was written.
    Skipped,
    Inserted(Address),
    Updated(usize),
    /// Existing record no longer matched any row.
    NotUpdated,
}

impl SaveOutcome {
    /// Short user-facing message for transient UI feedback.
    pub fn message(&self) -> &'static str {
        match self {
            Self::Skipped => "Nothing to save",
            Self::Inserted(_) => "Record saved",
            Self::Updated(_) => "Record updated",
            Self::NotUpdated => "Error with updating record",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    NotDeleted,
}

impl DeleteOutcome {
    pub fn message(&self) -> &'static str {
        match self {
            Self::Deleted => "Record deleted",
            Self::NotDeleted => "Error with deleting record",
        }
    }
}

/// Editor save failure.
#[derive(Debug)]
pub enum FormError {
    InvalidNumber { column: Column, input: String },
    Store(StoreError),
}

impl FormError {
    /// Short user-facing message for transient UI feedback.
    pub fn message(&self) -> &'static str {
        match self {
            Self::InvalidNumber { .. } => "Please enter a whole number",
            Self::Store(StoreError::Validation(_)) => "Please fill in every field",
            Self::Store(_) => "Error with saving record",
        }
    }
}

impl Display for FormError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidNumber { column, input } => {
                write!(f, "`{column}` expects a whole number, got `{input}`")
            }
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for FormError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidNumber { .. } => None,
            Self::Store(err) => Some(err),
        }
    }
}

impl From<StoreError> for FormError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// List row projection shown by catalog views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordSummary {
    pub address: Address,
    pub album_name: String,
    pub band_name: String,
    pub quantity: i64,
}

const SUMMARY_COLUMNS: [Column; 4] = [
    Column::Id,
    Column::AlbumName,
    Column::BandName,
    Column::Quantity,
];

/// Editor/list use-case service over any `RecordStore`.
pub struct RecordService<S: RecordStore> {
    store: S,
}

impl<S: RecordStore> RecordService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Saves editor input as a new record (`current = None`) or onto an
    /// existing one.
    ///
    /// # Contract
    /// - Blank new-record forms return `Skipped` without a store call.
    /// - `current` must be an item address; collection-wide saves are refused.
    /// - Store validation errors pass through unchanged inside `FormError::Store`.
    pub fn save(
        &self,
        current: Option<Address>,
        form: &RecordForm,
    ) -> Result<SaveOutcome, FormError> {
        if current.is_none() && form.is_blank() {
            info!("event=record_save module=service status=skipped reason=blank_form");
            return Ok(SaveOutcome::Skipped);
        }

        let values = form.to_values()?;
        let outcome = match current {
            None => SaveOutcome::Inserted(self.store.insert(Address::Collection, &values)?),
            Some(address @ Address::Item(_)) => {
                match self.store.update(address, &values, &Selection::all())? {
                    0 => SaveOutcome::NotUpdated,
                    rows => SaveOutcome::Updated(rows),
                }
            }
            Some(address @ Address::Collection) => {
                return Err(StoreError::UnsupportedOperation {
                    operation: "save",
                    address,
                }
                .into());
            }
        };

        info!("event=record_save module=service status=ok outcome={outcome:?}");
        Ok(outcome)
    }

    /// Loads one record for editing.
    pub fn load(&self, address: Address) -> StoreResult<Option<Record>> {
        let rows = self.store.query(address, &RecordQuery::all())?;
        rows.records().map(|records| records.into_iter().next())
    }

    /// Deletes one record (or, for the collection address, every record).
    pub fn delete(&self, address: Address) -> StoreResult<DeleteOutcome> {
        let deleted = self.store.delete(address, &Selection::all())?;
        info!("event=record_delete module=service status=ok address={address} rows={deleted}");
        Ok(if deleted > 0 {
            DeleteOutcome::Deleted
        } else {
            DeleteOutcome::NotDeleted
        })
    }

    /// Lists catalog rows for list views, oldest first.
    pub fn list_summaries(&self) -> StoreResult<Vec<RecordSummary>> {
        let query = RecordQuery::all()
            .with_columns(SUMMARY_COLUMNS)
            .with_order(format!("{} ASC", Column::Id.as_str()));
        let rows = self.store.query(Address::Collection, &query)?;

        rows.rows()
            .map(|row| {
                let id = row.get_i64(Column::Id);
                let album_name = row.get_str(Column::AlbumName);
                let band_name = row.get_str(Column::BandName);
                let quantity = row.get_i64(Column::Quantity);
                match (id, album_name, band_name, quantity) {
                    (Some(id), Some(album_name), Some(band_name), Some(quantity)) => {
                        Ok(RecordSummary {
                            address: Address::Item(id),
                            album_name: album_name.to_string(),
                            band_name: band_name.to_string(),
                            quantity,
                        })
                    }
                    _ => Err(StoreError::InvalidData(
                        "record summary row has NULL or mistyped columns".to_string(),
                    )),
                }
            })
            .collect()
    }
}

fn parse_number(input: &str, column: Column) -> Result<i64, FormError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(0);
    }
    trimmed
        .parse::<i64>()
        .map_err(|_| FormError::InvalidNumber {
            column,
            input: trimmed.to_string(),
        })
}
