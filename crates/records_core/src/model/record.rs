//! Record domain model and payload validation.
//!
//! # Responsibility
//! - Define the canonical catalog entry (`Record`).
//! - Define the partial write payload (`RecordValues`) and its checks.
//!
//! # Invariants
//! - Insert validation runs in column order and stops at the first failure.
//! - Update validation only checks fields present in the payload.
//! - Text fields count as blank when they contain only whitespace.

use crate::contract::{Column, RecordId};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// One catalog entry as persisted in `records`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Store-assigned id; immutable and never reused.
    pub id: RecordId,
    pub album_name: String,
    pub band_name: String,
    pub quantity: i64,
    /// Minor currency units.
    pub price: i64,
    /// Cover image path or URI. The image itself is never stored.
    pub cover: String,
    pub supplier_name: String,
    /// Free-form; format is not validated.
    pub supplier_email: String,
}

impl Record {
    /// Full payload carrying every writable field of this record.
    pub fn to_values(&self) -> RecordValues {
        RecordValues {
            album_name: Some(self.album_name.clone()),
            band_name: Some(self.band_name.clone()),
            quantity: Some(self.quantity),
            price: Some(self.price),
            cover: Some(self.cover.clone()),
            supplier_name: Some(self.supplier_name.clone()),
            supplier_email: Some(self.supplier_email.clone()),
        }
    }
}

/// Write payload. `None` marks a field as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordValues {
    pub album_name: Option<String>,
    pub band_name: Option<String>,
    pub quantity: Option<i64>,
    pub price: Option<i64>,
    pub cover: Option<String>,
    pub supplier_name: Option<String>,
    pub supplier_email: Option<String>,
}

impl RecordValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_album_name(mut self, value: impl Into<String>) -> Self {
        self.album_name = Some(value.into());
        self
    }

    pub fn with_band_name(mut self, value: impl Into<String>) -> Self {
        self.band_name = Some(value.into());
        self
    }

    pub fn with_quantity(mut self, value: i64) -> Self {
        self.quantity = Some(value);
        self
    }

    pub fn with_price(mut self, value: i64) -> Self {
        self.price = Some(value);
        self
    }

    pub fn with_cover(mut self, value: impl Into<String>) -> Self {
        self.cover = Some(value.into());
        self
    }

    pub fn with_supplier_name(mut self, value: impl Into<String>) -> Self {
        self.supplier_name = Some(value.into());
        self
    }

    pub fn with_supplier_email(mut self, value: impl Into<String>) -> Self {
        self.supplier_email = Some(value.into());
        self
    }

    /// Number of present fields.
    pub fn len(&self) -> usize {
        self.present_columns().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Columns present in this payload, in table order.
    pub fn present_columns(&self) -> Vec<Column> {
        let mut columns = Vec::with_capacity(7);
        if self.album_name.is_some() {
            columns.push(Column::AlbumName);
        }
        if self.band_name.is_some() {
            columns.push(Column::BandName);
        }
        if self.quantity.is_some() {
            columns.push(Column::Quantity);
        }
        if self.price.is_some() {
            columns.push(Column::Price);
        }
        if self.cover.is_some() {
            columns.push(Column::Cover);
        }
        if self.supplier_name.is_some() {
            columns.push(Column::SupplierName);
        }
        if self.supplier_email.is_some() {
            columns.push(Column::SupplierEmail);
        }
        columns
    }

    /// Validates a payload for insertion.
    ///
    /// Every field except `price` is required; an absent `price` falls back to
    /// the column default of 0.
    pub fn validate_for_insert(&self) -> Result<(), RecordValidationError> {
        if self.is_empty() {
            return Err(RecordValidationError::EmptyPayload);
        }
        require_text(&self.album_name, Column::AlbumName)?;
        require_text(&self.band_name, Column::BandName)?;
        match self.quantity {
            None => return Err(RecordValidationError::MissingField(Column::Quantity)),
            Some(quantity) => check_non_negative(quantity, Column::Quantity)?,
        }
        if let Some(price) = self.price {
            check_non_negative(price, Column::Price)?;
        }
        require_text(&self.cover, Column::Cover)?;
        require_text(&self.supplier_name, Column::SupplierName)?;
        require_text(&self.supplier_email, Column::SupplierEmail)?;
        Ok(())
    }

    /// Validates a partial payload for update. Absent fields are skipped.
    pub fn validate_for_update(&self) -> Result<(), RecordValidationError> {
        check_text(&self.album_name, Column::AlbumName)?;
        check_text(&self.band_name, Column::BandName)?;
        if let Some(quantity) = self.quantity {
            check_non_negative(quantity, Column::Quantity)?;
        }
        if let Some(price) = self.price {
            check_non_negative(price, Column::Price)?;
        }
        check_text(&self.cover, Column::Cover)?;
        check_text(&self.supplier_name, Column::SupplierName)?;
        check_text(&self.supplier_email, Column::SupplierEmail)?;
        Ok(())
    }
}

/// Field constraint violation in a record payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordValidationError {
    /// Insert payload carries no fields at all.
    EmptyPayload,
    MissingField(Column),
    BlankField(Column),
    NegativeValue(Column),
}

impl RecordValidationError {
    /// Offending column, if the error is about a single field.
    pub fn field(&self) -> Option<Column> {
        match self {
            Self::EmptyPayload => None,
            Self::MissingField(column)
            | Self::BlankField(column)
            | Self::NegativeValue(column) => Some(*column),
        }
    }
}

impl Display for RecordValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyPayload => write!(f, "record cannot be empty"),
            Self::MissingField(column) => write!(f, "record requires `{column}`"),
            Self::BlankField(column) => write!(f, "record field `{column}` cannot be blank"),
            Self::NegativeValue(column) => {
                write!(f, "record field `{column}` must be greater than or equal to 0")
            }
        }
    }
}

impl Error for RecordValidationError {}

fn require_text(value: &Option<String>, column: Column) -> Result<(), RecordValidationError> {
    match value {
        None => Err(RecordValidationError::MissingField(column)),
        Some(_) => check_text(value, column),
    }
}

fn check_text(value: &Option<String>, column: Column) -> Result<(), RecordValidationError> {
    match value {
        Some(text) if text.trim().is_empty() => Err(RecordValidationError::BlankField(column)),
        _ => Ok(()),
    }
}

fn check_non_negative(value: i64, column: Column) -> Result<(), RecordValidationError> {
    if value < 0 {
        return Err(RecordValidationError::NegativeValue(column));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{Record, RecordValidationError, RecordValues};
    use crate::contract::Column;

    fn complete() -> RecordValues {
        RecordValues::new()
            .with_album_name("Kind of Blue")
            .with_band_name("Miles Davis")
            .with_quantity(3)
            .with_price(2499)
            .with_cover("file:///covers/kind_of_blue.jpg")
            .with_supplier_name("Blue Note Distribution")
            .with_supplier_email("orders@bluenote.example")
    }

    #[test]
    fn complete_payload_passes_insert_validation() {
        complete().validate_for_insert().unwrap();
    }

    #[test]
    fn insert_allows_missing_price_but_not_missing_quantity() {
        let mut no_price = complete();
        no_price.price = None;
        no_price.validate_for_insert().unwrap();

        let mut no_quantity = complete();
        no_quantity.quantity = None;
        assert_eq!(
            no_quantity.validate_for_insert(),
            Err(RecordValidationError::MissingField(Column::Quantity))
        );
    }

    #[test]
    fn insert_reports_first_failure_in_column_order() {
        let payload = RecordValues::new().with_quantity(-5).with_cover("  ");
        assert_eq!(
            payload.validate_for_insert(),
            Err(RecordValidationError::MissingField(Column::AlbumName))
        );

        let mut payload = complete();
        payload.quantity = Some(-1);
        payload.cover = Some(String::new());
        assert_eq!(
            payload.validate_for_insert().unwrap_err().field(),
            Some(Column::Quantity)
        );
    }

    #[test]
    fn empty_payload_is_rejected_for_insert_only() {
        assert_eq!(
            RecordValues::new().validate_for_insert(),
            Err(RecordValidationError::EmptyPayload)
        );
        assert_eq!(RecordValidationError::EmptyPayload.field(), None);
        RecordValues::new().validate_for_update().unwrap();
    }

    #[test]
    fn update_checks_only_present_fields() {
        RecordValues::new()
            .with_quantity(0)
            .validate_for_update()
            .unwrap();

        assert_eq!(
            RecordValues::new().with_price(-1).validate_for_update(),
            Err(RecordValidationError::NegativeValue(Column::Price))
        );
        assert_eq!(
            RecordValues::new()
                .with_supplier_email(" \t")
                .validate_for_update(),
            Err(RecordValidationError::BlankField(Column::SupplierEmail))
        );
    }

    #[test]
    fn present_columns_follow_table_order() {
        let payload = RecordValues::new()
            .with_supplier_email("a@b.example")
            .with_album_name("Blue Train");
        assert_eq!(
            payload.present_columns(),
            vec![Column::AlbumName, Column::SupplierEmail]
        );
        assert_eq!(payload.len(), 2);
        assert!(RecordValues::new().is_empty());
    }

    #[test]
    fn to_values_carries_every_writable_field() {
        let record = Record {
            id: 9,
            album_name: "Blue Train".to_string(),
            band_name: "John Coltrane".to_string(),
            quantity: 1,
            price: 1999,
            cover: "covers/blue_train.png".to_string(),
            supplier_name: "Jazz Supply".to_string(),
            supplier_email: "sales@jazz.example".to_string(),
        };
        let values = record.to_values();
        assert_eq!(values.len(), 7);
        values.validate_for_insert().unwrap();
    }
}
