//! Query arguments and the row sets returned by `RecordStore::query`.

use crate::address::Address;
use crate::contract::{Column, RecordId, TABLE_NAME};
use crate::model::record::Record;
use crate::store::{StoreError, StoreResult};
use rusqlite::types::Value;

/// Row filter: a raw SQL expression with anonymous `?` placeholders.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    pub filter: Option<String>,
    pub args: Vec<Value>,
}

impl Selection {
    /// Matches every row.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn new(filter: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            filter: Some(filter.into()),
            args,
        }
    }

    pub(crate) fn by_id(id: RecordId) -> Self {
        Self::new(format!("{} = ?", Column::Id.as_str()), vec![Value::Integer(id)])
    }

    /// Filter text, `None` when absent or blank.
    pub(crate) fn clause(&self) -> Option<&str> {
        self.filter
            .as_deref()
            .map(str::trim)
            .filter(|filter| !filter.is_empty())
    }
}

/// Projection, selection and ordering for a query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordQuery {
    /// `None` (or empty) projects every column.
    pub columns: Option<Vec<Column>>,
    pub selection: Selection,
    /// Raw SQL `ORDER BY` body, e.g. `album_name ASC`.
    pub order: Option<String>,
}

impl RecordQuery {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_columns(mut self, columns: impl Into<Vec<Column>>) -> Self {
        self.columns = Some(columns.into());
        self
    }

    pub fn with_selection(mut self, selection: Selection) -> Self {
        self.selection = selection;
        self
    }

    pub fn with_order(mut self, order: impl Into<String>) -> Self {
        self.order = Some(order.into());
        self
    }

    pub(crate) fn projection(&self) -> Vec<Column> {
        match &self.columns {
            Some(columns) if !columns.is_empty() => columns.clone(),
            _ => Column::ALL.to_vec(),
        }
    }
}

/// Materialized query result, tagged with the address that produced it.
///
/// Observers registered on `notification_address()` learn when this result
/// went stale and should re-query.
#[derive(Debug, Clone, PartialEq)]
pub struct RowSet {
    notification_address: Address,
    columns: Vec<Column>,
    rows: Vec<Vec<Value>>,
}

impl RowSet {
    pub(crate) fn new(
        notification_address: Address,
        columns: Vec<Column>,
        rows: Vec<Vec<Value>>,
    ) -> Self {
        Self {
            notification_address,
            columns,
            rows,
        }
    }

    pub fn notification_address(&self) -> Address {
        self.notification_address
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, index: usize) -> Option<RowView<'_>> {
        self.rows.get(index).map(|values| RowView {
            columns: &self.columns,
            values,
        })
    }

    pub fn rows(&self) -> impl ExactSizeIterator<Item = RowView<'_>> {
        self.rows.iter().map(|values| RowView {
            columns: &self.columns,
            values,
        })
    }

    /// Decodes every row; the projection must include all columns.
    pub fn records(&self) -> StoreResult<Vec<Record>> {
        self.rows().map(|row| row.to_record()).collect()
    }
}

/// Borrowed view of one row.
#[derive(Debug, Clone, Copy)]
pub struct RowView<'a> {
    columns: &'a [Column],
    values: &'a [Value],
}

impl<'a> RowView<'a> {
    pub fn get(&self, column: Column) -> Option<&'a Value> {
        let index = self.columns.iter().position(|candidate| *candidate == column)?;
        self.values.get(index)
    }

    pub fn get_i64(&self, column: Column) -> Option<i64> {
        match self.get(column)? {
            Value::Integer(value) => Some(*value),
            _ => None,
        }
    }

    pub fn get_str(&self, column: Column) -> Option<&'a str> {
        match self.get(column)? {
            Value::Text(value) => Some(value.as_str()),
            _ => None,
        }
    }

    pub fn to_record(&self) -> StoreResult<Record> {
        Ok(Record {
            id: self.require_i64(Column::Id)?,
            album_name: self.require_text(Column::AlbumName)?,
            band_name: self.require_text(Column::BandName)?,
            quantity: self.require_i64(Column::Quantity)?,
            price: self.require_i64(Column::Price)?,
            cover: self.require_text(Column::Cover)?,
            supplier_name: self.require_text(Column::SupplierName)?,
            supplier_email: self.require_text(Column::SupplierEmail)?,
        })
    }

    fn require_i64(&self, column: Column) -> StoreResult<i64> {
        self.require(column)?;
        self.get_i64(column).ok_or_else(|| invalid_value(column))
    }

    fn require_text(&self, column: Column) -> StoreResult<String> {
        self.require(column)?;
        self.get_str(column)
            .map(str::to_string)
            .ok_or_else(|| invalid_value(column))
    }

    fn require(&self, column: Column) -> StoreResult<&'a Value> {
        self.get(column).ok_or_else(|| {
            StoreError::InvalidData(format!("row set does not project `{column}`"))
        })
    }
}

fn invalid_value(column: Column) -> StoreError {
    StoreError::InvalidData(format!("invalid value in {TABLE_NAME}.{column}"))
}
