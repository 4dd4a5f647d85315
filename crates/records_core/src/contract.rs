//! Record catalog contract: table, column and address naming.
//!
//! # Responsibility
//! - Single source of truth for table/column identifiers.
//! - Define the two address path templates and the MIME-like type tags.
//!
//! # Invariants
//! - Column names here must match `db/migrations/0001_init.sql`.
//! - `Column::ALL` lists columns in table declaration order.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Authority used when no configuration overrides it.
pub const DEFAULT_AUTHORITY: &str = "com.example.android.records";
/// URI scheme prefix accepted (optionally) in string addresses.
pub const CONTENT_SCHEME: &str = "content://";
/// Path segment naming the record collection.
pub const PATH_RECORDS: &str = "records";
/// Path template for the whole collection.
pub const COLLECTION_TEMPLATE: &str = "records";
/// Path template for one record; `#` matches a non-negative integer id.
pub const ITEM_TEMPLATE: &str = "records/#";

/// Database table backing the catalog.
pub const TABLE_NAME: &str = "records";
/// Default database file name.
pub const DATABASE_NAME: &str = "records.db";
/// Schema version produced by this binary.
pub const DATABASE_VERSION: u32 = 1;

const CURSOR_DIR_BASE_TYPE: &str = "vnd.android.cursor.dir";
const CURSOR_ITEM_BASE_TYPE: &str = "vnd.android.cursor.item";

/// Row id assigned by SQLite `AUTOINCREMENT`.
pub type RecordId = i64;

/// Columns of the `records` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Column {
    Id,
    AlbumName,
    BandName,
    Quantity,
    Price,
    Cover,
    SupplierName,
    SupplierEmail,
}

impl Column {
    /// All columns in declaration order.
    pub const ALL: [Column; 8] = [
        Column::Id,
        Column::AlbumName,
        Column::BandName,
        Column::Quantity,
        Column::Price,
        Column::Cover,
        Column::SupplierName,
        Column::SupplierEmail,
    ];

    /// SQL column name.
    pub fn as_str(self) -> &'static str {
        match self {
            Column::Id => "_id",
            Column::AlbumName => "album_name",
            Column::BandName => "band_name",
            Column::Quantity => "quantity",
            Column::Price => "price",
            Column::Cover => "cover",
            Column::SupplierName => "supplier_name",
            Column::SupplierEmail => "supplier_email",
        }
    }

    /// Parses a SQL column name back to a `Column`.
    pub fn from_name(name: &str) -> Option<Column> {
        Column::ALL
            .into_iter()
            .find(|column| column.as_str() == name)
    }
}

impl Display for Column {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Directory-style type tag for a collection address.
pub fn list_type(authority: &str) -> String {
    format!("{CURSOR_DIR_BASE_TYPE}/{authority}/{PATH_RECORDS}")
}

/// Row-style type tag for a single-record address.
pub fn item_type(authority: &str) -> String {
    format!("{CURSOR_ITEM_BASE_TYPE}/{authority}/{PATH_RECORDS}")
}

#[cfg(test)]
mod tests {
    use super::{item_type, list_type, Column};

    #[test]
    fn column_names_round_trip() {
        for column in Column::ALL {
            assert_eq!(Column::from_name(column.as_str()), Some(column));
        }
        assert_eq!(Column::from_name("title"), None);
    }

    #[test]
    fn type_tags_are_scoped_by_authority() {
        assert_eq!(
            list_type("org.example"),
            "vnd.android.cursor.dir/org.example/records"
        );
        assert_eq!(
            item_type("org.example"),
            "vnd.android.cursor.item/org.example/records"
        );
    }
}
