//! Record store contract and SQLite implementation.
//!
//! # Responsibility
//! - Resolve addresses, validate payloads and run the matching SQL.
//! - Publish change notifications after successful writes.
//!
//! # Invariants
//! - Item addresses always force the row filter to `_id = ?`.
//! - The connection lock is released before observers run, so an observer
//!   may re-enter the store.

use crate::address::{Address, AddressLike, AddressMatcher};
use crate::contract::{Column, TABLE_NAME};
use crate::db::migrations::{current_user_version, latest_version};
use crate::db::{open_db, open_db_in_memory, DbError};
use crate::model::record::{RecordValidationError, RecordValues};
use crate::notify::{ChangeNotifier, ChangeObserver, SubscriptionHandle};
use crate::store::{RecordQuery, RowSet, Selection, StoreError, StoreResult};
use log::{debug, error, warn};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};
use std::collections::HashSet;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

/// Addressable CRUD contract over the record catalog.
pub trait RecordStore {
    /// Reads rows. Item addresses ignore the caller's selection.
    fn query<A: AddressLike>(&self, address: A, query: &RecordQuery) -> StoreResult<RowSet>;

    /// Inserts one record into the collection and returns its item address.
    fn insert<A: AddressLike>(&self, address: A, values: &RecordValues) -> StoreResult<Address>;

    /// Updates the present payload fields on matching rows; returns rows changed.
    fn update<A: AddressLike>(
        &self,
        address: A,
        values: &RecordValues,
        selection: &Selection,
    ) -> StoreResult<usize>;

    /// Deletes matching rows; returns rows deleted.
    fn delete<A: AddressLike>(&self, address: A, selection: &Selection) -> StoreResult<usize>;

    /// MIME-like type tag for the address shape.
    fn resolve_type<A: AddressLike>(&self, address: A) -> StoreResult<String>;
}

impl<T: RecordStore> RecordStore for &T {
    fn query<A: AddressLike>(&self, address: A, query: &RecordQuery) -> StoreResult<RowSet> {
        (**self).query(address, query)
    }

    fn insert<A: AddressLike>(&self, address: A, values: &RecordValues) -> StoreResult<Address> {
        (**self).insert(address, values)
    }

    fn update<A: AddressLike>(
        &self,
        address: A,
        values: &RecordValues,
        selection: &Selection,
    ) -> StoreResult<usize> {
        (**self).update(address, values, selection)
    }

    fn delete<A: AddressLike>(&self, address: A, selection: &Selection) -> StoreResult<usize> {
        (**self).delete(address, selection)
    }

    fn resolve_type<A: AddressLike>(&self, address: A) -> StoreResult<String> {
        (**self).resolve_type(address)
    }
}

impl<T: RecordStore> RecordStore for Arc<T> {
    fn query<A: AddressLike>(&self, address: A, query: &RecordQuery) -> StoreResult<RowSet> {
        (**self).query(address, query)
    }

    fn insert<A: AddressLike>(&self, address: A, values: &RecordValues) -> StoreResult<Address> {
        (**self).insert(address, values)
    }

    fn update<A: AddressLike>(
        &self,
        address: A,
        values: &RecordValues,
        selection: &Selection,
    ) -> StoreResult<usize> {
        (**self).update(address, values, selection)
    }

    fn delete<A: AddressLike>(&self, address: A, selection: &Selection) -> StoreResult<usize> {
        (**self).delete(address, selection)
    }

    fn resolve_type<A: AddressLike>(&self, address: A) -> StoreResult<String> {
        (**self).resolve_type(address)
    }
}

/// SQLite-backed record store. Owns its connection exclusively.
pub struct SqliteRecordStore {
    conn: Mutex<Connection>,
    matcher: AddressMatcher,
    notifier: Arc<ChangeNotifier>,
}

impl SqliteRecordStore {
    /// Opens (creating if absent) the database at `path`.
    pub fn open(
        path: impl AsRef<Path>,
        matcher: AddressMatcher,
        notifier: Arc<ChangeNotifier>,
    ) -> StoreResult<Self> {
        Self::try_new(open_db(path)?, matcher, notifier)
    }

    pub fn open_in_memory(
        matcher: AddressMatcher,
        notifier: Arc<ChangeNotifier>,
    ) -> StoreResult<Self> {
        Self::try_new(open_db_in_memory()?, matcher, notifier)
    }

    /// Wraps an already opened connection after checking its schema.
    ///
    /// # Errors
    /// - `UninitializedConnection` when migrations have not been applied.
    /// - `MissingRequiredTable` / `MissingRequiredColumn` when the schema
    ///   does not carry every record column.
    pub fn try_new(
        conn: Connection,
        matcher: AddressMatcher,
        notifier: Arc<ChangeNotifier>,
    ) -> StoreResult<Self> {
        ensure_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            matcher,
            notifier,
        })
    }

    pub fn matcher(&self) -> &AddressMatcher {
        &self.matcher
    }

    pub fn notifier(&self) -> &Arc<ChangeNotifier> {
        &self.notifier
    }

    /// String form of `address` under this store's authority.
    pub fn uri_for(&self, address: &Address) -> String {
        self.matcher.uri_for(address)
    }

    /// Subscribes `observer` to changes affecting `rows`.
    pub fn observe(
        &self,
        rows: &RowSet,
        observer: impl ChangeObserver + 'static,
    ) -> SubscriptionHandle {
        self.notifier.subscribe(rows.notification_address(), observer)
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn resolve(&self, address: impl AddressLike, operation: &str) -> StoreResult<Address> {
        address.resolve_with(&self.matcher).inspect_err(|err| {
            warn!(
                "event=record_{} module=store status=error error_code={} error={}",
                operation,
                err.code(),
                err
            );
        })
    }

    fn publish(&self, address: &Address) {
        self.notifier.publish(address);
    }
}

impl RecordStore for SqliteRecordStore {
    fn query<A: AddressLike>(&self, address: A, query: &RecordQuery) -> StoreResult<RowSet> {
        let started_at = Instant::now();
        let address = self.resolve(address, "query")?;
        let selection = scoped_selection(&address, &query.selection);
        let columns = query.projection();

        let mut sql = format!("SELECT {} FROM {TABLE_NAME}", column_list(&columns));
        push_where(&mut sql, &selection);
        if let Some(order) = query
            .order
            .as_deref()
            .map(str::trim)
            .filter(|order| !order.is_empty())
        {
            sql.push_str(" ORDER BY ");
            sql.push_str(order);
        }

        let rows = {
            let conn = self.lock();
            read_rows(&conn, &sql, &selection.args, columns.len())
        };
        let rows = match rows {
            Ok(rows) => rows,
            Err(err) => {
                error!(
                    "event=record_query module=store status=error address={} error_code=storage_read_failed error={}",
                    address, err
                );
                return Err(StoreError::read(err));
            }
        };

        debug!(
            "event=record_query module=store status=ok address={} rows={} duration_ms={}",
            address,
            rows.len(),
            started_at.elapsed().as_millis()
        );
        Ok(RowSet::new(address, columns, rows))
    }

    fn insert<A: AddressLike>(&self, address: A, values: &RecordValues) -> StoreResult<Address> {
        let started_at = Instant::now();
        let address = self.resolve(address, "insert")?;
        match address {
            Address::Collection => {}
            Address::Item(_) => {
                return Err(StoreError::UnsupportedOperation {
                    operation: "insert",
                    address,
                });
            }
        }

        if let Err(err) = values.validate_for_insert() {
            log_rejected("insert", &address, &err);
            return Err(err.into());
        }

        let assignments = bind_values(values);
        let columns = assignments.iter().map(|(column, _)| *column).collect::<Vec<_>>();
        let placeholders = vec!["?"; assignments.len()].join(", ");
        let sql = format!(
            "INSERT INTO {TABLE_NAME} ({}) VALUES ({placeholders})",
            column_list(&columns)
        );

        let id = {
            let conn = self.lock();
            let changed = conn
                .execute(
                    &sql,
                    params_from_iter(assignments.iter().map(|(_, value)| value)),
                )
                .map_err(|err| log_write_failure("insert", &address, err))?;
            if changed == 0 {
                error!(
                    "event=record_insert module=store status=error address={} error_code=no_row_written",
                    address
                );
                return Err(StoreError::StorageWriteFailed(None));
            }
            conn.last_insert_rowid()
        };

        let inserted = Address::Item(id);
        debug!(
            "event=record_insert module=store status=ok id={} duration_ms={}",
            id,
            started_at.elapsed().as_millis()
        );
        self.publish(&address);
        Ok(inserted)
    }

    fn update<A: AddressLike>(
        &self,
        address: A,
        values: &RecordValues,
        selection: &Selection,
    ) -> StoreResult<usize> {
        let started_at = Instant::now();
        let address = self.resolve(address, "update")?;
        if values.is_empty() {
            debug!(
                "event=record_update module=store status=skipped address={} reason=empty_payload",
                address
            );
            return Ok(0);
        }
        if let Err(err) = values.validate_for_update() {
            log_rejected("update", &address, &err);
            return Err(err.into());
        }

        let selection = scoped_selection(&address, selection);
        let assignments = bind_values(values);
        let set_clause = assignments
            .iter()
            .map(|(column, _)| format!("{} = ?", column.as_str()))
            .collect::<Vec<_>>()
            .join(", ");
        let mut sql = format!("UPDATE {TABLE_NAME} SET {set_clause}");
        push_where(&mut sql, &selection);

        let bindings = assignments
            .into_iter()
            .map(|(_, value)| value)
            .chain(selection.args.iter().cloned());
        let changed = {
            let conn = self.lock();
            conn.execute(&sql, params_from_iter(bindings))
                .map_err(|err| log_write_failure("update", &address, err))?
        };

        debug!(
            "event=record_update module=store status=ok address={} rows={} duration_ms={}",
            address,
            changed,
            started_at.elapsed().as_millis()
        );
        if changed > 0 {
            self.publish(&address);
        }
        Ok(changed)
    }

    fn delete<A: AddressLike>(&self, address: A, selection: &Selection) -> StoreResult<usize> {
        let started_at = Instant::now();
        let address = self.resolve(address, "delete")?;
        let selection = scoped_selection(&address, selection);

        let mut sql = format!("DELETE FROM {TABLE_NAME}");
        push_where(&mut sql, &selection);

        let deleted = {
            let conn = self.lock();
            conn.execute(&sql, params_from_iter(selection.args.iter()))
                .map_err(|err| log_write_failure("delete", &address, err))?
        };

        debug!(
            "event=record_delete module=store status=ok address={} rows={} duration_ms={}",
            address,
            deleted,
            started_at.elapsed().as_millis()
        );
        if deleted > 0 {
            self.publish(&address);
        }
        Ok(deleted)
    }

    fn resolve_type<A: AddressLike>(&self, address: A) -> StoreResult<String> {
        let address = self.resolve(address, "type")?;
        Ok(self.matcher.type_for(&address))
    }
}

fn scoped_selection(address: &Address, selection: &Selection) -> Selection {
    match address {
        Address::Collection => selection.clone(),
        Address::Item(id) => Selection::by_id(*id),
    }
}

fn push_where(sql: &mut String, selection: &Selection) {
    if let Some(filter) = selection.clause() {
        sql.push_str(" WHERE ");
        sql.push_str(filter);
    }
}

fn column_list(columns: &[Column]) -> String {
    columns
        .iter()
        .map(|column| column.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn bind_values(values: &RecordValues) -> Vec<(Column, Value)> {
    let text = |value: &Option<String>| value.clone().map(Value::Text);
    let integer = |value: Option<i64>| value.map(Value::Integer);

    [
        (Column::AlbumName, text(&values.album_name)),
        (Column::BandName, text(&values.band_name)),
        (Column::Quantity, integer(values.quantity)),
        (Column::Price, integer(values.price)),
        (Column::Cover, text(&values.cover)),
        (Column::SupplierName, text(&values.supplier_name)),
        (Column::SupplierEmail, text(&values.supplier_email)),
    ]
    .into_iter()
    .filter_map(|(column, value)| value.map(|value| (column, value)))
    .collect()
}

fn read_rows(
    conn: &Connection,
    sql: &str,
    args: &[Value],
    width: usize,
) -> rusqlite::Result<Vec<Vec<Value>>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(params_from_iter(args.iter()))?;
    let mut result = Vec::new();

    while let Some(row) = rows.next()? {
        let mut values = Vec::with_capacity(width);
        for index in 0..width {
            values.push(row.get::<_, Value>(index)?);
        }
        result.push(values);
    }

    Ok(result)
}

fn log_rejected(operation: &str, address: &Address, err: &RecordValidationError) {
    let field = err.field().map_or("payload", Column::as_str);
    warn!(
        "event=record_{} module=store status=rejected address={} error_code=validation_failed field={}",
        operation, address, field
    );
}

fn log_write_failure(operation: &str, address: &Address, err: rusqlite::Error) -> StoreError {
    error!(
        "event=record_{} module=store status=error address={} error_code=storage_write_failed error={}",
        operation, address, err
    );
    StoreError::write(err)
}

fn ensure_schema(conn: &Connection) -> StoreResult<()> {
    let expected_version = latest_version();
    let actual_version = current_user_version(conn)?;
    if actual_version > expected_version {
        return Err(StoreError::Db(DbError::UnsupportedSchemaVersion {
            db_version: actual_version,
            latest_supported: expected_version,
        }));
    }
    if actual_version < expected_version {
        return Err(StoreError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    let mut stmt = conn
        .prepare(&format!("PRAGMA table_info({TABLE_NAME});"))
        .map_err(StoreError::read)?;
    let present = stmt
        .query_map([], |row| row.get::<_, String>("name"))
        .map_err(StoreError::read)?
        .collect::<Result<HashSet<_>, _>>()
        .map_err(StoreError::read)?;

    if present.is_empty() {
        return Err(StoreError::MissingRequiredTable(TABLE_NAME));
    }
    if let Some(column) = Column::ALL
        .into_iter()
        .find(|column| !present.contains(column.as_str()))
    {
        return Err(StoreError::MissingRequiredColumn {
            table: TABLE_NAME,
            column: column.as_str(),
        });
    }

    Ok(())
}
