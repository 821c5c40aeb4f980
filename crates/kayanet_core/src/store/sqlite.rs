//! SQLite-backed record store.
//!
//! # Responsibility
//! - Persist the three collections as document tables (`id`, `body` JSON).
//! - Apply schema migrations and column upgrades on `initialize`.
//! - Import legacy flat blobs left behind by the old storage layer.
//!
//! # Invariants
//! - `replace_all` runs DELETE + INSERTs inside one transaction; readers
//!   never observe a record count between the old and new size.
//! - Column upgrades are decided by inspecting `pragma_table_info`, never by
//!   blanket-ignoring "already exists" failures.

use super::legacy::{parse_legacy_blob, records_to_import, LEGACY_BLOB_KEYS};
use super::migrations::apply_migrations;
use super::{lock_store, record_id, Collection, RawRecord, RecordStore, StoreError, StoreResult};
use log::{error, info};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Mutex;
use std::time::{Duration, Instant};

const LEGACY_BLOB_TABLE: &str = "legacy_blobs";

/// Durable store over one SQLite database file (or an in-memory database in
/// tests). All access is serialized through an internal connection mutex.
pub struct SqliteRecordStore {
    conn: Mutex<Connection>,
}

impl SqliteRecordStore {
    /// Opens (or creates) the database file. Schema work happens later in
    /// `initialize`; an unopenable medium is reported as `Unavailable` so the
    /// caller can pick a fallback backend.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(|err| {
            error!(
                "event=store_open module=store status=error mode=file error={err}"
            );
            StoreError::Unavailable(format!("cannot open {}: {err}", path.display()))
        })?;
        Self::from_connection(conn, "file")
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory().map_err(|err| {
            error!(
                "event=store_open module=store status=error mode=memory error={err}"
            );
            StoreError::Unavailable(format!("cannot open in-memory store: {err}"))
        })?;
        Self::from_connection(conn, "memory")
    }

    fn from_connection(conn: Connection, mode: &str) -> StoreResult<Self> {
        conn.busy_timeout(Duration::from_secs(5))?;
        info!("event=store_open module=store status=ok mode={mode}");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

impl RecordStore for SqliteRecordStore {
    fn initialize(&self) -> StoreResult<()> {
        let started_at = Instant::now();
        let mut conn = lock_store(&self.conn);

        apply_migrations(&mut conn)?;
        for collection in Collection::ALL {
            ensure_column(&conn, collection.storage_name(), "stored_at", "INTEGER")?;
        }
        let imported = import_legacy_blobs(&mut conn)?;

        info!(
            "event=store_init module=store status=ok backend=sqlite duration_ms={} legacy_imported={imported}",
            started_at.elapsed().as_millis()
        );
        Ok(())
    }

    fn read_all(&self, collection: Collection) -> StoreResult<Vec<RawRecord>> {
        let conn = lock_store(&self.conn);
        read_all_locked(&conn, collection)
    }

    fn replace_all(&self, collection: Collection, records: &[RawRecord]) -> StoreResult<()> {
        check_batch_ids(collection, records)?;

        let mut conn = lock_store(&self.conn);
        let tx = conn.transaction()?;
        tx.execute(
            &format!("DELETE FROM {};", collection.storage_name()),
            [],
        )?;
        {
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO {} (id, body, stored_at) VALUES (?1, ?2, ?3);",
                collection.storage_name()
            ))?;
            let stored_at = now_epoch_ms();
            for record in records {
                let id = record_id(collection, record)?;
                stmt.execute(params![id, record.to_string(), stored_at])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn upsert(&self, collection: Collection, record: &RawRecord) -> StoreResult<()> {
        let id = record_id(collection, record)?;
        let conn = lock_store(&self.conn);
        upsert_locked(&conn, collection, id, record)
    }

    fn delete(&self, collection: Collection, id: &str) -> StoreResult<bool> {
        let conn = lock_store(&self.conn);
        let changed = conn.execute(
            &format!("DELETE FROM {} WHERE id = ?1;", collection.storage_name()),
            [id],
        )?;
        Ok(changed > 0)
    }
}

fn read_all_locked(conn: &Connection, collection: Collection) -> StoreResult<Vec<RawRecord>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT body FROM {};",
        collection.storage_name()
    ))?;
    let mut rows = stmt.query([])?;
    let mut records = Vec::new();
    while let Some(row) = rows.next()? {
        let body: String = row.get(0)?;
        let record =
            serde_json::from_str(&body).map_err(|err| StoreError::MalformedRecord {
                collection,
                message: err.to_string(),
            })?;
        records.push(record);
    }
    Ok(records)
}

fn upsert_locked(
    conn: &Connection,
    collection: Collection,
    id: &str,
    record: &RawRecord,
) -> StoreResult<()> {
    conn.execute(
        &format!(
            "INSERT OR REPLACE INTO {} (id, body, stored_at) VALUES (?1, ?2, ?3);",
            collection.storage_name()
        ),
        params![id, record.to_string(), now_epoch_ms()],
    )?;
    Ok(())
}

/// Rejects records without a usable id and duplicate ids within the batch
/// before any row is touched.
fn check_batch_ids(collection: Collection, records: &[RawRecord]) -> StoreResult<()> {
    let mut seen = HashSet::new();
    for record in records {
        let id = record_id(collection, record)?;
        if !seen.insert(id) {
            return Err(StoreError::MalformedRecord {
                collection,
                message: format!("duplicate id `{id}` in replace_all batch"),
            });
        }
    }
    Ok(())
}

/// Merges legacy flat blobs into the collections, then drops the blob table.
/// Runs inside one transaction so a failed import leaves both the blobs and
/// the collections untouched.
fn import_legacy_blobs(conn: &mut Connection) -> StoreResult<usize> {
    if !table_exists(conn, LEGACY_BLOB_TABLE)? {
        return Ok(0);
    }

    let tx = conn.transaction()?;
    let mut imported = 0;
    for (key, collection) in LEGACY_BLOB_KEYS {
        let payload: Option<String> = tx
            .query_row(
                &format!("SELECT payload FROM {LEGACY_BLOB_TABLE} WHERE key = ?1;"),
                [key],
                |row| row.get(0),
            )
            .optional()?;
        let Some(payload) = payload else {
            continue;
        };

        let incoming = parse_legacy_blob(key, &payload)?;
        let existing_ids: HashSet<String> = read_all_locked(&tx, collection)?
            .iter()
            .map(|record| record_id(collection, record).map(str::to_string))
            .collect::<StoreResult<_>>()?;
        let fresh = records_to_import(collection, &existing_ids, incoming)?;

        for record in &fresh {
            let id = record_id(collection, record)?;
            upsert_locked(&tx, collection, id, record)?;
        }
        if !fresh.is_empty() {
            info!(
                "event=legacy_import module=store status=ok key={key} collection={collection} count={}",
                fresh.len()
            );
        }
        imported += fresh.len();
    }
    tx.execute_batch(&format!("DROP TABLE {LEGACY_BLOB_TABLE};"))?;
    tx.commit()?;

    Ok(imported)
}

fn table_exists(conn: &Connection, table_name: &str) -> StoreResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1
        );",
        [table_name],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn column_exists(conn: &Connection, table_name: &str, column: &str) -> StoreResult<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM pragma_table_info(?1) WHERE name = ?2;",
        [table_name, column],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Adds a column when absent. The presence check is what makes re-running
/// `initialize` a no-op; "duplicate column" errors are never swallowed.
fn ensure_column(
    conn: &Connection,
    table_name: &str,
    column: &str,
    declaration: &str,
) -> StoreResult<()> {
    if column_exists(conn, table_name, column)? {
        return Ok(());
    }
    conn.execute_batch(&format!(
        "ALTER TABLE {table_name} ADD COLUMN {column} {declaration};"
    ))?;
    Ok(())
}

fn now_epoch_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
