use rusqlite::{params, Connection, OpenFlags, OptionalExtension, Transaction};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use tracing::{debug, info};

use crate::error::{IndexerError, Result};
use crate::index::migrations::{self, CURRENT_SCHEMA_VERSION};
use crate::index::{
    AnalysisResult, CrateRecords, ItemIndex, ItemKind, Record, StoredItem, CACHE_FILE_NAME,
    PATH_SEPARATOR,
};

pub struct SqliteIndex {
    conn: Mutex<Connection>,
}

impl SqliteIndex {
    /// Opens (creating if needed) the cache inside `output_dir` for writing.
    pub fn create(output_dir: impl AsRef<Path>) -> Result<Self> {
        let output_dir = output_dir.as_ref();
        std::fs::create_dir_all(output_dir)?;
        let conn = Connection::open(output_dir.join(CACHE_FILE_NAME))?;
        Self::configure_pragmas(&conn)?;
        migrations::run_migrations(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Opens the cache inside `cache_dir` read-only.
    ///
    /// Returns `None` when there is no cache file, or when the file holds no
    /// schema yet.
    pub fn open_read_only(cache_dir: impl AsRef<Path>) -> Result<Option<Self>> {
        let db_path = Self::db_path(cache_dir);
        if !db_path.is_file() {
            return Ok(None);
        }

        let conn = Connection::open_with_flags(
            &db_path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;

        let version = migrations::schema_version(&conn)?;
        if version == 0 {
            return Ok(None);
        }
        if version > CURRENT_SCHEMA_VERSION {
            return Err(IndexerError::Index(format!(
                "Cache schema version {} is newer than supported version {}",
                version, CURRENT_SCHEMA_VERSION
            )));
        }

        Ok(Some(Self {
            conn: Mutex::new(conn),
        }))
    }

    #[allow(dead_code)]
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        migrations::run_migrations(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn db_path(cache_dir: impl AsRef<Path>) -> PathBuf {
        cache_dir.as_ref().join(CACHE_FILE_NAME)
    }

    /// Rollback journal: readers never need write access or side files.
    fn configure_pragmas(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            r#"
            PRAGMA journal_mode = DELETE;
            PRAGMA synchronous = FULL;
            PRAGMA temp_store = MEMORY;
            "#,
        )?;
        Ok(())
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| IndexerError::Index("cache connection lock poisoned".to_string()))
    }

    fn query_items(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> Result<Vec<StoredItem>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt
            .query_map(params, |row| {
                Ok(StoredItem {
                    path: row.get(0)?,
                    data: row.get(1)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

fn insert_record<R: Record>(tx: &Transaction, crate_name: &str, record: &R) -> Result<()> {
    let segments = record.path();
    let path = record.path_str();
    let parent = segments
        .split_last()
        .map(|(_, parent)| parent.join(PATH_SEPARATOR))
        .unwrap_or_default();
    let data = serde_json::to_string(record)
        .map_err(|e| IndexerError::Serialization(format!("{} {}: {}", R::KIND.as_str(), path, e)))?;

    tx.execute(
        "INSERT OR REPLACE INTO items (kind, path, crate, parent, depth, data)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            R::KIND.as_str(),
            path,
            crate_name,
            parent,
            segments.len() as i64,
            data
        ],
    )?;
    Ok(())
}

fn insert_all<R: Record>(tx: &Transaction, crate_name: &str, records: &[R]) -> Result<usize> {
    for record in records {
        insert_record(tx, crate_name, record)?;
    }
    Ok(records.len())
}

impl ItemIndex for SqliteIndex {
    fn replace_crate(
        &self,
        crate_name: &str,
        records: &CrateRecords,
        summary: &AnalysisResult,
    ) -> Result<usize> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let removed = tx.execute("DELETE FROM items WHERE crate = ?1", [crate_name])?;
        tx.execute("DELETE FROM summaries WHERE crate = ?1", [crate_name])?;
        debug!("Removed {} stale rows for {}", removed, crate_name);

        let mut written = 0;
        if let Some(krate) = &records.krate {
            insert_record(&tx, crate_name, krate)?;
            written += 1;
        }
        written += insert_all(&tx, crate_name, &records.modules)?;
        written += insert_all(&tx, crate_name, &records.structs)?;
        written += insert_all(&tx, crate_name, &records.enums)?;
        written += insert_all(&tx, crate_name, &records.functions)?;

        let summary_data = serde_json::to_string(summary)
            .map_err(|e| IndexerError::Serialization(e.to_string()))?;
        tx.execute(
            "INSERT OR REPLACE INTO summaries (crate, data) VALUES (?1, ?2)",
            params![crate_name, summary_data],
        )?;

        tx.commit()?;
        info!("Wrote {} records for {}", written, crate_name);
        Ok(written)
    }

    fn get_item(&self, kind: ItemKind, path: &str) -> Result<Option<StoredItem>> {
        let conn = self.conn()?;
        let item = conn
            .query_row(
                "SELECT path, data FROM items WHERE kind = ?1 AND path = ?2",
                params![kind.as_str(), path],
                |row| {
                    Ok(StoredItem {
                        path: row.get(0)?,
                        data: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(item)
    }

    fn list_children(&self, kind: ItemKind, parent: &str) -> Result<Vec<StoredItem>> {
        self.query_items(
            "SELECT path, data FROM items WHERE kind = ?1 AND parent = ?2 ORDER BY path",
            params![kind.as_str(), parent],
        )
    }

    fn list_descendants(&self, kind: ItemKind, ancestor: &str) -> Result<Vec<StoredItem>> {
        if ancestor.is_empty() {
            return self.query_items(
                "SELECT path, data FROM items WHERE kind = ?1 ORDER BY path",
                params![kind.as_str()],
            );
        }

        // every path starting with `ancestor::` sorts in [`ancestor::`, `ancestor:;`)
        let low = format!("{}{}", ancestor, PATH_SEPARATOR);
        let high = format!("{}:;", ancestor);
        self.query_items(
            "SELECT path, data FROM items
             WHERE kind = ?1 AND path > ?2 AND path < ?3
             ORDER BY path",
            params![kind.as_str(), low, high],
        )
    }

    fn get_summary(&self, crate_name: &str) -> Result<Option<AnalysisResult>> {
        let conn = self.conn()?;
        let data: Option<String> = conn
            .query_row(
                "SELECT data FROM summaries WHERE crate = ?1",
                [crate_name],
                |row| row.get(0),
            )
            .optional()?;

        data.map(|d| {
            serde_json::from_str(&d).map_err(|source| IndexerError::Corrupt {
                key: format!("summary {}", crate_name),
                source,
            })
        })
        .transpose()
    }
}
