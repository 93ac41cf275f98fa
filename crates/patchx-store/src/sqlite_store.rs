//! SQLite-backed configuration store
//!
//! Persists project parameters and features so successive patch runs see the
//! state earlier runs left behind. Rows flagged `locked` refuse writes made
//! through [`ConfigStore`], which is how a host protects values a patch must
//! not touch. The admin methods (`put_param`, `put_feature`, `set_locked`)
//! ignore the flag.

use crate::db;
use crate::errors::{from_rusqlite, Result};
use crate::migrations::apply_migrations;
use patchx_core::model::FeatureRecord;
use patchx_core::ops::{ConfigStore, StoreError};
use rusqlite::{Connection, OptionalExtension};
use std::collections::BTreeMap;
use std::path::Path;

/// [`ConfigStore`] over a migrated SQLite database
pub struct SqliteConfigStore {
    conn: Connection,
    in_run: bool,
}

fn backend(err: rusqlite::Error) -> StoreError {
    StoreError::Backend {
        message: err.to_string(),
    }
}

fn locked(key: &str) -> StoreError {
    StoreError::Rejected {
        key: key.to_string(),
        reason: "key is locked".to_string(),
    }
}

impl SqliteConfigStore {
    /// Open (creating if needed) the database at `path` and migrate it
    ///
    /// # Errors
    ///
    /// `Io` if the parent directory cannot be created, `Persistence` if the
    /// database cannot be opened or migrated.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_connection(db::open(path)?)
    }

    /// Open a migrated in-memory store (for testing)
    ///
    /// # Errors
    ///
    /// `Persistence` if migration fails.
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(db::open_in_memory()?)
    }

    /// Configure and migrate an existing connection
    ///
    /// # Errors
    ///
    /// `Persistence` if configuration or migration fails.
    pub fn from_connection(mut conn: Connection) -> Result<Self> {
        db::configure(&conn)?;
        apply_migrations(&mut conn)?;
        Ok(Self {
            conn,
            in_run: false,
        })
    }

    /// Insert or overwrite a parameter, regardless of its lock
    ///
    /// # Errors
    ///
    /// `Persistence` on SQLite failure.
    pub fn put_param(&self, key: &str, value: &str) -> Result<()> {
        self.write_param(key, value).map_err(from_rusqlite)
    }

    /// Insert or replace a feature record, regardless of its lock
    ///
    /// # Errors
    ///
    /// `Persistence` on SQLite failure.
    pub fn put_feature(&self, record: &FeatureRecord) -> Result<()> {
        self.write_feature(record).map_err(from_rusqlite)
    }

    /// Lock or unlock the parameter or feature called `key`
    ///
    /// Returns false if no parameter or feature has that key.
    ///
    /// # Errors
    ///
    /// `Persistence` on SQLite failure.
    pub fn set_locked(&self, key: &str, locked: bool) -> Result<bool> {
        let flag = i64::from(locked);
        let params = self
            .conn
            .execute(
                "UPDATE params SET locked = ?1 WHERE key = ?2",
                rusqlite::params![flag, key],
            )
            .map_err(from_rusqlite)?;
        let features = self
            .conn
            .execute(
                "UPDATE features SET locked = ?1 WHERE id = ?2",
                rusqlite::params![flag, key],
            )
            .map_err(from_rusqlite)?;
        Ok(params + features > 0)
    }

    fn is_locked(&self, table: Table, key: &str) -> rusqlite::Result<bool> {
        let sql = match table {
            Table::Params => "SELECT locked FROM params WHERE key = ?1",
            Table::Features => "SELECT locked FROM features WHERE id = ?1",
        };
        let flag: Option<i64> = self
            .conn
            .query_row(sql, [key], |row| row.get(0))
            .optional()?;
        Ok(flag.unwrap_or(0) != 0)
    }

    fn write_param(&self, key: &str, value: &str) -> rusqlite::Result<()> {
        self.conn.execute(
            "INSERT INTO params (key, value, locked, updated_at)
             VALUES (?1, ?2, 0, ?3)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at",
            rusqlite::params![key, value, chrono::Utc::now().timestamp()],
        )?;
        Ok(())
    }

    /// Upsert keeping the listing position of an existing record
    fn write_feature(&self, record: &FeatureRecord) -> rusqlite::Result<()> {
        let fields = serde_json::to_string(&record.fields)
            .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;
        self.conn.execute(
            "INSERT INTO features (id, feature_type, position, fields, locked, updated_at)
             VALUES (?1, ?2, (SELECT COALESCE(MAX(position) + 1, 0) FROM features), ?3, 0, ?4)
             ON CONFLICT(id) DO UPDATE SET
                feature_type = excluded.feature_type,
                fields = excluded.fields,
                updated_at = excluded.updated_at",
            rusqlite::params![
                record.id,
                record.feature_type,
                fields,
                chrono::Utc::now().timestamp()
            ],
        )?;
        Ok(())
    }
}

#[derive(Clone, Copy)]
enum Table {
    Params,
    Features,
}

impl ConfigStore for SqliteConfigStore {
    fn get(&self, key: &str) -> std::result::Result<Option<String>, StoreError> {
        self.conn
            .query_row("SELECT value FROM params WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()
            .map_err(backend)
    }

    fn set(&mut self, key: &str, value: &str) -> std::result::Result<(), StoreError> {
        if self.is_locked(Table::Params, key).map_err(backend)? {
            return Err(locked(key));
        }
        self.write_param(key, value).map_err(backend)
    }

    fn list_params(&self) -> std::result::Result<Vec<(String, String)>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT key, value FROM params ORDER BY key")
            .map_err(backend)?;
        let rows = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
            .map_err(backend)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(backend)?;
        Ok(rows)
    }

    fn list_features(&self) -> std::result::Result<Vec<FeatureRecord>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, feature_type, fields FROM features ORDER BY position, id")
            .map_err(backend)?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })
            .map_err(backend)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(backend)?;

        rows.into_iter()
            .map(|(id, feature_type, fields)| {
                let fields: BTreeMap<String, String> =
                    serde_json::from_str(&fields).map_err(|e| StoreError::Backend {
                        message: format!("corrupt fields for feature {}: {}", id, e),
                    })?;
                Ok(FeatureRecord {
                    id,
                    feature_type,
                    fields,
                })
            })
            .collect()
    }

    fn upsert_feature(&mut self, record: &FeatureRecord) -> std::result::Result<(), StoreError> {
        if self.is_locked(Table::Features, &record.id).map_err(backend)? {
            return Err(locked(&record.id));
        }
        self.write_feature(record).map_err(backend)
    }

    fn remove_feature(&mut self, id: &str) -> std::result::Result<(), StoreError> {
        if self.is_locked(Table::Features, id).map_err(backend)? {
            return Err(locked(id));
        }
        self.conn
            .execute("DELETE FROM features WHERE id = ?1", [id])
            .map_err(backend)?;
        Ok(())
    }

    fn begin_run(&mut self) -> std::result::Result<(), StoreError> {
        if self.in_run {
            return Err(StoreError::Backend {
                message: "a run is already in progress on this store".to_string(),
            });
        }
        self.conn
            .execute_batch("BEGIN IMMEDIATE")
            .map_err(backend)?;
        self.in_run = true;
        Ok(())
    }

    fn end_run(&mut self, commit: bool) -> std::result::Result<(), StoreError> {
        if !self.in_run {
            return Ok(());
        }
        if commit {
            if let Err(err) = self.conn.execute_batch("COMMIT") {
                // A failed COMMIT can leave the transaction open
                if !self.conn.is_autocommit() {
                    self.conn.execute_batch("ROLLBACK").map_err(backend)?;
                }
                self.in_run = false;
                return Err(backend(err));
            }
        } else {
            self.conn.execute_batch("ROLLBACK").map_err(backend)?;
        }
        self.in_run = false;
        Ok(())
    }
}
