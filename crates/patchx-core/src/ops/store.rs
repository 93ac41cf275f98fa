use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;

use crate::model::FeatureRecord;

/// Failure reported by a [`ConfigStore`]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The store refused a write (locked key, read-only feature, ...)
    #[error("store rejected write to {key}: {reason}")]
    Rejected { key: String, reason: String },

    /// The backing storage itself failed
    #[error("store backend failure: {message}")]
    Backend { message: String },
}

/// Project configuration owned by the host CI system
///
/// The engine only ever borrows a store for a single run. `&mut self` on the
/// write methods means one run has exclusive access while it applies.
pub trait ConfigStore {
    /// Current value of a parameter, `None` if absent
    ///
    /// # Errors
    ///
    /// `Backend` if the value cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Overwrite (or create) a parameter
    ///
    /// # Errors
    ///
    /// `Rejected` when the store refuses the key.
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;

    /// All parameters, ordered by key
    ///
    /// # Errors
    ///
    /// `Backend` if the parameters cannot be read.
    fn list_params(&self) -> Result<Vec<(String, String)>, StoreError>;

    /// All feature records, in store order; ids are unique within a store
    ///
    /// # Errors
    ///
    /// `Backend` if the records cannot be read.
    fn list_features(&self) -> Result<Vec<FeatureRecord>, StoreError>;

    /// Insert a record, or replace the record with the same id
    ///
    /// # Errors
    ///
    /// `Rejected` when the store refuses the record.
    fn upsert_feature(&mut self, record: &FeatureRecord) -> Result<(), StoreError>;

    /// Remove a record; only used to undo a create during rollback
    ///
    /// # Errors
    ///
    /// `Rejected` or `Backend` if the record cannot be removed.
    fn remove_feature(&mut self, id: &str) -> Result<(), StoreError>;

    /// Called by the run orchestrator before the applier starts writing
    ///
    /// # Errors
    ///
    /// `Backend` if the store cannot open a unit of work.
    fn begin_run(&mut self) -> Result<(), StoreError> {
        Ok(())
    }

    /// Called once the applier finished; `commit` is false after an abort
    ///
    /// # Errors
    ///
    /// `Backend` if the unit of work cannot be closed.
    fn end_run(&mut self, _commit: bool) -> Result<(), StoreError> {
        Ok(())
    }
}

/// In-memory store
///
/// Keys listed via [`InMemoryStore::lock_key`] reject every write, which is
/// how tests (and dry runs) exercise the applier's abort path.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InMemoryStore {
    params: BTreeMap<String, String>,
    features: Vec<FeatureRecord>,
    locked: BTreeSet<String>,
}

impl InMemoryStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from `(key, value)` pairs
    pub fn with_params<K, V>(params: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            params: params
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            ..Self::default()
        }
    }

    /// Add a feature record directly, bypassing locks
    ///
    /// A record with the same id is replaced in place, as the SQLite store's
    /// primary key does.
    pub fn insert_feature(&mut self, record: FeatureRecord) {
        self.replace_or_push(record);
    }

    fn replace_or_push(&mut self, record: FeatureRecord) {
        match self.features.iter_mut().find(|f| f.id == record.id) {
            Some(existing) => *existing = record,
            None => self.features.push(record),
        }
    }

    /// Make every write to `key` (parameter or feature id) fail
    pub fn lock_key(&mut self, key: impl Into<String>) {
        self.locked.insert(key.into());
    }

    pub fn params(&self) -> &BTreeMap<String, String> {
        &self.params
    }

    pub fn features(&self) -> &[FeatureRecord] {
        &self.features
    }

    fn check_unlocked(&self, key: &str) -> Result<(), StoreError> {
        if self.locked.contains(key) {
            return Err(StoreError::Rejected {
                key: key.to_string(),
                reason: "key is locked".to_string(),
            });
        }
        Ok(())
    }
}

impl ConfigStore for InMemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.params.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.check_unlocked(key)?;
        self.params.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn list_params(&self) -> Result<Vec<(String, String)>, StoreError> {
        Ok(self
            .params
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    fn list_features(&self) -> Result<Vec<FeatureRecord>, StoreError> {
        Ok(self.features.clone())
    }

    fn upsert_feature(&mut self, record: &FeatureRecord) -> Result<(), StoreError> {
        self.check_unlocked(&record.id)?;
        self.replace_or_push(record.clone());
        Ok(())
    }

    fn remove_feature(&mut self, id: &str) -> Result<(), StoreError> {
        self.check_unlocked(id)?;
        self.features.retain(|f| f.id != id);
        Ok(())
    }
}
