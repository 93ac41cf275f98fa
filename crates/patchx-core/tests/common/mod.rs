use patchx_core::model::{FeatureChange, FeatureMode, ParamChange, PatchDocument, DEFAULT_PROJECT};
use patchx_core::ops::StoreError;
use patchx_core::{ConfigStore, FeatureRecord, InMemoryStore};
use std::collections::{BTreeMap, HashMap};

pub const MC_VERSION: &str = "Current Minecraft Version";

/// Build a parameter-only document from `(key, expect, update)` triples
#[allow(dead_code)]
pub fn params_doc(entries: &[(&str, &str, &str)]) -> PatchDocument {
    PatchDocument::new(
        DEFAULT_PROJECT,
        entries
            .iter()
            .map(|(k, e, u)| ParamChange::new(*k, *e, *u))
            .collect(),
        vec![],
    )
    .unwrap()
}

/// Change to feature `id` of type `feature_type`
#[allow(dead_code)]
pub fn feature_change(
    id: &str,
    feature_type: &str,
    mode: FeatureMode,
    fields: &[(&str, &str)],
) -> FeatureChange {
    FeatureChange {
        feature_id: id.to_string(),
        feature_type: Some(feature_type.to_string()),
        mode,
        desired_field_values: fields
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<BTreeMap<_, _>>(),
    }
}

/// Change targeting the project's GitHub issue tracker link
#[allow(dead_code)]
pub fn issue_tracker(mode: FeatureMode, fields: &[(&str, &str)]) -> FeatureChange {
    feature_change("PROJECT_EXT_22", "GitHubIssueTracker", mode, fields)
}

/// Store holding the project state the patches in these tests were recorded against
#[allow(dead_code)]
pub fn structurize_store() -> InMemoryStore {
    let mut store =
        InMemoryStore::with_params([(MC_VERSION, "1.20"), ("Release Branch", "release/1.20")]);
    store.insert_feature(
        FeatureRecord::new("PROJECT_EXT_22", "GitHubIssueTracker")
            .with_field("displayName", "ldtteam/structurize")
            .with_field("repositoryURL", "https://github.com/ldtteam/structurize")
            .with_field("authType", "anonymous"),
    );
    store
}

/// Store granting each budgeted key a fixed number of writes
///
/// Keys without a budget accept every write. Once a key's budget is spent,
/// further writes to it (rollback writes included) are rejected.
#[allow(dead_code)]
pub struct WriteBudgetStore {
    pub inner: InMemoryStore,
    budgets: HashMap<String, usize>,
}

#[allow(dead_code)]
impl WriteBudgetStore {
    pub fn new(inner: InMemoryStore) -> Self {
        Self {
            inner,
            budgets: HashMap::new(),
        }
    }

    pub fn allow(mut self, key: &str, writes: usize) -> Self {
        self.budgets.insert(key.to_string(), writes);
        self
    }

    fn spend(&mut self, key: &str) -> Result<(), StoreError> {
        if let Some(left) = self.budgets.get_mut(key) {
            if *left == 0 {
                return Err(StoreError::Rejected {
                    key: key.to_string(),
                    reason: "write budget exhausted".to_string(),
                });
            }
            *left -= 1;
        }
        Ok(())
    }
}

impl ConfigStore for WriteBudgetStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.inner.get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.spend(key)?;
        self.inner.set(key, value)
    }

    fn list_params(&self) -> Result<Vec<(String, String)>, StoreError> {
        self.inner.list_params()
    }

    fn list_features(&self) -> Result<Vec<FeatureRecord>, StoreError> {
        self.inner.list_features()
    }

    fn upsert_feature(&mut self, record: &FeatureRecord) -> Result<(), StoreError> {
        self.spend(&record.id)?;
        self.inner.upsert_feature(record)
    }

    fn remove_feature(&mut self, id: &str) -> Result<(), StoreError> {
        self.spend(id)?;
        self.inner.remove_feature(id)
    }
}
