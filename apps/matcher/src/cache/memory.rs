use std::collections::BTreeMap;
use std::sync::RwLock;

use super::{CacheError, CachedRubric, Result, RubricStore};

/// Process-local rubric store. Useful for tests and short-lived batch runs.
#[derive(Default)]
pub struct InMemoryRubricStore {
    records: RwLock<BTreeMap<String, CachedRubric>>,
}

impl RubricStore for InMemoryRubricStore {
    fn load(&self, key: &str) -> Result<Option<CachedRubric>> {
        let records = self.records.read().map_err(|_| CacheError::Poisoned)?;
        Ok(records.get(key).cloned())
    }

    fn save(&self, record: &CachedRubric) -> Result<()> {
        let mut records = self.records.write().map_err(|_| CacheError::Poisoned)?;
        records.insert(record.key.clone(), record.clone());
        Ok(())
    }

    fn list(&self) -> Result<Vec<CachedRubric>> {
        let records = self.records.read().map_err(|_| CacheError::Poisoned)?;
        Ok(records.values().cloned().collect())
    }

    fn clear(&self) -> Result<usize> {
        let mut records = self.records.write().map_err(|_| CacheError::Poisoned)?;
        let removed = records.len();
        records.clear();
        Ok(removed)
    }
}
