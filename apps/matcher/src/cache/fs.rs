use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::warn;

use super::{CacheError, CachedRubric, Result, RubricStore};

const FILE_PREFIX: &str = "rubric_";
const FILE_EXT: &str = "json";

/// Filesystem-backed rubric store.
///
/// Layout: `<dir>/rubric_<key>.json`, one pretty-printed JSON record per key.
pub struct FsRubricStore {
    dir: PathBuf,
}

impl FsRubricStore {
    /// Opens (and creates, if needed) the cache directory.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn record_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{FILE_PREFIX}{key}.{FILE_EXT}"))
    }

    fn record_files(&self) -> Result<Vec<PathBuf>> {
        let mut paths = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            let is_record = path.extension().is_some_and(|ext| ext == FILE_EXT)
                && path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with(FILE_PREFIX));
            if is_record {
                paths.push(path);
            }
        }
        paths.sort();
        Ok(paths)
    }
}

impl RubricStore for FsRubricStore {
    fn load(&self, key: &str) -> Result<Option<CachedRubric>> {
        let bytes = match fs::read(self.record_path(key)) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(CacheError::Io(e)),
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|source| CacheError::Corrupt {
                key: key.to_string(),
                source,
            })
    }

    fn save(&self, record: &CachedRubric) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(record)?;

        // Atomic write: temp file in the same directory, then rename over the target.
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(&bytes)?;
        tmp.persist(self.record_path(&record.key))
            .map_err(|e| CacheError::Io(e.error))?;
        Ok(())
    }

    fn list(&self) -> Result<Vec<CachedRubric>> {
        let mut records = Vec::new();
        for path in self.record_files()? {
            let parsed = fs::read(&path)
                .map_err(CacheError::from)
                .and_then(|bytes| serde_json::from_slice(&bytes).map_err(CacheError::from));
            match parsed {
                Ok(record) => records.push(record),
                Err(e) => warn!("Skipping unreadable cache file {}: {e}", path.display()),
            }
        }
        Ok(records)
    }

    fn clear(&self) -> Result<usize> {
        let files = self.record_files()?;
        for path in &files {
            fs::remove_file(path)?;
        }
        Ok(files.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::tests::sample_rubric;
    use crate::cache::{cache_key, RubricCache};

    fn make_store() -> (tempfile::TempDir, FsRubricStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = FsRubricStore::new(dir.path().join("rubrics")).unwrap();
        (dir, store)
    }

    #[test]
    fn test_roundtrip_through_disk() {
        let (_dir, store) = make_store();
        let cache = RubricCache::new(store);
        let posting = "Backend Engineer (Go, Postgres)";

        cache.put(posting, &sample_rubric()).unwrap();
        assert_eq!(cache.get(posting).unwrap(), Some(sample_rubric()));
    }

    #[test]
    fn test_record_file_named_by_key() {
        let (_dir, store) = make_store();
        let path = store.record_path(&cache_key("posting"));
        let cache = RubricCache::new(FsRubricStore::new(store.dir()).unwrap());
        cache.put("posting", &sample_rubric()).unwrap();
        assert!(path.exists());
        assert!(path
            .file_name()
            .unwrap()
            .to_str()
            .unwrap()
            .starts_with("rubric_"));
    }

    #[test]
    fn test_missing_record_is_a_miss() {
        let (_dir, store) = make_store();
        assert!(store.load("0123456789abcdef").unwrap().is_none());
    }

    #[test]
    fn test_corrupt_record_reported() {
        let (_dir, store) = make_store();
        fs::write(store.record_path("deadbeefdeadbeef"), b"{ not json").unwrap();
        assert!(matches!(
            store.load("deadbeefdeadbeef"),
            Err(CacheError::Corrupt { .. })
        ));
    }

    #[test]
    fn test_overwrite_is_last_write_wins() {
        let (_dir, store) = make_store();
        let cache = RubricCache::new(store);
        cache.put_with_model("p", &sample_rubric(), Some("a")).unwrap();
        cache.put_with_model("p", &sample_rubric(), Some("b")).unwrap();
        assert_eq!(cache.list().unwrap().len(), 1);
    }

    #[test]
    fn test_clear_ignores_unrelated_files() {
        let (_dir, store) = make_store();
        fs::write(store.dir().join("notes.txt"), b"keep me").unwrap();
        let dir = store.dir().to_path_buf();
        let cache = RubricCache::new(store);
        cache.put("one", &sample_rubric()).unwrap();
        cache.put("two", &sample_rubric()).unwrap();

        assert_eq!(cache.clear().unwrap(), 2);
        assert!(dir.join("notes.txt").exists());
    }

    #[test]
    fn test_list_skips_corrupt_files() {
        let (_dir, store) = make_store();
        fs::write(store.record_path("ffffffffffffffff"), b"garbage").unwrap();
        let cache = RubricCache::new(store);
        cache.put("valid", &sample_rubric()).unwrap();
        assert_eq!(cache.list().unwrap().len(), 1);
    }

    #[test]
    fn test_record_violating_rubric_invariants_is_corrupt() {
        let (_dir, store) = make_store();
        let path = store.record_path(&cache_key("posting"));
        let cache = RubricCache::new(store);
        cache.put("posting", &sample_rubric()).unwrap();

        let mut record: serde_json::Value =
            serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
        record["rubric"]["criteria"] = serde_json::json!([
            {"name": "A", "weight": 7.0, "description": "", "is_required": true},
            {"name": "A", "weight": -3.0, "description": "", "is_required": true}
        ]);
        fs::write(&path, serde_json::to_vec(&record).unwrap()).unwrap();

        assert!(matches!(
            cache.get("posting"),
            Err(CacheError::Corrupt { .. })
        ));
    }
}
