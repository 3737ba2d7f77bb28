use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use crate::error::{Result, YabuError};
use crate::store::ObjectStore;

/// In-memory object store for tests. Keys sort ascending, which matches the
/// timestamp-in-name ordering a real listing returns.
pub struct MemoryStore {
    objects: Mutex<BTreeMap<String, Vec<u8>>>,
    /// When set, `verify_access` fails as if the bucket were unreachable.
    pub deny_access: AtomicBool,
    /// When set, `put` fails with a non-zero-exit style upload error.
    pub fail_put: AtomicBool,
    /// When set, `list` returns exactly these keys instead of stored ones.
    pub list_override: Mutex<Option<Vec<String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            objects: Mutex::new(BTreeMap::new()),
            deny_access: AtomicBool::new(false),
            fail_put: AtomicBool::new(false),
            list_override: Mutex::new(None),
        }
    }

    pub fn seed(&self, key: &str) {
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), Vec::new());
    }

    pub fn keys(&self) -> Vec<String> {
        self.objects.lock().unwrap().keys().cloned().collect()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.objects.lock().unwrap().contains_key(key)
    }
}

impl ObjectStore for MemoryStore {
    fn verify_access(&self, bucket: &str) -> Result<()> {
        if self.deny_access.load(Ordering::SeqCst) {
            return Err(YabuError::Connectivity(format!(
                "cannot access 's3://{bucket}'"
            )));
        }
        Ok(())
    }

    fn list(&self, _bucket: &str, prefix: &str) -> Result<Vec<String>> {
        if let Some(fixed) = self.list_override.lock().unwrap().clone() {
            return Ok(fixed);
        }
        Ok(self
            .objects
            .lock()
            .unwrap()
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }

    fn put(&self, local: &Path, _bucket: &str, key: &str) -> Result<()> {
        if self.fail_put.load(Ordering::SeqCst) {
            return Err(YabuError::Upload(format!(
                "s3cmd put of '{key}' exited with 1"
            )));
        }
        let data = std::fs::read(local)
            .map_err(|e| YabuError::Upload(format!("cannot read '{}': {e}", local.display())))?;
        self.objects.lock().unwrap().insert(key.to_string(), data);
        Ok(())
    }

    fn delete(&self, _bucket: &str, key: &str) -> Result<()> {
        self.objects.lock().unwrap().remove(key);
        Ok(())
    }
}
