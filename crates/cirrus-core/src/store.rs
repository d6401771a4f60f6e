// ── Shared handle over the persisted user record ──
//
// Every mutating operation in the core goes through `mutate`, which
// applies the change in memory and then writes the record to disk.
// Persistence is fail-open: a failed write keeps the in-memory change,
// logs a warning, and raises the degraded flag for consumers to
// surface as a risk.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use cirrus_config::UserData;
use tracing::warn;

/// Cheaply-cloneable handle over the single durable `UserData` record.
#[derive(Clone)]
pub struct Store {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    path: PathBuf,
    material_dir: PathBuf,
    data: Mutex<UserData>,
    degraded: AtomicBool,
}

impl Store {
    /// Load the record at `path` (built-in defaults if missing or
    /// unreadable) and remember where key material files live.
    pub fn open(path: PathBuf, material_dir: PathBuf) -> Self {
        let data = UserData::load_or_default(&path);
        Self {
            inner: Arc::new(StoreInner {
                path,
                material_dir,
                data: Mutex::new(data),
                degraded: AtomicBool::new(false),
            }),
        }
    }

    /// Read from the record.
    pub fn with<R>(&self, f: impl FnOnce(&UserData) -> R) -> R {
        let guard = self
            .inner
            .data
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        f(&guard)
    }

    /// Mutate the record and persist it synchronously.
    ///
    /// The in-memory state always reflects the change, even when the
    /// write fails (fail-open).
    pub fn mutate<R>(&self, f: impl FnOnce(&mut UserData) -> R) -> R {
        let mut guard = self
            .inner
            .data
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let out = f(&mut guard);

        match guard.save(&self.inner.path) {
            Ok(()) => self.inner.degraded.store(false, Ordering::Relaxed),
            Err(e) => {
                warn!(path = %self.inner.path.display(), error = %e,
                      "failed to persist user data; in-memory state retained");
                self.inner.degraded.store(true, Ordering::Relaxed);
            }
        }
        out
    }

    /// `true` when the most recent save failed -- the in-memory state
    /// is ahead of the disk record.
    pub fn persistence_degraded(&self) -> bool {
        self.inner.degraded.load(Ordering::Relaxed)
    }

    /// Directory holding exported `.pem` files.
    pub fn material_dir(&self) -> &Path {
        &self.inner.material_dir
    }

    /// Path of the `.pem` file for a key pair name.
    pub fn material_path(&self, key_name: &str) -> PathBuf {
        self.inner.material_dir.join(format!("{key_name}.pem"))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn mutate_persists_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("user_data.toml");
        let store = Store::open(path.clone(), dir.path().join("keys"));

        store.mutate(|d| d.instance_types.push("c5.large".into()));
        assert!(!store.persistence_degraded());

        let reloaded = UserData::load_or_default(&path);
        assert_eq!(reloaded.instance_types, vec!["c5.large".to_owned()]);
    }

    #[test]
    fn failed_save_keeps_memory_and_flags_degradation() {
        let dir = tempfile::tempdir().unwrap();
        // A directory at the record path makes every write fail.
        let path = dir.path().join("blocked");
        std::fs::create_dir_all(&path).unwrap();
        let store = Store::open(path, dir.path().join("keys"));

        store.mutate(|d| d.instance_types.push("c5.large".into()));
        assert!(store.persistence_degraded());
        assert_eq!(store.with(|d| d.instance_types.len()), 1);
    }
}
