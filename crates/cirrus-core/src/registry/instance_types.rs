// ── Curated instance-type registry ──
//
// A plain allow-list of type identifiers, persisted in the user
// record and never validated against the control plane.

use crate::error::{CreateError, DeleteError};
use crate::store::Store;

pub struct InstanceTypeRegistry {
    store: Store,
}

impl InstanceTypeRegistry {
    pub(crate) fn new(store: Store) -> Self {
        Self { store }
    }

    pub fn list(&self) -> Vec<String> {
        self.store.with(|d| d.instance_types.clone())
    }

    pub fn add(&self, instance_type: &str) -> Result<(), CreateError> {
        let instance_type = instance_type.trim().to_owned();
        if instance_type.is_empty() {
            return Err(CreateError::EmptyName);
        }
        let duplicate = self
            .store
            .with(|d| d.instance_types.iter().any(|t| t == &instance_type));
        if duplicate {
            return Err(CreateError::DuplicateName(instance_type));
        }
        self.store.mutate(|d| d.instance_types.push(instance_type));
        Ok(())
    }

    pub fn delete(&self, instance_type: &str) -> Result<(), DeleteError> {
        let exists = self
            .store
            .with(|d| d.instance_types.iter().any(|t| t == instance_type));
        if !exists {
            return Err(DeleteError::NotFound(instance_type.to_owned()));
        }
        self.store
            .mutate(|d| d.instance_types.retain(|t| t != instance_type));
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn registry() -> (tempfile::TempDir, InstanceTypeRegistry) {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path().join("user_data.toml"), dir.path().join("keys"));
        (dir, InstanceTypeRegistry::new(store))
    }

    #[test]
    fn add_list_delete_round_trip() {
        let (_dir, reg) = registry();
        reg.add("p3.2xlarge").unwrap();
        reg.add(" c5.large ").unwrap();
        assert_eq!(reg.list(), vec!["p3.2xlarge", "c5.large"]);

        reg.delete("p3.2xlarge").unwrap();
        assert_eq!(reg.list(), vec!["c5.large"]);
    }

    #[test]
    fn duplicates_and_empties_rejected_locally() {
        let (_dir, reg) = registry();
        reg.add("c5.large").unwrap();
        assert!(matches!(reg.add("c5.large"), Err(CreateError::DuplicateName(_))));
        assert!(matches!(reg.add("   "), Err(CreateError::EmptyName)));
    }

    #[test]
    fn delete_unknown_is_not_found() {
        let (_dir, reg) = registry();
        assert!(matches!(reg.delete("m5.large"), Err(DeleteError::NotFound(_))));
    }
}
