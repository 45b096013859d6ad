//! In-memory Entity Repository
//!
//! Each entity sits behind its own lock. Updates mutate a copy and swap it in
//! only when the mutation succeeds, so a failed operation leaves the stored
//! entity untouched and readers never see a half-applied change.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, RwLock};

use labqc_models::{InventoryItem, Sample};
use labqc_utils::{LabQcError, LabQcResult};

/// An entity stored under a string key.
pub trait Entity: Clone + Send + Sync + 'static {
    fn entity_id(&self) -> &str;
}

impl Entity for Sample {
    fn entity_id(&self) -> &str {
        &self.id
    }
}

impl Entity for InventoryItem {
    fn entity_id(&self) -> &str {
        &self.name
    }
}

pub struct InMemoryRepository<V> {
    kind: &'static str,
    entities: RwLock<BTreeMap<String, Arc<Mutex<V>>>>,
}

impl<V: Entity> InMemoryRepository<V> {
    /// `kind` names the entity in error messages, e.g. `"sample"`.
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            entities: RwLock::new(BTreeMap::new()),
        }
    }

    fn slot(&self, id: &str) -> LabQcResult<Option<Arc<Mutex<V>>>> {
        Ok(self.entities.read()?.get(id).cloned())
    }

    fn not_found(&self, id: &str) -> LabQcError {
        LabQcError::not_found(format!("{} {}", self.kind, id))
    }

    pub fn contains(&self, id: &str) -> LabQcResult<bool> {
        Ok(self.entities.read()?.contains_key(id))
    }

    /// Snapshot of one entity.
    pub fn get(&self, id: &str) -> LabQcResult<Option<V>> {
        let Some(slot) = self.slot(id)? else {
            return Ok(None);
        };
        let entity = slot.lock()?.clone();
        Ok(Some(entity))
    }

    /// Like [`get`](Self::get) but a missing entity is an error.
    pub fn fetch(&self, id: &str) -> LabQcResult<V> {
        self.get(id)?.ok_or_else(|| self.not_found(id))
    }

    pub fn insert(&self, entity: V) -> LabQcResult<()> {
        self.insert_with(entity, |_| Ok(()))
    }

    /// Inserts the entity once `before_store` accepts it. The hook runs with
    /// the id reserved, so nothing is stored when it fails.
    pub fn insert_with(
        &self,
        entity: V,
        before_store: impl FnOnce(&V) -> LabQcResult<()>,
    ) -> LabQcResult<()> {
        let mut entities = self.entities.write()?;
        let id = entity.entity_id().to_string();

        if entities.contains_key(&id) {
            return Err(LabQcError::conflict(format!("{} {} already exists", self.kind, id)));
        }

        before_store(&entity)?;
        entities.insert(id, Arc::new(Mutex::new(entity)));
        Ok(())
    }

    /// Applies `apply` to a copy of the entity and stores the copy on success.
    pub fn update<T>(
        &self,
        id: &str,
        apply: impl FnOnce(&mut V) -> LabQcResult<T>,
    ) -> LabQcResult<T> {
        let slot = self.slot(id)?.ok_or_else(|| self.not_found(id))?;
        let mut guard = slot.lock()?;

        let mut copy = guard.clone();
        let output = apply(&mut copy)?;
        *guard = copy;

        Ok(output)
    }

    /// Updates the entity, creating it with `create` first when missing.
    ///
    /// A newly created entity is only stored if `apply` succeeds on it.
    pub fn upsert<T>(
        &self,
        id: &str,
        create: impl FnOnce() -> V,
        apply: impl FnOnce(&mut V) -> LabQcResult<T>,
    ) -> LabQcResult<T> {
        let mut entities = self.entities.write()?;

        if let Some(slot) = entities.get(id).cloned() {
            drop(entities);
            let mut guard = slot.lock()?;
            let mut copy = guard.clone();
            let output = apply(&mut copy)?;
            *guard = copy;
            return Ok(output);
        }

        let mut entity = create();
        let output = apply(&mut entity)?;
        entities.insert(id.to_string(), Arc::new(Mutex::new(entity)));
        Ok(output)
    }

    /// Snapshots of every entity, ordered by id.
    pub fn list(&self) -> LabQcResult<Vec<V>> {
        let slots: Vec<_> = self.entities.read()?.values().cloned().collect();

        let mut snapshots = Vec::with_capacity(slots.len());
        for slot in &slots {
            snapshots.push(slot.lock()?.clone());
        }
        Ok(snapshots)
    }

    pub fn len(&self) -> LabQcResult<usize> {
        Ok(self.entities.read()?.len())
    }

    pub fn is_empty(&self) -> LabQcResult<bool> {
        Ok(self.len()? == 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[derive(Debug, Clone, PartialEq)]
    struct Counter {
        id: String,
        value: i64,
    }

    impl Entity for Counter {
        fn entity_id(&self) -> &str {
            &self.id
        }
    }

    fn counter(id: &str, value: i64) -> Counter {
        Counter {
            id: id.to_string(),
            value,
        }
    }

    #[test]
    fn test_insert_and_get() {
        let repo = InMemoryRepository::new("counter");
        repo.insert(counter("a", 1)).unwrap();

        assert_eq!(repo.get("a").unwrap(), Some(counter("a", 1)));
        assert_eq!(repo.get("b").unwrap(), None);
        assert!(repo.contains("a").unwrap());
    }

    #[test]
    fn test_duplicate_insert_conflicts() {
        let repo = InMemoryRepository::new("counter");
        repo.insert(counter("a", 1)).unwrap();

        let err = repo.insert(counter("a", 2)).unwrap_err();
        assert_eq!(err.error_code(), "CONFLICT");
        assert_eq!(repo.fetch("a").unwrap().value, 1);
    }

    #[test]
    fn test_failed_update_leaves_entity_unchanged() {
        let repo = InMemoryRepository::new("counter");
        repo.insert(counter("a", 5)).unwrap();

        let result: LabQcResult<()> = repo.update("a", |c| {
            c.value = 100;
            Err(LabQcError::validation("value", "rejected"))
        });

        assert!(result.is_err());
        assert_eq!(repo.fetch("a").unwrap().value, 5);
    }

    #[test]
    fn test_rejected_insert_stores_nothing() {
        let repo = InMemoryRepository::new("counter");

        let err = repo
            .insert_with(counter("a", 1), |_| Err(LabQcError::internal("hook failed")))
            .unwrap_err();
        assert_eq!(err.error_code(), "INTERNAL_ERROR");
        assert!(!repo.contains("a").unwrap());

        repo.insert(counter("a", 1)).unwrap();
        let mut hook_ran = false;
        let err = repo
            .insert_with(counter("a", 2), |_| {
                hook_ran = true;
                Ok(())
            })
            .unwrap_err();
        assert_eq!(err.error_code(), "CONFLICT");
        assert!(!hook_ran);
    }

    #[test]
    fn test_update_missing_is_not_found() {
        let repo: InMemoryRepository<Counter> = InMemoryRepository::new("counter");
        let err = repo.update("zzz", |_| Ok(())).unwrap_err();
        assert_eq!(err, LabQcError::not_found("counter zzz"));
    }

    #[test]
    fn test_upsert_creates_only_on_success() {
        let repo = InMemoryRepository::new("counter");

        let failed: LabQcResult<()> = repo.upsert(
            "a",
            || counter("a", 0),
            |_| Err(LabQcError::validation("value", "rejected")),
        );
        assert!(failed.is_err());
        assert!(repo.is_empty().unwrap());

        repo.upsert("a", || counter("a", 0), |c| {
            c.value += 3;
            Ok(())
        })
        .unwrap();
        repo.upsert("a", || counter("a", 0), |c| {
            c.value += 3;
            Ok(())
        })
        .unwrap();
        assert_eq!(repo.fetch("a").unwrap().value, 6);
    }

    #[test]
    fn test_list_is_ordered_by_id() {
        let repo = InMemoryRepository::new("counter");
        repo.insert(counter("b", 2)).unwrap();
        repo.insert(counter("a", 1)).unwrap();

        let ids: Vec<_> = repo.list().unwrap().into_iter().map(|c| c.id).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_concurrent_updates_are_not_lost() {
        let repo = Arc::new(InMemoryRepository::new("counter"));
        repo.insert(counter("a", 0)).unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let repo = Arc::clone(&repo);
                thread::spawn(move || {
                    for _ in 0..100 {
                        repo.update("a", |c| {
                            c.value += 1;
                            Ok(())
                        })
                        .unwrap();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(repo.fetch("a").unwrap().value, 800);
    }
}
