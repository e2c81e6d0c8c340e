//! An in-process `EntityRepository` for tests and prototypes.

use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

use crate::{
    async_trait, Entity, EntityKey, EntityRepository, EntityType, KeyValue, RepoError, RepoResult,
};

/// Remembers which (type, id) pairs have been stored.
#[derive(Debug, Default)]
pub struct InMemoryEntityRepository {
    records: Mutex<HashSet<(EntityType, KeyValue)>>,
}

impl InMemoryEntityRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn records(&self) -> std::sync::MutexGuard<'_, HashSet<(EntityType, KeyValue)>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Mark `entity` as stored. Fails for an entity without an assigned id.
    pub fn record<E: Entity>(&self, entity: &E) -> RepoResult<()> {
        let key = entity
            .id()
            .map(|id| id.to_key_value())
            .filter(|k| !k.is_unassigned())
            .ok_or(RepoError::Transient {
                entity: std::any::type_name::<E>(),
            })?;
        self.records().insert((EntityType::of::<E>(), key));
        Ok(())
    }

    /// Mark a raw (type, id) pair as stored.
    pub fn record_key(&self, entity_type: EntityType, id: KeyValue) {
        self.records().insert((entity_type, id));
    }

    /// Drop the record for `entity`; true if one was present.
    pub fn forget<E: Entity>(&self, entity: &E) -> bool {
        match entity.id() {
            Some(id) => self
                .records()
                .remove(&(EntityType::of::<E>(), id.to_key_value())),
            None => false,
        }
    }

    pub fn contains(&self, entity_type: EntityType, id: &KeyValue) -> bool {
        // HashSet lookup needs an owned tuple key.
        self.records().contains(&(entity_type, id.clone()))
    }

    pub fn clear(&self) {
        self.records().clear();
    }

    pub fn len(&self) -> usize {
        self.records().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records().is_empty()
    }
}

#[async_trait]
impl EntityRepository for InMemoryEntityRepository {
    async fn exists(&self, entity_type: EntityType, id: &KeyValue) -> RepoResult<bool> {
        Ok(self.contains(entity_type, id))
    }
}
