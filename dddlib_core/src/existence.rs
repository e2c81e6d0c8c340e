//! The existence oracle: does a durable record for this entity already exist?
//!
//! The check never touches a repository for an entity whose identifier is
//! absent or a numeric zero. Callers either
//! inject the repository explicitly ([`ExistenceCheck`], [`Entity::existed_in`])
//! or rely on the process-wide default held here ([`repository`]), which is
//! resolved lazily from the global [`InstanceFactory`].

use std::sync::{Arc, PoisonError, RwLock};

use crate::locator::InstanceFactory;
use crate::{Entity, EntityKey, EntityRepository, EntityType, KeyValue, RepoResult};

#[cfg(feature = "tracing")]
use tracing::{debug, trace, warn};

static REPOSITORY: RwLock<Option<Arc<dyn EntityRepository>>> = RwLock::new(None);

/// The entity's key if it can name a stored record: present and, for numeric
/// keys, non-zero.
fn assigned_key<E: Entity>(entity: &E) -> Option<KeyValue> {
    let Some(id) = entity.id() else {
        #[cfg(feature = "tracing")]
        trace!(entity = std::any::type_name::<E>(), "no identifier; not existed");
        return None;
    };
    let key = id.to_key_value();
    if key.is_unassigned() {
        #[cfg(feature = "tracing")]
        trace!(entity = std::any::type_name::<E>(), id = %key, "sentinel identifier; not existed");
        return None;
    }
    Some(key)
}

async fn ask(
    repo: &dyn EntityRepository,
    entity_type: EntityType,
    key: &KeyValue,
) -> RepoResult<bool> {
    let outcome = repo.exists(entity_type, key).await;
    #[cfg(feature = "tracing")]
    {
        match &outcome {
            Ok(found) => debug!(entity = entity_type.name(), id = %key, found = *found, "existence check"),
            Err(e) => warn!(entity = entity_type.name(), id = %key, error = %e, "existence check failed"),
        }
    }
    outcome
}

pub(crate) async fn existed_in<E: Entity>(
    entity: &E,
    repo: &dyn EntityRepository,
) -> RepoResult<bool> {
    match assigned_key(entity) {
        Some(key) => ask(repo, EntityType::of::<E>(), &key).await,
        None => Ok(false),
    }
}

/// Like [`existed_in`], against the shared default. The default is only
/// resolved once the entity has an assigned key.
pub(crate) async fn existed_in_shared<E: Entity>(entity: &E) -> RepoResult<bool> {
    match assigned_key(entity) {
        Some(key) => {
            let repo = repository()?;
            ask(repo.as_ref(), EntityType::of::<E>(), &key).await
        }
        None => Ok(false),
    }
}

/// The shared default repository, resolving it from the [`InstanceFactory`]
/// on first use.
///
/// Resolution happens under the write lock and re-checks the slot first, so
/// concurrent first callers resolve exactly once. A failed resolution leaves
/// the slot empty and is retried by the next caller.
pub fn repository() -> RepoResult<Arc<dyn EntityRepository>> {
    {
        let slot = REPOSITORY.read().unwrap_or_else(PoisonError::into_inner);
        if let Some(repo) = slot.as_ref() {
            return Ok(Arc::clone(repo));
        }
    }

    let mut slot = REPOSITORY.write().unwrap_or_else(PoisonError::into_inner);
    if let Some(repo) = slot.as_ref() {
        return Ok(Arc::clone(repo));
    }
    let repo = match InstanceFactory::get_instance::<dyn EntityRepository>() {
        Ok(repo) => repo,
        Err(e) => {
            #[cfg(feature = "tracing")]
            warn!(error = %e, "cannot resolve the default entity repository");
            return Err(e.into());
        }
    };
    #[cfg(feature = "tracing")]
    debug!("default entity repository resolved");
    *slot = Some(Arc::clone(&repo));
    Ok(repo)
}

/// Replace the shared default repository, returning the previous one.
pub fn set_repository(repo: Arc<dyn EntityRepository>) -> Option<Arc<dyn EntityRepository>> {
    REPOSITORY
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .replace(repo)
}

/// Clear the shared default repository so the next use resolves afresh.
/// Call between independent tests.
pub fn reset_repository() -> Option<Arc<dyn EntityRepository>> {
    REPOSITORY
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .take()
}

/// Install `repo` as the shared default until the returned guard is dropped,
/// at which point whatever was there before is put back.
pub fn override_repository(repo: Arc<dyn EntityRepository>) -> RepositoryOverride {
    RepositoryOverride {
        previous: set_repository(repo),
    }
}

/// Guard returned by [`override_repository`].
#[must_use = "the override is undone as soon as the guard is dropped"]
pub struct RepositoryOverride {
    previous: Option<Arc<dyn EntityRepository>>,
}

impl Drop for RepositoryOverride {
    fn drop(&mut self) {
        *REPOSITORY.write().unwrap_or_else(PoisonError::into_inner) = self.previous.take();
    }
}

/// Existence checks against an explicitly supplied repository.
#[derive(Clone)]
pub struct ExistenceCheck {
    repository: Arc<dyn EntityRepository>,
}

impl ExistenceCheck {
    pub fn new(repository: Arc<dyn EntityRepository>) -> Self {
        Self { repository }
    }

    /// Bind to the shared default repository as it is right now.
    pub fn from_shared() -> RepoResult<Self> {
        Ok(Self::new(repository()?))
    }

    pub fn repository(&self) -> &Arc<dyn EntityRepository> {
        &self.repository
    }

    pub async fn existed<E: Entity>(&self, entity: &E) -> RepoResult<bool> {
        existed_in(entity, self.repository.as_ref()).await
    }

    pub async fn not_existed<E: Entity>(&self, entity: &E) -> RepoResult<bool> {
        Ok(!self.existed(entity).await?)
    }
}

impl std::fmt::Debug for ExistenceCheck {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExistenceCheck").finish_non_exhaustive()
    }
}
