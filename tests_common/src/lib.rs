//! Common testing utilities: repository doubles and generic checks reusable
//! across `EntityRepository` implementations.

use std::any::Any;
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::{Hash, Hasher};
use std::sync::Mutex;

use async_trait::async_trait;
use dddlib_core::{Entity, EntityRepository, EntityType, KeyValue, RepoError, RepoResult};
use dddlib_macros::Entity;

#[derive(Entity, Clone, Debug)]
pub struct User {
    #[entity(id)]
    pub id: Option<i64>,
    #[entity(key)]
    pub email: String,
    pub active: bool,
}

impl User {
    pub fn new(id: Option<i64>, email: &str) -> Self {
        Self {
            id,
            email: email.to_string(),
            active: true,
        }
    }
}

/// Answers from a lookup table (falling back to `default`) and records every call.
pub struct RecordingRepository {
    default: bool,
    answers: HashMap<(EntityType, KeyValue), bool>,
    calls: Mutex<Vec<(EntityType, KeyValue)>>,
}

impl RecordingRepository {
    pub fn answering(default: bool) -> Self {
        Self {
            default,
            answers: HashMap::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Report `answer` for (`E`, `id`).
    pub fn with_answer<E: Entity>(mut self, id: KeyValue, answer: bool) -> Self {
        self.answers.insert((EntityType::of::<E>(), id), answer);
        self
    }

    pub fn calls(&self) -> Vec<(EntityType, KeyValue)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl EntityRepository for RecordingRepository {
    async fn exists(&self, entity_type: EntityType, id: &KeyValue) -> RepoResult<bool> {
        self.calls.lock().unwrap().push((entity_type, id.clone()));
        Ok(self
            .answers
            .get(&(entity_type, id.clone()))
            .copied()
            .unwrap_or(self.default))
    }
}

/// Fails every call the way an unreachable store would.
#[derive(Debug, Default)]
pub struct FailingRepository;

#[derive(Debug, thiserror::Error)]
#[error("store unavailable")]
pub struct StoreUnavailable;

#[async_trait]
impl EntityRepository for FailingRepository {
    async fn exists(&self, _entity_type: EntityType, _id: &KeyValue) -> RepoResult<bool> {
        Err(RepoError::backend(StoreUnavailable))
    }
}

fn hash_of<T: Hash>(v: &T) -> u64 {
    let mut h = std::collections::hash_map::DefaultHasher::new();
    v.hash(&mut h);
    h.finish()
}

/// Assert the identity contract for a pair of entities of one type.
#[allow(clippy::eq_op)]
pub fn check_identity_contract<E: Entity + Debug>(a: &E, b: &E) {
    assert!(a == a, "equality must be reflexive: {:?}", a);
    assert_eq!(a == b, b == a, "equality must be symmetric");
    if a == b {
        assert_eq!(hash_of(a), hash_of(b), "equal entities must hash alike");
        assert_eq!(a.hash_code(), b.hash_code(), "equal entities must share hash_code");
    }
    assert_eq!(a.equals(Some(b as &dyn Any)), a == b);
    assert!(!a.equals(None), "equals(None) must be false");
    assert!(
        !a.equals(Some(&() as &dyn Any)),
        "equals(unrelated type) must be false"
    );
}

#[async_trait]
pub trait RepoFactory {
    /// Construct a repository in which exactly the users with `stored` ids exist.
    async fn new_user_repo(
        &self,
        stored: &[i64],
    ) -> RepoResult<Box<dyn EntityRepository>>;
}

/// Generic existence test: stored ids are found, others are not, and
/// transient users are never found.
pub async fn test_existence<F: RepoFactory + Sync>(f: &F) -> RepoResult<()> {
    let repo = f.new_user_repo(&[1, 42]).await?;
    let repo = repo.as_ref();

    assert!(User::new(Some(42), "a@example.com").existed_in(repo).await?);
    assert!(User::new(Some(1), "b@example.com").existed_in(repo).await?);
    assert!(User::new(Some(7), "c@example.com").not_existed_in(repo).await?);
    assert!(User::new(Some(0), "d@example.com").not_existed_in(repo).await?);
    assert!(User::new(None, "e@example.com").not_existed_in(repo).await?);
    Ok(())
}
