#![forbid(unsafe_code)]
//! Core traits for the dddlib domain library.
//! This crate is storage-agnostic and should not contain any backend-specific logic.

// Re-export for downstream repository implementations.
pub use async_trait::async_trait;

pub mod existence;
pub mod hash_code;
pub mod locator;
pub mod memory;

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

pub use hash_code::HashCodeBuilder;
pub use locator::ResolveError;

/// A backend-agnostic representation of an entity identifier.
/// This is what crosses the `EntityRepository` seam, so repositories never
/// see the concrete key type of the entity they are asked about.
#[derive(Debug, Clone)]
pub enum KeyValue {
    Str(String),
    I32(i32),
    I64(i64),
    U64(u64),
    F64(f64),
    #[cfg(feature = "uuid")]
    Uuid(uuid::Uuid),
    Null,
}

impl KeyValue {
    /// True when the value cannot name a stored record: `Null`, or a numeric
    /// value whose integer part is zero. `NaN` truncates to zero.
    ///
    /// Zero is the "not yet assigned" sentinel for numeric keys only. String
    /// and UUID keys are unassigned solely when absent.
    pub fn is_unassigned(&self) -> bool {
        match self {
            KeyValue::Null => true,
            KeyValue::I32(v) => *v == 0,
            KeyValue::I64(v) => *v == 0,
            KeyValue::U64(v) => *v == 0,
            KeyValue::F64(v) => v.is_nan() || v.trunc() == 0.0,
            KeyValue::Str(_) => false,
            #[cfg(feature = "uuid")]
            KeyValue::Uuid(_) => false,
        }
    }
}

impl PartialEq for KeyValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (KeyValue::Str(a), KeyValue::Str(b)) => a == b,
            (KeyValue::I32(a), KeyValue::I32(b)) => a == b,
            (KeyValue::I64(a), KeyValue::I64(b)) => a == b,
            (KeyValue::U64(a), KeyValue::U64(b)) => a == b,
            // Bitwise so that the relation stays an equivalence (NaN == NaN).
            (KeyValue::F64(a), KeyValue::F64(b)) => a.to_bits() == b.to_bits(),
            #[cfg(feature = "uuid")]
            (KeyValue::Uuid(a), KeyValue::Uuid(b)) => a == b,
            (KeyValue::Null, KeyValue::Null) => true,
            _ => false,
        }
    }
}

impl Eq for KeyValue {}

impl Hash for KeyValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            KeyValue::Str(v) => v.hash(state),
            KeyValue::I32(v) => v.hash(state),
            KeyValue::I64(v) => v.hash(state),
            KeyValue::U64(v) => v.hash(state),
            KeyValue::F64(v) => v.to_bits().hash(state),
            #[cfg(feature = "uuid")]
            KeyValue::Uuid(v) => v.hash(state),
            KeyValue::Null => {}
        }
    }
}

impl fmt::Display for KeyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyValue::Str(v) => write!(f, "{v:?}"),
            KeyValue::I32(v) => write!(f, "{v}"),
            KeyValue::I64(v) => write!(f, "{v}"),
            KeyValue::U64(v) => write!(f, "{v}"),
            KeyValue::F64(v) => write!(f, "{v}"),
            #[cfg(feature = "uuid")]
            KeyValue::Uuid(v) => write!(f, "{v}"),
            KeyValue::Null => f.write_str("null"),
        }
    }
}

/// Types that can serve as an entity identifier.
pub trait EntityKey: Clone + Send + Sync + 'static {
    /// Convert into the type-erased form handed to repositories.
    fn to_key_value(&self) -> KeyValue;
}

macro_rules! impl_entity_key {
    ($($t:ty => $variant:ident as $target:ty),* $(,)?) => {
        $(
            impl EntityKey for $t {
                fn to_key_value(&self) -> KeyValue {
                    KeyValue::$variant(<$target>::from(*self))
                }
            }
        )*
    };
}

impl_entity_key! {
    i16 => I32 as i32,
    i32 => I32 as i32,
    i64 => I64 as i64,
    u16 => I64 as i64,
    u32 => I64 as i64,
    u64 => U64 as u64,
    f32 => F64 as f64,
    f64 => F64 as f64,
}

impl EntityKey for usize {
    fn to_key_value(&self) -> KeyValue {
        KeyValue::U64(*self as u64)
    }
}

impl EntityKey for String {
    fn to_key_value(&self) -> KeyValue {
        KeyValue::Str(self.clone())
    }
}

impl EntityKey for &'static str {
    fn to_key_value(&self) -> KeyValue {
        KeyValue::Str((*self).to_string())
    }
}

#[cfg(feature = "uuid")]
impl EntityKey for uuid::Uuid {
    fn to_key_value(&self) -> KeyValue {
        KeyValue::Uuid(*self)
    }
}

/// The concrete Rust type of an entity, as passed to `EntityRepository::exists`.
#[derive(Debug, Clone, Copy)]
pub struct EntityType {
    id: TypeId,
    name: &'static str,
}

impl EntityType {
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.id
    }

    /// Fully qualified type name, for diagnostics only.
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is<T: ?Sized + 'static>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }
}

impl PartialEq for EntityType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for EntityType {}

impl Hash for EntityType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Trait for entities that have an identifier assigned by the persistence layer.
pub trait Identifiable {
    /// The type of the identifier (e.g., `i64`, `String`).
    type Key: EntityKey;

    /// Returns a copy of the entity's ID, or `None` before it is first saved.
    fn id(&self) -> Option<Self::Key>;
}

/// A domain entity.
///
/// Equality and hashing are part of the contract and must be supplied by the
/// type itself, over stable business-key fields and never the persistence
/// identifier. `#[derive(Entity)]` in `dddlib_macros` generates both from
/// fields marked `#[entity(key)]`.
#[async_trait]
pub trait Entity: Identifiable + Eq + Hash + Send + Sync + Sized + 'static {
    /// The concrete type reported to repositories.
    fn entity_type(&self) -> EntityType {
        EntityType::of::<Self>()
    }

    /// A 32-bit hash code consistent with `Eq`, derived from the `Hash` impl.
    fn hash_code(&self) -> i32 {
        HashCodeBuilder::default().append(self).to_hash_code()
    }

    /// Loosely typed equality: `None` and values of any other type are never equal.
    fn equals(&self, other: Option<&dyn Any>) -> bool {
        other
            .and_then(|o| o.downcast_ref::<Self>())
            .map_or(false, |o| self == o)
    }

    /// Whether a record for this entity exists in `repo`.
    async fn existed_in(&self, repo: &dyn EntityRepository) -> RepoResult<bool> {
        existence::existed_in(self, repo).await
    }

    async fn not_existed_in(&self, repo: &dyn EntityRepository) -> RepoResult<bool> {
        Ok(!self.existed_in(repo).await?)
    }

    /// Whether a record for this entity exists, asking the shared default
    /// repository (see [`existence::repository`]).
    async fn existed(&self) -> RepoResult<bool> {
        existence::existed_in_shared(self).await
    }

    async fn not_existed(&self) -> RepoResult<bool> {
        Ok(!self.existed().await?)
    }
}

/// The storage capability consumed by the existence oracle.
/// Concrete backends provide implementations.
#[async_trait]
pub trait EntityRepository: Send + Sync {
    /// True iff a durable record of `entity_type` keyed by `id` is present.
    /// Unknown or malformed ids should yield `Ok(false)` rather than an error.
    async fn exists(&self, entity_type: EntityType, id: &KeyValue) -> RepoResult<bool>;
}

/// Lightweight, backend-agnostic error type for repository operations.
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    /// No repository could be obtained from the instance factory.
    #[error("repository resolution failed")]
    Resolution(#[from] ResolveError),
    /// The entity has no assigned identifier, so it cannot name a record.
    #[error("entity `{entity}` has no assigned identifier")]
    Transient { entity: &'static str },
    /// Opaque backend error from the underlying repository.
    #[error("backend error")]
    Backend {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl RepoError {
    /// Wrap a backend/driver error.
    pub fn backend<E>(e: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        RepoError::Backend {
            source: Box::new(e),
        }
    }
}

/// Convenience alias for results returned by repository methods.
pub type RepoResult<T> = Result<T, RepoError>;

/// Tests that touch the process-wide repository or instance factory hold this.
#[cfg(test)]
pub(crate) fn serial() -> std::sync::MutexGuard<'static, ()> {
    static GLOBAL: std::sync::Mutex<()> = std::sync::Mutex::new(());
    GLOBAL
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
}
