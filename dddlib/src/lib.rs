#![forbid(unsafe_code)]
//! Facade crate re-exporting core traits and macros for the `dddlib` library.
//!
//! Add this single crate as a dependency to define entities and ask whether
//! they have been persisted.
//!
//! # Example: Deriving `Entity`
//!
//! ```
//! use dddlib::prelude::*;
//!
//! #[derive(Entity, Clone, Debug)]
//! pub struct Customer {
//!     // The persistence identifier; `None` until first saved.
//!     #[entity(id)]
//!     pub id: Option<i64>,
//!     // Equality and hashing use business-key fields only.
//!     #[entity(key)]
//!     pub email: String,
//!     pub display_name: String,
//! }
//!
//! let transient = Customer { id: None, email: "a@example.com".into(), display_name: "A".into() };
//! let stored = Customer { id: Some(7), email: "a@example.com".into(), display_name: "Ann".into() };
//! assert_eq!(transient, stored);
//! assert_eq!(transient.hash_code(), stored.hash_code());
//! ```
//!
//! # Example: Existence checks
//!
//! ```
//! use std::sync::Arc;
//! use dddlib::prelude::*;
//! use dddlib::memory::InMemoryEntityRepository;
//!
//! #[derive(Entity)]
//! struct Sku {
//!     #[entity(id)]
//!     id: Option<i64>,
//!     #[entity(key)]
//!     code: String,
//! }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> RepoResult<()> {
//! let repo = Arc::new(InMemoryEntityRepository::new());
//! let sku = Sku { id: Some(42), code: "A-1".into() };
//! repo.record(&sku)?;
//!
//! let check = ExistenceCheck::new(repo);
//! assert!(check.existed(&sku).await?);
//! // Never saved: answered without asking the repository.
//! assert!(check.not_existed(&Sku { id: None, code: "B-2".into() }).await?);
//! # Ok(())
//! # }
//! ```
//!
//! The derive expands to `::dddlib_core` paths, so crates deriving `Entity`
//! list `dddlib_core` next to `dddlib` in their dependencies.

use std::sync::Arc;

// Re-export all core traits and types.
pub use dddlib_core::{
    async_trait, Entity, EntityKey, EntityRepository, EntityType, HashCodeBuilder, Identifiable,
    KeyValue, RepoError, RepoResult, ResolveError,
};

// Re-export the derive macro. It shares the trait's name and lives in the macro namespace.
pub use dddlib_macros::Entity;

pub use dddlib_core::existence::{self, ExistenceCheck, RepositoryOverride};
pub use dddlib_core::locator::{self, InstanceFactory, InstanceLocator, InstanceProvider};
pub use dddlib_core::memory;

/// The imports most entity definitions need.
pub mod prelude {
    pub use crate::existence::ExistenceCheck;
    pub use crate::{Entity, EntityRepository, Identifiable, RepoError, RepoResult};
}

/// Explicit startup: install `locator` as the process-wide instance provider
/// and resolve the default `EntityRepository` from it right away, so a
/// missing registration fails here rather than at the first existence check.
pub fn init(locator: InstanceLocator) -> RepoResult<Arc<dyn EntityRepository>> {
    InstanceFactory::set_provider(Arc::new(locator));
    existence::reset_repository();
    existence::repository()
}
