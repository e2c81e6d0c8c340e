//! Collaborator lookup: a typed instance registry and the process-wide
//! instance factory the shared repository is resolved from.
//!
//! Providers are type-erased so that any container can sit behind
//! [`InstanceProvider`]; [`InstanceLocator`] is the bundled registry.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

#[cfg(feature = "tracing")]
use tracing::debug;

/// A resolved instance: a boxed `Arc<T>` for the requested capability `T`.
pub type Instance = Box<dyn Any + Send + Sync>;

type Factory = Arc<dyn Fn() -> Instance + Send + Sync>;

/// Why a capability could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    /// `InstanceFactory` has no provider installed.
    #[error("no instance provider configured")]
    NoProvider,
    #[error("no implementation of `{capability}` registered")]
    NotRegistered { capability: &'static str },
    #[error("no implementation of `{capability}` registered under `{qualifier}`")]
    QualifierNotRegistered {
        capability: &'static str,
        qualifier: &'static str,
    },
}

/// What is being asked for: a capability type and an optional qualifier
/// selecting one of several implementations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Lookup {
    capability: TypeId,
    capability_name: &'static str,
    qualifier: Option<&'static str>,
}

impl Lookup {
    pub fn of<T: ?Sized + 'static>(qualifier: Option<&'static str>) -> Self {
        Self {
            capability: TypeId::of::<T>(),
            capability_name: std::any::type_name::<T>(),
            qualifier,
        }
    }

    pub fn is<T: ?Sized + 'static>(&self) -> bool {
        self.capability == TypeId::of::<T>()
    }

    pub fn capability_name(&self) -> &'static str {
        self.capability_name
    }

    pub fn qualifier(&self) -> Option<&'static str> {
        self.qualifier
    }

    fn not_found(&self) -> ResolveError {
        match self.qualifier {
            Some(qualifier) => ResolveError::QualifierNotRegistered {
                capability: self.capability_name,
                qualifier,
            },
            None => ResolveError::NotRegistered {
                capability: self.capability_name,
            },
        }
    }
}

/// A source of collaborator instances.
///
/// `provide` must return a boxed `Arc<T>` where `T` is the capability named by
/// the lookup, or `None` when it has nothing registered for it.
pub trait InstanceProvider: Send + Sync {
    fn provide(&self, lookup: &Lookup) -> Option<Instance>;
}

/// Resolve capability `T` from any provider.
pub fn resolve_from<T>(
    provider: &dyn InstanceProvider,
    qualifier: Option<&'static str>,
) -> Result<Arc<T>, ResolveError>
where
    T: ?Sized + Send + Sync + 'static,
{
    let lookup = Lookup::of::<T>(qualifier);
    provider
        .provide(&lookup)
        .and_then(|instance| instance.downcast::<Arc<T>>().ok())
        .map(|arc| *arc)
        .ok_or_else(|| lookup.not_found())
}

/// A registry of instances keyed by capability type and qualifier.
///
/// `T` may be unsized, so trait objects register directly:
///
/// ```
/// use std::sync::Arc;
/// use dddlib_core::locator::InstanceLocator;
/// use dddlib_core::memory::InMemoryEntityRepository;
/// use dddlib_core::EntityRepository;
///
/// let mut locator = InstanceLocator::new();
/// locator.register::<dyn EntityRepository>(Arc::new(InMemoryEntityRepository::new()));
/// assert!(locator.resolve::<dyn EntityRepository>().is_ok());
/// ```
#[derive(Default, Clone)]
pub struct InstanceLocator {
    entries: HashMap<Lookup, Factory>,
}

impl InstanceLocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a shared instance as the default implementation of `T`.
    pub fn register<T>(&mut self, instance: Arc<T>) -> &mut Self
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.insert::<T>(None, instance)
    }

    /// Register a shared instance of `T` under `qualifier`.
    pub fn register_qualified<T>(&mut self, qualifier: &'static str, instance: Arc<T>) -> &mut Self
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.insert::<T>(Some(qualifier), instance)
    }

    /// Register a constructor producing a fresh instance on every resolution.
    pub fn register_factory<T, F>(&mut self, qualifier: Option<&'static str>, make: F) -> &mut Self
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn() -> Arc<T> + Send + Sync + 'static,
    {
        let factory: Factory = Arc::new(move || Box::new(make()) as Instance);
        self.entries.insert(Lookup::of::<T>(qualifier), factory);
        self
    }

    /// Builder-style [`register`](Self::register).
    pub fn with<T>(mut self, instance: Arc<T>) -> Self
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.register::<T>(instance);
        self
    }

    /// Builder-style [`register_qualified`](Self::register_qualified).
    pub fn with_qualified<T>(mut self, qualifier: &'static str, instance: Arc<T>) -> Self
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.register_qualified::<T>(qualifier, instance);
        self
    }

    fn insert<T>(&mut self, qualifier: Option<&'static str>, instance: Arc<T>) -> &mut Self
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let factory: Factory = Arc::new(move || Box::new(Arc::clone(&instance)) as Instance);
        self.entries.insert(Lookup::of::<T>(qualifier), factory);
        self
    }

    pub fn contains<T: ?Sized + 'static>(&self, qualifier: Option<&'static str>) -> bool {
        self.entries.contains_key(&Lookup::of::<T>(qualifier))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn resolve<T>(&self) -> Result<Arc<T>, ResolveError>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        resolve_from::<T>(self, None)
    }

    pub fn resolve_qualified<T>(&self, qualifier: &'static str) -> Result<Arc<T>, ResolveError>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        resolve_from::<T>(self, Some(qualifier))
    }
}

impl InstanceProvider for InstanceLocator {
    fn provide(&self, lookup: &Lookup) -> Option<Instance> {
        self.entries.get(lookup).map(|make| make())
    }
}

impl std::fmt::Debug for InstanceLocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut keys: Vec<_> = self
            .entries
            .keys()
            .map(|k| (k.capability_name, k.qualifier))
            .collect();
        keys.sort_unstable();
        f.debug_struct("InstanceLocator")
            .field("entries", &keys)
            .finish()
    }
}

static PROVIDER: RwLock<Option<Arc<dyn InstanceProvider>>> = RwLock::new(None);

/// Process-wide access to one installed [`InstanceProvider`].
#[derive(Debug, Clone, Copy, Default)]
pub struct InstanceFactory;

impl InstanceFactory {
    /// Install `provider`, returning the one it replaces.
    pub fn set_provider(provider: Arc<dyn InstanceProvider>) -> Option<Arc<dyn InstanceProvider>> {
        #[cfg(feature = "tracing")]
        debug!("instance provider installed");
        PROVIDER
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(provider)
    }

    /// Remove the installed provider.
    pub fn reset() -> Option<Arc<dyn InstanceProvider>> {
        PROVIDER
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    pub fn is_configured() -> bool {
        PROVIDER
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    fn provider() -> Result<Arc<dyn InstanceProvider>, ResolveError> {
        PROVIDER
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(ResolveError::NoProvider)
    }

    pub fn get_instance<T>() -> Result<Arc<T>, ResolveError>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        resolve_from::<T>(Self::provider()?.as_ref(), None)
    }

    /// The implementation of `T` registered under `qualifier`, e.g. the one
    /// carrying a particular marker.
    pub fn get_qualified_instance<T>(qualifier: &'static str) -> Result<Arc<T>, ResolveError>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        resolve_from::<T>(Self::provider()?.as_ref(), Some(qualifier))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash_code::HashCodeBuilder;
    use crate::serial;
    use std::hash::{Hash, Hasher};
    use std::sync::atomic::{AtomicUsize, Ordering};

    trait Service: Send + Sync {
        fn name(&self) -> String;
        fn say_hello(&self) -> String;
    }

    #[derive(Debug, Default)]
    struct MyService1;

    impl Service for MyService1 {
        fn name(&self) -> String {
            "MyService1".into()
        }
        fn say_hello(&self) -> String {
            "I am Service 1".into()
        }
    }

    // The implementation carrying the marker; equality is by name only.
    #[derive(Debug, Default, Clone)]
    struct MyService23;

    impl Service for MyService23 {
        fn name(&self) -> String {
            "MyService23".into()
        }
        fn say_hello(&self) -> String {
            "I am Service 23".into()
        }
    }

    impl PartialEq for MyService23 {
        fn eq(&self, other: &Self) -> bool {
            self.name() == other.name()
        }
    }
    impl Eq for MyService23 {}
    impl Hash for MyService23 {
        fn hash<H: Hasher>(&self, state: &mut H) {
            state.write_i32(
                HashCodeBuilder::new(17, 43)
                    .append(&self.name())
                    .to_hash_code(),
            );
        }
    }

    const THE_ANNOTATION: &str = "TheAnnotation";

    fn locator() -> InstanceLocator {
        InstanceLocator::new()
            .with::<dyn Service>(Arc::new(MyService1))
            .with_qualified::<dyn Service>(THE_ANNOTATION, Arc::new(MyService23))
    }

    #[test]
    fn default_and_qualified_registrations_are_distinct() {
        let l = locator();
        assert_eq!(l.len(), 2);
        assert_eq!(l.resolve::<dyn Service>().unwrap().say_hello(), "I am Service 1");
        let marked = l.resolve_qualified::<dyn Service>(THE_ANNOTATION).unwrap();
        assert_eq!(marked.name(), "MyService23");
        assert_eq!(marked.say_hello(), "I am Service 23");
    }

    #[test]
    fn missing_registrations_name_the_capability() {
        let l = InstanceLocator::new();
        assert!(l.is_empty());
        match l.resolve::<dyn Service>() {
            Err(ResolveError::NotRegistered { capability }) => {
                assert!(capability.contains("Service"))
            }
            other => panic!("unexpected: {:?}", other.map(|_| ())),
        }
        let err = locator()
            .resolve_qualified::<dyn Service>("Other")
            .map(|_| ())
            .unwrap_err();
        assert!(err.to_string().ends_with("registered under `Other`"));
    }

    #[test]
    fn singleton_registration_shares_one_instance() {
        let shared = Arc::new(MyService23);
        let l = InstanceLocator::new().with::<MyService23>(shared.clone());
        let a = l.resolve::<MyService23>().unwrap();
        let b = l.resolve::<MyService23>().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert!(Arc::ptr_eq(&a, &shared));
        assert!(l.contains::<MyService23>(None));
        assert!(!l.contains::<MyService23>(Some(THE_ANNOTATION)));
    }

    #[test]
    fn factory_registration_builds_per_resolution() {
        let built = Arc::new(AtomicUsize::new(0));
        let counter = built.clone();
        let mut l = InstanceLocator::new();
        l.register_factory::<dyn Service, _>(None, move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Arc::new(MyService1)
        });
        let a = l.resolve::<dyn Service>().unwrap();
        let b = l.resolve::<dyn Service>().unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(built.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn resolved_instances_compare_by_name() {
        let l = InstanceLocator::new()
            .with::<MyService23>(Arc::new(MyService23))
            .with_qualified::<MyService23>(THE_ANNOTATION, Arc::new(MyService23));
        let a = l.resolve::<MyService23>().unwrap();
        let b = l.resolve_qualified::<MyService23>(THE_ANNOTATION).unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(*a, *b);
    }

    #[test]
    fn debug_lists_registrations() {
        let dbg = format!("{:?}", locator());
        assert!(dbg.contains("TheAnnotation"));
    }

    #[test]
    fn factory_without_provider_fails() {
        let _g = serial();
        let prev = InstanceFactory::reset();
        assert!(!InstanceFactory::is_configured());
        assert_eq!(
            InstanceFactory::get_instance::<dyn Service>().map(|_| ()),
            Err(ResolveError::NoProvider)
        );
        if let Some(p) = prev {
            InstanceFactory::set_provider(p);
        }
    }

    #[test]
    fn factory_delegates_to_installed_provider() {
        let _g = serial();
        let prev = InstanceFactory::set_provider(Arc::new(locator()));
        assert!(InstanceFactory::is_configured());
        let svc = InstanceFactory::get_instance::<dyn Service>().unwrap();
        assert_eq!(svc.name(), "MyService1");
        let marked = InstanceFactory::get_qualified_instance::<dyn Service>(THE_ANNOTATION).unwrap();
        assert_eq!(marked.name(), "MyService23");
        match prev {
            Some(p) => {
                InstanceFactory::set_provider(p);
            }
            None => {
                InstanceFactory::reset();
            }
        }
    }
}
