//! Dependency injection container
//!
//! The `Container` owns a frozen registry and resolves object graphs on
//! demand, honouring each registration's [`Scope`].

use crate::builder::with_self_registration;
use crate::factory::AnyFactory;
use crate::graph::GraphValidator;
use crate::storage::{Registry, SingletonStore};
use crate::{
    DiError, Factory, FixedArgs, Injectable, Instance, Registration, Result, Scope, SymbolTable,
    TypeKey,
};
use ahash::RandomState;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

#[cfg(feature = "logging")]
use tracing::{debug, trace};

// =============================================================================
// Per-call cache
// =============================================================================

/// Instances of `Cached` services built during one top-level resolve.
///
/// Owned by the call, not the container: concurrent top-level resolves on
/// one container never see each other's entries, and the cache is gone when
/// the call returns.
#[derive(Default)]
struct ResolutionCache {
    instances: HashMap<TypeKey, Instance, RandomState>,
}

impl ResolutionCache {
    #[inline]
    fn get(&self, key: &TypeKey) -> Option<Instance> {
        self.instances.get(key).cloned()
    }

    #[inline]
    fn insert(&mut self, key: TypeKey, instance: Instance) {
        self.instances.insert(key, instance);
    }

    #[cfg(feature = "logging")]
    fn len(&self) -> usize {
        self.instances.len()
    }
}

// =============================================================================
// Container
// =============================================================================

struct ContainerInner {
    id: u64,
    registry: Registry,
    symbols: SymbolTable,
    singletons: SingletonStore,
}

/// A validated, immutable set of registrations plus its singleton store.
///
/// Built by [`ContainerBuilder::build`](crate::ContainerBuilder::build).
/// Cloning is cheap and yields a handle to the same container: same
/// registrations, same singletons.
///
/// # Thread safety
///
/// `Container` is `Send + Sync` and `resolve()` may be called from several
/// threads at once. Each top-level call keeps its own cache of `Cached`
/// instances, and each singleton is built at most once even when first
/// requested concurrently. Factories themselves run on the calling thread;
/// one that never returns blocks that call.
///
/// # Examples
///
/// ```rust
/// use depgraph_di::{ContainerBuilder, FixedArgs, FnFactory, Signature, TypeKey};
///
/// struct Clock;
///
/// let mut builder = ContainerBuilder::new();
/// builder.cached(
///     TypeKey::of::<Clock>(),
///     FnFactory::new(Signature::new(), |_| Ok(Clock)),
///     FixedArgs::new(),
/// )?;
/// let container = builder.build()?;
///
/// let a = container.get::<Clock>()?;
/// let b = container.get::<Clock>()?;
/// // Separate top-level calls, separate cached instances
/// assert!(!std::sync::Arc::ptr_eq(&a, &b));
/// # Ok::<(), depgraph_di::DiError>(())
/// ```
#[derive(Clone)]
pub struct Container {
    inner: Arc<ContainerInner>,
}

impl Container {
    pub(crate) fn from_parts(registry: Registry, symbols: SymbolTable) -> Self {
        static NEXT_ID: AtomicU64 = AtomicU64::new(1);
        let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);

        #[cfg(feature = "logging")]
        debug!(
            target: "depgraph_di",
            container_id = id,
            service_count = registry.len(),
            "Creating DI container"
        );

        Self {
            inner: Arc::new(ContainerInner {
                id,
                registry,
                symbols,
                singletons: SingletonStore::new(),
            }),
        }
    }

    // =========================================================================
    // Resolution
    // =========================================================================

    /// Resolve `key` and its dependency subtree.
    ///
    /// Forward references and short names are mapped through the symbol
    /// table first. `Cached` services are shared across everything built by
    /// this one call and discarded when it returns.
    pub fn resolve(&self, key: &TypeKey) -> Result<Instance> {
        let mut cache = ResolutionCache::default();
        let result = self.resolve_in(key, &mut cache, None);

        #[cfg(feature = "logging")]
        trace!(
            target: "depgraph_di",
            container_id = self.inner.id,
            service = %key,
            cached = cache.len(),
            ok = result.is_ok(),
            "Top-level resolve finished"
        );

        result
    }

    /// Resolve `key` and downcast to `T`
    pub fn resolve_as<T: Injectable>(&self, key: &TypeKey) -> Result<Arc<T>> {
        self.resolve(key)?
            .downcast::<T>()
            .map_err(|_| DiError::type_mismatch::<T>(key))
    }

    /// Resolve the service registered under `TypeKey::of::<T>()`
    #[inline]
    pub fn get<T: Injectable>(&self) -> Result<Arc<T>> {
        self.resolve_as::<T>(&TypeKey::of::<T>())
    }

    /// Like [`get`](Self::get), discarding the error
    #[inline]
    pub fn try_get<T: Injectable>(&self) -> Option<Arc<T>> {
        self.get::<T>().ok()
    }

    fn resolve_in(
        &self,
        requested: &TypeKey,
        cache: &mut ResolutionCache,
        parent: Option<&TypeKey>,
    ) -> Result<Instance> {
        let inner = &*self.inner;
        let key = inner.symbols.canonicalize(requested);

        if let Some(instance) = inner.singletons.get(&key) {
            #[cfg(feature = "logging")]
            trace!(
                target: "depgraph_di",
                service = %key,
                location = "singleton",
                "Service resolved from singleton store"
            );
            return Ok(instance);
        }

        if let Some(instance) = cache.get(&key) {
            #[cfg(feature = "logging")]
            trace!(
                target: "depgraph_di",
                service = %key,
                location = "call_cache",
                "Service resolved from per-call cache"
            );
            return Ok(instance);
        }

        let Some(registration) = inner.registry.get(&key) else {
            #[cfg(feature = "logging")]
            debug!(
                target: "depgraph_di",
                service = %key,
                requested_by = ?parent.map(ToString::to_string),
                "Service not found"
            );
            return Err(DiError::not_found(&key, parent));
        };

        let factory: &dyn Factory = match registration.factory() {
            AnyFactory::Declared(factory) => factory.as_ref(),
            // Never stored: the store would then own a handle to its own container
            AnyFactory::Container => return Ok(Arc::new(self.clone()) as Instance),
        };

        match registration.scope() {
            Scope::Singleton => {
                let slot = inner.singletons.slot(&key);
                slot.get_or_try_init(|| self.construct(registration, factory, cache))
                    .map(Arc::clone)
            }
            Scope::Cached => {
                let instance = self.construct(registration, factory, cache)?;
                cache.insert(key, Arc::clone(&instance));
                Ok(instance)
            }
            Scope::Transient => self.construct(registration, factory, cache),
        }
    }

    /// Assemble arguments and invoke the factory
    fn construct(
        &self,
        registration: &Registration,
        factory: &dyn Factory,
        cache: &mut ResolutionCache,
    ) -> Result<Instance> {
        #[cfg(feature = "logging")]
        trace!(
            target: "depgraph_di",
            service = %registration.key(),
            scope = registration.scope().as_str(),
            dependencies = registration.dependencies().len(),
            "Constructing service"
        );

        let mut args = registration.fixed_args().constants();
        for dependency in registration.dependencies() {
            let instance = self.resolve_in(&dependency.key, cache, Some(registration.key()))?;
            args.insert(Arc::clone(&dependency.param), instance);
        }

        factory.call(&args)
    }

    // =========================================================================
    // Overrides
    // =========================================================================

    /// Derive a container with the registration for `key` replaced.
    ///
    /// The derived container gets its own copy of the registry and symbol
    /// table, a fresh singleton store, and injects itself wherever the
    /// container is requested. The graph is validated again. `self` is
    /// left untouched.
    pub fn with_overridden<F: Factory + 'static>(
        &self,
        key: TypeKey,
        factory: F,
        scope: Scope,
        fixed: FixedArgs,
    ) -> Result<Container> {
        let key = self.inner.symbols.canonicalize(&key);

        if key == TypeKey::of::<Container>() {
            return Err(DiError::InvalidOverride {
                type_name: key.to_string(),
                reason: "the container always provides itself".into(),
            });
        }
        if !self.inner.registry.contains(&key) {
            return Err(DiError::InvalidOverride {
                type_name: key.to_string(),
                reason: "it has no registration".into(),
            });
        }

        let registration =
            Registration::new(key, AnyFactory::Declared(Arc::new(factory)), scope, fixed)?;

        #[cfg(feature = "logging")]
        debug!(
            target: "depgraph_di",
            container_id = self.inner.id,
            service = %registration.key(),
            scope = registration.scope().as_str(),
            "Overriding service in derived container"
        );

        let mut registry = self.inner.registry.clone();
        let mut symbols = self.inner.symbols.clone();
        symbols.insert(registration.key());
        registry.insert(registration);

        let (registry, symbols) = with_self_registration(registry, symbols);
        GraphValidator::new(&registry, &symbols).validate()?;

        Ok(Container::from_parts(registry, symbols))
    }

    /// [`with_overridden`](Self::with_overridden) with singleton scope
    pub fn with_overridden_singleton<F: Factory + 'static>(
        &self,
        key: TypeKey,
        factory: F,
        fixed: FixedArgs,
    ) -> Result<Container> {
        self.with_overridden(key, factory, Scope::Singleton, fixed)
    }

    // =========================================================================
    // Introspection
    // =========================================================================

    /// All registered keys, including the container's own
    pub fn registered_types(&self) -> HashSet<TypeKey> {
        self.inner.registry.keys().cloned().collect()
    }

    /// True if `key` (or the key it names) is registered
    pub fn contains(&self, key: &TypeKey) -> bool {
        self.inner
            .registry
            .contains(&self.inner.symbols.canonicalize(key))
    }

    /// Registration for `key` (or the key it names)
    pub fn registration(&self, key: &TypeKey) -> Option<&Registration> {
        self.inner.registry.get(&self.inner.symbols.canonicalize(key))
    }

    /// Number of registrations
    pub fn len(&self) -> usize {
        self.inner.registry.len()
    }

    /// Always false for a built container, which registers itself
    pub fn is_empty(&self) -> bool {
        self.inner.registry.is_empty()
    }

    /// Number of singletons built so far
    pub fn resolved_singletons(&self) -> usize {
        self.inner.singletons.len()
    }

    /// Identifier unique to this container (shared by its clones)
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// True if both handles refer to the same container
    pub fn ptr_eq(a: &Container, b: &Container) -> bool {
        Arc::ptr_eq(&a.inner, &b.inner)
    }
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("id", &self.inner.id)
            .field("service_count", &self.len())
            .field("singletons", &self.inner.singletons)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Args, ContainerBuilder, FnFactory, Signature};
    use std::sync::atomic::AtomicU32;

    #[derive(Debug, PartialEq)]
    struct Config {
        url: String,
    }

    struct Database {
        config: Arc<Config>,
    }

    struct Repository {
        db: Arc<Database>,
    }

    struct Handler {
        repo: Arc<Repository>,
        db: Arc<Database>,
    }

    fn config_factory() -> FnFactory {
        FnFactory::new(Signature::new().param("url", TypeKey::of::<String>()), |args| {
            Ok(Config {
                url: args.cloned("url")?,
            })
        })
    }

    fn database_factory() -> FnFactory {
        FnFactory::new(
            Signature::new().param("config", TypeKey::of::<Config>()),
            |args| {
                Ok(Database {
                    config: args.get("config")?,
                })
            },
        )
    }

    fn repository_factory() -> FnFactory {
        FnFactory::new(
            Signature::new().param("db", TypeKey::of::<Database>()),
            |args| Ok(Repository { db: args.get("db")? }),
        )
    }

    fn handler_factory() -> FnFactory {
        FnFactory::new(
            Signature::new()
                .param("repo", TypeKey::of::<Repository>())
                .param("db", TypeKey::of::<Database>()),
            |args| {
                Ok(Handler {
                    repo: args.get("repo")?,
                    db: args.get("db")?,
                })
            },
        )
    }

    fn app(db_scope: Scope) -> Container {
        let mut builder = ContainerBuilder::new();
        builder
            .singleton(
                TypeKey::of::<Config>(),
                config_factory(),
                FixedArgs::new().value("url", String::from("postgres://localhost")),
            )
            .unwrap();
        builder
            .register(TypeKey::of::<Database>(), database_factory(), db_scope, FixedArgs::new())
            .unwrap();
        builder
            .register(
                TypeKey::of::<Repository>(),
                repository_factory(),
                Scope::Transient,
                FixedArgs::new(),
            )
            .unwrap();
        builder
            .register(TypeKey::of::<Handler>(), handler_factory(), Scope::Transient, FixedArgs::new())
            .unwrap();
        builder.build().unwrap()
    }

    #[test]
    fn test_transient_fresh_each_time() {
        let container = app(Scope::Transient);

        let a = container.get::<Repository>().unwrap();
        let b = container.get::<Repository>().unwrap();

        assert!(!Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a.db, &b.db));
        // Config is a singleton underneath both
        assert!(Arc::ptr_eq(&a.db.config, &b.db.config));
        assert_eq!(a.db.config.url, "postgres://localhost");
    }

    #[test]
    fn test_singleton_shared_across_calls() {
        let container = app(Scope::Singleton);

        let a = container.get::<Database>().unwrap();
        let b = container.get::<Repository>().unwrap();
        let c = container.get::<Handler>().unwrap();

        assert!(Arc::ptr_eq(&a, &b.db));
        assert!(Arc::ptr_eq(&a, &c.db));
        assert_eq!(container.resolved_singletons(), 2);
    }

    #[test]
    fn test_cached_shared_within_one_call() {
        let container = app(Scope::Cached);

        let first = container.get::<Handler>().unwrap();
        // Handler and its Repository both depend on Database in one call
        assert!(Arc::ptr_eq(&first.db, &first.repo.db));

        let second = container.get::<Handler>().unwrap();
        assert!(Arc::ptr_eq(&second.db, &second.repo.db));
        assert!(!Arc::ptr_eq(&first.db, &second.db));
    }

    #[test]
    fn test_transient_not_shared_within_one_call() {
        let container = app(Scope::Transient);
        let handler = container.get::<Handler>().unwrap();
        assert!(!Arc::ptr_eq(&handler.db, &handler.repo.db));
    }

    #[test]
    fn test_singleton_built_once() {
        static BUILT: AtomicU32 = AtomicU32::new(0);

        let mut builder = ContainerBuilder::new();
        builder
            .singleton(
                TypeKey::named("Counter"),
                FnFactory::new(Signature::new(), |_| {
                    Ok(BUILT.fetch_add(1, Ordering::SeqCst))
                }),
                FixedArgs::new(),
            )
            .unwrap();
        let container = builder.build().unwrap();

        for _ in 0..5 {
            container.resolve(&TypeKey::named("Counter")).unwrap();
        }
        assert_eq!(BUILT.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_resolve_by_forward_name() {
        let container = app(Scope::Transient);
        let repo = container
            .resolve_as::<Repository>(&TypeKey::forward("Repository"))
            .unwrap();
        assert_eq!(repo.db.config.url, "postgres://localhost");
    }

    #[test]
    fn test_not_found_at_runtime() {
        let container = app(Scope::Transient);
        let err = container.resolve(&TypeKey::named("Unregistered")).err().unwrap();
        assert_eq!(err, DiError::not_found(&TypeKey::named("Unregistered"), None));
    }

    #[test]
    fn test_type_mismatch() {
        let container = app(Scope::Transient);
        let err = container
            .resolve_as::<Config>(&TypeKey::of::<Database>())
            .err()
            .unwrap();
        assert!(matches!(err, DiError::TypeMismatch { .. }));
    }

    #[test]
    fn test_dependency_marker_redirects() {
        struct Primary;
        struct Replica;
        struct Reader {
            source: &'static str,
        }

        let mut builder = ContainerBuilder::new();
        builder
            .register(
                TypeKey::of::<Primary>(),
                FnFactory::value(Primary),
                Scope::Singleton,
                FixedArgs::new(),
            )
            .unwrap();
        builder
            .register(
                TypeKey::of::<Replica>(),
                FnFactory::value(Replica),
                Scope::Singleton,
                FixedArgs::new(),
            )
            .unwrap();
        builder
            .register(
                TypeKey::of::<Reader>(),
                FnFactory::new(
                    Signature::new().param("source", TypeKey::of::<Primary>()),
                    |args: &Args| {
                        let source = args.instance("source").unwrap();
                        Ok(Reader {
                            source: if source.is::<Replica>() { "replica" } else { "primary" },
                        })
                    },
                ),
                Scope::Transient,
                FixedArgs::new().dependency("source", TypeKey::of::<Replica>()),
            )
            .unwrap();

        let container = builder.build().unwrap();
        assert_eq!(container.get::<Reader>().unwrap().source, "replica");
    }

    #[test]
    fn test_container_injects_itself() {
        struct NeedsContainer {
            container: Arc<Container>,
        }

        let mut builder = ContainerBuilder::new();
        builder
            .register(
                TypeKey::of::<NeedsContainer>(),
                FnFactory::new(
                    Signature::new().param("container", TypeKey::of::<Container>()),
                    |args| {
                        Ok(NeedsContainer {
                            container: args.get("container")?,
                        })
                    },
                ),
                Scope::Transient,
                FixedArgs::new(),
            )
            .unwrap();
        let container = builder.build().unwrap();

        let service = container.get::<NeedsContainer>().unwrap();
        assert!(Container::ptr_eq(&service.container, &container));

        let direct = container.get::<Container>().unwrap();
        assert!(Container::ptr_eq(&direct, &container));
    }

    #[test]
    fn test_factory_error_propagates() {
        let mut builder = ContainerBuilder::new();
        builder
            .register(
                TypeKey::named("Broken"),
                FnFactory::new(Signature::new(), |_| -> Result<()> {
                    Err(DiError::creation_failed(&TypeKey::named("Broken"), "boom"))
                }),
                Scope::Singleton,
                FixedArgs::new(),
            )
            .unwrap();
        let container = builder.build().unwrap();

        let err = container.resolve(&TypeKey::named("Broken")).err().unwrap();
        assert!(matches!(err, DiError::CreationFailed { ref reason, .. } if reason == "boom"));
        // A failed singleton is not stored
        assert_eq!(container.resolved_singletons(), 0);
    }

    #[test]
    fn test_override_replaces_and_isolates() {
        let base = app(Scope::Singleton);
        let base_db = base.get::<Database>().unwrap();

        let derived = base
            .with_overridden_singleton(
                TypeKey::of::<Config>(),
                FnFactory::value(Config {
                    url: "sqlite::memory:".into(),
                }),
                FixedArgs::new(),
            )
            .unwrap();

        let derived_repo = derived.get::<Repository>().unwrap();
        assert_eq!(derived_repo.db.config.url, "sqlite::memory:");

        // Base keeps its registration and its singletons
        assert_eq!(base.get::<Config>().unwrap().url, "postgres://localhost");
        assert!(Arc::ptr_eq(&base_db, &base.get::<Database>().unwrap()));
        assert!(!Arc::ptr_eq(&base_db, &derived.get::<Database>().unwrap()));
    }

    #[test]
    fn test_override_injects_derived_container() {
        let base = app(Scope::Transient);
        let derived = base
            .with_overridden(
                TypeKey::of::<Config>(),
                FnFactory::value(Config { url: "x".into() }),
                Scope::Transient,
                FixedArgs::new(),
            )
            .unwrap();

        let resolved = derived.get::<Container>().unwrap();
        assert!(Container::ptr_eq(&resolved, &derived));
        assert!(!Container::ptr_eq(&resolved, &base));
    }

    #[test]
    fn test_override_unknown_target() {
        let base = app(Scope::Transient);
        let err = base
            .with_overridden(
                TypeKey::named("Nope"),
                FnFactory::value(()),
                Scope::Transient,
                FixedArgs::new(),
            )
            .unwrap_err();
        assert!(matches!(err, DiError::InvalidOverride { .. }));
    }

    #[test]
    fn test_override_validates_registration() {
        let base = app(Scope::Transient);
        let err = base
            .with_overridden(
                TypeKey::of::<Config>(),
                config_factory(),
                Scope::Transient,
                FixedArgs::new().value("port", 5432u16),
            )
            .unwrap_err();
        assert!(matches!(err, DiError::InvalidFixedArgument { .. }));
    }

    #[test]
    fn test_override_revalidates_graph() {
        let base = app(Scope::Transient);
        let err = base
            .with_overridden(
                TypeKey::of::<Config>(),
                FnFactory::new(
                    Signature::new().param("secret", TypeKey::named("Vault")),
                    |_| Ok(Config { url: String::new() }),
                ),
                Scope::Transient,
                FixedArgs::new(),
            )
            .unwrap_err();
        assert_eq!(
            err,
            DiError::not_found(&TypeKey::named("Vault"), Some(&TypeKey::of::<Config>()))
        );
    }

    #[test]
    fn test_registered_types_and_introspection() {
        let container = app(Scope::Transient);
        let types = container.registered_types();

        assert_eq!(types.len(), 5);
        assert!(types.contains(&TypeKey::of::<Handler>()));
        assert!(types.contains(&TypeKey::of::<Container>()));
        assert!(container.contains(&TypeKey::forward("Database")));

        let reg = container.registration(&TypeKey::of::<Handler>()).unwrap();
        assert_eq!(reg.dependencies().len(), 2);
        assert_eq!(reg.scope(), Scope::Transient);
    }
}
