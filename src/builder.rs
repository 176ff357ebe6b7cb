//! Container builder
//!
//! Registrations accumulate here; [`ContainerBuilder::build`] freezes a copy,
//! installs the container's self-registration and validates the whole graph.

use crate::factory::AnyFactory;
use crate::graph::GraphValidator;
use crate::storage::Registry;
use crate::{
    Container, DiError, Factory, FixedArgs, Provide, Registration, Result, Scope, SymbolTable,
    TypeKey,
};
use std::sync::Arc;

#[cfg(feature = "logging")]
use tracing::debug;

/// Accumulates registrations and builds a validated [`Container`].
///
/// # Examples
///
/// ```rust
/// use depgraph_di::{ContainerBuilder, FixedArgs, FnFactory, Scope, Signature, TypeKey};
/// use std::sync::Arc;
///
/// struct Logger;
/// struct Service { logger: Arc<Logger> }
///
/// let mut builder = ContainerBuilder::new();
/// builder.singleton(
///     TypeKey::of::<Logger>(),
///     FnFactory::new(Signature::new(), |_| Ok(Logger)),
///     FixedArgs::new(),
/// )?;
/// builder.register(
///     TypeKey::of::<Service>(),
///     FnFactory::new(
///         Signature::new().param("logger", TypeKey::of::<Logger>()),
///         |args| Ok(Service { logger: args.get("logger")? }),
///     ),
///     Scope::Transient,
///     FixedArgs::new(),
/// )?;
///
/// let container = builder.build()?;
/// let a = container.get::<Service>()?;
/// let b = container.get::<Service>()?;
/// assert!(Arc::ptr_eq(&a.logger, &b.logger));
/// # Ok::<(), depgraph_di::DiError>(())
/// ```
#[derive(Debug, Default)]
pub struct ContainerBuilder {
    registry: Registry,
    symbols: SymbolTable,
}

impl ContainerBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory for `key`.
    ///
    /// Fails on a duplicate key, on a key that still has free type
    /// parameters, on a factory that declares no signature, and on a fixed
    /// argument that names no declared parameter.
    pub fn register<F: Factory + 'static>(
        &mut self,
        key: TypeKey,
        factory: F,
        scope: Scope,
        fixed: FixedArgs,
    ) -> Result<()> {
        self.register_any(key, AnyFactory::Declared(Arc::new(factory)), scope, fixed)
    }

    /// Register a singleton
    pub fn singleton<F: Factory + 'static>(
        &mut self,
        key: TypeKey,
        factory: F,
        fixed: FixedArgs,
    ) -> Result<()> {
        self.register(key, factory, Scope::Singleton, fixed)
    }

    /// Register a service cached per top-level resolve
    pub fn cached<F: Factory + 'static>(
        &mut self,
        key: TypeKey,
        factory: F,
        fixed: FixedArgs,
    ) -> Result<()> {
        self.register(key, factory, Scope::Cached, fixed)
    }

    /// Register a [`Provide`] type under its own key
    pub fn provide<T: Provide>(&mut self, scope: Scope) -> Result<()> {
        self.register(TypeKey::of::<T>(), T::factory(), scope, FixedArgs::new())
    }

    fn register_any(
        &mut self,
        key: TypeKey,
        factory: AnyFactory,
        scope: Scope,
        fixed: FixedArgs,
    ) -> Result<()> {
        if self.registry.contains(&key) || key == TypeKey::of::<Container>() {
            return Err(DiError::already_registered(&key));
        }

        let registration = Registration::new(key, factory, scope, fixed)?;

        #[cfg(feature = "logging")]
        debug!(
            target: "depgraph_di",
            service = %registration.key(),
            scope = registration.scope().as_str(),
            dependencies = registration.dependencies().len(),
            service_count = self.registry.len() + 1,
            "Registering service"
        );

        self.symbols.insert(registration.key());
        self.registry.insert(registration);
        Ok(())
    }

    /// True if `key` (or the key it names) is registered
    pub fn contains(&self, key: &TypeKey) -> bool {
        self.registry.contains(&self.symbols.canonicalize(key))
    }

    /// Number of registrations so far
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    /// True if nothing is registered
    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    /// Freeze a copy of the registrations into a validated container.
    ///
    /// The builder is left untouched and can build again.
    pub fn build(&self) -> Result<Container> {
        let (registry, symbols) = with_self_registration(self.registry.clone(), self.symbols.clone());

        #[cfg(feature = "logging")]
        debug!(
            target: "depgraph_di",
            service_count = registry.len(),
            "Validating dependency graph"
        );

        GraphValidator::new(&registry, &symbols).validate()?;

        Ok(Container::from_parts(registry, symbols))
    }
}

/// Install the container's own registration into a registry copy
pub(crate) fn with_self_registration(
    mut registry: Registry,
    mut symbols: SymbolTable,
) -> (Registry, SymbolTable) {
    let registration = Registration::container();
    symbols.insert(registration.key());
    registry.insert(registration);
    (registry, symbols)
}
