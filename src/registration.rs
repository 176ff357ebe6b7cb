//! Registrations: a factory bound to a type key with a scope and fixed arguments

use crate::factory::AnyFactory;
use crate::{Args, DiError, Injectable, Instance, Result, Scope, TypeKey};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// A fixed argument value
#[derive(Clone)]
pub enum FixedArg {
    /// Passed to the factory as-is
    Value(Instance),
    /// Dependency marker: resolve this parameter as the given key instead of
    /// its declared type
    Dependency(TypeKey),
}

impl FixedArg {
    /// Dependency marker for `target`
    pub fn dependency(target: impl Into<TypeKey>) -> Self {
        FixedArg::Dependency(target.into())
    }
}

impl fmt::Debug for FixedArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FixedArg::Value(_) => f.write_str("Value(..)"),
            FixedArg::Dependency(key) => f.debug_tuple("Dependency").field(key).finish(),
        }
    }
}

/// Fixed arguments of a registration, keyed by parameter name
///
/// ```rust
/// use depgraph_di::{FixedArgs, TypeKey};
///
/// let fixed = FixedArgs::new()
///     .value("url", String::from("postgres://localhost"))
///     .dependency("cache", TypeKey::named("RedisCache"));
/// assert_eq!(fixed.len(), 2);
/// ```
#[derive(Clone, Default)]
pub struct FixedArgs {
    args: BTreeMap<Arc<str>, FixedArg>,
}

impl FixedArgs {
    /// No fixed arguments
    pub fn new() -> Self {
        Self::default()
    }

    /// Fix a parameter to a constant
    pub fn value<T: Injectable>(self, name: impl Into<Arc<str>>, value: T) -> Self {
        self.instance(name, Arc::new(value))
    }

    /// Fix a parameter to an already type-erased constant
    pub fn instance(mut self, name: impl Into<Arc<str>>, instance: Instance) -> Self {
        self.args.insert(name.into(), FixedArg::Value(instance));
        self
    }

    /// Resolve a parameter as `target` rather than its declared type
    pub fn dependency(mut self, name: impl Into<Arc<str>>, target: impl Into<TypeKey>) -> Self {
        self.args.insert(name.into(), FixedArg::dependency(target));
        self
    }

    /// Look up a fixed argument
    pub fn get(&self, name: &str) -> Option<&FixedArg> {
        self.args.get(name)
    }

    /// Parameter names with a fixed argument, sorted
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.args.keys().map(|k| &**k)
    }

    /// Number of fixed arguments
    pub fn len(&self) -> usize {
        self.args.len()
    }

    /// True if there are none
    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    /// Constant values as a fresh argument map
    pub(crate) fn constants(&self) -> Args {
        let mut args = Args::new();
        for (name, arg) in &self.args {
            if let FixedArg::Value(instance) = arg {
                args.insert(Arc::clone(name), Arc::clone(instance));
            }
        }
        args
    }
}

impl fmt::Debug for FixedArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.args.iter()).finish()
    }
}

/// A parameter to be filled by resolving another key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    /// Factory parameter receiving the instance
    pub param: Arc<str>,
    /// Key to resolve, after type-parameter substitution
    pub key: TypeKey,
}

/// A factory bound to a fully concrete type key
#[derive(Debug, Clone)]
pub struct Registration {
    key: TypeKey,
    factory: AnyFactory,
    scope: Scope,
    fixed: FixedArgs,
    dependencies: Vec<Dependency>,
}

impl Registration {
    /// Validate and build a registration.
    ///
    /// Rejects keys with free type parameters, factories that cannot be
    /// introspected, and fixed arguments naming undeclared parameters. The
    /// dependency list is computed here, in parameter order: constants are
    /// skipped, markers are redirected, and every type is substituted with
    /// the binding of a generic provider.
    pub(crate) fn new(
        key: TypeKey,
        factory: AnyFactory,
        scope: Scope,
        fixed: FixedArgs,
    ) -> Result<Self> {
        if !key.is_concrete() {
            return Err(DiError::unbound(&key));
        }

        let signature = factory.signature()?;

        if let Some(name) = fixed.names().find(|name| !signature.has_param(name)) {
            return Err(DiError::InvalidFixedArgument {
                type_name: key.to_string(),
                argument: name.to_string(),
            });
        }

        let binding = signature.bind(&key)?;

        let mut dependencies = Vec::with_capacity(signature.params().len());
        for param in signature.params() {
            let declared = match fixed.get(&param.name) {
                Some(FixedArg::Value(_)) => continue,
                Some(FixedArg::Dependency(target)) => target,
                None => &param.ty,
            };

            let resolved = declared.substitute(&binding);
            if !resolved.is_concrete() {
                return Err(DiError::unbound_described(
                    &resolved,
                    format!("{resolved} (parameter `{}` of {key})", param.name),
                ));
            }

            dependencies.push(Dependency {
                param: Arc::clone(&param.name),
                key: resolved,
            });
        }

        Ok(Self {
            key,
            factory,
            scope,
            fixed,
            dependencies,
        })
    }

    /// Self-registration: the container provides itself as a singleton
    pub(crate) fn container() -> Self {
        Self {
            key: TypeKey::of::<crate::Container>(),
            factory: AnyFactory::Container,
            scope: Scope::Singleton,
            fixed: FixedArgs::new(),
            dependencies: Vec::new(),
        }
    }

    /// Registered key
    pub fn key(&self) -> &TypeKey {
        &self.key
    }

    /// Lifecycle
    pub fn scope(&self) -> Scope {
        self.scope
    }

    /// Fixed arguments as registered
    pub fn fixed_args(&self) -> &FixedArgs {
        &self.fixed
    }

    /// Parameters resolved from the container, in declaration order
    pub fn dependencies(&self) -> &[Dependency] {
        &self.dependencies
    }

    /// Name of the type the factory produces
    pub fn factory_name(&self) -> &'static str {
        self.factory.type_name()
    }

    pub(crate) fn factory(&self) -> &AnyFactory {
        &self.factory
    }
}
