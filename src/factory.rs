//! Factory types for creating service instances
//!
//! A factory declares a [`Signature`] (its named, typed parameters and, for
//! generic providers, its own type parameters) and builds an instance from
//! an [`Args`] map assembled by the resolver.
//!
//! Rust has no runtime parameter reflection, so the signature is declared
//! alongside the closure, written by hand or generated by `#[derive(Provide)]`.

use crate::{Binding, DiError, Injectable, Instance, Result, TypeKey};
use ahash::RandomState;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

#[cfg(feature = "logging")]
use tracing::trace;

// =============================================================================
// Signature
// =============================================================================

/// One declared factory parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    /// Parameter name, matched against fixed arguments
    pub name: Arc<str>,
    /// Declared type; may mention the provider's type parameters
    pub ty: TypeKey,
}

/// Declared parameters of a factory.
///
/// # Examples
///
/// ```rust
/// use depgraph_di::{Signature, TypeKey};
///
/// // fn(store: Store<T>, label: String) for a provider generic over T
/// let sig = Signature::generic(["T"])
///     .param("store", TypeKey::named("Store").with_args([TypeKey::param("T")]))
///     .param("label", TypeKey::of::<String>());
///
/// assert_eq!(sig.params().len(), 2);
/// assert!(sig.has_param("label"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Signature {
    type_params: Vec<Arc<str>>,
    params: Vec<Param>,
}

impl Signature {
    /// Signature with no parameters
    pub fn new() -> Self {
        Self::default()
    }

    /// Signature of a generic provider declaring the given type parameters
    pub fn generic<I, S>(type_params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Arc<str>>,
    {
        Self {
            type_params: type_params.into_iter().map(Into::into).collect(),
            params: Vec::new(),
        }
    }

    /// Append a parameter. A `&str` type becomes a forward reference.
    pub fn param(mut self, name: impl Into<Arc<str>>, ty: impl Into<TypeKey>) -> Self {
        self.params.push(Param {
            name: name.into(),
            ty: ty.into(),
        });
        self
    }

    /// Declared parameters in order
    pub fn params(&self) -> &[Param] {
        &self.params
    }

    /// Declared type parameters of a generic provider
    pub fn type_params(&self) -> &[Arc<str>] {
        &self.type_params
    }

    /// True if a parameter with this name is declared
    pub fn has_param(&self, name: &str) -> bool {
        self.params.iter().any(|p| &*p.name == name)
    }

    /// Bind the provider's type parameters to the arguments of `key`.
    ///
    /// Non-generic signatures bind nothing.
    pub fn bind(&self, key: &TypeKey) -> Result<Binding> {
        if self.type_params.is_empty() {
            return Ok(Binding::new());
        }

        let args = key.args();
        if args.len() != self.type_params.len() {
            return Err(DiError::GenericArity {
                type_name: key.to_string(),
                expected: self.type_params.len(),
                found: args.len(),
            });
        }

        Ok(self
            .type_params
            .iter()
            .cloned()
            .zip(args.iter().cloned())
            .collect())
    }
}

// =============================================================================
// Arguments
// =============================================================================

/// Named arguments handed to a factory
#[derive(Clone, Default)]
pub struct Args {
    values: HashMap<Arc<str>, Instance, RandomState>,
}

impl Args {
    /// Empty argument map
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a value (mostly useful when calling a factory by hand)
    pub fn with<T: Injectable>(mut self, name: impl Into<Arc<str>>, value: T) -> Self {
        self.values.insert(name.into(), Arc::new(value));
        self
    }

    pub(crate) fn insert(&mut self, name: Arc<str>, instance: Instance) {
        self.values.insert(name, instance);
    }

    /// Untyped access to an argument
    pub fn instance(&self, name: &str) -> Option<&Instance> {
        self.values.get(name)
    }

    /// Shared handle to an argument of type `T`
    pub fn get<T: Injectable>(&self, name: &str) -> Result<Arc<T>> {
        self.values
            .get(name)
            .and_then(|instance| Arc::clone(instance).downcast::<T>().ok())
            .ok_or_else(|| DiError::bad_argument::<T>(name))
    }

    /// Owned copy of an argument of type `T`
    pub fn cloned<T: Injectable + Clone>(&self, name: &str) -> Result<T> {
        self.get::<T>(name).map(|value| T::clone(&value))
    }

    /// True if the argument is present
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Number of arguments
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True if there are no arguments
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Debug for Args {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.values.keys().map(|k| &**k).collect();
        names.sort_unstable();
        f.debug_struct("Args").field("names", &names).finish()
    }
}

// =============================================================================
// Factory trait
// =============================================================================

/// A factory that creates service instances
pub trait Factory: Send + Sync {
    /// Declared parameters of this factory.
    ///
    /// The default reports the factory as non-callable; implementors that
    /// can be wired must override it.
    fn signature(&self) -> Result<Signature> {
        Err(DiError::NotCallable {
            type_name: self.type_name().to_string(),
            reason: "factory does not declare a signature".into(),
        })
    }

    /// Build an instance from resolved arguments
    fn call(&self, args: &Args) -> Result<Instance>;

    /// Name used in errors and logs
    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Type-erased factory function
type FactoryFn = Arc<dyn Fn(&Args) -> Result<Instance> + Send + Sync>;

/// Closure-backed factory with a declared signature
///
/// Cloning is cheap; one generic factory can back several registrations.
#[derive(Clone)]
pub struct FnFactory {
    signature: Signature,
    func: FactoryFn,
    type_name: &'static str,
}

impl FnFactory {
    /// Create a factory from a signature and a constructor closure
    pub fn new<T: Injectable, F>(signature: Signature, factory: F) -> Self
    where
        F: Fn(&Args) -> Result<T> + Send + Sync + 'static,
    {
        Self {
            signature,
            func: Arc::new(move |args: &Args| {
                factory(args).map(|value| Arc::new(value) as Instance)
            }),
            type_name: std::any::type_name::<T>(),
        }
    }

    /// Factory without parameters that always returns the same shared instance
    pub fn value<T: Injectable>(instance: T) -> Self {
        Self::from_arc(Arc::new(instance))
    }

    /// Like [`value`](Self::value), from an existing `Arc`
    pub fn from_arc<T: Injectable>(instance: Arc<T>) -> Self {
        let instance = instance as Instance;
        Self {
            signature: Signature::new(),
            func: Arc::new(move |_: &Args| Ok(Arc::clone(&instance))),
            type_name: std::any::type_name::<T>(),
        }
    }
}

impl Factory for FnFactory {
    fn signature(&self) -> Result<Signature> {
        Ok(self.signature.clone())
    }

    #[inline]
    fn call(&self, args: &Args) -> Result<Instance> {
        #[cfg(feature = "logging")]
        trace!(
            target: "depgraph_di",
            service = self.type_name,
            args = args.len(),
            "Invoking factory"
        );

        (self.func)(args)
    }

    fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl fmt::Debug for FnFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnFactory")
            .field("type_name", &self.type_name)
            .field("signature", &self.signature)
            .finish()
    }
}

// =============================================================================
// Provide - types that describe their own construction
// =============================================================================

/// A service that declares its own signature and constructor.
///
/// Implement by hand, or derive with `#[derive(Provide)]` (feature `derive`).
///
/// ```rust
/// use depgraph_di::{Args, Provide, Result, Signature, TypeKey};
/// use std::sync::Arc;
///
/// struct Config { url: String }
///
/// struct Database { config: Arc<Config> }
///
/// impl Provide for Database {
///     fn signature() -> Signature {
///         Signature::new().param("config", TypeKey::of::<Config>())
///     }
///
///     fn provide(args: &Args) -> Result<Self> {
///         Ok(Database { config: args.get("config")? })
///     }
/// }
/// ```
pub trait Provide: Injectable + Sized {
    /// Declared parameters
    fn signature() -> Signature;

    /// Build from resolved arguments
    fn provide(args: &Args) -> Result<Self>;

    /// Factory wrapping [`provide`](Self::provide)
    fn factory() -> FnFactory {
        FnFactory::new(Self::signature(), Self::provide)
    }
}

// =============================================================================
// AnyFactory - what a registration stores
// =============================================================================

/// Factory stored in a registration
#[derive(Clone)]
pub(crate) enum AnyFactory {
    /// User supplied factory
    Declared(Arc<dyn Factory>),
    /// The container itself; resolves to a handle of the resolving container
    Container,
}

impl AnyFactory {
    pub fn signature(&self) -> Result<Signature> {
        match self {
            AnyFactory::Declared(factory) => factory.signature(),
            AnyFactory::Container => Ok(Signature::new()),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            AnyFactory::Declared(factory) => factory.type_name(),
            AnyFactory::Container => std::any::type_name::<crate::Container>(),
        }
    }
}

impl fmt::Debug for AnyFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnyFactory::Declared(factory) => write!(f, "Declared({})", factory.type_name()),
            AnyFactory::Container => f.write_str("Container"),
        }
    }
}
