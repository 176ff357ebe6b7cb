//! Type identity for registrations and dependency requests
//!
//! A [`TypeKey`] names what is being provided or requested. It is either a
//! nominal type (optionally applied to type arguments), a type variable
//! declared by a generic provider, or a forward reference that the
//! [`SymbolTable`](crate::SymbolTable) later maps to a registered key.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Mapping from a generic provider's type parameter names to concrete keys
pub type Binding = HashMap<Arc<str>, TypeKey>;

/// Canonical identity of a provided or requested type.
///
/// # Examples
///
/// ```rust
/// use depgraph_di::TypeKey;
///
/// struct User;
///
/// let repo = TypeKey::named("Repository").with_args([TypeKey::of::<User>()]);
/// assert!(repo.is_concrete());
///
/// let generic = TypeKey::named("Repository").with_args([TypeKey::param("T")]);
/// assert!(!generic.is_concrete());
/// assert_eq!(generic.to_string(), "Repository<T>");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TypeKey {
    /// A nominal type, with its type arguments when parameterized
    Type { name: Arc<str>, args: Vec<TypeKey> },
    /// A type variable of a generic provider
    Param(Arc<str>),
    /// A reference by name, resolved through the symbol table
    Forward(Arc<str>),
}

impl TypeKey {
    /// Key for a Rust type, named by `std::any::type_name`
    #[inline]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self::named(std::any::type_name::<T>())
    }

    /// Key for a nominal type with no arguments
    #[inline]
    pub fn named(name: impl Into<Arc<str>>) -> Self {
        Self::Type {
            name: name.into(),
            args: Vec::new(),
        }
    }

    /// A type variable
    #[inline]
    pub fn param(name: impl Into<Arc<str>>) -> Self {
        Self::Param(name.into())
    }

    /// A forward reference by name
    #[inline]
    pub fn forward(name: impl Into<Arc<str>>) -> Self {
        Self::Forward(name.into())
    }

    /// Apply type arguments to a nominal key.
    ///
    /// Parameters and forward references have no argument list; they are
    /// returned unchanged.
    pub fn with_args(self, args: impl IntoIterator<Item = TypeKey>) -> Self {
        match self {
            Self::Type { name, .. } => Self::Type {
                name,
                args: args.into_iter().collect(),
            },
            other => other,
        }
    }

    /// Base name of the key (without arguments)
    pub fn name(&self) -> &str {
        match self {
            Self::Type { name, .. } | Self::Param(name) | Self::Forward(name) => name,
        }
    }

    /// Type arguments of a parameterized key
    pub fn args(&self) -> &[TypeKey] {
        match self {
            Self::Type { args, .. } => args,
            _ => &[],
        }
    }

    /// True if no type variable occurs anywhere in the key
    pub fn is_concrete(&self) -> bool {
        match self {
            Self::Param(_) => false,
            Self::Type { args, .. } => args.iter().all(TypeKey::is_concrete),
            Self::Forward(_) => true,
        }
    }

    /// Type variables occurring in the key, in first-occurrence order
    pub fn free_params(&self) -> Vec<Arc<str>> {
        let mut params = Vec::new();
        self.collect_params(&mut params);
        params
    }

    fn collect_params(&self, out: &mut Vec<Arc<str>>) {
        match self {
            Self::Param(name) => {
                if !out.contains(name) {
                    out.push(Arc::clone(name));
                }
            }
            Self::Type { args, .. } => args.iter().for_each(|arg| arg.collect_params(out)),
            Self::Forward(_) => {}
        }
    }

    /// Replace bound type variables, recursing into argument lists.
    ///
    /// Variables absent from `binding` are left in place; callers check
    /// [`is_concrete`](Self::is_concrete) on the result.
    ///
    /// ```rust
    /// use depgraph_di::{Binding, TypeKey};
    ///
    /// let mut binding = Binding::new();
    /// binding.insert("T".into(), TypeKey::named("User"));
    ///
    /// let nested = TypeKey::named("Vec").with_args([
    ///     TypeKey::named("Option").with_args([TypeKey::param("T")]),
    /// ]);
    /// assert_eq!(nested.substitute(&binding).to_string(), "Vec<Option<User>>");
    /// ```
    pub fn substitute(&self, binding: &Binding) -> TypeKey {
        match self {
            Self::Param(name) => binding.get(name).cloned().unwrap_or_else(|| self.clone()),
            Self::Type { args, .. } if args.is_empty() => self.clone(),
            Self::Type { name, args } => Self::Type {
                name: Arc::clone(name),
                args: args.iter().map(|arg| arg.substitute(binding)).collect(),
            },
            Self::Forward(_) => self.clone(),
        }
    }

    /// Last path segment of a plain Rust type name (`app::db::Pool` -> `Pool`)
    pub(crate) fn short_name(&self) -> Option<&str> {
        match self {
            Self::Type { name, args }
                if args.is_empty() && !name.contains(['<', '(', '[', '&', ';', '*', ' ']) =>
            {
                let short = name.rsplit("::").next()?;
                (short.len() != name.len()).then_some(short)
            }
            _ => None,
        }
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Type { name, args } => {
                f.write_str(name)?;
                if let Some((first, rest)) = args.split_first() {
                    write!(f, "<{first}")?;
                    for arg in rest {
                        write!(f, ", {arg}")?;
                    }
                    f.write_str(">")?;
                }
                Ok(())
            }
            Self::Param(name) | Self::Forward(name) => f.write_str(name),
        }
    }
}

impl From<&str> for TypeKey {
    /// Strings become forward references
    fn from(name: &str) -> Self {
        Self::forward(name)
    }
}
