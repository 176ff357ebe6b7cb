//! Provider traits for dependency injection
//!
//! These define what types can be injected and how long an instance lives.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Marker trait for types that can be injected via the DI container.
///
/// This is automatically implemented for all types that are `Send + Sync + 'static`.
/// You never need to implement this manually.
pub trait Injectable: Send + Sync + 'static {
    /// Returns the type name for debugging
    #[inline]
    fn type_name_of() -> &'static str
    where
        Self: Sized,
    {
        std::any::type_name::<Self>()
    }
}

// Blanket implementation - everything that's Send + Sync + 'static is Injectable
impl<T: Send + Sync + 'static> Injectable for T {}

/// A type-erased service instance
pub type Instance = Arc<dyn Any + Send + Sync>;

/// Service lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Scope {
    /// New instance built on every resolution
    #[default]
    Transient,

    /// Built at most once per container, shared for the container's lifetime
    Singleton,

    /// Built at most once per top-level `resolve()` call
    Cached,
}

impl Scope {
    /// Lowercase name, used in log fields
    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::Transient => "transient",
            Scope::Singleton => "singleton",
            Scope::Cached => "cached",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_scope_is_transient() {
        assert_eq!(Scope::default(), Scope::Transient);
    }

    #[test]
    fn test_scope_display() {
        assert_eq!(Scope::Cached.to_string(), "cached");
        assert_eq!(Scope::Singleton.as_str(), "singleton");
    }

    #[test]
    fn test_injectable_type_name() {
        struct Probe;
        assert!(<Probe as Injectable>::type_name_of().ends_with("Probe"));
    }
}
