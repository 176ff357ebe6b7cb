//! Error types for dependency injection

use crate::TypeKey;
use thiserror::Error;

/// Errors that can occur while registering, validating or resolving services
///
/// Every variant aborts the operation in progress; there is no partial
/// container or partial object graph on failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DiError {
    /// The same type key was registered twice
    #[error("Service already registered: {type_name}")]
    AlreadyRegistered { type_name: String },

    /// A fixed argument names a parameter the factory does not declare
    #[error("No argument `{argument}` on the factory for {type_name}")]
    InvalidFixedArgument { type_name: String, argument: String },

    /// A registered key (or one of its dependencies) still has free type parameters
    #[error("Type {type_name} has unbound type parameters: {params}")]
    UnboundTypeParameter { type_name: String, params: String },

    /// A generic provider was registered under a key with the wrong number of arguments
    #[error("Provider for {type_name} declares {expected} type parameter(s) but the key supplies {found}")]
    GenericArity {
        type_name: String,
        expected: usize,
        found: usize,
    },

    /// The factory cannot be introspected or invoked
    #[error("Cannot use {type_name} as a factory: {reason}")]
    NotCallable { type_name: String, reason: String },

    /// No registration exists for a required type
    #[error("Service not found: {type_name}{}", requester_suffix(.requested_by))]
    NotFound {
        type_name: String,
        requested_by: Option<String>,
    },

    /// A type transitively depends on itself
    #[error("Circular dependency detected while resolving: {type_name}")]
    CircularDependency { type_name: String },

    /// An override targets a type the base container cannot replace
    #[error("Cannot override {type_name}: {reason}")]
    InvalidOverride { type_name: String, reason: String },

    /// A factory asked for an argument that is missing or has another type
    #[error("Argument `{name}` is missing or is not a {expected}")]
    BadArgument { name: String, expected: &'static str },

    /// A resolved instance was downcast to the wrong Rust type
    #[error("Service {type_name} is not a {expected}")]
    TypeMismatch {
        type_name: String,
        expected: &'static str,
    },

    /// Factory failed to create service
    #[error("Failed to create service {type_name}: {reason}")]
    CreationFailed { type_name: String, reason: String },
}

fn requester_suffix(requested_by: &Option<String>) -> String {
    match requested_by {
        Some(parent) => format!(" (needed by {parent})"),
        None => String::new(),
    }
}

impl DiError {
    /// Create a NotFound error for a key, optionally naming who needed it
    #[inline]
    pub fn not_found(key: &TypeKey, requested_by: Option<&TypeKey>) -> Self {
        Self::NotFound {
            type_name: key.to_string(),
            requested_by: requested_by.map(ToString::to_string),
        }
    }

    /// Create a CircularDependency error
    #[inline]
    pub fn circular(key: &TypeKey) -> Self {
        Self::CircularDependency {
            type_name: key.to_string(),
        }
    }

    /// Create an AlreadyRegistered error
    #[inline]
    pub fn already_registered(key: &TypeKey) -> Self {
        Self::AlreadyRegistered {
            type_name: key.to_string(),
        }
    }

    /// Create an UnboundTypeParameter error listing the key's free parameters
    pub fn unbound(key: &TypeKey) -> Self {
        Self::unbound_described(key, key.to_string())
    }

    /// Like [`unbound`](Self::unbound), with a caller-supplied description of the type
    pub(crate) fn unbound_described(key: &TypeKey, type_name: String) -> Self {
        let params = key
            .free_params()
            .iter()
            .map(|p| p.as_ref())
            .collect::<Vec<_>>()
            .join(", ");
        Self::UnboundTypeParameter { type_name, params }
    }

    /// Create a CreationFailed error
    #[inline]
    pub fn creation_failed(key: &TypeKey, reason: impl Into<String>) -> Self {
        Self::CreationFailed {
            type_name: key.to_string(),
            reason: reason.into(),
        }
    }

    /// Create a TypeMismatch error
    #[inline]
    pub fn type_mismatch<T: 'static>(key: &TypeKey) -> Self {
        Self::TypeMismatch {
            type_name: key.to_string(),
            expected: std::any::type_name::<T>(),
        }
    }

    /// Create a BadArgument error
    #[inline]
    pub fn bad_argument<T: 'static>(name: &str) -> Self {
        Self::BadArgument {
            name: name.to_string(),
            expected: std::any::type_name::<T>(),
        }
    }

    /// The type named by this error, when there is one
    pub fn type_name(&self) -> Option<&str> {
        match self {
            Self::AlreadyRegistered { type_name }
            | Self::InvalidFixedArgument { type_name, .. }
            | Self::UnboundTypeParameter { type_name, .. }
            | Self::GenericArity { type_name, .. }
            | Self::NotCallable { type_name, .. }
            | Self::NotFound { type_name, .. }
            | Self::CircularDependency { type_name }
            | Self::InvalidOverride { type_name, .. }
            | Self::TypeMismatch { type_name, .. }
            | Self::CreationFailed { type_name, .. } => Some(type_name),
            Self::BadArgument { .. } => None,
        }
    }
}

/// Result type alias for DI operations
pub type Result<T> = std::result::Result<T, DiError>;
