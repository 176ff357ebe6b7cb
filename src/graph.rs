//! Build-time dependency graph validation
//!
//! Walks every registration depth-first, proving that each transitive
//! dependency is registered and that no type depends on itself.

use crate::storage::Registry;
use crate::{DiError, Result, SymbolTable, TypeKey};
use ahash::RandomState;
use std::collections::HashSet;

#[cfg(feature = "logging")]
use tracing::{debug, trace};

/// Three-colour DFS over a frozen registry.
///
/// `resolving` holds keys on the current path, `resolved` holds keys whose
/// whole subtree has been verified. A verified key is never walked again,
/// so validating the full registry is linear in keys plus edges.
pub(crate) struct GraphValidator<'a> {
    registry: &'a Registry,
    symbols: &'a SymbolTable,
    resolving: HashSet<TypeKey, RandomState>,
    resolved: HashSet<TypeKey, RandomState>,
}

impl<'a> GraphValidator<'a> {
    pub fn new(registry: &'a Registry, symbols: &'a SymbolTable) -> Self {
        Self {
            registry,
            symbols,
            resolving: HashSet::default(),
            resolved: HashSet::with_capacity_and_hasher(registry.len(), RandomState::new()),
        }
    }

    /// Validate every registered key, in registration order
    pub fn validate(mut self) -> Result<()> {
        let registry = self.registry;
        for key in registry.keys() {
            self.visit(key, None)?;
        }

        #[cfg(feature = "logging")]
        debug!(
            target: "depgraph_di",
            services = self.resolved.len(),
            "Dependency graph validated"
        );

        Ok(())
    }

    fn visit(&mut self, requested: &TypeKey, parent: Option<&TypeKey>) -> Result<()> {
        let key = self.symbols.canonicalize(requested);

        if self.resolved.contains(&key) {
            return Ok(());
        }
        if self.resolving.contains(&key) {
            #[cfg(feature = "logging")]
            debug!(
                target: "depgraph_di",
                service = %key,
                "Cycle found during validation"
            );
            return Err(DiError::circular(&key));
        }

        let registry = self.registry;
        let registration = registry
            .get(&key)
            .ok_or_else(|| DiError::not_found(&key, parent))?;

        #[cfg(feature = "logging")]
        trace!(
            target: "depgraph_di",
            service = %key,
            dependencies = registration.dependencies().len(),
            "Validating service"
        );

        self.resolving.insert(key.clone());
        for dependency in registration.dependencies() {
            self.visit(&dependency.key, Some(&key))?;
        }
        self.resolving.remove(&key);
        self.resolved.insert(key);

        Ok(())
    }
}
