//! Symbol table mapping type names to registered keys
//!
//! Populated as types are registered. Lets a registration refer to a type by
//! name (or by a key spelled differently) before or after the type itself is
//! registered.

use crate::TypeKey;
use ahash::RandomState;
use std::collections::HashMap;
use std::sync::Arc;

#[cfg(feature = "logging")]
use tracing::trace;

/// Name -> canonical key lookup
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    symbols: HashMap<Arc<str>, TypeKey, RandomState>,
}

impl SymbolTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a registered key under its rendered name.
    ///
    /// Keys naming a Rust path are also recorded under their last segment.
    /// Later registrations win on a name clash.
    pub fn insert(&mut self, key: &TypeKey) {
        if let Some(short) = key.short_name() {
            #[cfg(feature = "logging")]
            if let Some(previous) = self.symbols.get(short).filter(|prev| *prev != key) {
                trace!(
                    target: "depgraph_di",
                    symbol = short,
                    previous = %previous,
                    current = %key,
                    "Short name rebound to a newer registration"
                );
            }
            self.symbols.insert(Arc::from(short), key.clone());
        }
        self.symbols.insert(Arc::from(key.to_string()), key.clone());
    }

    /// Look up a name
    pub fn get(&self, name: &str) -> Option<&TypeKey> {
        self.symbols.get(name)
    }

    /// Map a requested key to the registered key it names.
    ///
    /// The key is looked up as given first. Failing that, its type arguments
    /// are canonicalized and the rewritten key is looked up, so a forward
    /// reference nested inside a parameterized key also resolves. A key with
    /// no entry is already canonical. Type variables are never looked up.
    pub fn canonicalize(&self, key: &TypeKey) -> TypeKey {
        if let TypeKey::Param(_) = key {
            return key.clone();
        }
        if let Some(canonical) = self.symbols.get(key.to_string().as_str()) {
            return canonical.clone();
        }
        let key = match key {
            TypeKey::Type { name, args } if !args.is_empty() => TypeKey::Type {
                name: Arc::clone(name),
                args: args.iter().map(|arg| self.canonicalize(arg)).collect(),
            },
            _ => return key.clone(),
        };
        match self.symbols.get(key.to_string().as_str()) {
            Some(canonical) => canonical.clone(),
            None => key,
        }
    }

    /// Number of recorded names
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// True if nothing has been recorded
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Logger;

    #[test]
    fn test_forward_resolves_after_insert() {
        let mut table = SymbolTable::new();
        let forward = TypeKey::forward("Database");

        // Unknown names are their own canonical form
        assert_eq!(table.canonicalize(&forward), forward);

        table.insert(&TypeKey::named("Database"));
        assert_eq!(table.canonicalize(&forward), TypeKey::named("Database"));
    }

    #[test]
    fn test_short_name_alias() {
        let mut table = SymbolTable::new();
        let key = TypeKey::of::<Logger>();
        table.insert(&key);

        assert_eq!(table.canonicalize(&TypeKey::forward("Logger")), key);
        assert_eq!(table.canonicalize(&TypeKey::named("Logger")), key);
        assert_eq!(table.canonicalize(&key), key);
    }

    #[test]
    fn test_nested_forward_in_args() {
        let mut table = SymbolTable::new();
        let user = TypeKey::of::<Logger>();
        table.insert(&user);

        let repo = TypeKey::named("Repo").with_args([user.clone()]);
        table.insert(&repo);

        let requested = TypeKey::named("Repo").with_args([TypeKey::forward("Logger")]);
        assert_eq!(table.canonicalize(&requested), repo);

        // The whole parameterized key can also be named by a string
        assert_eq!(
            table.canonicalize(&TypeKey::forward(repo.to_string())),
            repo
        );
    }

    #[test]
    fn test_exact_parameterized_key_wins_over_rewritten_args() {
        let mut table = SymbolTable::new();
        let logger = TypeKey::of::<Logger>();
        table.insert(&logger);

        // Argument spelled by short name, while the full path is also known
        let repo = TypeKey::named("Repo").with_args([TypeKey::named("Logger")]);
        table.insert(&repo);

        assert_eq!(table.canonicalize(&repo), repo);
        assert_eq!(
            table.canonicalize(&TypeKey::named("Repo").with_args([TypeKey::forward("Logger")])),
            repo
        );
    }

    #[test]
    fn test_params_are_not_looked_up() {
        let mut table = SymbolTable::new();
        table.insert(&TypeKey::named("T"));
        assert_eq!(table.canonicalize(&TypeKey::param("T")), TypeKey::param("T"));
    }

    #[test]
    fn test_last_registration_wins_short_name() {
        let mut table = SymbolTable::new();
        table.insert(&TypeKey::named("a::Clock"));
        table.insert(&TypeKey::named("b::Clock"));
        assert_eq!(
            table.canonicalize(&TypeKey::forward("Clock")),
            TypeKey::named("b::Clock")
        );
        // Full paths stay distinct
        assert_eq!(
            table.canonicalize(&TypeKey::named("a::Clock")),
            TypeKey::named("a::Clock")
        );
    }
}
