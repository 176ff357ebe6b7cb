//! # depgraph-di - Dependency Injection with a Validated Graph
//!
//! A dependency injection container that checks the whole object graph when
//! it is built, then constructs instances recursively on demand.
//!
//! ## Features
//!
//! - 🧭 **Validated up front** - Missing dependencies and cycles fail `build()`, not the first request
//! - 🧬 **Generic providers** - One factory serves `Repository<User>`, `Repository<Order>`, ...
//! - ♻️ **Three scopes** - Transient, singleton, and cached per top-level resolve
//! - 🔗 **Forward references** - Depend on a type by name before it is registered
//! - 🧪 **Overrides** - Derive a container with one registration swapped, for tests
//! - 🧵 **Thread-safe** - `Container` is `Send + Sync`; singletons are built exactly once
//! - 📊 **Observable** - Optional tracing integration with JSON or pretty output
//!
//! ## Quick Start
//!
//! ```rust
//! use depgraph_di::{ContainerBuilder, FixedArgs, FnFactory, Scope, Signature, TypeKey};
//! use std::sync::Arc;
//!
//! struct Config { url: String }
//! struct Database { config: Arc<Config> }
//!
//! let mut builder = ContainerBuilder::new();
//! builder.singleton(
//!     TypeKey::of::<Config>(),
//!     FnFactory::new(Signature::new().param("url", TypeKey::of::<String>()), |args| {
//!         Ok(Config { url: args.cloned("url")? })
//!     }),
//!     FixedArgs::new().value("url", String::from("postgres://localhost")),
//! )?;
//! builder.register(
//!     TypeKey::of::<Database>(),
//!     FnFactory::new(Signature::new().param("config", TypeKey::of::<Config>()), |args| {
//!         Ok(Database { config: args.get("config")? })
//!     }),
//!     Scope::Transient,
//!     FixedArgs::new(),
//! )?;
//!
//! let container = builder.build()?;
//! let db = container.get::<Database>()?;
//! assert_eq!(db.config.url, "postgres://localhost");
//! # Ok::<(), depgraph_di::DiError>(())
//! ```
//!
//! ## Generic Providers
//!
//! A provider declaring type parameters is registered once per concrete key;
//! its dependencies are rewritten with the key's arguments.
//!
//! ```rust
//! use depgraph_di::{ContainerBuilder, FixedArgs, FnFactory, Scope, Signature, TypeKey};
//!
//! struct Store;
//! struct Repository { label: &'static str }
//!
//! let repository = |label: &'static str| {
//!     FnFactory::new(
//!         Signature::generic(["T"])
//!             .param("store", TypeKey::named("Store").with_args([TypeKey::param("T")])),
//!         move |_| Ok(Repository { label }),
//!     )
//! };
//!
//! let mut builder = ContainerBuilder::new();
//! for entity in ["User", "Order"] {
//!     builder.singleton(
//!         TypeKey::named("Store").with_args([TypeKey::named(entity)]),
//!         FnFactory::value(Store),
//!         FixedArgs::new(),
//!     )?;
//! }
//! builder.register(
//!     TypeKey::named("Repository").with_args([TypeKey::named("User")]),
//!     repository("users"),
//!     Scope::Transient,
//!     FixedArgs::new(),
//! )?;
//!
//! let container = builder.build()?;
//! let key = TypeKey::named("Repository").with_args([TypeKey::named("User")]);
//! assert_eq!(container.resolve_as::<Repository>(&key)?.label, "users");
//! # Ok::<(), depgraph_di::DiError>(())
//! ```
//!
//! ## Overrides
//!
//! ```rust
//! use depgraph_di::{ContainerBuilder, FixedArgs, FnFactory, TypeKey};
//!
//! struct Mailer { live: bool }
//!
//! let mut builder = ContainerBuilder::new();
//! builder.singleton(TypeKey::of::<Mailer>(), FnFactory::value(Mailer { live: true }), FixedArgs::new())?;
//! let production = builder.build()?;
//!
//! let test = production.with_overridden_singleton(
//!     TypeKey::of::<Mailer>(),
//!     FnFactory::value(Mailer { live: false }),
//!     FixedArgs::new(),
//! )?;
//!
//! assert!(production.get::<Mailer>()?.live);
//! assert!(!test.get::<Mailer>()?.live);
//! # Ok::<(), depgraph_di::DiError>(())
//! ```

mod builder;
mod container;
mod error;
mod factory;
mod graph;
mod key;
#[cfg(feature = "logging")]
pub mod logging;
mod provider;
mod registration;
mod storage;
mod symbols;

pub use builder::ContainerBuilder;
pub use container::Container;
pub use error::*;
pub use factory::{Args, Factory, FnFactory, Param, Provide, Signature};
pub use key::{Binding, TypeKey};
pub use provider::{Injectable, Instance, Scope};
pub use registration::{Dependency, FixedArg, FixedArgs, Registration};
pub use symbols::SymbolTable;

/// Derive [`Provide`] for a struct with named fields
#[cfg(feature = "derive")]
pub use depgraph_di_derive::Provide;

// Re-export for convenience
pub use std::sync::Arc;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        Args, Container, ContainerBuilder, DiError, Factory, FixedArgs, FnFactory, Injectable,
        Provide, Result, Scope, Signature, TypeKey,
    };
    pub use std::sync::Arc;
}
