//! Example demonstrating logging capabilities
//!
//! Run with JSON logging (production):
//! ```bash
//! cargo run --example logging --features logging-json
//! ```
//!
//! Run with pretty logging and every resolution step:
//! ```bash
//! RUST_LOG=depgraph_di=trace cargo run --example logging --features logging-pretty
//! ```

use depgraph_di::{
    Container, ContainerBuilder, DiError, FixedArgs, FnFactory, Scope, Signature, TypeKey,
};
use std::sync::Arc;

#[allow(dead_code)]
struct Database {
    url: String,
}

#[allow(dead_code)]
struct UserService {
    db: Arc<Database>,
}

#[allow(dead_code)]
struct RequestContext {
    users: Arc<UserService>,
    db: Arc<Database>,
}

fn main() -> Result<(), DiError> {
    #[cfg(feature = "logging")]
    {
        let directives = std::env::var("RUST_LOG").unwrap_or_else(|_| "depgraph_di=debug".into());
        depgraph_di::logging::builder()
            .pretty()
            .with_directives(directives)
            .init();
    }

    println!("=== depgraph-di Logging Demo ===\n");

    // Registration (logs: "Registering service")
    let mut builder = ContainerBuilder::new();
    builder.singleton(
        TypeKey::of::<Database>(),
        FnFactory::new(Signature::new().param("url", TypeKey::of::<String>()), |args| {
            println!("  [App] Connecting to database...");
            Ok(Database {
                url: args.cloned("url")?,
            })
        }),
        FixedArgs::new().value("url", String::from("postgres://localhost/mydb")),
    )?;
    builder.cached(
        TypeKey::of::<UserService>(),
        FnFactory::new(Signature::new().param("db", "Database"), |args| {
            Ok(UserService { db: args.get("db")? })
        }),
        FixedArgs::new(),
    )?;
    builder.register(
        TypeKey::of::<RequestContext>(),
        FnFactory::new(
            Signature::new()
                .param("users", TypeKey::of::<UserService>())
                .param("db", TypeKey::of::<Database>()),
            |args| {
                Ok(RequestContext {
                    users: args.get("users")?,
                    db: args.get("db")?,
                })
            },
        ),
        Scope::Transient,
        FixedArgs::new(),
    )?;

    // Build validates the graph (logs: "Validating dependency graph", "Creating DI container")
    let container = builder.build()?;

    // Resolve (trace logs: "Constructing service", "Service resolved from singleton store")
    let first = container.get::<RequestContext>()?;
    let second = container.get::<RequestContext>()?;
    assert!(Arc::ptr_eq(&first.db, &second.db));
    assert!(!Arc::ptr_eq(&first.users, &second.users));

    // Missing service (logs: "Service not found")
    let missing = container.resolve(&TypeKey::named("Mailer"));
    assert!(missing.is_err());

    // Derived container (logs: "Overriding service in derived container")
    let test_container: Container = container.with_overridden_singleton(
        TypeKey::of::<Database>(),
        FnFactory::value(Database {
            url: "sqlite::memory:".into(),
        }),
        FixedArgs::new(),
    )?;
    let _ctx = test_container.get::<RequestContext>()?;

    println!("\n=== Demo Complete ===");
    println!("Check the log output above to see structured logging in action!");
    println!("\nTip: Use --features logging-json for production (JSON output)");
    println!("     Use --features logging-pretty for development (colorful output)");

    Ok(())
}
