//! Example demonstrating the #[derive(Provide)] macro
//!
//! Run with:
//!   cargo run --example derive --features derive

use depgraph_di::{ContainerBuilder, DiError, FixedArgs, Provide, Scope, TypeKey};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

// Configuration, supplied as a fixed argument
#[derive(Clone)]
struct Settings {
    database_url: String,
    cache_size: usize,
}

#[derive(Provide)]
struct Database {
    settings: Arc<Settings>,
}

#[derive(Provide)]
struct Cache {
    // Plain field: cloned out of the arguments, fixed at registration
    size: usize,
}

// Depends on Cache by name rather than by type
#[derive(Provide)]
struct UserService {
    db: Arc<Database>,
    #[inject(name = "Cache")]
    cache: Arc<Cache>,
    #[inject(skip)]
    request_count: AtomicU64,
}

impl UserService {
    fn describe(&self) -> String {
        format!(
            "UserService connected to {} with cache size {} (requests: {})",
            self.db.settings.database_url,
            self.cache.size,
            self.request_count.fetch_add(1, Ordering::Relaxed)
        )
    }
}

#[derive(Provide)]
struct ApiController {
    users: Arc<UserService>,
    db: Arc<Database>,
}

fn main() -> Result<(), DiError> {
    println!("=== depgraph-di Derive Macro Demo ===\n");

    let settings = Settings {
        database_url: "postgres://localhost:5432/myapp".into(),
        cache_size: 1024,
    };

    let mut builder = ContainerBuilder::new();
    builder.singleton(
        TypeKey::of::<Settings>(),
        depgraph_di::FnFactory::value(settings.clone()),
        FixedArgs::new(),
    )?;
    builder.provide::<Database>(Scope::Singleton)?;
    builder.register(
        TypeKey::of::<Cache>(),
        Cache::factory(),
        Scope::Singleton,
        FixedArgs::new().value("size", settings.cache_size),
    )?;
    builder.provide::<UserService>(Scope::Cached)?;
    builder.provide::<ApiController>(Scope::Transient)?;

    println!("Signature of UserService:");
    for param in UserService::signature().params() {
        println!("  {}: {}", param.name, param.ty);
    }
    println!();

    let container = builder.build()?;

    let controller = container.get::<ApiController>()?;
    println!("  {}", controller.users.describe());
    println!("  {}", controller.users.describe());
    assert!(Arc::ptr_eq(&controller.db, &controller.users.db));

    println!("\n=== Demo Complete ===");
    println!("\nThe #[derive(Provide)] macro generated `signature()` and `provide()`:");
    println!("  - Arc<T> fields are dependencies on T");
    println!("  - Other fields are parameters of their own type, usually fixed");
    println!("  - #[inject(name = \"X\")] resolves the field through the name X");
    println!("  - #[inject(skip)] fields use Default::default()");

    Ok(())
}
