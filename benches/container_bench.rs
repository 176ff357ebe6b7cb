//! Benchmarks for the DI container

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use depgraph_di::{
    Container, ContainerBuilder, FixedArgs, FnFactory, Scope, Signature, TypeKey,
};
use std::hint::black_box;
use std::sync::Arc;

#[allow(dead_code)]
struct Node {
    depth: usize,
    next: Option<Arc<Node>>,
}

fn link(depth: usize) -> TypeKey {
    TypeKey::named(format!("Link{depth}"))
}

/// Linear chain Link0 -> Link1 -> ... -> Link{len-1}, all in one scope
fn chain_builder(len: usize, scope: Scope) -> ContainerBuilder {
    let mut builder = ContainerBuilder::new();
    for depth in 0..len {
        let factory = if depth + 1 < len {
            FnFactory::new(Signature::new().param("next", link(depth + 1)), move |args| {
                Ok(Node {
                    depth,
                    next: Some(args.get("next")?),
                })
            })
        } else {
            FnFactory::new(Signature::new(), move |_| Ok(Node { depth, next: None }))
        };
        builder
            .register(link(depth), factory, scope, FixedArgs::new())
            .unwrap();
    }
    builder
}

/// Wide fan-in: Root depends on `width` services that all depend on Shared
fn fan_in(width: usize, shared_scope: Scope) -> Container {
    let mut builder = ContainerBuilder::new();
    builder
        .register(
            TypeKey::named("Shared"),
            FnFactory::new(Signature::new(), |_| Ok(0u64)),
            shared_scope,
            FixedArgs::new(),
        )
        .unwrap();

    let mut root = Signature::new();
    for i in 0..width {
        let key = TypeKey::named(format!("Leaf{i}"));
        builder
            .register(
                key.clone(),
                FnFactory::new(Signature::new().param("shared", "Shared"), |args| {
                    Ok(args.get::<u64>("shared")?)
                }),
                Scope::Transient,
                FixedArgs::new(),
            )
            .unwrap();
        root = root.param(format!("leaf{i}"), key);
    }
    builder
        .register(
            TypeKey::named("Root"),
            FnFactory::new(root, |args| Ok(args.len())),
            Scope::Transient,
            FixedArgs::new(),
        )
        .unwrap();
    builder.build().unwrap()
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("build");

    for len in [10usize, 100, 1000] {
        let builder = chain_builder(len, Scope::Transient);
        group.throughput(Throughput::Elements(len as u64));
        group.bench_with_input(BenchmarkId::new("validate_chain", len), &builder, |b, builder| {
            b.iter(|| black_box(builder.build().unwrap()))
        });
    }

    group.finish();
}

fn bench_resolution(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolution");
    group.throughput(Throughput::Elements(1));

    let singleton = chain_builder(1, Scope::Singleton).build().unwrap();
    let key = link(0);
    singleton.resolve(&key).unwrap();

    group.bench_function("singleton_hit", |b| {
        b.iter(|| black_box(singleton.resolve(&key).unwrap()))
    });

    group.bench_function("forward_reference", |b| {
        let forward = TypeKey::forward("Link0");
        b.iter(|| black_box(singleton.resolve(&forward).unwrap()))
    });

    let transient = chain_builder(1, Scope::Transient).build().unwrap();
    group.bench_function("transient_leaf", |b| {
        b.iter(|| black_box(transient.resolve(&key).unwrap()))
    });

    group.bench_function("not_found", |b| {
        let missing = TypeKey::named("Missing");
        b.iter(|| black_box(transient.resolve(&missing).is_err()))
    });

    group.finish();
}

fn bench_scopes(c: &mut Criterion) {
    let mut group = c.benchmark_group("scopes");
    let root = TypeKey::named("Root");

    for scope in [Scope::Transient, Scope::Cached, Scope::Singleton] {
        let container = fan_in(16, scope);
        group.bench_function(BenchmarkId::new("fan_in_16", scope), |b| {
            b.iter(|| black_box(container.resolve(&root).unwrap()))
        });
    }

    for scope in [Scope::Transient, Scope::Singleton] {
        let container = chain_builder(50, scope).build().unwrap();
        let head = link(0);
        group.bench_function(BenchmarkId::new("chain_50", scope), |b| {
            b.iter(|| black_box(container.resolve(&head).unwrap()))
        });
    }

    group.finish();
}

fn bench_override(c: &mut Criterion) {
    let mut group = c.benchmark_group("override");
    let base = chain_builder(100, Scope::Singleton).build().unwrap();

    group.bench_function("override_leaf_100", |b| {
        b.iter(|| {
            black_box(
                base.with_overridden_singleton(
                    link(99),
                    FnFactory::new(Signature::new(), |_| Ok(Node { depth: 0, next: None })),
                    FixedArgs::new(),
                )
                .unwrap(),
            )
        })
    });

    group.finish();
}

fn bench_concurrent(c: &mut Criterion) {
    use std::thread;

    let mut group = c.benchmark_group("concurrent");

    group.bench_function("concurrent_cached_resolves_4", |b| {
        let container = fan_in(8, Scope::Cached);
        let root = TypeKey::named("Root");

        b.iter(|| {
            thread::scope(|s| {
                for _ in 0..4 {
                    s.spawn(|| {
                        for _ in 0..100 {
                            let _ = container.resolve(&root).unwrap();
                        }
                    });
                }
            })
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_build,
    bench_resolution,
    bench_scopes,
    bench_override,
    bench_concurrent,
);

criterion_main!(benches);
