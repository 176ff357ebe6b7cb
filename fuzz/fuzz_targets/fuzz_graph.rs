#![no_main]

//! Fuzz target for graph validation and resolution
//!
//! Registers an arbitrary graph of up to 16 named services, then checks
//! that `build()` accepts it exactly when every dependency is registered
//! and the graph is acyclic, and that every key of an accepted graph
//! resolves.

use arbitrary::Arbitrary;
use depgraph_di::{ContainerBuilder, DiError, FixedArgs, FnFactory, Scope, Signature, TypeKey};
use libfuzzer_sys::fuzz_target;

const MAX_NODES: u8 = 16;

#[derive(Debug, Clone, Copy, Arbitrary)]
enum FuzzScope {
    Transient,
    Singleton,
    Cached,
}

impl From<FuzzScope> for Scope {
    fn from(scope: FuzzScope) -> Self {
        match scope {
            FuzzScope::Transient => Scope::Transient,
            FuzzScope::Singleton => Scope::Singleton,
            FuzzScope::Cached => Scope::Cached,
        }
    }
}

#[derive(Debug, Arbitrary)]
struct FuzzNode {
    id: u8,
    scope: FuzzScope,
    deps: Vec<u8>,
    /// Refer to dependencies by name instead of by key
    forward: bool,
}

fn name(id: u8) -> String {
    format!("Svc{}", id % MAX_NODES)
}

/// Expected build outcome, computed independently of the container
fn acceptable(nodes: &[(u8, Vec<u8>)]) -> bool {
    // 0 = unvisited, 1 = on stack, 2 = done
    fn visit(id: u8, nodes: &[(u8, Vec<u8>)], state: &mut [u8; 256]) -> bool {
        match state[id as usize] {
            1 => return false,
            2 => return true,
            _ => {}
        }
        let Some((_, deps)) = nodes.iter().find(|(n, _)| *n == id) else {
            return false;
        };
        state[id as usize] = 1;
        if !deps.iter().all(|&dep| visit(dep, nodes, state)) {
            return false;
        }
        state[id as usize] = 2;
        true
    }

    let mut state = [0u8; 256];
    nodes.iter().all(|(id, _)| visit(*id, nodes, &mut state))
}

fuzz_target!(|input: Vec<FuzzNode>| {
    let mut builder = ContainerBuilder::new();
    let mut registered: Vec<(u8, Vec<u8>)> = Vec::new();

    for node in input.into_iter().take(MAX_NODES as usize * 2) {
        let id = node.id % MAX_NODES;
        let deps: Vec<u8> = node.deps.iter().take(4).map(|d| d % MAX_NODES).collect();

        let mut signature = Signature::new();
        let mut seen = Vec::new();
        for &dep in &deps {
            if seen.contains(&dep) {
                continue;
            }
            seen.push(dep);
            let ty = if node.forward {
                TypeKey::forward(name(dep))
            } else {
                TypeKey::named(name(dep))
            };
            signature = signature.param(format!("d{dep}"), ty);
        }

        let factory = FnFactory::new(signature, move |args| Ok(args.len()));
        match builder.register(TypeKey::named(name(id)), factory, node.scope.into(), FixedArgs::new()) {
            Ok(()) => registered.push((id, seen)),
            Err(DiError::AlreadyRegistered { .. }) => {
                assert!(registered.iter().any(|(n, _)| *n == id));
            }
            Err(other) => panic!("unexpected registration error: {other}"),
        }
    }

    let expected = acceptable(&registered);
    match builder.build() {
        Ok(container) => {
            assert!(expected, "build accepted an invalid graph");
            for (id, deps) in &registered {
                let instance = container
                    .resolve_as::<usize>(&TypeKey::named(name(*id)))
                    .expect("validated graph must resolve");
                assert_eq!(*instance, deps.len());
            }
        }
        Err(DiError::CircularDependency { .. } | DiError::NotFound { .. }) => {
            assert!(!expected, "build rejected a valid graph");
        }
        Err(other) => panic!("unexpected build error: {other}"),
    }
});
