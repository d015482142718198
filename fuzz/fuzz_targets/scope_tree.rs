#![no_main]

use libfuzzer_sys::fuzz_target;
use ferrous_scope::{DiError, LifetimeScope, Registry, Resolver};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Default)]
struct Counters {
    created: AtomicUsize,
    released: AtomicUsize,
}

struct Config;

struct PerRequest {
    owner: u64,
}

struct InTransaction;

fn registry(counters: &Arc<Counters>) -> Registry {
    let mut registry = Registry::new();
    registry.register::<Config, _>(|_| Ok(Config)).singleton();

    let (c, d) = (counters.clone(), counters.clone());
    registry
        .register::<PerRequest, _>(move |ctx| {
            ctx.get::<Config>()?;
            c.created.fetch_add(1, Ordering::SeqCst);
            Ok(PerRequest { owner: ctx.scope_id() })
        })
        .per_scope()
        .on_dispose(move |_| {
            d.released.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

    let (c, d) = (counters.clone(), counters.clone());
    registry
        .register::<InTransaction, _>(move |_| {
            c.created.fetch_add(1, Ordering::SeqCst);
            Ok(InTransaction)
        })
        .per_matching_scope("tx")
        .on_dispose(move |_| {
            d.released.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

    registry
}

fuzz_target!(|data: &[u8]| {
    let counters = Arc::new(Counters::default());
    let container = match registry(&counters).build() {
        Ok(container) => container,
        Err(_) => return,
    };

    let mut scopes: Vec<LifetimeScope> = vec![container.root().clone()];

    // Each pair of bytes is (operation, target scope)
    for chunk in data.chunks_exact(2) {
        let target = scopes[chunk[1] as usize % scopes.len()].clone();
        let open = target.is_open();

        match chunk[0] % 6 {
            0 => match target.begin_scope() {
                Ok(child) => {
                    assert!(open);
                    assert_eq!(child.depth(), target.depth() + 1);
                    scopes.push(child);
                }
                Err(DiError::ScopeDisposed { .. }) => assert!(!open),
                Err(other) => panic!("unexpected error: {}", other),
            },
            1 => match target.begin_tagged_scope("tx") {
                Ok(child) => {
                    assert!(open);
                    assert_eq!(child.tag(), Some("tx"));
                    scopes.push(child);
                }
                Err(DiError::ScopeDisposed { .. }) => assert!(!open),
                Err(other) => panic!("unexpected error: {}", other),
            },
            2 => match target.get::<PerRequest>() {
                Ok(instance) => {
                    assert!(open);
                    assert_eq!(instance.owner, target.id());
                    assert!(Arc::ptr_eq(&instance, &target.get_required::<PerRequest>()));
                }
                Err(DiError::ScopeDisposed { .. }) => assert!(!open),
                Err(other) => panic!("unexpected error: {}", other),
            },
            3 => match target.get::<InTransaction>() {
                Ok(_) => assert!(target.find_tagged_ancestor("tx").is_some()),
                Err(DiError::NoMatchingScope { tag, .. }) => {
                    assert_eq!(tag, "tx");
                    assert!(target.find_tagged_ancestor("tx").is_none());
                }
                // Either the target or its tagged owner has ended
                Err(DiError::ScopeDisposed { .. }) => {}
                Err(other) => panic!("unexpected error: {}", other),
            },
            4 => {
                if !target.ptr_eq(container.root()) {
                    let _ = target.end();
                    assert!(!target.is_open());
                }
            }
            _ => {
                let _ = target.get::<Config>();
            }
        }
    }

    for scope in scopes.iter().rev() {
        let _ = scope.end();
    }
    let _ = container.dispose();

    assert_eq!(
        counters.created.load(Ordering::SeqCst),
        counters.released.load(Ordering::SeqCst)
    );
});
