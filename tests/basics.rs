use ferrous_scope::{DiError, Key, Lifetime, Registry, Resolver};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[test]
fn test_concrete_singleton() {
    let mut registry = Registry::new();
    registry.add_singleton(42usize);
    registry.add_singleton("hello".to_string());

    let container = registry.build().unwrap();

    let num1 = container.get_required::<usize>();
    let num2 = container.get_required::<usize>();
    let str1 = container.get_required::<String>();
    let str2 = container.get_required::<String>();

    assert_eq!(*num1, 42);
    assert_eq!(*str1, "hello");
    assert!(Arc::ptr_eq(&num1, &num2)); // Same instance
    assert!(Arc::ptr_eq(&str1, &str2)); // Same instance
}

#[test]
fn test_factory_with_dependencies() {
    #[derive(Debug)]
    struct Config {
        port: u16,
    }

    #[derive(Debug)]
    struct Server {
        config: Arc<Config>,
        name: String,
    }

    let mut registry = Registry::new();
    registry.add_singleton(Config { port: 8080 });
    registry.add_singleton_factory::<Server, _>(|r| Server {
        config: r.get_required::<Config>(),
        name: "MyServer".to_string(),
    });

    let container = registry.build().unwrap();
    let server = container.get_required::<Server>();

    assert_eq!(server.config.port, 8080);
    assert_eq!(server.name, "MyServer");
}

#[test]
fn test_transient_creates_new_instances() {
    let counter = Arc::new(Mutex::new(0));
    let counter_clone = counter.clone();

    let mut registry = Registry::new();
    registry.add_transient_factory::<String, _>(move |_| {
        let mut c = counter_clone.lock().unwrap();
        *c += 1;
        format!("instance-{}", *c)
    });

    let container = registry.build().unwrap();
    let scope = container.begin_scope().unwrap();

    let a = scope.get_required::<String>();
    let b = scope.get_required::<String>();
    let c = scope.get_required::<String>();

    assert_eq!(*a, "instance-1");
    assert_eq!(*b, "instance-2");
    assert_eq!(*c, "instance-3");

    // All different instances
    assert!(!Arc::ptr_eq(&a, &b));
    assert!(!Arc::ptr_eq(&b, &c));
    assert_eq!(*counter.lock().unwrap(), 3);
}

#[test]
fn test_singleton_factory_runs_once_across_scopes() {
    let calls = Arc::new(AtomicUsize::new(0));
    let calls_clone = calls.clone();

    struct Cache;

    let mut registry = Registry::new();
    registry
        .register::<Cache, _>(move |_| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
            Ok(Cache)
        })
        .singleton();

    let container = registry.build().unwrap();
    let first = container.root().get_required::<Cache>();

    for _ in 0..5 {
        let scope = container.begin_scope().unwrap();
        let nested = scope.begin_scope().unwrap();
        assert!(Arc::ptr_eq(&first, &scope.get_required::<Cache>()));
        assert!(Arc::ptr_eq(&first, &nested.get_required::<Cache>()));
    }

    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_trait_registration() {
    trait Logger: Send + Sync {
        fn log(&self, message: &str) -> String;
    }

    struct ConsoleLogger;
    impl Logger for ConsoleLogger {
        fn log(&self, message: &str) -> String {
            format!("LOG: {}", message)
        }
    }

    let mut registry = Registry::new();
    registry
        .register_trait::<dyn Logger, _>(|_| Ok(Arc::new(ConsoleLogger)))
        .singleton();

    let container = registry.build().unwrap();
    let scope = container.begin_scope().unwrap();

    let logger = scope.get_required_trait::<dyn Logger>();
    assert_eq!(logger.log("ready"), "LOG: ready");
    assert!(Arc::ptr_eq(&logger, &container.get_required_trait::<dyn Logger>()));
}

#[test]
fn test_named_and_unnamed_are_distinct_partitions() {
    let mut registry = Registry::new();
    registry.add_named_singleton("primary", "postgres://primary".to_string());
    registry.add_named_singleton("replica", "postgres://replica".to_string());

    let container = registry.build().unwrap();

    assert_eq!(&*container.get_named_required::<String>("primary"), "postgres://primary");
    assert_eq!(&*container.get_named_required::<String>("replica"), "postgres://replica");

    match container.get::<String>() {
        Err(DiError::NotRegistered { name: None, .. }) => {}
        other => panic!("unnamed lookup should not match named registrations: {:?}", other),
    }
    match container.get_named::<String>("other") {
        Err(DiError::NotRegistered { name: Some("other"), .. }) => {}
        other => panic!("unexpected: {:?}", other),
    }
}

#[test]
fn test_last_registration_wins() {
    let mut registry = Registry::new();
    registry.add_singleton(1u32);
    registry.register::<u32, _>(|_| Ok(2)).per_scope();

    let container = registry.build().unwrap();
    assert_eq!(container.len(), 1);

    let scope = container.begin_scope().unwrap();
    assert_eq!(*scope.get_required::<u32>(), 2);
}

#[test]
fn test_not_registered() {
    struct Missing;

    let container = Registry::new().build().unwrap();
    assert!(container.is_empty());

    match container.get::<Missing>() {
        Err(DiError::NotRegistered { service, name }) => {
            assert!(service.ends_with("Missing"));
            assert_eq!(name, None);
        }
        _ => panic!("expected NotRegistered"),
    }
}

#[test]
fn test_failed_factory_caches_nothing() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let attempts_clone = attempts.clone();

    struct Flaky(usize);

    let mut registry = Registry::new();
    registry
        .register::<Flaky, _>(move |_| {
            let n = attempts_clone.fetch_add(1, Ordering::SeqCst);
            if n == 0 {
                Err(DiError::factory::<Flaky>("warming up"))
            } else {
                Ok(Flaky(n))
            }
        })
        .singleton();

    let container = registry.build().unwrap();

    match container.get::<Flaky>() {
        Err(DiError::Factory { message, .. }) => assert_eq!(message, "warming up"),
        _ => panic!("first attempt should fail"),
    }

    // A later resolve retries and the success is cached
    let value = container.get_required::<Flaky>();
    assert_eq!(value.0, 1);
    assert!(Arc::ptr_eq(&value, &container.get_required::<Flaky>()));
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
}

#[test]
fn test_publish_after_complete() {
    // Two-phase construction: the factory builds, then wires. Nothing is
    // visible in the slot until the factory returns.
    struct Inner;
    struct Outer {
        inner: Option<Arc<Inner>>,
    }

    let mut registry = Registry::new();
    registry
        .register::<Inner, _>(|_| Err(DiError::factory::<Inner>("unavailable")))
        .per_scope();
    registry
        .register::<Outer, _>(|r| {
            let mut outer = Outer { inner: None };
            outer.inner = Some(r.get::<Inner>()?);
            Ok(outer)
        })
        .per_scope()
        .depends_on::<Inner>();

    let container = registry.build().unwrap();
    let scope = container.begin_scope().unwrap();

    assert!(scope.get::<Outer>().is_err());
    assert!(scope.get::<Outer>().is_err());
}

#[test]
fn test_resolver_context_describes_the_resolution() {
    #[derive(Debug, PartialEq)]
    struct Probe {
        service: Key,
        depth: usize,
        tag: Option<&'static str>,
    }
    struct Holder(Arc<Probe>);

    let mut registry = Registry::new();
    registry.register::<Probe, _>(|ctx| {
        Ok(Probe {
            service: *ctx.service(),
            depth: ctx.depth(),
            tag: ctx.scope_tag(),
        })
    });
    registry.register::<Holder, _>(|ctx| Ok(Holder(ctx.get::<Probe>()?)));

    let container = registry.build().unwrap();
    let scope = container.begin_tagged_scope("request").unwrap();

    let direct = scope.get_required::<Probe>();
    assert_eq!(
        *direct,
        Probe {
            service: Key::of::<Probe>(),
            depth: 0,
            tag: Some("request"),
        }
    );

    let nested = scope.get_required::<Holder>();
    assert_eq!(nested.0.depth, 1);
}

#[test]
fn test_lifetime_display() {
    assert_eq!(Lifetime::Transient.to_string(), "transient");
    assert_eq!(Lifetime::Singleton.to_string(), "singleton");
    assert_eq!(Lifetime::PerScope.to_string(), "per-scope");
    assert_eq!(Lifetime::PerMatchingScope("tx").to_string(), "per-matching-scope(tx)");
    assert!(Lifetime::PerMatchingScope("tx").is_scoped());
    assert!(!Lifetime::Transient.is_cached());
}
