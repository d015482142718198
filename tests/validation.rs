/// Build-time validation tests
///
/// Declared dependencies are checked when the registry is built, before any
/// scope or instance exists.

use ferrous_scope::{BuildError, ContainerOptions, DuplicatePolicy, Lifetime, Registry, Resolver};
use std::sync::Arc;

struct Database;
struct Repository;
struct RequestContext;
struct Handler;

#[test]
fn test_valid_configuration_builds() {
    let mut registry = Registry::new();
    registry.register::<Database, _>(|_| Ok(Database)).singleton();
    registry
        .register::<Repository, _>(|r| {
            r.get::<Database>()?;
            Ok(Repository)
        })
        .per_scope()
        .depends_on::<Database>();
    registry
        .register::<Handler, _>(|r| {
            r.get::<Repository>()?;
            Ok(Handler)
        })
        .depends_on::<Repository>();

    assert!(registry.build().is_ok());
}

#[test]
fn test_missing_dependency() {
    let mut registry = Registry::new();
    registry
        .register::<Repository, _>(|_| Ok(Repository))
        .depends_on::<Database>();

    match registry.build() {
        Err(BuildError::MissingDependency { service, dependency }) => {
            assert!(service.ends_with("Repository"));
            assert!(dependency.ends_with("Database"));
        }
        other => panic!("expected MissingDependency, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_missing_named_dependency() {
    let mut registry = Registry::new();
    registry.add_named_singleton("primary", "postgres://primary".to_string());
    registry
        .register::<Repository, _>(|_| Ok(Repository))
        .depends_on_named::<String>("replica");

    match registry.build() {
        Err(BuildError::MissingDependency { dependency, .. }) => {
            assert!(dependency.contains("\"replica\""));
        }
        other => panic!("expected MissingDependency, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_captive_dependency() {
    let mut registry = Registry::new();
    registry.register::<RequestContext, _>(|_| Ok(RequestContext)).per_scope();
    registry
        .register::<Handler, _>(|_| Ok(Handler))
        .singleton()
        .depends_on::<RequestContext>();

    match registry.build() {
        Err(BuildError::CaptiveDependency { lifetime, .. }) => assert_eq!(lifetime, Lifetime::PerScope),
        other => panic!("expected CaptiveDependency, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_singleton_may_depend_on_transient_and_singleton() {
    let mut registry = Registry::new();
    registry.register::<Database, _>(|_| Ok(Database)).singleton();
    registry.register::<Repository, _>(|_| Ok(Repository));
    registry
        .register::<Handler, _>(|_| Ok(Handler))
        .singleton()
        .depends_on::<Database>()
        .depends_on::<Repository>();

    assert!(registry.build().is_ok());
}

#[test]
fn test_declared_cycle() {
    let mut registry = Registry::new();
    registry
        .register::<Repository, _>(|_| Ok(Repository))
        .depends_on::<Handler>();
    registry
        .register::<Handler, _>(|_| Ok(Handler))
        .depends_on::<Repository>();

    match registry.build() {
        Err(BuildError::CircularDependency(path)) => {
            assert_eq!(path.len(), 3);
            assert_eq!(path.first(), path.last());
        }
        other => panic!("expected CircularDependency, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_trait_dependency_declaration() {
    trait Clock: Send + Sync {}
    struct SystemClock;
    impl Clock for SystemClock {}

    let mut registry = Registry::new();
    registry
        .register::<Handler, _>(|r| {
            r.get_trait::<dyn Clock>()?;
            Ok(Handler)
        })
        .depends_on_trait::<dyn Clock>()
        .depends_on_trait_named::<dyn Clock>("utc");
    registry.register_trait::<dyn Clock, _>(|_| Ok(Arc::new(SystemClock)));

    match registry.build() {
        Err(BuildError::MissingDependency { dependency, .. }) => assert!(dependency.contains("utc")),
        other => panic!("expected MissingDependency, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_several_problems_are_reported_together() {
    let mut registry = Registry::new();
    registry.register::<RequestContext, _>(|_| Ok(RequestContext)).per_scope();
    registry
        .register::<Handler, _>(|_| Ok(Handler))
        .singleton()
        .depends_on::<RequestContext>()
        .depends_on::<Database>();

    match registry.build() {
        Err(BuildError::Invalid(errors)) => {
            assert_eq!(errors.len(), 2);
            assert!(errors.iter().any(|e| matches!(e, BuildError::CaptiveDependency { .. })));
            assert!(errors.iter().any(|e| matches!(e, BuildError::MissingDependency { .. })));
        }
        other => panic!("expected Invalid, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_validation_can_be_disabled() {
    let options = ContainerOptions::default().with_validation(false);
    let mut registry = Registry::with_options(options);
    registry
        .register::<Repository, _>(|_| Ok(Repository))
        .depends_on::<Database>();

    let container = registry.build().unwrap();
    assert!(container.get::<Repository>().is_ok());
}

#[test]
fn test_duplicates_override_by_default() {
    let mut registry = Registry::new();
    registry.add_singleton(1u32);
    registry.add_singleton(2u32);
    assert_eq!(registry.len(), 2);

    let container = registry.build().unwrap();
    assert_eq!(*container.get_required::<u32>(), 2);
}

#[test]
fn test_duplicates_rejected_when_configured() {
    let options = ContainerOptions::default().with_duplicates(DuplicatePolicy::Reject);
    let mut registry = Registry::with_options(options);
    registry.add_singleton(1u32);
    registry.add_named_singleton("other", 2u32);
    registry.add_singleton(3u32);

    assert_eq!(
        registry.build().map(|_| ()),
        Err(BuildError::DuplicateRegistration {
            service: "u32",
            name: None,
        })
    );
}

#[test]
fn test_build_error_messages() {
    let err = BuildError::CaptiveDependency {
        service: "Handler".to_string(),
        dependency: "RequestContext".to_string(),
        lifetime: Lifetime::PerMatchingScope("request"),
    };
    assert_eq!(
        err.to_string(),
        "Singleton Handler cannot depend on RequestContext with lifetime per-matching-scope(request)"
    );

    let err = BuildError::DuplicateRegistration {
        service: "u32",
        name: Some("port"),
    };
    assert_eq!(err.to_string(), "Duplicate registration for u32 (named \"port\")");
}
