//! Registry module for dependency injection.
//!
//! This module contains the [`Registry`] type, where services are registered
//! before being frozen into a [`Container`].

use std::sync::Arc;

use tracing::warn;

use crate::config::{ContainerOptions, DuplicatePolicy};
use crate::error::{BuildError, DiResult};
use crate::key::Key;
use crate::lifetime::Lifetime;
use crate::provider::{Container, ResolverContext};
use crate::registration::{AnyArc, Ctor, Registration, RegistrationTable};
use crate::validation;

pub mod builder;
pub use builder::RegistrationBuilder;

use builder::{view_concrete, view_trait};

/// Collects registrations and builds a [`Container`].
///
/// Registration order matters only for duplicates: with the default
/// [`DuplicatePolicy::LastWins`] the most recent registration for a key is
/// the one that resolves.
///
/// # Examples
///
/// ```
/// use ferrous_scope::{Registry, Resolver};
/// use std::sync::Arc;
///
/// struct Config { greeting: &'static str }
/// struct Greeter { config: Arc<Config> }
///
/// let mut registry = Registry::new();
/// registry.add_singleton(Config { greeting: "hello" });
/// registry
///     .register::<Greeter, _>(|r| Ok(Greeter { config: r.get::<Config>()? }))
///     .per_scope()
///     .depends_on::<Config>();
///
/// let container = registry.build().unwrap();
/// let scope = container.begin_scope().unwrap();
/// assert_eq!(scope.get_required::<Greeter>().config.greeting, "hello");
/// ```
#[derive(Default)]
pub struct Registry {
    registrations: Vec<Registration>,
    options: ContainerOptions,
}

impl Registry {
    /// Creates an empty registry with default options.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ContainerOptions) -> Self {
        Self {
            registrations: Vec::new(),
            options,
        }
    }

    pub fn options(&self) -> &ContainerOptions {
        &self.options
    }

    /// Number of registrations so far, duplicates included.
    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    /// Returns true if some registration uses `key`.
    pub fn contains(&self, key: &Key) -> bool {
        self.registrations.iter().any(|reg| reg.key == *key)
    }

    fn push(&mut self, key: Key, ctor: Ctor) -> &mut Registration {
        let ordinal = self.registrations.len();
        self.registrations.push(Registration::new(key, ctor, ordinal));
        &mut self.registrations[ordinal]
    }

    // ----- Fluent registration -----

    /// Registers a concrete service built by `factory`.
    ///
    /// The registration is transient until the returned builder says
    /// otherwise. The factory receives a [`ResolverContext`] for nested
    /// resolves; returning an error fails the resolve and caches nothing.
    ///
    /// ```
    /// use ferrous_scope::{DiError, Registry, Resolver};
    ///
    /// struct Port(u16);
    ///
    /// let mut registry = Registry::new();
    /// registry.add_named_singleton("port", "8080".to_string());
    /// registry
    ///     .register::<Port, _>(|r| {
    ///         let raw = r.get_named::<String>("port")?;
    ///         raw.parse().map(Port).map_err(DiError::factory::<Port>)
    ///     })
    ///     .singleton()
    ///     .depends_on_named::<String>("port");
    ///
    /// let container = registry.build().unwrap();
    /// assert_eq!(container.get_required::<Port>().0, 8080);
    /// ```
    pub fn register<T, F>(&mut self, factory: F) -> RegistrationBuilder<'_, T>
    where
        T: Send + Sync + 'static,
        F: Fn(&ResolverContext) -> DiResult<T> + Send + Sync + 'static,
    {
        let ctor: Ctor = Arc::new(move |ctx: &ResolverContext| -> DiResult<AnyArc> {
            factory(ctx).map(|value| Arc::new(value) as AnyArc)
        });
        let registration = self.push(Key::of::<T>(), ctor);
        RegistrationBuilder::new(registration, view_concrete::<T>)
    }

    /// Registers a trait-object service.
    ///
    /// Resolve it with [`Resolver::get_trait`](crate::Resolver::get_trait).
    ///
    /// ```
    /// use ferrous_scope::{Registry, Resolver};
    /// use std::sync::Arc;
    ///
    /// trait Clock: Send + Sync { fn now(&self) -> u64; }
    /// struct Fixed;
    /// impl Clock for Fixed { fn now(&self) -> u64 { 42 } }
    ///
    /// let mut registry = Registry::new();
    /// registry.register_trait::<dyn Clock, _>(|_| Ok(Arc::new(Fixed))).singleton();
    ///
    /// let container = registry.build().unwrap();
    /// assert_eq!(container.get_required_trait::<dyn Clock>().now(), 42);
    /// ```
    pub fn register_trait<T, F>(&mut self, factory: F) -> RegistrationBuilder<'_, T>
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&ResolverContext) -> DiResult<Arc<T>> + Send + Sync + 'static,
    {
        let ctor: Ctor = Arc::new(move |ctx: &ResolverContext| -> DiResult<AnyArc> {
            factory(ctx).map(|value| Arc::new(value) as AnyArc)
        });
        let registration = self.push(Key::of::<T>(), ctor);
        RegistrationBuilder::new(registration, view_trait::<T>)
    }

    // ----- Shorthands -----

    /// Registers an already-built singleton instance.
    pub fn add_singleton<T: Send + Sync + 'static>(&mut self, value: T) -> &mut Self {
        self.add_instance(Key::of::<T>(), value)
    }

    /// Registers an already-built singleton instance under `name`.
    pub fn add_named_singleton<T: Send + Sync + 'static>(&mut self, name: &'static str, value: T) -> &mut Self {
        self.add_instance(Key::named::<T>(name), value)
    }

    fn add_instance<T: Send + Sync + 'static>(&mut self, key: Key, value: T) -> &mut Self {
        let instance: AnyArc = Arc::new(value);
        let ctor: Ctor = Arc::new(move |_: &ResolverContext| -> DiResult<AnyArc> { Ok(instance.clone()) });
        self.push(key, ctor).lifetime = Lifetime::Singleton;
        self
    }

    /// Registers a singleton built on first use by an infallible factory.
    pub fn add_singleton_factory<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: Fn(&ResolverContext) -> T + Send + Sync + 'static,
    {
        self.add_factory(Lifetime::Singleton, factory)
    }

    /// Registers a per-scope service built by an infallible factory.
    pub fn add_scoped_factory<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: Fn(&ResolverContext) -> T + Send + Sync + 'static,
    {
        self.add_factory(Lifetime::PerScope, factory)
    }

    /// Registers a transient service built by an infallible factory.
    pub fn add_transient_factory<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: Fn(&ResolverContext) -> T + Send + Sync + 'static,
    {
        self.add_factory(Lifetime::Transient, factory)
    }

    fn add_factory<T, F>(&mut self, lifetime: Lifetime, factory: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: Fn(&ResolverContext) -> T + Send + Sync + 'static,
    {
        self.register::<T, _>(move |ctx| Ok(factory(ctx))).lifetime(lifetime);
        self
    }

    // ----- Build -----

    /// Freezes the registry into a [`Container`].
    ///
    /// Consumes the registry, so nothing can be registered afterwards.
    /// Duplicate keys are rejected here under [`DuplicatePolicy::Reject`], and
    /// declared dependencies are checked when
    /// [`ContainerOptions::validate_on_build`] is set.
    ///
    /// ```
    /// use ferrous_scope::{BuildError, Registry};
    ///
    /// struct Service;
    /// struct Missing;
    ///
    /// let mut registry = Registry::new();
    /// registry.register::<Service, _>(|_| Ok(Service)).depends_on::<Missing>();
    ///
    /// assert!(matches!(registry.build(), Err(BuildError::MissingDependency { .. })));
    /// ```
    pub fn build(self) -> Result<Container, BuildError> {
        let Registry { registrations, options } = self;

        for reg in &registrations {
            if reg.dispose.is_some() && reg.lifetime == Lifetime::Transient {
                warn!(service = %reg.key, ordinal = reg.ordinal, "dispose hook on a transient registration never runs");
            }
        }

        if options.duplicates == DuplicatePolicy::Reject {
            validation::reject_duplicates(&registrations)?;
        }

        let table = RegistrationTable::freeze(registrations);
        if options.validate_on_build {
            validation::validate(&table)?;
        }

        Ok(Container::new(table, options))
    }
}
