//! Resolver traits for service resolution.

use std::any::Any;
use std::sync::Arc;

use crate::error::{DiError, DiResult};
use crate::key::Key;

/// Core resolver trait for object-safe service resolution.
///
/// This trait provides the type-erased resolution entry point. Lifetime
/// scopes, the container, and the [`ResolverContext`](crate::ResolverContext)
/// handed to factories all implement it.
///
/// Most users should use the [`Resolver`] trait instead, which provides
/// typed generic methods built on top of this trait.
pub trait ResolverCore: Send + Sync {
    /// Resolves the winning registration for `key`.
    ///
    /// # Returns
    ///
    /// * `Ok(AnyArc)` - The resolved service wrapped in `Arc<dyn Any>`
    /// * `Err(DiError)` - Resolution error (not registered, disposed scope,
    ///   missing tagged scope, circular dependency, factory failure)
    fn resolve_any(&self, key: &Key) -> DiResult<Arc<dyn Any + Send + Sync>>;
}

/// High-level resolver interface with generic methods for type-safe service resolution.
///
/// # Examples
///
/// ```
/// use ferrous_scope::{Registry, Resolver};
/// use std::sync::Arc;
///
/// trait Logger: Send + Sync {
///     fn log(&self, msg: &str) -> String;
/// }
///
/// struct ConsoleLogger;
/// impl Logger for ConsoleLogger {
///     fn log(&self, msg: &str) -> String {
///         format!("LOG: {}", msg)
///     }
/// }
///
/// let mut registry = Registry::new();
/// registry.add_singleton(42usize);
/// registry
///     .register_trait::<dyn Logger, _>(|_| Ok(Arc::new(ConsoleLogger)))
///     .singleton();
///
/// let container = registry.build().unwrap();
/// let scope = container.begin_scope().unwrap();
///
/// assert_eq!(*scope.get_required::<usize>(), 42);
/// let logger = scope.get_required_trait::<dyn Logger>();
/// assert_eq!(logger.log("resolved"), "LOG: resolved");
/// ```
pub trait Resolver: ResolverCore {
    /// Resolves a concrete service type.
    ///
    /// ```
    /// use ferrous_scope::{Registry, Resolver};
    ///
    /// let mut registry = Registry::new();
    /// registry.add_singleton("configuration".to_string());
    ///
    /// let container = registry.build().unwrap();
    /// let config = container.get::<String>().unwrap();
    /// assert_eq!(&*config, "configuration");
    /// ```
    fn get<T: Send + Sync + 'static>(&self) -> DiResult<Arc<T>> {
        downcast::<T>(self.resolve_any(&Key::of::<T>())?)
    }

    /// Resolves a named concrete service type.
    fn get_named<T: Send + Sync + 'static>(&self, name: &'static str) -> DiResult<Arc<T>> {
        downcast::<T>(self.resolve_any(&Key::named::<T>(name))?)
    }

    /// Resolves a trait implementation registered with
    /// [`Registry::register_trait`](crate::Registry::register_trait).
    fn get_trait<T: ?Sized + Send + Sync + 'static>(&self) -> DiResult<Arc<T>> {
        downcast_trait::<T>(self.resolve_any(&Key::of::<T>())?)
    }

    /// Resolves a named trait implementation.
    fn get_named_trait<T: ?Sized + Send + Sync + 'static>(&self, name: &'static str) -> DiResult<Arc<T>> {
        downcast_trait::<T>(self.resolve_any(&Key::named::<T>(name))?)
    }

    /// Resolves a concrete service type, panicking on failure.
    ///
    /// Use this when the service is known to be registered and a failure is a
    /// configuration bug.
    fn get_required<T: Send + Sync + 'static>(&self) -> Arc<T> {
        self.get::<T>()
            .unwrap_or_else(|e| panic!("Failed to resolve {}: {}", std::any::type_name::<T>(), e))
    }

    /// Resolves a named concrete service type, panicking on failure.
    fn get_named_required<T: Send + Sync + 'static>(&self, name: &'static str) -> Arc<T> {
        self.get_named::<T>(name).unwrap_or_else(|e| {
            panic!("Failed to resolve named {} ({}): {}", std::any::type_name::<T>(), name, e)
        })
    }

    /// Resolves a trait implementation, panicking on failure.
    fn get_required_trait<T: ?Sized + Send + Sync + 'static>(&self) -> Arc<T> {
        self.get_trait::<T>()
            .unwrap_or_else(|e| panic!("Failed to resolve trait {}: {}", std::any::type_name::<T>(), e))
    }

    /// Resolves a named trait implementation, panicking on failure.
    fn get_named_trait_required<T: ?Sized + Send + Sync + 'static>(&self, name: &'static str) -> Arc<T> {
        self.get_named_trait::<T>(name).unwrap_or_else(|e| {
            panic!("Failed to resolve named trait {} ({}): {}", std::any::type_name::<T>(), name, e)
        })
    }
}

impl<R: ResolverCore + ?Sized> Resolver for R {}

fn downcast<T: Send + Sync + 'static>(any: Arc<dyn Any + Send + Sync>) -> DiResult<Arc<T>> {
    any.downcast::<T>()
        .map_err(|_| DiError::TypeMismatch(std::any::type_name::<T>()))
}

// Trait objects are stored as Arc<Arc<dyn Trait>>.
fn downcast_trait<T: ?Sized + Send + Sync + 'static>(any: Arc<dyn Any + Send + Sync>) -> DiResult<Arc<T>> {
    any.downcast::<Arc<T>>()
        .map(|boxed| (*boxed).clone())
        .map_err(|_| DiError::TypeMismatch(std::any::type_name::<T>()))
}
