//! Disposal traits for resource cleanup.

/// Boxed error returned by dispose hooks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Trait for synchronous resource disposal.
///
/// Implement this trait for services that need structured teardown (e.g.
/// flushing buffers, closing connections) and mark the registration with
/// [`disposable()`](crate::RegistrationBuilder::disposable). The hook runs
/// exactly once, when the scope that owns the instance ends; singletons are
/// disposed by [`Container::dispose`](crate::Container::dispose). Hooks of one
/// scope run in reverse creation order, and a failing hook does not prevent
/// the others from running.
///
/// # Examples
///
/// ```
/// use ferrous_scope::{BoxError, Dispose, Registry, Resolver};
/// use std::sync::atomic::{AtomicBool, Ordering};
///
/// struct Connection {
///     closed: AtomicBool,
/// }
///
/// impl Dispose for Connection {
///     fn dispose(&self) -> Result<(), BoxError> {
///         self.closed.store(true, Ordering::SeqCst);
///         Ok(())
///     }
/// }
///
/// let mut registry = Registry::new();
/// registry
///     .register::<Connection, _>(|_| Ok(Connection { closed: AtomicBool::new(false) }))
///     .per_scope()
///     .disposable();
///
/// let container = registry.build().unwrap();
/// let scope = container.begin_scope().unwrap();
/// let conn = scope.get_required::<Connection>();
/// scope.end().unwrap();
/// assert!(conn.closed.load(Ordering::SeqCst));
/// ```
pub trait Dispose: Send + Sync + 'static {
    /// Perform synchronous cleanup of resources.
    fn dispose(&self) -> Result<(), BoxError>;
}
