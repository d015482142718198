//! Service lifetime definitions.

use std::fmt;

/// Service lifetimes controlling instance caching and ownership.
///
/// - **Transient**: a fresh instance per resolution, owned by the caller
/// - **Singleton**: one instance per container, shared by every scope
/// - **PerScope**: one instance per lifetime scope, owned by the scope it was
///   first resolved in
/// - **PerMatchingScope(tag)**: one instance per nearest scope tagged `tag`,
///   owned by that tagged scope
///
/// # Examples
///
/// ```rust
/// use ferrous_scope::{Registry, Resolver};
/// use std::sync::Arc;
///
/// struct Database { url: String }
/// struct UnitOfWork;
/// struct Transaction;
///
/// let mut registry = Registry::new();
/// registry.add_singleton(Database { url: "postgres://localhost".to_string() });
/// registry.register::<UnitOfWork, _>(|_| Ok(UnitOfWork)).per_scope();
/// registry.register::<Transaction, _>(|_| Ok(Transaction)).per_matching_scope("transaction");
///
/// let container = registry.build().unwrap();
///
/// let request = container.begin_scope().unwrap();
/// let a = request.get_required::<UnitOfWork>();
/// let b = request.get_required::<UnitOfWork>();
/// assert!(Arc::ptr_eq(&a, &b));
///
/// let tx = container.begin_tagged_scope("transaction").unwrap();
/// let step = tx.begin_scope().unwrap();
/// assert!(Arc::ptr_eq(
///     &tx.get_required::<Transaction>(),
///     &step.get_required::<Transaction>(),
/// ));
/// assert!(request.get::<Transaction>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Lifetime {
    /// New instance per resolution, never cached or tracked
    #[default]
    Transient,
    /// Single instance per container, cached for the container's life
    Singleton,
    /// Single instance per lifetime scope, disposed with that scope
    PerScope,
    /// Single instance per nearest ancestor scope carrying the tag
    ///
    /// The search includes the resolving scope itself. Resolution fails with
    /// [`DiError::NoMatchingScope`](crate::DiError::NoMatchingScope) when no
    /// scope up to the root carries the tag.
    PerMatchingScope(&'static str),
}

impl Lifetime {
    /// Returns `true` if instances are cached in a lifetime scope.
    #[inline]
    pub fn is_scoped(&self) -> bool {
        matches!(self, Lifetime::PerScope | Lifetime::PerMatchingScope(_))
    }

    /// Returns `true` if instances are cached at all.
    #[inline]
    pub fn is_cached(&self) -> bool {
        !matches!(self, Lifetime::Transient)
    }
}

impl fmt::Display for Lifetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lifetime::Transient => f.write_str("transient"),
            Lifetime::Singleton => f.write_str("singleton"),
            Lifetime::PerScope => f.write_str("per-scope"),
            Lifetime::PerMatchingScope(tag) => write!(f, "per-matching-scope({})", tag),
        }
    }
}
