//! Resolver context for dependency injection.
//!
//! This module contains the ResolverContext type which provides
//! the interface for factory functions to resolve dependencies.

use crate::error::DiResult;
use crate::internal::Frame;
use crate::key::Key;
use crate::registration::AnyArc;
use crate::traits::ResolverCore;

use super::scope::ScopeInner;

/// Context passed to factory functions for resolving dependencies.
///
/// The context resolves against the scope the instance will live in: the
/// resolving scope for transient and per-scope services, the tagged owner for
/// per-matching-scope services, and the root scope for singletons. Nested
/// resolves made through the context are part of the same resolution chain,
/// which is how cycles are detected.
///
/// # Examples
///
/// ```
/// use ferrous_scope::{Registry, Resolver};
/// use std::sync::Arc;
///
/// struct Database { url: String }
/// struct UserService { db: Arc<Database> }
///
/// let mut registry = Registry::new();
/// registry.add_singleton(Database {
///     url: "postgres://localhost".to_string()
/// });
/// registry.register::<UserService, _>(|resolver| {
///     Ok(UserService { db: resolver.get::<Database>()? })
/// });
///
/// let container = registry.build().unwrap();
/// let scope = container.begin_scope().unwrap();
/// assert_eq!(scope.get_required::<UserService>().db.url, "postgres://localhost");
/// ```
pub struct ResolverContext<'a> {
    scope: &'a ScopeInner,
    frame: &'a Frame<'a>,
}

impl<'a> ResolverContext<'a> {
    pub(crate) fn new(scope: &'a ScopeInner, frame: &'a Frame<'a>) -> Self {
        Self { scope, frame }
    }

    /// Tag of the scope this factory is resolving against.
    pub fn scope_tag(&self) -> Option<&'static str> {
        self.scope.tag()
    }

    /// Id of the scope this factory is resolving against.
    pub fn scope_id(&self) -> u64 {
        self.scope.id()
    }

    /// The service being constructed.
    pub fn service(&self) -> &Key {
        self.frame.key()
    }

    /// Number of resolutions this one is nested in (0 for a top-level resolve).
    pub fn depth(&self) -> usize {
        self.frame.depth()
    }
}

impl<'a> ResolverCore for ResolverContext<'a> {
    fn resolve_any(&self, key: &Key) -> DiResult<AnyArc> {
        self.scope.resolve_key(key, Some(self.frame))
    }
}
