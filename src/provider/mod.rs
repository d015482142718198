//! Built containers and the scopes they resolve through.
//!
//! A [`Container`] is produced by [`Registry::build`](crate::Registry::build).
//! It owns the frozen registration table, the singleton slots and the root
//! [`LifetimeScope`]; every other scope is opened from the root or one of its
//! descendants.

use std::fmt;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::config::ContainerOptions;
use crate::error::{DiError, DiResult, DisposeFailure};
use crate::internal::DisposeBag;
use crate::key::Key;
use crate::registration::{AnyArc, RegistrationTable};
use crate::traits::ResolverCore;

pub mod context;
pub mod scope;

pub use context::ResolverContext;
pub use scope::{LifetimeScope, ScopeState};

use scope::ScopeInner;

/// State shared by every scope of one container.
pub(crate) struct Shared {
    pub(crate) table: RegistrationTable,
    pub(crate) singletons: Box<[OnceCell<AnyArc>]>,
    pub(crate) singleton_disposers: Mutex<DisposeBag>,
    pub(crate) options: ContainerOptions,
}

impl Shared {
    fn release_singletons(&self) -> Vec<DisposeFailure> {
        let mut owned = std::mem::take(&mut *self.singleton_disposers.lock());
        owned.run_all_reverse()
    }
}

impl Drop for Shared {
    fn drop(&mut self) {
        if self.singleton_disposers.get_mut().is_empty() {
            return;
        }
        let failures = self.release_singletons();
        for failure in &failures {
            warn!(service = failure.service, error = %failure.message, "singleton teardown failed on drop");
        }
    }
}

/// A built dependency container.
///
/// The container resolves through its root scope: per-scope services resolved
/// directly from the container live as long as the container. Open child
/// scopes with [`begin_scope`](Self::begin_scope) or
/// [`begin_tagged_scope`](Self::begin_tagged_scope) for shorter-lived units of
/// work.
///
/// Cloning is cheap and every clone refers to the same container.
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
/// registry.add_singleton(Database { url: "postgres://localhost".to_string() });
/// registry.register::<UserService, _>(|r| Ok(UserService { db: r.get::<Database>()? }));
///
/// let container = registry.build().unwrap();
/// let user_service = container.get_required::<UserService>();
/// assert_eq!(user_service.db.url, "postgres://localhost");
///
/// container.dispose().unwrap();
/// assert!(container.get::<Database>().is_err());
/// ```
#[derive(Clone)]
pub struct Container {
    shared: Arc<Shared>,
    root: LifetimeScope,
}

impl Container {
    pub(crate) fn new(table: RegistrationTable, options: ContainerOptions) -> Self {
        let singletons: Box<[OnceCell<AnyArc>]> = (0..table.singleton_count)
            .map(|_| OnceCell::new())
            .collect::<Vec<_>>()
            .into_boxed_slice();

        debug!(
            registrations = table.len(),
            singletons = table.singleton_count,
            scoped = table.scoped_count,
            "container built"
        );

        let shared = Arc::new(Shared {
            table,
            singletons,
            singleton_disposers: Mutex::new(DisposeBag::default()),
            options,
        });
        let root = LifetimeScope::from_inner(ScopeInner::root(shared.clone()));
        Self { shared, root }
    }

    /// The root scope. Singletons are always built against it.
    pub fn root(&self) -> &LifetimeScope {
        &self.root
    }

    /// Opens an untagged child of the root scope.
    pub fn begin_scope(&self) -> DiResult<LifetimeScope> {
        self.root.begin_scope()
    }

    /// Opens a tagged child of the root scope.
    pub fn begin_tagged_scope(&self, tag: &'static str) -> DiResult<LifetimeScope> {
        self.root.begin_tagged_scope(tag)
    }

    pub fn options(&self) -> &ContainerOptions {
        &self.shared.options
    }

    /// Returns true if a registration exists for `key`.
    pub fn is_registered(&self, key: &Key) -> bool {
        self.shared.table.get(key).is_some()
    }

    /// Number of registrations after duplicates were resolved.
    pub fn len(&self) -> usize {
        self.shared.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shared.table.len() == 0
    }

    /// Ends the root scope, then releases every singleton in reverse creation
    /// order.
    ///
    /// After disposal the root scope is closed and singleton resolution fails
    /// with [`DiError::ScopeDisposed`] from every scope. Child scopes still
    /// open are not ended; they keep their own per-scope instances until they
    /// end. Calling `dispose` again is a no-op.
    pub fn dispose(&self) -> DiResult<()> {
        let mut failures = match self.root.end() {
            Ok(()) => Vec::new(),
            Err(DiError::Teardown(failures)) => failures,
            Err(other) => return Err(other),
        };
        failures.extend(self.shared.release_singletons());

        debug!(failures = failures.len(), "container disposed");

        if failures.is_empty() {
            Ok(())
        } else {
            Err(DiError::Teardown(failures))
        }
    }

    #[cfg(feature = "diagnostics")]
    pub fn to_debug_string(&self) -> String {
        let mut s = String::new();
        s.push_str("=== Container Debug ===\n");
        s.push_str(&format!("Root scope: {:?}\n", self.root));
        s.push_str("Registrations:\n");
        for reg in self.shared.table.iter() {
            let built = match reg.lifetime {
                crate::Lifetime::Singleton => self.shared.singletons[reg.slot].get().is_some(),
                _ => false,
            };
            s.push_str(&format!(
                "  #{} {:?}: {}{}\n",
                reg.ordinal,
                reg.key,
                reg.lifetime,
                if built { " (built)" } else { "" }
            ));
        }
        s
    }
}

impl ResolverCore for Container {
    fn resolve_any(&self, key: &Key) -> DiResult<AnyArc> {
        self.root.resolve_any(key)
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("registrations", &self.shared.table.len())
            .field("root", &self.root)
            .finish()
    }
}
