//! Lifetime scopes: nested resolution contexts and their teardown.
//!
//! Scopes form a tree rooted at the container's root scope. Each scope owns a
//! slot per per-scope registration and a disposal list of the instances it
//! created; singletons live in the container and are shared by every scope.

use std::cell::RefCell;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;

use once_cell::sync::OnceCell;
use parking_lot::{Mutex, RwLock};
use tracing::{debug, trace, warn};

use super::{ResolverContext, Shared};
use crate::error::{DiError, DiResult};
use crate::internal::{DisposeBag, DisposeEntry, Frame};
use crate::key::Key;
use crate::lifetime::Lifetime;
use crate::registration::{AnyArc, Registration};
use crate::traits::ResolverCore;

const OPEN: u8 = 0;
const DISPOSING: u8 = 1;
const CLOSED: u8 = 2;

static NEXT_SCOPE_ID: AtomicU64 = AtomicU64::new(1);

// Ids of the scopes this thread is currently constructing instances in.
thread_local! {
    static CONSTRUCTING: RefCell<Vec<u64>> = const { RefCell::new(Vec::new()) };
}

/// Marks the current thread as constructing into a scope until dropped.
struct Constructing(u64);

impl Constructing {
    fn enter(scope: u64) -> Self {
        CONSTRUCTING.with(|ids| ids.borrow_mut().push(scope));
        Constructing(scope)
    }

    fn active(scope: u64) -> bool {
        CONSTRUCTING.with(|ids| ids.borrow().contains(&scope))
    }
}

impl Drop for Constructing {
    fn drop(&mut self) {
        CONSTRUCTING.with(|ids| {
            let mut ids = ids.borrow_mut();
            if let Some(pos) = ids.iter().rposition(|id| *id == self.0) {
                ids.remove(pos);
            }
        });
    }
}

/// Lifecycle state of a [`LifetimeScope`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeState {
    /// Accepts resolutions and child scopes
    Open,
    /// `end()` is releasing owned instances
    Disposing,
    /// Ended; every operation fails with `ScopeDisposed`
    Closed,
}

/// A node in the tree of lifetime scopes.
///
/// A scope resolves services according to their lifetime:
///
/// - **Transient**: built fresh on every resolve, not tracked
/// - **Singleton**: shared container-wide, built against the root scope
/// - **PerScope**: cached in this scope and released when it ends
/// - **PerMatchingScope(tag)**: cached in the nearest scope tagged `tag`
///   (this one included) and released when that scope ends
///
/// `LifetimeScope` is a cheap handle; clones refer to the same scope. The
/// scope ends on an explicit [`end`](Self::end), through [`using`](Self::using),
/// or when the last handle is dropped, whichever comes first. Child scopes keep
/// their parent reachable but ending a parent does not end its children.
///
/// # Examples
///
/// ```
/// use ferrous_scope::{Registry, Resolver};
/// use std::sync::Arc;
///
/// struct RequestContext { id: u64 }
///
/// let mut registry = Registry::new();
/// registry
///     .register::<RequestContext, _>(|ctx| Ok(RequestContext { id: ctx.scope_id() }))
///     .per_scope();
///
/// let container = registry.build().unwrap();
/// let first = container.begin_scope().unwrap();
/// let second = container.begin_scope().unwrap();
///
/// let a = first.get_required::<RequestContext>();
/// assert!(Arc::ptr_eq(&a, &first.get_required::<RequestContext>()));
/// assert_ne!(a.id, second.get_required::<RequestContext>().id);
///
/// first.end().unwrap();
/// assert!(first.get::<RequestContext>().is_err());
/// ```
#[derive(Clone)]
pub struct LifetimeScope {
    inner: Arc<ScopeInner>,
}

pub(crate) struct ScopeInner {
    id: u64,
    tag: Option<&'static str>,
    depth: usize,
    parent: Option<Arc<ScopeInner>>,
    shared: Arc<Shared>,
    state: AtomicU8,
    // Set when end() was called from inside a construction into this scope.
    end_deferred: AtomicBool,
    // Resolutions into this scope's slots hold a read guard; end() holds the write guard.
    cells: RwLock<Box<[OnceCell<AnyArc>]>>,
    disposers: Mutex<DisposeBag>,
}

impl ScopeInner {
    pub(crate) fn root(shared: Arc<Shared>) -> Arc<Self> {
        Self::create(shared, None, None)
    }

    fn create(shared: Arc<Shared>, parent: Option<Arc<ScopeInner>>, tag: Option<&'static str>) -> Arc<Self> {
        let cells: Box<[OnceCell<AnyArc>]> = (0..shared.table.scoped_count)
            .map(|_| OnceCell::new())
            .collect::<Vec<_>>()
            .into_boxed_slice();
        let depth = parent.as_ref().map_or(0, |p| p.depth + 1);
        let id = NEXT_SCOPE_ID.fetch_add(1, Ordering::Relaxed);

        debug!(scope = id, tag = ?tag, depth, "lifetime scope opened");

        Arc::new(Self {
            id,
            tag,
            depth,
            parent,
            shared,
            state: AtomicU8::new(OPEN),
            end_deferred: AtomicBool::new(false),
            cells: RwLock::new(cells),
            disposers: Mutex::new(DisposeBag::default()),
        })
    }

    fn begin_child(self: &Arc<Self>, tag: Option<&'static str>) -> DiResult<Arc<Self>> {
        self.ensure_open()?;
        Ok(Self::create(self.shared.clone(), Some(self.clone()), tag))
    }

    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    pub(crate) fn tag(&self) -> Option<&'static str> {
        self.tag
    }

    fn state(&self) -> ScopeState {
        match self.state.load(Ordering::Acquire) {
            OPEN => ScopeState::Open,
            DISPOSING => ScopeState::Disposing,
            _ => ScopeState::Closed,
        }
    }

    #[inline]
    fn ensure_open(&self) -> DiResult<()> {
        if self.state.load(Ordering::Acquire) == OPEN {
            Ok(())
        } else {
            Err(DiError::ScopeDisposed { scope: self.id })
        }
    }

    fn root_scope(&self) -> &ScopeInner {
        let mut scope = self;
        while let Some(parent) = scope.parent.as_deref() {
            scope = parent;
        }
        scope
    }

    /// Nearest scope tagged `tag`, starting with this one.
    fn find_tagged(&self, tag: &str) -> Option<&ScopeInner> {
        std::iter::successors(Some(self), |scope| scope.parent.as_deref())
            .find(|scope| scope.tag == Some(tag))
    }

    /// Resolves `key` against this scope, as a nested resolution of `parent`
    /// when a factory is asking.
    pub(crate) fn resolve_key(&self, key: &Key, parent: Option<&Frame<'_>>) -> DiResult<AnyArc> {
        self.ensure_open()?;

        let reg = self.shared.table.get(key).ok_or(DiError::NotRegistered {
            service: key.display_name(),
            name: key.service_name(),
        })?;
        let frame = Frame::enter(parent, *key, self.shared.options.max_depth)?;

        match reg.lifetime {
            Lifetime::Transient => self.construct(reg, &frame),
            Lifetime::Singleton => self.resolve_singleton(reg, &frame),
            Lifetime::PerScope => self.resolve_owned(reg, &frame),
            Lifetime::PerMatchingScope(tag) => {
                let owner = self.find_tagged(tag).ok_or(DiError::NoMatchingScope {
                    service: key.display_name(),
                    tag,
                })?;
                owner.resolve_owned(reg, &frame)
            }
        }
    }

    fn construct(&self, reg: &Registration, frame: &Frame<'_>) -> DiResult<AnyArc> {
        let ctx = ResolverContext::new(self, frame);
        (reg.ctor)(&ctx)
    }

    fn resolve_singleton(&self, reg: &Registration, frame: &Frame<'_>) -> DiResult<AnyArc> {
        let root = self.root_scope();
        root.ensure_open()?;

        let cell = &self.shared.singletons[reg.slot];
        if let Some(instance) = cell.get() {
            trace!(service = reg.key.display_name(), "singleton hit");
            return Ok(instance.clone());
        }

        // Concurrent first callers block here until the winner publishes.
        let instance = cell.get_or_try_init(|| {
            let instance = root.construct(reg, frame)?;
            self.shared.singleton_disposers.lock().push(DisposeEntry::new(
                reg.key.display_name(),
                instance.clone(),
                reg.dispose.clone(),
            ));
            debug!(service = reg.key.display_name(), "singleton created");
            Ok::<_, DiError>(instance)
        })?;
        Ok(instance.clone())
    }

    /// Per-scope resolution with this scope as the owner.
    fn resolve_owned(&self, reg: &Registration, frame: &Frame<'_>) -> DiResult<AnyArc> {
        let resolved = self.resolve_owned_locked(reg, frame);
        if self.end_deferred.load(Ordering::Acquire) && !Constructing::active(self.id) {
            self.finish_deferred_end();
        }
        resolved
    }

    fn resolve_owned_locked(&self, reg: &Registration, frame: &Frame<'_>) -> DiResult<AnyArc> {
        let cells = self.cells.read_recursive();
        self.ensure_open()?;

        let cell = &cells[reg.slot];
        if let Some(instance) = cell.get() {
            trace!(scope = self.id, service = reg.key.display_name(), "scoped hit");
            return Ok(instance.clone());
        }

        let instance = cell.get_or_try_init(|| {
            let _constructing = Constructing::enter(self.id);
            let instance = self.construct(reg, frame)?;
            self.disposers.lock().push(DisposeEntry::new(
                reg.key.display_name(),
                instance.clone(),
                reg.dispose.clone(),
            ));
            debug!(
                scope = self.id,
                service = reg.key.display_name(),
                lifetime = %reg.lifetime,
                "scoped instance created"
            );
            Ok::<_, DiError>(instance)
        })?;
        Ok(instance.clone())
    }

    pub(crate) fn end(&self) -> DiResult<()> {
        if self
            .state
            .compare_exchange(OPEN, DISPOSING, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Ok(());
        }

        // This thread holds a read guard on the slots; waiting for the write
        // guard would never return. The outermost construction finishes it.
        if Constructing::active(self.id) {
            self.end_deferred.store(true, Ordering::Release);
            debug!(scope = self.id, "lifetime scope end deferred until construction returns");
            return Err(DiError::ScopeDisposed { scope: self.id });
        }

        self.release_owned()
    }

    /// Completes an end() that was called from inside a construction.
    fn finish_deferred_end(&self) {
        if self.end_deferred.swap(false, Ordering::AcqRel) {
            if let Err(err) = self.release_owned() {
                warn!(scope = self.id, error = %err, "deferred lifetime scope teardown failed");
            }
        }
    }

    fn release_owned(&self) -> DiResult<()> {
        // Waits for in-flight resolutions into this scope to finish.
        let mut cells = self.cells.write();
        let mut owned = std::mem::take(&mut *self.disposers.lock());
        let released = owned.len();
        let failures = owned.run_all_reverse();
        for cell in cells.iter_mut() {
            cell.take();
        }
        self.state.store(CLOSED, Ordering::Release);
        drop(cells);

        debug!(
            scope = self.id,
            tag = ?self.tag,
            released,
            failures = failures.len(),
            "lifetime scope ended"
        );

        if failures.is_empty() {
            Ok(())
        } else {
            Err(DiError::Teardown(failures))
        }
    }
}

impl Drop for ScopeInner {
    fn drop(&mut self) {
        if *self.state.get_mut() == OPEN {
            if let Err(err) = self.end() {
                warn!(scope = self.id, error = %err, "lifetime scope dropped with failed teardown");
            }
        } else {
            // A construction that called end() unwound before finishing it.
            self.finish_deferred_end();
        }
    }
}

impl LifetimeScope {
    pub(crate) fn from_inner(inner: Arc<ScopeInner>) -> Self {
        Self { inner }
    }

    /// Opens an untagged child scope.
    ///
    /// Fails with [`DiError::ScopeDisposed`] if this scope is no longer open.
    /// No factory runs when a scope is created.
    pub fn begin_scope(&self) -> DiResult<LifetimeScope> {
        self.inner.begin_child(None).map(Self::from_inner)
    }

    /// Opens a child scope carrying `tag`, the owner of
    /// [`Lifetime::PerMatchingScope(tag)`](Lifetime::PerMatchingScope) instances
    /// resolved from it or its descendants.
    pub fn begin_tagged_scope(&self, tag: &'static str) -> DiResult<LifetimeScope> {
        self.inner.begin_child(Some(tag)).map(Self::from_inner)
    }

    /// Ends the scope, releasing every instance it owns in reverse creation
    /// order.
    ///
    /// Idempotent: once the scope has started ending, further calls return
    /// `Ok(())` without releasing anything. Dispose hook failures are all
    /// collected into [`DiError::Teardown`]; they never stop the remaining
    /// hooks from running. Singletons and other scopes are left untouched.
    ///
    /// Called from inside a factory that is constructing an instance owned by
    /// this scope, `end()` cannot wait for that construction. The scope stops
    /// accepting resolutions at once and the call returns
    /// [`DiError::ScopeDisposed`]; the owned instances, including the one being
    /// constructed, are released as soon as the outermost such construction
    /// returns.
    pub fn end(&self) -> DiResult<()> {
        self.inner.end()
    }

    /// Runs `f` with this scope and ends the scope on every exit path.
    ///
    /// Returns the closure's result, or the teardown error if any dispose hook
    /// failed. If `f` panics the scope is still ended before the panic
    /// propagates.
    ///
    /// ```
    /// use ferrous_scope::{Registry, Resolver};
    ///
    /// struct UnitOfWork;
    ///
    /// let mut registry = Registry::new();
    /// registry.register::<UnitOfWork, _>(|_| Ok(UnitOfWork)).per_scope();
    /// let container = registry.build().unwrap();
    ///
    /// let scope = container.begin_scope().unwrap();
    /// let resolved = scope.using(|s| s.get::<UnitOfWork>().is_ok()).unwrap();
    /// assert!(resolved);
    /// assert!(!scope.is_open());
    /// ```
    pub fn using<R, F>(&self, f: F) -> DiResult<R>
    where
        F: FnOnce(&LifetimeScope) -> R,
    {
        let guard = EndOnUnwind(&self.inner);
        let out = f(self);
        drop(guard);
        self.inner.end().map(|()| out)
    }

    /// Process-unique id of this scope.
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    pub fn tag(&self) -> Option<&'static str> {
        self.inner.tag
    }

    /// Distance from the root scope (the root is 0).
    pub fn depth(&self) -> usize {
        self.inner.depth
    }

    pub fn parent(&self) -> Option<LifetimeScope> {
        self.inner.parent.clone().map(Self::from_inner)
    }

    pub fn state(&self) -> ScopeState {
        self.inner.state()
    }

    pub fn is_open(&self) -> bool {
        self.inner.state() == ScopeState::Open
    }

    /// Nearest scope tagged `tag`, this one included.
    pub fn find_tagged_ancestor(&self, tag: &str) -> Option<LifetimeScope> {
        let mut current = Some(&self.inner);
        while let Some(scope) = current {
            if scope.tag == Some(tag) {
                return Some(Self::from_inner(scope.clone()));
            }
            current = scope.parent.as_ref();
        }
        None
    }

    /// Tags from the root down to this scope; untagged scopes are skipped.
    pub fn tag_path(&self) -> Vec<&'static str> {
        let mut tags: Vec<_> = std::iter::successors(Some(&*self.inner), |scope| scope.parent.as_deref())
            .filter_map(|scope| scope.tag)
            .collect();
        tags.reverse();
        tags
    }

    /// Returns true if both handles refer to the same scope.
    pub fn ptr_eq(&self, other: &LifetimeScope) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl ResolverCore for LifetimeScope {
    fn resolve_any(&self, key: &Key) -> DiResult<AnyArc> {
        self.inner.resolve_key(key, None)
    }
}

impl fmt::Debug for LifetimeScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LifetimeScope")
            .field("id", &self.inner.id)
            .field("tag", &self.inner.tag)
            .field("depth", &self.inner.depth)
            .field("state", &self.inner.state())
            .finish()
    }
}

struct EndOnUnwind<'a>(&'a ScopeInner);

impl Drop for EndOnUnwind<'_> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            if let Err(err) = self.0.end() {
                warn!(scope = self.0.id, error = %err, "teardown failed while unwinding");
            }
        }
    }
}
