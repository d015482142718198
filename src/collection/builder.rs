//! Fluent configuration of a single registration.

use std::marker::PhantomData;
use std::sync::Arc;

use crate::key::Key;
use crate::lifetime::Lifetime;
use crate::registration::{AnyArc, Registration};
use crate::traits::{BoxError, Dispose};

pub(crate) fn view_concrete<T: Send + Sync + 'static>(any: &AnyArc) -> Option<&T> {
    any.downcast_ref::<T>()
}

// Trait services are stored as Arc<Arc<dyn Trait>>.
pub(crate) fn view_trait<T: ?Sized + Send + Sync + 'static>(any: &AnyArc) -> Option<&T> {
    any.downcast_ref::<Arc<T>>().map(|inner| &**inner)
}

/// Builder returned by [`Registry::register`](crate::Registry::register) and
/// [`Registry::register_trait`](crate::Registry::register_trait).
///
/// New registrations are transient and unnamed until configured otherwise.
///
/// # Examples
///
/// ```
/// use ferrous_scope::{Registry, Resolver};
///
/// struct Counter(u32);
///
/// let mut registry = Registry::new();
/// registry
///     .register::<Counter, _>(|_| Ok(Counter(7)))
///     .named("seed")
///     .singleton();
///
/// let container = registry.build().unwrap();
/// assert_eq!(container.get_named_required::<Counter>("seed").0, 7);
/// assert!(container.get::<Counter>().is_err());
/// ```
pub struct RegistrationBuilder<'r, T: ?Sized + 'static> {
    registration: &'r mut Registration,
    // Borrows the service out of its type-erased storage.
    view: fn(&AnyArc) -> Option<&T>,
    _service: PhantomData<fn() -> Box<T>>,
}

impl<'r, T: ?Sized + Send + Sync + 'static> RegistrationBuilder<'r, T> {
    pub(crate) fn new(registration: &'r mut Registration, view: fn(&AnyArc) -> Option<&T>) -> Self {
        Self {
            registration,
            view,
            _service: PhantomData,
        }
    }

    /// Registers under `name` instead of the unnamed slot for `T`.
    pub fn named(self, name: &'static str) -> Self {
        self.registration.key = Key::named::<T>(name);
        self
    }

    pub fn lifetime(self, lifetime: Lifetime) -> Self {
        self.registration.lifetime = lifetime;
        self
    }

    pub fn transient(self) -> Self {
        self.lifetime(Lifetime::Transient)
    }

    pub fn singleton(self) -> Self {
        self.lifetime(Lifetime::Singleton)
    }

    pub fn per_scope(self) -> Self {
        self.lifetime(Lifetime::PerScope)
    }

    /// Shares one instance per scope tagged `tag`; resolving with no such
    /// scope on the ancestor chain fails with `NoMatchingScope`.
    pub fn per_matching_scope(self, tag: &'static str) -> Self {
        self.lifetime(Lifetime::PerMatchingScope(tag))
    }

    /// Runs `hook` when the owner of an instance ends.
    ///
    /// Transient instances are never tracked, so the hook never runs for
    /// them.
    pub fn on_dispose<F>(self, hook: F) -> Self
    where
        F: Fn(&T) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        let view = self.view;
        self.registration.dispose = Some(Arc::new(move |any: &AnyArc| match view(any) {
            Some(service) => hook(service),
            None => Ok(()),
        }));
        self
    }

    /// Calls [`Dispose::dispose`] when the owner of an instance ends.
    pub fn disposable(self) -> Self
    where
        T: Dispose,
    {
        self.on_dispose(|service: &T| service.dispose())
    }

    /// Declares that the factory resolves `U`.
    ///
    /// Declared dependencies are only used by build-time validation.
    pub fn depends_on<U: Send + Sync + 'static>(self) -> Self {
        self.registration.dependencies.push(Key::of::<U>());
        self
    }

    pub fn depends_on_named<U: Send + Sync + 'static>(self, name: &'static str) -> Self {
        self.registration.dependencies.push(Key::named::<U>(name));
        self
    }

    /// Declares that the factory resolves the trait service `U`.
    pub fn depends_on_trait<U: ?Sized + Send + Sync + 'static>(self) -> Self {
        self.registration.dependencies.push(Key::of::<U>());
        self
    }

    pub fn depends_on_trait_named<U: ?Sized + Send + Sync + 'static>(self, name: &'static str) -> Self {
        self.registration.dependencies.push(Key::named::<U>(name));
        self
    }

    /// The key this registration will be stored under.
    pub fn key(&self) -> Key {
        self.registration.key
    }
}
