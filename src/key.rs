//! Service key types for the dependency injection container.

use std::any::TypeId;
use std::fmt;

/// Key for service storage and lookup.
///
/// A key is the identity of a registration: the service type (concrete or
/// `dyn Trait`) plus an optional name. Named and unnamed keys for the same
/// type are distinct partitions: resolving without a name never matches a
/// named registration, and vice versa.
///
/// # Examples
///
/// ```rust
/// use ferrous_scope::{Key, Registry, Resolver};
///
/// let mut registry = Registry::new();
/// registry.add_singleton(42u32);
/// registry.add_named_singleton("port", 8080u32);
///
/// let container = registry.build().unwrap();
/// assert_eq!(*container.get_required::<u32>(), 42);
/// assert_eq!(*container.get_named_required::<u32>("port"), 8080);
///
/// assert_ne!(Key::of::<u32>(), Key::named::<u32>("port"));
/// ```
#[derive(Clone, Copy)]
pub struct Key {
    type_id: TypeId,
    type_name: &'static str,
    name: Option<&'static str>,
}

impl Key {
    /// Key for the unnamed registration of `T`.
    ///
    /// `T` may be unsized, so `Key::of::<dyn Logger>()` identifies a trait
    /// registration.
    #[inline(always)]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            name: None,
        }
    }

    /// Key for the registration of `T` under `name`.
    #[inline(always)]
    pub fn named<T: ?Sized + 'static>(name: &'static str) -> Self {
        Self {
            name: Some(name),
            ..Self::of::<T>()
        }
    }

    /// Get the type or trait name for display
    ///
    /// ```rust
    /// use ferrous_scope::Key;
    ///
    /// assert_eq!(Key::of::<String>().display_name(), "alloc::string::String");
    /// assert_eq!(Key::named::<u32>("port").display_name(), "u32");
    /// ```
    pub fn display_name(&self) -> &'static str {
        self.type_name
    }

    /// Get the service name for named services, or None for unnamed services
    pub fn service_name(&self) -> Option<&'static str> {
        self.name
    }

    /// The `TypeId` of the service type.
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }
}

// Equality ignores the type name; TypeId already identifies the type.
impl PartialEq for Key {
    #[inline(always)]
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id && self.name == other.name
    }
}

impl Eq for Key {}

impl std::hash::Hash for Key {
    #[inline(always)]
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
        self.name.hash(state);
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name {
            Some(name) => write!(f, "Key({} @ {:?})", self.type_name, name),
            None => write!(f, "Key({})", self.type_name),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name {
            Some(name) => write!(f, "{} (named \"{}\")", self.type_name, name),
            None => f.write_str(self.type_name),
        }
    }
}

// Helper function for creating type keys
#[inline(always)]
pub fn key_of_type<T: ?Sized + 'static>() -> Key {
    Key::of::<T>()
}
