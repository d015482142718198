//! Error types for the dependency injection container.

use thiserror::Error;

use crate::lifetime::Lifetime;

/// Resolution and teardown errors.
///
/// Every error is returned synchronously to the caller of the operation that
/// failed; the container never retries.
///
/// # Examples
///
/// ```rust
/// use ferrous_scope::{DiError, Registry, Resolver};
///
/// let container = Registry::new().build().unwrap();
/// match container.get::<String>() {
///     Err(DiError::NotRegistered { service, name: None }) => {
///         assert_eq!(service, "alloc::string::String");
///     }
///     _ => unreachable!(),
/// }
///
/// let circular = DiError::Circular(vec!["ServiceA", "ServiceB", "ServiceA"]);
/// assert_eq!(circular.to_string(), "Circular dependency: ServiceA -> ServiceB -> ServiceA");
/// ```
#[derive(Debug, Clone, Error)]
pub enum DiError {
    /// No registration matches the requested identity and name
    #[error("Service not registered: {service}{}", display_name(.name))]
    NotRegistered {
        service: &'static str,
        name: Option<&'static str>,
    },
    /// No scope on the ancestor chain carries the tag a registration needs
    #[error("No scope tagged '{tag}' is visible when resolving {service}")]
    NoMatchingScope {
        service: &'static str,
        tag: &'static str,
    },
    /// Circular dependency detected (includes path)
    #[error("Circular dependency: {}", .0.join(" -> "))]
    Circular(Vec<&'static str>),
    /// Resolve or begin_scope on a scope that is disposing or closed
    #[error("Lifetime scope {scope} has been disposed")]
    ScopeDisposed { scope: u64 },
    /// One or more dispose hooks failed while a scope was ending
    #[error("Teardown failed for {} instance(s): {}", .0.len(), join_failures(.0))]
    Teardown(Vec<DisposeFailure>),
    /// Type downcast failed
    #[error("Type mismatch for: {0}")]
    TypeMismatch(&'static str),
    /// Maximum recursion depth exceeded
    #[error("Max depth {0} exceeded")]
    DepthExceeded(usize),
    /// A factory reported a failure of its own
    #[error("Factory for {service} failed: {message}")]
    Factory {
        service: &'static str,
        message: String,
    },
}

impl DiError {
    /// Wraps an arbitrary error raised inside the factory for `T`.
    ///
    /// ```rust
    /// use ferrous_scope::DiError;
    ///
    /// let err = DiError::factory::<u32>("parse failed");
    /// assert_eq!(err.to_string(), "Factory for u32 failed: parse failed");
    /// ```
    pub fn factory<T: ?Sized + 'static>(message: impl std::fmt::Display) -> Self {
        DiError::Factory {
            service: std::any::type_name::<T>(),
            message: message.to_string(),
        }
    }
}

/// A single dispose hook that failed during teardown.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{service}: {message}")]
pub struct DisposeFailure {
    /// Type name of the instance whose hook failed
    pub service: &'static str,
    /// The hook's error message, or the panic message if it panicked
    pub message: String,
}

/// Configuration problems reported by [`Registry::build`](crate::Registry::build).
///
/// These are raised before any scope or instance exists, never mid-resolution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    /// A registration declared a dependency that nothing provides
    #[error("{service} depends on {dependency}, which is not registered")]
    MissingDependency {
        service: String,
        dependency: String,
    },
    /// Two registrations share one identity while duplicates are rejected
    #[error("Duplicate registration for {service}{}", display_name(.name))]
    DuplicateRegistration {
        service: &'static str,
        name: Option<&'static str>,
    },
    /// A singleton declared a dependency that lives in a shorter scope
    #[error("Singleton {service} cannot depend on {dependency} with lifetime {lifetime}")]
    CaptiveDependency {
        service: String,
        dependency: String,
        lifetime: Lifetime,
    },
    /// Declared dependencies form a cycle
    #[error("Circular dependency: {}", .0.join(" -> "))]
    CircularDependency(Vec<&'static str>),
    /// Several problems at once
    #[error("{} configuration errors: {}", .0.len(), join_build_errors(.0))]
    Invalid(Vec<BuildError>),
}

fn display_name(name: &Option<&'static str>) -> String {
    match name {
        Some(name) => format!(" (named \"{}\")", name),
        None => String::new(),
    }
}

fn join_failures(failures: &[DisposeFailure]) -> String {
    failures
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

fn join_build_errors(errors: &[BuildError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type for DI operations
pub type DiResult<T> = Result<T, DiError>;
