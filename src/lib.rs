//! # ferrous-scope
//!
//! Scoped dependency resolution for Rust: services are registered with a
//! lifetime policy, frozen into a [`Container`], and resolved through a tree
//! of nested [`LifetimeScope`]s that own and tear down what they create.
//!
//! ## Features
//!
//! - **Four lifetimes**: Transient, Singleton, PerScope and PerMatchingScope(tag)
//! - **Tagged scopes**: share one instance across a unit of work and all of its
//!   child scopes
//! - **Deterministic teardown**: each scope releases exactly what it owns, in
//!   reverse creation order, running dispose hooks
//! - **Circular dependency detection** with the full resolution path
//! - **Build-time validation** of declared dependencies
//! - **Thread-safe**: concurrent first resolution constructs once
//!
//! ## Quick Start
//!
//! ```rust
//! use ferrous_scope::{Registry, Resolver};
//! use std::sync::Arc;
//!
//! struct Database {
//!     connection_string: String,
//! }
//!
//! struct UserService {
//!     db: Arc<Database>,
//! }
//!
//! let mut registry = Registry::new();
//! registry.add_singleton(Database {
//!     connection_string: "postgres://localhost".to_string(),
//! });
//! registry
//!     .register::<UserService, _>(|r| Ok(UserService { db: r.get::<Database>()? }))
//!     .per_scope()
//!     .depends_on::<Database>();
//!
//! let container = registry.build().unwrap();
//! let scope = container.begin_scope().unwrap();
//! let user_service = scope.get_required::<UserService>();
//! assert_eq!(user_service.db.connection_string, "postgres://localhost");
//! scope.end().unwrap();
//! ```
//!
//! ## Service Lifetimes
//!
//! - **Transient**: created fresh on every resolution, never tracked
//! - **Singleton**: created once per container, built against the root scope
//! - **PerScope**: created once per scope, released when that scope ends
//! - **PerMatchingScope(tag)**: created once per nearest scope tagged `tag`
//!
//! ## Tagged Scopes
//!
//! ```rust
//! use ferrous_scope::{DiError, Registry, Resolver};
//! use std::sync::Arc;
//!
//! struct Transaction;
//!
//! let mut registry = Registry::new();
//! registry
//!     .register::<Transaction, _>(|_| Ok(Transaction))
//!     .per_matching_scope("transaction");
//!
//! let container = registry.build().unwrap();
//! let tx = container.begin_tagged_scope("transaction").unwrap();
//! let step = tx.begin_scope().unwrap();
//!
//! assert!(Arc::ptr_eq(
//!     &tx.get_required::<Transaction>(),
//!     &step.get_required::<Transaction>(),
//! ));
//!
//! let request = container.begin_scope().unwrap();
//! assert!(matches!(
//!     request.get::<Transaction>(),
//!     Err(DiError::NoMatchingScope { tag: "transaction", .. })
//! ));
//! ```

pub mod collection;
pub mod config;
pub mod error;
pub mod key;
pub mod lifetime;
pub mod provider;
pub mod traits;

mod internal;
mod registration;
mod validation;

pub use collection::{Registry, RegistrationBuilder};
pub use config::{ContainerOptions, DuplicatePolicy, DEFAULT_MAX_DEPTH};
pub use error::{BuildError, DiError, DiResult, DisposeFailure};
pub use key::{key_of_type, Key};
pub use lifetime::Lifetime;
pub use provider::{Container, LifetimeScope, ResolverContext, ScopeState};
pub use traits::{BoxError, Dispose, Resolver, ResolverCore};
