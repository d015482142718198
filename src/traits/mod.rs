//! Core traits for the dependency injection container.

mod dispose;
mod resolver;

pub use dispose::{BoxError, Dispose};
pub use resolver::{Resolver, ResolverCore};
