//! Circular dependency detection infrastructure.
//!
//! Each resolution carries a chain of in-progress frames on the call stack.
//! A factory's nested resolves extend the chain of the resolution that invoked
//! it, so a cycle shows up as a key that is already on the chain.

use crate::error::{DiError, DiResult};
use crate::key::Key;

/// One in-progress resolution; `parent` is the resolution that requested it.
pub(crate) struct Frame<'a> {
    key: Key,
    parent: Option<&'a Frame<'a>>,
    depth: usize,
}

impl<'a> Frame<'a> {
    /// Pushes `key` onto the chain ending at `parent`.
    ///
    /// Fails with [`DiError::Circular`] if `key` is already being constructed
    /// further up the chain, and with [`DiError::DepthExceeded`] once the chain
    /// is `max_depth` frames long.
    pub(crate) fn enter(parent: Option<&'a Frame<'a>>, key: Key, max_depth: usize) -> DiResult<Self> {
        let depth = parent.map_or(0, |p| p.depth + 1);

        if let Some(parent) = parent {
            if parent.contains(&key) {
                let mut path = parent.path();
                path.push(key.display_name());
                return Err(DiError::Circular(path));
            }
        }

        if depth >= max_depth {
            return Err(DiError::DepthExceeded(depth));
        }

        Ok(Self { key, parent, depth })
    }

    pub(crate) fn key(&self) -> &Key {
        &self.key
    }

    pub(crate) fn depth(&self) -> usize {
        self.depth
    }

    fn contains(&self, key: &Key) -> bool {
        self.ancestors().any(|frame| frame.key == *key)
    }

    /// Service names from the outermost resolution down to this one.
    pub(crate) fn path(&self) -> Vec<&'static str> {
        let mut path: Vec<_> = self.ancestors().map(|f| f.key.display_name()).collect();
        path.reverse();
        path
    }

    fn ancestors(&self) -> impl Iterator<Item = &Frame<'a>> {
        std::iter::successors(Some(self), |frame| frame.parent)
    }
}
