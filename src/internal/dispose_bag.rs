//! Internal disposal bag for owned instances.

use std::panic::{catch_unwind, AssertUnwindSafe};

use crate::error::DisposeFailure;
use crate::registration::{AnyArc, DisposeHook};

/// An instance owned by a scope (or by the container, for singletons).
pub(crate) struct DisposeEntry {
    service: &'static str,
    instance: AnyArc,
    hook: Option<DisposeHook>,
}

impl DisposeEntry {
    pub(crate) fn new(service: &'static str, instance: AnyArc, hook: Option<DisposeHook>) -> Self {
        Self { service, instance, hook }
    }

    /// Runs the hook, if any, then releases the owned reference.
    fn release(self) -> Result<(), DisposeFailure> {
        let Self { service, instance, hook } = self;
        let Some(hook) = hook else {
            return Ok(());
        };

        match catch_unwind(AssertUnwindSafe(|| hook(&instance))) {
            Ok(Ok(())) => Ok(()),
            Ok(Err(err)) => Err(DisposeFailure {
                service,
                message: err.to_string(),
            }),
            Err(payload) => Err(DisposeFailure {
                service,
                message: panic_message(payload.as_ref()),
            }),
        }
    }
}

/// Owned instances in creation order, released LIFO.
#[derive(Default)]
pub(crate) struct DisposeBag {
    entries: Vec<DisposeEntry>,
}

impl DisposeBag {
    pub(crate) fn push(&mut self, entry: DisposeEntry) {
        self.entries.push(entry);
    }

    /// Release every entry in reverse order.
    ///
    /// A failing hook does not stop the remaining entries from being released;
    /// all failures are returned in the order they happened.
    pub(crate) fn run_all_reverse(&mut self) -> Vec<DisposeFailure> {
        let mut failures = Vec::new();
        while let Some(entry) = self.entries.pop() {
            if let Err(failure) = entry.release() {
                failures.push(failure);
            }
        }
        failures
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "dispose hook panicked".to_string()
    }
}
