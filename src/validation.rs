//! Build-time validation of service registrations.
//!
//! Factories are opaque closures, so validation only sees the dependencies a
//! registration declares with `depends_on*`. The rules:
//!
//! - **Missing dependency**: a declared dependency has no registration
//! - **Captive dependency**: a singleton declares a per-scope or
//!   per-matching-scope dependency; the singleton is built against the root
//!   scope and would hold it forever (or fail to find its tag)
//! - **Circular dependency**: declared dependencies form a cycle
//! - **Duplicate registration**: two registrations share a key, checked only
//!   under [`DuplicatePolicy::Reject`](crate::DuplicatePolicy::Reject)
//!
//! Every problem is collected; a single one is returned as is, several as
//! [`BuildError::Invalid`].

use crate::error::BuildError;
use crate::key::Key;
use crate::lifetime::Lifetime;
use crate::registration::{KeyMap, Registration, RegistrationTable};

/// Fails on the second and later registrations of every key.
pub(crate) fn reject_duplicates(registrations: &[Registration]) -> Result<(), BuildError> {
    let mut seen: KeyMap<()> = KeyMap::default();
    let mut errors = Vec::new();

    for reg in registrations {
        if seen.insert(reg.key, ()).is_some() {
            errors.push(BuildError::DuplicateRegistration {
                service: reg.key.display_name(),
                name: reg.key.service_name(),
            });
        }
    }

    into_result(errors)
}

/// Checks declared dependencies of the frozen table.
pub(crate) fn validate(table: &RegistrationTable) -> Result<(), BuildError> {
    let mut errors = Vec::new();

    for reg in table.iter() {
        for dependency in &reg.dependencies {
            match table.get(dependency) {
                None => errors.push(BuildError::MissingDependency {
                    service: reg.key.to_string(),
                    dependency: dependency.to_string(),
                }),
                Some(dep) if reg.lifetime == Lifetime::Singleton && dep.lifetime.is_scoped() => {
                    errors.push(BuildError::CaptiveDependency {
                        service: reg.key.to_string(),
                        dependency: dependency.to_string(),
                        lifetime: dep.lifetime,
                    })
                }
                Some(_) => {}
            }
        }
    }

    errors.extend(find_cycles(table).into_iter().map(BuildError::CircularDependency));

    into_result(errors)
}

fn into_result(mut errors: Vec<BuildError>) -> Result<(), BuildError> {
    match errors.len() {
        0 => Ok(()),
        1 => Err(errors.remove(0)),
        _ => Err(BuildError::Invalid(errors)),
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Visiting,
    Done,
}

/// Each cycle among declared dependencies, as a path that starts and ends
/// with the same service.
fn find_cycles(table: &RegistrationTable) -> Vec<Vec<&'static str>> {
    let mut marks: KeyMap<Mark> = KeyMap::default();
    let mut stack = Vec::new();
    let mut cycles = Vec::new();

    for reg in table.iter() {
        visit(table, reg.key, &mut marks, &mut stack, &mut cycles);
    }
    cycles
}

fn visit(
    table: &RegistrationTable,
    key: Key,
    marks: &mut KeyMap<Mark>,
    stack: &mut Vec<Key>,
    cycles: &mut Vec<Vec<&'static str>>,
) {
    match marks.get(&key) {
        Some(Mark::Done) => return,
        Some(Mark::Visiting) => {
            let start = stack.iter().position(|k| *k == key).unwrap_or(0);
            let mut path: Vec<_> = stack[start..].iter().map(|k| k.display_name()).collect();
            path.push(key.display_name());
            cycles.push(path);
            return;
        }
        None => {}
    }

    // Missing dependencies are reported separately.
    let Some(reg) = table.get(&key) else {
        return;
    };

    marks.insert(key, Mark::Visiting);
    stack.push(key);
    for dependency in &reg.dependencies {
        visit(table, *dependency, marks, stack, cycles);
    }
    stack.pop();
    marks.insert(key, Mark::Done);
}
