//! Container options.
//!
//! Options are fixed when the registry is built. They can be set in code,
//! read from environment variables, or (with the `config` feature) parsed
//! from JSON.

use std::env;
use std::str::FromStr;

#[cfg(feature = "config")]
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Default prefix for environment variables read by [`ContainerOptions::from_env`].
pub const ENV_PREFIX: &str = "FERROUS_SCOPE";

/// Default limit on nested resolutions.
///
/// Each nested resolve costs several stack frames. The default leaves margin
/// on a 2 MiB thread stack (the size `std::thread::spawn` and the test harness
/// use) in an unoptimised build. Raise it only for threads with larger stacks.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// What `build()` does when two registrations share a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(rename_all = "kebab-case"))]
pub enum DuplicatePolicy {
    /// The most recent registration overrides earlier ones
    #[default]
    LastWins,
    /// Duplicates fail the build with `BuildError::DuplicateRegistration`
    Reject,
}

impl FromStr for DuplicatePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "last-wins" | "last_wins" | "override" => Ok(DuplicatePolicy::LastWins),
            "reject" | "error" => Ok(DuplicatePolicy::Reject),
            other => Err(format!("unknown duplicate policy '{}'", other)),
        }
    }
}

/// Options that shape how a container is built and how it resolves.
///
/// # Examples
///
/// ```
/// use ferrous_scope::{ContainerOptions, DuplicatePolicy, Registry};
///
/// let options = ContainerOptions::default()
///     .with_max_depth(64)
///     .with_duplicates(DuplicatePolicy::Reject);
///
/// let mut registry = Registry::with_options(options);
/// registry.add_singleton(1u8);
/// registry.add_singleton(2u8);
/// assert!(registry.build().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct ContainerOptions {
    /// Longest chain of nested resolutions before `DepthExceeded`; see
    /// [`DEFAULT_MAX_DEPTH`] for the stack it assumes
    pub max_depth: usize,
    /// Handling of registrations that share a key
    pub duplicates: DuplicatePolicy,
    /// Check declared dependencies when building
    pub validate_on_build: bool,
}

impl Default for ContainerOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            duplicates: DuplicatePolicy::LastWins,
            validate_on_build: true,
        }
    }
}

impl ContainerOptions {
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_duplicates(mut self, duplicates: DuplicatePolicy) -> Self {
        self.duplicates = duplicates;
        self
    }

    pub fn with_validation(mut self, validate_on_build: bool) -> Self {
        self.validate_on_build = validate_on_build;
        self
    }

    /// Reads `FERROUS_SCOPE_MAX_DEPTH`, `FERROUS_SCOPE_DUPLICATES` and
    /// `FERROUS_SCOPE_VALIDATE`, falling back to the defaults.
    pub fn from_env() -> Self {
        Self::from_env_with_prefix(ENV_PREFIX)
    }

    /// Like [`from_env`](Self::from_env) with a custom variable prefix.
    ///
    /// Unparseable values are logged and ignored.
    pub fn from_env_with_prefix(prefix: &str) -> Self {
        let defaults = Self::default();
        Self {
            max_depth: env_value(prefix, "max_depth").unwrap_or(defaults.max_depth),
            duplicates: env_value(prefix, "duplicates").unwrap_or(defaults.duplicates),
            validate_on_build: env_value(prefix, "validate").unwrap_or(defaults.validate_on_build),
        }
    }

    /// Parses options from JSON; missing fields take their defaults.
    ///
    /// ```
    /// use ferrous_scope::{ContainerOptions, DuplicatePolicy};
    ///
    /// let options = ContainerOptions::from_json_str(r#"{ "duplicates": "reject" }"#).unwrap();
    /// assert_eq!(options.duplicates, DuplicatePolicy::Reject);
    /// assert_eq!(options.max_depth, 256);
    /// ```
    #[cfg(feature = "config")]
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

fn env_key(prefix: &str, key: &str) -> String {
    format!("{}_{}", prefix.to_uppercase(), key.to_uppercase())
}

fn env_value<T>(prefix: &str, key: &str) -> Option<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let name = env_key(prefix, key);
    let raw = env::var(&name).ok()?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(variable = %name, value = %raw, error = %err, "ignoring invalid container option");
            None
        }
    }
}
