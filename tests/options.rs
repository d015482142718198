/// Container options: code, environment and JSON sources
///
/// Environment tests mutate process-wide state and run serially.

use ferrous_scope::{ContainerOptions, DuplicatePolicy, Registry, Resolver};
use serial_test::serial;
use std::env;

const VARS: [&str; 3] = ["FERROUS_SCOPE_MAX_DEPTH", "FERROUS_SCOPE_DUPLICATES", "FERROUS_SCOPE_VALIDATE"];

fn clear_env() {
    for var in VARS {
        env::remove_var(var);
    }
}

#[test]
#[serial]
fn test_from_env_defaults_when_unset() {
    clear_env();
    assert_eq!(ContainerOptions::from_env(), ContainerOptions::default());
}

#[test]
#[serial]
fn test_from_env_reads_every_option() {
    clear_env();
    env::set_var("FERROUS_SCOPE_MAX_DEPTH", "16");
    env::set_var("FERROUS_SCOPE_DUPLICATES", "reject");
    env::set_var("FERROUS_SCOPE_VALIDATE", "false");

    let options = ContainerOptions::from_env();
    clear_env();

    assert_eq!(options.max_depth, 16);
    assert_eq!(options.duplicates, DuplicatePolicy::Reject);
    assert!(!options.validate_on_build);
}

#[test]
#[serial]
fn test_from_env_ignores_invalid_values() {
    clear_env();
    env::set_var("FERROUS_SCOPE_MAX_DEPTH", "deep");
    env::set_var("FERROUS_SCOPE_DUPLICATES", "sometimes");

    let options = ContainerOptions::from_env();
    clear_env();

    assert_eq!(options, ContainerOptions::default());
}

#[test]
#[serial]
fn test_from_env_with_custom_prefix() {
    env::set_var("MYAPP_MAX_DEPTH", "8");
    let options = ContainerOptions::from_env_with_prefix("myapp");
    env::remove_var("MYAPP_MAX_DEPTH");

    assert_eq!(options.max_depth, 8);
    assert_eq!(options.duplicates, DuplicatePolicy::LastWins);
}

#[test]
fn test_options_reach_the_container() {
    let options = ContainerOptions::default().with_max_depth(2);
    let mut registry = Registry::with_options(options.clone());
    registry.add_singleton(5u8);

    let container = registry.build().unwrap();
    assert_eq!(container.options(), &options);
    assert_eq!(*container.get_required::<u8>(), 5);
}

#[cfg(feature = "config")]
#[test]
fn test_options_from_json() {
    let options = ContainerOptions::from_json_str(
        r#"{ "max_depth": 32, "duplicates": "last-wins", "validate_on_build": false }"#,
    )
    .unwrap();

    assert_eq!(options.max_depth, 32);
    assert_eq!(options.duplicates, DuplicatePolicy::LastWins);
    assert!(!options.validate_on_build);

    assert!(ContainerOptions::from_json_str(r#"{ "duplicates": "sometimes" }"#).is_err());
}
