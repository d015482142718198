/// Unit tests for Key type methods

use ferrous_scope::{key_of_type, Key};
use std::any::TypeId;
use std::collections::HashSet;

trait Plugin {}

#[test]
fn test_key_display_name_type() {
    let key = Key::of::<String>();
    assert_eq!(key.display_name(), "alloc::string::String");
    assert_eq!(key.service_name(), None);
    assert_eq!(key.type_id(), TypeId::of::<String>());
}

#[test]
fn test_key_display_name_trait() {
    let key = Key::of::<dyn Plugin>();
    assert!(key.display_name().starts_with("dyn "));
    assert!(key.display_name().ends_with("Plugin"));
}

#[test]
fn test_key_named() {
    let key = Key::named::<u32>("database_port");
    assert_eq!(key.display_name(), "u32");
    assert_eq!(key.service_name(), Some("database_port"));
}

#[test]
fn test_key_equality() {
    assert_eq!(Key::of::<u32>(), Key::of::<u32>());
    assert_eq!(Key::named::<u32>("a"), Key::named::<u32>("a"));
    assert_ne!(Key::of::<u32>(), Key::named::<u32>("a"));
    assert_ne!(Key::named::<u32>("a"), Key::named::<u32>("b"));
    assert_ne!(Key::of::<u32>(), Key::of::<u64>());
    assert_ne!(Key::of::<dyn Plugin>(), Key::of::<Box<dyn Plugin>>());
}

#[test]
fn test_key_hash() {
    let keys: HashSet<Key> = [
        Key::of::<u32>(),
        Key::of::<u32>(),
        Key::named::<u32>("port"),
        Key::named::<u32>("port"),
        Key::named::<u32>("timeout"),
    ]
    .into_iter()
    .collect();
    assert_eq!(keys.len(), 3);
}

#[test]
fn test_key_formatting() {
    assert_eq!(format!("{:?}", Key::of::<u8>()), "Key(u8)");
    assert_eq!(format!("{:?}", Key::named::<u8>("level")), "Key(u8 @ \"level\")");
    assert_eq!(Key::of::<u8>().to_string(), "u8");
    assert_eq!(Key::named::<u8>("level").to_string(), "u8 (named \"level\")");
}

#[test]
fn test_key_of_type_helper() {
    assert_eq!(key_of_type::<String>(), Key::of::<String>());
}
