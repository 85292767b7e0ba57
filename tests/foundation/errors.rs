//! Integration tests for error types
//!
//! Tests constructors, kinds, and messages.

use tessera_foundation::{ComponentId, Error, ErrorKind, Identity, TypeKey};

#[test]
fn constructors_set_kind() {
    let id = Identity::new(1, 1);
    let key = TypeKey::plain(ComponentId::new(2));

    assert_eq!(Error::not_alive(id).kind, ErrorKind::NotAlive(id));
    assert_eq!(
        Error::already_present(id, key).kind,
        ErrorKind::AlreadyPresent { identity: id, key }
    );
    assert_eq!(
        Error::not_present(id, key).kind,
        ErrorKind::NotPresent { identity: id, key }
    );
    assert_eq!(Error::unregistered("T").kind, ErrorKind::Unregistered("T"));
    assert_eq!(Error::not_locked().kind, ErrorKind::NotLocked);
}

#[test]
fn errors_are_std_errors() {
    fn assert_error<E: std::error::Error>(_: &E) {}
    let err = Error::not_alive(Identity::new(1, 1));
    assert_error(&err);
    assert!(err.to_string().contains("not alive"));
}

#[test]
fn stale_reference_message_names_both() {
    let err = Error::stale_reference(Identity::new(1, 1), Identity::new(1, 2));
    let msg = err.to_string();
    assert!(msg.contains("1v1"));
    assert!(msg.contains("1v2"));
}
