//! Tests for password, verify code and refresh id checks

mod common;

use common::{memory_manager, sqlite_manager};
use userdb::{
    AccountId, AccountManager, AccountStore, Collection, Credential, CredentialCheck, Lookup,
    RefreshId, VerifyCode,
};

fn password_round_trip<S: AccountStore>(manager: &AccountManager<S>) {
    let created = manager
        .create_user("Alice", "a@x.com", Credential::Plaintext("pw1"), Collection::Verified)
        .unwrap();

    let by_id = Lookup::Id(created.id);
    let by_email = Lookup::email("A@x.com");

    assert_eq!(manager.check_password(&by_id, "pw1").unwrap(), CredentialCheck::Valid);
    assert_eq!(manager.check_password(&by_email, "pw1").unwrap(), CredentialCheck::Valid);
    assert_eq!(manager.check_password(&by_id, "pw2").unwrap(), CredentialCheck::Invalid);
    assert_eq!(manager.check_password(&by_id, "").unwrap(), CredentialCheck::Invalid);

    // Idempotent
    assert_eq!(manager.check_password(&by_id, "pw1").unwrap(), CredentialCheck::Valid);
    assert_eq!(manager.check_password(&by_id, "pw2").unwrap(), CredentialCheck::Invalid);
}

/// Test: a plaintext password checks out after creation
#[test]
fn test_password_round_trip_memory() {
    password_round_trip(&memory_manager());
}

/// Test: a plaintext password checks out after creation (SQLite)
#[test]
fn test_password_round_trip_sqlite() {
    let (manager, _dir) = sqlite_manager();
    password_round_trip(&manager);
}

/// Test: temporary users cannot authenticate
#[test]
fn test_check_password_ignores_temp_users() {
    let manager = memory_manager();

    let temp = manager
        .create_user("Alice", "a@x.com", Credential::Plaintext("pw1"), Collection::Temporary)
        .unwrap();

    assert_eq!(
        manager.check_password(&Lookup::Id(temp.id), "pw1").unwrap(),
        CredentialCheck::UnknownAccount
    );
    assert_eq!(
        manager.check_password(&Lookup::email("a@x.com"), "pw1").unwrap(),
        CredentialCheck::UnknownAccount
    );
}

fn stale_verify_code_rejected<S: AccountStore>(manager: &AccountManager<S>) {
    let created = manager
        .create_user("Alice", "a@x.com", Credential::Plaintext("pw1"), Collection::Temporary)
        .unwrap();
    let id = created.id;
    let issued = created.verify_code.unwrap();

    let first = manager.refresh_verify_code(id).unwrap().unwrap();
    let second = manager.refresh_verify_code(id).unwrap().unwrap();
    assert_ne!(first, second);

    assert_eq!(manager.check_verify_code(id, &issued).unwrap(), CredentialCheck::Invalid);
    assert_eq!(manager.check_verify_code(id, &first).unwrap(), CredentialCheck::Invalid);
    assert_eq!(manager.check_verify_code(id, &second).unwrap(), CredentialCheck::Valid);
}

/// Test: regenerating a verify code invalidates the previous one
#[test]
fn test_stale_verify_code_rejected_memory() {
    stale_verify_code_rejected(&memory_manager());
}

/// Test: regenerating a verify code invalidates the previous one (SQLite)
#[test]
fn test_stale_verify_code_rejected_sqlite() {
    let (manager, _dir) = sqlite_manager();
    stale_verify_code_rejected(&manager);
}

/// Test: verify code checks distinguish mismatch from unknown account
#[test]
fn test_verify_code_unknown_account() {
    let (manager, _dir) = sqlite_manager();

    let created = manager
        .create_user("Alice", "a@x.com", Credential::Plaintext("pw1"), Collection::Temporary)
        .unwrap();

    assert_eq!(
        manager
            .check_verify_code(created.id, &VerifyCode::new("wrong"))
            .unwrap(),
        CredentialCheck::Invalid
    );
    assert_eq!(
        manager
            .check_verify_code(AccountId(created.id.0 + 100), &VerifyCode::new("wrong"))
            .unwrap(),
        CredentialCheck::UnknownAccount
    );
    assert_eq!(manager.refresh_verify_code(AccountId(created.id.0 + 100)).unwrap(), None);
}

/// Test: verify codes only exist for temporary users
#[test]
fn test_refresh_verify_code_requires_temp_user() {
    let manager = memory_manager();

    let created = manager
        .create_user("Alice", "a@x.com", Credential::Plaintext("pw1"), Collection::Verified)
        .unwrap();

    assert_eq!(manager.refresh_verify_code(created.id).unwrap(), None);
}

fn refresh_id_lifecycle<S: AccountStore>(manager: &AccountManager<S>) {
    let created = manager
        .create_user("Alice", "a@x.com", Credential::Plaintext("pw1"), Collection::Verified)
        .unwrap();
    let id = created.id;

    let first = manager.refresh_refresh_id(id).unwrap().unwrap();
    assert_eq!(manager.check_refresh_id(id, &first).unwrap(), CredentialCheck::Valid);

    let second = manager.refresh_refresh_id(id).unwrap().unwrap();
    assert_ne!(first, second);
    assert_eq!(manager.check_refresh_id(id, &first).unwrap(), CredentialCheck::Invalid);
    assert_eq!(manager.check_refresh_id(id, &second).unwrap(), CredentialCheck::Valid);

    let stored = manager
        .get_verified_user(&Lookup::Id(id))
        .unwrap()
        .unwrap()
        .refresh_id;
    assert_eq!(stored, Some(second));
}

/// Test: refresh ids are replaceable and the stale one is rejected
#[test]
fn test_refresh_id_lifecycle_memory() {
    refresh_id_lifecycle(&memory_manager());
}

/// Test: refresh ids are replaceable and the stale one is rejected (SQLite)
#[test]
fn test_refresh_id_lifecycle_sqlite() {
    let (manager, _dir) = sqlite_manager();
    refresh_id_lifecycle(&manager);
}

/// Test: refresh id checks distinguish mismatch from unknown account
#[test]
fn test_refresh_id_unknown_account() {
    let manager = memory_manager();
    let token = RefreshId::from_bytes(vec![1u8; 32]);

    assert_eq!(
        manager.check_refresh_id(AccountId(5), &token).unwrap(),
        CredentialCheck::UnknownAccount
    );
    assert_eq!(manager.refresh_refresh_id(AccountId(5)).unwrap(), None);

    // Temporary users have no refresh id
    let temp = manager
        .create_user("Alice", "a@x.com", Credential::Plaintext("pw1"), Collection::Temporary)
        .unwrap();
    assert_eq!(manager.refresh_refresh_id(temp.id).unwrap(), None);
}
