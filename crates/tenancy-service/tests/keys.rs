mod common;

use chrono::Duration;
use common::Harness;
use tenancy_auth::{AuthError, KeyType, NewKey};
use tenancy_org::NewOrg;
use tenancy_rbac::{AccessRequest, Action, PlatformRole, ResourceType};
use tenancy_service::{Clock, IdentityService, MembershipService, OrgService, RoleService};
use uuid::Uuid;

#[tokio::test]
async fn test_login_key_identifies_subject() {
    let h = Harness::new();
    let user = Uuid::now_v7();

    let (key, secret) = h.core.issue("", NewKey::login(user)).await.unwrap();
    assert_eq!(key.subject, user);
    assert_eq!(key.issuer_id, user);
    assert_eq!(key.expires_at, Some(key.issued_at + Duration::days(365)));

    let identity = h.core.identify(&secret).await.unwrap();
    assert_eq!(identity.user_id, user);
    assert_eq!(identity.key_id, key.id);
    assert_eq!(identity.key_type, KeyType::Login);
}

#[tokio::test]
async fn test_key_expiring_now_is_rejected() {
    let h = Harness::new();
    let user = Uuid::now_v7();

    let (_, secret) = h
        .core
        .issue("", NewKey::login(user).with_expiry(h.clock.now()))
        .await
        .unwrap();

    assert!(matches!(
        h.core.identify(&secret).await,
        Err(AuthError::Unauthenticated(_))
    ));
}

#[tokio::test]
async fn test_recovery_key_uses_configured_lifetime() {
    let h = Harness::new();
    let user = Uuid::now_v7();

    let (key, secret) = h.core.issue("", NewKey::recovery(user)).await.unwrap();
    assert_eq!(key.expires_at, Some(key.issued_at + Duration::minutes(5)));

    h.clock.advance(Duration::minutes(4));
    assert!(h.core.identify(&secret).await.is_ok());

    h.clock.advance(Duration::minutes(1));
    assert!(matches!(
        h.core.identify(&secret).await,
        Err(AuthError::Unauthenticated(_))
    ));
}

#[tokio::test]
async fn test_login_key_requires_subject() {
    let h = Harness::new();
    let key = NewKey {
        key_type: KeyType::Login,
        ..NewKey::default()
    };
    assert!(matches!(
        h.core.issue("", key).await,
        Err(AuthError::MalformedEntity(_))
    ));
}

#[tokio::test]
async fn test_revoke_is_idempotent() {
    let h = Harness::new();
    let (_, token) = h.user().await;
    let (key, secret) = h.core.issue(&token, NewKey::api()).await.unwrap();

    h.core.revoke(&token, key.id).await.unwrap();
    assert!(matches!(
        h.core.identify(&secret).await,
        Err(AuthError::Unauthenticated(_))
    ));

    h.core.revoke(&token, key.id).await.unwrap();
    h.core.revoke(&token, Uuid::now_v7()).await.unwrap();
}

#[tokio::test]
async fn test_api_key_never_expires_by_default() {
    let h = Harness::new();
    let (user, token) = h.user().await;

    let (key, secret) = h.core.issue(&token, NewKey::api()).await.unwrap();
    assert_eq!(key.subject, user);
    assert_eq!(key.expires_at, None);

    h.clock.advance(Duration::days(3650));
    let identity = h.core.identify(&secret).await.unwrap();
    assert_eq!(identity.key_type, KeyType::Api);
}

#[tokio::test]
async fn test_api_key_requires_login_key() {
    let h = Harness::new();
    let (user, login) = h.user().await;

    let (_, api) = h.core.issue(&login, NewKey::api()).await.unwrap();
    assert!(matches!(
        h.core.issue(&api, NewKey::api()).await,
        Err(AuthError::Unauthenticated(_))
    ));

    let (_, recovery) = h.core.issue("", NewKey::recovery(user)).await.unwrap();
    assert!(matches!(
        h.core.issue(&recovery, NewKey::api()).await,
        Err(AuthError::Unauthenticated(_))
    ));

    assert!(matches!(
        h.core.issue("garbage", NewKey::api()).await,
        Err(AuthError::Unauthenticated(_))
    ));
}

#[tokio::test]
async fn test_api_key_for_other_subject_needs_admin() {
    let h = Harness::new();
    let (_, token) = h.user().await;
    let (admin, admin_token) = h.admin().await;
    let other = Uuid::now_v7();

    assert!(matches!(
        h.core
            .issue(&token, NewKey::api().with_subject(other))
            .await,
        Err(AuthError::Forbidden(_))
    ));

    let (key, _) = h
        .core
        .issue(&admin_token, NewKey::api().with_subject(other))
        .await
        .unwrap();
    assert_eq!(key.subject, other);
    assert_eq!(key.issuer_id, admin);
}

#[tokio::test]
async fn test_retrieve_key_is_scoped_to_issuer() {
    let h = Harness::new();
    let (_, token) = h.user().await;
    let (_, other_token) = h.user().await;
    let (key, _) = h.core.issue(&token, NewKey::api()).await.unwrap();

    let retrieved = h.core.retrieve_key(&token, key.id).await.unwrap();
    assert_eq!(retrieved, key);

    assert!(matches!(
        h.core.retrieve_key(&other_token, key.id).await,
        Err(AuthError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_recovery_key_cannot_act() {
    let h = Harness::new();
    let user = Uuid::now_v7();
    let (_, recovery) = h.core.issue("", NewKey::recovery(user)).await.unwrap();

    assert!(matches!(
        h.core.create_org(&recovery, NewOrg::new("Acme")).await,
        Err(AuthError::Unauthenticated(_))
    ));
}

#[tokio::test]
async fn test_authorize_is_pure_decision() {
    let h = Harness::new();
    let subject = Uuid::now_v7();

    let request = AccessRequest::new(subject, PlatformRole::User, ResourceType::Backup, Action::Read);
    assert!(matches!(
        h.core.authorize(&request),
        Err(AuthError::Forbidden(_))
    ));

    let request = AccessRequest::new(subject, PlatformRole::Admin, ResourceType::Backup, Action::Read);
    assert!(h.core.authorize(&request).is_ok());
}

#[tokio::test]
async fn test_role_lifecycle_drives_admin_access() {
    let h = Harness::new();
    let (user, token) = h.user().await;

    assert_eq!(h.core.retrieve_role(user).await.unwrap(), None);
    assert!(matches!(
        h.core.update_role(user, PlatformRole::Admin).await,
        Err(AuthError::NotFound(_))
    ));
    assert!(matches!(
        h.core.backup(&token).await,
        Err(AuthError::Forbidden(_))
    ));

    h.core.assign_role(user, PlatformRole::User).await.unwrap();
    assert!(matches!(
        h.core.assign_role(user, PlatformRole::Admin).await,
        Err(AuthError::Conflict(_))
    ));

    h.core.update_role(user, PlatformRole::Admin).await.unwrap();
    assert_eq!(
        h.core.retrieve_role(user).await.unwrap(),
        Some(PlatformRole::Admin)
    );
    assert!(h.core.backup(&token).await.is_ok());

    h.core.remove_role(user).await.unwrap();
    h.core.remove_role(user).await.unwrap();
    assert!(matches!(
        h.core.backup(&token).await,
        Err(AuthError::Forbidden(_))
    ));
}
