mod common;

use chrono::Duration;
use common::{Harness, Notification, RecordingNotifier};
use tenancy_auth::AuthError;
use tenancy_org::{
    GroupGrant, InviteDirection, InviteFilter, InviteState, Invitee, MemberRole, NewOrgInvite,
    OrgInvite, PlatformInviteFilter,
};
use tenancy_rbac::MembershipRole;
use tenancy_service::{Clock, IdentityService, InviteService, MembershipService, OrgService};
use tenancy_store::InviteRepository;
use uuid::Uuid;

fn invite_member(invitee_id: Uuid, org_id: Uuid) -> NewOrgInvite {
    NewOrgInvite::new(Invitee::Member(invitee_id), MembershipRole::Viewer, org_id)
}

fn invite_email(email: &str, org_id: Uuid) -> NewOrgInvite {
    NewOrgInvite::new(Invitee::Email(email.to_string()), MembershipRole::Viewer, org_id)
}

#[tokio::test]
async fn test_email_invite_for_unknown_user_goes_dormant_then_activates() {
    let h = Harness::new();
    let (_, alice) = h.user().await;
    let org = h.org(&alice, "Acme").await;

    let dormant = h
        .core
        .create_org_invite(&alice, invite_email("Bob@X.com", org.id), "/welcome")
        .await
        .unwrap();
    assert!(dormant.is_dormant());
    assert_eq!(dormant.state, InviteState::Pending);

    let platform_invite = h.notifier.last_platform_invite().await.unwrap();
    assert_eq!(platform_invite.invitee_email, "bob@x.com");

    let accepted = h
        .core
        .validate_platform_invite(platform_invite.id, "bob@x.com")
        .await
        .unwrap();
    assert_eq!(accepted.state, InviteState::Accepted);

    let bob = Uuid::now_v7();
    h.directory.register("bob@x.com", bob).await;
    h.clock.advance(Duration::days(6));

    let activated = h
        .core
        .activate_org_invite(platform_invite.id, bob, "/orgs")
        .await
        .unwrap();
    assert_eq!(activated.len(), 1);
    assert_eq!(activated[0].id, dormant.id);
    assert_eq!(activated[0].invitee_id, Some(bob));
    assert_eq!(activated[0].expires_at, h.clock.now() + Duration::days(7));
    assert_eq!(activated[0].state, InviteState::Pending);

    let again = h
        .core
        .activate_org_invite(platform_invite.id, bob, "/orgs")
        .await
        .unwrap();
    assert!(again.is_empty());

    let bob_token = h.login(bob).await;
    let received = h
        .core
        .list_org_invites_by_user(&bob_token, bob, InviteFilter::default())
        .await
        .unwrap();
    assert_eq!(received.total, 1);

    let invite = h
        .core
        .respond_org_invite(&bob_token, dormant.id, true)
        .await
        .unwrap();
    assert_eq!(invite.state, InviteState::Accepted);
    assert_eq!(
        h.core.retrieve_member_role(bob, org.id).await.unwrap(),
        Some(MembershipRole::Viewer)
    );
}

#[tokio::test]
async fn test_email_invite_for_known_user_is_addressed() {
    let h = Harness::new();
    let (_, alice) = h.user().await;
    let org = h.org(&alice, "Acme").await;
    let bob = Uuid::now_v7();
    h.directory.register("bob@x.com", bob).await;

    let invite = h
        .core
        .create_org_invite(&alice, invite_email(" BOB@x.com", org.id), "/orgs")
        .await
        .unwrap();
    assert_eq!(invite.invitee_id, Some(bob));
    assert!(matches!(
        h.notifier.sent().await.as_slice(),
        [Notification::OrgInvite(sent)] if sent.id == invite.id
    ));
}

#[tokio::test]
async fn test_invalid_email_is_malformed() {
    let h = Harness::new();
    let (_, alice) = h.user().await;
    let org = h.org(&alice, "Acme").await;

    assert!(matches!(
        h.core
            .create_org_invite(&alice, invite_email("bob", org.id), "/orgs")
            .await,
        Err(AuthError::MalformedEntity(_))
    ));
}

#[tokio::test]
async fn test_one_pending_invite_per_member_and_org() {
    let h = Harness::new();
    let (_, alice) = h.user().await;
    let (bob, _) = h.user().await;
    let org = h.org(&alice, "Acme").await;

    let first = h
        .core
        .create_org_invite(&alice, invite_member(bob, org.id), "/orgs")
        .await
        .unwrap();
    assert!(matches!(
        h.core
            .create_org_invite(&alice, invite_member(bob, org.id), "/orgs")
            .await,
        Err(AuthError::Conflict(_))
    ));

    h.clock.advance(Duration::days(7));
    let second = h
        .core
        .create_org_invite(&alice, invite_member(bob, org.id), "/orgs")
        .await
        .unwrap();
    assert_ne!(first.id, second.id);

    let first = h.core.view_org_invite(&alice, first.id).await.unwrap();
    assert_eq!(first.state, InviteState::Expired);
    let second = h.core.view_org_invite(&alice, second.id).await.unwrap();
    assert_eq!(second.state, InviteState::Pending);
}

#[tokio::test]
async fn test_reads_project_expired_invites() {
    let h = Harness::new();
    let (alice, alice_token) = h.user().await;
    let org = h.org(&alice_token, "Acme").await;
    let now = h.clock.now();

    let stale = OrgInvite::new(
        alice,
        Some(Uuid::now_v7()),
        org.id,
        MembershipRole::Editor,
        Vec::new(),
        now - Duration::days(8),
        now - Duration::days(1),
    );
    h.store.save_org_invite(stale.clone()).await.unwrap();

    let viewed = h
        .core
        .view_org_invite(&alice_token, stale.id)
        .await
        .unwrap();
    assert_eq!(viewed.state, InviteState::Expired);

    let expired = h
        .core
        .list_org_invites_by_org(
            &alice_token,
            org.id,
            InviteFilter::default().with_state(InviteState::Expired),
        )
        .await
        .unwrap();
    assert_eq!(expired.total, 1);
}

#[tokio::test]
async fn test_existing_member_cannot_be_invited() {
    let h = Harness::new();
    let (_, alice) = h.user().await;
    let (bob, _) = h.user().await;
    let org = h.org(&alice, "Acme").await;
    h.core
        .create_org_memberships(&alice, org.id, vec![MemberRole::new(bob, MembershipRole::Viewer)])
        .await
        .unwrap();

    assert!(matches!(
        h.core
            .create_org_invite(&alice, invite_member(bob, org.id), "/orgs")
            .await,
        Err(AuthError::Conflict(_))
    ));
}

#[tokio::test]
async fn test_invite_needs_org_invite_permission() {
    let h = Harness::new();
    let (_, alice) = h.user().await;
    let (mallory, mallory_token) = h.user().await;
    let org = h.org(&alice, "Acme").await;
    h.core
        .create_org_memberships(
            &alice,
            org.id,
            vec![MemberRole::new(mallory, MembershipRole::Editor)],
        )
        .await
        .unwrap();

    assert!(matches!(
        h.core
            .create_org_invite(&mallory_token, invite_member(Uuid::now_v7(), org.id), "/orgs")
            .await,
        Err(AuthError::Forbidden(_))
    ));
}

#[tokio::test]
async fn test_activation_is_all_or_nothing() {
    let h = Harness::new();
    let (_, alice) = h.user().await;
    let first = h.org(&alice, "First").await;
    let second = h.org(&alice, "Second").await;

    let a = h
        .core
        .create_org_invite(&alice, invite_email("bob@x.com", first.id), "/orgs")
        .await
        .unwrap();
    let b = h
        .core
        .create_org_invite(&alice, invite_email("bob@x.com", second.id), "/orgs")
        .await
        .unwrap();

    let (_, admin) = h.admin().await;
    let platform_invites = h
        .core
        .list_platform_invites(&admin, PlatformInviteFilter::default())
        .await
        .unwrap();
    assert_eq!(platform_invites.total, 1);
    let platform_invite = platform_invites.items[0].clone();

    h.core
        .validate_platform_invite(platform_invite.id, "bob@x.com")
        .await
        .unwrap();
    let bob = Uuid::now_v7();
    h.directory.register("bob@x.com", bob).await;

    let blocking = h
        .core
        .create_org_invite(&alice, invite_member(bob, second.id), "/orgs")
        .await
        .unwrap();
    assert!(matches!(
        h.core
            .activate_org_invite(platform_invite.id, bob, "/orgs")
            .await,
        Err(AuthError::Conflict(_))
    ));
    assert!(h.core.view_org_invite(&alice, a.id).await.unwrap().is_dormant());
    assert!(h.core.view_org_invite(&alice, b.id).await.unwrap().is_dormant());

    h.core.revoke_org_invite(&alice, blocking.id).await.unwrap();
    let activated = h
        .core
        .activate_org_invite(platform_invite.id, bob, "/orgs")
        .await
        .unwrap();
    assert_eq!(activated.len(), 2);
    assert!(activated.iter().all(|invite| invite.invitee_id == Some(bob)));
}

#[tokio::test]
async fn test_activation_requires_accepted_platform_invite() {
    let h = Harness::new();
    let (_, alice) = h.user().await;
    let org = h.org(&alice, "Acme").await;

    h.core
        .create_org_invite(&alice, invite_email("bob@x.com", org.id), "/orgs")
        .await
        .unwrap();
    let platform_invite = h.notifier.last_platform_invite().await.unwrap();

    assert!(matches!(
        h.core
            .activate_org_invite(platform_invite.id, Uuid::now_v7(), "/orgs")
            .await,
        Err(AuthError::Conflict(_))
    ));
    assert!(h
        .core
        .activate_org_invite(Uuid::now_v7(), Uuid::now_v7(), "/orgs")
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_respond_rules() {
    let h = Harness::new();
    let (_, alice) = h.user().await;
    let (bob, bob_token) = h.user().await;
    let (_, carol) = h.user().await;
    let org = h.org(&alice, "Acme").await;

    let invite = h
        .core
        .create_org_invite(&alice, invite_member(bob, org.id), "/orgs")
        .await
        .unwrap();

    assert!(matches!(
        h.core.respond_org_invite(&carol, invite.id, true).await,
        Err(AuthError::Forbidden(_))
    ));
    assert!(matches!(
        h.core.respond_org_invite(&alice, invite.id, true).await,
        Err(AuthError::Forbidden(_))
    ));

    let declined = h
        .core
        .respond_org_invite(&bob_token, invite.id, false)
        .await
        .unwrap();
    assert_eq!(declined.state, InviteState::Declined);
    assert_eq!(h.core.retrieve_member_role(bob, org.id).await.unwrap(), None);

    assert!(matches!(
        h.core.respond_org_invite(&bob_token, invite.id, true).await,
        Err(AuthError::Conflict(_))
    ));
}

#[tokio::test]
async fn test_expired_invite_cannot_be_accepted() {
    let h = Harness::new();
    let (_, alice) = h.user().await;
    let (bob, bob_token) = h.user().await;
    let org = h.org(&alice, "Acme").await;

    let invite = h
        .core
        .create_org_invite(&alice, invite_member(bob, org.id), "/orgs")
        .await
        .unwrap();
    h.clock.advance(Duration::days(7));

    assert!(matches!(
        h.core.respond_org_invite(&bob_token, invite.id, true).await,
        Err(AuthError::Conflict(_))
    ));
    assert_eq!(h.core.retrieve_member_role(bob, org.id).await.unwrap(), None);
}

#[tokio::test]
async fn test_accepting_grants_group_roles() {
    let h = Harness::new();
    let (_, alice) = h.user().await;
    let (bob, bob_token) = h.user().await;
    let org = h.org(&alice, "Acme").await;
    let group = Uuid::now_v7();
    h.core
        .assign_org_groups(&alice, org.id, &[group])
        .await
        .unwrap();

    let invite = h
        .core
        .create_org_invite(
            &alice,
            invite_member(bob, org.id).with_group(GroupGrant::new(group, MembershipRole::Editor)),
            "/orgs",
        )
        .await
        .unwrap();
    h.core
        .respond_org_invite(&bob_token, invite.id, true)
        .await
        .unwrap();

    assert_eq!(
        h.core.retrieve_group_role(bob, group).await.unwrap(),
        Some(MembershipRole::Editor)
    );
}

#[tokio::test]
async fn test_group_grant_must_belong_to_org() {
    let h = Harness::new();
    let (_, alice) = h.user().await;
    let org = h.org(&alice, "Acme").await;
    let other = h.org(&alice, "Other").await;
    let group = Uuid::now_v7();
    h.core
        .assign_org_groups(&alice, other.id, &[group])
        .await
        .unwrap();

    let grant = GroupGrant::new(group, MembershipRole::Viewer);
    assert!(matches!(
        h.core
            .create_org_invite(&alice, invite_member(Uuid::now_v7(), org.id).with_group(grant), "/orgs")
            .await,
        Err(AuthError::NotFound(_))
    ));
    let unknown = GroupGrant::new(Uuid::now_v7(), MembershipRole::Viewer);
    assert!(matches!(
        h.core
            .create_org_invite(&alice, invite_member(Uuid::now_v7(), org.id).with_group(unknown), "/orgs")
            .await,
        Err(AuthError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_revoke_org_invite() {
    let h = Harness::new();
    let (_, alice) = h.user().await;
    let (bob, _) = h.user().await;
    let (_, carol) = h.user().await;
    let org = h.org(&alice, "Acme").await;

    let invite = h
        .core
        .create_org_invite(&alice, invite_member(bob, org.id), "/orgs")
        .await
        .unwrap();

    assert!(matches!(
        h.core.revoke_org_invite(&carol, invite.id).await,
        Err(AuthError::Forbidden(_))
    ));

    h.core.revoke_org_invite(&alice, invite.id).await.unwrap();
    h.core.revoke_org_invite(&alice, invite.id).await.unwrap();
    assert!(matches!(
        h.core.view_org_invite(&alice, invite.id).await,
        Err(AuthError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_list_invites_by_user_direction() {
    let h = Harness::new();
    let (alice, alice_token) = h.user().await;
    let (bob, bob_token) = h.user().await;
    let org = h.org(&alice_token, "Acme").await;
    h.core
        .create_org_invite(&alice_token, invite_member(bob, org.id), "/orgs")
        .await
        .unwrap();

    let sent = InviteFilter::default().with_direction(InviteDirection::Sent);
    assert_eq!(
        h.core
            .list_org_invites_by_user(&alice_token, alice, sent)
            .await
            .unwrap()
            .total,
        1
    );
    assert_eq!(
        h.core
            .list_org_invites_by_user(&alice_token, alice, InviteFilter::default())
            .await
            .unwrap()
            .total,
        0
    );
    assert!(matches!(
        h.core
            .list_org_invites_by_user(&bob_token, alice, sent)
            .await,
        Err(AuthError::Forbidden(_))
    ));
}

#[tokio::test]
async fn test_platform_invites_are_admin_only() {
    let h = Harness::new();
    let (_, token) = h.user().await;

    assert!(matches!(
        h.core
            .invite_platform_member(&token, "bob@x.com", "/signup")
            .await,
        Err(AuthError::Forbidden(_))
    ));
    assert!(matches!(
        h.core
            .list_platform_invites(&token, PlatformInviteFilter::default())
            .await,
        Err(AuthError::Forbidden(_))
    ));
}

#[tokio::test]
async fn test_platform_invite_rules() {
    let h = Harness::new();
    let (_, admin) = h.admin().await;

    assert!(matches!(
        h.core
            .invite_platform_member(&admin, "not-an-email", "/signup")
            .await,
        Err(AuthError::MalformedEntity(_))
    ));

    h.directory.register("carol@x.com", Uuid::now_v7()).await;
    assert!(matches!(
        h.core
            .invite_platform_member(&admin, "carol@x.com", "/signup")
            .await,
        Err(AuthError::Conflict(_))
    ));

    let first = h
        .core
        .invite_platform_member(&admin, "Bob@X.com", "/signup")
        .await
        .unwrap();
    assert_eq!(first.invitee_email, "bob@x.com");
    assert!(matches!(
        h.core
            .invite_platform_member(&admin, "bob@x.com", "/signup")
            .await,
        Err(AuthError::Conflict(_))
    ));

    h.clock.advance(Duration::days(7));
    let second = h
        .core
        .invite_platform_member(&admin, "bob@x.com", "/signup")
        .await
        .unwrap();
    assert_ne!(first.id, second.id);
    assert_eq!(
        h.core
            .view_platform_invite(&admin, first.id)
            .await
            .unwrap()
            .state,
        InviteState::Expired
    );

    let filter = PlatformInviteFilter {
        email: Some("BOB@x.com".to_string()),
        state: Some(InviteState::Pending),
        ..PlatformInviteFilter::default()
    };
    let page = h.core.list_platform_invites(&admin, filter).await.unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].id, second.id);
}

#[tokio::test]
async fn test_validate_platform_invite() {
    let h = Harness::new();
    let (_, admin) = h.admin().await;
    let invite = h
        .core
        .invite_platform_member(&admin, "bob@x.com", "/signup")
        .await
        .unwrap();

    assert!(matches!(
        h.core
            .validate_platform_invite(invite.id, "eve@x.com")
            .await,
        Err(AuthError::NotFound(_))
    ));

    let accepted = h
        .core
        .validate_platform_invite(invite.id, " BOB@x.com ")
        .await
        .unwrap();
    assert_eq!(accepted.state, InviteState::Accepted);

    assert!(matches!(
        h.core
            .validate_platform_invite(invite.id, "bob@x.com")
            .await,
        Err(AuthError::Conflict(_))
    ));
}

#[tokio::test]
async fn test_expired_platform_invite_cannot_be_validated() {
    let h = Harness::new();
    let (_, admin) = h.admin().await;
    let invite = h
        .core
        .invite_platform_member(&admin, "bob@x.com", "/signup")
        .await
        .unwrap();
    h.clock.advance(Duration::days(8));

    assert!(matches!(
        h.core
            .validate_platform_invite(invite.id, "bob@x.com")
            .await,
        Err(AuthError::Conflict(_))
    ));
}

#[tokio::test]
async fn test_dormant_invite_lapses_with_its_platform_invite() {
    let h = Harness::new();
    let (_, alice) = h.user().await;
    let org = h.org(&alice, "Acme").await;

    let dormant = h
        .core
        .create_org_invite(&alice, invite_email("bob@x.com", org.id), "/orgs")
        .await
        .unwrap();
    let platform_invite = h.notifier.last_platform_invite().await.unwrap();
    h.clock.advance(Duration::days(60));

    assert!(matches!(
        h.core
            .validate_platform_invite(platform_invite.id, "bob@x.com")
            .await,
        Err(AuthError::Conflict(_))
    ));

    let pending = h
        .core
        .list_org_invites_by_org(
            &alice,
            org.id,
            InviteFilter::default().with_state(InviteState::Pending),
        )
        .await
        .unwrap();
    assert_eq!(pending.total, 0);

    let expired = h
        .core
        .list_org_invites_by_org(
            &alice,
            org.id,
            InviteFilter::default().with_state(InviteState::Expired),
        )
        .await
        .unwrap();
    assert_eq!(expired.total, 1);
    assert_eq!(expired.items[0].id, dormant.id);

    let again = h
        .core
        .create_org_invite(&alice, invite_email("bob@x.com", org.id), "/orgs")
        .await
        .unwrap();
    assert!(again.is_dormant());
    assert_ne!(
        h.notifier.last_platform_invite().await.unwrap().id,
        platform_invite.id
    );
}

#[tokio::test]
async fn test_revoking_platform_invite_removes_dormant_invites() {
    let h = Harness::new();
    let (_, alice) = h.user().await;
    let (_, admin) = h.admin().await;
    let org = h.org(&alice, "Acme").await;

    let dormant = h
        .core
        .create_org_invite(&alice, invite_email("bob@x.com", org.id), "/orgs")
        .await
        .unwrap();
    let platform_invite = h.notifier.last_platform_invite().await.unwrap();

    assert!(matches!(
        h.core.revoke_platform_invite(&alice, platform_invite.id).await,
        Err(AuthError::Forbidden(_))
    ));

    h.core
        .revoke_platform_invite(&admin, platform_invite.id)
        .await
        .unwrap();
    assert!(matches!(
        h.core.view_org_invite(&alice, dormant.id).await,
        Err(AuthError::NotFound(_))
    ));
    assert!(matches!(
        h.core.view_platform_invite(&admin, platform_invite.id).await,
        Err(AuthError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_dormant_invite_for_existing_platform_invite() {
    let h = Harness::new();
    let (_, alice) = h.user().await;
    let (_, admin) = h.admin().await;
    let org = h.org(&alice, "Acme").await;
    let platform_invite = h
        .core
        .invite_platform_member(&admin, "bob@x.com", "/signup")
        .await
        .unwrap();

    let dormant = h
        .core
        .create_dormant_org_invite(
            &alice,
            org.id,
            MembershipRole::Editor,
            platform_invite.id,
            Vec::new(),
        )
        .await
        .unwrap();
    assert!(dormant.is_dormant());
    assert_eq!(dormant.invitee_role, MembershipRole::Editor);

    assert!(matches!(
        h.core
            .create_dormant_org_invite(
                &alice,
                org.id,
                MembershipRole::Viewer,
                platform_invite.id,
                Vec::new()
            )
            .await,
        Err(AuthError::Conflict(_))
    ));
    assert!(matches!(
        h.core
            .create_dormant_org_invite(
                &alice,
                org.id,
                MembershipRole::Viewer,
                Uuid::now_v7(),
                Vec::new()
            )
            .await,
        Err(AuthError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_notification_failure_does_not_fail_invite() {
    let h = Harness::with_notifier(RecordingNotifier::failing());
    let (_, alice) = h.user().await;
    let (bob, _) = h.user().await;
    let org = h.org(&alice, "Acme").await;

    let invite = h
        .core
        .create_org_invite(&alice, invite_member(bob, org.id), "/orgs")
        .await
        .unwrap();
    assert_eq!(invite.invitee_id, Some(bob));

    let dormant = h
        .core
        .create_org_invite(&alice, invite_email("dave@x.com", org.id), "/orgs")
        .await
        .unwrap();
    assert!(dormant.is_dormant());
    assert!(h.notifier.sent().await.is_empty());
}

#[tokio::test]
async fn test_identify_after_accepting_sees_membership() {
    let h = Harness::new();
    let (_, alice) = h.user().await;
    let (bob, bob_token) = h.user().await;
    let org = h.org(&alice, "Acme").await;
    let invite = h
        .core
        .create_org_invite(&alice, invite_member(bob, org.id), "/orgs")
        .await
        .unwrap();

    assert!(matches!(
        h.core.view_org(&bob_token, org.id).await,
        Err(AuthError::Forbidden(_))
    ));
    h.core
        .respond_org_invite(&bob_token, invite.id, true)
        .await
        .unwrap();

    assert_eq!(h.core.identify(&bob_token).await.unwrap().user_id, bob);
    assert!(h.core.view_org(&bob_token, org.id).await.is_ok());
}
