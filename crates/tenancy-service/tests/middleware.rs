mod common;

use std::sync::{Arc, Mutex};

use common::Harness;
use tenancy_auth::{AuthError, NewKey};
use tenancy_org::NewOrg;
use tenancy_rbac::{AccessRequest, Action, PlatformRole, ResourceType};
use tenancy_service::{
    AuthService, CallObserver, CallRecord, IdentityService, Instrumented, OrgService,
    TracingObserver,
};
use uuid::Uuid;

#[derive(Debug, Default)]
struct RecordingObserver {
    calls: Mutex<Vec<(&'static str, Option<&'static str>)>>,
}

impl RecordingObserver {
    fn calls(&self) -> Vec<(&'static str, Option<&'static str>)> {
        self.calls.lock().unwrap().clone()
    }
}

impl CallObserver for RecordingObserver {
    fn observe(&self, record: &CallRecord<'_>) {
        let code = record.error.map(|e| e.error_code());
        self.calls.lock().unwrap().push((record.method, code));
    }
}

#[tokio::test]
async fn test_observers_see_every_call() {
    let h = Harness::new();
    let observer = Arc::new(RecordingObserver::default());
    let service = Instrumented::new(h.core)
        .with_observer(observer.clone())
        .with_observer(Arc::new(TracingObserver));

    let (_, alice) = service
        .issue("", NewKey::login(Uuid::now_v7()))
        .await
        .unwrap();
    let (_, bob) = service
        .issue("", NewKey::login(Uuid::now_v7()))
        .await
        .unwrap();

    let org = service
        .create_org(&alice, NewOrg::new("Acme"))
        .await
        .unwrap();
    let denied = service.view_org(&bob, org.id).await;
    assert!(matches!(denied, Err(AuthError::Forbidden(_))));

    let forbidden_code = AuthError::forbidden("").error_code();
    assert_eq!(
        observer.calls(),
        vec![
            ("issue", None),
            ("issue", None),
            ("create_org", None),
            ("view_org", Some(forbidden_code)),
        ]
    );
}

#[tokio::test]
async fn test_sync_authorize_is_reported() {
    let h = Harness::new();
    let observer = Arc::new(RecordingObserver::default());
    let service: Arc<dyn AuthService> =
        Arc::new(Instrumented::new(h.core).with_observer(observer.clone()));

    let request = AccessRequest::new(
        Uuid::now_v7(),
        PlatformRole::User,
        ResourceType::Backup,
        Action::Read,
    );
    assert!(service.authorize(&request).is_err());

    let calls = observer.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, "authorize");
    assert!(calls[0].1.is_some());
}

#[tokio::test]
async fn test_results_pass_through_unchanged() {
    let h = Harness::new();
    let service = Instrumented::new(h.core);
    let user = Uuid::now_v7();

    let (key, secret) = service.issue("", NewKey::login(user)).await.unwrap();
    let identity = service.identify(&secret).await.unwrap();
    assert_eq!(identity.key_id, key.id);
    assert_eq!(service.inner().identify(&secret).await.unwrap(), identity);

    assert!(matches!(
        service.identify("not-a-token").await,
        Err(AuthError::Unauthenticated(_))
    ));
}
