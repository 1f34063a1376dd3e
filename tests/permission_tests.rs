//! Integration tests for authorization, user management and the audit log.

use keycolony::config::Config;
use keycolony::domain::{AccessDecision, Permission, Role};
use keycolony::services::{AuditError, PermissionError, UserError};
use keycolony::state::SharedState;

const ADMIN: i32 = 1;

async fn spawn_state() -> SharedState {
    let db_path = std::env::temp_dir().join(format!(
        "keycolony-permission-test-{}.db",
        uuid::Uuid::new_v4()
    ));

    let mut config = Config::default();
    config.general.database_path = format!("sqlite:{}", db_path.display());
    config.security.argon2_memory_cost_kib = 1024;
    config.security.argon2_time_cost = 1;

    SharedState::new(config)
        .await
        .expect("Failed to create shared state")
}

#[tokio::test]
async fn test_primary_admin_is_seeded() {
    let state = spawn_state().await;

    let admin = state.store.get_user(ADMIN).await.unwrap().unwrap();
    assert_eq!(admin.username, "admin");
    assert_eq!(admin.role, Role::Admin);

    // Seeding again is a no-op
    let seeded = state
        .store
        .ensure_primary_admin(&state.config.security)
        .await
        .unwrap();
    assert!(!seeded);
}

#[tokio::test]
async fn test_admin_is_allowed_everything_without_grants() {
    let state = spawn_state().await;
    assert_eq!(state.store.count_permission_grants(ADMIN).await.unwrap(), 0);

    for permission in Permission::ALL {
        let decision = state
            .permission_service
            .authorize(ADMIN, permission)
            .await
            .unwrap();
        assert_eq!(decision, AccessDecision::Allowed, "{permission}");
    }

    let effective = state.permission_service.list_effective(ADMIN).await.unwrap();
    assert_eq!(effective.permissions, Permission::ALL.to_vec());
}

#[tokio::test]
async fn test_dashboard_is_universal_for_non_admins() {
    let state = spawn_state().await;

    let viewer = state
        .user_service
        .create("viewer", "hash", Role::User)
        .await
        .unwrap();
    assert_eq!(state.store.count_permission_grants(viewer.id).await.unwrap(), 0);

    let permissions = &state.permission_service;
    assert_eq!(
        permissions
            .authorize(viewer.id, Permission::ViewDashboard)
            .await
            .unwrap(),
        AccessDecision::Allowed
    );
    assert_eq!(
        permissions
            .authorize(viewer.id, Permission::ViewLogs)
            .await
            .unwrap(),
        AccessDecision::Denied
    );

    let effective = permissions.list_effective(viewer.id).await.unwrap();
    assert_eq!(effective.permissions, vec![Permission::ViewDashboard]);
}

#[tokio::test]
async fn test_new_staff_has_exactly_the_dashboard() {
    let state = spawn_state().await;

    let alice = state
        .user_service
        .create("alice", "hash", Role::Staff)
        .await
        .unwrap();
    assert_eq!(alice.role, Role::Staff);

    let effective = state
        .permission_service
        .list_effective(alice.id)
        .await
        .unwrap();
    assert_eq!(effective.user.username, "alice");
    assert_eq!(effective.permissions, vec![Permission::ViewDashboard]);
}

#[tokio::test]
async fn test_username_taken() {
    let state = spawn_state().await;

    state
        .user_service
        .create("alice", "hash", Role::Staff)
        .await
        .unwrap();

    let err = state
        .user_service
        .create("alice", "other", Role::User)
        .await
        .unwrap_err();
    assert!(matches!(err, UserError::UsernameTaken(name) if name == "alice"));

    let err = state
        .user_service
        .create("admin", "hash", Role::Admin)
        .await
        .unwrap_err();
    assert!(matches!(err, UserError::UsernameTaken(_)));
}

#[tokio::test]
async fn test_grant_is_idempotent_and_revoke_tolerates_absence() {
    let state = spawn_state().await;
    let permissions = &state.permission_service;

    let dave = state
        .user_service
        .create("dave", "hash", Role::User)
        .await
        .unwrap()
        .id;

    permissions
        .grant(dave, Permission::ManageKeys, Some(ADMIN))
        .await
        .unwrap();
    permissions
        .grant(dave, Permission::ManageKeys, Some(ADMIN))
        .await
        .unwrap();
    assert_eq!(state.store.count_permission_grants(dave).await.unwrap(), 1);
    assert!(
        permissions
            .authorize(dave, Permission::ManageKeys)
            .await
            .unwrap()
            .is_allowed()
    );

    permissions.revoke(dave, Permission::ManageKeys).await.unwrap();
    permissions.revoke(dave, Permission::ManageKeys).await.unwrap();
    permissions.revoke(dave, Permission::ViewLogs).await.unwrap();
    assert_eq!(state.store.count_permission_grants(dave).await.unwrap(), 0);
    assert_eq!(
        permissions
            .authorize(dave, Permission::ManageKeys)
            .await
            .unwrap(),
        AccessDecision::Denied
    );
}

#[tokio::test]
async fn test_unknown_user() {
    let state = spawn_state().await;
    let permissions = &state.permission_service;

    assert_eq!(
        permissions
            .authorize(404, Permission::ViewDashboard)
            .await
            .unwrap(),
        AccessDecision::UserNotFound
    );
    assert!(matches!(
        permissions.require(404, Permission::ViewDashboard).await,
        Err(PermissionError::PermissionDenied { user_id: 404, .. })
    ));
    assert!(matches!(
        permissions
            .grant(404, Permission::ViewLogs, Some(ADMIN))
            .await,
        Err(PermissionError::UserNotFound(404))
    ));
    assert!(matches!(
        permissions.list_effective(404).await,
        Err(PermissionError::UserNotFound(404))
    ));
}

#[tokio::test]
async fn test_grant_by_unknown_granter_is_user_not_found() {
    let state = spawn_state().await;

    let bob = state
        .user_service
        .create("bob", "hash", Role::Staff)
        .await
        .unwrap()
        .id;

    let result = state
        .permission_service
        .grant(bob, Permission::ManageKeys, Some(999))
        .await;
    assert!(matches!(result, Err(PermissionError::UserNotFound(999))));
    assert_eq!(
        state
            .permission_service
            .authorize(bob, Permission::ManageKeys)
            .await
            .unwrap(),
        AccessDecision::Denied
    );

    state
        .permission_service
        .grant(bob, Permission::ManageKeys, None)
        .await
        .unwrap();
    assert!(
        state
            .permission_service
            .authorize(bob, Permission::ManageKeys)
            .await
            .unwrap()
            .is_allowed()
    );
}

#[tokio::test]
async fn test_authorization_fails_closed_when_store_is_unavailable() {
    let state = spawn_state().await;

    state.store.conn.clone().close().await.unwrap();

    let result = state
        .permission_service
        .authorize(ADMIN, Permission::ManageKeys)
        .await;
    assert!(matches!(result, Err(PermissionError::Database(_))));

    let result = state
        .permission_service
        .require(ADMIN, Permission::ManageKeys)
        .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_primary_admin_cannot_be_deleted() {
    let state = spawn_state().await;

    let err = state.user_service.delete(ADMIN).await.unwrap_err();
    assert!(matches!(err, UserError::Forbidden));
    assert!(state.store.get_user(ADMIN).await.unwrap().is_some());
}

#[tokio::test]
async fn test_deleting_a_user_removes_its_grants() {
    let state = spawn_state().await;

    let erin = state
        .user_service
        .create("erin", "hash", Role::Staff)
        .await
        .unwrap()
        .id;
    state
        .permission_service
        .grant(erin, Permission::ViewDevices, Some(ADMIN))
        .await
        .unwrap();
    assert_eq!(state.store.count_permission_grants(erin).await.unwrap(), 2);

    state.user_service.delete(erin).await.unwrap();

    assert!(state.store.get_user(erin).await.unwrap().is_none());
    assert_eq!(state.store.count_permission_grants(erin).await.unwrap(), 0);

    let err = state.user_service.delete(erin).await.unwrap_err();
    assert!(matches!(err, UserError::NotFound(_)));
}

#[tokio::test]
async fn test_log_deletion_requires_manage_logs() {
    let state = spawn_state().await;
    let audit = &state.audit_service;

    let entry = audit
        .append("aa:bb:cc:dd:ee:ff", "PC1", "manual_note", Some(ADMIN))
        .await
        .unwrap();
    audit
        .append("aa:bb:cc:dd:ee:ff", "PC1", "manual_note", Some(ADMIN))
        .await
        .unwrap();

    let frank = state
        .user_service
        .create("frank", "hash", Role::Staff)
        .await
        .unwrap()
        .id;

    assert!(matches!(
        audit.delete_one(entry.id, frank).await,
        Err(AuditError::PermissionDenied(_))
    ));
    assert!(matches!(
        audit.delete_all(frank).await,
        Err(AuditError::PermissionDenied(_))
    ));
    assert_eq!(audit.list_all().await.unwrap().len(), 2);

    state
        .permission_service
        .grant(frank, Permission::ManageLogs, Some(ADMIN))
        .await
        .unwrap();

    audit.delete_one(entry.id, frank).await.unwrap();
    assert!(matches!(
        audit.delete_one(entry.id, frank).await,
        Err(AuditError::NotFound(_))
    ));

    assert_eq!(audit.delete_all(ADMIN).await.unwrap(), 1);
    assert!(audit.list_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_logs_are_listed_newest_first() {
    let state = spawn_state().await;
    let audit = &state.audit_service;

    let first = audit.append("m", "h", "first", None).await.unwrap();
    let second = audit.append("m", "h", "second", None).await.unwrap();

    let ids: Vec<i32> = audit
        .list_all()
        .await
        .unwrap()
        .into_iter()
        .map(|entry| entry.id)
        .collect();
    assert_eq!(ids, vec![second.id, first.id]);
}
