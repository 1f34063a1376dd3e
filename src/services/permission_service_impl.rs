//! `SeaORM` implementation of the `PermissionService` trait.

use async_trait::async_trait;
use tracing::{debug, info};

use crate::db::Store;
use crate::domain::{AccessDecision, Permission};
use crate::services::permission_service::{
    EffectivePermissions, PermissionError, PermissionService,
};

pub struct SeaOrmPermissionService {
    store: Store,
}

impl SeaOrmPermissionService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }
}

#[async_trait]
impl PermissionService for SeaOrmPermissionService {
    async fn authorize(
        &self,
        user_id: i32,
        permission: Permission,
    ) -> Result<AccessDecision, PermissionError> {
        let Some(user) = self.store.get_user(user_id).await? else {
            return Ok(AccessDecision::UserNotFound);
        };

        let needs_grant = !user.role.is_admin() && !permission.is_universal();
        let has_grant =
            needs_grant && self.store.has_permission_grant(user_id, permission).await?;
        Ok(AccessDecision::resolve(user.role, permission, || has_grant))
    }

    async fn require(&self, user_id: i32, permission: Permission) -> Result<(), PermissionError> {
        match self.authorize(user_id, permission).await? {
            AccessDecision::Allowed => Ok(()),
            AccessDecision::Denied => {
                debug!(user_id, %permission, "Permission denied");
                Err(PermissionError::PermissionDenied {
                    user_id,
                    permission,
                })
            }
            AccessDecision::UserNotFound => {
                debug!(user_id, %permission, "Permission check for unknown user");
                Err(PermissionError::PermissionDenied {
                    user_id,
                    permission,
                })
            }
        }
    }

    async fn grant(
        &self,
        user_id: i32,
        permission: Permission,
        granted_by: Option<i32>,
    ) -> Result<(), PermissionError> {
        if self.store.get_user(user_id).await?.is_none() {
            return Err(PermissionError::UserNotFound(user_id));
        }
        if let Some(granter) = granted_by {
            if self.store.get_user(granter).await?.is_none() {
                return Err(PermissionError::UserNotFound(granter));
            }
        }

        let added = self
            .store
            .grant_permission(user_id, permission, granted_by)
            .await?;

        if added {
            info!(user_id, %permission, granted_by, "Granted permission");
        }
        Ok(())
    }

    async fn revoke(&self, user_id: i32, permission: Permission) -> Result<(), PermissionError> {
        if self.store.revoke_permission(user_id, permission).await? {
            info!(user_id, %permission, "Revoked permission");
        }
        Ok(())
    }

    async fn list_effective(&self, user_id: i32) -> Result<EffectivePermissions, PermissionError> {
        let user = self
            .store
            .get_user(user_id)
            .await?
            .ok_or(PermissionError::UserNotFound(user_id))?;

        let permissions = if user.role.is_admin() {
            Permission::ALL.to_vec()
        } else {
            let mut granted = self.store.list_permission_grants(user_id).await?;
            if !granted.contains(&Permission::ViewDashboard) {
                granted.insert(0, Permission::ViewDashboard);
            }
            granted
        };

        Ok(EffectivePermissions { user, permissions })
    }
}
