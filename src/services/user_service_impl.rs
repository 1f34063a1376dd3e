//! `SeaORM` implementation of the `UserService` trait.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

use crate::db::{Store, User};
use crate::domain::{PRIMARY_ADMIN_ID, Permission, Role};
use crate::services::PermissionService;
use crate::services::user_service::{UserError, UserService};

pub struct SeaOrmUserService {
    store: Store,
    permissions: Arc<dyn PermissionService>,
}

impl SeaOrmUserService {
    #[must_use]
    pub fn new(store: Store, permissions: Arc<dyn PermissionService>) -> Self {
        Self { store, permissions }
    }
}

#[async_trait]
impl UserService for SeaOrmUserService {
    async fn list(&self) -> Result<Vec<User>, UserError> {
        Ok(self.store.list_users().await?)
    }

    async fn create(
        &self,
        username: &str,
        password_hash: &str,
        role: Role,
    ) -> Result<User, UserError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(UserError::Validation("username is required".to_string()));
        }
        if password_hash.is_empty() {
            return Err(UserError::Validation(
                "password_hash is required".to_string(),
            ));
        }

        let user = self
            .store
            .insert_user(username, password_hash, role)
            .await?
            .ok_or_else(|| UserError::UsernameTaken(username.to_string()))?;

        info!(user_id = user.id, username, %role, "Created user");

        if role == Role::Staff {
            if let Err(e) = self
                .permissions
                .grant(user.id, Permission::ViewDashboard, Some(PRIMARY_ADMIN_ID))
                .await
            {
                warn!(user_id = user.id, error = %e, "Failed to grant default dashboard permission");
            }
        }

        Ok(user)
    }

    async fn delete(&self, user_id: i32) -> Result<(), UserError> {
        if user_id == PRIMARY_ADMIN_ID {
            return Err(UserError::Forbidden);
        }

        if self.store.delete_user(user_id).await? {
            Ok(())
        } else {
            Err(UserError::NotFound(user_id))
        }
    }
}
