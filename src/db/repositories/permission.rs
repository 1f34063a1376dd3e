use anyhow::{Context, Result};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};

use crate::domain::Permission;
use crate::entities::{prelude::*, user_permissions};

pub struct PermissionRepository {
    conn: DatabaseConnection,
}

impl PermissionRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn has_grant(&self, user_id: i32, permission: Permission) -> Result<bool> {
        let count = UserPermissions::find()
            .filter(user_permissions::Column::UserId.eq(user_id))
            .filter(user_permissions::Column::Permission.eq(permission))
            .count(&self.conn)
            .await
            .context("Failed to query permission grant")?;

        Ok(count > 0)
    }

    /// Stored grants only; implicit permissions are added by the caller.
    pub async fn list_for_user(&self, user_id: i32) -> Result<Vec<Permission>> {
        let permissions = UserPermissions::find()
            .select_only()
            .column(user_permissions::Column::Permission)
            .filter(user_permissions::Column::UserId.eq(user_id))
            .order_by_asc(user_permissions::Column::Id)
            .into_tuple::<Permission>()
            .all(&self.conn)
            .await
            .context("Failed to list permission grants")?;

        Ok(permissions)
    }

    /// Inserts a grant unless one already exists. Returns whether a row was added.
    pub async fn grant(
        &self,
        user_id: i32,
        permission: Permission,
        granted_by: Option<i32>,
    ) -> Result<bool> {
        let model = user_permissions::ActiveModel {
            user_id: Set(user_id),
            permission: Set(permission),
            granted_by: Set(granted_by),
            granted_at: Set(chrono::Utc::now()),
            ..Default::default()
        };

        let inserted = UserPermissions::insert(model)
            .on_conflict(
                sea_orm::sea_query::OnConflict::columns([
                    user_permissions::Column::UserId,
                    user_permissions::Column::Permission,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(&self.conn)
            .await
            .context("Failed to insert permission grant")?;

        Ok(inserted > 0)
    }

    /// Removes a grant if present. Returns whether a row was removed.
    pub async fn revoke(&self, user_id: i32, permission: Permission) -> Result<bool> {
        let result = UserPermissions::delete_many()
            .filter(user_permissions::Column::UserId.eq(user_id))
            .filter(user_permissions::Column::Permission.eq(permission))
            .exec(&self.conn)
            .await
            .context("Failed to delete permission grant")?;

        Ok(result.rows_affected > 0)
    }

    pub async fn count_for_user(&self, user_id: i32) -> Result<u64> {
        UserPermissions::find()
            .filter(user_permissions::Column::UserId.eq(user_id))
            .count(&self.conn)
            .await
            .context("Failed to count permission grants")
    }
}
