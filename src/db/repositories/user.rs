use anyhow::{Context, Result};
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHasher, SaltString, rand_core::OsRng},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set, SqlErr, TransactionTrait,
};
use serde::Serialize;
use tracing::info;

use crate::config::SecurityConfig;
use crate::domain::{PRIMARY_ADMIN_ID, PRIMARY_ADMIN_USERNAME, Role};
use crate::entities::{prelude::*, user_permissions, users};

/// User data returned from repository (without the password hash)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub role: Role,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            role: model.role,
            created_at: model.created_at,
        }
    }
}

pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn list(&self) -> Result<Vec<User>> {
        let rows = Users::find()
            .order_by_asc(users::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list users")?;

        Ok(rows.into_iter().map(User::from).collect())
    }

    pub async fn get_by_id(&self, id: i32) -> Result<Option<User>> {
        let user = Users::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user by ID")?;

        Ok(user.map(User::from))
    }

    /// Inserts a user. Returns `None` when the username is already taken.
    ///
    /// Uniqueness is enforced by the `users.username` unique index, so two
    /// concurrent inserts of the same name cannot both succeed.
    pub async fn insert(
        &self,
        username: &str,
        password_hash: &str,
        role: Role,
    ) -> Result<Option<User>> {
        let model = users::ActiveModel {
            username: Set(username.to_string()),
            password_hash: Set(password_hash.to_string()),
            role: Set(role),
            created_at: Set(chrono::Utc::now()),
            ..Default::default()
        };

        match model.insert(&self.conn).await {
            Ok(created) => Ok(Some(User::from(created))),
            Err(err) if is_unique_violation(&err) => Ok(None),
            Err(err) => Err(err).context("Failed to insert user"),
        }
    }

    /// Deletes a user and its permission grants. Returns whether a row existed.
    pub async fn delete(&self, id: i32) -> Result<bool> {
        let txn = self.conn.begin().await?;

        // Grants cascade in the schema; removing them here keeps the result
        // independent of whether the connection enforces foreign keys.
        UserPermissions::delete_many()
            .filter(user_permissions::Column::UserId.eq(id))
            .exec(&txn)
            .await?;

        let result = Users::delete_by_id(id).exec(&txn).await?;

        txn.commit().await?;

        let removed = result.rows_affected > 0;
        if removed {
            info!(user_id = id, "Deleted user");
        }
        Ok(removed)
    }

    /// Seeds the primary administrator when no user holds its ID.
    ///
    /// Returns `true` if the row was created by this call.
    pub async fn ensure_primary_admin(&self, config: &SecurityConfig) -> Result<bool> {
        if Users::find_by_id(PRIMARY_ADMIN_ID)
            .one(&self.conn)
            .await
            .context("Failed to look up primary admin")?
            .is_some()
        {
            return Ok(false);
        }

        let password = config.bootstrap_admin_password.clone();
        let config = config.clone();
        let password_hash =
            tokio::task::spawn_blocking(move || hash_password(&password, Some(&config)))
                .await
                .context("Password hashing task panicked")??;

        let model = users::ActiveModel {
            id: Set(PRIMARY_ADMIN_ID),
            username: Set(PRIMARY_ADMIN_USERNAME.to_string()),
            password_hash: Set(password_hash),
            role: Set(Role::Admin),
            created_at: Set(chrono::Utc::now()),
        };

        Users::insert(model)
            .exec_without_returning(&self.conn)
            .await
            .context("Failed to seed primary admin (is the 'admin' username taken?)")?;

        info!("Seeded primary admin user");
        Ok(true)
    }
}

pub(crate) fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

/// Hash a password using Argon2id with optional custom params.
/// If config is None, uses the crate's default params.
pub fn hash_password(password: &str, config: Option<&SecurityConfig>) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let argon2 = if let Some(cfg) = config {
        let params = Params::new(
            cfg.argon2_memory_cost_kib,
            cfg.argon2_time_cost,
            cfg.argon2_parallelism,
            None,
        )
        .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;
        Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
    } else {
        Argon2::default()
    };

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

    Ok(hash.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_password_produces_argon2id_phc_string() {
        let config = SecurityConfig {
            argon2_memory_cost_kib: 1024,
            argon2_time_cost: 1,
            ..SecurityConfig::default()
        };
        let hash = hash_password("hunter22", Some(&config)).unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert_ne!(hash, hash_password("hunter22", Some(&config)).unwrap());
    }
}
