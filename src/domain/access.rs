//! Roles, permissions and the authorization decision.
//!
//! Both enums are stored as plain strings, so they double as `SeaORM` active
//! enums. A row holding a value outside these sets fails to load, which keeps
//! authorization closed on corrupt data.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Role of an administrative user.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[sea_orm(string_value = "admin")]
    Admin,
    #[default]
    #[sea_orm(string_value = "staff")]
    Staff,
    #[sea_orm(string_value = "user")]
    User,
}

impl Role {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Staff => "staff",
            Self::User => "user",
        }
    }

    /// Admins hold every permission without explicit grants.
    #[must_use]
    pub const fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "staff" => Ok(Self::Staff),
            "user" => Ok(Self::User),
            other => Err(UnknownVariant::new("role", other)),
        }
    }
}

/// Capability a non-admin user may be granted.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(50))")]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    #[sea_orm(string_value = "view_dashboard")]
    ViewDashboard,
    #[sea_orm(string_value = "view_keys")]
    ViewKeys,
    #[sea_orm(string_value = "manage_keys")]
    ManageKeys,
    #[sea_orm(string_value = "view_devices")]
    ViewDevices,
    #[sea_orm(string_value = "manage_devices")]
    ManageDevices,
    #[sea_orm(string_value = "view_logs")]
    ViewLogs,
    #[sea_orm(string_value = "manage_logs")]
    ManageLogs,
    #[sea_orm(string_value = "manage_users")]
    ManageUsers,
    #[sea_orm(string_value = "grant_permissions")]
    GrantPermissions,
}

impl Permission {
    /// Every permission, in declaration order.
    pub const ALL: [Self; 9] = [
        Self::ViewDashboard,
        Self::ViewKeys,
        Self::ManageKeys,
        Self::ViewDevices,
        Self::ManageDevices,
        Self::ViewLogs,
        Self::ManageLogs,
        Self::ManageUsers,
        Self::GrantPermissions,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ViewDashboard => "view_dashboard",
            Self::ViewKeys => "view_keys",
            Self::ManageKeys => "manage_keys",
            Self::ViewDevices => "view_devices",
            Self::ManageDevices => "manage_devices",
            Self::ViewLogs => "view_logs",
            Self::ManageLogs => "manage_logs",
            Self::ManageUsers => "manage_users",
            Self::GrantPermissions => "grant_permissions",
        }
    }

    /// Held by every user regardless of stored grants.
    #[must_use]
    pub const fn is_universal(self) -> bool {
        matches!(self, Self::ViewDashboard)
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Permission {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| UnknownVariant::new("permission", s))
    }
}

/// Returned when parsing a role or permission name fails.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: {value}")]
pub struct UnknownVariant {
    kind: &'static str,
    value: String,
}

impl UnknownVariant {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// Outcome of an authorization query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessDecision {
    Allowed,
    Denied,
    UserNotFound,
}

impl AccessDecision {
    #[must_use]
    pub const fn is_allowed(self) -> bool {
        matches!(self, Self::Allowed)
    }

    /// Decides from the user's role and whether a matching grant row exists.
    ///
    /// `has_grant` is only consulted for non-admin users asking for a
    /// permission that is not universal.
    #[must_use]
    pub fn resolve(role: Role, permission: Permission, has_grant: impl FnOnce() -> bool) -> Self {
        if role.is_admin() || permission.is_universal() || has_grant() {
            Self::Allowed
        } else {
            Self::Denied
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permission_names_round_trip() {
        for permission in Permission::ALL {
            assert_eq!(permission.as_str().parse::<Permission>(), Ok(permission));
        }
        assert!("drop_tables".parse::<Permission>().is_err());
    }

    #[test]
    fn permission_serializes_as_snake_case() {
        let json = serde_json::to_string(&Permission::GrantPermissions).unwrap();
        assert_eq!(json, "\"grant_permissions\"");
    }

    #[test]
    fn role_defaults_to_staff() {
        assert_eq!(Role::default(), Role::Staff);
        assert_eq!("admin".parse::<Role>(), Ok(Role::Admin));
        assert!("root".parse::<Role>().is_err());
    }

    #[test]
    fn admin_is_allowed_without_consulting_grants() {
        for permission in Permission::ALL {
            let decision = AccessDecision::resolve(Role::Admin, permission, || {
                panic!("grants must not be consulted for admins")
            });
            assert_eq!(decision, AccessDecision::Allowed);
        }
    }

    #[test]
    fn dashboard_is_universal() {
        let decision = AccessDecision::resolve(Role::User, Permission::ViewDashboard, || false);
        assert!(decision.is_allowed());
    }

    #[test]
    fn other_permissions_require_a_grant() {
        assert_eq!(
            AccessDecision::resolve(Role::Staff, Permission::ManageKeys, || false),
            AccessDecision::Denied
        );
        assert_eq!(
            AccessDecision::resolve(Role::Staff, Permission::ManageKeys, || true),
            AccessDecision::Allowed
        );
    }
}
