pub use super::devices::Entity as Devices;
pub use super::logs::Entity as Logs;
pub use super::user_permissions::Entity as UserPermissions;
pub use super::users::Entity as Users;
