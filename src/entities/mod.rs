pub mod prelude;

pub mod devices;
pub mod logs;
pub mod user_permissions;
pub mod users;
