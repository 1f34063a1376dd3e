mod devices;
mod logs;
mod users;

pub use devices::cmd_list_devices;
pub use logs::cmd_list_logs;
pub use users::cmd_list_users;
