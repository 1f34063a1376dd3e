pub mod device;
pub mod logs;
pub mod permission;
pub mod user;
