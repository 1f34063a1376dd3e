pub mod permission_service;
pub mod permission_service_impl;
pub use permission_service::{EffectivePermissions, PermissionError, PermissionService};
pub use permission_service_impl::SeaOrmPermissionService;

pub mod audit_service;
pub mod audit_service_impl;
pub use audit_service::{AuditError, AuditService};
pub use audit_service_impl::SeaOrmAuditService;

pub mod device_service;
pub mod device_service_impl;
pub use device_service::{
    Activation, CheckIn, CreateDevice, DeviceError, DeviceService, DeviceUpdate, IssuedKey,
};
pub use device_service_impl::{SeaOrmDeviceService, generate_key};

pub mod user_service;
pub mod user_service_impl;
pub use user_service::{UserError, UserService};
pub use user_service_impl::SeaOrmUserService;
