use std::sync::Arc;
use tracing::info;

use crate::config::Config;
use crate::db::Store;
use crate::services::{
    AuditService, DeviceService, PermissionService, SeaOrmAuditService, SeaOrmDeviceService,
    SeaOrmPermissionService, SeaOrmUserService, UserService,
};

/// Everything a request needs, built once at startup from an explicit [`Config`].
#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<Config>,

    pub store: Store,

    pub permission_service: Arc<dyn PermissionService>,

    pub audit_service: Arc<dyn AuditService>,

    pub device_service: Arc<dyn DeviceService>,

    pub user_service: Arc<dyn UserService>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        if store.ensure_primary_admin(&config.security).await? {
            info!("Primary admin created; change the bootstrap password");
        }

        Ok(Self::with_store(config, store))
    }

    /// Wires the services over an already-connected store.
    #[must_use]
    pub fn with_store(config: Config, store: Store) -> Self {
        let permission_service: Arc<dyn PermissionService> =
            Arc::new(SeaOrmPermissionService::new(store.clone()));

        let audit_service: Arc<dyn AuditService> = Arc::new(SeaOrmAuditService::new(
            store.clone(),
            permission_service.clone(),
        ));

        let device_service: Arc<dyn DeviceService> = Arc::new(SeaOrmDeviceService::new(
            store.clone(),
            permission_service.clone(),
            audit_service.clone(),
            config.devices.clone(),
        ));

        let user_service: Arc<dyn UserService> = Arc::new(SeaOrmUserService::new(
            store.clone(),
            permission_service.clone(),
        ));

        Self {
            config: Arc::new(config),
            store,
            permission_service,
            audit_service,
            device_service,
            user_service,
        }
    }
}
