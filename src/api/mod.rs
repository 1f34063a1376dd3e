use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{delete, get, post, put},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::state::SharedState;

mod devices;
mod error;
mod logs;
mod observability;
mod permissions;
mod system;
mod types;
mod users;

pub use error::ApiError;
pub use types::*;

use crate::services::{AuditService, DeviceService, PermissionService, UserService};
use metrics_exporter_prometheus::PrometheusHandle;

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,

    pub start_time: std::time::Instant,

    pub prometheus_handle: Option<PrometheusHandle>,
}

impl AppState {
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.shared.config
    }

    #[must_use]
    pub fn store(&self) -> &crate::db::Store {
        &self.shared.store
    }

    #[must_use]
    pub fn permission_service(&self) -> &Arc<dyn PermissionService> {
        &self.shared.permission_service
    }

    #[must_use]
    pub fn audit_service(&self) -> &Arc<dyn AuditService> {
        &self.shared.audit_service
    }

    #[must_use]
    pub fn device_service(&self) -> &Arc<dyn DeviceService> {
        &self.shared.device_service
    }

    #[must_use]
    pub fn user_service(&self) -> &Arc<dyn UserService> {
        &self.shared.user_service
    }
}

#[must_use]
pub fn create_app_state(
    shared: Arc<SharedState>,
    prometheus_handle: Option<PrometheusHandle>,
) -> Arc<AppState> {
    Arc::new(AppState {
        shared,
        start_time: std::time::Instant::now(),
        prometheus_handle,
    })
}

pub async fn create_app_state_from_config(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::new(config).await?);
    Ok(create_app_state(shared, prometheus_handle))
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors_origins = state.config().server.cors_allowed_origins.clone();

    let api_router = api_routes().with_state(state.clone());

    let cors_layer = if cors_origins.iter().any(|origin| origin == "*") {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .route("/", get(system::banner))
        .nest("/api", api_router)
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(observability::security_headers_middleware))
}

fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/system/health/live", get(system::health_live))
        .route("/system/health/ready", get(system::health_ready))
        .route("/metrics", get(observability::get_metrics))
        // Devices
        .route("/devices/check", post(devices::check_device))
        .route("/devices/activate", post(devices::activate_with_key))
        .route(
            "/devices",
            get(devices::list_devices).post(devices::create_device),
        )
        .route(
            "/devices/{id}",
            get(devices::get_device).delete(devices::delete_device),
        )
        .route("/devices/{id}/update", put(devices::update_device))
        .route("/devices/{id}/activate", put(devices::set_device_active))
        .route("/devices/{id}/generate-key", post(devices::generate_key))
        .route("/devices/{id}/reset", post(devices::reset_device))
        // Logs
        .route(
            "/logs",
            get(logs::list_logs)
                .post(logs::create_log)
                .delete(logs::delete_all_logs),
        )
        .route("/logs/{id}", delete(logs::delete_log))
        // Users
        .route("/users", get(users::list_users).post(users::create_user))
        .route("/users/{id}", delete(users::delete_user))
        // Permissions
        .route("/permissions/check", post(permissions::check_permission))
        .route("/permissions/grant", post(permissions::grant_permission))
        .route(
            "/permissions/revoke",
            delete(permissions::revoke_permission),
        )
        .route(
            "/permissions/{user_id}",
            get(permissions::get_user_permissions),
        )
        .layer(middleware::from_fn(observability::logging_middleware))
}
