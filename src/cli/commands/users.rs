//! List users command handler

use crate::config::Config;
use crate::db::Store;
use crate::services::{PermissionService, SeaOrmPermissionService};

pub async fn cmd_list_users(config: &Config) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_path).await?;
    let permissions = SeaOrmPermissionService::new(store.clone());
    let users = store.list_users().await?;

    println!("Users ({} total)", users.len());
    println!("{:-<70}", "");

    for user in users {
        println!("#{} {} [{}]", user.id, user.username, user.role);

        let effective = permissions.list_effective(user.id).await?;
        let names: Vec<&str> = effective
            .permissions
            .iter()
            .map(|p| p.as_str())
            .collect();
        println!("  Permissions: {}", names.join(", "));
    }

    Ok(())
}
