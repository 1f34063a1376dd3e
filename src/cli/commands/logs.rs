//! Audit log command handler

use crate::config::Config;
use crate::db::Store;

pub async fn cmd_list_logs(config: &Config, limit: usize) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_path).await?;
    let logs = store.list_logs().await?;

    if logs.is_empty() {
        println!("Audit log is empty.");
        return Ok(());
    }

    println!("Recent audit entries ({} of {})", limit.min(logs.len()), logs.len());
    println!("{:-<70}", "");

    for entry in logs.into_iter().take(limit) {
        let actor = entry
            .performed_by
            .map_or_else(|| "client".to_string(), |id| format!("user #{id}"));

        println!(
            "{} {:<12} {} / {} by {}",
            entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
            entry.action,
            entry.mac,
            entry.hostname,
            actor
        );
    }

    Ok(())
}
