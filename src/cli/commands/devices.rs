//! List devices command handler

use chrono::Utc;

use crate::config::Config;
use crate::db::Store;

pub async fn cmd_list_devices(config: &Config) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_path).await?;
    let devices = store.list_devices().await?;

    if devices.is_empty() {
        println!("No devices registered yet.");
        println!();
        println!("Devices appear here after their first check-in.");
        return Ok(());
    }

    let now = Utc::now();

    println!("Devices ({} total)", devices.len());
    println!("{:-<70}", "");

    for device in devices {
        let status = if device.is_usable(now) {
            "active"
        } else if device.active {
            "expired"
        } else if device.key_code.is_some() {
            "key issued"
        } else {
            "unactivated"
        };

        println!("#{} {} / {} [{}]", device.id, device.mac, device.hostname, status);

        let expires = device
            .expires_at
            .map_or_else(|| "never".to_string(), |at| at.format("%Y-%m-%d %H:%M").to_string());
        println!(
            "  Key: {} | Expires: {}",
            device.key_code.as_deref().unwrap_or("-"),
            expires
        );
    }

    Ok(())
}
