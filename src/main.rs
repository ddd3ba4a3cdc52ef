use anyhow::Result;
use log::{error, info, warn};
use tokio::sync::broadcast;

use wishcraft::{logging, AppConfig, Bridge, JsonFileStorage, StoreOwner, WishlistStore};

#[tokio::main]
async fn main() -> Result<()> {
    let (config, config_error) = match AppConfig::load() {
        Ok(config) => (config, None),
        Err(err) => (AppConfig::default(), Some(err)),
    };
    logging::init(&config)?;
    if let Some(err) = config_error {
        warn!("[wishcraft:config] {err:#}. Using defaults.");
    }

    let data_file = config.data_file();
    info!("[wishcraft] Using wishlists file {}", data_file.display());
    let store = WishlistStore::open(Box::new(JsonFileStorage::new(data_file)));
    let (handle, _owner) = StoreOwner::spawn(store)?;

    let (shutdown_tx, shutdown_rx) = broadcast::channel(2);
    let bridge = Bridge::new(config.bridge.clone(), handle);
    if config.bridge.enabled {
        if let Err(err) = bridge.start(shutdown_rx).await {
            error!("[wishcraft:http] Server failed to start: {err}");
        }
    } else {
        info!("[wishcraft:http] Bridge disabled by configuration");
    }

    tokio::signal::ctrl_c().await?;
    info!("[wishcraft] Shutting down");
    // Every change was saved when it was applied; nothing left to flush.
    let _ = shutdown_tx.send(());

    Ok(())
}
