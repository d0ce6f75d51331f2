//! Recherche les récepteurs DIAL du réseau local et les affiche en JSON.
//!
//! ```text
//! cargo run -p pmocast --example discover -- [timeout_ms]
//! ```
//!
//! Sans argument, le timeout vient de `discovery.timeout_ms` dans la
//! configuration. Ctrl-C ferme la fenêtre de sondage plus tôt.

use anyhow::Context;
use pmocast::{CancellationToken, DeviceLocator, timeout_from_millis};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = pmoconfig::get_config();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.get_log_min_level().to_lowercase()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let timeout_ms = match std::env::args().nth(1) {
        Some(arg) => arg
            .parse::<i64>()
            .with_context(|| format!("invalid timeout: {arg}"))?,
        None => config.get_discovery_timeout_ms(),
    };
    let timeout = timeout_from_millis(timeout_ms);

    tracing::info!(
        "Starting DIAL discovery from {} ({} ms)",
        pmoutils::guess_local_ip(),
        timeout.as_millis()
    );

    let locator = DeviceLocator::from_config(&config);
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            trigger.cancel();
        }
    });

    let devices = locator
        .locate_devices_with_cancel(timeout, cancel)
        .await
        .context("discovery failed")?;

    println!("{}", serde_json::to_string_pretty(&devices)?);
    eprintln!("{} DIAL device(s) found", devices.len());
    Ok(())
}
