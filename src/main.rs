use log::info;
use std::sync::Arc;

use visitor_fingerprint::{
    FingerprintSession,
    config::{Config, DEFAULT_STORE_PATH},
    metrics::METRICS,
    store::FileJar,
    util::SystemClock,
};

// ------------------------------------------------------------
// Application entry point
// ------------------------------------------------------------
//
// Demo runner for the fingerprint pipeline over the local host.
//
// Responsibilities:
// - Initialize logging (RUST_LOG)
// - Load configuration (first argument, default `config.json`)
// - Build a session whose identity record lives in a file, so a
//   second run reports `fromCookie`
// - Print the get() payload as JSON
//
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let path = std::env::args().nth(1).unwrap_or_else(|| "config.json".to_string());
    let config = Config::from_file(&path)?;

    let store_path = config
        .store_path
        .clone()
        .unwrap_or_else(|| DEFAULT_STORE_PATH.to_string());
    info!("identity records kept in {}", store_path);

    let clock = Arc::new(SystemClock);
    let session = FingerprintSession::builder(&config)?
        .clock(clock.clone())
        .jar(Arc::new(FileJar::new(store_path, clock)))
        .build();

    let payload = session.get().await?;
    println!("{}", serde_json::to_string_pretty(&payload)?);

    info!("{}", METRICS.summary());
    Ok(())
}
