use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::info;

use weatherdash::{
    AppState, FjallUserStore, OpenWeatherMapProvider, PersistentCache, Storage, WeatherDashConfig,
    telemetry,
};

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = WeatherDashConfig::load_from_path(config_path)?;
    let guard = telemetry::init(&config.logging, &config.telemetry)?;

    let result = run(config).await;
    if let Err(e) = &result {
        tracing::error!("{:#}", e);
    }
    guard.shutdown();
    result
}

async fn run(config: WeatherDashConfig) -> Result<()> {
    let api_key = config.provider_api_key()?;

    let storage = Storage::open(&config.storage.data_dir)
        .with_context(|| format!("Failed to open data store in {}", config.storage.data_dir))?;
    let users = FjallUserStore::open(&storage)?;
    let cache = PersistentCache::open(&storage)?;
    let cache_ttl = Duration::from_secs(u64::from(config.storage.forecast_cache_minutes) * 60);
    let provider = OpenWeatherMapProvider::new(&config.provider, api_key)?.with_cache(cache, cache_ttl);

    info!("Starting weatherdash {}", weatherdash::VERSION);
    let state = AppState::new(config, Arc::new(users), Arc::new(provider));
    weatherdash::serve(state).await
}
