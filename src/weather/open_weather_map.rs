use std::time::Duration;

use async_trait::async_trait;
use rand::RngExt;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::{debug, info, warn};

use super::{AirComponents, AirQuality, CurrentConditions, ForecastProvider, ForecastSeries};
use crate::cache::PersistentCache;
use crate::config::ProviderConfig;
use crate::{Result, WeatherDashError};

#[derive(Debug, Serialize, Deserialize)]
struct AirPollutionResponse {
    #[serde(default)]
    list: Vec<AirPollutionEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
struct AirPollutionEntry {
    main: AqiBlock,
    #[serde(default)]
    components: AirComponents,
}

#[derive(Debug, Serialize, Deserialize)]
struct AqiBlock {
    aqi: u8,
}

/// Error body returned by the API on failures, e.g. `{"cod":"404","message":"city not found"}`
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// Forecast provider backed by the OpenWeatherMap 2.5 API
pub struct OpenWeatherMapProvider {
    client: ClientWithMiddleware,
    base_url: String,
    api_key: String,
    language: String,
    cache: Option<PersistentCache>,
    cache_ttl: Duration,
}

impl OpenWeatherMapProvider {
    pub fn new(config: &ProviderConfig, api_key: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(u64::from(config.timeout_seconds)))
            .user_agent(concat!("weatherdash/", env!("CARGO_PKG_VERSION")))
            .build()?;
        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(config.max_retries);
        let client = ClientBuilder::new(client)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            language: config.language.clone(),
            cache: None,
            cache_ttl: Duration::ZERO,
        })
    }

    /// Keep successful responses in `cache` for roughly `ttl`
    #[must_use]
    pub fn with_cache(mut self, cache: PersistentCache, ttl: Duration) -> Self {
        self.cache = Some(cache);
        self.cache_ttl = ttl;
        self
    }

    fn weather_url(&self, endpoint: &str, query: &str) -> String {
        format!(
            "{}/data/2.5/{}?{}&appid={}&units=metric&lang={}",
            self.base_url,
            endpoint,
            query,
            urlencoding::encode(&self.api_key),
            urlencoding::encode(&self.language)
        )
    }

    fn jittered_ttl(&self) -> Duration {
        let jitter: f64 = rand::rng().random_range(0.9..1.1);
        self.cache_ttl.mul_f64(jitter)
    }

    #[tracing::instrument(level = "debug", skip(self, query))]
    async fn fetch<T>(&self, endpoint: &str, query: &str, cache_key: &str) -> Result<T>
    where
        T: Serialize + DeserializeOwned + Send + 'static,
    {
        if let Some(cache) = &self.cache {
            match cache.get::<T>(cache_key).await {
                Ok(Some(hit)) => {
                    debug!("Cache hit for {}", cache_key);
                    return Ok(hit);
                }
                Ok(None) => {}
                Err(e) => warn!("Cache lookup for {} failed: {}", cache_key, e),
            }
        }

        let url = self.weather_url(endpoint, query);
        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorBody>(&body)
                .map(|err| err.message)
                .unwrap_or_else(|_| format!("{status}: {body}"));
            warn!("OpenWeatherMap {} request failed with {}", endpoint, status);
            return Err(WeatherDashError::api(message));
        }

        let value: T = response
            .json()
            .await
            .map_err(|e| WeatherDashError::api(format!("unexpected {endpoint} response: {e}")))?;

        if let Some(cache) = &self.cache
            && !self.cache_ttl.is_zero()
        {
            if let Err(e) = cache.put(cache_key, &value, self.jittered_ttl()).await {
                warn!("Failed to cache {}: {}", cache_key, e);
            }
        }

        Ok(value)
    }
}

fn city_cache_key(kind: &str, city: &str) -> String {
    format!("{kind}:{}", city.trim().to_lowercase())
}

#[async_trait]
impl ForecastProvider for OpenWeatherMapProvider {
    #[tracing::instrument(skip(self))]
    async fn current_weather(&self, city: &str) -> Result<CurrentConditions> {
        let query = format!("q={}", urlencoding::encode(city.trim()));
        let current: CurrentConditions = self
            .fetch("weather", &query, &city_cache_key("current", city))
            .await?;
        info!("Fetched current weather for {}", city);
        Ok(current)
    }

    #[tracing::instrument(skip(self))]
    async fn forecast(&self, city: &str) -> Result<ForecastSeries> {
        let query = format!("q={}", urlencoding::encode(city.trim()));
        let series: ForecastSeries = self
            .fetch("forecast", &query, &city_cache_key("forecast", city))
            .await?;
        info!("Fetched {} forecast entries for {}", series.list.len(), city);
        Ok(series)
    }

    #[tracing::instrument(skip(self))]
    async fn air_quality(&self, lat: f64, lon: f64) -> Result<AirQuality> {
        let query = format!("lat={lat}&lon={lon}");
        let cache_key = format!("air:{lat:.2},{lon:.2}");
        let response: AirPollutionResponse = self.fetch("air_pollution", &query, &cache_key).await?;
        let entry = response
            .list
            .into_iter()
            .next()
            .ok_or_else(|| WeatherDashError::api("no air quality data for this location"))?;
        Ok(AirQuality {
            aqi: entry.main.aqi,
            components: entry.components,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Storage;
    use crate::weather::{Coordinates, CurrentReadings, SunTimes, Wind};

    fn unreachable_config() -> ProviderConfig {
        ProviderConfig {
            api_key: None,
            base_url: "http://127.0.0.1:9/".to_string(),
            timeout_seconds: 2,
            max_retries: 0,
            language: "en".to_string(),
        }
    }

    fn sample_current() -> CurrentConditions {
        CurrentConditions {
            name: "Berlin".to_string(),
            coord: Coordinates {
                lat: 52.52,
                lon: 13.41,
            },
            weather: vec![],
            main: CurrentReadings {
                temp: 18.0,
                feels_like: 17.0,
                humidity: 40.0,
                pressure: 1015.0,
            },
            wind: Wind { speed: 2.5 },
            sys: SunTimes::default(),
            timezone: 3600,
        }
    }

    #[test]
    fn test_weather_url_encodes_query_parts() {
        let provider = OpenWeatherMapProvider::new(&unreachable_config(), "k&ey").unwrap();
        let query = format!("q={}", urlencoding::encode("São Paulo"));
        let url = provider.weather_url("weather", &query);
        assert_eq!(
            url,
            "http://127.0.0.1:9/data/2.5/weather?q=S%C3%A3o%20Paulo&appid=k%26ey&units=metric&lang=en"
        );
    }

    #[test]
    fn test_city_cache_key_is_normalized() {
        assert_eq!(city_cache_key("forecast", "  Berlin "), "forecast:berlin");
    }

    #[tokio::test]
    async fn test_cached_response_skips_network() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::open(dir.path()).unwrap();
        let cache = PersistentCache::open(&storage).unwrap();
        cache
            .put("current:berlin", &sample_current(), Duration::from_secs(600))
            .await
            .unwrap();

        let provider = OpenWeatherMapProvider::new(&unreachable_config(), "key")
            .unwrap()
            .with_cache(cache, Duration::from_secs(600));

        let current = provider.current_weather("Berlin").await.unwrap();
        assert_eq!(current, sample_current());
    }

    #[tokio::test]
    async fn test_unreachable_api_is_an_api_error() {
        let provider = OpenWeatherMapProvider::new(&unreachable_config(), "key").unwrap();
        let result = provider.forecast("Berlin").await;
        assert!(matches!(result, Err(WeatherDashError::Api { .. })));
    }
}
