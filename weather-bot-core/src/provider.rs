use crate::{
    CityCandidate, Config, LookupOutcome,
    error::Result,
    provider::{geonames::GeoNamesProvider, openweather::OpenWeatherProvider},
};
use async_trait::async_trait;
use reqwest::Client;
use std::fmt::Debug;

pub mod geonames;
pub mod openweather;

/// Maximum number of suggestions requested from and accepted by a geocoder.
pub const MAX_CANDIDATES: usize = 5;

#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    /// Current weather for free-text `location`.
    ///
    /// Any non-success status maps to `LookupOutcome::NotFound`; only a success
    /// status with an unusable payload is an error.
    async fn lookup(&self, location: &str) -> Result<LookupOutcome>;
}

#[async_trait]
pub trait GeocodingProvider: Send + Sync + Debug {
    /// Places whose name resembles `query`, in provider order. Empty on any failure.
    async fn search(&self, query: &str) -> Vec<CityCandidate>;
}

pub(crate) fn http_client(config: &Config) -> Result<Client> {
    let client = Client::builder()
        .timeout(config.request_timeout())
        .user_agent(concat!("weather-bot/", env!("CARGO_PKG_VERSION")))
        .build()?;
    Ok(client)
}

/// Construct the weather provider from config.
pub fn weather_provider_from_config(config: &Config) -> Result<Box<dyn WeatherProvider>> {
    let api_key = config.weather_api_key()?;
    let provider = OpenWeatherProvider::new(
        api_key.to_owned(),
        config.endpoints.openweather.clone(),
        http_client(config)?,
    );
    Ok(Box::new(provider))
}

/// Construct the geocoding provider from config.
pub fn geocoding_provider_from_config(config: &Config) -> Result<Box<dyn GeocodingProvider>> {
    let username = config.geonames_username()?;
    let provider = GeoNamesProvider::new(
        username.to_owned(),
        config.endpoints.geonames.clone(),
        http_client(config)?,
    );
    Ok(Box::new(provider))
}

pub(crate) fn truncate_body(body: &str) -> &str {
    const MAX: usize = 200;
    if body.len() <= MAX {
        return body;
    }
    let mut end = MAX;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}
