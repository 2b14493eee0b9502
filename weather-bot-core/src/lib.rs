//! Core library for the weather chat bot.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - Weather and geocoding provider abstractions (OpenWeatherMap, GeoNames)
//! - City resolution with a transliterated fallback
//! - Turning an incoming message into a reply
//!
//! It is used by `weather-bot`, but does not depend on any messaging transport.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod format;
pub mod model;
pub mod provider;
pub mod resolver;
pub mod translit;

pub use config::{Config, Endpoints};
pub use dispatch::Dispatcher;
pub use error::{Error, Result};
pub use model::{CityCandidate, LocationKind, LocationQuery, LookupOutcome, Reply, WeatherReport};
pub use provider::{GeocodingProvider, WeatherProvider};
pub use resolver::CityResolver;
